//! Scene-side collaborators of the bridge
//!
//! The renderer's scene graph is an external system. The bridge only needs two
//! things from it:
//!
//! ```text
//! Scene graph (renderer-owned)
//!      ↕  world transform get/set through NodeId   (SceneNodes)
//! Engine (bridge)
//!      ↑  vertex/index snapshot at shape construction (GeometrySource)
//! Render geometry
//! ```
//!
//! [`NodeTable`] and [`MeshGeometry`] are small reference implementations used
//! by the tests and the demo; real renderers implement the traits directly.

mod scene_graph;
mod geometry;

pub use scene_graph::{NodeId, SceneNodes, SceneNode, NodeTable};
pub use geometry::{GeometrySource, MeshGeometry};
