//! Scene node contract and a reference node table
//!
//! Colliders refer to scene nodes by [`NodeId`] only. The node table stays
//! owned by the renderer and is lent to the engine for the duration of a call,
//! so the bridge can never extend a node's lifetime.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::Transform;

new_key_type! {
    /// Non-owning reference to a node in an externally owned scene graph
    ///
    /// External scene graphs with their own ids can map them through
    /// `slotmap::KeyData::from_ffi` / `NodeId::from`.
    pub struct NodeId;
}

/// Transform access the bridge needs from a scene graph
///
/// Only getters and setters; node creation, parenting and lifetime are the
/// scene graph's business.
pub trait SceneNodes {
    /// World transform of `node`, or `None` if the node no longer exists
    fn world_transform(&self, node: NodeId) -> Option<Transform>;

    /// Overwrite the world transform of `node`; returns false if the node no longer exists
    fn set_world_transform(&mut self, node: NodeId, transform: Transform) -> bool;
}

/// A node of [`NodeTable`]
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Debug name
    pub name: String,
    /// Transform relative to the parent (or the world for root nodes)
    pub local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    /// Parent node, if any
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Slot-map backed scene graph with parenting
///
/// Sufficient for tests and headless demos. World transforms are resolved by
/// walking the parent chain on demand.
#[derive(Debug, Default)]
pub struct NodeTable {
    nodes: SlotMap<NodeId, SceneNode>,
}

impl NodeTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root node
    pub fn insert(&mut self, name: impl Into<String>, local: Transform) -> NodeId {
        self.nodes.insert(SceneNode {
            name: name.into(),
            local,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Insert a node under `parent`; `None` if the parent does not exist
    pub fn insert_child(&mut self, parent: NodeId, name: impl Into<String>, local: Transform) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let child = self.nodes.insert(SceneNode {
            name: name.into(),
            local,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(child);
        Some(child)
    }

    /// Remove a node; its children become roots and keep their world transform
    pub fn remove(&mut self, node: NodeId) -> Option<SceneNode> {
        let world_of_children: Vec<(NodeId, Transform)> = self
            .nodes
            .get(node)?
            .children
            .iter()
            .filter_map(|&child| Some((child, self.world_transform(child)?)))
            .collect();

        let removed = self.nodes.remove(node)?;
        if let Some(parent) = removed.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&c| c != node);
        }
        for (child, world) in world_of_children {
            if let Some(entry) = self.nodes.get_mut(child) {
                entry.parent = None;
                entry.local = world;
            }
        }
        Some(removed)
    }

    /// Borrow a node
    pub fn get(&self, node: NodeId) -> Option<&SceneNode> {
        self.nodes.get(node)
    }

    /// Local transform of a node
    pub fn local_transform(&self, node: NodeId) -> Option<Transform> {
        self.nodes.get(node).map(|n| n.local)
    }

    /// Overwrite the local transform of a node
    pub fn set_local_transform(&mut self, node: NodeId, local: Transform) -> bool {
        match self.nodes.get_mut(node) {
            Some(entry) => {
                entry.local = local;
                true
            }
            None => false,
        }
    }

    /// Whether the node exists
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the table holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SceneNodes for NodeTable {
    fn world_transform(&self, node: NodeId) -> Option<Transform> {
        let entry = self.nodes.get(node)?;
        let mut world = entry.local;
        let mut parent = entry.parent;
        while let Some(id) = parent {
            let p = self.nodes.get(id)?;
            world = p.local.combine(&world);
            parent = p.parent;
        }
        Some(world)
    }

    fn set_world_transform(&mut self, node: NodeId, transform: Transform) -> bool {
        let Some(entry) = self.nodes.get(node) else {
            return false;
        };
        let local = match entry.parent.and_then(|p| self.world_transform(p)) {
            Some(parent_world) => parent_world.inverse().combine(&transform),
            None => transform,
        };
        self.set_local_transform(node, local)
    }
}
