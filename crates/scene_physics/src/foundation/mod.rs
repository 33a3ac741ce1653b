//! Shared building blocks: nalgebra-backed math, slotmap key types and
//! logger setup.

pub mod math;
pub mod collections;
pub mod logging;
