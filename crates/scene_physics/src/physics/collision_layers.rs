//! Collision layers for filtering which colliders interact
//!
//! Each collider carries a membership set and a filter set. Two colliders
//! interact only when each one's membership intersects the other's filter.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of collision layers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionLayers: u32 {
        /// Static environment geometry
        const ENVIRONMENT = 1 << 0;
        /// Dynamic props
        const DYNAMIC = 1 << 1;
        /// Trigger volumes
        const TRIGGER = 1 << 2;
        /// Characters
        const CHARACTER = 1 << 3;
        /// Debris and small physics objects
        const DEBRIS = 1 << 4;
        /// First layer free for application use; bits 8 and up are unassigned
        const CUSTOM_0 = 1 << 8;
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::all_layers()
    }
}

impl CollisionLayers {
    /// Every one of the 32 bits, named or not
    pub const fn all_layers() -> Self {
        Self::from_bits_retain(u32::MAX)
    }

    /// Layer `index` (0-31); out-of-range indices give the empty set
    pub const fn layer(index: u32) -> Self {
        if index < u32::BITS {
            Self::from_bits_retain(1 << index)
        } else {
            Self::empty()
        }
    }
}

/// Membership and filter of one collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayerFilter {
    /// Layers this collider belongs to
    pub membership: CollisionLayers,
    /// Layers this collider wants to interact with
    pub filter: CollisionLayers,
}

impl LayerFilter {
    /// Create a filter
    pub const fn new(membership: CollisionLayers, filter: CollisionLayers) -> Self {
        Self { membership, filter }
    }

    /// Mutual test: A's membership in B's filter and B's membership in A's filter
    pub fn interacts_with(&self, other: &LayerFilter) -> bool {
        self.membership.intersects(other.filter) && other.membership.intersects(self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interacts_with_everything() {
        let open = LayerFilter::default();
        let trigger = LayerFilter::new(CollisionLayers::TRIGGER, CollisionLayers::DYNAMIC);
        assert!(open.interacts_with(&trigger));
        assert!(trigger.interacts_with(&open));
    }

    #[test]
    fn test_mutual_interaction() {
        let prop = LayerFilter::new(CollisionLayers::DYNAMIC, CollisionLayers::ENVIRONMENT | CollisionLayers::TRIGGER);
        let floor = LayerFilter::new(CollisionLayers::ENVIRONMENT, CollisionLayers::DYNAMIC);
        assert!(prop.interacts_with(&floor));
        assert!(floor.interacts_with(&prop));
    }

    #[test]
    fn test_one_way_interest_is_not_enough() {
        let prop = LayerFilter::new(CollisionLayers::DYNAMIC, CollisionLayers::DEBRIS);
        let debris = LayerFilter::new(CollisionLayers::DEBRIS, CollisionLayers::ENVIRONMENT);
        assert!(!prop.interacts_with(&debris));
    }

    #[test]
    fn test_numbered_layers() {
        assert_eq!(CollisionLayers::layer(8), CollisionLayers::CUSTOM_0);
        assert!(CollisionLayers::layer(32).is_empty());
        assert_eq!(CollisionLayers::all_layers().bits(), u32::MAX);
    }
}
