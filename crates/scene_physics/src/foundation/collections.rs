//! Specialized collection types

pub use slotmap::{SlotMap, SecondaryMap, new_key_type};

new_key_type! {
    /// Stable key of a collider slot inside an [`Engine`](crate::physics::Engine) registry
    pub struct ColliderKey;
}
