//! Listener slots

use crate::spatial::{Cone, Vector3};

/// Maximum number of listener slots an engine can be configured with
pub const MAX_LISTENERS: u32 = 4;

/// State of one listener slot
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerSlot {
    pub position: Vector3,
    pub direction: Vector3,
    pub world_up: Vector3,
    pub cone: Cone,
}

impl Default for ListenerSlot {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            direction: Vector3::FORWARD,
            world_up: Vector3::UP,
            cone: Cone::default(),
        }
    }
}
