//! Listener handles

use crate::handle::Handle;
use chime_engine::{Cone, EngineRef, ListenerSlot, Vector3};

/// Handle to one of the engine's listener slots
pub type Listener = Handle<ListenerImpl>;

/// Implementation object behind a `Listener`
pub struct ListenerImpl {
    engine: EngineRef,
    index: u32,
}

impl ListenerImpl {
    pub(crate) fn new(engine: EngineRef, index: u32) -> Self {
        Self { engine, index }
    }

    fn read<R: Default>(&self, f: impl FnOnce(&ListenerSlot) -> R) -> R {
        self.engine
            .with(|state| state.listener(self.index).map(f))
            .flatten()
            .unwrap_or_default()
    }

    fn write(&self, f: impl FnOnce(&mut ListenerSlot)) {
        self.engine.with(|state| state.listener_mut(self.index).map(f));
    }
}

impl Handle<ListenerImpl> {
    /// Slot index on the engine
    #[track_caller]
    pub fn index(&self) -> u32 {
        self.object().index
    }

    #[track_caller]
    pub fn set_position(&self, position: impl Into<Vector3>) {
        let position = position.into();
        self.object().write(|slot| slot.position = position);
    }

    #[track_caller]
    pub fn position(&self) -> Vector3 {
        self.object().read(|slot| slot.position)
    }

    /// Facing direction
    #[track_caller]
    pub fn set_direction(&self, direction: impl Into<Vector3>) {
        let direction = direction.into();
        self.object().write(|slot| slot.direction = direction);
    }

    #[track_caller]
    pub fn direction(&self) -> Vector3 {
        self.object().read(|slot| slot.direction)
    }

    #[track_caller]
    pub fn set_world_up(&self, up: impl Into<Vector3>) {
        let up = up.into();
        self.object().write(|slot| slot.world_up = up);
    }

    #[track_caller]
    pub fn world_up(&self) -> Vector3 {
        self.object().read(|slot| slot.world_up)
    }

    /// Directional cone (angles in radians)
    #[track_caller]
    pub fn set_cone(&self, inner_angle: f32, outer_angle: f32, outer_gain: f32) {
        let cone = Cone {
            inner_angle,
            outer_angle,
            outer_gain,
        };
        self.object().write(|slot| slot.cone = cone);
    }

    #[track_caller]
    pub fn cone(&self) -> Cone {
        self.object().read(|slot| slot.cone)
    }
}

#[cfg(test)]
mod tests {
    use crate::Device;
    use chime_engine::{EngineConfig, Vector3};
    use std::f32::consts::{PI, TAU};

    #[test]
    fn test_defaults() {
        let device = Device::headless(&EngineConfig::default());
        let listener = device.listener(0);
        assert_eq!(listener.position(), Vector3::ZERO);
        assert_eq!(listener.direction(), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(listener.world_up(), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(listener.cone().inner_angle, TAU);
    }

    #[test]
    fn test_copies_share_slot() {
        let device = Device::headless(&EngineConfig::default());
        let a = device.listener(1);
        let b = a.clone();
        a.set_position(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(b.position(), Vector3::new(1.0, 2.0, 3.0));

        // A fresh handle to the same slot reads the engine, not a cache
        let c = device.listener(1);
        assert_eq!(c.position(), Vector3::new(1.0, 2.0, 3.0));
        assert_ne!(a, c);
    }

    #[test]
    fn test_cone() {
        let device = Device::headless(&EngineConfig::default());
        let listener = device.listener(0);
        listener.set_cone(PI, TAU, 0.25);
        let cone = listener.cone();
        assert_eq!((cone.inner_angle, cone.outer_angle, cone.outer_gain), (PI, TAU, 0.25));
    }

    #[test]
    fn test_outlives_device() {
        let device = Device::headless(&EngineConfig::default());
        let listener = device.listener(0);
        drop(device);
        listener.set_position(Vector3::new(5.0, 0.0, 0.0));
        assert_eq!(listener.position(), Vector3::ZERO);
    }

    #[test]
    #[should_panic(expected = "null ListenerImpl handle")]
    fn test_null_listener_panics() {
        let device = Device::headless(&EngineConfig::default());
        device.listener(99).set_position(Vector3::new(0.0, 0.0, 0.0));
    }
}
