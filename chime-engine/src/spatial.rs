//! Spatial parameters stored per voice and per listener
//!
//! The engine keeps these values so they can be read back, but it does not
//! apply spatialization or distance attenuation when mixing.

use std::f32::consts::TAU;

/// A point or direction in 3-D space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Default facing direction for voices and listeners (right-handed, -Z forward)
    pub const FORWARD: Self = Self::new(0.0, 0.0, -1.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// Directional cone (angles in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub inner_angle: f32,
    pub outer_angle: f32,
    pub outer_gain: f32,
}

impl Default for Cone {
    /// Omnidirectional
    fn default() -> Self {
        Self {
            inner_angle: TAU,
            outer_angle: TAU,
            outer_gain: 1.0,
        }
    }
}

/// Distance attenuation model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttenuationModel {
    None,
    #[default]
    Inverse,
    Linear,
    Exponential,
}

/// Positional state of a voice
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialParams {
    pub position: Vector3,
    pub direction: Vector3,
    pub velocity: Vector3,
    pub cone: Cone,
    pub attenuation: AttenuationModel,
    pub rolloff: f32,
    pub min_gain: f32,
    pub max_gain: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub doppler_factor: f32,
    /// Listener slot this voice is pinned to, if any
    pub pinned_listener: Option<u32>,
}

impl Default for SpatialParams {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            direction: Vector3::FORWARD,
            velocity: Vector3::ZERO,
            cone: Cone::default(),
            attenuation: AttenuationModel::default(),
            rolloff: 1.0,
            min_gain: 0.0,
            max_gain: 1.0,
            min_distance: 1.0,
            max_distance: f32::MAX,
            doppler_factor: 1.0,
            pinned_listener: None,
        }
    }
}
