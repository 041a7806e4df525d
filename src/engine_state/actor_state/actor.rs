//! # Actor
//!
//! The first-person body moving through the world: position, view orientation
//! and the jump state machine. Movement itself is integrated by the
//! [`CollisionResolver`](super::collision::CollisionResolver).

use cgmath::{Point3, Rad, Vector3};
use std::f32::consts::FRAC_PI_2;

use crate::engine_state::voxels::block::block_type::BlockType;

/// Safe limit for pitch to prevent gimbal lock
const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// Height of the eye above the actor position.
pub const EYE_OFFSET: f32 = 1.0;

/// A first-person actor.
///
/// Yaw 0 looks along +Z and a quarter turn looks along +X.
#[derive(Debug, Clone)]
pub struct Actor {
    /// Center of the actor in world space
    pub position: Point3<f32>,
    /// Horizontal rotation (around Y axis)
    pub yaw: Rad<f32>,
    /// Vertical rotation, clamped short of straight up and down
    pub pitch: Rad<f32>,
    /// Rising phase of a jump
    pub is_jumping: bool,
    /// Height the current jump took off from
    pub jump_origin_y: f32,
    /// Whether the last vertical step hit the ground
    pub grounded: bool,
    /// Block type placed by the actor
    pub selected_block: BlockType,
}

impl Actor {
    /// Creates an actor at `position` looking along +Z.
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            is_jumping: false,
            jump_origin_y: position.y,
            grounded: false,
            selected_block: BlockType::Dirt,
        }
    }

    /// Horizontal forward direction.
    pub fn forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        Vector3::new(yaw_sin, 0.0, yaw_cos)
    }

    /// Horizontal direction to the actor's right.
    pub fn right(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        Vector3::new(-yaw_cos, 0.0, yaw_sin)
    }

    /// Unit vector the actor looks along, including pitch.
    pub fn view_direction(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        Vector3::new(pitch_cos * yaw_sin, pitch_sin, pitch_cos * yaw_cos)
    }

    /// Origin of the picking ray.
    pub fn eye(&self) -> Point3<f32> {
        self.position + Vector3::new(0.0, EYE_OFFSET, 0.0)
    }

    /// Applies a look delta and clamps the pitch.
    pub fn rotate(&mut self, yaw_delta: Rad<f32>, pitch_delta: Rad<f32>) {
        self.yaw += yaw_delta;
        self.pitch += pitch_delta;

        // Clamp pitch to prevent gimbal lock
        if self.pitch < -Rad(SAFE_FRAC_PI_2) {
            self.pitch = -Rad(SAFE_FRAC_PI_2);
        } else if self.pitch > Rad(SAFE_FRAC_PI_2) {
            self.pitch = Rad(SAFE_FRAC_PI_2);
        }
    }

    /// Starts a jump when standing on the ground and not already jumping.
    ///
    /// # Returns
    /// Whether a jump started. The rise begins with the next movement step.
    pub fn try_jump(&mut self) -> bool {
        if self.is_jumping || !self.grounded {
            return false;
        }
        self.is_jumping = true;
        self.jump_origin_y = self.position.y;
        true
    }

    /// Integer cell containing the actor position.
    pub fn cell(&self) -> Point3<i32> {
        Point3::new(
            self.position.x.round() as i32,
            self.position.y.round() as i32,
            self.position.z.round() as i32,
        )
    }
}
