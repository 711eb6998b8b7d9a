//! Orbit camera driven by normalized input events.
//!
//! The camera orbits a target point: dragging with the primary button
//! rotates around the target, shift-dragging pans the target in the view
//! plane, and the wheel zooms along the view direction. Whether a drag
//! rotates or pans is latched when the drag begins, so pressing or
//! releasing shift mid-drag does not switch modes.

use glam::{Mat4, Vec3};

use crate::input::{InputEvent, MouseButton};

const FOV_Y_RADIANS: f32 = std::f32::consts::FRAC_PI_4;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 1000.0;
const MIN_DISTANCE: f32 = 0.01;
const MAX_DISTANCE: f32 = 1000.0;
/// Keep a little away from the poles so the up vector stays valid.
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Orbit camera state and event handling.
pub struct CameraController {
    target: Vec3,
    distance: f32,
    yaw: f32,
    pitch: f32,
    /// Rotate, pan and zoom sensitivity.
    pub sensitivity: f32,
    dragging: Option<MouseButton>,
    /// Once a drag starts rotating (or panning), keep doing that for the
    /// whole drag even if the shift state changes.
    is_rotating: Option<bool>,
}

impl CameraController {
    /// Camera looking at the origin from the default vantage point.
    pub fn new() -> Self {
        Self::looking_at(Vec3::new(1.0, 3.0, -5.0), Vec3::ZERO)
    }

    /// Camera at `position` orbiting around `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length().max(MIN_DISTANCE);
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / distance).asin().clamp(-MAX_PITCH, MAX_PITCH);
        Self {
            target,
            distance,
            yaw,
            pitch,
            sensitivity: 1.0,
            dragging: None,
            is_rotating: None,
        }
    }

    /// Apply one input event to the camera state. Events the camera does
    /// not care about are ignored.
    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown {
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = Some(MouseButton::Left);
            }
            InputEvent::PointerUp {
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = None;
                self.is_rotating = None;
            }
            InputEvent::PointerMove {
                delta_x,
                delta_y,
                modifiers,
                ..
            } if self.dragging.is_some() => {
                let should_rotate = self.is_rotating.unwrap_or(!modifiers.shift);
                if should_rotate {
                    self.is_rotating = Some(true);
                    self.rotate(*delta_x, *delta_y);
                } else {
                    self.is_rotating = Some(false);
                    self.pan(*delta_x, *delta_y);
                }
            }
            InputEvent::Wheel { delta_y, .. } if *delta_y != 0.0 => {
                self.zoom(*delta_y);
            }
            _ => {}
        }
    }

    fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw -= delta_x * self.sensitivity * 0.05;
        self.pitch = (self.pitch + delta_y * self.sensitivity * 0.05)
            .clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Pan in the view plane, scaled by the orbit distance so the target
    /// tracks the pointer regardless of zoom level.
    fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let scale = self.sensitivity * 0.01 * self.distance;
        let view_dir = (self.target - self.position()).normalize();
        let right = view_dir.cross(Vec3::Y).normalize();
        let up = right.cross(view_dir);
        self.target += right * (-delta_x * scale) + up * (delta_y * scale);
    }

    /// Move 10% of the current distance per scroll step, toward the target
    /// for positive steps.
    fn zoom(&mut self, delta_y: f32) {
        let delta = delta_y.signum() * self.sensitivity * 0.1 * self.distance;
        self.distance = (self.distance - delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// World-space camera position.
    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        ) * self.distance;
        self.target + offset
    }

    /// Point the camera orbits around.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Combined view-projection matrix for a viewport of the given size in
    /// backing-store pixels.
    pub fn view_proj(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let projection = Mat4::perspective_rh_gl(FOV_Y_RADIANS, aspect, NEAR_PLANE, FAR_PLANE);
        let view = Mat4::look_at_rh(self.position(), self.target, Vec3::Y);
        projection * view
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}
