//! Free-look (fly) camera controller
//!
//! Yaw/pitch are tracked in degrees and the orthonormal basis is recomputed
//! from them on every change; the basis vectors are never integrated
//! directly, so they cannot drift out of orthogonality.

use glam::{Vec2, Vec3};

use super::Camera;

const WORLD_UP: Vec3 = Vec3::Y;

/// Default flying speed in world units per second
pub const MOVEMENT_SPEED: f32 = 20.5;
/// Mouse sensitivity in degrees per pixel per second
pub const MOUSE_SENSITIVITY: f32 = 15.0;
/// Pitch is clamped short of the poles to avoid gimbal flip
pub const PITCH_LIMIT: f32 = 89.0;
/// Field-of-view zoom range in degrees
pub const FOVY_MIN: f32 = 1.0;
pub const FOVY_MAX: f32 = 45.0;

/// Input state sampled once per frame and fed to the controller
#[derive(Debug, Clone, Default)]
pub struct CameraInput {
    /// Movement keys (WASD, Space/Shift for up/down)
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,

    /// Sprint modifier transitions. Edge events, not polled state: the
    /// speed change happens on the press and reverts on the release.
    pub sprint_pressed: bool,
    pub sprint_released: bool,

    /// Mouse delta since last frame (in pixels)
    pub mouse_delta: Vec2,

    /// Mouse scroll delta (positive = scroll up)
    pub scroll_delta: f32,

    /// Whether mouse look is active (cursor captured)
    pub look_active: bool,
}

impl CameraInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-frame deltas and edges (call after update)
    pub fn reset_deltas(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
        self.sprint_pressed = false;
        self.sprint_released = false;
    }
}

/// Free-look first-person camera controller
///
/// - WASD: fly forward/backward/left/right
/// - Space/LShift: fly up/down along the camera's up vector
/// - Mouse: look around (while the cursor is captured)
/// - LCtrl: sprint (2x speed while held)
/// - Scroll: zoom (narrow/widen the field of view)
#[derive(Debug, Clone)]
pub struct FreeLookCamera {
    yaw: f32,
    pitch: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    base_speed: f32,
    current_speed: f32,
    sensitivity: f32,
    home_position: Vec3,
}

impl Default for FreeLookCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl FreeLookCamera {
    pub fn new(home_position: Vec3) -> Self {
        let mut controller = Self {
            yaw: -90.0,
            pitch: 0.0,
            front: -Vec3::Z,
            right: Vec3::X,
            up: Vec3::Y,
            base_speed: MOVEMENT_SPEED,
            current_speed: MOVEMENT_SPEED,
            sensitivity: MOUSE_SENSITIVITY,
            home_position,
        };
        controller.update_vectors();
        controller
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.base_speed = speed;
        self.current_speed = speed;
        self
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    /// Recompute the orthonormal basis from yaw/pitch.
    ///
    /// Right and up are renormalized because front's projection shrinks as
    /// pitch approaches the poles.
    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.front = front.normalize();
        self.right = self.front.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    /// Apply a mouse delta, in pixels, scaled by sensitivity and frame time.
    pub fn apply_mouse_delta(&mut self, delta: Vec2, dt: f32) {
        self.yaw += delta.x * self.sensitivity * dt;
        self.pitch -= delta.y * self.sensitivity * dt;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Movement displacement for this frame from the held movement keys.
    ///
    /// The accumulated direction is deliberately not normalized: diagonal
    /// flight is faster, matching the observed behaviour of the demos this
    /// controller reproduces.
    pub fn movement_delta(&self, input: &CameraInput, dt: f32) -> Vec3 {
        let mut direction = Vec3::ZERO;
        if input.forward {
            direction += self.front;
        }
        if input.backward {
            direction -= self.front;
        }
        if input.right {
            direction += self.right;
        }
        if input.left {
            direction -= self.right;
        }
        if input.up {
            direction += self.up;
        }
        if input.down {
            direction -= self.up;
        }
        direction * self.current_speed * dt
    }

    /// Sprint is edge-triggered: double speed on the press transition,
    /// restore base speed on the release transition.
    pub fn apply_sprint(&mut self, input: &CameraInput) {
        if input.sprint_pressed {
            self.current_speed = self.base_speed * 2.0;
        }
        if input.sprint_released {
            self.current_speed = self.base_speed;
        }
    }

    /// Zoom by adjusting the field of view, clamped to [1, 45] degrees.
    pub fn apply_zoom(fovy_degrees: f32, scroll_delta: f32) -> f32 {
        (fovy_degrees - scroll_delta).clamp(FOVY_MIN, FOVY_MAX)
    }

    /// The point the camera looks at: position + front.
    pub fn view_target(&self, position: Vec3) -> Vec3 {
        position + self.front
    }

    /// Per-frame controller entry point: sprint edges, movement, mouse look,
    /// look-at target, zoom.
    pub fn update(&mut self, camera: &mut Camera, input: &CameraInput, dt: f32) {
        self.apply_sprint(input);

        camera.position += self.movement_delta(input, dt);

        if input.look_active && input.mouse_delta != Vec2::ZERO {
            self.apply_mouse_delta(input.mouse_delta, dt);
        }

        camera.target = self.view_target(camera.position);

        if input.scroll_delta != 0.0 {
            if let Some(fovy) = camera.projection.fovy_degrees() {
                camera
                    .projection
                    .set_fovy_degrees(Self::apply_zoom(fovy, input.scroll_delta));
            }
        }
    }

    /// Restore the spawn pose: home position, level view down -Z, base speed.
    pub fn reset(&mut self, camera: &mut Camera) {
        self.yaw = -90.0;
        self.pitch = 0.0;
        self.current_speed = self.base_speed;
        self.update_vectors();
        camera.position = self.home_position;
        camera.target = self.view_target(camera.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_orthonormal(controller: &FreeLookCamera) {
        let (f, r, u) = (controller.front(), controller.right(), controller.up());
        assert!((f.length() - 1.0).abs() < EPS, "front not unit: {f:?}");
        assert!((r.length() - 1.0).abs() < EPS, "right not unit: {r:?}");
        assert!((u.length() - 1.0).abs() < EPS, "up not unit: {u:?}");
        assert!(f.dot(r).abs() < EPS, "front/right not orthogonal");
        assert!(f.dot(u).abs() < EPS, "front/up not orthogonal");
        assert!(r.dot(u).abs() < EPS, "right/up not orthogonal");
    }

    #[test]
    fn basis_stays_orthonormal_across_look_sweep() {
        let mut controller = FreeLookCamera::new(Vec3::ZERO);
        for step in 0..200 {
            let dx = (step as f32 * 7.3) % 23.0 - 11.0;
            let dy = (step as f32 * 3.1) % 17.0 - 8.0;
            controller.apply_mouse_delta(Vec2::new(dx, dy), 1.0 / 60.0);
            assert_orthonormal(&controller);
        }
    }

    #[test]
    fn pitch_clamps_at_poles() {
        let mut controller = FreeLookCamera::new(Vec3::ZERO);
        for _ in 0..100 {
            controller.apply_mouse_delta(Vec2::new(0.0, -1000.0), 1.0);
        }
        assert_eq!(controller.pitch(), PITCH_LIMIT);

        for _ in 0..100 {
            controller.apply_mouse_delta(Vec2::new(0.0, 1000.0), 1.0);
        }
        assert_eq!(controller.pitch(), -PITCH_LIMIT);
        assert_orthonormal(&controller);
    }

    #[test]
    fn zoom_clamps_to_fov_range() {
        assert_eq!(FreeLookCamera::apply_zoom(45.0, -10.0), FOVY_MAX);
        assert_eq!(FreeLookCamera::apply_zoom(2.0, 10.0), FOVY_MIN);
        assert!((FreeLookCamera::apply_zoom(30.0, 5.0) - 25.0).abs() < EPS);
    }

    #[test]
    fn sprint_is_edge_triggered() {
        let mut controller = FreeLookCamera::new(Vec3::ZERO);
        let mut input = CameraInput::new();

        input.sprint_pressed = true;
        controller.apply_sprint(&input);
        assert_eq!(controller.current_speed(), MOVEMENT_SPEED * 2.0);

        // Held (no new edge): speed stays doubled
        input.sprint_pressed = false;
        controller.apply_sprint(&input);
        assert_eq!(controller.current_speed(), MOVEMENT_SPEED * 2.0);

        input.sprint_released = true;
        controller.apply_sprint(&input);
        assert_eq!(controller.current_speed(), MOVEMENT_SPEED);
    }

    #[test]
    fn diagonal_movement_is_not_normalized() {
        let controller = FreeLookCamera::new(Vec3::ZERO);
        let mut input = CameraInput::new();
        input.forward = true;
        input.right = true;

        let delta = controller.movement_delta(&input, 1.0);
        let single = controller.movement_delta(
            &CameraInput {
                forward: true,
                ..Default::default()
            },
            1.0,
        );
        assert!(delta.length() > single.length() * 1.2);
    }

    #[test]
    fn movement_follows_look_direction() {
        let mut controller = FreeLookCamera::new(Vec3::ZERO);
        // Look along +X
        controller.apply_mouse_delta(Vec2::new(90.0 / MOUSE_SENSITIVITY, 0.0), 1.0);
        let mut input = CameraInput::new();
        input.forward = true;

        let delta = controller.movement_delta(&input, 1.0);
        assert!(delta.x > 0.0);
        assert!(delta.z.abs() < 1e-3);
    }

    #[test]
    fn view_target_is_position_plus_front() {
        let controller = FreeLookCamera::new(Vec3::ZERO);
        let pos = Vec3::new(1.0, 2.0, 3.0);
        let target = controller.view_target(pos);
        assert!((target - pos - controller.front()).length() < EPS);
    }

    #[test]
    fn reset_restores_home_pose() {
        let home = Vec3::new(0.0, 0.0, 155.0);
        let mut controller = FreeLookCamera::new(home);
        let mut camera = Camera::new(home, Vec3::ZERO);

        let mut input = CameraInput::new();
        input.forward = true;
        input.look_active = true;
        input.mouse_delta = Vec2::new(40.0, 25.0);
        controller.update(&mut camera, &input, 0.5);
        assert_ne!(camera.position, home);

        controller.reset(&mut camera);
        assert_eq!(camera.position, home);
        assert_eq!(controller.yaw(), -90.0);
        assert_eq!(controller.pitch(), 0.0);
    }
}
