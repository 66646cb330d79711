//! Per-frame input collection
//!
//! Accumulates winit events into a snapshot the demos read during
//! `update`: held keys, pressed-this-frame edges, mouse state, and the
//! [`CameraInput`] fed to the free-look controller.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::scene::CameraInput;

/// Input snapshot for one frame
pub struct DemoInput {
    held: HashSet<KeyCode>,
    pressed: HashSet<KeyCode>,
    mouse_position: Vec2,
    mouse_left_down: bool,
    mouse_right_down: bool,
    cursor_captured: bool,
    /// Camera-facing view of the same events
    pub camera: CameraInput,
}

impl Default for DemoInput {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoInput {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            pressed: HashSet::new(),
            mouse_position: Vec2::ZERO,
            mouse_left_down: false,
            mouse_right_down: false,
            cursor_captured: false,
            camera: CameraInput::new(),
        }
    }

    /// Key currently held down
    pub fn key_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Key pressed this frame (edge, ignores repeats)
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Cursor position in window pixels
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn mouse_left_down(&self) -> bool {
        self.mouse_left_down
    }

    pub fn mouse_right_down(&self) -> bool {
        self.mouse_right_down
    }

    pub(crate) fn set_cursor_captured(&mut self, captured: bool) {
        self.cursor_captured = captured;
        self.camera.look_active = captured;
    }

    pub fn cursor_captured(&self) -> bool {
        self.cursor_captured
    }

    /// Fold a window event into the snapshot
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => {
                        if !event.repeat {
                            self.pressed.insert(key);
                            if key == KeyCode::ControlLeft {
                                self.camera.sprint_pressed = true;
                            }
                        }
                        self.held.insert(key);
                    }
                    ElementState::Released => {
                        self.held.remove(&key);
                        if key == KeyCode::ControlLeft {
                            self.camera.sprint_released = true;
                        }
                    }
                }
                self.refresh_camera_keys();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let down = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.mouse_left_down = down,
                    MouseButton::Right => self.mouse_right_down = down,
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.camera.scroll_delta += scroll;
            }
            WindowEvent::Focused(false) => {
                // Release everything so keys don't stick across focus loss
                self.held.clear();
                self.pressed.clear();
                self.mouse_left_down = false;
                self.mouse_right_down = false;
                let look_active = self.camera.look_active;
                self.camera = CameraInput::new();
                self.camera.look_active = look_active;
            }
            _ => {}
        }
    }

    /// Fold a device event into the snapshot. Raw mouse motion only counts
    /// toward mouse look while the cursor is captured.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.cursor_captured {
                self.camera.mouse_delta.x += delta.0 as f32;
                self.camera.mouse_delta.y += delta.1 as f32;
            }
        }
    }

    /// Clear per-frame edges and deltas. Call after `update` each frame.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.camera.reset_deltas();
    }

    fn refresh_camera_keys(&mut self) {
        self.camera.forward = self.held.contains(&KeyCode::KeyW);
        self.camera.backward = self.held.contains(&KeyCode::KeyS);
        self.camera.left = self.held.contains(&KeyCode::KeyA);
        self.camera.right = self.held.contains(&KeyCode::KeyD);
        self.camera.up = self.held.contains(&KeyCode::Space);
        self.camera.down = self.held.contains(&KeyCode::ShiftLeft);
    }
}
