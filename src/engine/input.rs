// Input state tracking for keyboard and mouse
// Abstracts winit events into a queryable per-frame snapshot

use std::collections::HashSet;
use glam::Vec2;
use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Discrete, once-per-press commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    ToggleWireframe,
    ToggleLighting,
    SwitchCamera,
    Screenshot,
    ToggleOverlay,
}

impl Action {
    pub fn for_key(key: KeyCode) -> Option<Action> {
        match key {
            KeyCode::Escape => Some(Action::Quit),
            KeyCode::KeyG => Some(Action::ToggleWireframe),
            KeyCode::KeyL => Some(Action::ToggleLighting),
            KeyCode::KeyC => Some(Action::SwitchCamera),
            KeyCode::KeyP => Some(Action::Screenshot),
            KeyCode::F3 => Some(Action::ToggleOverlay),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct InputState {
    // Keyboard
    keys_held: HashSet<KeyCode>,
    // Went down since the last end_frame(); repeats excluded
    keys_pressed: Vec<KeyCode>,

    // Raw (unaccelerated) mouse motion accumulated this frame, reset in end_frame()
    pub mouse_delta: (f32, f32),

    // Scroll: accumulated vertical scroll this frame, reset in end_frame()
    pub scroll_delta: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the app's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed if !event.repeat => self.press_key(key),
                        ElementState::Pressed => {}
                        ElementState::Released => self.release_key(key),
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.scroll_delta += y;
            }
            WindowEvent::Focused(false) => {
                // key-up events are lost while unfocused
                self.keys_held.clear();
            }
            _ => {}
        }
    }

    /// Feed raw device motion. The cursor is grabbed, so window cursor positions are useless.
    pub fn process_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse_delta.0 += delta.0 as f32;
            self.mouse_delta.1 += delta.1 as f32;
        }
    }

    pub fn press_key(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.push(key);
        }
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    /// Call once per frame after update() and render() have consumed input.
    /// Resets per-frame accumulators.
    pub fn end_frame(&mut self) {
        self.scroll_delta = 0.0;
        self.mouse_delta = (0.0, 0.0);
        self.keys_pressed.clear();
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn mouse_delta(&self) -> Vec2 {
        Vec2::new(self.mouse_delta.0, self.mouse_delta.1)
    }

    /// Bound actions triggered this frame, in press order.
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.keys_pressed.iter().filter_map(|&key| Action::for_key(key))
    }
}
