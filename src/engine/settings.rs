// Application settings
// Built once at startup and handed to constructors by reference; nothing here is mutated at runtime.

use glam::Vec3;
use super::colormap::ColorMap;

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub window: WindowSettings,
    pub camera: CameraSettings,
    pub mesh: MeshSettings,
}

#[derive(Debug, Clone)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    /// Clear color, display RGB written unconverted to a non-sRGB surface.
    pub background: [f64; 3],
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 900,
            background: [0.9, 0.9, 0.9],
        }
    }
}

impl WindowSettings {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Shared by both camera variants.
#[derive(Debug, Clone, Copy)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,

    /// First-person translation speed in world units per second
    pub move_speed: f32,

    /// First-person look speed in degrees per pixel of mouse motion
    pub sensitivity: f32,

    /// Orbit rotation speed in degrees per pixel of mouse motion
    pub orbit_speed: f32,

    /// Orbit radius change per second while a zoom key is held
    pub zoom_speed: f32,

    /// Orbit radius change per scroll line
    pub wheel_zoom_step: f32,

    /// Threshold below which a direction component counts as zero
    pub epsilon: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_deg: 60.0,
            near: 0.01,
            far: 1000.0,
            move_speed: 10.0,
            sensitivity: 0.1,
            orbit_speed: 0.1,
            zoom_speed: 30.0,
            wheel_zoom_step: 0.5,
            epsilon: 1e-7,
        }
    }
}

impl CameraSettings {
    /// Largest orbit radius the camera accepts.
    pub fn max_radius(&self) -> f32 {
        self.far + 100.0
    }
}

pub const MIN_ORBIT_RADIUS: f32 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct MeshSettings {
    /// Half-extent of each normalized axis: x, y (height), z.
    pub scale: Vec3,
    pub colormap: ColorMap,
    pub light_position: Vec3,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            scale: Vec3::new(5.0, 1.5, 5.0),
            colormap: ColorMap::Jet,
            light_position: Vec3::new(2.5, 5.0, -2.5),
        }
    }
}
