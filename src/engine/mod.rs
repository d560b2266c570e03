// Engine module - height-field plot core plus the wgpu/egui collaborators that draw it
// Core (grid → mesh, cameras, scene) is pure data and unit tested; renderer and
// debug_overlay need a device and are exercised by the viewer binary.

pub mod camera;
pub mod colormap;
pub mod debug_overlay;
pub mod error;
pub mod grid;
pub mod input;
pub mod mesh;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod surface;

// Re-export commonly used items
pub use camera::{Camera, CameraMode, CameraRig, CameraState, FirstPersonCamera, OrbitCamera};
pub use colormap::ColorMap;
pub use error::{PlotError, Result};
pub use grid::{Grid, GridData, linspace};
pub use input::{Action, InputState};
pub use scene::{DrawCommand, Drawable, FrameUniforms, RenderPass, Scene, Transform};
pub use settings::Settings;
pub use surface::SurfaceMesh;
