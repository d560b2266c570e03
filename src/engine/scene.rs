// Scene: named drawables in registration order, turned into an ordered draw-command
// list once per frame.
//
// The scene never touches GPU handles. render() produces a RenderPass value
// (per drawable: pipeline kind, topology, vertex count, uniform block) that the
// renderer uploads and executes as-is.

use glam::{Mat4, Vec3};
use super::camera::Camera;
use super::error::{PlotError, Result};
use super::grid::{Grid, GridData};
use super::mesh::{AxesMesh, Bounds, CubeMesh};
use super::settings::MeshSettings;
use super::surface::SurfaceMesh;

// ============================================================================
// TRANSFORM
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// XYZ Euler angles in radians
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }

    /// translate · Rz · Ry · Rx · scale
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_scale(self.scale)
    }
}

// ============================================================================
// DRAWABLES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Surface,
    Axes,
    Cube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

pub struct SurfaceObject {
    pub mesh: SurfaceMesh,
    pub transform: Transform,
    pub wireframe: bool,
    pub lighting: bool,
    pub light_position: Vec3,
}

pub struct AxesObject {
    pub mesh: AxesMesh,
    pub transform: Transform,
    /// Id of the height-field drawable the axes were derived from
    pub source: String,
}

pub struct CubeObject {
    pub mesh: CubeMesh,
    pub transform: Transform,
    pub light_position: Vec3,
}

pub enum Drawable {
    Surface(SurfaceObject),
    Axes(AxesObject),
    Cube(CubeObject),
}

impl Drawable {
    pub fn kind(&self) -> PipelineKind {
        match self {
            Drawable::Surface(_) => PipelineKind::Surface,
            Drawable::Axes(_) => PipelineKind::Axes,
            Drawable::Cube(_) => PipelineKind::Cube,
        }
    }

    pub fn topology(&self) -> Topology {
        match self {
            Drawable::Axes(_) => Topology::Lines,
            Drawable::Surface(_) | Drawable::Cube(_) => Topology::Triangles,
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            Drawable::Surface(o) => o.mesh.vertex_count(),
            Drawable::Axes(o) => o.mesh.vertex_count(),
            Drawable::Cube(o) => o.mesh.vertex_count(),
        }
    }

    /// Raw vertex data in the layout of the drawable's pipeline.
    pub fn vertex_bytes(&self) -> &[u8] {
        match self {
            Drawable::Surface(o) => o.mesh.vertex_bytes(),
            Drawable::Axes(o) => o.mesh.vertex_bytes(),
            Drawable::Cube(o) => o.mesh.vertex_bytes(),
        }
    }

    pub fn transform(&self) -> &Transform {
        match self {
            Drawable::Surface(o) => &o.transform,
            Drawable::Axes(o) => &o.transform,
            Drawable::Cube(o) => &o.transform,
        }
    }

    /// Per-frame uniform block for this drawable seen through `camera`.
    pub fn uniforms(&self, camera: &Camera) -> FrameUniforms {
        let (light_position, wireframe, lighting) = match self {
            Drawable::Surface(o) => (o.light_position, o.wireframe, o.lighting),
            Drawable::Cube(o) => (o.light_position, false, true),
            Drawable::Axes(_) => (Vec3::ZERO, false, false),
        };
        FrameUniforms {
            model: self.transform().model_matrix().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            projection: camera.projection_matrix().to_cols_array_2d(),
            camera_position: camera.position().extend(1.0).to_array(),
            light_position: light_position.extend(1.0).to_array(),
            wireframe: wireframe as u32,
            lighting: lighting as u32,
            _padding: [0; 2],
        }
    }
}

// ============================================================================
// RENDER COMMANDS
// ============================================================================

/// Uniform block shared by all three shaders (binding 0, group 0).
/// Layout matches the WGSL `Uniforms` struct: 16-byte aligned, 240 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub light_position: [f32; 4],
    pub wireframe: u32,
    pub lighting: u32,
    _padding: [u32; 2],
}

#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub id: String,
    pub kind: PipelineKind,
    pub topology: Topology,
    pub vertex_count: u32,
    pub uniforms: FrameUniforms,
}

/// Ordered draw list for one frame.
#[derive(Debug, Clone, Default)]
pub struct RenderPass {
    pub commands: Vec<DrawCommand>,
}

impl RenderPass {
    pub fn draw_calls(&self) -> usize { self.commands.len() }

    pub fn vertex_count(&self) -> usize {
        self.commands.iter().map(|c| c.vertex_count as usize).sum()
    }
}

// ============================================================================
// SCENE
// ============================================================================

pub struct Scene {
    drawables: Vec<(String, Drawable)>,
    registrations: usize,
    mesh_settings: MeshSettings,
}

impl Scene {
    pub fn new(mesh_settings: &MeshSettings) -> Self {
        Self {
            drawables: Vec::new(),
            registrations: 0,
            mesh_settings: *mesh_settings,
        }
    }

    /// Validate and build a height-field drawable from raw samples.
    /// Nothing is registered when the grid is rejected.
    pub fn add_mesh(&mut self, data: GridData, id: Option<&str>) -> Result<String> {
        let grid = Grid::build(data, self.mesh_settings.scale)?;
        let mesh = SurfaceMesh::build(&grid, self.mesh_settings.colormap);
        let drawable = Drawable::Surface(SurfaceObject {
            mesh,
            transform: Transform::default(),
            wireframe: false,
            lighting: true,
            light_position: self.mesh_settings.light_position,
        });
        Ok(self.register(id, drawable))
    }

    /// Derive an axis indicator from the bounding box of a registered height-field drawable.
    pub fn add_axes(&mut self, mesh_id: &str, id: Option<&str>) -> Result<String> {
        let (bounds, transform) = match self.get(mesh_id) {
            Some(Drawable::Surface(surface)) => (surface.mesh.bounds, surface.transform),
            _ => return Err(PlotError::UnknownDrawable(mesh_id.to_string())),
        };
        let drawable = Drawable::Axes(AxesObject {
            mesh: AxesMesh::from_bounds(&bounds),
            transform,
            source: mesh_id.to_string(),
        });
        Ok(self.register(id, drawable))
    }

    pub fn add_cube(&mut self, id: Option<&str>, transform: Transform) -> String {
        let drawable = Drawable::Cube(CubeObject {
            mesh: CubeMesh::new(),
            transform,
            light_position: self.mesh_settings.light_position,
        });
        self.register(id, drawable)
    }

    /// Insert or replace in place; a replaced drawable keeps its render position.
    fn register(&mut self, id: Option<&str>, drawable: Drawable) -> String {
        let id = match id {
            Some(id) => id.to_string(),
            None => format!("func{}", self.registrations),
        };
        self.registrations += 1;

        match self.drawables.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => {
                log::debug!("replacing drawable '{id}' ({:?})", drawable.kind());
                slot.1 = drawable;
            }
            None => {
                log::debug!("registered drawable '{id}' ({:?}, {} vertices)", drawable.kind(), drawable.vertex_count());
                self.drawables.push((id.clone(), drawable));
            }
        }
        id
    }

    pub fn get(&self, id: &str) -> Option<&Drawable> {
        self.drawables.iter().find(|(k, _)| k == id).map(|(_, d)| d)
    }

    /// Drawables in render order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Drawable)> {
        self.drawables.iter().map(|(k, d)| (k.as_str(), d))
    }

    pub fn len(&self) -> usize { self.drawables.len() }
    pub fn is_empty(&self) -> bool { self.drawables.is_empty() }

    fn surfaces_mut(&mut self) -> impl Iterator<Item = &mut SurfaceObject> {
        self.drawables.iter_mut().filter_map(|(_, d)| match d {
            Drawable::Surface(s) => Some(s),
            _ => None,
        })
    }

    /// Flip the wireframe overlay on every height-field drawable. Returns the new state.
    pub fn toggle_wireframe(&mut self) -> bool {
        let mut state = false;
        for surface in self.surfaces_mut() {
            surface.wireframe = !surface.wireframe;
            state = surface.wireframe;
        }
        state
    }

    /// Flip lighting on every height-field drawable. Returns the new state.
    pub fn toggle_lighting(&mut self) -> bool {
        let mut state = false;
        for surface in self.surfaces_mut() {
            surface.lighting = !surface.lighting;
            state = surface.lighting;
        }
        state
    }

    /// One draw command per drawable, in registration order.
    pub fn render(&self, camera: &Camera) -> Result<RenderPass> {
        if !self.drawables.iter().any(|(_, d)| matches!(d, Drawable::Surface(_))) {
            return Err(PlotError::UnrenderableState);
        }

        let commands = self.drawables.iter()
            .map(|(id, drawable)| DrawCommand {
                id: id.clone(),
                kind: drawable.kind(),
                topology: drawable.topology(),
                vertex_count: drawable.vertex_count() as u32,
                uniforms: drawable.uniforms(camera),
            })
            .collect();

        Ok(RenderPass { commands })
    }

    /// Bounding box of the first height-field drawable, if any.
    pub fn plot_bounds(&self) -> Option<Bounds> {
        self.drawables.iter().find_map(|(_, d)| match d {
            Drawable::Surface(s) => Some(s.mesh.bounds),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::camera::OrbitCamera;
    use crate::engine::grid::linspace;
    use crate::engine::settings::Settings;

    fn sine_grid(n: usize) -> GridData {
        GridData::from_fn(linspace(-6.0, 6.0, n), linspace(-10.0, 10.0, n), |x, z| x.sin() * z.cos())
    }

    fn camera() -> Camera {
        let settings = Settings::default();
        Camera::Orbit(OrbitCamera::with_default_pose(&settings.camera, settings.window.aspect_ratio()))
    }

    fn scene() -> Scene {
        Scene::new(&Settings::default().mesh)
    }

    #[test]
    fn uniforms_match_shader_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 240);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
    }

    #[test]
    fn render_without_mesh_is_refused() {
        let mut scene = scene();
        assert!(matches!(scene.render(&camera()), Err(PlotError::UnrenderableState)));
        scene.add_cube(Some("cube"), Transform::default());
        assert!(matches!(scene.render(&camera()), Err(PlotError::UnrenderableState)));
    }

    #[test]
    fn invalid_grid_registers_nothing() {
        let mut scene = scene();
        let data = GridData::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0], vec![vec![0.0, 1.0], vec![1.0, 2.0]]);
        assert!(matches!(scene.add_mesh(data, Some("bad")), Err(PlotError::InvalidGrid(_))));
        assert!(scene.is_empty());
    }

    #[test]
    fn commands_follow_registration_order() {
        let mut scene = scene();
        let mesh = scene.add_mesh(sine_grid(5), None).unwrap();
        let axes = scene.add_axes(&mesh, None).unwrap();
        let cube = scene.add_cube(Some("cube"), Transform::from_position(Vec3::new(0.0, 3.0, 0.0)));
        assert_eq!((mesh.as_str(), axes.as_str()), ("func0", "func1"));

        let pass = scene.render(&camera()).unwrap();
        let ids: Vec<_> = pass.commands.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["func0", "func1", cube.as_str()]);

        let kinds: Vec<_> = pass.commands.iter().map(|c| (c.kind, c.topology, c.vertex_count)).collect();
        assert_eq!(kinds, vec![
            (PipelineKind::Surface, Topology::Triangles, 96),
            (PipelineKind::Axes, Topology::Lines, 6),
            (PipelineKind::Cube, Topology::Triangles, 36),
        ]);
        assert_eq!(pass.draw_calls(), 3);
        assert_eq!(pass.vertex_count(), 138);
    }

    #[test]
    fn reregistering_replaces_in_place() {
        let mut scene = scene();
        scene.add_mesh(sine_grid(5), Some("plot")).unwrap();
        scene.add_cube(Some("cube"), Transform::default());
        scene.add_mesh(sine_grid(9), Some("plot")).unwrap();

        assert_eq!(scene.len(), 2);
        let order: Vec<_> = scene.iter().map(|(id, d)| (id, d.vertex_count())).collect();
        assert_eq!(order, vec![("plot", 6 * 8 * 8), ("cube", 36)]);
    }

    #[test]
    fn axes_need_a_surface_source() {
        let mut scene = scene();
        let cube = scene.add_cube(None, Transform::default());
        assert!(matches!(scene.add_axes("missing", None), Err(PlotError::UnknownDrawable(id)) if id == "missing"));
        assert!(matches!(scene.add_axes(&cube, None), Err(PlotError::UnknownDrawable(_))));
    }

    #[test]
    fn axes_span_plot_bounds() {
        let mut scene = scene();
        let mesh = scene.add_mesh(sine_grid(5), None).unwrap();
        let axes = scene.add_axes(&mesh, Some("axes")).unwrap();
        let bounds = scene.plot_bounds().unwrap();
        assert_eq!(bounds.min.x, -5.0);
        assert_eq!(bounds.max.z, 5.0);
        match scene.get(&axes) {
            Some(Drawable::Axes(a)) => {
                assert_eq!(a.source, mesh);
                assert_eq!(a.mesh.vertices[0].position, bounds.min.to_array());
            }
            _ => panic!("axes not registered"),
        }
    }

    #[test]
    fn toggles_reach_uniforms() {
        let mut scene = scene();
        scene.add_mesh(sine_grid(5), None).unwrap();
        let cam = camera();

        let flags = |scene: &Scene| {
            let u = scene.render(&cam).unwrap().commands[0].uniforms;
            (u.wireframe, u.lighting)
        };
        assert_eq!(flags(&scene), (0, 1));
        assert!(scene.toggle_wireframe());
        assert!(!scene.toggle_lighting());
        assert_eq!(flags(&scene), (1, 0));
        assert!(!scene.toggle_wireframe());
        assert_eq!(flags(&scene), (0, 0));
    }

    #[test]
    fn uniforms_carry_camera_matrices() {
        let mut scene = scene();
        scene.add_mesh(sine_grid(5), None).unwrap();
        let cam = camera();
        let u = scene.render(&cam).unwrap().commands[0].uniforms;
        assert_eq!(u.view, cam.view_matrix().to_cols_array_2d());
        assert_eq!(u.projection, cam.projection_matrix().to_cols_array_2d());
        assert_eq!(u.model, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(u.camera_position, cam.position().extend(1.0).to_array());
        assert_eq!(u.light_position, [2.5, 5.0, -2.5, 1.0]);
    }

    #[test]
    fn model_matrix_applies_scale_then_rotation_then_translation() {
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let p = transform.model_matrix().transform_point3(Vec3::X);
        // (1,0,0) → scaled (2,0,0) → Rz 90° (0,2,0) → translated
        assert!(p.abs_diff_eq(Vec3::new(1.0, 4.0, 3.0), 1e-5));
    }
}
