// Camera system: first-person (Euler yaw/pitch) and orbit (spherical around a target).
//
// Camera model:
//   - All angles are stored in degrees; conversion to radians happens at use sites
//   - World up is +Y, right-handed; view = look_at_rh, projection = perspective_rh (depth 0..1)
//   - Both variants cache their view matrix after every update; the projection
//     is only rebuilt when the aspect ratio changes
//   - Switching variants goes through the outgoing camera's view matrix (copy_state),
//     never through its native angles, so the eye does not jump

use glam::{Mat4, Vec2, Vec3};
use winit::keyboard::KeyCode;
use super::input::InputState;
use super::settings::{CameraSettings, MIN_ORBIT_RADIUS};

pub const MAX_PITCH: f32 = 89.0;
pub const MIN_POLAR: f32 = 0.1;
pub const MAX_POLAR: f32 = 179.0;

// ============================================================================
// LENS
// ============================================================================

/// Perspective projection shared by both camera variants.
#[derive(Debug, Clone, Copy)]
pub struct Lens {
    fov_deg: f32,
    near: f32,
    far: f32,
    aspect: f32,
    projection: Mat4,
}

impl Lens {
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        let mut lens = Self {
            fov_deg: settings.fov_deg,
            near: settings.near,
            far: settings.far,
            aspect,
            projection: Mat4::IDENTITY,
        };
        lens.rebuild();
        lens
    }

    /// Rebuild the projection if the aspect ratio actually changed.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 && aspect != self.aspect {
            self.aspect = aspect;
            self.rebuild();
        }
    }

    pub fn projection(&self) -> Mat4 { self.projection }

    fn rebuild(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.near, self.far);
    }
}

/// World-space pose encoded in a view matrix.
struct EyePose {
    position: Vec3,
    forward: Vec3,
    right: Vec3,
}

fn eye_from_view(view: Mat4) -> EyePose {
    let inverted = view.inverse();
    EyePose {
        position: inverted.w_axis.truncate(),
        forward: -inverted.z_axis.truncate(),
        right: inverted.x_axis.truncate(),
    }
}

/// Wrap degrees into [0, 360).
fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid of a tiny negative value rounds up to exactly 360
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

// ============================================================================
// FIRST-PERSON CAMERA
// ============================================================================

#[derive(Debug, Clone)]
pub struct FirstPersonCamera {
    position: Vec3,
    /// Degrees; 0 looks along +X, 90 along +Z. Kept in (-360, 360).
    yaw: f32,
    /// Degrees, clamped to [-MAX_PITCH, MAX_PITCH].
    pitch: f32,

    forward: Vec3,
    right: Vec3,
    up: Vec3,

    settings: CameraSettings,
    lens: Lens,
    view: Mat4,
}

impl FirstPersonCamera {
    pub fn new(settings: &CameraSettings, aspect: f32, position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            yaw: yaw % 360.0,
            pitch: pitch.clamp(-MAX_PITCH, MAX_PITCH),
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            settings: *settings,
            lens: Lens::new(settings, aspect),
            view: Mat4::IDENTITY,
        };
        camera.update_vectors();
        camera
    }

    /// Default start pose: at the origin, looking down the -Z axis and 35° below the horizon.
    pub fn with_default_pose(settings: &CameraSettings, aspect: f32) -> Self {
        Self::new(settings, aspect, Vec3::ZERO, -90.0, -35.0)
    }

    /// Move with the current basis, then turn. Call once per frame before rendering.
    pub fn update(&mut self, input: &InputState, dt: f32) {
        self.translate(input, dt);
        self.rotate(input.mouse_delta());
        self.update_vectors();
    }

    fn translate(&mut self, input: &InputState, dt: f32) {
        let velocity = self.settings.move_speed * dt;
        let mut step = Vec3::ZERO;

        if input.is_key_held(KeyCode::KeyW)      { step += self.forward; }
        if input.is_key_held(KeyCode::KeyS)      { step -= self.forward; }
        if input.is_key_held(KeyCode::KeyD)      { step += self.right; }
        if input.is_key_held(KeyCode::KeyA)      { step -= self.right; }
        if input.is_key_held(KeyCode::Space)     { step += self.up; }
        if input.is_key_held(KeyCode::ShiftLeft) { step -= self.up; }

        self.position += step * velocity;
    }

    fn rotate(&mut self, mouse_delta: Vec2) {
        let delta = mouse_delta * self.settings.sensitivity;
        self.yaw = (self.yaw + delta.x) % 360.0;
        // screen Y grows downward: moving the mouse up looks up
        self.pitch = (self.pitch - delta.y).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Rebuild the orthonormal basis and view matrix from yaw/pitch.
    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.forward = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        ).normalize();
        self.right = self.forward.cross(Vec3::Y).normalize();
        self.up = self.right.cross(self.forward).normalize();
        self.view = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
    }

    /// Take over the pose encoded in another camera's view matrix.
    pub fn absorb_view(&mut self, view: Mat4) {
        let EyePose { position, forward, right } = eye_from_view(view);
        let forward = forward.normalize_or_zero();
        self.position = position;

        if forward == Vec3::ZERO {
            log::debug!("first-person state transfer: degenerate look direction, keeping angles");
        } else {
            // right = (-sin yaw, 0, cos yaw) keeps full length near the poles, where
            // the horizontal part of forward shrinks toward zero
            let horizontal_right = Vec2::new(right.z, -right.x);
            self.yaw = if horizontal_right.length() > 0.5 {
                horizontal_right.y.atan2(horizontal_right.x).to_degrees()
            } else {
                forward.z.atan2(forward.x).to_degrees()
            };
            self.pitch = forward.y.atan2(forward.x.hypot(forward.z)).to_degrees().clamp(-MAX_PITCH, MAX_PITCH);
        }
        self.update_vectors();
    }

    pub fn position(&self) -> Vec3 { self.position }
    pub fn yaw(&self) -> f32 { self.yaw }
    pub fn pitch(&self) -> f32 { self.pitch }
    pub fn forward(&self) -> Vec3 { self.forward }
    pub fn right(&self) -> Vec3 { self.right }
    pub fn up(&self) -> Vec3 { self.up }
    pub fn view_matrix(&self) -> Mat4 { self.view }
    pub fn projection_matrix(&self) -> Mat4 { self.lens.projection() }
}

// ============================================================================
// ORBIT CAMERA
// ============================================================================

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    target: Vec3,
    radius: f32,
    /// Degrees around +Y measured from +X toward +Z, in [0, 360).
    azimuth: f32,
    /// Degrees from +Y, clamped to [MIN_POLAR, MAX_POLAR].
    polar: f32,

    position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,

    settings: CameraSettings,
    lens: Lens,
    view: Mat4,
}

impl OrbitCamera {
    pub fn new(settings: &CameraSettings, aspect: f32, azimuth: f32, polar: f32, radius: f32) -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            radius: radius.clamp(MIN_ORBIT_RADIUS, settings.max_radius()),
            azimuth: wrap_degrees(azimuth),
            polar: polar.clamp(MIN_POLAR, MAX_POLAR),
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            settings: *settings,
            lens: Lens::new(settings, aspect),
            view: Mat4::IDENTITY,
        };
        camera.update_vectors();
        camera
    }

    /// Default start pose: 10 units out, 40° around, 60° down from the pole.
    pub fn with_default_pose(settings: &CameraSettings, aspect: f32) -> Self {
        Self::new(settings, aspect, 40.0, 60.0, 10.0)
    }

    pub fn update(&mut self, input: &InputState, dt: f32) {
        let delta = input.mouse_delta() * self.settings.orbit_speed;
        self.azimuth = wrap_degrees(self.azimuth + delta.x);
        self.polar = (self.polar - delta.y).clamp(MIN_POLAR, MAX_POLAR);

        // Zoom: held keys scale with dt, scroll up (positive delta) zooms in
        let velocity = self.settings.zoom_speed * dt;
        if input.is_key_held(KeyCode::KeyW) { self.radius -= velocity; }
        if input.is_key_held(KeyCode::KeyS) { self.radius += velocity; }
        self.radius -= input.scroll_delta * self.settings.wheel_zoom_step;
        self.radius = self.radius.clamp(MIN_ORBIT_RADIUS, self.settings.max_radius());

        self.update_vectors();
    }

    /// Place the eye from the spherical coordinates, then rebuild the basis and view matrix.
    fn update_vectors(&mut self) {
        let (azimuth, polar) = (self.azimuth.to_radians(), self.polar.to_radians());
        self.position = self.target + self.radius * Vec3::new(
            polar.sin() * azimuth.cos(),
            polar.cos(),
            polar.sin() * azimuth.sin(),
        );

        self.forward = (self.target - self.position).normalize();
        let eps = self.settings.epsilon;
        let world_up = if self.forward.x.abs() < eps && self.forward.z.abs() < eps {
            // looking straight along Y: any horizontal up works, keep it stable
            if self.forward.y > 0.0 { Vec3::NEG_Z } else { Vec3::Z }
        } else {
            Vec3::Y
        };
        self.right = self.forward.cross(world_up).normalize();
        self.up = self.right.cross(self.forward).normalize();
        self.view = Mat4::look_at_rh(self.position, self.target, self.up);
    }

    /// Take over the eye position encoded in another camera's view matrix.
    /// The target resets to the origin; the look direction follows from that.
    pub fn absorb_view(&mut self, view: Mat4) {
        let mut position = eye_from_view(view).position;

        let eps = self.settings.epsilon;
        if position.x.abs() < eps || position.z.abs() < eps {
            log::debug!("orbit state transfer: biasing near-axis eye position {position}");
        }
        if position.x.abs() < eps { position.x = eps; }
        if position.z.abs() < eps { position.z = eps; }

        let horizontal = position.x.hypot(position.z);
        self.target = Vec3::ZERO;
        self.radius = position.length().clamp(MIN_ORBIT_RADIUS, self.settings.max_radius());
        // atan2 form of acos(y / r); stays accurate near the poles
        self.polar = horizontal.atan2(position.y).to_degrees().clamp(MIN_POLAR, MAX_POLAR);
        self.azimuth = wrap_degrees(position.z.atan2(position.x).to_degrees());
        self.update_vectors();
    }

    pub fn target(&self) -> Vec3 { self.target }
    pub fn radius(&self) -> f32 { self.radius }
    pub fn azimuth(&self) -> f32 { self.azimuth }
    pub fn polar(&self) -> f32 { self.polar }
    pub fn position(&self) -> Vec3 { self.position }
    pub fn forward(&self) -> Vec3 { self.forward }
    pub fn right(&self) -> Vec3 { self.right }
    pub fn up(&self) -> Vec3 { self.up }
    pub fn view_matrix(&self) -> Mat4 { self.view }
    pub fn projection_matrix(&self) -> Mat4 { self.lens.projection() }
}

// ============================================================================
// CAMERA (closed set of variants)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    FirstPerson,
    Orbit,
}

#[derive(Debug, Clone)]
pub enum Camera {
    FirstPerson(FirstPersonCamera),
    Orbit(OrbitCamera),
}

/// Read-only snapshot for the stats overlay.
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    pub mode: CameraMode,
    pub position: Vec3,
    pub forward: Vec3,
    /// Yaw (first-person) or azimuth (orbit), degrees
    pub x_angle: f32,
    /// Pitch (first-person) or polar angle (orbit), degrees
    pub y_angle: f32,
    pub radius: Option<f32>,
}

impl Camera {
    pub fn mode(&self) -> CameraMode {
        match self {
            Camera::FirstPerson(_) => CameraMode::FirstPerson,
            Camera::Orbit(_) => CameraMode::Orbit,
        }
    }

    pub fn update(&mut self, input: &InputState, dt: f32) {
        match self {
            Camera::FirstPerson(c) => c.update(input, dt),
            Camera::Orbit(c) => c.update(input, dt),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        match self {
            Camera::FirstPerson(c) => c.view_matrix(),
            Camera::Orbit(c) => c.view_matrix(),
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self {
            Camera::FirstPerson(c) => c.projection_matrix(),
            Camera::Orbit(c) => c.projection_matrix(),
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            Camera::FirstPerson(c) => c.position(),
            Camera::Orbit(c) => c.position(),
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        match self {
            Camera::FirstPerson(c) => c.lens.set_aspect(aspect),
            Camera::Orbit(c) => c.lens.set_aspect(aspect),
        }
    }

    /// Rebuild this camera's own parameters from `other`'s current view matrix.
    pub fn copy_state(&mut self, other: &Camera) {
        let view = other.view_matrix();
        match self {
            Camera::FirstPerson(c) => c.absorb_view(view),
            Camera::Orbit(c) => c.absorb_view(view),
        }
    }

    pub fn state(&self) -> CameraState {
        match self {
            Camera::FirstPerson(c) => CameraState {
                mode: CameraMode::FirstPerson,
                position: c.position,
                forward: c.forward,
                x_angle: c.yaw,
                y_angle: c.pitch,
                radius: None,
            },
            Camera::Orbit(c) => CameraState {
                mode: CameraMode::Orbit,
                position: c.position,
                forward: c.forward,
                x_angle: c.azimuth,
                y_angle: c.polar,
                radius: Some(c.radius),
            },
        }
    }
}

// ============================================================================
// CAMERA RIG
// ============================================================================

/// Owns both cameras for the whole run; exactly one is active.
pub struct CameraRig {
    active: Camera,
    standby: Camera,
}

impl CameraRig {
    /// Starts in orbit mode.
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        Self {
            active: Camera::Orbit(OrbitCamera::with_default_pose(settings, aspect)),
            standby: Camera::FirstPerson(FirstPersonCamera::with_default_pose(settings, aspect)),
        }
    }

    pub fn active(&self) -> &Camera { &self.active }

    pub fn update(&mut self, input: &InputState, dt: f32) {
        self.active.update(input, dt);
    }

    /// Hand the view over to the standby camera and make it active.
    pub fn switch(&mut self) {
        self.standby.copy_state(&self.active);
        std::mem::swap(&mut self.active, &mut self.standby);
        log::info!("camera mode: {:?}", self.active.mode());
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.active.set_aspect(aspect);
        self.standby.set_aspect(aspect);
    }
}
