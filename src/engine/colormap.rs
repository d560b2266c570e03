// Height-to-color mapping.
// Pure functions: normalized scalar in, display (gamma-encoded) RGB out.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMap {
    /// MATLAB-style jet: blue → cyan → yellow → red
    #[default]
    Jet,
    /// Rainbow with a less harsh green band
    Turbo,
    Gray,
}

impl ColorMap {
    /// Map `t` in [0, 1] to RGB. Values outside the range clamp to the endpoints.
    pub fn map_value(&self, t: f32) -> Vec3 {
        // NaN would otherwise survive the clamp below
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            ColorMap::Jet => jet(t),
            ColorMap::Turbo => turbo(t),
            ColorMap::Gray => Vec3::splat(t),
        }
    }

    /// Normalize `value` over `[min, max]` and map it. A zero-width range maps to the low end.
    pub fn map_range(&self, value: f32, min: f32, max: f32) -> Vec3 {
        let range = (max - min).max(f32::MIN_POSITIVE);
        self.map_value((value - min) / range)
    }
}

fn jet(t: f32) -> Vec3 {
    let r = (1.5 - 4.0 * (t - 0.75).abs()).clamp(0.0, 1.0);
    let g = (1.5 - 4.0 * (t - 0.5).abs()).clamp(0.0, 1.0);
    let b = (1.5 - 4.0 * (t - 0.25).abs()).clamp(0.0, 1.0);
    Vec3::new(r, g, b)
}

fn turbo(t: f32) -> Vec3 {
    let r = if t < 0.5 {
        0.13 + 0.87 * (2.0 * t).powf(0.25)
    } else {
        0.8685 + 0.1315 * (2.0 * (1.0 - t)).powf(0.25)
    };
    let g = if t < 0.25 {
        4.0 * t
    } else if t < 0.75 {
        1.0
    } else {
        1.0 - 4.0 * (t - 0.75)
    };
    let b = if t < 0.5 {
        0.8 * (1.0 - 2.0 * t).powf(0.25)
    } else {
        0.1 + 0.9 * (2.0 * t - 1.0).powf(0.25)
    };
    Vec3::new(r, g, b).clamp(Vec3::ZERO, Vec3::ONE)
}
