// Interactive 3D surface plot: height-field mesh builder, dual first-person/orbit
// camera with view-continuous switching, and a wgpu scene driver.

pub mod engine;
