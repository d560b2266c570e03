use thiserror::Error;

/// Errors raised while building or rendering a plot.
///
/// Numerical edge cases inside the per-frame camera math are not errors: they are
/// compensated in place so the interactive loop keeps running.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("no drawable registered under id '{0}'")]
    UnknownDrawable(String),
    #[error("nothing to render: no height-field mesh has been loaded")]
    UnrenderableState,
    #[error("screenshot failed: {0}")]
    Screenshot(String),
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PlotError>;
