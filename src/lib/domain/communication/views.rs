//! Body composition from rendered views

mod composer;
mod errors;
mod renderer;

pub use composer::{BodyComposer, ComposeOptions};
pub use errors::{ComposeError, RenderError};
pub use renderer::Renderer;
