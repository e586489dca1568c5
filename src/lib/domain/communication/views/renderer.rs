//! Renderer capability

use serde_json::Value;

use super::RenderError;

/// Resolves a view identifier into rendered text
pub trait Renderer: Send + Sync + 'static {
    /// Renders a view.
    ///
    /// # Arguments
    /// * `view` - The view identifier, including its extension.
    /// * `model` - The model the view is rendered with.
    /// * `layout` - An optional layout the rendered view is wrapped in.
    ///
    /// # Returns
    /// - [`Ok`] with the rendered text.
    /// - [`Err`] with [`RenderError::NotFound`] if no such view exists.
    /// - [`Err`] with [`RenderError::Fault`] if the view exists but could not be rendered.
    fn render(&self, view: &str, model: &Value, layout: Option<&str>)
        -> Result<String, RenderError>;
}

#[cfg(test)]
pub use stub::{RenderCall, StubRenderer};
