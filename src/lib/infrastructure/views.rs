//! Renderers

pub mod templates;
