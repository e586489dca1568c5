//! Concrete adapters for the domain capabilities

pub mod email;
pub mod interceptors;
pub mod views;
