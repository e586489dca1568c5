//! Senders

pub mod log;
pub mod smtp;
