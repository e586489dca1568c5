//! Message composition and delivery

pub mod email_addresses;
pub mod mailer;
pub mod views;
