//! Message delivery through a [`Sender`], observed by an [`Interceptor`]

mod delivery;
mod errors;
mod interceptor;
mod message;
mod sender;

pub use delivery::{Delivery, DeliveryHelper, DeliveryHelperBuilder};
pub use errors::{DeliveryError, MessageError, TransportError};
pub use interceptor::{Interceptor, SendDecision, SendingContext};
pub use message::{BodyPart, MediaKind, Message};
pub use sender::Sender;
