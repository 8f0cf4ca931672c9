//! Consumer identity and the OAuth 1.0a token models.

pub mod consumer;
pub mod token;

pub use consumer::*;
pub use token::{access::*, request::*, secret::*};
