//! Temporary request tokens, access tokens, and the redacted secret wrapper they share.

pub mod access;
pub mod request;
pub mod secret;
