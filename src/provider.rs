//! Provider-facing environment data and strategies (behavior).
//!
//! `endpoints` exposes the two fixed E*Trade environments and the endpoint set derived from
//! each; `quirks` records the provider's deviations from plain OAuth 1.0a (authorize parameter
//! names, body-hash signing). `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic
//! hook used to decorate token requests and map failures into the crate error taxonomy.

pub mod endpoints;
pub mod quirks;
pub mod strategy;

pub use endpoints::*;
pub use quirks::*;
pub use strategy::*;
