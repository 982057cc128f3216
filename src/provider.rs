//! Upstream API descriptors (data) and error-classification strategies (behavior).
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering HTTPS-only
//! endpoints, the cache TTL policy, and signature parameters. `strategy` defines
//! [`ProviderStrategy`], an HTTP-client-agnostic hook that maps upstream `errcode` values into
//! the broker error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
