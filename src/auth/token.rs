//! Cached credential models (access tokens, `jsapi` tickets) and their secret wrapper.

pub mod kind;
pub mod record;
pub mod secret;
