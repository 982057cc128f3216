//! Auth-domain identifiers, application credentials, and cached credential models.

pub mod credentials;
pub mod id;
pub mod token;

pub use credentials::*;
pub use id::*;
pub use token::{kind::*, record::*, secret::*};
