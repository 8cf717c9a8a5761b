//! Corp identity, credential scope, and access-token value types.

pub mod corp;
pub mod credential;
pub mod id;
pub mod secret;

pub use corp::*;
pub use credential::*;
pub use id::*;
pub use secret::*;
