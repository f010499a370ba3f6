//! Credential models: redacted secrets, the stored credential pair, and cookie plumbing.

pub mod cookie;
pub mod credential;
pub mod secret;

pub use cookie::*;
pub use credential::*;
pub use secret::*;
