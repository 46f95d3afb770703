//! Bearer-token lifecycle: secrets, cached tokens, claim decoding, and the login manager.

pub mod claims;
pub mod manager;
pub mod secret;
pub mod token;

mod metrics;

pub use manager::*;
pub use metrics::LoginMetrics;
pub use secret::*;
pub use token::*;
