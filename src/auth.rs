//! Endpoint security metadata, scope extraction, and token supplier adaptation.

pub mod scope;
pub mod secret;
pub mod token;

pub use scope::*;
pub use secret::*;
pub use token::*;
