//! Infrastructure - relay state and identity collaborators

pub mod identity;
pub mod registry;

pub use identity::{IdentityProvider, StaticTokenProvider};
pub use registry::Registry;
