//! Application layer - message dispatch and relay use cases

pub mod handlers;
pub mod usecases;
