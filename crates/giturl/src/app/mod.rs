//! Application layer orchestrating domain logic and infrastructure.

pub mod context;
pub mod hosts;
pub mod remote;
pub mod selection;
pub mod session;
pub mod url;
