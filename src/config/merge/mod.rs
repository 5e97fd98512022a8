//! Source composition and precedence.

pub mod policy;
pub mod service;
