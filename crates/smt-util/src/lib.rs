//! Low-level utilities shared across the workspace.

pub mod basics;
pub mod timing;
