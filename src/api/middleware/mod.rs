//! Request middleware.
//!
//! Execution order (outermost → innermost):
//! 1. Owner auth (owner routes only)
//! 2. Access log

pub mod audit;
pub mod auth;
