//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Session gate: resolves the caller, rejects with 401
//! 2. Access log: runs after the gate so it has the user id

pub mod audit;
pub mod auth;
