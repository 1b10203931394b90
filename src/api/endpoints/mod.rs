//! API endpoint handlers.
//!
//! One module per view; handlers delegate to the portal flows.

pub mod auth;
pub mod doctor;
pub mod health;
pub mod patient;
pub mod views;
