#![doc = "The `taskmanager` library crate."]
#![doc = ""]
#![doc = "Token authentication and role-based authorization for the TaskManager API, plus the"]
#![doc = "developer, project, task and activity resources it protects. `main.rs` wires these"]
#![doc = "into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;

pub use crate::error::{AppError, AuthError};
