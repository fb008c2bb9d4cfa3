use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use lazy_static::lazy_static;
use serde_json::json;
use std::time::Instant;

const API_NAME: &str = "TaskManager API";

/// Routes advertised by `GET /api/v1`, as (method, path, description).
const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Health check"),
    ("GET", "/api/v1", "API information"),
    ("POST", "/api/v1/auth/register", "Register a new developer"),
    ("POST", "/api/v1/auth/login", "Log in"),
    ("POST", "/api/v1/auth/refresh", "Exchange a refresh token for a new pair"),
    ("GET", "/api/v1/auth/me", "Current developer"),
    ("POST", "/api/v1/auth/logout", "Log out"),
    ("GET", "/api/v1/users", "List developers"),
    ("DELETE", "/api/v1/users/{id}", "Delete a developer (admin)"),
    ("GET", "/api/v1/projects", "List projects"),
    ("POST", "/api/v1/projects", "Create a project"),
    ("DELETE", "/api/v1/projects/{id}", "Delete a project (manager)"),
    ("GET", "/api/v1/tasks", "List tasks"),
    ("POST", "/api/v1/tasks", "Create a task"),
    ("GET", "/api/v1/activity", "Activity log"),
];

lazy_static! {
    /// Set the first time it is touched; `main` does that before binding.
    pub static ref STARTED_AT: Instant = Instant::now();
}

/// Health check endpoint
///
/// Public. Reports that the process is serving requests; it does not touch the database.
/// `uptime` is in whole seconds.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": STARTED_AT.elapsed().as_secs()
    }))
}

/// Public description of the API and its main routes. Mounted at the `/api/v1` root.
#[get("")]
pub async fn api_info() -> impl Responder {
    let endpoints: Vec<_> = ENDPOINTS
        .iter()
        .map(|(method, path, description)| {
            json!({ "method": method, "path": path, "description": description })
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "name": API_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints
    }))
}
