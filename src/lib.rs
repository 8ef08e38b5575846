//! Releasedeck - a dashboard client for a release tracking service
//!
//! This library talks to a release tracker REST API and provides:
//! - Typed access to users, releases and deployment logs
//! - Command handlers that call the API and re-render tabular views
//! - Promotion and rollback of releases through an ordered set of environments
//! - Client-side filtering of deployment logs
//! - An HTML dashboard page, a small read-only dashboard server and a console

pub mod client;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod filter;
pub mod interaction;
pub mod model;
pub mod page;
pub mod render;
pub mod server;
pub mod state;
