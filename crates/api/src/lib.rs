//! Localiza API library.
//!
//! The server binary is a thin wrapper over [`routes::router`]; everything
//! else lives here so it can be driven in-process by tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
