//! Localiza Core - Shared domain types.
//!
//! This crate provides the types shared by every Localiza component:
//! - `api` - The HTTP backend (sessions, shopping lists, stores, catalog)
//! - `cli` - Operator tools for migrations and account promotion
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles, and tax ids

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
