//! Core types for Localiza.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod role;
pub mod tax_id;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::{Role, RoleParseError};
pub use tax_id::{TaxId, TaxIdError};
