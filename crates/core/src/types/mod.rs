//! Core types for the summer camp.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod fiscal_code;
pub mod id;
pub mod money;
pub mod package;
pub mod phone;
pub mod status;

pub use email::{Email, EmailError};
pub use fiscal_code::{FiscalCode, FiscalCodeError};
pub use id::*;
pub use money::{format_eur, from_cents, to_cents};
pub use package::Package;
pub use phone::{PhoneError, PhoneNumber};
pub use status::*;
