//! Summer Camp Core - domain types and rules.
//!
//! This crate holds everything the public site, the admin dashboard and the
//! CLI agree on:
//! - `site` - marketing pages, registration wizard and checkout
//! - `admin` - registrations, gallery and admin user management
//! - `cli` - migrations, admin bootstrap and gallery bulk upload
//!
//! # Architecture
//!
//! No I/O lives here: no database access, no HTTP clients. Validation,
//! filtering and statistics are plain functions over in-memory records so
//! they behave the same against the live database and the demo dataset.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, phone numbers, fiscal codes, enums, money
//! - [`registration`] - registration records and payment bookkeeping
//! - [`wizard`] - step-by-step form validation
//! - [`filter`] - admin table filtering, sorting and pagination
//! - [`stats`] - dashboard aggregates
//! - [`gallery`] - gallery records, slugs and upload helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin_user;
pub mod contact;
pub mod filter;
pub mod gallery;
pub mod registration;
pub mod stats;
pub mod types;
pub mod wizard;

pub use admin_user::{AdminPermissionError, AdminUser, NewAdminUser};
pub use contact::{ContactForm, ContactSubmission, NewContactSubmission};
pub use filter::{Page, PaymentFilter, RegistrationFilter, SortDirection, SortKey};
pub use gallery::{CollectionSummary, GalleryCollection, GalleryPhoto, NewCollection, NewPhoto};
pub use registration::{NewRegistration, Registration, RegistrationError};
pub use stats::DashboardStats;
pub use types::*;
pub use wizard::{FieldErrors, RegistrationDraft, WizardStep};
