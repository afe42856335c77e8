//! Meridian Core - Shared domain types.
//!
//! This crate provides the domain vocabulary used by the Meridian Compliance
//! document-delivery service:
//!
//! - `server` - Checkout and analytics API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. Parsing and construction enforce the domain invariants (an
//! [`Email`] is always well-formed, an [`IdentityHash`] is always a one-way
//! digest, an [`OrderReference`] always matches the presentable format), so
//! downstream code never re-validates.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, identity hashes, order
//!   references, IDs, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
