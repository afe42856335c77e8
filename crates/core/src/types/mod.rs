//! Core types for Meridian Compliance.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity_hash;
pub mod order_reference;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity_hash::IdentityHash;
pub use order_reference::{OrderReference, OrderReferenceError, REFERENCE_PREFIX};
pub use status::OrderStatus;
