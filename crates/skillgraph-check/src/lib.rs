//! Structural validation for effect graphs.
//!
//! [`validate`] runs every structural check in one pass and accumulates all
//! detectable problems -- it never stops at the first failure, so one call
//! surfaces everything an author needs to fix.

pub mod validator;

pub use validator::{validate, ValidationError, ValidationResult};
