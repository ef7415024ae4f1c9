//! Base types and error handling.
//!
//! - [`ProfileError`](profileerror::ProfileError): error type shared by the
//!   storage, cookie sink and profile layers
//! - [`IoResultExt`](context::IoResultExt): IO error context helpers

pub mod context;
pub mod profileerror;
