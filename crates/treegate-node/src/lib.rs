//! Treegate authorization gateway.
//!
//! An HTTP service that answers authorization subrequests for a fronting
//! web server serving version-controlled repositories. The frontend
//! authenticates the principal and forwards the original method, path,
//! and `Destination` header; the gateway answers 204 (allow), 403
//! (deny), or 500 (could not decide - the frontend must fail closed).

pub mod config;
pub mod gateway;
