//! Request-pipeline middleware and extractors.
//!
//! The flow for every request is: [`auth::authenticate`] decodes the bearer
//! token (if any) and attaches the outcome, then route handlers pull what
//! they need through [`auth::AuthPrincipal`] or the role extractors in
//! [`role`]. Decode failures are reported only where a request is finally
//! rejected, never mid-pipeline.

pub mod auth;
pub mod role;
