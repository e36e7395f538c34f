//! Identity and the uniform wrapper around mutating entry points.
//!
//! `AuthUser` is extracted from the identity provider's session token.
//! Mutating handlers take `Result<AuthUser, AppError>` and run their body
//! through `with_auth`, which folds every failure into an `ActionResult`.

pub mod action;
pub mod session;

pub use action::{with_auth, ActionResult};
pub use session::{AuthUser, SessionVerifier};
