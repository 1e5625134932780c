// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Authentication Module
//!
//! Opaque, store-backed session authentication.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with password or Google and receives a random session
//!    token (also set as an HttpOnly cookie for browsers)
//! 2. Client sends `Authorization: Bearer <token>` or the `session_token`
//!    cookie on subsequent requests
//! 3. Server resolves the token against `sessions.json`:
//!    - unknown or expired token → 401
//!    - otherwise the owning user record supplies identity and role
//!
//! ## Security
//!
//! - Tokens carry no claims; revocation is deletion from the store
//! - Expired sessions are removed lazily on lookup
//! - Admin-only endpoints use the `AdminOnly` extractor

pub mod error;
pub mod extractor;
pub mod roles;

pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, AuthenticatedUser, SESSION_COOKIE};
pub use roles::Role;
