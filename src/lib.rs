// SPDX-License-Identifier: AGPL-3.0-or-later

//! Arcade Server - Accounts, Wallets and Checkout
//!
//! Backend for a browser arcade: password and Google sign-in with email
//! verification, opaque server-side sessions, a Euro wallet per player, and
//! PayPal checkout for topping it up. All state lives in flat JSON files so
//! the service runs anywhere with a writable directory.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Session authentication and roles
//! - `services` - Account, wallet and payment logic
//! - `providers` - PayPal, Google and email clients
//! - `storage` - Flat-file JSON persistence

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod security;
pub mod services;
pub mod state;
pub mod storage;
