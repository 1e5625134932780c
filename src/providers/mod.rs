// SPDX-License-Identifier: AGPL-3.0-or-later

//! External service clients: PayPal checkout, Google sign-in, email.

pub mod email;
pub mod google;
pub mod paypal;

pub use email::{EmailError, EmailSender};
pub use google::{GoogleAuthError, GoogleIdentity, GoogleVerifier};
pub use paypal::{CapturedOrder, CreatedOrder, PayPalClient, PayPalError};
