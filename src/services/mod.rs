// SPDX-License-Identifier: AGPL-3.0-or-later

//! Business logic between the HTTP handlers and the repositories.

pub mod identity;
pub mod payments;
pub mod wallet;

pub use identity::{IdentityService, ResendOutcome};
pub use payments::PaymentService;
pub use wallet::{CaptureOutcome, WalletService};
