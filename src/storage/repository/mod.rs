// SPDX-License-Identifier: AGPL-3.0-or-later

//! Typed repositories over the flat-file collections.
//!
//! Repositories borrow the [`JsonStore`](super::JsonStore) and take the
//! relevant collection guard per operation, so each read-modify-write is
//! serialized against concurrent callers.

mod sessions;
mod transactions;
mod users;

pub use sessions::SessionRepository;
pub use transactions::TransactionRepository;
pub use users::{CreateUserOutcome, UserRepository};
