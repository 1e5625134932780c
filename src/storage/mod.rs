// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Flat-File Storage
//!
//! Persistence for the service: three JSON collections under one data root,
//! written atomically and guarded by per-collection locks.
//!
//! ```text
//! data/
//! ├── users.json          # accounts, credentials, balances
//! ├── sessions.json       # opaque server-side sessions
//! ├── transactions.json   # append-only wallet credits
//! └── outbox/             # file-transport email drops
//! ```

pub mod json_fs;
pub mod paths;
pub mod repository;

pub use json_fs::{CollectionGuard, JsonStore, StorageError, StorageResult};
pub use paths::{Collection, StoragePaths, DEFAULT_DATA_ROOT};
