// SPDX-License-Identifier: AGPL-3.0-or-later

//! Path layout for the flat-file dataset.

use std::path::{Path, PathBuf};

/// Default data root when `DATA_DIR` is not set.
pub const DEFAULT_DATA_ROOT: &str = "data";

/// Record collections backed by one JSON file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Sessions,
    Transactions,
}

impl Collection {
    /// File name of the collection under the data root.
    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::Users => "users.json",
            Collection::Sessions => "sessions.json",
            Collection::Transactions => "transactions.json",
        }
    }
}

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persisted data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backing file for a collection.
    pub fn collection_file(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.file_name())
    }

    /// Directory where the file-transport email sender drops messages.
    pub fn outbox_dir(&self) -> PathBuf {
        self.root.join("outbox")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("data"));
    }

    #[test]
    fn collection_files_live_under_root() {
        let paths = StoragePaths::new("/tmp/arcade-test");
        assert_eq!(
            paths.collection_file(Collection::Users),
            PathBuf::from("/tmp/arcade-test/users.json")
        );
        assert_eq!(
            paths.collection_file(Collection::Sessions),
            PathBuf::from("/tmp/arcade-test/sessions.json")
        );
        assert_eq!(
            paths.collection_file(Collection::Transactions),
            PathBuf::from("/tmp/arcade-test/transactions.json")
        );
        assert_eq!(
            paths.outbox_dir(),
            PathBuf::from("/tmp/arcade-test/outbox")
        );
    }
}
