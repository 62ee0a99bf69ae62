// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod content;
pub mod events;
pub mod messages;
pub mod reservations;
pub mod tasks;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::database::Database;

    /// Opens a fresh database in a temp dir. Keep the dir alive for the test.
    pub async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }
}
