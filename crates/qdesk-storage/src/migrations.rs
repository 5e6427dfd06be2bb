// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! SQL files under `migrations/` are compiled in with refinery and applied
//! whenever a database is opened.

use qdesk_core::QdeskError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Applies every pending migration; refinery records them in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), QdeskError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| QdeskError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
