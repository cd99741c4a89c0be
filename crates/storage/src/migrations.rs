// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forward-only schema migrations
//!
//! Each migration applies inside a transaction that also records it in
//! `_migrations`, so a half-applied migration rolls back whole and a
//! re-run is a no-op.

use crate::StoreError;
use rusqlite::Connection;

/// Embedded migrations in apply order. Names must stay stable once shipped.
const MIGRATIONS: &[(&str, &str)] = &[
    ("0001_designs", include_str!("migrations/0001_designs.sql")),
    ("0002_pr_states", include_str!("migrations/0002_pr_states.sql")),
];

pub(crate) fn apply(conn: &mut Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name       TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM _migrations WHERE name = ?1)",
            [name],
            |row| row.get(0),
        )?;
        if already {
            continue;
        }

        let tx = conn.transaction()?;
        let result = tx
            .execute_batch(sql)
            .and_then(|()| {
                tx.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
                    .map(|_| ())
            });
        match result {
            Ok(()) => {
                tx.commit()?;
                tracing::info!(migration = name, "applied migration");
            }
            Err(source) => {
                // Dropping the transaction rolls it back.
                return Err(StoreError::Migration { name: (*name).to_string(), source });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "migrations_tests.rs"]
mod tests;
