// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::Store;

#[test]
fn fresh_database_gets_full_schema() {
    let store = Store::open_in_memory().unwrap();
    let tables: Vec<String> = store
        .with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            )?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(names)
        })
        .unwrap();
    for expected in ["_migrations", "designs", "design_outputs", "intakes", "pr_states"] {
        assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
    }
}

#[test]
fn running_migrations_twice_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devloop.db");
    drop(Store::open(&path).unwrap());
    // Second open re-runs apply() against the same file.
    let store = Store::open(&path).unwrap();
    let count: i64 = store
        .with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))?)
        })
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn wal_and_foreign_keys_are_active() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("devloop.db")).unwrap();
    store
        .with_conn(|conn| {
            let mode: String =
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
            assert_eq!(mode, "wal");
            let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
            assert_eq!(fk, 1);
            Ok(())
        })
        .unwrap();
}
