// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Design output index: pointers to files agents wrote

use crate::{Store, StoreError};
use devloop_core::{DesignId, DesignOutput};
use rusqlite::params;
use std::path::{Path, PathBuf};

impl Store {
    /// Record an output path under `(design, key)`. A repeated key replaces
    /// the stored path.
    pub fn record_output(
        &self,
        design_id: &DesignId,
        key: &str,
        path: &Path,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO design_outputs (design_id, key, path) VALUES (?1, ?2, ?3) \
                 ON CONFLICT (design_id, key) DO UPDATE SET path = excluded.path",
                params![design_id.as_str(), key, path.to_string_lossy()],
            )?;
            Ok(())
        })
    }

    pub fn get_output(
        &self,
        design_id: &DesignId,
        key: &str,
    ) -> Result<Option<DesignOutput>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT path FROM design_outputs WHERE design_id = ?1 AND key = ?2",
            )?;
            let mut rows = stmt.query(params![design_id.as_str(), key])?;
            match rows.next()? {
                Some(row) => {
                    let path: String = row.get(0)?;
                    Ok(Some(DesignOutput {
                        design_id: design_id.clone(),
                        key: key.to_string(),
                        path: PathBuf::from(path),
                    }))
                }
                None => Ok(None),
            }
        })
    }

    pub fn list_outputs(&self, design_id: &DesignId) -> Result<Vec<DesignOutput>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key, path FROM design_outputs WHERE design_id = ?1 ORDER BY created_at, key",
            )?;
            let mut rows = stmt.query(params![design_id.as_str()])?;
            let mut outputs = Vec::new();
            while let Some(row) = rows.next()? {
                let key: String = row.get(0)?;
                let path: String = row.get(1)?;
                outputs.push(DesignOutput {
                    design_id: design_id.clone(),
                    key,
                    path: PathBuf::from(path),
                });
            }
            Ok(outputs)
        })
    }
}

#[cfg(test)]
#[path = "outputs_tests.rs"]
mod tests;
