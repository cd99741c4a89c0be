// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Design repository

use crate::{Store, StoreError};
use devloop_core::{Design, DesignId, DesignStage, DesignStatus};
use rusqlite::{params, Row};

fn design_from_row(row: &Row<'_>) -> Result<Design, StoreError> {
    let stage: String = row.get("stage")?;
    let status: String = row.get("status")?;
    Ok(Design {
        id: DesignId::from_string(row.get::<_, String>("id")?),
        description: row.get("description")?,
        stage: DesignStage::parse(&stage)
            .ok_or_else(|| StoreError::Corrupt(format!("design stage {stage:?}")))?,
        status: DesignStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("design status {status:?}")))?,
        page_id: row.get("page_id")?,
        parent_key: row.get("parent_key")?,
        review_attempts: row.get("review_attempts")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

const SELECT: &str = "SELECT id, description, stage, status, page_id, parent_key, \
                      review_attempts, created_at, updated_at FROM designs";

impl Store {
    /// Insert a new design in stage `design`, status `running`.
    pub fn create_design(&self, id: &DesignId, description: &str) -> Result<Design, StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO designs (id, description) VALUES (?1, ?2)",
                params![id.as_str(), description],
            )?;
            Ok(())
        })?;
        self.get_design(id)
    }

    pub fn get_design(&self, id: &DesignId) -> Result<Design, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT} WHERE id = ?1"))?;
            let mut rows = stmt.query(params![id.as_str()])?;
            match rows.next()? {
                Some(row) => design_from_row(row),
                None => Err(StoreError::NotFound { what: "design", key: id.to_string() }),
            }
        })
    }

    pub fn list_designs_by_status(
        &self,
        status: DesignStatus,
    ) -> Result<Vec<Design>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT} WHERE status = ?1 ORDER BY created_at"))?;
            let mut rows = stmt.query(params![status.as_str()])?;
            let mut designs = Vec::new();
            while let Some(row) = rows.next()? {
                designs.push(design_from_row(row)?);
            }
            Ok(designs)
        })
    }

    pub fn update_design_status(
        &self,
        id: &DesignId,
        status: DesignStatus,
    ) -> Result<(), StoreError> {
        self.touch_design(id, "status = ?2", &[&status.as_str()])
    }

    pub fn advance_design_stage(
        &self,
        id: &DesignId,
        stage: DesignStage,
    ) -> Result<(), StoreError> {
        self.touch_design(id, "stage = ?2", &[&stage.as_str()])
    }

    pub fn set_design_page_id(&self, id: &DesignId, page_id: &str) -> Result<(), StoreError> {
        self.touch_design(id, "page_id = ?2", &[&page_id])
    }

    pub fn set_design_parent_key(
        &self,
        id: &DesignId,
        parent_key: &str,
    ) -> Result<(), StoreError> {
        self.touch_design(id, "parent_key = ?2", &[&parent_key])
    }

    /// Bump the review counter and return the new value.
    pub fn increment_design_review_attempts(&self, id: &DesignId) -> Result<u32, StoreError> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE designs SET review_attempts = review_attempts + 1, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?1",
                params![id.as_str()],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound { what: "design", key: id.to_string() });
            }
            Ok(conn.query_row(
                "SELECT review_attempts FROM designs WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )?)
        })
    }

    fn touch_design(
        &self,
        id: &DesignId,
        set_clause: &str,
        extra: &[&dyn rusqlite::ToSql],
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE designs SET {set_clause}, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?1"
            );
            let id_str = id.as_str();
            let mut args: Vec<&dyn rusqlite::ToSql> = vec![&id_str];
            args.extend_from_slice(extra);
            let updated = conn.execute(&sql, args.as_slice())?;
            if updated == 0 {
                return Err(StoreError::NotFound { what: "design", key: id.to_string() });
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "designs_tests.rs"]
mod tests;
