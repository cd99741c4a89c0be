// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat intake metadata, kept off the design row

use crate::{Store, StoreError};
use devloop_core::DesignId;
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Where a design request came from; used to thread notifications back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intake {
    pub design_id: DesignId,
    pub channel: String,
    pub thread_ts: Option<String>,
    pub requester_id: String,
    pub requester_name: String,
    pub created_at: String,
}

impl Store {
    pub fn record_intake(
        &self,
        design_id: &DesignId,
        channel: &str,
        thread_ts: Option<&str>,
        requester_id: &str,
        requester_name: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO intakes (design_id, channel, thread_ts, requester_id, requester_name) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT (design_id) DO NOTHING",
                params![design_id.as_str(), channel, thread_ts, requester_id, requester_name],
            )?;
            Ok(())
        })
    }

    pub fn get_intake(&self, design_id: &DesignId) -> Result<Option<Intake>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT channel, thread_ts, requester_id, requester_name, created_at \
                 FROM intakes WHERE design_id = ?1",
            )?;
            let mut rows = stmt.query(params![design_id.as_str()])?;
            match rows.next()? {
                Some(row) => Ok(Some(Intake {
                    design_id: design_id.clone(),
                    channel: row.get(0)?,
                    thread_ts: row.get(1)?,
                    requester_id: row.get(2)?,
                    requester_name: row.get(3)?,
                    created_at: row.get(4)?,
                })),
                None => Ok(None),
            }
        })
    }
}

#[cfg(test)]
#[path = "intakes_tests.rs"]
mod tests;
