// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pull-request state repository

use crate::{Store, StoreError};
use devloop_core::{CheckStatus, DesignId, PrStage, PrState};
use rusqlite::{params, Row};

fn pr_from_row(row: &Row<'_>) -> Result<PrState, StoreError> {
    let stage: String = row.get("stage")?;
    let ci: String = row.get("ci_status")?;
    let review: String = row.get("review_status")?;
    Ok(PrState {
        pr_number: row.get("pr_number")?,
        design_id: DesignId::from_string(row.get::<_, String>("design_id")?),
        stage: PrStage::parse(&stage)
            .ok_or_else(|| StoreError::Corrupt(format!("pr stage {stage:?}")))?,
        issue_key: row.get("issue_key")?,
        parent_key: row.get("parent_key")?,
        feature_slug: row.get("feature_slug")?,
        ci_status: CheckStatus::parse(&ci)
            .ok_or_else(|| StoreError::Corrupt(format!("ci status {ci:?}")))?,
        review_status: CheckStatus::parse(&review)
            .ok_or_else(|| StoreError::Corrupt(format!("review status {review:?}")))?,
        ci_attempts: row.get("ci_attempts")?,
        review_attempts: row.get("review_attempts")?,
        last_flaky: row.get("last_flaky")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

const SELECT: &str = "SELECT pr_number, design_id, stage, issue_key, parent_key, feature_slug, \
                      ci_status, review_status, ci_attempts, review_attempts, last_flaky, \
                      created_at, updated_at FROM pr_states";

impl Store {
    pub fn create_pr(
        &self,
        pr_number: u64,
        design_id: &DesignId,
        issue_key: &str,
        parent_key: Option<&str>,
        feature_slug: Option<&str>,
    ) -> Result<PrState, StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO pr_states (pr_number, design_id, issue_key, parent_key, feature_slug) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![pr_number, design_id.as_str(), issue_key, parent_key, feature_slug],
            )?;
            Ok(())
        })?;
        self.get_pr(pr_number)?.ok_or(StoreError::NotFound {
            what: "pr_state",
            key: pr_number.to_string(),
        })
    }

    pub fn get_pr(&self, pr_number: u64) -> Result<Option<PrState>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT} WHERE pr_number = ?1"))?;
            let mut rows = stmt.query(params![pr_number])?;
            match rows.next()? {
                Some(row) => Ok(Some(pr_from_row(row)?)),
                None => Ok(None),
            }
        })
    }

    pub fn list_prs_for_design(&self, design_id: &DesignId) -> Result<Vec<PrState>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT} WHERE design_id = ?1 ORDER BY pr_number"))?;
            let mut rows = stmt.query(params![design_id.as_str()])?;
            let mut prs = Vec::new();
            while let Some(row) = rows.next()? {
                prs.push(pr_from_row(row)?);
            }
            Ok(prs)
        })
    }

    /// Advance a PR's stage. Backwards moves and moves out of a terminal
    /// stage are refused (returns `false`), keeping the progression
    /// monotonic no matter what order webhooks arrive in.
    pub fn update_pr_stage(&self, pr_number: u64, stage: PrStage) -> Result<bool, StoreError> {
        let current = self.get_pr(pr_number)?.ok_or(StoreError::NotFound {
            what: "pr_state",
            key: pr_number.to_string(),
        })?;
        if current.stage.is_terminal() || stage.rank() <= current.stage.rank() {
            tracing::warn!(
                pr_number,
                from = %current.stage,
                to = %stage,
                "refusing non-monotonic pr stage transition"
            );
            return Ok(false);
        }
        self.touch_pr(pr_number, "stage = ?2", &[&stage.as_str()])?;
        Ok(true)
    }

    pub fn update_ci_status(
        &self,
        pr_number: u64,
        status: CheckStatus,
    ) -> Result<(), StoreError> {
        self.touch_pr(pr_number, "ci_status = ?2", &[&status.as_str()])
    }

    pub fn update_review_status(
        &self,
        pr_number: u64,
        status: CheckStatus,
    ) -> Result<(), StoreError> {
        self.touch_pr(pr_number, "review_status = ?2", &[&status.as_str()])
    }

    pub fn set_last_flaky(&self, pr_number: u64, flaky: bool) -> Result<(), StoreError> {
        self.touch_pr(pr_number, "last_flaky = ?2", &[&flaky])
    }

    pub fn increment_ci_attempts(&self, pr_number: u64) -> Result<u32, StoreError> {
        self.increment_pr_counter(pr_number, "ci_attempts")
    }

    pub fn increment_review_attempts(&self, pr_number: u64) -> Result<u32, StoreError> {
        self.increment_pr_counter(pr_number, "review_attempts")
    }

    pub fn reset_ci_attempts(&self, pr_number: u64) -> Result<(), StoreError> {
        self.touch_pr(pr_number, "ci_attempts = 0, last_flaky = 0", &[])
    }

    pub fn reset_review_attempts(&self, pr_number: u64) -> Result<(), StoreError> {
        self.touch_pr(pr_number, "review_attempts = 0", &[])
    }

    /// A PR is ready for human review when both check streams pass.
    pub fn ready_for_human(&self, pr_number: u64) -> Result<bool, StoreError> {
        let pr = self.get_pr(pr_number)?.ok_or(StoreError::NotFound {
            what: "pr_state",
            key: pr_number.to_string(),
        })?;
        Ok(pr.ci_status == CheckStatus::Passing && pr.review_status == CheckStatus::Passing)
    }

    /// True when every PR under the design is merged. False when the design
    /// has no PRs yet.
    pub fn all_siblings_merged(&self, design_id: &DesignId) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let (total, merged): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(stage = 'merged'), 0) \
                 FROM pr_states WHERE design_id = ?1",
                params![design_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(total > 0 && merged == total)
        })
    }

    fn increment_pr_counter(&self, pr_number: u64, column: &str) -> Result<u32, StoreError> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                &format!(
                    "UPDATE pr_states SET {column} = {column} + 1, \
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE pr_number = ?1"
                ),
                params![pr_number],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound {
                    what: "pr_state",
                    key: pr_number.to_string(),
                });
            }
            Ok(conn.query_row(
                &format!("SELECT {column} FROM pr_states WHERE pr_number = ?1"),
                params![pr_number],
                |row| row.get(0),
            )?)
        })
    }

    fn touch_pr(
        &self,
        pr_number: u64,
        set_clause: &str,
        extra: &[&dyn rusqlite::ToSql],
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE pr_states SET {set_clause}, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE pr_number = ?1"
            );
            let mut args: Vec<&dyn rusqlite::ToSql> = vec![&pr_number];
            args.extend_from_slice(extra);
            let updated = conn.execute(&sql, args.as_slice())?;
            if updated == 0 {
                return Err(StoreError::NotFound {
                    what: "pr_state",
                    key: pr_number.to_string(),
                });
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "prs_tests.rs"]
mod tests;
