// ⚖️ Reconciliation Engine - Converge the store to one source snapshot
//
// For every cleaned row, in order:
//   student  = get-or-create by student_number
//   college  = get-or-create by ceeb_code (name as default) or by name
//   app      = update-or-create by (student, college)
// then delete every application that existed before the run and was not
// touched by it. Students and colleges are never deleted.
//
// The whole pass runs inside one SQLite transaction: a failure anywhere
// leaves the store exactly as it was.

use crate::db::insert_sync_run;
use crate::error::IngestResult;
use crate::models::ApplicationFields;
use crate::preprocess::{preprocess, ApplicationRecord, Preprocessed, PreprocessSummary};
use crate::source::load_table;
use crate::store::{ApplicationStore, CollegeLookup, EntityKind, SqliteStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, info_span};
use uuid::Uuid;

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    pub rows_processed: usize,
    pub students_created: usize,
    pub colleges_created: usize,
    pub applications_created: usize,
    /// Existing applications overwritten with the row's values
    pub applications_updated: usize,
    pub applications_deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub preprocess: PreprocessSummary,
    pub counts: SyncCounts,
}

impl SyncReport {
    pub fn summary(&self) -> String {
        format!(
            "Sync {}: {} rows → {} applications created, {} updated, {} deleted ({} new students, {} new colleges)",
            self.run_id,
            self.counts.rows_processed,
            self.counts.applications_created,
            self.counts.applications_updated,
            self.counts.applications_deleted,
            self.counts.students_created,
            self.counts.colleges_created,
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine<S: ApplicationStore> {
    store: S,
}

impl<S: ApplicationStore> ReconciliationEngine<S> {
    pub fn new(store: S) -> Self {
        ReconciliationEngine { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Full-replace sync of the application set against `records`
    pub fn reconcile(&self, records: &[ApplicationRecord]) -> IngestResult<SyncCounts> {
        let existing = self.store.list_ids(EntityKind::Application)?;
        let mut seen = BTreeSet::new();
        let mut counts = SyncCounts::default();

        for record in records {
            let application_id = self.apply_record(record, &mut counts)?;
            seen.insert(application_id);
            counts.rows_processed += 1;
        }

        let stale: BTreeSet<i64> = existing.difference(&seen).copied().collect();
        counts.applications_deleted = self.store.delete_by_ids(EntityKind::Application, &stale)?;

        info!(
            rows = counts.rows_processed,
            created = counts.applications_created,
            updated = counts.applications_updated,
            deleted = counts.applications_deleted,
            "Reconciliation complete"
        );

        Ok(counts)
    }

    /// Upsert one row; returns the surviving application's id
    fn apply_record(&self, record: &ApplicationRecord, counts: &mut SyncCounts) -> IngestResult<i64> {
        let (student, student_created) = self.store.get_or_create_student(&record.student_number)?;
        if student_created {
            counts.students_created += 1;
            debug!(row = record.row_number, student_number = %student.student_number, "Created student");
        }

        let lookup = CollegeLookup::for_record(&record.ceeb_code, &record.college_name);
        let (college, college_created) = self.store.get_or_create_college(&lookup)?;
        if college_created {
            counts.colleges_created += 1;
            debug!(row = record.row_number, college = %college.name, ceeb_code = %college.ceeb_code, "Created college");
        }

        let fields = ApplicationFields {
            application_result: record.application_result.clone(),
            application_type: record.application_type.clone(),
            attending: record.attending,
        };
        let (application, created) =
            self.store
                .update_or_create_application(student.id, college.id, &fields)?;

        if created {
            counts.applications_created += 1;
        } else {
            counts.applications_updated += 1;
        }
        debug!(row = record.row_number, application_id = application.id, created, "Upserted application");

        Ok(application.id)
    }
}

// ============================================================================
// TRANSACTIONAL ENTRY POINTS
// ============================================================================

/// Reconcile a preprocessed snapshot inside a single transaction and record
/// the run in `sync_run`. The schema must already exist.
pub fn sync_snapshot(conn: &mut Connection, snapshot: &Preprocessed) -> Result<SyncReport> {
    let run_id = Uuid::new_v4();
    let span = info_span!("sync", %run_id);
    let _guard = span.enter();

    let started_at = Utc::now();
    let tx = conn.transaction()?;

    let counts = {
        let engine = ReconciliationEngine::new(SqliteStore::new(&tx));
        engine.reconcile(&snapshot.records)?
    };

    let report = SyncReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        preprocess: snapshot.summary.clone(),
        counts,
    };
    insert_sync_run(&tx, &report)?;

    tx.commit()?;
    info!("{}", report.summary());

    Ok(report)
}

/// Load, clean and reconcile one CSV export
pub fn sync_file(conn: &mut Connection, csv_path: &Path) -> Result<SyncReport> {
    let table = load_table(csv_path)?;
    let snapshot = preprocess(table)?;
    sync_snapshot(conn, &snapshot)
}
