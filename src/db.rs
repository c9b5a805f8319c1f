// 🗄️ Database - SQLite connection + explicit schema bootstrap
//
// Schema setup is its own step: callers run setup_database() once, before
// handing the connection to the reconciliation engine.

use crate::reconciliation::SyncReport;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Full relational model. Only student / college / application are written
/// by the sync; the rest belong to the wider records system.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS district (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        state TEXT NOT NULL DEFAULT '',
        county TEXT NOT NULL DEFAULT '',
        zip_code TEXT NOT NULL DEFAULT '',
        external_average_gpa REAL,
        external_average_act_score REAL,
        external_average_sat_score REAL,
        internal_average_gpa REAL,
        internal_average_act_score REAL,
        internal_average_sat_score REAL
    );

    CREATE TABLE IF NOT EXISTS high_school (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        district_id INTEGER NOT NULL REFERENCES district(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        external_average_gpa REAL,
        external_average_act_score REAL,
        external_average_sat_score REAL,
        internal_average_gpa REAL,
        internal_average_act_score REAL,
        internal_average_sat_score REAL
    );

    CREATE TABLE IF NOT EXISTS student (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_number TEXT,
        high_school_id INTEGER REFERENCES high_school(id) ON DELETE CASCADE,
        gender TEXT NOT NULL DEFAULT '',
        ethnicity TEXT NOT NULL DEFAULT '',
        sexual_orientation TEXT NOT NULL DEFAULT '',
        disability TEXT NOT NULL DEFAULT '',
        low_income INTEGER NOT NULL DEFAULT 0,
        first_generation_student INTEGER NOT NULL DEFAULT 0,
        gpa REAL DEFAULT 0.0,
        act_score INTEGER,
        sat_score INTEGER,
        intended_major TEXT NOT NULL DEFAULT '',
        grade_level TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS college (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL DEFAULT '',
        ceeb_code TEXT NOT NULL DEFAULT '',
        external_average_gpa REAL,
        external_average_act_score INTEGER,
        external_average_sat_score INTEGER
    );

    CREATE TABLE IF NOT EXISTS application (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES student(id) ON DELETE CASCADE,
        college_id INTEGER NOT NULL REFERENCES college(id) ON DELETE CASCADE,
        application_result TEXT NOT NULL DEFAULT '',
        application_type TEXT NOT NULL DEFAULT '',
        attending INTEGER,
        legacy_status INTEGER
    );

    CREATE TABLE IF NOT EXISTS course (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sced_code TEXT NOT NULL DEFAULT '',
        course_name TEXT NOT NULL,
        course_description TEXT,
        subject_area TEXT NOT NULL,
        ap_course INTEGER NOT NULL DEFAULT 0,
        ib_course INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS enrollment (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES student(id) ON DELETE CASCADE,
        course_id INTEGER NOT NULL REFERENCES course(id) ON DELETE CASCADE,
        grade TEXT NOT NULL DEFAULT '',
        semester TEXT NOT NULL DEFAULT '',
        year INTEGER DEFAULT 0
    );

    -- One row per reconciliation run (audit trail)
    CREATE TABLE IF NOT EXISTS sync_run (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id TEXT UNIQUE NOT NULL,
        started_at TEXT NOT NULL,
        finished_at TEXT NOT NULL,
        report TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_district_name ON district(name);
    CREATE INDEX IF NOT EXISTS idx_high_school_name ON high_school(name);
    CREATE INDEX IF NOT EXISTS idx_student_number ON student(student_number);
    CREATE INDEX IF NOT EXISTS idx_college_ceeb_code ON college(ceeb_code);
    CREATE INDEX IF NOT EXISTS idx_college_name ON college(name);
    CREATE INDEX IF NOT EXISTS idx_application_pair ON application(student_id, college_id);
    CREATE INDEX IF NOT EXISTS idx_course_sced_code ON course(sced_code);
    CREATE INDEX IF NOT EXISTS idx_course_name ON course(course_name);
";

/// Every table SCHEMA creates
pub const TABLES: [&str; 8] = [
    "district",
    "high_school",
    "student",
    "college",
    "application",
    "course",
    "enrollment",
    "sync_run",
];

/// Open (or create) the database file with WAL journaling
pub fn open_database(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    // Enable WAL mode for crash recovery
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    Ok(conn)
}

/// Create every table and index if missing. Safe to call on each start.
pub fn setup_database(conn: &Connection) -> Result<()> {
    // Foreign keys are per-connection in SQLite
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA)
        .context("Failed to create schema")?;
    Ok(())
}

/// Record a finished reconciliation run
pub fn insert_sync_run(conn: &Connection, report: &SyncReport) -> Result<()> {
    let report_json = serde_json::to_string(report)?;

    conn.execute(
        "INSERT INTO sync_run (run_id, started_at, finished_at, report)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            report.run_id.to_string(),
            report.started_at.to_rfc3339(),
            report.finished_at.to_rfc3339(),
            report_json,
        ],
    )?;

    Ok(())
}

/// Most recent run, by insertion order
pub fn latest_sync_run(conn: &Connection) -> Result<Option<SyncReport>> {
    let report_json: Option<String> = conn
        .query_row(
            "SELECT report FROM sync_run ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    report_json
        .map(|json| serde_json::from_str(&json).context("Corrupt sync_run report"))
        .transpose()
}

/// Row count of one schema table. Any other name is refused before it
/// reaches SQL.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    if !TABLES.contains(&table) {
        anyhow::bail!("Unknown table: {}", table);
    }

    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;

    Ok(count)
}
