// 🏪 Store Adapter - get-or-create / update-or-create over SQLite
//
// The reconciliation engine only talks to ApplicationStore. SqliteStore
// borrows a connection (usually an open rusqlite::Transaction), so commit
// and rollback stay with the caller.

use crate::error::IngestResult;
use crate::models::{Application, ApplicationFields, College, Student};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;

// ============================================================================
// CONTRACT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Student,
    College,
    Application,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::College => "college",
            EntityKind::Application => "application",
        }
    }
}

/// How a source row identifies its college
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollegeLookup<'a> {
    /// Keyed by CEEB code; the name is only used when the row is created
    ByCeeb {
        ceeb_code: &'a str,
        default_name: &'a str,
    },
    /// No usable code: keyed by name alone
    ByName(&'a str),
}

impl<'a> CollegeLookup<'a> {
    /// Prefer the CEEB code whenever the normalizer kept one
    pub fn for_record(ceeb_code: &'a str, name: &'a str) -> Self {
        if ceeb_code.is_empty() {
            CollegeLookup::ByName(name)
        } else {
            CollegeLookup::ByCeeb {
                ceeb_code,
                default_name: name,
            }
        }
    }
}

/// Persistence operations the sync depends on. Each `bool` is `created`.
///
/// When more than one stored row matches a key, the lowest id wins.
pub trait ApplicationStore {
    fn get_or_create_student(&self, student_number: &str) -> IngestResult<(Student, bool)>;

    fn get_or_create_college(&self, lookup: &CollegeLookup<'_>) -> IngestResult<(College, bool)>;

    /// Keyed by the (student, college) pair; existing rows get `fields`
    /// written over them.
    fn update_or_create_application(
        &self,
        student_id: i64,
        college_id: i64,
        fields: &ApplicationFields,
    ) -> IngestResult<(Application, bool)>;

    fn list_ids(&self, kind: EntityKind) -> IngestResult<BTreeSet<i64>>;

    /// Returns how many rows were removed
    fn delete_by_ids(&self, kind: EntityKind, ids: &BTreeSet<i64>) -> IngestResult<usize>;
}

// ============================================================================
// SQLITE IMPLEMENTATION
// ============================================================================

pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        SqliteStore { conn }
    }

    pub fn find_student(&self, id: i64) -> IngestResult<Option<Student>> {
        let sql = format!("SELECT {} FROM student WHERE id = ?1", Student::COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Student::from_row)
            .optional()?)
    }

    pub fn find_college(&self, id: i64) -> IngestResult<Option<College>> {
        let sql = format!("SELECT {} FROM college WHERE id = ?1", College::COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], College::from_row)
            .optional()?)
    }

    pub fn find_application(&self, id: i64) -> IngestResult<Option<Application>> {
        let sql = format!("SELECT {} FROM application WHERE id = ?1", Application::COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Application::from_row)
            .optional()?)
    }

    /// Every application, ordered by id
    pub fn all_applications(&self) -> IngestResult<Vec<Application>> {
        let sql = format!("SELECT {} FROM application ORDER BY id", Application::COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let applications = stmt
            .query_map([], Application::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(applications)
    }

    fn first_college_where(&self, column: &str, value: &str) -> IngestResult<Option<College>> {
        let sql = format!(
            "SELECT {} FROM college WHERE {} = ?1 ORDER BY id LIMIT 1",
            College::COLUMNS,
            column
        );
        Ok(self
            .conn
            .query_row(&sql, params![value], College::from_row)
            .optional()?)
    }

    fn insert_college(&self, name: &str, ceeb_code: &str) -> IngestResult<College> {
        self.conn.execute(
            "INSERT INTO college (name, ceeb_code) VALUES (?1, ?2)",
            params![name, ceeb_code],
        )?;
        let id = self.conn.last_insert_rowid();
        self.find_college(id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows.into())
    }
}

impl ApplicationStore for SqliteStore<'_> {
    fn get_or_create_student(&self, student_number: &str) -> IngestResult<(Student, bool)> {
        let sql = format!(
            "SELECT {} FROM student WHERE student_number = ?1 ORDER BY id LIMIT 1",
            Student::COLUMNS
        );
        if let Some(student) = self
            .conn
            .query_row(&sql, params![student_number], Student::from_row)
            .optional()?
        {
            return Ok((student, false));
        }

        self.conn.execute(
            "INSERT INTO student (student_number) VALUES (?1)",
            params![student_number],
        )?;
        let id = self.conn.last_insert_rowid();
        let student = self
            .find_student(id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;

        Ok((student, true))
    }

    fn get_or_create_college(&self, lookup: &CollegeLookup<'_>) -> IngestResult<(College, bool)> {
        match *lookup {
            CollegeLookup::ByCeeb {
                ceeb_code,
                default_name,
            } => match self.first_college_where("ceeb_code", ceeb_code)? {
                Some(college) => Ok((college, false)),
                None => Ok((self.insert_college(default_name, ceeb_code)?, true)),
            },
            CollegeLookup::ByName(name) => match self.first_college_where("name", name)? {
                Some(college) => Ok((college, false)),
                None => Ok((self.insert_college(name, "")?, true)),
            },
        }
    }

    fn update_or_create_application(
        &self,
        student_id: i64,
        college_id: i64,
        fields: &ApplicationFields,
    ) -> IngestResult<(Application, bool)> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM application
                 WHERE student_id = ?1 AND college_id = ?2
                 ORDER BY id LIMIT 1",
                params![student_id, college_id],
                |row| row.get(0),
            )
            .optional()?;

        let (id, created) = match existing {
            Some(id) => {
                self.conn.execute(
                    "UPDATE application
                     SET application_result = ?1, application_type = ?2, attending = ?3
                     WHERE id = ?4",
                    params![
                        fields.application_result,
                        fields.application_type,
                        fields.attending,
                        id
                    ],
                )?;
                (id, false)
            }
            None => {
                self.conn.execute(
                    "INSERT INTO application (
                        student_id, college_id, application_result, application_type, attending
                     ) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        student_id,
                        college_id,
                        fields.application_result,
                        fields.application_type,
                        fields.attending
                    ],
                )?;
                (self.conn.last_insert_rowid(), true)
            }
        };

        let application = self
            .find_application(id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        Ok((application, created))
    }

    fn list_ids(&self, kind: EntityKind) -> IngestResult<BTreeSet<i64>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id FROM {}", kind.table()))?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<BTreeSet<i64>, _>>()?;
        Ok(ids)
    }

    fn delete_by_ids(&self, kind: EntityKind, ids: &BTreeSet<i64>) -> IngestResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut stmt = self
            .conn
            .prepare(&format!("DELETE FROM {} WHERE id = ?1", kind.table()))?;
        let mut deleted = 0;
        for id in ids {
            deleted += stmt.execute(params![id])?;
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn fields(result: &str, plan: &str, attending: Option<bool>) -> ApplicationFields {
        ApplicationFields {
            application_result: result.to_string(),
            application_type: plan.to_string(),
            attending,
        }
    }

    #[test]
    fn test_get_or_create_student() {
        let conn = test_db();
        let store = SqliteStore::new(&conn);

        let (first, created1) = store.get_or_create_student("S1").unwrap();
        let (second, created2) = store.get_or_create_student("S1").unwrap();

        assert!(created1);
        assert!(!created2);
        assert_eq!(first.id, second.id);
        assert_eq!(first.student_number, "S1");
        assert_eq!(first.gpa, Some(0.0));
        assert!(!first.low_income);
    }

    #[test]
    fn test_college_by_ceeb_keeps_first_name() {
        let conn = test_db();
        let store = SqliteStore::new(&conn);

        let (reed, created) = store
            .get_or_create_college(&CollegeLookup::for_record("1234", "Reed College"))
            .unwrap();
        assert!(created);

        let (again, created) = store
            .get_or_create_college(&CollegeLookup::for_record("1234", "Reed"))
            .unwrap();
        assert!(!created);
        assert_eq!(again.id, reed.id);
        assert_eq!(again.name, "Reed College", "name is a creation default only");
    }

    #[test]
    fn test_college_by_name_matches_any_code() {
        let conn = test_db();
        let store = SqliteStore::new(&conn);

        let (coded, _) = store
            .get_or_create_college(&CollegeLookup::for_record("1234", "Reed College"))
            .unwrap();
        let (by_name, created) = store
            .get_or_create_college(&CollegeLookup::for_record("", "Reed College"))
            .unwrap();

        assert!(!created);
        assert_eq!(by_name.id, coded.id);

        let (fresh, created) = store
            .get_or_create_college(&CollegeLookup::ByName("Bard College"))
            .unwrap();
        assert!(created);
        assert!(!fresh.has_ceeb_code());
    }

    #[test]
    fn test_update_or_create_application() {
        let conn = test_db();
        let store = SqliteStore::new(&conn);
        let (student, _) = store.get_or_create_student("S1").unwrap();
        let (college, _) = store.get_or_create_college(&CollegeLookup::ByName("Reed")).unwrap();

        let (app, created) = store
            .update_or_create_application(
                student.id,
                college.id,
                &fields("accepted", "Early Decision", Some(true)),
            )
            .unwrap();
        assert!(created);
        assert_eq!(app.attending, Some(true));
        assert_eq!(app.legacy_status, None);

        let (updated, created) = store
            .update_or_create_application(student.id, college.id, &fields("denied", "Other", None))
            .unwrap();
        assert!(!created);
        assert_eq!(updated.id, app.id);
        assert_eq!(updated.fields(), fields("denied", "Other", None));
    }

    #[test]
    fn test_list_and_delete_ids() {
        let conn = test_db();
        let store = SqliteStore::new(&conn);
        for number in ["S1", "S2", "S3"] {
            store.get_or_create_student(number).unwrap();
        }

        let ids = store.list_ids(EntityKind::Student).unwrap();
        assert_eq!(ids.len(), 3);

        let doomed: BTreeSet<i64> = ids.iter().take(2).copied().collect();
        assert_eq!(store.delete_by_ids(EntityKind::Student, &doomed).unwrap(), 2);
        assert_eq!(store.list_ids(EntityKind::Student).unwrap().len(), 1);
        assert_eq!(store.delete_by_ids(EntityKind::Student, &BTreeSet::new()).unwrap(), 0);
    }
}
