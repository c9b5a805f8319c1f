// 🎓 Entity Models - Students, colleges and the applications joining them
//
// Student and College rows are identity-bearing and created lazily; the
// pipeline never deletes them. Application is the association record and
// is kept in exact sync with the latest source snapshot.

use rusqlite::Row;
use serde::{Deserialize, Serialize};

// ============================================================================
// STUDENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,

    /// External identifier, used as the lookup key
    pub student_number: String,

    pub high_school_id: Option<i64>,

    // Demographics (defaults only; the sync never writes these)
    pub gender: String,
    pub ethnicity: String,
    pub sexual_orientation: String,
    pub disability: String,
    pub low_income: bool,
    pub first_generation_student: bool,

    // Academics
    pub gpa: Option<f64>,
    pub act_score: Option<i64>,
    pub sat_score: Option<i64>,
    pub intended_major: String,
    pub grade_level: String,
}

impl Student {
    pub const COLUMNS: &'static str = "id, student_number, high_school_id, gender, ethnicity, \
         sexual_orientation, disability, low_income, first_generation_student, gpa, \
         act_score, sat_score, intended_major, grade_level";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Student {
            id: row.get(0)?,
            student_number: row.get(1)?,
            high_school_id: row.get(2)?,
            gender: row.get(3)?,
            ethnicity: row.get(4)?,
            sexual_orientation: row.get(5)?,
            disability: row.get(6)?,
            low_income: row.get(7)?,
            first_generation_student: row.get(8)?,
            gpa: row.get(9)?,
            act_score: row.get(10)?,
            sat_score: row.get(11)?,
            intended_major: row.get(12)?,
            grade_level: row.get(13)?,
        })
    }
}

// ============================================================================
// COLLEGE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct College {
    pub id: i64,
    pub name: String,

    /// 4-digit College Board code, or "" when unknown
    pub ceeb_code: String,

    pub external_average_gpa: Option<f64>,
    pub external_average_act_score: Option<i64>,
    pub external_average_sat_score: Option<i64>,
}

impl College {
    pub const COLUMNS: &'static str = "id, name, ceeb_code, external_average_gpa, \
         external_average_act_score, external_average_sat_score";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(College {
            id: row.get(0)?,
            name: row.get(1)?,
            ceeb_code: row.get(2)?,
            external_average_gpa: row.get(3)?,
            external_average_act_score: row.get(4)?,
            external_average_sat_score: row.get(5)?,
        })
    }

    pub fn has_ceeb_code(&self) -> bool {
        !self.ceeb_code.is_empty()
    }
}

// ============================================================================
// APPLICATION
// ============================================================================

/// The values a sync overwrites on an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationFields {
    pub application_result: String,
    pub application_type: String,
    /// Tri-state: None when the source flag was unreadable
    pub attending: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub student_id: i64,
    pub college_id: i64,
    pub application_result: String,
    pub application_type: String,
    pub attending: Option<bool>,
    pub legacy_status: Option<bool>,
}

impl Application {
    pub const COLUMNS: &'static str = "id, student_id, college_id, application_result, \
         application_type, attending, legacy_status";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Application {
            id: row.get(0)?,
            student_id: row.get(1)?,
            college_id: row.get(2)?,
            application_result: row.get(3)?,
            application_type: row.get(4)?,
            attending: row.get(5)?,
            legacy_status: row.get(6)?,
        })
    }

    pub fn fields(&self) -> ApplicationFields {
        ApplicationFields {
            application_result: self.application_result.clone(),
            application_type: self.application_type.clone(),
            attending: self.attending,
        }
    }
}
