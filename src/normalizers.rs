// 🧹 Field Normalizers - One raw cell in, one canonical value out
//
// Identifiers, result categories, decision plans and attendance flags arrive
// as free text. Each normalizer is total over its accepted domain and falls
// back to a sentinel ("" or None) on soft ambiguity. Type violations are hard
// errors.

use crate::cell::{AcceptedInput, CellValue};
use crate::error::IngestResult;
use serde::{Deserialize, Serialize};

/// Length of a College Board institution code
pub const CEEB_CODE_LEN: usize = 4;

/// Result values that mean "no result yet"
const BLANK_RESULTS: [&str; 3] = ["", "unknown", "no decision"];

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Strip every character that is not an ASCII digit.
///
/// Accepts text or integers only; integers are rendered in decimal first.
pub fn remove_non_numeric_characters(value: &CellValue) -> IngestResult<String> {
    let text = AcceptedInput::text_or_integer(value)?.to_text();
    Ok(text.chars().filter(char::is_ascii_digit).collect())
}

/// Digits of a CEEB code, or "" when they don't form exactly 4 digits
pub fn is_valid_ceeb_code(value: &CellValue) -> IngestResult<String> {
    let digits = remove_non_numeric_characters(value)?;
    if digits.len() == CEEB_CODE_LEN {
        Ok(digits)
    } else {
        Ok(String::new())
    }
}

// ============================================================================
// APPLICATION RESULT
// ============================================================================

/// Lower-case and trim; "unknown" / "no decision" / blank collapse to ""
pub fn clean_application_result(value: &CellValue) -> IngestResult<String> {
    let cleaned = AcceptedInput::text(value)?.trim().to_lowercase();
    if BLANK_RESULTS.contains(&cleaned.as_str()) {
        Ok(String::new())
    } else {
        Ok(cleaned)
    }
}

// ============================================================================
// APPLICATION TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationType {
    RollingDecision,
    RestrictedEarlyAction,
    PriorityDecision,
    EarlyActionII,
    EarlyAction,
    EarlyDecisionII,
    EarlyDecision,
    RegularDecision,
    Other,
}

impl ApplicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationType::RollingDecision => "Rolling Decision",
            ApplicationType::RestrictedEarlyAction => "Restricted Early Action",
            ApplicationType::PriorityDecision => "Priority Decision",
            ApplicationType::EarlyActionII => "Early Action II",
            ApplicationType::EarlyAction => "Early Action",
            ApplicationType::EarlyDecisionII => "Early Decision II",
            ApplicationType::EarlyDecision => "Early Decision",
            ApplicationType::RegularDecision => "Regular Decision",
            ApplicationType::Other => "Other",
        }
    }

    /// Classify an already lower-cased, trimmed, non-empty plan label.
    /// First matching rule wins; anything unmatched is `Other`.
    pub fn classify(label: &str) -> Self {
        PLAN_RULES
            .iter()
            .find(|rule| rule.matches(label))
            .map(|rule| rule.plan)
            .unwrap_or(ApplicationType::Other)
    }
}

/// One row of the ordered plan table: substring hits or exact hits
struct PlanRule {
    plan: ApplicationType,
    contains: &'static [&'static str],
    equals: &'static [&'static str],
}

impl PlanRule {
    fn matches(&self, label: &str) -> bool {
        self.contains.iter().any(|needle| label.contains(needle))
            || self.equals.iter().any(|exact| label == *exact)
    }
}

// Order matters: the "ii" variants sit before their plain counterparts.
const PLAN_RULES: [PlanRule; 8] = [
    PlanRule {
        plan: ApplicationType::RollingDecision,
        contains: &["rolling"],
        equals: &[],
    },
    PlanRule {
        plan: ApplicationType::RestrictedEarlyAction,
        contains: &[],
        equals: &["restricted early action", "rea"],
    },
    PlanRule {
        plan: ApplicationType::PriorityDecision,
        contains: &["priority"],
        equals: &["pri"],
    },
    PlanRule {
        plan: ApplicationType::EarlyActionII,
        contains: &["early action ii"],
        equals: &["ea2"],
    },
    PlanRule {
        plan: ApplicationType::EarlyAction,
        contains: &["early action"],
        equals: &["ea"],
    },
    PlanRule {
        plan: ApplicationType::EarlyDecisionII,
        contains: &["early decision ii"],
        equals: &["ed2"],
    },
    PlanRule {
        plan: ApplicationType::EarlyDecision,
        contains: &["early decision"],
        equals: &["ed"],
    },
    PlanRule {
        plan: ApplicationType::RegularDecision,
        contains: &["regular decision", "regular"],
        equals: &[],
    },
];

/// Expand a decision-plan label ("ED", "ea2", "Rolling") to its full name.
/// Blank input stays blank.
pub fn expand_application_type(value: &CellValue) -> IngestResult<String> {
    let label = AcceptedInput::text(value)?.trim().to_lowercase();
    if label.is_empty() {
        return Ok(String::new());
    }
    Ok(ApplicationType::classify(&label).as_str().to_string())
}

// ============================================================================
// ATTENDANCE FLAG
// ============================================================================

/// Tri-state attendance: Some(true), Some(false), or None when unreadable.
/// Never fails; any value is rendered as text first.
pub fn convert_attending_to_boolean(value: &CellValue) -> Option<bool> {
    let flag = value.render().trim().to_lowercase();
    match flag.as_str() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}
