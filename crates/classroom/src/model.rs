//! Domain Models
//!
//! Students, performance bands and calendar entries.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Performance band of a student
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    #[serde(alias = "Good", alias = "GOOD")]
    Good,
    #[serde(alias = "Average", alias = "AVERAGE")]
    Average,
    #[serde(alias = "Bad", alias = "BAD")]
    Bad,
}

impl Performance {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Average => "average",
            Self::Bad => "bad",
        }
    }

    /// Bands a mentor for this student may come from; `None` when the
    /// student needs no mentor
    pub const fn eligible_mentor_bands(self) -> Option<&'static [Self]> {
        match self {
            Self::Good => None,
            Self::Average => Some(&[Self::Good]),
            Self::Bad => Some(&[Self::Average, Self::Good]),
        }
    }
}

impl std::fmt::Display for Performance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: u32,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub subject: String,
    #[serde(default)]
    pub total_marks: u32,
    pub grade: u8,
    pub performance: Performance,

    /// Whether this student already mentors someone
    #[serde(default)]
    pub is_mentor: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_mentor: Option<String>,
}

impl Student {
    pub fn has_mentor(&self) -> bool {
        self.assigned_mentor
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty())
    }
}

/// A timed calendar entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl CalendarEvent {
    /// "09:00–10:00 Maths"
    pub fn describe(&self, offset: FixedOffset) -> String {
        format!(
            "{}–{} {}",
            self.start.with_timezone(&offset).format("%H:%M"),
            self.end.with_timezone(&offset).format("%H:%M"),
            self.summary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_accepts_capitalized() {
        let p: Performance = serde_json::from_str("\"Average\"").unwrap();
        assert_eq!(p, Performance::Average);
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"average\"");
    }

    #[test]
    fn test_mentor_bands() {
        assert!(Performance::Good.eligible_mentor_bands().is_none());
        assert_eq!(Performance::Average.eligible_mentor_bands(), Some(&[Performance::Good][..]));
        assert_eq!(Performance::Bad.eligible_mentor_bands().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_blank_mentor_is_no_mentor() {
        let student = Student {
            student_id: 1,
            name: "Ravi".into(),
            email: String::new(),
            subject: "Maths".into(),
            total_marks: 40,
            grade: 10,
            performance: Performance::Bad,
            is_mentor: false,
            assigned_mentor: Some("  ".into()),
        };
        assert!(!student.has_mentor());
    }
}
