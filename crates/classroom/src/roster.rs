//! Student Roster
//!
//! JSON-backed student list with the group-forming and mentor-matching
//! rules used by the buddy agents.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use crate::error::{ClassroomError, Result};
use crate::model::Student;

const GROUP_SIZE: usize = 3;

/// Student list, optionally persisted to a JSON file
#[derive(Debug)]
pub struct Roster {
    students: RwLock<Vec<Student>>,
    path: Option<PathBuf>,
}

/// Result of a mentor request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MentorOutcome {
    AlreadyAssigned { student: String, mentor: String },
    NotNeeded { student: String },
    NoSuitableMentor { student: String },
    Assigned { student: String, mentor: String },
}

impl MentorOutcome {
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }
}

impl fmt::Display for MentorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyAssigned { student, mentor } => {
                write!(f, "{student} already has a mentor assigned: {mentor}.")
            }
            Self::NotNeeded { student } => {
                write!(f, "{student} is already performing well and doesn't need a mentor.")
            }
            Self::NoSuitableMentor { student } => write!(f, "No suitable mentor found for {student}."),
            Self::Assigned { student, mentor } => {
                write!(f, "{mentor} is now assigned as a mentor to {student}.")
            }
        }
    }
}

impl Roster {
    /// In-memory roster; changes are never written out
    pub fn from_students(students: Vec<Student>) -> Self {
        Self {
            students: RwLock::new(students),
            path: None,
        }
    }

    /// Load a JSON array of students; saves go back to the same file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path).await?;
        let students: Vec<Student> = serde_json::from_str(&raw)
            .map_err(|e| ClassroomError::Roster(format!("{}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), students = students.len(), "Roster loaded");

        Ok(Self {
            students: RwLock::new(students),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Snapshot of all students
    pub async fn students(&self) -> Vec<Student> {
        self.students.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.students.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.students.read().await.is_empty()
    }

    pub async fn find(&self, student_id: u32) -> Option<Student> {
        self.students
            .read()
            .await
            .iter()
            .find(|s| s.student_id == student_id)
            .cloned()
    }

    /// Split students of one subject and grade into groups of three.
    ///
    /// Leftovers form a final smaller group. Students are dealt across
    /// groups in performance order so each group mixes levels.
    pub async fn form_groups(&self, subject: &str, grade: u8) -> Vec<Vec<Student>> {
        let subject = subject.trim();
        let mut matching: Vec<Student> = self
            .students
            .read()
            .await
            .iter()
            .filter(|s| s.grade == grade && s.subject.trim().eq_ignore_ascii_case(subject))
            .cloned()
            .collect();

        if matching.is_empty() {
            return Vec::new();
        }

        matching.sort_by(|a, b| a.performance.cmp(&b.performance).then_with(|| a.name.cmp(&b.name)));

        let mut capacities = vec![GROUP_SIZE; matching.len() / GROUP_SIZE];
        if matching.len() % GROUP_SIZE != 0 {
            capacities.push(matching.len() % GROUP_SIZE);
        }

        let mut groups: Vec<Vec<Student>> = capacities.iter().map(|&c| Vec::with_capacity(c)).collect();
        let mut slot = 0;
        for student in matching {
            while groups[slot].len() >= capacities[slot] {
                slot = (slot + 1) % groups.len();
            }
            groups[slot].push(student);
            slot = (slot + 1) % groups.len();
        }

        groups
    }

    /// Find and record a mentor for `student_id`
    pub async fn assign_mentor(&self, student_id: u32) -> Result<MentorOutcome> {
        let mut students = self.students.write().await;

        let student_idx = students
            .iter()
            .position(|s| s.student_id == student_id)
            .ok_or(ClassroomError::StudentNotFound(student_id))?;
        let student = &students[student_idx];

        if student.has_mentor() {
            return Ok(MentorOutcome::AlreadyAssigned {
                student: student.name.clone(),
                mentor: student.assigned_mentor.clone().unwrap_or_default(),
            });
        }

        let Some(bands) = student.performance.eligible_mentor_bands() else {
            return Ok(MentorOutcome::NotNeeded {
                student: student.name.clone(),
            });
        };

        let Some(mentor_idx) = students
            .iter()
            .position(|m| m.student_id != student_id && !m.is_mentor && bands.contains(&m.performance))
        else {
            return Ok(MentorOutcome::NoSuitableMentor {
                student: student.name.clone(),
            });
        };

        // Changes only land in memory once the file has them
        let mentor_name = students[mentor_idx].name.clone();
        let mut updated = students.clone();
        updated[mentor_idx].is_mentor = true;
        updated[student_idx].assigned_mentor = Some(mentor_name.clone());

        if let Some(path) = &self.path {
            let raw = serde_json::to_string_pretty(&updated)?;
            tokio::fs::write(path, raw).await?;
        }

        tracing::info!(student_id, mentor = %mentor_name, "Mentor assigned");
        let outcome = MentorOutcome::Assigned {
            student: updated[student_idx].name.clone(),
            mentor: mentor_name,
        };
        *students = updated;

        Ok(outcome)
    }
}

/// "Group 1:\nA, B, C\nGroup 2:\nD"
pub fn format_groups(groups: &[Vec<Student>]) -> String {
    groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let names: Vec<&str> = group.iter().map(|s| s.name.as_str()).collect();
            format!("Group {}:\n{}", i + 1, names.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Performance;

    fn student(id: u32, name: &str, subject: &str, grade: u8, performance: Performance) -> Student {
        Student {
            student_id: id,
            name: name.into(),
            email: format!("{}@school.test", name.to_lowercase()),
            subject: subject.into(),
            total_marks: 50,
            grade,
            performance,
            is_mentor: false,
            assigned_mentor: None,
        }
    }

    fn maths_class() -> Vec<Student> {
        use Performance::{Average, Bad, Good};
        vec![
            student(1, "Asha", "Maths", 10, Good),
            student(2, "Bilal", "Maths", 10, Bad),
            student(3, "Chen", "Maths", 10, Average),
            student(4, "Divya", "Maths", 10, Good),
            student(5, "Eli", "Maths", 10, Bad),
            student(6, "Farah", "Maths", 10, Average),
            student(7, "Gopal", "Maths", 10, Bad),
            student(8, "Hana", "Science", 10, Good),
            student(9, "Ivan", "Maths", 9, Good),
        ]
    }

    #[tokio::test]
    async fn test_groups_of_three_with_leftover() {
        let roster = Roster::from_students(maths_class());
        let groups = roster.form_groups("maths", 10).await;

        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);

        let total: usize = sizes.iter().sum();
        assert_eq!(total, 7);
        assert!(groups.iter().flatten().all(|s| s.subject == "Maths" && s.grade == 10));
    }

    #[tokio::test]
    async fn test_groups_mix_performance() {
        let roster = Roster::from_students(maths_class());
        let groups = roster.form_groups("Maths", 10).await;

        for group in groups.iter().filter(|g| g.len() == GROUP_SIZE) {
            let first = group[0].performance;
            assert!(group.iter().any(|s| s.performance != first));
        }
    }

    #[tokio::test]
    async fn test_no_matching_students() {
        let roster = Roster::from_students(maths_class());
        assert!(roster.form_groups("History", 10).await.is_empty());
    }

    #[test]
    fn test_format_groups() {
        let groups = vec![
            vec![
                student(1, "A", "Maths", 10, Performance::Good),
                student(2, "B", "Maths", 10, Performance::Bad),
            ],
            vec![student(3, "C", "Maths", 10, Performance::Average)],
        ];
        assert_eq!(format_groups(&groups), "Group 1:\nA, B\nGroup 2:\nC");
    }

    #[tokio::test]
    async fn test_average_student_gets_good_mentor() {
        let roster = Roster::from_students(maths_class());
        let outcome = roster.assign_mentor(3).await.unwrap();

        assert_eq!(
            outcome,
            MentorOutcome::Assigned {
                student: "Chen".into(),
                mentor: "Asha".into()
            }
        );
        assert_eq!(outcome.to_string(), "Asha is now assigned as a mentor to Chen.");
        assert!(roster.find(1).await.unwrap().is_mentor);
        assert_eq!(roster.find(3).await.unwrap().assigned_mentor.as_deref(), Some("Asha"));
    }

    #[tokio::test]
    async fn test_mentors_are_not_reused() {
        let roster = Roster::from_students(maths_class());
        roster.assign_mentor(3).await.unwrap();

        let outcome = roster.assign_mentor(6).await.unwrap();
        assert_eq!(outcome.to_string(), "Divya is now assigned as a mentor to Farah.");
    }

    #[tokio::test]
    async fn test_bad_student_accepts_average_mentor() {
        use Performance::{Average, Bad};
        let roster = Roster::from_students(vec![
            student(1, "Ravi", "Maths", 10, Bad),
            student(2, "Sita", "Maths", 10, Average),
        ]);

        let outcome = roster.assign_mentor(1).await.unwrap();
        assert_eq!(outcome.to_string(), "Sita is now assigned as a mentor to Ravi.");
    }

    #[tokio::test]
    async fn test_mentor_rule_messages() {
        let mut students = maths_class();
        students[1].assigned_mentor = Some("Asha".into());
        let roster = Roster::from_students(students);

        assert_eq!(
            roster.assign_mentor(2).await.unwrap().to_string(),
            "Bilal already has a mentor assigned: Asha."
        );
        assert_eq!(
            roster.assign_mentor(1).await.unwrap().to_string(),
            "Asha is already performing well and doesn't need a mentor."
        );
        assert!(matches!(
            roster.assign_mentor(404).await,
            Err(ClassroomError::StudentNotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_no_suitable_mentor() {
        let roster = Roster::from_students(vec![
            student(1, "Ravi", "Maths", 10, Performance::Average),
            student(2, "Sita", "Maths", 10, Performance::Average),
        ]);

        let outcome = roster.assign_mentor(1).await.unwrap();
        assert!(!outcome.is_assigned());
        assert_eq!(outcome.to_string(), "No suitable mentor found for Ravi.");
    }

    #[tokio::test]
    async fn test_assignment_is_saved_to_file() {
        let path = std::env::temp_dir().join(format!("roster-{}.json", uuid::Uuid::new_v4()));
        let raw = serde_json::to_string(&maths_class()).unwrap();
        tokio::fs::write(&path, raw).await.unwrap();

        let roster = Roster::load(&path).await.unwrap();
        roster.assign_mentor(3).await.unwrap();

        let reloaded = Roster::load(&path).await.unwrap();
        assert_eq!(reloaded.find(3).await.unwrap().assigned_mentor.as_deref(), Some("Asha"));
        assert!(reloaded.find(1).await.unwrap().is_mentor);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_save_leaves_roster_unchanged() {
        let path = std::env::temp_dir().join(format!("roster-{}.json", uuid::Uuid::new_v4()));
        let raw = serde_json::to_string(&maths_class()).unwrap();
        tokio::fs::write(&path, raw).await.unwrap();
        let roster = Roster::load(&path).await.unwrap();

        // A directory where the file was makes the write fail
        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::create_dir(&path).await.unwrap();

        let first = roster.assign_mentor(3).await;
        assert!(matches!(first, Err(ClassroomError::Io(_))));
        assert!(roster.find(3).await.unwrap().assigned_mentor.is_none());
        assert!(!roster.find(1).await.unwrap().is_mentor);

        tokio::fs::remove_dir(&path).await.unwrap();
        let retry = roster.assign_mentor(3).await.unwrap();
        assert_eq!(
            retry,
            MentorOutcome::Assigned {
                student: "Chen".into(),
                mentor: "Asha".into(),
            }
        );

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_csv_roster_is_rejected_with_path() {
        let path = std::env::temp_dir().join(format!("roster-{}.csv", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, "Student_ID,Name,Performance\n1,Asha,good\n")
            .await
            .unwrap();

        let err = Roster::load(&path).await.unwrap_err();
        match err {
            ClassroomError::Roster(message) => assert!(message.contains(&path.display().to_string())),
            other => panic!("unexpected error {other:?}"),
        }

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
