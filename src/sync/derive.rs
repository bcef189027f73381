use chrono::{DateTime, Utc};

use crate::models::Assignment;

pub const STATUS_NOT_STARTED: &str = "Not started";
pub const STATUS_IN_PROGRESS: &str = "In Progress";
pub const STATUS_COMPLETED: &str = "Completed";

/// Option labels seeded into the destination database once per pass.
pub const TYPE_OPTIONS: [&str; 3] = ["Assignment", "Quiz", "Test"];
pub const STATUS_OPTIONS: [&str; 3] = [STATUS_NOT_STARTED, STATUS_IN_PROGRESS, STATUS_COMPLETED];
pub const PRIORITY_OPTIONS: [&str; 3] = ["High", "Medium", "Low"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentType {
    Assignment,
    Quiz,
    Test,
}

impl AssignmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentType::Assignment => "Assignment",
            AssignmentType::Quiz => "Quiz",
            AssignmentType::Test => "Test",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

/// Classify an assignment. Quiz signals (submission type, a /quizzes/ URL,
/// or "quiz" in the name) take precedence over exam/test name keywords.
pub fn infer_type(assignment: &Assignment) -> AssignmentType {
    let name = assignment.name.to_lowercase();
    let url = assignment
        .html_url
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    if name.contains("quiz")
        || url.contains("/quizzes/")
        || assignment
            .submission_types
            .iter()
            .any(|s| s.eq_ignore_ascii_case("online_quiz"))
    {
        return AssignmentType::Quiz;
    }
    if ["exam", "midterm", "final", "test"]
        .iter()
        .any(|w| name.contains(w))
    {
        return AssignmentType::Test;
    }
    AssignmentType::Assignment
}

/// Bucket by whole days until due: <= 2 days is High, 3 to 5 is Medium,
/// everything further out (including day 6) is Low. Recomputed on every
/// pass, never carried over from a previous write.
pub fn priority_bucket(due_at: DateTime<Utc>, now: DateTime<Utc>) -> Priority {
    let days = (due_at - now).num_days();
    if days <= 2 {
        Priority::High
    } else if days <= 5 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// One-directional status merge: a reported submission always forces
/// Completed, but a missing submission never resets a manually chosen
/// status. Pages that do not exist yet start at Not started.
pub fn merge_status(existing: Option<&str>, submitted: bool) -> String {
    if submitted {
        return STATUS_COMPLETED.to_string();
    }
    match existing {
        Some(current) => current.to_string(),
        None => STATUS_NOT_STARTED.to_string(),
    }
}

pub fn is_done(status: &str) -> bool {
    status == STATUS_COMPLETED
}
