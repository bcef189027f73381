use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
    pub html_url: Option<String>,
    pub submission_types: Vec<String>,
}

/// Submission state for one assignment. A present `submitted_at`
/// means the student has turned the assignment in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }
}
