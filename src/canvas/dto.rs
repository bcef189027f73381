use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CourseDto {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub teachers: Vec<TeacherDto>,
}

#[derive(Debug, Deserialize)]
pub struct TeacherDto {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentDto {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub submission_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionDto {
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub workflow_state: Option<String>,
}
