#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use canvasync::canvas::CanvasClient;
use canvasync::error::AppError;
use canvasync::models::{Assignment, Course, Submission};
use canvasync::notion::{NotionClient, dto};

pub fn course(id: i64, name: &str, teachers: &[&str]) -> Course {
    Course {
        id,
        name: name.to_string(),
        teachers: teachers.iter().map(|t| t.to_string()).collect(),
        is_active: true,
    }
}

pub fn assignment(id: i64, course_id: i64, name: &str, due_at: Option<DateTime<Utc>>) -> Assignment {
    Assignment {
        id,
        course_id,
        name: name.to_string(),
        due_at,
        html_url: None,
        submission_types: vec!["online_upload".to_string()],
    }
}

/// Column declarations of a fully equipped destination database, matching
/// what the Notion database-retrieve endpoint returns.
pub fn full_database_json() -> serde_json::Value {
    serde_json::json!({
        "id": "11111111-2222-3333-4444-555555555555",
        "properties": {
            "Assignment Name": { "type": "title", "title": {} },
            "Class": { "type": "select", "select": { "options": [
                { "name": "Biology", "color": "green" }
            ] } },
            "Teacher": { "type": "multi_select", "multi_select": { "options": [
                { "name": "Ms. Rivera", "color": "blue" }
            ] } },
            "Type": { "type": "select", "select": { "options": [
                { "name": "Assignment" }, { "name": "Quiz" }, { "name": "Test" }
            ] } },
            "Due date": { "type": "date", "date": {} },
            "Priority": { "type": "select", "select": { "options": [
                { "name": "High" }, { "name": "Medium" }, { "name": "Low" }
            ] } },
            "Status": { "type": "status", "status": { "options": [
                { "name": "Not started" }, { "name": "In Progress" }, { "name": "Completed" }
            ] } },
            "Done": { "type": "checkbox", "checkbox": {} },
            "Canvas ID": { "type": "number", "number": {} },
            "Assign": { "type": "people", "people": {} }
        }
    })
}

pub fn full_database() -> dto::Database {
    serde_json::from_value(full_database_json()).expect("database fixture should parse")
}

/// A page as the query endpoint returns it, carrying the given status and
/// Canvas ID.
pub fn page_json(page_id: &str, canvas_id: i64, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": page_id,
        "properties": {
            "Status": { "type": "status", "status": { "name": status } },
            "Canvas ID": { "type": "number", "number": canvas_id }
        }
    })
}

pub struct MockCanvas {
    pub courses: Vec<Course>,
    pub assignments: Vec<Assignment>,
    pub submission: Option<Submission>,
    /// Course whose assignment listing fails, to exercise skip-wholesale.
    pub fail_assignments_for: Option<i64>,
}

#[async_trait]
impl CanvasClient for MockCanvas {
    async fn list_active_courses(&self) -> Result<Vec<Course>, AppError> {
        Ok(self.courses.clone())
    }

    async fn list_assignments(&self, course_id: i64) -> Result<Vec<Assignment>, AppError> {
        if self.fail_assignments_for == Some(course_id) {
            return Err(AppError::Canvas("listing failed".to_string()));
        }
        Ok(self
            .assignments
            .iter()
            .filter(|a| a.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn get_submission(
        &self,
        _course_id: i64,
        _assignment_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        Ok(self.submission.clone())
    }
}

/// Notion stand-in that replays prepared query responses and records every
/// write it receives.
pub struct MockNotion {
    pub database: serde_json::Value,
    pub query_responses: Mutex<Vec<Vec<serde_json::Value>>>,
    pub created: Mutex<Vec<serde_json::Value>>,
    pub updated: Mutex<Vec<(String, serde_json::Value)>>,
    pub option_updates: Mutex<Vec<(String, String, Vec<dto::SelectOptionSchema>)>>,
}

impl MockNotion {
    pub fn new(database: serde_json::Value) -> Self {
        Self {
            database,
            query_responses: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            option_updates: Mutex::new(Vec::new()),
        }
    }

    /// Queue the result of the next query_pages call, oldest first.
    pub fn push_query_response(&self, pages: Vec<serde_json::Value>) {
        self.query_responses.lock().unwrap().push(pages);
    }
}

#[async_trait]
impl NotionClient for MockNotion {
    async fn retrieve_database(&self) -> Result<dto::Database, AppError> {
        serde_json::from_value(self.database.clone())
            .map_err(|e| AppError::Notion(format!("bad database fixture: {}", e)))
    }

    async fn query_pages(
        &self,
        _filter: serde_json::Value,
        _page_size: u32,
    ) -> Result<Vec<dto::Page>, AppError> {
        let mut queue = self.query_responses.lock().unwrap();
        let pages = if queue.is_empty() {
            Vec::new()
        } else {
            queue.remove(0)
        };
        pages
            .into_iter()
            .map(|p| {
                serde_json::from_value(p)
                    .map_err(|e| AppError::Notion(format!("bad page fixture: {}", e)))
            })
            .collect()
    }

    async fn create_page(&self, properties: serde_json::Value) -> Result<String, AppError> {
        self.created.lock().unwrap().push(properties);
        Ok("page-created".to_string())
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: serde_json::Value,
    ) -> Result<(), AppError> {
        self.updated
            .lock()
            .unwrap()
            .push((page_id.to_string(), properties));
        Ok(())
    }

    async fn update_property_options(
        &self,
        property: &str,
        kind: &str,
        options: Vec<dto::SelectOptionSchema>,
    ) -> Result<(), AppError> {
        self.option_updates.lock().unwrap().push((
            property.to_string(),
            kind.to_string(),
            options,
        ));
        Ok(())
    }
}
