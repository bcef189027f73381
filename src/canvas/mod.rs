pub mod dto;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::env_any;
use crate::error::AppError;
use crate::models::{Assignment, Course, Submission};

const MAX_TRIES: u32 = 4;

#[derive(Clone, Debug)]
pub struct CanvasConfig {
    pub base_url: String,
    pub token: String,
}

impl CanvasConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env_any(&["CANVAS_BASE_URL", "CANVAS_API_BASE"])
            .ok_or_else(|| AppError::Config("CANVAS_BASE_URL is not set".to_string()))?;
        let token = env_any(&["CANVAS_TOKEN", "CANVAS_API_TOKEN"])
            .ok_or_else(|| AppError::Config("CANVAS_TOKEN is not set".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
pub trait CanvasClient: Send + Sync {
    async fn list_active_courses(&self) -> Result<Vec<Course>, AppError>;
    async fn list_assignments(&self, course_id: i64) -> Result<Vec<Assignment>, AppError>;
    async fn get_submission(
        &self,
        course_id: i64,
        assignment_id: i64,
    ) -> Result<Option<Submission>, AppError>;
}

pub struct CanvasHttpClient {
    client: Client,
    config: CanvasConfig,
}

impl CanvasHttpClient {
    pub fn new(config: CanvasConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// GET with bounded retry. Transport errors, 429 and 5xx responses are
    /// retried with exponential backoff; 401 fails immediately with a hint.
    async fn get_with_retry(
        &self,
        url: &str,
        query: Option<&[(&str, String)]>,
    ) -> Result<reqwest::Response, AppError> {
        let mut delay = Duration::from_secs(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let mut request = self
                .client
                .get(url)
                .bearer_auth(&self.config.token)
                .header("Accept", "application/json");
            if let Some(q) = query {
                request = request.query(q);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::UNAUTHORIZED {
                        return Err(AppError::Canvas(
                            "Unauthorized (401). Check CANVAS_BASE_URL and CANVAS_TOKEN."
                                .to_string(),
                        ));
                    }
                    let retryable =
                        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
                    if retryable && attempt < MAX_TRIES {
                        warn!("Canvas {} returned {}, retrying", url, status);
                    } else if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(AppError::Canvas(format!("{} from {}: {}", status, url, body)));
                    } else {
                        return Ok(response);
                    }
                }
                Err(e) => {
                    if attempt >= MAX_TRIES {
                        return Err(AppError::Http(e));
                    }
                    warn!("Canvas request to {} failed ({}), retrying", url, e);
                }
            }

            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }

    /// Walk every page of a Canvas collection, following the Link header.
    /// Query params only apply to the first request; Canvas bakes them into
    /// the rel="next" URL it hands back.
    async fn paged_get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        let mut url = format!("{}/api/v1{}", self.config.base_url, path);
        let mut first = true;
        let mut items = Vec::new();

        loop {
            let response = self
                .get_with_retry(&url, if first { Some(query) } else { None })
                .await?;
            first = false;

            let next = response
                .headers()
                .get("link")
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);

            let mut page: Vec<T> = response
                .json()
                .await
                .map_err(|e| AppError::Canvas(format!("Failed to parse response from {}: {}", url, e)))?;
            items.append(&mut page);

            match next {
                Some(n) => url = n,
                None => break,
            }
        }

        Ok(items)
    }
}

/// Extract the rel="next" target from a Link header, if any.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        if !part.contains("rel=\"next\"") {
            return None;
        }
        let start = part.find('<')? + 1;
        let end = part.find('>')?;
        Some(part[start..end].to_string())
    })
}

fn course_from_dto(dto: dto::CourseDto) -> Course {
    let name = dto
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Course {}", dto.id));

    // De-dup teacher names while preserving order
    let mut seen = std::collections::HashSet::new();
    let teachers: Vec<String> = dto
        .teachers
        .into_iter()
        .filter_map(|t| t.display_name)
        .filter(|n| !n.is_empty() && seen.insert(n.clone()))
        .collect();

    let is_active = matches!(dto.workflow_state.as_deref(), None | Some("available"));

    Course {
        id: dto.id,
        name,
        teachers,
        is_active,
    }
}

fn assignment_from_dto(dto: dto::AssignmentDto, course_id: i64) -> Assignment {
    let name = dto
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Assignment {}", dto.id));

    Assignment {
        id: dto.id,
        course_id,
        name,
        due_at: dto.due_at.as_deref().and_then(parse_timestamp),
        html_url: dto.html_url,
        submission_types: dto.submission_types,
    }
}

fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl CanvasClient for CanvasHttpClient {
    async fn list_active_courses(&self) -> Result<Vec<Course>, AppError> {
        let query = [
            ("enrollment_state", "active".to_string()),
            ("include[]", "teachers".to_string()),
            ("per_page", "100".to_string()),
        ];
        let courses: Vec<dto::CourseDto> = self.paged_get("/courses", &query).await?;
        Ok(courses.into_iter().map(course_from_dto).collect())
    }

    async fn list_assignments(&self, course_id: i64) -> Result<Vec<Assignment>, AppError> {
        let query = [
            ("order_by", "due_at".to_string()),
            ("per_page", "100".to_string()),
        ];
        let assignments: Vec<dto::AssignmentDto> = self
            .paged_get(&format!("/courses/{}/assignments", course_id), &query)
            .await?;
        Ok(assignments
            .into_iter()
            .map(|a| assignment_from_dto(a, course_id))
            .collect())
    }

    async fn get_submission(
        &self,
        course_id: i64,
        assignment_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        let url = format!(
            "{}/api/v1/courses/{}/assignments/{}/submissions/self",
            self.config.base_url, course_id, assignment_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Canvas(format!("{} from {}: {}", status, url, body)));
        }

        let dto: dto::SubmissionDto = response
            .json()
            .await
            .map_err(|e| AppError::Canvas(format!("Failed to parse submission: {}", e)))?;

        Ok(Some(Submission {
            submitted_at: dto.submitted_at.as_deref().and_then(parse_timestamp),
        }))
    }
}

pub struct NoopCanvasClient;

#[async_trait]
impl CanvasClient for NoopCanvasClient {
    async fn list_active_courses(&self) -> Result<Vec<Course>, AppError> {
        Ok(Vec::new())
    }

    async fn list_assignments(&self, _course_id: i64) -> Result<Vec<Assignment>, AppError> {
        Ok(Vec::new())
    }

    async fn get_submission(
        &self,
        _course_id: i64,
        _assignment_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        Ok(None)
    }
}
