pub mod dto;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tracing::warn;

use crate::config::env_any;
use crate::error::AppError;

const NOTION_VERSION: &str = "2022-06-28";
const MAX_TRIES: u32 = 4;

#[derive(Clone, Debug)]
pub struct NotionConfig {
    pub api_token: String,
    pub database_id: String,
    pub assignee_id: Option<String>,
}

impl NotionConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let api_token = env_any(&["NOTION_TOKEN", "NOTION_API_KEY", "API_TOKEN"])
            .ok_or_else(|| AppError::Config("NOTION_TOKEN is not set".to_string()))?;
        let database_id = env_any(&["NOTION_DATABASE_ID", "DATABASE_ID", "DB_ID", "NOTION_DB"])
            .ok_or_else(|| AppError::Config("NOTION_DATABASE_ID is not set".to_string()))?;
        let assignee_id = env_any(&["NOTION_ASSIGNEE_ID"]);

        Ok(Self {
            api_token,
            database_id,
            assignee_id,
        })
    }
}

#[async_trait]
pub trait NotionClient: Send + Sync {
    async fn retrieve_database(&self) -> Result<dto::Database, AppError>;
    async fn query_pages(
        &self,
        filter: serde_json::Value,
        page_size: u32,
    ) -> Result<Vec<dto::Page>, AppError>;
    async fn create_page(&self, properties: serde_json::Value) -> Result<String, AppError>;
    async fn update_page(
        &self,
        page_id: &str,
        properties: serde_json::Value,
    ) -> Result<(), AppError>;
    async fn update_property_options(
        &self,
        property: &str,
        kind: &str,
        options: Vec<dto::SelectOptionSchema>,
    ) -> Result<(), AppError>;
}

pub struct NotionHttpClient {
    client: Client,
    config: NotionConfig,
}

impl NotionHttpClient {
    pub fn new(config: NotionConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn request_with_retry(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, AppError> {
        let mut delay = Duration::from_secs(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let mut request = self
                .client
                .request(method.clone(), url)
                .header("Authorization", format!("Bearer {}", self.config.api_token))
                .header("Notion-Version", NOTION_VERSION);
            if let Some(b) = body {
                request = request.json(b);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let retryable =
                        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
                    if retryable && attempt < MAX_TRIES {
                        warn!("Notion {} returned {}, retrying", url, status);
                    } else if !status.is_success() {
                        let body_text = response.text().await.unwrap_or_default();
                        return Err(notion_error(status, body_text));
                    } else {
                        return Ok(response);
                    }
                }
                Err(e) => {
                    if attempt >= MAX_TRIES {
                        return Err(AppError::Http(e));
                    }
                    warn!("Notion request to {} failed ({}), retrying", url, e);
                }
            }

            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }
}

/// Map Notion failure statuses to messages that say what to fix.
fn notion_error(status: StatusCode, body: String) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => AppError::Notion(
            "Unauthorized (401). The Notion token is invalid or unusable. \
             Confirm NOTION_TOKEN is correct and contains no extra quotes or spaces."
                .to_string(),
        ),
        StatusCode::NOT_FOUND => AppError::Notion(
            "Database not found (404). NOTION_DATABASE_ID is wrong or the database \
             is not shared with the integration."
                .to_string(),
        ),
        StatusCode::FORBIDDEN => AppError::Notion(
            "Restricted resource (403). Invite the integration to the database: \
             Share -> Invite -> select the integration -> Can edit."
                .to_string(),
        ),
        _ => AppError::Notion(format!("Notion API error {}: {}", status, body)),
    }
}

#[async_trait]
impl NotionClient for NotionHttpClient {
    async fn retrieve_database(&self) -> Result<dto::Database, AppError> {
        let url = format!(
            "https://api.notion.com/v1/databases/{}",
            self.config.database_id
        );
        let response = self.request_with_retry(Method::GET, &url, None).await?;
        let body_text = response.text().await.unwrap_or_default();

        serde_json::from_str::<dto::Database>(&body_text).map_err(|e| {
            AppError::Notion(format!("Failed to parse database response: {}", e))
        })
    }

    async fn query_pages(
        &self,
        filter: serde_json::Value,
        page_size: u32,
    ) -> Result<Vec<dto::Page>, AppError> {
        let url = format!(
            "https://api.notion.com/v1/databases/{}/query",
            self.config.database_id
        );

        let request_body = serde_json::to_value(dto::QueryDatabaseRequest {
            filter: Some(filter),
            sorts: None,
            start_cursor: None,
            page_size: Some(page_size),
        })
        .map_err(|_| AppError::InternalServerError)?;

        let response = self
            .request_with_retry(Method::POST, &url, Some(&request_body))
            .await?;
        let body_text = response.text().await.unwrap_or_default();

        let parsed: dto::QueryDatabaseResponse =
            serde_json::from_str(&body_text).map_err(|e| {
                AppError::Notion(format!("Failed to parse query response: {}", e))
            })?;
        Ok(parsed.results)
    }

    async fn create_page(&self, properties: serde_json::Value) -> Result<String, AppError> {
        let url = "https://api.notion.com/v1/pages";
        let request_body = serde_json::json!({
            "parent": { "database_id": self.config.database_id },
            "properties": properties,
        });

        let response = self
            .request_with_retry(Method::POST, url, Some(&request_body))
            .await?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Notion(format!("Failed to parse created page: {}", e)))?;

        body["id"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Notion("Created page carries no id".to_string()))
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: serde_json::Value,
    ) -> Result<(), AppError> {
        let url = format!("https://api.notion.com/v1/pages/{}", page_id);
        let request_body = serde_json::to_value(dto::UpdatePageRequest { properties })
            .map_err(|_| AppError::InternalServerError)?;

        self.request_with_retry(Method::PATCH, &url, Some(&request_body))
            .await?;
        Ok(())
    }

    async fn update_property_options(
        &self,
        property: &str,
        kind: &str,
        options: Vec<dto::SelectOptionSchema>,
    ) -> Result<(), AppError> {
        let url = format!(
            "https://api.notion.com/v1/databases/{}",
            self.config.database_id
        );
        let request_body = serde_json::json!({
            "properties": {
                property: { kind: { "options": options } }
            }
        });

        self.request_with_retry(Method::PATCH, &url, Some(&request_body))
            .await?;
        Ok(())
    }
}

pub struct NoopNotionClient;

#[async_trait]
impl NotionClient for NoopNotionClient {
    async fn retrieve_database(&self) -> Result<dto::Database, AppError> {
        Ok(dto::Database {
            id: String::new(),
            properties: HashMap::new(),
        })
    }

    async fn query_pages(
        &self,
        _filter: serde_json::Value,
        _page_size: u32,
    ) -> Result<Vec<dto::Page>, AppError> {
        Ok(Vec::new())
    }

    async fn create_page(&self, _properties: serde_json::Value) -> Result<String, AppError> {
        Ok(String::new())
    }

    async fn update_page(
        &self,
        _page_id: &str,
        _properties: serde_json::Value,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn update_property_options(
        &self,
        _property: &str,
        _kind: &str,
        _options: Vec<dto::SelectOptionSchema>,
    ) -> Result<(), AppError> {
        Ok(())
    }
}
