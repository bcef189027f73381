use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct QueryDatabaseResponse {
    pub results: Vec<Page>,
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    pub id: String,
    pub properties: HashMap<String, Property>,
}

/// Property value as it appears on a page.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Property {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Number { number: Option<f64> },
    Select { select: Option<SelectValue> },
    MultiSelect { multi_select: Vec<SelectValue> },
    Date { date: Option<DateValue> },
    Checkbox { checkbox: bool },
    Status { status: Option<SelectValue> },
    People { people: Vec<PersonRef> },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct RichText {
    pub plain_text: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectValue {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PersonRef {
    pub id: String,
}

/// Column declarations returned by the database-retrieve endpoint.
#[derive(Debug, Deserialize)]
pub struct Database {
    pub id: String,
    pub properties: HashMap<String, PropertySchema>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertySchema {
    Title,
    RichText,
    Number,
    Select { select: OptionList },
    MultiSelect { multi_select: OptionList },
    Status { status: OptionList },
    Date,
    Checkbox,
    People,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
pub struct OptionList {
    #[serde(default)]
    pub options: Vec<SelectOptionSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOptionSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryDatabaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorts: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UpdatePageRequest {
    pub properties: serde_json::Value,
}
