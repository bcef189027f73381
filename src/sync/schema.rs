use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::notion::dto::{self, Property, PropertySchema, SelectOptionSchema};
use crate::notion::NotionClient;
use crate::sync::reconcile::{FieldSet, FieldValue, LogicalField, PageSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Title,
    RichText,
    Number,
    Select,
    MultiSelect,
    Status,
    Date,
    Checkbox,
    People,
}

impl ColumnKind {
    /// Kinds whose values must come from a registered option set.
    pub fn is_select_like(&self) -> bool {
        matches!(
            self,
            ColumnKind::Select | ColumnKind::MultiSelect | ColumnKind::Status
        )
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub name: String,
    pub kind: ColumnKind,
    /// Known option labels mapped to their color, for select-like kinds.
    pub options: BTreeMap<String, Option<String>>,
}

impl ResolvedColumn {
    fn has_option(&self, value: &str) -> bool {
        self.options.contains_key(value)
    }
}

/// Which logical fields exist in the destination database, under what column
/// name and kind. Absent fields are skipped everywhere; option sets only grow.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSchema {
    columns: BTreeMap<LogicalField, ResolvedColumn>,
}

/// Accepted column-name synonyms and kinds per logical field. Matching is
/// case-insensitive; synonyms earlier in the list win when several columns
/// qualify.
fn accepted_columns(field: LogicalField) -> (&'static [&'static str], &'static [ColumnKind]) {
    use ColumnKind::*;
    match field {
        LogicalField::Name => (
            &["name", "assignment name", "assignment", "title", "task"],
            &[Title],
        ),
        LogicalField::Class => (
            &["class", "course", "class name", "course name"],
            &[Select, MultiSelect],
        ),
        LogicalField::Teacher => (
            &["teacher", "teachers", "instructor", "instructors", "professor"],
            &[MultiSelect, Select],
        ),
        LogicalField::Type => (&["type", "assignment type", "category"], &[Select]),
        LogicalField::DueDate => (
            &["due date", "due", "due at", "deadline", "date"],
            &[Date],
        ),
        LogicalField::Priority => (&["priority"], &[Select]),
        LogicalField::Status => (&["status"], &[Status, Select]),
        LogicalField::Done => (
            &["done", "completed", "complete", "finished"],
            &[Checkbox],
        ),
        LogicalField::CanvasId => (
            &["canvas id", "canvas_id", "canvasid", "source id", "assignment id"],
            &[Number, RichText],
        ),
        LogicalField::Assignee => (
            &["assign", "assignee", "assigned to", "people", "person"],
            &[People],
        ),
    }
}

fn kind_of(schema: &PropertySchema) -> Option<ColumnKind> {
    match schema {
        PropertySchema::Title => Some(ColumnKind::Title),
        PropertySchema::RichText => Some(ColumnKind::RichText),
        PropertySchema::Number => Some(ColumnKind::Number),
        PropertySchema::Select { .. } => Some(ColumnKind::Select),
        PropertySchema::MultiSelect { .. } => Some(ColumnKind::MultiSelect),
        PropertySchema::Status { .. } => Some(ColumnKind::Status),
        PropertySchema::Date => Some(ColumnKind::Date),
        PropertySchema::Checkbox => Some(ColumnKind::Checkbox),
        PropertySchema::People => Some(ColumnKind::People),
        PropertySchema::Unknown => None,
    }
}

fn options_of(schema: &PropertySchema) -> BTreeMap<String, Option<String>> {
    let list = match schema {
        PropertySchema::Select { select } => select,
        PropertySchema::MultiSelect { multi_select } => multi_select,
        PropertySchema::Status { status } => status,
        _ => return BTreeMap::new(),
    };
    list.options
        .iter()
        .map(|o| (o.name.clone(), o.color.clone()))
        .collect()
}

impl ResolvedSchema {
    pub fn resolve(db: &dto::Database) -> Self {
        let mut columns = BTreeMap::new();

        for field in LogicalField::ALL {
            let (synonyms, kinds) = accepted_columns(field);
            let matched = synonyms.iter().find_map(|syn| {
                db.properties.iter().find_map(|(name, prop)| {
                    if !name.trim().eq_ignore_ascii_case(syn) {
                        return None;
                    }
                    let kind = kind_of(prop)?;
                    if !kinds.contains(&kind) {
                        return None;
                    }
                    Some(ResolvedColumn {
                        name: name.clone(),
                        kind,
                        options: options_of(prop),
                    })
                })
            });

            match matched {
                Some(column) => {
                    columns.insert(field, column);
                }
                None => debug!("no usable column for {:?}; field will be skipped", field),
            }
        }

        Self { columns }
    }

    pub fn has(&self, field: LogicalField) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn column(&self, field: LogicalField) -> Option<&ResolvedColumn> {
        self.columns.get(&field)
    }

    /// Exact-match lookup filter for the stored Canvas ID, shaped for the
    /// resolved column kind. None when the database has no such column.
    pub fn canvas_id_filter(&self, canvas_id: i64) -> Option<serde_json::Value> {
        let col = self.columns.get(&LogicalField::CanvasId)?;
        Some(match col.kind {
            ColumnKind::Number => serde_json::json!({
                "property": col.name,
                "number": { "equals": canvas_id }
            }),
            _ => serde_json::json!({
                "property": col.name,
                "rich_text": { "equals": canvas_id.to_string() }
            }),
        })
    }

    /// Drop fields whose column is absent, reshape values to the column kind,
    /// and omit select-like values that never made it into the option set.
    pub fn filter_supported(&self, fields: FieldSet) -> FieldSet {
        let mut supported = FieldSet::new();

        for (field, value) in fields {
            let Some(col) = self.columns.get(&field) else {
                continue;
            };

            let reshaped = match (col.kind, value) {
                (ColumnKind::Select | ColumnKind::Status, FieldValue::Text(s)) => {
                    if col.has_option(&s) {
                        Some(FieldValue::Text(s))
                    } else {
                        warn!("option {:?} missing on column {:?}, omitting", s, col.name);
                        None
                    }
                }
                (ColumnKind::Select | ColumnKind::Status, FieldValue::Labels(labels)) => labels
                    .into_iter()
                    .find(|l| col.has_option(l))
                    .map(FieldValue::Text),
                (ColumnKind::MultiSelect, FieldValue::Labels(labels)) => {
                    let known: Vec<String> = labels
                        .into_iter()
                        .filter(|l| {
                            let ok = col.has_option(l);
                            if !ok {
                                warn!("option {:?} missing on column {:?}, omitting", l, col.name);
                            }
                            ok
                        })
                        .collect();
                    if known.is_empty() {
                        None
                    } else {
                        Some(FieldValue::Labels(known))
                    }
                }
                (ColumnKind::MultiSelect, FieldValue::Text(s)) => {
                    if col.has_option(&s) {
                        Some(FieldValue::Labels(vec![s]))
                    } else {
                        warn!("option {:?} missing on column {:?}, omitting", s, col.name);
                        None
                    }
                }
                (ColumnKind::Title, v @ FieldValue::Text(_)) => Some(v),
                (ColumnKind::Date, v @ FieldValue::Date(_)) => Some(v),
                (ColumnKind::Checkbox, v @ FieldValue::Flag(_)) => Some(v),
                (ColumnKind::Number | ColumnKind::RichText, v @ FieldValue::Number(_)) => Some(v),
                (ColumnKind::People, v @ FieldValue::People(_)) => Some(v),
                (kind, v) => {
                    debug!("value {:?} does not fit column kind {:?}", v, kind);
                    None
                }
            };

            if let Some(v) = reshaped {
                supported.insert(field, v);
            }
        }

        supported
    }

    /// Project a destination page onto the logical fields, normalizing stored
    /// values so they compare cleanly against freshly derived ones.
    pub fn parse_page(&self, page: &dto::Page) -> PageSnapshot {
        let mut fields = FieldSet::new();

        for (field, col) in &self.columns {
            let Some(prop) = page.properties.get(&col.name) else {
                continue;
            };

            let value = match prop {
                Property::Title { title } => Some(FieldValue::Text(join_plain_text(title))),
                Property::RichText { rich_text } => {
                    let text = join_plain_text(rich_text);
                    if *field == LogicalField::CanvasId {
                        text.trim().parse::<i64>().ok().map(FieldValue::Number)
                    } else {
                        Some(FieldValue::Text(text))
                    }
                }
                Property::Number { number } => number.map(|n| FieldValue::Number(n as i64)),
                Property::Select { select } => {
                    select.as_ref().map(|s| FieldValue::Text(s.name.clone()))
                }
                Property::Status { status } => {
                    status.as_ref().map(|s| FieldValue::Text(s.name.clone()))
                }
                Property::MultiSelect { multi_select } => Some(FieldValue::Labels(
                    multi_select.iter().map(|s| s.name.clone()).collect(),
                )),
                Property::Date { date } => date
                    .as_ref()
                    .and_then(|d| parse_date_start(&d.start))
                    .map(FieldValue::Date),
                Property::Checkbox { checkbox } => Some(FieldValue::Flag(*checkbox)),
                Property::People { people } => {
                    people.first().map(|p| FieldValue::People(p.id.clone()))
                }
                Property::Unknown => None,
            };

            if let Some(v) = value {
                fields.insert(*field, v);
            }
        }

        PageSnapshot {
            id: page.id.clone(),
            fields,
        }
    }

    /// Render a field set into the Notion page-write property format, keyed
    /// by the actual column names.
    pub fn render_properties(&self, fields: &FieldSet) -> serde_json::Value {
        let mut properties = serde_json::json!({});

        for (field, value) in fields {
            let Some(col) = self.columns.get(field) else {
                continue;
            };

            let rendered = match (col.kind, value) {
                (ColumnKind::Title, FieldValue::Text(s)) => serde_json::json!({
                    "title": [{ "text": { "content": s } }]
                }),
                (ColumnKind::RichText, FieldValue::Number(n)) => serde_json::json!({
                    "rich_text": [{ "text": { "content": n.to_string() } }]
                }),
                (ColumnKind::RichText, FieldValue::Text(s)) => serde_json::json!({
                    "rich_text": [{ "text": { "content": s } }]
                }),
                (ColumnKind::Number, FieldValue::Number(n)) => serde_json::json!({
                    "number": n
                }),
                (ColumnKind::Select, FieldValue::Text(s)) => serde_json::json!({
                    "select": { "name": s }
                }),
                (ColumnKind::Status, FieldValue::Text(s)) => serde_json::json!({
                    "status": { "name": s }
                }),
                (ColumnKind::MultiSelect, FieldValue::Labels(labels)) => serde_json::json!({
                    "multi_select": labels
                        .iter()
                        .map(|l| serde_json::json!({ "name": l }))
                        .collect::<Vec<_>>()
                }),
                (ColumnKind::Date, FieldValue::Date(dt)) => serde_json::json!({
                    "date": { "start": dt.to_rfc3339() }
                }),
                (ColumnKind::Checkbox, FieldValue::Flag(b)) => serde_json::json!({
                    "checkbox": b
                }),
                (ColumnKind::People, FieldValue::People(id)) => serde_json::json!({
                    "people": [{ "id": id }]
                }),
                _ => continue,
            };

            properties[col.name.as_str()] = rendered;
        }

        properties
    }
}

fn join_plain_text(parts: &[dto::RichText]) -> String {
    parts
        .iter()
        .map(|t| t.plain_text.clone())
        .collect::<Vec<_>>()
        .join("")
}

/// Notion date starts come back either as full RFC 3339 timestamps or as
/// bare dates; bare dates are pinned to midnight UTC.
fn parse_date_start(start: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(start) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Materialize missing select options before any page write references them.
/// Adding an already-present option is a no-op; status options cannot be
/// created through the API and are left untouched.
pub async fn ensure_options(
    notion: &dyn NotionClient,
    schema: &mut ResolvedSchema,
    field: LogicalField,
    values: &[String],
) -> Result<(), AppError> {
    let Some(col) = schema.columns.get_mut(&field) else {
        return Ok(());
    };
    let kind = match col.kind {
        ColumnKind::Select => "select",
        ColumnKind::MultiSelect => "multi_select",
        _ => return Ok(()),
    };

    let missing: BTreeSet<String> = values
        .iter()
        .filter(|v| !v.is_empty() && !col.has_option(v))
        .cloned()
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    // The options endpoint replaces the whole list, so resend what exists.
    let mut options: Vec<SelectOptionSchema> = col
        .options
        .iter()
        .map(|(name, color)| SelectOptionSchema {
            name: name.clone(),
            color: color.clone(),
        })
        .collect();
    options.extend(missing.iter().map(|name| SelectOptionSchema {
        name: name.clone(),
        color: Some(color_for(name).to_string()),
    }));

    notion
        .update_property_options(&col.name, kind, options)
        .await?;

    for name in missing {
        let color = Some(color_for(&name).to_string());
        col.options.insert(name, color);
    }
    Ok(())
}

const COLOR_POOL: [&str; 10] = [
    "default", "blue", "green", "red", "yellow", "purple", "pink", "brown", "gray", "orange",
];

fn color_for(name: &str) -> &'static str {
    let h = name
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    COLOR_POOL[h % COLOR_POOL.len()]
}
