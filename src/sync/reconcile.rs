use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{Assignment, Course, Submission};
use crate::sync::derive::{infer_type, is_done, merge_status, priority_bucket};
use crate::sync::schema::ResolvedSchema;

/// The fields this system knows how to read and write on a destination page.
/// Anything else on the page is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogicalField {
    Name,
    Class,
    Teacher,
    Type,
    DueDate,
    Priority,
    Status,
    Done,
    CanvasId,
    Assignee,
}

impl LogicalField {
    pub const ALL: [LogicalField; 10] = [
        LogicalField::Name,
        LogicalField::Class,
        LogicalField::Teacher,
        LogicalField::Type,
        LogicalField::DueDate,
        LogicalField::Priority,
        LogicalField::Status,
        LogicalField::Done,
        LogicalField::CanvasId,
        LogicalField::Assignee,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Labels(Vec<String>),
    Date(DateTime<Utc>),
    Flag(bool),
    Number(i64),
    People(String),
}

pub type FieldSet = BTreeMap<LogicalField, FieldValue>;

/// Destination page projected onto the logical fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub id: String,
    pub fields: FieldSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Create(FieldSet),
    Update { page_id: String, fields: FieldSet },
    NoOp,
}

/// Multi-select labels compare as sets; everything else compares directly.
fn values_equal(a: &FieldValue, b: &FieldValue) -> bool {
    match (a, b) {
        (FieldValue::Labels(x), FieldValue::Labels(y)) => {
            let mut x = x.clone();
            let mut y = y.clone();
            x.sort();
            y.sort();
            x == y
        }
        _ => a == b,
    }
}

/// Decide what to write for one assignment: a full page create, a minimal
/// diff update, or nothing. Fields whose column is missing from the resolved
/// schema are dropped rather than failing the page.
pub fn reconcile(
    assignment: &Assignment,
    course: &Course,
    submission: Option<&Submission>,
    existing: Option<&PageSnapshot>,
    schema: &ResolvedSchema,
    assignee: Option<&str>,
    now: DateTime<Utc>,
) -> WriteOp {
    let mut fields = FieldSet::new();
    fields.insert(
        LogicalField::Name,
        FieldValue::Text(assignment.name.clone()),
    );
    fields.insert(LogicalField::Class, FieldValue::Text(course.name.clone()));
    if !course.teachers.is_empty() {
        fields.insert(
            LogicalField::Teacher,
            FieldValue::Labels(course.teachers.clone()),
        );
    }
    fields.insert(
        LogicalField::Type,
        FieldValue::Text(infer_type(assignment).as_str().to_string()),
    );
    if let Some(due) = assignment.due_at {
        fields.insert(LogicalField::DueDate, FieldValue::Date(due));
        fields.insert(
            LogicalField::Priority,
            FieldValue::Text(priority_bucket(due, now).as_str().to_string()),
        );
    }

    let submitted = submission.is_some_and(Submission::is_submitted);
    let existing_status = existing
        .and_then(|page| page.fields.get(&LogicalField::Status))
        .and_then(|value| match value {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        });
    let status = merge_status(existing_status, submitted);
    fields.insert(LogicalField::Done, FieldValue::Flag(is_done(&status)));
    fields.insert(LogicalField::Status, FieldValue::Text(status));
    fields.insert(LogicalField::CanvasId, FieldValue::Number(assignment.id));
    if let Some(user) = assignee {
        fields.insert(LogicalField::Assignee, FieldValue::People(user.to_string()));
    }

    let fields = schema.filter_supported(fields);

    match existing {
        None => WriteOp::Create(fields),
        Some(page) => {
            let changed: FieldSet = fields
                .into_iter()
                .filter(|(field, value)| {
                    page.fields
                        .get(field)
                        .is_none_or(|stored| !values_equal(stored, value))
                })
                .collect();
            if changed.is_empty() {
                WriteOp::NoOp
            } else {
                WriteOp::Update {
                    page_id: page.id.clone(),
                    fields: changed,
                }
            }
        }
    }
}
