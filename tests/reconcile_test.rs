mod common;

use chrono::{Duration, TimeZone, Utc};

use canvasync::models::Submission;
use canvasync::sync::{
    FieldSet, FieldValue, LogicalField, PageSnapshot, ResolvedSchema, WriteOp, reconcile,
};
use common::{assignment, course, full_database, full_database_json};

fn schema() -> ResolvedSchema {
    ResolvedSchema::resolve(&full_database())
}

fn text(fields: &FieldSet, field: LogicalField) -> Option<&str> {
    match fields.get(&field) {
        Some(FieldValue::Text(s)) => Some(s.as_str()),
        _ => None,
    }
}

#[test]
fn first_pass_creates_a_full_page() {
    let now = Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
    let biology = course(10, "Biology", &["Ms. Rivera"]);
    let a = assignment(501, 10, "Midterm Exam", Some(now + Duration::days(1)));

    let op = reconcile(&a, &biology, None, None, &schema(), None, now);

    let WriteOp::Create(fields) = op else {
        panic!("expected Create, got {:?}", op);
    };
    assert_eq!(text(&fields, LogicalField::Name), Some("Midterm Exam"));
    assert_eq!(text(&fields, LogicalField::Class), Some("Biology"));
    assert_eq!(text(&fields, LogicalField::Type), Some("Test"));
    assert_eq!(text(&fields, LogicalField::Priority), Some("High"));
    assert_eq!(text(&fields, LogicalField::Status), Some("Not started"));
    assert_eq!(
        fields.get(&LogicalField::Done),
        Some(&FieldValue::Flag(false))
    );
    assert_eq!(
        fields.get(&LogicalField::CanvasId),
        Some(&FieldValue::Number(501))
    );
    assert_eq!(
        fields.get(&LogicalField::Teacher),
        Some(&FieldValue::Labels(vec!["Ms. Rivera".to_string()]))
    );
    assert!(fields.contains_key(&LogicalField::DueDate));
}

#[test]
fn reconcile_is_idempotent() {
    let now = Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
    let biology = course(10, "Biology", &["Ms. Rivera"]);
    let a = assignment(501, 10, "Midterm Exam", Some(now + Duration::days(1)));
    let schema = schema();

    let WriteOp::Create(fields) = reconcile(&a, &biology, None, None, &schema, None, now) else {
        panic!("expected Create");
    };

    // Same source data, page now stored verbatim: nothing left to write
    let stored = PageSnapshot {
        id: "page-1".to_string(),
        fields,
    };
    let op = reconcile(&a, &biology, None, Some(&stored), &schema, None, now);
    assert_eq!(op, WriteOp::NoOp);
}

#[test]
fn submission_forces_completed_with_a_minimal_diff() {
    let now = Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
    let biology = course(10, "Biology", &["Ms. Rivera"]);
    let a = assignment(501, 10, "Midterm Exam", Some(now + Duration::days(1)));
    let schema = schema();

    let WriteOp::Create(mut fields) = reconcile(&a, &biology, None, None, &schema, None, now)
    else {
        panic!("expected Create");
    };
    // The student set the page to In Progress by hand
    fields.insert(
        LogicalField::Status,
        FieldValue::Text("In Progress".to_string()),
    );
    let stored = PageSnapshot {
        id: "page-1".to_string(),
        fields,
    };

    let submission = Submission {
        submitted_at: Some(now),
    };
    let op = reconcile(&a, &biology, Some(&submission), Some(&stored), &schema, None, now);

    let WriteOp::Update { page_id, fields } = op else {
        panic!("expected Update, got {:?}", op);
    };
    assert_eq!(page_id, "page-1");
    assert_eq!(text(&fields, LogicalField::Status), Some("Completed"));
    assert_eq!(
        fields.get(&LogicalField::Done),
        Some(&FieldValue::Flag(true))
    );
    // Unchanged fields stay out of the diff
    assert_eq!(fields.len(), 2);
}

#[test]
fn manual_status_is_preserved_without_submission() {
    let now = Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
    let biology = course(10, "Biology", &["Ms. Rivera"]);
    let a = assignment(501, 10, "Midterm Exam", Some(now + Duration::days(1)));
    let schema = schema();

    let WriteOp::Create(mut fields) = reconcile(&a, &biology, None, None, &schema, None, now)
    else {
        panic!("expected Create");
    };
    fields.insert(
        LogicalField::Status,
        FieldValue::Text("In Progress".to_string()),
    );
    let stored = PageSnapshot {
        id: "page-1".to_string(),
        fields,
    };

    // No submission reported: the manual status must not be touched
    let op = reconcile(&a, &biology, None, Some(&stored), &schema, None, now);
    assert_eq!(op, WriteOp::NoOp);
}

#[test]
fn distant_due_dates_are_low_priority() {
    let now = Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
    let biology = course(10, "Biology", &[]);
    let a = assignment(502, 10, "Lab writeup", Some(now + Duration::days(8)));

    let WriteOp::Create(fields) = reconcile(&a, &biology, None, None, &schema(), None, now)
    else {
        panic!("expected Create");
    };
    assert_eq!(text(&fields, LogicalField::Priority), Some("Low"));
}

#[test]
fn missing_teacher_column_degrades_silently() {
    let mut db = full_database_json();
    db["properties"]
        .as_object_mut()
        .expect("properties object")
        .remove("Teacher");
    let schema = ResolvedSchema::resolve(&serde_json::from_value(db).expect("fixture"));

    let now = Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
    let biology = course(10, "Biology", &["Ms. Rivera"]);
    let a = assignment(503, 10, "Essay draft", Some(now + Duration::days(1)));

    let WriteOp::Create(fields) = reconcile(&a, &biology, None, None, &schema, None, now) else {
        panic!("expected Create");
    };
    assert!(!fields.contains_key(&LogicalField::Teacher));
    assert_eq!(text(&fields, LogicalField::Name), Some("Essay draft"));
}

#[test]
fn unknown_select_options_are_omitted() {
    let now = Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
    // Neither the class label nor the second teacher made it into the
    // option sets (option creation failed or never ran)
    let chem = course(11, "Chemistry 101", &["Ms. Rivera", "Dr. Patel"]);
    let a = assignment(504, 11, "Problem set", Some(now + Duration::days(2)));

    let WriteOp::Create(fields) = reconcile(&a, &chem, None, None, &schema(), None, now) else {
        panic!("expected Create");
    };
    assert!(!fields.contains_key(&LogicalField::Class));
    assert_eq!(
        fields.get(&LogicalField::Teacher),
        Some(&FieldValue::Labels(vec!["Ms. Rivera".to_string()]))
    );
}

#[test]
fn fixed_assignee_is_written_when_configured() {
    let now = Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
    let biology = course(10, "Biology", &[]);
    let a = assignment(505, 10, "Reading response", Some(now + Duration::days(3)));

    let WriteOp::Create(fields) =
        reconcile(&a, &biology, None, None, &schema(), Some("user-123"), now)
    else {
        panic!("expected Create");
    };
    assert_eq!(
        fields.get(&LogicalField::Assignee),
        Some(&FieldValue::People("user-123".to_string()))
    );
}
