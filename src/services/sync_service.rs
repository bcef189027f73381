use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::canvas::CanvasClient;
use crate::error::AppError;
use crate::models::{Assignment, Course};
use crate::notion::NotionClient;
use crate::sync::derive::{PRIORITY_OPTIONS, STATUS_OPTIONS, TYPE_OPTIONS};
use crate::sync::{ensure_options, reconcile, LogicalField, ResolvedSchema, WriteOp};

/// Assignments due further back or further out than this are left alone.
const PAST_WINDOW_DAYS: i64 = 2;
const FUTURE_WINDOW_DAYS: i64 = 60;

pub struct SyncService {
    canvas: Arc<dyn CanvasClient>,
    notion: Arc<dyn NotionClient>,
    assignee: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub courses_failed: usize,
}

enum Outcome {
    Created,
    Updated,
    Unchanged,
}

pub fn within_sync_window(due: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    due >= now - Duration::days(PAST_WINDOW_DAYS)
        && due <= now + Duration::days(FUTURE_WINDOW_DAYS)
}

impl SyncService {
    pub fn new(
        canvas: Arc<dyn CanvasClient>,
        notion: Arc<dyn NotionClient>,
        assignee: Option<String>,
    ) -> Self {
        Self {
            canvas,
            notion,
            assignee,
        }
    }

    /// Run one full pass over all active courses. Item failures are counted,
    /// never propagated; only schema retrieval and course enumeration abort
    /// the pass.
    pub async fn sync_all(&self) -> Result<SyncStats, AppError> {
        info!("Starting sync pass");

        let db = self.notion.retrieve_database().await?;
        let mut schema = ResolvedSchema::resolve(&db);
        if !schema.has(LogicalField::CanvasId) {
            return Err(AppError::Notion(
                "The database has no Canvas ID column; pages cannot be upserted without it"
                    .to_string(),
            ));
        }

        self.seed_taxonomy(&mut schema).await;

        let courses = self.canvas.list_active_courses().await?;
        let mut stats = SyncStats::default();

        for course in courses {
            if !course.is_active {
                continue;
            }

            self.ensure_course_labels(&mut schema, &course).await;

            let assignments = match self.canvas.list_assignments(course.id).await {
                Ok(list) => list,
                Err(e) => {
                    warn!("Skipping course {} ({}): {}", course.name, course.id, e);
                    stats.courses_failed += 1;
                    continue;
                }
            };

            let now = Utc::now();
            for assignment in assignments {
                // Assignments without a due date are never synced
                let Some(due) = assignment.due_at else {
                    continue;
                };
                if !within_sync_window(due, now) {
                    continue;
                }

                match self.sync_assignment(&course, &assignment, &schema).await {
                    Ok(Outcome::Created) => stats.created += 1,
                    Ok(Outcome::Updated) => stats.updated += 1,
                    Ok(Outcome::Unchanged) => stats.unchanged += 1,
                    Err(e) => {
                        warn!(
                            "Failed to sync assignment {} ({}): {}",
                            assignment.name, assignment.id, e
                        );
                        stats.failed += 1;
                    }
                }
            }
        }

        info!(
            "Sync pass completed: {} created, {} updated, {} unchanged, {} failed, {} courses skipped",
            stats.created, stats.updated, stats.unchanged, stats.failed, stats.courses_failed
        );
        Ok(stats)
    }

    /// Seed the fixed Type/Priority/Status labels once per pass so page
    /// writes never reference an option the database has not seen.
    async fn seed_taxonomy(&self, schema: &mut ResolvedSchema) {
        let seeds = [
            (LogicalField::Type, TYPE_OPTIONS),
            (LogicalField::Priority, PRIORITY_OPTIONS),
            (LogicalField::Status, STATUS_OPTIONS),
        ];
        for (field, values) in seeds {
            let values: Vec<String> = values.iter().map(|s| s.to_string()).collect();
            if let Err(e) = ensure_options(self.notion.as_ref(), schema, field, &values).await {
                warn!("Could not add {:?} options: {}", field, e);
            }
        }
    }

    async fn ensure_course_labels(&self, schema: &mut ResolvedSchema, course: &Course) {
        if let Err(e) = ensure_options(
            self.notion.as_ref(),
            schema,
            LogicalField::Class,
            std::slice::from_ref(&course.name),
        )
        .await
        {
            warn!("Could not add class option {:?}: {}", course.name, e);
        }
        if let Err(e) = ensure_options(
            self.notion.as_ref(),
            schema,
            LogicalField::Teacher,
            &course.teachers,
        )
        .await
        {
            warn!("Could not add teacher options for {:?}: {}", course.name, e);
        }
    }

    async fn sync_assignment(
        &self,
        course: &Course,
        assignment: &Assignment,
        schema: &ResolvedSchema,
    ) -> Result<Outcome, AppError> {
        let filter = schema
            .canvas_id_filter(assignment.id)
            .ok_or(AppError::InternalServerError)?;
        let pages = self.notion.query_pages(filter, 2).await?;

        let existing = match pages.as_slice() {
            [] => None,
            [page] => Some(schema.parse_page(page)),
            many => {
                return Err(AppError::AmbiguousLookup {
                    canvas_id: assignment.id,
                    count: many.len(),
                });
            }
        };

        let submission = self.canvas.get_submission(course.id, assignment.id).await?;
        let op = reconcile(
            assignment,
            course,
            submission.as_ref(),
            existing.as_ref(),
            schema,
            self.assignee.as_deref(),
            Utc::now(),
        );

        match op {
            WriteOp::Create(fields) => {
                self.notion
                    .create_page(schema.render_properties(&fields))
                    .await?;
                Ok(Outcome::Created)
            }
            WriteOp::Update { page_id, fields } => {
                self.notion
                    .update_page(&page_id, schema.render_properties(&fields))
                    .await?;
                Ok(Outcome::Updated)
            }
            WriteOp::NoOp => Ok(Outcome::Unchanged),
        }
    }
}
