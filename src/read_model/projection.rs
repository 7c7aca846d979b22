use std::sync::Arc;

use crate::domain::enrollment::{EnrollmentCreated, EnrollmentEvent, EnrollmentStatusUpdated};
use crate::event_sourcing::core::DomainEvent;
use crate::metrics::Metrics;
use super::repository::EnrollmentRepository;
use super::view::EnrollmentView;

// ============================================================================
// Enrollment Projection
// ============================================================================
//
// Folds enrollment events into the read model and answers lookups.
//
// - Created: insert the row, overwriting any existing row with that id
// - StatusUpdated: set status on the existing row; a missing row is skipped
//   (logged and counted, never surfaced to the caller)
//
// ============================================================================

pub struct EnrollmentProjection {
    repository: Arc<dyn EnrollmentRepository>,
    metrics: Arc<Metrics>,
}

impl EnrollmentProjection {
    pub fn new(repository: Arc<dyn EnrollmentRepository>, metrics: Arc<Metrics>) -> Self {
        Self { repository, metrics }
    }

    pub fn apply(&self, event: &EnrollmentEvent) {
        let applied = match event {
            EnrollmentEvent::Created(e) => {
                self.on_created(e);
                true
            }
            EnrollmentEvent::StatusUpdated(e) => self.on_status_updated(e),
        };

        if applied {
            self.metrics.record_projected_event(event.event_type());
        }
    }

    pub fn on_created(&self, event: &EnrollmentCreated) {
        self.repository.save(EnrollmentView {
            enrollment_id: event.enrollment_id.clone(),
            student_id: event.student_id,
            course_id: event.course_id,
            status: event.status.clone(),
        });

        tracing::debug!(
            enrollment_id = %event.enrollment_id,
            student_id = event.student_id,
            course_id = event.course_id,
            "Projected enrollment creation"
        );
    }

    /// Returns false when there was no row to update
    pub fn on_status_updated(&self, event: &EnrollmentStatusUpdated) -> bool {
        let Some(mut view) = self.repository.find_by_id(&event.enrollment_id) else {
            self.metrics.record_missing_row();
            tracing::warn!(
                enrollment_id = %event.enrollment_id,
                status = %event.status,
                "Dropping status update for enrollment missing from read model"
            );
            return false;
        };

        view.status = event.status.clone();
        self.repository.save(view);

        tracing::debug!(
            enrollment_id = %event.enrollment_id,
            status = %event.status,
            "Projected enrollment status update"
        );
        true
    }

    pub fn find_by_id(&self, enrollment_id: &str) -> Option<EnrollmentView> {
        self.repository.find_by_id(enrollment_id)
    }

    pub fn find_by_student_id(&self, student_id: i64) -> Vec<EnrollmentView> {
        self.repository.find_by_student_id(student_id)
    }

    pub fn find_by_course_id(&self, course_id: i64) -> Vec<EnrollmentView> {
        self.repository.find_by_course_id(course_id)
    }
}
