use serde::{Deserialize, Serialize};

use crate::event_sourcing::core::DomainEvent;
use super::value_objects::EnrollmentStatus;

// ============================================================================
// Enrollment Events - Domain Events for Enrollment Aggregate
// ============================================================================

/// Enrollment Event - Union type for all enrollment events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EnrollmentEvent {
    Created(EnrollmentCreated),
    StatusUpdated(EnrollmentStatusUpdated),
}

impl EnrollmentEvent {
    pub fn enrollment_id(&self) -> &str {
        match self {
            EnrollmentEvent::Created(e) => &e.enrollment_id,
            EnrollmentEvent::StatusUpdated(e) => &e.enrollment_id,
        }
    }
}

impl DomainEvent for EnrollmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EnrollmentEvent::Created(_) => "EnrollmentCreated",
            EnrollmentEvent::StatusUpdated(_) => "EnrollmentStatusUpdated",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Enrollment Created - originates an enrollment's lifeline, carries the
/// full initial state
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnrollmentCreated {
    pub enrollment_id: String,
    pub student_id: i64,
    pub course_id: i64,
    pub status: EnrollmentStatus,
}

/// Enrollment Status Updated
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnrollmentStatusUpdated {
    pub enrollment_id: String,
    pub status: EnrollmentStatus,
}
