use serde::{Deserialize, Serialize};

use crate::event_sourcing::core::Aggregate;
use super::value_objects::EnrollmentStatus;
use super::events::*;
use super::commands::EnrollmentCommand;
use super::errors::EnrollmentError;

// ============================================================================
// Enrollment Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentAggregate {
    // Identity
    pub enrollment_id: String,
    pub version: i64,

    // Set once by the creation event
    pub student_id: i64,
    pub course_id: i64,

    pub status: EnrollmentStatus,
}

impl EnrollmentAggregate {
    fn validate_status(status: Option<&str>) -> Result<EnrollmentStatus, EnrollmentError> {
        match status {
            Some(s) if !s.is_empty() => Ok(EnrollmentStatus::new(s)),
            _ => Err(EnrollmentError::EmptyStatus),
        }
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for EnrollmentAggregate {
    type Event = EnrollmentEvent;
    type Command = EnrollmentCommand;
    type Error = EnrollmentError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            EnrollmentEvent::Created(e) => Ok(Self {
                enrollment_id: e.enrollment_id.clone(),
                version: 1,
                student_id: e.student_id,
                course_id: e.course_id,
                status: e.status.clone(),
            }),
            EnrollmentEvent::StatusUpdated(_) => Err(EnrollmentError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            EnrollmentEvent::Created(_) => {
                return Err(EnrollmentError::AlreadyExists(self.enrollment_id.clone()));
            }
            EnrollmentEvent::StatusUpdated(e) => {
                self.status = e.status.clone();
            }
        }

        self.version += 1;
        Ok(())
    }

    fn handle_initial_command(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            EnrollmentCommand::CreateEnrollment {
                enrollment_id,
                student_id,
                course_id,
                status,
            } => {
                let student_id = student_id.ok_or(EnrollmentError::MissingStudentId)?;
                let course_id = course_id.ok_or(EnrollmentError::MissingCourseId)?;

                Ok(vec![EnrollmentEvent::Created(EnrollmentCreated {
                    enrollment_id: enrollment_id.clone(),
                    student_id,
                    course_id,
                    status: status.clone(),
                })])
            }

            EnrollmentCommand::UpdateStatus { enrollment_id, .. } => {
                Err(EnrollmentError::NotFound(enrollment_id.clone()))
            }
        }
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            EnrollmentCommand::CreateEnrollment { enrollment_id, .. } => {
                Err(EnrollmentError::AlreadyExists(enrollment_id.clone()))
            }

            EnrollmentCommand::UpdateStatus { enrollment_id, status } => {
                let status = Self::validate_status(status.as_deref())?;

                Ok(vec![EnrollmentEvent::StatusUpdated(EnrollmentStatusUpdated {
                    enrollment_id: enrollment_id.clone(),
                    status,
                })])
            }
        }
    }

    fn aggregate_id(&self) -> &str {
        &self.enrollment_id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
