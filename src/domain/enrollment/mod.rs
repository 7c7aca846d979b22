// ============================================================================
// Enrollment Domain - Business Logic for Enrollment Aggregate
// ============================================================================
//
// This module contains ALL Enrollment-specific write-side code:
// - Value objects (EnrollmentStatus)
// - Events (EnrollmentCreated, EnrollmentStatusUpdated)
// - Commands (CreateEnrollment, UpdateStatus)
// - Errors (EnrollmentError enum)
// - Aggregate (EnrollmentAggregate)
// - Command Handler (EnrollmentCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use errors::*;
pub use command_handler::*;
