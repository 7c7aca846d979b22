// ============================================================================
// Read Model - Query Side
// ============================================================================
//
// Denormalized enrollment rows kept up to date by folding events. Queries
// are answered from here only, never from the aggregate.
//
// ============================================================================

pub mod view;
pub mod repository;
pub mod projection;

pub use view::EnrollmentView;
pub use repository::InMemoryEnrollmentRepository;
pub use projection::EnrollmentProjection;
