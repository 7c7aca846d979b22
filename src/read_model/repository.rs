use std::collections::HashMap;
use std::sync::RwLock;

use super::view::EnrollmentView;

// ============================================================================
// Enrollment Repository - Query-side persistence
// ============================================================================
//
// Single-row writes are atomic; nothing here spans rows.
//
// ============================================================================

pub trait EnrollmentRepository: Send + Sync {
    /// Insert or overwrite the row keyed by `view.enrollment_id`
    fn save(&self, view: EnrollmentView);

    fn find_by_id(&self, enrollment_id: &str) -> Option<EnrollmentView>;

    /// Rows for one student, no ordering guarantee
    fn find_by_student_id(&self, student_id: i64) -> Vec<EnrollmentView>;

    /// Rows for one course, no ordering guarantee
    fn find_by_course_id(&self, course_id: i64) -> Vec<EnrollmentView>;

    fn count(&self) -> usize;
}

#[derive(Default)]
pub struct InMemoryEnrollmentRepository {
    rows: RwLock<HashMap<String, EnrollmentView>>,
}

impl InMemoryEnrollmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(&self, predicate: impl Fn(&EnrollmentView) -> bool) -> Vec<EnrollmentView> {
        let rows = match self.rows.read() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.values().filter(|view| predicate(view)).cloned().collect()
    }
}

impl EnrollmentRepository for InMemoryEnrollmentRepository {
    fn save(&self, view: EnrollmentView) {
        let mut rows = match self.rows.write() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.insert(view.enrollment_id.clone(), view);
    }

    fn find_by_id(&self, enrollment_id: &str) -> Option<EnrollmentView> {
        let rows = match self.rows.read() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.get(enrollment_id).cloned()
    }

    fn find_by_student_id(&self, student_id: i64) -> Vec<EnrollmentView> {
        self.filtered(|view| view.student_id == student_id)
    }

    fn find_by_course_id(&self, course_id: i64) -> Vec<EnrollmentView> {
        self.filtered(|view| view.course_id == course_id)
    }

    fn count(&self) -> usize {
        match self.rows.read() {
            Ok(rows) => rows.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
