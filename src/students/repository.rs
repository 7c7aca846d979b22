use std::collections::BTreeMap;
use std::sync::RwLock;

use super::model::Student;

pub trait StudentRepository: Send + Sync {
    /// All students ordered by id
    fn find_all(&self) -> Vec<Student>;

    fn find_by_id(&self, id: i64) -> Option<Student>;

    /// Insert when `student.id` is None, otherwise overwrite. Returns the stored row.
    fn save(&self, student: Student) -> Student;

    /// Returns false when no row had that id
    fn delete_by_id(&self, id: i64) -> bool;
}

#[derive(Default)]
pub struct InMemoryStudentRepository {
    rows: RwLock<Rows>,
}

#[derive(Default)]
struct Rows {
    next_id: i64,
    by_id: BTreeMap<i64, Student>,
}

impl InMemoryStudentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StudentRepository for InMemoryStudentRepository {
    fn find_all(&self) -> Vec<Student> {
        let rows = match self.rows.read() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.by_id.values().cloned().collect()
    }

    fn find_by_id(&self, id: i64) -> Option<Student> {
        let rows = match self.rows.read() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.by_id.get(&id).cloned()
    }

    fn save(&self, mut student: Student) -> Student {
        let mut rows = match self.rows.write() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };

        let id = match student.id {
            Some(id) => {
                rows.next_id = rows.next_id.max(id);
                id
            }
            None => {
                rows.next_id += 1;
                rows.next_id
            }
        };
        student.id = Some(id);
        rows.by_id.insert(id, student.clone());
        student
    }

    fn delete_by_id(&self, id: i64) -> bool {
        let mut rows = match self.rows.write() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.by_id.remove(&id).is_some()
    }
}
