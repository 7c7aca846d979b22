// ============================================================================
// Students - CRUD service guarded by a department lookup
// ============================================================================

pub mod department_client;
pub mod model;
pub mod repository;
pub mod service;

pub use department_client::HttpDepartmentClient;
pub use model::Student;
pub use repository::InMemoryStudentRepository;
pub use service::StudentService;
