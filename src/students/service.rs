use std::sync::Arc;

use crate::utils::ResiliencePolicy;
use super::department_client::DepartmentClient;
use super::model::{Department, Student};
use super::repository::StudentRepository;

// ============================================================================
// Student Service
// ============================================================================
//
// CRUD over students. Saving checks the department first through the
// resilience policy:
//
// - Department found     → persist and return the student
// - Department not found → nothing persisted, `None`
// - Service unavailable  → fallback: clear department_id, persist anyway
//
// Dependency failures never reach the caller.
//
// ============================================================================

enum DepartmentCheck {
    Found(Department),
    Missing,
    Unavailable,
}

pub struct StudentService {
    repository: Arc<dyn StudentRepository>,
    departments: Arc<dyn DepartmentClient>,
    policy: ResiliencePolicy,
}

impl StudentService {
    pub fn new(
        repository: Arc<dyn StudentRepository>,
        departments: Arc<dyn DepartmentClient>,
        policy: ResiliencePolicy,
    ) -> Self {
        Self {
            repository,
            departments,
            policy,
        }
    }

    pub fn get_all_students(&self) -> Vec<Student> {
        self.repository.find_all()
    }

    pub fn get_student_by_id(&self, id: i64) -> Option<Student> {
        self.repository.find_by_id(id)
    }

    pub async fn save_student(&self, mut student: Student) -> Option<Student> {
        let Some(department_id) = student.department_id else {
            tracing::info!("Saving student without department");
            return Some(self.repository.save(student));
        };

        tracing::info!(department_id, "Attempting to save student");

        let departments = &self.departments;
        let check = self
            .policy
            .execute_or_else(
                move || async move {
                    departments
                        .get_department_by_id(department_id)
                        .await
                        .map(|found| found.map_or(DepartmentCheck::Missing, DepartmentCheck::Found))
                },
                |_| DepartmentCheck::Unavailable,
            )
            .await;

        match check {
            DepartmentCheck::Found(department) => {
                tracing::info!(department = %department.name, "Department found");
                Some(self.repository.save(student))
            }
            DepartmentCheck::Missing => {
                tracing::warn!(department_id, "Department not found, student not saved");
                None
            }
            DepartmentCheck::Unavailable => {
                tracing::warn!(department_id, "Saving student without department reference");
                student.department_id = None;
                Some(self.repository.save(student))
            }
        }
    }

    /// `None` when the department does not exist; a placeholder when the
    /// department service is unavailable
    pub async fn get_department_for_student(&self, department_id: i64) -> Option<Department> {
        tracing::info!(department_id, "Fetching department");

        let departments = &self.departments;
        self.policy
            .execute_or_else(
                move || departments.get_department_by_id(department_id),
                |_| Some(Department::unavailable(department_id)),
            )
            .await
    }

    pub fn delete_student(&self, id: i64) {
        if !self.repository.delete_by_id(id) {
            tracing::debug!(student_id = id, "Delete for unknown student");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::students::department_client::DepartmentClientError;
    use crate::students::repository::InMemoryStudentRepository;
    use crate::utils::{CircuitBreakerConfig, RateLimiterConfig, ResilienceConfig, RetryConfig};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails the first `failures` calls, then answers from `known`
    struct FakeDepartments {
        failures: u32,
        calls: AtomicU32,
        known: Vec<Department>,
    }

    impl FakeDepartments {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                known: vec![Department { id: 1, name: "Computer Science".to_string() }],
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DepartmentClient for FakeDepartments {
        async fn get_department_by_id(&self, id: i64) -> Result<Option<Department>, DepartmentClientError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(DepartmentClientError::Transport("connection reset".to_string()));
            }
            Ok(self.known.iter().find(|d| d.id == id).cloned())
        }
    }

    fn fast_policy(metrics: Arc<Metrics>) -> ResiliencePolicy {
        ResiliencePolicy::new(
            "department_service",
            ResilienceConfig {
                rate_limiter: RateLimiterConfig {
                    limit_for_period: 100,
                    refresh_period: Duration::from_secs(1),
                    timeout: Duration::ZERO,
                },
                retry: RetryConfig {
                    max_attempts: 3,
                    initial_delay: Duration::from_millis(5),
                    max_delay: Duration::from_millis(20),
                    multiplier: 2.0,
                },
                circuit_breaker: CircuitBreakerConfig {
                    failure_rate_threshold: 50.0,
                    sliding_window_size: 10,
                    minimum_calls: 10,
                    timeout: Duration::from_secs(30),
                    success_threshold: 1,
                    permitted_calls_in_half_open: 1,
                },
            },
            metrics,
        )
    }

    fn service(failures: u32) -> (StudentService, Arc<FakeDepartments>, Arc<InMemoryStudentRepository>, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new().unwrap());
        let departments = Arc::new(FakeDepartments::new(failures));
        let repository = Arc::new(InMemoryStudentRepository::new());
        let service = StudentService::new(repository.clone(), departments.clone(), fast_policy(metrics.clone()));
        (service, departments, repository, metrics)
    }

    fn student(department_id: Option<i64>) -> Student {
        Student {
            id: None,
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            department_id,
        }
    }

    #[tokio::test]
    async fn test_save_with_existing_department() {
        let (service, departments, repository, _) = service(0);

        let saved = service.save_student(student(Some(1))).await.unwrap();

        assert_eq!(saved.id, Some(1));
        assert_eq!(saved.department_id, Some(1));
        assert_eq!(departments.calls(), 1);
        assert_eq!(repository.find_all().len(), 1);
    }

    #[tokio::test]
    async fn test_save_with_unknown_department_is_skipped() {
        let (service, _, repository, metrics) = service(0);

        assert!(service.save_student(student(Some(99))).await.is_none());
        assert!(repository.find_all().is_empty());
        assert_eq!(metrics.fallbacks_total.with_label_values(&["department_service"]).get(), 0);
    }

    #[tokio::test]
    async fn test_save_retries_transient_failures() {
        let (service, departments, _, metrics) = service(2);

        let saved = service.save_student(student(Some(1))).await.unwrap();

        assert_eq!(saved.department_id, Some(1));
        assert_eq!(departments.calls(), 3);
        assert_eq!(metrics.fallbacks_total.with_label_values(&["department_service"]).get(), 0);
    }

    #[tokio::test]
    async fn test_save_falls_back_when_department_service_down() {
        let (service, departments, repository, metrics) = service(u32::MAX);

        let saved = service.save_student(student(Some(1))).await.unwrap();

        assert_eq!(saved.department_id, None);
        assert_eq!(departments.calls(), 3);
        assert_eq!(repository.find_by_id(saved.id.unwrap()).unwrap().department_id, None);
        assert_eq!(metrics.fallbacks_total.with_label_values(&["department_service"]).get(), 1);
    }

    #[tokio::test]
    async fn test_save_without_department_skips_lookup() {
        let (service, departments, _, _) = service(0);

        let saved = service.save_student(student(None)).await.unwrap();

        assert_eq!(saved.id, Some(1));
        assert_eq!(departments.calls(), 0);
    }

    #[tokio::test]
    async fn test_department_lookup_placeholder_on_failure() {
        let (service, _, _, _) = service(u32::MAX);

        let department = service.get_department_for_student(1).await.unwrap();
        assert_eq!(department, Department::unavailable(1));
        assert_eq!(department.name, "Service Unavailable");
    }

    #[tokio::test]
    async fn test_department_lookup_passes_through() {
        let (service, _, _, _) = service(0);

        assert_eq!(service.get_department_for_student(1).await.unwrap().name, "Computer Science");
        assert!(service.get_department_for_student(42).await.is_none());
    }

    #[tokio::test]
    async fn test_crud() {
        let (service, _, _, _) = service(0);
        let saved = service.save_student(student(Some(1))).await.unwrap();
        let id = saved.id.unwrap();

        assert_eq!(service.get_student_by_id(id), Some(saved));
        assert_eq!(service.get_all_students().len(), 1);

        service.delete_student(id);
        assert!(service.get_student_by_id(id).is_none());
        service.delete_student(id);
    }
}
