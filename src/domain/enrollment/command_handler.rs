use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use anyhow::Result;

use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};
use crate::event_sourcing::store::EventStore;
use crate::metrics::Metrics;

use super::aggregate::EnrollmentAggregate;
use super::commands::EnrollmentCommand;
use super::errors::EnrollmentError;
use super::events::EnrollmentEvent;
use super::value_objects::EnrollmentStatus;

// ============================================================================
// Enrollment Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Event Store
//
// Commands for one enrollment id run one at a time behind a per-id lock, so
// the load → validate → append cycle always sees the latest history.
// Different ids never wait on each other.
//
// ============================================================================

pub struct EnrollmentCommandHandler {
    event_store: Arc<EventStore<EnrollmentEvent>>,
    metrics: Arc<Metrics>,
    locks: std::sync::Mutex<HashMap<String, LockEntry>>,
}

struct LockEntry {
    lock: Arc<Mutex<()>>,
    holders: usize,
}

/// A caller's claim on one id's lock. The map entry goes away with the last
/// lease, including when `handle` is cancelled mid-await.
struct IdLease<'a> {
    locks: &'a std::sync::Mutex<HashMap<String, LockEntry>>,
    enrollment_id: String,
    lock: Arc<Mutex<()>>,
}

impl Drop for IdLease<'_> {
    fn drop(&mut self) {
        let mut locks = match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        let last = match locks.get_mut(&self.enrollment_id) {
            Some(entry) => {
                entry.holders = entry.holders.saturating_sub(1);
                entry.holders == 0
            }
            None => false,
        };
        if last {
            locks.remove(&self.enrollment_id);
        }
    }
}

impl EnrollmentCommandHandler {
    pub fn new(event_store: Arc<EventStore<EnrollmentEvent>>, metrics: Arc<Metrics>) -> Self {
        Self {
            event_store,
            metrics,
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Create an enrollment with a fresh id and status `PENDING`.
    /// Returns the generated id.
    pub async fn create_enrollment(
        &self,
        student_id: Option<i64>,
        course_id: Option<i64>,
    ) -> Result<String> {
        let enrollment_id = Uuid::new_v4().to_string();
        let command = EnrollmentCommand::CreateEnrollment {
            enrollment_id: enrollment_id.clone(),
            student_id,
            course_id,
            status: EnrollmentStatus::pending(),
        };

        self.handle(command, Uuid::new_v4()).await?;
        Ok(enrollment_id)
    }

    pub async fn update_status(&self, enrollment_id: &str, status: Option<String>) -> Result<i64> {
        let command = EnrollmentCommand::UpdateStatus {
            enrollment_id: enrollment_id.to_string(),
            status,
        };

        self.handle(command, Uuid::new_v4()).await
    }

    /// Handle a command and persist resulting events.
    /// Returns the aggregate version after the append.
    pub async fn handle(&self, command: EnrollmentCommand, correlation_id: Uuid) -> Result<i64> {
        let enrollment_id = command.enrollment_id().to_string();
        let lease = self.lease(&enrollment_id);

        let result = {
            let _guard = lease.lock.lock().await;
            self.handle_serialized(&enrollment_id, &command, correlation_id).await
        };
        drop(lease);

        match &result {
            Ok(version) => {
                self.metrics.record_command(command.name(), "accepted");
                tracing::info!(
                    enrollment_id = %enrollment_id,
                    command = command.name(),
                    version = version,
                    "Command accepted"
                );
            }
            Err(e) => {
                let outcome = match e.downcast_ref::<EnrollmentError>() {
                    Some(_) => "rejected",
                    None => "failed",
                };
                self.metrics.record_command(command.name(), outcome);
                tracing::warn!(
                    enrollment_id = %enrollment_id,
                    command = command.name(),
                    error = %e,
                    "Command {}", outcome
                );
            }
        }

        result
    }

    async fn handle_serialized(
        &self,
        enrollment_id: &str,
        command: &EnrollmentCommand,
        correlation_id: Uuid,
    ) -> Result<i64> {
        // Load current aggregate state
        let (domain_events, expected_version) = if self.event_store.aggregate_exists(enrollment_id).await {
            let aggregate = self
                .event_store
                .load_aggregate::<EnrollmentAggregate>(enrollment_id)
                .await?;
            (aggregate.handle_command(command)?, aggregate.version())
        } else {
            (EnrollmentAggregate::handle_initial_command(command)?, 0)
        };

        // Wrap in envelopes
        let mut seq = expected_version;
        let envelopes = domain_events
            .into_iter()
            .map(|domain_event| {
                seq += 1;
                EventEnvelope::new(
                    enrollment_id,
                    seq,
                    domain_event.event_type(),
                    domain_event,
                    correlation_id,
                )
            })
            .collect();

        self.event_store
            .append_events(enrollment_id, expected_version, envelopes)
            .await
    }

    fn lease(&self, enrollment_id: &str) -> IdLease<'_> {
        let mut locks = match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = locks
            .entry(enrollment_id.to_string())
            .or_insert_with(|| LockEntry {
                lock: Arc::new(Mutex::new(())),
                holders: 0,
            });
        entry.holders += 1;

        IdLease {
            locks: &self.locks,
            enrollment_id: enrollment_id.to_string(),
            lock: entry.lock.clone(),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
