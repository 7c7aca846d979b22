use actix::prelude::*;

use crate::domain::enrollment::EnrollmentEvent;
use crate::event_sourcing::core::EventEnvelope;
use crate::event_sourcing::store::EventPublisher;
use crate::read_model::{EnrollmentProjection, EnrollmentView};

// ============================================================================
// Projection Actor - Read side of the enrollment service
// ============================================================================
//
// Owns the enrollment projection. Events arrive through the mailbox after
// the command that produced them has already returned, so reads are
// eventually consistent with writes. Queries travel through the same
// mailbox and therefore observe events in the order they were appended.
//
// ============================================================================

pub struct ProjectionActor {
    projection: EnrollmentProjection,
}

impl ProjectionActor {
    pub fn new(projection: EnrollmentProjection) -> Self {
        Self { projection }
    }
}

impl Actor for ProjectionActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("ProjectionActor started");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct ProjectEvent(pub EventEnvelope<EnrollmentEvent>);

#[derive(Message)]
#[rtype(result = "Option<EnrollmentView>")]
pub struct FindEnrollmentById {
    pub enrollment_id: String,
}

#[derive(Message)]
#[rtype(result = "Vec<EnrollmentView>")]
pub struct FindEnrollmentsByStudent {
    pub student_id: i64,
}

#[derive(Message)]
#[rtype(result = "Vec<EnrollmentView>")]
pub struct FindEnrollmentsByCourse {
    pub course_id: i64,
}

// ============================================================================
// Handlers
// ============================================================================

impl Handler<ProjectEvent> for ProjectionActor {
    type Result = ();

    fn handle(&mut self, msg: ProjectEvent, _: &mut Self::Context) {
        let envelope = msg.0;
        tracing::debug!(
            event_id = %envelope.event_id,
            event_type = %envelope.event_type,
            enrollment_id = %envelope.aggregate_id,
            sequence_number = envelope.sequence_number,
            "Projecting event"
        );

        self.projection.apply(&envelope.event_data);
    }
}

impl Handler<FindEnrollmentById> for ProjectionActor {
    type Result = Option<EnrollmentView>;

    fn handle(&mut self, msg: FindEnrollmentById, _: &mut Self::Context) -> Self::Result {
        self.projection.find_by_id(&msg.enrollment_id)
    }
}

impl Handler<FindEnrollmentsByStudent> for ProjectionActor {
    type Result = Vec<EnrollmentView>;

    fn handle(&mut self, msg: FindEnrollmentsByStudent, _: &mut Self::Context) -> Self::Result {
        self.projection.find_by_student_id(msg.student_id)
    }
}

impl Handler<FindEnrollmentsByCourse> for ProjectionActor {
    type Result = Vec<EnrollmentView>;

    fn handle(&mut self, msg: FindEnrollmentsByCourse, _: &mut Self::Context) -> Self::Result {
        self.projection.find_by_course_id(msg.course_id)
    }
}

// ============================================================================
// Event Store Subscription
// ============================================================================

/// Forwards appended events to the projection actor without waiting
pub struct ProjectionPublisher {
    addr: Addr<ProjectionActor>,
}

impl ProjectionPublisher {
    pub fn new(addr: Addr<ProjectionActor>) -> Self {
        Self { addr }
    }
}

impl EventPublisher<EnrollmentEvent> for ProjectionPublisher {
    fn publish(&self, envelope: &EventEnvelope<EnrollmentEvent>) {
        self.addr.do_send(ProjectEvent(envelope.clone()));
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
