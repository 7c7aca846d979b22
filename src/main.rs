use actix::prelude::*;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod api;
mod config;
mod domain;
mod event_sourcing;
mod metrics;
mod read_model;
mod students;
mod utils;

use actors::{ProjectionActor, ProjectionPublisher};
use config::AppConfig;
use domain::enrollment::{EnrollmentCommandHandler, EnrollmentEvent};
use event_sourcing::store::EventStore;
use read_model::{EnrollmentProjection, InMemoryEnrollmentRepository};
use students::{HttpDepartmentClient, InMemoryStudentRepository, StudentService};
use utils::ResiliencePolicy;

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,enrollment_cqrs=debug"))
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        http_addr = %config.http_addr,
        department_service = %config.department_service_url,
        "Starting enrollment service"
    );

    // === 1. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Read side: projection actor subscribed to the event store ===
    let projection = ProjectionActor::new(EnrollmentProjection::new(
        Arc::new(InMemoryEnrollmentRepository::new()),
        metrics.clone(),
    ))
    .start();

    let event_store: Arc<EventStore<EnrollmentEvent>> = Arc::new(EventStore::new("Enrollment"));
    event_store.subscribe(Arc::new(ProjectionPublisher::new(projection.clone())));

    // === 3. Write side ===
    let command_handler = Arc::new(EnrollmentCommandHandler::new(event_store, metrics.clone()));

    // === 4. Student service behind the department resilience policy ===
    let departments = Arc::new(HttpDepartmentClient::new(
        &config.department_service_url,
        config.department_timeout,
    )?);
    let student_service = Arc::new(StudentService::new(
        Arc::new(InMemoryStudentRepository::new()),
        departments,
        ResiliencePolicy::new("department_service", config.department_resilience.clone(), metrics.clone()),
    ));

    // === 5. HTTP ===
    tracing::info!("Listening on {}", config.http_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(metrics.clone()))
            .app_data(web::Data::new(command_handler.clone()))
            .app_data(web::Data::new(projection.clone()))
            .app_data(web::Data::new(student_service.clone()))
            .configure(metrics::configure)
            .configure(api::configure)
    })
    .bind(&config.http_addr)?
    .run()
    .await?;

    tracing::info!("Enrollment service stopped");
    Ok(())
}
