use actix::Addr;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;

use crate::actors::{FindEnrollmentById, FindEnrollmentsByCourse, FindEnrollmentsByStudent, ProjectionActor};
use crate::domain::enrollment::EnrollmentCommandHandler;
use super::ApiError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/enrollments")
            .route("", web::post().to(create_enrollment))
            .route("/student/{student_id}", web::get().to(get_enrollments_by_student))
            .route("/course/{course_id}", web::get().to(get_enrollments_by_course))
            .route("/{enrollment_id}/status", web::put().to(update_enrollment_status))
            .route("/{enrollment_id}", web::get().to(get_enrollment_by_id)),
    );
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnrollmentRequest {
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub course_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

async fn create_enrollment(
    handler: web::Data<Arc<EnrollmentCommandHandler>>,
    request: web::Json<CreateEnrollmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    let enrollment_id = handler
        .create_enrollment(request.student_id, request.course_id)
        .await?;

    Ok(HttpResponse::Created().body(enrollment_id))
}

async fn update_enrollment_status(
    handler: web::Data<Arc<EnrollmentCommandHandler>>,
    path: web::Path<String>,
    request: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let enrollment_id = path.into_inner();
    handler
        .update_status(&enrollment_id, request.into_inner().status)
        .await?;

    Ok(HttpResponse::Ok().body("Status updated successfully"))
}

async fn get_enrollment_by_id(
    projection: web::Data<Addr<ProjectionActor>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let view = projection
        .send(FindEnrollmentById { enrollment_id: path.into_inner() })
        .await
        .map_err(anyhow::Error::from)?;

    // Absent rows are a null body, not a 404
    Ok(HttpResponse::Ok().json(view))
}

async fn get_enrollments_by_student(
    projection: web::Data<Addr<ProjectionActor>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let views = projection
        .send(FindEnrollmentsByStudent { student_id: path.into_inner() })
        .await
        .map_err(anyhow::Error::from)?;

    Ok(HttpResponse::Ok().json(views))
}

async fn get_enrollments_by_course(
    projection: web::Data<Addr<ProjectionActor>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let views = projection
        .send(FindEnrollmentsByCourse { course_id: path.into_inner() })
        .await
        .map_err(anyhow::Error::from)?;

    Ok(HttpResponse::Ok().json(views))
}
