use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::students::{Student, StudentService};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/students")
            .route("", web::get().to(get_all_students))
            .route("", web::post().to(save_student))
            .route("/department/{department_id}", web::get().to(get_department_for_student))
            .route("/{id}", web::get().to(get_student_by_id))
            .route("/{id}", web::delete().to(delete_student)),
    );
}

async fn get_all_students(service: web::Data<Arc<StudentService>>) -> HttpResponse {
    HttpResponse::Ok().json(service.get_all_students())
}

async fn get_student_by_id(service: web::Data<Arc<StudentService>>, path: web::Path<i64>) -> HttpResponse {
    HttpResponse::Ok().json(service.get_student_by_id(path.into_inner()))
}

async fn save_student(service: web::Data<Arc<StudentService>>, student: web::Json<Student>) -> HttpResponse {
    match service.save_student(student.into_inner()).await {
        Some(saved) => HttpResponse::Created().json(saved),
        // Department does not exist
        None => HttpResponse::UnprocessableEntity().finish(),
    }
}

async fn delete_student(service: web::Data<Arc<StudentService>>, path: web::Path<i64>) -> HttpResponse {
    service.delete_student(path.into_inner());
    HttpResponse::NoContent().finish()
}

async fn get_department_for_student(
    service: web::Data<Arc<StudentService>>,
    path: web::Path<i64>,
) -> HttpResponse {
    HttpResponse::Ok().json(service.get_department_for_student(path.into_inner()).await)
}
