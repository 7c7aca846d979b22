use actix_web::{web, HttpResponse, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use super::Metrics;

/// Mount `/metrics` and `/health` on the application's HTTP server
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler));
}

async fn metrics_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    // Open circuit = department lookups are being served by fallbacks
    let status = match metrics.circuit_breaker_state.get() {
        1 => "degraded",
        _ => "healthy",
    };

    HttpResponse::Ok().json(serde_json::json!({
        "status": status,
        "service": "enrollment-cqrs"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_reports_degraded_when_circuit_open() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(metrics.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");

        metrics.update_circuit_breaker_state(1);
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "degraded");
    }

    #[actix_web::test]
    async fn test_metrics_endpoint_exposes_text_format() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.record_fallback("save_student");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(metrics))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("fallbacks_total"));
    }
}
