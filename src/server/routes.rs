use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::core::sorter::{sort_entries, SortDirection};

use super::error::ApiError;
use super::AppState;

pub const USAGE_PROMPT: &str =
    "Provide query parameters: ?root=<path>&sort=<ASC|DESC> (ASC by default)";

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(
        web::resource("/files")
            .route(web::get().to(list_files))
            .default_service(web::to(|| async { HttpResponse::MethodNotAllowed().finish() })),
    );
}

#[get("/healthz")]
async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "dirsize",
        "version": env!("CARGO_PKG_VERSION"),
        "idle_io_permits": state.scanner.available_permits()
    }))
}

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    root: Option<String>,
    sort: Option<String>,
}

async fn list_files(
    query: web::Query<FilesQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let FilesQuery { root, sort } = query.into_inner();

    let root = match root.as_deref().map(str::trim) {
        Some(root) if !root.is_empty() => root.to_string(),
        _ => {
            return Ok(HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(USAGE_PROMPT))
        }
    };

    // Reject a bad direction before paying for the scan.
    let direction = match sort.as_deref().map(str::trim) {
        Some(sort) if !sort.is_empty() => sort.parse::<SortDirection>()?,
        _ => SortDirection::default(),
    };

    let mut result = state.scanner.scan(root).await?;
    sort_entries(&mut result.entries, direction);

    for entry in &result.entries {
        debug!(
            name = %entry.name,
            size = %entry.human_readable_size(),
            is_dir = entry.is_dir,
            "entry"
        );
    }

    Ok(HttpResponse::Ok().json(result.entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    use crate::config::settings::Settings;
    use crate::core::scanner::Scanner;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState {
            scanner: Scanner::new(Settings {
                max_concurrent_io: 4,
                ..Settings::default()
            }),
        })
    }

    #[actix_web::test]
    async fn missing_root_returns_prompt() {
        let app = test::init_service(App::new().app_data(state()).configure(register)).await;
        let req = test::TestRequest::get().uri("/files").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, USAGE_PROMPT.as_bytes());
    }

    #[actix_web::test]
    async fn non_get_is_method_not_allowed() {
        let app = test::init_service(App::new().app_data(state()).configure(register)).await;
        let req = test::TestRequest::post().uri("/files?root=/tmp").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[actix_web::test]
    async fn invalid_sort_is_rejected_before_scanning() {
        let app = test::init_service(App::new().app_data(state()).configure(register)).await;
        let req = test::TestRequest::get()
            .uri("/files?root=/definitely/not/here&sort=SIDEWAYS")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn missing_directory_is_not_found() {
        let app = test::init_service(App::new().app_data(state()).configure(register)).await;
        let req = test::TestRequest::get()
            .uri("/files?root=/definitely/not/here")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("/definitely/not/here"));
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let app = test::init_service(App::new().app_data(state()).configure(register)).await;
        let req = test::TestRequest::get().uri("/healthz").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["idle_io_permits"], 4);
    }
}
