use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde::Serialize;

use crate::models::ApiResponse;
use crate::utils::error_response;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub struct SystemService;

impl SystemService {
    pub fn new_lazy() -> Self {
        Self
    }

    // 健康检查：确认数据库可以访问
    pub async fn health(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = super::storage_from_request(request)?;

        match storage.count_users().await {
            Ok(_) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                HealthStatus {
                    status: "ok",
                    version: env!("CARGO_PKG_VERSION"),
                },
                "Service is healthy",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }
}
