pub mod attendance;
pub mod system;

pub use attendance::AttendanceService;
pub use system::SystemService;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{HttpRequest, Result as ActixResult, web};

use crate::storage::Storage;

/// 调用方指定单次数据访问超时（毫秒）的请求头
pub const TIMEOUT_HEADER: &str = "x-timeout-ms";

const MAX_REQUEST_TIMEOUT_MS: u64 = 60_000;

fn request_timeout(request: &HttpRequest) -> Option<Duration> {
    request
        .headers()
        .get(TIMEOUT_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(|ms| Duration::from_millis(ms.min(MAX_REQUEST_TIMEOUT_MS)))
}

/// 从 app data 取出存储句柄，并应用请求头中的超时
pub(crate) fn storage_from_request(request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
    let storage = request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            actix_web::error::ErrorInternalServerError("Storage not found in app data")
        })?;

    Ok(match request_timeout(request) {
        Some(timeout) => storage.with_timeout(timeout),
        None => storage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_request_timeout_header() {
        let req = TestRequest::default()
            .insert_header((TIMEOUT_HEADER, "250"))
            .to_http_request();
        assert_eq!(request_timeout(&req), Some(Duration::from_millis(250)));

        let req = TestRequest::default()
            .insert_header((TIMEOUT_HEADER, "999999"))
            .to_http_request();
        assert_eq!(
            request_timeout(&req),
            Some(Duration::from_millis(MAX_REQUEST_TIMEOUT_MS))
        );

        let req = TestRequest::default()
            .insert_header((TIMEOUT_HEADER, "soon"))
            .to_http_request();
        assert_eq!(request_timeout(&req), None);

        assert_eq!(request_timeout(&TestRequest::default().to_http_request()), None);
    }
}
