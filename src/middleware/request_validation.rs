/*!
 * Request Validation Middleware
 *
 * Content-type and body-size checks on mutating requests.
 * Pattern-based SQL-injection/XSS/path-traversal scanning is deliberately not
 * implemented here — parameterized queries and serde-typed bodies already
 * close those holes at the right layer; regex sniffing of request bodies
 * would just be noise with false positives.
 */

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Maximum allowed request body size (10 MB)
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Validation configuration
#[derive(Clone, Debug)]
pub struct ValidationConfig {
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Allowed content types for POST/PUT/PATCH requests
    pub allowed_content_types: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_body_size: MAX_BODY_SIZE,
            allowed_content_types: vec![
                "application/json".to_string(),
                "multipart/form-data".to_string(),
            ],
        }
    }
}

/// Validation error response
#[derive(Debug)]
pub enum ValidationError {
    /// Request body too large
    BodyTooLarge { size: usize, max: usize },
    /// Invalid content type
    InvalidContentType { received: String },
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ValidationError::BodyTooLarge { size, max } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Request body too large: {} bytes (max: {} bytes)", size, max),
            ),
            ValidationError::InvalidContentType { received } => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Invalid content type: {}", received),
            ),
        };

        (status, message).into_response()
    }
}

/// Validate request headers and path
pub fn validate_request_metadata(
    method: &Method,
    headers: &HeaderMap,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    if matches!(method, &Method::POST | &Method::PUT | &Method::PATCH) && !config.allowed_content_types.is_empty() {
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        // Extract base content type (ignore charset and other parameters)
        let base_type = content_type.split(';').next().unwrap_or("").trim();

        if !base_type.is_empty()
            && !config
                .allowed_content_types
                .iter()
                .any(|allowed| base_type.starts_with(allowed))
        {
            return Err(ValidationError::InvalidContentType {
                received: base_type.to_string(),
            });
        }
    }

    Ok(())
}

/// Request validation middleware: content-type allowlist plus body-size cap.
pub async fn request_validation_middleware(
    request: Request,
    next: Next,
) -> Result<Response, ValidationError> {
    request_validation_middleware_with_config(ValidationConfig::default(), request, next).await
}

/// Request validation middleware with custom configuration
pub async fn request_validation_middleware_with_config(
    config: ValidationConfig,
    request: Request,
    next: Next,
) -> Result<Response, ValidationError> {
    let (parts, body) = request.into_parts();

    validate_request_metadata(&parts.method, &parts.headers, &config)?;

    if matches!(parts.method, Method::GET | Method::HEAD | Method::OPTIONS | Method::DELETE) {
        let request = Request::from_parts(parts, body);
        return Ok(next.run(request).await);
    }

    let bytes: Bytes = match axum::body::to_bytes(body, config.max_body_size).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return Err(ValidationError::BodyTooLarge {
                size: config.max_body_size + 1,
                max: config.max_body_size,
            });
        }
    };

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}
