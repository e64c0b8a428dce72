use crate::application::auth_service::AuthService;
use crate::application::product_service::ProductService;
use crate::data::sqlite::{SqliteProductRepository, SqliteUserRepository};
use crate::domain::error::DomainError;
use crate::domain::product::{CreateProduct, UpdateProduct};
use crate::presentation::middleware::AuthenticatedUser;
use crate::presentation::validation::{FieldErrors, validate_payload};
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

// AppState holding the services
pub struct AppState {
    pub auth_service: Arc<AuthService<SqliteUserRepository>>,
    pub product_service: ProductService<SqliteProductRepository>,
}

// Uniform envelopes: every response carries success + statusCode, failures
// add message and an optional field-error map.
#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    #[serde(rename = "statusCode")]
    status_code: u16,
    message: String,
    errors: Option<FieldErrors>,
}

#[derive(Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub data: T,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
}

// API Error Types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            ApiError::Validation(_) => actix_web::http::StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => actix_web::http::StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => actix_web::http::StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => actix_web::http::StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => actix_web::http::StatusCode::CONFLICT,
            ApiError::Database(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();

        // Client faults log at warn, server faults at error
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => {
                error!(error = %message, status = %status, "Request failed")
            }
            _ => warn!(error = %message, status = %status, "Request rejected"),
        }

        let errors = match self {
            ApiError::Validation(field_errors) => Some(field_errors.clone()),
            _ => None,
        };

        HttpResponse::build(status).json(ErrorEnvelope {
            success: false,
            status_code: status.as_u16(),
            message,
            errors,
        })
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::ProductNotFound) => {
                ApiError::NotFound("Product not found".to_string())
            }
            Some(DomainError::EmailTaken) => {
                ApiError::Conflict("Email already registered".to_string())
            }
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            None => ApiError::Database(err.to_string()),
        }
    }
}

// Malformed JSON bodies short-circuit through the same envelope as a 400.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid request body: {}", err)).into()
}

// AuthenticatedUser extractor
impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        Box::pin(async move {
            user.ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))
        })
    }
}

// Handlers

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

/// Terminal 404 for anything no registered route matched.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound(format!(
        "Route {} {} not found",
        req.method(),
        req.path()
    )))
}

#[instrument(skip(state, req), fields(user_id = user.id))]
pub async fn create_product(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateProduct>,
) -> Result<HttpResponse, ApiError> {
    let payload = req.into_inner();
    validate_payload(&payload)?;

    info!(name = %payload.name, "Creating product");
    let product = state.product_service.create(payload).await.map_err(|e| {
        error!(error = %e, "Failed to create product");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Created().json(DataResponse {
        success: true,
        status_code: 201,
        data: product,
    }))
}

#[instrument(skip(state, _user))]
pub async fn get_products(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let products = state.product_service.get_all().await.map_err(|e| {
        error!(error = %e, "Failed to list products");
        ApiError::from(e)
    })?;

    info!(count = products.len(), "Products listed");
    Ok(HttpResponse::Ok().json(DataResponse {
        success: true,
        status_code: 200,
        data: products,
    }))
}

#[instrument(skip(state, _user), fields(product_id = %*path))]
pub async fn get_product_by_id(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let product = state.product_service.get_by_id(id).await.map_err(|e| {
        warn!(product_id = id, error = %e, "Failed to get product");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(DataResponse {
        success: true,
        status_code: 200,
        data: product,
    }))
}

#[instrument(skip(state, req), fields(product_id = %*path, user_id = user.id))]
pub async fn update_product(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<UpdateProduct>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let payload = req.into_inner();
    validate_payload(&payload)?;

    let product = state
        .product_service
        .update(id, payload)
        .await
        .map_err(|e| {
            warn!(product_id = id, error = %e, "Failed to update product");
            ApiError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(DataResponse {
        success: true,
        status_code: 200,
        data: product,
    }))
}

#[instrument(skip(state), fields(product_id = %*path, user_id = user.id))]
pub async fn delete_product(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.product_service.remove(id).await.map_err(|e| {
        warn!(product_id = id, error = %e, "Failed to delete product");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        success: true,
        status_code: 200,
        message: "Product deleted".to_string(),
    }))
}
