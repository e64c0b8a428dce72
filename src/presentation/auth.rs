use crate::domain::user::{LoginRequest, RegisterRequest};
use crate::presentation::handlers::{ApiError, AppState};
use crate::presentation::validation::validate_payload;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{error, info, instrument};

/// Public view of a user: the stored hash never leaves the process.
#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[instrument(skip(state, req))]
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = req.into_inner();
    validate_payload(&payload)?;

    info!(email = %payload.email, "Registration request received");
    let user = state.auth_service.register(payload).await.map_err(|e| {
        error!(error = %e, "Failed to register user");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(RegisterResponse {
        id: user.id,
        email: user.email,
    }))
}

#[instrument(skip(state, req))]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = req.into_inner();
    validate_payload(&payload)?;

    info!(email = %payload.email, "Login request received");
    let token = state.auth_service.login(payload).await.map_err(|e| {
        error!(error = %e, "Failed to login");
        ApiError::from(e)
    })?;

    match token {
        Some(token) => Ok(HttpResponse::Ok().json(LoginResponse { token })),
        None => Err(ApiError::Unauthorized("Invalid credentials".to_string())),
    }
}
