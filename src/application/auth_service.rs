use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{LoginRequest, RegisterRequest, User};
use crate::infrastructure::security::{hash_password, issue_token, verify_password};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct AuthService<R: UserRepository> {
    user_repository: Arc<R>,
    jwt_secret: String,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(user_repository: Arc<R>, jwt_secret: String) -> Self {
        Self {
            user_repository,
            jwt_secret,
        }
    }

    /// Hashes the password and inserts the user. A duplicate email comes back
    /// from the store as `DomainError::EmailTaken`; no pre-check is made here.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        let password_hash = hash_password(&req.password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        debug!("Saving user to repository");
        let user = self.user_repository.insert(&req.email, &password_hash).await?;

        info!(user_id = user.id, email = %user.email, "User registered successfully");
        Ok(user)
    }

    /// `Ok(None)` means the credentials did not match — an expected outcome,
    /// distinct from `Err`, which is reserved for store or hasher faults.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> Result<Option<String>> {
        let Some(user) = self.user_repository.find_by_email(&req.email).await? else {
            warn!("Unknown email during login");
            return Ok(None);
        };

        let is_valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(user_id = user.id, "Invalid password during login");
            return Ok(None);
        }

        let token = issue_token(user.id, &user.email, &self.jwt_secret).map_err(|e| {
            error!(error = %e, "Failed to issue token");
            DomainError::Internal(format!("Failed to issue token: {}", e))
        })?;

        info!(user_id = user.id, email = %user.email, "Login successful");
        Ok(Some(token))
    }
}
