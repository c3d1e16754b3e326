use std::sync::Arc;

use tracing::{debug, error, info, warn};

use shared_config::AppConfig;
use shared_database::{AppState, AppointmentStore, NewUser, UserAccount};
use shared_utils::jwt::issue_token;

use crate::models::{AccountError, AuthResponse, LoginRequest, RegisterRequest};
use crate::services::password::PasswordService;

pub struct AccountService {
    store: Arc<dyn AppointmentStore>,
    config: Arc<AppConfig>,
}

impl AccountService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            config: state.config.clone(),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AccountError> {
        let role = request.validate()?;
        let email = request.email.trim().to_lowercase();

        if self.store.find_user_by_email(&email).await?.is_some() {
            debug!("Registration refused, {} already exists", email);
            return Err(AccountError::EmailTaken);
        }

        let password_hash = PasswordService::hash_password(&request.password).map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            AccountError::Hashing(e.to_string())
        })?;

        let account = self
            .store
            .create_user(NewUser {
                name: request.name.trim().to_string(),
                email,
                password_hash,
                role,
            })
            .await?;

        info!("Registered {} account {}", account.role, account.id);
        self.session_for(account)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AccountError> {
        let email = request.email.trim().to_lowercase();

        let Some(account) = self.store.find_user_by_email(&email).await? else {
            debug!("Login failed for unknown email");
            return Err(AccountError::InvalidCredentials);
        };

        let verified = PasswordService::verify_password(&request.password, &account.password_hash)
            .unwrap_or_else(|e| {
                warn!("Stored password hash for {} is unreadable: {:?}", account.id, e);
                false
            });
        if !verified {
            debug!("Login failed for {}", account.id);
            return Err(AccountError::InvalidCredentials);
        }

        info!("User {} logged in", account.id);
        self.session_for(account)
    }

    fn session_for(&self, account: UserAccount) -> Result<AuthResponse, AccountError> {
        let access_token = issue_token(
            account.id,
            &account.email,
            account.role,
            &self.config.jwt_secret,
            self.config.jwt_expiry_hours,
        )
        .map_err(AccountError::Token)?;

        Ok(AuthResponse {
            access_token,
            user: account.into(),
        })
    }
}
