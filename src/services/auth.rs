//! Registration, login and token handling

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{AuthResponse, LoginRequest, RegisterUser, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Create an account and issue a token for it
    pub async fn register(&self, request: RegisterUser) -> AppResult<AuthResponse> {
        let request = RegisterUser {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            ..request
        };
        request.validate()?;

        if self.repository.users.get_by_email(&request.email).await?.is_some() {
            return Err(AppError::Validation("User already exists".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: request.name,
            email: request.email,
            password: self.hash_password(&request.password)?,
            photo_url: request.photo_url.filter(|p| !p.trim().is_empty()),
            created_at: Utc::now(),
        };

        // Lost race on the unique email index
        let user = match self.repository.users.insert(user).await {
            Err(AppError::Conflict(msg)) => return Err(AppError::Validation(msg)),
            other => other?,
        };
        tracing::info!(user_id = %user.id, "User registered");

        let token = self.create_token(user.id)?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Check credentials and issue a token
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        let user = self
            .repository
            .users
            .get_by_email(&email)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("No account found with this email address".to_string())
            })?;

        if !self.verify_password(&user, &request.password)? {
            return Err(AppError::BadRequest(
                "Incorrect password. Please try again".to_string(),
            ));
        }

        let token = self.create_token(user.id)?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Validate a bearer token and return the acting user id
    pub fn verify_token(&self, token: &str) -> AppResult<Uuid> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map(|claims| claims.user_id)
            .map_err(|e| {
                tracing::debug!("Rejected token: {}", e);
                AppError::Authentication("Token is not valid".to_string())
            })
    }

    fn create_token(&self, user_id: Uuid) -> AppResult<String> {
        UserClaims::new(user_id, Utc::now(), self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(Repository::in_memory(), AuthConfig::default())
    }

    fn register_request(email: &str) -> RegisterUser {
        RegisterUser {
            name: "Ada".into(),
            email: email.into(),
            password: "secret".into(),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let svc = service();
        let registered = svc.register(register_request("Ada@Example.com")).await.unwrap();
        assert_eq!(registered.user.email, "ada@example.com");
        assert_eq!(svc.verify_token(&registered.token).unwrap(), registered.user.id);

        let logged_in = svc
            .login(LoginRequest {
                email: "ada@example.com".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let svc = service();
        svc.register(register_request("ada@example.com")).await.unwrap();
        let err = svc.register(register_request("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "User already exists"));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let svc = service();
        svc.register(register_request("ada@example.com")).await.unwrap();

        let unknown = svc
            .login(LoginRequest { email: "bob@example.com".into(), password: "secret".into() })
            .await
            .unwrap_err();
        assert!(matches!(unknown, AppError::BadRequest(_)));

        let wrong = svc
            .login(LoginRequest { email: "ada@example.com".into(), password: "nope".into() })
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::BadRequest(ref m) if m.starts_with("Incorrect password")));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(service().verify_token("abc.def.ghi"), Err(AppError::Authentication(_))));
    }
}
