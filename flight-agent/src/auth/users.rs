//! App user accounts.
//!
//! Users live in an in-process store keyed by id, with a secondary index on
//! normalized email. [`Accounts`] layers signup, login and token checks on
//! top of it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{AuthError, FieldErrors};
use super::jwt::TokenService;
use super::password::Passwords;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// A stored account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Signup form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub name: String,
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A freshly issued token with the user it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Default)]
struct UserTable {
    by_id: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

/// Thread-safe user store.
#[derive(Clone, Default)]
pub struct UserStore {
    inner: Arc<RwLock<UserTable>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new user. Fails if the email is already registered.
    pub async fn insert(
        &self,
        email: &str,
        name: &str,
        password_hash: String,
    ) -> Result<User, AuthError> {
        let key = normalize_email(email);
        let mut guard = self.inner.write().await;
        if guard.by_email.contains_key(&key) {
            return Err(AuthError::EmailTaken);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: key.clone(),
            name: name.trim().to_string(),
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        guard.by_email.insert(key, user.id);
        guard.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Option<User> {
        self.inner.read().await.by_id.get(&id).cloned()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        let guard = self.inner.read().await;
        let id = guard.by_email.get(&normalize_email(email))?;
        guard.by_id.get(id).cloned()
    }

    pub async fn email_exists(&self, email: &str) -> bool {
        self.inner
            .read()
            .await
            .by_email
            .contains_key(&normalize_email(email))
    }

    /// Enable or disable an account. Returns false if the user is unknown.
    #[cfg(test)]
    pub async fn set_active(&self, id: Uuid, active: bool) -> bool {
        let mut guard = self.inner.write().await;
        match guard.by_id.get_mut(&id) {
            Some(user) => {
                user.is_active = active;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A deliberately loose shape check: `local@domain.tld`.
fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Signup, login and token checks.
#[derive(Clone)]
pub struct Accounts {
    users: UserStore,
    passwords: Passwords,
    tokens: TokenService,
}

impl Accounts {
    pub fn new(users: UserStore, passwords: Passwords, tokens: TokenService) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    /// Register a new account and log it in.
    pub async fn signup(&self, req: &SignupRequest) -> Result<Session, AuthError> {
        validate_signup(req)?;
        if self.users.email_exists(&req.email).await {
            return Err(AuthError::EmailTaken);
        }

        let hash = self.passwords.hash(&req.password)?;
        let user = self.users.insert(&req.email, &req.name, hash).await?;
        info!(user_id = %user.id, "account created");

        self.session(&user)
    }

    /// Check credentials and issue a token.
    pub async fn login(&self, req: &LoginRequest) -> Result<Session, AuthError> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(AuthError::field(
                "non_field_errors",
                "Must include email and password",
            ));
        }

        let Some(user) = self.users.find_by_email(&req.email).await else {
            return Err(AuthError::InvalidCredentials);
        };
        if !self.passwords.verify(&req.password, &user.password_hash) {
            warn!(user_id = %user.id, "failed login");
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.session(&user)
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;
        self.users
            .get(claims.user_id)
            .await
            .ok_or(AuthError::InvalidToken)
    }

    fn session(&self, user: &User) -> Result<Session, AuthError> {
        Ok(Session {
            token: self.tokens.issue(user.id, &user.email)?,
            user: UserProfile::from(user),
        })
    }
}

fn validate_signup(req: &SignupRequest) -> Result<(), AuthError> {
    let mut errors = FieldErrors::new();
    let mut push = |field: &str, message: &str| {
        errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    };

    if req.email.trim().is_empty() {
        push("email", "This field may not be blank.");
    } else if !looks_like_email(&req.email) {
        push("email", "Enter a valid email address.");
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        push("password", "Ensure this field has at least 6 characters.");
    }
    if req.name.trim().is_empty() {
        push("name", "This field may not be blank.");
    }
    if req.password != req.confirm_password {
        push("non_field_errors", "Passwords do not match");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(errors))
    }
}
