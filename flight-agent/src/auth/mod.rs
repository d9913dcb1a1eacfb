//! User accounts and JWT sessions.
//!
//! App users sign up with email and password and receive an HS256 token
//! that the mobile client sends back as `Authorization: Bearer <token>`.

mod error;
mod jwt;
mod password;
mod users;

pub use error::{AuthError, FieldErrors};
pub use jwt::{AuthConfig, Claims, TokenService, bearer_token};
pub use password::Passwords;
pub use users::{
    Accounts, LoginRequest, MIN_PASSWORD_LEN, Session, SignupRequest, User, UserProfile, UserStore,
};
