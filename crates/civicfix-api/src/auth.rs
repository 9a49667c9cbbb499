use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use rand_core::OsRng;
use tracing::{error, info, warn};

use civicfix_db::Database;
use civicfix_db::models::UserRow;
use civicfix_types::api::{LoginRequest, LoginResponse, Role, SignupRequest, SignupResponse};

use crate::blocking;
use crate::middleware::{SIGN_IN_PATH, SessionConfig, removal_cookie};
use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub storage: Storage,
    pub session: SessionConfig,
    /// Largest request body accepted, attachments included.
    pub max_upload_bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Emails are matched case-insensitively and stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// Checks a password against a stored PHC string. A hash this build cannot
/// parse never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        warn!("Stored password hash is not a recognised PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Creates an account. Blank fields and already registered emails are
/// rejected before anything is written.
pub fn register(db: &Database, username: &str, email: &str, password: &str) -> Result<UserRow, AuthError> {
    let username = username.trim();
    let email = normalize_email(email);
    if username.is_empty() || email.is_empty() || password.trim().is_empty() {
        return Err(AuthError::MissingFields);
    }

    if db.get_user_by_email(&email)?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let password_hash = hash_password(password)?;

    // The UNIQUE constraint still catches a signup racing this one
    let id = db
        .create_user(username, &email, &password_hash)?
        .ok_or(AuthError::EmailTaken)?;

    Ok(UserRow {
        id,
        username: username.to_string(),
        email,
        password: password_hash,
        is_admin: false,
    })
}

/// Verifies credentials. An unknown email and a wrong password are reported
/// the same way.
pub fn authenticate(db: &Database, email: &str, password: &str) -> Result<UserRow, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    let user = db
        .get_user_by_email(&email)?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &user.password) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}

/// Provisions the administrator account. Leaves an existing row with the
/// same email untouched. Returns whether a row was created.
pub fn seed_admin(db: &Database, username: &str, email: &str, password: &str) -> anyhow::Result<bool> {
    let email = normalize_email(email);
    if let Some(existing) = db.get_user_by_email(&email)? {
        if !existing.is_admin {
            warn!(
                "Admin email belongs to regular user {}; administrator sign-in is unavailable",
                existing.id
            );
        }
        return Ok(false);
    }

    let password_hash = hash_password(password)?;
    db.seed_admin(username, &email, &password_hash)
}

fn role_of(user: &UserRow) -> Role {
    if user.is_admin { Role::Admin } else { Role::User }
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, StatusCode> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            info!("Signup rejected: {}", rejection.body_text());
            return Ok(Json(SignupResponse {
                success: false,
                message: Some(AuthError::MissingFields.to_string()),
            })
            .into_response());
        }
    };

    let db = state.db.clone();
    let outcome = blocking(move || {
        Ok(register(&db, &req.username, &req.email, &req.password))
    })
    .await?;

    let user = match outcome {
        Ok(user) => user,
        Err(AuthError::Internal(e)) => {
            error!("Signup failed: {:#}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        Err(e) => {
            info!("Signup rejected: {}", e);
            return Ok(Json(SignupResponse {
                success: false,
                message: Some(e.to_string()),
            })
            .into_response());
        }
    };

    let cookie = state
        .session
        .issue(user.id, &user.username, &user.email, Role::User)
        .map_err(|e| {
            error!("Failed to issue session: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!("Registered user {}", user.id);

    Ok((
        jar.add(cookie),
        Json(SignupResponse {
            success: true,
            message: None,
        }),
    )
        .into_response())
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, StatusCode> {
    let Ok(Json(req)) = body else {
        warn!("Rejected login attempt with malformed body");
        return Ok(login_failed());
    };

    let db = state.db.clone();
    let outcome = blocking(move || Ok(authenticate(&db, &req.email, &req.password))).await?;

    let user = match outcome {
        Ok(user) => user,
        Err(AuthError::Internal(e)) => {
            error!("Login failed: {:#}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        Err(_) => {
            warn!("Rejected login attempt");
            return Ok(login_failed());
        }
    };

    let role = role_of(&user);
    let cookie = state
        .session
        .issue(user.id, &user.username, &user.email, role)
        .map_err(|e| {
            error!("Failed to issue session: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!("User {} signed in as {:?}", user.id, role);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            role: Some(role),
        }),
    )
        .into_response())
}

fn login_failed() -> Response {
    Json(LoginResponse {
        success: false,
        role: None,
    })
    .into_response()
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(removal_cookie()), Redirect::to(SIGN_IN_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("auth.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn register_normalizes_email_and_rejects_duplicates() {
        let (_dir, db) = open_temp();

        let user = register(&db, " alice ", "A@X.com", "p1").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "a@x.com");

        let again = register(&db, "alice2", "a@x.COM ", "other");
        assert!(matches!(again, Err(AuthError::EmailTaken)));

        // The first password still works, the second was never stored
        assert!(authenticate(&db, "a@x.com", "p1").is_ok());
        assert!(authenticate(&db, "a@x.com", "other").is_err());
    }

    #[test]
    fn register_requires_every_field() {
        let (_dir, db) = open_temp();

        for (u, e, p) in [("", "a@x.com", "p"), ("a", "  ", "p"), ("a", "a@x.com", "   ")] {
            assert!(matches!(register(&db, u, e, p), Err(AuthError::MissingFields)));
        }
        assert!(db.get_user_by_email("a@x.com").unwrap().is_none());
    }

    #[test]
    fn authenticate_failures_are_indistinguishable() {
        let (_dir, db) = open_temp();
        register(&db, "bob", "bob@x.com", "right").unwrap();

        let wrong_password = authenticate(&db, "bob@x.com", "wrong").unwrap_err();
        let unknown_email = authenticate(&db, "nobody@x.com", "right").unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[test]
    fn seeded_admin_authenticates_with_admin_role() {
        let (_dir, db) = open_temp();

        assert!(seed_admin(&db, "Admin", "Admin@CivicFix.com", "admin123").unwrap());
        assert!(!seed_admin(&db, "Admin", "admin@civicfix.com", "changed").unwrap());

        let admin = authenticate(&db, "admin@civicfix.com", "admin123").unwrap();
        assert_eq!(role_of(&admin), Role::Admin);
        assert_eq!(admin.username, "Admin");
    }

    #[test]
    fn seed_admin_leaves_existing_user_alone() {
        let (_dir, db) = open_temp();
        register(&db, "early", "admin@civicfix.com", "mine").unwrap();

        assert!(!seed_admin(&db, "Admin", "admin@civicfix.com", "admin123").unwrap());

        let user = authenticate(&db, "admin@civicfix.com", "mine").unwrap();
        assert_eq!(role_of(&user), Role::User);
        assert!(authenticate(&db, "admin@civicfix.com", "admin123").is_err());
    }

    #[test]
    fn legacy_mixed_case_email_still_signs_in() {
        let (_dir, db) = open_temp();
        let hash = hash_password("pw").unwrap();
        db.create_user("old", "Old.User@X.com", &hash).unwrap();

        let user = authenticate(&db, "old.user@x.com", "pw").unwrap();
        assert_eq!(user.username, "old");
        assert!(matches!(
            register(&db, "new", "OLD.USER@x.com", "pw2"),
            Err(AuthError::EmailTaken)
        ));
    }

    #[test]
    fn unparseable_hash_never_verifies() {
        assert!(!verify_password("secret", "pbkdf2:sha256:260000$salt$deadbeef"));
        let hash = hash_password("secret").unwrap();
        assert!(verify_password("secret", &hash));
    }
}
