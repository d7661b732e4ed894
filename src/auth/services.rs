use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        password::{burn_verification, hash_password, verify_password},
        repo_types::NewUser,
    },
    db::StoreError,
    error::{AppError, AppResult},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 1024;
const MAX_NAME_LEN: usize = 100;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= 255 && EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required_name(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!("{field} is too long")));
    }
    Ok(value.to_string())
}

/// Creates an account and returns it together with a fresh token.
///
/// The lookup before the insert only gives an early answer; the unique index
/// on `users.email` is what actually rejects a concurrent duplicate.
#[instrument(skip(state, req), fields(email = %normalize_email(&req.email)))]
pub async fn register(state: &AppState, req: RegisterRequest) -> AppResult<AuthResponse> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        warn!("invalid email");
        return Err(AppError::validation("invalid email"));
    }
    let password_len = req.password.chars().count();
    if password_len < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation("password is too long"));
    }
    let first_name = required_name(&req.first_name, "first_name")?;
    let last_name = required_name(&req.last_name, "last_name")?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!("email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task failed")??;

    let user = match state
        .users
        .create(NewUser {
            email,
            password_hash,
            first_name,
            last_name,
        })
        .await
    {
        Ok(u) => u,
        Err(StoreError::Conflict) => {
            warn!("email registered concurrently");
            return Err(AppError::DuplicateEmail);
        }
        Err(e) => return Err(e.into()),
    };

    let token = state.tokens.issue(user.id)?;
    info!(user_id = %user.id, "user registered");
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// Unknown email, wrong password and disabled account all end in the same
/// `InvalidCredentials`, after the same amount of hashing work.
#[instrument(skip(state, req))]
pub async fn login(state: &AppState, req: LoginRequest) -> AppResult<AuthResponse> {
    let email = normalize_email(&req.email);
    let user = if is_valid_email(&email) {
        state.users.find_by_email(&email).await?
    } else {
        None
    };

    let password = req.password;
    let (user, ok) = tokio::task::spawn_blocking(move || match user {
        Some(u) if u.is_active => {
            let ok = verify_password(&password, &u.password_hash);
            (Some(u), ok)
        }
        other => {
            burn_verification(&password);
            (other, false)
        }
    })
    .await
    .context("password verification task failed")?;

    let mut user = match (user, ok) {
        (Some(u), true) => u,
        (found, _) => {
            warn!(known_user = found.is_some(), "login rejected");
            return Err(AppError::InvalidCredentials);
        }
    };

    let now = state.clock.now();
    state.users.record_login(user.id, now).await?;
    user.last_login = Some(now);

    let token = state.tokens.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

#[instrument(skip(state))]
pub async fn profile(state: &AppState, user_id: Uuid) -> AppResult<PublicUser> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(user.into())
}
