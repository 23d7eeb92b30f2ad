use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    state::AppState,
    users::{
        dto::{AddUserRequest, AuthResponse, CredentialsRequest, PublicUser},
        error::UserError,
        jwt::{AdminUser, AuthUser, JwtKeys},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/me", get(get_me))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", post(add_user))
        .route("/admin/users/:id", delete(remove_user))
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{2,49}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

fn validate_credentials(username: &str, password: &str) -> Result<(), (StatusCode, String)> {
    if !is_valid_username(username) {
        warn!(%username, "invalid username");
        return Err((StatusCode::BAD_REQUEST, "Invalid username".into()));
    }
    if password.len() < 8 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }
    Ok(())
}

fn map_user_error(e: UserError) -> (StatusCode, String) {
    match e {
        UserError::DuplicateUsername => (
            StatusCode::CONFLICT,
            "Username already exists. Please choose a different username.".into(),
        ),
        UserError::NotFound => (StatusCode::NOT_FOUND, "User not found".into()),
        UserError::Storage(e) => {
            error!(error = %e, "user store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".into())
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    validate_credentials(&payload.username, &payload.password)?;

    let user = state
        .users
        .create_user(&payload.username, &payload.password, false)
        .await
        .map_err(map_user_error)?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id, user.is_admin).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    info!(user_id = user.id, username = %user.username, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    // One generic message for unknown-user and wrong-password alike.
    let user = match state
        .users
        .verify_credentials(&payload.username, &payload.password)
        .await
    {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(username = %payload.username, "login rejected");
            return Err((
                StatusCode::UNAUTHORIZED,
                "Invalid username or password. Please try again.".into(),
            ));
        }
        Err(e) => return Err(map_user_error(e)),
    };

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id, user.is_admin).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = state
        .users
        .get_user_by_id(user_id)
        .await
        .map_err(map_user_error)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn add_user(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<AddUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    validate_credentials(&payload.username, &payload.password)?;

    let user = state
        .users
        .create_user(&payload.username, &payload.password, payload.is_admin)
        .await
        .map_err(map_user_error)?;

    info!(admin_id, user_id = user.id, "user added by admin");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn remove_user(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.users.remove_user(id).await.map_err(map_user_error)?;
    info!(admin_id, user_id = id, "user removed by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_pattern_accepts_ordinary_names() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("bob_42"));
        assert!(is_valid_username("a.b-c"));
    }

    #[test]
    fn username_pattern_rejects_bad_names() {
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(".leading-dot"));
        assert!(!is_valid_username(&"x".repeat(51)));
    }

    #[test]
    fn public_user_hides_password_hash() {
        let response = PublicUser {
            id: 1,
            username: "alice".into(),
            is_admin: false,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("alice"));
        assert!(!json.contains("password"));
    }
}
