use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest,
            RegisterResponse,
        },
        repo_types::User,
        services::{hash_password, verify_password, AuthUser, JwtKeys},
    },
    error::{unique_violation_field, ApiError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    payload.name = payload.name.trim().to_string();
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    payload.validate()?;

    if User::exists_by_email_or_username(&state.db, &payload.email, &payload.username).await? {
        warn!(email = %payload.email, username = %payload.username, "registration conflict");
        return Err(ApiError::Conflict(
            "User with this email or username already exists".into(),
        ));
    }

    let hash = hash_password(&payload.password)?;

    let user = match User::create(
        &state.db,
        &payload.name,
        &payload.username,
        &payload.email,
        &hash,
    )
    .await
    {
        Ok(u) => u,
        // Lost the existence-check race; the unique indexes are authoritative.
        Err(e)
            if e.downcast_ref::<sqlx::Error>()
                .and_then(unique_violation_field)
                .is_some() =>
        {
            warn!(email = %payload.email, "registration conflict on insert");
            return Err(ApiError::Conflict(
                "User with this email or username already exists".into(),
            ));
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".into(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    payload.validate()?;

    // Unknown email and wrong password fall through to the same response.
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id, &user.email)?;
    let refresh_token = keys.sign_refresh(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthenticated)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    // Issue a new pair
    let access_token = keys.sign_access(user.id, &user.email)?;
    let refresh_token = keys.sign_refresh(user.id, &user.email)?;

    Ok(Json(AuthResponse {
        message: "Token refreshed".into(),
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, auth.id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    Ok(Json(user.into()))
}
