use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, Json};
use rand_core::OsRng;

use crate::{
    error::AppError,
    middleware::{issue_token, CurrentUser},
    models::{AuthResponse, LoginRequest, RegisterUser, User},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterUser,
    responses(
        (status = 200, description = "User created successfully", body = User),
        (status = 400, description = "Missing field or email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUser>,
) -> Result<Json<User>, AppError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::ValidationError(
            "Name, email and password are required".to_string(),
        ));
    }

    let user_exists = sqlx::query("SELECT 1 FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(&state.pool)
        .await?;

    if user_exists.is_some() {
        return Err(AppError::ValidationError("Email already registered".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .to_string();

    let id = sqlx::query("INSERT INTO users (name, email, hashed_password) VALUES (?, ?, ?)")
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&password_hash)
        .execute(&state.pool)
        .await?
        .last_insert_rowid();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    let parsed_hash = PasswordHash::new(&user.hashed_password)
        .map_err(|_| AppError::InternalError("Invalid password hash in DB".to_string()))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::AuthError("Invalid credentials".to_string()))?;

    let token = issue_token(user.id, &state.jwt_secret)?;

    Ok(Json(AuthResponse { token, user }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Caller profile", body = User),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
