use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    error::AppError,
    models::{Claims, User},
    AppState,
};

/// Issued tokens live for 24 hours.
const TOKEN_TTL_SECS: u64 = 60 * 60 * 24;

pub fn issue_token(user_id: i64, secret: &str) -> Result<String, AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .as_secs();

    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + TOKEN_TTL_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token creation failed: {}", e)))
}

fn decode_user_id(token: &str, secret: &str) -> Result<i64, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthError(format!("Invalid token: {}", e)))?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
}

/// Authenticated caller, resolved from the `Authorization` header. The header
/// may carry the raw token or a `Bearer <token>` prefix.
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::AuthError("Missing Authorization header".to_string()))?
            .to_str()
            .map_err(|_| AppError::AuthError("Invalid Authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").unwrap_or(auth_header);

        let state = AppState::from_ref(state);
        let user_id = decode_user_id(token, &state.jwt_secret)?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&state.pool)
            .await
            .map_err(AppError::SqlxError)?;

        if let Some(user) = user {
            Ok(CurrentUser(user))
        } else {
            Err(AppError::AuthError("User not found".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_user_id() {
        let token = issue_token(42, "test-secret").unwrap();
        assert_eq!(decode_user_id(&token, "test-secret").unwrap(), 42);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(42, "test-secret").unwrap();
        let err = decode_user_id(&token, "other-secret").unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }
}
