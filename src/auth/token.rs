use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthSettings;
use crate::error::AppError;

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Token lifetime: `remember` selects the long one.
pub fn token_lifetime(settings: &AuthSettings, remember: bool) -> Duration {
    if remember {
        Duration::days(settings.remember_ttl_days)
    } else {
        Duration::hours(settings.token_ttl_hours)
    }
}

/// Issues an HS256 token for `user_id` valid from `now`.
pub fn generate_token_at(
    settings: &AuthSettings,
    user_id: i32,
    remember: bool,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let expiration = now
        .checked_add_signed(token_lifetime(settings, remember))
        .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

pub fn generate_token(
    settings: &AuthSettings,
    user_id: i32,
    remember: bool,
) -> Result<String, AppError> {
    generate_token_at(settings, user_id, remember, Utc::now())
}

/// Verifies the signature and expiry of `token` and returns its claims.
///
/// Every failure (malformed, wrong signature, expired) is `AppError::Unauthorized`.
pub fn verify_token(settings: &AuthSettings, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secret: &str) -> AuthSettings {
        AuthSettings::new(secret)
    }

    #[test]
    fn test_token_generation_and_verification() {
        let settings = settings("test_secret_for_gen_verify");
        let token = generate_token(&settings, 1, false).unwrap();
        let claims = verify_token(&settings, &token).unwrap();
        assert_eq!(claims.sub, 1);
    }

    #[test]
    fn test_remember_extends_lifetime() {
        let settings = settings("test_secret_for_remember");
        let now = Utc::now();

        let short = generate_token_at(&settings, 7, false, now).unwrap();
        let long = generate_token_at(&settings, 7, true, now).unwrap();
        let short_exp = verify_token(&settings, &short).unwrap().exp as i64;
        let long_exp = verify_token(&settings, &long).unwrap().exp as i64;

        assert_eq!(short_exp, (now + Duration::hours(24)).timestamp());
        assert_eq!(long_exp, (now + Duration::days(30)).timestamp());
    }

    #[test]
    fn test_token_expiration() {
        let settings = settings("test_secret_for_expiration");
        let issued = Utc::now() - Duration::days(2);
        let expired_token = generate_token_at(&settings, 2, false, issued).unwrap();

        match verify_token(&settings, &expired_token) {
            Err(AppError::Unauthorized(msg)) => {
                assert!(msg.contains("ExpiredSignature"), "unexpected message: {}", msg);
            }
            Ok(_) => panic!("Token should have been invalid due to expiration"),
            Err(e) => panic!("Unexpected error type for expired token: {:?}", e),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let token = generate_token(&settings("one_secret"), 3, false).unwrap();

        match verify_token(&settings("a_completely_different_secret"), &token) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("InvalidSignature")),
            Ok(_) => panic!("Token should have been invalid due to signature mismatch"),
            Err(e) => panic!("Unexpected error type for invalid signature: {:?}", e),
        }
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        assert!(matches!(
            verify_token(&settings("secret"), "not-a-token"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
