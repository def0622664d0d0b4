use axum::headers::authorization::Credentials;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{db::UserId, error::AppResult};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,
    pub user_id: UserId,
    /// Session epoch of the user when the token was issued.
    pub epoch: i64,
}

/// Signing material shared by every handler that issues or checks tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8], ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: chrono::Duration::days(ttl_days),
        }
    }

    pub fn generate(&self, user_id: UserId, epoch: i64) -> AppResult<String> {
        let exp = (chrono::Utc::now() + self.ttl).timestamp();
        let claims = Claims {
            exp,
            user_id,
            epoch,
        };
        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let claims =
            jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::new(ALGORITHM))?
                .claims;
        Ok(claims)
    }
}

#[derive(Debug)]
pub struct JWTToken(pub String);

impl Credentials for JWTToken {
    const SCHEME: &'static str = "Token";

    fn decode(value: &axum::http::HeaderValue) -> Option<Self> {
        let mut it = value.to_str().ok()?.split_whitespace();
        let scheme = it.next()?;
        let token = it.next()?;

        if scheme != Self::SCHEME || it.next().is_some() {
            None?
        }

        Some(Self(token.to_string()))
    }

    fn encode(&self) -> axum::http::HeaderValue {
        unreachable!()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::error::AppError;

    #[test]
    fn issued_tokens_verify() {
        let keys = JwtKeys::from_secret(b"test-secret", 30);
        let token = keys.generate(7, 3).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.epoch, 3);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = JwtKeys::from_secret(b"one", 30).generate(1, 0).unwrap();
        let other = JwtKeys::from_secret(b"two", 30);

        assert!(matches!(other.verify(&token), Err(AppError::JwtError(_))));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = JwtKeys::from_secret(b"test-secret", -1);
        let token = keys.generate(1, 0).unwrap();

        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn credentials_require_the_token_scheme() {
        let ok = JWTToken::decode(&HeaderValue::from_static("Token abc.def")).unwrap();
        assert_eq!(ok.0, "abc.def");

        assert!(JWTToken::decode(&HeaderValue::from_static("Bearer abc.def")).is_none());
        assert!(JWTToken::decode(&HeaderValue::from_static("Token a b")).is_none());
        assert!(JWTToken::decode(&HeaderValue::from_static("Token")).is_none());
    }
}
