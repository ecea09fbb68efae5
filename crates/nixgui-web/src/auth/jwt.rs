use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use nixgui_core::User;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub role: String,
    pub exp: u64,
}

impl Claims {
    pub fn user(&self) -> User {
        User::new(&self.username, &self.role)
    }
}

/// Issues and checks HS256 bearer tokens with one process-wide secret.
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs a token for `user` valid for the configured TTL.
    pub fn issue_for(&self, user: &User) -> anyhow::Result<(String, u64)> {
        self.issue(&user.username, &user.role, self.ttl)
    }

    /// Returns the token and its absolute expiry in Unix seconds.
    pub fn issue(&self, username: &str, role: &str, ttl: Duration) -> anyhow::Result<(String, u64)> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let expires_at = now.saturating_add(ttl.as_secs());

        let claims = Claims {
            username: username.to_string(),
            role: role.to_string(),
            exp: expires_at,
        };

        Ok((self.sign(&claims)?, expires_at))
    }

    pub fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Fails on a bad signature, malformed token or passed expiry alike.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(token_data.claims)
    }
}
