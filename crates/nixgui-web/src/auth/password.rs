use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use nixgui_core::{User, UserStore};

use crate::config::UserConfig;

pub fn verify_password(hash: &str, password: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[allow(dead_code)]
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Users declared as `[[users]]` in the server config, checked with argon2.
pub struct ConfiguredUserStore {
    users: Vec<UserConfig>,
}

impl ConfiguredUserStore {
    pub fn new(users: Vec<UserConfig>) -> Self {
        Self { users }
    }
}

impl UserStore for ConfiguredUserStore {
    fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        let entry = self.users.iter().find(|u| u.username == username)?;

        match verify_password(&entry.password_hash, password) {
            Ok(true) => Some(User::new(&entry.username, &entry.role)),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!("Stored hash for {username} is unusable: {e}");
                None
            }
        }
    }
}
