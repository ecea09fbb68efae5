//! Users and credential checking.

use serde::{Deserialize, Serialize};

/// Summary of an authenticated user, as embedded in tokens and responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: String,
}

impl User {
    pub fn new(username: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
        }
    }
}

/// Source of truth for login decisions.
///
/// Implementations return the matching [`User`] when the pair is accepted
/// and `None` otherwise; callers never learn why a pair was refused.
pub trait UserStore: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> Option<User>;
}

pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORDS: &[&str] = &["testpass", "changeme"];
pub const DEMO_ROLE: &str = "admin";

/// Stand-in credential set: `admin` with either demo password.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoUserStore;

impl UserStore for DemoUserStore {
    fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        if username == DEMO_USERNAME && DEMO_PASSWORDS.contains(&password) {
            Some(User::new(DEMO_USERNAME, DEMO_ROLE))
        } else {
            None
        }
    }
}
