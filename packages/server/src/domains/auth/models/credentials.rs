use serde::Deserialize;

/// The single administrator account allowed to mutate companies.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Compare without short-circuiting on the first differing byte.
    pub fn matches(&self, login: &LoginRequest) -> bool {
        let username = constant_time_eq(self.username.as_bytes(), login.username.as_bytes());
        let password = constant_time_eq(self.password.as_bytes(), login.password.as_bytes());
        username & password
    }
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
