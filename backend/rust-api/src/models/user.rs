use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login credential loaded from the users catalog.
///
/// `password` holds either the plain secret or a bcrypt hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub username: String,
    pub password: String,
}

impl IdentityRecord {
    pub fn verify_password(&self, candidate: &str) -> bool {
        if is_bcrypt_hash(&self.password) {
            match bcrypt::verify(candidate, &self.password) {
                Ok(valid) => valid,
                Err(e) => {
                    tracing::warn!(
                        "Malformed bcrypt hash for user {}: {}",
                        self.username,
                        e
                    );
                    false
                }
            }
        } else {
            self.password == candidate
        }
    }
}

fn is_bcrypt_hash(value: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username must not be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// Generic `{ok, description}` body used by every non-data endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseResponse {
    pub ok: bool,
    pub description: String,
}

impl BaseResponse {
    pub fn ok(description: impl Into<String>) -> Self {
        Self {
            ok: true,
            description: description.into(),
        }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            ok: false,
            description: description.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub description: String,
    pub access_token: String,
    pub expires_at: i64,
}
