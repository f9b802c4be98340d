use anyhow::Result;
use regex::Regex;
use uuid::Uuid;

use crate::error::ApiError;

/// Letters and digits only, 4 to 20 characters.
const USERNAME_PATTERN: &str = r"^[A-Za-z0-9]{4,20}$";

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$";

const MIN_PASSWORD_LEN: usize = 8;

/// Compiled credential format checks.
#[derive(Debug, Clone)]
pub struct Validators {
    username: Regex,
    email: Regex,
}

impl Validators {
    pub fn new() -> Result<Self> {
        Ok(Self {
            username: Regex::new(USERNAME_PATTERN)?,
            email: Regex::new(EMAIL_PATTERN)?,
        })
    }

    pub fn username(&self, username: &str) -> bool {
        self.username.is_match(username)
    }

    pub fn email(&self, email: &str) -> bool {
        self.email.is_match(email)
    }

    /// At least 8 characters with one uppercase letter, one lowercase letter
    /// and one digit.
    pub fn password(&self, password: &str) -> bool {
        !password.contains('\n')
            && password.chars().count() >= MIN_PASSWORD_LEN
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_uppercase())
    }
}

/// Parse a path id. A string that is not a UUID is a client error distinct
/// from a well-formed id that matches nothing.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::MalformedId)
}

/// Treat absent and blank fields alike. The value itself is passed through
/// untouched.
pub fn required(field: Option<&str>) -> Option<&str> {
    field.filter(|s| !s.trim().is_empty())
}
