use serde::Serialize;
use std::fmt;

use crate::CoreError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Loose shape check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

fn check_email(raw: &str) -> Result<String, CoreError> {
    let email = raw.trim();
    if !is_valid_email(email) {
        return Err(CoreError::validation("email", "invalid email address"));
    }
    Ok(email.to_string())
}

fn check_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters long"),
        ));
    }
    Ok(())
}

fn required(field: &'static str, raw: &str) -> Result<String, CoreError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(CoreError::validation(field, "is required"));
    }
    Ok(value.to_string())
}

/// Body of `POST /api/login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        LoginForm {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(self) -> Result<Self, CoreError> {
        let email = check_email(&self.email)?;
        check_password(&self.password)?;
        Ok(LoginForm {
            email,
            password: self.password,
        })
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Body of `POST /api/signup`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignupForm {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(self) -> Result<Self, CoreError> {
        let name = required("name", &self.name)?;
        let last_name = required("last_name", &self.last_name)?;
        let email = check_email(&self.email)?;
        check_password(&self.password)?;
        Ok(SignupForm {
            name,
            last_name,
            email,
            password: self.password,
        })
    }
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("name", &self.name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}
