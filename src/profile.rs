//! Profile edits, validated before they are sent
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid regex"));
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("valid regex"));
static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z\s]+$").expect("valid regex"));

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("name should only contain letters")]
    InvalidName,
    #[error("please enter a valid email address")]
    InvalidEmail,
    #[error("please enter a valid 10-digit phone number")]
    InvalidPhone,
}

/// A single-field profile change; serializes to `{"<field>": "<value>"}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileUpdate {
    Name(String),
    Email(String),
    Phone(String),
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ProfileError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ProfileError::Missing(field));
    }
    Ok(value)
}

impl ProfileUpdate {
    pub fn name(value: &str) -> Result<Self, ProfileError> {
        let value = required("name", value)?;
        if !NAME.is_match(value) {
            return Err(ProfileError::InvalidName);
        }
        Ok(ProfileUpdate::Name(value.to_owned()))
    }

    pub fn email(value: &str) -> Result<Self, ProfileError> {
        let value = required("email", value)?;
        if !EMAIL.is_match(value) {
            return Err(ProfileError::InvalidEmail);
        }
        Ok(ProfileUpdate::Email(value.to_owned()))
    }

    pub fn phone(value: &str) -> Result<Self, ProfileError> {
        let value = required("phone", value)?;
        if !PHONE.is_match(value) {
            return Err(ProfileError::InvalidPhone);
        }
        Ok(ProfileUpdate::Phone(value.to_owned()))
    }

    pub fn field(&self) -> &'static str {
        match self {
            ProfileUpdate::Name(_) => "name",
            ProfileUpdate::Email(_) => "email",
            ProfileUpdate::Phone(_) => "phone",
        }
    }
}
