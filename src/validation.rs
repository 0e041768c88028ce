// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request bodies and their validation rules.
//!
//! Handlers call [`validate_request`] first thing. Only the first failing
//! field (in declaration order) is reported, with a human-readable message.

use crate::error::{AppError, Result};
use serde::Deserialize;
use std::borrow::Cow;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

const MIN_CREDENTIAL_LEN: usize = 4;
const MAX_CREDENTIAL_LEN: usize = 8;

/// Body of `POST /signup`. Missing fields deserialize as empty strings.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SignUpRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,
    #[validate(custom(function = "validate_avatar_color"))]
    pub avatar_color: String,
    /// Base64 data URI of the avatar image
    #[validate(custom(function = "validate_avatar_image"))]
    pub avatar_image: String,
}

/// Body of `POST /signin`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SignInRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// Field order used to pick which error to report.
pub trait FieldOrder {
    const FIELDS: &'static [&'static str];
}

impl FieldOrder for SignUpRequest {
    const FIELDS: &'static [&'static str] =
        &["username", "password", "email", "avatar_color", "avatar_image"];
}

impl FieldOrder for SignInRequest {
    const FIELDS: &'static [&'static str] = &["username", "password"];
}

/// Validate a request body, mapping the first failure to `AppError::Validation`.
pub fn validate_request<T: Validate + FieldOrder>(request: &T) -> Result<()> {
    request
        .validate()
        .map_err(|errors| AppError::Validation(first_message(&errors, T::FIELDS)))
}

fn first_message(errors: &ValidationErrors, order: &[&str]) -> String {
    let field_errors = errors.field_errors();

    order
        .iter()
        .filter_map(|field| field_errors.get(*field))
        .chain(field_errors.values())
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request".to_string())
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn check_credential(
    value: &str,
    required: &'static str,
    invalid: &'static str,
) -> std::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Err(error("required", required));
    }
    let len = value.chars().count();
    if !(MIN_CREDENTIAL_LEN..=MAX_CREDENTIAL_LEN).contains(&len) {
        return Err(error("length", invalid));
    }
    Ok(())
}

fn validate_username(value: &str) -> std::result::Result<(), ValidationError> {
    check_credential(value, "Username is a required field", "Invalid username")
}

fn validate_password(value: &str) -> std::result::Result<(), ValidationError> {
    check_credential(value, "Password is a required field", "Invalid password")
}

fn validate_email_address(value: &str) -> std::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Err(error("required", "Email is a required field"));
    }
    // Require a dotted domain on top of the syntax check.
    let has_dotted_domain = value
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.'));
    if !value.validate_email() || !has_dotted_domain {
        return Err(error("email", "Email must be valid"));
    }
    Ok(())
}

fn validate_avatar_color(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", "Avatar color is required"));
    }
    Ok(())
}

fn validate_avatar_image(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", "Avatar image is required"));
    }
    Ok(())
}
