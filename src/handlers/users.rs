//! # User Handlers
//!
//! Signup, login and logout.
//!
//! ## Session flow
//! 1. Signup stores the account and sends the user to the login page
//! 2. Login checks the password, renews the session token and stores the
//!    user id under `authenticatedUserID`
//! 3. Logout renews the token again and removes the id
//!
//! Renewing the token on every privilege change means a session id captured
//! before login is worthless after it.

use crate::db::{users, ModelError};
use crate::error::AppResult;
use crate::forms::{Bindable, FieldMapping, PostForm};
use crate::session::{SessionState, AUTHENTICATED_USER_ID, FLASH};
use crate::state::AppState;
use crate::validator::{self, Validator, EMAIL_RX};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

const PASSWORD_MIN_CHARS: usize = 8;

/// Fields submitted by the signup form
///
/// The password is never echoed back into the page.
#[derive(Debug, Default, Serialize)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    #[serde(flatten)]
    pub validator: Validator,
}

impl Bindable for UserSignupForm {
    const FIELDS: &'static [FieldMapping<Self>] = &[
        FieldMapping::text("name", |f: &mut Self, v| f.name = v),
        FieldMapping::text("email", |f: &mut Self, v| f.email = v),
        FieldMapping::text("password", |f: &mut Self, v| f.password = v),
        FieldMapping::ignore("validator"),
    ];
}

impl UserSignupForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(validator::not_blank(&self.name), "name", "This field cannot be blank");
        v.check_field(validator::not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            validator::matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(validator::not_blank(&self.password), "password", "This field cannot be blank");
        v.check_field(
            validator::min_chars(&self.password, PASSWORD_MIN_CHARS),
            "password",
            "This field must be at least 8 characters long",
        );
    }
}

#[derive(Debug, Default, Serialize)]
pub struct UserLoginForm {
    pub email: String,
    #[serde(skip)]
    pub password: String,
    #[serde(flatten)]
    pub validator: Validator,
}

impl Bindable for UserLoginForm {
    const FIELDS: &'static [FieldMapping<Self>] = &[
        FieldMapping::text("email", |f: &mut Self, v| f.email = v),
        FieldMapping::text("password", |f: &mut Self, v| f.password = v),
        FieldMapping::ignore("validator"),
    ];
}

impl UserLoginForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(validator::not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            validator::matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(validator::not_blank(&self.password), "password", "This field cannot be blank");
    }
}

/// GET /user/signup
pub async fn user_signup(State(state): State<AppState>, session: SessionState) -> AppResult<Response> {
    let data = state
        .new_template_data(&session)
        .await?
        .with_form(&UserSignupForm::default())?;
    state.templates.render(StatusCode::OK, "signup.html", &data)
}

/// POST /user/signup
pub async fn user_signup_post(
    State(state): State<AppState>,
    session: SessionState,
    PostForm(mut form): PostForm<UserSignupForm>,
) -> AppResult<Response> {
    form.validate();

    if form.validator.valid() {
        match users::insert(&state.db, &form.name, &form.email, &form.password).await {
            Ok(id) => {
                tracing::info!(user_id = id, "user signed up");
                session
                    .put(FLASH, "Your signup was successful. Please log in.")
                    .await?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(ModelError::DuplicateEmail) => {
                form.validator
                    .add_field_error("email", "Email address is already in use");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = state.new_template_data(&session).await?.with_form(&form)?;
    state
        .templates
        .render(StatusCode::UNPROCESSABLE_ENTITY, "signup.html", &data)
}

/// GET /user/login
pub async fn user_login(State(state): State<AppState>, session: SessionState) -> AppResult<Response> {
    let data = state
        .new_template_data(&session)
        .await?
        .with_form(&UserLoginForm::default())?;
    state.templates.render(StatusCode::OK, "login.html", &data)
}

/// POST /user/login
///
/// Wrong email and wrong password get the same message.
pub async fn user_login_post(
    State(state): State<AppState>,
    session: SessionState,
    PostForm(mut form): PostForm<UserLoginForm>,
) -> AppResult<Response> {
    form.validate();

    if form.validator.valid() {
        match users::authenticate(&state.db, &form.email, &form.password).await {
            Ok(id) => {
                session.renew_token().await?;
                session.put(AUTHENTICATED_USER_ID, id).await?;
                tracing::info!(user_id = id, "user logged in");
                return Ok(Redirect::to("/snippet/create").into_response());
            }
            Err(ModelError::InvalidCredentials) => {
                form.validator
                    .add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = state.new_template_data(&session).await?.with_form(&form)?;
    state
        .templates
        .render(StatusCode::UNPROCESSABLE_ENTITY, "login.html", &data)
}

/// POST /user/logout
pub async fn user_logout_post(session: SessionState) -> AppResult<Response> {
    session.renew_token().await?;
    session.remove(AUTHENTICATED_USER_ID).await?;
    session
        .put(FLASH, "You've been logged out successfully!")
        .await?;

    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::decode;

    fn signup(name: &str, email: &str, password: &str) -> UserSignupForm {
        decode(vec![
            ("name".to_string(), name.to_string()),
            ("email".to_string(), email.to_string()),
            ("password".to_string(), password.to_string()),
        ])
        .unwrap()
    }

    #[test]
    fn test_signup_validation() {
        let mut form = signup("Alice", "alice@example.com", "pa55word!");
        form.validate();
        assert!(form.validator.valid());

        let mut form = signup("", "not-an-email", "short");
        form.validate();
        assert_eq!(form.validator.field_errors["name"], "This field cannot be blank");
        assert_eq!(
            form.validator.field_errors["email"],
            "This field must be a valid email address"
        );
        assert_eq!(
            form.validator.field_errors["password"],
            "This field must be at least 8 characters long"
        );
    }

    #[test]
    fn test_password_is_never_serialized() {
        let form = signup("Alice", "alice@example.com", "pa55word!");
        let json = serde_json::to_value(&form).unwrap();

        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("password").is_none());
    }
}
