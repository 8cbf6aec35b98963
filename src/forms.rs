//! # Form Decoding
//!
//! Maps submitted `application/x-www-form-urlencoded` fields into typed form
//! structs.
//!
//! Each form declares a static mapping table ([`Bindable::FIELDS`]) that says
//! which submitted name feeds which struct field and how the value is coerced.
//! Decoding only performs that structural coercion; business rules run
//! afterwards through the [`Validator`](crate::validator::Validator).
//!
//! ## Two kinds of failure
//! - [`FormError::Decode`]: the client sent something we can't coerce, e.g.
//!   `expires=soon`. This is a 400.
//! - [`FormError::InvalidTarget`]: the mapping table itself is broken. That is
//!   a bug in our code, so it is escalated as a defect instead of a normal
//!   client error.

use crate::error::AppError;
use axum::extract::{FromRequest, RawForm, Request};
use std::collections::HashSet;
use thiserror::Error;
use url::form_urlencoded;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("invalid form binding target: {0}")]
    InvalidTarget(String),

    #[error("field `{field}`: cannot decode value {value:?}")]
    Decode { field: String, value: String },
}

/// How a submitted value is turned into a struct field
pub enum Coercion<T> {
    /// Stored as-is
    Text(fn(&mut T, String)),
    /// Parsed as a signed integer; an empty value leaves the default in place
    Integer(fn(&mut T, i64)),
    /// Never read from the submission
    Ignore,
}

/// One row of a form's mapping table
pub struct FieldMapping<T> {
    pub name: &'static str,
    pub coercion: Coercion<T>,
}

impl<T> FieldMapping<T> {
    pub const fn text(name: &'static str, set: fn(&mut T, String)) -> Self {
        Self {
            name,
            coercion: Coercion::Text(set),
        }
    }

    pub const fn integer(name: &'static str, set: fn(&mut T, i64)) -> Self {
        Self {
            name,
            coercion: Coercion::Integer(set),
        }
    }

    pub const fn ignore(name: &'static str) -> Self {
        Self {
            name,
            coercion: Coercion::Ignore,
        }
    }
}

/// A form struct that can be filled from submitted fields
///
/// ```ignore
/// impl Bindable for LoginForm {
///     const FIELDS: &'static [FieldMapping<Self>] = &[
///         FieldMapping::text("email", |f: &mut Self, v| f.email = v),
///         FieldMapping::text("password", |f: &mut Self, v| f.password = v),
///         FieldMapping::ignore("validator"),
///     ];
/// }
/// ```
pub trait Bindable: Default + Sized + 'static {
    const FIELDS: &'static [FieldMapping<Self>];
}

/// Build a `T` from submitted key/value pairs
///
/// Unknown names are skipped. When a name is submitted more than once only
/// the first value is used.
pub fn decode<T, I>(pairs: I) -> Result<T, FormError>
where
    T: Bindable,
    I: IntoIterator<Item = (String, String)>,
{
    check_mapping::<T>()?;

    let mut dst = T::default();
    let mut seen = HashSet::new();

    for (key, value) in pairs {
        if !seen.insert(key.clone()) {
            continue;
        }
        let Some(field) = T::FIELDS.iter().find(|f| f.name == key) else {
            continue;
        };
        match field.coercion {
            Coercion::Text(set) => set(&mut dst, value),
            Coercion::Integer(set) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let n = trimmed.parse::<i64>().map_err(|_| FormError::Decode {
                    field: key.clone(),
                    value: value.clone(),
                })?;
                set(&mut dst, n);
            }
            Coercion::Ignore => {}
        }
    }

    Ok(dst)
}

fn check_mapping<T: Bindable>() -> Result<(), FormError> {
    let type_name = std::any::type_name::<T>();
    if T::FIELDS.is_empty() {
        return Err(FormError::InvalidTarget(format!(
            "{type_name} declares no fields"
        )));
    }

    let mut names = HashSet::new();
    for field in T::FIELDS {
        if field.name.is_empty() {
            return Err(FormError::InvalidTarget(format!(
                "{type_name} has a field with an empty name"
            )));
        }
        if !names.insert(field.name) {
            return Err(FormError::InvalidTarget(format!(
                "{type_name} maps `{}` more than once",
                field.name
            )));
        }
    }
    Ok(())
}

/// Extractor that decodes a urlencoded request body into `T`
///
/// A body that can't be read as a form is a 400; so is a value that can't be
/// coerced. A broken mapping table becomes [`AppError::Defect`].
pub struct PostForm<T>(pub T);

impl<S, T> FromRequest<S> for PostForm<T>
where
    S: Send + Sync,
    T: Bindable,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let RawForm(body) = RawForm::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        let pairs = form_urlencoded::parse(&body).into_owned();
        Ok(PostForm(decode(pairs)?))
    }
}
