//! # Snippet Handlers
//!
//! Home page, single snippet view and the create form.

use crate::db::snippets;
use crate::error::{AppError, AppResult};
use crate::forms::{Bindable, FieldMapping, PostForm};
use crate::routing::Params;
use crate::session::{SessionState, FLASH};
use crate::state::AppState;
use crate::validator::{self, Validator};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

/// Expiry preselected on a blank create form, in days
pub const DEFAULT_EXPIRES_DAYS: i64 = 365;

/// The only expiry choices the create form offers
pub const PERMITTED_EXPIRES: [i64; 3] = [1, 7, 365];

const TITLE_MAX_CHARS: usize = 100;

/// Fields submitted by the create form
///
/// Serialized as-is into the page data, so a rejected submission is echoed
/// back together with its errors.
#[derive(Debug, Default, Serialize)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub expires: i64,
    #[serde(flatten)]
    pub validator: Validator,
}

impl Bindable for SnippetCreateForm {
    const FIELDS: &'static [FieldMapping<Self>] = &[
        FieldMapping::text("title", |f: &mut Self, v| f.title = v),
        FieldMapping::text("content", |f: &mut Self, v| f.content = v),
        FieldMapping::integer("expires", |f: &mut Self, v| f.expires = v),
        FieldMapping::ignore("validator"),
    ];
}

impl SnippetCreateForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(validator::not_blank(&self.title), "title", "This field cannot be blank");
        v.check_field(
            validator::max_chars(&self.title, TITLE_MAX_CHARS),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(validator::not_blank(&self.content), "content", "This field cannot be blank");
        v.check_field(
            validator::permitted_value(&self.expires, &PERMITTED_EXPIRES),
            "expires",
            "This field must equal 1, 7 or 365",
        );
    }
}

/// GET /
pub async fn home(State(state): State<AppState>, session: SessionState) -> AppResult<Response> {
    let snippets = snippets::latest(&state.db).await?;

    let mut data = state.new_template_data(&session).await?;
    data.snippets = snippets;

    state.templates.render(StatusCode::OK, "home.html", &data)
}

/// GET /snippet/view/:id
///
/// Anything that isn't a positive integer is a 404, same as an id that
/// doesn't exist or has expired.
pub async fn snippet_view(
    State(state): State<AppState>,
    session: SessionState,
    params: Params,
) -> AppResult<Response> {
    let id = params
        .get("id")
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|id| *id >= 1)
        .ok_or(AppError::NotFound)?;

    let snippet = snippets::get(&state.db, id).await?;

    let mut data = state.new_template_data(&session).await?;
    data.snippet = Some(snippet);

    state.templates.render(StatusCode::OK, "view.html", &data)
}

/// GET /snippet/create
pub async fn snippet_create(State(state): State<AppState>, session: SessionState) -> AppResult<Response> {
    let form = SnippetCreateForm {
        expires: DEFAULT_EXPIRES_DAYS,
        ..SnippetCreateForm::default()
    };

    let data = state.new_template_data(&session).await?.with_form(&form)?;
    state.templates.render(StatusCode::OK, "create.html", &data)
}

/// POST /snippet/create
///
/// Invalid input re-renders the form with 422. On success the new snippet's
/// page is shown via a 303 and a flash message.
pub async fn snippet_create_post(
    State(state): State<AppState>,
    session: SessionState,
    PostForm(mut form): PostForm<SnippetCreateForm>,
) -> AppResult<Response> {
    form.validate();

    if !form.validator.valid() {
        let data = state.new_template_data(&session).await?.with_form(&form)?;
        return state
            .templates
            .render(StatusCode::UNPROCESSABLE_ENTITY, "create.html", &data);
    }

    let id = snippets::insert(&state.db, &form.title, &form.content, form.expires).await?;
    tracing::info!(id, "snippet created");

    session.put(FLASH, "Snippet successfully created!").await?;

    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}
