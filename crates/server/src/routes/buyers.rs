//! Buyer pages: list, intake form, edit form with history, and CSV import.
//!
//! Form posts go through the same validator as the JSON API. Cells are trimmed,
//! empty cells read as absent, and `tags` is comma-separated.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use leadbook_core::import::{ImportError, MAX_IMPORT_ROWS};
use leadbook_core::validation::{ValidationErrors, record_from_text_fields};
use leadbook_core::{
    Bhk, Buyer, BuyerHistory, BuyerStatus, City, LeadSource, PropertyType, Purpose, Timeline,
};

use crate::db::BuyerPage;
use crate::error::{AppError, PageError};
use crate::filters;
use crate::middleware::{ClientKey, RequireAuth};
use crate::services::{BuyerService, ListParams, enforce_rate_limit, parse_buyer_id};
use crate::state::AppState;

type PageResult = std::result::Result<Response, PageError>;

// =============================================================================
// View Types
// =============================================================================

/// A `<select>` option.
#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// One form control with its current value and error.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub error: Option<String>,
    pub required: bool,
    pub input_type: &'static str,
    pub is_select: bool,
    pub is_textarea: bool,
    pub options: Vec<OptionView>,
}

/// A row in the buyers table.
#[derive(Debug, Clone)]
pub struct BuyerRow {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub property_type: String,
    pub status: String,
    pub updated_at: String,
}

/// A history entry rendered as text.
#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub changed_at: String,
    pub changed_by: String,
    pub summary: String,
}

/// A failing import row.
#[derive(Debug, Clone)]
pub struct RowErrorView {
    pub row: usize,
    pub messages: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Buyer list page template.
#[derive(Template, WebTemplate)]
#[template(path = "buyers/index.html")]
pub struct BuyerListTemplate {
    pub user_id: Option<String>,
    pub rows: Vec<BuyerRow>,
    pub search: String,
    pub status_options: Vec<OptionView>,
    pub page: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

/// Intake and edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "buyers/form.html")]
pub struct BuyerFormTemplate {
    pub user_id: Option<String>,
    pub title: String,
    pub action: String,
    pub submit_label: &'static str,
    pub fields: Vec<FieldView>,
    pub notice: Option<String>,
    pub form_error: Option<String>,
    /// Set when editing an existing buyer.
    pub buyer_id: Option<String>,
    pub history: Vec<HistoryRow>,
}

/// CSV import page template.
#[derive(Template, WebTemplate)]
#[template(path = "buyers/import.html")]
pub struct ImportTemplate {
    pub user_id: Option<String>,
    pub csv: String,
    pub max_rows: usize,
    pub error: Option<String>,
    pub row_errors: Vec<RowErrorView>,
    pub created: Option<usize>,
}

// =============================================================================
// Form Types
// =============================================================================

/// Query parameters for the edit page.
#[derive(Debug, Deserialize)]
pub struct EditQuery {
    pub saved: Option<String>,
}

/// CSV paste form.
#[derive(Debug, Deserialize)]
pub struct ImportForm {
    #[serde(default)]
    pub csv: String,
}

/// Submitted form pairs as a validator payload.
fn payload_from_form(pairs: &[(String, String)]) -> Value {
    Value::Object(record_from_text_fields(
        pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    ))
}

// =============================================================================
// Form Fields
// =============================================================================

enum Control {
    Input(&'static str),
    Select(Vec<(&'static str, &'static str)>),
    Textarea,
}

fn choices<T: Copy>(all: &[T], name: fn(T) -> &'static str, label: fn(T) -> &'static str) -> Control {
    Control::Select(all.iter().map(|v| (name(*v), label(*v))).collect())
}

fn field_specs() -> Vec<(&'static str, &'static str, bool, Control)> {
    vec![
        ("fullName", "Full name", true, Control::Input("text")),
        ("email", "Email", false, Control::Input("email")),
        ("phone", "Phone", true, Control::Input("tel")),
        ("city", "City", true, choices(City::ALL, City::as_str, City::label)),
        (
            "propertyType",
            "Property type",
            true,
            choices(PropertyType::ALL, PropertyType::as_str, PropertyType::label),
        ),
        ("bhk", "BHK", false, choices(Bhk::ALL, Bhk::as_str, Bhk::label)),
        ("purpose", "Purpose", true, choices(Purpose::ALL, Purpose::as_str, Purpose::label)),
        ("budgetMin", "Budget min (INR)", false, Control::Input("number")),
        ("budgetMax", "Budget max (INR)", false, Control::Input("number")),
        (
            "timeline",
            "Timeline",
            true,
            choices(Timeline::ALL, Timeline::as_str, Timeline::label),
        ),
        (
            "source",
            "Source",
            true,
            choices(LeadSource::ALL, LeadSource::as_str, LeadSource::label),
        ),
        (
            "status",
            "Status",
            false,
            choices(BuyerStatus::ALL, BuyerStatus::as_str, BuyerStatus::label),
        ),
        ("notes", "Notes", false, Control::Textarea),
        ("tags", "Tags (comma-separated)", false, Control::Input("text")),
    ]
}

/// Build the form controls from current values and validation errors.
fn form_fields(values: &HashMap<String, String>, errors: Option<&ValidationErrors>) -> Vec<FieldView> {
    field_specs()
        .into_iter()
        .map(|(name, label, required, control)| {
            let value = values.get(name).cloned().unwrap_or_default();
            let error = errors.and_then(|errors| {
                let nested = format!("{name}.");
                errors
                    .issues()
                    .iter()
                    .find(|issue| issue.field == name || issue.field.starts_with(&nested))
                    .map(|issue| issue.message.clone())
            });

            let (input_type, is_select, is_textarea, options) = match control {
                Control::Input(kind) => (kind, false, false, Vec::new()),
                Control::Textarea => ("text", false, true, Vec::new()),
                Control::Select(choices) => {
                    let options = choices
                        .into_iter()
                        .map(|(option, text)| OptionView {
                            value: option.to_owned(),
                            label: text.to_owned(),
                            selected: option == value,
                        })
                        .collect();
                    ("text", true, false, options)
                }
            };

            FieldView {
                name,
                label,
                value,
                error,
                required,
                input_type,
                is_select,
                is_textarea,
                options,
            }
        })
        .collect()
}

/// Form values for an existing buyer.
fn values_from_buyer(buyer: &Buyer) -> HashMap<String, String> {
    let mut values = HashMap::new();
    let mut set = |key: &str, value: String| {
        if !value.is_empty() {
            values.insert(key.to_owned(), value);
        }
    };

    set("fullName", buyer.full_name.clone());
    set(
        "email",
        buyer
            .email
            .as_ref()
            .map(|e| e.as_str().to_owned())
            .unwrap_or_default(),
    );
    set("phone", buyer.phone.clone());
    set("city", buyer.city.as_str().to_owned());
    set("propertyType", buyer.property_type.as_str().to_owned());
    set(
        "bhk",
        buyer.bhk.map(|b| b.as_str().to_owned()).unwrap_or_default(),
    );
    set("purpose", buyer.purpose.as_str().to_owned());
    set(
        "budgetMin",
        buyer.budget_min.map(|b| b.to_string()).unwrap_or_default(),
    );
    set(
        "budgetMax",
        buyer.budget_max.map(|b| b.to_string()).unwrap_or_default(),
    );
    set("timeline", buyer.timeline.as_str().to_owned());
    set("source", buyer.source.as_str().to_owned());
    set("status", buyer.status.as_str().to_owned());
    set("notes", buyer.notes.clone().unwrap_or_default());
    set("tags", buyer.tags.join(", "));
    values
}

/// Form values echoed back from a submission.
fn values_from_form(pairs: &[(String, String)]) -> HashMap<String, String> {
    pairs.iter().cloned().collect()
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Human-readable summary of a history diff.
fn summarize_diff(diff: &Value) -> String {
    if diff.get("created").is_some() {
        return "Created".to_owned();
    }

    let Some(changes) = diff.get("updated").and_then(Value::as_object) else {
        return "Updated".to_owned();
    };
    if changes.is_empty() {
        return "Saved with no changes".to_owned();
    }

    changes
        .iter()
        .map(|(field, change)| {
            format!(
                "{field}: {} → {}",
                display_value(&change["from"]),
                display_value(&change["to"])
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "(none)".to_owned(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn history_rows(history: &[BuyerHistory]) -> Vec<HistoryRow> {
    history
        .iter()
        .map(|entry| HistoryRow {
            changed_at: format_time(entry.changed_at),
            changed_by: entry.changed_by.clone(),
            summary: summarize_diff(&entry.diff),
        })
        .collect()
}

fn new_form(user_id: String, fields: Vec<FieldView>) -> BuyerFormTemplate {
    BuyerFormTemplate {
        user_id: Some(user_id),
        title: "New buyer".to_owned(),
        action: "/buyers/new".to_owned(),
        submit_label: "Create buyer",
        fields,
        notice: None,
        form_error: None,
        buyer_id: None,
        history: Vec::new(),
    }
}

fn edit_form(
    user_id: String,
    buyer_id: String,
    fields: Vec<FieldView>,
    history: &[BuyerHistory],
) -> BuyerFormTemplate {
    BuyerFormTemplate {
        user_id: Some(user_id),
        title: "Edit buyer".to_owned(),
        action: format!("/buyers/{buyer_id}"),
        submit_label: "Save changes",
        fields,
        notice: None,
        form_error: None,
        buyer_id: Some(buyer_id),
        history: history_rows(history),
    }
}

// =============================================================================
// List
// =============================================================================

fn page_href(params: &ListParams, page: u32) -> String {
    let mut href = format!("/buyers?page={page}");
    if let Some(size) = &params.page_size {
        href.push_str(&format!("&pageSize={}", urlencoding::encode(size)));
    }
    if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
        href.push_str(&format!("&search={}", urlencoding::encode(search)));
    }
    if let Some(status) = params.status.as_deref().filter(|s| !s.trim().is_empty()) {
        href.push_str(&format!("&status={}", urlencoding::encode(status)));
    }
    href
}

fn list_template(user_id: String, params: &ListParams, page: BuyerPage) -> BuyerListTemplate {
    let status = params.status.clone().unwrap_or_default();
    let status_options = BuyerStatus::ALL
        .iter()
        .map(|s| OptionView {
            value: s.as_str().to_owned(),
            label: s.label().to_owned(),
            selected: s.as_str() == status.trim(),
        })
        .collect();

    let prev_href = (page.page > 1).then(|| page_href(params, page.page - 1));
    let next_href =
        (u64::from(page.page) < page.total_pages).then(|| page_href(params, page.page + 1));

    BuyerListTemplate {
        user_id: Some(user_id),
        rows: page
            .buyers
            .iter()
            .map(|b| BuyerRow {
                id: b.id.to_string(),
                full_name: b.full_name.clone(),
                email: b.email.as_ref().map(|e| e.as_str().to_owned()).unwrap_or_default(),
                phone: b.phone.clone(),
                city: b.city.label().to_owned(),
                property_type: b.property_type.label().to_owned(),
                status: b.status.label().to_owned(),
                updated_at: format_time(b.updated_at),
            })
            .collect(),
        search: params.search.clone().unwrap_or_default(),
        status_options,
        page: page.page,
        total_pages: page.total_pages,
        total_count: page.total_count,
        prev_href,
        next_href,
    }
}

/// Display the buyer list.
pub async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> PageResult {
    let page = BuyerService::new(state.buyers()).list(&params).await?;
    Ok(list_template(user.id, &params, page).into_response())
}

// =============================================================================
// Create
// =============================================================================

/// Display the intake form.
pub async fn new_page(RequireAuth(user): RequireAuth) -> impl IntoResponse {
    let mut values = HashMap::new();
    values.insert("status".to_owned(), BuyerStatus::default().as_str().to_owned());
    new_form(user.id, form_fields(&values, None))
}

/// Handle intake form submission.
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ClientKey(client): ClientKey,
    Form(pairs): Form<Vec<(String, String)>>,
) -> PageResult {
    let values = values_from_form(&pairs);

    match enforce_rate_limit(state.limiter(), &client).await {
        Ok(()) => {}
        Err(AppError::RateLimited { retry_after_secs }) => {
            let mut form = new_form(user.id, form_fields(&values, None));
            form.form_error = Some(format!(
                "Too many requests. Try again in {retry_after_secs} seconds."
            ));
            return Ok((StatusCode::TOO_MANY_REQUESTS, form).into_response());
        }
        Err(e) => return Err(e.into()),
    }

    let service = BuyerService::new(state.buyers());
    match service.create(&payload_from_form(&pairs), &user.id).await {
        Ok(buyer) => Ok(Redirect::to(&format!("/buyers/{}", buyer.id)).into_response()),
        Err(AppError::Validation(errors)) => {
            let mut form = new_form(user.id, form_fields(&values, Some(&errors)));
            form.form_error = Some("Please fix the highlighted fields.".to_owned());
            Ok((StatusCode::BAD_REQUEST, form).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Edit
// =============================================================================

/// Display the edit form with history.
pub async fn edit_page(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<EditQuery>,
) -> PageResult {
    let id = parse_buyer_id(&id)?;
    let service = BuyerService::new(state.buyers());
    let buyer = service.get(id).await?;
    let history = service.history(id).await?;

    let mut form = edit_form(
        user.id,
        buyer.id.to_string(),
        form_fields(&values_from_buyer(&buyer), None),
        &history,
    );
    if query.saved.is_some() {
        form.notice = Some("Saved.".to_owned());
    }
    Ok(form.into_response())
}

/// Handle edit form submission.
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> PageResult {
    let id = parse_buyer_id(&id)?;
    let service = BuyerService::new(state.buyers());

    match service.update(id, &payload_from_form(&pairs), &user.id).await {
        Ok(buyer) => Ok(Redirect::to(&format!("/buyers/{}?saved=1", buyer.id)).into_response()),
        Err(AppError::Validation(errors)) => {
            let history = service.history(id).await?;
            let mut form = edit_form(
                user.id,
                id.to_string(),
                form_fields(&values_from_form(&pairs), Some(&errors)),
                &history,
            );
            form.form_error = Some("Please fix the highlighted fields.".to_owned());
            Ok((StatusCode::BAD_REQUEST, form).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a buyer and return to the list.
pub async fn delete(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> PageResult {
    let id = parse_buyer_id(&id)?;
    BuyerService::new(state.buyers()).delete(id).await?;
    Ok(Redirect::to("/buyers").into_response())
}

// =============================================================================
// Import
// =============================================================================

fn import_template(user_id: String, csv: String) -> ImportTemplate {
    ImportTemplate {
        user_id: Some(user_id),
        csv,
        max_rows: MAX_IMPORT_ROWS,
        error: None,
        row_errors: Vec::new(),
        created: None,
    }
}

/// Display the CSV import form.
pub async fn import_page(RequireAuth(user): RequireAuth) -> impl IntoResponse {
    import_template(user.id, String::new())
}

/// Handle CSV import submission.
pub async fn import(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<ImportForm>,
) -> PageResult {
    let service = BuyerService::new(state.buyers());

    match service.import_csv(&form.csv, &user.id).await {
        Ok(created) => {
            let mut page = import_template(user.id, String::new());
            page.created = Some(created);
            Ok(page.into_response())
        }
        Err(AppError::Import(err)) => {
            let mut page = import_template(user.id, form.csv);
            match err {
                ImportError::InvalidRows(rows) => {
                    page.error = Some("No buyers were imported. Fix these rows:".to_owned());
                    page.row_errors = rows
                        .into_iter()
                        .map(|row| RowErrorView {
                            row: row.row,
                            messages: row
                                .issues
                                .iter()
                                .map(|issue| format!("{}: {}", issue.field, issue.message))
                                .collect::<Vec<_>>()
                                .join("; "),
                        })
                        .collect();
                }
                other => page.error = Some(other.to_string()),
            }
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
