//! Buyer schema validation.
//!
//! [`validate_buyer`] takes an untyped JSON record and returns either a typed
//! [`BuyerDraft`] or every field-level issue found. Checks, per field:
//!
//! | field          | rule                                                  |
//! |----------------|-------------------------------------------------------|
//! | `fullName`     | required string, 2..=80 characters                    |
//! | `email`        | optional, must be a valid email                       |
//! | `phone`        | required, 10-15 ASCII digits                          |
//! | `city`, `propertyType`, `purpose`, `timeline`, `source` | required enum |
//! | `bhk`, `status`| optional enum                                         |
//! | `budgetMin`, `budgetMax` | optional, coerced to a non-negative integer |
//! | `notes`        | optional string, at most 1000 characters              |
//! | `tags`         | optional array of strings                             |
//!
//! Cross-field rules run whenever the fields they read are themselves valid:
//! Apartment and Villa require `bhk`, and `budgetMax` must not be below `budgetMin`.
//!
//! Empty strings and `null` count as "absent" for optional fields. Unknown keys
//! are ignored. Optional keys missing from the record entirely are listed in
//! [`BuyerDraft::omitted`], so an update can keep what is stored for them.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{
    Bhk, BuyerDraft, BuyerStatus, ChoiceError, City, Email, LeadSource, OptionalField,
    PropertyType, Purpose, Timeline,
};

/// An untyped buyer record, keyed by camelCase field name.
pub type Record = Map<String, Value>;

const FULL_NAME_MIN: usize = 2;
const FULL_NAME_MAX: usize = 80;
const PHONE_MIN_DIGITS: usize = 10;
const PHONE_MAX_DIGITS: usize = 15;
const NOTES_MAX: usize = 1000;

/// Category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// Missing, or the wrong JSON type.
    InvalidType,
    /// Below a length or numeric minimum.
    TooSmall,
    /// Above a length or numeric maximum.
    TooBig,
    /// String present but in the wrong shape.
    InvalidString,
    /// Not one of the allowed choices.
    InvalidEnumValue,
    /// A cross-field rule.
    Custom,
}

/// One problem with one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// camelCase field name (`tags.2` for an array element, empty for the record itself).
    pub field: String,
    pub code: IssueCode,
    pub message: String,
}

/// Every issue found in a record. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldIssue>);

impl ValidationErrors {
    /// Issues in the order they were found.
    #[must_use]
    pub fn issues(&self) -> &[FieldIssue] {
        &self.0
    }

    /// First issue reported for a field, if any.
    #[must_use]
    pub fn for_field(&self, field: &str) -> Option<&FieldIssue> {
        self.0.iter().find(|issue| issue.field == field)
    }

    /// Whether a field has at least one issue.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.for_field(field).is_some()
    }

    /// A single issue about the record as a whole.
    #[must_use]
    pub fn single(field: &str, code: IssueCode, message: impl Into<String>) -> Self {
        Self(vec![FieldIssue {
            field: field.to_owned(),
            code,
            message: message.into(),
        }])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|issue| {
                if issue.field.is_empty() {
                    issue.message.clone()
                } else {
                    format!("{}: {}", issue.field, issue.message)
                }
            })
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Validate an untyped value as a buyer record.
///
/// # Errors
///
/// Returns [`ValidationErrors`] with every issue found when the value is not an
/// object or any field breaks its rule.
pub fn validate_buyer(value: &Value) -> Result<BuyerDraft, ValidationErrors> {
    match value {
        Value::Object(record) => validate_record(record),
        other => Err(ValidationErrors::single(
            "",
            IssueCode::InvalidType,
            format!("Expected object, received {}", type_name(other)),
        )),
    }
}

/// Validate a buyer record.
///
/// # Errors
///
/// Returns [`ValidationErrors`] with every issue found.
pub fn validate_record(record: &Record) -> Result<BuyerDraft, ValidationErrors> {
    let mut check = Checker::new(record);

    let full_name = check.string("fullName", Required::Yes).and_then(|name| {
        check.length("fullName", name, FULL_NAME_MIN, FULL_NAME_MAX)
    });
    let email = check.email("email");
    let phone = check.phone("phone");
    let city = check.choice::<City>("city", Required::Yes);
    let property_type = check.choice::<PropertyType>("propertyType", Required::Yes);
    let bhk = check.choice::<Bhk>("bhk", Required::No);
    let purpose = check.choice::<Purpose>("purpose", Required::Yes);
    let budget_min = check.budget("budgetMin");
    let budget_max = check.budget("budgetMax");
    let timeline = check.choice::<Timeline>("timeline", Required::Yes);
    let source = check.choice::<LeadSource>("source", Required::Yes);
    let notes = check
        .string("notes", Required::No)
        .and_then(|notes| check.length("notes", notes, 0, NOTES_MAX));
    let tags = check.tags("tags");
    let status = check.choice::<BuyerStatus>("status", Required::No);

    if let (Field::Valid(kind), Field::Absent) = (&property_type, &bhk) {
        if kind.is_residential() {
            check.push(
                "bhk",
                IssueCode::Custom,
                "BHK is required for Apartment and Villa",
            );
        }
    }

    if let (Field::Valid(min), Field::Valid(max)) = (&budget_min, &budget_max) {
        if max < min {
            check.push(
                "budgetMax",
                IssueCode::Custom,
                "budgetMax must be >= budgetMin",
            );
        }
    }

    if !check.issues.is_empty() {
        return Err(ValidationErrors(check.issues));
    }

    match (
        full_name,
        email,
        phone,
        city,
        property_type,
        bhk,
        purpose,
        budget_min,
        budget_max,
        timeline,
        source,
        notes,
        tags,
        status,
    ) {
        (
            Field::Valid(full_name),
            email,
            Field::Valid(phone),
            Field::Valid(city),
            Field::Valid(property_type),
            bhk,
            Field::Valid(purpose),
            budget_min,
            budget_max,
            Field::Valid(timeline),
            Field::Valid(source),
            notes,
            tags,
            status,
        ) => Ok(BuyerDraft {
            full_name,
            email: email.into_option(),
            phone,
            city,
            property_type,
            bhk: bhk.into_option(),
            purpose,
            budget_min: budget_min.into_option(),
            budget_max: budget_max.into_option(),
            timeline,
            source,
            notes: notes.into_option(),
            tags: tags.into_option().unwrap_or_default(),
            status: status.into_option(),
            omitted: OptionalField::ALL
                .iter()
                .copied()
                .filter(|field| !record.contains_key(field.key()))
                .collect(),
        }),
        // Every required field either produced a value or recorded an issue above.
        _ => Err(ValidationErrors::single(
            "",
            IssueCode::Custom,
            "record is incomplete",
        )),
    }
}

/// Build a record from text cells (CSV rows, HTML forms).
///
/// Cells are trimmed and an empty cell becomes `null`, so a blank optional
/// column reads as absent on create and clears the field on update. `tags` is
/// split on commas into an array of trimmed, non-empty strings.
pub fn record_from_text_fields<I, K, V>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut record = Record::new();
    for (key, value) in fields {
        let key = key.as_ref().trim();
        let value = value.as_ref().trim();
        if key.is_empty() {
            continue;
        }

        if value.is_empty() {
            record.insert(key.to_owned(), Value::Null);
        } else if key == "tags" {
            let tags: Vec<Value> = value
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(|tag| Value::String(tag.to_owned()))
                .collect();
            record.insert(key.to_owned(), Value::Array(tags));
        } else {
            record.insert(key.to_owned(), Value::String(value.to_owned()));
        }
    }
    record
}

// =============================================================================
// Field checks
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Required {
    Yes,
    No,
}

/// Outcome of reading one field.
#[derive(Debug)]
enum Field<T> {
    /// Not provided (optional fields only).
    Absent,
    Valid(T),
    /// An issue was recorded.
    Invalid,
}

impl<T> Field<T> {
    fn and_then<U>(self, f: impl FnOnce(T) -> Field<U>) -> Field<U> {
        match self {
            Self::Valid(value) => f(value),
            Self::Absent => Field::Absent,
            Self::Invalid => Field::Invalid,
        }
    }

    fn into_option(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Absent | Self::Invalid => None,
        }
    }
}

struct Checker<'a> {
    record: &'a Record,
    issues: Vec<FieldIssue>,
}

impl<'a> Checker<'a> {
    const fn new(record: &'a Record) -> Self {
        Self {
            record,
            issues: Vec::new(),
        }
    }

    fn push(&mut self, field: &str, code: IssueCode, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.to_owned(),
            code,
            message: message.into(),
        });
    }

    /// Look up a field, treating `null` and `""` as absent.
    fn present(&self, field: &str) -> Option<&'a Value> {
        match self.record.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(value) => Some(value),
        }
    }

    fn missing<T>(&mut self, field: &str, required: Required) -> Field<T> {
        if required == Required::Yes {
            self.push(field, IssueCode::InvalidType, "Required");
            Field::Invalid
        } else {
            Field::Absent
        }
    }

    fn string(&mut self, field: &str, required: Required) -> Field<String> {
        match self.present(field) {
            None => self.missing(field, required),
            Some(Value::String(s)) => Field::Valid(s.clone()),
            Some(other) => {
                let message = format!("Expected string, received {}", type_name(other));
                self.push(field, IssueCode::InvalidType, message);
                Field::Invalid
            }
        }
    }

    fn length(&mut self, field: &str, value: String, min: usize, max: usize) -> Field<String> {
        let len = value.chars().count();
        if len < min {
            self.push(
                field,
                IssueCode::TooSmall,
                format!("String must contain at least {min} character(s)"),
            );
            Field::Invalid
        } else if len > max {
            self.push(
                field,
                IssueCode::TooBig,
                format!("String must contain at most {max} character(s)"),
            );
            Field::Invalid
        } else {
            Field::Valid(value)
        }
    }

    fn email(&mut self, field: &str) -> Field<Email> {
        self.string(field, Required::No)
            .and_then(|raw| match Email::parse(&raw) {
                Ok(email) => Field::Valid(email),
                Err(_) => {
                    self.push(field, IssueCode::InvalidString, "Invalid email");
                    Field::Invalid
                }
            })
    }

    fn phone(&mut self, field: &str) -> Field<String> {
        self.string(field, Required::Yes).and_then(|raw| {
            let digits_only = raw.chars().all(|c| c.is_ascii_digit());
            if digits_only && (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&raw.len()) {
                Field::Valid(raw)
            } else {
                self.push(
                    field,
                    IssueCode::InvalidString,
                    "phone must be 10-15 digits",
                );
                Field::Invalid
            }
        })
    }

    fn choice<T>(&mut self, field: &str, required: Required) -> Field<T>
    where
        T: FromStr<Err = ChoiceError>,
    {
        self.string(field, required)
            .and_then(|raw| match raw.parse::<T>() {
                Ok(value) => Field::Valid(value),
                Err(err) => {
                    self.push(field, IssueCode::InvalidEnumValue, enum_message(&err));
                    Field::Invalid
                }
            })
    }

    /// Optional non-negative integer, coerced from a number or numeric string.
    fn budget(&mut self, field: &str) -> Field<i64> {
        let Some(value) = self.present(field) else {
            return Field::Absent;
        };

        let parsed = match value {
            Value::Number(n) => n.as_i64().map_or_else(
                || n.as_f64().map_or(Coerced::NotANumber, Coerced::from_float),
                Coerced::Int,
            ),
            Value::String(s) => Coerced::from_text(s.trim()),
            other => {
                let message = format!("Expected number, received {}", type_name(other));
                self.push(field, IssueCode::InvalidType, message);
                return Field::Invalid;
            }
        };

        match parsed {
            Coerced::Int(n) if n < 0 => {
                self.push(
                    field,
                    IssueCode::TooSmall,
                    "Number must be greater than or equal to 0",
                );
                Field::Invalid
            }
            Coerced::Int(n) => Field::Valid(n),
            Coerced::Fraction => {
                self.push(
                    field,
                    IssueCode::InvalidType,
                    "Expected integer, received float",
                );
                Field::Invalid
            }
            Coerced::Overflow => {
                self.push(
                    field,
                    IssueCode::TooBig,
                    format!("Number must be less than or equal to {}", i64::MAX),
                );
                Field::Invalid
            }
            Coerced::NotANumber => {
                self.push(field, IssueCode::InvalidType, "Expected number, received nan");
                Field::Invalid
            }
        }
    }

    fn tags(&mut self, field: &str) -> Field<Vec<String>> {
        match self.present(field) {
            None => Field::Absent,
            Some(Value::Array(items)) => {
                let mut tags = Vec::with_capacity(items.len());
                let mut ok = true;
                for (index, item) in items.iter().enumerate() {
                    if let Value::String(tag) = item {
                        tags.push(tag.clone());
                    } else {
                        ok = false;
                        let message = format!("Expected string, received {}", type_name(item));
                        self.push(&format!("{field}.{index}"), IssueCode::InvalidType, message);
                    }
                }
                if ok { Field::Valid(tags) } else { Field::Invalid }
            }
            Some(other) => {
                let message = format!("Expected array, received {}", type_name(other));
                self.push(field, IssueCode::InvalidType, message);
                Field::Invalid
            }
        }
    }
}

/// Result of coercing a budget value to an integer.
enum Coerced {
    Int(i64),
    Fraction,
    Overflow,
    NotANumber,
}

impl Coerced {
    fn from_text(text: &str) -> Self {
        if let Ok(n) = text.parse::<i64>() {
            return Self::Int(n);
        }
        text.parse::<f64>()
            .map_or(Self::NotANumber, Self::from_float)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_float(f: f64) -> Self {
        if !f.is_finite() {
            Self::NotANumber
        } else if f.fract() != 0.0 {
            Self::Fraction
        } else if f >= i64::MAX as f64 || f < i64::MIN as f64 {
            Self::Overflow
        } else {
            Self::Int(f as i64)
        }
    }
}

fn enum_message(err: &ChoiceError) -> String {
    let expected: Vec<String> = err.expected.iter().map(|name| format!("'{name}'")).collect();
    format!(
        "Invalid enum value. Expected {}, received '{}'",
        expected.join(" | "),
        err.value
    )
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid() -> Value {
        json!({
            "fullName": "Rohit Sharma",
            "email": "rohit@example.com",
            "phone": "9876543210",
            "city": "Chandigarh",
            "propertyType": "Apartment",
            "bhk": "Three",
            "purpose": "Buy",
            "budgetMin": 5_000_000,
            "budgetMax": 7_500_000,
            "timeline": "ThreeMonths",
            "source": "Website",
            "notes": "Prefers a corner unit",
            "tags": ["hot", "nri"],
            "status": "Qualified"
        })
    }

    fn with(overrides: &Value) -> Value {
        let mut value = valid();
        for (key, v) in overrides.as_object().unwrap() {
            value[key] = v.clone();
        }
        value
    }

    fn without(keys: &[&str]) -> Value {
        let mut value = valid();
        for key in keys {
            value.as_object_mut().unwrap().remove(*key);
        }
        value
    }

    #[test]
    fn test_valid_record_produces_draft() {
        let draft = validate_buyer(&valid()).unwrap();
        assert_eq!(draft.full_name, "Rohit Sharma");
        assert_eq!(draft.email.unwrap().as_str(), "rohit@example.com");
        assert_eq!(draft.city, City::Chandigarh);
        assert_eq!(draft.bhk, Some(Bhk::Three));
        assert_eq!(draft.budget_min, Some(5_000_000));
        assert_eq!(draft.tags, vec!["hot", "nri"]);
        assert_eq!(draft.status, Some(BuyerStatus::Qualified));
    }

    #[test]
    fn test_minimal_record() {
        let record = json!({
            "fullName": "Jo",
            "phone": "0123456789",
            "city": "Other",
            "propertyType": "Plot",
            "purpose": "Rent",
            "timeline": "Exploring",
            "source": "Call"
        });
        let draft = validate_buyer(&record).unwrap();
        assert_eq!(draft.email, None);
        assert_eq!(draft.bhk, None);
        assert!(draft.tags.is_empty());
        assert_eq!(draft.status, None);
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = validate_buyer(&json!([1, 2])).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].message, "Expected object, received array");
    }

    #[test]
    fn test_every_missing_required_field_is_reported() {
        let err = validate_buyer(&json!({})).unwrap_err();
        for field in [
            "fullName",
            "phone",
            "city",
            "propertyType",
            "purpose",
            "timeline",
            "source",
        ] {
            let issue = err.for_field(field).unwrap();
            assert_eq!(issue.message, "Required", "field {field}");
        }
        assert!(!err.has_field("email"));
        assert!(!err.has_field("bhk"));
    }

    #[test]
    fn test_full_name_length_bounds() {
        let err = validate_buyer(&with(&json!({ "fullName": "A" }))).unwrap_err();
        assert_eq!(err.for_field("fullName").unwrap().code, IssueCode::TooSmall);

        let err = validate_buyer(&with(&json!({ "fullName": "x".repeat(81) }))).unwrap_err();
        assert_eq!(err.for_field("fullName").unwrap().code, IssueCode::TooBig);

        assert!(validate_buyer(&with(&json!({ "fullName": "x".repeat(80) }))).is_ok());
    }

    #[test]
    fn test_empty_email_is_absent() {
        let draft = validate_buyer(&with(&json!({ "email": "" }))).unwrap();
        assert_eq!(draft.email, None);
    }

    #[test]
    fn test_bad_email_is_rejected() {
        let err = validate_buyer(&with(&json!({ "email": "not-an-email" }))).unwrap_err();
        let issue = err.for_field("email").unwrap();
        assert_eq!(issue.code, IssueCode::InvalidString);
        assert_eq!(issue.message, "Invalid email");
    }

    #[test]
    fn test_phone_must_be_10_to_15_digits() {
        for bad in ["12345", "1234567890123456", "98765-43210", "+919876543210"] {
            let err = validate_buyer(&with(&json!({ "phone": bad }))).unwrap_err();
            assert_eq!(
                err.for_field("phone").unwrap().message,
                "phone must be 10-15 digits"
            );
        }
        assert!(validate_buyer(&with(&json!({ "phone": "123456789012345" }))).is_ok());
    }

    #[test]
    fn test_unknown_enum_value_lists_choices() {
        let err = validate_buyer(&with(&json!({ "city": "Delhi" }))).unwrap_err();
        let issue = err.for_field("city").unwrap();
        assert_eq!(issue.code, IssueCode::InvalidEnumValue);
        assert_eq!(
            issue.message,
            "Invalid enum value. Expected 'Chandigarh' | 'Mohali' | 'Zirakpur' | 'Panchkula' | 'Other', received 'Delhi'"
        );
    }

    #[test]
    fn test_residential_requires_bhk() {
        for kind in ["Apartment", "Villa"] {
            let mut record = without(&["bhk"]);
            record["propertyType"] = json!(kind);
            let err = validate_buyer(&record).unwrap_err();
            let issue = err.for_field("bhk").unwrap();
            assert_eq!(issue.code, IssueCode::Custom);
            assert_eq!(issue.message, "BHK is required for Apartment and Villa");
        }
    }

    #[test]
    fn test_non_residential_does_not_require_bhk() {
        for kind in ["Plot", "Office", "Retail"] {
            let mut record = without(&["bhk"]);
            record["propertyType"] = json!(kind);
            assert!(validate_buyer(&record).is_ok(), "{kind} should not need bhk");
        }
    }

    #[test]
    fn test_invalid_bhk_reports_enum_issue_only() {
        let err = validate_buyer(&with(&json!({ "bhk": "Five" }))).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].code, IssueCode::InvalidEnumValue);
    }

    #[test]
    fn test_budget_max_below_min_is_rejected() {
        let err = validate_buyer(&with(&json!({ "budgetMin": 100, "budgetMax": 99 }))).unwrap_err();
        let issue = err.for_field("budgetMax").unwrap();
        assert_eq!(issue.code, IssueCode::Custom);
        assert_eq!(issue.message, "budgetMax must be >= budgetMin");
    }

    #[test]
    fn test_budget_equal_and_one_sided_are_accepted() {
        assert!(validate_buyer(&with(&json!({ "budgetMin": 100, "budgetMax": 100 }))).is_ok());
        assert!(validate_buyer(&without(&["budgetMin"])).is_ok());
        assert!(validate_buyer(&without(&["budgetMax"])).is_ok());
    }

    #[test]
    fn test_budget_is_coerced_from_strings() {
        let draft =
            validate_buyer(&with(&json!({ "budgetMin": " 2500000 ", "budgetMax": "3000000" })))
                .unwrap();
        assert_eq!(draft.budget_min, Some(2_500_000));
        assert_eq!(draft.budget_max, Some(3_000_000));
    }

    #[test]
    fn test_budget_rules() {
        let err = validate_buyer(&with(&json!({ "budgetMin": -1 }))).unwrap_err();
        assert_eq!(err.for_field("budgetMin").unwrap().code, IssueCode::TooSmall);

        let err = validate_buyer(&with(&json!({ "budgetMin": 10.5 }))).unwrap_err();
        assert_eq!(
            err.for_field("budgetMin").unwrap().message,
            "Expected integer, received float"
        );

        let err = validate_buyer(&with(&json!({ "budgetMax": "lots" }))).unwrap_err();
        assert_eq!(
            err.for_field("budgetMax").unwrap().message,
            "Expected number, received nan"
        );

        let err = validate_buyer(&with(&json!({ "budgetMax": true }))).unwrap_err();
        assert_eq!(err.for_field("budgetMax").unwrap().code, IssueCode::InvalidType);
    }

    #[test]
    fn test_invalid_budget_skips_cross_check() {
        let err =
            validate_buyer(&with(&json!({ "budgetMin": "abc", "budgetMax": 1 }))).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert!(err.has_field("budgetMin"));
    }

    #[test]
    fn test_notes_limit() {
        assert!(validate_buyer(&with(&json!({ "notes": "n".repeat(1000) }))).is_ok());
        let err = validate_buyer(&with(&json!({ "notes": "n".repeat(1001) }))).unwrap_err();
        assert_eq!(err.for_field("notes").unwrap().code, IssueCode::TooBig);
    }

    #[test]
    fn test_tags_must_be_array_of_strings() {
        let err = validate_buyer(&with(&json!({ "tags": "hot,nri" }))).unwrap_err();
        assert_eq!(
            err.for_field("tags").unwrap().message,
            "Expected array, received string"
        );

        let err = validate_buyer(&with(&json!({ "tags": ["ok", 3] }))).unwrap_err();
        assert!(err.has_field("tags.1"));
    }

    #[test]
    fn test_null_optional_fields_are_absent() {
        let draft = validate_buyer(&with(&json!({
            "email": null, "budgetMin": null, "notes": null, "tags": null, "status": null
        })))
        .unwrap();
        assert_eq!(draft.email, None);
        assert_eq!(draft.budget_min, None);
        assert_eq!(draft.notes, None);
        assert!(draft.tags.is_empty());
        assert_eq!(draft.status, None);
    }

    #[test]
    fn test_wrong_type_for_required_string() {
        let err = validate_buyer(&with(&json!({ "fullName": 42 }))).unwrap_err();
        assert_eq!(
            err.for_field("fullName").unwrap().message,
            "Expected string, received number"
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        assert!(validate_buyer(&with(&json!({ "favouriteColour": "teal" }))).is_ok());
    }

    #[test]
    fn test_record_from_text_fields_normalises_cells() {
        let record = record_from_text_fields([
            ("fullName", "  Meera Nair "),
            ("email", ""),
            ("tags", "hot, , investor ,"),
            ("budgetMin", "   "),
            ("", "ignored"),
        ]);
        assert_eq!(record["fullName"], "Meera Nair");
        assert_eq!(record["email"], Value::Null);
        assert_eq!(record["budgetMin"], Value::Null);
        assert_eq!(record["tags"], json!(["hot", "investor"]));
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_omitted_lists_only_missing_optional_keys() {
        let draft = validate_buyer(&without(&["email", "notes", "tags"])).unwrap();
        assert!(draft.omitted.contains(&OptionalField::Email));
        assert!(draft.omitted.contains(&OptionalField::Tags));
        assert!(!draft.omitted.contains(&OptionalField::Bhk));

        let draft = validate_buyer(&with(&json!({ "email": null, "notes": "" }))).unwrap();
        assert!(!draft.omitted.contains(&OptionalField::Email));
        assert!(!draft.omitted.contains(&OptionalField::Notes));
    }

    #[test]
    fn test_display_joins_issues() {
        let err = validate_buyer(&with(&json!({ "phone": "1", "city": "Delhi" }))).unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("phone: phone must be 10-15 digits; city: Invalid enum value."));
    }
}
