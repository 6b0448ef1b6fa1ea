//! Buyer lead models.
//!
//! - [`BuyerDraft`] - a validated payload, produced by [`crate::validation`]
//! - [`Buyer`] - a stored lead
//! - [`BuyerSummary`] - the subset returned by list endpoints
//! - [`BuyerHistory`] - an append-only audit entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::validation::{IssueCode, ValidationErrors};

use super::email::Email;
use super::id::{BuyerId, HistoryId};
use super::status::{Bhk, BuyerStatus, City, LeadSource, PropertyType, Purpose, Timeline};

/// Fields compared when computing an update diff, in display order.
const TRACKED_FIELDS: &[&str] = &[
    "fullName",
    "email",
    "phone",
    "city",
    "propertyType",
    "bhk",
    "purpose",
    "budgetMin",
    "budgetMax",
    "timeline",
    "source",
    "notes",
    "tags",
    "status",
];

/// Optional buyer fields that a payload may leave out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalField {
    Email,
    Bhk,
    BudgetMin,
    BudgetMax,
    Notes,
    Tags,
}

impl OptionalField {
    pub const ALL: &'static [Self] = &[
        Self::Email,
        Self::Bhk,
        Self::BudgetMin,
        Self::BudgetMax,
        Self::Notes,
        Self::Tags,
    ];

    /// camelCase payload key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Bhk => "bhk",
            Self::BudgetMin => "budgetMin",
            Self::BudgetMax => "budgetMax",
            Self::Notes => "notes",
            Self::Tags => "tags",
        }
    }
}

/// A buyer payload that passed validation.
///
/// `status` is optional: new leads default to [`BuyerStatus::New`] and updates
/// without a status keep the current one. Optional fields listed in `omitted`
/// were not in the payload at all; an update keeps their stored values, while a
/// `null` or empty value clears them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerDraft {
    pub full_name: String,
    pub email: Option<Email>,
    pub phone: String,
    pub city: City,
    pub property_type: PropertyType,
    pub bhk: Option<Bhk>,
    pub purpose: Purpose,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: Timeline,
    pub source: LeadSource,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub status: Option<BuyerStatus>,
    #[serde(skip)]
    pub omitted: Vec<OptionalField>,
}

/// A stored buyer lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub id: BuyerId,
    pub full_name: String,
    pub email: Option<Email>,
    pub phone: String,
    pub city: City,
    pub property_type: PropertyType,
    pub bhk: Option<Bhk>,
    pub purpose: Purpose,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: Timeline,
    pub source: LeadSource,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub status: BuyerStatus,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Buyer {
    /// Build a new lead from a validated draft.
    #[must_use]
    pub fn from_draft(
        id: BuyerId,
        draft: BuyerDraft,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            full_name: draft.full_name,
            email: draft.email,
            phone: draft.phone,
            city: draft.city,
            property_type: draft.property_type,
            bhk: draft.bhk,
            purpose: draft.purpose,
            budget_min: draft.budget_min,
            budget_max: draft.budget_max,
            timeline: draft.timeline,
            source: draft.source,
            notes: draft.notes,
            tags: draft.tags,
            status: draft.status.unwrap_or_default(),
            owner_id: owner_id.to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the editable fields present in the draft.
    ///
    /// Omitted optional fields and a missing status keep their current values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] when the merged budgets would leave
    /// `budgetMax` below `budgetMin`. The buyer is unchanged in that case.
    pub fn apply(&mut self, draft: BuyerDraft, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let keep = |field: OptionalField| draft.omitted.contains(&field);

        let budget_min = if keep(OptionalField::BudgetMin) {
            self.budget_min
        } else {
            draft.budget_min
        };
        let budget_max = if keep(OptionalField::BudgetMax) {
            self.budget_max
        } else {
            draft.budget_max
        };
        if let (Some(min), Some(max)) = (budget_min, budget_max) {
            if max < min {
                return Err(ValidationErrors::single(
                    "budgetMax",
                    IssueCode::Custom,
                    "budgetMax must be >= budgetMin",
                ));
            }
        }

        if !keep(OptionalField::Email) {
            self.email = draft.email;
        }
        if !keep(OptionalField::Bhk) {
            self.bhk = draft.bhk;
        }
        if !keep(OptionalField::Notes) {
            self.notes = draft.notes;
        }
        if !keep(OptionalField::Tags) {
            self.tags = draft.tags;
        }
        self.full_name = draft.full_name;
        self.phone = draft.phone;
        self.city = draft.city;
        self.property_type = draft.property_type;
        self.purpose = draft.purpose;
        self.budget_min = budget_min;
        self.budget_max = budget_max;
        self.timeline = draft.timeline;
        self.source = draft.source;
        if let Some(status) = draft.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }

    /// The list-view projection of this lead.
    #[must_use]
    pub fn summary(&self) -> BuyerSummary {
        BuyerSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            city: self.city,
            property_type: self.property_type,
            status: self.status,
            updated_at: self.updated_at,
        }
    }
}

/// Projection of a buyer used by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct BuyerSummary {
    pub id: BuyerId,
    pub full_name: String,
    pub email: Option<Email>,
    pub phone: String,
    pub city: City,
    pub property_type: PropertyType,
    pub status: BuyerStatus,
    pub updated_at: DateTime<Utc>,
}

/// Audit entry for a create or update of a buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct BuyerHistory {
    pub id: HistoryId,
    pub buyer_id: BuyerId,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    pub diff: Value,
}

impl BuyerHistory {
    /// Diff payload recorded when a lead is created.
    #[must_use]
    pub fn created_diff() -> Value {
        json!({ "created": true })
    }
}

/// Field-level diff between two versions of a buyer.
///
/// Returns `{"updated": {"<field>": {"from": <old>, "to": <new>}}}` covering only
/// the editable fields whose values differ. An update that changes nothing yields
/// `{"updated": {}}`.
#[must_use]
pub fn diff_buyer(before: &Buyer, after: &Buyer) -> Value {
    let old = as_object(before);
    let new = as_object(after);

    let mut changes = Map::new();
    for field in TRACKED_FIELDS {
        let from = old.get(*field).cloned().unwrap_or(Value::Null);
        let to = new.get(*field).cloned().unwrap_or(Value::Null);
        if from != to {
            changes.insert((*field).to_owned(), json!({ "from": from, "to": to }));
        }
    }

    json!({ "updated": changes })
}

fn as_object(buyer: &Buyer) -> Map<String, Value> {
    match serde_json::to_value(buyer) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
