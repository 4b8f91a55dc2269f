//! Strategy data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One side (buy or sell) of a strategy rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub indicator: String,
    pub threshold: f64,
}

impl Condition {
    pub fn new(indicator: impl Into<String>, threshold: f64) -> Self {
        Self {
            indicator: indicator.into(),
            threshold,
        }
    }
}

/// Lifecycle flag of a stored strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyStatus {
    Active,
    Inactive,
}

impl StrategyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyStatus::Active => "active",
            StrategyStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(StrategyStatus::Active),
            "inactive" => Some(StrategyStatus::Inactive),
            _ => None,
        }
    }
}

/// Client-supplied strategy fields for create and update.
///
/// Deserializing into this type is the schema check: every field is required,
/// `status` must be `active` or `inactive`, and unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyDraft {
    pub name: String,
    pub description: String,
    pub asset_type: String,
    #[serde(alias = "buy_condition")]
    pub buy_conditions: Condition,
    #[serde(alias = "sell_condition")]
    pub sell_conditions: Condition,
    pub status: StrategyStatus,
}

pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 200;
pub const ASSET_TYPE_MAX_LEN: usize = 50;

fn check_len(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{} must be at most {} characters", field, max));
    }
    Ok(())
}

impl StrategyDraft {
    /// Column limits of the `strategies` table, enforced for every backend
    pub fn validate(&self) -> Result<(), String> {
        check_len("name", &self.name, NAME_MAX_LEN)?;
        check_len("description", &self.description, DESCRIPTION_MAX_LEN)?;
        check_len("asset_type", &self.asset_type, ASSET_TYPE_MAX_LEN)
    }
}

/// Persisted strategy owned by a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub asset_type: String,
    pub buy_conditions: Condition,
    pub sell_conditions: Condition,
    pub status: StrategyStatus,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StrategyRecord {
    pub fn from_draft(id: i64, user_id: i64, draft: StrategyDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            asset_type: draft.asset_type,
            buy_conditions: draft.buy_conditions,
            sell_conditions: draft.sell_conditions,
            status: draft.status,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the editable fields, keeping id, owner and creation time
    pub fn apply_draft(&mut self, draft: StrategyDraft, now: DateTime<Utc>) {
        self.name = draft.name;
        self.description = draft.description;
        self.asset_type = draft.asset_type;
        self.buy_conditions = draft.buy_conditions;
        self.sell_conditions = draft.sell_conditions;
        self.status = draft.status;
        self.updated_at = now;
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    /// The read-only view the simulation engine consumes
    pub fn definition(&self) -> Strategy {
        Strategy {
            id: self.id,
            buy_condition: self.buy_conditions.clone(),
            sell_condition: self.sell_conditions.clone(),
            asset_type: self.asset_type.clone(),
        }
    }
}

/// Strategy as seen by the simulation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: i64,
    #[serde(alias = "buy_conditions")]
    pub buy_condition: Condition,
    #[serde(alias = "sell_conditions")]
    pub sell_condition: Condition,
    pub asset_type: String,
}
