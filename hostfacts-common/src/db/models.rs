//! Database models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A fact name scoped to one importer taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactName {
    pub guid: Uuid,
    pub name: String,
    pub fact_type: String,
}

impl FactName {
    pub fn new(fact_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: name.into(),
            fact_type: fact_type.into(),
        }
    }
}

/// The value of one fact for one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactValue {
    pub guid: Uuid,
    pub host_id: Uuid,
    pub fact_name_id: Uuid,
    pub value: String,
}

impl FactValue {
    pub fn new(host_id: Uuid, fact_name_id: Uuid, value: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            host_id,
            fact_name_id,
            value: value.into(),
        }
    }
}

/// A stored fact value joined with its fact name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFact {
    pub value_id: Uuid,
    pub name: String,
    pub value: String,
}

/// Kind of change recorded in `fact_audits`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Destroy,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Destroy => "destroy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(AuditAction::Create),
            "update" => Some(AuditAction::Update),
            "destroy" => Some(AuditAction::Destroy),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audited fact value change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactAudit {
    pub id: i64,
    pub host_id: Uuid,
    pub fact_name: String,
    pub fact_type: String,
    pub action: AuditAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: NaiveDateTime,
}
