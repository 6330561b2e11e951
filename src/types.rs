use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A principal managed by the realm's agency API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalRepresentation {
    /// Server-assigned identifier; absent in create requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    /// Principal kind, e.g. "CORPORATION" or "NATURAL_PERSON"
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspension_reason: Option<String>,
}

/// Body of a principal suspension request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspendRequest {
    pub reason: String,
}

/// Realm-level agency configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencyConfigRepresentation {
    pub enabled: bool,
    pub default_jurisdiction: String,
    pub compliance_mode: String,
    pub mandates_required: bool,
    pub default_mandate_validity_days: i64,
    pub qualifications_enforced: bool,
    pub audit_level: String,
    pub agent_passports_enabled: bool,
    pub max_passports_per_principal: i64,

    /// Aggregate counts, present on reads only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegate_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mandate_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_count: Option<i64>,
}
