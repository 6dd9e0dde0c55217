//! Core domain types for LeadScout company and contact discovery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for company identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub Uuid);

impl CompanyId {
    /// Generate a new time-sortable company identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for CompanyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CompanyId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A UUID v7 wrapper for contact identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub Uuid);

impl ContactId {
    /// Generate a new time-sortable contact identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ContactId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ContactId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// CompanyStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a company record.
///
/// Status is the sole cache-control signal: a `Completed` company with
/// contacts is served from the store without any network or model calls.
/// Legal transitions are `Pending → Processing → {Completed, Failed}`;
/// `Ignore` is an operator-set terminal state the pipeline never overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Ignore,
}

impl CompanyStatus {
    /// Stable string form used in the database and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Ignore => "ignore",
        }
    }
}

impl std::fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CompanyStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("unknown company status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Department
// ---------------------------------------------------------------------------

/// Coarse role category steering both query generation and extraction prompts.
///
/// `Procurement` and `Sales` are the two canonical discovery tracks; `Other`
/// carries a free-form label and falls back to generic query templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Department {
    Procurement,
    Sales,
    Other(String),
}

impl Department {
    /// Canonical tag persisted on contacts.
    pub fn tag(&self) -> &str {
        match self {
            Self::Procurement => "procurement",
            Self::Sales => "sales",
            Self::Other(label) => label,
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Company
// ---------------------------------------------------------------------------

/// A company under discovery; unit of caching and status tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier (UUID v7).
    pub id: CompanyId,
    /// Canonical (English) name; unique key for lookups.
    pub name: String,
    /// Local-language name, if different from the canonical name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    /// Country used for search localization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Resolved official domain (e.g. `acme.com`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Industry label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Free-text market positioning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positioning: Option<String>,
    /// Free-text company brief.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    /// Generic mailboxes found on public pages (deduplicated union).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_emails: Vec<String>,
    /// Lifecycle status.
    pub status: CompanyStatus,
    /// When the record was first created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

/// A discovered individual associated with a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier (UUID v7).
    pub id: ContactId,
    /// Owning company.
    pub company_id: CompanyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Job title as extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Canonical department tag ("procurement" / "sales").
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_url: Option<String>,
    /// Provenance URL of the search result the contact was extracted from,
    /// or `"N/A"` when none was available.
    pub source: String,
    /// Extraction confidence in [0, 1], passed through from the model.
    pub confidence: f64,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Extraction outputs (transient)
// ---------------------------------------------------------------------------

/// Company profile fields extracted from search results.
///
/// Every field is optional; extraction never invents values unsupported by
/// the input text, and empty strings normalize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positioning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
}

impl CompanyProfile {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.domain.is_none()
            && self.industry.is_none()
            && self.positioning.is_none()
            && self.brief.is_none()
    }
}

/// A contact candidate as extracted, before department tagging, source
/// attribution, and validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Search types (transient)
// ---------------------------------------------------------------------------

/// A single raw search hit from a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// A search query plus optional locale parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// The query text (`q`).
    pub query: String,
    /// Region code (`gl`), e.g. `vn`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Language code (`hl`), e.g. `vi`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Location label, e.g. `Vietnam`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl QuerySpec {
    /// A query with no locale constraints (global search).
    pub fn global(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            region: None,
            language: None,
            location: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_id_roundtrip() {
        let id = CompanyId::new();
        let s = id.to_string();
        let parsed: CompanyId = s.parse().expect("parse CompanyId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            CompanyStatus::Pending,
            CompanyStatus::Processing,
            CompanyStatus::Completed,
            CompanyStatus::Failed,
            CompanyStatus::Ignore,
        ] {
            let parsed: CompanyStatus = status.as_str().parse().expect("parse status");
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<CompanyStatus>().is_err());
    }

    #[test]
    fn department_tags() {
        assert_eq!(Department::Procurement.tag(), "procurement");
        assert_eq!(Department::Sales.tag(), "sales");
        assert_eq!(Department::Other("logistics".into()).tag(), "logistics");
    }

    #[test]
    fn profile_emptiness() {
        assert!(CompanyProfile::default().is_empty());
        let profile = CompanyProfile {
            domain: Some("acme.com".into()),
            ..Default::default()
        };
        assert!(!profile.is_empty());
    }

    #[test]
    fn candidate_deserializes_with_missing_fields() {
        let candidate: CandidateContact =
            serde_json::from_str(r#"{"full_name": "Jane Tran"}"#).expect("deserialize");
        assert_eq!(candidate.full_name.as_deref(), Some("Jane Tran"));
        assert!(candidate.email.is_none());
        assert_eq!(candidate.confidence, 0.0);
    }

    #[test]
    fn query_spec_global_has_no_locale() {
        let spec = QuerySpec::global("acme official website");
        assert!(spec.region.is_none());
        assert!(spec.language.is_none());
        assert!(spec.location.is_none());
    }
}
