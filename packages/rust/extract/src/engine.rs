//! The extraction engine: schema-constrained first, text + recovery second.

use tracing::{debug, info, instrument, warn};

use leadscout_shared::{CandidateContact, CompanyProfile, Department, SearchResult};

use crate::client::ModelClient;
use crate::prompts;
use crate::recovery::{coerce_to_array, recover_json};

/// Local parts of role mailboxes that never identify an individual.
const GENERIC_MAILBOXES: [&str; 13] = [
    "info",
    "contact",
    "sales",
    "support",
    "admin",
    "hello",
    "office",
    "enquiry",
    "enquiries",
    "inquiry",
    "inquiries",
    "marketing",
    "hr",
];

// ---------------------------------------------------------------------------
// Extraction outcome
// ---------------------------------------------------------------------------

/// Tagged outcome of an extraction attempt.
///
/// `Typed` means the schema-constrained call produced the value; `Recovered`
/// means the free-text fallback plus the JSON recovery parser did; `Empty`
/// means both paths yielded nothing. Callers can treat `Typed`/`Recovered`
/// alike or log the distinction.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Typed(T),
    Recovered(T),
    Empty,
}

impl<T> Extraction<T> {
    /// The extracted value, if any path produced one.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Typed(value) | Self::Recovered(value) => Some(value),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Label for logs.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Typed(_) => "typed",
            Self::Recovered(_) => "recovered",
            Self::Empty => "empty",
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Turns aggregated search results into typed profile/contact records.
pub struct ExtractionEngine {
    model: Box<dyn ModelClient>,
}

impl ExtractionEngine {
    pub fn new(model: Box<dyn ModelClient>) -> Self {
        Self { model }
    }

    /// Extract company profile fields from aggregated results.
    #[instrument(skip_all, fields(results = results.len()))]
    pub async fn extract_profile(
        &self,
        results: &[SearchResult],
        country: Option<&str>,
    ) -> Extraction<CompanyProfile> {
        if results.is_empty() {
            debug!("no search results, skipping profile extraction");
            return Extraction::Empty;
        }

        let prompt = prompts::company_profile_prompt(
            &prompts::render_results(results),
            &prompts::country_context(country),
        );

        // Schema-constrained path.
        match self
            .model
            .complete_structured(&prompt, &prompts::company_profile_schema())
            .await
        {
            Ok(value) => {
                if let Some(profile) = profile_from_value(value) {
                    if !profile.is_empty() {
                        info!(path = "typed", "profile extraction complete");
                        return Extraction::Typed(profile);
                    }
                    return Extraction::Empty;
                }
                warn!("structured profile output had unexpected shape, degrading");
            }
            Err(e) => {
                warn!(error = %e, "structured profile call failed, degrading to text");
            }
        }

        // Free-text + recovery path.
        match self.model.complete(&prompt).await {
            Ok(text) => match recover_json(&text).and_then(profile_from_value) {
                Some(profile) if !profile.is_empty() => {
                    info!(path = "recovered", "profile extraction complete");
                    Extraction::Recovered(profile)
                }
                _ => {
                    debug!("no profile recoverable from text output");
                    Extraction::Empty
                }
            },
            Err(e) => {
                warn!(error = %e, "text profile call failed");
                Extraction::Empty
            }
        }
    }

    /// Extract department contact candidates from aggregated results.
    #[instrument(skip_all, fields(results = results.len(), department = %department))]
    pub async fn extract_contacts(
        &self,
        results: &[SearchResult],
        department: &Department,
        country: Option<&str>,
    ) -> Extraction<Vec<CandidateContact>> {
        if results.is_empty() {
            debug!("no search results, skipping contact extraction");
            return Extraction::Empty;
        }

        let prompt = prompts::contacts_prompt(
            department.tag(),
            &prompts::render_results(results),
            &prompts::country_context(country),
        );

        // Schema-constrained path.
        match self
            .model
            .complete_structured(&prompt, &prompts::contacts_schema())
            .await
        {
            Ok(value) => {
                let candidates = candidates_from_value(value);
                if !candidates.is_empty() {
                    info!(path = "typed", count = candidates.len(), "contact extraction complete");
                    return Extraction::Typed(candidates);
                }
                // An empty-but-valid reply is still a typed "nothing found":
                // don't burn a second model call on it.
                return Extraction::Empty;
            }
            Err(e) => {
                warn!(error = %e, "structured contacts call failed, degrading to text");
            }
        }

        // Free-text + recovery path.
        match self.model.complete(&prompt).await {
            Ok(text) => match recover_json(&text) {
                Some(value) => {
                    let candidates = candidates_from_value(value);
                    if candidates.is_empty() {
                        Extraction::Empty
                    } else {
                        info!(
                            path = "recovered",
                            count = candidates.len(),
                            "contact extraction complete"
                        );
                        Extraction::Recovered(candidates)
                    }
                }
                None => {
                    debug!("no contacts recoverable from text output");
                    Extraction::Empty
                }
            },
            Err(e) => {
                warn!(error = %e, "text contacts call failed");
                Extraction::Empty
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Value shaping
// ---------------------------------------------------------------------------

/// Shape a JSON value into a profile.
///
/// Returns `None` on a shape mismatch (non-object reply) so the caller can
/// degrade to the text path.
fn profile_from_value(value: serde_json::Value) -> Option<CompanyProfile> {
    if !value.is_object() {
        return None;
    }
    let profile: CompanyProfile = serde_json::from_value(value).ok()?;
    Some(CompanyProfile {
        domain: clean(profile.domain),
        industry: clean(profile.industry),
        positioning: clean(profile.positioning),
        brief: clean(profile.brief),
    })
}

/// Shape a JSON value into validated contact candidates.
///
/// Tolerates both a bare array and a `{"contacts": [...]}` wrapper; items
/// that fail to deserialize are skipped, not fatal.
fn candidates_from_value(value: serde_json::Value) -> Vec<CandidateContact> {
    coerce_to_array(value)
        .into_iter()
        .filter_map(|item| serde_json::from_value::<CandidateContact>(item).ok())
        .filter_map(validate_candidate)
        .collect()
}

/// Normalize a candidate and apply the exclusion rules.
///
/// Excluded: candidates with no identifying field (neither name nor email)
/// and generic role mailboxes. Confidence is passed through, clamped into
/// [0, 1].
fn validate_candidate(candidate: CandidateContact) -> Option<CandidateContact> {
    let full_name = clean(candidate.full_name);
    let email = clean(candidate.email);

    if full_name.is_none() && email.is_none() {
        return None;
    }

    if let Some(email) = email.as_deref() {
        if is_generic_mailbox(email) {
            debug!(%email, "excluding generic role mailbox");
            return None;
        }
    }

    Some(CandidateContact {
        full_name,
        email,
        role: clean(candidate.role),
        linkedin_url: clean(candidate.linkedin_url),
        twitter_url: clean(candidate.twitter_url),
        confidence: candidate.confidence.clamp(0.0, 1.0),
    })
}

/// True for role mailboxes like `info@`, `sales@`, `contact@`.
pub fn is_generic_mailbox(email: &str) -> bool {
    let Some((local, _domain)) = email.split_once('@') else {
        return false;
    };
    let local = local.to_lowercase();
    GENERIC_MAILBOXES.contains(&local.as_str())
}

/// Empty or whitespace-only strings become `None`.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use leadscout_shared::{LeadScoutError, Result};

    use super::*;

    /// A scripted model for engine tests.
    struct FakeModel {
        structured: Result<serde_json::Value>,
        text: Result<String>,
    }

    impl FakeModel {
        fn structured_ok(value: serde_json::Value) -> Self {
            Self {
                structured: Ok(value),
                text: Err(LeadScoutError::Extraction("text path not scripted".into())),
            }
        }

        fn text_only(text: &str) -> Self {
            Self {
                structured: Err(LeadScoutError::Extraction("structured path down".into())),
                text: Ok(text.into()),
            }
        }

        fn both_down() -> Self {
            Self {
                structured: Err(LeadScoutError::Extraction("down".into())),
                text: Err(LeadScoutError::Extraction("down".into())),
            }
        }
    }

    #[async_trait]
    impl ModelClient for FakeModel {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            match &self.text {
                Ok(t) => Ok(t.clone()),
                Err(_) => Err(LeadScoutError::Extraction("down".into())),
            }
        }

        async fn complete_structured(
            &self,
            _prompt: &str,
            _schema: &serde_json::Value,
        ) -> Result<serde_json::Value> {
            match &self.structured {
                Ok(v) => Ok(v.clone()),
                Err(_) => Err(LeadScoutError::Extraction("down".into())),
            }
        }
    }

    fn results() -> Vec<SearchResult> {
        vec![SearchResult {
            title: "Acme Co".into(),
            link: "https://acme.com".into(),
            snippet: "Acme Co is a textile manufacturer".into(),
        }]
    }

    #[tokio::test]
    async fn typed_profile_path() {
        let engine = ExtractionEngine::new(Box::new(FakeModel::structured_ok(json!({
            "domain": "acme.com",
            "industry": "textiles",
            "positioning": "",
            "brief": "Textile maker"
        }))));

        let extraction = engine.extract_profile(&results(), Some("Vietnam")).await;
        let Extraction::Typed(profile) = extraction else {
            panic!("expected typed extraction");
        };
        assert_eq!(profile.domain.as_deref(), Some("acme.com"));
        // Empty strings normalize to None.
        assert!(profile.positioning.is_none());
    }

    #[tokio::test]
    async fn profile_recovers_from_fenced_text() {
        let engine = ExtractionEngine::new(Box::new(FakeModel::text_only(
            "Sure! Here is the data:\n```json\n{\"domain\": \"acme.com\"}\n```",
        )));

        let extraction = engine.extract_profile(&results(), None).await;
        let Extraction::Recovered(profile) = extraction else {
            panic!("expected recovered extraction");
        };
        assert_eq!(profile.domain.as_deref(), Some("acme.com"));
    }

    #[tokio::test]
    async fn profile_empty_when_both_paths_fail() {
        let engine = ExtractionEngine::new(Box::new(FakeModel::both_down()));
        assert!(engine.extract_profile(&results(), None).await.is_empty());
    }

    #[tokio::test]
    async fn profile_empty_for_no_results() {
        let engine = ExtractionEngine::new(Box::new(FakeModel::structured_ok(json!({}))));
        assert!(engine.extract_profile(&[], None).await.is_empty());
    }

    #[tokio::test]
    async fn typed_contacts_path_unwraps_wrapper() {
        let engine = ExtractionEngine::new(Box::new(FakeModel::structured_ok(json!({
            "contacts": [
                {"full_name": "Jane Tran", "email": "jane.tran@acme.com", "role": "Procurement Manager", "confidence": 0.9}
            ]
        }))));

        let extraction = engine
            .extract_contacts(&results(), &Department::Procurement, None)
            .await;
        let Extraction::Typed(candidates) = extraction else {
            panic!("expected typed extraction");
        };
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].email.as_deref(), Some("jane.tran@acme.com"));
    }

    #[tokio::test]
    async fn contacts_recover_from_bare_array_text() {
        let engine = ExtractionEngine::new(Box::new(FakeModel::text_only(
            r#"[{'full_name': 'Jane Tran', 'email': 'jane.tran@acme.com', 'confidence': 0.8},]"#,
        )));

        let extraction = engine
            .extract_contacts(&results(), &Department::Sales, None)
            .await;
        let Extraction::Recovered(candidates) = extraction else {
            panic!("expected recovered extraction");
        };
        assert_eq!(candidates[0].full_name.as_deref(), Some("Jane Tran"));
    }

    #[tokio::test]
    async fn generic_mailboxes_are_excluded() {
        let engine = ExtractionEngine::new(Box::new(FakeModel::structured_ok(json!({
            "contacts": [
                {"full_name": "Front Desk", "email": "info@acme.com", "confidence": 0.9},
                {"full_name": "Jane Tran", "email": "jane.tran@acme.com", "confidence": 0.9}
            ]
        }))));

        let candidates = engine
            .extract_contacts(&results(), &Department::Sales, None)
            .await
            .into_value()
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].email.as_deref(), Some("jane.tran@acme.com"));
    }

    #[tokio::test]
    async fn role_word_in_local_part_is_not_generic() {
        // "buyer@" is a person-style mailbox, not in the generic set.
        let engine = ExtractionEngine::new(Box::new(FakeModel::structured_ok(json!({
            "contacts": [
                {"full_name": "Buyer Desk", "email": "buyer@example.com", "confidence": 0.9}
            ]
        }))));

        let candidates = engine
            .extract_contacts(&results(), &Department::Procurement, None)
            .await
            .into_value()
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].confidence, 0.9);
    }

    #[tokio::test]
    async fn unidentifiable_candidates_are_excluded() {
        let engine = ExtractionEngine::new(Box::new(FakeModel::structured_ok(json!({
            "contacts": [
                {"role": "Manager", "confidence": 0.5},
                {"full_name": "  ", "email": "", "confidence": 0.5},
                {"full_name": "Jane Tran", "confidence": 0.5}
            ]
        }))));

        let candidates = engine
            .extract_contacts(&results(), &Department::Sales, None)
            .await
            .into_value()
            .unwrap();
        // Only the named candidate survives; email-less is still reported
        // here (persistence-time validation drops it later).
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].full_name.as_deref(), Some("Jane Tran"));
    }

    #[tokio::test]
    async fn confidence_is_clamped() {
        let engine = ExtractionEngine::new(Box::new(FakeModel::structured_ok(json!({
            "contacts": [
                {"full_name": "A", "confidence": 7.5},
                {"full_name": "B", "confidence": -1.0}
            ]
        }))));

        let candidates = engine
            .extract_contacts(&results(), &Department::Sales, None)
            .await
            .into_value()
            .unwrap();
        assert_eq!(candidates[0].confidence, 1.0);
        assert_eq!(candidates[1].confidence, 0.0);
    }

    #[tokio::test]
    async fn contacts_empty_when_text_has_no_json() {
        let engine = ExtractionEngine::new(Box::new(FakeModel::text_only(
            "I could not find any contacts in the provided results.",
        )));
        let extraction = engine
            .extract_contacts(&results(), &Department::Sales, None)
            .await;
        assert!(extraction.is_empty());
    }

    #[test]
    fn generic_mailbox_detection() {
        assert!(is_generic_mailbox("info@acme.com"));
        assert!(is_generic_mailbox("SALES@acme.com"));
        assert!(!is_generic_mailbox("jane.tran@acme.com"));
        assert!(!is_generic_mailbox("not-an-email"));
    }

    #[test]
    fn extraction_path_labels() {
        assert_eq!(Extraction::Typed(()).path(), "typed");
        assert_eq!(Extraction::Recovered(()).path(), "recovered");
        assert_eq!(Extraction::<()>::Empty.path(), "empty");
    }
}
