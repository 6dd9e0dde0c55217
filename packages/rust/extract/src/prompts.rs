//! Prompt templates for profile and contact extraction.

use leadscout_shared::SearchResult;

/// Render search results as the JSON block embedded in prompts.
pub fn render_results(results: &[SearchResult]) -> String {
    serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".into())
}

/// A one-line country hint for the model, empty when no country is known.
pub fn country_context(country: Option<&str>) -> String {
    match country {
        Some(country) => format!("This company is located in {country}."),
        None => String::new(),
    }
}

/// Prompt to extract company profile fields from search results.
pub fn company_profile_prompt(results_json: &str, country_context: &str) -> String {
    format!(
        r#"Extract the company's official domain, industry, market positioning, and a brief introduction from the search results below.

{country_context}

Search results:
{results_json}

Return JSON in this exact shape:
{{
    "domain": "official domain, e.g. acme.com",
    "industry": "industry label",
    "positioning": "market positioning, competitive strengths, target customers (max 200 words)",
    "brief": "main business, products, services, scale (max 300 words)"
}}

Requirements:
1. Use an empty string for any field the search results do not support.
2. Base positioning and brief strictly on the search results; never invent facts.
3. The domain must be the bare registrable domain, without scheme or path.
4. Keep the language concise."#
    )
}

/// Prompt to extract department contacts from search results.
pub fn contacts_prompt(department: &str, results_json: &str, country_context: &str) -> String {
    format!(
        r#"Extract key {department} contacts from the search results below.

{country_context}

Search results:
{results_json}

Return every contact found as a JSON array:
[
    {{
        "full_name": "name",
        "email": "email address",
        "role": "job title",
        "linkedin_url": "LinkedIn URL if present",
        "twitter_url": "Twitter/X URL if present",
        "confidence": 0.0
    }}
]

Requirements:
1. Only include real, verifiable email addresses.
2. Exclude generic mailboxes such as contact@, info@, sales@.
3. Score confidence in [0, 1] by completeness and reliability of the evidence.
4. Return an empty array [] when no contacts are found."#
    )
}

/// JSON schema for the structured company-profile call.
pub fn company_profile_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "domain": {"type": "string"},
            "industry": {"type": "string"},
            "positioning": {"type": "string"},
            "brief": {"type": "string"}
        },
        "required": ["domain", "industry", "positioning", "brief"],
        "additionalProperties": false
    })
}

/// JSON schema for the structured contacts call.
pub fn contacts_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "contacts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "full_name": {"type": "string"},
                        "email": {"type": "string"},
                        "role": {"type": "string"},
                        "linkedin_url": {"type": "string"},
                        "twitter_url": {"type": "string"},
                        "confidence": {"type": "number"}
                    },
                    "required": ["full_name", "email", "role", "confidence"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["contacts"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_context_renders() {
        assert!(country_context(Some("Vietnam")).contains("Vietnam"));
        assert!(country_context(None).is_empty());
    }

    #[test]
    fn prompts_embed_results() {
        let results = vec![SearchResult {
            title: "Acme Co".into(),
            link: "https://acme.com".into(),
            snippet: "Official".into(),
        }];
        let rendered = render_results(&results);
        let prompt = company_profile_prompt(&rendered, "");
        assert!(prompt.contains("https://acme.com"));

        let prompt = contacts_prompt("procurement", &rendered, "");
        assert!(prompt.contains("procurement"));
        assert!(prompt.contains("Acme Co"));
    }

    #[test]
    fn schemas_are_objects() {
        assert!(company_profile_schema().is_object());
        assert!(contacts_schema()["properties"]["contacts"]["type"] == "array");
    }
}
