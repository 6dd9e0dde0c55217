//! Query strategy generation.
//!
//! Builds deduplicated, locale-aware query sets for the three discovery
//! purposes: company profile lookup, role-based contact search, and
//! domain-scoped email search. Every generator shares the same contract:
//! no duplicate query text in the returned set.

use std::collections::HashSet;

use tracing::debug;

use leadscout_shared::{Department, QuerySpec};

use crate::locale::LocaleParams;

/// Domain-scoped search stages, in execution order.
///
/// - `A1`..`A3`: official channels (site-wide email search, contact/about
///   pages, document files)
/// - `B1`: role/function keywords
/// - `B2`: generic contact keywords
/// - `C1`/`C2`: LinkedIn cross-reference (procurement / sales)
pub const ALL_STAGES: [&str; 7] = ["A1", "A2", "A3", "B1", "B2", "C1", "C2"];

/// Generator for locale-aware, deduplicated search query sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryStrategy;

impl QueryStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Queries to locate a company's official web presence.
    ///
    /// One query per distinct name variant; the local-language variant is
    /// included only when it differs from the canonical name after trimming.
    pub fn company_queries(
        &self,
        name: &str,
        local_name: Option<&str>,
        country: Option<&str>,
    ) -> Vec<QuerySpec> {
        let locale = LocaleParams::for_country(country);
        let mut seen = HashSet::new();
        let mut queries = Vec::new();

        for variant in name_variants(name, local_name) {
            let mut text = format!("{variant} official website");
            if let Some(country) = country {
                text.push(' ');
                text.push_str(country);
            }
            push_unique(&mut queries, &mut seen, text, &locale);
        }

        debug!(count = queries.len(), "generated company queries");
        queries
    }

    /// Role-based contact queries for one department track.
    pub fn contact_queries(
        &self,
        name: &str,
        local_name: Option<&str>,
        country: Option<&str>,
        department: &Department,
    ) -> Vec<QuerySpec> {
        let locale = LocaleParams::for_country(country);
        let mut seen = HashSet::new();
        let mut queries = Vec::new();

        for template in contact_templates(department, name) {
            let mut text = template;
            if let Some(country) = country {
                text.push(' ');
                text.push_str(country);
            }
            text.push_str(" contact email");
            push_unique(&mut queries, &mut seen, text, &locale);
        }

        // A reduced template set for the local-language name variant.
        if let Some(local) = local_name.map(str::trim).filter(|l| !l.is_empty() && *l != name.trim())
        {
            for template in local_contact_templates(department, local) {
                let mut text = template;
                if let Some(country) = country {
                    text.push(' ');
                    text.push_str(country);
                }
                text.push_str(" contact email");
                push_unique(&mut queries, &mut seen, text, &locale);
            }
        }

        debug!(
            count = queries.len(),
            department = %department,
            "generated contact queries"
        );
        queries
    }

    /// Domain-scoped email search queries.
    ///
    /// `stages` selects which stages run (`None` = all, in order). A single
    /// seen-set spans all stages, so a repeated stage never produces a
    /// duplicate query.
    pub fn domain_scoped_queries(
        &self,
        domain: &str,
        name: &str,
        department: &Department,
        country: Option<&str>,
        stages: Option<&[&str]>,
    ) -> Vec<QuerySpec> {
        let locale = LocaleParams::for_country(country);
        let mut seen = HashSet::new();
        let mut queries = Vec::new();

        let stages = stages.unwrap_or(&ALL_STAGES);

        for stage in stages {
            let text = match *stage {
                // Official-site email direct search
                "A1" => Some(format!(r#"site:{domain} "@{domain}""#)),
                // Contact/about page focus
                "A2" => Some(format!(
                    r#"site:{domain} (inurl:contact OR inurl:contact-us OR inurl:about) "@{domain}""#
                )),
                // Document files often leak addresses
                "A3" => Some(format!(r#"site:{domain} filetype:pdf "@{domain}""#)),
                // Role/function keywords
                "B1" => Some(format!(
                    r#"site:{domain} ({}) "@{domain}""#,
                    role_keywords(department)
                )),
                // Generic contact keywords
                "B2" => Some(format!(
                    r#"site:{domain} ("email" OR "contact" OR "reach us" OR "get in touch") "@{domain}""#
                )),
                // LinkedIn cross-reference, split per department
                "C1" if matches!(department, Department::Procurement) => Some(format!(
                    r#"site:linkedin.com "{name}" ("procurement" OR "purchasing" OR "buyer")"#
                )),
                "C2" if matches!(department, Department::Sales) => Some(format!(
                    r#"site:linkedin.com "{name}" ("sales" OR "business development")"#
                )),
                _ => None,
            };

            if let Some(text) = text {
                push_unique(&mut queries, &mut seen, text, &locale);
            }
        }

        debug!(
            count = queries.len(),
            %domain,
            department = %department,
            "generated domain-scoped queries"
        );
        queries
    }
}

/// Distinct name variants in priority order (canonical first).
fn name_variants<'a>(name: &'a str, local_name: Option<&'a str>) -> Vec<&'a str> {
    let mut variants = vec![name];
    if let Some(local) = local_name.map(str::trim).filter(|l| !l.is_empty() && *l != name.trim()) {
        variants.push(local);
    }
    variants
}

/// Department-specific role title templates for the canonical name.
fn contact_templates(department: &Department, name: &str) -> Vec<String> {
    match department {
        Department::Procurement => vec![
            format!("{name} procurement manager"),
            format!("{name} purchasing manager"),
            format!("{name} purchasing contact"),
            format!("{name} procurement director"),
        ],
        Department::Sales => vec![
            format!("{name} sales manager"),
            format!("{name} sales director"),
            format!("{name} sales contact"),
            format!("{name} business development manager"),
        ],
        Department::Other(label) => vec![
            format!("{name} {label} manager"),
            format!("{name} {label} contact"),
        ],
    }
}

/// Reduced template set for the local-language name variant.
fn local_contact_templates(department: &Department, local_name: &str) -> Vec<String> {
    match department {
        Department::Procurement => vec![
            format!("{local_name} procurement manager"),
            format!("{local_name} purchasing manager"),
            format!("{local_name} purchasing contact"),
        ],
        Department::Sales => vec![
            format!("{local_name} sales manager"),
            format!("{local_name} sales director"),
            format!("{local_name} sales contact"),
        ],
        Department::Other(label) => vec![
            format!("{local_name} {label} manager"),
            format!("{local_name} {label} contact"),
        ],
    }
}

/// OR-joined role keywords for stage B1.
fn role_keywords(department: &Department) -> &'static str {
    match department {
        Department::Procurement => r#""procurement" OR "purchasing" OR "buyer""#,
        Department::Sales => r#""sales" OR "business development""#,
        Department::Other(_) => {
            r#""sales" OR "business development" OR "procurement" OR "purchasing" OR "buyer""#
        }
    }
}

/// Append a query unless its text was already generated.
fn push_unique(
    queries: &mut Vec<QuerySpec>,
    seen: &mut HashSet<String>,
    text: String,
    locale: &LocaleParams,
) {
    if seen.insert(text.clone()) {
        queries.push(QuerySpec {
            query: text,
            region: locale.region.clone(),
            language: locale.language.clone(),
            location: locale.location.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(queries: &[QuerySpec]) -> Vec<&str> {
        queries.iter().map(|q| q.query.as_str()).collect()
    }

    #[test]
    fn company_queries_include_both_variants() {
        let queries = QueryStrategy::new().company_queries(
            "Acme Co",
            Some("Công ty Acme"),
            Some("Vietnam"),
        );
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].query, "Acme Co official website Vietnam");
        assert_eq!(queries[1].query, "Công ty Acme official website Vietnam");
        assert_eq!(queries[0].region.as_deref(), Some("vn"));
        assert_eq!(queries[0].language.as_deref(), Some("vi"));
    }

    #[test]
    fn company_queries_skip_matching_local_name() {
        let queries = QueryStrategy::new().company_queries("Acme Co", Some(" Acme Co "), None);
        assert_eq!(queries.len(), 1);
        assert!(queries[0].region.is_none());
    }

    #[test]
    fn contact_queries_use_department_templates() {
        let queries = QueryStrategy::new().contact_queries(
            "Acme Co",
            None,
            Some("Vietnam"),
            &Department::Procurement,
        );
        let texts = texts(&queries);
        assert!(texts.contains(&"Acme Co procurement manager Vietnam contact email"));
        assert!(texts.contains(&"Acme Co procurement director Vietnam contact email"));
        assert_eq!(queries.len(), 4);
    }

    #[test]
    fn contact_queries_add_local_variants() {
        let queries = QueryStrategy::new().contact_queries(
            "Acme Co",
            Some("Công ty Acme"),
            None,
            &Department::Sales,
        );
        // 4 canonical + 3 local templates
        assert_eq!(queries.len(), 7);
        assert!(
            texts(&queries).contains(&"Công ty Acme sales manager contact email")
        );
    }

    #[test]
    fn unrecognized_department_falls_back_to_generic() {
        let department = Department::Other("logistics".into());
        let queries = QueryStrategy::new().contact_queries("Acme Co", None, None, &department);
        assert_eq!(
            texts(&queries),
            vec![
                "Acme Co logistics manager contact email",
                "Acme Co logistics contact contact email",
            ]
        );
    }

    #[test]
    fn domain_queries_cover_all_stages() {
        let queries = QueryStrategy::new().domain_scoped_queries(
            "acme.com",
            "Acme Co",
            &Department::Procurement,
            Some("Vietnam"),
            None,
        );
        // A1, A2, A3, B1, B2, C1 fire for procurement; C2 does not.
        assert_eq!(queries.len(), 6);
        assert_eq!(queries[0].query, r#"site:acme.com "@acme.com""#);
        assert!(queries.iter().any(|q| q.query.contains("linkedin.com")));
        assert!(queries.iter().all(|q| q.region.as_deref() == Some("vn")));
    }

    #[test]
    fn repeated_stage_yields_no_duplicate_text() {
        let queries = QueryStrategy::new().domain_scoped_queries(
            "acme.com",
            "Acme Co",
            &Department::Sales,
            None,
            Some(&["A1", "A1"]),
        );
        assert_eq!(queries.len(), 1);
    }

    #[test]
    fn linkedin_stages_respect_department() {
        let strategy = QueryStrategy::new();
        let sales = strategy.domain_scoped_queries(
            "acme.com",
            "Acme Co",
            &Department::Sales,
            None,
            Some(&["C1", "C2"]),
        );
        assert_eq!(sales.len(), 1);
        assert!(sales[0].query.contains("business development"));

        let procurement = strategy.domain_scoped_queries(
            "acme.com",
            "Acme Co",
            &Department::Procurement,
            None,
            Some(&["C1", "C2"]),
        );
        assert_eq!(procurement.len(), 1);
        assert!(procurement[0].query.contains("buyer"));
    }
}
