//! Country → search locale parameter lookup.
//!
//! Search providers accept a region code (`gl`), a language code (`hl`), and
//! a location label. The mapping is a pure table lookup; an unknown or absent
//! country yields no locale constraints, i.e. a global query.

/// Locale parameters attached to a search query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleParams {
    /// Region code (`gl`), e.g. `vn`.
    pub region: Option<String>,
    /// Language code (`hl`), e.g. `vi`.
    pub language: Option<String>,
    /// Location label, e.g. `Vietnam`.
    pub location: Option<String>,
}

impl LocaleParams {
    /// Resolve locale parameters for a country name.
    ///
    /// An unknown or absent country yields no constraints (global query).
    pub fn for_country(country: Option<&str>) -> Self {
        let Some(country) = country.filter(|c| !c.trim().is_empty()) else {
            return Self::default();
        };

        match country_codes(country) {
            Some((gl, hl)) => Self {
                region: Some(gl.to_string()),
                language: Some(hl.to_string()),
                location: Some(country.to_string()),
            },
            None => Self::default(),
        }
    }
}

/// (region code, language code) for common countries.
fn country_codes(country: &str) -> Option<(&'static str, &'static str)> {
    let pair = match country {
        "Vietnam" => ("vn", "vi"),
        "China" => ("cn", "zh"),
        "USA" | "United States" => ("us", "en"),
        "India" => ("in", "en"),
        "Japan" => ("jp", "ja"),
        "Korea" | "South Korea" => ("kr", "ko"),
        "Thailand" => ("th", "th"),
        "Singapore" => ("sg", "en"),
        "Malaysia" => ("my", "en"),
        "Indonesia" => ("id", "id"),
        "Philippines" => ("ph", "en"),
        "Taiwan" => ("tw", "zh"),
        "Hong Kong" => ("hk", "zh"),
        "UK" | "United Kingdom" => ("gb", "en"),
        "Germany" => ("de", "de"),
        "France" => ("fr", "fr"),
        "Italy" => ("it", "it"),
        "Spain" => ("es", "es"),
        "Brazil" => ("br", "pt"),
        "Mexico" => ("mx", "es"),
        "Canada" => ("ca", "en"),
        "Australia" => ("au", "en"),
        "New Zealand" => ("nz", "en"),
        _ => return None,
    };
    Some(pair)
}
