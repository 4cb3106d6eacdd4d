//! Static word lists: excluded titles, elimination phrases, country lists
//! and per-category seniority terms.
//!
//! Entries are matched as lower-case substrings. Leading spaces are
//! significant (`" finances"` only matches after a space).

use speakerscout_shared::{CompanyCategory, Result, ScoutError};

/// Title fragments that disqualify a profile.
pub const TITLE_EXCLUSIONS: &[&str] = &[
    "consultant",
    "sales",
    "account",
    "b2b",
    "marketing",
    "business",
    "development",
    "designer",
    "architect",
    "engineer",
    "engineering",
    "scientist",
    "professor",
    "finance",
    "financing",
    "hr",
    "recruitment",
    "talent",
    "training",
    "learning",
    "business development",
    "client",
    "revenue",
    "acquisition",
    "customer relationship",
    "consulting",
    "advisory",
    "financial services",
    "audit",
    " finances",
    "health and safety",
    "associate",
    "pipeline",
    "quota",
    "deals",
    "increase revenue",
    "target",
];

/// Phrases that disqualify a profile when found in its summary or title description.
pub const ELIMINATION_PHRASES: &[&str] = &[
    "sales",
    "business development",
    "client",
    "revenue",
    "acquisition",
    "customer relationship",
    "consulting",
    "advisory",
    "financial services",
    "audit",
    " finances",
    "health and safety",
    "associate",
    "pipeline",
    "quota",
    "deals",
    "increase revenue",
    "target",
];

/// Default country set for the location filter.
pub const EU_COUNTRIES: &[&str] = &[
    "austria",
    "belgium",
    "bulgaria",
    "croatia",
    "cyprus",
    "czech republic",
    "denmark",
    "estonia",
    "finland",
    "france",
    "germany",
    "greece",
    "hungary",
    "ireland",
    "italy",
    "latvia",
    "lithuania",
    "luxembourg",
    "malta",
    "netherlands",
    "poland",
    "portugal",
    "romania",
    "slovakia",
    "slovenia",
    "spain",
    "sweden",
    "switzerland",
    "united kingdom",
];

/// Event locations that switch the location filter into US/China mode.
pub const US_CHINA_EVENT_LOCATIONS: &[&str] =
    &["china", "usa", "united states", "united states of america"];

/// Countries added to the working set in US/China mode.
pub const US_CHINA_COUNTRIES: &[&str] = &["china", "united states", "usa"];

/// Location suffixes dropped after matching unless US/China was requested.
pub const US_CHINA_SUFFIXES: &[&str] = &["united states", "usa", "china"];

/// Country names accepted as operator input.
pub const RECOGNISED_COUNTRIES: &[&str] = &[
    "afghanistan", "albania", "algeria", "andorra", "angola", "antigua and barbuda",
    "argentina", "armenia", "australia", "austria", "azerbaijan", "bahamas", "bahrain",
    "bangladesh", "barbados", "belarus", "belgium", "belize", "benin", "bhutan", "bolivia",
    "bosnia and herzegovina", "botswana", "brazil", "brunei", "bulgaria", "burkina faso",
    "burundi", "cabo verde", "cambodia", "cameroon", "canada", "central african republic",
    "chad", "chile", "china", "colombia", "comoros", "congo", "costa rica", "croatia", "cuba",
    "cyprus", "czech republic", "denmark", "djibouti", "dominica", "dominican republic",
    "ecuador", "egypt", "el salvador", "equatorial guinea", "eritrea", "estonia", "eswatini",
    "ethiopia", "fiji", "finland", "france", "gabon", "gambia", "georgia", "germany", "ghana",
    "greece", "grenada", "guatemala", "guinea", "guinea-bissau", "guyana", "haiti", "honduras",
    "hungary", "iceland", "india", "indonesia", "iran", "iraq", "ireland", "israel", "italy",
    "jamaica", "japan", "jordan", "kazakhstan", "kenya", "kiribati", "korea", "kuwait",
    "kyrgyzstan", "laos", "latvia", "lebanon", "lesotho", "liberia", "libya", "liechtenstein",
    "lithuania", "luxembourg", "madagascar", "malawi", "malaysia", "maldives", "mali", "malta",
    "marshall islands", "mauritania", "mauritius", "mexico", "micronesia", "moldova", "monaco",
    "mongolia", "montenegro", "morocco", "mozambique", "myanmar", "namibia", "nauru", "nepal",
    "netherlands", "new zealand", "nicaragua", "niger", "nigeria", "north macedonia", "norway",
    "oman", "pakistan", "palau", "palestine", "panama", "papua new guinea", "paraguay", "peru",
    "philippines", "poland", "portugal", "qatar", "romania", "russia", "rwanda",
    "saint kitts and nevis", "saint lucia", "saint vincent and the grenadines", "samoa",
    "san marino", "sao tome and principe", "saudi arabia", "senegal", "serbia", "seychelles",
    "sierra leone", "singapore", "slovakia", "slovenia", "solomon islands", "somalia",
    "south africa", "south sudan", "spain", "sri lanka", "sudan", "suriname", "sweden",
    "switzerland", "syria", "taiwan", "tajikistan", "tanzania", "thailand", "timor-leste",
    "togo", "tonga", "trinidad and tobago", "tunisia", "turkey", "turkmenistan", "tuvalu",
    "uganda", "ukraine", "united arab emirates", "united kingdom", "united states", "uruguay",
    "uzbekistan", "vanuatu", "vatican city", "venezuela", "vietnam", "yemen", "zambia",
    "zimbabwe",
];

/// Words never useful as topic keywords.
pub const GENERIC_WORDS: &[&str] = &[
    "business",
    "organization",
    "organizational",
    "culture",
    "capabilities",
    "process",
    "system",
    "management",
    "operations",
    "building",
];

const SENIORITY_A: &[&str] = &["director", "head", "vp", "senior", "manager", "lead", "chief"];
const SENIORITY_B: &[&str] = &["director", "head", "vp", "senior", "manager", "chief"];
const SENIORITY_C: &[&str] = &["director", "head", "vp", "chief"];

/// Seniority terms a title must contain for a given employer tier.
pub fn seniority_terms(category: CompanyCategory) -> &'static [&'static str] {
    match category {
        CompanyCategory::A => SENIORITY_A,
        CompanyCategory::B => SENIORITY_B,
        CompanyCategory::C => SENIORITY_C,
    }
}

/// Whether `name` (any case, surrounding whitespace ignored) is a known country.
pub fn is_recognised_country(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    RECOGNISED_COUNTRIES.contains(&name.as_str())
}

/// Validate an operator-supplied event location.
///
/// Names containing digits are rejected; otherwise returns whether the
/// name is recognised so the caller can warn.
pub fn check_event_location(name: &str) -> Result<bool> {
    if name.chars().any(|c| c.is_ascii_digit()) {
        return Err(ScoutError::validation(format!(
            "event location '{name}' should not contain numbers"
        )));
    }
    Ok(is_recognised_country(name))
}

/// Split additional countries into (recognised, unrecognised), trimmed.
pub fn partition_countries<I>(names: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .partition(|n| is_recognised_country(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_location_with_digits_is_rejected() {
        assert!(check_event_location("France 2025").is_err());
        assert!(check_event_location("France").unwrap());
        assert!(!check_event_location("Middle Earth").unwrap());
    }

    #[test]
    fn additional_countries_are_partitioned() {
        let (ok, bad) = partition_countries(["Japan", " brazil ", "", "Narnia"]);
        assert_eq!(ok, vec!["Japan", "brazil"]);
        assert_eq!(bad, vec!["Narnia"]);
    }

    #[test]
    fn seniority_lists_narrow_by_tier() {
        assert!(seniority_terms(CompanyCategory::A).contains(&"lead"));
        assert!(!seniority_terms(CompanyCategory::B).contains(&"lead"));
        assert!(!seniority_terms(CompanyCategory::C).contains(&"senior"));
        for term in seniority_terms(CompanyCategory::C) {
            assert!(seniority_terms(CompanyCategory::B).contains(term));
        }
    }

    #[test]
    fn country_recognition_ignores_case() {
        assert!(is_recognised_country(" United Kingdom "));
        assert!(is_recognised_country("germany"));
        assert!(!is_recognised_country("Atlantis"));
    }

    #[test]
    fn word_lists_are_lower_case() {
        for list in [TITLE_EXCLUSIONS, ELIMINATION_PHRASES, EU_COUNTRIES, RECOGNISED_COUNTRIES] {
            for word in list {
                assert_eq!(*word, word.to_lowercase());
            }
        }
    }
}
