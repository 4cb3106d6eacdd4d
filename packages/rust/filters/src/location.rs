//! Location filter: company location against a working country set.
//!
//! The working set starts from the EU list plus any additional countries.
//! An event in China or the United States widens the set with those
//! countries. Otherwise, records whose company location ends in one of them
//! are dropped after matching, unless an additional country already names
//! one.

use speakerscout_shared::{RecordSet, Stage, StageKind};
use tracing::debug;

use crate::lexicon::{EU_COUNTRIES, US_CHINA_COUNTRIES, US_CHINA_EVENT_LOCATIONS, US_CHINA_SUFFIXES};

#[derive(Debug, Clone)]
pub struct LocationFilter {
    countries: Vec<String>,
    exclude_us_china: bool,
}

impl LocationFilter {
    pub fn new(event_location: Option<&str>, additional_countries: &[String]) -> Self {
        let event = event_location
            .map(normalize)
            .filter(|s| !s.is_empty());
        let additional: Vec<String> = additional_countries
            .iter()
            .map(|c| normalize(c))
            .filter(|c| !c.is_empty())
            .collect();

        let mut countries: Vec<String> = EU_COUNTRIES.iter().map(|c| (*c).to_string()).collect();
        countries.extend(additional.iter().cloned());

        let us_china_event = event
            .as_deref()
            .is_some_and(|e| US_CHINA_EVENT_LOCATIONS.contains(&e));
        if us_china_event {
            countries.extend(US_CHINA_COUNTRIES.iter().map(|c| (*c).to_string()));
        }

        let us_china_requested = additional
            .iter()
            .any(|c| US_CHINA_COUNTRIES.contains(&c.as_str()));

        Self {
            countries,
            exclude_us_china: !us_china_event && !us_china_requested,
        }
    }

    pub fn keeps(&self, company_location: &str) -> bool {
        let loc = company_location.to_lowercase();
        if !self.countries.iter().any(|c| loc.contains(c.as_str())) {
            return false;
        }
        if self.exclude_us_china {
            let trimmed = loc.trim();
            return !US_CHINA_SUFFIXES.iter().any(|s| trimmed.ends_with(s));
        }
        true
    }
}

/// Lower-case and collapse internal whitespace.
fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl Stage for LocationFilter {
    fn kind(&self) -> StageKind {
        StageKind::LocationFilter
    }

    fn apply(&self, records: RecordSet) -> RecordSet {
        records.retain(|r| {
            let keep = self.keeps(&r.company_location);
            if !keep {
                debug!(index = r.index, location = %r.company_location, "location out of scope");
            }
            keep
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakerscout_shared::ProfileRecord;

    fn located(locations: &[&str]) -> RecordSet {
        locations
            .iter()
            .enumerate()
            .map(|(i, l)| ProfileRecord::new(i, "CTO", "Acme", "", *l))
            .collect()
    }

    fn kept(filter: &LocationFilter, locations: &[&str]) -> Vec<usize> {
        filter
            .apply(located(locations))
            .iter()
            .map(|r| r.index)
            .collect()
    }

    #[test]
    fn eu_default_keeps_berlin_drops_new_york() {
        let filter = LocationFilter::new(None, &[]);
        assert_eq!(kept(&filter, &["Berlin, Germany", "New York, USA"]), vec![0]);
    }

    #[test]
    fn blank_event_location_is_default() {
        let filter = LocationFilter::new(Some("   "), &[]);
        assert_eq!(kept(&filter, &["Berlin, Germany", "New York, USA"]), vec![0]);
    }

    #[test]
    fn us_event_keeps_new_york() {
        let filter = LocationFilter::new(Some("United States"), &[]);
        assert_eq!(
            kept(&filter, &["Berlin, Germany", "New York, USA", "Shanghai, China"]),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn us_event_matching_ignores_case_and_spacing() {
        let filter = LocationFilter::new(Some("  united   STATES of America "), &[]);
        assert_eq!(kept(&filter, &["Austin, Texas, United States"]), vec![0]);
    }

    #[test]
    fn other_event_drops_us_suffix_even_if_matched() {
        // "georgia" is added, but a US location ending in "united states" is still dropped.
        let filter = LocationFilter::new(Some("Germany"), &["Georgia".into()]);
        assert_eq!(
            kept(&filter, &["Tbilisi, Georgia", "Atlanta, Georgia, United States"]),
            vec![0]
        );
    }

    #[test]
    fn additional_usa_suppresses_exclusion() {
        let filter = LocationFilter::new(Some("Germany"), &["USA".into()]);
        assert_eq!(kept(&filter, &["New York, USA", "Paris, France"]), vec![0, 1]);
    }

    #[test]
    fn company_location_is_used_over_location() {
        let records: RecordSet = vec![
            ProfileRecord::new(0, "CTO", "Acme", "", "Berlin, Germany")
                .with_company_location("Tokyo, Japan"),
        ]
        .into_iter()
        .collect();
        assert!(LocationFilter::new(None, &[]).apply(records).is_empty());
    }

    #[test]
    fn filter_is_idempotent() {
        let filter = LocationFilter::new(Some("France"), &["Canada".into()]);
        let input = located(&["Lyon, France", "Toronto, Canada", "Boston, USA", "Lima, Peru"]);
        let once = filter.apply(input);
        let twice = filter.apply(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn empty_batch_stays_empty() {
        let filter = LocationFilter::new(Some("United States"), &["Canada".into()]);
        assert!(filter.apply(RecordSet::default()).is_empty());
        assert!(kept(&LocationFilter::new(None, &[]), &[]).is_empty());
    }
}
