//! English-only filter over profile summaries.

use speakerscout_shared::{RecordSet, Stage, StageKind};
use tracing::debug;

/// ISO 639-3 code for English.
pub const ENGLISH: &str = "eng";

/// Single string to language code. `None` means detection failed.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Option<String>;
}

/// Trigram-based detection via `whatlang`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        whatlang::detect(text).map(|info| info.lang().code().to_string())
    }
}

/// Keeps records whose summary is detected as English.
///
/// Blank summaries and detection failures count as "not English".
pub struct LanguageFilter<D> {
    detector: D,
}

impl<D: LanguageDetector> LanguageFilter<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    fn is_english(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.detector.detect(text).as_deref() == Some(ENGLISH)
    }
}

impl<D: LanguageDetector> Stage for LanguageFilter<D> {
    fn kind(&self) -> StageKind {
        StageKind::LanguageFilter
    }

    fn apply(&self, records: RecordSet) -> RecordSet {
        records.retain(|r| {
            let english = self.is_english(&r.summary);
            if !english {
                debug!(index = r.index, "summary not detected as English");
            }
            english
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakerscout_shared::ProfileRecord;

    /// Says English for anything containing "the", fails on "???".
    struct FakeDetector;

    impl LanguageDetector for FakeDetector {
        fn detect(&self, text: &str) -> Option<String> {
            if text.contains("???") {
                None
            } else if text.contains("the") {
                Some(ENGLISH.into())
            } else {
                Some("deu".into())
            }
        }
    }

    fn summaries(texts: &[&str]) -> RecordSet {
        texts
            .iter()
            .enumerate()
            .map(|(i, s)| ProfileRecord::new(i, "CTO", "Acme", *s, "Paris"))
            .collect()
    }

    #[test]
    fn keeps_only_english_and_fails_closed() {
        let out = LanguageFilter::new(FakeDetector).apply(summaries(&[
            "I lead the platform team",
            "Ich leite das Team",
            "the ??? garbled",
            "",
        ]));
        let kept: Vec<_> = out.iter().map(|r| r.index).collect();
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn whatlang_recognises_plain_english() {
        let detector = WhatlangDetector;
        let code = detector.detect(
            "I am a technology leader who has spent the last fifteen years building \
             products and teams across Europe and the United Kingdom.",
        );
        assert_eq!(code.as_deref(), Some(ENGLISH));
    }

    #[test]
    fn empty_batch_stays_empty() {
        assert!(LanguageFilter::new(FakeDetector).apply(RecordSet::default()).is_empty());
    }
}
