//! Keyword extraction: topic and sub-topic into Class A / Class B keywords.

use std::future::Future;

use serde::Deserialize;
use speakerscout_filters::lexicon::GENERIC_WORDS;
use speakerscout_shared::{ClassifiedKeywords, Result, ScoutError};
use tracing::{info, instrument, warn};

use crate::openrouter::OpenRouterClient;

/// Turns an event's topic and sub-topic into keyword vocabularies.
pub trait KeywordExtractor: Send + Sync {
    fn extract(
        &self,
        topic: &str,
        subtopic: &str,
    ) -> impl Future<Output = Result<ClassifiedKeywords>> + Send;
}

// ---------------------------------------------------------------------------
// Static
// ---------------------------------------------------------------------------

/// Caller-supplied keyword lists; ignores the topic text.
#[derive(Debug, Clone)]
pub struct StaticKeywords {
    keywords: ClassifiedKeywords,
}

impl StaticKeywords {
    pub fn new(keywords: ClassifiedKeywords) -> Self {
        Self { keywords }
    }
}

impl KeywordExtractor for StaticKeywords {
    async fn extract(&self, _topic: &str, _subtopic: &str) -> Result<ClassifiedKeywords> {
        Ok(self.keywords.clone())
    }
}

// ---------------------------------------------------------------------------
// Heuristic (offline)
// ---------------------------------------------------------------------------

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over",
    "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours",
];

/// Offline extractor: alphabetic words minus stop words and generic words.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicKeywordExtractor;

impl HeuristicKeywordExtractor {
    pub fn words(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphabetic())
            .map(str::to_lowercase)
            .filter(|w| w.chars().count() > 1)
            .filter(|w| !STOP_WORDS.contains(&w.as_str()))
            .filter(|w| !GENERIC_WORDS.contains(&w.as_str()))
            .collect()
    }
}

impl KeywordExtractor for HeuristicKeywordExtractor {
    async fn extract(&self, topic: &str, subtopic: &str) -> Result<ClassifiedKeywords> {
        Ok(ClassifiedKeywords::new(
            Self::words(topic),
            Self::words(subtopic),
        ))
    }
}

// ---------------------------------------------------------------------------
// OpenRouter
// ---------------------------------------------------------------------------

const EXTRACTION_SYSTEM_PROMPT: &str = "\
You are an expert assistant for filtering professional profiles.

Given an event topic and sub-topic, extract the most relevant keywords that a matching \
speaker's profile would contain.

Rules:
- Only return single words, never multi-word phrases.
- Exclude generic or vague words (business, organization, management, process, system, operations).
- Focus on nouns and adjectives specific to the domain or expertise.
- Do not include stopwords.
- class_a: at most 5 keywords taken from the topic, most important first.
- class_b: keywords taken from the sub-topic.

Respond with a single JSON object and nothing else:
{\"class_a\": [\"...\"], \"class_b\": [\"...\"]}";

#[derive(Debug, Default, Deserialize)]
struct RawKeywords {
    #[serde(default)]
    class_a: Vec<String>,
    #[serde(default)]
    class_b: Vec<String>,
}

/// LLM-backed extractor returning Class A / Class B as JSON.
#[derive(Debug, Clone)]
pub struct OpenRouterKeywordExtractor {
    client: OpenRouterClient,
}

impl OpenRouterKeywordExtractor {
    pub fn new(client: OpenRouterClient) -> Self {
        Self { client }
    }
}

impl KeywordExtractor for OpenRouterKeywordExtractor {
    #[instrument(skip_all, fields(model = %self.client.model()))]
    async fn extract(&self, topic: &str, subtopic: &str) -> Result<ClassifiedKeywords> {
        let prompt = format!("Topic: {topic}\nSub-topic: {subtopic}");
        let reply = self
            .client
            .complete(Some(EXTRACTION_SYSTEM_PROMPT), &prompt)
            .await
            .map_err(|e| ScoutError::KeywordExtraction(e.to_string()))?;

        let keywords = parse_keyword_reply(&reply)?;
        if keywords.is_empty() {
            warn!("model returned no usable keywords");
        }
        info!(
            class_a = ?keywords.class_a(),
            class_b = ?keywords.class_b(),
            "keywords extracted"
        );
        Ok(keywords)
    }
}

/// Parse the model's JSON reply, tolerating code fences and surrounding prose.
/// Multi-word and generic entries are dropped.
pub fn parse_keyword_reply(reply: &str) -> Result<ClassifiedKeywords> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &reply[s..=e],
        _ => {
            return Err(ScoutError::KeywordExtraction(format!(
                "no JSON object in reply: {reply}"
            )));
        }
    };

    let raw: RawKeywords = serde_json::from_str(json)
        .map_err(|e| ScoutError::KeywordExtraction(format!("invalid keyword JSON: {e}")))?;

    let single_words = |words: Vec<String>| -> Vec<String> {
        words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty() && !w.contains(char::is_whitespace))
            .filter(|w| !GENERIC_WORDS.contains(&w.as_str()))
            .collect()
    };

    Ok(ClassifiedKeywords::new(
        single_words(raw.class_a),
        single_words(raw.class_b),
    ))
}

// ---------------------------------------------------------------------------
// Runtime selection
// ---------------------------------------------------------------------------

/// The extractor chosen at startup.
#[derive(Debug, Clone)]
pub enum KeywordSource {
    Static(StaticKeywords),
    Heuristic(HeuristicKeywordExtractor),
    OpenRouter(OpenRouterKeywordExtractor),
}

impl KeywordExtractor for KeywordSource {
    async fn extract(&self, topic: &str, subtopic: &str) -> Result<ClassifiedKeywords> {
        match self {
            Self::Static(s) => s.extract(topic, subtopic).await,
            Self::Heuristic(h) => h.extract(topic, subtopic).await,
            Self::OpenRouter(o) => o.extract(topic, subtopic).await,
        }
    }
}
