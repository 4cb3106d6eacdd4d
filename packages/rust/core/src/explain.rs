//! Explanation collaborators: one sentence per shortlisted profile.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use speakerscout_shared::{ProfileRecord, Result};
use speakerscout_storage::Storage;
use tracing::{debug, warn};

use crate::openrouter::OpenRouterClient;

/// Everything an explainer sees about one record. Owned so it can move into
/// a worker task.
#[derive(Debug, Clone, Serialize)]
pub struct ExplanationRequest {
    #[serde(skip)]
    pub index: usize,
    pub title: String,
    #[serde(rename = "companyName")]
    pub company_name: String,
    pub summary: String,
    #[serde(rename = "titleDescription")]
    pub title_description: String,
    pub location: String,
    #[serde(rename = "companyLocation")]
    pub company_location: String,
    #[serde(rename = "Companies Category")]
    pub category: Option<String>,
    #[serde(skip)]
    pub topic: String,
    #[serde(skip)]
    pub subtopic: String,
    #[serde(skip)]
    pub event_location: String,
    #[serde(skip)]
    pub criteria_passed: String,
}

impl ExplanationRequest {
    pub fn for_record(
        record: &ProfileRecord,
        topic: &str,
        subtopic: &str,
        event_location: &str,
    ) -> Self {
        Self {
            index: record.index,
            title: record.title.clone(),
            company_name: record.company_name.clone(),
            summary: record.summary.clone(),
            title_description: record.title_description.clone(),
            location: record.location.clone(),
            company_location: record.company_location.clone(),
            category: record.category().map(|c| c.label().to_string()),
            topic: topic.to_string(),
            subtopic: subtopic.to_string(),
            event_location: event_location.to_string(),
            criteria_passed: record.criteria_passed_summary(),
        }
    }

    /// The user prompt sent to a language model.
    pub fn prompt(&self) -> String {
        let profile = serde_json::to_string(self).unwrap_or_default();
        format!(
            "Profile: {profile}\n\
             Event Topic: {}\n\
             Event Subtopic: {}\n\
             Event Location: {}\n\
             Criteria Passed: {}",
            self.topic, self.subtopic, self.event_location, self.criteria_passed
        )
    }
}

const EXPLANATION_SYSTEM_PROMPT: &str = "\
You are an expert assistant for filtering professional profiles for event speaker selection.

Given a profile, the event requirements and the filtering criteria the profile passed, \
write one concise, factual sentence explaining why this profile was selected. Reference \
the specific criteria it passed. Avoid generic statements.";

/// Produces a one-sentence reason for a shortlisted profile.
pub trait Explainer: Send + Sync + 'static {
    /// Identifier used to key cached explanations.
    fn model_id(&self) -> &str;

    fn explain(&self, request: &ExplanationRequest) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Template (offline)
// ---------------------------------------------------------------------------

/// Deterministic sentence built from the request fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateExplainer;

impl Explainer for TemplateExplainer {
    fn model_id(&self) -> &str {
        "template"
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String> {
        let who = match (request.title.is_empty(), request.company_name.is_empty()) {
            (false, false) => format!("{} at {}", request.title, request.company_name),
            (false, true) => request.title.clone(),
            (true, false) => format!("Profile at {}", request.company_name),
            (true, true) => "This profile".to_string(),
        };
        let passed = if request.criteria_passed.is_empty() {
            "no recorded criteria".to_string()
        } else {
            request.criteria_passed.clone()
        };
        Ok(format!(
            "{who} was selected for {} / {} ({}) after passing: {passed}.",
            request.topic, request.subtopic, request.event_location
        ))
    }
}

// ---------------------------------------------------------------------------
// OpenRouter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OpenRouterExplainer {
    client: OpenRouterClient,
}

impl OpenRouterExplainer {
    pub fn new(client: OpenRouterClient) -> Self {
        Self { client }
    }
}

impl Explainer for OpenRouterExplainer {
    fn model_id(&self) -> &str {
        self.client.model()
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String> {
        self.client
            .complete(Some(EXPLANATION_SYSTEM_PROMPT), &request.prompt())
            .await
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Cache key for a prompt under a given model.
fn prompt_hash(prompt: &str, model_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(model_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Wraps an explainer with the libSQL explanation cache.
///
/// Cache read and write failures are logged and otherwise ignored.
pub struct CachedExplainer<E> {
    inner: E,
    storage: Arc<Storage>,
}

impl<E: Explainer> CachedExplainer<E> {
    pub fn new(inner: E, storage: Arc<Storage>) -> Self {
        Self { inner, storage }
    }
}

impl<E: Explainer> Explainer for CachedExplainer<E> {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String> {
        let model = self.inner.model_id();
        let hash = prompt_hash(&request.prompt(), model);

        match self.storage.cached_explanation(&hash, model).await {
            Ok(Some(hit)) => {
                debug!(index = request.index, "explanation cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "explanation cache read failed"),
        }

        let text = self.inner.explain(request).await?;
        if let Err(e) = self.storage.store_explanation(&hash, model, &text).await {
            warn!(error = %e, "explanation cache write failed");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use speakerscout_shared::{CompanyCategory, CriteriaResult, KeywordMatch};
    use uuid::Uuid;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ExplanationRequest {
        let mut record = ProfileRecord::new(3, "Head of AI", "Globex", "Builds AI", "Paris, France");
        record.assign_category(CompanyCategory::A);
        record.record_keyword_match(KeywordMatch::Classified(CriteriaResult::new(
            true, false, false,
        )));
        ExplanationRequest::for_record(&record, "AI", "Healthcare", "Global/EU")
    }

    struct CountingExplainer {
        calls: Arc<AtomicUsize>,
    }

    impl Explainer for CountingExplainer {
        fn model_id(&self) -> &str {
            "counting"
        }

        async fn explain(&self, request: &ExplanationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("reason for {}", request.index))
        }
    }

    #[test]
    fn prompt_carries_profile_and_event() {
        let prompt = request().prompt();
        assert!(prompt.contains("\"companyName\":\"Globex\""));
        assert!(prompt.contains("\"Companies Category\":\"Category A\""));
        assert!(prompt.contains("Event Location: Global/EU"));
        assert!(prompt.contains("Criteria Passed: Valid title, Has summary, Category A, Keyword: Criteria A"));
    }

    #[test]
    fn prompt_hash_depends_on_model() {
        assert_ne!(prompt_hash("p", "a"), prompt_hash("p", "b"));
        assert_eq!(prompt_hash("p", "a").len(), 64);
    }

    #[tokio::test]
    async fn template_is_deterministic() {
        let text = TemplateExplainer.explain(&request()).await.unwrap();
        assert_eq!(
            text,
            "Head of AI at Globex was selected for AI / Healthcare (Global/EU) after passing: \
             Valid title, Has summary, Category A, Keyword: Criteria A."
        );
    }

    #[tokio::test]
    async fn openrouter_explainer_returns_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Leads AI at a Category A company."}}]
            })))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&server.uri(), "k", "test/model").unwrap();
        let explainer = OpenRouterExplainer::new(client);
        assert_eq!(explainer.model_id(), "test/model");
        assert_eq!(
            explainer.explain(&request()).await.unwrap(),
            "Leads AI at a Category A company."
        );
    }

    #[tokio::test]
    async fn cached_explainer_calls_inner_once() {
        let path = std::env::temp_dir().join(format!("scout_cache_{}.db", Uuid::now_v7()));
        let storage = Arc::new(Storage::open(&path).await.unwrap());
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = CachedExplainer::new(
            CountingExplainer {
                calls: Arc::clone(&calls),
            },
            storage,
        );

        let first = cached.explain(&request()).await.unwrap();
        let second = cached.explain(&request()).await.unwrap();
        assert_eq!(first, "reason for 3");
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
