//! End-to-end filtering run: rows → stages 1–8 → explanations.
//!
//! The synchronous stages run as a short-circuiting fold: the first stage
//! that empties the set ends the run with [`RunOutcome::Emptied`]. Keyword
//! extraction happens only once stage 7 leaves something to match, and
//! explanations run last on a bounded pool of tasks.

use std::ops::ControlFlow;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use speakerscout_filters::{
    CompanyCategoryAssignment, CompanyExclusion, LanguageDetector, LanguageFilter,
    LocationFilter, ReferenceTables, SeniorityFilter, SummaryElimination, TitleElimination,
};
use speakerscout_matching::KeywordStage;
use speakerscout_shared::{
    ClassifiedKeywords, Explanation, ExplanationFailurePolicy, PipelineConfig, RecordSet, Result,
    ScoutError, Stage, StageKind,
};

use crate::explain::{ExplanationRequest, Explainer};
use crate::keywords::KeywordExtractor;

// ---------------------------------------------------------------------------
// Reports and outcome
// ---------------------------------------------------------------------------

/// Row counts around one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: StageKind,
    pub rows_in: usize,
    pub rows_out: usize,
}

/// What happened during one run, whatever the outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub rows_in: usize,
    pub stages: Vec<StageReport>,
    /// Set once keyword extraction has run.
    pub keywords: Option<ClassifiedKeywords>,
    /// Rows whose explanation failed under the isolate policy.
    pub explanation_failures: usize,
}

#[derive(Debug)]
pub enum RunOutcome {
    /// All nine stages ran; `records` is the shortlist.
    Completed { records: RecordSet, report: RunReport },
    /// `stage` left no records; later stages did not run.
    Emptied { stage: StageKind, report: RunReport },
}

impl RunOutcome {
    pub fn report(&self) -> &RunReport {
        match self {
            Self::Completed { report, .. } | Self::Emptied { report, .. } => report,
        }
    }

    pub fn rows_out(&self) -> usize {
        match self {
            Self::Completed { records, .. } => records.len(),
            Self::Emptied { .. } => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    fn stage_started(&self, stage: StageKind, rows: usize);
    fn stage_finished(&self, report: &StageReport);
    /// Called as each explanation is collected, in row order.
    fn row_explained(&self, current: usize, total: usize);
    fn done(&self, outcome: &RunOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage_started(&self, _stage: StageKind, _rows: usize) {}
    fn stage_finished(&self, _report: &StageReport) {}
    fn row_explained(&self, _current: usize, _total: usize) {}
    fn done(&self, _outcome: &RunOutcome) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The nine-stage speaker filtering pipeline.
pub struct Pipeline<K, E> {
    config: PipelineConfig,
    filters: Vec<Box<dyn Stage>>,
    extractor: K,
    explainer: Arc<E>,
}

impl<K: KeywordExtractor, E: Explainer> Pipeline<K, E> {
    pub fn new<D>(
        config: PipelineConfig,
        tables: ReferenceTables,
        detector: D,
        extractor: K,
        explainer: E,
    ) -> Self
    where
        D: LanguageDetector + 'static,
    {
        let tables = Arc::new(tables);
        let filters: Vec<Box<dyn Stage>> = vec![
            Box::new(TitleElimination),
            Box::new(SummaryElimination),
            Box::new(CompanyExclusion::new(Arc::clone(&tables))),
            Box::new(LanguageFilter::new(detector)),
            Box::new(LocationFilter::new(
                config.event_location(),
                &config.additional_countries,
            )),
            Box::new(CompanyCategoryAssignment::new(tables)),
            Box::new(SeniorityFilter),
        ];
        Self {
            config,
            filters,
            extractor,
            explainer: Arc::new(explainer),
        }
    }

    /// Validate raw rows, then run. A batch missing a required column fails
    /// before any stage runs.
    pub async fn run_rows(
        &self,
        rows: &[Map<String, Value>],
        progress: &dyn ProgressReporter,
    ) -> Result<RunOutcome> {
        let records = RecordSet::from_rows(rows)?;
        self.run(records, progress).await
    }

    #[instrument(skip_all, fields(topic = %self.config.topic, rows = records.len()))]
    pub async fn run(
        &self,
        records: RecordSet,
        progress: &dyn ProgressReporter,
    ) -> Result<RunOutcome> {
        let mut report = RunReport {
            rows_in: records.len(),
            ..RunReport::default()
        };
        info!(rows = report.rows_in, "starting run");

        // --- Stages 1-7 ---
        let records = match run_stages(&self.filters, records, &mut report, progress) {
            ControlFlow::Continue(records) => records,
            ControlFlow::Break(stage) => return Ok(finish_emptied(stage, report, progress)),
        };

        // --- Stage 8 ---
        let keywords = self
            .extractor
            .extract(&self.config.topic, &self.config.subtopic)
            .await?;
        info!(
            class_a = ?keywords.class_a(),
            class_b = ?keywords.class_b(),
            mode = %self.config.keyword_mode,
            "keywords ready"
        );
        let keyword_stage: Box<dyn Stage> =
            Box::new(KeywordStage::for_mode(self.config.keyword_mode, &keywords));
        report.keywords = Some(keywords);

        let records = match run_stages(
            std::slice::from_ref(&keyword_stage),
            records,
            &mut report,
            progress,
        ) {
            ControlFlow::Continue(records) => records,
            ControlFlow::Break(stage) => return Ok(finish_emptied(stage, report, progress)),
        };

        // --- Stage 9 ---
        progress.stage_started(StageKind::Explanation, records.len());
        let rows = records.len();
        let records = self.explain_all(records, &mut report, progress).await?;
        let stage_report = StageReport {
            stage: StageKind::Explanation,
            rows_in: rows,
            rows_out: records.len(),
        };
        progress.stage_finished(&stage_report);
        report.stages.push(stage_report);

        info!(
            shortlisted = records.len(),
            explanation_failures = report.explanation_failures,
            "run completed"
        );
        let outcome = RunOutcome::Completed { records, report };
        progress.done(&outcome);
        Ok(outcome)
    }

    /// Explain every record on a bounded pool, restoring row order before
    /// applying results.
    #[instrument(skip_all, fields(rows = records.len(), concurrency = self.config.explanation_concurrency))]
    async fn explain_all(
        &self,
        records: RecordSet,
        report: &mut RunReport,
        progress: &dyn ProgressReporter,
    ) -> Result<RecordSet> {
        let semaphore = Arc::new(Semaphore::new(self.config.explanation_concurrency.max(1)));
        let location = self.config.explanation_location().to_string();

        let mut handles = Vec::with_capacity(records.len());
        for record in &records {
            let request = ExplanationRequest::for_record(
                record,
                &self.config.topic,
                &self.config.subtopic,
                &location,
            );
            let explainer = Arc::clone(&self.explainer);
            let sem = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| ScoutError::Llm(format!("worker pool closed: {e}")))?;
                explainer.explain(&request).await
            }));
        }

        let total = handles.len();
        let mut out = Vec::with_capacity(total);
        let mut pending = handles.into_iter();
        for (i, mut record) in records.into_iter().enumerate() {
            let Some(handle) = pending.next() else { break };
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ScoutError::Llm(format!("explanation task failed: {e}"))),
            };
            progress.row_explained(i + 1, total);

            match result {
                Ok(text) => {
                    debug!(index = record.index, "explained");
                    record.set_explanation(Explanation::Generated(text));
                }
                Err(e) => match self.config.on_explanation_error {
                    ExplanationFailurePolicy::Abort => {
                        pending.for_each(|h| h.abort());
                        return Err(ScoutError::Explanation {
                            index: record.index,
                            message: e.to_string(),
                        });
                    }
                    ExplanationFailurePolicy::Isolate => {
                        warn!(index = record.index, error = %e, "explanation failed, continuing");
                        report.explanation_failures += 1;
                        record.set_explanation(Explanation::Failed(e.to_string()));
                    }
                },
            }
            out.push(record);
        }
        Ok(RecordSet::new(out))
    }
}

/// Apply stages in order, stopping at the first one that leaves no rows.
fn run_stages(
    stages: &[Box<dyn Stage>],
    records: RecordSet,
    report: &mut RunReport,
    progress: &dyn ProgressReporter,
) -> ControlFlow<StageKind, RecordSet> {
    stages.iter().try_fold(records, |records, stage| {
        let kind = stage.kind();
        let rows_in = records.len();
        progress.stage_started(kind, rows_in);

        let records = stage.apply(records);
        let stage_report = StageReport {
            stage: kind,
            rows_in,
            rows_out: records.len(),
        };
        info!(stage = %kind, rows_in, rows_out = stage_report.rows_out, "stage finished");
        progress.stage_finished(&stage_report);
        report.stages.push(stage_report);

        if records.is_empty() {
            ControlFlow::Break(kind)
        } else {
            ControlFlow::Continue(records)
        }
    })
}

fn finish_emptied(
    stage: StageKind,
    report: RunReport,
    progress: &dyn ProgressReporter,
) -> RunOutcome {
    info!(%stage, "no records left, stopping");
    let outcome = RunOutcome::Emptied { stage, report };
    progress.done(&outcome);
    outcome
}
