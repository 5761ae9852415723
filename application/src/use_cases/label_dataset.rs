//! Label dataset use case
//!
//! Drives the per-image labeling loop: compose the prompt, call the backend,
//! parse the response against the taxonomy, persist the raw text, and write
//! the label back into the record.

use crate::ports::chat_backend::{BackendError, ChatBackend};
use crate::ports::progress::{LabelProgress, NoProgress};
use crate::ports::raw_sink::{NoRawSink, RawResponseSink};
use futures::stream::{self, StreamExt};
use nepho_domain::{CategoryTaxonomy, LabelPromptTemplate, LabelRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that terminate a labeling run
#[derive(Error, Debug)]
pub enum LabelRunError {
    #[error("Backend call failed for {} (model {model}): {source}", .path.display())]
    Backend {
        path: PathBuf,
        model: String,
        #[source]
        source: BackendError,
    },

    #[error("Failed to write raw response for {}: {source}", .path.display())]
    RawOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for a labeling run
#[derive(Debug, Clone)]
pub struct LabelRunOptions {
    /// Maximum in-flight backend requests. 1 (the default) keeps the strict
    /// sequential ordering: each request completes before the next starts,
    /// and an abort stops exactly at the failing record.
    pub max_concurrency: usize,
    /// Log and skip a failing record instead of aborting the run.
    pub continue_on_error: bool,
}

impl Default for LabelRunOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            continue_on_error: false,
        }
    }
}

/// Use case for labeling a dataset of radar images
///
/// Depends only on the [`ChatBackend`] capability contract; which serving
/// system answers is decided by whoever constructs the use case.
pub struct LabelDatasetUseCase {
    backend: Arc<dyn ChatBackend>,
    raw_sink: Arc<dyn RawResponseSink>,
}

impl LabelDatasetUseCase {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            raw_sink: Arc::new(NoRawSink),
        }
    }

    /// Persist each record's verbatim response through `sink`.
    pub fn with_raw_sink(mut self, sink: Arc<dyn RawResponseSink>) -> Self {
        self.raw_sink = sink;
        self
    }

    /// Label every record in place with default (no-op) progress.
    pub async fn execute(
        &self,
        records: &mut [LabelRecord],
        taxonomy: &CategoryTaxonomy,
        template: &LabelPromptTemplate,
        options: &LabelRunOptions,
    ) -> Result<(), LabelRunError> {
        self.execute_with_progress(records, taxonomy, template, options, &NoProgress)
            .await
    }

    /// Label every record in place with progress callbacks.
    ///
    /// Records are mutated row-by-row as responses arrive; on a fail-stop
    /// abort the rows processed so far keep their labels and the rest stay
    /// untouched.
    pub async fn execute_with_progress(
        &self,
        records: &mut [LabelRecord],
        taxonomy: &CategoryTaxonomy,
        template: &LabelPromptTemplate,
        options: &LabelRunOptions,
        progress: &dyn LabelProgress,
    ) -> Result<(), LabelRunError> {
        let base_prompt = template.render(taxonomy);
        info!(
            model = %self.backend.model(),
            records = records.len(),
            max_concurrency = options.max_concurrency,
            "starting labeling run"
        );
        progress.on_run_start(records.len());

        if options.max_concurrency > 1 {
            self.run_bounded(records, taxonomy, &base_prompt, template, options, progress)
                .await?;
        } else {
            self.run_sequential(records, taxonomy, &base_prompt, template, options, progress)
                .await?;
        }

        let labeled = records.iter().filter(|r| r.llm_label.is_some()).count();
        info!(labeled, total = records.len(), "labeling run complete");
        progress.on_run_complete(labeled);
        Ok(())
    }

    /// Strictly sequential path: one request in flight, source order.
    async fn run_sequential(
        &self,
        records: &mut [LabelRecord],
        taxonomy: &CategoryTaxonomy,
        base_prompt: &str,
        template: &LabelPromptTemplate,
        options: &LabelRunOptions,
        progress: &dyn LabelProgress,
    ) -> Result<(), LabelRunError> {
        for index in 0..records.len() {
            let path = records[index].file_path.clone();
            let prompt = format!("{base_prompt}\n{}", template.image_suffix(&records[index].time));

            match self.label_one(&path, &prompt, taxonomy).await {
                Ok((label, raw)) => {
                    progress.on_record_labeled(index, &path, &label, &raw);
                    records[index].llm_label = Some(label);
                }
                Err(err) => self.handle_failure(index, &path, err, options, progress)?,
            }
        }
        Ok(())
    }

    /// Bounded-concurrency path: up to `max_concurrency` requests in flight.
    ///
    /// Labels are written under each record's own index, so the final dataset
    /// does not depend on completion order. Dropping the stream on a
    /// fail-stop abort cancels the remaining in-flight requests.
    async fn run_bounded(
        &self,
        records: &mut [LabelRecord],
        taxonomy: &CategoryTaxonomy,
        base_prompt: &str,
        template: &LabelPromptTemplate,
        options: &LabelRunOptions,
        progress: &dyn LabelProgress,
    ) -> Result<(), LabelRunError> {
        let jobs: Vec<(usize, PathBuf, String)> = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                (
                    index,
                    record.file_path.clone(),
                    format!("{base_prompt}\n{}", template.image_suffix(&record.time)),
                )
            })
            .collect();

        let mut results = stream::iter(jobs)
            .map(|(index, path, prompt)| async move {
                let outcome = self.label_one(&path, &prompt, taxonomy).await;
                (index, path, outcome)
            })
            .buffer_unordered(options.max_concurrency);

        while let Some((index, path, outcome)) = results.next().await {
            match outcome {
                Ok((label, raw)) => {
                    progress.on_record_labeled(index, &path, &label, &raw);
                    records[index].llm_label = Some(label);
                }
                Err(err) => self.handle_failure(index, &path, err, options, progress)?,
            }
        }
        Ok(())
    }

    /// One record: chat, persist raw text, parse.
    async fn label_one(
        &self,
        path: &Path,
        prompt: &str,
        taxonomy: &CategoryTaxonomy,
    ) -> Result<(String, String), LabelRunError> {
        let images = [path.to_path_buf()];
        let raw = self
            .backend
            .chat(prompt, &images)
            .await
            .map_err(|source| LabelRunError::Backend {
                path: path.to_path_buf(),
                model: self.backend.model().to_string(),
                source,
            })?;

        self.raw_sink
            .persist(path, &raw)
            .map_err(|source| LabelRunError::RawOutput {
                path: path.to_path_buf(),
                source,
            })?;

        let label = taxonomy.parse_response(&raw);
        debug!(path = %path.display(), label = %label, "parsed response");
        Ok((label, raw))
    }

    /// Fail-stop by default; raw-output failures are fatal unconditionally.
    fn handle_failure(
        &self,
        index: usize,
        path: &Path,
        err: LabelRunError,
        options: &LabelRunOptions,
        progress: &dyn LabelProgress,
    ) -> Result<(), LabelRunError> {
        if let LabelRunError::RawOutput { .. } = err {
            return Err(err);
        }
        progress.on_record_failed(index, path);
        if options.continue_on_error {
            warn!(path = %path.display(), error = %err, "record skipped");
            Ok(())
        } else {
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use nepho_domain::{Model, TIME_FORMAT};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // -- Mock ChatBackend ------------------------------------------------------

    struct ScriptedBackend {
        model: Model,
        script: Mutex<VecDeque<Result<String, BackendError>>>,
        seen: Mutex<Vec<(String, Vec<PathBuf>)>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<String, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                model: Model::new("llava"),
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn remaining(&self) -> usize {
            self.script.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn model(&self) -> &Model {
            &self.model
        }

        async fn chat(&self, prompt: &str, images: &[PathBuf]) -> Result<String, BackendError> {
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), images.to_vec()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("backend called more often than scripted")
        }
    }

    /// Backend that always answers the same thing, for concurrency tests.
    struct ConstBackend {
        model: Model,
        answer: String,
    }

    #[async_trait]
    impl ChatBackend for ConstBackend {
        fn model(&self) -> &Model {
            &self.model
        }

        async fn chat(&self, _prompt: &str, _images: &[PathBuf]) -> Result<String, BackendError> {
            Ok(self.answer.clone())
        }
    }

    // -- Mock RawResponseSink --------------------------------------------------

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(PathBuf, String)>>,
    }

    impl RawResponseSink for RecordingSink {
        fn persist(&self, image_path: &Path, raw: &str) -> std::io::Result<()> {
            self.writes
                .lock()
                .unwrap()
                .push((image_path.to_path_buf(), raw.to_string()));
            Ok(())
        }
    }

    struct FailingSink;

    impl RawResponseSink for FailingSink {
        fn persist(&self, _image_path: &Path, _raw: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only output directory",
            ))
        }
    }

    // -- Helpers ---------------------------------------------------------------

    fn records(n: usize) -> Vec<LabelRecord> {
        (0..n)
            .map(|i| {
                let time = NaiveDateTime::parse_from_str(
                    &format!("2022-06-02 00:0{i}:00"),
                    TIME_FORMAT,
                )
                .unwrap();
                LabelRecord::new(format!("img/scan_{i}.png"), time)
            })
            .collect()
    }

    fn template() -> LabelPromptTemplate {
        LabelPromptTemplate::new("KHGX", (-20, 80))
    }

    async fn run(
        backend: Arc<dyn ChatBackend>,
        records: &mut [LabelRecord],
        options: &LabelRunOptions,
    ) -> Result<(), LabelRunError> {
        LabelDatasetUseCase::new(backend)
            .execute(records, &CategoryTaxonomy::default(), &template(), options)
            .await
    }

    // -- Tests -----------------------------------------------------------------

    #[tokio::test]
    async fn labels_every_record_in_source_order() {
        let backend = ScriptedBackend::new(vec![
            Ok("Snow".to_string()),
            Ok("It looks wintry.\nStratiform rain.".to_string()),
            Ok("hard to say".to_string()),
        ]);
        let mut rows = records(3);

        run(backend.clone(), &mut rows, &LabelRunOptions::default())
            .await
            .unwrap();

        assert_eq!(rows[0].llm_label.as_deref(), Some("Snow"));
        assert_eq!(rows[1].llm_label.as_deref(), Some("Stratiform rain"));
        assert_eq!(rows[2].llm_label.as_deref(), Some("Unknown"));
    }

    #[tokio::test]
    async fn each_call_carries_the_record_image_and_timestamp() {
        let backend = ScriptedBackend::new(vec![Ok("Snow".to_string())]);
        let mut rows = records(1);

        run(backend.clone(), &mut rows, &LabelRunOptions::default())
            .await
            .unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (prompt, images) = &seen[0];
        assert_eq!(images, &vec![PathBuf::from("img/scan_0.png")]);
        assert!(prompt.contains("2022-06-02 00:00:00"));
        assert!(prompt.contains("Supercells"));
        assert!(prompt.contains("only the category name"));
    }

    #[tokio::test]
    async fn fail_stop_aborts_exactly_at_the_failing_record() {
        let backend = ScriptedBackend::new(vec![
            Ok("Snow".to_string()),
            Ok("Supercells".to_string()),
            Err(BackendError::RequestFailed("boom".to_string())),
            Ok("Snow".to_string()),
            Ok("Snow".to_string()),
        ]);
        let mut rows = records(5);

        let err = run(backend.clone(), &mut rows, &LabelRunOptions::default())
            .await
            .unwrap_err();

        match err {
            LabelRunError::Backend { path, model, .. } => {
                assert_eq!(path, PathBuf::from("img/scan_2.png"));
                assert_eq!(model, "llava");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(rows[0].llm_label.is_some());
        assert!(rows[1].llm_label.is_some());
        assert!(rows[2].llm_label.is_none());
        assert!(rows[3].llm_label.is_none());
        assert!(rows[4].llm_label.is_none());
        // Records 4 and 5 were never sent.
        assert_eq!(backend.remaining(), 2);
    }

    #[tokio::test]
    async fn continue_on_error_skips_the_failing_record() {
        let backend = ScriptedBackend::new(vec![
            Ok("Snow".to_string()),
            Err(BackendError::Timeout(std::time::Duration::from_secs(60))),
            Ok("Supercells".to_string()),
        ]);
        let mut rows = records(3);
        let options = LabelRunOptions {
            continue_on_error: true,
            ..Default::default()
        };

        run(backend.clone(), &mut rows, &options).await.unwrap();

        assert_eq!(rows[0].llm_label.as_deref(), Some("Snow"));
        assert!(rows[1].llm_label.is_none());
        assert_eq!(rows[2].llm_label.as_deref(), Some("Supercells"));
    }

    #[tokio::test]
    async fn raw_responses_are_persisted_verbatim() {
        let backend = ScriptedBackend::new(vec![
            Ok("Some reasoning first.\nSnow".to_string()),
            Ok("Supercells.".to_string()),
        ]);
        let sink = Arc::new(RecordingSink::default());
        let mut rows = records(2);

        LabelDatasetUseCase::new(backend)
            .with_raw_sink(sink.clone())
            .execute(
                &mut rows,
                &CategoryTaxonomy::default(),
                &template(),
                &LabelRunOptions::default(),
            )
            .await
            .unwrap();

        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, PathBuf::from("img/scan_0.png"));
        assert_eq!(writes[0].1, "Some reasoning first.\nSnow");
        assert_eq!(writes[1].1, "Supercells.");
    }

    #[tokio::test]
    async fn raw_output_failure_is_fatal_even_when_continuing() {
        let backend = ScriptedBackend::new(vec![Ok("Snow".to_string())]);
        let mut rows = records(2);
        let options = LabelRunOptions {
            continue_on_error: true,
            ..Default::default()
        };

        let err = LabelDatasetUseCase::new(backend)
            .with_raw_sink(Arc::new(FailingSink))
            .execute(&mut rows, &CategoryTaxonomy::default(), &template(), &options)
            .await
            .unwrap_err();

        assert!(matches!(err, LabelRunError::RawOutput { .. }));
        assert!(rows.iter().all(|r| r.llm_label.is_none()));
    }

    #[tokio::test]
    async fn bounded_concurrency_labels_every_record() {
        let backend = Arc::new(ConstBackend {
            model: Model::new("llava"),
            answer: "Scattered convection".to_string(),
        });
        let mut rows = records(8);
        let options = LabelRunOptions {
            max_concurrency: 3,
            ..Default::default()
        };

        run(backend, &mut rows, &options).await.unwrap();

        assert!(rows
            .iter()
            .all(|r| r.llm_label.as_deref() == Some("Scattered convection")));
    }

    #[tokio::test]
    async fn run_error_display_names_file_and_model() {
        let backend = ScriptedBackend::new(vec![Err(BackendError::RequestFailed(
            "connection refused".to_string(),
        ))]);
        let mut rows = records(1);

        let err = run(backend, &mut rows, &LabelRunOptions::default())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("img/scan_0.png"));
        assert!(message.contains("llava"));
    }
}
