use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::{Result, eyre::WrapErr as _};
use log::{debug, info, warn};
use tokio::time::{sleep, timeout};

use crate::{
    DEFAULT_THROTTLE_SECS, ImgModBox,
    catalog::{Batch, PromptEntry},
    image_model::{GenerationParams, Image},
    notice::{Notice, NoticeSink},
};

/// What a single call to the image model produced.
#[derive(Debug)]
pub struct GenerationResult {
    pub entry_id: String,
    pub status: GenerationStatus,
}

#[derive(Debug)]
pub enum GenerationStatus {
    Success(Image),
    EmptyResponse,
    Failed(String),
}

/// Terminal state of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Saved(PathBuf),
    SkippedEmpty,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// In catalog order
    pub outcomes: Vec<(String, EntryOutcome)>,
}

impl RunSummary {
    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Saved(_)))
    }

    pub fn empty(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::SkippedEmpty))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Works through a batch one prompt at a time. A failing entry never stops
/// the batch, and consecutive requests are at least `throttle` apart.
pub struct Runner {
    model: ImgModBox,
    params: GenerationParams,
    throttle: Duration,
    request_timeout: Option<Duration>,
}

impl Runner {
    pub fn new(model: ImgModBox) -> Self {
        Self {
            model,
            params: GenerationParams::default(),
            throttle: Duration::from_secs(DEFAULT_THROTTLE_SECS),
            request_timeout: None,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Option<Duration>) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Only fails if the output directory can't be created. Per-entry
    /// failures end up in the summary and in the notices.
    pub async fn run(&self, batch: &Batch, notices: &mut dyn NoticeSink) -> Result<RunSummary> {
        tokio::fs::create_dir_all(&batch.output_dir)
            .await
            .wrap_err_with(|| {
                format!(
                    "Couldn't create output dir {}",
                    batch.output_dir.display()
                )
            })?;

        info!(
            "Running batch {} ({} prompts) against {}",
            batch.label,
            batch.catalog.len(),
            self.model.model()
        );
        notices.record(Notice::RunStarted {
            label: batch.label.clone(),
            entries: batch.catalog.len(),
        });

        let mut summary = RunSummary::default();
        for (index, entry) in batch.catalog.iter().enumerate() {
            notices.record(Notice::EntryStarted {
                id: entry.id.clone(),
            });

            let result = self.generate(entry).await;
            let outcome = persist(result.status, &entry.id, &batch.output_dir).await;
            notices.record(match &outcome {
                EntryOutcome::Saved(path) => Notice::Saved {
                    id: entry.id.clone(),
                    path: path.clone(),
                },
                EntryOutcome::SkippedEmpty => Notice::NoImage {
                    id: entry.id.clone(),
                },
                EntryOutcome::Failed(reason) => Notice::Failed {
                    id: entry.id.clone(),
                    reason: reason.clone(),
                },
            });
            summary.outcomes.push((result.entry_id, outcome));

            if !batch.catalog.is_last(index) {
                notices.record(Notice::Waiting {
                    interval: self.throttle,
                });
                sleep(self.throttle).await;
            }
        }

        notices.record(Notice::Finished(summary.clone()));
        Ok(summary)
    }

    pub async fn generate(&self, entry: &PromptEntry) -> GenerationResult {
        let call = self.model.generate(&entry.prompt_text, &self.params);
        let response = match self.request_timeout {
            Some(limit) => match timeout(limit, call).await {
                Ok(response) => response,
                Err(_) => {
                    warn!("Request for {} timed out", entry.id);
                    return GenerationResult {
                        entry_id: entry.id.clone(),
                        status: GenerationStatus::Failed(format!("timed out after {limit:?}")),
                    };
                }
            },
            None => call.await,
        };

        let status = match response {
            Ok(images) => {
                if images.len() > 1 {
                    debug!("Ignoring {} extra images for {}", images.len() - 1, entry.id);
                }
                match images.into_iter().next() {
                    Some(image) => GenerationStatus::Success(image),
                    None => GenerationStatus::EmptyResponse,
                }
            }
            Err(e) => {
                warn!("Generation for {} failed: {e:?}", entry.id);
                GenerationStatus::Failed(format!("{e:#}"))
            }
        };

        GenerationResult {
            entry_id: entry.id.clone(),
            status,
        }
    }
}

/// Existing files with the same name are overwritten.
async fn persist(status: GenerationStatus, id: &str, output_dir: &Path) -> EntryOutcome {
    match status {
        GenerationStatus::Success(image) => {
            let path = output_dir.join(image.file_name(id));
            match tokio::fs::write(&path, &image.data).await {
                Ok(()) => {
                    debug!("Wrote {} bytes to {}", image.data.len(), path.display());
                    EntryOutcome::Saved(path)
                }
                Err(e) => EntryOutcome::Failed(format!("couldn't write {}: {e}", path.display())),
            }
        }
        GenerationStatus::EmptyResponse => EntryOutcome::SkippedEmpty,
        GenerationStatus::Failed(reason) => EntryOutcome::Failed(reason),
    }
}
