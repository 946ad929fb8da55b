use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, instrument, warn};

use catalog_core::config::Config;
use catalog_core::error::Result;
use catalog_core::loader::DocumentLoader;
use catalog_core::traits::Extractor;
use catalog_core::types::CatalogIndex;
use catalog_extract::FieldExtractor;

use crate::builder::{BuildMeta, BuildReport, IndexBuilder};
use crate::store::IndexStore;

/// Spinner for interactive builds; the total file count is not known up front.
pub fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {pos} files {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb
}

/// load -> extract -> merge -> write.
pub struct Pipeline<E: Extractor = FieldExtractor> {
    loader: DocumentLoader,
    extractor: E,
    store: IndexStore,
    progress: Option<ProgressBar>,
}

impl Pipeline<FieldExtractor> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            DocumentLoader::new(config.raw_dir()),
            FieldExtractor::new(&config.extract),
            IndexStore::new(config.index_path()),
        )
    }
}

impl<E: Extractor> Pipeline<E> {
    pub fn new(loader: DocumentLoader, extractor: E, store: IndexStore) -> Self {
        Self { loader, extractor, store, progress: None }
    }

    #[must_use]
    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.progress = Some(pb);
        self
    }

    /// Build the index in memory without touching the output path.
    ///
    /// Malformed files are skipped and reported; a missing input directory
    /// aborts. `builtAt` is the newest `extractedAt` seen, so rebuilding
    /// from unchanged input gives identical output.
    #[instrument(skip(self), fields(root = %self.loader.root().display()))]
    pub fn build(&self) -> Result<(CatalogIndex, BuildReport)> {
        let mut builder = IndexBuilder::new();
        let mut report = BuildReport::default();
        let mut latest: Option<DateTime<Utc>> = None;

        for item in self.loader.documents()? {
            report.files_seen += 1;
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
            let doc = match item {
                Ok(doc) => doc,
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, "skipping document");
                    report.record_skip(&err);
                    continue;
                }
                Err(err) => return Err(err),
            };
            report.documents_loaded += 1;
            latest = latest.max(doc.extracted_at);

            let entries = self.extractor.extract_all(&doc);
            if entries.is_empty() {
                report.documents_without_identifier += 1;
            }
            for entry in entries {
                builder.add(entry);
            }
        }

        report.merges = builder.merges();
        report.conflicts = builder.conflicts();
        let index = builder.finish(BuildMeta {
            built_at: latest.unwrap_or_default(),
            source_count: report.documents_loaded,
        });
        report.entries = index.len();

        if let Some(pb) = &self.progress {
            pb.finish_with_message(format!("{} entries", report.entries));
        }
        info!(
            files = report.files_seen,
            loaded = report.documents_loaded,
            skipped = report.files_skipped,
            entries = report.entries,
            merges = report.merges,
            conflicts = report.conflicts,
            "index built"
        );
        Ok((index, report))
    }

    /// Build and persist. Nothing is written if the build fails.
    pub fn run(&self) -> Result<BuildReport> {
        let (index, report) = self.build()?;
        self.store.write(&index)?;
        Ok(report)
    }
}
