use std::path::{Path, PathBuf};

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    catalog::model::Catalog,
    engine::augment::{AugmentOpts, AugmentReport, augment},
    engine::purge::{PurgeOpts, RemoveReport, find_by_substrings, find_orphans, remove},
    foundation::error::{CocoAugError, CocoAugResult},
    foundation::fsio,
    select::filter::{SelectionCriteria, select},
    transform::pipeline::{PipelineConfig, TransformPipeline},
};

/// One augmentation run against a catalog file: load, select, augment, persist.
#[derive(Clone, Debug, PartialEq)]
pub struct AugmentJob {
    /// Input catalog.
    pub annotations: PathBuf,
    /// Output catalog; `None` rewrites the input.
    pub updated_annotations: Option<PathBuf>,
    /// Directory source images are resolved against.
    pub image_dir: PathBuf,
    /// Directory derived images go to; `None` uses `image_dir`.
    pub augmented_image_dir: Option<PathBuf>,
    /// Which images to augment.
    pub criteria: SelectionCriteria,
    /// Transform settings, nighttime flag included.
    pub pipeline: PipelineConfig,
    /// Seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Fixed timestamp token for derived file names.
    pub timestamp: Option<String>,
}

/// What an [`AugmentJob`] did.
#[derive(Clone, Debug, PartialEq)]
pub struct AugmentOutcome {
    /// Per-image details.
    pub report: AugmentReport,
    /// Catalog path written, if anything changed.
    pub written: Option<PathBuf>,
}

impl AugmentJob {
    /// Job with default pipeline settings, rewriting the input catalog in place.
    pub fn new(
        annotations: impl Into<PathBuf>,
        image_dir: impl Into<PathBuf>,
        criteria: SelectionCriteria,
    ) -> Self {
        Self {
            annotations: annotations.into(),
            updated_annotations: None,
            image_dir: image_dir.into(),
            augmented_image_dir: None,
            criteria,
            pipeline: PipelineConfig::default(),
            seed: None,
            timestamp: None,
        }
    }

    /// Catalog path the job writes to.
    pub fn output_catalog(&self) -> &Path {
        self.updated_annotations
            .as_deref()
            .unwrap_or(&self.annotations)
    }

    /// Run the job. Every configuration problem is reported before anything is written.
    #[tracing::instrument(skip_all, fields(annotations = %self.annotations.display()))]
    pub fn run(&self) -> CocoAugResult<AugmentOutcome> {
        require_dir(&self.image_dir, "image directory")?;
        let mut catalog = Catalog::from_path(&self.annotations)?;
        let transform = TransformPipeline::new(&self.pipeline)?;
        let selected = select(&catalog, &self.criteria)?;
        tracing::info!(
            classes = ?self.criteria.category_names,
            id_prefix = ?self.criteria.id_prefix,
            candidates = selected.len(),
            nighttime = transform.is_nighttime(),
            "augmenting images"
        );

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let opts = AugmentOpts {
            image_root: self.image_dir.clone(),
            output_root: self
                .augmented_image_dir
                .clone()
                .unwrap_or_else(|| self.image_dir.clone()),
            timestamp: self.timestamp.clone(),
        };
        let report = augment(&mut catalog, &selected, &transform, &mut rng, &opts)?;

        if report.augmented() == 0 {
            tracing::info!("no images augmented, catalog left unchanged");
            return Ok(AugmentOutcome {
                report,
                written: None,
            });
        }

        let out = self.output_catalog().to_path_buf();
        catalog.write_to_path(&out)?;
        tracing::info!(
            path = %out.display(),
            augmented = report.augmented(),
            skipped = report.skipped.len(),
            "updated annotations saved"
        );
        Ok(AugmentOutcome {
            report,
            written: Some(out),
        })
    }
}

/// Which images a [`PurgeJob`] removes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurgePolicy {
    /// Derived images with no annotations.
    Orphans,
    /// Files in the image directory whose name contains every substring.
    MatchingFiles {
        /// Substrings that must all appear in the file name.
        required: Vec<String>,
    },
}

/// One cascade-delete run against a catalog file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurgeJob {
    /// Catalog rewritten in place.
    pub annotations: PathBuf,
    /// Directory image files are deleted from.
    pub image_dir: PathBuf,
    /// Selection policy.
    pub policy: PurgePolicy,
}

/// What a [`PurgeJob`] did.
#[derive(Clone, Debug, PartialEq)]
pub struct PurgeOutcome {
    /// Per-image details.
    pub report: RemoveReport,
    /// Whether the catalog was rewritten.
    pub written: bool,
}

impl PurgeJob {
    /// Run the job.
    #[tracing::instrument(skip_all, fields(annotations = %self.annotations.display()))]
    pub fn run(&self) -> CocoAugResult<PurgeOutcome> {
        require_dir(&self.image_dir, "image directory")?;
        let mut catalog = Catalog::from_path(&self.annotations)?;

        let targets = match &self.policy {
            PurgePolicy::Orphans => find_orphans(&catalog),
            PurgePolicy::MatchingFiles { required } => {
                if required.is_empty() {
                    return Err(CocoAugError::configuration(
                        "at least one search substring is required",
                    ));
                }
                let listing = fsio::list_file_names(&self.image_dir)?;
                find_by_substrings(&catalog, &listing, required)
            }
        };
        tracing::info!(targets = targets.len(), policy = ?self.policy, "images selected for removal");

        let opts = PurgeOpts {
            image_root: self.image_dir.clone(),
        };
        let report = remove(&mut catalog, &targets, &opts)?;
        if report.removed.is_empty() {
            tracing::info!("nothing removed, catalog left unchanged");
            return Ok(PurgeOutcome {
                report,
                written: false,
            });
        }

        catalog.write_to_path(&self.annotations)?;
        tracing::info!(
            removed = report.removed.len(),
            annotations = report.annotations_removed,
            "updated annotations saved"
        );
        Ok(PurgeOutcome {
            report,
            written: true,
        })
    }
}

fn require_dir(path: &Path, what: &str) -> CocoAugResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(CocoAugError::configuration(format!(
            "{what} '{}' does not exist",
            path.display()
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/jobs.rs"]
mod tests;
