use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::frames::FrameProvider;
use super::label::YoloLabel;
use super::manifest::DatasetManifest;
use super::split::{Split, prefix_split};
use super::vocabulary::ClassVocabulary;
use crate::annotation::Annotation;
use crate::config::ExportConfig;
use crate::error::ExportError;

/// Counts reported after an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Annotated frames written with their label file.
    pub processed_frames: usize,
    /// Annotated frames that were candidates for export.
    pub total_frames: usize,
    pub annotation_count: usize,
    pub class_count: usize,
    pub background_images: usize,
    /// Frames, labels or background images that could not be written.
    pub failures: usize,
    pub train_frames: usize,
    pub val_frames: usize,
    pub manifest_path: PathBuf,
}

/// Writes manual and training records as a YOLO dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetExporter {
    config: ExportConfig,
}

impl DatasetExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export `records` of one source, reading images from `provider`.
    ///
    /// Only an empty selection or a failure to create the directory tree
    /// or manifest aborts. A frame that cannot be read or written is
    /// skipped and counted in [`ExportReport::failures`].
    pub fn export<'a, I, P>(
        &self,
        records: I,
        provider: &mut P,
        output_dir: impl AsRef<Path>,
    ) -> Result<ExportReport, ExportError>
    where
        I: IntoIterator<Item = &'a Annotation>,
        P: FrameProvider + ?Sized,
    {
        let output_dir = output_dir.as_ref();
        let selected: Vec<&Annotation> = records
            .into_iter()
            .filter(|r| {
                r.kind.is_exportable() && r.bbox.is_valid() && !r.class_label.trim().is_empty()
            })
            .collect();
        if selected.is_empty() {
            return Err(ExportError::NoAnnotations);
        }

        let vocabulary = ClassVocabulary::from_records(selected.iter().copied());
        let mut by_frame: BTreeMap<u64, Vec<&Annotation>> = BTreeMap::new();
        for &record in &selected {
            by_frame.entry(record.frame_index).or_default().push(record);
        }

        let mut frames: Vec<u64> = by_frame.keys().copied().collect();
        frames.sort_by_key(|&f| (provider.order_key(f).unwrap_or(u64::MAX), f));

        create_tree(output_dir)?;

        let mut report = ExportReport {
            total_frames: frames.len(),
            annotation_count: selected.len(),
            class_count: vocabulary.len(),
            ..ExportReport::default()
        };

        let (train, val) = prefix_split(&frames, self.config.train_ratio);
        for (split, split_frames) in [(Split::Train, train), (Split::Val, val)] {
            for &frame in split_frames {
                let records = by_frame.get(&frame).map(Vec::as_slice).unwrap_or_default();
                if self.write_frame(provider, output_dir, split, frame, records, &vocabulary) {
                    report.processed_frames += 1;
                    match split {
                        Split::Train => report.train_frames += 1,
                        Split::Val => report.val_frames += 1,
                    }
                } else {
                    report.failures += 1;
                }
            }
        }

        let annotated: BTreeSet<u64> = by_frame.keys().copied().collect();
        let (added, failed) = self.add_backgrounds(provider, output_dir, &annotated);
        report.background_images = added;
        report.failures += failed;

        let manifest_path = output_dir.join(&self.config.manifest_name);
        DatasetManifest::new(output_dir, &vocabulary)
            .write_to(&manifest_path)
            .map_err(|source| ExportError::Io {
                path: manifest_path.clone(),
                source,
            })?;
        report.manifest_path = manifest_path;

        info!(
            output = %output_dir.display(),
            processed = report.processed_frames,
            total = report.total_frames,
            annotations = report.annotation_count,
            classes = report.class_count,
            backgrounds = report.background_images,
            failures = report.failures,
            "dataset exported"
        );
        Ok(report)
    }

    /// Image plus label file for one annotated frame. Returns `false` on failure.
    fn write_frame<P>(
        &self,
        provider: &mut P,
        output_dir: &Path,
        split: Split,
        frame: u64,
        records: &[&Annotation],
        vocabulary: &ClassVocabulary,
    ) -> bool
    where
        P: FrameProvider + ?Sized,
    {
        let Some(name) = provider.image_name(frame, &self.config.image_extension) else {
            warn!(frame, "frame unknown to provider, skipped");
            return false;
        };
        let image_path = output_dir.join("images").join(split.dir_name()).join(&name);
        let (width, height) = match provider.materialize(frame, &image_path) {
            Ok(dimensions) => dimensions,
            Err(err) => {
                warn!(frame, error = %err, "cannot read frame, skipped");
                return false;
            }
        };

        let mut content = String::new();
        for record in records {
            let Some(class_index) = vocabulary.index_of(&record.class_label) else {
                continue;
            };
            let label = YoloLabel::from_bbox(class_index, record.bbox_for(width, height), width, height);
            content.push_str(&label.to_string());
            content.push('\n');
        }

        let stem = Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(name);
        let label_path = output_dir
            .join("labels")
            .join(split.dir_name())
            .join(format!("{stem}.txt"));
        if let Err(err) = fs::write(&label_path, content) {
            warn!(frame, path = %label_path.display(), error = %err, "cannot write label file");
            return false;
        }
        true
    }

    /// Copy frames without selected records as negatives. Returns
    /// `(added, failed)`. Existing destination files are left alone.
    fn add_backgrounds<P>(
        &self,
        provider: &mut P,
        output_dir: &Path,
        annotated: &BTreeSet<u64>,
    ) -> (usize, usize)
    where
        P: FrameProvider + ?Sized,
    {
        let mut candidates: Vec<(u64, u64)> = provider
            .known_frames()
            .into_iter()
            .filter(|f| !annotated.contains(f))
            .filter_map(|f| provider.order_key(f).map(|key| (key, f)))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();
        let candidates: Vec<u64> = candidates.into_iter().map(|(_, f)| f).collect();

        let (mut added, mut failed) = (0, 0);
        let (train, val) = prefix_split(&candidates, self.config.train_ratio);
        for (split, frames) in [(Split::Train, train), (Split::Val, val)] {
            for &frame in frames {
                let Some(name) = provider.image_name(frame, &self.config.image_extension) else {
                    continue;
                };
                let dest = output_dir.join("images").join(split.dir_name()).join(name);
                if dest.exists() {
                    debug!(frame, path = %dest.display(), "background already present");
                    continue;
                }
                match provider.materialize(frame, &dest) {
                    Ok(_) => added += 1,
                    Err(err) => {
                        warn!(frame, error = %err, "cannot copy background frame");
                        failed += 1;
                    }
                }
            }
        }
        (added, failed)
    }
}

fn create_tree(output_dir: &Path) -> Result<(), ExportError> {
    for kind in ["images", "labels"] {
        for split in Split::ALL {
            let dir = output_dir.join(kind).join(split.dir_name());
            fs::create_dir_all(&dir).map_err(|source| ExportError::Io { path: dir, source })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationBuilder;
    use crate::error::FrameReadError;
    use crate::export::VideoFrames;
    use crate::frame::Frame;

    fn reader(_: u64) -> Result<Frame, FrameReadError> {
        Ok(Frame::filled(40, 20, [9, 9, 9]))
    }

    #[test]
    fn test_automatic_records_are_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let auto = AnnotationBuilder::automatic()
            .tlbr(0, 0, 5, 5)
            .frame_size(40, 20)
            .class("crab")
            .confidence(0.99)
            .frame(1)
            .source("a.mp4")
            .build()
            .unwrap();
        let mut frames = VideoFrames::new("a.mp4", reader);
        let result = DatasetExporter::default().export([&auto], &mut frames, dir.path());
        assert!(matches!(result, Err(ExportError::NoAnnotations)));
        assert!(!dir.path().join("images").exists());
    }

    #[test]
    fn test_label_uses_materialized_size() {
        let dir = tempfile::tempdir().unwrap();
        // drawn on a 80x40 preview, exported from a 40x20 frame
        let manual = AnnotationBuilder::manual()
            .tlbr(0, 0, 40, 20)
            .frame_size(80, 40)
            .class("crab")
            .frame(3)
            .source("a.mp4")
            .build()
            .unwrap();
        let config = ExportConfig {
            image_extension: "png".into(),
            ..ExportConfig::default()
        };
        let mut frames = VideoFrames::new("a.mp4", reader);
        let report = DatasetExporter::new(config)
            .export([&manual], &mut frames, dir.path())
            .unwrap();

        // a single frame lands in val: floor(1 * 0.8) = 0
        assert_eq!(report.val_frames, 1);
        let label = fs::read_to_string(dir.path().join("labels/val/a_000003.txt")).unwrap();
        assert_eq!(label, "0 0.250000 0.250000 0.500000 0.500000\n");
        assert!(dir.path().join("images/val/a_000003.png").exists());
    }
}
