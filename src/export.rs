//! YOLO dataset export.
//!
//! Manual and training records become `images/{train,val}` plus
//! `labels/{train,val}` and a `dataset.yaml` manifest. Frames are split by a
//! deterministic prefix cut, so re-exporting an unchanged record set yields
//! the same split and class indices.

mod exporter;
mod frames;
mod label;
mod manifest;
mod split;
mod vocabulary;

pub use exporter::{DatasetExporter, ExportReport};
pub use frames::{DatasetEntry, DatasetFrames, FrameProvider, FrameReader, VideoFrames};
pub use label::YoloLabel;
pub use manifest::DatasetManifest;
pub use split::{Split, prefix_split, split_point};
pub use vocabulary::ClassVocabulary;
