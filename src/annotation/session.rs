//! JSON session files: every record of a store grouped by frame.
//!
//! ```json
//! { "model_used": "reef-v3.pt",
//!   "custom_classes": ["urchin"],
//!   "frames": [ { "frame_number": 12,
//!                 "auto_annotations": [ ... ],
//!                 "manual_annotations": [ ... ] } ] }
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::record::{Annotation, AnnotationKind, RawAnnotation};
use super::store::AnnotationStore;
use crate::error::SessionError;

#[derive(Serialize)]
struct SessionOut<'a> {
    model_used: Option<&'a str>,
    custom_classes: Vec<&'a str>,
    frames: Vec<FrameOut<'a>>,
}

#[derive(Serialize, Default)]
struct FrameOut<'a> {
    frame_number: u64,
    auto_annotations: Vec<&'a Annotation>,
    manual_annotations: Vec<&'a Annotation>,
}

#[derive(Deserialize)]
struct SessionIn {
    #[serde(default)]
    model_used: Option<String>,
    #[serde(default)]
    custom_classes: Vec<String>,
    #[serde(default)]
    frames: Vec<FrameIn>,
}

#[derive(Deserialize)]
struct FrameIn {
    frame_number: Option<u64>,
    #[serde(default)]
    auto_annotations: Vec<serde_json::Value>,
    #[serde(default)]
    manual_annotations: Vec<serde_json::Value>,
}

/// Outcome of [`load_session`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub loaded: usize,
    pub rejected: usize,
    pub model_used: Option<String>,
}

/// Write all records of `store` to `path`. Returns the number of records written.
pub fn save_session(
    store: &AnnotationStore,
    model_used: Option<&str>,
    path: impl AsRef<Path>,
) -> Result<usize, SessionError> {
    let path = path.as_ref();
    let io_err = |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut frames: BTreeMap<u64, FrameOut<'_>> = BTreeMap::new();
    for record in store.iter() {
        let frame = frames.entry(record.frame_index).or_insert_with(|| FrameOut {
            frame_number: record.frame_index,
            ..FrameOut::default()
        });
        if record.kind.is_automatic() {
            frame.auto_annotations.push(record);
        } else {
            frame.manual_annotations.push(record);
        }
    }
    let session = SessionOut {
        model_used,
        custom_classes: store.custom_classes().collect(),
        frames: frames.into_values().collect(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, &session)?;
    writer.flush().map_err(io_err)?;

    info!(path = %path.display(), records = store.len(), "session saved");
    Ok(store.len())
}

/// Replace the contents of `store` with the session at `path`.
///
/// Records that are malformed or fail validation are counted in
/// [`SessionSummary::rejected`] and skipped. A file that is not valid
/// JSON leaves the store untouched.
pub fn load_session(
    store: &mut AnnotationStore,
    path: impl AsRef<Path>,
) -> Result<SessionSummary, SessionError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let session: SessionIn = serde_json::from_str(&json)?;

    store.clear();
    for class in session.custom_classes {
        store.add_custom_class(class);
    }

    let mut summary = SessionSummary {
        model_used: session.model_used,
        ..SessionSummary::default()
    };
    for frame in session.frames {
        let lists = [
            (AnnotationKind::Automatic, frame.auto_annotations),
            (AnnotationKind::Manual, frame.manual_annotations),
        ];
        for (default_kind, values) in lists {
            for value in values {
                let record = serde_json::from_value::<RawAnnotation>(value)
                    .map_err(|e| e.to_string())
                    .and_then(|mut raw| {
                        raw.kind = raw.kind.or(Some(default_kind));
                        raw.frame_number = raw.frame_number.or(frame.frame_number);
                        Annotation::try_from(raw).map_err(|e| e.to_string())
                    });
                match record.map(|r| store.add(r)) {
                    Ok(Some(_)) => summary.loaded += 1,
                    Ok(None) => summary.rejected += 1,
                    Err(error) => {
                        warn!(%error, frame = ?frame.frame_number, "skipping session record");
                        summary.rejected += 1;
                    }
                }
            }
        }
    }

    info!(
        path = %path.display(),
        loaded = summary.loaded,
        rejected = summary.rejected,
        "session loaded"
    );
    Ok(summary)
}
