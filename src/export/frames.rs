//! Where exported images come from.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::annotation::LIVE_SOURCE;
use crate::error::FrameReadError;
use crate::frame::Frame;

/// Random access to the frames of a video.
pub trait FrameReader {
    fn read_frame(&mut self, frame_index: u64) -> Result<Frame, FrameReadError>;
}

impl<F> FrameReader for F
where
    F: FnMut(u64) -> Result<Frame, FrameReadError>,
{
    fn read_frame(&mut self, frame_index: u64) -> Result<Frame, FrameReadError> {
        self(frame_index)
    }
}

/// A set of frames the exporter can write out as images.
pub trait FrameProvider {
    /// Every frame that exists in the source, used to find background
    /// frames. May be empty when the source cannot enumerate its frames.
    fn known_frames(&self) -> Vec<u64>;

    /// Position of a frame in the order frames are split by; `None` for
    /// frames the provider does not know.
    fn order_key(&self, frame_index: u64) -> Option<u64>;

    /// File name for the frame's image.
    fn image_name(&self, frame_index: u64, extension: &str) -> Option<String>;

    /// Write the frame's image to `dest` and return its dimensions.
    fn materialize(&mut self, frame_index: u64, dest: &Path) -> Result<(u32, u32), FrameReadError>;
}

/// Frames decoded from a video file or camera through a [`FrameReader`].
pub struct VideoFrames<R> {
    reader: R,
    prefix: String,
    known: Vec<u64>,
}

impl<R: FrameReader> VideoFrames<R> {
    /// `source_id` names the images: `<stem>_<frame:06>.<ext>` with the
    /// stem reduced to alphanumerics, `_` and `-`; live sources and
    /// unnamed files fall back to `frame_<frame:06>.<ext>`.
    pub fn new(source_id: &str, reader: R) -> Self {
        let prefix = if source_id == LIVE_SOURCE {
            String::new()
        } else {
            sanitized_stem(source_id)
        };
        Self {
            reader,
            prefix,
            known: Vec::new(),
        }
    }

    /// Frames eligible as background images.
    pub fn with_known_frames(mut self, frames: impl IntoIterator<Item = u64>) -> Self {
        self.known = frames.into_iter().collect();
        self.known.sort_unstable();
        self.known.dedup();
        self
    }
}

fn sanitized_stem(source_id: &str) -> String {
    Path::new(source_id)
        .file_stem()
        .map(|s| {
            s.to_string_lossy()
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
                .collect()
        })
        .unwrap_or_default()
}

impl<R: FrameReader> FrameProvider for VideoFrames<R> {
    fn known_frames(&self) -> Vec<u64> {
        self.known.clone()
    }

    fn order_key(&self, frame_index: u64) -> Option<u64> {
        Some(frame_index)
    }

    fn image_name(&self, frame_index: u64, extension: &str) -> Option<String> {
        Some(if self.prefix.is_empty() {
            format!("frame_{frame_index:06}.{extension}")
        } else {
            format!("{}_{frame_index:06}.{extension}", self.prefix)
        })
    }

    fn materialize(&mut self, frame_index: u64, dest: &Path) -> Result<(u32, u32), FrameReadError> {
        let frame = self.reader.read_frame(frame_index)?;
        frame.image().save(dest)?;
        Ok(frame.dimensions())
    }
}

/// One image of an imported dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEntry {
    pub path: PathBuf,
    /// Frame of the video the image was originally extracted from.
    pub original_frame: u64,
    /// Frame index records of this dataset refer to.
    pub dataset_index: u64,
}

/// Images of an imported dataset. Records refer to them by
/// `dataset_index`; the split follows list position.
#[derive(Debug, Clone, Default)]
pub struct DatasetFrames {
    entries: Vec<DatasetEntry>,
    /// Output file name per entry, unique across the dataset.
    names: Vec<Option<String>>,
}

impl DatasetFrames {
    /// Images sharing a file name get `_<n>` appended to the stem of every
    /// occurrence after the first, so none overwrites another on export.
    pub fn new(entries: Vec<DatasetEntry>) -> Self {
        let names = unique_names(&entries);
        Self { entries, names }
    }

    /// Entries for `paths` in the given order, numbered from zero. The
    /// original frame is read from a trailing `_<digits>` in the file stem
    /// when there is one.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let entries = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| {
                let path = path.into();
                let original_frame = original_frame_from_name(&path).unwrap_or(i as u64);
                DatasetEntry {
                    path,
                    original_frame,
                    dataset_index: i as u64,
                }
            })
            .collect();
        Self::new(entries)
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, frame_index: u64) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.dataset_index == frame_index)
    }
}

fn unique_names(entries: &[DatasetEntry]) -> Vec<Option<String>> {
    let mut taken = HashSet::new();
    entries
        .iter()
        .map(|entry| {
            let name = entry.path.file_name()?.to_string_lossy().into_owned();
            if taken.insert(name.clone()) {
                return Some(name);
            }
            let as_path = Path::new(&name);
            let stem = as_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let extension = as_path.extension().map(|e| e.to_string_lossy().into_owned());
            let renamed = (1..)
                .map(|n| match &extension {
                    Some(ext) => format!("{stem}_{n}.{ext}"),
                    None => format!("{stem}_{n}"),
                })
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or(name);
            taken.insert(renamed.clone());
            warn!(
                path = %entry.path.display(),
                renamed = %renamed,
                "duplicate image name in dataset"
            );
            Some(renamed)
        })
        .collect()
}

fn original_frame_from_name(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let (_, digits) = stem.rsplit_once('_')?;
    digits.parse().ok()
}

impl FrameProvider for DatasetFrames {
    fn known_frames(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.dataset_index).collect()
    }

    fn order_key(&self, frame_index: u64) -> Option<u64> {
        self.position(frame_index).map(|p| p as u64)
    }

    fn image_name(&self, frame_index: u64, _extension: &str) -> Option<String> {
        self.names.get(self.position(frame_index)?)?.clone()
    }

    fn materialize(&mut self, frame_index: u64, dest: &Path) -> Result<(u32, u32), FrameReadError> {
        let pos = self
            .position(frame_index)
            .ok_or(FrameReadError::NotFound(frame_index))?;
        let src = &self.entries[pos].path;
        let dimensions = image::image_dimensions(src)?;
        if src != dest {
            fs::copy(src, dest)?;
        }
        Ok(dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(frame_index: u64) -> Result<Frame, FrameReadError> {
        if frame_index > 100 {
            return Err(FrameReadError::NotFound(frame_index));
        }
        Ok(Frame::filled(16, 8, [frame_index as u8, 0, 0]))
    }

    #[test]
    fn test_video_image_names() {
        let frames = VideoFrames::new("/clips/Reef dive #2.mp4", reader);
        assert_eq!(
            frames.image_name(42, "jpg").as_deref(),
            Some("Reefdive2_000042.jpg")
        );
        let live = VideoFrames::new(LIVE_SOURCE, reader);
        assert_eq!(live.image_name(7, "png").as_deref(), Some("frame_000007.png"));
    }

    #[test]
    fn test_video_materialize() {
        let dir = tempfile::tempdir().unwrap();
        let mut frames = VideoFrames::new("a.mp4", reader).with_known_frames([3, 1, 3]);
        assert_eq!(frames.known_frames(), vec![1, 3]);

        let dest = dir.path().join("a_000003.png");
        assert_eq!(frames.materialize(3, &dest).unwrap(), (16, 8));
        assert!(dest.exists());
        assert!(matches!(
            frames.materialize(101, &dir.path().join("x.png")),
            Err(FrameReadError::NotFound(101))
        ));
    }

    #[test]
    fn test_dataset_from_paths() {
        let frames = DatasetFrames::from_paths(["imgs/reef_000120.jpg", "imgs/other.jpg"]);
        assert_eq!(frames.entries()[0].original_frame, 120);
        assert_eq!(frames.entries()[1].original_frame, 1);
        assert_eq!(frames.known_frames(), vec![0, 1]);
        assert_eq!(frames.order_key(1), Some(1));
        assert_eq!(frames.order_key(5), None);
        assert_eq!(frames.image_name(0, "jpg").as_deref(), Some("reef_000120.jpg"));
    }

    #[test]
    fn test_dataset_duplicate_names_get_suffix() {
        let entry = |path: &str, index| DatasetEntry {
            path: PathBuf::from(path),
            original_frame: 10,
            dataset_index: index,
        };
        let frames = DatasetFrames::new(vec![
            entry("a/reef_000010.jpg", 4),
            entry("b/reef_000010.jpg", 7),
            entry("reef_000010_1.jpg", 9),
            entry("c/reef_000010.jpg", 2),
        ]);
        let names: Vec<_> = [4, 7, 9, 2]
            .into_iter()
            .map(|i| frames.image_name(i, "jpg").unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "reef_000010.jpg",
                "reef_000010_1.jpg",
                "reef_000010_1_1.jpg",
                "reef_000010_2.jpg",
            ]
        );
        assert_eq!(frames.order_key(9), Some(2));
    }
}
