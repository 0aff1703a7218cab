use super::builder::AnnotationBuilder;
use super::record::Annotation;
use crate::worker::DetectionBatch;

/// Turn a worker batch into automatic records.
///
/// `labels` maps a class id to its name; ids it does not know become
/// `class_<id>`. Boxes are truncated to whole pixels in the batch frame's
/// coordinate space. Detections the builder rejects (empty boxes,
/// out-of-range scores) are skipped.
pub fn records_from_batch<F>(
    batch: &DetectionBatch,
    labels: F,
    source_id: &str,
    fps: f64,
) -> Vec<Annotation>
where
    F: Fn(usize) -> Option<String>,
{
    let (width, height) = batch.frame.dimensions();
    batch
        .detections
        .iter()
        .filter_map(|det| {
            let label = labels(det.class_id).unwrap_or_else(|| format!("class_{}", det.class_id));
            AnnotationBuilder::automatic()
                .tlbr(det.x1 as i32, det.y1 as i32, det.x2 as i32, det.y2 as i32)
                .frame_size(width, height)
                .class(label)
                .confidence(det.confidence)
                .track_id(det.track_id)
                .frame(batch.frame_index)
                .at_fps(fps)
                .source(source_id)
                .build()
                .ok()
        })
        .collect()
}
