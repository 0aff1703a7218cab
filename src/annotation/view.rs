//! Pure projections from stored records to what the user sees.
//!
//! Nothing here mutates the store. A view is rebuilt from the full record
//! set whenever a filter or the store changes.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::record::Annotation;
use super::timestamp::parse_timestamp;

/// Display filter applied by [`build_view`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewFilter {
    /// Only show this class, if set.
    pub class_filter: Option<String>,
    /// Automatic records below this confidence are hidden.
    pub min_confidence: f32,
    /// Number of most recent records shown.
    pub max_visible: usize,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            class_filter: None,
            min_confidence: 0.5,
            max_visible: 16,
        }
    }
}

impl ViewFilter {
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class_filter = Some(class.into());
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_max_visible(mut self, max_visible: usize) -> Self {
        self.max_visible = max_visible;
        self
    }
}

/// Class filter for every record, confidence threshold for automatic ones.
pub fn passes_filter(record: &Annotation, filter: &ViewFilter) -> bool {
    if filter
        .class_filter
        .as_ref()
        .is_some_and(|class| record.class_label != *class)
    {
        return false;
    }
    !record.kind.is_automatic() || record.confidence >= filter.min_confidence
}

/// Keep the highest-confidence automatic record per `(source, track)`.
///
/// The earlier record wins a tie. Manual and training records, and
/// automatic records without a track id, pass through untouched. Output
/// keeps the order in which each surviving key was first seen.
pub fn best_per_track<'a, I>(records: I) -> Vec<&'a Annotation>
where
    I: IntoIterator<Item = &'a Annotation>,
{
    let mut out: Vec<&'a Annotation> = Vec::new();
    let mut slots: HashMap<(&'a str, u64), usize> = HashMap::new();

    for record in records {
        let track = match (record.kind.is_automatic(), record.track_id) {
            (true, Some(track)) => track,
            _ => {
                out.push(record);
                continue;
            }
        };
        match slots.get(&(record.source_id.as_str(), track)) {
            Some(&slot) => {
                if record.confidence > out[slot].confidence {
                    out[slot] = record;
                }
            }
            None => {
                slots.insert((record.source_id.as_str(), track), out.len());
                out.push(record);
            }
        }
    }
    out
}

/// Order by timestamp, then frame index. Unparsable timestamps sort first.
pub fn sort_chronologically(records: &mut [&Annotation]) {
    records.sort_by_cached_key(|r| (SortKey(parse_timestamp(&r.timestamp)), r.frame_index));
}

#[derive(PartialEq)]
struct SortKey(Option<f64>);

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.total_cmp(&b),
        }
    }
}

/// Records to display, most recent last.
///
/// Filters, merges per track, sorts, narrows to `active_source` (falling
/// back to every source when it has no records) and keeps the last
/// `filter.max_visible`.
pub fn build_view<'a, I>(
    records: I,
    filter: &ViewFilter,
    active_source: Option<&str>,
) -> Vec<&'a Annotation>
where
    I: IntoIterator<Item = &'a Annotation>,
{
    let mut view = best_per_track(records.into_iter().filter(|r| passes_filter(r, filter)));
    sort_chronologically(&mut view);

    if let Some(source) = active_source {
        let scoped: Vec<&Annotation> = view
            .iter()
            .copied()
            .filter(|r| r.source_id == source)
            .collect();
        if !scoped.is_empty() {
            view = scoped;
        }
    }

    let skip = view.len().saturating_sub(filter.max_visible);
    view.split_off(skip)
}
