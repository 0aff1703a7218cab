use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::record::{Annotation, AnnotationId};
use super::view::{self, ViewFilter};

/// Every record seen for the current session, automatic and manual.
///
/// The backing collection is append/delete only. Filtering, best-per-track
/// merging and ordering happen in [`view`](Self::view), which recomputes
/// from scratch on each call. The store lives on the consumer thread and
/// needs no locking.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    records: Vec<Annotation>,
    next_id: u64,
    active_source: Option<String>,
    custom_classes: BTreeSet<String>,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
            active_source: None,
            custom_classes: BTreeSet::new(),
        }
    }

    /// Add a record and return its id.
    ///
    /// Manual and training records without a source are attributed to the
    /// active source. Records that fail validation are logged and dropped;
    /// the store is left unchanged.
    pub fn add(&mut self, mut record: Annotation) -> Option<AnnotationId> {
        if record.source_id.trim().is_empty() && !record.kind.is_automatic() {
            if let Some(source) = &self.active_source {
                record.source_id = source.clone();
            }
        }
        if let Err(err) = record.validate() {
            warn!(
                error = %err,
                kind = record.kind.as_str(),
                frame = record.frame_index,
                "rejected annotation"
            );
            return None;
        }

        let id = AnnotationId::new(self.next_id);
        self.next_id += 1;
        record.id = id;
        self.records.push(record);
        Some(id)
    }

    /// Add many records, returning how many were accepted.
    pub fn extend<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = Annotation>,
    {
        records
            .into_iter()
            .filter_map(|record| self.add(record))
            .count()
    }

    /// Remove a record. Removing an absent id is a no-op returning `false`.
    pub fn remove(&mut self, id: AnnotationId) -> bool {
        match self.records.iter().position(|r| r.id == id) {
            Some(pos) => {
                self.records.remove(pos);
                debug!(%id, "annotation removed");
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.records.iter().find(|r| r.id == id)
    }

    /// All records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record. Ids keep increasing across clears.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn active_source(&self) -> Option<&str> {
        self.active_source.as_deref()
    }

    /// Switch the source views are scoped to, optionally discarding all
    /// records of the previous session.
    pub fn set_active_source(&mut self, source_id: impl Into<String>, reset: bool) {
        let source_id = source_id.into();
        if reset {
            info!(source = %source_id, dropped = self.records.len(), "store reset for new source");
            self.records.clear();
        }
        self.active_source = Some(source_id);
    }

    /// Snapshot of the records to display; see [`view::build_view`].
    pub fn view(&self, filter: &ViewFilter) -> Vec<Annotation> {
        view::build_view(&self.records, filter, self.active_source.as_deref())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Best-per-track projection over all records, without filtering,
    /// in chronological order.
    pub fn best_records(&self) -> Vec<&Annotation> {
        let mut best = view::best_per_track(&self.records);
        view::sort_chronologically(&mut best);
        best
    }

    pub fn records_for_frame<'a>(
        &'a self,
        source_id: &'a str,
        frame_index: u64,
    ) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.records
            .iter()
            .filter(move |r| r.frame_index == frame_index && r.source_id == source_id)
    }

    /// Labels introduced by the user outside the model vocabulary.
    pub fn add_custom_class(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if label.trim().is_empty() {
            return false;
        }
        self.custom_classes.insert(label)
    }

    pub fn custom_classes(&self) -> impl Iterator<Item = &str> {
        self.custom_classes.iter().map(String::as_str)
    }

    /// Sorted, de-duplicated union of the model classes, the custom classes
    /// and every label present in the store.
    pub fn class_names<S: AsRef<str>>(&self, model_classes: &[S]) -> Vec<String> {
        let mut names: BTreeSet<&str> = model_classes.iter().map(AsRef::as_ref).collect();
        names.extend(self.custom_classes.iter().map(String::as_str));
        names.extend(self.records.iter().map(|r| r.class_label.as_str()));
        names.into_iter().map(str::to_owned).collect()
    }

    /// Cloned records belonging to `source_id`.
    pub fn source_snapshot(&self, source_id: &str) -> Vec<Annotation> {
        self.records
            .iter()
            .filter(|r| r.source_id == source_id)
            .cloned()
            .collect()
    }
}
