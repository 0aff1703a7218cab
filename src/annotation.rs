//! Annotation records and the store that consolidates them.
//!
//! Records come from two places: detection batches translated on the
//! consumer thread ([`records_from_batch`]) and manual boxes drawn by the
//! user. The [`AnnotationStore`] keeps every record; views are recomputed
//! from scratch by the pure functions in [`view`].

mod bbox;
mod builder;
mod record;
mod report;
mod session;
mod store;
mod timestamp;
mod translate;
pub mod view;

pub use bbox::BBox;
pub use builder::AnnotationBuilder;
pub use record::{Annotation, AnnotationId, AnnotationKind, FrameSize, LIVE_SOURCE};
pub use report::{CSV_HEADER, write_csv_report};
pub use session::{SessionSummary, load_session, save_session};
pub use store::AnnotationStore;
pub use timestamp::{parse_timestamp, timestamp_for_frame};
pub use translate::records_from_batch;
pub use view::ViewFilter;
