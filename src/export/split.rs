/// Dataset partition a frame is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];

    /// Directory name under `images/` and `labels/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

/// Number of leading items that go to the train split: `floor(len * ratio)`.
pub fn split_point(len: usize, ratio: f64) -> usize {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    ((len as f64 * ratio).floor() as usize).min(len)
}

/// Cut `items` into `(train, val)` at [`split_point`]. No shuffling.
pub fn prefix_split<T>(items: &[T], ratio: f64) -> (&[T], &[T]) {
    items.split_at(split_point(items.len(), ratio))
}
