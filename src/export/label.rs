use std::fmt;

use crate::annotation::BBox;

/// One line of a YOLO label file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloLabel {
    pub class_index: usize,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloLabel {
    /// Clip `bbox` to a `width`×`height` image and normalize it.
    pub fn from_bbox(class_index: usize, bbox: BBox, width: u32, height: u32) -> Self {
        let [x_center, y_center, w, h] = bbox.to_normalized_xywh(width, height);
        Self {
            class_index,
            x_center,
            y_center,
            width: w,
            height: h,
        }
    }
}

impl fmt::Display for YoloLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_index, self.x_center, self.y_center, self.width, self.height
        )
    }
}
