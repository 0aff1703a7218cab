use serde::{Deserialize, Serialize};

/// Integer pixel box in TLBR format (x1, y1, x2, y2).
///
/// Coordinates are relative to the frame size stored alongside the box and
/// may extend past the frame edges when drawn by hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    #[inline]
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from top-left corner and size (TLWH format).
    #[inline]
    pub fn from_tlwh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Create a box from float TLBR coordinates, truncating toward zero.
    #[inline]
    pub fn from_f32_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// True when the box has a positive area.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.x2 > self.x1 && self.y2 > self.y1
    }

    /// Clip to `[0, width] × [0, height]`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let w = width as i32;
        let h = height as i32;
        Self {
            x1: self.x1.clamp(0, w),
            y1: self.y1.clamp(0, h),
            x2: self.x2.clamp(0, w),
            y2: self.y2.clamp(0, h),
        }
    }

    /// Map the box from a `from` frame size onto a `to` frame size.
    pub fn rescale(&self, from: (u32, u32), to: (u32, u32)) -> Self {
        if from == to || from.0 == 0 || from.1 == 0 {
            return *self;
        }
        let sx = to.0 as f64 / from.0 as f64;
        let sy = to.1 as f64 / from.1 as f64;
        Self {
            x1: (self.x1 as f64 * sx) as i32,
            y1: (self.y1 as f64 * sy) as i32,
            x2: (self.x2 as f64 * sx) as i32,
            y2: (self.y2 as f64 * sy) as i32,
        }
    }

    /// Convert to normalized `[cx, cy, w, h]` for a `width`×`height` frame.
    ///
    /// The box is clipped to the frame first and every value is kept in `[0, 1]`.
    pub fn to_normalized_xywh(&self, width: u32, height: u32) -> [f64; 4] {
        if width == 0 || height == 0 {
            return [0.0; 4];
        }
        let clipped = self.clamp_to(width, height);
        let w = width as f64;
        let h = height as f64;
        [
            ((clipped.x1 + clipped.x2) as f64 / 2.0 / w).clamp(0.0, 1.0),
            ((clipped.y1 + clipped.y2) as f64 / 2.0 / h).clamp(0.0, 1.0),
            (clipped.width() as f64 / w).clamp(0.0, 1.0),
            (clipped.height() as f64 / h).clamp(0.0, 1.0),
        ]
    }
}
