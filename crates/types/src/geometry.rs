use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in points.
///
/// The origin is the top-left corner of the page and `y` grows downward, so
/// `y0` is the top edge and `y1` the bottom edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_origin_size(x: f32, y: f32, size: Size) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x + size.width,
            y1: y + size.height,
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// True when the rectangle has no positive area.
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Returns the rectangle shrunk by the given horizontal insets.
    pub fn inset_x(&self, left: f32, right: f32) -> Self {
        Self {
            x0: self.x0 + left,
            x1: self.x1 - right,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }
}

/// Geometry of one source page.
///
/// `width` and `height` are the unrotated media box dimensions; `rotation`
/// is the page's `/Rotate` value in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub rotation: i32,
}

impl PageGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            rotation: 0,
        }
    }

    pub fn with_rotation(mut self, rotation: i32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_rotated(&self) -> bool {
        self.rotation.rem_euclid(360) != 0
    }
}
