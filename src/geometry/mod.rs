//! Geometric primitives for layout segmentation.
//!
//! Pixel-space rectangles use a top-left origin with `y` growing downwards,
//! which is the convention of both the OCR output and the contour finder.
//! Percentage boxes express the same rectangles relative to the frame size.

use serde::{Deserialize, Serialize};

/// A 2D point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use screen_sections::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of the analyzed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl FrameSize {
    /// Create a frame size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel area of the frame.
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Rectangle covering the whole frame.
    pub fn full_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: f64,
    /// Y coordinate of top-left corner
    pub y: f64,
    /// Width of rectangle
    pub width: f64,
    /// Height of rectangle
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use screen_sections::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points.
    ///
    /// # Examples
    ///
    /// ```
    /// use screen_sections::geometry::Rect;
    ///
    /// let rect = Rect::from_points(10.0, 20.0, 110.0, 70.0);
    /// assert_eq!(rect.x, 10.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn from_points(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Get the left edge x-coordinate.
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Get the top edge y-coordinate.
    pub fn top(&self) -> f64 {
        self.y
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Get the center point of the rectangle.
    ///
    /// # Examples
    ///
    /// ```
    /// use screen_sections::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// let center = rect.center();
    /// assert_eq!(center.x, 50.0);
    /// assert_eq!(center.y, 25.0);
    /// ```
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Check if a point lies strictly inside this rectangle.
    ///
    /// Points on any edge are outside.
    ///
    /// # Examples
    ///
    /// ```
    /// use screen_sections::geometry::{Rect, Point};
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// assert!(rect.contains_point_strict(&Point::new(50.0, 50.0)));
    /// assert!(!rect.contains_point_strict(&Point::new(100.0, 50.0)));
    /// ```
    pub fn contains_point_strict(&self, p: &Point) -> bool {
        self.left() < p.x && p.x < self.right() && self.top() < p.y && p.y < self.bottom()
    }

    /// Compute the union of this rectangle with another.
    ///
    /// Returns the smallest rectangle that contains both rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.left().min(other.left());
        let y0 = self.top().min(other.top());
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::from_points(x0, y0, x1, y1)
    }

    /// Grow the rectangle by `padding` on all four sides.
    pub fn expand(&self, padding: f64) -> Rect {
        Rect::from_points(
            self.left() - padding,
            self.top() - padding,
            self.right() + padding,
            self.bottom() + padding,
        )
    }

    /// Clip the rectangle to the frame bounds.
    ///
    /// A rectangle entirely outside the frame collapses to zero size on the
    /// nearest edge.
    pub fn clamp_to(&self, frame: FrameSize) -> Rect {
        let w = frame.width as f64;
        let h = frame.height as f64;
        let x0 = self.left().clamp(0.0, w);
        let y0 = self.top().clamp(0.0, h);
        let x1 = self.right().clamp(x0, w);
        let y1 = self.bottom().clamp(y0, h);
        Rect::from_points(x0, y0, x1, y1)
    }

    /// Compute the area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A bounding box expressed as percentages of the frame dimensions.
///
/// Every component lies in `[0, 100]` once produced by the engine, with
/// `x + width <= 100` and `y + height <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentBox {
    /// Left edge, percent of frame width
    pub x: f64,
    /// Top edge, percent of frame height
    pub y: f64,
    /// Width, percent of frame width
    pub width: f64,
    /// Height, percent of frame height
    pub height: f64,
}

impl PercentBox {
    /// Create a percentage box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The box covering the whole frame.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 100.0, 100.0)
    }

    /// Express a pixel rectangle relative to the frame.
    ///
    /// The rectangle is clipped to the frame first and the extents are
    /// trimmed so the result never spills past 100%.
    ///
    /// # Examples
    ///
    /// ```
    /// use screen_sections::geometry::{FrameSize, PercentBox, Rect};
    ///
    /// let frame = FrameSize::new(1000, 2000);
    /// let pct = PercentBox::from_pixel_rect(&Rect::new(0.0, 0.0, 1000.0, 300.0), frame);
    /// assert_eq!(pct, PercentBox::new(0.0, 0.0, 100.0, 15.0));
    /// ```
    pub fn from_pixel_rect(rect: &Rect, frame: FrameSize) -> Self {
        if frame.is_empty() {
            return Self::new(0.0, 0.0, 0.0, 0.0);
        }
        let clipped = rect.clamp_to(frame);
        let w = frame.width as f64;
        let h = frame.height as f64;
        let x = clipped.x / w * 100.0;
        let y = clipped.y / h * 100.0;
        let width = (clipped.width / w * 100.0).min(100.0 - x);
        let height = (clipped.height / h * 100.0).min(100.0 - y);
        Self::new(x, y, width, height)
    }

    /// Scale the box back into pixel space without rounding.
    pub fn to_pixel_rect(&self, frame: FrameSize) -> Rect {
        let w = frame.width as f64;
        let h = frame.height as f64;
        Rect::new(
            self.x / 100.0 * w,
            self.y / 100.0 * h,
            self.width / 100.0 * w,
            self.height / 100.0 * h,
        )
    }

    /// Check the containment invariant (`[0, 100]` with far edges inside the frame).
    pub fn is_within_frame(&self, tolerance: f64) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.x <= 100.0
            && self.y <= 100.0
            && self.x + self.width <= 100.0 + tolerance
            && self.y + self.height <= 100.0 + tolerance
    }
}
