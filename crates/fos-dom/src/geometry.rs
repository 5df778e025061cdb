//! Geometry APIs
//!
//! DOMRect and the intersection math used by viewport observers.

/// DOMRect - rectangle geometry in document coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DOMRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DOMRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 { self.y }
    pub fn left(&self) -> f32 { self.x }
    pub fn right(&self) -> f32 { self.x + self.width }
    pub fn bottom(&self) -> f32 { self.y + self.height }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Check if `other` lies entirely inside this rect (edges inclusive)
    pub fn contains_rect(&self, other: &DOMRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Calculate intersection with another rect
    ///
    /// Rects that only share an edge do not intersect.
    pub fn intersect(&self, other: &DOMRect) -> Option<DOMRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right > x && bottom > y {
            Some(DOMRect {
                x,
                y,
                width: right - x,
                height: bottom - y,
            })
        } else {
            None
        }
    }

    /// Grow the rect by `margin` on every side
    pub fn inflate(&self, margin: f32) -> DOMRect {
        DOMRect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    /// Fraction of this rect's area that falls inside `root`, in `[0, 1]`.
    ///
    /// A zero-area rect counts as fully visible when it sits inside `root`.
    pub fn intersection_ratio(&self, root: &DOMRect) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return if root.contains_rect(self) { 1.0 } else { 0.0 };
        }
        self.intersect(root)
            .map(|i| (i.area() / area).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }
}
