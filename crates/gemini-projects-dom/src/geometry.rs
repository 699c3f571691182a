//! Viewport and bounding box geometry.

use serde::{Deserialize, Serialize};

/// Viewport information for coordinate calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportInfo {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Device pixel ratio.
    pub device_pixel_ratio: f64,
    /// Scroll X offset.
    pub scroll_x: f64,
    /// Scroll Y offset.
    pub scroll_y: f64,
}

impl Default for ViewportInfo {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            device_pixel_ratio: 1.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

impl ViewportInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// The viewport as a box in its own coordinates.
    pub fn as_box(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

/// Bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Zero width or zero height.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside this bounding box.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Get the center point of this bounding box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if this box intersects with another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Area shared with another box.
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let w = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let h = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        w * h
    }

    /// Share of this box's area that lies inside `container`.
    ///
    /// Zero-area boxes count as one square pixel, so they only pass when they
    /// sit inside the container.
    pub fn overlap_ratio(&self, container: &BoundingBox) -> f64 {
        let area = self.area().max(1.0);
        let shared = if self.is_empty() {
            if container.contains(self.x, self.y) { 1.0 } else { 0.0 }
        } else {
            self.intersection_area(container)
        };
        (shared / area).min(1.0)
    }

    /// Distance from `reference`'s top-right corner to this box's top-left
    /// corner, the direction a context menu usually opens in.
    pub fn offset_from(&self, reference: &BoundingBox) -> f64 {
        let dx = self.x - reference.right();
        let dy = self.y - reference.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Check if this box is visible in viewport.
    pub fn is_visible_in_viewport(&self, viewport: &ViewportInfo) -> bool {
        self.intersects(&viewport.as_box())
    }

    /// Move vertically.
    pub fn shifted(&self, dy: f64) -> BoundingBox {
        BoundingBox {
            y: self.y + dy,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_contains() {
        let bbox = BoundingBox::new(10.0, 20.0, 100.0, 50.0);
        assert!(bbox.contains(50.0, 40.0));
        assert!(!bbox.contains(0.0, 0.0));
        assert!(!bbox.contains(200.0, 40.0));
    }

    #[test]
    fn test_bounding_box_center() {
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(bbox.center(), (50.0, 50.0));
    }

    #[test]
    fn test_bounding_box_intersects() {
        let box1 = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let box2 = BoundingBox::new(50.0, 50.0, 100.0, 100.0);
        let box3 = BoundingBox::new(200.0, 200.0, 100.0, 100.0);
        assert!(box1.intersects(&box2));
        assert!(!box1.intersects(&box3));
        assert_eq!(box1.intersection_area(&box2), 2500.0);
        assert_eq!(box1.intersection_area(&box3), 0.0);
    }

    #[test]
    fn test_overlap_ratio() {
        let menu = BoundingBox::new(100.0, 100.0, 200.0, 200.0);
        let inside = BoundingBox::new(100.0, 150.0, 200.0, 32.0);
        let half_out = BoundingBox::new(200.0, 150.0, 200.0, 32.0);
        let outside = BoundingBox::new(500.0, 500.0, 200.0, 32.0);
        assert_eq!(inside.overlap_ratio(&menu), 1.0);
        assert!((half_out.overlap_ratio(&menu) - 0.5).abs() < 1e-9);
        assert_eq!(outside.overlap_ratio(&menu), 0.0);
    }

    #[test]
    fn test_overlap_ratio_empty_box() {
        let menu = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(BoundingBox::new(10.0, 10.0, 0.0, 0.0).overlap_ratio(&menu), 1.0);
        assert_eq!(BoundingBox::new(500.0, 10.0, 0.0, 0.0).overlap_ratio(&menu), 0.0);
    }

    #[test]
    fn test_offset_from() {
        let trigger = BoundingBox::new(0.0, 100.0, 40.0, 40.0);
        let near = BoundingBox::new(40.0, 100.0, 200.0, 200.0);
        let far = BoundingBox::new(400.0, 500.0, 200.0, 200.0);
        assert_eq!(near.offset_from(&trigger), 0.0);
        assert!(far.offset_from(&trigger) > near.offset_from(&trigger));
    }

    #[test]
    fn test_viewport_default() {
        let vp = ViewportInfo::default();
        assert_eq!((vp.width, vp.height), (1280, 720));
        assert!(BoundingBox::new(1270.0, 0.0, 50.0, 50.0).is_visible_in_viewport(&vp));
        assert!(!BoundingBox::new(1300.0, 0.0, 50.0, 50.0).is_visible_in_viewport(&vp));
    }
}
