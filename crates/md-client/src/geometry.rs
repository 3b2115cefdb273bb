//! Touch-to-screen geometry
//!
//! The remote screen is drawn scaled to fit the view with its aspect
//! ratio kept, leaving bars on two sides. Touches are mapped into the
//! image rectangle and normalised to `[0, 1]`.

use md_protocol::NormalizedPoint;

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f32, height as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Rectangle an `image` occupies when scaled to fit `view`, centred
///
/// `None` if either size is empty.
pub fn fit_rect(view: Size, image: Size) -> Option<Rect> {
    if view.is_degenerate() || image.is_degenerate() {
        return None;
    }
    let scale = (view.width / image.width).min(view.height / image.height);
    let width = image.width * scale;
    let height = image.height * scale;
    Some(Rect {
        x: (view.width - width) / 2.0,
        y: (view.height - height) / 2.0,
        width,
        height,
    })
}

/// Map a touch at `(x, y)` in view coordinates to a point on the image
///
/// Touches on the bars around the image map to `None`.
pub fn normalize_touch(view: Size, image: Size, x: f32, y: f32) -> Option<NormalizedPoint> {
    let rect = fit_rect(view, image)?;
    if !rect.contains(x, y) {
        return None;
    }
    Some(NormalizedPoint::clamped(
        (x - rect.x) / rect.width,
        (y - rect.y) / rect.height,
    ))
}

/// Turns drag deltas into relative pointer moves
///
/// Deltas are scaled by `sensitivity`; sub-pixel remainders carry over to
/// the next event so slow drags still move. Moves whose magnitude stays
/// under `deadzone` are held back.
#[derive(Debug, Clone)]
pub struct PointerSmoother {
    sensitivity: f32,
    deadzone: f32,
    carry: (f32, f32),
}

impl Default for PointerSmoother {
    fn default() -> Self {
        Self::new(1.5, 1.0)
    }
}

impl PointerSmoother {
    pub fn new(sensitivity: f32, deadzone: f32) -> Self {
        Self {
            sensitivity,
            deadzone: deadzone.max(0.0),
            carry: (0.0, 0.0),
        }
    }

    /// Feed one drag delta; returns whole-pixel movement to send, if any
    pub fn push(&mut self, dx: f32, dy: f32) -> Option<(i32, i32)> {
        let x = self.carry.0 + dx * self.sensitivity;
        let y = self.carry.1 + dy * self.sensitivity;

        if x.hypot(y) < self.deadzone {
            self.carry = (x, y);
            return None;
        }

        let (mx, my) = (x.trunc(), y.trunc());
        self.carry = (x - mx, y - my);
        if mx == 0.0 && my == 0.0 {
            return None;
        }
        Some((mx as i32, my as i32))
    }

    /// Forget accumulated movement (e.g. at the end of a drag)
    pub fn reset(&mut self) {
        self.carry = (0.0, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_wide_image_in_tall_view() {
        // 1920x1080 into 1080x1920: scaled to 1080x607.5, bars top and bottom
        let rect = fit_rect(Size::new(1080.0, 1920.0), Size::new(1920.0, 1080.0)).unwrap();
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.width, 1080.0);
        assert!((rect.height - 607.5).abs() < 0.01);
        assert!((rect.y - 656.25).abs() < 0.01);
    }

    #[test]
    fn test_touch_in_bar_is_ignored() {
        let view = Size::new(1080.0, 1920.0);
        let image = Size::new(1920.0, 1080.0);
        assert_eq!(normalize_touch(view, image, 540.0, 100.0), None);
    }

    #[test]
    fn test_touch_maps_to_image() {
        let view = Size::new(1080.0, 1920.0);
        let image = Size::from((1920, 1080));
        let p = normalize_touch(view, image, 540.0, 960.0).unwrap();
        assert!((p.x() - 0.5).abs() < 1e-4);
        assert!((p.y() - 0.5).abs() < 1e-4);

        let corner = normalize_touch(view, image, 0.0, 656.25).unwrap();
        assert_eq!(corner.x(), 0.0);
        assert!(corner.y().abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_sizes() {
        assert_eq!(fit_rect(Size::new(0.0, 100.0), Size::new(10.0, 10.0)), None);
        assert_eq!(normalize_touch(Size::new(100.0, 100.0), Size::new(0.0, 0.0), 1.0, 1.0), None);
    }

    #[test]
    fn test_smoother_carries_remainder() {
        let mut smoother = PointerSmoother::new(1.0, 0.0);
        assert_eq!(smoother.push(0.6, 0.0), None);
        assert_eq!(smoother.push(0.6, 0.0), Some((1, 0)));
    }

    #[test]
    fn test_smoother_deadzone_and_sensitivity() {
        let mut smoother = PointerSmoother::new(2.0, 3.0);
        assert_eq!(smoother.push(1.0, 0.0), None);
        assert_eq!(smoother.push(1.0, -1.0), Some((4, -2)));

        smoother.push(0.4, 0.0);
        smoother.reset();
        assert_eq!(smoother.push(1.0, 0.0), None);
    }
}
