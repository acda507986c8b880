//! Bounding boxes and ellipse helpers shared by the clean and measurement passes.

/// Inclusive pixel bounding box with signed coordinates.
///
/// A pixel at (x, y) is inside if `xmin <= x <= xmax` and `ymin <= y <= ymax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub xmin: i32,
    pub xmax: i32,
    pub ymin: i32,
    pub ymax: i32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    #[inline]
    pub const fn new(xmin: i32, xmax: i32, ymin: i32, ymax: i32) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// Inverted box that any included point replaces.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            xmin: i32::MAX,
            xmax: i32::MIN,
            ymin: i32::MAX,
            ymax: i32::MIN,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.xmin > self.xmax || self.ymin > self.ymax
    }

    #[inline]
    pub fn include(&mut self, x: i32, y: i32) {
        self.xmin = self.xmin.min(x);
        self.xmax = self.xmax.max(x);
        self.ymin = self.ymin.min(y);
        self.ymax = self.ymax.max(y);
    }

    /// Smallest box covering both boxes.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            xmin: self.xmin.min(other.xmin),
            xmax: self.xmax.max(other.xmax),
            ymin: self.ymin.min(other.ymin),
            ymax: self.ymax.max(other.ymax),
        }
    }

    /// Number of rows covered.
    #[inline]
    pub fn height(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.ymax - self.ymin + 1) as u32
        }
    }

    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }
}

/// Coefficients of the normalized ellipse quadratic form
/// `cxx·dx² + cyy·dy² + cxy·dx·dy`, equal to 1 on the ellipse boundary.
///
/// `theta` is the position angle of the major axis in degrees,
/// counter-clockwise from the +x axis.
pub fn ellipse_coefficients(a: f64, b: f64, theta: f64) -> (f64, f64, f64) {
    let (sin_t, cos_t) = theta.to_radians().sin_cos();
    let inv_a2 = 1.0 / (a * a);
    let inv_b2 = 1.0 / (b * b);
    let cxx = cos_t * cos_t * inv_a2 + sin_t * sin_t * inv_b2;
    let cyy = sin_t * sin_t * inv_a2 + cos_t * cos_t * inv_b2;
    let cxy = 2.0 * cos_t * sin_t * (inv_a2 - inv_b2);
    (cxx, cyy, cxy)
}

/// Evaluate the ellipse quadratic form at an offset from the centre.
#[inline]
pub fn ellipse_radius2(cxx: f64, cyy: f64, cxy: f64, dx: f64, dy: f64) -> f64 {
    cxx * dx * dx + cyy * dy * dy + cxy * dx * dy
}

/// Half extents in x and y of the ellipse `r2 <= 1`.
///
/// Returns `(0, 0)` for degenerate coefficient sets.
pub fn ellipse_half_extents(cxx: f64, cyy: f64, cxy: f64) -> (f64, f64) {
    if cxx <= 0.0 || cyy <= 0.0 {
        return (0.0, 0.0);
    }
    let dx = cxx - cxy * cxy / (4.0 * cyy);
    let dy = cyy - cxy * cxy / (4.0 * cxx);
    let dx = if dx > 0.0 { 1.0 / dx.sqrt() } else { 0.0 };
    let dy = if dy > 0.0 { 1.0 / dy.sqrt() } else { 0.0 };
    (dx, dy)
}
