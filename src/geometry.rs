// ============================================================================
// GEOMETRY - points, angle wrapping, grid/magnet snapping, polygon vertices
// ============================================================================

use std::f32::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Canvas-space point in pixels. Pixel (x, y) is sampled at exactly (x, y).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    pub fn min(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x.min(other.x), self.y.min(other.y))
    }

    pub fn abs(self) -> Vec2 {
        Vec2::new(self.x.abs(), self.y.abs())
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        self + (other - self) * t
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

// ============================================================================
// ANGLES
// ============================================================================

/// Coarse wheel rotation step in degrees.
pub const WHEEL_STEP_COARSE: f32 = 15.0;
/// Fine wheel rotation step (Alt held).
pub const WHEEL_STEP_FINE: f32 = 1.0;

/// Normalize degrees into (-180, 180].
pub fn wrap_angle(deg: f32) -> f32 {
    let mut a = deg % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Apply one wheel notch to `angle`: scrolling up (negative delta) turns
/// counter-clockwise by a positive step. A zero delta leaves it alone.
pub fn rotate_by_wheel(angle: f32, delta_y: f32, fine: bool) -> f32 {
    let step = if fine { WHEEL_STEP_FINE } else { WHEEL_STEP_COARSE };
    let next = if delta_y < 0.0 {
        angle + step
    } else if delta_y > 0.0 {
        angle - step
    } else {
        angle
    };
    wrap_angle(next)
}

pub fn deg_to_rad(deg: f32) -> f32 {
    PI * deg / 180.0
}

/// Line-tool Shift constraint: snap `cur` so the segment from `last` lies in
/// one of the eight 22.5°-wide buckets around the horizontal, vertical and
/// diagonal directions.
pub fn snap_segment(last: Vec2, cur: Vec2) -> Vec2 {
    let dx = cur.x - last.x;
    let dy = cur.y - last.y;
    let angle = dy.atan2(dx).abs();

    if angle < PI / 8.0 || angle > 7.0 * PI / 8.0 {
        Vec2::new(cur.x, last.y)
    } else if (PI / 8.0..=3.0 * PI / 8.0).contains(&angle) {
        let sign = if dy > 0.0 { -1.0 } else { 1.0 };
        let new_y = (deg_to_rad(135.0).tan() * dx * sign).round();
        Vec2::new(cur.x, last.y + new_y)
    } else if (5.0 * PI / 8.0..=7.0 * PI / 8.0).contains(&angle) {
        let sign = if dy > 0.0 { -1.0 } else { 1.0 };
        let new_y = (deg_to_rad(45.0).tan() * dx * sign).round();
        Vec2::new(cur.x, last.y + new_y)
    } else {
        Vec2::new(last.x, cur.y)
    }
}

// ============================================================================
// POLYGON
// ============================================================================

/// Fixed rotation so a polygon's first vertex points straight up.
pub const POLYGON_ROTATION: f32 = 1.5 * PI;

/// `sides + 1` vertices (the last closes the outline) at
/// `center + size * (cos, sin)(2πi/N + 1.5π)`.
pub fn polygon_vertices(center: Vec2, size: f32, sides: u32) -> Vec<Vec2> {
    let n = sides.max(3);
    (0..=n)
        .map(|i| {
            let theta = 2.0 * PI * i as f32 / n as f32 + POLYGON_ROTATION;
            Vec2::new(center.x + size * theta.cos(), center.y + size * theta.sin())
        })
        .collect()
}

/// The delta component with the larger magnitude, sign preserved.
pub fn dominant_delta(anchor: Vec2, pos: Vec2) -> f32 {
    let dx = pos.x - anchor.x;
    let dy = pos.y - anchor.y;
    if dx.abs() >= dy.abs() { dx } else { dy }
}

// ============================================================================
// MAGNETISM
// ============================================================================

/// Which point of a selection snaps to the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MagnetAnchor {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterCenter,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl MagnetAnchor {
    pub const ALL: [MagnetAnchor; 9] = [
        MagnetAnchor::TopLeft,
        MagnetAnchor::TopCenter,
        MagnetAnchor::TopRight,
        MagnetAnchor::CenterLeft,
        MagnetAnchor::CenterCenter,
        MagnetAnchor::CenterRight,
        MagnetAnchor::BottomLeft,
        MagnetAnchor::BottomCenter,
        MagnetAnchor::BottomRight,
    ];

    /// Offset from the anchor point back to the top-left corner.
    pub fn offset(self, width: f32, height: f32) -> Vec2 {
        let (fx, fy) = match self {
            MagnetAnchor::TopLeft => (0.0, 0.0),
            MagnetAnchor::TopCenter => (0.5, 0.0),
            MagnetAnchor::TopRight => (1.0, 0.0),
            MagnetAnchor::CenterLeft => (0.0, 0.5),
            MagnetAnchor::CenterCenter => (0.5, 0.5),
            MagnetAnchor::CenterRight => (1.0, 0.5),
            MagnetAnchor::BottomLeft => (0.0, 1.0),
            MagnetAnchor::BottomCenter => (0.5, 1.0),
            MagnetAnchor::BottomRight => (1.0, 1.0),
        };
        Vec2::new(-width * fx, -height * fy)
    }
}

/// Top-left corner that puts `anchor` of a `width`×`height` box on `corner`.
pub fn magnet_top_corner(anchor: MagnetAnchor, corner: Vec2, width: f32, height: f32) -> Vec2 {
    corner + anchor.offset(width, height)
}

/// Round each coordinate to the nearest multiple of `grid`.
pub fn snap_to_grid(p: Vec2, grid: f32) -> Vec2 {
    if grid <= 0.0 {
        return p;
    }
    Vec2::new((p.x / grid).round() * grid, (p.y / grid).round() * grid)
}
