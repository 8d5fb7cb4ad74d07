use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    pub fn normalize(self) -> Vec2 {
        let len = self.length();
        if len > 0.0 {
            Vec2::new(self.x / len, self.y / len)
        } else {
            Vec2::ZERO
        }
    }

    /// Left-hand normal (rotated +90° in screen space).
    pub fn perp(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    pub fn rotate(self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        self + (other - self) * t
    }

    pub fn midpoint(self, other: Vec2) -> Vec2 {
        self.lerp(other, 0.5)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f32 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self * rhs.x, self * rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }

    pub fn inset(&self, amount: f32) -> Rect {
        Rect::new(
            self.x + amount,
            self.y + amount,
            (self.width - amount * 2.0).max(0.0),
            (self.height - amount * 2.0).max(0.0),
        )
    }
}

/// Straight (non-premultiplied) color with channels in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb8(255, 255, 255);
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub const fn rgba8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a,
        }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
            return None;
        }
        let channel = |idx: usize| u8::from_str_radix(&digits[idx..idx + 2], 16).ok();
        let mut color = Rgba::rgb8(channel(0)?, channel(2)?, channel(4)?);
        if digits.len() == 8 {
            color.a = channel(6)? as f32 / 255.0;
        }
        Some(color)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        (q(self.r), q(self.g), q(self.b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod vec2_length {
        use super::*;

        #[test]
        fn calculates_length() {
            let v = Vec2::new(3.0, 4.0);
            assert_eq!(v.length_sq(), 25.0);
            assert_eq!(v.length(), 5.0);
        }

        #[test]
        fn distance_is_symmetric() {
            let a = Vec2::new(1.0, 1.0);
            let b = Vec2::new(4.0, 5.0);
            assert_eq!(a.distance(b), 5.0);
            assert_eq!(b.distance(a), 5.0);
        }

        #[test]
        fn zero_vector_normalizes_to_zero() {
            assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        }
    }

    mod vec2_rotate {
        use super::*;

        #[test]
        fn quarter_turn_maps_x_to_y() {
            let v = Vec2::new(1.0, 0.0).rotate(std::f32::consts::FRAC_PI_2);
            assert!(v.x.abs() < 1e-6);
            assert!((v.y - 1.0).abs() < 1e-6);
        }

        #[test]
        fn perp_is_orthogonal() {
            let v = Vec2::new(2.0, 3.0);
            let p = v.perp();
            assert_eq!(v.x * p.x + v.y * p.y, 0.0);
        }
    }

    mod vec2_ops {
        use super::*;

        #[test]
        fn arithmetic_composes() {
            let mut a = Vec2::new(1.0, 2.0);
            a += Vec2::new(3.0, 4.0);
            a -= Vec2::new(1.0, 1.0);
            assert_eq!(a, Vec2::new(3.0, 5.0));
            assert_eq!(2.0 * a, a * 2.0);
            assert_eq!(-a, Vec2::new(-3.0, -5.0));
        }

        #[test]
        fn midpoint_is_halfway() {
            let m = Vec2::new(0.0, 0.0).midpoint(Vec2::new(10.0, -4.0));
            assert_eq!(m, Vec2::new(5.0, -2.0));
        }
    }

    mod rect_ops {
        use super::*;

        #[test]
        fn intersect_overlapping() {
            let a = Rect::new(0.0, 0.0, 10.0, 10.0);
            let b = Rect::new(5.0, 5.0, 10.0, 10.0);
            assert_eq!(a.intersect(&b), Rect::new(5.0, 5.0, 5.0, 5.0));
        }

        #[test]
        fn disjoint_intersection_is_empty() {
            let a = Rect::new(0.0, 0.0, 1.0, 1.0);
            let b = Rect::new(5.0, 5.0, 1.0, 1.0);
            assert!(a.intersect(&b).is_empty());
        }
    }

    mod rgba_hex {
        use super::*;

        #[test]
        fn parses_six_digit_hex() {
            let c = Rgba::from_hex("#E8A4C4").expect("valid hex");
            assert_eq!(c.to_rgb8(), (0xE8, 0xA4, 0xC4));
            assert_eq!(c.a, 1.0);
        }

        #[test]
        fn parses_alpha_suffix() {
            let c = Rgba::from_hex("#FFFFFF80").expect("valid hex");
            assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
        }

        #[test]
        fn rejects_garbage() {
            assert!(Rgba::from_hex("#12").is_none());
            assert!(Rgba::from_hex("#GGGGGG").is_none());
            assert!(Rgba::from_hex("#ééé").is_none());
        }

        #[test]
        fn hex_parses_to_rgb8() {
            assert_eq!(Rgba::from_hex("#A4D4C4").map(Rgba::to_rgb8), Some((0xA4, 0xD4, 0xC4)));
        }

        #[test]
        fn with_alpha_clamps() {
            assert_eq!(Rgba::WHITE.with_alpha(3.0).a, 1.0);
            assert_eq!(Rgba::WHITE.with_alpha(-1.0).a, 0.0);
        }
    }
}
