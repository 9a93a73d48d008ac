/// Colour identity of one pipe, linear RGB in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl PipeColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Hue, saturation and value each drawn uniformly from `[0, 1]`.
    pub fn random_hsv(rng: &mut oorandom::Rand32) -> Self {
        let h = rng.rand_float();
        let s = rng.rand_float();
        let v = rng.rand_float();
        Self::from_hsv(h, s, v)
    }

    /// `h` wraps around; `s` and `v` are clamped to `[0, 1]`.
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let h6 = h.rem_euclid(1.0) * 6.0;
        let sector = h6.floor();
        let f = h6 - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sector as u8 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self { r, g, b }
    }

    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (q(self.r), q(self.g), q(self.b))
    }

    pub fn lighten(self, amount: f32) -> Self {
        let l = |c: f32| (c + (1.0 - c) * amount).clamp(0.0, 1.0);
        Self::new(l(self.r), l(self.g), l(self.b))
    }

    pub fn darken(self, amount: f32) -> Self {
        let d = |c: f32| (c * (1.0 - amount)).clamp(0.0, 1.0);
        Self::new(d(self.r), d(self.g), d(self.b))
    }
}
