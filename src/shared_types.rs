use std::ops::{Add, AddAssign, Neg};

/// A Plist dictionary.
pub type Plist = plist::Dictionary;

/// An additive correction to a normalized position.
///
/// The default is `(0.0, 0.0)`, which is what an uncorrected fixation has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal component, as a fraction of the frame width.
    pub x: f64,
    /// Vertical component, as a fraction of the frame height.
    pub y: f64,
}

impl Offset {
    /// The empty correction.
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    /// Returns a new `Offset`.
    pub const fn new(x: f64, y: f64) -> Self {
        Offset { x, y }
    }

    /// `true` if both components are exactly zero.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Offset {
    type Output = Offset;

    fn add(self, rhs: Offset) -> Offset {
        Offset { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl AddAssign for Offset {
    fn add_assign(&mut self, rhs: Offset) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Neg for Offset {
    type Output = Offset;

    fn neg(self) -> Offset {
        Offset { x: -self.x, y: -self.y }
    }
}

impl From<(f64, f64)> for Offset {
    fn from((x, y): (f64, f64)) -> Self {
        Offset { x, y }
    }
}

/// A position expressed as a fraction of the frame's width and height.
///
/// Nominally in `[0, 1]`, but nothing stops a correction from moving it outside
/// of that range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormPos {
    /// Horizontal position, `0.0` is the left edge.
    pub x: f64,
    /// Vertical position, `0.0` is the bottom edge.
    pub y: f64,
}

impl NormPos {
    /// Returns a new `NormPos`.
    pub const fn new(x: f64, y: f64) -> Self {
        NormPos { x, y }
    }
}

impl Add<Offset> for NormPos {
    type Output = NormPos;

    fn add(self, rhs: Offset) -> NormPos {
        NormPos { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl From<(f64, f64)> for NormPos {
    fn from((x, y): (f64, f64)) -> Self {
        NormPos { x, y }
    }
}

/// A color in RGBA (Red-Green-Blue-Alpha) format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel value, from 0 to 1.
    pub red: f64,
    /// Green channel value, from 0 to 1.
    pub green: f64,
    /// Blue channel value, from 0 to 1.
    pub blue: f64,
    /// Opacity, from 0 (transparent) to 1.
    pub alpha: f64,
}

impl Color {
    /// Returns a new `Color`.
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Color { red, green, blue, alpha }
    }
}
