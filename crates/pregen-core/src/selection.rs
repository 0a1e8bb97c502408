//! Spatial selection: which chunks of which target a job should pre-generate.
//!
//! A `Selection` is plain data. It is edited by the command surface, validated
//! by the scheduler on `start`, and turned into an ordered coordinate sequence
//! by [`crate::traversal::Generator::prepare`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fine (block) units per chunk along one axis.
pub const CHUNK_SIZE: i32 = 16;

/// Identifier of the world/environment a job operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TargetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Chunk coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub z: i32,
}

impl Coord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Square,
    Circle,
}

impl Shape {
    /// Inclusion test for an offset `(x, z)` relative to the center.
    pub fn contains(self, x: i32, z: i32, radius: i32) -> bool {
        match self {
            Shape::Square => x.abs() <= radius && z.abs() <= radius,
            Shape::Circle => {
                let (x, z, r) = (x as i64, z as i64, radius as i64);
                x * x + z * z <= r * r
            }
        }
    }
}

impl FromStr for Shape {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "square" => Ok(Shape::Square),
            "circle" => Ok(Shape::Circle),
            _ => Err(ValidationError::UnknownShape(s.to_string())),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shape::Square => "square",
            Shape::Circle => "circle",
        })
    }
}

/// Visitation order of the chunks inside the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    #[default]
    Spiral,
    Concentric,
}

impl FromStr for Pattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spiral" => Ok(Pattern::Spiral),
            "concentric" => Ok(Pattern::Concentric),
            _ => Err(ValidationError::UnknownPattern(s.to_string())),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pattern::Spiral => "spiral",
            Pattern::Concentric => "concentric",
        })
    }
}

/// Region descriptor: center in fine coordinates, radius in chunks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub target: Option<TargetId>,
    pub shape: Shape,
    pub pattern: Pattern,
    pub center_x: i32,
    pub center_z: i32,
    pub radius: i32,
}

impl Selection {
    /// Selection on `target` centered at the origin with the given radius.
    pub fn new(target: impl Into<TargetId>, radius: i32) -> Self {
        Self {
            target: Some(target.into()),
            radius,
            ..Self::default()
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_center(mut self, x: i32, z: i32) -> Self {
        self.center_x = x;
        self.center_z = z;
        self
    }

    pub fn with_radius(mut self, radius: i32) -> Self {
        self.radius = radius;
        self
    }

    /// Center on the midpoint of two fine-coordinate corners; radius covers the
    /// longer half-extent, in chunks.
    pub fn from_corners(target: impl Into<TargetId>, x1: i32, z1: i32, x2: i32, z2: i32) -> Self {
        let (center_x, radius_x) = span(x1, x2);
        let (center_z, radius_z) = span(z1, z2);
        Self {
            target: Some(target.into()),
            center_x,
            center_z,
            radius: radius_x.max(radius_z),
            ..Self::default()
        }
    }

    /// Fit the selection to a square world border of `size` fine units.
    pub fn fit_to_border(mut self, center_x: i32, center_z: i32, size: f64) -> Self {
        self.center_x = center_x;
        self.center_z = center_z;
        self.radius = (size / 2.0 / CHUNK_SIZE as f64) as i32;
        self
    }

    /// Chunk containing the fine-coordinate center (floor division by 16).
    pub fn center_chunk(&self) -> Coord {
        Coord::new(self.center_x >> 4, self.center_z >> 4)
    }

    /// Geometric estimate of the unit count. Progress uses the generator's
    /// exact enumerated count instead.
    pub fn estimated_total(&self) -> u64 {
        let r = self.radius.max(0) as u64;
        match self.shape {
            Shape::Square => (2 * r + 1) * (2 * r + 1),
            Shape::Circle => (std::f64::consts::PI * (r * r) as f64).round() as u64,
        }
    }

    pub fn validate(&self) -> Result<&TargetId, ValidationError> {
        let target = self.target.as_ref().ok_or(ValidationError::MissingTarget)?;
        if self.radius <= 0 {
            return Err(ValidationError::NonPositiveRadius(self.radius));
        }
        Ok(target)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Midpoint and chunk half-extent of `[a, b]`, computed wide so extreme
/// corners cannot overflow. Both results always fit in `i32`.
fn span(a: i32, b: i32) -> (i32, i32) {
    let (a, b) = (i64::from(a), i64::from(b));
    let mid = (a + b) / 2;
    let half = (b - a).abs() / 2 / i64::from(CHUNK_SIZE);
    (mid as i32, half as i32)
}
