/// Tolerances for the geometric tests used by the topology algorithms.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Linear tolerance for squared-length and unit-length comparisons
    pub linear: f64,
    /// Shortest edge accepted as the diagonal of a unit square
    pub diagonal_min: f64,
    /// Longest edge accepted as the diagonal of a unit square
    pub diagonal_max: f64,
}

impl Tolerance {
    pub const DEFAULT_LINEAR: f64 = 1e-6;
    pub const DEFAULT_DIAGONAL_MIN: f64 = 1.40;
    pub const DEFAULT_DIAGONAL_MAX: f64 = 1.42;

    pub fn new(linear: f64, diagonal_min: f64, diagonal_max: f64) -> Self {
        Self {
            linear,
            diagonal_min,
            diagonal_max,
        }
    }

    pub fn default_precision() -> Self {
        Self {
            linear: Self::DEFAULT_LINEAR,
            diagonal_min: Self::DEFAULT_DIAGONAL_MIN,
            diagonal_max: Self::DEFAULT_DIAGONAL_MAX,
        }
    }

    pub fn loose() -> Self {
        Self {
            linear: 1e-4,
            diagonal_min: 1.39,
            diagonal_max: 1.43,
        }
    }

    pub fn tight() -> Self {
        Self {
            linear: 1e-10,
            diagonal_min: 1.414,
            diagonal_max: 1.4143,
        }
    }

    /// Check if two values are equal within linear tolerance
    pub fn linear_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.linear
    }

    /// Check if a value is zero within linear tolerance
    pub fn is_zero(self, v: f64) -> bool {
        v.abs() < self.linear
    }

    /// Check if a length is accepted as a unit square diagonal (inclusive window)
    pub fn is_diagonal(self, length: f64) -> bool {
        length >= self.diagonal_min && length <= self.diagonal_max
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}
