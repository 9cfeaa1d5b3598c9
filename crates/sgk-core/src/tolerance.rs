/// Tolerances shared by the curve kernel and the spline graph.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Linear tolerance for distance comparisons (in model units)
    pub linear: f64,
    /// Tolerance for comparing curve parameters
    pub param: f64,
}

impl Tolerance {
    /// Threshold below which weights, lengths and denominators count as zero.
    pub const SMALL_NUMBER: f64 = 1e-8;
    pub const KINDA_SMALL_NUMBER: f64 = 1e-4;

    pub const DEFAULT_LINEAR: f64 = 1e-6;
    pub const DEFAULT_PARAM: f64 = 1e-8;

    pub fn new(linear: f64, param: f64) -> Self {
        Self { linear, param }
    }

    pub fn default_precision() -> Self {
        Self {
            linear: Self::DEFAULT_LINEAR,
            param: Self::DEFAULT_PARAM,
        }
    }

    pub fn loose() -> Self {
        Self {
            linear: 1e-3,
            param: 1e-5,
        }
    }

    pub fn tight() -> Self {
        Self {
            linear: 1e-10,
            param: 1e-12,
        }
    }

    /// Squared linear tolerance, for comparing squared distances.
    pub fn linear_sqr(self) -> f64 {
        self.linear * self.linear
    }

    /// Check if two values are equal within linear tolerance
    pub fn linear_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.linear
    }

    /// Check if a value is zero within linear tolerance
    pub fn is_zero(self, v: f64) -> bool {
        v.abs() < self.linear
    }

    /// Check if two parameters coincide
    pub fn param_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.param
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}

/// `true` when `v` is within [`Tolerance::SMALL_NUMBER`] of zero.
pub fn is_nearly_zero(v: f64) -> bool {
    v.abs() < Tolerance::SMALL_NUMBER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_ordered() {
        assert!(Tolerance::tight().linear < Tolerance::default().linear);
        assert!(Tolerance::default().linear < Tolerance::loose().linear);
    }

    #[test]
    fn test_nearly_zero() {
        assert!(is_nearly_zero(1e-10));
        assert!(!is_nearly_zero(1e-3));
        assert!(Tolerance::default().param_eq(1.0, 1.0 + 1e-10));
    }
}
