//! 斑块密度.

use crate::consts::{DENSITY_EPSILON, MIN_RELIABLE_VOLUME};

/// 密度计算的保护条件.
#[derive(Copy, Clone, Debug)]
pub struct DensityGuard {
    /// 分母上的极小量, 避免空脑区除零.
    pub epsilon: f64,

    /// 有效体积小于该值时密度无定义.
    pub min_reliable_volume: u64,
}

impl Default for DensityGuard {
    fn default() -> Self {
        Self {
            epsilon: DENSITY_EPSILON,
            min_reliable_volume: MIN_RELIABLE_VOLUME,
        }
    }
}

impl DensityGuard {
    /// 斑块密度 (百分比): `100 * plaque_volume / (volume_in + epsilon)`.
    ///
    /// 当 `volume_in < min_reliable_volume` 时返回 NaN, 与合法的 `0.0` 区分.
    pub fn density(&self, plaque_volume: u64, volume_in: u64) -> f64 {
        if volume_in < self.min_reliable_volume {
            return f64::NAN;
        }
        100.0 * plaque_volume as f64 / (volume_in as f64 + self.epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::DensityGuard;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    #[test]
    fn test_plain_density() {
        let g = DensityGuard::default();
        assert!(f64_eq(g.density(50, 1000), 5.0));
        assert!(f64_eq(g.density(0, 1000), 0.0));
        assert!(!g.density(0, 1000).is_nan());
        assert!(f64_eq(g.density(5, 5), 100.0));
    }

    #[test]
    fn test_unreliable_volume_is_nan() {
        let g = DensityGuard::default();
        for v in 0..5 {
            assert!(g.density(0, v).is_nan());
            assert!(g.density(v, v).is_nan());
        }
        let strict = DensityGuard {
            min_reliable_volume: 0,
            ..g
        };
        assert!(f64_eq(strict.density(0, 0), 0.0));
    }
}
