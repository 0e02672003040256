//! 正则化 Heaviside / Dirac 函数策略.
//!
//! 区域竞争项不绑定具体的正则化形状: 任何光滑单调的单位阶跃近似
//! 都可以作为策略注入, 平滑宽度 `epsilon` 可配置.

use std::f64::consts::PI;

/// 正则化 Heaviside 函数策略.
///
/// 约定: `value` 单调不减, 值域为 `[0, 1]`, `value(0) = 0.5`;
/// `dirac` 为其导数 (正则化 Dirac).
pub trait RegularizedHeaviside {
    /// 阶跃近似值.
    fn value(&self, x: f64) -> f64;

    /// 导数 (正则化 Dirac).
    fn dirac(&self, x: f64) -> f64;
}

/// 基于反正切的正则化 Heaviside: `H(x) = 1/2 + atan(x / ε) / π`.
///
/// 处处光滑, 支撑无界.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtanHeaviside {
    epsilon: f64,
}

impl AtanHeaviside {
    /// 构建策略. `epsilon` 必须在合理范围内, 否则返回 `None`.
    pub fn new(epsilon: f64) -> Option<Self> {
        if epsilon.is_finite() && 0.0 < epsilon && epsilon <= 1e5 {
            Some(Self { epsilon })
        } else {
            None
        }
    }

    /// 平滑宽度.
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl RegularizedHeaviside for AtanHeaviside {
    #[inline]
    fn value(&self, x: f64) -> f64 {
        0.5 + (x / self.epsilon).atan() / PI
    }

    #[inline]
    fn dirac(&self, x: f64) -> f64 {
        self.epsilon / (PI * (self.epsilon * self.epsilon + x * x))
    }
}

/// 基于正弦的正则化 Heaviside, 支撑为 `[-ε, ε]`:
///
/// `H(x) = 1/2 · (1 + x/ε + sin(πx/ε) / π)`, 并在支撑外饱和到 0 / 1.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinHeaviside {
    epsilon: f64,
}

impl SinHeaviside {
    /// 构建策略. `epsilon` 必须在合理范围内, 否则返回 `None`.
    pub fn new(epsilon: f64) -> Option<Self> {
        if epsilon.is_finite() && 0.0 < epsilon && epsilon <= 1e5 {
            Some(Self { epsilon })
        } else {
            None
        }
    }

    /// 平滑宽度.
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl RegularizedHeaviside for SinHeaviside {
    fn value(&self, x: f64) -> f64 {
        if x >= self.epsilon {
            1.0
        } else if x <= -self.epsilon {
            0.0
        } else {
            let t = x / self.epsilon;
            0.5 * (1.0 + t + (PI * t).sin() / PI)
        }
    }

    fn dirac(&self, x: f64) -> f64 {
        if x.abs() >= self.epsilon {
            0.0
        } else {
            (1.0 + (PI * x / self.epsilon).cos()) / (2.0 * self.epsilon)
        }
    }
}
