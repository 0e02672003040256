//! 通用常量与表示策略.

use crate::LayerId;

/// 窄带 layer 字母表常量.
pub mod layer {
    use crate::LayerId;

    /// 4-layer 表示的最内层.
    pub const MINUS_THREE: LayerId = -3;

    /// 内侧第一层 (两种表示共用).
    pub const MINUS_ONE: LayerId = -1;

    /// 外侧第一层 (两种表示共用).
    pub const PLUS_ONE: LayerId = 1;

    /// 4-layer 表示的最外层.
    pub const PLUS_THREE: LayerId = 3;

    /// layer id 是否位于内侧?
    #[inline]
    pub const fn is_inner(id: LayerId) -> bool {
        id < 0
    }

    /// layer id 是否位于外侧?
    #[inline]
    pub const fn is_outer(id: LayerId) -> bool {
        id > 0
    }
}

/// 网格点相对零水平面的位置.
///
/// 窄带内的点由 layer id 符号决定; 窄带外的点由内部区域存储决定.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// 水平集函数为负, 即被分割区域内部.
    Inside,

    /// 水平集函数为正, 即被分割区域外部.
    Outside,
}

impl Side {
    /// 是否在内部.
    #[inline]
    pub fn is_inside(&self) -> bool {
        matches!(self, Self::Inside)
    }

    /// 是否在外部.
    #[inline]
    pub fn is_outside(&self) -> bool {
        !self.is_inside()
    }

    /// 相反的一侧.
    #[inline]
    pub fn opposite(&self) -> Side {
        match self {
            Self::Inside => Self::Outside,
            Self::Outside => Self::Inside,
        }
    }

    /// 由 layer id 确定所在侧. `id` 必须非零.
    #[inline]
    pub fn of_layer(id: LayerId) -> Side {
        debug_assert_ne!(id, 0);
        if id < 0 {
            Self::Inside
        } else {
            Self::Outside
        }
    }
}

/// 稀疏窄带表示策略.
///
/// 两种具体表示只在 layer 字母表与饱和 (saturation) 常量上不同,
/// 其余求值逻辑完全共享. 我们用 tagged variant 统一它们,
/// 不引入继承式的类型层次.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BandScheme {
    /// 字母表 `{-1, +1}`, 每侧一格宽的窄带.
    TwoLayer,

    /// 字母表 `{-3, -1, +1, +3}`, 每侧两格宽, 支持更高阶 stencil.
    FourLayer,
}

impl BandScheme {
    /// 该表示的 layer 字母表, 按升序排列.
    #[inline]
    pub const fn alphabet(&self) -> &'static [LayerId] {
        match self {
            Self::TwoLayer => &[layer::MINUS_ONE, layer::PLUS_ONE],
            Self::FourLayer => &[
                layer::MINUS_THREE,
                layer::MINUS_ONE,
                layer::PLUS_ONE,
                layer::PLUS_THREE,
            ],
        }
    }

    /// `id` 是否属于该表示的字母表?
    #[inline]
    pub fn contains(&self, id: LayerId) -> bool {
        self.alphabet().contains(&id)
    }

    /// 每侧的窄带宽度 (以 city-block 距离计).
    #[inline]
    pub const fn depth(&self) -> usize {
        match self {
            Self::TwoLayer => 1,
            Self::FourLayer => 2,
        }
    }

    /// 远离窄带的内部点的饱和值. 比最内层更负, 不会按点存储.
    #[inline]
    pub const fn inside_sentinel(&self) -> LayerId {
        match self {
            Self::TwoLayer => -3,
            Self::FourLayer => -5,
        }
    }

    /// 远离窄带的外部点的饱和值. 比最外层更正, 不会按点存储.
    #[inline]
    pub const fn outside_sentinel(&self) -> LayerId {
        match self {
            Self::TwoLayer => 3,
            Self::FourLayer => 5,
        }
    }

    /// 给定一侧、到另一侧的 city-block 距离, 返回应当存储的 layer id.
    ///
    /// 距离超出窄带宽度时返回 `None` (该点不入带, 值由饱和常量推断).
    /// `dist` 为 0 没有意义, 此时程序 panic.
    pub fn layer_at(&self, side: Side, dist: usize) -> Option<LayerId> {
        assert_ne!(dist, 0, "距离 0 意味着点同时位于两侧");
        if dist > self.depth() {
            return None;
        }
        // 距离 1 -> ±1, 距离 2 -> ±3.
        let magnitude = (2 * dist - 1) as LayerId;
        Some(match side {
            Side::Inside => -magnitude,
            Side::Outside => magnitude,
        })
    }

    /// 内侧 layer id 列表 (原始实现中 "internal label list" 的对应物).
    ///
    /// 这些 id 与内部饱和值一起构成 "水平集函数为负" 的词汇表.
    #[inline]
    pub fn inside_layer_ids(&self) -> &'static [LayerId] {
        match self {
            Self::TwoLayer => &[layer::MINUS_ONE],
            Self::FourLayer => &[layer::MINUS_THREE, layer::MINUS_ONE],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 字母表与饱和常量的基本一致性.
    #[test]
    fn test_scheme_alphabet() {
        for scheme in [BandScheme::TwoLayer, BandScheme::FourLayer] {
            let alpha = scheme.alphabet();
            assert_eq!(alpha.len(), 2 * scheme.depth());
            assert!(alpha.windows(2).all(|w| w[0] < w[1]));
            assert!(scheme.inside_sentinel() < *alpha.first().unwrap());
            assert!(scheme.outside_sentinel() > *alpha.last().unwrap());
            for &id in alpha {
                assert!(scheme.contains(id));
                assert_ne!(id, 0);
            }
            assert!(!scheme.contains(0));
            assert!(!scheme.contains(scheme.inside_sentinel()));
        }
    }

    /// 距离到 layer id 的映射.
    #[test]
    fn test_layer_at() {
        let two = BandScheme::TwoLayer;
        assert_eq!(two.layer_at(Side::Inside, 1), Some(-1));
        assert_eq!(two.layer_at(Side::Outside, 1), Some(1));
        assert_eq!(two.layer_at(Side::Inside, 2), None);

        let four = BandScheme::FourLayer;
        assert_eq!(four.layer_at(Side::Inside, 1), Some(-1));
        assert_eq!(four.layer_at(Side::Inside, 2), Some(-3));
        assert_eq!(four.layer_at(Side::Outside, 2), Some(3));
        assert_eq!(four.layer_at(Side::Outside, 3), None);
    }

    /// 零距离是前置条件违例.
    #[test]
    #[should_panic]
    fn test_layer_at_zero_dist() {
        let _ = BandScheme::TwoLayer.layer_at(Side::Inside, 0);
    }

    /// 内侧 id 列表与字母表一致.
    #[test]
    fn test_inside_ids() {
        for scheme in [BandScheme::TwoLayer, BandScheme::FourLayer] {
            for &id in scheme.inside_layer_ids() {
                assert!(layer::is_inner(id));
                assert!(scheme.contains(id));
                assert!(Side::of_layer(id).is_inside());
            }
        }
        assert!(Side::of_layer(1).is_outside());
        assert_eq!(Side::Inside.opposite(), Side::Outside);
    }
}
