//! 演化中的过零迁移与邻域重标号.
//!
//! 点的 layer 完全由 "到另一侧的 city-block 距离" 决定
//! (见 [`BandScheme::layer_at`](crate::consts::BandScheme::layer_at)),
//! 因此一次过零只需翻转该点的 side, 然后对受影响的小邻域重新套用距离规则:
//!
//! - 2-layer: 过零点在 `-1` 与 `+1` 之间迁移; 不再与界面相邻的带内点被剪除,
//!   新近贴上界面的远点被重新吸入 (far 区域按需再生, 不被存储).
//! - 4-layer: 过零点一次迁移一层; 被空出的最外 / 最内层位置要么由原来
//!   次一层的邻居补上, 要么跌落为 far.

use std::collections::HashSet;

use crate::{Idx, LayerId};

use super::SparseLevelSet;

impl<const D: usize> SparseLevelSet<D> {
    /// 零水平面越过带内点 `point`: 翻转其 side 并重标号邻域.
    ///
    /// 返回所有函数值发生变化的点, 以 `(点, 旧值, 新值)` 表示
    /// (含饱和值), 供驱动逐点调用统计更新.
    ///
    /// # 前置条件
    ///
    /// `point` 必须位于 `±1` 层 (只有紧贴界面的点才可能过零),
    /// 否则是逻辑错误, 程序 panic.
    pub fn flip(&mut self, point: Idx<D>) -> Vec<(Idx<D>, LayerId, LayerId)> {
        let id = self
            .layers
            .layer_of(&point)
            .unwrap_or_else(|| panic!("点 {point:?} 不在窄带中, 无法过零"));
        assert!(
            id == -1 || id == 1,
            "点 {point:?} 位于 layer {id}, 不与界面相邻",
        );

        // side 翻转只影响以该点为球心、半径为窄带宽度的邻域.
        let ball = self.ball(&point, self.scheme.depth());
        let old_values: Vec<LayerId> = ball.iter().map(|q| self.evaluate(q)).collect();

        self.layers.erase(point, id);
        if id < 0 {
            self.interior.remove(point);
        } else {
            self.interior.insert(point);
        }

        // 两阶段: 先在固定的 side 划分下算出全部目标 layer, 再统一套用.
        let planned: Vec<(Idx<D>, Option<LayerId>, Option<LayerId>)> = ball
            .iter()
            .map(|q| (*q, self.layers.layer_of(q), self.ideal_layer(q)))
            .collect();
        for (q, old, new) in planned {
            match (old, new) {
                (Some(a), Some(b)) if a != b => self.layers.move_to_layer(q, a, b),
                (Some(a), None) => self.layers.erase(q, a),
                (None, Some(b)) => self.layers.insert(q, b),
                _ => {}
            }
        }

        ball.into_iter()
            .zip(old_values)
            .filter_map(|(q, old)| {
                let new = self.evaluate(&q);
                (new != old).then_some((q, old, new))
            })
            .collect()
    }

    /// 以 `center` 为球心, city-block 半径 `radius` 的网格点集合
    /// (含球心, 越界点被过滤), 按索引升序返回.
    fn ball(&self, center: &Idx<D>, radius: usize) -> Vec<Idx<D>> {
        let mut seen: HashSet<Idx<D>> = HashSet::new();
        seen.insert(*center);
        let mut frontier = vec![*center];
        for _ in 0..radius {
            let mut next = Vec::with_capacity(frontier.len() * 2 * D);
            for p in frontier {
                for q in self.axis_neighbours(&p) {
                    if seen.insert(q) {
                        next.push(q);
                    }
                }
            }
            frontier = next;
        }
        let mut ans: Vec<_> = seen.into_iter().collect();
        ans.sort_unstable();
        ans
    }
}

#[cfg(test)]
mod tests {
    use ndarray::ArrayD;

    use super::super::SparseLevelSet;
    use crate::consts::BandScheme;

    /// 1×9 条带, 列 0..=3 为内部.
    fn strip(scheme: BandScheme) -> SparseLevelSet<2> {
        let mut m = ArrayD::<u8>::zeros(ndarray::IxDyn(&[1, 9]));
        for w in 0..4 {
            m[[0, w]] = 1;
        }
        SparseLevelSet::from_mask(m.view(), scheme)
    }

    /// 4-layer: 零水平面向外推进一格. 原 -1 边界点退为 -3,
    /// 原 +1 邻居升为 -1, 带整体右移.
    #[test]
    fn test_four_layer_outward_step() {
        let mut f = strip(BandScheme::FourLayer);
        assert_eq!(f.layers().layer_of(&[0, 2]), Some(-3));
        assert_eq!(f.layers().layer_of(&[0, 3]), Some(-1));
        assert_eq!(f.layers().layer_of(&[0, 4]), Some(1));
        assert_eq!(f.layers().layer_of(&[0, 5]), Some(3));
        assert_eq!(f.evaluate(&[0, 6]), 5);

        let changed = f.flip([0, 4]);

        assert_eq!(f.evaluate(&[0, 2]), -5); // 跌落为 far.
        assert_eq!(f.layers().layer_of(&[0, 3]), Some(-3));
        assert_eq!(f.layers().layer_of(&[0, 4]), Some(-1));
        assert_eq!(f.layers().layer_of(&[0, 5]), Some(1));
        assert_eq!(f.layers().layer_of(&[0, 6]), Some(3));
        assert!(!f.is_banded(&[0, 2]));

        // 过零点与整个重标号邻域都报告旧值 / 新值.
        assert!(changed.contains(&([0, 4], 1, -1)));
        assert!(changed.contains(&([0, 3], -1, -3)));
        assert!(changed.contains(&([0, 5], 3, 1)));
        assert!(changed.contains(&([0, 6], 5, 3)));
        assert!(changed.contains(&([0, 2], -3, -5)));
    }

    /// 2-layer: 过零点在 -1 / +1 间迁移, 不再贴界面的点被剪除,
    /// 新贴上界面的 far 点被吸入.
    #[test]
    fn test_two_layer_outward_step() {
        let mut f = strip(BandScheme::TwoLayer);
        assert_eq!(f.layers().layer_of(&[0, 3]), Some(-1));
        assert_eq!(f.layers().layer_of(&[0, 4]), Some(1));

        f.flip([0, 4]);

        assert!(!f.is_banded(&[0, 3])); // 剪除.
        assert_eq!(f.evaluate(&[0, 3]), -3);
        assert_eq!(f.layers().layer_of(&[0, 4]), Some(-1));
        assert_eq!(f.layers().layer_of(&[0, 5]), Some(1)); // far 点再生.
        assert_eq!(f.layers().band_len(), 2);
    }

    /// 2-layer 单种子收缩: 区域消失后窄带为空.
    #[test]
    fn test_two_layer_vanishing_seed() {
        let mut m = ArrayD::<u8>::zeros(ndarray::IxDyn(&[5, 5]));
        m[[2, 2]] = 1;
        let mut f = SparseLevelSet::<2>::from_mask(m.view(), BandScheme::TwoLayer);

        let changed = f.flip([2, 2]);
        assert!(f.layers().is_empty());
        assert_eq!(f.interior_len(), 0);
        assert_eq!(f.evaluate(&[2, 2]), 3);
        // 种子本身 + 4 个被剪除的 +1 邻居.
        assert_eq!(changed.len(), 5);
    }

    /// 过零后的字段与直接从新 mask 初始化的字段一致.
    #[test]
    fn test_flip_matches_reinit() {
        let mut f = strip(BandScheme::FourLayer);
        f.flip([0, 4]);

        let mut m = ArrayD::<u8>::zeros(ndarray::IxDyn(&[1, 9]));
        for w in 0..5 {
            m[[0, w]] = 1;
        }
        let g = SparseLevelSet::<2>::from_mask(m.view(), BandScheme::FourLayer);
        for w in 0..9 {
            assert_eq!(f.evaluate(&[0, w]), g.evaluate(&[0, w]), "w = {w}");
        }
    }

    /// 非 ±1 层的点不允许过零.
    #[test]
    #[should_panic]
    fn test_flip_deep_layer_rejected() {
        let mut f = strip(BandScheme::FourLayer);
        f.flip([0, 5]); // +3 层.
    }

    /// 窄带外的点不允许过零.
    #[test]
    #[should_panic]
    fn test_flip_far_rejected() {
        let mut f = strip(BandScheme::TwoLayer);
        f.flip([0, 7]);
    }
}
