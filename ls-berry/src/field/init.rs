//! 从种子 mask 初始化窄带层.

use itertools::Itertools;
use log::debug;
use ndarray::ArrayViewD;

use crate::consts::BandScheme;
use crate::{Idx, LayerId};

use super::SparseLevelSet;

impl<const D: usize> SparseLevelSet<D> {
    /// 从二值种子 mask 初始化字段. 非零体素视为内部.
    ///
    /// 层的划分规则: 点的 layer 由它到另一侧的 city-block 距离决定,
    /// 距离 1 得 `∓1`, 距离 2 得 `∓3` (仅 4-layer), 更远的点不入带.
    /// 这等价于从过零面向两侧做逐层扩张. 输入区域太小时,
    /// 某些层可以合法地为空.
    ///
    /// `mask` 的维数必须等于 `D`, 否则程序 panic.
    pub fn from_mask(mask: ArrayViewD<'_, u8>, scheme: BandScheme) -> Self {
        assert_eq!(mask.ndim(), D, "mask 维数与字段维数不一致");
        let mut shape = [0usize; D];
        shape.copy_from_slice(mask.shape());

        let mut field = Self::empty(shape, scheme);

        // 先登记全部内部点, 这一步同时建立窄带外的 side 查询能力.
        for point in grid_points(&shape) {
            if mask[&point[..]] != 0 {
                field.interior.insert(point);
            }
        }

        // 再按距离规则入带.
        for point in grid_points(&shape) {
            if let Some(id) = field.ideal_layer(&point) {
                field.layers.insert(point, id);
            }
        }

        if log::log_enabled!(log::Level::Debug) {
            let sizes = scheme
                .alphabet()
                .iter()
                .map(|&id| (id, field.layers.layer_len(id)))
                .collect::<Vec<_>>();
            debug!(
                "窄带初始化完成: 内部 {} 点, 层规模 {:?}",
                field.interior.len(),
                sizes,
            );
        }
        field
    }

    /// 内侧 layer id 列表. 与内部饱和值一起构成 "函数为负" 的词汇表.
    #[inline]
    pub fn inside_layer_ids(&self) -> &'static [LayerId] {
        self.scheme.inside_layer_ids()
    }

    /// `point` 在当前 side 划分下应当持有的 layer.
    ///
    /// 返回 `None` 表示该点不应入带.
    pub(super) fn ideal_layer(&self, point: &Idx<D>) -> Option<LayerId> {
        let side = self.side_of(point);
        let dist = self.band_distance(point, self.scheme.depth())?;
        self.scheme.layer_at(side, dist)
    }
}

/// 按行优先序迭代形状为 `shape` 的全部网格点.
pub(crate) fn grid_points<const D: usize>(shape: &Idx<D>) -> impl Iterator<Item = Idx<D>> {
    shape
        .iter()
        .map(|&n| 0..n)
        .multi_cartesian_product()
        .map(|v| {
            // D 个 range 的积恰好产出长度为 D 的向量.
            v.try_into().unwrap()
        })
}
