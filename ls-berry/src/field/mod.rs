//! 稀疏窄带水平集字段.
//!
//! 字段只存储窄带成员关系与内部区域的 run-length 压缩,
//! 不按点存储浮点函数值: 窄带内的值就等于 layer id,
//! 窄带外的值被钳制到对应一侧的饱和常量. 这正是表示 "稀疏" 的来源,
//! 内存为 O(窄带大小) 而非 O(网格大小).

use crate::band::LayerStore;
use crate::consts::{BandScheme, Side};
use crate::{Idx, InstanceId, LayerId};

use std::collections::{HashMap, HashSet};

mod eval;
mod init;
mod runs;
mod transit;

pub use eval::PointData;

pub(crate) use init::grid_points;

use runs::InteriorRuns;

/// 获取形状为 `shape` 的网格上 `point` 沿各轴 ±1 的全部邻居,
/// 越界的被过滤掉.
pub(crate) fn axis_neighbours_in<const D: usize>(shape: &Idx<D>, point: &Idx<D>) -> Vec<Idx<D>> {
    let mut ans = Vec::with_capacity(2 * D);
    for axis in 0..D {
        if point[axis] > 0 {
            let mut q = *point;
            q[axis] -= 1;
            ans.push(q);
        }
        if point[axis] + 1 < shape[axis] {
            let mut q = *point;
            q[axis] += 1;
            ans.push(q);
        }
    }
    ans
}

/// 稀疏窄带水平集字段.
///
/// 两种具体表示 (2-layer / 4-layer) 由 [`BandScheme`] 策略区分,
/// 求值与迁移逻辑完全共享.
#[derive(Clone, Debug)]
pub struct SparseLevelSet<const D: usize> {
    shape: Idx<D>,
    scheme: BandScheme,
    layers: LayerStore<D>,
    interior: InteriorRuns<D>,
}

impl<const D: usize> SparseLevelSet<D> {
    /// 创建一个全空字段: 窄带为空, 所有点都在外部.
    ///
    /// `shape` 的每一维都必须非零, 否则程序 panic.
    pub fn empty(shape: Idx<D>, scheme: BandScheme) -> Self {
        assert!(shape.iter().all(|&n| n > 0), "网格形状 {shape:?} 非法");
        Self {
            shape,
            scheme,
            layers: LayerStore::new(scheme.alphabet()),
            interior: InteriorRuns::new(),
        }
    }

    /// 网格形状.
    #[inline]
    pub fn shape(&self) -> Idx<D> {
        self.shape
    }

    /// 表示策略.
    #[inline]
    pub fn scheme(&self) -> BandScheme {
        self.scheme
    }

    /// 窄带分层存储的只读视图.
    ///
    /// 修改必须通过 [`Self::flip`] 进行, 以保持层成员关系与内部区域一致.
    #[inline]
    pub fn layers(&self) -> &LayerStore<D> {
        &self.layers
    }

    /// 检查索引是否在网格范围内.
    #[inline]
    pub fn check(&self, point: &Idx<D>) -> bool {
        point.iter().zip(self.shape.iter()).all(|(p, n)| p < n)
    }

    /// `point` 是否在窄带中? 越界索引返回 `false`.
    #[inline]
    pub fn is_banded(&self, point: &Idx<D>) -> bool {
        self.layers.is_banded(point)
    }

    /// 返回水平集函数在 `point` 处的值.
    ///
    /// 窄带内等于 layer id; 窄带外等于对应一侧的饱和常量,
    /// 对任何合法索引都有定义 (即使该点从未与窄带相邻).
    /// 越界索引是前置条件违例, 程序 panic.
    #[inline]
    pub fn evaluate(&self, point: &Idx<D>) -> LayerId {
        assert!(self.check(point), "索引 {point:?} 越界");
        match self.layers.layer_of(point) {
            Some(id) => id,
            None if self.interior.contains(point) => self.scheme.inside_sentinel(),
            None => self.scheme.outside_sentinel(),
        }
    }

    /// `point` 位于哪一侧.
    ///
    /// 窄带内由 layer id 符号决定, 窄带外由内部区域存储决定.
    #[inline]
    pub fn side_of(&self, point: &Idx<D>) -> Side {
        debug_assert!(self.check(point));
        match self.layers.layer_of(point) {
            Some(id) => Side::of_layer(id),
            None if self.interior.contains(point) => Side::Inside,
            None => Side::Outside,
        }
    }

    /// 内部区域 (水平集函数为负) 的点总数.
    #[inline]
    pub fn interior_len(&self) -> usize {
        self.interior.len()
    }

    /// 获取 `point` 沿各轴 ±1 的全部邻居, 越界的被过滤掉.
    #[inline]
    pub(crate) fn axis_neighbours(&self, point: &Idx<D>) -> Vec<Idx<D>> {
        axis_neighbours_in(&self.shape, point)
    }

    /// 沿 `axis` 偏移 `delta` 格, 超出网格时钳制 (replicate) 到边界.
    #[inline]
    pub(crate) fn clamped_offset(&self, point: &Idx<D>, axis: usize, delta: isize) -> Idx<D> {
        let mut q = *point;
        let moved = point[axis] as isize + delta;
        q[axis] = moved.clamp(0, self.shape[axis] as isize - 1) as usize;
        q
    }

    /// `point` 到另一侧的 city-block 距离, 最多探测 `max` 格.
    ///
    /// 返回 `None` 表示距离超过 `max`.
    pub(crate) fn band_distance(&self, point: &Idx<D>, max: usize) -> Option<usize> {
        let my_side = self.side_of(point);
        // 距离很小 (窄带宽度 + 1), 直接做受限 BFS.
        let mut frontier = vec![*point];
        let mut seen: HashSet<Idx<D>> = HashSet::new();
        seen.insert(*point);
        for dist in 1..=max {
            let mut next = Vec::with_capacity(frontier.len() * 2 * D);
            for p in frontier {
                for q in self.axis_neighbours(&p) {
                    if !seen.insert(q) {
                        continue;
                    }
                    if self.side_of(&q) != my_side {
                        return Some(dist);
                    }
                    next.push(q);
                }
            }
            frontier = next;
        }
        None
    }
}

/// 参与竞争的水平集字段集合.
///
/// 分区缓存与区域竞争项都以它为输入. 所有字段必须共享同一网格形状.
#[derive(Clone, Debug, Default)]
pub struct FieldSet<const D: usize> {
    fields: Vec<(InstanceId, SparseLevelSet<D>)>,
    index: HashMap<InstanceId, usize>,
}

impl<const D: usize> FieldSet<D> {
    /// 创建空集合.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一个字段. `id` 重复或形状与已有字段不一致时程序 panic.
    pub fn insert(&mut self, id: InstanceId, field: SparseLevelSet<D>) {
        assert!(!self.index.contains_key(&id), "实例 {id} 重复");
        if let Some((_, first)) = self.fields.first() {
            assert_eq!(first.shape(), field.shape(), "字段网格形状不一致");
        }
        self.index.insert(id, self.fields.len());
        self.fields.push((id, field));
    }

    /// 按实例 id 获取字段. `id` 不存在时程序 panic.
    #[inline]
    pub fn get(&self, id: InstanceId) -> &SparseLevelSet<D> {
        let i = self
            .index
            .get(&id)
            .unwrap_or_else(|| panic!("实例 {id} 不存在"));
        &self.fields[*i].1
    }

    /// 按实例 id 获取可变字段. `id` 不存在时程序 panic.
    #[inline]
    pub fn get_mut(&mut self, id: InstanceId) -> &mut SparseLevelSet<D> {
        let i = *self
            .index
            .get(&id)
            .unwrap_or_else(|| panic!("实例 {id} 不存在"));
        &mut self.fields[i].1
    }

    /// 按加入顺序迭代 `(id, field)`.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &SparseLevelSet<D>)> {
        self.fields.iter().map(|(id, f)| (*id, f))
    }

    /// 实例个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 公共网格形状. 集合为空时返回 `None`.
    #[inline]
    pub fn shape(&self) -> Option<Idx<D>> {
        self.fields.first().map(|(_, f)| f.shape())
    }
}
