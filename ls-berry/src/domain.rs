//! 域标签分区缓存.
//!
//! 把网格划分成极大连通区域, 每个区域记录窄带与之相交的实例 id 列表.
//! 区域竞争项据此避免对每个像素扫描全部实例.
//!
//! 缓存不会自我失效: 窄带拓扑变化后由演化驱动显式重建
//! (通常每个 sweep 一次), 以有界的陈旧性换取热路径零开销.

use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use ndarray::ArrayD;
use once_cell::sync::OnceCell;

use crate::field::{axis_neighbours_in, grid_points, FieldSet};
use crate::{Idx, InstanceId};

/// 尚未分配区域 id 的网格点标记 (仅在构建过程中出现).
const UNASSIGNED: u32 = u32::MAX;

/// 域标签分区缓存.
///
/// 不变量: 每个网格点恰好属于一个区域; 区域的实例列表恰好是
/// 在该区域内有窄带状态的实例集合 (升序).
#[derive(Debug)]
pub struct DomainPartition<const D: usize> {
    shape: Idx<D>,

    /// 与网格平行的区域 id 图, 提供 O(1) 的 `region_of`.
    region_grid: ArrayD<u32>,

    /// 区域 id -> 实例 id 列表 (升序).
    lists: Vec<Vec<InstanceId>>,

    /// 懒构建的区域点列表, 统计重算时使用.
    region_points: OnceCell<Vec<Vec<Idx<D>>>>,
}

impl<const D: usize> DomainPartition<D> {
    /// 从当前字段集合构建分区.
    ///
    /// 点的签名为在该点有窄带状态的实例 id 升序列表;
    /// 区域为签名相同的极大 (2·D 邻接) 连通分量.
    /// `fields` 为空时程序 panic.
    pub fn build(fields: &FieldSet<D>) -> Self {
        let shape = fields.shape().expect("字段集合为空, 无法分区");

        // 先把每个点的签名 intern 成小整数, 连通分量只比较整数.
        let mut sig_ids: HashMap<Vec<InstanceId>, u32> = HashMap::new();
        let mut sig_lists: Vec<Vec<InstanceId>> = Vec::new();
        let mut sig_grid = ArrayD::<u32>::zeros(ndarray::IxDyn(&shape));
        for point in grid_points(&shape) {
            let sig: Vec<InstanceId> = fields
                .iter()
                .filter(|(_, f)| f.is_banded(&point))
                .map(|(id, _)| id)
                .sorted()
                .collect();
            let next = sig_lists.len() as u32;
            let sid = *sig_ids.entry(sig).or_insert_with_key(|key| {
                sig_lists.push(key.clone());
                next
            });
            sig_grid[&point[..]] = sid;
        }

        // 等签名连通分量.
        let mut region_grid = ArrayD::<u32>::from_elem(ndarray::IxDyn(&shape), UNASSIGNED);
        let mut lists: Vec<Vec<InstanceId>> = Vec::new();
        for point in grid_points(&shape) {
            if region_grid[&point[..]] != UNASSIGNED {
                continue;
            }
            let region = lists.len() as u32;
            let sid = sig_grid[&point[..]];
            lists.push(sig_lists[sid as usize].clone());

            let mut stack = vec![point];
            region_grid[&point[..]] = region;
            while let Some(p) = stack.pop() {
                for q in axis_neighbours_in(&shape, &p) {
                    if region_grid[&q[..]] == UNASSIGNED && sig_grid[&q[..]] == sid {
                        region_grid[&q[..]] = region;
                        stack.push(q);
                    }
                }
            }
        }

        debug!(
            "分区重建完成: {} 个区域, {} 种签名",
            lists.len(),
            sig_lists.len(),
        );
        Self {
            shape,
            region_grid,
            lists,
            region_points: OnceCell::new(),
        }
    }

    /// 原地重建 (等价于用 [`Self::build`] 的结果整体替换).
    #[inline]
    pub fn rebuild(&mut self, fields: &FieldSet<D>) {
        *self = Self::build(fields);
    }

    /// `point` 所属的区域 id. O(1).
    ///
    /// 越界索引是前置条件违例, 程序 panic.
    #[inline]
    pub fn region_of(&self, point: &Idx<D>) -> u32 {
        self.region_grid[&point[..]]
    }

    /// 在 `point` 所属区域内活跃 (窄带相交) 的实例 id 列表, 升序.
    #[inline]
    pub fn active_instances(&self, point: &Idx<D>) -> &[InstanceId] {
        &self.lists[self.region_of(point) as usize]
    }

    /// 区域个数.
    #[inline]
    pub fn region_count(&self) -> usize {
        self.lists.len()
    }

    /// 网格形状.
    #[inline]
    pub fn shape(&self) -> Idx<D> {
        self.shape
    }

    /// 区域 `region` 的全部网格点, 按行优先序.
    ///
    /// 点列表在首次调用时一次性物化, 之后 O(1) 返回.
    /// `region` 越界时程序 panic.
    pub fn points_in_region(&self, region: u32) -> &[Idx<D>] {
        assert!((region as usize) < self.lists.len(), "区域 {region} 不存在");
        let all = self.region_points.get_or_init(|| {
            let mut ans = vec![Vec::new(); self.lists.len()];
            for point in grid_points(&self.shape) {
                ans[self.region_grid[&point[..]] as usize].push(point);
            }
            ans
        });
        &all[region as usize]
    }
}
