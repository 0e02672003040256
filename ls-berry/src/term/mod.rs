//! 多相区域竞争能量项 (Chan-Vese 风格).
//!
//! 对每个活跃点, 项需要计算所有 *其它* 竞争实例的正则化 Heaviside
//! 排他性乘积, 并维护本实例内 / 外两侧的运行强度统计.
//! 字段集合、分区缓存与强度源都作为显式参数注入,
//! 不经过任何运行时工厂.

use either::Either;
use ndarray::ArrayD;
use num::ToPrimitive;

use crate::domain::DomainPartition;
use crate::field::{grid_points, FieldSet, SparseLevelSet};
use crate::{Idx, InstanceId};

mod heaviside;

pub use heaviside::{AtanHeaviside, RegularizedHeaviside, SinHeaviside};

/// 像素强度源. 演化所用的观测图像由外部提供, 这里只约定查询接口.
pub trait IntensitySource {
    /// 返回 `point` 处的像素强度. 越界索引是前置条件违例.
    fn intensity(&self, point: &[usize]) -> f64;
}

impl<T: ToPrimitive> IntensitySource for ArrayD<T> {
    #[inline]
    fn intensity(&self, point: &[usize]) -> f64 {
        // 强度必须可表示为 f64, 否则是数据错误, 可直接 unwrap.
        self[point].to_f64().unwrap()
    }
}

/// 单侧区域强度统计: 运行 `(sum, count)` 对.
///
/// 均值在读取时才做除法, 避免反复增量除法带来的漂移积累.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionStats {
    sum: f64,
    count: u64,
}

impl RegionStats {
    /// 空统计.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 计入一个像素.
    #[inline]
    pub fn add(&mut self, intensity: f64) {
        self.sum += intensity;
        self.count += 1;
    }

    /// 移除一个像素. 统计为空时是逻辑错误, 程序 panic.
    #[inline]
    pub fn remove(&mut self, intensity: f64) {
        assert!(self.count > 0, "区域统计为空, 无法移除像素");
        self.sum -= intensity;
        self.count -= 1;
    }

    /// 区域均值. 区域没有任何像素时按约定返回中性哨兵值 `0.0`,
    /// 不产生除法错误.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// 像素个数.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 强度和.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }
}

/// 实例 `k` 的多相区域竞争项.
///
/// Heaviside 的输入约定为 `-φ`: 水平集函数为负 (内部) 时 `H ≈ 1`,
/// 因此 `1 - H` 是 "该点未被实例 `i` 占据" 的程度,
/// 所有其它实例的乘积即排他性因子.
#[derive(Clone, Debug)]
pub struct RegionCompetitionTerm<H> {
    id: InstanceId,
    heaviside: H,
    coefficient: f64,
    inside: RegionStats,
    outside: RegionStats,
}

impl<H: RegularizedHeaviside> RegionCompetitionTerm<H> {
    /// 为实例 `id` 创建项, 能量系数为 1.
    pub fn new(id: InstanceId, heaviside: H) -> Self {
        Self {
            id,
            heaviside,
            coefficient: 1.0,
            inside: RegionStats::new(),
            outside: RegionStats::new(),
        }
    }

    /// 设置能量系数.
    #[inline]
    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    /// 所属实例 id.
    #[inline]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// 内侧运行统计.
    #[inline]
    pub fn inside_stats(&self) -> RegionStats {
        self.inside
    }

    /// 外侧运行统计.
    #[inline]
    pub fn outside_stats(&self) -> RegionStats {
        self.outside
    }

    /// 在 `point` 处活跃的实例 id. 有分区缓存时 O(1) 查表,
    /// 否则退化为扫描全部实例.
    fn active_ids<'a, const D: usize>(
        fields: &'a FieldSet<D>,
        partition: Option<&'a DomainPartition<D>>,
        point: Idx<D>,
    ) -> impl Iterator<Item = InstanceId> + 'a {
        match partition {
            Some(part) => Either::Left(part.active_instances(&point).iter().copied()),
            None => Either::Right(fields.iter().map(|(id, _)| id)),
        }
    }

    /// 排他性乘积的唯一算法: 对活跃且不在 `excluded` 中的每个实例 `i`,
    /// 累乘 `1 - H(-φ_i(point))`. 每个因子都在 `[0, 1]` 内,
    /// 因此活跃实例越多乘积只会缩小或不变.
    pub fn exclusivity<const D: usize>(
        &self,
        point: Idx<D>,
        fields: &FieldSet<D>,
        partition: Option<&DomainPartition<D>>,
        excluded: &[InstanceId],
    ) -> f64 {
        let mut prod = 1.0;
        for id in Self::active_ids(fields, partition, point) {
            if excluded.contains(&id) {
                continue;
            }
            let phi = fields.get(id).evaluate(&point) as f64;
            prod *= 1.0 - self.heaviside.value(-phi);
        }
        prod
    }

    /// 排除本实例后的排他性乘积.
    #[inline]
    pub fn compute_product<const D: usize>(
        &self,
        point: Idx<D>,
        fields: &FieldSet<D>,
        partition: Option<&DomainPartition<D>>,
    ) -> f64 {
        self.exclusivity(point, fields, partition, &[self.id])
    }

    /// 能量导数处使用的排他性乘积.
    ///
    /// 与 [`Self::compute_product`] 是同一个算法
    /// (均排除本实例, 见 [`Self::exclusivity`]);
    /// 单独命名只是为了与逐点能量 / 逐点导数两类调用点对应.
    #[inline]
    pub fn compute_product_term<const D: usize>(
        &self,
        point: Idx<D>,
        fields: &FieldSet<D>,
        partition: Option<&DomainPartition<D>>,
    ) -> f64 {
        self.exclusivity(point, fields, partition, &[self.id])
    }

    /// 像素 `point` 的层成员关系刚刚变化: 以 O(1) 转移其统计贡献.
    ///
    /// `old_value` / `new_value` 为变化前后的函数值 (含饱和值),
    /// 符号决定内外侧. 统计一致性由调用方保证:
    /// 驱动遗漏调用不会被自动纠正 (热路径零分配).
    pub fn update_pixel(&mut self, intensity: f64, old_value: f64, new_value: f64) {
        let was_inside = old_value < 0.0;
        let is_inside = new_value < 0.0;
        if was_inside == is_inside {
            return;
        }
        if was_inside {
            self.inside.remove(intensity);
            self.outside.add(intensity);
        } else {
            self.outside.remove(intensity);
            self.inside.add(intensity);
        }
    }

    /// 在 sweep 开始时对全网格做一次 O(网格) 的统计重算.
    ///
    /// 之后的增量更新 ([`Self::update_pixel`]) 必须与再次全量重算
    /// 在浮点容差内一致 (见测试).
    pub fn reset_statistics<const D: usize>(
        &mut self,
        field: &SparseLevelSet<D>,
        intensity: &dyn IntensitySource,
    ) {
        self.inside = RegionStats::new();
        self.outside = RegionStats::new();
        for point in grid_points(&field.shape()) {
            let v = intensity.intensity(&point);
            if field.side_of(&point).is_inside() {
                self.inside.add(v);
            } else {
                self.outside.add(v);
            }
        }
    }

    /// `point` 处的区域竞争演化速度:
    ///
    /// `c · δ_ε(φ_k) · [ (I - μ_in)² - prod · (I - μ_out)² ]`,
    ///
    /// 其中 `prod` 为排他性乘积, `μ` 为两侧运行均值, `c` 为能量系数.
    pub fn speed<const D: usize>(
        &self,
        point: Idx<D>,
        fields: &FieldSet<D>,
        partition: Option<&DomainPartition<D>>,
        intensity: &dyn IntensitySource,
    ) -> f64 {
        let phi = fields.get(self.id).evaluate(&point) as f64;
        let delta = self.heaviside.dirac(phi);
        if delta == 0.0 {
            return 0.0;
        }
        let observed = intensity.intensity(&point);
        let prod = self.compute_product(point, fields, partition);
        let d_in = observed - self.inside.mean();
        let d_out = observed - self.outside.mean();
        self.coefficient * delta * (d_in * d_in - prod * d_out * d_out)
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl<H: RegularizedHeaviside + Sync> RegionCompetitionTerm<H> {
    /// 借助 `rayon`, 并行计算一批活跃点的演化速度 (两阶段 sweep 的
    /// 只读阶段). 结果与逐点调用 [`Self::speed`] 完全一致;
    /// 所有修改操作仍须由驱动在 apply 阶段串行执行.
    pub fn par_speeds<const D: usize>(
        &self,
        points: &[Idx<D>],
        fields: &FieldSet<D>,
        partition: Option<&DomainPartition<D>>,
        intensity: &(dyn IntensitySource + Sync),
    ) -> Vec<f64> {
        points
            .par_iter()
            .map(|p| self.speed(*p, fields, partition, intensity))
            .collect()
    }
}
