#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供多相分割所需的稀疏窄带水平集 (sparse-field level set)
//! 表示与区域竞争能量项的基础算法.
//!
//! 该 crate 目前仅提供 `safe` 接口. 演化外层驱动 (时间步长, 收敛判定)
//! 不在本库范围内: 本库只负责窄带表示本身、其微分算子求值,
//! 以及多相 Chan-Vese 风格区域竞争项.
//!
//! # 注意
//!
//! 1. 窄带成员关系 (layer membership) 被视为精确不变量.
//!   在非期望情况下 (越界索引, 重复插入, 移动不存在的点),
//!   程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//! 2. 一次 sweep 内的读算子是纯只读的, 可以并行;
//!   所有修改操作 (`flip`, `move_to_layer`, `update_pixel`)
//!   必须由驱动在 apply 阶段串行执行.
//!
//! # 开发计划
//!
//! ### 窄带分层存储 (Layer Store) ✅
//!
//! 每个 layer id 对应一个网格点集合, 附带点到 layer 的 O(1) 反查.
//!
//! 实现位于 `ls-berry/src/band.rs`.
//!
//! ### 内部区域 run-length 存储 ✅
//!
//! 远离窄带的点也要能够稳定回答 "在内还是在外".
//! 我们按最后一维做区间压缩, 内存规模与窄带同阶.
//!
//! 实现位于 `ls-berry/src/field/runs.rs`.
//!
//! ### 稀疏水平集字段与微分算子 ✅
//!
//! 值 / 梯度 / Hessian / Laplacian / 平均曲率求值,
//! 以及一次遍历填充全部结果的 `evaluate_all`.
//! 2-layer 与 4-layer 两种表示由 [`BandScheme`] 策略统一.
//!
//! 实现位于 `ls-berry/src/field`.
//!
//! ### 层初始化与过零迁移 ✅
//!
//! 从种子 mask 出发按 city-block 距离分层;
//! 演化中过零点通过 `flip` 完成 layer 迁移与邻域重标号.
//!
//! 实现位于 `ls-berry/src/field/{init, transit}.rs`.
//!
//! ### 域标签分区缓存 ✅
//!
//! 将网格划分为极大连通区域, 每个区域记录窄带与之相交的实例列表,
//! 避免对每个像素扫描全部实例.
//!
//! 实现位于 `ls-berry/src/domain.rs`.
//!
//! ### 多相区域竞争项 ✅
//!
//! 正则化 Heaviside 乘积 (排他性因子) 与增量式区域强度统计.
//!
//! 实现位于 `ls-berry/src/term`.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private API 提供文档.

/// `D` 维网格点索引. 不可变值类型, 可用作 map key.
pub type Idx<const D: usize> = [usize; D];

/// 二维网格点索引.
pub type Idx2d = Idx<2>;

/// 三维网格点索引.
pub type Idx3d = Idx<3>;

/// 窄带 layer id. 原始表示只需要很小的带符号整数字母表.
pub type LayerId = i8;

/// 参与竞争的水平集实例 id.
pub type InstanceId = u32;

pub mod consts;

mod band;

pub use band::LayerStore;

pub mod field;

pub use field::{FieldSet, PointData, SparseLevelSet};

mod domain;

pub use domain::DomainPartition;

pub mod term;

pub use term::{
    AtanHeaviside, IntensitySource, RegionCompetitionTerm, RegionStats, RegularizedHeaviside,
    SinHeaviside,
};

pub mod prelude;
