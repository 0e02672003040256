//! 快速导入本库的常用类型.
//!
//! ```
//! use ls_berry::prelude::*;
//! ```

pub use crate::consts::{BandScheme, Side};
pub use crate::{
    AtanHeaviside, DomainPartition, FieldSet, Idx, Idx2d, Idx3d, InstanceId, IntensitySource,
    LayerId, LayerStore, PointData, RegionCompetitionTerm, RegionStats, RegularizedHeaviside,
    SinHeaviside, SparseLevelSet,
};
