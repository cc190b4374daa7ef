//! 常用类型一并导入.

pub use crate::boundary::{BoundaryDetector, BoundaryProfile, EdgeSlices};
pub use crate::config::{BoundaryFailure, RunConfig};
pub use crate::correction::{Correction, CorrectionPolicy, OverlapUnit};
pub use crate::density::DensityGuard;
pub use crate::mask_index::{MaskIndex, RegionMask};
pub use crate::pipeline::Quantifier;
pub use crate::quantify::Accumulation;
pub use crate::table::{AnimalMeta, MeasurementRow};
pub use crate::{
    AnnotatedAtlas, AtlasProvider, Idx3d, Ontology, QuantError, QuantResult, Region, RegionId,
    SignalVolume, VolumeAttr, VolumePair,
};
