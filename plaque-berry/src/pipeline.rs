//! 完整的定量流程.
//!
//! 掩膜索引 -> 体积累加 -> 边界检测 -> 边界脑区校正 -> 密度 -> 结果行.
//! 任一步失败时不产生任何输出行.

use crate::boundary::{BoundaryDetector, EdgeSlices};
use crate::config::{BoundaryFailure, RunConfig};
use crate::consts::BOUNDARY_ROOTS;
use crate::correction::{boundary_leaves, CorrectionPolicy};
use crate::density::DensityGuard;
use crate::mask_index::MaskIndex;
use crate::quantify::accumulate_all;
use crate::table::{AnimalMeta, MeasurementRow};
use crate::{AtlasProvider, QuantError, QuantResult, VolumeAttr, VolumePair};

/// 单只动物的定量器.
#[derive(Debug, Clone)]
pub struct Quantifier {
    meta: AnimalMeta,
    roots: Vec<String>,
    detector: BoundaryDetector,
    policy: CorrectionPolicy,
    guard: DensityGuard,
    on_failure: BoundaryFailure,
}

impl Quantifier {
    /// 以默认参数创建.
    pub fn new(meta: AnimalMeta) -> Self {
        Self {
            meta,
            roots: BOUNDARY_ROOTS.iter().map(|s| s.to_string()).collect(),
            detector: BoundaryDetector::default(),
            policy: CorrectionPolicy::default(),
            guard: DensityGuard::default(),
            on_failure: BoundaryFailure::default(),
        }
    }

    /// 由运行配置创建.
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            meta: cfg.animal.clone(),
            roots: cfg.boundary.roots.clone(),
            detector: cfg.detector(),
            policy: cfg.policy(),
            guard: cfg.guard(),
            on_failure: cfg.boundary.on_failure,
        }
    }

    /// 替换边界根脑区.
    pub fn with_roots<S: AsRef<str>>(mut self, roots: &[S]) -> Self {
        self.roots = roots.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// 替换边界检测失败时的处理方式.
    pub fn with_on_failure(mut self, on_failure: BoundaryFailure) -> Self {
        self.on_failure = on_failure;
        self
    }

    /// 替换体积校正策略.
    pub fn with_policy(mut self, policy: CorrectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 对一对体数据运行完整流程, 返回按本体顺序排列的结果行.
    ///
    /// 只输出至少分配到一个体素的脑区.
    ///
    /// # 注意
    ///
    /// 图谱参考空间形状必须与体数据一致, 否则返回 [`QuantError::InputMismatch`].
    pub fn run<A>(&self, atlas: &A, volumes: &VolumePair) -> QuantResult<Vec<MeasurementRow>>
    where
        A: AtlasProvider + ?Sized,
    {
        if atlas.shape() != volumes.shape() {
            return Err(QuantError::InputMismatch {
                what: "annotation",
                expected: volumes.shape(),
                found: atlas.shape(),
            });
        }

        let index = MaskIndex::build_all(atlas)?;
        let assigned = index.assigned_ids();
        log::info!(
            "{} of {} regions have assigned voxels",
            assigned.len(),
            index.len()
        );
        let accs = accumulate_all(&assigned, &index, &volumes.segmented)?;

        let edges = self.edge_slices(volumes)?;
        let leaves = boundary_leaves(atlas, &self.roots, &index)?;

        let (mut corrected, mut discarded) = (0, 0);
        let mut rows = Vec::with_capacity(accs.len());
        for acc in accs.iter() {
            let volume_in = match (leaves.contains(&acc.region), index.get(acc.region)) {
                (true, Some(mask)) => {
                    let c = self
                        .policy
                        .correct(acc.volume, mask, &edges, &volumes.original);
                    if c.is_discarded() {
                        discarded += 1;
                        log::debug!("Region {} discarded: {:?}", acc.region, c);
                    }
                    corrected += 1;
                    c.volume_in(acc.volume)
                }
                _ => acc.volume,
            };
            let density = self.guard.density(acc.plaque_volume, volume_in);
            let acronym = atlas.id_to_acronym(acc.region)?;
            rows.push(MeasurementRow::new(&self.meta, acronym, acc, volume_in, density));
        }
        log::info!(
            "Animal {}: {} rows, {} boundary leaves checked, {} discarded",
            self.meta.animal_id,
            rows.len(),
            corrected,
            discarded
        );
        Ok(rows)
    }

    fn edge_slices(&self, volumes: &VolumePair) -> QuantResult<EdgeSlices> {
        match self.detector.detect(&volumes.original) {
            Ok(profile) => Ok(profile.into_edge_slices()),
            Err(e @ QuantError::BoundaryDetection { .. })
                if self.on_failure == BoundaryFailure::Skip =>
            {
                log::warn!("{e}; boundary correction skipped");
                Ok(EdgeSlices::none(volumes.original.len_z()))
            }
            Err(e) => Err(e),
        }
    }
}
