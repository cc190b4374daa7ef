//! 边界脑区体积校正.
//!
//! 只作用于配置中的边界根脑区的叶后代. 若叶脑区与边界切片的重叠量显著,
//! 则用原始信号 (组织实际覆盖范围) 重算有效体积; 截断过于严重的脑区整体舍弃.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::boundary::EdgeSlices;
use crate::consts::{OVERLAP_THRESHOLD, TRUNCATION_RATIO};
use crate::mask_index::{MaskIndex, RegionMask};
use crate::{AtlasProvider, QuantResult, RegionId, SignalVolume};

/// 重叠量的计数单位.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapUnit {
    /// 落在边界切片上的体素个数.
    #[default]
    Voxels,

    /// 脑区所涉及的不同边界切片个数. 用于复现按切片计数得到的历史数据.
    Slices,
}

/// 单个脑区的校正结论.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Correction {
    /// 无需校正, 有效体积等于原始体积.
    Untouched,

    /// 有效体积被重算为组织内部的体素个数.
    Recomputed(u64),

    /// 截断过于严重, 有效体积记为 0. 保留重算值以便记录.
    Discarded {
        /// 重算得到的组织内部体素个数.
        recomputed: u64,
    },
}

impl Correction {
    /// 给定原始体积, 求有效体积 `volume_in`.
    #[inline]
    pub fn volume_in(&self, volume: u64) -> u64 {
        match *self {
            Self::Untouched => volume,
            Self::Recomputed(v) => v,
            Self::Discarded { .. } => 0,
        }
    }

    /// 该脑区的测量是否被舍弃?
    #[inline]
    pub fn is_discarded(&self) -> bool {
        matches!(self, Self::Discarded { .. })
    }
}

/// 校正策略的两个可调阈值.
#[derive(Copy, Clone, Debug)]
pub struct CorrectionPolicy {
    /// 重叠量 **严格大于** 该值时才重算.
    pub overlap_threshold: usize,

    /// 重算值低于 `truncation_ratio * volume` 时舍弃.
    pub truncation_ratio: f64,

    /// 重叠量计数单位.
    pub overlap_unit: OverlapUnit,
}

impl Default for CorrectionPolicy {
    fn default() -> Self {
        Self {
            overlap_threshold: OVERLAP_THRESHOLD,
            truncation_ratio: TRUNCATION_RATIO,
            overlap_unit: OverlapUnit::Voxels,
        }
    }
}

impl CorrectionPolicy {
    /// 脑区掩膜与边界切片的重叠量.
    pub fn overlap(&self, mask: &RegionMask, edges: &EdgeSlices) -> usize {
        match self.overlap_unit {
            OverlapUnit::Voxels => mask.iter().filter(|p| edges.contains(p.0)).count(),
            OverlapUnit::Slices => mask.slices().filter(|&z| edges.contains(z)).count(),
        }
    }

    /// 根据重叠量和 (惰性求得的) 重算值作出结论.
    ///
    /// `recompute` 仅在重叠量显著时被调用.
    pub fn judge<F>(&self, volume: u64, overlap: usize, recompute: F) -> Correction
    where
        F: FnOnce() -> u64,
    {
        if overlap <= self.overlap_threshold {
            return Correction::Untouched;
        }
        let recomputed = recompute();
        debug_assert!(recomputed <= volume);
        if (recomputed as f64) < self.truncation_ratio * volume as f64 {
            Correction::Discarded { recomputed }
        } else {
            Correction::Recomputed(recomputed)
        }
    }

    /// 校正单个边界叶脑区. `volume` 为该脑区的原始体积 (即 `mask.len()`).
    ///
    /// 重算值为脑区掩膜内原始信号为正的体素个数.
    pub fn correct(
        &self,
        volume: u64,
        mask: &RegionMask,
        edges: &EdgeSlices,
        original: &SignalVolume,
    ) -> Correction {
        let overlap = self.overlap(mask, edges);
        self.judge(volume, overlap, || original.sum_at(mask.as_slice()))
    }
}

/// 所有边界根脑区的叶后代 (含根自身, 若其为叶), 仅保留在 `index` 中有体素的脑区.
///
/// 未知的根缩写会导致解析错误.
pub fn boundary_leaves<A, S>(
    atlas: &A,
    roots: &[S],
    index: &MaskIndex,
) -> QuantResult<BTreeSet<RegionId>>
where
    A: AtlasProvider + ?Sized,
    S: AsRef<str>,
{
    let mut ans = BTreeSet::new();
    for root in roots {
        let root_id = atlas.acronym_to_id(root.as_ref())?;
        ans.extend(
            atlas
                .descendants(root_id)?
                .into_iter()
                .filter(|r| r.is_leaf())
                .filter(|r| index.get(r.id).is_some_and(|m| !m.is_empty()))
                .map(|r| r.id),
        );
    }
    Ok(ans)
}
