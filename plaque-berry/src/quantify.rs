//! 逐脑区体积与信号累加.

use crate::mask_index::{MaskIndex, RegionMask};
use crate::parallel::try_map;
use crate::{QuantResult, RegionId, SignalVolume};

/// 单个脑区的原始累加结果.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Accumulation {
    /// 脑区 id.
    pub region: RegionId,

    /// 脑区体素总数 (原始体积).
    pub volume: u64,

    /// 脑区内分割信号强度和. 分割信号为二值时即斑块体素个数.
    pub plaque_volume: u64,
}

/// 计算单个脑区的原始体积与斑块体积. 纯函数.
///
/// # 注意
///
/// `mask` 中的坐标必须在 `segmented` 范围内, 否则程序 panic.
pub fn accumulate(region: RegionId, mask: &RegionMask, segmented: &SignalVolume) -> Accumulation {
    Accumulation {
        region,
        volume: mask.len() as u64,
        plaque_volume: segmented.sum_at(mask.as_slice()),
    }
}

/// 对 `regions` 中的每个脑区调用 [`accumulate`], 结果顺序与 `regions` 一致.
///
/// 打开 `rayon` feature 时按脑区并行. 不在 `index` 中的脑区按空掩膜处理.
pub fn accumulate_all(
    regions: &[RegionId],
    index: &MaskIndex,
    segmented: &SignalVolume,
) -> QuantResult<Vec<Accumulation>> {
    let empty = RegionMask::default();
    try_map(regions, |&id| {
        Ok(accumulate(id, index.get(id).unwrap_or(&empty), segmented))
    })
}
