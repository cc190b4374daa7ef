//! 扫描物理边界检测.
//!
//! 组织在扫描主轴上的起止处, 逐切片平均强度会出现陡峭跳变, 而组织内部的变化较平缓.
//! 本模块对平均强度的一阶差分取绝对值, 找出高于给定分位数的局部峰,
//! 以第一个和最后一个峰作为组织边界.

mod peaks;

use ndarray::{Array1, ArrayView1};

use crate::consts::{EDGE_MARGIN, PEAK_PERCENTILE};
use crate::{QuantError, QuantResult, SignalVolume};

/// 边界附近的切片集合: `[0, first_edge + margin) ∪ [last_edge - margin, N)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSlices {
    flags: Vec<bool>,
}

impl EdgeSlices {
    /// 在 `n` 个切片上构建集合. 两段区间均被截断到 `[0, n)` 之内.
    pub fn new(n: usize, first_edge: usize, last_edge: usize, margin: usize) -> Self {
        let head_end = first_edge.saturating_add(margin).min(n);
        let tail_start = last_edge.saturating_sub(margin).min(n);
        let flags = (0..n).map(|z| z < head_end || z >= tail_start).collect();
        Self { flags }
    }

    /// 不含任何切片的集合. 用于跳过校正的情况.
    pub fn none(n: usize) -> Self {
        Self {
            flags: vec![false; n],
        }
    }

    /// 切片 `z` 是否靠近边界? 越界的 `z` 返回 `false`.
    #[inline]
    pub fn contains(&self, z: usize) -> bool {
        self.flags.get(z).copied().unwrap_or(false)
    }

    /// 集合中的切片个数.
    pub fn len(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    /// 集合是否为空?
    pub fn is_empty(&self) -> bool {
        !self.flags.iter().any(|f| *f)
    }

    /// 升序迭代集合中的切片索引.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(z, f)| f.then_some(z))
    }
}

/// 边界检测结果.
#[derive(Debug, Clone)]
pub struct BoundaryProfile {
    means: Array1<f64>,
    slope: Array1<f64>,
    peaks: Vec<usize>,
    edges: EdgeSlices,
}

impl BoundaryProfile {
    /// 逐切片平均强度, 长度为切片数 `N`.
    #[inline]
    pub fn means(&self) -> ArrayView1<'_, f64> {
        self.means.view()
    }

    /// 平均强度的一阶差分, 长度为 `N - 1`.
    #[inline]
    pub fn slope(&self) -> ArrayView1<'_, f64> {
        self.slope.view()
    }

    /// 所有显著峰 (差分序列下标), 升序. 至少两个.
    #[inline]
    pub fn peaks(&self) -> &[usize] {
        &self.peaks
    }

    /// 第一个边界.
    #[inline]
    pub fn first_edge(&self) -> usize {
        self.peaks[0]
    }

    /// 最后一个边界. 严格大于 [`Self::first_edge`].
    #[inline]
    pub fn last_edge(&self) -> usize {
        self.peaks[self.peaks.len() - 1]
    }

    /// 靠近边界的切片集合.
    #[inline]
    pub fn edge_slices(&self) -> &EdgeSlices {
        &self.edges
    }

    /// 取出边界切片集合.
    #[inline]
    pub fn into_edge_slices(self) -> EdgeSlices {
        self.edges
    }
}

/// 边界检测器.
#[derive(Copy, Clone, Debug)]
pub struct BoundaryDetector {
    /// 峰高阈值取 `|差分|` 的第几百分位数.
    pub percentile: f64,

    /// 边界两侧额外纳入的切片个数.
    pub margin: usize,
}

impl Default for BoundaryDetector {
    fn default() -> Self {
        Self {
            percentile: PEAK_PERCENTILE,
            margin: EDGE_MARGIN,
        }
    }
}

impl BoundaryDetector {
    /// 检测原始信号体数据的扫描边界.
    ///
    /// 显著峰少于两个时 (平坦或纯噪声的强度分布) 返回
    /// [`QuantError::BoundaryDetection`].
    pub fn detect(&self, original: &SignalVolume) -> QuantResult<BoundaryProfile> {
        self.detect_means(original.slice_means())
    }

    /// 由已经算好的逐切片平均强度检测边界.
    ///
    /// `percentile` 不在 `[0, 100]` 内时返回 [`QuantError::InvalidConfig`].
    pub fn detect_means(&self, means: Array1<f64>) -> QuantResult<BoundaryProfile> {
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(QuantError::InvalidConfig {
                field: "boundary.percentile",
                value: self.percentile,
            });
        }
        let n = means.len();
        let slope: Array1<f64> = means.windows(2).into_iter().map(|w| w[1] - w[0]).collect();
        let magnitude = slope.mapv(f64::abs);

        let peaks = match peaks::percentile(magnitude.view(), self.percentile) {
            Some(height) => peaks::find_peaks(magnitude.view(), height),
            None => vec![],
        };
        if peaks.len() < 2 {
            return Err(QuantError::BoundaryDetection { peaks: peaks.len() });
        }

        let (first, last) = (peaks[0], peaks[peaks.len() - 1]);
        debug_assert!(first < last && last < n);
        log::info!(
            "Detected tissue boundary at slices {first} and {last} ({} candidate peaks)",
            peaks.len()
        );
        let edges = EdgeSlices::new(n, first, last, self.margin);
        Ok(BoundaryProfile {
            means,
            slope,
            peaks,
            edges,
        })
    }
}
