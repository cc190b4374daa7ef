//! 通用常量. 同时也是 [`crate::config::RunConfig`] 各字段的默认值.

/// 二值体数据的取值.
pub mod binary {
    /// 背景 (无信号).
    pub const OFF: u8 = 0;

    /// 前景 (有信号).
    pub const ON: u8 = 1;

    /// 体素是否有信号?
    #[inline]
    pub const fn is_on(p: u8) -> bool {
        p != OFF
    }
}

/// 注释体数据中未分配给任何脑区的体素标签.
pub const UNASSIGNED_LABEL: u32 = 0;

/// 原始信号二值化阈值. 强度 **严格大于** 该值的体素视为组织内部.
pub const ORIGINAL_THRESHOLD: f32 = 1.0;

/// 分割信号二值化阈值. 强度严格大于该值的体素视为斑块.
pub const SEGMENTED_THRESHOLD: f32 = 0.0;

/// 边界检测的峰高分位数 (百分制).
pub const PEAK_PERCENTILE: f64 = 90.0;

/// 检测出的边界切片两侧额外纳入的切片个数.
pub const EDGE_MARGIN: usize = 10;

/// 脑区与边界切片重叠量超过该值时才进行体积重算.
pub const OVERLAP_THRESHOLD: usize = 5;

/// 重算后的有效体积低于原体积的该比例时, 该脑区被整体舍弃.
pub const TRUNCATION_RATIO: f64 = 0.8;

/// 计算密度时分母上的极小量.
pub const DENSITY_EPSILON: f64 = 1e-9;

/// 有效体积 (体素个数) 小于该值时, 密度记为 NaN.
pub const MIN_RELIABLE_VOLUME: u64 = 5;

/// 已知会被扫描物理边界截断的根脑区 (缩写).
pub const BOUNDARY_ROOTS: [&str; 5] = ["CB", "P", "MY", "OLF", "fiber tracts"];
