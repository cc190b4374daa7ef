//! 运行时错误.

use crate::{Idx3d, RegionId};

/// 定量流程的运行时错误.
///
/// 除 [`QuantError::BoundaryDetection`] 可以按配置降级外, 其余错误均会终止本次运行,
/// 且不会产生任何部分输出.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    /// 图谱无法解析该脑区 id.
    #[error("unknown region id {0}")]
    UnknownRegion(RegionId),

    /// 图谱无法解析该脑区缩写.
    #[error("unknown region acronym `{0}`")]
    UnknownAcronym(String),

    /// 输入体数据形状不一致.
    ///
    /// `what` 指出出问题的输入, `expected` 是参考形状.
    #[error("{what} has shape {found:?}, expected {expected:?}")]
    InputMismatch {
        /// 出问题的输入名称.
        what: &'static str,

        /// 参考形状.
        expected: Idx3d,

        /// 实际形状.
        found: Idx3d,
    },

    /// 边界检测找到的显著峰少于两个.
    #[error("boundary detection found {peaks} significant peak(s), need at least 2")]
    BoundaryDetection {
        /// 实际找到的峰个数.
        peaks: usize,
    },

    /// 配置参数超出合法范围.
    #[error("invalid config: `{field}` = {value} is out of range")]
    InvalidConfig {
        /// 参数名, 形如 `section.key`.
        field: &'static str,

        /// 实际取值.
        value: f64,
    },

    /// 本体的父子关系中存在环. 参数为环上的某个脑区.
    #[error("ontology has a parent cycle through region {0}")]
    OntologyCycle(RegionId),

    /// 已有结果表的表头与当前格式不一致.
    #[error("dataset header mismatch: found `{found}`")]
    DatasetSchema {
        /// 实际读到的表头.
        found: String,
    },

    /// 体数据不是三维的.
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    /// 底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// 读取 nifti 文件错误.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// 读取 npy 文件错误.
    #[error(transparent)]
    Npy(#[from] ndarray_npy::ReadNpyError),

    /// 读写 csv 结果表错误.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// 解析图谱 json 错误.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// 解析配置文件错误.
    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl QuantError {
    /// 是否属于图谱解析错误 (未知 id 或未知缩写)?
    #[inline]
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::UnknownRegion(_) | Self::UnknownAcronym(_))
    }
}

/// 定量流程运行时结果.
pub type QuantResult<T> = Result<T, QuantError>;
