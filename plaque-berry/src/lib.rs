#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 基于分层脑区图谱 (ontology), 对配准后的 3D 荧光图像进行逐脑区的斑块
//! (plaque) 体积定量, 并对扫描物理边界附近被截断的脑区做体积校正.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 两个输入体数据 (原始信号, 分割信号) 以及图谱注释体数据必须共用同一参考空间,
//!   即形状一致, 否则运行时返回 [`QuantError::InputMismatch`].
//! 2. 所有体数据均按 `(z, h, w)` 访问, 其中 z 方向 (第 0 轴) 即扫描主轴.
//!
//! # 开发计划
//!
//! ### 图谱接口与文件图谱实现 ✅
//!
//! [`AtlasProvider`] 将脑区 id 解析为名称, 父子关系和体素掩膜.
//! [`AnnotatedAtlas`] 由 `structures.json` 和注释体数据构建.
//!
//! 实现位于 `plaque-berry/src/atlas`.
//!
//! ### 脑区掩膜索引 ✅
//!
//! 每个脑区的体素集合只计算一次, 非叶脑区包含所有后代体素.
//!
//! 实现位于 `plaque-berry/src/mask_index.rs`.
//!
//! ### 扫描边界检测 ✅
//!
//! 沿扫描主轴计算逐切片平均强度及其一阶差分, 取超过分位数阈值的峰作为组织边界.
//!
//! 实现位于 `plaque-berry/src/boundary`.
//!
//! ### 边界脑区体积校正 ✅
//!
//! 实现位于 `plaque-berry/src/correction.rs`.
//!
//! ### 斑块密度与结果表 ✅
//!
//! 实现位于 `plaque-berry/src/density.rs` 和 `plaque-berry/src/table`.
//!
//! ### 并行化 ✅
//!
//! 打开 `rayon` feature 后, 掩膜索引和体积累加按脑区并行, 结果顺序与输入一致.

/// 三维索引 `(z, h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 脑区 id. 与参考图谱中的 structure id 一致.
pub type RegionId = u32;

pub mod atlas;

pub mod boundary;

pub mod config;

pub mod consts;

pub mod correction;

mod data;

pub mod density;

mod error;

pub mod mask_index;

mod parallel;

pub mod pipeline;

pub mod quantify;

pub mod table;

pub mod prelude;

pub use atlas::{AnnotatedAtlas, AtlasProvider, Ontology, Region};
pub use data::{SignalVolume, VolumeAttr, VolumePair};
pub use error::{QuantError, QuantResult};
