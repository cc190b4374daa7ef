//! 运行配置.
//!
//! 配置以 toml 文件给出, 所有数值参数都有默认值 (见 [`crate::consts`]).
//! 一个最小的配置文件形如:
//!
//! ```toml
//! [animal]
//! animal_id = "00"
//! mouse_line = "5xFAD"
//! sex = "M"
//! age_group = "6 mo"
//! age = 175
//!
//! [paths]
//! original = "raw.nii.gz"
//! segmented = "seg.nii.gz"
//! annotation = "annotation_25.nii.gz"
//! ontology = "structures.json"
//! dataset = "data_plaque_group.csv"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::boundary::BoundaryDetector;
use crate::consts::*;
use crate::correction::{CorrectionPolicy, OverlapUnit};
use crate::density::DensityGuard;
use crate::table::AnimalMeta;
use crate::{QuantError, QuantResult};

/// 边界检测失败时的处理方式.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryFailure {
    /// 终止本次运行.
    #[default]
    Abort,

    /// 记录警告, 跳过边界校正.
    Skip,
}

/// 输入输出文件路径.
#[derive(Debug, Clone, Deserialize)]
pub struct PathConfig {
    /// 原始信号体数据.
    pub original: PathBuf,

    /// 分割信号体数据.
    pub segmented: PathBuf,

    /// 图谱注释体数据.
    pub annotation: PathBuf,

    /// 图谱 `structures.json`.
    pub ontology: PathBuf,

    /// 历史结果表 (csv), 本次结果追加在其末尾.
    pub dataset: PathBuf,
}

/// 二值化阈值.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// 原始信号阈值.
    pub original: f32,

    /// 分割信号阈值.
    pub segmented: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            original: ORIGINAL_THRESHOLD,
            segmented: SEGMENTED_THRESHOLD,
        }
    }
}

/// 边界检测参数.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// 需要做边界校正的根脑区缩写.
    pub roots: Vec<String>,

    /// 边界两侧额外纳入的切片数.
    pub margin: usize,

    /// 峰高分位数 (百分制).
    pub percentile: f64,

    /// 检测失败时的处理方式.
    pub on_failure: BoundaryFailure,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            roots: BOUNDARY_ROOTS.iter().map(|s| s.to_string()).collect(),
            margin: EDGE_MARGIN,
            percentile: PEAK_PERCENTILE,
            on_failure: BoundaryFailure::default(),
        }
    }
}

/// 体积校正参数.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    #[allow(missing_docs)]
    pub overlap_threshold: usize,

    #[allow(missing_docs)]
    pub truncation_ratio: f64,

    #[allow(missing_docs)]
    pub overlap_unit: OverlapUnit,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: OVERLAP_THRESHOLD,
            truncation_ratio: TRUNCATION_RATIO,
            overlap_unit: OverlapUnit::default(),
        }
    }
}

/// 密度计算参数.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    #[allow(missing_docs)]
    pub epsilon: f64,

    #[allow(missing_docs)]
    pub min_reliable_volume: u64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            epsilon: DENSITY_EPSILON,
            min_reliable_volume: MIN_RELIABLE_VOLUME,
        }
    }
}

/// 一次定量运行的完整配置.
#[derive(Clone, Debug, Deserialize)]
pub struct RunConfig {
    /// 动物元信息.
    pub animal: AnimalMeta,

    /// 文件路径. 相对路径相对于配置文件所在目录.
    pub paths: PathConfig,

    #[allow(missing_docs)]
    #[serde(default)]
    pub threshold: ThresholdConfig,

    #[allow(missing_docs)]
    #[serde(default)]
    pub boundary: BoundaryConfig,

    #[allow(missing_docs)]
    #[serde(default)]
    pub correction: CorrectionConfig,

    #[allow(missing_docs)]
    #[serde(default)]
    pub density: DensityConfig,

    /// 工作线程数. 缺省时由调用者决定.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl RunConfig {
    /// 从 toml 文本解析并检查参数范围. 路径保持原样.
    ///
    /// 参数越界时返回 [`QuantError::InvalidConfig`].
    pub fn from_toml_str(s: &str) -> QuantResult<Self> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 检查数值参数是否在合法范围内.
    pub fn validate(&self) -> QuantResult<()> {
        let checks = [
            ("boundary.percentile", self.boundary.percentile, 0.0..=100.0),
            ("correction.truncation_ratio", self.correction.truncation_ratio, 0.0..=1.0),
            ("density.epsilon", self.density.epsilon, 0.0..=f64::MAX),
        ];
        match checks.into_iter().find(|(_, v, range)| !range.contains(v)) {
            Some((field, value, _)) => Err(QuantError::InvalidConfig { field, value }),
            None => Ok(()),
        }
    }

    /// 读取配置文件, 并将其中的相对路径解析为相对配置文件所在目录的路径.
    pub fn open<P: AsRef<Path>>(path: P) -> QuantResult<Self> {
        let path = path.as_ref();
        let mut cfg = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        if let Some(base) = path.parent() {
            cfg.paths.rebase(base);
        }
        log::debug!("Loaded run config from {}", path.display());
        Ok(cfg)
    }

    /// 边界检测器.
    pub fn detector(&self) -> BoundaryDetector {
        BoundaryDetector {
            percentile: self.boundary.percentile,
            margin: self.boundary.margin,
        }
    }

    /// 体积校正策略.
    pub fn policy(&self) -> CorrectionPolicy {
        CorrectionPolicy {
            overlap_threshold: self.correction.overlap_threshold,
            truncation_ratio: self.correction.truncation_ratio,
            overlap_unit: self.correction.overlap_unit,
        }
    }

    /// 密度保护条件.
    pub fn guard(&self) -> DensityGuard {
        DensityGuard {
            epsilon: self.density.epsilon,
            min_reliable_volume: self.density.min_reliable_volume,
        }
    }
}

impl PathConfig {
    fn rebase(&mut self, base: &Path) {
        for p in [
            &mut self.original,
            &mut self.segmented,
            &mut self.annotation,
            &mut self.ontology,
            &mut self.dataset,
        ] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundaryFailure, RunConfig};
    use crate::correction::OverlapUnit;
    use crate::QuantError;

    const MINIMAL: &str = r#"
[animal]
animal_id = "00"
mouse_line = "5xFAD"
sex = "M"
age_group = "6 mo"
age = 175

[paths]
original = "raw.nii.gz"
segmented = "seg.nii.gz"
annotation = "/atlas/annotation_25.nii.gz"
ontology = "structures.json"
dataset = "data_plaque_group.csv"
"#;

    #[test]
    fn test_defaults() {
        let cfg = RunConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(cfg.animal.age, 175);
        assert_eq!(cfg.boundary.roots, vec!["CB", "P", "MY", "OLF", "fiber tracts"]);
        assert_eq!(cfg.boundary.on_failure, BoundaryFailure::Abort);
        assert_eq!(cfg.threshold.original, 1.0);
        assert_eq!(cfg.threshold.segmented, 0.0);
        assert_eq!(cfg.threads, None);

        let p = cfg.policy();
        assert_eq!(p.overlap_threshold, 5);
        assert_eq!(p.truncation_ratio, 0.8);
        assert_eq!(p.overlap_unit, OverlapUnit::Voxels);
        assert_eq!(cfg.detector().margin, 10);
        assert_eq!(cfg.guard().min_reliable_volume, 5);
    }

    #[test]
    fn test_overrides() {
        let text = format!(
            "{MINIMAL}\n[boundary]\nroots = [\"CB\"]\non_failure = \"skip\"\n\n\
             [correction]\noverlap_unit = \"slices\"\n\n[density]\nmin_reliable_volume = 1\n"
        );
        let cfg = RunConfig::from_toml_str(&text).unwrap();
        assert_eq!(cfg.boundary.roots, vec!["CB"]);
        assert_eq!(cfg.boundary.on_failure, BoundaryFailure::Skip);
        assert_eq!(cfg.boundary.percentile, 90.0);
        assert_eq!(cfg.policy().overlap_unit, OverlapUnit::Slices);
        assert_eq!(cfg.guard().min_reliable_volume, 1);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let with = |extra: &str| RunConfig::from_toml_str(&format!("{MINIMAL}\n{extra}\n"));

        let err = with("[boundary]\npercentile = 150").unwrap_err();
        assert!(matches!(
            err,
            QuantError::InvalidConfig {
                field: "boundary.percentile",
                ..
            }
        ));
        assert!(matches!(
            with("[correction]\ntruncation_ratio = 1.5").unwrap_err(),
            QuantError::InvalidConfig {
                field: "correction.truncation_ratio",
                ..
            }
        ));
        assert!(with("[density]\nepsilon = -1.0").is_err());
        assert!(with("[boundary]\npercentile = 100").is_ok());
    }

    #[test]
    fn test_missing_animal_is_error() {
        let err = RunConfig::from_toml_str("[paths]\noriginal = \"a\"\n").unwrap_err();
        assert!(matches!(err, QuantError::Config(_)));
    }

    #[test]
    fn test_open_rebases_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quantify.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let cfg = RunConfig::open(&path).unwrap();
        assert_eq!(cfg.paths.original, dir.path().join("raw.nii.gz"));
        assert_eq!(cfg.paths.dataset, dir.path().join("data_plaque_group.csv"));
        assert_eq!(cfg.paths.annotation, std::path::PathBuf::from("/atlas/annotation_25.nii.gz"));
    }
}
