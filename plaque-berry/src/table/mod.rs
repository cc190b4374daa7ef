//! 结果表.
//!
//! 每次运行为每个脑区生成一行 [`MeasurementRow`], 追加到历史数据集末尾.
//! 已写入的行不会被修改.

mod dataset;

pub use dataset::{append_rows, read_rows, write_rows, HEADER};

use serde::Deserialize;

use crate::quantify::Accumulation;
use crate::RegionId;

/// 动物元信息. 由外部配置提供.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnimalMeta {
    /// 动物编号.
    pub animal_id: String,

    /// 小鼠品系, 如 `5xFAD`.
    pub mouse_line: String,

    /// 性别.
    pub sex: String,

    /// 年龄组, 如 `6 mo`.
    pub age_group: String,

    /// 年龄 (天).
    pub age: u32,
}

/// 单个脑区一次运行的测量结果. 构建后不可变.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    /// 动物编号.
    pub animal_id: String,

    /// 小鼠品系.
    pub mouse_line: String,

    /// 性别.
    pub sex: String,

    /// 年龄组.
    pub age_group: String,

    /// 年龄 (天).
    pub age: u32,

    /// 脑区 id.
    pub region_id: RegionId,

    /// 脑区缩写.
    pub acronym: String,

    /// 原始体积 (体素个数).
    pub volume: u64,

    /// 校正后的有效体积. `0 <= volume_in <= volume`.
    pub volume_in: u64,

    /// 斑块体积 (体素个数).
    pub plaque_volume: u64,

    /// 斑块密度 (百分比). 有效体积过小时为 NaN.
    pub plaque_density: f64,
}

impl MeasurementRow {
    /// 由元信息, 累加结果和校正后的数值组装一行.
    pub fn new(
        meta: &AnimalMeta,
        acronym: impl Into<String>,
        acc: &Accumulation,
        volume_in: u64,
        plaque_density: f64,
    ) -> Self {
        debug_assert!(volume_in <= acc.volume);
        Self {
            animal_id: meta.animal_id.clone(),
            mouse_line: meta.mouse_line.clone(),
            sex: meta.sex.clone(),
            age_group: meta.age_group.clone(),
            age: meta.age,
            region_id: acc.region,
            acronym: acronym.into(),
            volume: acc.volume,
            volume_in,
            plaque_volume: acc.plaque_volume,
            plaque_density,
        }
    }

    /// 密度是否有定义?
    #[inline]
    pub fn has_density(&self) -> bool {
        !self.plaque_density.is_nan()
    }
}

/// 选出脑区缩写属于 `acronyms` 的行, 保持原有顺序.
pub fn filter_acronyms<'a, S: AsRef<str>>(
    rows: &'a [MeasurementRow],
    acronyms: &[S],
) -> Vec<&'a MeasurementRow> {
    rows.iter()
        .filter(|r| acronyms.iter().any(|a| a.as_ref() == r.acronym))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{filter_acronyms, AnimalMeta, MeasurementRow};
    use crate::quantify::Accumulation;

    pub(crate) fn meta() -> AnimalMeta {
        AnimalMeta {
            animal_id: "00".into(),
            mouse_line: "5xFAD".into(),
            sex: "M".into(),
            age_group: "6 mo".into(),
            age: 175,
        }
    }

    pub(crate) fn row(region: u32, acronym: &str, volume: u64, plaque: u64, density: f64) -> MeasurementRow {
        let acc = Accumulation {
            region,
            volume,
            plaque_volume: plaque,
        };
        MeasurementRow::new(&meta(), acronym, &acc, volume, density)
    }

    #[test]
    fn test_row_carries_meta() {
        let r = row(688, "CTX", 1000, 50, 5.0);
        assert_eq!(r.animal_id, "00");
        assert_eq!(r.age, 175);
        assert_eq!(r.region_id, 688);
        assert_eq!(r.volume_in, 1000);
        assert!(r.has_density());
        assert!(!row(1, "x", 0, 0, f64::NAN).has_density());
    }

    #[test]
    fn test_filter_acronyms_keeps_order() {
        let rows = vec![row(1, "CB", 10, 0, 0.0), row(2, "P", 10, 0, 0.0), row(3, "MY", 10, 0, 0.0)];
        let picked: Vec<_> = filter_acronyms(&rows, &["MY", "CB"])
            .into_iter()
            .map(|r| r.region_id)
            .collect();
        assert_eq!(picked, vec![1, 3]);
    }
}
