//! 历史数据集的 csv 读写.
//!
//! 文件格式与参考数据集一致: 第一列是无名的行号, 其后依次为 [`HEADER`] 中的列.
//! NaN 密度写为空字段, 读取时空字段还原为 NaN.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::MeasurementRow;
use crate::{QuantError, QuantResult, RegionId};

/// 数据集表头 (含第一列无名行号).
pub const HEADER: [&str; 12] = [
    "",
    "animal_id",
    "mouse_line",
    "sex",
    "age_group",
    "age",
    "id",
    "acronym",
    "volume",
    "volume_in",
    "plaque_volume",
    "plaque_density",
];

/// NaN <-> 空字段.
mod nan_as_empty {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_nan() {
            s.serialize_str("")
        } else {
            s.serialize_f64(*v)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
    }
}

/// csv 中的一条记录.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    #[serde(rename = "")]
    index: u64,
    animal_id: String,
    mouse_line: String,
    sex: String,
    age_group: String,
    age: u32,
    id: RegionId,
    acronym: String,
    volume: u64,
    volume_in: u64,
    plaque_volume: u64,
    #[serde(with = "nan_as_empty")]
    plaque_density: f64,
}

impl Record {
    fn new(index: u64, r: &MeasurementRow) -> Self {
        Self {
            index,
            animal_id: r.animal_id.clone(),
            mouse_line: r.mouse_line.clone(),
            sex: r.sex.clone(),
            age_group: r.age_group.clone(),
            age: r.age,
            id: r.region_id,
            acronym: r.acronym.clone(),
            volume: r.volume,
            volume_in: r.volume_in,
            plaque_volume: r.plaque_volume,
            plaque_density: r.plaque_density,
        }
    }
}

impl From<Record> for MeasurementRow {
    fn from(r: Record) -> Self {
        Self {
            animal_id: r.animal_id,
            mouse_line: r.mouse_line,
            sex: r.sex,
            age_group: r.age_group,
            age: r.age,
            region_id: r.id,
            acronym: r.acronym,
            volume: r.volume,
            volume_in: r.volume_in,
            plaque_volume: r.plaque_volume,
            plaque_density: r.plaque_density,
        }
    }
}

/// 检查表头, 不一致时返回 [`QuantError::DatasetSchema`].
fn check_header(headers: &csv::StringRecord) -> QuantResult<()> {
    if headers.iter().eq(HEADER.iter().copied()) {
        Ok(())
    } else {
        Err(QuantError::DatasetSchema {
            found: headers.iter().collect::<Vec<_>>().join(","),
        })
    }
}

/// 将 `rows` 写入 `w`, 行号从 `start_index` 开始. `with_header` 指示是否先写表头.
pub fn write_rows<W: Write>(
    w: W,
    start_index: u64,
    rows: &[MeasurementRow],
    with_header: bool,
) -> QuantResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(w);
    for (i, row) in (start_index..).zip(rows) {
        writer.serialize(Record::new(i, row))?;
    }
    writer.flush()?;
    Ok(())
}

/// 读取数据集中的所有行, 保持文件顺序.
pub fn read_rows<P: AsRef<Path>>(path: P) -> QuantResult<Vec<MeasurementRow>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    check_header(reader.headers()?)?;
    reader
        .deserialize::<Record>()
        .map(|r| Ok(r?.into()))
        .collect()
}

/// 把 `rows` 追加到 `path` 处的数据集末尾, 返回追加后的总行数.
///
/// 文件不存在或为空时先写表头. 已有内容不会被改写: 写入通过追加模式完成,
/// 行号接着已有行数继续编号.
pub fn append_rows<P: AsRef<Path>>(path: P, rows: &[MeasurementRow]) -> QuantResult<usize> {
    let path = path.as_ref();
    let existing = match std::fs::metadata(path) {
        Ok(m) if m.len() > 0 => {
            let mut reader = csv::Reader::from_path(path)?;
            check_header(reader.headers()?)?;
            Some(reader.records().count())
        }
        Ok(_) => None,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)?;
    if existing.is_some() && !ends_with_newline(&mut file)? {
        file.write_all(b"\n")?;
    }

    let start = existing.unwrap_or(0);
    write_rows(&mut file, start as u64, rows, existing.is_none())?;
    log::info!(
        "Appended {} rows to {} ({} rows before)",
        rows.len(),
        path.display(),
        start
    );
    Ok(start + rows.len())
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.seek(SeekFrom::End(0))? == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
