//! 扁平化的脑区本体.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::Region;
use crate::{QuantError, QuantResult, RegionId};

/// 参考图谱 `structures.json` 中的一条记录. 其余字段忽略.
#[derive(Debug, Deserialize)]
struct StructureRecord {
    id: RegionId,
    acronym: String,
    name: String,

    /// 从根到自身的 id 路径.
    structure_id_path: Vec<RegionId>,
}

/// 脑区本体. 父子关系在构建时一次性展开为邻接表.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    regions: Vec<Region>,
    by_id: HashMap<RegionId, usize>,
    by_acronym: HashMap<String, RegionId>,
}

impl Ontology {
    /// 由 `(id, acronym, name, parent)` 序列构建本体. 序列顺序即本体顺序.
    ///
    /// 父脑区可以出现在子脑区之后. 指向未知父脑区的记录会被当作根处理.
    /// 父子关系成环 (包括以自身为父) 时返回 [`QuantError::OntologyCycle`].
    pub fn from_entries<I, A, N>(entries: I) -> QuantResult<Self>
    where
        I: IntoIterator<Item = (RegionId, A, N, Option<RegionId>)>,
        A: Into<String>,
        N: Into<String>,
    {
        let mut regions: Vec<Region> = entries
            .into_iter()
            .map(|(id, acronym, name, parent_id)| Region {
                id,
                acronym: acronym.into(),
                name: name.into(),
                parent_id,
                child_ids: Vec::new(),
            })
            .collect();

        let by_id: HashMap<RegionId, usize> = regions
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();

        for r in regions.iter_mut() {
            if r.parent_id.is_some_and(|p| !by_id.contains_key(&p)) {
                r.parent_id = None;
            }
        }

        // 无环时, 沿父链至多走 `len` 步即到达根.
        for r in regions.iter() {
            let mut cur = r.parent_id;
            let mut steps = 0;
            while let Some(p) = cur {
                if p == r.id || steps > regions.len() {
                    return Err(QuantError::OntologyCycle(r.id));
                }
                cur = by_id.get(&p).and_then(|&i| regions[i].parent_id);
                steps += 1;
            }
        }

        for i in 0..regions.len() {
            if let Some(pi) = regions[i].parent_id.and_then(|p| by_id.get(&p).copied()) {
                let id = regions[i].id;
                regions[pi].child_ids.push(id);
            }
        }

        let by_acronym = regions
            .iter()
            .map(|r| (r.acronym.clone(), r.id))
            .collect();

        Ok(Self {
            regions,
            by_id,
            by_acronym,
        })
    }

    /// 读取参考图谱的扁平 `structures.json` (记录数组).
    ///
    /// 父脑区取 `structure_id_path` 的倒数第二个元素.
    pub fn open_structures_json<P: AsRef<Path>>(path: P) -> QuantResult<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let records: Vec<StructureRecord> = serde_json::from_reader(reader)?;
        Self::from_records(records)
    }

    /// 从 json 字符串解析, 格式同 [`Self::open_structures_json`].
    pub fn from_structures_json_str(s: &str) -> QuantResult<Self> {
        let records: Vec<StructureRecord> = serde_json::from_str(s)?;
        Self::from_records(records)
    }

    fn from_records(records: Vec<StructureRecord>) -> QuantResult<Self> {
        Self::from_entries(records.into_iter().map(|r| {
            let parent = match r.structure_id_path.as_slice() {
                [.., p, _] => Some(*p),
                _ => None,
            };
            (r.id, r.acronym, r.name, parent)
        }))
    }

    /// 脑区个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// 本体是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// 按本体顺序迭代所有脑区.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Region> {
        self.regions.iter()
    }

    /// 解析脑区.
    pub fn get(&self, id: RegionId) -> QuantResult<&Region> {
        self.by_id
            .get(&id)
            .map(|&i| &self.regions[i])
            .ok_or(QuantError::UnknownRegion(id))
    }

    /// 缩写 -> id.
    pub fn id_of(&self, acronym: &str) -> QuantResult<RegionId> {
        self.by_acronym
            .get(acronym)
            .copied()
            .ok_or_else(|| QuantError::UnknownAcronym(acronym.to_owned()))
    }
}
