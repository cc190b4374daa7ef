//! 脑区掩膜索引.
//!
//! 每个脑区的直接掩膜只向图谱请求一次, 聚合掩膜由展开后的后代列表归并得到,
//! 避免对每个脑区重复遍历本体树.

use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;

use crate::parallel::try_map;
use crate::{AtlasProvider, Idx3d, QuantResult, RegionId};

/// 单个脑区的体素坐标集合. 按行优先升序排列, 无重复.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionMask {
    coords: Vec<Idx3d>,
}

impl RegionMask {
    /// 由任意顺序的坐标构建. 内部会排序并去重.
    pub fn new(mut coords: Vec<Idx3d>) -> Self {
        coords.sort_unstable();
        coords.dedup();
        Self { coords }
    }

    /// 体素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// 是否不含任何体素?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// 坐标只读切片.
    #[inline]
    pub fn as_slice(&self) -> &[Idx3d] {
        &self.coords
    }

    /// 按行优先升序迭代坐标.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Idx3d> {
        self.coords.iter()
    }

    /// 掩膜涉及的所有扫描主轴切片索引, 升序无重复.
    pub fn slices(&self) -> impl Iterator<Item = usize> + '_ {
        self.coords.iter().map(|p| p.0).dedup()
    }
}

/// 一次运行内的脑区掩膜缓存. 构建后只读.
#[derive(Debug, Clone)]
pub struct MaskIndex {
    order: Vec<RegionId>,
    masks: HashMap<RegionId, RegionMask>,
}

impl MaskIndex {
    /// 为 `regions` 中的每个脑区 (叶或聚合) 计算掩膜. 非叶脑区包含所有后代体素.
    ///
    /// 任何无法解析的 id 都会使构建失败, 而不是被跳过.
    pub fn build<A>(atlas: &A, regions: &[RegionId]) -> QuantResult<Self>
    where
        A: AtlasProvider + ?Sized,
    {
        // 展开的邻接关系: 脑区 -> 全部后代 (含自身).
        let flattened: Vec<Vec<RegionId>> = try_map(regions, |&id| {
            Ok(atlas.descendants(id)?.iter().map(|r| r.id).collect())
        })?;

        let distinct: Vec<RegionId> = flattened
            .iter()
            .flatten()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let direct: HashMap<RegionId, Vec<Idx3d>> = distinct
            .iter()
            .copied()
            .zip(try_map(&distinct, |&id| atlas.mask(id, true))?)
            .collect();
        log::debug!(
            "Fetched {} direct masks for {} requested regions",
            direct.len(),
            regions.len()
        );

        let merged = try_map(&flattened, |subtree| {
            let coords = subtree
                .iter()
                .map(|id| direct[id].iter().copied())
                .kmerge()
                .dedup()
                .collect();
            Ok(RegionMask { coords })
        })?;

        let masks = regions.iter().copied().zip(merged).collect();
        Ok(Self {
            order: regions.to_vec(),
            masks,
        })
    }

    /// 为图谱中所有脑区构建索引.
    pub fn build_all<A>(atlas: &A) -> QuantResult<Self>
    where
        A: AtlasProvider + ?Sized,
    {
        Self::build(atlas, &atlas.region_ids())
    }

    /// 获取脑区掩膜. 不在索引中时返回 `None`.
    #[inline]
    pub fn get(&self, id: RegionId) -> Option<&RegionMask> {
        self.masks.get(&id)
    }

    /// 按构建时的请求顺序返回所有脑区 id.
    #[inline]
    pub fn ids(&self) -> &[RegionId] {
        &self.order
    }

    /// 掩膜非空 (即至少分配到一个体素) 的脑区, 保持请求顺序.
    pub fn assigned_ids(&self) -> Vec<RegionId> {
        self.order
            .iter()
            .copied()
            .filter(|id| !self.masks[id].is_empty())
            .collect()
    }

    /// 按请求顺序迭代 `(id, 掩膜)`.
    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &RegionMask)> {
        self.order.iter().map(|id| (*id, &self.masks[id]))
    }

    /// 索引中的脑区个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// 索引是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{MaskIndex, RegionMask};
    use crate::atlas::fixture::{self, *};
    use crate::{AtlasProvider, QuantError};

    #[test]
    fn test_matches_atlas_aggregate_masks() {
        let atlas = fixture::atlas();
        let index = MaskIndex::build_all(&atlas).unwrap();
        assert_eq!(index.len(), atlas.region_ids().len());
        for (id, mask) in index.iter() {
            assert_eq!(mask.as_slice(), atlas.mask(id, false).unwrap().as_slice());
        }
        assert_eq!(index.get(CB).unwrap().len(), (10 + 4) * 16);
        assert_eq!(index.get(ROOT).unwrap().len(), (6 + 5 + 14 + 6 + 10) * 16);
    }

    #[test]
    fn test_build_is_idempotent() {
        let atlas = fixture::atlas();
        let a = MaskIndex::build_all(&atlas).unwrap();
        let b = MaskIndex::build_all(&atlas).unwrap();
        assert_eq!(a.ids(), b.ids());
        for id in a.ids() {
            assert_eq!(a.get(*id), b.get(*id));
        }
    }

    #[test]
    fn test_assigned_ids_skip_empty_regions() {
        let atlas = fixture::atlas();
        let index = MaskIndex::build_all(&atlas).unwrap();
        let assigned = index.assigned_ids();
        assert!(!assigned.contains(&MY));
        assert!(!assigned.contains(&OLF));
        assert_eq!(
            assigned,
            vec![ROOT, GREY, CTX, HPF, CB, CB_A, CB_B, P, FIBER]
        );
    }

    #[test]
    fn test_unknown_region_aborts() {
        let atlas = fixture::atlas();
        let err = MaskIndex::build(&atlas, &[CTX, 31337]).unwrap_err();
        assert!(matches!(err, QuantError::UnknownRegion(31337)));
    }

    #[test]
    fn test_region_mask_slices() {
        let m = RegionMask::new(vec![(3, 0, 0), (1, 2, 2), (1, 0, 1), (3, 0, 0)]);
        assert_eq!(m.len(), 3);
        assert_eq!(m.slices().collect::<Vec<_>>(), vec![1, 3]);
    }
}
