use std::collections::HashMap;
use std::path::Path;

use itertools::Itertools;
use ndarray::Array3;
use once_cell::sync::OnceCell;

use super::{AtlasProvider, Ontology, Region};
use crate::consts::UNASSIGNED_LABEL;
use crate::data::{is_npy, read_nifti_3d};
use crate::{Idx3d, QuantResult, RegionId};

/// 基于注释体数据的图谱.
///
/// 注释体数据中每个体素保存一个脑区 id, `0` 表示未分配. 第一次查询掩膜时,
/// 会遍历整个注释体数据一次, 建立 "标签 -> 体素" 查找表, 之后的查询不再遍历.
#[derive(Debug)]
pub struct AnnotatedAtlas {
    ontology: Ontology,
    annotation: Array3<u32>,
    voxels: OnceCell<HashMap<u32, Vec<Idx3d>>>,
}

impl AnnotatedAtlas {
    /// 由本体与 `(z, h, w)` 布局的注释数组构建.
    pub fn new(ontology: Ontology, annotation: Array3<u32>) -> Self {
        Self {
            ontology,
            annotation,
            voxels: OnceCell::new(),
        }
    }

    /// 打开 `structures.json` 和注释体数据文件 (nifti 或 `u32` npy).
    pub fn open(
        structures_path: impl AsRef<Path>,
        annotation_path: impl AsRef<Path>,
    ) -> QuantResult<Self> {
        let ontology = Ontology::open_structures_json(structures_path)?;
        let path = annotation_path.as_ref();
        let annotation = if is_npy(path) {
            ndarray_npy::read_npy::<_, Array3<u32>>(path)?
        } else {
            read_nifti_3d::<u32, _>(path)?
        };
        log::debug!(
            "Loaded atlas: {} structures, annotation shape {:?}",
            ontology.len(),
            annotation.dim()
        );
        Ok(Self::new(ontology, annotation))
    }

    /// "标签 -> 体素" 查找表. 每个列表按行优先升序排列.
    fn voxels(&self) -> &HashMap<u32, Vec<Idx3d>> {
        self.voxels.get_or_init(|| {
            let mut table: HashMap<u32, Vec<Idx3d>> = HashMap::new();
            for (pos, &label) in self
                .annotation
                .indexed_iter()
                .filter(|(_, l)| **l != UNASSIGNED_LABEL)
            {
                table.entry(label).or_default().push(pos);
            }
            table
        })
    }

    fn direct(&self, id: RegionId) -> &[Idx3d] {
        self.voxels().get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl AtlasProvider for AnnotatedAtlas {
    #[inline]
    fn resolve(&self, id: RegionId) -> QuantResult<&Region> {
        self.ontology.get(id)
    }

    fn mask(&self, id: RegionId, direct_only: bool) -> QuantResult<Vec<Idx3d>> {
        if direct_only {
            self.resolve(id)?;
            return Ok(self.direct(id).to_vec());
        }
        // 每个体素只有一个标签, 各后代的直接掩膜互不相交, 归并即可保持有序.
        Ok(self
            .descendants(id)?
            .into_iter()
            .map(|r| self.direct(r.id).iter().copied())
            .kmerge()
            .collect())
    }

    fn region_ids(&self) -> Vec<RegionId> {
        self.ontology.iter().map(|r| r.id).collect()
    }

    #[inline]
    fn shape(&self) -> Idx3d {
        self.annotation.dim()
    }

    #[inline]
    fn acronym_to_id(&self, acronym: &str) -> QuantResult<RegionId> {
        self.ontology.id_of(acronym)
    }
}

#[cfg(test)]
mod tests {
    use super::AnnotatedAtlas;
    use crate::atlas::fixture;
    use crate::{AtlasProvider, QuantError};

    #[test]
    fn test_direct_and_aggregate_mask() {
        let atlas = fixture::atlas();
        let direct = atlas.mask(fixture::CB, true).unwrap();
        assert!(direct.is_empty());

        let cb = atlas.mask(fixture::CB, false).unwrap();
        let mut expected = atlas.mask(fixture::CB_A, false).unwrap();
        expected.extend(atlas.mask(fixture::CB_B, false).unwrap());
        expected.sort_unstable();
        assert_eq!(cb, expected);
        assert!(cb.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_descendants_preorder() {
        let atlas = fixture::atlas();
        let ids: Vec<_> = atlas
            .descendants(fixture::ROOT)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids.first(), Some(&fixture::ROOT));
        assert_eq!(ids.len(), atlas.region_ids().len());
        let cb = ids.iter().position(|&i| i == fixture::CB).unwrap();
        assert_eq!(ids[cb + 1], fixture::CB_A);
        assert_eq!(ids[cb + 2], fixture::CB_B);
    }

    #[test]
    fn test_lookup_errors() {
        let atlas = fixture::atlas();
        assert!(matches!(
            atlas.mask(424242, false),
            Err(QuantError::UnknownRegion(424242))
        ));
        assert_eq!(atlas.id_to_acronym(fixture::CB).unwrap(), "CB");
        assert_eq!(atlas.acronym_to_id("CTX").unwrap(), fixture::CTX);
        assert_eq!(atlas.children(fixture::CB).unwrap().len(), 2);
    }

    #[test]
    fn test_open_npy_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let structures = dir.path().join("structures.json");
        std::fs::write(
            &structures,
            r#"[
                {"id": 997, "acronym": "root", "name": "root", "structure_id_path": [997]},
                {"id": 8, "acronym": "grey", "name": "grey", "structure_id_path": [997, 8]},
                {"id": 512, "acronym": "CB", "name": "Cerebellum", "structure_id_path": [997, 8, 512]}
            ]"#,
        )
        .unwrap();
        let annotation = dir.path().join("annotation.npy");
        let mut a = ndarray::Array3::<u32>::zeros((3, 2, 2));
        a[(0, 0, 0)] = 512;
        a[(2, 1, 1)] = 512;
        a[(1, 0, 1)] = 8;
        ndarray_npy::write_npy(&annotation, &a).unwrap();

        let atlas = AnnotatedAtlas::open(&structures, &annotation).unwrap();
        assert_eq!(atlas.shape(), (3, 2, 2));
        assert_eq!(atlas.region_ids(), vec![997, 8, 512]);
        assert_eq!(atlas.mask(512, true).unwrap(), vec![(0, 0, 0), (2, 1, 1)]);
        assert_eq!(atlas.mask(8, true).unwrap(), vec![(1, 0, 1)]);
        assert_eq!(
            atlas.mask(997, false).unwrap(),
            vec![(0, 0, 0), (1, 0, 1), (2, 1, 1)]
        );
    }
}
