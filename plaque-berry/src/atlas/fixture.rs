//! 测试用的小型图谱与体数据.
//!
//! 体数据形状为 `(60, 4, 4)`, 每个脑区占据若干完整切片 (每切片 16 体素).
//! 原始信号只覆盖切片 `15..45`, 因此逐切片平均强度在 14/15 和 44/45 之间跳变,
//! 默认参数下边界切片集合为 `[0, 24) ∪ [34, 60)`.
//!
//! ```text
//! root (997)
//! ├── grey (8)
//! │   ├── CTX (688)            z 26..32
//! │   ├── HPF (1089)           z 50..55
//! │   ├── CB (512)
//! │   │   ├── CB_A (10)        z 10..20
//! │   │   └── CB_B (11)        z 20..24
//! │   ├── P (771)              z 34..40
//! │   ├── MY (354)             (无体素)
//! │   └── OLF (507)            (无体素)
//! └── fiber tracts (1009)      z 40..50
//! ```

use ndarray::{s, Array3};

use super::{AnnotatedAtlas, Ontology};
use crate::{RegionId, SignalVolume, VolumePair};

pub const ROOT: RegionId = 997;
pub const GREY: RegionId = 8;
pub const CTX: RegionId = 688;
pub const HPF: RegionId = 1089;
pub const CB: RegionId = 512;
pub const CB_A: RegionId = 10;
pub const CB_B: RegionId = 11;
pub const P: RegionId = 771;
pub const MY: RegionId = 354;
pub const OLF: RegionId = 507;
pub const FIBER: RegionId = 1009;

pub const SHAPE: (usize, usize, usize) = (60, 4, 4);

pub fn ontology() -> Ontology {
    Ontology::from_entries([
        (ROOT, "root", "root", None),
        (GREY, "grey", "Basic cell groups and regions", Some(ROOT)),
        (CTX, "CTX", "Cerebral cortex", Some(GREY)),
        (HPF, "HPF", "Hippocampal formation", Some(GREY)),
        (CB, "CB", "Cerebellum", Some(GREY)),
        (CB_A, "CB_A", "Cerebellum part A", Some(CB)),
        (CB_B, "CB_B", "Cerebellum part B", Some(CB)),
        (P, "P", "Pons", Some(GREY)),
        (MY, "MY", "Medulla", Some(GREY)),
        (OLF, "OLF", "Olfactory areas", Some(GREY)),
        (FIBER, "fiber tracts", "fiber tracts", Some(ROOT)),
    ])
    .unwrap()
}

pub fn annotation() -> Array3<u32> {
    let mut a = Array3::<u32>::zeros(SHAPE);
    for (id, z0, z1) in [
        (CTX, 26, 32),
        (HPF, 50, 55),
        (CB_A, 10, 20),
        (CB_B, 20, 24),
        (P, 34, 40),
        (FIBER, 40, 50),
    ] {
        a.slice_mut(s![z0..z1, .., ..]).fill(id);
    }
    a
}

pub fn atlas() -> AnnotatedAtlas {
    AnnotatedAtlas::new(ontology(), annotation())
}

/// 原始信号覆盖 `15..45`; 斑块: CTX 5 个, HPF 2 个, CB_B 8 个.
pub fn volumes() -> VolumePair {
    let mut original = Array3::<u8>::zeros(SHAPE);
    original.slice_mut(s![15..45, .., ..]).fill(1);

    let mut segmented = Array3::<u8>::zeros(SHAPE);
    // CTX: z = 26 整个切片前 5 个体素.
    segmented
        .slice_mut(s![26, .., ..])
        .iter_mut()
        .take(5)
        .for_each(|p| *p = 1);
    // HPF
    segmented[(52, 0, 0)] = 1;
    segmented[(53, 3, 3)] = 1;
    // CB_B: z = 21, 22 两个切片的第一行.
    segmented.slice_mut(s![21..23, 0, ..]).fill(1);

    VolumePair::new(
        SignalVolume::from_mask(original),
        SignalVolume::from_mask(segmented),
    )
    .unwrap()
}
