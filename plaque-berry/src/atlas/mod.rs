//! 脑区图谱接口.
//!
//! 图谱负责把脑区 id 解析为名称, 父子关系以及体素掩膜. 定量流程中的每个组件都通过
//! [`AtlasProvider`] 显式接收图谱, 测试时可以替换为小型的固定图谱.

mod annotated;
mod ontology;

#[cfg(test)]
pub(crate) mod fixture;

pub use annotated::AnnotatedAtlas;
pub use ontology::Ontology;

use crate::{Idx3d, QuantResult, RegionId};

/// 分层脑区本体中的一个节点. 只读.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// 稳定的整数 id.
    pub id: RegionId,

    /// 缩写, 如 `CB`.
    pub acronym: String,

    /// 全名.
    pub name: String,

    /// 父脑区. 根脑区为 `None`.
    pub parent_id: Option<RegionId>,

    /// 子脑区, 按本体顺序排列.
    pub child_ids: Vec<RegionId>,
}

impl Region {
    /// 是否为叶脑区 (没有子脑区)?
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.child_ids.is_empty()
    }
}

/// 图谱服务.
///
/// 所有接收 id 或缩写的方法, 在无法解析时都返回解析错误
/// (见 [`crate::QuantError::is_resolution`]).
pub trait AtlasProvider: Sync {
    /// 解析脑区.
    fn resolve(&self, id: RegionId) -> QuantResult<&Region>;

    /// 获取脑区体素坐标集合, 按行优先升序排列且无重复.
    ///
    /// `direct_only` 为 `true` 时只返回直接标注为该脑区的体素,
    /// 否则包含所有后代脑区的体素.
    fn mask(&self, id: RegionId, direct_only: bool) -> QuantResult<Vec<Idx3d>>;

    /// 所有脑区 id, 按本体顺序排列.
    fn region_ids(&self) -> Vec<RegionId>;

    /// 图谱参考空间的形状 `(z, h, w)`.
    fn shape(&self) -> Idx3d;

    /// 缩写 -> id.
    fn acronym_to_id(&self, acronym: &str) -> QuantResult<RegionId>;

    /// 直接子脑区.
    fn children(&self, id: RegionId) -> QuantResult<Vec<&Region>> {
        self.resolve(id)?
            .child_ids
            .iter()
            .map(|&c| self.resolve(c))
            .collect()
    }

    /// 先序遍历的所有后代脑区, **包含自身**.
    fn descendants(&self, id: RegionId) -> QuantResult<Vec<&Region>> {
        let mut ans = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let region = self.resolve(cur)?;
            stack.extend(region.child_ids.iter().rev());
            ans.push(region);
        }
        Ok(ans)
    }

    /// id -> 缩写.
    fn id_to_acronym(&self, id: RegionId) -> QuantResult<&str> {
        Ok(self.resolve(id)?.acronym.as_str())
    }
}
