//! 运行配置与数据加载.

use plaque_berry::config::RunConfig;
use plaque_berry::{AnnotatedAtlas, QuantResult, VolumePair};
use std::env;
use std::path::{Path, PathBuf};

/// `$HOME/dataset/<it...>`. 无法确定主目录时返回 `None`.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 获取运行配置文件路径.
///
/// 1. 若环境变量 `$PLAQUE_CONFIG` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/plaque/quantify.toml`.
pub fn config_path_from_env_or_home() -> Option<PathBuf> {
    match env::var("PLAQUE_CONFIG") {
        Ok(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => home_dataset_dir_with(["plaque", "quantify.toml"]),
    }
}

/// 打开配置中的图谱.
pub fn atlas(cfg: &RunConfig) -> QuantResult<AnnotatedAtlas> {
    AnnotatedAtlas::open(&cfg.paths.ontology, &cfg.paths.annotation)
}

/// 打开配置中的两个体数据, 并按配置阈值二值化.
pub fn volumes(cfg: &RunConfig) -> QuantResult<VolumePair> {
    VolumePair::open(
        &cfg.paths.original,
        cfg.threshold.original,
        &cfg.paths.segmented,
        cfg.threshold.segmented,
    )
}
