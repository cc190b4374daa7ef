//! 程序运行函数.

use std::fmt;

use plaque_berry::config::RunConfig;
use plaque_berry::pipeline::Quantifier;
use plaque_berry::{table, QuantError};
use utils::loader;

/// 运行失败原因.
#[derive(Debug)]
pub enum RunError {
    /// 找不到配置文件路径.
    NoConfig,

    /// 定量流程错误.
    Quant(QuantError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConfig => write!(f, "cannot locate config: set $PLAQUE_CONFIG"),
            Self::Quant(e) => write!(f, "{e}"),
        }
    }
}

impl From<QuantError> for RunError {
    fn from(e: QuantError) -> Self {
        Self::Quant(e)
    }
}

/// 实际运行. 返回追加后数据集的总行数.
pub fn run() -> Result<usize, RunError> {
    let path = loader::config_path_from_env_or_home().ok_or(RunError::NoConfig)?;
    log::info!("Using config {}", path.display());
    let cfg = RunConfig::open(&path)?;

    let threads = cfg.threads.unwrap_or_else(utils::cpus);
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        log::warn!("Global thread pool already initialised: {e}");
    }

    let atlas = loader::atlas(&cfg)?;
    let volumes = loader::volumes(&cfg)?;
    let rows = Quantifier::from_config(&cfg).run(&atlas, &volumes)?;

    Ok(table::append_rows(&cfg.paths.dataset, &rows)?)
}
