//! 单只动物的逐脑区斑块定量, 结果追加到历史数据集.
//!
//! 配置文件路径取自 `$PLAQUE_CONFIG`, 缺省为 `$HOME/dataset/plaque/quantify.toml`.

mod runner;

use std::process::ExitCode;

fn main() -> ExitCode {
    utils::init_logger();
    match runner::run() {
        Ok(n) => {
            utils::sep();
            println!("Dataset now holds {n} rows");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
