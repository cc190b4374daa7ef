//! 批量定量运行依赖的通用组件.

use log::LevelFilter;
use simple_logger::SimpleLogger;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 初始化日志. 默认级别为 `Info`, 可由 `$RUST_LOG` 覆盖.
pub fn init_logger() {
    // 重复初始化时忽略错误.
    let _ = SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init();
}
