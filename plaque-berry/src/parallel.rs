//! 按脑区的并行映射. 打开 `rayon` feature 时并行执行, 否则顺序执行.
//!
//! 两种实现的结果顺序都与输入顺序一致, 与完成顺序无关.

use crate::QuantResult;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        /// 对 `items` 的每个元素实施 `op`, 遇到第一个错误即返回.
        pub(crate) fn try_map<T, R, F>(items: &[T], op: F) -> QuantResult<Vec<R>>
        where
            T: Sync,
            R: Send,
            F: Fn(&T) -> QuantResult<R> + Sync + Send,
        {
            items.par_iter().map(op).collect()
        }
    } else {
        /// 对 `items` 的每个元素实施 `op`, 遇到第一个错误即返回.
        pub(crate) fn try_map<T, R, F>(items: &[T], op: F) -> QuantResult<Vec<R>>
        where
            T: Sync,
            R: Send,
            F: Fn(&T) -> QuantResult<R> + Sync + Send,
        {
            items.iter().map(op).collect()
        }
    }
}
