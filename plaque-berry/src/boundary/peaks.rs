use ndarray::ArrayView1;
use ordered_float::OrderedFloat;

/// 一维序列的局部极大值下标.
///
/// 极大值必须严格大于左右两侧的值; 若是平台 (连续相等的若干值),
/// 则取平台中点 (偏左). 首尾两个元素永远不是极大值.
pub(super) fn local_maxima(x: ArrayView1<f64>) -> Vec<usize> {
    let mut ans = Vec::new();
    if x.len() < 3 {
        return ans;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                ans.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    ans
}

/// 高度不小于 `height` 的局部极大值下标.
pub(super) fn find_peaks(x: ArrayView1<f64>, height: f64) -> Vec<usize> {
    local_maxima(x)
        .into_iter()
        .filter(|&i| x[i] >= height)
        .collect()
}

/// 第 `q` 百分位数 (`0 <= q <= 100`), 相邻秩之间线性插值. 空序列返回 `None`.
pub(super) fn percentile(x: ArrayView1<f64>, q: f64) -> Option<f64> {
    debug_assert!((0.0..=100.0).contains(&q));
    let mut sorted: Vec<OrderedFloat<f64>> = x.iter().copied().map(OrderedFloat).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_unstable();

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    let (a, b) = (sorted[lo].0, sorted[hi].0);
    Some(a + (b - a) * (rank - lo as f64))
}

#[cfg(test)]
mod tests {
    use super::{find_peaks, local_maxima, percentile};
    use ndarray::{array, Array1};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_local_maxima_basic() {
        let x = array![0.0, 2.0, 1.0, 3.0, 3.0, 3.0, 0.0, 5.0];
        // 末尾的 5.0 不是极大值; 平台 3..=5 取中点 4.
        assert_eq!(local_maxima(x.view()), vec![1, 4]);
    }

    #[test]
    fn test_plateau_at_end_is_not_peak() {
        let x = array![0.0, 1.0, 1.0, 1.0];
        assert!(local_maxima(x.view()).is_empty());
        let x = array![1.0, 1.0, 1.0];
        assert!(local_maxima(x.view()).is_empty());
    }

    #[test]
    fn test_even_plateau_midpoint_rounds_down() {
        let x = array![0.0, 2.0, 2.0, 0.0];
        assert_eq!(local_maxima(x.view()), vec![1]);
    }

    #[test]
    fn test_find_peaks_height() {
        let x = array![0.0, 2.0, 0.0, 0.5, 0.0, 3.0, 0.0];
        assert_eq!(find_peaks(x.view(), 1.0), vec![1, 5]);
        assert_eq!(find_peaks(x.view(), 0.5), vec![1, 3, 5]);
    }

    #[test]
    fn test_percentile_linear() {
        let x: Array1<f64> = (1..=5).map(f64::from).collect();
        assert!(f64_eq(percentile(x.view(), 50.0).unwrap(), 3.0));
        assert!(f64_eq(percentile(x.view(), 90.0).unwrap(), 4.6));
        assert!(f64_eq(percentile(x.view(), 100.0).unwrap(), 5.0));
        assert!(f64_eq(percentile(x.view(), 0.0).unwrap(), 1.0));
        assert_eq!(percentile(Array1::<f64>::zeros(0).view(), 90.0), None);
    }
}
