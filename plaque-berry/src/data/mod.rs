use std::ops::{Add, Index, Mul};
use std::path::Path;

use ndarray::{Array1, Array3, ArrayD, ArrayView3, Axis, Ix3};
use ndarray_npy::ReadNpyError;
use nifti::{DataElement, IntoNdArray, NiftiObject, ReaderOptions};

use crate::consts::binary::{is_on, OFF, ON};
use crate::{Idx3d, QuantError, QuantResult};

/// 路径是否指向 npy 文件?
#[inline]
pub(crate) fn is_npy(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("npy"))
}

/// 将 nifti 的 `[W, H, z]` 体数据转换成标准布局的 `(z, H, W)`. 以后均按照该模式访问.
fn into_zhw<T: Clone>(data: ArrayD<T>) -> QuantResult<Array3<T>> {
    let data = data.into_dimensionality::<Ix3>()?.permuted_axes([2, 1, 0]);
    let data = if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().to_owned()
    };
    debug_assert!(data.is_standard_layout());
    Ok(data)
}

/// 读取 nifti 文件 (`.nii` 或 `.nii.gz`) 的三维体数据, 返回 `(z, h, w)` 布局的数组.
pub(crate) fn read_nifti_3d<T, P>(path: P) -> QuantResult<Array3<T>>
where
    T: DataElement + Mul<Output = T> + Add<Output = T> + Clone,
    P: AsRef<Path>,
{
    let obj = ReaderOptions::new().read_file(path.as_ref())?;
    let data = obj.into_volume().into_ndarray::<T>()?;
    into_zhw(data)
}

/// 按给定元素类型尝试读取 npy. 描述符不匹配时继续尝试下一种类型.
macro_rules! try_read_npy {
    ($path:expr, $($t:ty => $conv:expr),+ $(,)?) => {
        $(
            match ndarray_npy::read_npy::<_, Array3<$t>>($path) {
                Ok(a) => return Ok(a.mapv($conv)),
                Err(ReadNpyError::WrongDescriptor(_)) => {}
                Err(e) => return Err(e.into()),
            }
        )+
    };
}

/// 读取 npy 格式的强度体数据.
///
/// 支持 `bool`, 有符号与无符号整数, `f32` 和 `f64` 元素. npy 文件保存的已经是
/// `(z, h, w)` 布局, 不做转置.
fn read_npy_intensity(path: &Path) -> QuantResult<Array3<f32>> {
    try_read_npy!(
        path,
        bool => |p: bool| if p { 1.0 } else { 0.0 },
        u8 => f32::from,
        i8 => f32::from,
        u16 => f32::from,
        i16 => f32::from,
        u32 => |p: u32| p as f32,
        i32 => |p: i32| p as f32,
        u64 => |p: u64| p as f32,
        i64 => |p: i64| p as f32,
        f32 => |p: f32| p,
    );
    Ok(ndarray_npy::read_npy::<_, Array3<f64>>(path)?.mapv(|p| p as f32))
}

/// 体数据形状的共用属性和部分通用操作.
pub trait VolumeAttr {
    /// 获取数据形状大小 `(z, h, w)`.
    fn shape(&self) -> Idx3d;

    /// 获取扫描主轴方向的切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }
}

/// 3D 二值信号体数据. 体素值只可能是 `0` 或 `1`.
///
/// 同一次运行中存在两个实例: 原始信号 (经阈值化, 代表组织实际覆盖范围)
/// 和分割信号 (代表斑块).
#[derive(Debug, Clone)]
pub struct SignalVolume {
    data: Array3<u8>,
}

impl VolumeAttr for SignalVolume {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for SignalVolume {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl SignalVolume {
    /// 打开强度体数据并以 `threshold` 二值化: 强度严格大于 `threshold` 的体素为 `1`.
    ///
    /// 扩展名为 `.npy` 时按 npy 读取, 否则按 nifti 读取.
    pub fn open<P: AsRef<Path>>(path: P, threshold: f32) -> QuantResult<Self> {
        let path = path.as_ref();
        let intensity = if is_npy(path) {
            read_npy_intensity(path)?
        } else {
            read_nifti_3d::<f32, _>(path)?
        };
        Ok(Self::from_intensity(intensity.view(), threshold))
    }

    /// 由强度数组二值化构建.
    pub fn from_intensity(data: ArrayView3<f32>, threshold: f32) -> Self {
        Self {
            data: data.mapv(|p| if p > threshold { ON } else { OFF }),
        }
    }

    /// 由掩膜数组直接构建. 非零体素视为 `1`.
    pub fn from_mask(data: Array3<u8>) -> Self {
        let data = data.mapv(|p| if is_on(p) { ON } else { OFF });
        Self { data }
    }

    /// 有信号的体素总个数.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|p| is_on(**p)).count()
    }

    /// 由 `coords` 给出的所有体素的强度和. 对二值数据而言即有信号体素个数.
    ///
    /// 如果存在越界索引, 则程序 panic.
    pub fn sum_at(&self, coords: &[Idx3d]) -> u64 {
        coords.iter().map(|&pos| u64::from(self[pos])).sum()
    }

    /// 沿扫描主轴计算每个切片的平均强度. 返回值长度等于切片个数.
    ///
    /// 空切片 (`h * w == 0`) 的平均强度记为 `0.0`.
    pub fn slice_means(&self) -> Array1<f64> {
        self.data
            .axis_iter(Axis(0))
            .map(|s| match s.len() {
                0 => 0.0,
                n => s.iter().filter(|p| is_on(**p)).count() as f64 / n as f64,
            })
            .collect()
    }
}

/// 同一只动物的一对配准后体数据.
///
/// 两个子结构完全公开, 但只能通过 [`VolumePair::new`] 或 [`VolumePair::open`]
/// 构建, 二者保证形状一致.
#[derive(Debug, Clone)]
pub struct VolumePair {
    /// 原始信号 (阈值化后).
    pub original: SignalVolume,

    /// 分割信号.
    pub segmented: SignalVolume,
}

impl VolumePair {
    /// 组合两个体数据. 形状不一致时返回 [`QuantError::InputMismatch`].
    pub fn new(original: SignalVolume, segmented: SignalVolume) -> QuantResult<Self> {
        if original.shape() != segmented.shape() {
            return Err(QuantError::InputMismatch {
                what: "segmented volume",
                expected: original.shape(),
                found: segmented.shape(),
            });
        }
        Ok(Self {
            original,
            segmented,
        })
    }

    /// 分别打开原始信号与分割信号, 并按各自阈值二值化.
    pub fn open(
        original_path: impl AsRef<Path>,
        original_threshold: f32,
        segmented_path: impl AsRef<Path>,
        segmented_threshold: f32,
    ) -> QuantResult<Self> {
        let original = SignalVolume::open(original_path, original_threshold)?;
        let segmented = SignalVolume::open(segmented_path, segmented_threshold)?;
        log::info!(
            "Loaded volumes of shape {:?}: {} tissue voxels, {} plaque voxels",
            original.shape(),
            original.count(),
            segmented.count()
        );
        Self::new(original, segmented)
    }

    /// 公共形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.original.shape()
    }
}
