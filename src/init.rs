use std::{cell::RefCell, rc::Rc};

use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

use crate::dtype::{dtype_of, HasDtype};
use crate::tensor::*;

thread_local! {
    pub(crate) static DEFAULT_DTYPE: RefCell<Dtype> = const {
        RefCell::new(Dtype::Float32)
    }
}

impl Default for Dtype {
    fn default() -> Self {
        DEFAULT_DTYPE.with_borrow(|dtype| *dtype)
    }
}

pub fn set_default_dtype(dtype: Dtype) {
    DEFAULT_DTYPE.with_borrow_mut(|default_dtype| *default_dtype = dtype);
}

pub struct WithDtypeGuard {
    prev: Dtype,
}

/// Sets the default dtype until the returned guard is dropped.
pub fn with_dtype(dtype: Dtype) -> WithDtypeGuard {
    WithDtypeGuard {
        prev: DEFAULT_DTYPE.with_borrow_mut(|curr| std::mem::replace(curr, dtype)),
    }
}

impl Drop for WithDtypeGuard {
    fn drop(&mut self) {
        DEFAULT_DTYPE.with_borrow_mut(|x| *x = self.prev);
    }
}

/// ```
/// assert_eq!(dwconv::init::nd_bytes_strides(&[3, 5, 7], 4), vec![140, 28, 4]);
/// ```
pub fn nd_bytes_strides(shape: &[usize], byte_stride: usize) -> Vec<usize> {
    let mut strides = Vec::with_capacity(shape.len());
    if shape.is_empty() {
        return strides;
    }

    let mut last = byte_stride;
    strides.push(last);

    for n in shape.iter().skip(1).rev() {
        last *= n;
        strides.insert(0, last);
    }

    strides
}

pub(crate) fn build_tensor(dtype: Dtype, shape: Vec<usize>, bytes: Vec<u8>) -> Tensor {
    debug_assert_eq!(
        bytes.len(),
        shape.iter().product::<usize>() * dtype.num_bytes()
    );
    Tensor {
        dtype,
        strides: nd_bytes_strides(&shape, dtype.num_bytes()),
        shape,
        byte_stride: dtype.num_bytes(),
        bytes: Rc::new(bytes),
    }
}

pub fn zeros<Shape>(shape: Shape) -> Result<Tensor, Error>
where
    Shape: Into<Vec<usize>>,
{
    let dtype: Dtype = Default::default();
    full(shape, dtype.zero())
}

pub fn full<Shape, S>(shape: Shape, value: S) -> Result<Tensor, Error>
where
    Shape: Into<Vec<usize>>,
    S: Into<Scalar>,
{
    let shape = Into::<Vec<usize>>::into(shape);
    let value = Into::<Scalar>::into(value);
    let dtype = value.dtype();
    let numel: usize = shape.iter().product();
    let num_bytes = numel * dtype.num_bytes();

    let mut buf = vec![0; num_bytes];
    for i in (0..num_bytes).step_by(dtype.num_bytes()) {
        value.store(&mut buf[i..]);
    }

    Ok(build_tensor(dtype, shape, buf))
}

pub fn sample_uniform<Shape>(shape: Shape) -> Result<Tensor, Error>
where
    Shape: Into<Vec<usize>>,
{
    sample_dist(shape, &Uniform::new(0.0f32, 1.0))
}

pub fn sample_normal<Shape>(shape: Shape) -> Result<Tensor, Error>
where
    Shape: Into<Vec<usize>>,
{
    sample_dist(shape, &StandardNormal)
}

pub fn sample_dist<Shape, D>(shape: Shape, distr: &D) -> Result<Tensor, Error>
where
    Shape: Into<Vec<usize>>,
    D: Distribution<f32>,
{
    let shape = Into::<Vec<usize>>::into(shape);
    let dtype: Dtype = Default::default();
    let numel: usize = shape.iter().product();
    let num_bytes = numel * dtype.num_bytes();

    let mut rng = rand::thread_rng();
    let mut init_buf = vec![0; num_bytes];
    for i in (0..num_bytes).step_by(dtype.num_bytes()) {
        let value = Scalar::Float32(rng.sample(distr)).to_dtype(dtype);
        value.store(&mut init_buf[i..]);
    }

    Ok(build_tensor(dtype, shape, init_buf))
}

fn slice_to_bytes<T: HasDtype>(buf: &[T]) -> Vec<u8> {
    let num_bytes = dtype_of::<T>().num_bytes();
    let mut bytes = vec![0; buf.len() * num_bytes];
    for (i, x) in buf.iter().enumerate() {
        Into::<Scalar>::into(*x).store(&mut bytes[(i * num_bytes)..]);
    }
    bytes
}

pub fn copy_slice<T, Shape>(buf: &[T], shape: Shape) -> Result<Tensor, Error>
where
    Shape: Into<Vec<usize>>,
    T: HasDtype,
{
    let shape = Into::<Vec<usize>>::into(shape);
    let numel: usize = shape.iter().product();
    if numel != buf.len() {
        return Err(Error::ShapeMismatch(format!(
            "Shape ({shape:?}) has {numel:?} elements, but found {} elements in src slice",
            buf.len()
        )));
    }
    Ok(build_tensor(dtype_of::<T>(), shape, slice_to_bytes(buf)))
}

impl Tensor {
    pub fn into_vec<T: HasDtype>(self) -> Result<Vec<T>, Error> {
        let dtype = self.dtype();
        if dtype != dtype_of::<T>() {
            return Err(Error::DtypeMismatch {
                op: "into_vec",
                expected: dtype_of::<T>(),
                got: dtype,
            });
        }
        let numel = self.numel();
        let mut out = Vec::with_capacity(numel);
        for i in 0..numel {
            let value = dtype.read(&self.bytes[i * self.byte_stride..]);
            out.push(value.into());
        }
        Ok(out)
    }
}

impl<T: HasDtype, const M: usize> From<[T; M]> for Tensor {
    fn from(value: [T; M]) -> Self {
        build_tensor(dtype_of::<T>(), vec![M], slice_to_bytes(&value))
    }
}

impl<T: HasDtype, const M: usize, const N: usize> From<[[T; N]; M]> for Tensor {
    fn from(value: [[T; N]; M]) -> Self {
        let flat: Vec<T> = value.iter().flatten().copied().collect();
        build_tensor(dtype_of::<T>(), vec![M, N], slice_to_bytes(&flat))
    }
}

impl<T: HasDtype, const M: usize, const N: usize, const O: usize> From<[[[T; O]; N]; M]>
    for Tensor
{
    fn from(value: [[[T; O]; N]; M]) -> Self {
        let flat: Vec<T> = value.iter().flatten().flatten().copied().collect();
        build_tensor(dtype_of::<T>(), vec![M, N, O], slice_to_bytes(&flat))
    }
}

impl<T: HasDtype, const M: usize, const N: usize, const O: usize, const P: usize>
    From<[[[[T; P]; O]; N]; M]> for Tensor
{
    fn from(value: [[[[T; P]; O]; N]; M]) -> Self {
        let flat: Vec<T> = value.iter().flatten().flatten().flatten().copied().collect();
        build_tensor(dtype_of::<T>(), vec![M, N, O, P], slice_to_bytes(&flat))
    }
}
