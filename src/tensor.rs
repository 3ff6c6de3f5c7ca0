use std::rc::Rc;

pub use crate::dtype::{Dtype, Scalar};

/// A dense, immutable, row-major tensor living in host memory.
///
/// Clones share the underlying buffer. Operations never write into an existing buffer,
/// they allocate the buffer of the tensor they return.
#[derive(Debug, Clone)]
pub struct Tensor {
    pub(crate) dtype: Dtype,
    pub(crate) shape: Vec<usize>,
    pub(crate) strides: Vec<usize>,
    pub(crate) byte_stride: usize,
    pub(crate) bytes: Rc<Vec<u8>>,
}

impl Tensor {
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Strides are in bytes, see [crate::init::nd_bytes_strides].
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn num_dims(&self) -> usize {
        self.shape.len()
    }

    pub fn is_same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// Reads a single element.
    pub fn get(&self, index: &[usize]) -> Result<Scalar, Error> {
        if index.len() != self.num_dims() {
            return Err(Error::InvalidArgument(format!(
                "Index {index:?} has {} dims, but tensor has shape {:?}",
                index.len(),
                self.shape
            )));
        }
        let mut offset = 0;
        for ((&i, &dim), &stride) in index.iter().zip(&self.shape).zip(&self.strides) {
            if i >= dim {
                return Err(Error::InvalidArgument(format!(
                    "Index {index:?} is out of bounds for shape {:?}",
                    self.shape
                )));
            }
            offset += i * stride;
        }
        Ok(self.dtype.read(&self.bytes[offset..]))
    }
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    ShapeMismatch(String),
    #[error("{0}")]
    UnsupportedFormat(String),
    #[error("Error in {op}: expected dtype {expected}, found {got}")]
    DtypeMismatch {
        op: &'static str,
        expected: Dtype,
        got: Dtype,
    },
}
