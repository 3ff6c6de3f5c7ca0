use crate::{init::nd_bytes_strides, tensor::*};

impl Tensor {
    /// Tensors are always contiguous, so this only rewrites shape & strides and keeps
    /// sharing the buffer.
    pub fn reshape<Shape: Into<Vec<usize>>>(mut self, shape: Shape) -> Result<Self, Error> {
        let shape = Into::<Vec<usize>>::into(shape);
        let old_numel = self.numel();
        let new_numel: usize = shape.iter().product();
        if old_numel != new_numel {
            return Err(Error::ShapeMismatch(format!(
                "Can't reshape tensor with {old_numel} elements into a shape ({shape:?}) with {new_numel} elements."
            )));
        }
        self.strides = nd_bytes_strides(&shape, self.byte_stride);
        self.shape = shape;
        Ok(self)
    }

    /// Inserts a dimension of size 1 at `axis`.
    pub fn expand_dims(self, axis: usize) -> Result<Self, Error> {
        if axis > self.num_dims() {
            return Err(Error::InvalidArgument(format!(
                "Can't insert axis {axis} into a tensor of rank {}",
                self.num_dims()
            )));
        }
        let mut shape = self.shape.clone();
        shape.insert(axis, 1);
        self.reshape(shape)
    }

    /// Removes the size 1 dimension at `axis`.
    pub fn squeeze(self, axis: usize) -> Result<Self, Error> {
        match self.shape.get(axis) {
            Some(1) => {
                let mut shape = self.shape.clone();
                shape.remove(axis);
                self.reshape(shape)
            }
            _ => Err(Error::ShapeMismatch(format!(
                "Can't squeeze axis {axis} of shape {:?}",
                self.shape
            ))),
        }
    }
}
