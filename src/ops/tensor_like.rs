use std::any::Any;

use crate::{dtype::HasDtype, tensor::*};

/// Anything an op accepts in place of a tensor argument.
///
/// `arg` and `op` only feed the error message when the value is not a tensor.
pub trait TensorLike {
    fn into_tensor(self, arg: &str, op: &str) -> Result<Tensor, Error>;
}

fn not_a_tensor(arg: &str, op: &str, got: &str) -> Error {
    Error::InvalidArgument(format!(
        "Argument '{arg}' passed to '{op}' must be a Tensor or TensorLike, but got {got}"
    ))
}

impl TensorLike for Tensor {
    fn into_tensor(self, _arg: &str, _op: &str) -> Result<Tensor, Error> {
        Ok(self)
    }
}

impl TensorLike for &Tensor {
    fn into_tensor(self, _arg: &str, _op: &str) -> Result<Tensor, Error> {
        Ok(self.clone())
    }
}

impl<T: TensorLike> TensorLike for Option<T> {
    fn into_tensor(self, arg: &str, op: &str) -> Result<Tensor, Error> {
        match self {
            Some(t) => t.into_tensor(arg, op),
            None => Err(not_a_tensor(arg, op, "'None'")),
        }
    }
}

impl TensorLike for &dyn Any {
    fn into_tensor(self, arg: &str, op: &str) -> Result<Tensor, Error> {
        match self.downcast_ref::<Tensor>() {
            Some(t) => Ok(t.clone()),
            None => Err(not_a_tensor(arg, op, "a foreign object")),
        }
    }
}

impl<T: HasDtype, const M: usize, const N: usize, const O: usize> TensorLike
    for [[[T; O]; N]; M]
{
    fn into_tensor(self, _arg: &str, _op: &str) -> Result<Tensor, Error> {
        Ok(Tensor::from(self))
    }
}

impl<T: HasDtype, const M: usize, const N: usize, const O: usize, const P: usize> TensorLike
    for [[[[T; P]; O]; N]; M]
{
    fn into_tensor(self, _arg: &str, _op: &str) -> Result<Tensor, Error> {
        Ok(Tensor::from(self))
    }
}
