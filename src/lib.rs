//! Depthwise 2D convolution over channel-last tensors.
//!
//! Design principles:
//! 1. Validate everything before touching numbers; a failed call allocates nothing.
//! 2. Reductions happen in the element type of the operands, in a fixed order.
//! 3. No multi thread support - every output element is an independent reduction,
//!    callers that want parallelism can shard the batch themselves.

pub mod dtype;
pub mod init;
pub mod ops;
pub mod tensor;

pub use ops::{depthwise_conv2d, Conv2dInfo, DataFormat, Padding, Size2d, TensorLike};
pub use tensor::{Dtype, Error, Scalar, Tensor};
