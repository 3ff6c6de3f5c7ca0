mod conv2d_info;
mod depthwise_conv2d;
mod dilate_filter;
mod reshape;
mod tensor_like;

pub use conv2d_info::{Conv2dInfo, DataFormat, Padding, Size2d};
pub use depthwise_conv2d::{depthwise_conv2d, DEPTHWISE_CONV2D};
pub use tensor_like::TensorLike;
