use crate::{
    init::build_tensor,
    ops::{Conv2dInfo, DataFormat, Padding, Size2d, TensorLike},
    tensor::*,
};

/// Name used in error messages and logs.
pub const DEPTHWISE_CONV2D: &str = "depthwiseConv2d";

/// Depthwise 2D convolution of a channel-last input.
///
/// - `x`: `[batch, height, width, in_channels]` or `[height, width, in_channels]`
/// - `filter`: `[filter_height, filter_width, in_channels, channel_multiplier]`
/// - `dilations`: `None` is the same as `Some(1.into())`
///
/// Output channel `c * channel_multiplier + m` is input channel `c` convolved with
/// `filter[.., .., c, m]`. The output has the same rank as `x`.
///
/// Each output element sums its taps row-major over the filter window, in the dtype of
/// the operands. Taps that land in the padding contribute nothing.
pub fn depthwise_conv2d<X, F, S>(
    x: X,
    filter: F,
    strides: S,
    pad: Padding,
    data_format: DataFormat,
    dilations: Option<Size2d>,
) -> Result<Tensor, Error>
where
    X: TensorLike,
    F: TensorLike,
    S: Into<Size2d>,
{
    let op = DEPTHWISE_CONV2D;
    let x = x.into_tensor("x", op)?;
    let filter = filter.into_tensor("filter", op)?;
    if x.dtype() != filter.dtype() {
        return Err(Error::DtypeMismatch {
            op,
            expected: x.dtype(),
            got: filter.dtype(),
        });
    }

    let info = Conv2dInfo::depthwise(
        op,
        x.shape(),
        filter.shape(),
        strides.into(),
        pad,
        data_format,
        dilations.unwrap_or(Size2d::UNIT),
    )?;

    let x = if info.implicit_batch {
        x.expand_dims(0)?
    } else {
        x
    };
    let y = depthwise_kernel(&x, &filter, &info);
    if info.implicit_batch {
        y.squeeze(0)
    } else {
        Ok(y)
    }
}

impl Tensor {
    /// [depthwise_conv2d] with NHWC layout and no dilation.
    pub fn depthwise_conv2d<F, S>(self, filter: F, strides: S, pad: Padding) -> Result<Self, Error>
    where
        F: TensorLike,
        S: Into<Size2d>,
    {
        depthwise_conv2d(self, filter, strides, pad, DataFormat::Nhwc, None)
    }
}

/// `x` must be rank 4 and already validated against `info`.
fn depthwise_kernel(x: &Tensor, filter: &Tensor, info: &Conv2dInfo) -> Tensor {
    let dtype = x.dtype;
    let elem_bytes = dtype.num_bytes();
    let shape = info.out_shape().to_vec();
    let num_bytes = shape.iter().product::<usize>() * elem_bytes;

    log::trace!(
        "{DEPTHWISE_CONV2D}: {:?} x {:?} -> {shape:?} ({})",
        x.shape(),
        filter.shape(),
        dtype.short_name()
    );

    let x_buf = x.bytes.as_slice();
    let w_buf = filter.bytes.as_slice();
    let [xs_b, xs_h, xs_w, xs_c] = [x.strides[0], x.strides[1], x.strides[2], x.strides[3]];
    let [ws_h, ws_w, ws_c, ws_m] = [
        filter.strides[0],
        filter.strides[1],
        filter.strides[2],
        filter.strides[3],
    ];

    let in_height = info.in_height as isize;
    let in_width = info.in_width as isize;
    let (stride_h, stride_w) = (info.strides.height, info.strides.width);
    let (dilation_h, dilation_w) = (info.dilations.height as isize, info.dilations.width as isize);

    let mut y_buf = vec![0u8; num_bytes];
    let mut i_y = 0;
    for b in 0..info.batch {
        let x_b = b * xs_b;
        for oy in 0..info.out_height {
            let y_corner = (oy * stride_h) as isize - info.pad_top as isize;
            for ox in 0..info.out_width {
                let x_corner = (ox * stride_w) as isize - info.pad_left as isize;
                for c in 0..info.in_channels {
                    for m in 0..info.channel_multiplier {
                        let mut acc = dtype.zero();
                        for ky in 0..info.filter_height {
                            let iy = y_corner + ky as isize * dilation_h;
                            if iy < 0 || iy >= in_height {
                                continue;
                            }
                            let x_row = x_b + iy as usize * xs_h + c * xs_c;
                            let w_row = ky * ws_h + c * ws_c + m * ws_m;
                            for kx in 0..info.filter_width {
                                let ix = x_corner + kx as isize * dilation_w;
                                if ix < 0 || ix >= in_width {
                                    continue;
                                }
                                let x_i = dtype.read(&x_buf[x_row + ix as usize * xs_w..]);
                                let w_i = dtype.read(&w_buf[w_row + kx * ws_w..]);
                                acc = acc + x_i * w_i;
                            }
                        }
                        acc.store(&mut y_buf[i_y..]);
                        i_y += elem_bytes;
                    }
                }
            }
        }
    }
    debug_assert_eq!(i_y, num_bytes);

    build_tensor(dtype, shape, y_buf)
}
