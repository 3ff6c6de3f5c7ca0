use crate::{init::build_tensor, ops::conv2d_info::effective_filter_size, ops::Size2d, tensor::*};

impl Tensor {
    /// Spreads the taps of a `[fh, fw, c, m]` filter `dilations` apart, filling the gaps
    /// with zeros.
    ///
    /// Convolving with the result and unit dilation gives the same values as convolving
    /// with the original filter and `dilations`.
    pub fn dilate_filter<D: Into<Size2d>>(self, dilations: D) -> Result<Self, Error> {
        let dilations = dilations.into();
        let [fh, fw, c, m] = match *self.shape() {
            [fh, fw, c, m] => [fh, fw, c, m],
            _ => {
                return Err(Error::ShapeMismatch(format!(
                    "dilate_filter expects a rank 4 filter, got rank {}",
                    self.num_dims()
                )))
            }
        };
        if fh == 0 || fw == 0 || dilations.height == 0 || dilations.width == 0 {
            return Err(Error::InvalidArgument(format!(
                "Can't dilate a {fh}x{fw} filter by {dilations}"
            )));
        }
        if dilations.is_unit() {
            return Ok(self);
        }

        let dtype = self.dtype;
        let out_fh = effective_filter_size(fh, dilations.height);
        let out_fw = effective_filter_size(fw, dilations.width);
        let shape = vec![out_fh, out_fw, c, m];
        let num_bytes = shape.iter().product::<usize>() * dtype.num_bytes();
        // zeroed bytes decode as +0.0 for both float dtypes
        let mut buf = vec![0u8; num_bytes];

        let dst_strides = crate::init::nd_bytes_strides(&shape, dtype.num_bytes());
        let tap_bytes = c * m * dtype.num_bytes();
        for ky in 0..fh {
            for kx in 0..fw {
                let src = ky * self.strides[0] + kx * self.strides[1];
                let dst = ky * dilations.height * dst_strides[0]
                    + kx * dilations.width * dst_strides[1];
                buf[dst..dst + tap_bytes].copy_from_slice(&self.bytes[src..src + tap_bytes]);
            }
        }

        Ok(build_tensor(dtype, shape, buf))
    }
}
