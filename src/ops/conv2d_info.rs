use std::{fmt, str::FromStr};

use crate::tensor::*;

/// A `(height, width)` pair, used for strides and dilations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size2d {
    pub height: usize,
    pub width: usize,
}

impl Size2d {
    pub const UNIT: Self = Self::new(1, 1);

    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn is_unit(&self) -> bool {
        *self == Self::UNIT
    }
}

impl From<usize> for Size2d {
    fn from(value: usize) -> Self {
        Self::new(value, value)
    }
}

impl From<(usize, usize)> for Size2d {
    fn from((height, width): (usize, usize)) -> Self {
        Self::new(height, width)
    }
}

impl From<[usize; 2]> for Size2d {
    fn from([height, width]: [usize; 2]) -> Self {
        Self::new(height, width)
    }
}

impl fmt::Display for Size2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.height, self.width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// No padding. Output spatial size is `floor((in - effective_filter) / stride) + 1`,
    /// which can be 0.
    Valid,
    /// Output spatial size is `ceil(in / stride)`. Odd total padding puts the extra
    /// row/column on the bottom/right.
    Same,
}

impl FromStr for Padding {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(Self::Valid),
            "same" => Ok(Self::Same),
            _ => Err(Error::InvalidArgument(format!(
                "Unknown padding parameter: {s}"
            ))),
        }
    }
}

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Valid => "valid",
            Self::Same => "same",
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// `[batch, height, width, channels]`
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]`. Parses, but no op accepts it.
    Nchw,
}

impl FromStr for DataFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NHWC" => Ok(Self::Nhwc),
            "NCHW" => Ok(Self::Nchw),
            _ => Err(Error::UnsupportedFormat(format!("Unknown dataFormat {s}"))),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nhwc => "NHWC",
            Self::Nchw => "NCHW",
        })
    }
}

/// Resolved geometry of a depthwise convolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conv2dInfo {
    /// The input was `[h, w, c]` and is treated as `[1, h, w, c]`.
    pub implicit_batch: bool,
    pub batch: usize,
    pub in_height: usize,
    pub in_width: usize,
    pub in_channels: usize,
    pub channel_multiplier: usize,
    pub out_channels: usize,
    pub filter_height: usize,
    pub filter_width: usize,
    pub effective_filter_height: usize,
    pub effective_filter_width: usize,
    pub strides: Size2d,
    pub dilations: Size2d,
    pub pad_top: usize,
    pub pad_bottom: usize,
    pub pad_left: usize,
    pub pad_right: usize,
    pub out_height: usize,
    pub out_width: usize,
}

struct AxisGeometry {
    effective_filter: usize,
    out: usize,
    pad_before: usize,
    pad_after: usize,
}

/// `f + (f - 1) * (d - 1)`, the extent of a filter with `d - 1` gaps between taps.
#[inline]
pub(crate) fn effective_filter_size(filter: usize, dilation: usize) -> usize {
    filter + (filter - 1) * (dilation - 1)
}

fn resolve_axis(
    op: &str,
    axis: &str,
    in_size: usize,
    filter: usize,
    stride: usize,
    dilation: usize,
    pad: Padding,
) -> Result<AxisGeometry, Error> {
    let effective_filter = effective_filter_size(filter, dilation);
    match pad {
        Padding::Valid => {
            // floor((in - eff) / stride) + 1, which is 0 for a window just past the edge
            let reach = in_size as isize - effective_filter as isize;
            let out = reach.div_euclid(stride as isize) + 1;
            if out < 0 {
                return Err(Error::InvalidArgument(format!(
                    "Error in {op}: effective filter {axis} ({effective_filter}) does not fit input {axis} ({in_size}) with stride {stride} and 'valid' padding."
                )));
            }
            Ok(AxisGeometry {
                effective_filter,
                out: out as usize,
                pad_before: 0,
                pad_after: 0,
            })
        }
        Padding::Same => {
            let out = in_size.div_ceil(stride);
            let total = if out > 0 {
                ((out - 1) * stride + effective_filter).saturating_sub(in_size)
            } else {
                0
            };
            let pad_before = total / 2;
            Ok(AxisGeometry {
                effective_filter,
                out,
                pad_before,
                pad_after: total - pad_before,
            })
        }
    }
}

impl Conv2dInfo {
    /// Validates a depthwise convolution and computes its output geometry.
    ///
    /// `x_shape` is `[batch, height, width, channels]` or `[height, width, channels]`,
    /// `filter_shape` is `[filter_height, filter_width, in_channels, channel_multiplier]`.
    pub fn depthwise(
        op: &str,
        x_shape: &[usize],
        filter_shape: &[usize],
        strides: Size2d,
        pad: Padding,
        data_format: DataFormat,
        dilations: Size2d,
    ) -> Result<Self, Error> {
        let (implicit_batch, [batch, in_height, in_width, in_channels]) = match *x_shape {
            [b, h, w, c] => (false, [b, h, w, c]),
            [h, w, c] => (true, [1, h, w, c]),
            _ => {
                return Err(Error::ShapeMismatch(format!(
                    "Error in {op}: input must be rank 3 or 4, but got rank {}.",
                    x_shape.len()
                )))
            }
        };
        let [filter_height, filter_width, filter_in_channels, channel_multiplier] =
            match *filter_shape {
                [fh, fw, fc, m] => [fh, fw, fc, m],
                _ => {
                    return Err(Error::ShapeMismatch(format!(
                        "Error in {op}: filter must be rank 4, but got rank {}.",
                        filter_shape.len()
                    )))
                }
            };
        if filter_in_channels != in_channels {
            return Err(Error::ShapeMismatch(format!(
                "Error in {op}: number of input channels ({in_channels}) must match the inChannels dimension in filter {filter_in_channels}."
            )));
        }
        if filter_height == 0 || filter_width == 0 {
            return Err(Error::InvalidArgument(format!(
                "Error in {op}: filter spatial dimensions must be positive, got {filter_height}x{filter_width}."
            )));
        }
        if strides.height == 0 || strides.width == 0 {
            return Err(Error::InvalidArgument(format!(
                "Error in {op}: strides must be positive, got {strides}."
            )));
        }
        if dilations.height == 0 || dilations.width == 0 {
            return Err(Error::InvalidArgument(format!(
                "Error in {op}: dilations must be positive, got {dilations}."
            )));
        }
        if !strides.is_unit() && !dilations.is_unit() {
            return Err(Error::InvalidArgument(format!(
                "Error in {op}: Either strides or dilations must be 1. Got strides {strides} and dilations '{dilations}'"
            )));
        }
        if data_format != DataFormat::Nhwc {
            return Err(Error::UnsupportedFormat(format!(
                "Error in {op}: unsupported data format {data_format}, only NHWC is supported."
            )));
        }

        let rows = resolve_axis(
            op,
            "height",
            in_height,
            filter_height,
            strides.height,
            dilations.height,
            pad,
        )?;
        let cols = resolve_axis(
            op,
            "width",
            in_width,
            filter_width,
            strides.width,
            dilations.width,
            pad,
        )?;

        let info = Self {
            implicit_batch,
            batch,
            in_height,
            in_width,
            in_channels,
            channel_multiplier,
            out_channels: in_channels * channel_multiplier,
            filter_height,
            filter_width,
            effective_filter_height: rows.effective_filter,
            effective_filter_width: cols.effective_filter,
            strides,
            dilations,
            pad_top: rows.pad_before,
            pad_bottom: rows.pad_after,
            pad_left: cols.pad_before,
            pad_right: cols.pad_after,
            out_height: rows.out,
            out_width: cols.out,
        };
        log::debug!(
            "{op}: in={:?} filter={:?} pad={pad} strides={strides} dilations={dilations} -> out={:?} pads=(t{} b{} l{} r{})",
            x_shape,
            filter_shape,
            info.out_shape(),
            info.pad_top,
            info.pad_bottom,
            info.pad_left,
            info.pad_right,
        );
        Ok(info)
    }

    /// Rank-4 output shape, `[batch, out_height, out_width, out_channels]`.
    pub fn out_shape(&self) -> [usize; 4] {
        [self.batch, self.out_height, self.out_width, self.out_channels]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OP: &str = "depthwiseConv2d";

    fn info(
        x: &[usize],
        f: &[usize],
        strides: usize,
        pad: Padding,
        dilations: usize,
    ) -> Result<Conv2dInfo, Error> {
        Conv2dInfo::depthwise(
            OP,
            x,
            f,
            strides.into(),
            pad,
            DataFormat::Nhwc,
            dilations.into(),
        )
    }

    #[test]
    fn test_valid_shape() -> Result<(), Error> {
        let i = info(&[1, 3, 3, 1], &[2, 2, 1, 1], 1, Padding::Valid, 1)?;
        assert_eq!(i.out_shape(), [1, 2, 2, 1]);
        assert_eq!((i.pad_top, i.pad_left), (0, 0));

        let i = info(&[2, 7, 9, 3], &[3, 2, 3, 4], 2, Padding::Valid, 1)?;
        assert_eq!(i.out_shape(), [2, 3, 4, 12]);
        Ok(())
    }

    #[test]
    fn test_same_shape() -> Result<(), Error> {
        let i = info(&[1, 3, 3, 2], &[2, 2, 2, 2], 1, Padding::Same, 1)?;
        assert_eq!(i.out_shape(), [1, 3, 3, 4]);
        assert_eq!(i.channel_multiplier, 2);

        let i = info(&[1, 5, 6, 1], &[3, 3, 1, 1], 2, Padding::Same, 1)?;
        assert_eq!((i.out_height, i.out_width), (3, 3));
        Ok(())
    }

    #[test]
    fn test_same_padding_favors_trailing_edge() -> Result<(), Error> {
        // total padding of 1 goes entirely to the bottom/right
        let i = info(&[1, 4, 4, 1], &[2, 2, 1, 1], 1, Padding::Same, 1)?;
        assert_eq!((i.pad_top, i.pad_bottom), (0, 1));
        assert_eq!((i.pad_left, i.pad_right), (0, 1));

        // (3 - 1) * 2 + 3 - 5 = 2
        let i = info(&[1, 5, 5, 1], &[3, 3, 1, 1], 2, Padding::Same, 1)?;
        assert_eq!((i.pad_top, i.pad_bottom), (1, 1));

        // (3 - 1) * 2 + 4 - 6 = 2
        let i = info(&[1, 6, 6, 1], &[4, 4, 1, 1], 2, Padding::Same, 1)?;
        assert_eq!((i.pad_top, i.pad_bottom), (1, 1));

        // (3 - 1) * 1 + 4 - 3 = 3
        let i = info(&[1, 3, 3, 1], &[4, 4, 1, 1], 1, Padding::Same, 1)?;
        assert_eq!((i.pad_top, i.pad_bottom), (1, 2));
        Ok(())
    }

    #[test]
    fn test_dilation_widens_filter() -> Result<(), Error> {
        let i = info(&[1, 3, 3, 1], &[2, 2, 1, 1], 1, Padding::Valid, 2)?;
        assert_eq!(
            (i.effective_filter_height, i.effective_filter_width),
            (3, 3)
        );
        assert_eq!(i.out_shape(), [1, 1, 1, 1]);

        let i = info(&[1, 3, 3, 2], &[2, 2, 2, 1], 1, Padding::Same, 2)?;
        assert_eq!(i.out_shape(), [1, 3, 3, 2]);
        assert_eq!((i.pad_top, i.pad_bottom), (1, 1));

        let i = Conv2dInfo::depthwise(
            OP,
            &[1, 10, 10, 1],
            &[3, 3, 1, 1],
            Size2d::UNIT,
            Padding::Valid,
            DataFormat::Nhwc,
            (3, 1).into(),
        )?;
        assert_eq!(
            (i.effective_filter_height, i.effective_filter_width),
            (7, 3)
        );
        assert_eq!((i.out_height, i.out_width), (4, 8));
        Ok(())
    }

    #[test]
    fn test_rank3_gets_implicit_batch() -> Result<(), Error> {
        let i = info(&[3, 3, 2], &[2, 2, 2, 3], 1, Padding::Same, 1)?;
        assert!(i.implicit_batch);
        assert_eq!(i.out_shape(), [1, 3, 3, 6]);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_ranks() {
        let err = info(&[3, 3], &[2, 2, 1, 1], 1, Padding::Valid, 1).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
        assert!(err.to_string().contains("rank 3 or 4, but got rank 2"));
        assert!(matches!(
            info(&[1, 3, 3, 1], &[2, 2, 1], 1, Padding::Valid, 1),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_channel_mismatch() {
        let err = info(&[1, 3, 3, 2], &[2, 2, 3, 1], 1, Padding::Same, 1).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
        assert!(err.to_string().contains("number of input channels (2)"));
    }

    #[test]
    fn test_rejects_stride_and_dilation() {
        let err = info(&[1, 5, 5, 1], &[2, 2, 1, 1], 2, Padding::Same, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("Either strides or dilations must be 1"));

        // a non-unit axis on each side still counts
        let err = Conv2dInfo::depthwise(
            OP,
            &[1, 5, 5, 1],
            &[2, 2, 1, 1],
            (1, 2).into(),
            Padding::Same,
            DataFormat::Nhwc,
            (2, 1).into(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_zero_stride_and_dilation() {
        assert!(matches!(
            info(&[1, 5, 5, 1], &[2, 2, 1, 1], 0, Padding::Same, 1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            info(&[1, 5, 5, 1], &[2, 2, 1, 1], 1, Padding::Same, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_valid_window_past_input() -> Result<(), Error> {
        // one row/column short gives an empty output
        let i = info(&[1, 2, 2, 1], &[3, 3, 1, 1], 1, Padding::Valid, 1)?;
        assert_eq!(i.out_shape(), [1, 0, 0, 1]);

        // floor((1 - 3) / 2) + 1 = 0
        let i = info(&[1, 1, 1, 1], &[3, 3, 1, 1], 2, Padding::Valid, 1)?;
        assert_eq!((i.out_height, i.out_width), (0, 0));

        // two short with unit stride is negative
        let err = info(&[1, 1, 4, 1], &[3, 3, 1, 1], 1, Padding::Valid, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("effective filter height (3)"));

        // fine once padded
        assert!(info(&[1, 2, 2, 1], &[3, 3, 1, 1], 1, Padding::Same, 1).is_ok());
        Ok(())
    }

    #[test]
    fn test_rejects_nchw() {
        let err = Conv2dInfo::depthwise(
            OP,
            &[1, 3, 3, 1],
            &[2, 2, 1, 1],
            Size2d::UNIT,
            Padding::Valid,
            DataFormat::Nchw,
            Size2d::UNIT,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_parse_params() -> Result<(), Error> {
        assert_eq!("valid".parse::<Padding>()?, Padding::Valid);
        assert_eq!("same".parse::<Padding>()?, Padding::Same);
        assert!(matches!(
            "full".parse::<Padding>(),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!("NHWC".parse::<DataFormat>()?, DataFormat::Nhwc);
        assert_eq!("NCHW".parse::<DataFormat>()?, DataFormat::Nchw);
        assert!(matches!(
            "HWCN".parse::<DataFormat>(),
            Err(Error::UnsupportedFormat(_))
        ));
        assert_eq!(Size2d::from(2), Size2d::new(2, 2));
        assert_eq!(Size2d::from([1, 3]), Size2d::new(1, 3));
        Ok(())
    }
}
