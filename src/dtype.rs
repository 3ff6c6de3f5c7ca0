#[non_exhaustive]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    Float32,
    Float64,
}

impl Dtype {
    pub fn short_name(&self) -> &str {
        match self {
            Dtype::Float32 => "f32",
            Dtype::Float64 => "f64",
        }
    }

    pub fn num_bytes(&self) -> usize {
        match self {
            Dtype::Float32 => 4,
            Dtype::Float64 => 8,
        }
    }

    pub fn read(&self, buf: &[u8]) -> Scalar {
        match self {
            Dtype::Float32 => Scalar::Float32(f32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]])),
            Dtype::Float64 => Scalar::Float64(f64::from_ne_bytes([
                buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
            ])),
        }
    }

    pub fn zero(&self) -> Scalar {
        match self {
            Dtype::Float32 => Scalar::Float32(0.0),
            Dtype::Float64 => Scalar::Float64(0.0),
        }
    }

    pub fn one(&self) -> Scalar {
        match self {
            Dtype::Float32 => Scalar::Float32(1.0),
            Dtype::Float64 => Scalar::Float64(1.0),
        }
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

#[non_exhaustive]
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub enum Scalar {
    Float32(f32),
    Float64(f64),
}

impl std::fmt::Debug for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float32(arg0) => f.write_str(&arg0.to_string()),
            Self::Float64(arg0) => f.write_str(&arg0.to_string()),
        }
    }
}

impl Scalar {
    #[inline]
    pub fn dtype(&self) -> Dtype {
        match self {
            Scalar::Float32(_) => Dtype::Float32,
            Scalar::Float64(_) => Dtype::Float64,
        }
    }

    #[inline]
    pub fn store(&self, buf: &mut [u8]) {
        match self {
            Scalar::Float32(x) => buf[..4].clone_from_slice(&x.to_ne_bytes()),
            Scalar::Float64(x) => buf[..8].clone_from_slice(&x.to_ne_bytes()),
        }
    }

    /// Casts to `dtype`. Narrowing to f32 rounds to nearest.
    pub fn to_dtype(self, dtype: Dtype) -> Self {
        match (self, dtype) {
            (Scalar::Float32(a), Dtype::Float64) => Scalar::Float64(a as f64),
            (Scalar::Float64(a), Dtype::Float32) => Scalar::Float32(a as f32),
            _ => self,
        }
    }

    #[inline(always)]
    pub fn as_f32(&self) -> f32 {
        match self {
            Self::Float32(a) => *a,
            _ => unreachable!(),
        }
    }

    #[inline(always)]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Float64(a) => *a,
            _ => unreachable!(),
        }
    }
}

macro_rules! scalar_from {
    ($src:ty, $dst:tt) => {
        impl From<Scalar> for $src {
            #[inline(always)]
            fn from(value: Scalar) -> $src {
                match value {
                    Scalar::$dst(x) => x,
                    _ => unreachable!(),
                }
            }
        }
        impl From<$src> for Scalar {
            #[inline(always)]
            fn from(value: $src) -> Self {
                Scalar::$dst(value)
            }
        }
    };
}

scalar_from!(f32, Float32);
scalar_from!(f64, Float64);

pub trait HasDtype: Copy + Into<Scalar> + From<Scalar> {
    const DTYPE: Dtype;
}

impl HasDtype for f32 {
    const DTYPE: Dtype = Dtype::Float32;
}

impl HasDtype for f64 {
    const DTYPE: Dtype = Dtype::Float64;
}

pub fn dtype_of<T: HasDtype>() -> Dtype {
    T::DTYPE
}

impl std::ops::Add<Self> for Scalar {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Scalar) -> Self::Output {
        match (self, rhs) {
            (Self::Float32(a), Self::Float32(b)) => (a + b).into(),
            (Self::Float64(a), Self::Float64(b)) => (a + b).into(),
            _ => unreachable!("Can't add {:?} to {:?}", rhs.dtype(), self.dtype()),
        }
    }
}

impl std::ops::Mul<Self> for Scalar {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Scalar) -> Self::Output {
        match (self, rhs) {
            (Self::Float32(a), Self::Float32(b)) => (a * b).into(),
            (Self::Float64(a), Self::Float64(b)) => (a * b).into(),
            _ => unreachable!("Can't multiply {:?} by {:?}", self.dtype(), rhs.dtype()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_store() {
        let mut buf = [0u8; 8];
        Scalar::Float64(-2.5).store(&mut buf);
        assert_eq!(Dtype::Float64.read(&buf), Scalar::Float64(-2.5));
        Scalar::Float32(0.125).store(&mut buf);
        assert_eq!(Dtype::Float32.read(&buf), Scalar::Float32(0.125));
    }

    #[test]
    fn test_arithmetic_keeps_width() {
        let a = Scalar::Float32(0.1);
        let b = Scalar::Float32(0.2);
        assert_eq!((a + b).dtype(), Dtype::Float32);
        assert_eq!(f32::from(a * b), 0.1f32 * 0.2f32);
    }

    #[test]
    fn test_to_dtype() {
        let x = Scalar::Float32(0.1).to_dtype(Dtype::Float64);
        assert_eq!(x.dtype(), Dtype::Float64);
        assert_eq!(x.as_f64(), 0.1f32 as f64);
        assert_eq!(x.to_dtype(Dtype::Float32).as_f32(), 0.1);
        assert_eq!(Dtype::Float64.one().to_dtype(Dtype::Float64).as_f64(), 1.0);
    }

    #[test]
    fn test_zero_and_one() {
        for dtype in [Dtype::Float32, Dtype::Float64] {
            let (zero, one) = (dtype.zero(), dtype.one());
            assert_eq!(zero.dtype(), dtype);
            assert_eq!(one * one, one);
            assert_eq!(zero + one, one);
        }
        assert_eq!(Dtype::Float32.one().as_f32(), 1.0);
    }

    #[test]
    fn test_dtype_of() {
        assert_eq!(dtype_of::<f32>(), Dtype::Float32);
        assert_eq!(dtype_of::<f64>(), Dtype::Float64);
    }
}
