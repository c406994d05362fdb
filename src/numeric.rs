//! Element types that can be averaged.

/// Element types with a lossy conversion to `f64`.
///
/// Only buffers of these types expose `RingBuffer::average`.
pub trait Arithmetic: Copy {
    /// Converts the value to `f64`.
    fn to_f64(self) -> f64;
}

macro_rules! impl_arithmetic {
    ($($ty:ty),*) => {
        $(
            impl Arithmetic for $ty {
                #[inline(always)]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    }
}

impl_arithmetic!(i8, i16, i32, i64, i128, isize);
impl_arithmetic!(u8, u16, u32, u64, u128, usize);
impl_arithmetic!(f32, f64);
