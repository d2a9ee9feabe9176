//! Atomic operation reference
//!
//! Every pixel receives [`INVOCATIONS_PER_PIXEL`] read-modify-write
//! invocations whose interleaving the device is free to choose. For
//! order-independent operations the end result is single-valued and
//! computed by folding the per-invocation arguments; for exchange and
//! compare-exchange the observed intermediate values must form *some*
//! valid sequential order, found by backtracking over the set of unused
//! invocations

use crate::params::AtomicOp;

/// Invocations contributing to each pixel
pub const INVOCATIONS_PER_PIXEL: usize = 5;

/// Integer scalar the atomic reference operates on
///
/// Float32 images verify through `i32` after casting the observed float,
/// since every argument the dispatch produces is integer-valued
pub trait Scalar: Copy + PartialEq + Ord + std::fmt::Debug {
    /// 64-bit wide variant (uses the wide initial-value table)
    const WIDE: bool;

    fn from_i64(v: i64) -> Self;
    fn to_i64(self) -> i64;
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;
    fn bit_and(self, rhs: Self) -> Self;
    fn bit_or(self, rhs: Self) -> Self;
    fn bit_xor(self, rhs: Self) -> Self;
}

macro_rules! impl_scalar {
    ($t:ty, $wide:expr) => {
        impl Scalar for $t {
            const WIDE: bool = $wide;

            fn from_i64(v: i64) -> Self {
                v as $t
            }

            fn to_i64(self) -> i64 {
                self as i64
            }

            fn wrapping_add(self, rhs: Self) -> Self {
                <$t>::wrapping_add(self, rhs)
            }

            fn wrapping_sub(self, rhs: Self) -> Self {
                <$t>::wrapping_sub(self, rhs)
            }

            fn wrapping_mul(self, rhs: Self) -> Self {
                <$t>::wrapping_mul(self, rhs)
            }

            fn bit_and(self, rhs: Self) -> Self {
                self & rhs
            }

            fn bit_or(self, rhs: Self) -> Self {
                self | rhs
            }

            fn bit_xor(self, rhs: Self) -> Self {
                self ^ rhs
            }
        }
    };
}

impl_scalar!(u32, false);
impl_scalar!(i32, false);
impl_scalar!(u64, true);
impl_scalar!(i64, true);

/// Content of the image before any invocation ran
///
/// The values are arbitrary small nonzero constants except where the
/// operation needs headroom (sub/dec) or a known bit pattern (min/and)
pub fn initial_value<T: Scalar>(op: AtomicOp) -> T {
    let v: i64 = if T::WIDE {
        match op {
            AtomicOp::Sub | AtomicOp::Dec => (1i64 << 56) - 1,
            AtomicOp::Min | AtomicOp::And => (1i64 << 47) - 1,
            _ => 0xBEFFFFFF18,
        }
    } else {
        match op {
            AtomicOp::Sub | AtomicOp::Dec => (1i64 << 24) - 1,
            AtomicOp::Min | AtomicOp::And => (1i64 << 15) - 1,
            _ => 18,
        }
    };

    T::from_i64(v)
}

/// The value compare-exchange compares against (the initial content)
fn compare_value<T: Scalar>() -> T {
    if T::WIDE {
        T::from_i64(0xBEFFFFFF18)
    } else {
        T::from_i64(18)
    }
}

/// Argument invocation `gid` passes to the atomic function
///
/// `grid` is the extended dispatch grid: the logical width times
/// [`INVOCATIONS_PER_PIXEL`] along x
pub fn func_argument<T: Scalar>(op: AtomicOp, gid: [i64; 3], grid: [i64; 3]) -> T {
    let x = T::from_i64(gid[0]);
    let y = T::from_i64(gid[1]);
    let z = T::from_i64(gid[2]);

    let squares = x
        .wrapping_mul(x)
        .wrapping_add(y.wrapping_mul(y))
        .wrapping_add(z.wrapping_mul(z));

    match op {
        AtomicOp::Add | AtomicOp::Sub | AtomicOp::And | AtomicOp::Or | AtomicOp::Xor => squares,
        AtomicOp::Inc | AtomicOp::Dec => T::from_i64(1),
        AtomicOp::Min | AtomicOp::Max => {
            // half of the arguments negated
            T::from_i64(1 - 2 * (gid[0] % 2)).wrapping_mul(squares)
        }
        AtomicOp::Exchange | AtomicOp::CompareExchange => z
            .wrapping_mul(T::from_i64(grid[0]))
            .wrapping_add(x)
            .wrapping_mul(T::from_i64(grid[1]))
            .wrapping_add(y),
    }
}

/// Result of one atomic step where `a` is the data operated on and `b` is
/// the parameter to the atomic function
pub fn fold<T: Scalar>(op: AtomicOp, a: T, b: T) -> T {
    match op {
        AtomicOp::Inc | AtomicOp::Add => a.wrapping_add(b),
        AtomicOp::Dec | AtomicOp::Sub => a.wrapping_sub(b),
        AtomicOp::Min => a.min(b),
        AtomicOp::Max => a.max(b),
        AtomicOp::And => a.bit_and(b),
        AtomicOp::Or => a.bit_or(b),
        AtomicOp::Xor => a.bit_xor(b),
        AtomicOp::Exchange => b,
        AtomicOp::CompareExchange => {
            if a == compare_value::<T>() {
                b
            } else {
                a
            }
        }
    }
}

/// Arguments of every invocation contributing to pixel (x, y, z)
///
/// Invocation i of the pixel runs at extended-grid coordinate
/// (x + i * width, y, z)
pub fn pixel_arguments<T: Scalar>(
    op: AtomicOp,
    pixel: [i64; 3],
    logical_grid: [i64; 3],
) -> [T; INVOCATIONS_PER_PIXEL] {
    let extended = [
        logical_grid[0] * INVOCATIONS_PER_PIXEL as i64,
        logical_grid[1],
        logical_grid[2],
    ];

    let mut args = [T::from_i64(0); INVOCATIONS_PER_PIXEL];

    for (i, slot) in args.iter_mut().enumerate() {
        let gid = [pixel[0] + i as i64 * logical_grid[0], pixel[1], pixel[2]];
        *slot = func_argument::<T>(op, gid, extended);
    }

    args
}

/// End result of pixel (x, y, z) for an order-independent operation
pub fn end_result<T: Scalar>(op: AtomicOp, pixel: [i64; 3], logical_grid: [i64; 3]) -> T {
    debug_assert!(op.is_order_independent());

    pixel_arguments::<T>(op, pixel, logical_grid)
        .into_iter()
        .fold(initial_value::<T>(op), |acc, arg| fold(op, acc, arg))
}

/// Check the end result of an order-dependent operation: the final value
/// must equal one of the per-invocation arguments
pub fn end_result_matches_any<T: Scalar>(
    op: AtomicOp,
    observed: T,
    pixel: [i64; 3],
    logical_grid: [i64; 3],
) -> bool {
    debug_assert!(!op.is_order_independent());

    pixel_arguments::<T>(op, pixel, logical_grid)
        .into_iter()
        .any(|arg| arg == observed)
}

/// Verify the multiset of intermediate return values observed by the
/// invocations of one pixel
///
/// True iff some permutation of the invocations reconstructs a sequential
/// execution: each invocation's observed value is the fold state right
/// before its own operation applied
pub fn verify_intermediates<T: Scalar>(
    op: AtomicOp,
    observed: &[T; INVOCATIONS_PER_PIXEL],
    args: &[T; INVOCATIONS_PER_PIXEL],
) -> bool {
    let mut used = [false; INVOCATIONS_PER_PIXEL];

    verify_recursive(op, 0, initial_value::<T>(op), &mut used, args, observed)
}

fn verify_recursive<T: Scalar>(
    op: AtomicOp,
    index: usize,
    value_so_far: T,
    used: &mut [bool; INVOCATIONS_PER_PIXEL],
    args: &[T; INVOCATIONS_PER_PIXEL],
    observed: &[T; INVOCATIONS_PER_PIXEL],
) -> bool {
    if index >= INVOCATIONS_PER_PIXEL {
        return true;
    }

    for i in 0..INVOCATIONS_PER_PIXEL {
        if !used[i] && observed[i] == value_so_far {
            used[i] = true;

            if verify_recursive(op, index + 1, fold(op, value_so_far, args[i]), used, args, observed)
            {
                return true;
            }

            used[i] = false;
        }
    }

    false
}
