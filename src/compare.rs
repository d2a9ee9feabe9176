//! Comparator
//!
//! Decides pass/fail between a host mirror and reference content. Four
//! modes: byte-exact, per-channel threshold, masked bytes (undefined low
//! bits excluded) and the permutation search over atomic intermediate
//! values. Diagnostics are bounded so a badly broken case reports the
//! first mismatches instead of flooding the log

use ash::vk;

use crate::format;
use crate::params::{AtomicCheck, AtomicOp};
use crate::pixels::PlanarBuffer;
use crate::reference::atomic;
use crate::reference::atomic::{Scalar, INVOCATIONS_PER_PIXEL};

use std::fmt;

/// Mismatches reported before the rest is summarized as "N+"
pub const MAX_REPORTED_ERRORS: usize = 30;

/// One reported difference
#[derive(Debug, Clone)]
pub struct Mismatch {
    pub plane: u32,
    pub coord: [u32; 3],
    pub byte_offset: usize,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "plane {} at ({}, {}, {}) offset {}: expected {}, got {}",
            self.plane,
            self.coord[0],
            self.coord[1],
            self.coord[2],
            self.byte_offset,
            self.expected,
            self.actual
        )
    }
}

/// Comparison outcome carrying bounded diagnostics
#[derive(Debug)]
pub struct CompareFailure {
    pub mismatches: Vec<Mismatch>,
    pub total: usize,
}

impl CompareFailure {
    fn push(&mut self, m: Mismatch) {
        self.total += 1;

        if self.mismatches.len() < MAX_REPORTED_ERRORS {
            self.mismatches.push(m);
        }
    }

    fn into_result(self) -> Result<(), CompareFailure> {
        if self.total == 0 {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn new() -> CompareFailure {
        CompareFailure { mismatches: Vec::new(), total: 0 }
    }
}

impl fmt::Display for CompareFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.mismatches.len();

        if self.total > shown {
            writeln!(f, "{}+ incorrect values, first {}:", shown, shown)?;
        } else {
            writeln!(f, "{} incorrect values:", self.total)?;
        }

        for m in &self.mismatches {
            writeln!(f, "  {}", m)?;
        }

        Ok(())
    }
}

impl std::error::Error for CompareFailure {}

/// Byte-for-byte comparison of two buffers
pub fn compare_bytes(actual: &[u8], expected: &[u8]) -> Result<(), CompareFailure> {
    assert_eq!(actual.len(), expected.len());

    let mut failure = CompareFailure::new();

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        if a != e {
            failure.push(Mismatch {
                plane: 0,
                coord: [0; 3],
                byte_offset: i,
                expected: format!("{:#04x}", e),
                actual: format!("{:#04x}", a),
            });
        }
    }

    failure.into_result()
}

/// Byte-for-byte comparison over every plane
pub fn compare_exact(
    actual: &PlanarBuffer,
    expected: &PlanarBuffer,
) -> Result<(), CompareFailure> {
    compare_masked_internal(actual, expected, false, None)
}

/// Masked comparison: bits the format leaves undefined never contribute
/// to failure
pub fn compare_masked(
    actual: &PlanarBuffer,
    expected: &PlanarBuffer,
) -> Result<(), CompareFailure> {
    compare_masked_internal(actual, expected, true, None)
}

/// Masked comparison with an explicit undefined-low-bit count, for copies
/// where the *source* format's undefined bits poison the destination
pub fn compare_masked_bits(
    actual: &PlanarBuffer,
    expected: &PlanarBuffer,
    dont_care_low_bits: u32,
) -> Result<(), CompareFailure> {
    compare_masked_internal(actual, expected, true, Some(dont_care_low_bits))
}

fn compare_masked_internal(
    actual: &PlanarBuffer,
    expected: &PlanarBuffer,
    masked: bool,
    override_bits: Option<u32>,
) -> Result<(), CompareFailure> {
    assert_eq!(actual.buffer_format(), expected.buffer_format());
    assert_eq!(actual.plane_count(), expected.plane_count());

    let desc = format::describe(actual.buffer_format()).expect("format outside the supported set");

    let dont_care = if masked {
        override_bits.unwrap_or(desc.dont_care_low_bits)
    } else {
        0
    };

    let mut failure = CompareFailure::new();

    for plane in 0..actual.plane_count() {
        let a_bytes = actual.plane_bytes(plane);
        let e_bytes = expected.plane_bytes(plane);

        assert_eq!(a_bytes.len(), e_bytes.len());

        for (i, (a, e)) in a_bytes.iter().zip(e_bytes.iter()).enumerate() {
            let mask = format::dont_care_byte_mask(dont_care, i);

            if (a & mask) != (e & mask) {
                failure.push(Mismatch {
                    plane,
                    coord: [0; 3],
                    byte_offset: i,
                    expected: format!("{:#04x}", e & mask),
                    actual: format!("{:#04x}", a & mask),
                });
            }
        }
    }

    failure.into_result()
}

/// Per-channel absolute difference within `threshold`
///
/// Used for rendered or float output where storage rounding is legal;
/// the thresholds come from the per-format table
pub fn compare_threshold(
    actual: &PlanarBuffer,
    expected: &PlanarBuffer,
    threshold: [f32; 4],
) -> Result<(), CompareFailure> {
    assert_eq!(actual.buffer_format(), expected.buffer_format());

    let extent = actual.extent();
    let mut failure = CompareFailure::new();

    for y in 0..extent.height {
        for x in 0..extent.width {
            let a = actual.read_rgba(x, y);
            let e = expected.read_rgba(x, y);

            let off = (a[0] - e[0]).abs() > threshold[0]
                || (a[1] - e[1]).abs() > threshold[1]
                || (a[2] - e[2]).abs() > threshold[2]
                || (a[3] - e[3]).abs() > threshold[3];

            if off {
                failure.push(Mismatch {
                    plane: 0,
                    coord: [x, y, 0],
                    byte_offset: 0,
                    expected: format!("{:?}", e),
                    actual: format!("{:?}", a),
                });
            }
        }
    }

    failure.into_result()
}

#[derive(Debug, Clone, Copy)]
enum ScalarKind {
    U32,
    I32,
    F32,
    U64,
    I64,
}

fn scalar_kind(format: vk::Format) -> ScalarKind {
    match format {
        vk::Format::R32_UINT => ScalarKind::U32,
        vk::Format::R32_SINT => ScalarKind::I32,
        vk::Format::R32_SFLOAT => ScalarKind::F32,
        vk::Format::R64_UINT => ScalarKind::U64,
        vk::Format::R64_SINT => ScalarKind::I64,
        _ => unreachable!("format does not support image atomics"),
    }
}

fn read_scalar<T: Scalar>(bytes: &[u8], float: bool) -> T {
    if float {
        let v = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        return T::from_i64(v as i64);
    }

    let v = if T::WIDE {
        i64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
    } else {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64
    };

    T::from_i64(v)
}

/// Verify an atomic dispatch result image
///
/// `result` has the logical grid extent for end-result checks and the
/// extended (×invocations) extent for intermediate-value checks
pub fn compare_atomic(
    op: AtomicOp,
    check: AtomicCheck,
    format: vk::Format,
    result: &PlanarBuffer,
    logical_grid: vk::Extent3D,
) -> Result<(), CompareFailure> {
    match scalar_kind(format) {
        ScalarKind::U32 => compare_atomic_typed::<u32>(op, check, result, logical_grid, false),
        ScalarKind::I32 => compare_atomic_typed::<i32>(op, check, result, logical_grid, false),
        ScalarKind::F32 => compare_atomic_typed::<i32>(op, check, result, logical_grid, true),
        ScalarKind::U64 => compare_atomic_typed::<u64>(op, check, result, logical_grid, false),
        ScalarKind::I64 => compare_atomic_typed::<i64>(op, check, result, logical_grid, false),
    }
}

fn compare_atomic_typed<T: Scalar>(
    op: AtomicOp,
    check: AtomicCheck,
    result: &PlanarBuffer,
    logical_grid: vk::Extent3D,
    float: bool,
) -> Result<(), CompareFailure> {
    let grid = [
        logical_grid.width as i64,
        logical_grid.height as i64,
        logical_grid.depth as i64,
    ];

    let mut failure = CompareFailure::new();

    for z in 0..logical_grid.depth {
        for y in 0..logical_grid.height {
            for x in 0..logical_grid.width {
                let pixel = [x as i64, y as i64, z as i64];

                match check {
                    AtomicCheck::EndResult => {
                        let observed: T = read_scalar(result.texel(0, x, y, z), float);

                        let ok = if op.is_order_independent() {
                            observed == atomic::end_result::<T>(op, pixel, grid)
                        } else {
                            atomic::end_result_matches_any::<T>(op, observed, pixel, grid)
                        };

                        if !ok {
                            failure.push(Mismatch {
                                plane: 0,
                                coord: [x, y, z],
                                byte_offset: 0,
                                expected: if op.is_order_independent() {
                                    format!("{:?}", atomic::end_result::<T>(op, pixel, grid))
                                } else {
                                    "any per-invocation argument".to_owned()
                                },
                                actual: format!("{:?}", observed),
                            });
                        }
                    }
                    AtomicCheck::IntermediateValues => {
                        let mut observed = [T::from_i64(0); INVOCATIONS_PER_PIXEL];

                        for (i, slot) in observed.iter_mut().enumerate() {
                            let ex = x + i as u32 * logical_grid.width;
                            *slot = read_scalar(result.texel(0, ex, y, z), float);
                        }

                        let args = atomic::pixel_arguments::<T>(op, pixel, grid);

                        if !atomic::verify_intermediates(op, &observed, &args) {
                            failure.push(Mismatch {
                                plane: 0,
                                coord: [x, y, z],
                                byte_offset: 0,
                                expected: format!("a sequential ordering of {:?}", args),
                                actual: format!("{:?}", observed),
                            });
                        }
                    }
                }
            }
        }
    }

    failure.into_result()
}
