use ash::vk;

use vkverify::compare;
use vkverify::compare::MAX_REPORTED_ERRORS;
use vkverify::params::{AtomicCheck, AtomicOp};
use vkverify::pixels::PlanarBuffer;
use vkverify::reference::atomic::{fold, initial_value, pixel_arguments, INVOCATIONS_PER_PIXEL};

fn extent(width: u32, height: u32) -> vk::Extent3D {
    vk::Extent3D { width, height, depth: 1 }
}

#[test]
fn exact_mode_reports_the_first_mismatch() {
    let reference = PlanarBuffer::new_filled(vk::Format::R8G8B8A8_UINT, extent(4, 4), 21);
    let mut result = reference.clone();

    result.texel_mut(0, 2, 1, 0)[1] ^= 0xff;

    let failure = compare::compare_exact(&result, &reference).unwrap_err();

    assert_eq!(failure.total, 1);
    assert_eq!(failure.mismatches[0].byte_offset, (1 * 4 + 2) * 4 + 1);

    let text = failure.to_string();
    assert!(text.contains("expected"));
}

#[test]
fn exact_mode_bounds_its_diagnostics() {
    let reference = PlanarBuffer::new(vk::Format::R8G8B8A8_UINT, extent(8, 8));
    let mut result = reference.clone();

    for byte in result.plane_bytes_mut(0).iter_mut() {
        *byte = 0x01;
    }

    let failure = compare::compare_exact(&result, &reference).unwrap_err();

    assert_eq!(failure.total, 8 * 8 * 4);
    assert_eq!(failure.mismatches.len(), MAX_REPORTED_ERRORS);
    assert!(failure.to_string().contains("+"));
}

#[test]
fn threshold_mode_tolerates_rounding_but_not_errors() {
    let mut reference = PlanarBuffer::new(vk::Format::R8G8B8A8_UNORM, extent(2, 2));
    let mut result = PlanarBuffer::new(vk::Format::R8G8B8A8_UNORM, extent(2, 2));

    for y in 0..2 {
        for x in 0..2 {
            reference.write_rgba(x, y, [0.5, 0.5, 0.5, 1.0]);
            result.write_rgba(x, y, [0.5 + 2.0 / 255.0, 0.5, 0.5, 1.0]);
        }
    }

    let threshold = [4.0 / 255.0; 4];
    assert!(compare::compare_threshold(&result, &reference, threshold).is_ok());

    let tight = [1.0 / 255.0; 4];
    assert!(compare::compare_threshold(&result, &reference, tight).is_err());
}

#[test]
fn byte_mode_matches_plain_slices() {
    assert!(compare::compare_bytes(b"abcdef", b"abcdef").is_ok());

    let failure = compare::compare_bytes(b"abcdef", b"abcxef").unwrap_err();
    assert_eq!(failure.total, 1);
    assert_eq!(failure.mismatches[0].byte_offset, 3);
}

#[test]
fn atomic_end_mode_accepts_the_folded_value() {
    let grid = extent(2, 2);
    let op = AtomicOp::Add;

    let mut result = PlanarBuffer::new(vk::Format::R32_UINT, grid);

    for y in 0..2i64 {
        for x in 0..2i64 {
            let value = vkverify::reference::atomic::end_result::<u32>(op, [x, y, 0], [2, 2, 1]);
            result
                .texel_mut(0, x as u32, y as u32, 0)
                .copy_from_slice(&value.to_le_bytes());
        }
    }

    assert!(
        compare::compare_atomic(op, AtomicCheck::EndResult, vk::Format::R32_UINT, &result, grid)
            .is_ok()
    );

    // one wrong pixel flips the verdict
    result.texel_mut(0, 1, 1, 0).copy_from_slice(&0u32.to_le_bytes());

    let failure =
        compare::compare_atomic(op, AtomicCheck::EndResult, vk::Format::R32_UINT, &result, grid)
            .unwrap_err();

    assert_eq!(failure.total, 1);
    assert_eq!(failure.mismatches[0].coord, [1, 1, 0]);
}

#[test]
fn atomic_intermediate_mode_searches_permutations() {
    let grid = extent(2, 1);
    let extended = extent(2 * INVOCATIONS_PER_PIXEL as u32, 1);
    let op = AtomicOp::Exchange;

    let mut result = PlanarBuffer::new(vk::Format::R32_UINT, extended);

    // execute each pixel's invocations in a scrambled but valid order
    for x in 0..2i64 {
        let args = pixel_arguments::<u32>(op, [x, 0, 0], [2, 1, 1]);
        let order = [3usize, 0, 4, 1, 2];

        let mut value = initial_value::<u32>(op);

        for &i in &order {
            let ex = x as u32 + i as u32 * 2;
            result.texel_mut(0, ex, 0, 0).copy_from_slice(&value.to_le_bytes());
            value = fold(op, value, args[i]);
        }
    }

    assert!(compare::compare_atomic(
        op,
        AtomicCheck::IntermediateValues,
        vk::Format::R32_UINT,
        &result,
        grid
    )
    .is_ok());

    // a value outside every ordering fails the search
    result.texel_mut(0, 0, 0, 0).copy_from_slice(&0xfefe_fefeu32.to_le_bytes());

    assert!(compare::compare_atomic(
        op,
        AtomicCheck::IntermediateValues,
        vk::Format::R32_UINT,
        &result,
        grid
    )
    .is_err());
}

#[test]
fn atomic_64bit_values_verify_through_the_wide_path() {
    let grid = extent(2, 1);
    let op = AtomicOp::Add;

    let mut result = PlanarBuffer::new(vk::Format::R64_UINT, grid);

    for x in 0..2i64 {
        let value = vkverify::reference::atomic::end_result::<u64>(op, [x, 0, 0], [2, 1, 1]);
        result.texel_mut(0, x as u32, 0, 0).copy_from_slice(&value.to_le_bytes());
    }

    assert!(
        compare::compare_atomic(op, AtomicCheck::EndResult, vk::Format::R64_UINT, &result, grid)
            .is_ok()
    );
}
