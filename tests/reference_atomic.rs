use vkverify::params::AtomicOp;
use vkverify::reference::atomic::{
    end_result, end_result_matches_any, fold, func_argument, initial_value, pixel_arguments,
    verify_intermediates, INVOCATIONS_PER_PIXEL,
};

const GRID: [i64; 3] = [4, 4, 2];

fn all_permutations(n: usize) -> Vec<Vec<usize>> {
    fn rec(prefix: &mut Vec<usize>, left: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if left.is_empty() {
            out.push(prefix.clone());
            return;
        }

        for i in 0..left.len() {
            let v = left.remove(i);
            prefix.push(v);
            rec(prefix, left, out);
            prefix.pop();
            left.insert(i, v);
        }
    }

    let mut out = Vec::new();
    rec(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}

#[test]
fn add_end_result_is_initial_plus_all_contributions() {
    // 5 invocations contribute x^2 + y^2 + z^2 over the extended grid
    let pixel = [2i64, 1, 0];

    let args = pixel_arguments::<u32>(AtomicOp::Add, pixel, GRID);
    let expected = 18u32 + args.iter().sum::<u32>();

    assert_eq!(end_result::<u32>(AtomicOp::Add, pixel, GRID), expected);

    let args64 = pixel_arguments::<u64>(AtomicOp::Add, pixel, GRID);
    let expected64 = 0xBEFFFFFF18u64 + args64.iter().sum::<u64>();

    assert_eq!(end_result::<u64>(AtomicOp::Add, pixel, GRID), expected64);
}

#[test]
fn add_arguments_are_the_coordinate_squares() {
    // invocation i of pixel (x, y, z) runs at (x + i*W, y, z)
    let args = pixel_arguments::<u32>(AtomicOp::Add, [1, 2, 1], GRID);

    for (i, arg) in args.iter().enumerate() {
        let gx = 1 + i as i64 * GRID[0];
        assert_eq!(*arg, (gx * gx + 4 + 1) as u32);
    }
}

#[test]
fn order_independent_ops_close_over_every_permutation() {
    let ops = [
        AtomicOp::Add,
        AtomicOp::Sub,
        AtomicOp::Inc,
        AtomicOp::Dec,
        AtomicOp::Min,
        AtomicOp::Max,
        AtomicOp::And,
        AtomicOp::Or,
        AtomicOp::Xor,
    ];

    for op in ops {
        assert!(op.is_order_independent());

        let args = pixel_arguments::<i32>(op, [3, 0, 1], GRID);
        let baseline = end_result::<i32>(op, [3, 0, 1], GRID);

        for perm in all_permutations(INVOCATIONS_PER_PIXEL) {
            let mut value = initial_value::<i32>(op);

            for &i in &perm {
                value = fold(op, value, args[i]);
            }

            assert_eq!(value, baseline, "{:?} varied with ordering", op);
        }
    }
}

#[test]
fn min_max_arguments_alternate_sign() {
    let args = pixel_arguments::<i32>(AtomicOp::Min, [0, 1, 0], GRID);

    // even extended-grid x positive, odd negative
    for (i, arg) in args.iter().enumerate() {
        let gx = i as i64 * GRID[0];
        let magnitude = (gx * gx + 1) as i32;

        if gx % 2 == 0 {
            assert_eq!(*arg, magnitude);
        } else {
            assert_eq!(*arg, -magnitude);
        }
    }
}

#[test]
fn exchange_end_result_is_one_of_the_arguments() {
    let pixel = [1i64, 1, 0];
    let args = pixel_arguments::<u32>(AtomicOp::Exchange, pixel, GRID);

    for arg in args {
        assert!(end_result_matches_any::<u32>(AtomicOp::Exchange, arg, pixel, GRID));
    }

    assert!(!end_result_matches_any::<u32>(AtomicOp::Exchange, 0xdeadbeef, pixel, GRID));
}

#[test]
fn every_sequential_execution_passes_the_intermediate_check() {
    for op in [AtomicOp::Exchange, AtomicOp::CompareExchange] {
        let args = pixel_arguments::<u32>(op, [2, 3, 1], GRID);

        for perm in all_permutations(INVOCATIONS_PER_PIXEL) {
            // simulate the device executing the invocations in this order
            let mut observed = [0u32; INVOCATIONS_PER_PIXEL];
            let mut value = initial_value::<u32>(op);

            for &i in &perm {
                observed[i] = value;
                value = fold(op, value, args[i]);
            }

            assert!(
                verify_intermediates(op, &observed, &args),
                "{:?} rejected the order {:?}",
                op,
                perm
            );
        }
    }
}

#[test]
fn impossible_intermediate_values_are_rejected() {
    let op = AtomicOp::Exchange;
    let args = pixel_arguments::<u32>(op, [0, 0, 0], GRID);

    // a value no sequential execution can produce
    let observed = [0xffff_fff0u32; INVOCATIONS_PER_PIXEL];

    assert!(!verify_intermediates(op, &observed, &args));

    // exactly one observer saw the initial value twice: also impossible
    let mut value = initial_value::<u32>(op);
    let mut observed = [0u32; INVOCATIONS_PER_PIXEL];

    for (i, slot) in observed.iter_mut().enumerate() {
        *slot = value;
        value = fold(op, value, args[i]);
    }

    observed[3] = observed[0];

    assert!(!verify_intermediates(op, &observed, &args));
}

#[test]
fn compare_exchange_only_replaces_the_initial_value() {
    let initial = initial_value::<u32>(AtomicOp::CompareExchange);

    assert_eq!(fold(AtomicOp::CompareExchange, initial, 77), 77);
    assert_eq!(fold(AtomicOp::CompareExchange, 123, 77), 123);

    let initial = initial_value::<u64>(AtomicOp::CompareExchange);

    assert_eq!(initial, 0xBEFFFFFF18);
    assert_eq!(fold(AtomicOp::CompareExchange, initial, 9), 9);
}

#[test]
fn sub_initial_value_has_headroom() {
    assert_eq!(initial_value::<u32>(AtomicOp::Sub), (1 << 24) - 1);
    assert_eq!(initial_value::<i64>(AtomicOp::Dec), (1i64 << 56) - 1);
    assert_eq!(initial_value::<u32>(AtomicOp::Min), (1 << 15) - 1);
    assert_eq!(initial_value::<u32>(AtomicOp::And), (1 << 15) - 1);

    // the end result never underflows for the dispatch-sized grids
    let result = end_result::<u32>(AtomicOp::Sub, [3, 3, 1], GRID);
    assert!(result < (1 << 24));
}

#[test]
fn unsigned_wrapping_matches_device_arithmetic() {
    // odd extended-grid coordinates negate by wrapping in unsigned types
    let arg = func_argument::<u32>(AtomicOp::Min, [1, 0, 0], GRID);

    assert_eq!(arg, (1u32).wrapping_neg());
}
