use binstats::{binned_medians, BinGrid, BinSpec, Histogram};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Magnitudes spanning a little beyond the grid, with the odd NaN.
fn magnitudes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(
        prop_oneof![9 => -32.0f64..-8.0, 1 => Just(f64::NAN)],
        0..=max_len,
    )
}

fn lf_grid() -> BinGrid {
    let offset = 5.0 * 0.677f64.log10();
    BinGrid::from_bounds(-30.0 + offset, -10.0 + offset, 0.5).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // --- Subvolume order does not matter ---
    #[test]
    fn accumulation_is_order_independent(a in magnitudes(200), b in magnitudes(200)) {
        let grid = lf_grid();
        let mut ab = Histogram::from_grid(&grid);
        ab.add_below(a.iter().copied(), -1.0);
        ab.add_below(b.iter().copied(), -1.0);

        let mut ba = Histogram::from_grid(&grid);
        ba.add_below(b.iter().copied(), -1.0);
        ba.add_below(a.iter().copied(), -1.0);

        prop_assert_eq!(ab.counts(), ba.counts());
    }

    // --- Merging separate histograms equals accumulating together ---
    #[test]
    fn merge_matches_joint_accumulation(a in magnitudes(200), b in magnitudes(200)) {
        let grid = lf_grid();
        let mut joint = Histogram::from_grid(&grid);
        joint.add_all(a.iter().chain(b.iter()).copied());

        let mut left = Histogram::from_grid(&grid);
        left.add_all(a.iter().copied());
        let mut right = Histogram::from_grid(&grid);
        right.add_all(b.iter().copied());
        left.merge(&right).unwrap();

        prop_assert_eq!(left.counts(), joint.counts());
        prop_assert_eq!(left.total_count(), joint.total_count());
    }

    // --- Bin count and centers follow the grid formula ---
    #[test]
    fn grid_layout(low in -50.0f64..50.0, span in 0.5f64..40.0, width in 0.05f64..2.0) {
        let spec = BinSpec::new(low, low + span, width);
        prop_assume!(spec.bin_count() >= 1);
        let grid = BinGrid::new(spec).unwrap();

        let ratio = (spec.high - spec.low) / spec.width;
        let expected = (ratio + ratio * 1e-9).floor() as usize;
        prop_assert!(expected as f64 <= ratio + 1e-6);
        prop_assert_eq!(grid.len(), expected);
        for (edge, center) in grid.edges().iter().zip(grid.centers()) {
            prop_assert!((center - (edge + width / 2.0)).abs() < 1e-12);
        }
        prop_assert_eq!(grid.histogram_edges().len(), grid.len() + 1);
    }

    // --- A bin of identical values has zero scatter ---
    #[test]
    fn constant_bin_has_no_scatter(value in -5.0f64..5.0, n in 1usize..40) {
        let grid = BinGrid::from_bounds(10.0, 15.0, 0.2).unwrap();
        let x = vec![12.05; n];
        let y = vec![value; n];
        let result = binned_medians(&x, &y, &grid, 1).unwrap();
        let bin = result.bins[10];
        prop_assert_eq!(bin.count, n);
        prop_assert_eq!(bin.median, value);
        prop_assert_eq!(bin.lower_scatter, 0.0);
        prop_assert_eq!(bin.upper_scatter, 0.0);
    }
}

#[test]
fn test_shuffled_points_give_same_medians() {
    let grid = BinGrid::from_bounds(10.0, 15.0, 0.2).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut points: Vec<(f64, f64)> = (0..500)
        .map(|_| (rng.gen_range(10.0..15.0), rng.gen_range(7.0..12.0)))
        .collect();

    let (x, y): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    let reference = binned_medians(&x, &y, &grid, 1).unwrap();

    // Reverse and interleave to change the order of every bin's members
    points.reverse();
    let half = points.len() / 2;
    let reordered: Vec<(f64, f64)> = points[half..]
        .iter()
        .zip(&points[..half])
        .flat_map(|(a, b)| [*a, *b])
        .collect();
    let (x, y): (Vec<f64>, Vec<f64>) = reordered.into_iter().unzip();
    let shuffled = binned_medians(&x, &y, &grid, 1).unwrap();

    assert_eq!(reference, shuffled);
}
