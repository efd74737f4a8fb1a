// Shuffle invariants for the grid generator.
// The shuffle must be a fair permutation (Fisher–Yates over PCG-32), so these
// checks run the generator across dimensions and seeds and assert the
// permutation and empty-slot invariants hold for every board produced.

use std::collections::HashSet;

use slide_fifteen::puzzle::grid::{EMPTY, Grid, MAX_DIMENSION, MIN_DIMENSION};
use slide_fifteen::puzzle::rng::Pcg32;

fn assert_permutation(grid: &Grid) {
    let count = grid.n() * grid.n();
    let values: HashSet<u8> = grid.cells().iter().copied().collect();
    assert_eq!(values.len(), count, "{}x{} board repeats a value", grid.n(), grid.n());
    for v in 0..count as u8 {
        assert!(values.contains(&v), "value {v} missing from {}x{} board", grid.n(), grid.n());
    }
}

#[test]
fn every_shuffle_is_a_permutation() {
    for n in MIN_DIMENSION..=MAX_DIMENSION {
        for seed in 0..50 {
            let grid = Grid::shuffled(n, &mut Pcg32::new(seed));
            assert_permutation(&grid);
            let (er, ec) = grid.empty_pos();
            assert_eq!(grid.value(er, ec), EMPTY, "seed {seed}: empty position drifted");
        }
    }
}

#[test]
fn ordered_boards_are_solved_for_every_dimension() {
    for n in MIN_DIMENSION..=MAX_DIMENSION {
        let grid = Grid::ordered(n);
        assert_permutation(&grid);
        assert!(grid.is_solved(), "{n}x{n} ordered board not solved");
    }
}

#[test]
fn seeds_spread_boards_apart() {
    let boards: HashSet<Vec<u8>> = (0..32)
        .map(|seed| Grid::shuffled(4, &mut Pcg32::new(seed)).cells().to_vec())
        .collect();
    assert!(
        boards.len() >= 31,
        "32 seeds produced only {} distinct boards",
        boards.len()
    );
}

// Fairness smoke test: on a 2x2 board the empty slot must reach every cell
// across seeds. A positionally biased shuffle would pin it.
#[test]
fn empty_slot_reaches_every_cell_across_seeds() {
    let mut positions = HashSet::new();
    for seed in 0..300 {
        positions.insert(Grid::shuffled(2, &mut Pcg32::new(seed)).empty_pos());
    }
    assert_eq!(positions.len(), 4, "empty slot never landed on some cell: {positions:?}");
}
