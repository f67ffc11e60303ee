//! Integration tests for the rain field and glyph alphabet.

use std::collections::HashMap;

use matrix_silhouette::rain::{GlyphAlphabet, RainField, RainMotion};
use matrix_silhouette::vision::Grid;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_field(grid: Grid, motion: RainMotion, seed: u64) -> RainField {
    let mut rng = StdRng::seed_from_u64(seed);
    RainField::new(grid, &GlyphAlphabet::default(), motion, &mut rng)
}

#[test]
fn test_offsets_stay_in_range_over_many_ticks() {
    let grid = Grid::new(24, 80, 10);
    let mut field = seeded_field(
        grid,
        RainMotion {
            fall_speed: 2.7,
            tick_scale: 1.3,
        },
        42,
    );

    for _ in 0..10_000 {
        field.advance();
        assert!(field
            .offsets()
            .iter()
            .all(|&o| (0.0..24.0).contains(&o)));
    }
    assert_eq!(field.ticks(), 10_000);
}

#[test]
fn test_glyph_grid_never_changes() {
    let mut field = seeded_field(Grid::new(12, 20, 10), RainMotion::default(), 7);
    let before = field.glyph_grid().to_vec();
    for _ in 0..500 {
        field.advance();
    }
    assert_eq!(field.glyph_grid(), before.as_slice());
}

#[test]
fn test_every_screen_row_reads_a_valid_source_row() {
    let mut field = seeded_field(Grid::new(7, 9, 10), RainMotion::default(), 3);
    for _ in 0..200 {
        field.advance();
        for row in 0..7 {
            for col in 0..9 {
                assert!(field.source_row(row, col) < 7);
            }
        }
    }
}

#[test]
fn test_column_scrolls_cyclically() {
    // Integer steps make the scroll exact: after `rows` ticks the column is back.
    let glyphs: Vec<char> = "abcde".chars().collect();
    let mut field = RainField::from_parts(
        5,
        1,
        glyphs,
        vec![0.0],
        RainMotion {
            fall_speed: 1.0,
            tick_scale: 1.0,
        },
    )
    .unwrap();

    let column = |f: &RainField| (0..5).map(|r| f.glyph_at(r, 0)).collect::<String>();
    assert_eq!(column(&field), "abcde");
    field.advance();
    assert_eq!(column(&field), "bcdea");
    for _ in 0..4 {
        field.advance();
    }
    assert_eq!(column(&field), "abcde");
}

#[test]
fn test_fractional_step_moves_source_rows_by_at_most_one() {
    let rows = 7;
    let mut field = seeded_field(Grid::new(rows, 5, 10), RainMotion::default(), 21);
    let snapshot = |f: &RainField| {
        (0..rows)
            .flat_map(|r| (0..5).map(move |c| (r, c)))
            .map(|(r, c)| f.source_row(r, c))
            .collect::<Vec<_>>()
    };

    let mut previous = snapshot(&field);
    let mut moved = 0;
    for _ in 0..200 {
        field.advance();
        let current = snapshot(&field);
        for (&before, &after) in previous.iter().zip(&current) {
            let delta = (after + rows - before) % rows;
            assert!(delta <= 1, "source row jumped from {} to {}", before, after);
            moved += delta;
        }
        previous = current;
    }
    // 200 ticks of 0.06 rows is about 12 rows per cell.
    assert!(moved >= 11 * rows * 5 && moved <= 13 * rows * 5);
}

#[test]
fn test_zero_fall_speed_is_static() {
    let mut field = seeded_field(
        Grid::new(10, 10, 10),
        RainMotion {
            fall_speed: 0.0,
            tick_scale: 0.1,
        },
        11,
    );
    let offsets = field.offsets().to_vec();
    let shown: Vec<char> = (0..10).map(|r| field.glyph_at(r, 4)).collect();

    for _ in 0..50 {
        field.advance();
    }
    assert_eq!(field.offsets(), offsets.as_slice());
    assert_eq!((0..10).map(|r| field.glyph_at(r, 4)).collect::<Vec<_>>(), shown);
}

#[test]
fn test_same_seed_same_rain() {
    let grid = Grid::new(6, 6, 10);
    let a = seeded_field(grid, RainMotion::default(), 99);
    let b = seeded_field(grid, RainMotion::default(), 99);
    assert_eq!(a.glyph_grid(), b.glyph_grid());
    assert_eq!(a.offsets(), b.offsets());
}

#[test]
fn test_default_alphabet_favours_binary_digits() {
    let alphabet = GlyphAlphabet::default();
    assert!((alphabet.probability('1') - 22.0 / 59.0).abs() < 1e-12);
    assert!((alphabet.probability('0') - 19.0 / 59.0).abs() < 1e-12);
    assert_eq!(alphabet.probability('A'), 0.0);

    let mut rng = StdRng::seed_from_u64(1);
    let mut counts: HashMap<char, usize> = HashMap::new();
    let samples = 59_000;
    for _ in 0..samples {
        *counts.entry(alphabet.sample(&mut rng)).or_default() += 1;
    }
    let ones = counts[&'1'] as f64 / samples as f64;
    let zeros = counts[&'0'] as f64 / samples as f64;
    assert!((ones - 22.0 / 59.0).abs() < 0.02, "'1' frequency {}", ones);
    assert!((zeros - 19.0 / 59.0).abs() < 0.02, "'0' frequency {}", zeros);
    assert!(counts.keys().all(|g| alphabet.probability(*g) > 0.0));
}

#[test]
fn test_custom_alphabet_round_trips_through_display() {
    let alphabet: GlyphAlphabet = "x=3,y=1".parse().unwrap();
    assert_eq!(alphabet.to_string(), "x=3,y=1");
    assert_eq!(alphabet.len(), 2);
}
