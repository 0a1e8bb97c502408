//! Pure coordinate orderings, relative to the selection center.
//!
//! Both orderings visit every offset at most once and never emit an offset the
//! shape's inclusion test rejects.

use crate::selection::{Coord, Pattern, Shape};

/// Offsets for `pattern` over a shape of the given radius.
pub fn offsets(pattern: Pattern, shape: Shape, radius: i32) -> Vec<Coord> {
    match pattern {
        Pattern::Spiral => spiral(shape, radius),
        Pattern::Concentric => concentric(shape, radius),
    }
}

/// Square spiral walked outward from the center, filtered by the shape.
///
/// The walk is bounded to `(2r+1)²` steps, which covers exactly the square of
/// side `2r+1`, so each candidate is visited once.
pub fn spiral(shape: Shape, radius: i32) -> Vec<Coord> {
    if radius < 0 {
        return Vec::new();
    }
    let side = 2 * radius as i64 + 1;
    let steps = side * side;
    let mut out = Vec::with_capacity(steps as usize);
    let (mut x, mut z) = (0i32, 0i32);
    let (mut dx, mut dz) = (0i32, -1i32);

    for _ in 0..steps {
        if shape.contains(x, z, radius) {
            out.push(Coord::new(x, z));
        }
        if x == z || (x < 0 && x == -z) || (x > 0 && x == 1 - z) {
            (dx, dz) = (-dz, dx);
        }
        x += dx;
        z += dz;
    }
    out
}

/// Square rings of increasing radius, nearest ring first.
///
/// Each ring is walked along its edges, column by column from `x = -r`: the
/// full left column, the top and bottom cells of the inner columns, then the
/// full right column.
pub fn concentric(shape: Shape, radius: i32) -> Vec<Coord> {
    if radius < 0 {
        return Vec::new();
    }
    let side = 2 * radius as usize + 1;
    let mut out = Vec::with_capacity(side * side);
    let mut push = |x: i32, z: i32| {
        if shape.contains(x, z, radius) {
            out.push(Coord::new(x, z));
        }
    };
    push(0, 0);
    for r in 1..=radius {
        for z in -r..=r {
            push(-r, z);
        }
        for x in (1 - r)..r {
            push(x, -r);
            push(x, r);
        }
        for z in -r..=r {
            push(r, z);
        }
    }
    out
}

/// Chebyshev ring index of an offset.
pub fn ring(c: Coord) -> i32 {
    c.x.abs().max(c.z.abs())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn circle_cells(r: i32) -> HashSet<Coord> {
        let mut set = HashSet::new();
        for x in -r..=r {
            for z in -r..=r {
                if x * x + z * z <= r * r {
                    set.insert(Coord::new(x, z));
                }
            }
        }
        set
    }

    #[test]
    fn square_counts_and_bounds() {
        for r in 1..=12 {
            for pattern in [Pattern::Spiral, Pattern::Concentric] {
                let cells = offsets(pattern, Shape::Square, r);
                let unique: HashSet<_> = cells.iter().copied().collect();
                let side = (2 * r + 1) as usize;
                assert_eq!(cells.len(), side * side, "{pattern} r={r}");
                assert_eq!(unique.len(), cells.len(), "{pattern} r={r} duplicates");
                assert!(cells.iter().all(|c| c.x.abs() <= r && c.z.abs() <= r));
            }
        }
    }

    #[test]
    fn circle_enumerates_exactly_the_disc() {
        for r in 1..=12 {
            let expected = circle_cells(r);
            for pattern in [Pattern::Spiral, Pattern::Concentric] {
                let cells = offsets(pattern, Shape::Circle, r);
                let unique: HashSet<_> = cells.iter().copied().collect();
                assert_eq!(unique.len(), cells.len(), "{pattern} r={r} duplicates");
                assert_eq!(unique, expected, "{pattern} r={r}");
            }
        }
    }

    #[test]
    fn circle_small_radius_counts() {
        assert_eq!(spiral(Shape::Circle, 1).len(), 5);
        assert_eq!(spiral(Shape::Circle, 2).len(), 13);
        assert_eq!(concentric(Shape::Circle, 3).len(), 29);
    }

    #[test]
    fn concentric_rings_are_nearest_first() {
        for shape in [Shape::Square, Shape::Circle] {
            let cells = concentric(shape, 6);
            let rings: Vec<i32> = cells.iter().map(|c| ring(*c)).collect();
            assert!(rings.windows(2).all(|w| w[0] <= w[1]), "{shape}");
            assert_eq!(rings[0], 0);
        }
    }

    #[test]
    fn concentric_matches_full_ring_scan_order() {
        for shape in [Shape::Square, Shape::Circle] {
            for radius in 0i32..=9 {
                let mut expected = Vec::new();
                for r in 0..=radius {
                    for x in -r..=r {
                        for z in -r..=r {
                            if (x.abs() == r || z.abs() == r) && shape.contains(x, z, radius) {
                                expected.push(Coord::new(x, z));
                            }
                        }
                    }
                }
                assert_eq!(concentric(shape, radius), expected, "{shape} r={radius}");
            }
        }
    }

    #[test]
    fn concentric_covers_large_radius() {
        let cells = concentric(Shape::Square, 600);
        assert_eq!(cells.len(), 1201 * 1201);
        assert_eq!(ring(cells[cells.len() - 1]), 600);
    }

    #[test]
    fn spiral_starts_at_center_and_walks_first_ring() {
        let cells = spiral(Shape::Square, 1);
        assert_eq!(cells[0], Coord::new(0, 0));
        assert!(cells[1..].iter().all(|c| ring(*c) == 1));
        assert_eq!(cells[1], Coord::new(1, 0));
    }

    #[test]
    fn spiral_square_visits_rings_in_order() {
        let cells = spiral(Shape::Square, 5);
        let rings: Vec<i32> = cells.iter().map(|c| ring(*c)).collect();
        assert!(rings.windows(2).all(|w| w[0] <= w[1]));
    }
}
