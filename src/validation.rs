//! Structural validation for built hash grids.
//!
//! Re-derives every cell assignment from the source points and checks the
//! build invariants. Useful for debugging, testing, and for catching callers
//! that mutate their point buffer without rebuilding.

use crate::{HashGrid, Point3Like};

/// Detailed validation report for a hash grid.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Number of points stored in the grid.
    pub num_points: usize,
    /// Number of points supplied for checking.
    pub num_source_points: usize,
    /// Number of physical cells.
    pub num_cells: usize,

    /// Slots whose id is out of `[0, n)`.
    pub ids_out_of_range: usize,
    /// Ids stored in more than one slot.
    pub duplicate_ids: usize,
    /// Slots whose stored cell differs from the cell recomputed from the point.
    pub cell_mismatches: usize,
    /// Adjacent slot pairs with decreasing cell id.
    pub unsorted_slots: usize,
    /// Cells whose range does not start where the previous one ended, or is inverted.
    pub broken_ranges: usize,
    /// Slots inside a cell's range that carry another cell id.
    pub misplaced_slots: usize,
    /// Sum of all range lengths (should equal `num_points`).
    pub covered_slots: usize,
}

impl ValidationReport {
    /// All build invariants hold.
    pub fn is_valid(&self) -> bool {
        self.num_points == self.num_source_points
            && self.ids_out_of_range == 0
            && self.duplicate_ids == 0
            && self.cell_mismatches == 0
            && self.unsorted_slots == 0
            && self.broken_ranges == 0
            && self.misplaced_slots == 0
            && self.covered_slots == self.num_points
    }

    /// Format a summary of any issues found.
    pub fn summary(&self) -> String {
        if self.is_valid() {
            return "Valid".to_string();
        }

        let mut issues = Vec::new();
        if self.num_points != self.num_source_points {
            issues.push(format!(
                "grid holds {} points, {} supplied",
                self.num_points, self.num_source_points
            ));
        }
        if self.ids_out_of_range > 0 {
            issues.push(format!("{} ids out of range", self.ids_out_of_range));
        }
        if self.duplicate_ids > 0 {
            issues.push(format!("{} duplicate ids", self.duplicate_ids));
        }
        if self.cell_mismatches > 0 {
            issues.push(format!("{} stale cell ids", self.cell_mismatches));
        }
        if self.unsorted_slots > 0 {
            issues.push(format!("{} unsorted slots", self.unsorted_slots));
        }
        if self.broken_ranges > 0 {
            issues.push(format!("{} broken cell ranges", self.broken_ranges));
        }
        if self.misplaced_slots > 0 {
            issues.push(format!("{} misplaced slots", self.misplaced_slots));
        }
        if self.covered_slots != self.num_points {
            issues.push(format!(
                "ranges cover {} of {} slots",
                self.covered_slots, self.num_points
            ));
        }
        issues.join(", ")
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ValidationReport {{ n={}, cells={}, {} }}",
            self.num_points,
            self.num_cells,
            self.summary()
        )
    }
}

/// Validate a grid against the points it was built from.
///
/// Checks:
/// - `point_ids` is a permutation of `0..n`
/// - each slot's cell matches the cell recomputed from its point
/// - `point_cells` is non-decreasing
/// - cell ranges are ordered, non-inverted, and partition `0..n`
/// - every slot in a cell's range carries that cell's id
pub fn validate<P: Point3Like>(grid: &HashGrid, points: &[P]) -> ValidationReport {
    let n = grid.num_points();
    let mut report = ValidationReport {
        num_points: n,
        num_source_points: points.len(),
        num_cells: grid.num_cells(),
        ..Default::default()
    };

    let mut seen = vec![false; n];
    for (slot, &id) in grid.point_ids().iter().enumerate() {
        if id < 0 || id as usize >= n {
            report.ids_out_of_range += 1;
            continue;
        }
        let id = id as usize;
        if std::mem::replace(&mut seen[id], true) {
            report.duplicate_ids += 1;
        }
        if let Some(p) = points.get(id) {
            if grid.point_cell(p) != grid.point_cells()[slot] {
                report.cell_mismatches += 1;
            }
        }
    }

    report.unsorted_slots = grid
        .point_cells()
        .windows(2)
        .filter(|w| w[0] > w[1])
        .count();

    let mut expected_start = 0i32;
    for cell in 0..grid.num_cells() {
        let start = grid.cell_starts()[cell];
        let end = grid.cell_ends()[cell];
        if start != expected_start || end < start || end as usize > n {
            report.broken_ranges += 1;
        }
        if end > start && start >= 0 && end as usize <= n {
            report.covered_slots += (end - start) as usize;
            report.misplaced_slots += grid.point_cells()[start as usize..end as usize]
                .iter()
                .filter(|&&c| c != cell as i32)
                .count();
        }
        expected_start = end;
    }

    report
}
