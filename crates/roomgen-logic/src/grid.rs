//! Occupancy grid: the 2D floor index used for overlap decisions.
//!
//! The room floor is discretized into square cells of `cell_size` meters.
//! Each cell stores the set of object IDs whose footprint covers it. Floor
//! placements normally need empty cells, but stacked objects and container
//! contents share cells with what they sit on. The grid has no notion of
//! height; vertical legality lives in [`crate::validate`].
//!
//! A footprint claims every cell it overlaps: the lower bound is
//! `floor(coord / cell_size)` and the upper bound `ceil((coord + extent) /
//! cell_size)`. Packing near cell boundaries is slightly pessimistic, overlap
//! checks never miss.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constants::{EPSILON, GRID_EPSILON};
use crate::geometry::Footprint;
use crate::object::ObjectId;

/// Column/row index of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: usize,
    pub row: usize,
}

/// Half-open cell range `[col_start, col_end) × [row_start, row_end)` in
/// signed cell units; may extend past the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellSpan {
    col_start: i64,
    row_start: i64,
    col_end: i64,
    row_end: i64,
}

/// Floor occupancy for one placement run.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cols: usize,
    rows: usize,
    cell_size: f32,
    /// Row-major, `rows * cols` entries.
    cells: Vec<Vec<ObjectId>>,
}

impl OccupancyGrid {
    /// Build an empty grid covering a `room_width × room_depth` floor.
    ///
    /// Partial cells at the far edges are dropped, matching
    /// `floor(room / cell_size)`.
    pub fn new(room_width: f32, room_depth: f32, cell_size: f32) -> Self {
        let cols = snap_floor(room_width / cell_size).max(0) as usize;
        let rows = snap_floor(room_depth / cell_size).max(0) as usize;
        Self {
            cols,
            rows,
            cell_size,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Width of the gridded floor in meters.
    pub fn extent_x(&self) -> f32 {
        self.cols as f32 * self.cell_size
    }

    /// Depth of the gridded floor in meters.
    pub fn extent_y(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Mark every in-grid cell under the rectangle as occupied by `id`.
    ///
    /// Cells outside the grid are skipped; bounds are the caller's concern.
    pub fn occupy(&mut self, x: f32, y: f32, width: f32, depth: f32, id: ObjectId) {
        let span = self.span(x, y, width, depth);
        for row in span.row_start..span.row_end {
            for col in span.col_start..span.col_end {
                if let Some(index) = self.index(col, row) {
                    let cell = &mut self.cells[index];
                    if !cell.contains(&id) {
                        cell.push(id);
                    }
                }
            }
        }
    }

    /// Remove `id` from every cell that references it.
    pub fn free(&mut self, id: ObjectId) {
        for cell in &mut self.cells {
            cell.retain(|&occupant| occupant != id);
        }
    }

    /// Can a rectangle be committed here? False when it leaves the grid or
    /// covers any non-empty cell.
    pub fn can_place(&self, x: f32, y: f32, width: f32, depth: f32) -> bool {
        self.can_place_sharing(x, y, width, depth, &[])
    }

    /// Like [`Self::can_place`], but cells held only by objects in `shared`
    /// count as free. Used for objects committed inside a floor-level
    /// container or beneath a table.
    pub fn can_place_sharing(
        &self,
        x: f32,
        y: f32,
        width: f32,
        depth: f32,
        shared: &[ObjectId],
    ) -> bool {
        let span = self.span(x, y, width, depth);
        if span.col_start < 0
            || span.row_start < 0
            || span.col_end > self.cols as i64
            || span.row_end > self.rows as i64
        {
            return false;
        }
        for row in span.row_start..span.row_end {
            for col in span.col_start..span.col_end {
                if let Some(index) = self.index(col, row) {
                    if self.cells[index].iter().any(|id| !shared.contains(id)) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Every in-grid cell covered by the footprint, occupied or not.
    pub fn covered_cells(&self, fp: &Footprint) -> Vec<Cell> {
        let span = self.span(fp.x, fp.y, fp.width, fp.depth);
        let mut out = Vec::new();
        for row in span.row_start..span.row_end {
            for col in span.col_start..span.col_end {
                if self.index(col, row).is_some() {
                    out.push(Cell {
                        col: col as usize,
                        row: row as usize,
                    });
                }
            }
        }
        out
    }

    /// Non-empty cells under the footprint. Diagnostic only.
    pub fn occupied_cells(&self, fp: &Footprint) -> Vec<Cell> {
        self.covered_cells(fp)
            .into_iter()
            .filter(|c| !self.cell(*c).is_empty())
            .collect()
    }

    /// IDs occupying any cell under the footprint.
    pub fn occupants(&self, fp: &Footprint) -> BTreeSet<ObjectId> {
        self.covered_cells(fp)
            .into_iter()
            .flat_map(|c| self.cell(c).iter().copied())
            .collect()
    }

    /// Occupants of a single cell; empty for cells outside the grid.
    pub fn cell(&self, cell: Cell) -> &[ObjectId] {
        match self.index(cell.col as i64, cell.row as i64) {
            Some(index) => &self.cells[index],
            None => &[],
        }
    }

    /// Do two footprints claim a common cell?
    pub fn collides(&self, a: &Footprint, b: &Footprint) -> bool {
        let cells_b: BTreeSet<Cell> = self.covered_cells(b).into_iter().collect();
        self.covered_cells(a).iter().any(|c| cells_b.contains(c))
    }

    /// True when the footprint covers an occupied cell and abuts the edge of
    /// the grid.
    pub fn is_touching_wall(&self, fp: &Footprint) -> bool {
        if self.occupied_cells(fp).is_empty() {
            return false;
        }
        fp.x <= EPSILON
            || fp.y <= EPSILON
            || fp.max_x() >= self.extent_x() - EPSILON
            || fp.max_y() >= self.extent_y() - EPSILON
    }

    /// World-space origin of a cell.
    pub fn cell_to_position(&self, cell: Cell) -> (f32, f32) {
        (
            cell.col as f32 * self.cell_size,
            cell.row as f32 * self.cell_size,
        )
    }

    /// Number of non-empty cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    fn span(&self, x: f32, y: f32, width: f32, depth: f32) -> CellSpan {
        CellSpan {
            col_start: snap_floor(x / self.cell_size),
            row_start: snap_floor(y / self.cell_size),
            col_end: snap_ceil((x + width) / self.cell_size),
            row_end: snap_ceil((y + depth) / self.cell_size),
        }
    }

    fn index(&self, col: i64, row: i64) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols as i64 || row >= self.rows as i64 {
            None
        } else {
            Some(row as usize * self.cols + col as usize)
        }
    }
}

fn snap_floor(v: f32) -> i64 {
    (v + GRID_EPSILON).floor() as i64
}

fn snap_ceil(v: f32) -> i64 {
    (v - GRID_EPSILON).ceil() as i64
}
