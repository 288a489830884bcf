// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A regular 3D grid of precomputed values.
//!
//! Integrators whose per-point quantity is an expensive energy integral fill a
//! [`CacheTable`] once per skymap parameter and then interpolate it for every
//! point of every line of sight.
//!
//! Cell `(ix, iy, iz)` sits at `origin + (ix·dx, iy·dy, iz·dz)`. Values are
//! stored with shape `(nz, ny, nx)` in standard layout, so the flat index of a
//! cell is `(iz·ny + iy)·nx + ix`.
//!
//! Interpolation outside the grid clamps to the edge: a position beyond a face
//! gets the value of the nearest point on that face.

mod error;

pub use error::CacheTableError;

use ndarray::prelude::*;

use crate::coord::Position;

#[derive(Debug, Clone)]
pub struct CacheTable {
    origin: Position,
    spacing: Position,
    /// `[nx, ny, nz]`
    dims: [usize; 3],
    values: Array3<f64>,
}

impl CacheTable {
    /// Make a new table with every cell set to zero.
    pub fn new(
        origin: Position,
        dims: [usize; 3],
        spacing: Position,
    ) -> Result<CacheTable, CacheTableError> {
        let [nx, ny, nz] = dims;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(CacheTableError::ZeroDimension { nx, ny, nz });
        }
        if spacing.iter().any(|&s| !(s > 0.0 && s.is_finite())) {
            return Err(CacheTableError::NonPositiveSpacing {
                x: spacing.x,
                y: spacing.y,
                z: spacing.z,
            });
        }
        if origin.iter().any(|o| !o.is_finite()) {
            return Err(CacheTableError::NonFiniteOrigin {
                x: origin.x,
                y: origin.y,
                z: origin.z,
            });
        }

        Ok(CacheTable {
            origin,
            spacing,
            dims,
            values: Array3::zeros((nz, ny, nx)),
        })
    }

    /// A table covering the box `[-r, r) x [-r, r) x [-z, z)` with `nx`, `ny`
    /// and `nz` cells along each axis.
    pub fn symmetric(
        nx: usize,
        ny: usize,
        nz: usize,
        half_extent_xy: f64,
        half_extent_z: f64,
    ) -> Result<CacheTable, CacheTableError> {
        // Avoid dividing by zero before the dimensions are validated.
        let step = |extent: f64, n: usize| 2.0 * extent / n.max(1) as f64;
        CacheTable::new(
            Position::new(-half_extent_xy, -half_extent_xy, -half_extent_z),
            [nx, ny, nz],
            Position::new(
                step(half_extent_xy, nx),
                step(half_extent_xy, ny),
                step(half_extent_z, nz),
            ),
        )
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    pub fn spacing(&self) -> Position {
        self.spacing
    }

    /// `[nx, ny, nz]`
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// The total number of cells (`nx·ny·nz`).
    pub fn grid_size(&self) -> usize {
        self.values.len()
    }

    fn flat_index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        let [nx, ny, _] = self.dims;
        (iz * ny + iy) * nx + ix
    }

    fn split_index(&self, index: usize) -> [usize; 3] {
        let [nx, ny, _] = self.dims;
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    /// The position of the cell with flat index `index`. The index is not
    /// range-checked; out-of-range indices give positions outside the grid.
    pub fn position_from_index(&self, index: usize) -> Position {
        let [ix, iy, iz] = self.split_index(index);
        self.origin
            + Position::new(
                ix as f64 * self.spacing.x,
                iy as f64 * self.spacing.y,
                iz as f64 * self.spacing.z,
            )
    }

    /// Positions of every cell, in flat-index order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.grid_size()).map(|i| self.position_from_index(i))
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        let [ix, iy, iz] = self.split_index(index);
        self.values.get((iz, iy, ix)).copied()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut f64> {
        let [ix, iy, iz] = self.split_index(index);
        self.values.get_mut((iz, iy, ix))
    }

    pub fn values(&self) -> ArrayView3<'_, f64> {
        self.values.view()
    }

    /// Every cell in flat-index order, for filling the table.
    pub fn values_mut(&mut self) -> &mut [f64] {
        self.values
            .as_slice_mut()
            .expect("cache table storage is always contiguous")
    }

    /// Is `pos` inside the box spanned by the cell positions?
    pub fn contains(&self, pos: &Position) -> bool {
        (0..3).all(|axis| {
            let t = (pos[axis] - self.origin[axis]) / self.spacing[axis];
            (0.0..=(self.dims[axis] - 1) as f64).contains(&t)
        })
    }

    /// Fractional grid coordinate of `pos` along `axis`, clamped into the grid.
    fn grid_coordinate(&self, pos: &Position, axis: usize) -> f64 {
        let t = (pos[axis] - self.origin[axis]) / self.spacing[axis];
        t.clamp(0.0, (self.dims[axis] - 1) as f64)
    }

    /// The flat index of the cell closest to `pos` (clamped into the grid).
    pub fn nearest_index(&self, pos: &Position) -> usize {
        let [ix, iy, iz] = [0, 1, 2].map(|axis| self.grid_coordinate(pos, axis).round() as usize);
        self.flat_index(ix, iy, iz)
    }

    /// Trilinear interpolation of the 8 cells surrounding `pos`.
    pub fn interpolate(&self, pos: &Position) -> f64 {
        // Lower cell index and weight of the upper cell along each axis.
        let mut lower = [0; 3];
        let mut frac = [0.0; 3];
        for axis in 0..3 {
            let n = self.dims[axis];
            if n == 1 {
                continue;
            }
            let t = self.grid_coordinate(pos, axis);
            let i = (t.floor() as usize).min(n - 2);
            lower[axis] = i;
            frac[axis] = t - i as f64;
        }
        let upper = [0, 1, 2].map(|axis| (lower[axis] + 1).min(self.dims[axis] - 1));

        let mut total = 0.0;
        for (iz, wz) in [(lower[2], 1.0 - frac[2]), (upper[2], frac[2])] {
            for (iy, wy) in [(lower[1], 1.0 - frac[1]), (upper[1], frac[1])] {
                for (ix, wx) in [(lower[0], 1.0 - frac[0]), (upper[0], frac[0])] {
                    let w = wx * wy * wz;
                    if w != 0.0 {
                        total += w * self.values[(iz, iy, ix)];
                    }
                }
            }
        }
        total
    }
}
