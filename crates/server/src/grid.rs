//! Tile occupancy grid.
//!
//! Built once from a tile layer at startup and read-only afterwards. A cell
//! whose tile value is greater than zero is blocked; anything else is open.

use anyhow::{bail, Context};
use glam::Vec2;
use serde::Deserialize;
use std::path::Path;

/// A row-major tile layer, as exported by common map editors.
#[derive(Debug, Clone, Deserialize)]
pub struct TileLayer {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// `width * height` tile values, row by row.
    pub data: Vec<i32>,
}

impl TileLayer {
    /// Read a tile layer from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading tile layer {:?}", path))?;
        let layer: TileLayer = toml::from_str(&contents)
            .with_context(|| format!("parsing tile layer {:?}", path))?;
        Ok(layer)
    }
}

/// Blocked/open lookup over the arena.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    columns: usize,
    rows: usize,
    tile_size: f32,
    blocked: Vec<bool>,
}

impl OccupancyGrid {
    /// Build the grid from a tile layer.
    pub fn from_layer(layer: &TileLayer, tile_size: f32) -> anyhow::Result<Self> {
        if tile_size.is_nan() || tile_size <= 0.0 {
            bail!("tile size must be positive, got {}", tile_size);
        }
        let Some(cells) = layer.width.checked_mul(layer.height) else {
            bail!("tile layer {}x{} is too large", layer.width, layer.height);
        };
        if layer.data.len() != cells {
            bail!(
                "tile layer is {}x{} but holds {} values",
                layer.width,
                layer.height,
                layer.data.len()
            );
        }

        Ok(Self {
            columns: layer.width,
            rows: layer.height,
            tile_size,
            blocked: layer.data.iter().map(|&value| value > 0).collect(),
        })
    }

    /// Build the grid from nested rows (`rows[row][column]`).
    pub fn from_rows(rows: &[Vec<i32>], tile_size: f32) -> anyhow::Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            bail!("tile rows have differing lengths");
        }
        let layer = TileLayer {
            width,
            height: rows.len(),
            data: rows.iter().flatten().copied().collect(),
        };
        Self::from_layer(&layer, tile_size)
    }

    /// An all-open grid covering `width x height` arena units.
    pub fn open(width: f32, height: f32, tile_size: f32) -> anyhow::Result<Self> {
        if tile_size.is_nan() || tile_size <= 0.0 {
            bail!("tile size must be positive, got {}", tile_size);
        }
        let columns = (width / tile_size).ceil().max(0.0) as usize;
        let rows = (height / tile_size).ceil().max(0.0) as usize;
        let Some(cells) = columns.checked_mul(rows) else {
            bail!("arena {}x{} is too large for tile size {}", width, height, tile_size);
        };
        Ok(Self {
            columns,
            rows,
            tile_size,
            blocked: vec![false; cells],
        })
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Whether the cell at `(column, row)` is blocked. Cells outside the grid are open.
    pub fn is_blocked(&self, column: usize, row: usize) -> bool {
        if column >= self.columns || row >= self.rows {
            return false;
        }
        self.blocked[row * self.columns + column]
    }

    /// Whether the cell containing the arena point is blocked.
    pub fn is_blocked_at(&self, point: Vec2) -> bool {
        match self.cell_of(point) {
            Some((column, row)) => self.is_blocked(column, row),
            None => false,
        }
    }

    /// Grid cell containing `point`, if it lies on the grid.
    pub fn cell_of(&self, point: Vec2) -> Option<(usize, usize)> {
        if !point.is_finite() || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let column = (point.x / self.tile_size).floor() as usize;
        let row = (point.y / self.tile_size).floor() as usize;
        (column < self.columns && row < self.rows).then_some((column, row))
    }
}
