//! Static per-zone passability grid.

use argonvale_shared::ZoneMapData;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ZoneMapError {
    #[error("Collision layer '{layer}' has {actual} tiles, expected {expected} ({width}x{height})")]
    LengthMismatch {
        layer: String,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Immutable for the lifetime of residency in a zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionGrid {
    width: u32,
    height: u32,
    /// `None` when the map has no collision layer: every in-bounds tile is passable.
    solid: Option<Vec<bool>>,
}

impl CollisionGrid {
    pub fn from_map(map: &ZoneMapData) -> Result<Self, ZoneMapError> {
        let expected = map.width as usize * map.height as usize;
        let Some(layer) = map.layers.iter().find(|layer| layer.is_collision_layer()) else {
            return Ok(Self::open(map.width, map.height));
        };
        if layer.data.len() != expected {
            return Err(ZoneMapError::LengthMismatch {
                layer: layer.name.clone(),
                width: map.width,
                height: map.height,
                expected,
                actual: layer.data.len(),
            });
        }
        Ok(Self {
            width: map.width,
            height: map.height,
            solid: Some(layer.data.iter().map(|&tile| tile != 0).collect()),
        })
    }

    /// A grid with no obstacles.
    pub fn open(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            solid: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    /// Out-of-bounds tiles are never passable.
    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        match (self.index(x, y), &self.solid) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(i), Some(solid)) => !solid[i],
        }
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }
}
