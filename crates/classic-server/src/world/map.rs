//! Voxel map storage and the on-disk map format.
//!
//! Cells are one block id each, laid out [y][z][x] — the Classic wire
//! order. Map files are the gzip-compressed bare cell array; dimensions
//! always come from the world's config.

use std::io::{self, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

const DIRT: u8 = 0x03;
const GRASS: u8 = 0x02;

pub struct Map {
    x: i16,
    y: i16,
    z: i16,
    cells: Vec<u8>,
    dirty: bool,
}

impl Map {
    /// An all-air map.
    pub fn new(x: i16, y: i16, z: i16) -> Self {
        Self {
            x,
            y,
            z,
            cells: vec![0; x as usize * y as usize * z as usize],
            dirty: false,
        }
    }

    /// A flat map: dirt up to the midline, grass on the surface.
    pub fn flat(x: i16, y: i16, z: i16) -> Self {
        let mut map = Self::new(x, y, z);
        let surface = y / 2 - 1;
        for cy in 0..=surface {
            let block = if cy == surface { GRASS } else { DIRT };
            for cz in 0..z {
                for cx in 0..x {
                    let idx = map.index(cx, cy, cz);
                    map.cells[idx] = block;
                }
            }
        }
        map.dirty = false;
        map
    }

    pub fn dims(&self) -> (i16, i16, i16) {
        (self.x, self.y, self.z)
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn in_bounds(&self, x: i16, y: i16, z: i16) -> bool {
        (0..self.x).contains(&x) && (0..self.y).contains(&y) && (0..self.z).contains(&z)
    }

    fn index(&self, x: i16, y: i16, z: i16) -> usize {
        (y as usize * self.z as usize + z as usize) * self.x as usize + x as usize
    }

    pub fn get(&self, x: i16, y: i16, z: i16) -> Option<u8> {
        self.in_bounds(x, y, z).then(|| self.cells[self.index(x, y, z)])
    }

    /// Set a cell. Out-of-bounds coordinates are rejected, not clamped.
    pub fn set(&mut self, x: i16, y: i16, z: i16, block: u8) -> bool {
        if !self.in_bounds(x, y, z) {
            return false;
        }
        let idx = self.index(x, y, z);
        self.cells[idx] = block;
        self.dirty = true;
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&self.cells)?;
        encoder.finish()?;
        Ok(())
    }

    /// Load a map file; the cell count must match the given dimensions.
    pub fn load<P: AsRef<Path>>(path: P, x: i16, y: i16, z: i16) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut cells = Vec::new();
        GzDecoder::new(file).read_to_end(&mut cells)?;
        let expected = x as usize * y as usize * z as usize;
        if cells.len() != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("map holds {} cells, dimensions need {expected}", cells.len()),
            ));
        }
        Ok(Self {
            x,
            y,
            z,
            cells,
            dirty: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        let map = Map::new(16, 8, 16);
        assert!(map.in_bounds(0, 0, 0));
        assert!(map.in_bounds(15, 7, 15));
        assert!(!map.in_bounds(16, 0, 0));
        assert!(!map.in_bounds(0, 8, 0));
        assert!(!map.in_bounds(-1, 0, 0));
        assert_eq!(map.get(16, 0, 0), None);
    }

    #[test]
    fn set_get() {
        let mut map = Map::new(4, 4, 4);
        assert!(!map.is_dirty());
        assert!(map.set(1, 2, 3, 0x31));
        assert_eq!(map.get(1, 2, 3), Some(0x31));
        assert!(map.is_dirty());
        assert!(!map.set(4, 0, 0, 0x01));
    }

    #[test]
    fn flat_surface_is_grass() {
        let map = Map::flat(8, 8, 8);
        assert_eq!(map.get(3, 3, 3), Some(GRASS));
        assert_eq!(map.get(3, 2, 3), Some(DIRT));
        assert_eq!(map.get(3, 4, 3), Some(0));
        assert!(!map.is_dirty());
    }

    #[test]
    fn save_load_roundtrip() {
        let path = std::env::temp_dir().join(format!("classicd_map_{}.dat", std::process::id()));
        let mut map = Map::flat(8, 8, 8);
        map.set(1, 5, 1, 0x14);
        map.save(&path).unwrap();

        let loaded = Map::load(&path, 8, 8, 8).unwrap();
        assert_eq!(loaded.cells(), map.cells());
        assert!(!loaded.is_dirty());

        // Wrong dimensions are an error, not a silent truncation.
        assert!(Map::load(&path, 8, 8, 4).is_err());
        let _ = std::fs::remove_file(path);
    }
}
