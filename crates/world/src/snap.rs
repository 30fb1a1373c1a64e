use glam::Vec3;
use std::collections::HashMap;

/// A 3D cell coordinate in the snap hash grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Cell {
    x: i32,
    y: i32,
    z: i32,
}

/// Spatial index of candidate alignment points, bucketed into fixed-size
/// cells. Populated by apps registering snap anchors; read-only for the
/// editing layer, which queries it while dragging.
#[derive(Debug, Clone)]
pub struct SnapIndex {
    cell_size: f32,
    cells: HashMap<Cell, Vec<Vec3>>,
    len: usize,
}

impl SnapIndex {
    /// Cell size must cover the query radius so a one-cell neighborhood
    /// scan is exhaustive.
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive");
        Self {
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, point: Vec3) {
        let cell = self.cell_of(point);
        self.cells.entry(cell).or_default().push(point);
        self.len += 1;
    }

    pub fn remove(&mut self, point: Vec3) -> bool {
        let cell = self.cell_of(point);
        if let Some(points) = self.cells.get_mut(&cell)
            && let Some(at) = points.iter().position(|p| *p == point)
        {
            points.swap_remove(at);
            self.len -= 1;
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The nearest registered point within `radius` of `point`, if any.
    /// Scans the surrounding cell neighborhood sized to the radius.
    pub fn nearest_within(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        let center = self.cell_of(point);
        let reach = (radius / self.cell_size).ceil() as i32;

        let mut best: Option<(Vec3, f32)> = None;
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let cell = Cell {
                        x: center.x + dx,
                        y: center.y + dy,
                        z: center.z + dz,
                    };
                    let Some(points) = self.cells.get(&cell) else {
                        continue;
                    };
                    for candidate in points {
                        let d = candidate.distance(point);
                        if d <= radius && best.is_none_or(|(_, bd)| d < bd) {
                            best = Some((*candidate, d));
                        }
                    }
                }
            }
        }
        best.map(|(p, _)| p)
    }

    fn cell_of(&self, point: Vec3) -> Cell {
        Cell {
            x: (point.x / self.cell_size).floor() as i32,
            y: (point.y / self.cell_size).floor() as i32,
            z: (point.z / self.cell_size).floor() as i32,
        }
    }
}

impl Default for SnapIndex {
    fn default() -> Self {
        Self::new(2.0)
    }
}
