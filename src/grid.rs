use anyhow::{Result, bail};
use fixedbitset::FixedBitSet;
use ndarray::Array2;
use std::collections::{BTreeSet, VecDeque};
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::{ALL_DIRECTIONS, Catalog, Direction, MetaPattern, Point, Rect};

/// Wire marker for an empty cell in `.dat` files and uid matrices.
const EMPTY_CELL: i64 = -1;

/// A mutable 2D field of cells over a shared palette.
///
/// Each cell is either empty or collapsed to a pattern uid. A parallel
/// entropy field tracks, for every empty cell, how many patterns its
/// collapsed neighbourhood still permits; collapsed cells sit at zero. An
/// empty cell at zero entropy is a contradiction and is surfaced through
/// [`Self::zero_entropy_cell`].
pub struct Grid {
    width: usize,
    height: usize,
    catalog: Arc<Catalog>,
    cells: Array2<Option<u32>>,
    entropy: Array2<usize>,
    banned: Array2<FixedBitSet>,
}

impl Grid {
    /// Construct an all-empty grid over `catalog` with the given extent.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, rect: Rect) -> Self {
        debug_assert!(rect.width > 0, "Grid width must be greater than zero");
        debug_assert!(rect.height > 0, "Grid height must be greater than zero");
        let shape = (rect.height, rect.width);
        Self {
            width: rect.width,
            height: rect.height,
            cells: Array2::from_elem(shape, None),
            entropy: Array2::from_elem(shape, catalog.len()),
            banned: Array2::from_elem(shape, FixedBitSet::with_capacity(catalog.len())),
            catalog,
        }
    }

    /// Reset every cell to empty, entropy to the palette size, and drop all
    /// tabu entries.
    pub fn initialize(&mut self) {
        self.cells.fill(None);
        self.entropy.fill(self.catalog.len());
        for banned in self.banned.iter_mut() {
            banned.clear();
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Extent as `(height, width)`.
    #[must_use]
    pub fn size(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// The shared palette this grid draws from.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// True iff every cell holds a pattern.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The uid at `p`, if the cell is collapsed.
    #[must_use]
    pub fn uid_at(&self, p: Point) -> Option<u32> {
        self.cells[(p.x, p.y)]
    }

    /// The pattern at `p`, if the cell is collapsed.
    #[must_use]
    pub fn pattern_at(&self, p: Point) -> Option<&MetaPattern> {
        self.cells[(p.x, p.y)].and_then(|uid| self.catalog.by_uid(uid))
    }

    /// The entropy at `p`.
    #[must_use]
    pub fn entropy_at(&self, p: Point) -> usize {
        self.entropy[(p.x, p.y)]
    }

    /// The whole entropy field, row-major.
    #[must_use]
    pub fn entropy(&self) -> &Array2<usize> {
        &self.entropy
    }

    /// The first empty cell with zero entropy in row-major order, if any.
    /// Such a cell is a contradiction.
    #[must_use]
    pub fn zero_entropy_cell(&self) -> Option<Point> {
        for x in 0..self.height {
            for y in 0..self.width {
                if self.cells[(x, y)].is_none() && self.entropy[(x, y)] == 0 {
                    return Some(Point::new(x, y));
                }
            }
        }
        None
    }

    /// The up-to-four in-bounds neighbours of `p`, each paired with the
    /// direction from `p` to it.
    #[must_use]
    pub fn neighbours(&self, p: Point) -> Vec<(Point, Direction)> {
        let mut neighbours = Vec::with_capacity(4);
        for dir in ALL_DIRECTIONS {
            let (dx, dy) = dir.delta();
            let Some(x) = p.x.checked_add_signed(dx) else {
                continue;
            };
            let Some(y) = p.y.checked_add_signed(dy) else {
                continue;
            };
            if x < self.height && y < self.width {
                neighbours.push((Point::new(x, y), dir));
            }
        }
        neighbours
    }

    /// The patterns still permitted at `p` by its collapsed neighbours,
    /// sorted by uid. Tabu entries at `p` are excluded. Empty neighbours
    /// contribute no constraint.
    ///
    /// A collapsed neighbour reached from `p` in direction `d` constrains
    /// `p` through its allowed set in `opposite(d)`, the direction looking
    /// back at `p`.
    #[must_use]
    pub fn valid_patterns(&self, p: Point) -> Vec<&MetaPattern> {
        let collapsed: Vec<(Direction, &MetaPattern)> = self
            .neighbours(p)
            .into_iter()
            .filter_map(|(n, dir)| self.pattern_at(n).map(|pattern| (dir, pattern)))
            .collect();

        let banned = &self.banned[(p.x, p.y)];
        let mut permitted: Vec<&MetaPattern> = self
            .catalog
            .all()
            .iter()
            .enumerate()
            .filter(|(position, pattern)| {
                !banned.contains(*position)
                    && collapsed
                        .iter()
                        .all(|(dir, neighbour)| neighbour.rules.allows(dir.opposite(), pattern.uid))
            })
            .map(|(_, pattern)| pattern)
            .collect();
        permitted.sort_by_key(|pattern| pattern.uid);
        permitted
    }

    /// Like [`Self::valid_patterns`], but empty neighbours constrain `p` as
    /// well: each contributes the union of the allowed sets of every
    /// pattern still possible there (one level of lookahead, no deeper).
    #[must_use]
    pub fn valid_patterns_with_lookahead(&self, p: Point) -> Vec<&MetaPattern> {
        let mut constraints: Vec<BTreeSet<u32>> = Vec::new();
        for (n, dir) in self.neighbours(p) {
            let back = dir.opposite();
            if let Some(neighbour) = self.pattern_at(n) {
                constraints.push(neighbour.rules.allowed(back).clone());
            } else {
                let mut union = BTreeSet::new();
                for possible in self.valid_patterns(n) {
                    union.extend(possible.rules.allowed(back).iter().copied());
                }
                constraints.push(union);
            }
        }

        let banned = &self.banned[(p.x, p.y)];
        let mut permitted: Vec<&MetaPattern> = self
            .catalog
            .all()
            .iter()
            .enumerate()
            .filter(|(position, pattern)| {
                !banned.contains(*position)
                    && constraints.iter().all(|allowed| allowed.contains(&pattern.uid))
            })
            .map(|(_, pattern)| pattern)
            .collect();
        permitted.sort_by_key(|pattern| pattern.uid);
        permitted
    }

    /// Collapse `p` to `uid` and zero its entropy. Propagation is a
    /// separate call ([`Self::update_entropy`]).
    pub fn place(&mut self, p: Point, uid: u32) {
        debug_assert!(
            self.catalog.by_uid(uid).is_some(),
            "Placed uid must exist in the catalog"
        );
        self.cells[(p.x, p.y)] = Some(uid);
        self.entropy[(p.x, p.y)] = 0;
    }

    /// Empty `p`, recompute its entropy from its collapsed neighbourhood,
    /// and re-propagate outwards.
    pub fn reset(&mut self, p: Point) {
        self.cells[(p.x, p.y)] = None;
        let own = self.valid_patterns(p).len();
        self.entropy[(p.x, p.y)] = own;
        self.update_entropy(p);
    }

    /// Forbid `uid` from ever being chosen at `p` again for the remainder
    /// of this generation. Cleared by [`Self::initialize`].
    pub fn ban(&mut self, p: Point, uid: u32) {
        if let Some(position) = self.catalog.position(uid) {
            self.banned[(p.x, p.y)].insert(position);
        }
    }

    /// Breadth-first entropy recomputation over the empty region reachable
    /// from `p`, pruned at cells whose entropy did not change.
    pub fn update_entropy(&mut self, p: Point) {
        let mut visited = Array2::from_elem((self.height, self.width), false);
        let mut queue = VecDeque::new();

        visited[(p.x, p.y)] = true;
        for (n, _) in self.neighbours(p) {
            visited[(n.x, n.y)] = true;
            queue.push_back(n);
        }

        while let Some(cell) = queue.pop_front() {
            if self.cells[(cell.x, cell.y)].is_some() {
                continue;
            }
            let new = self.valid_patterns(cell).len();
            if new == self.entropy[(cell.x, cell.y)] {
                continue;
            }
            self.entropy[(cell.x, cell.y)] = new;
            // Changed, so the change may cascade.
            for (n, _) in self.neighbours(cell) {
                if !visited[(n.x, n.y)] {
                    visited[(n.x, n.y)] = true;
                    queue.push_back(n);
                }
            }
        }
    }

    /// Among cells with entropy above zero, the one with minimum entropy;
    /// ties broken by distance to the grid centre, then by row-major scan
    /// order. `None` once nothing is left to collapse.
    #[must_use]
    pub fn find_least_entropy_cell(&self) -> Option<Point> {
        let center = (self.height as i64 / 2, self.width as i64 / 2);
        let mut best: Option<(usize, i64, Point)> = None;
        for x in 0..self.height {
            for y in 0..self.width {
                let entropy = self.entropy[(x, y)];
                if entropy == 0 {
                    continue;
                }
                let dx = x as i64 - center.0;
                let dy = y as i64 - center.1;
                let distance = dx * dx + dy * dy;
                let better = match best {
                    None => true,
                    Some((best_entropy, best_distance, _)) => {
                        entropy < best_entropy
                            || (entropy == best_entropy && distance < best_distance)
                    }
                };
                if better {
                    best = Some((entropy, distance, Point::new(x, y)));
                }
            }
        }
        best.map(|(_, _, point)| point)
    }

    /// The uid of every cell, `[height][width]`, with `-1` for empty
    /// cells.
    #[must_use]
    pub fn uids(&self) -> Vec<Vec<i64>> {
        (0..self.height)
            .map(|x| {
                (0..self.width)
                    .map(|y| self.cells[(x, y)].map_or(EMPTY_CELL, i64::from))
                    .collect()
            })
            .collect()
    }

    /// A `view`-sized read-only window around `p`, out-of-bounds cells as
    /// empty. Feature extraction for external judges and advisors.
    #[must_use]
    pub fn window(&self, p: Point, view: Rect) -> Array2<Option<u32>> {
        let (cx, cy) = view.center();
        let mut window = Array2::from_elem((view.height, view.width), None);
        for i in 0..view.height {
            for j in 0..view.width {
                let x = p.x as isize - cy as isize + i as isize;
                let y = p.y as isize - cx as isize + j as isize;
                if x >= 0 && (x as usize) < self.height && y >= 0 && (y as usize) < self.width {
                    window[(i, j)] = self.cells[(x as usize, y as usize)];
                }
            }
        }
        window
    }

    /// Write the grid as `<dir>/<name>.dat`: one line per row, cells as
    /// comma-separated uids, empty cells as `-1`. A fresh UUID stands in
    /// when no name is given. Returns the written path.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be created or written.
    pub fn serialize(&self, dir: &Path, name: Option<&str>) -> Result<PathBuf> {
        let name = name.map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);
        let path = dir.join(format!("{name}.dat"));
        let mut file = File::create(&path)?;
        for row in self.uids() {
            let line: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(file, "{}", line.join(","))?;
        }
        Ok(path)
    }

    /// Rebuild a grid from a `.dat` file, resolving uids through `catalog`
    /// and recomputing the entropy field.
    ///
    /// # Errors
    ///
    /// Fails on unreadable files, ragged rows, unparsable values, and uids
    /// missing from the catalog.
    pub fn deserialize(catalog: Arc<Catalog>, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut rows: Vec<Vec<Option<u32>>> = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split(',')
                .map(|value| -> Result<Option<u32>> {
                    let value: i64 = value.trim().parse()?;
                    if value == EMPTY_CELL {
                        return Ok(None);
                    }
                    let uid = u32::try_from(value)?;
                    if catalog.by_uid(uid).is_none() {
                        bail!("uid {uid} is not in the catalog");
                    }
                    Ok(Some(uid))
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        if rows.is_empty() {
            bail!("grid file {} contains no rows", path.display());
        }
        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            bail!("grid file {} has ragged rows", path.display());
        }

        let mut grid = Self::new(catalog, Rect::new(width, rows.len()));
        for (x, row) in rows.into_iter().enumerate() {
            for (y, cell) in row.into_iter().enumerate() {
                if let Some(uid) = cell {
                    grid.place(Point::new(x, y), uid);
                }
            }
        }
        for x in 0..grid.height {
            for y in 0..grid.width {
                let p = Point::new(x, y);
                if grid.uid_at(p).is_none() {
                    let permitted = grid.valid_patterns(p).len();
                    grid.entropy[(x, y)] = permitted;
                }
            }
        }
        Ok(grid)
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let print_width = self
            .catalog
            .all()
            .iter()
            .map(|pattern| pattern.uid.to_string().len())
            .max()
            .unwrap_or(1)
            .max(2);
        for row in self.uids() {
            for value in row {
                let s = value.to_string();
                write!(f, "{s:>print_width$} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
