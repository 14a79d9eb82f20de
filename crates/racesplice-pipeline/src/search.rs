//! Grid path search between landmarks.
//!
//! This module defines the [`PathSearch`] trait for pluggable search
//! strategies and the [`SearchKind`] enum for selecting one at runtime.
//!
//! Both strategies explore 8-connected PATH cells and fix each cell's
//! predecessor the first time it is discovered. Predecessors live in an
//! index-addressed arena, so a reconstructed path is just a walk up the
//! parent indices from the terminal node. An exhausted frontier yields an
//! empty path; that is an expected outcome, not an error.

use std::collections::{HashSet, VecDeque};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::marker::{Marker, MarkerPalette, color_at};
use crate::types::GridCell;

/// Neighbor offsets: the four axis directions, then the four diagonals.
/// Every step costs 1 regardless of direction.
const NEIGHBORS: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
];

/// Selects which search strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchKind {
    /// Breadth-first. Returns a path with the minimum number of
    /// 8-connected steps. Required when the goal is a color predicate.
    #[default]
    BreadthFirst,

    /// Depth-first. Intended for connectivity checks toward a known cell;
    /// the returned path is valid but not necessarily shortest.
    DepthFirst,
}

/// Termination predicate for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// Stop on this exact cell, whatever its color.
    Cell(GridCell),
    /// Stop on any in-bounds cell colored as this marker.
    Marker(Marker),
}

/// A color-coded map viewed as a search graph.
#[derive(Debug, Clone, Copy)]
pub struct SearchGrid<'a> {
    image: &'a RgbImage,
    palette: &'a MarkerPalette,
}

impl<'a> SearchGrid<'a> {
    /// Wrap a map raster and the palette used to classify it.
    #[must_use]
    pub const fn new(image: &'a RgbImage, palette: &'a MarkerPalette) -> Self {
        Self { image, palette }
    }

    /// A cell is traversable iff it is in bounds and colored as PATH.
    #[must_use]
    pub fn is_traversable(&self, cell: GridCell) -> bool {
        color_at(self.image, cell) == Some(self.palette.path)
    }

    /// Whether `cell` terminates a search for `goal`.
    #[must_use]
    pub fn reaches(&self, cell: GridCell, goal: Goal) -> bool {
        match goal {
            Goal::Cell(end) => cell == end,
            Goal::Marker(marker) => color_at(self.image, cell) == Some(self.palette.color(marker)),
        }
    }
}

/// Trait for grid search strategies.
///
/// Input: a start cell and a goal. Output: the cells from `start` to the
/// first cell reaching the goal, both inclusive, or an empty vector when
/// the goal is unreachable.
pub trait PathSearch {
    /// Search `grid` from `start` toward `goal`.
    fn search(&self, grid: &SearchGrid<'_>, start: GridCell, goal: Goal) -> Vec<GridCell>;
}

impl PathSearch for SearchKind {
    fn search(&self, grid: &SearchGrid<'_>, start: GridCell, goal: Goal) -> Vec<GridCell> {
        match *self {
            Self::BreadthFirst => explore(grid, start, goal, VecDeque::new()),
            Self::DepthFirst => explore(grid, start, goal, Vec::new()),
        }
    }
}

/// Order in which discovered nodes are expanded.
trait Frontier {
    fn enqueue(&mut self, node: usize);
    fn dequeue(&mut self) -> Option<usize>;
}

/// FIFO: breadth-first.
impl Frontier for VecDeque<usize> {
    fn enqueue(&mut self, node: usize) {
        self.push_back(node);
    }

    fn dequeue(&mut self) -> Option<usize> {
        self.pop_front()
    }
}

/// LIFO: depth-first.
impl Frontier for Vec<usize> {
    fn enqueue(&mut self, node: usize) {
        self.push(node);
    }

    fn dequeue(&mut self) -> Option<usize> {
        self.pop()
    }
}

/// A discovered cell and the arena index of the node that discovered it.
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    cell: GridCell,
    parent: Option<usize>,
}

/// Arena owning every node created during one search.
#[derive(Debug, Default)]
struct SearchTree {
    nodes: Vec<SearchNode>,
    visited: HashSet<GridCell>,
}

impl SearchTree {
    /// Record `cell` as discovered from `parent`. Returns `None` if it was
    /// already visited, which keeps the parent links acyclic.
    fn discover(&mut self, cell: GridCell, parent: Option<usize>) -> Option<usize> {
        if !self.visited.insert(cell) {
            return None;
        }
        self.nodes.push(SearchNode { cell, parent });
        Some(self.nodes.len() - 1)
    }

    /// Walk parent links from `node` back to the root, then reverse.
    fn path_to(&self, node: usize) -> Vec<GridCell> {
        let mut path = Vec::new();
        let mut cursor = Some(node);
        while let Some(index) = cursor {
            let node = self.nodes[index];
            path.push(node.cell);
            cursor = node.parent;
        }
        path.reverse();
        path
    }
}

fn explore<F: Frontier>(
    grid: &SearchGrid<'_>,
    start: GridCell,
    goal: Goal,
    mut frontier: F,
) -> Vec<GridCell> {
    if grid.reaches(start, goal) {
        return vec![start];
    }

    let mut tree = SearchTree::default();
    if let Some(root) = tree.discover(start, None) {
        frontier.enqueue(root);
    }

    while let Some(current) = frontier.dequeue() {
        let here = tree.nodes[current].cell;
        for (dx, dy) in NEIGHBORS {
            let next = GridCell::new(here.x + dx, here.y + dy);
            if tree.visited.contains(&next) {
                continue;
            }
            if grid.reaches(next, goal) {
                tree.nodes.push(SearchNode {
                    cell: next,
                    parent: Some(current),
                });
                let path = tree.path_to(tree.nodes.len() - 1);
                tracing::debug!(
                    nodes = tree.nodes.len(),
                    steps = path.len() - 1,
                    "search reached goal"
                );
                return path;
            }
            if grid.is_traversable(next)
                && let Some(node) = tree.discover(next, Some(current))
            {
                frontier.enqueue(node);
            }
        }
    }

    tracing::debug!(
        x = start.x,
        y = start.y,
        explored = tree.nodes.len(),
        "search frontier exhausted"
    );
    Vec::new()
}
