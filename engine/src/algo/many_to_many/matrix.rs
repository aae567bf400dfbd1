//! Record types of the matrix computation: heap entries, per traversal id
//! labels, bucket entries and the result grid.

use super::*;

/// Priority queue entries, keyed by traversal id
#[derive(Copy, Clone, Eq, PartialEq, Debug, PartialOrd, Ord)]
pub struct State {
    pub key: Weight,
    pub id: TraversalId,
}

impl Indexing for State {
    #[inline]
    fn as_index(&self) -> usize {
        self.id
    }
}

/// Best known partial path to one traversal id during a single search run.
/// `edge` is the arc the path arrived by, `orig_edge` the original edge at
/// its arrival end; both are `NONE` for the seed of a run.
#[derive(Debug, Clone, Copy)]
pub struct MatrixLabel {
    pub edge: InRangeOption<EdgeId>,
    pub orig_edge: InRangeOption<EdgeId>,
    pub node: NodeId,
    pub weight: Weight,
    pub time: Time,
    pub distance: Distance,
}

impl MatrixLabel {
    pub fn unreached() -> MatrixLabel {
        MatrixLabel {
            edge: InRangeOption::NONE,
            orig_edge: InRangeOption::NONE,
            node: 0,
            weight: INFINITY,
            time: 0,
            distance: 0,
        }
    }

    pub fn seed(node: NodeId) -> MatrixLabel {
        MatrixLabel {
            edge: InRangeOption::NONE,
            orig_edge: InRangeOption::NONE,
            node,
            weight: 0,
            time: 0,
            distance: 0,
        }
    }
}

/// Best known partial path from some node to `target`, written during the
/// backward phase and immutable once the forward phase starts.
#[derive(Debug, Clone, Copy)]
pub struct BucketEntry {
    pub target: NodeId,
    pub weight: Weight,
    pub time: Time,
    pub distance: Distance,
}

#[derive(Debug, Clone, Copy)]
struct MatrixCell {
    weight: Weight,
    time: Time,
    distance: Distance,
}

const UNREACHED: MatrixCell = MatrixCell {
    weight: INFINITY,
    time: 0,
    distance: 0,
};

/// The result grid of a matrix computation, row major over (source, target)
/// index pairs. Cells which no path closed within the visited node budget
/// stay empty, which the accessors surface as `None` - distinct from a
/// legitimate zero weight pair.
#[derive(Debug)]
pub struct DistanceMatrix {
    num_sources: usize,
    num_targets: usize,
    cells: Vec<MatrixCell>,
}

impl DistanceMatrix {
    pub fn new(num_sources: usize, num_targets: usize) -> DistanceMatrix {
        DistanceMatrix {
            num_sources,
            num_targets,
            cells: vec![UNREACHED; num_sources * num_targets],
        }
    }

    pub fn num_sources(&self) -> usize {
        self.num_sources
    }

    pub fn num_targets(&self) -> usize {
        self.num_targets
    }

    pub(super) fn set_cell(&mut self, source: usize, target: usize, weight: Weight, time: Time, distance: Distance) {
        self.cells[source * self.num_targets + target] = MatrixCell { weight, time, distance };
    }

    fn cell(&self, source: usize, target: usize) -> Option<&MatrixCell> {
        let cell = &self.cells[source * self.num_targets + target];
        if cell.weight < INFINITY {
            Some(cell)
        } else {
            None
        }
    }

    /// Shortest path weight for a pair, None if no path was found.
    /// A `None` can also mean the visited node budget ran out;
    /// rerun with a larger budget to confirm true unreachability.
    pub fn weight(&self, source: usize, target: usize) -> Option<Weight> {
        self.cell(source, target).map(|cell| cell.weight)
    }

    /// Travel time for a pair, None if no path was found.
    pub fn time(&self, source: usize, target: usize) -> Option<Time> {
        self.cell(source, target).map(|cell| cell.time)
    }

    /// Travel distance for a pair, None if no path was found.
    pub fn distance(&self, source: usize, target: usize) -> Option<Distance> {
        self.cell(source, target).map(|cell| cell.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreached_is_distinct_from_zero() {
        let mut matrix = DistanceMatrix::new(1, 2);
        matrix.set_cell(0, 1, 0, 0, 0);

        assert_eq!(matrix.weight(0, 0), None);
        assert_eq!(matrix.weight(0, 1), Some(0));
        assert_eq!(matrix.time(0, 1), Some(0));
        assert_eq!(matrix.distance(0, 1), Some(0));
    }

    #[test]
    fn test_dimensions() {
        let matrix = DistanceMatrix::new(3, 2);
        assert_eq!(matrix.num_sources(), 3);
        assert_eq!(matrix.num_targets(), 2);
    }
}
