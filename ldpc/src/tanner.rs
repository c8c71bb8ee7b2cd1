use crate::decoder::llr_to_probability;
use crate::Mod2Sparse;

/// Bipartite graph of a parity-check matrix: one check node per row, one
/// digit (variable) node per column, one edge per nonzero entry.
///
/// Edges are numbered in row-major order of the matrix, so the edges of a
/// check are contiguous and sorted by digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TannerGraph {
    n_checks: usize,
    n_digits: usize,
    edges: Vec<(usize, usize)>,
    check_edges: Vec<Vec<usize>>,
    digit_edges: Vec<Vec<usize>>,
}

impl TannerGraph {
    pub fn new(parity: &Mod2Sparse) -> Self {
        let mut edges = Vec::new();
        let mut check_edges = vec![Vec::new(); parity.rows()];
        let mut digit_edges = vec![Vec::new(); parity.cols()];

        for (check, digit) in parity.iter() {
            let edge = edges.len();
            edges.push((check, digit));
            check_edges[check].push(edge);
            digit_edges[digit].push(edge);
        }

        Self {
            n_checks: parity.rows(),
            n_digits: parity.cols(),
            edges,
            check_edges,
            digit_edges,
        }
    }

    pub fn checks(&self) -> usize {
        self.n_checks
    }
    pub fn digits(&self) -> usize {
        self.n_digits
    }
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// (check, digit) of an edge
    pub fn edge(&self, edge: usize) -> (usize, usize) {
        self.edges[edge]
    }

    pub fn check_edges(&self, check: usize) -> &[usize] {
        &self.check_edges[check]
    }

    pub fn digit_edges(&self, digit: usize) -> &[usize] {
        &self.digit_edges[digit]
    }

    pub fn edge_index(&self, check: usize, digit: usize) -> Option<usize> {
        let edges = self.check_edges.get(check)?;
        edges
            .binary_search_by_key(&digit, |&edge| self.edges[edge].1)
            .ok()
            .map(|pos| edges[pos])
    }
}

/// One belief per edge of a [`TannerGraph`], stored as a log-likelihood
/// ratio `ln(p / (1 - p))` where `p` is the probability that the digit is 1.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeBeliefs {
    llrs: Vec<f64>,
}

impl EdgeBeliefs {
    pub fn filled(edge_count: usize, llr: f64) -> Self {
        Self {
            llrs: vec![llr; edge_count],
        }
    }

    pub fn len(&self) -> usize {
        self.llrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.llrs.is_empty()
    }

    pub fn llr(&self, edge: usize) -> f64 {
        self.llrs[edge]
    }

    pub fn probability(&self, edge: usize) -> f64 {
        llr_to_probability(self.llrs[edge])
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.llrs.iter().map(|&llr| llr_to_probability(llr)).collect()
    }

    pub(crate) fn llrs(&self) -> &[f64] {
        &self.llrs
    }

    pub(crate) fn llrs_mut(&mut self) -> &mut [f64] {
        &mut self.llrs
    }

    /// Dense view shaped like the parity matrix: `Some(probability)` on
    /// edges, `None` where the parity matrix is zero. Edges past the end of
    /// `self` stay `None`.
    pub fn to_rows(&self, graph: &TannerGraph) -> Vec<Vec<Option<f64>>> {
        let mut rows = vec![vec![None; graph.digits()]; graph.checks()];
        for (&llr, &(check, digit)) in self.llrs.iter().zip(&graph.edges) {
            rows[check][digit] = Some(llr_to_probability(llr));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> TannerGraph {
        let mut h = Mod2Sparse::new(2, 4);
        h.insert(0, 0).unwrap();
        h.insert(0, 2).unwrap();
        h.insert(1, 1).unwrap();
        h.insert(1, 2).unwrap();
        h.insert(1, 3).unwrap();
        TannerGraph::new(&h)
    }

    #[test]
    fn test_edge_numbering() {
        let graph = sample_graph();
        assert_eq!(graph.edge_count(), 5);
        assert_eq!(graph.check_edges(0), &[0, 1]);
        assert_eq!(graph.check_edges(1), &[2, 3, 4]);
        assert_eq!(graph.digit_edges(2), &[1, 3]);
        assert_eq!(graph.edge(4), (1, 3));

        assert_eq!(graph.edge_index(1, 2), Some(3));
        assert_eq!(graph.edge_index(0, 1), None);
        assert_eq!(graph.edge_index(9, 0), None);
    }

    #[test]
    fn test_beliefs_follow_sparsity_pattern() {
        let graph = sample_graph();
        let beliefs = EdgeBeliefs::filled(graph.edge_count(), 0.0);
        let rows = beliefs.to_rows(&graph);

        assert_eq!(rows[0], vec![Some(0.5), None, Some(0.5), None]);
        assert_eq!(rows[1].iter().filter(|v| v.is_some()).count(), 3);
        assert_eq!(beliefs.probabilities(), vec![0.5; 5]);
    }
}
