//! Lineage graph derivation
//!
//! Every parent (received or consumed-input) is linked to every child
//! (produced-output) of the same action. No per-report attribution is made.

use crate::domain::{ActionId, LineageEdge, ReportId};
use chrono::{DateTime, Utc};

/// Parent/child pairs for one action, not yet bound to an action id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageGraph {
    pairs: Vec<(ReportId, ReportId)>,
}

impl LineageGraph {
    /// Builds the full cross-product of `parents` × `children`
    pub fn build(parents: &[ReportId], children: &[ReportId]) -> Self {
        let pairs = parents
            .iter()
            .flat_map(|parent| children.iter().map(move |child| (*parent, *child)))
            .collect();
        Self { pairs }
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if there are no edges
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `(parent, child)` pairs
    pub fn pairs(&self) -> &[(ReportId, ReportId)] {
        &self.pairs
    }

    /// Stamps every pair with the action that created it
    pub fn edges(&self, action_id: ActionId, created_at: DateTime<Utc>) -> Vec<LineageEdge> {
        self.pairs
            .iter()
            .map(|(parent, child)| LineageEdge {
                action_id,
                parent_report_id: *parent,
                child_report_id: *child,
                created_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    fn ids(n: usize) -> Vec<ReportId> {
        (0..n).map(|_| ReportId::new()).collect()
    }

    #[test_case(0, 0, 0)]
    #[test_case(1, 0, 0)]
    #[test_case(0, 3, 0)]
    #[test_case(2, 1, 2)]
    #[test_case(3, 4, 12)]
    fn test_edge_count_is_product(parents: usize, children: usize, expected: usize) {
        let graph = LineageGraph::build(&ids(parents), &ids(children));
        assert_eq!(graph.len(), expected);
    }

    #[test]
    fn test_every_combination_once() {
        let parents = ids(3);
        let children = ids(2);
        let graph = LineageGraph::build(&parents, &children);

        let unique: HashSet<_> = graph.pairs().iter().copied().collect();
        assert_eq!(unique.len(), 6);
        for p in &parents {
            for c in &children {
                assert!(unique.contains(&(*p, *c)));
            }
        }
    }

    #[test]
    fn test_edges_carry_action_id() {
        let graph = LineageGraph::build(&ids(2), &ids(1));
        let edges = graph.edges(ActionId::new(42), Utc::now());
        assert!(edges.iter().all(|e| e.action_id == ActionId::new(42)));
    }
}
