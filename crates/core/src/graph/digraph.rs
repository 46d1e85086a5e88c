use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt::Debug;

/// Directed graph backed by an ordered adjacency map.
///
/// Each vertex of type `T` maps to the set of its outgoing neighbors.
/// Vertices are added implicitly when they appear in an edge, or explicitly
/// via [`add_vertex`](Self::add_vertex). Iteration over vertices and
/// neighbors is in ascending order, so every search over the graph is
/// deterministic.
///
/// Used as the wait-for graph of a scheduling run: an edge `a -> b` means
/// transaction `a` was denied a lock held by `b`.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct DiGraph<T>
where
    T: Ord + Clone + Debug,
{
    /// Maps each vertex to the set of vertices it has edges to.
    pub adj_map: BTreeMap<T, BTreeSet<T>>,
}

impl<T> DiGraph<T>
where
    T: Ord + Clone + Debug,
{
    /// Inserts a directed edge from `source` to `target`.
    ///
    /// Both vertices are added to the graph if not already present. Returns
    /// `true` if the edge is new.
    pub fn add_edge(&mut self, source: T, target: T) -> bool {
        self.adj_map.entry(target.clone()).or_default();
        self.adj_map.entry(source).or_default().insert(target)
    }

    /// Inserts directed edges from `source` to every vertex in `targets`.
    pub fn add_edges(&mut self, source: &T, targets: &[T]) {
        for target in targets {
            self.add_edge(source.clone(), target.clone());
        }
    }

    /// Adds a vertex with no outgoing edges (if not already present).
    pub fn add_vertex(&mut self, source: T) {
        self.adj_map.entry(source).or_default();
    }

    /// Returns `true` if an edge from `source` to `target` exists.
    pub fn has_edge(&self, source: &T, target: &T) -> bool {
        self.adj_map
            .get(source)
            .is_some_and(|neighbor| neighbor.contains(target))
    }

    /// Removes every outgoing edge of `source`, keeping the vertex.
    pub fn clear_outgoing(&mut self, source: &T) {
        if let Some(neighbors) = self.adj_map.get_mut(source) {
            neighbors.clear();
        }
    }

    /// Outgoing neighbors of `source` in ascending order.
    pub fn successors<'a>(&'a self, source: &T) -> impl Iterator<Item = &'a T> + 'a {
        self.adj_map.get(source).into_iter().flatten()
    }

    /// Number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adj_map.values().map(BTreeSet::len).sum()
    }

    /// Returns the first cycle found by a depth-first search, or `None` if
    /// the graph is acyclic.
    ///
    /// Roots are tried in ascending order and neighbors are followed in
    /// ascending order. The search tracks only the current path: a vertex
    /// that repeats on the path closes a cycle, while a vertex reached
    /// earlier on an abandoned branch is explored again. The returned cycle
    /// starts at the repeated vertex and lists the path from there on.
    ///
    /// Runs on an explicit stack, so deep graphs do not grow the call stack.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<T>> {
        for root in self.adj_map.keys() {
            let mut path: Vec<&T> = Vec::from([root]);
            let mut stack = Vec::from([self.successors(root)]);

            while let Some(frontier) = stack.last_mut() {
                match frontier.next() {
                    Some(next) => {
                        if let Some(start) = path.iter().position(|&vertex| vertex == next) {
                            return Some(path[start..].iter().map(|&v| v.clone()).collect());
                        }
                        path.push(next);
                        stack.push(self.successors(next));
                    }
                    None => {
                        stack.pop();
                        path.pop();
                    }
                }
            }
        }
        None
    }

    /// Detects if the graph contains a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Returns all edges as a list of (source, target) pairs.
    #[must_use]
    pub fn to_edge_list(&self) -> Vec<(T, T)> {
        let mut edges = Vec::new();
        for (src, dsts) in &self.adj_map {
            for dst in dsts {
                edges.push((src.clone(), dst.clone()));
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_graph() {
        let mut graph: DiGraph<u32> = DiGraph::default();
        assert!(graph.add_edge(1, 2));
        assert!(graph.add_edge(2, 3));
        assert!(graph.add_edge(3, 4));
        assert!(!graph.add_edge(1, 2));

        assert!(graph.has_edge(&1, &2));
        assert!(graph.has_edge(&2, &3));
        assert!(!graph.has_edge(&1, &3));
        assert!(!graph.has_edge(&2, &1));
        assert_eq!(graph.edge_count(), 3);

        assert!(!graph.has_cycle());
        assert_eq!(graph.to_edge_list(), vec![(1, 2), (2, 3), (3, 4)]);
    }

    #[test]
    fn test_cycle() {
        let mut graph: DiGraph<u32> = DiGraph::default();
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(3, 4);
        graph.add_edge(4, 5);
        graph.add_edge(5, 1);

        assert_eq!(graph.find_cycle(), Some(vec![1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_cycle_excludes_path_prefix() {
        // 1 -> 2 -> 3 -> 4 -> {5, 6}, 5 -> {4, 6}, 6 -> 4
        let mut graph: DiGraph<u32> = DiGraph::default();
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(3, 4);
        graph.add_edges(&4, &[5, 6]);
        graph.add_edges(&5, &[4, 6]);
        graph.add_edge(6, 4);

        assert_eq!(graph.find_cycle(), Some(vec![4, 5]));
    }

    #[test]
    fn test_abandoned_branch_is_not_a_cycle() {
        // diamond: 1 -> {2, 3}, 2 -> 4, 3 -> 4
        let mut graph: DiGraph<u32> = DiGraph::default();
        graph.add_edges(&1, &[2, 3]);
        graph.add_edge(2, 4);
        graph.add_edge(3, 4);

        assert_eq!(graph.find_cycle(), None);
    }

    #[test]
    fn test_self_loop() {
        let mut graph: DiGraph<u32> = DiGraph::default();
        graph.add_edge(3, 3);
        assert_eq!(graph.find_cycle(), Some(vec![3]));
    }

    #[test]
    fn test_lowest_root_wins() {
        let mut graph: DiGraph<u32> = DiGraph::default();
        graph.add_edge(5, 6);
        graph.add_edge(6, 5);
        graph.add_edge(2, 3);
        graph.add_edge(3, 2);

        assert_eq!(graph.find_cycle(), Some(vec![2, 3]));
    }

    #[test]
    fn test_clear_outgoing_breaks_cycle() {
        let mut graph: DiGraph<u32> = DiGraph::default();
        graph.add_edge(1, 2);
        graph.add_edge(2, 1);
        assert!(graph.has_cycle());

        graph.clear_outgoing(&2);
        assert!(!graph.has_cycle());
        assert!(graph.adj_map.contains_key(&2));
        assert_eq!(graph.successors(&2).count(), 0);
    }

    #[test]
    fn test_empty_graph() {
        let mut graph: DiGraph<u32> = DiGraph::default();
        assert_eq!(graph.find_cycle(), None);
        graph.add_vertex(1);
        assert_eq!(graph.find_cycle(), None);
        assert_eq!(graph.successors(&7).count(), 0);
    }
}
