//! Union-find (disjoint set union) over dense vertex indices.
//!
//! Kruskal accepts an edge only when its endpoints are in different sets;
//! component labelling runs a second, independent instance over every edge.

#[derive(Clone, Debug)]
pub(crate) struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Representative of `node`'s set, compressing the path on the way.
    pub(crate) fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        while self.parent[node] != node {
            let parent = self.parent[node];
            self.parent[node] = root;
            node = parent;
        }

        root
    }

    /// Merge the sets of `left` and `right`. Returns `false` when they were
    /// already one set.
    pub(crate) fn union(&mut self, left: usize, right: usize) -> bool {
        let mut left = self.find(left);
        let mut right = self.find(right);
        if left == right {
            return false;
        }
        let left_rank = self.rank[left];
        let right_rank = self.rank[right];
        if left_rank < right_rank {
            std::mem::swap(&mut left, &mut right);
        }
        self.parent[right] = left;
        if left_rank == right_rank {
            self.rank[left] = left_rank.saturating_add(1);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_joins_sets() {
        let mut sets = DisjointSet::new(4);

        assert!(sets.union(0, 1));
        assert!(sets.union(2, 3));
        assert_ne!(sets.find(0), sets.find(2));

        assert!(sets.union(1, 3));
        assert_eq!(sets.find(0), sets.find(2));
    }

    #[test]
    fn union_within_set_is_rejected() {
        let mut sets = DisjointSet::new(3);
        assert!(sets.union(0, 1));
        assert!(sets.union(1, 2));
        assert!(!sets.union(0, 2));
    }
}
