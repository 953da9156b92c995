/// Disjoint-set forest over provisional component labels.
///
/// Unions always attach the larger root under the smaller one, so the root of
/// a set is its smallest label.
#[derive(Debug, Default)]
pub(crate) struct DisjointSet {
    parent: Vec<u32>,
}

impl DisjointSet {
    /// Create a new singleton set and return its label.
    pub fn make_set(&mut self) -> u32 {
        let label = self.parent.len() as u32;
        self.parent.push(label);
        label
    }

    /// Find the root of `label`, compressing the path on the way.
    pub fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }

        let mut current = label;
        while self.parent[current as usize] != root {
            let next = self.parent[current as usize];
            self.parent[current as usize] = root;
            current = next;
        }

        root
    }

    /// Merge the sets containing `a` and `b`, returning the new root.
    pub fn union(&mut self, a: u32, b: u32) -> u32 {
        let ra = self.find(a);
        let rb = self.find(b);
        let (root, child) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parent[child as usize] = root;
        root
    }

    /// Number of labels created so far.
    pub fn len(&self) -> usize {
        self.parent.len()
    }
}

#[cfg(test)]
mod tests {
    use super::DisjointSet;

    #[test]
    fn test_union_keeps_smallest_root() {
        let mut set = DisjointSet::default();
        let labels = (0..5).map(|_| set.make_set()).collect::<Vec<_>>();
        assert_eq!(labels, vec![0, 1, 2, 3, 4]);

        assert_eq!(set.union(3, 4), 3);
        assert_eq!(set.union(4, 1), 1);
        assert_eq!(set.find(3), 1);
        assert_eq!(set.find(4), 1);
        assert_eq!(set.find(2), 2);
        assert_eq!(set.union(2, 0), 0);
        assert_eq!(set.len(), 5);
    }
}
