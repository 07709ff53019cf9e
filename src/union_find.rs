use std::collections::HashMap;
use std::hash::Hash;

/// Disjoint-set forest with lazily initialized elements.
///
/// An element that was never seen is its own representative.
#[derive(Debug, Clone)]
pub struct UnionFind<T> {
    parent: HashMap<T, T>,
}

impl<T> Default for UnionFind<T> {
    fn default() -> Self {
        Self {
            parent: HashMap::new(),
        }
    }
}

impl<T> UnionFind<T>
where
    T: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Representative of the set containing `x`, compressing the path on the way.
    pub fn find(&mut self, x: T) -> T {
        let mut root = x;
        while let Some(&p) = self.parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }

        let mut node = x;
        while node != root {
            let next = self.parent.get(&node).copied().unwrap_or(root);
            self.parent.insert(node, root);
            node = next;
        }

        root
    }

    /// Merge the sets of `x` and `y`; the root of `x` is attached under the root of `y`.
    pub fn union(&mut self, x: T, y: T) {
        let x_root = self.find(x);
        let y_root = self.find(y);
        if x_root != y_root {
            self.parent.insert(x_root, y_root);
        }
    }

    pub fn same(&mut self, x: T, y: T) -> bool {
        self.find(x) == self.find(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_is_own_root() {
        let mut uf = UnionFind::<u32>::new();
        assert_eq!(uf.find(5), 5);
        assert!(!uf.same(1, 2));
    }

    #[test]
    fn test_union_transitive() {
        let mut uf = UnionFind::new();
        uf.union(1, 2);
        uf.union(3, 4);
        assert!(uf.same(1, 2));
        assert!(!uf.same(2, 3));
        uf.union(2, 3);
        assert!(uf.same(1, 4));
        assert_eq!(uf.find(1), uf.find(4));
    }

    #[test]
    fn test_path_compression() {
        let mut uf = UnionFind::new();
        uf.union(1, 2);
        uf.union(2, 3);
        uf.union(3, 4);
        let root = uf.find(1);
        assert_eq!(root, 4);
        assert_eq!(uf.parent.get(&1), Some(&4));
        assert_eq!(uf.parent.get(&2), Some(&4));
    }
}
