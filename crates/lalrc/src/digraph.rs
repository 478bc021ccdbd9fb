//! The digraph algorithm of DeRemer and Pennello.
//!
//! Given a relation `R` over nodes and an initial set `F'(x)` for each node,
//! computes `F(x) = F'(x) \cup \bigcup { F(y) | x R+ y }`. Every strongly
//! connected component is closed once, and all of its members receive the
//! same set. The traversal keeps its own stack, so deep relations do not
//! exhaust the call stack.

use std::{cmp, hash::Hash};

pub trait Set {
    fn union_with(&mut self, other: &Self);
}

impl<T> Set for crate::types::Set<T>
where
    T: Clone + Eq + Hash,
{
    fn union_with(&mut self, other: &Self) {
        self.extend(other.iter().cloned())
    }
}

impl<B> Set for bit_set::BitSet<B>
where
    B: bit_vec::BitBlock,
{
    fn union_with(&mut self, other: &Self) {
        self.union_with(other)
    }
}

/// Close `sets` over `relation`, where `relation[x]` lists the nodes `y`
/// with `x R y`.
pub fn digraph<T>(sets: &mut [T], relation: &[Vec<usize>])
where
    T: Set,
{
    debug_assert_eq!(sets.len(), relation.len());
    let n = sets.len();
    Digraph {
        sets,
        relation,
        depth: vec![0; n],
        stack: vec![],
        frames: vec![],
    }
    .run()
}

const DONE: usize = usize::MAX;

struct Frame {
    node: usize,
    edge: usize,
    depth: usize,
}

struct Digraph<'a, T> {
    sets: &'a mut [T],
    relation: &'a [Vec<usize>],
    /// 0: not visited, DONE: finished, otherwise the lowest stack depth reached.
    depth: Vec<usize>,
    stack: Vec<usize>,
    frames: Vec<Frame>,
}

impl<T> Digraph<'_, T>
where
    T: Set,
{
    fn run(&mut self) {
        for x in 0..self.sets.len() {
            if self.depth[x] == 0 {
                self.traverse(x);
            }
        }
    }

    fn traverse(&mut self, root: usize) {
        self.enter(root);

        while let Some(frame) = self.frames.last_mut() {
            let x = frame.node;
            match self.relation[x].get(frame.edge) {
                Some(&y) => {
                    frame.edge += 1;
                    if self.depth[y] == 0 {
                        self.enter(y);
                    } else {
                        self.relate(x, y);
                    }
                }
                None => {
                    let d = frame.depth;
                    self.frames.pop();

                    if self.depth[x] == d {
                        while let Some(s) = self.stack.pop() {
                            self.depth[s] = DONE;
                            if s == x {
                                break;
                            }
                            // F(s) <- F(x)
                            let (slot, added) = get_two_mut(self.sets, s, x);
                            slot.union_with(added);
                        }
                    }

                    if let Some(parent) = self.frames.last() {
                        let p = parent.node;
                        self.relate(p, x);
                    }
                }
            }
        }
    }

    fn enter(&mut self, x: usize) {
        self.stack.push(x);
        let d = self.stack.len();
        self.depth[x] = d;
        self.frames.push(Frame {
            node: x,
            edge: 0,
            depth: d,
        });
    }

    fn relate(&mut self, x: usize, y: usize) {
        self.depth[x] = cmp::min(self.depth[x], self.depth[y]);
        if x != y {
            // F(x) <- F(x) \cup F(y)
            let (slot, added) = get_two_mut(self.sets, x, y);
            slot.union_with(added);
        }
    }
}

fn get_two_mut<T>(slice: &mut [T], x: usize, y: usize) -> (&mut T, &mut T) {
    assert!(
        x != y && cmp::max(x, y) < slice.len(),
        "index condition not satisfied"
    );
    let i = (x + y) / 2 + 1;
    let (a, b) = slice.split_at_mut(i);
    if x < y {
        (&mut a[x], &mut b[y - i])
    } else {
        (&mut b[x - i], &mut a[y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bit_set::BitSet;

    fn set(bits: &[usize]) -> BitSet {
        bits.iter().copied().collect()
    }

    #[test]
    fn test_get_two_mut() {
        let mut v = vec!["a", "b", "c", "d"];
        assert!(matches!(get_two_mut(&mut v, 0, 1), t if *t.0=="a" && *t.1=="b"));
        assert!(matches!(get_two_mut(&mut v, 1, 0), t if *t.0=="b" && *t.1=="a"));
        assert!(matches!(get_two_mut(&mut v, 0, 2), t if *t.0=="a" && *t.1=="c"));
        assert!(matches!(get_two_mut(&mut v, 2, 1), t if *t.0=="c" && *t.1=="b"));
        assert!(matches!(get_two_mut(&mut v, 3, 2), t if *t.0=="d" && *t.1=="c"));
    }

    #[test]
    fn cycles_share_one_set() {
        // 0 -> 1 -> 2 -> 1, 2 -> 4, 3 -> 3
        let mut sets = vec![set(&[0]), set(&[1]), set(&[2]), set(&[3]), set(&[4])];
        let relation = vec![vec![1], vec![2], vec![1, 4], vec![3], vec![]];
        digraph(&mut sets, &relation);

        assert_eq!(sets[0], set(&[0, 1, 2, 4]));
        assert_eq!(sets[1], set(&[1, 2, 4]));
        assert_eq!(sets[2], set(&[1, 2, 4]));
        assert_eq!(sets[3], set(&[3]));
        assert_eq!(sets[4], set(&[4]));
    }

    #[test]
    fn nested_components() {
        // {1, 2, 3} with an inner back edge, entered from 0 and leading to {4, 5}.
        let mut sets: Vec<BitSet> = (0..6).map(|i| set(&[i])).collect();
        let relation = vec![
            vec![1],
            vec![2],
            vec![3, 1],
            vec![1, 4],
            vec![5],
            vec![4],
        ];
        digraph(&mut sets, &relation);

        assert_eq!(sets[0], set(&[0, 1, 2, 3, 4, 5]));
        for x in 1..=3 {
            assert_eq!(sets[x], set(&[1, 2, 3, 4, 5]));
        }
        assert_eq!(sets[4], set(&[4, 5]));
        assert_eq!(sets[5], set(&[4, 5]));
    }

    struct Max(usize);
    impl Set for Max {
        fn union_with(&mut self, other: &Self) {
            self.0 = cmp::max(self.0, other.0);
        }
    }

    #[test]
    fn long_chain_does_not_recurse() {
        let n = 200_000;
        let mut sets: Vec<Max> = (0..n).map(Max).collect();
        let relation: Vec<Vec<usize>> = (0..n)
            .map(|i| if i + 1 < n { vec![i + 1] } else { vec![0] })
            .collect();
        digraph(&mut sets, &relation);
        assert!(sets.iter().all(|s| s.0 == n - 1));
    }
}
