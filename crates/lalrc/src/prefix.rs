//! Sets of terminal sequences bounded by a length `k`.
//!
//! These extend the LALR(1) lookahead sets to the right context of length `k`
//! and are used to tell apart reductions which share a single lookahead terminal.

use crate::{
    grammar::{Grammar, NonterminalID, SymbolID, TerminalID},
    lalr::{LALRData, Reduce},
    lr0::{LR0Automaton, StateID},
    types::{Map, Queue, Set},
};
use std::fmt;

/// A terminal sequence no longer than `k`.
pub type Prefix = Vec<TerminalID>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixSet {
    inner: Set<Prefix>,
}

impl PrefixSet {
    /// The set containing only the empty sequence.
    pub fn epsilon() -> Self {
        Self::from_iter([vec![]])
    }

    pub fn insert(&mut self, prefix: Prefix) -> bool {
        self.inner.insert(prefix)
    }

    /// Add all prefixes of `other` and report whether this set has grown.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let len = self.inner.len();
        self.inner.extend(other.inner.iter().cloned());
        self.inner.len() != len
    }

    pub fn contains(&self, prefix: &[TerminalID]) -> bool {
        self.inner.contains(prefix)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prefix> + '_ {
        self.inner.iter()
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.inner.is_disjoint(&other.inner)
    }

    /// `{ (xy):k | x \in self, y \in other }`
    pub fn concat_k(&self, other: &Self, k: usize) -> Self {
        let mut concat = Self::default();
        for x in &self.inner {
            if x.len() >= k {
                concat.insert(x[..k].to_vec());
                continue;
            }
            for y in &other.inner {
                let rest = std::cmp::min(k - x.len(), y.len());
                let mut prefix = Vec::with_capacity(x.len() + rest);
                prefix.extend_from_slice(x);
                prefix.extend_from_slice(&y[..rest]);
                concat.insert(prefix);
            }
        }
        concat
    }

    /// The tails of the prefixes starting with `first`.
    pub fn follows(&self, first: TerminalID) -> Self {
        self.inner
            .iter()
            .filter(|prefix| prefix.first() == Some(&first))
            .map(|prefix| prefix[1..].to_vec())
            .collect()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        crate::util::display_fn(move |f| {
            f.write_str("{")?;
            for (i, prefix) in self.inner.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str("[")?;
                for (j, t) in prefix.iter().enumerate() {
                    if j > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str(&g.terminals[t].name)?;
                }
                f.write_str("]")?;
            }
            f.write_str("}")
        })
    }
}

impl FromIterator<Prefix> for PrefixSet {
    fn from_iter<I: IntoIterator<Item = Prefix>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// FIRST_k sets of the nonterminals.
#[derive(Debug)]
pub struct FirstSets {
    k: usize,
    sets: Map<NonterminalID, PrefixSet>,
}

impl FirstSets {
    pub fn compute(g: &Grammar, k: usize) -> Self {
        let mut sets: Map<NonterminalID, PrefixSet> = g
            .nonterminals
            .keys()
            .map(|&n| (n, PrefixSet::default()))
            .collect();
        loop {
            let mut changed = false;
            for p in g.productions.values() {
                let first = first_k(&sets, &p.right, k);
                if let Some(set) = sets.get_mut(&p.left) {
                    changed |= set.union_with(&first);
                }
            }
            if !changed {
                break;
            }
        }
        Self { k, sets }
    }

    /// FIRST_k of a sequence of symbols.
    pub fn first_k(&self, symbols: &[SymbolID]) -> PrefixSet {
        first_k(&self.sets, symbols, self.k)
    }
}

fn first_k(sets: &Map<NonterminalID, PrefixSet>, symbols: &[SymbolID], k: usize) -> PrefixSet {
    let mut first = PrefixSet::epsilon();
    for symbol in symbols {
        if first.iter().all(|prefix| prefix.len() >= k) {
            break;
        }
        first = match symbol {
            SymbolID::T(t) => first.concat_k(&PrefixSet::from_iter([vec![*t]]), k),
            SymbolID::N(n) => match sets.get(n) {
                Some(set) => first.concat_k(set, k),
                None => PrefixSet::default(),
            },
        };
    }
    first
}

/// The right contexts of length `k` of every goto `(p,A)`.
#[derive(Debug)]
pub struct PrefixSets {
    pub k: usize,
    pub first: FirstSets,
    /// Indexed by the goto indices of [`LALRData::gotos`].
    pub follows: Vec<PrefixSet>,
}

impl PrefixSets {
    /// Propagate the right contexts from the accept production through every
    /// production occurrence until no set grows.
    pub fn compute(g: &Grammar, lr0: &LR0Automaton, lalr: &LALRData, k: usize) -> Self {
        let span = tracing::debug_span!("prefix_sets", k);
        let _entered = span.enter();

        let first = FirstSets::compute(g, k);

        // Follow_k(p,A) \supseteq FIRST_k(γ) . Follow_k(p',B)
        //   for B -> βAγ, p' -(β)-> p
        // The accept production has no goto on its left side, so its context is {ε}.
        struct Occurrence {
            target: usize,
            rest: PrefixSet,
            source: Option<usize>,
        }
        let mut occurrences = vec![];
        let mut walk = |from: StateID, source: Option<usize>, right: &[SymbolID]| {
            let mut current = from;
            for (i, symbol) in right.iter().enumerate() {
                if let SymbolID::N(a) = symbol {
                    if let Some(target) = lalr.goto_index(current, *a) {
                        occurrences.push(Occurrence {
                            target,
                            rest: first.first_k(&right[i + 1..]),
                            source,
                        });
                    }
                }
                match lr0.goto(current, *symbol) {
                    Some(next) => current = next,
                    None => break,
                }
            }
        };
        for (index, goto) in lalr.gotos.keys().enumerate() {
            for (_, p) in g.productions_of(goto.symbol) {
                walk(goto.from, Some(index), &p.right);
            }
        }
        for (_, p) in g.productions_of(NonterminalID::START) {
            walk(StateID::START, None, &p.right);
        }

        let mut dependents = vec![vec![]; lalr.gotos.len()];
        for (i, occurrence) in occurrences.iter().enumerate() {
            if let Some(source) = occurrence.source {
                dependents[source].push(i);
            }
        }

        let epsilon = PrefixSet::epsilon();
        let mut follows = vec![PrefixSet::default(); lalr.gotos.len()];
        let mut pending: Queue<usize> = (0..occurrences.len()).collect();
        while let Some(i) = pending.pop() {
            let occurrence = &occurrences[i];
            let context = match occurrence.source {
                Some(source) => &follows[source],
                None => &epsilon,
            };
            let added = occurrence.rest.concat_k(context, k);
            if follows[occurrence.target].union_with(&added) {
                for &dependent in &dependents[occurrence.target] {
                    pending.push(dependent);
                }
            }
        }

        tracing::debug!(
            "k-prefix sets: {} sequences over {} gotos",
            follows.iter().map(PrefixSet::len).sum::<usize>(),
            follows.len()
        );

        Self { k, first, follows }
    }

    /// The right contexts of the reduce item `(q, A -> ω)`.
    pub fn reduce(&self, lalr: &LALRData, reduce: Reduce) -> PrefixSet {
        let mut set = PrefixSet::default();
        for &goto in lalr.lookbacks.get(&reduce).into_iter().flatten() {
            set.union_with(&self.follows[goto]);
        }
        set
    }
}
