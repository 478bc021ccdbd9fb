//! LALR(1) look-ahead sets computation.
//!
//! The algorithm is based on DeRemer and Pennello's method\[1\].
//!
//! \[1\]: DeRemer and Pennello, Efficient Computation of LALR(1) Look-Ahead Sets
//!       <https://dl.acm.org/doi/10.1145/69622.357187>

use crate::{
    digraph::digraph,
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalSet},
    lr0::{LR0Automaton, ShiftID, StateID},
    types::Map,
};
use std::fmt;

/// A nonterminal transition `(p, A)`.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Goto {
    pub from: StateID,
    pub symbol: NonterminalID,
}

impl fmt::Debug for Goto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?},{:?})", self.from, self.symbol)
    }
}

/// A completed item `(q, A -> ω)`.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Reduce {
    pub state: StateID,
    pub production: ProductionID,
}

impl fmt::Debug for Reduce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?},{:?})", self.state, self.production)
    }
}

/// The relations and sets computed over the nonterminal transitions.
///
/// Every per-goto vector is indexed by the position of the goto in `gotos`.
#[derive(Debug)]
pub struct LALRData {
    pub gotos: Map<Goto, ShiftID>,
    pub reads: Vec<Vec<usize>>,
    pub includes: Vec<Vec<usize>>,
    pub lookbacks: Map<Reduce, Vec<usize>>,
    pub read_sets: Vec<TerminalSet>,
    pub follow_sets: Vec<TerminalSet>,
    pub lookaheads: Map<Reduce, TerminalSet>,
}

impl LALRData {
    pub fn goto_index(&self, from: StateID, symbol: NonterminalID) -> Option<usize> {
        self.gotos.get_index_of(&Goto { from, symbol })
    }

    pub fn lookahead(&self, reduce: Reduce) -> Option<&TerminalSet> {
        self.lookaheads.get(&reduce)
    }
}

/// Compute the look-ahead sets corresponding to the reductions in the provided LR automaton.
pub fn lalr(g: &Grammar, lr0: &LR0Automaton) -> LALRData {
    // Step 0: extract goto transitions and their direct-read sets.
    //
    //   DirectRead(p,A) := { t \in T | \exists r:StateID s.t. p --(A)--> r --(t)--> ... }
    let mut gotos = Map::default();
    let mut direct_reads = vec![];
    for id in lr0.shift_ids() {
        let shift = lr0.shift(id);
        if let SymbolID::N(symbol) = shift.symbol {
            gotos.insert(
                Goto {
                    from: shift.from,
                    symbol,
                },
                id,
            );
            direct_reads.push(shifted_terminals(lr0, shift.to));
        }
    }

    // Step 0.5: calculate the relations.
    //
    // - (p,A) `reads` (r,C) <==> p --(A)--> r --(C)--> && C =>* ε
    // - (p,A) `includes` (p',B) <==> B -> βAγ, γ =>* ε, p' -(β)-> p
    // - (q, A->ω) `lookback` (p,A) <==> p --(ω)--> q
    let reads = calc_reads(g, lr0, &gotos);
    let (includes, lookbacks) = calc_includes_and_lookbacks(g, lr0, &gotos);

    // Step 1: Read(p,A) = DirectRead(p,A) \cup \bigcup { Read(r,C) | (p,A) `reads` (r,C) }
    let mut read_sets = direct_reads;
    digraph(&mut read_sets, &reads);

    // Step 2: Follow(p,A) = Read(p,A) \cup \bigcup { Follow(p',B) | (p,A) `includes` (p',B) }
    let mut follow_sets = read_sets.clone();
    digraph(&mut follow_sets, &includes);

    // Step 3: LA(q,A->ω) = \bigcup { Follow(p,A) | (q,A->ω) `lookback` (p,A) }
    let mut lookaheads = Map::<Reduce, TerminalSet>::default();
    for (reduce, lookback) in &lookbacks {
        let lookahead = lookaheads.entry(*reduce).or_default();
        for &goto in lookback {
            lookahead.union_with(&follow_sets[goto]);
        }
    }

    tracing::debug!(
        "LALR(1): {} gotos, {} reads edges, {} includes edges",
        gotos.len(),
        reads.iter().map(Vec::len).sum::<usize>(),
        includes.iter().map(Vec::len).sum::<usize>(),
    );

    LALRData {
        gotos,
        reads,
        includes,
        lookbacks,
        read_sets,
        follow_sets,
        lookaheads,
    }
}

fn shifted_terminals(lr0: &LR0Automaton, state: StateID) -> TerminalSet {
    lr0.state(state)
        .transitions
        .keys()
        .filter_map(|symbol| match symbol {
            SymbolID::T(t) => Some(*t),
            SymbolID::N(..) => None,
        })
        .collect()
}

fn calc_reads(g: &Grammar, lr0: &LR0Automaton, gotos: &Map<Goto, ShiftID>) -> Vec<Vec<usize>> {
    gotos
        .values()
        .map(|&id| {
            let r = lr0.shift(id).to;
            lr0.state(r)
                .transitions
                .keys()
                .filter_map(|symbol| match symbol {
                    SymbolID::N(c) if g.nullables.contains(c) => gotos.get_index_of(&Goto {
                        from: r,
                        symbol: *c,
                    }),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// Walk every production `B -> ω` from every state `p'` with a goto on `B`.
///
/// Each nonterminal `A` met along the way whose remainder is nullable yields
/// `(p,A) includes (p',B)`, and the state reached at the end yields
/// `(q, B -> ω) lookback (p',B)`.
fn calc_includes_and_lookbacks(
    g: &Grammar,
    lr0: &LR0Automaton,
    gotos: &Map<Goto, ShiftID>,
) -> (Vec<Vec<usize>>, Map<Reduce, Vec<usize>>) {
    let mut includes = vec![vec![]; gotos.len()];
    let mut lookbacks = Map::<Reduce, Vec<usize>>::default();

    for (b_index, b_key) in gotos.keys().enumerate() {
        'productions: for (production, p) in g.productions_of(b_key.symbol) {
            let mut current = b_key.from;
            for (i, symbol) in p.right.iter().enumerate() {
                if let SymbolID::N(a) = symbol {
                    if g.is_nullable(&p.right[i + 1..]) {
                        if let Some(a_index) = gotos.get_index_of(&Goto {
                            from: current,
                            symbol: *a,
                        }) {
                            if !includes[a_index].contains(&b_index) {
                                includes[a_index].push(b_index);
                            }
                        }
                    }
                }
                match lr0.goto(current, *symbol) {
                    Some(next) => current = next,
                    None => continue 'productions,
                }
            }

            let lookback = lookbacks
                .entry(Reduce {
                    state: current,
                    production,
                })
                .or_default();
            if !lookback.contains(&b_index) {
                lookback.push(b_index);
            }
        }
    }

    (includes, lookbacks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grammar::{examples, TerminalID},
        lr0::lr0,
    };

    fn terminals(g: &Grammar, set: &TerminalSet) -> Vec<String> {
        set.iter()
            .map(|t| g.terminals[&t].name.clone())
            .collect()
    }

    #[test]
    fn balanced_brackets() {
        let g = Grammar::define(examples::balanced).unwrap();
        let lr0 = lr0(&g).unwrap();
        let lalr = lalr(&g, &lr0);

        for reduce in lalr.lookaheads.keys() {
            let production = g.production(reduce.production);
            if production.right.len() == 2 {
                // S -> a b .
                assert_eq!(
                    terminals(&g, &lalr.lookaheads[reduce]),
                    vec!["$end", "b"]
                );
            }
        }
    }

    #[test]
    fn read_sets_are_subsets_of_follow_sets() {
        let g = Grammar::define(examples::with_nullable).unwrap();
        let lr0 = lr0(&g).unwrap();
        let lalr = lalr(&g, &lr0);
        assert!(lalr.reads.iter().any(|r| !r.is_empty()));
        for (read, follow) in lalr.read_sets.iter().zip(&lalr.follow_sets) {
            assert!(read.is_subset(follow));
        }
    }

    #[test]
    fn every_reduce_has_lookahead() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        let lr0 = lr0(&g).unwrap();
        let lalr = lalr(&g, &lr0);
        for state in lr0.state_ids() {
            for &production in &lr0.state(state).reduces {
                if production == ProductionID::ACCEPT {
                    continue;
                }
                let la = lalr.lookahead(Reduce { state, production }).unwrap();
                assert!(!la.is_empty());
            }
        }

        let start = lalr
            .goto_index(StateID::START, g.start_symbol)
            .unwrap();
        assert!(lalr.follow_sets[start].contains(TerminalID::EOI));
    }
}
