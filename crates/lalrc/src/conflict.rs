//! Resolution of the actions competing for the same table cell.

use crate::{
    grammar::{Grammar, ProductionID, TerminalID},
    lalr::{LALRData, Reduce},
    lr0::{LR0Automaton, StateID},
    prefix::{Prefix, PrefixSet, PrefixSets},
    util::display_fn,
};
use std::fmt;

/// The action placed in a cell while the table is being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateID),
    Reduce(ProductionID),
    Accept,
    Skip,
    Error,
    /// Reduce/reduce conflict deferred to the run time.
    Resolve(Resolver),
}

/// The competing productions of a cell and the sequences selecting them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    pub productions: Vec<ProductionID>,
    /// The terminals following the conflicting one, mapped to the production to reduce.
    pub lines: Vec<(Prefix, ProductionID)>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShiftReduce => f.write_str("shift/reduce"),
            Self::ReduceReduce => f.write_str("reduce/reduce"),
        }
    }
}

/// A conflict left unresolved in the table. The cell holds an error action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub state: StateID,
    pub symbol: TerminalID,
    /// The shift target, for shift/reduce conflicts.
    pub shift: Option<StateID>,
    pub productions: Vec<ProductionID>,
}

impl Conflict {
    pub fn display<'g>(
        &'g self,
        g: &'g Grammar,
        lr0: &'g LR0Automaton,
    ) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(
                f,
                "{} conflict in state {:?} on `{}':",
                self.kind, self.state, g.terminals[&self.symbol].name
            )?;
            for kernel in &lr0.state(self.state).kernels {
                writeln!(f, "  {}", kernel.display(g))?;
            }
            if let Some(to) = self.shift {
                writeln!(f, "- shift to {:?}", to)?;
            }
            for production in &self.productions {
                writeln!(f, "- reduce by {}", g.production(*production).display(g))?;
            }
            Ok(())
        })
    }
}

/// Decides the action of the cells written more than once.
#[derive(Debug)]
pub struct ConflictHandler<'a> {
    g: &'a Grammar,
    lr0: &'a LR0Automaton,
    lalr: &'a LALRData,
    depth: usize,
    prefixes: Option<PrefixSets>,
    pub conflicts: Vec<Conflict>,
}

impl<'a> ConflictHandler<'a> {
    /// Create a handler whose resolvers read up to `depth` terminals past the conflicting one.
    pub fn new(g: &'a Grammar, lr0: &'a LR0Automaton, lalr: &'a LALRData, depth: usize) -> Self {
        Self {
            g,
            lr0,
            lalr,
            depth,
            prefixes: None,
            conflicts: vec![],
        }
    }

    /// Place `action` into the cell `(state, symbol)` currently holding `current`,
    /// and return the resulting action.
    pub fn place(
        &mut self,
        state: StateID,
        symbol: TerminalID,
        current: Option<&Action>,
        action: Action,
    ) -> Action {
        let current = match current {
            None => return action,
            Some(current) if *current == action => return action,
            Some(current) => current,
        };

        match (current, action) {
            (Action::Error, _) => Action::Error,

            (Action::Shift(to), Action::Reduce(production)) => {
                tracing::trace!(
                    "shift/reduce conflict: state={:?}, symbol={:?}, production={:?}",
                    state,
                    symbol,
                    production
                );
                self.conflicts.push(Conflict {
                    kind: ConflictKind::ShiftReduce,
                    state,
                    symbol,
                    shift: Some(*to),
                    productions: vec![production],
                });
                Action::Error
            }

            (Action::Reduce(existing), Action::Reduce(production)) => {
                self.resolve(state, symbol, vec![*existing, production])
            }

            (Action::Resolve(resolver), Action::Reduce(production)) => {
                if resolver.productions.contains(&production) {
                    return Action::Resolve(resolver.clone());
                }
                let mut productions = resolver.productions.clone();
                productions.push(production);
                self.resolve(state, symbol, productions)
            }

            (current, action) => {
                tracing::trace!(
                    "overwrite: state={:?}, symbol={:?}, {:?} -> {:?}",
                    state,
                    symbol,
                    current,
                    action
                );
                action
            }
        }
    }

    /// Build a resolver selecting one of `productions` by the terminals
    /// following `symbol`, or record a conflict if their contexts overlap.
    fn resolve(
        &mut self,
        state: StateID,
        symbol: TerminalID,
        productions: Vec<ProductionID>,
    ) -> Action {
        let (g, lr0, lalr, depth) = (self.g, self.lr0, self.lalr, self.depth);
        let prefixes = self
            .prefixes
            .get_or_insert_with(|| PrefixSets::compute(g, lr0, lalr, depth.saturating_add(1)));

        let tails: Vec<PrefixSet> = productions
            .iter()
            .map(|&production| {
                prefixes
                    .reduce(lalr, Reduce { state, production })
                    .follows(symbol)
            })
            .collect();

        let disjoint = tails
            .iter()
            .enumerate()
            .all(|(i, x)| tails[i + 1..].iter().all(|y| x.is_disjoint(y)));
        if !disjoint {
            tracing::trace!(
                "reduce/reduce conflict: state={:?}, symbol={:?}, productions={:?}",
                state,
                symbol,
                productions
            );
            self.conflicts.push(Conflict {
                kind: ConflictKind::ReduceReduce,
                state,
                symbol,
                shift: None,
                productions,
            });
            return Action::Error;
        }

        let lines = productions
            .iter()
            .zip(&tails)
            .flat_map(|(&production, tails)| tails.iter().map(move |t| (t.clone(), production)))
            .collect();
        tracing::trace!(
            "resolver: state={:?}, symbol={:?}, productions={:?}",
            state,
            symbol,
            productions
        );
        Action::Resolve(Resolver { productions, lines })
    }
}
