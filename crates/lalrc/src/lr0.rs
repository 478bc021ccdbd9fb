//! LR(0) automaton.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    types::{Map, Set},
    util::display_fn,
    CompileError,
};
use lalrc_runtime::action::MAX_OPERAND;
use std::{collections::VecDeque, fmt};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u16);
impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}
impl StateID {
    pub const START: Self = Self(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }
    pub const fn into_raw(self) -> u16 {
        self.0
    }
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a transition in [`LR0Automaton::shifts`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShiftID(u32);
impl fmt::Debug for ShiftID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E#{:03}", self.0)
    }
}
impl ShiftID {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The LR(0) item, a.k.a. LR item core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR0Item {
    pub production: ProductionID,
    pub index: u16,
}
impl LR0Item {
    /// The symbol right after the dot.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.production(self.production)
            .right
            .get(usize::from(self.index))
            .copied()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            let production = g.production(self.production);
            write!(f, "{} -> [ ", g.nonterminals[&production.left])?;
            for (i, r) in production.right.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                if i == self.index as usize {
                    f.write_str(". ")?;
                }
                f.write_str(g.symbol_name(*r))?;
            }
            if production.right.len() == self.index as usize {
                write!(f, " .")?;
            }
            write!(f, " ]")
        })
    }
}

/// A transition edge of the automaton, labelled with a terminal (shift)
/// or a nonterminal (goto).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Shift {
    pub from: StateID,
    pub symbol: SymbolID,
    pub to: StateID,
}

#[derive(Debug, Clone)]
pub struct LR0State {
    /// Kernel items, sorted.
    pub kernels: Vec<LR0Item>,
    /// Kernel items followed by their closure.
    pub items: Vec<LR0Item>,
    pub transitions: Map<SymbolID, ShiftID>,
    /// Productions whose items are complete in this state.
    pub reduces: Vec<ProductionID>,
}

#[derive(Debug)]
pub struct LR0Automaton {
    pub states: Vec<LR0State>,
    pub shifts: Vec<Shift>,
    /// The state with the item `#Start -> S . #EOI`.
    pub accept: StateID,
}

impl LR0Automaton {
    pub fn state(&self, id: StateID) -> &LR0State {
        &self.states[id.index()]
    }

    pub fn shift(&self, id: ShiftID) -> &Shift {
        &self.shifts[id.index()]
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateID> {
        (0..self.states.len()).map(|i| StateID(i as u16))
    }

    pub fn shift_ids(&self) -> impl Iterator<Item = ShiftID> {
        (0..self.shifts.len()).map(|i| ShiftID(i as u32))
    }

    /// The target of the transition from `from` on `symbol`, if any.
    pub fn goto(&self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        self.state(from)
            .transitions
            .get(&symbol)
            .map(|&id| self.shift(id).to)
    }

    /// Follow the transitions labelled with `symbols` in order.
    pub fn walk(&self, from: StateID, symbols: &[SymbolID]) -> Option<StateID> {
        symbols
            .iter()
            .try_fold(from, |current, symbol| self.goto(current, *symbol))
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (id, state) in self.state_ids().zip(&self.states) {
                writeln!(f, "#### State {:?}", id)?;
                writeln!(f, "## items:")?;
                for item in &state.items {
                    writeln!(f, "- {}", item.display(g))?;
                }
                if !state.transitions.is_empty() {
                    writeln!(f, "## transitions:")?;
                    for (symbol, shift) in &state.transitions {
                        writeln!(
                            f,
                            "- {} => {:?}",
                            g.symbol_name(*symbol),
                            self.shift(*shift).to
                        )?;
                    }
                }
                if !state.reduces.is_empty() {
                    writeln!(f, "## reduces:")?;
                    for reduce in &state.reduces {
                        writeln!(f, "- {}", g.production(*reduce).display(g))?;
                    }
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}

/// Calculate the LR(0) automaton based on the specified grammar.
pub fn lr0(g: &Grammar) -> Result<LR0Automaton, CompileError> {
    let nonkernels = nonkernels(g);

    let mut states = Vec::<LR0State>::new();
    let mut shifts = Vec::<Shift>::new();
    let mut accept = StateID::START;

    let mut pending_states = VecDeque::<(StateID, Vec<LR0Item>)>::new();
    let start = vec![LR0Item {
        production: ProductionID::ACCEPT,
        index: 0,
    }];
    let mut isocores = Map::<Vec<LR0Item>, StateID>::default();
    isocores.insert(start.clone(), StateID::START);
    pending_states.push_back((StateID::START, start));

    let mut new_kernels = Map::<SymbolID, Vec<LR0Item>>::default();
    while let Some((current, kernels)) = pending_states.pop_front() {
        // states are expanded in the order of their identifiers.
        debug_assert_eq!(current.index(), states.len());

        let mut items: Set<LR0Item> = kernels.iter().copied().collect();
        for kernel in &kernels {
            if let Some(SymbolID::N(n)) = kernel.next_symbol(g) {
                items.extend(&nonkernels[&n]);
            }
        }

        let mut reduces = vec![];
        new_kernels.clear();
        for item in &items {
            match item.next_symbol(g) {
                Some(symbol) => {
                    let new_kernel = new_kernels.entry(symbol).or_default();
                    new_kernel.push(LR0Item {
                        index: item.index + 1,
                        ..*item
                    });
                }
                None => reduces.push(item.production),
            }
        }

        let mut transitions = Map::default();
        for (symbol, mut new_kernel) in new_kernels.drain(..) {
            new_kernel.sort();
            new_kernel.dedup();
            let next = match isocores.get(&new_kernel) {
                Some(id) => *id,
                None => {
                    let id = isocores.len();
                    if id > usize::from(MAX_OPERAND) {
                        return Err(CompileError::TooManyStates(id + 1));
                    }
                    let id = StateID(id as u16);
                    isocores.insert(new_kernel.clone(), id);
                    pending_states.push_back((id, new_kernel));
                    id
                }
            };
            if symbol == SymbolID::T(TerminalID::EOI) {
                accept = current;
            }
            transitions.insert(symbol, ShiftID(shifts.len() as u32));
            shifts.push(Shift {
                from: current,
                symbol,
                to: next,
            });
        }

        states.push(LR0State {
            kernels,
            items: items.into_iter().collect(),
            transitions,
            reduces,
        });
    }

    tracing::debug!(
        "LR(0) automaton: {} states, {} transitions",
        states.len(),
        shifts.len()
    );

    Ok(LR0Automaton {
        states,
        shifts,
        accept,
    })
}

/// The closure items added for each nonterminal right after the dot.
fn nonkernels(g: &Grammar) -> Map<NonterminalID, Set<LR0Item>> {
    let mut nonkernels: Map<NonterminalID, Set<LR0Item>> = Map::default();
    for &n in g.nonterminals.keys() {
        let mut items: Set<LR0Item> = g
            .productions_of(n)
            .map(|(production, _)| LR0Item {
                production,
                index: 0,
            })
            .collect();

        let mut added = Set::default();
        loop {
            added.clear();
            for item in &items {
                if let Some(SymbolID::N(n)) = item.next_symbol(g) {
                    added.extend(g.productions_of(n).map(|(production, _)| LR0Item {
                        production,
                        index: 0,
                    }));
                }
            }

            let changed = added
                .drain(..)
                .fold(false, |changed, item| changed | items.insert(item));
            if !changed {
                break;
            }
        }
        nonkernels.insert(n, items);
    }
    nonkernels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::examples;

    #[test]
    fn balanced_brackets() {
        let g = Grammar::define(examples::balanced).unwrap();
        let lr0 = lr0(&g).unwrap();
        eprintln!("{}", lr0.display(&g));

        // 0: start, 1: after S, 2: after a, 3: after S EOI, 4: after a S, 5: after a b, 6: after a S b
        assert_eq!(lr0.states.len(), 7);
        assert_eq!(lr0.shifts.len(), 7);

        let s = SymbolID::N(g.start_symbol);
        assert_eq!(lr0.goto(StateID::START, s), Some(lr0.accept));
        assert_eq!(
            lr0.walk(lr0.accept, &[SymbolID::T(TerminalID::EOI)])
                .map(|id| lr0.state(id).reduces.clone()),
            Some(vec![ProductionID::ACCEPT])
        );
    }

    #[test]
    fn kernels_are_deduplicated_by_set_equality() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        let lr0 = lr0(&g).unwrap();
        let kernels: Set<&[LR0Item]> = lr0.states.iter().map(|s| &s.kernels[..]).collect();
        assert_eq!(kernels.len(), lr0.states.len());
        for state in &lr0.states {
            assert!(state.kernels.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn every_state_is_reachable() {
        let g = Grammar::define(examples::with_nullable).unwrap();
        let lr0 = lr0(&g).unwrap();
        let mut reached = vec![false; lr0.states.len()];
        reached[0] = true;
        for shift in &lr0.shifts {
            reached[shift.to.index()] = true;
        }
        assert!(reached.into_iter().all(|r| r));
    }
}
