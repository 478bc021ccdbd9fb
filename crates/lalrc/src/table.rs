//! Construction of the parse table.

use crate::{
    conflict::{Action, Conflict, ConflictHandler},
    grammar::{Grammar, ProductionID, SymbolID, TerminalID},
    lalr::{LALRData, Reduce},
    lr0::{LR0Automaton, StateID},
    types::Map,
    CompileError,
};
use lalrc_runtime::{
    action::{MAX_OPERAND, MAX_RESOLVER},
    ConflictResolver, Line, ParseAction, ParserTable,
};

/// The table built from an automaton, with the conflicts left in it.
#[derive(Debug)]
pub struct TableData {
    pub table: ParserTable,
    pub conflicts: Vec<Conflict>,
}

/// Fill the action table of the automaton and encode it.
///
/// Cells are written in a fixed order: shifts and gotos first, then reduces
/// through the conflict handler, then accept, and finally whitespace skips.
pub fn generate(
    g: &Grammar,
    lr0: &LR0Automaton,
    lalr: &LALRData,
    resolver_depth: usize,
) -> Result<TableData, CompileError> {
    let span = tracing::debug_span!("table");
    let _entered = span.enter();

    let state_count = lr0.states.len();
    let symbol_count = g.symbol_count();
    if state_count > usize::from(MAX_OPERAND) + 1 {
        return Err(CompileError::TooManyStates(state_count));
    }
    if symbol_count > usize::from(MAX_OPERAND) {
        return Err(CompileError::TooManySymbols(symbol_count));
    }
    if g.productions.len() > usize::from(MAX_OPERAND) + 1 {
        return Err(CompileError::TooManyProductions(g.productions.len()));
    }

    let mut cells: Vec<Option<Action>> = vec![None; state_count * symbol_count];
    let cell = |state: StateID, symbol: SymbolID| state.index() * symbol_count + g.column(symbol);

    // shifts & gotos
    for shift in &lr0.shifts {
        if shift.symbol == SymbolID::T(TerminalID::EOI) {
            continue;
        }
        cells[cell(shift.from, shift.symbol)] = Some(Action::Shift(shift.to));
    }

    // reduces
    let mut handler = ConflictHandler::new(g, lr0, lalr, resolver_depth);
    for state in lr0.state_ids() {
        for &production in &lr0.state(state).reduces {
            if production == ProductionID::ACCEPT {
                continue;
            }
            let Some(lookahead) = lalr.lookahead(Reduce { state, production }) else {
                continue;
            };
            for t in lookahead.iter() {
                let index = cell(state, SymbolID::T(t));
                let action =
                    handler.place(state, t, cells[index].as_ref(), Action::Reduce(production));
                cells[index] = Some(action);
            }
        }
    }
    let conflicts = handler.conflicts;

    // accept
    cells[cell(lr0.accept, SymbolID::T(TerminalID::EOI))] = Some(Action::Accept);

    // whitespaces
    for ws in g.whitespaces() {
        for state in lr0.state_ids() {
            cells[cell(state, SymbolID::T(ws))] = Some(Action::Skip);
        }
    }

    let mut resolvers = vec![];
    let mut values = Vec::with_capacity(cells.len());
    for action in &cells {
        let action = match action {
            None | Some(Action::Error) => ParseAction::Error,
            Some(Action::Shift(to)) => ParseAction::Shift(to.into_raw()),
            Some(Action::Reduce(production)) => ParseAction::Reduce(production.into_raw()),
            Some(Action::Accept) => ParseAction::Accept,
            Some(Action::Skip) => ParseAction::Skip,
            Some(Action::Resolve(resolver)) => {
                let index = resolvers.len();
                if index > usize::from(MAX_RESOLVER) {
                    return Err(CompileError::TooManyResolvers(index + 1));
                }
                resolvers.push(ConflictResolver::new(
                    resolver
                        .lines
                        .iter()
                        .map(|(terminals, production)| Line {
                            terminals: terminals.iter().map(|t| t.into_raw()).collect(),
                            production: production.into_raw(),
                        })
                        .collect(),
                ));
                ParseAction::Resolve(index as u16)
            }
        };
        values.push(action.encode());
    }

    let lengths = g
        .productions
        .values()
        .map(|p| p.right.len() as u16)
        .collect();
    let lefts = g
        .productions
        .values()
        .map(|p| g.column(SymbolID::N(p.left)) as u16)
        .collect();
    let modes = modes(&values, state_count, g.terminal_count(), symbol_count);

    tracing::debug!(
        "parse table: {} states x {} symbols, {} resolvers, {} conflicts",
        state_count,
        symbol_count,
        resolvers.len(),
        conflicts.len()
    );

    Ok(TableData {
        table: ParserTable {
            start_state: StateID::START.into_raw(),
            symbol_count: symbol_count as u16,
            eof_symbol: TerminalID::EOI.into_raw(),
            values,
            lengths,
            lefts,
            modes,
            resolvers,
        },
        conflicts,
    })
}

/// Number the distinct sets of terminals expected by the states.
fn modes(values: &[u16], state_count: usize, terminal_count: usize, symbol_count: usize) -> Vec<u16> {
    let mut numbers = Map::<Vec<usize>, u16>::default();
    (0..state_count)
        .map(|state| {
            let row = &values[state * symbol_count..state * symbol_count + terminal_count];
            let expected: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, &value)| value != lalrc_runtime::action::ERROR)
                .map(|(t, _)| t)
                .collect();
            let next = numbers.len() as u16;
            *numbers.entry(expected).or_insert(next)
        })
        .collect()
}
