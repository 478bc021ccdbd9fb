//! The parse table consumed by the parser driver.

use crate::{
    action::{self, ParseAction},
    pack::{self, PackedValues, UnpackError},
    resolver::ConflictResolver,
};

/// The serialized form of a parse table.
///
/// This is the record emitted by the table generator; it is turned back into a
/// [`ParserTable`] with [`ParserTable::unpack`] without re-running construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedTable {
    pub start_state: u16,
    pub symbol_count: u16,
    pub eof_symbol: u16,
    pub state_count: u16,
    pub cells: PackedValues,
    pub lengths: Vec<u16>,
    pub lefts: Vec<u16>,
    pub modes: Vec<u16>,
    pub resolvers: Vec<ConflictResolver>,
}

/// Shift/reduce table realized by a dense array.
///
/// Values are laid out state-major: `values[state * symbol_count + symbol]`.
/// Terminals and nonterminals share the symbol index space, and the cells of
/// nonterminal columns hold the goto targets as shift actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserTable {
    pub start_state: u16,
    pub symbol_count: u16,
    pub eof_symbol: u16,
    pub values: Vec<u16>,
    /// The length of productions, indexed by production.
    pub lengths: Vec<u16>,
    /// The symbol index of the left-hand side of productions.
    pub lefts: Vec<u16>,
    /// The scanner mode to use in each state.
    pub modes: Vec<u16>,
    pub resolvers: Vec<ConflictResolver>,
}

impl ParserTable {
    pub fn state_count(&self) -> usize {
        match self.symbol_count {
            0 => 0,
            n => self.values.len() / usize::from(n),
        }
    }

    pub fn production_count(&self) -> usize {
        self.lefts.len()
    }

    /// The number of terminal columns.
    ///
    /// Nonterminal columns start at the left-hand side of the accept production.
    pub fn terminal_count(&self) -> u16 {
        self.lefts.first().copied().unwrap_or(self.symbol_count)
    }

    #[inline]
    pub fn lookup(&self, state: u16, symbol: u16) -> u16 {
        self.values[usize::from(state) * usize::from(self.symbol_count) + usize::from(symbol)]
    }

    #[inline]
    pub fn action(&self, state: u16, symbol: u16) -> ParseAction {
        ParseAction::decode(self.lookup(state, symbol))
    }

    #[inline]
    pub fn get_action(value: u16) -> u16 {
        action::get_action(value)
    }

    #[inline]
    pub fn get_operand(value: u16) -> u16 {
        action::get_operand(value)
    }

    #[inline]
    pub fn get_length(&self, production: u16) -> u16 {
        self.lengths[usize::from(production)]
    }

    #[inline]
    pub fn get_left(&self, production: u16) -> u16 {
        self.lefts[usize::from(production)]
    }

    /// The state entered after reducing `production` on top of `state`.
    #[inline]
    pub fn lookup_goto(&self, state: u16, production: u16) -> u16 {
        action::get_operand(self.lookup(state, self.get_left(production)))
    }

    pub fn mode(&self, state: u16) -> u16 {
        self.modes[usize::from(state)]
    }

    pub fn resolver(&self, index: u16) -> Option<&ConflictResolver> {
        self.resolvers.get(usize::from(index))
    }

    /// Whether the terminal is discarded in every state.
    pub fn is_skipped(&self, terminal: u16) -> bool {
        self.state_count() > 0
            && terminal < self.terminal_count()
            && matches!(self.action(self.start_state, terminal), ParseAction::Skip)
    }

    /// The terminals (and nonterminals) having a non-error action in the state.
    pub fn expected(&self, state: u16) -> impl Iterator<Item = u16> + '_ {
        (0..self.symbol_count).filter(move |&symbol| self.lookup(state, symbol) != action::ERROR)
    }

    pub fn pack(&self) -> PackedTable {
        PackedTable {
            start_state: self.start_state,
            symbol_count: self.symbol_count,
            eof_symbol: self.eof_symbol,
            state_count: self.state_count() as u16,
            cells: pack::compact(&self.values),
            lengths: self.lengths.clone(),
            lefts: self.lefts.clone(),
            modes: self.modes.clone(),
            resolvers: self.resolvers.clone(),
        }
    }

    pub fn unpack(packed: &PackedTable) -> Result<Self, UnpackError> {
        if packed.lengths.len() != packed.lefts.len() {
            return Err(UnpackError::Dimensions(format!(
                "{} production lengths, {} left-hand sides",
                packed.lengths.len(),
                packed.lefts.len()
            )));
        }
        if packed.modes.len() != usize::from(packed.state_count) {
            return Err(UnpackError::Dimensions(format!(
                "{} modes for {} states",
                packed.modes.len(),
                packed.state_count
            )));
        }
        if packed.eof_symbol >= packed.symbol_count {
            return Err(UnpackError::Dimensions(format!(
                "end-of-input symbol {} out of {} symbols",
                packed.eof_symbol, packed.symbol_count
            )));
        }

        let len = usize::from(packed.state_count) * usize::from(packed.symbol_count);
        let values = pack::expand(&packed.cells, len)?;
        Ok(Self {
            start_state: packed.start_state,
            symbol_count: packed.symbol_count,
            eof_symbol: packed.eof_symbol,
            values,
            lengths: packed.lengths.clone(),
            lefts: packed.lefts.clone(),
            modes: packed.modes.clone(),
            resolvers: packed.resolvers.clone(),
        })
    }
}
