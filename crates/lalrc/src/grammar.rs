//! Context-free grammars.

use crate::{
    digraph,
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

// ==== Symbols =====

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalID(u16);
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self(0);
    const OFFSET: u16 = 1;

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
impl fmt::Debug for TerminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::EOI => write!(f, "T#End"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonterminalID(u16);
impl NonterminalID {
    /// The synthetic start symbol of the augmented grammar.
    pub const START: Self = Self(0);
    const OFFSET: u16 = 1;

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
impl fmt::Debug for NonterminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::START => write!(f, "N#Start"),
            _ => write!(f, "N#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}
impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => write!(f, "{:?}", t),
            Self::N(n) => write!(f, "{:?}", n),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionID(u16);
impl ProductionID {
    /// The augmented production `#Start -> S #EOI`.
    pub const ACCEPT: Self = Self(0);
    const OFFSET: u16 = 1;

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
impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::ACCEPT => write!(f, "P#Accept"),
            _ => write!(f, "P#{:03}", self.0),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}
impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.index())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.index())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    pub fn is_subset(&self, other: &Self) -> bool {
        self.inner.is_subset(&other.inner)
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .map(|raw| TerminalID(raw.try_into().unwrap_or(u16::MAX)))
    }
}
impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(TerminalID::index).collect(),
        }
    }
}
impl digraph::Set for TerminalSet {
    fn union_with(&mut self, other: &Self) {
        self.union_with(other)
    }
}

// ==== Grammar ====

#[derive(Debug)]
pub struct Terminal {
    pub name: String,
    /// Whether the terminal is discarded wherever it appears.
    pub whitespace: bool,
}

#[derive(Debug)]
pub struct Production {
    pub left: NonterminalID,
    pub right: Vec<SymbolID>,
}
impl Production {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} -> ", g.nonterminals[&self.left])?;
            if self.right.is_empty() {
                f.write_str("ε")?;
            } else {
                for (i, r) in self.right.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str(g.symbol_name(*r))?;
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("duplicated terminal `{}'", _0)]
    DuplicateTerminal(String),

    #[error("duplicated nonterminal `{}'", _0)]
    DuplicateNonterminal(String),

    #[error("duplicated production for `{}'", _0)]
    DuplicateProduction(String),

    #[error("whitespace terminal `{}' cannot appear in a production", _0)]
    WhitespaceInProduction(String),

    #[error("unknown symbol {:?}", _0)]
    UnknownSymbol(SymbolID),

    #[error("the start symbol is not specified and no nonterminal is declared")]
    MissingStartSymbol,

    #[error("too many {} declared", _0)]
    TooManyDeclarations(&'static str),
}

/// The grammar definition used to derive the parse table.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, Terminal>,
    pub nonterminals: Map<NonterminalID, String>,
    pub productions: Map<ProductionID, Production>,
    pub start_symbol: NonterminalID,
    pub nullables: Set<NonterminalID>,
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            start_symbol: None,
            next_terminal: TerminalID::OFFSET,
            next_nonterminal: NonterminalID::OFFSET,
            next_production: ProductionID::OFFSET,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Terminal {
                name: "$end".into(),
                whitespace: false,
            },
        );
        def.nonterminals
            .insert(NonterminalID::START, "$start".into());

        f(&mut def)?;

        let start_symbol = def
            .start_symbol
            .or_else(|| def.nonterminals.keys().copied().nth(1))
            .ok_or(GrammarDefError::MissingStartSymbol)?;

        let mut productions = Map::default();
        productions.insert(
            ProductionID::ACCEPT,
            Production {
                left: NonterminalID::START,
                right: vec![SymbolID::N(start_symbol), SymbolID::T(TerminalID::EOI)],
            },
        );
        productions.extend(def.productions);

        let mut nullables = Set::default();
        loop {
            let mut changed = false;
            for p in productions.values() {
                if p.right
                    .iter()
                    .all(|s| matches!(s, SymbolID::N(n) if nullables.contains(n)))
                {
                    changed |= nullables.insert(p.left);
                }
            }
            if !changed {
                break;
            }
        }

        Ok(Self {
            terminals: def.terminals,
            nonterminals: def.nonterminals,
            productions,
            start_symbol,
            nullables,
        })
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    /// Iterate over the productions whose left-hand side is `n`.
    pub fn productions_of(
        &self,
        n: NonterminalID,
    ) -> impl Iterator<Item = (ProductionID, &Production)> + '_ {
        self.productions
            .iter()
            .filter(move |(_, p)| p.left == n)
            .map(|(id, p)| (*id, p))
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    pub fn nonterminal_count(&self) -> usize {
        self.nonterminals.len()
    }

    /// The number of columns of the parse table.
    pub fn symbol_count(&self) -> usize {
        self.terminal_count() + self.nonterminal_count()
    }

    /// The column of the symbol in the parse table.
    ///
    /// Terminals come first, followed by the nonterminals.
    pub fn column(&self, symbol: SymbolID) -> usize {
        match symbol {
            SymbolID::T(t) => t.index(),
            SymbolID::N(n) => self.terminal_count() + n.index(),
        }
    }

    pub fn whitespaces(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.terminals
            .iter()
            .filter(|(_, t)| t.whitespace)
            .map(|(id, _)| *id)
    }

    pub fn is_nullable(&self, symbols: &[SymbolID]) -> bool {
        symbols
            .iter()
            .all(|s| matches!(s, SymbolID::N(n) if self.nullables.contains(n)))
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => &self.terminals[&t].name,
            SymbolID::N(n) => &self.nonterminals[&n],
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#### terminals: ")?;
        for (i, t) in self.terminals.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", t.name)?;
            if t.whitespace {
                f.write_str(" (skip)")?;
            }
        }
        write!(f, "\n#### nonterminals: ")?;
        for (i, n) in self.nonterminals.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", n)?;
        }
        writeln!(f, "\n#### productions:")?;
        for p in self.productions.values() {
            writeln!(f, "- {}", p.display(self))?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct GrammarDef {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, String>,
    productions: Map<ProductionID, Production>,
    start_symbol: Option<NonterminalID>,
    next_terminal: u16,
    next_nonterminal: u16,
    next_production: u16,
}

impl GrammarDef {
    pub fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarDefError> {
        self.add_terminal(name, false)
    }

    /// Declare a terminal that is skipped in every state.
    pub fn whitespace(&mut self, name: &str) -> Result<TerminalID, GrammarDefError> {
        self.add_terminal(name, true)
    }

    fn add_terminal(&mut self, name: &str, whitespace: bool) -> Result<TerminalID, GrammarDefError> {
        if self.terminals.values().any(|t| t.name == name) {
            return Err(GrammarDefError::DuplicateTerminal(name.into()));
        }
        let id = TerminalID(self.next_terminal);
        self.next_terminal = self
            .next_terminal
            .checked_add(1)
            .ok_or(GrammarDefError::TooManyDeclarations("terminals"))?;
        self.terminals.insert(
            id,
            Terminal {
                name: name.into(),
                whitespace,
            },
        );
        Ok(id)
    }

    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarDefError> {
        if self.nonterminals.values().any(|n| n == name) {
            return Err(GrammarDefError::DuplicateNonterminal(name.into()));
        }
        let id = NonterminalID(self.next_nonterminal);
        self.next_nonterminal = self
            .next_nonterminal
            .checked_add(1)
            .ok_or(GrammarDefError::TooManyDeclarations("nonterminals"))?;
        self.nonterminals.insert(id, name.into());
        Ok(id)
    }

    pub fn production<I>(
        &mut self,
        left: NonterminalID,
        right: I,
    ) -> Result<ProductionID, GrammarDefError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        if left == NonterminalID::START || !self.nonterminals.contains_key(&left) {
            return Err(GrammarDefError::UnknownSymbol(SymbolID::N(left)));
        }
        let right: Vec<_> = right.into_iter().collect();
        for symbol in &right {
            match symbol {
                SymbolID::T(t) => match self.terminals.get(t) {
                    Some(terminal) if terminal.whitespace => {
                        return Err(GrammarDefError::WhitespaceInProduction(
                            terminal.name.clone(),
                        ))
                    }
                    Some(..) if *t != TerminalID::EOI => (),
                    _ => return Err(GrammarDefError::UnknownSymbol(*symbol)),
                },
                SymbolID::N(n) => {
                    if *n == NonterminalID::START || !self.nonterminals.contains_key(n) {
                        return Err(GrammarDefError::UnknownSymbol(*symbol));
                    }
                }
            }
        }
        if self
            .productions
            .values()
            .any(|p| p.left == left && p.right == right)
        {
            return Err(GrammarDefError::DuplicateProduction(
                self.nonterminals[&left].clone(),
            ));
        }

        let id = ProductionID(self.next_production);
        self.next_production = self
            .next_production
            .checked_add(1)
            .ok_or(GrammarDefError::TooManyDeclarations("productions"))?;
        self.productions.insert(id, Production { left, right });
        Ok(id)
    }

    pub fn start_symbol(&mut self, start: NonterminalID) -> Result<(), GrammarDefError> {
        if start == NonterminalID::START || !self.nonterminals.contains_key(&start) {
            return Err(GrammarDefError::UnknownSymbol(SymbolID::N(start)));
        }
        self.start_symbol.replace(start);
        Ok(())
    }
}

/// Grammars used in tests and benchmarks.
pub mod examples {
    use super::*;
    use SymbolID::*;

    /// `S -> a S b | a b`
    #[allow(nonstandard_style)]
    pub fn balanced(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let a = g.terminal("a")?;
        let b = g.terminal("b")?;
        let S = g.nonterminal("S")?;

        g.production(S, [T(a), N(S), T(b)])?;
        g.production(S, [T(a), T(b)])?;
        Ok(())
    }

    /// The classic dangling-else grammar.
    pub fn dangling_else(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let r#if = g.terminal("if")?;
        let then = g.terminal("then")?;
        let r#else = g.terminal("else")?;
        let other = g.terminal("other")?;
        let cond = g.terminal("cond")?;

        let stmt = g.nonterminal("stmt")?;
        let expr = g.nonterminal("expr")?;

        g.production(stmt, [T(r#if), N(expr), T(then), N(stmt)])?;
        g.production(
            stmt,
            [T(r#if), N(expr), T(then), N(stmt), T(r#else), N(stmt)],
        )?;
        g.production(stmt, [T(other)])?;
        g.production(expr, [T(cond)])?;
        Ok(())
    }

    /// `A -> a` and `B -> a` can only be told apart by the second token after `a`.
    #[allow(nonstandard_style)]
    pub fn two_token_lookahead(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let a = g.terminal("a")?;
        let x = g.terminal("x")?;
        let y = g.terminal("y")?;
        let z = g.terminal("z")?;

        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;

        g.production(S, [N(A), T(x), T(y)])?;
        g.production(S, [N(B), T(x), T(z)])?;
        g.production(A, [T(a)])?;
        g.production(B, [T(a)])?;
        Ok(())
    }

    /// Same as `two_token_lookahead`, but both continuations are `x y`.
    #[allow(nonstandard_style)]
    pub fn ambiguous_reduce(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let a = g.terminal("a")?;
        let x = g.terminal("x")?;
        let y = g.terminal("y")?;
        let z = g.terminal("z")?;

        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;

        g.production(S, [N(A), T(x), T(y)])?;
        g.production(S, [N(B), T(x), T(y)])?;
        g.production(S, [N(B), T(x), T(z)])?;
        g.production(A, [T(a)])?;
        g.production(B, [T(a)])?;
        Ok(())
    }

    /// Three productions competing for the same cell.
    #[allow(nonstandard_style)]
    pub fn three_way(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let a = g.terminal("a")?;
        let x = g.terminal("x")?;
        let y = g.terminal("y")?;
        let z = g.terminal("z")?;
        let w = g.terminal("w")?;

        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;
        let C = g.nonterminal("C")?;

        g.production(S, [N(A), T(x), T(y)])?;
        g.production(S, [N(B), T(x), T(z)])?;
        g.production(S, [N(C), T(x), T(w)])?;
        g.production(A, [T(a)])?;
        g.production(B, [T(a)])?;
        g.production(C, [T(a)])?;
        Ok(())
    }

    /// `X` and `Y` embed each other, which makes the `includes` relation cyclic.
    #[allow(nonstandard_style)]
    pub fn self_embedding(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let a = g.terminal("a")?;
        let b = g.terminal("b")?;
        let c = g.terminal("c")?;
        let d = g.terminal("d")?;
        let lp = g.terminal("(")?;
        let rp = g.terminal(")")?;

        let S = g.nonterminal("S")?;
        let X = g.nonterminal("X")?;
        let Y = g.nonterminal("Y")?;

        g.production(S, [N(X)])?;
        g.production(S, [T(lp), N(X), T(rp)])?;
        g.production(X, [T(a), N(Y)])?;
        g.production(X, [T(c)])?;
        g.production(Y, [T(b), N(X)])?;
        g.production(Y, [T(d)])?;
        Ok(())
    }

    pub fn with_nullable(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        // E → E + n | T
        // T → a | ( E n ) | n a
        // n → ϵ | num

        let lparen = g.terminal("`(`")?;
        let rparen = g.terminal("`)`")?;
        let plus = g.terminal("`+`")?;
        let a = g.terminal("a")?;
        let num = g.terminal("NUM")?;

        let expr = g.nonterminal("expr")?;
        let term = g.nonterminal("term")?;
        let nullable = g.nonterminal("nullable")?;

        g.production(expr, [N(expr), T(plus), N(nullable)])?;
        g.production(expr, [N(term)])?;

        g.production(term, [T(a)])?;
        g.production(term, [T(lparen), N(expr), N(nullable), T(rparen)])?;
        g.production(term, [N(nullable), T(a)])?;

        g.production(nullable, [])?;
        g.production(nullable, [T(num)])?;
        Ok(())
    }

    pub fn arithmetic(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let lparen = g.terminal("`(`")?;
        let rparen = g.terminal("`)`")?;
        let plus = g.terminal("`+`")?;
        let minus = g.terminal("`-`")?;
        let star = g.terminal("`*`")?;
        let slash = g.terminal("`/`")?;
        let num = g.terminal("NUM")?;
        let _ = g.whitespace("WS")?;

        let expr = g.nonterminal("expr")?;
        let term = g.nonterminal("term")?;
        let factor = g.nonterminal("factor")?;
        let atom = g.nonterminal("atom")?;

        g.start_symbol(expr)?;

        g.production(expr, [N(expr), T(plus), N(term)])?;
        g.production(expr, [N(expr), T(minus), N(term)])?;
        g.production(expr, [N(term)])?;

        g.production(term, [N(term), T(star), N(factor)])?;
        g.production(term, [N(term), T(slash), N(factor)])?;
        g.production(term, [N(factor)])?;

        g.production(factor, [T(minus), N(factor)])?;
        g.production(factor, [N(atom)])?;

        g.production(atom, [T(num)])?;
        g.production(atom, [T(lparen), N(expr), T(rparen)])?;
        Ok(())
    }
}
