//! Parser.

use crate::{action::ParseAction, resolver::Lookahead, table::ParserTable};
use std::{collections::VecDeque, fmt, mem};

/// A trait for abstracting token symbols.
pub trait Token {
    /// Return the terminal index corresponding to this token.
    fn terminal(&self) -> u16;
}

impl Token for u16 {
    fn terminal(&self) -> u16 {
        *self
    }
}

/// A token stream that can look ahead a bounded number of tokens.
#[derive(Debug)]
pub struct TokenBuffer<I, T> {
    tokens: I,
    buffer: VecDeque<T>,
    exhausted: bool,
}

impl<I, T, E> TokenBuffer<I, T>
where
    I: Iterator<Item = Result<T, E>>,
{
    pub fn new(tokens: I) -> Self {
        Self {
            tokens,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Return the `n`-th upcoming token without consuming it.
    pub fn peek(&mut self, n: usize) -> Result<Option<&T>, E> {
        while self.buffer.len() <= n && !self.exhausted {
            match self.tokens.next().transpose()? {
                Some(token) => self.buffer.push_back(token),
                None => self.exhausted = true,
            }
        }
        Ok(self.buffer.get(n))
    }

    pub fn next(&mut self) -> Result<Option<T>, E> {
        if let Some(token) = self.buffer.pop_front() {
            return Ok(Some(token));
        }
        if self.exhausted {
            return Ok(None);
        }
        self.tokens.next().transpose()
    }
}

/// The parser driven based on the generated parse table.
#[derive(Debug)]
pub struct Parser<'t, TTok> {
    table: &'t ParserTable,
    state_stack: Vec<u16>,
    item_stack: Vec<ParseItem<TTok>>,
    accepted: bool,
}

impl<'t, TTok> Parser<'t, TTok>
where
    TTok: Token,
{
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(table: &'t ParserTable) -> Self {
        Self {
            table,
            state_stack: vec![table.start_state],
            item_stack: vec![],
            accepted: false,
        }
    }

    /// Consume some tokens and drive the state machine
    /// until it matches a certain production rule.
    ///
    /// On a reduction, `args` receives the right-hand side items of the production.
    pub fn next_event<I, E>(
        &mut self,
        tokens: &mut TokenBuffer<I, TTok>,
        args: &mut Vec<ParseItem<TTok>>,
    ) -> Result<ParseEvent, ParseError<E>>
    where
        I: Iterator<Item = Result<TTok, E>>,
        E: fmt::Display,
    {
        if self.accepted {
            return Err(ParseError::AlreadyAccepted);
        }

        loop {
            let current = *self
                .state_stack
                .last()
                .ok_or(ParseError::EmptyStateStack)?;
            let lookahead = tokens
                .peek(0)
                .map_err(ParseError::Lexer)?
                .map_or(self.table.eof_symbol, |t| t.terminal());
            if lookahead >= self.table.terminal_count() {
                return Err(ParseError::UnexpectedToken {
                    state: current,
                    terminal: lookahead,
                });
            }

            match self.table.action(current, lookahead) {
                ParseAction::Shift(next) => {
                    let token = tokens
                        .next()
                        .map_err(ParseError::Lexer)?
                        .ok_or(ParseError::UnexpectedEoi)?;
                    self.item_stack.push(ParseItem::T(token));
                    self.state_stack.push(next);
                }

                ParseAction::Skip => {
                    tokens.next().map_err(ParseError::Lexer)?;
                }

                ParseAction::Reduce(production) => {
                    return self.reduce(production, args);
                }

                ParseAction::Resolve(index) => {
                    let resolver = self
                        .table
                        .resolver(index)
                        .ok_or(ParseError::MissingResolver(index))?;
                    let mut peeker = Peeker {
                        table: self.table,
                        tokens: &mut *tokens,
                        error: None,
                    };
                    let resolved = resolver.resolve(self.table.eof_symbol, &mut peeker);
                    if let Some(err) = peeker.error {
                        return Err(ParseError::Lexer(err));
                    }
                    let production = resolved.ok_or(ParseError::UnexpectedToken {
                        state: current,
                        terminal: lookahead,
                    })?;
                    return self.reduce(production, args);
                }

                ParseAction::Accept => {
                    let item = self.item_stack.pop().ok_or(ParseError::EmptyItemStack)?;
                    args.clear();
                    args.push(item);
                    self.accepted = true;
                    return Ok(ParseEvent::Accept);
                }

                ParseAction::Error => {
                    return Err(ParseError::UnexpectedToken {
                        state: current,
                        terminal: lookahead,
                    });
                }
            }
        }
    }

    fn reduce<E>(
        &mut self,
        production: u16,
        args: &mut Vec<ParseItem<TTok>>,
    ) -> Result<ParseEvent, ParseError<E>>
    where
        E: fmt::Display,
    {
        let n = usize::from(self.table.get_length(production));
        if self.item_stack.len() < n || self.state_stack.len() <= n {
            return Err(ParseError::EmptyItemStack);
        }
        args.clear();
        args.extend(self.item_stack.drain(self.item_stack.len() - n..));
        self.state_stack.truncate(self.state_stack.len() - n);

        let current = *self
            .state_stack
            .last()
            .ok_or(ParseError::EmptyStateStack)?;
        let left = self.table.get_left(production);
        match self.table.action(current, left) {
            ParseAction::Shift(next) => self.state_stack.push(next),
            _ => {
                return Err(ParseError::MissingGoto {
                    state: current,
                    symbol: left,
                })
            }
        }
        self.item_stack.push(ParseItem::N(left));

        Ok(ParseEvent::Reduce(production))
    }
}

/// Peeks the terminals following the current lookahead, ignoring skipped ones.
struct Peeker<'a, I, T, E> {
    table: &'a ParserTable,
    tokens: &'a mut TokenBuffer<I, T>,
    error: Option<E>,
}

impl<I, T, E> Lookahead for Peeker<'_, I, T, E>
where
    I: Iterator<Item = Result<T, E>>,
    T: Token,
{
    fn peek(&mut self, n: usize) -> Option<u16> {
        if self.error.is_some() {
            return None;
        }
        let mut seen = 0;
        let mut offset = 0;
        loop {
            let terminal = match self.tokens.peek(offset) {
                Ok(Some(token)) => token.terminal(),
                Ok(None) => return None,
                Err(err) => {
                    self.error = Some(err);
                    return None;
                }
            };
            offset += 1;
            if terminal >= self.table.terminal_count() {
                // never matches a line
                return Some(terminal);
            }
            if self.table.is_skipped(terminal) {
                continue;
            }
            if seen == n {
                return Some(terminal);
            }
            seen += 1;
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ParseItem<TTok> {
    T(TTok),
    N(u16),

    #[doc(hidden)]
    __Empty,
}

impl<TTok> Default for ParseItem<TTok> {
    fn default() -> Self {
        Self::__Empty
    }
}

impl<TTok> ParseItem<TTok> {
    pub fn take(&mut self) -> Option<Self> {
        match mem::replace(self, Self::__Empty) {
            Self::__Empty => None,
            me => Some(me),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    Reduce(u16),
    Accept,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError<L: fmt::Display> {
    #[error("from lexer: {}", _0)]
    Lexer(L),

    #[error("unexpected terminal {terminal} in state {state}")]
    UnexpectedToken { state: u16, terminal: u16 },

    #[error("unexpected EOI")]
    UnexpectedEoi,

    #[error("missing goto on symbol {symbol} in state {state}")]
    MissingGoto { state: u16, symbol: u16 },

    #[error("missing conflict resolver #{}", _0)]
    MissingResolver(u16),

    #[error("empty state stack")]
    EmptyStateStack,

    #[error("empty item stack")]
    EmptyItemStack,

    #[error("already accepted")]
    AlreadyAccepted,
}
