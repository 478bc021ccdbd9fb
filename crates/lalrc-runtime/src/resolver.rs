//! Run-time disambiguation of reduce/reduce conflicts.

/// Bounded lookahead over the terminals following the current one.
pub trait Lookahead {
    /// Return the terminal `n` positions past the current lookahead
    /// (`peek(0)` is the current lookahead itself), or `None` at the end of input.
    ///
    /// Peeking never consumes input.
    fn peek(&mut self, n: usize) -> Option<u16>;
}

impl<T: ?Sized> Lookahead for &mut T
where
    T: Lookahead,
{
    fn peek(&mut self, n: usize) -> Option<u16> {
        (**self).peek(n)
    }
}

impl Lookahead for [u16] {
    fn peek(&mut self, n: usize) -> Option<u16> {
        self.get(n).copied()
    }
}

/// A single rule of a resolver: if the terminals following the conflicting
/// one are exactly `terminals`, reduce by `production`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line {
    pub terminals: Vec<u16>,
    pub production: u16,
}

impl Line {
    fn matches<L>(&self, eof: u16, lookahead: &mut L) -> bool
    where
        L: Lookahead + ?Sized,
    {
        self.terminals
            .iter()
            .enumerate()
            .all(|(i, &t)| lookahead.peek(i + 1).unwrap_or(eof) == t)
    }
}

/// An ordered list of distinguishing sequences attached to a conflict cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConflictResolver {
    pub lines: Vec<Line>,
}

impl ConflictResolver {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// The number of tokens past the conflicting one that may be inspected.
    pub fn depth(&self) -> usize {
        self.lines
            .iter()
            .map(|line| line.terminals.len())
            .max()
            .unwrap_or(0)
    }

    /// Select the production to reduce, or `None` if no line matches the input.
    pub fn resolve<L>(&self, eof: u16, lookahead: &mut L) -> Option<u16>
    where
        L: Lookahead + ?Sized,
    {
        self.lines
            .iter()
            .find(|line| line.matches(eof, lookahead))
            .map(|line| line.production)
    }
}
