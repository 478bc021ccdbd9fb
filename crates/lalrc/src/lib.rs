//! An LALR(1) parse table generator.
//!
//! Reduce/reduce conflicts that a single lookahead terminal cannot settle are
//! deferred to conflict resolvers, which inspect a bounded number of further
//! terminals at run time.

pub mod codegen;
pub mod conflict;
pub mod digraph;
pub mod grammar;
pub mod lalr;
pub mod lr0;
pub mod prefix;
pub mod table;
pub mod types;
pub mod util;

use crate::{
    conflict::Conflict,
    grammar::Grammar,
    lalr::LALRData,
    lr0::LR0Automaton,
};
use lalrc_runtime::ParserTable;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("too many states: {}", _0)]
    TooManyStates(usize),

    #[error("too many symbols: {}", _0)]
    TooManySymbols(usize),

    #[error("too many productions: {}", _0)]
    TooManyProductions(usize),

    #[error("too many conflict resolvers: {}", _0)]
    TooManyResolvers(usize),

    #[error("{} unresolved conflict(s)", _0.len())]
    Conflicts(Vec<Conflict>),
}

/// The intermediate results of a compilation.
#[derive(Debug)]
pub struct Compilation {
    pub automaton: LR0Automaton,
    pub lalr: LALRData,
    pub table: ParserTable,
    /// Conflicts whose cells were filled with an error action.
    pub conflicts: Vec<Conflict>,
}

/// The largest number of terminals a conflict resolver may inspect.
pub const MAX_RESOLVER_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub struct Config {
    resolver_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { resolver_depth: 1 }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of terminals past the conflicting one that conflict
    /// resolvers may inspect. Zero disables the resolvers.
    ///
    /// The depth is capped at [`MAX_RESOLVER_DEPTH`].
    pub fn resolver_depth(mut self, depth: usize) -> Self {
        self.resolver_depth = depth.min(MAX_RESOLVER_DEPTH);
        self
    }

    /// Run the whole pipeline, keeping the conflicts in the result instead of failing.
    pub fn build(&self, g: &Grammar) -> Result<Compilation, CompileError> {
        let automaton = {
            let span = tracing::debug_span!("lr0");
            let _entered = span.enter();
            lr0::lr0(g)?
        };
        let lalr = {
            let span = tracing::debug_span!("lalr");
            let _entered = span.enter();
            lalr::lalr(g, &automaton)
        };
        let table::TableData { table, conflicts } =
            table::generate(g, &automaton, &lalr, self.resolver_depth)?;

        Ok(Compilation {
            automaton,
            lalr,
            table,
            conflicts,
        })
    }

    /// Generate the parse table, failing if any conflict is left unresolved.
    pub fn generate(&self, g: &Grammar) -> Result<ParserTable, CompileError> {
        let compilation = self.build(g)?;
        if !compilation.conflicts.is_empty() {
            for conflict in &compilation.conflicts {
                tracing::debug!("{}", conflict.display(g, &compilation.automaton));
            }
            return Err(CompileError::Conflicts(compilation.conflicts));
        }
        Ok(compilation.table)
    }
}

/// Generate the parse table with the default configuration.
pub fn compile(g: &Grammar) -> Result<ParserTable, CompileError> {
    Config::new().generate(g)
}
