//! Rust code generation of the packed parse table.

use crate::grammar::Grammar;
use lalrc_runtime::{PackedTable, ParserTable};
use std::fmt;

/// Writes a Rust module that rebuilds the packed table without running the
/// construction again.
#[derive(Debug)]
pub struct Codegen<'g> {
    grammar: &'g Grammar,
    table: PackedTable,
}

impl<'g> Codegen<'g> {
    pub fn new(grammar: &'g Grammar, table: &ParserTable) -> Self {
        Self {
            grammar,
            table: table.pack(),
        }
    }

    pub fn packed(&self) -> &PackedTable {
        &self.table
    }

    fn write_names<'a>(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        names: impl Iterator<Item = &'a str>,
    ) -> fmt::Result {
        writeln!(f, "pub const {}: &[&str] = &[", name)?;
        for n in names {
            writeln!(f, "    {:?},", n)?;
        }
        writeln!(f, "];")
    }
}

impl fmt::Display for Codegen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.table;

        writeln!(f, "// This file is generated by lalrc. Do not edit.")?;
        writeln!(f)?;
        self.write_names(
            f,
            "TERMINALS",
            self.grammar.terminals.values().map(|t| t.name.as_str()),
        )?;
        writeln!(f)?;
        self.write_names(
            f,
            "NONTERMINALS",
            self.grammar.nonterminals.values().map(String::as_str),
        )?;
        writeln!(f)?;

        writeln!(f, "pub fn table() -> ::lalrc_runtime::PackedTable {{")?;
        writeln!(f, "    ::lalrc_runtime::PackedTable {{")?;
        writeln!(f, "        start_state: {},", t.start_state)?;
        writeln!(f, "        symbol_count: {},", t.symbol_count)?;
        writeln!(f, "        eof_symbol: {},", t.eof_symbol)?;
        writeln!(f, "        state_count: {},", t.state_count)?;
        writeln!(f, "        cells: ::lalrc_runtime::PackedValues {{")?;
        writeln!(f, "            deltas: vec![")?;
        for chunk in &t.cells.deltas {
            writeln!(f, "                vec!{:?},", chunk)?;
        }
        writeln!(f, "            ],")?;
        writeln!(f, "            values: vec![")?;
        for chunk in &t.cells.values {
            writeln!(f, "                vec!{:?},", chunk)?;
        }
        writeln!(f, "            ],")?;
        writeln!(f, "        }},")?;
        writeln!(f, "        lengths: vec!{:?},", t.lengths)?;
        writeln!(f, "        lefts: vec!{:?},", t.lefts)?;
        writeln!(f, "        modes: vec!{:?},", t.modes)?;
        writeln!(f, "        resolvers: vec![")?;
        for resolver in &t.resolvers {
            writeln!(f, "            ::lalrc_runtime::ConflictResolver::new(vec![")?;
            for line in &resolver.lines {
                writeln!(
                    f,
                    "                ::lalrc_runtime::Line {{ terminals: vec!{:?}, production: {} }},",
                    line.terminals, line.production
                )?;
            }
            writeln!(f, "            ]),")?;
        }
        writeln!(f, "        ],")?;
        writeln!(f, "    }}")?;
        writeln!(f, "}}")?;
        Ok(())
    }
}
