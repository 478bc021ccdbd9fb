//! Drive generated tables with the runtime parser.

use lalrc::grammar::{examples, Grammar, GrammarDef, GrammarDefError, SymbolID};
use lalrc_runtime::{
    parser::{ParseError, ParseEvent, ParseItem, Parser, TokenBuffer},
    ParserTable,
};
use std::convert::Infallible;

fn compile(f: fn(&mut GrammarDef) -> Result<(), GrammarDefError>) -> (Grammar, ParserTable) {
    let g = Grammar::define(f).unwrap();
    let table = lalrc::compile(&g).unwrap();
    (g, table)
}

fn tokens(g: &Grammar, input: &str) -> Vec<u16> {
    input
        .split_whitespace()
        .map(|name| {
            g.terminals
                .iter()
                .find(|(_, t)| t.name == name)
                .map(|(id, _)| id.into_raw())
                .unwrap()
        })
        .collect()
}

/// Parse the input and return the names of the nonterminals reduced in order.
fn parse(g: &Grammar, t: &ParserTable, input: &[u16]) -> Result<Vec<String>, ParseError<Infallible>> {
    let mut parser = Parser::new(t);
    let mut tokens = TokenBuffer::new(input.iter().copied().map(Ok));
    let mut args = vec![];
    let mut reduced = vec![];
    loop {
        match parser.next_event(&mut tokens, &mut args)? {
            ParseEvent::Reduce(production) => {
                let p = g.production(lalrc::grammar::ProductionID::from_raw(production));
                assert_eq!(args.len(), p.right.len());
                reduced.push(g.nonterminals[&p.left].clone());
            }
            ParseEvent::Accept => {
                assert!(matches!(args[..], [ParseItem::N(..)]));
                return Ok(reduced);
            }
        }
    }
}

#[test]
fn balanced_brackets() {
    let (g, t) = compile(examples::balanced);
    let reduced = parse(&g, &t, &tokens(&g, "a a a b b b")).unwrap();
    assert_eq!(reduced, vec!["S", "S", "S"]);

    assert!(matches!(
        parse(&g, &t, &tokens(&g, "a a b")),
        Err(ParseError::UnexpectedToken { .. })
    ));
}

#[test]
fn nonterminal_ids_are_rejected() {
    let (g, t) = compile(examples::balanced);
    assert_eq!(usize::from(t.terminal_count()), g.terminal_count());

    let s = g
        .nonterminals
        .iter()
        .find(|(_, name)| *name == "S")
        .map(|(&id, _)| g.column(SymbolID::N(id)) as u16)
        .unwrap();
    assert!(matches!(
        parse(&g, &t, &[s]),
        Err(ParseError::UnexpectedToken { .. })
    ));

    let a = tokens(&g, "a")[0];
    assert!(matches!(
        parse(&g, &t, &[a, 999]),
        Err(ParseError::UnexpectedToken { terminal: 999, .. })
    ));
}

#[test]
fn resolvers_pick_the_production() {
    let (g, t) = compile(examples::two_token_lookahead);
    assert_eq!(
        parse(&g, &t, &tokens(&g, "a x y")).unwrap(),
        vec!["A", "S"]
    );
    assert_eq!(
        parse(&g, &t, &tokens(&g, "a x z")).unwrap(),
        vec!["B", "S"]
    );
    // no line of the resolver matches.
    assert!(matches!(
        parse(&g, &t, &tokens(&g, "a x a")),
        Err(ParseError::UnexpectedToken { .. })
    ));
    assert!(matches!(
        parse(&g, &t, &tokens(&g, "a x")),
        Err(ParseError::UnexpectedToken { .. })
    ));
}

#[test]
fn whitespaces_are_skipped() {
    let (g, t) = compile(examples::arithmetic);
    let reduced = parse(
        &g,
        &t,
        &tokens(&g, "WS NUM WS `+` `(` NUM `*` WS `-` NUM `)` WS"),
    )
    .unwrap();
    assert_eq!(reduced.iter().filter(|n| *n == "atom").count(), 4);
    assert_eq!(reduced.last().map(String::as_str), Some("expr"));
}

#[test]
fn resolver_skips_whitespaces_while_peeking() {
    fn grammar(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        examples::two_token_lookahead(g)?;
        g.whitespace("WS")?;
        Ok(())
    }
    let (g, t) = compile(grammar);
    assert_eq!(
        parse(&g, &t, &tokens(&g, "a WS x WS WS z")).unwrap(),
        vec!["B", "S"]
    );
}

#[test]
fn packed_table_parses_the_same() {
    let (g, t) = compile(examples::three_way);
    let unpacked = ParserTable::unpack(&t.pack()).unwrap();
    for input in ["a x y", "a x z", "a x w"] {
        assert_eq!(
            parse(&g, &t, &tokens(&g, input)).unwrap(),
            parse(&g, &unpacked, &tokens(&g, input)).unwrap()
        );
    }
}
