use lalrc::{
    conflict::ConflictKind,
    grammar::{examples, Grammar, GrammarDef, GrammarDefError, ProductionID, SymbolID, TerminalID},
    lr0::StateID,
    CompileError, Config,
};
use lalrc_runtime::{action, ParseAction, ParserTable};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn define(f: fn(&mut GrammarDef) -> Result<(), GrammarDefError>) -> Grammar {
    let g = Grammar::define(f).unwrap();
    eprintln!("grammar:\n{}", g);
    g
}

fn terminal(g: &Grammar, name: &str) -> TerminalID {
    *g.terminals
        .iter()
        .find(|(_, t)| t.name == name)
        .map(|(id, _)| id)
        .unwrap()
}

fn production(g: &Grammar, left: &str, right: &[&str]) -> ProductionID {
    *g.productions
        .iter()
        .find(|(_, p)| {
            g.nonterminals[&p.left] == left
                && p.right.len() == right.len()
                && p.right
                    .iter()
                    .zip(right)
                    .all(|(s, name)| g.symbol_name(*s) == *name)
        })
        .map(|(id, _)| id)
        .unwrap()
}

fn state_after(compilation: &lalrc::Compilation, g: &Grammar, names: &[&str]) -> u16 {
    let symbols: Vec<SymbolID> = names
        .iter()
        .map(|name| SymbolID::T(terminal(g, name)))
        .collect();
    compilation
        .automaton
        .walk(StateID::START, &symbols)
        .unwrap()
        .into_raw()
}

#[test]
fn balanced_brackets() {
    init_tracing();
    let g = define(examples::balanced);
    let compilation = Config::new().build(&g).unwrap();
    assert!(compilation.conflicts.is_empty());
    let t = &compilation.table;

    let (a, b) = (terminal(&g, "a"), terminal(&g, "b"));
    let after_a = state_after(&compilation, &g, &["a"]);
    assert_eq!(t.action(after_a, a.into_raw()), ParseAction::Shift(after_a));

    let after_ab = state_after(&compilation, &g, &["a", "b"]);
    let reduce = ParseAction::Reduce(production(&g, "S", &["a", "b"]).into_raw());
    assert_eq!(t.action(after_ab, b.into_raw()), reduce);
    assert_eq!(t.action(after_ab, TerminalID::EOI.into_raw()), reduce);
    assert_eq!(t.action(after_ab, a.into_raw()), ParseAction::Error);
}

#[test]
fn dangling_else() {
    init_tracing();
    let g = define(examples::dangling_else);
    let compilation = Config::new().build(&g).unwrap();

    assert_eq!(compilation.conflicts.len(), 1);
    let conflict = &compilation.conflicts[0];
    eprintln!("{}", conflict.display(&g, &compilation.automaton));
    assert_eq!(conflict.kind, ConflictKind::ShiftReduce);
    assert_eq!(conflict.symbol, terminal(&g, "else"));
    assert_eq!(
        conflict.productions,
        vec![production(&g, "stmt", &["if", "expr", "then", "stmt"])]
    );

    let state = compilation.automaton.state(conflict.state);
    assert!(state
        .kernels
        .iter()
        .any(|k| k.production == conflict.productions[0]
            && usize::from(k.index) == g.production(k.production).right.len()));
    assert_eq!(
        compilation
            .table
            .action(conflict.state.into_raw(), conflict.symbol.into_raw()),
        ParseAction::Error
    );

    match Config::new().generate(&g) {
        Err(CompileError::Conflicts(conflicts)) => assert_eq!(conflicts.len(), 1),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn two_token_lookahead() {
    init_tracing();
    let g = define(examples::two_token_lookahead);
    let compilation = Config::new().build(&g).unwrap();
    assert!(compilation.conflicts.is_empty());
    let t = &compilation.table;

    let after_a = state_after(&compilation, &g, &["a"]);
    let x = terminal(&g, "x");
    let index = match t.action(after_a, x.into_raw()) {
        ParseAction::Resolve(index) => index,
        action => panic!("unexpected action: {:?}", action),
    };
    let resolver = t.resolver(index).unwrap();
    assert_eq!(resolver.depth(), 1);

    let (y, z) = (terminal(&g, "y").into_raw(), terminal(&g, "z").into_raw());
    let eof = t.eof_symbol;
    let x = x.into_raw();
    assert_eq!(
        resolver.resolve(eof, &mut [x, y][..]),
        Some(production(&g, "A", &["a"]).into_raw())
    );
    assert_eq!(
        resolver.resolve(eof, &mut [x, z][..]),
        Some(production(&g, "B", &["a"]).into_raw())
    );
    assert_eq!(resolver.resolve(eof, &mut [x][..]), None);
}

#[test]
fn all_conflicts_are_reported() {
    init_tracing();
    #[allow(nonstandard_style)]
    fn ambiguous_operators(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        use SymbolID::*;
        let plus = g.terminal("+")?;
        let star = g.terminal("*")?;
        let n = g.terminal("n")?;
        let E = g.nonterminal("E")?;
        g.production(E, [N(E), T(plus), N(E)])?;
        g.production(E, [N(E), T(star), N(E)])?;
        g.production(E, [T(n)])?;
        Ok(())
    }
    let g = define(ambiguous_operators);
    let conflicts = match Config::new().generate(&g) {
        Err(CompileError::Conflicts(conflicts)) => conflicts,
        other => panic!("unexpected result: {:?}", other),
    };
    assert_eq!(conflicts.len(), 4);
    assert!(conflicts
        .iter()
        .all(|conflict| conflict.kind == ConflictKind::ShiftReduce));

    let mut cells: Vec<_> = conflicts
        .iter()
        .map(|conflict| (conflict.state, conflict.symbol))
        .collect();
    cells.sort();
    cells.dedup();
    assert_eq!(cells.len(), 4);

    let (plus, star) = (terminal(&g, "+"), terminal(&g, "*"));
    for symbol in [plus, star] {
        assert_eq!(
            conflicts.iter().filter(|c| c.symbol == symbol).count(),
            2
        );
    }
}

#[test]
fn too_many_symbols() {
    init_tracing();
    let g = Grammar::define(|g| {
        let terminals = (0..0x4000)
            .map(|i| g.terminal(&format!("t{}", i)))
            .collect::<Result<Vec<_>, _>>()?;
        let s = g.nonterminal("S")?;
        g.production(s, [SymbolID::T(terminals[0])])?;
        Ok(())
    })
    .unwrap();
    assert!(matches!(
        Config::new().build(&g),
        Err(CompileError::TooManySymbols(n)) if n == g.symbol_count()
    ));
}

#[test]
fn overlapping_contexts_are_a_hard_conflict() {
    init_tracing();
    let g = define(examples::ambiguous_reduce);
    match Config::new().generate(&g) {
        Err(CompileError::Conflicts(conflicts)) => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].kind, ConflictKind::ReduceReduce);
            assert_eq!(conflicts[0].symbol, terminal(&g, "x"));
            assert_eq!(
                conflicts[0].productions,
                vec![
                    production(&g, "A", &["a"]),
                    production(&g, "B", &["a"])
                ]
            );
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn resolver_depth_bounds_the_right_context() {
    init_tracing();

    let g = define(examples::two_token_lookahead);
    let compilation = Config::new().resolver_depth(0).build(&g).unwrap();
    assert_eq!(compilation.conflicts.len(), 1);
    assert!(compilation.table.resolvers.is_empty());

    #[allow(nonstandard_style)]
    fn three_tokens(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        use SymbolID::*;
        let a = g.terminal("a")?;
        let x = g.terminal("x")?;
        let y = g.terminal("y")?;
        let z = g.terminal("z")?;
        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;
        g.production(S, [N(A), T(x), T(x), T(y)])?;
        g.production(S, [N(B), T(x), T(x), T(z)])?;
        g.production(A, [T(a)])?;
        g.production(B, [T(a)])?;
        Ok(())
    }
    let g = define(three_tokens);
    assert!(matches!(
        Config::new().generate(&g),
        Err(CompileError::Conflicts(..))
    ));

    let t = Config::new().resolver_depth(2).generate(&g).unwrap();
    assert_eq!(t.resolvers.len(), 1);
    let resolver = &t.resolvers[0];
    assert_eq!(resolver.depth(), 2);
    let (x, y, z) = (
        terminal(&g, "x").into_raw(),
        terminal(&g, "y").into_raw(),
        terminal(&g, "z").into_raw(),
    );
    assert_eq!(
        resolver.resolve(t.eof_symbol, &mut [x, x, y][..]),
        Some(production(&g, "A", &["a"]).into_raw())
    );
    assert_eq!(
        resolver.resolve(t.eof_symbol, &mut [x, x, z][..]),
        Some(production(&g, "B", &["a"]).into_raw())
    );
}

#[test]
fn resolver_depth_is_capped() {
    init_tracing();
    let g = define(examples::two_token_lookahead);
    let t = Config::new()
        .resolver_depth(usize::MAX)
        .generate(&g)
        .unwrap();
    assert_eq!(t.resolvers.len(), 1);
    let (x, y) = (terminal(&g, "x").into_raw(), terminal(&g, "y").into_raw());
    assert_eq!(
        t.resolvers[0].resolve(t.eof_symbol, &mut [x, y][..]),
        Some(production(&g, "A", &["a"]).into_raw())
    );
}

#[test]
fn three_way_resolver() {
    init_tracing();
    let g = define(examples::three_way);
    let t = Config::new().generate(&g).unwrap();
    assert_eq!(t.resolvers.len(), 1);
    assert_eq!(t.resolvers[0].lines.len(), 3);
    let x = terminal(&g, "x").into_raw();
    for (follow, left) in [("y", "A"), ("z", "B"), ("w", "C")] {
        let follow = terminal(&g, follow).into_raw();
        assert_eq!(
            t.resolvers[0].resolve(t.eof_symbol, &mut [x, follow][..]),
            Some(production(&g, left, &["a"]).into_raw())
        );
    }
}

#[test]
fn determinism() {
    init_tracing();
    for f in [
        examples::balanced,
        examples::two_token_lookahead,
        examples::three_way,
        examples::arithmetic,
        examples::self_embedding,
    ] {
        let first = Config::new().generate(&define(f)).unwrap();
        let second = Config::new().generate(&define(f)).unwrap();
        assert_eq!(first.pack(), second.pack());
    }
}

fn assert_total(t: &ParserTable) {
    let states = t.state_count();
    assert_eq!(t.values.len(), states * usize::from(t.symbol_count));
    for &value in &t.values {
        match ParseAction::decode(value) {
            ParseAction::Shift(to) => assert!(usize::from(to) < states),
            ParseAction::Reduce(p) => assert!(usize::from(p) < t.production_count()),
            ParseAction::Resolve(index) => assert!(t.resolver(index).is_some()),
            ParseAction::Error => assert_eq!(value, action::ERROR),
            ParseAction::Accept | ParseAction::Skip => (),
        }
    }
}

#[test]
fn totality() {
    init_tracing();
    for f in [
        examples::balanced,
        examples::dangling_else,
        examples::two_token_lookahead,
        examples::ambiguous_reduce,
        examples::arithmetic,
        examples::with_nullable,
        examples::self_embedding,
    ] {
        let compilation = Config::new().build(&define(f)).unwrap();
        assert_total(&compilation.table);
    }
}

#[test]
fn cyclic_includes_share_sets() {
    init_tracing();
    let g = define(examples::self_embedding);
    let compilation = Config::new().build(&g).unwrap();
    assert!(compilation.conflicts.is_empty());
    let lalr = &compilation.lalr;

    let n = lalr.gotos.len();
    let mut reach = vec![vec![false; n]; n];
    for (x, edges) in lalr.includes.iter().enumerate() {
        for &y in edges {
            reach[x][y] = true;
        }
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if reach[i][k] && reach[k][j] {
                    reach[i][j] = true;
                }
            }
        }
    }

    let mut cycles = 0;
    for x in 0..n {
        for y in 0..n {
            if x != y && reach[x][y] && reach[y][x] {
                cycles += 1;
                assert_eq!(lalr.read_sets[x], lalr.read_sets[y]);
                assert_eq!(lalr.follow_sets[x], lalr.follow_sets[y]);
            }
        }
    }
    assert!(cycles > 0);

    let rparen = terminal(&g, ")");
    for x in (0..n).filter(|&x| reach[x][x]) {
        assert!(lalr.follow_sets[x].contains(rparen));
        assert!(lalr.follow_sets[x].contains(TerminalID::EOI));
    }
}

#[test]
fn round_trip_with_resolver_cells() {
    init_tracing();
    for f in [examples::two_token_lookahead, examples::three_way] {
        let t = Config::new().generate(&define(f)).unwrap();
        assert!(t.values.iter().any(|&v| matches!(
            ParseAction::decode(v),
            ParseAction::Resolve(..)
        )));

        let packed = t.pack();
        assert!(packed.cells.len() < t.values.len());
        assert_eq!(ParserTable::unpack(&packed).unwrap(), t);
        assert_eq!(
            lalrc_runtime::pack::expand(&lalrc_runtime::pack::compact(&t.values), t.values.len())
                .unwrap(),
            t.values
        );
    }
}
