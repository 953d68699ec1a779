mod common;

use common::{init, lex, Ast};
use lrkit::{
    lr::{LrError, LrParser, TableGenerator},
    Associativity, Grammar, GrammarBuilder, GrammarResult,
};

type Decoration = (Option<i32>, Option<Associativity>);

/// E -> E + E | E * E | n, rendering the grouping with parentheses.
fn binary_grammar(plus: Decoration, star: Decoration) -> GrammarResult<Grammar<Ast>> {
    let mut builder = GrammarBuilder::<Ast>::new();

    for term in ["+", "*", "n"] {
        builder.terminal(term)?;
    }
    builder.non_terminal("E")?;
    builder.set_start("E")?;

    for (op, (priority, associativity)) in [("+", plus), ("*", star)] {
        let mut rule = builder
            .add_rule("E", ["E", op, "E"])?
            .handler(move |values| match values {
                [lhs, _, rhs] => Ast::token(format!("({}{op}{})", lhs.text(), rhs.text())),
                _ => Ast::Empty,
            });

        if let Some(priority) = priority {
            rule = rule.priority(priority);
        }
        if let Some(associativity) = associativity {
            rule.associativity(associativity);
        }
    }

    builder
        .add_rule("E", ["n"])?
        .handler(|values| values.first().cloned().unwrap_or(Ast::Empty));

    Ok(builder.build())
}

fn parse(g: &Grammar<Ast>, input: &str) -> String {
    let table = TableGenerator::new(g).generate().expect("cannot build table");
    LrParser::new(g, &table)
        .parse(lex(g, input))
        .expect("cannot parse")
        .text()
}

#[test]
fn test_001_left_associativity() {
    init();

    let g = binary_grammar(
        (Some(0), Some(Associativity::Left)),
        (Some(0), Some(Associativity::Left)),
    )
    .expect("cannot create grammar");

    // The left "+" is reduced before the second one is shifted.
    assert_eq!(parse(&g, "n + n + n"), "((n+n)+n)");
}

#[test]
fn test_002_right_associativity() {
    init();

    let g = binary_grammar(
        (Some(0), Some(Associativity::Right)),
        (Some(0), Some(Associativity::Right)),
    )
    .expect("cannot create grammar");

    assert_eq!(parse(&g, "n + n + n"), "(n+(n+n))");
}

#[test]
fn test_003_higher_priority_wins() {
    init();

    let g = binary_grammar(
        (Some(5), Some(Associativity::Left)),
        (Some(10), Some(Associativity::Left)),
    )
    .expect("cannot create grammar");

    assert_eq!(parse(&g, "n + n * n"), "(n+(n*n))");
    assert_eq!(parse(&g, "n * n + n"), "((n*n)+n)");
    assert_eq!(parse(&g, "n * n * n + n"), "(((n*n)*n)+n)");
}

#[test]
fn test_004_equal_priority_without_associativity_fails() {
    init();

    let g = binary_grammar((Some(0), None), (Some(0), None)).expect("cannot create grammar");

    match TableGenerator::new(&g).generate() {
        Err(LrError::UnresolvableAmbiguity { candidates, .. }) => {
            assert!(candidates.len() >= 2);
            assert!(candidates.iter().any(|c| c.contains("=> r")));
            assert!(candidates.iter().any(|c| c.contains("=> s")));
        }
        other => panic!("expecting an ambiguity, got {other:?}"),
    }
}

#[test]
fn test_005_missing_priority_fails() {
    init();

    let g = binary_grammar((None, Some(Associativity::Left)), (None, Some(Associativity::Left)))
        .expect("cannot create grammar");

    assert!(matches!(
        TableGenerator::new(&g).generate(),
        Err(LrError::UnresolvableAmbiguity { .. })
    ));
}
