// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Round-trip properties: printing is the inverse of parsing, printing is
//! deterministic, quote style canonicalises, and comments are transparent.

#[path = "testutils/mod.rs"]
mod testutils;

use testutils::assert_print_equivalence;
use typeql::parse;

const CORPUS: &[&str] = &[
    "match $x isa movie; get;",
    "match $x isa movie, has title $t; get $t;",
    "match\n$x isa movie, has title $t;\n{ $t \"Apocalypse Now\"; } or { $t < \"Juno\"; $t > \"Godfather\"; } or { $t \"Spy\"; };\n$t !== \"Apocalypse Now\";\nget;",
    "match\n($p: $x, $y);\n$x isa $z;\n$z sub production;\nhas-genre relates $p;\nget;",
    "match $x plays casting:actor; get; sort $x asc;",
    "match $x isa movie, has rating $r; get; sort $r desc; offset 10; limit 10;",
    "match ($x, $y) isa friendship; get $x, $y; count;",
    "match $x isa movie; get; group $x;",
    "match ($x, $y) isa friendship; get $x, $y; group $x; count;",
    "match\n($x, $y) isa friendship;\n$y has age $z;\nget; group $x; max $z;",
    "match $x has release-date 1000-11-12T13:14:15.100; get;",
    "match $x has release-date +12345-12-25T00:00; get;",
    "match $x has release-date -3200-01-01T00:00; get;",
    "match $x value boolean; get;",
    "match $x key name; get $x;",
    "match\nnot { $x isa movie; };\n$x isa production;\nget;",
    "insert $_ isa movie, has title \"The Title\";",
    "insert\n$x isa pokemon, has name \"Pichu\";\n(evolves-from: $x, evolves-to: $x) isa evolution;",
    "match $x isa language;\ninsert $x has name \"HELLO\";",
    "match\n$x isa movie;\n$y isa movie;\ndelete\n$x isa movie;\n$y isa movie;",
    "define\npokemon sub entity;\nevolution sub relation;\nevolution relates evolves-from, relates evolves-to;\npokemon plays evolution:evolves-from, has name;",
    "define my-type sub attribute, value long, regex \"[a-z]+\";",
    "define all-movies-are-drama sub rule, when { $x isa movie; }, then { $x has genre \"drama\"; };",
    "undefine my-type sub attribute;",
    "compute count;",
    "compute count in [movie, person];",
    "compute max of person, in movie;",
    "compute std of movie;",
    "compute path from V1, to V2, in [person, marriage];",
    "compute centrality in movie, using degree;",
    "compute centrality of person, using k-core, where min-k=3;",
    "compute cluster in [movie, person], using connected-component, where [size=10, contains=V123];",
    "compute cluster in [movie, person], using k-core, where k=10;",
];

#[test]
fn printing_parses_back_to_the_same_text() {
    for query in CORPUS {
        assert_print_equivalence(query);
    }
}

#[test]
fn pretty_and_compact_renderings_parse_to_equal_asts() {
    for query in CORPUS {
        let parsed = parse(query).unwrap();
        let pretty = parsed.to_string();
        let compact = parsed.to_compact_string();
        assert_eq!(parsed, parse(&pretty).unwrap(), "pretty: {pretty}");
        assert_eq!(parsed, parse(&compact).unwrap(), "compact: {compact}");
    }
}

#[test]
fn compact_mode_is_single_line() {
    for query in CORPUS {
        let compact = parse(query).unwrap().to_compact_string();
        assert!(!compact.contains('\n'), "{compact}");
    }
}

#[test]
fn printing_is_deterministic() {
    for query in CORPUS {
        let parsed = parse(query).unwrap();
        let first = parsed.to_string();
        let second = parsed.to_string();
        assert_eq!(first, second);
        assert_eq!(first, parse(&first).unwrap().to_string());
    }
}

#[test]
fn quote_style_canonicalises_to_double_quotes() {
    let single = parse("match $x has title 'Spy'; get;").unwrap();
    let double = parse("match $x has title \"Spy\"; get;").unwrap();
    assert_eq!(single, double);
    assert!(single.to_string().contains("\"Spy\""));
}

#[test]
fn comments_between_any_tokens_are_transparent() {
    let plain = "match $x isa movie; get;";
    let commented = [
        "# leading\nmatch $x isa movie; get;",
        "match # one\n $x # two\n isa # three\n movie # four\n ; # five\n get # six\n ;",
        "match\n#\n$x isa movie; get;",
    ];
    let expected = parse(plain).unwrap();
    for query in commented {
        assert_eq!(expected, parse(query).unwrap(), "{query}");
    }
}

#[test]
fn whitespace_variations_are_transparent() {
    let expected = parse("match $x isa movie; get;").unwrap();
    for query in [
        "match\n\n$x\nisa\nmovie\n;\nget\n;",
        "   match $x isa movie;   get;   ",
        "match\t$x\tisa\tmovie;\tget;",
    ] {
        assert_eq!(expected, parse(query).unwrap(), "{query:?}");
    }
}
