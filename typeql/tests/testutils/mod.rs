// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared assertions for the integration tests.

use typeql::{parse, parse_pattern, Pattern, Query};

/// Asserts that a parsed query equals its builder-assembled counterpart,
/// that the printed form re-parses to the same AST, and that the canonical
/// rendering matches exactly.
#[allow(dead_code)]
pub fn assert_query_eq(expected: &Query, parsed: &Query, canonical: &str) {
    assert_eq!(expected, parsed);
    let reparsed = parse(&parsed.to_string()).unwrap();
    assert_eq!(expected, &reparsed);
    assert_eq!(canonical, expected.to_string());
}

#[allow(dead_code)]
pub fn assert_pattern_eq(expected: &Pattern, parsed: &Pattern, canonical: &str) {
    assert_eq!(expected, parsed);
    let reparsed = parse_pattern(&parsed.to_string()).unwrap();
    assert_eq!(expected, &reparsed);
    assert_eq!(canonical, expected.to_string());
}

/// Asserts that parsing then printing returns the input unchanged.
#[allow(dead_code)]
pub fn assert_print_equivalence(query: &str) {
    assert_eq!(query, parse(query).unwrap().to_string());
}
