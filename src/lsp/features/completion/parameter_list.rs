//! Parameter-list reconstruction from rendered signature fragments.
//!
//! The engine exposes a symbol's signature only as a flat, pretty-printed
//! stream of classified display parts, not as a structured AST. This module
//! reverse-engineers the top-level parameter list from punctuation balance
//! and name-kind classification, which is enough to synthesize a tab-stop
//! snippet and to decide whether completing call parentheses makes sense at
//! all. Ambiguous shapes deliberately resolve to "not a call": a wrong
//! snippet is worse than no snippet.

use crate::engine::{DisplayPartKind, SymbolDisplayPart};

/// Result of scanning a signature's display parts.
///
/// `is_function_call == false` implies `parts` is empty; callers generate no
/// snippet in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterListParts {
    pub parts: Vec<SymbolDisplayPart>,
    pub has_optional_parameters: bool,
    pub is_function_call: bool,
}

impl ParameterListParts {
    /// The sentinel for "this symbol is not being called as a function".
    /// Used instead of raising for every malformed or non-call shape.
    pub fn null() -> Self {
        Self {
            parts: Vec::new(),
            has_optional_parameters: false,
            is_function_call: false,
        }
    }
}

fn is_annotation(parts: &[SymbolDisplayPart], label: &str) -> bool {
    matches!(
        parts,
        [open, text, close, ..]
            if open.kind == DisplayPartKind::Punctuation
                && open.text == "("
                && text.kind == DisplayPartKind::Text
                && text.text == label
                && close.kind == DisplayPartKind::Punctuation
                && close.text == ")"
    )
}

/// Scan a signature's display parts for its top-level parameter list.
///
/// One forward pass tracking parenthesis and brace depth. Parameter names are
/// collected only at depth `( == 1, { == 0 }` once a name-like token has been
/// seen, so parameters of nested function types and object-typed parameter
/// members are ignored. A `?` after a parameter name marks it optional (the
/// name is dropped, only the flag kept); a `...` at call depth is a rest
/// parameter and ends the scan. A `{` before the first `(` means the
/// rendered type is an object literal, not a call signature — only the first
/// occurrences are compared, a top-level heuristic for getters returning
/// object types.
pub fn parameter_list_parts(display_parts: &[SymbolDisplayPart]) -> ParameterListParts {
    if display_parts.is_empty() {
        return ParameterListParts::null();
    }

    let mut parts = Vec::new();
    let mut is_in_method = false;
    let mut has_optional_parameters = false;
    let mut paren_count: i32 = 0;
    let mut brace_count: i32 = 0;
    // A local variable without any parenthesis is not a function.
    let mut is_local_variable = false;
    let mut has_seen_parenthesis = false;
    let mut first_brace_index: isize = -1;
    let mut first_parenthesis_index: isize = -1;

    // Engine-added `(alias)` / `(property)` annotations precede the real
    // signature; skip them.
    let start = if is_annotation(display_parts, "alias") || is_annotation(display_parts, "property")
    {
        3
    } else {
        0
    };

    'outer: for (i, part) in display_parts.iter().enumerate().skip(start) {
        match part.kind {
            DisplayPartKind::MethodName
            | DisplayPartKind::FunctionName
            | DisplayPartKind::Text
            | DisplayPartKind::PropertyName
            | DisplayPartKind::LocalName
            | DisplayPartKind::AliasName => {
                if paren_count == 0 && brace_count == 0 {
                    is_in_method = true;
                }
                if matches!(
                    part.kind,
                    DisplayPartKind::LocalName
                        | DisplayPartKind::AliasName
                        | DisplayPartKind::PropertyName
                ) {
                    is_local_variable = true;
                }
            }
            DisplayPartKind::ParameterName => {
                if paren_count == 1 && brace_count == 0 && is_in_method {
                    // Only take top-level parameter names; an optional
                    // parameter contributes the flag but not a placeholder.
                    let next = display_parts.get(i + 1);
                    let followed_by_optional_indicator =
                        next.is_some_and(|next| next.text == "?");
                    if !followed_by_optional_indicator {
                        parts.push(part.clone());
                    }
                    has_optional_parameters =
                        has_optional_parameters || followed_by_optional_indicator;
                }
            }
            DisplayPartKind::Punctuation => match part.text.as_str() {
                "(" => {
                    if first_parenthesis_index == -1 {
                        first_parenthesis_index = i as isize;
                        if first_brace_index != -1 && first_brace_index < first_parenthesis_index {
                            return ParameterListParts::null();
                        }
                    }
                    has_seen_parenthesis = true;
                    paren_count += 1;
                }
                ")" => {
                    paren_count -= 1;
                    if paren_count <= 0 && is_in_method {
                        break 'outer;
                    }
                }
                "..." if paren_count == 1 => {
                    // Rest parameter: nothing after it is individually
                    // addressable.
                    has_optional_parameters = true;
                    break 'outer;
                }
                "{" => {
                    if first_brace_index == -1 {
                        first_brace_index = i as isize;
                    }
                    brace_count += 1;
                }
                "}" => {
                    brace_count -= 1;
                }
                _ => {}
            },
            _ => {}
        }
    }

    if is_local_variable && !has_seen_parenthesis {
        return ParameterListParts::null();
    }

    ParameterListParts {
        parts,
        has_optional_parameters,
        is_function_call: true,
    }
}
