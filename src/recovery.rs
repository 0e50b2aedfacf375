//! Best-effort recovery of a JSON object from free-form model output.
//!
//! Generative-model replies are not guaranteed to be clean JSON: they may wrap
//! the payload in prose or markdown fences, leave trailing commas, or fall back
//! to Python-literal dict syntax. Recovery runs an ordered chain of parser
//! strategies and stops at the first one that produces a JSON object.

use log::debug;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

type Strategy = fn(&str) -> Option<Value>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("strict", parse_strict),
    ("brace-slice", parse_brace_slice),
    ("permissive-literal", parse_permissive_literal),
];

/// Extract a JSON object from raw model text. Returns `None` when no strategy
/// yields an object.
pub fn recover(text: &str) -> Option<Value> {
    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(text) {
            if value.is_object() {
                debug!("recovered JSON object via '{}' strategy", name);
                return Some(value);
            }
        }
    }
    None
}

fn parse_strict(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Slice from the first `{` to the last `}` and retry after trailing-comma
/// repairs. Handles prose or markdown fences around the payload.
fn parse_brace_slice(text: &str) -> Option<Value> {
    let candidate = brace_slice(text)?;
    serde_json::from_str(&repair_trailing_commas(candidate)).ok()
}

/// Last resort: treat the brace slice as a Python-style literal (single-quoted
/// strings, `True`/`False`/`None`) and normalize it into JSON before parsing.
fn parse_permissive_literal(text: &str) -> Option<Value> {
    let candidate = brace_slice(text)?;
    let normalized = pythonish_to_json(candidate);
    serde_json::from_str(&repair_trailing_commas(&normalized)).ok()
}

fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn repair_trailing_commas(candidate: &str) -> String {
    static BEFORE_CLOSE: OnceLock<Regex> = OnceLock::new();
    static BEFORE_BRACKET: OnceLock<Regex> = OnceLock::new();
    let before_close = BEFORE_CLOSE.get_or_init(|| Regex::new(r",\s*\}\s*$").unwrap());
    let before_bracket = BEFORE_BRACKET.get_or_init(|| Regex::new(r",\s*\]").unwrap());

    let repaired = before_close.replace(candidate, "}");
    before_bracket.replace_all(&repaired, "]").into_owned()
}

/// Rewrite Python-literal syntax into JSON: single-quoted strings become
/// double-quoted (escaping any embedded `"`), and the bare words `True`,
/// `False`, `None` become their JSON equivalents outside of strings.
fn pythonish_to_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                out.push('"');
                while let Some(inner) = chars.next() {
                    out.push(inner);
                    if inner == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if inner == '"' {
                        break;
                    }
                }
            }
            '\'' => {
                out.push('"');
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => match chars.next() {
                            // \' is not a JSON escape; emit the bare quote
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => out.push('\\'),
                        },
                        '\'' => break,
                        '"' => out.push_str("\\\""),
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            _ if c.is_alphabetic() => {
                let mut word = String::new();
                word.push(c);
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    "None" => out.push_str("null"),
                    other => out.push_str(other),
                }
            }
            _ => out.push(c),
        }
    }

    out
}
