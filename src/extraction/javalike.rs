//! A small, deliberately best-effort text scanner for the target language.
//!
//! There is no mature Rust parser crate for a JUnit-flavored, statically
//! typed OO language in this codebase's dependency stack, so extraction and
//! code-writing both work off brace/paren matching and a handful of
//! regexes rather than a real AST. This mirrors the style of plain-text
//! context scanning already used elsewhere in this codebase (see
//! `workspace::collect_context`): formatting fidelity is best-effort, and
//! callers get `None`/an error rather than a panic when the heuristics
//! don't find what they're looking for.

use crate::extraction::{MethodSignature, Parameter};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Looks for `<type_name>.java` anywhere under `source_root`, for resolving
/// a declared variable's type to its source file.
pub fn find_sibling_file(source_root: &Path, type_name: &str) -> Option<PathBuf> {
    let target_name = format!("{type_name}.java");
    walkdir::WalkDir::new(source_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_file() && e.file_name().to_string_lossy() == target_name)
        .map(|e| e.path().to_path_buf())
}

fn method_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*(?:@\w+(?:\([^)]*\))?\s*)*(public|private|protected)\s+(?:static\s+)?(?:final\s+)?([\w<>\[\],\s\.\?]+?)\s+(\w+)\s*\(([^)]*)\)\s*(?:throws\s+[\w.,\s]+)?\s*\{",
        )
        .unwrap()
    })
}

fn class_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:public\s+)?(?:final\s+)?(?:abstract\s+)?class\s+(\w+)").unwrap()
    })
}

fn field_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*(?:private|public|protected)\s+(?:static\s+)?(?:final\s+)?([\w<>\[\],\s\.\?]+?)\s+(\w+)\s*(?:=[^;]*)?;",
        )
        .unwrap()
    })
}

/// A method found in source text: its header (signature) span and the span
/// of its body's contents (the bytes strictly between the outermost `{`
/// and its matching `}`).
#[derive(Debug, Clone)]
pub struct MethodSpan {
    pub signature: MethodSignature,
    pub visibility: String,
    /// Byte offset of the first character of the method (including any
    /// leading annotations/modifiers matched by the header regex).
    pub full_start: usize,
    /// Byte offset one past the closing `}` of the body.
    pub full_end: usize,
    /// Byte offset of the first character of the body (just after `{`).
    pub body_start: usize,
    /// Byte offset of the closing `}` of the body.
    pub body_end: usize,
}

impl MethodSpan {
    pub fn body_text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.body_start..self.body_end]
    }

    pub fn full_text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.full_start..self.full_end]
    }
}

/// Splits a raw parameter list (`"int a, String b"`) into `Parameter`s.
/// Tolerates generics (`List<String> xs`) by matching the last whitespace
/// run as the split point between type and name.
pub fn parse_parameters(raw: &str) -> Vec<Parameter> {
    split_top_level(raw, ',')
        .into_iter()
        .filter_map(|p| {
            let p = p.trim();
            if p.is_empty() {
                return None;
            }
            let p = p.trim_start_matches(|c: char| c == '@').to_string();
            let idx = p.rfind(char::is_whitespace)?;
            let (ty, name) = p.split_at(idx);
            Some(Parameter {
                type_name: ty.trim().to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}

/// Finds the matching closing brace for the `{` at `open_idx`, skipping
/// braces that appear inside string or char literals.
pub fn matching_brace(source: &str, open_idx: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    debug_assert_eq!(bytes.get(open_idx), Some(&b'{'));
    let mut depth = 0i32;
    let mut i = open_idx;
    let mut in_string = false;
    let mut in_char = false;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 1;
            } else if b == b'"' {
                in_string = false;
            }
        } else if in_char {
            if b == b'\\' {
                i += 1;
            } else if b == b'\'' {
                in_char = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'\'' => in_char = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Finds the matching closing parenthesis for the `(` at `open_idx`.
pub fn matching_paren(source: &str, open_idx: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    debug_assert_eq!(bytes.get(open_idx), Some(&b'('));
    let mut depth = 0i32;
    let mut i = open_idx;
    let mut in_string = false;
    let mut in_char = false;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 1;
            } else if b == b'"' {
                in_string = false;
            }
        } else if in_char {
            if b == b'\\' {
                i += 1;
            } else if b == b'\'' {
                in_char = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'\'' => in_char = true,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Splits `s` on `sep` at nesting depth zero (parens/brackets/braces, and
/// skipping string/char literals). Used for argument lists and parameter
/// lists alike.
pub fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut in_string = false;
    let mut in_char = false;
    let bytes = s.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i] as char;
        if in_string {
            if b == '\\' {
                i += 1;
            } else if b == '"' {
                in_string = false;
            }
        } else if in_char {
            if b == '\\' {
                i += 1;
            } else if b == '\'' {
                in_char = false;
            }
        } else {
            match b {
                '"' => in_string = true,
                '\'' => in_char = true,
                '(' | '[' | '{' | '<' => depth += 1,
                ')' | ']' | '}' | '>' => depth -= 1,
                c if c == sep && depth == 0 => {
                    out.push(s[start..i].to_string());
                    start = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }
    out.push(s[start..].to_string());
    out
}

/// Finds every method declaration in `source`, in source order.
pub fn find_all_methods(source: &str) -> Vec<MethodSpan> {
    let mut spans = Vec::new();
    for caps in method_header_re().captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let Some(brace_idx) = source[..whole.end()].rfind('{') else {
            continue;
        };
        let Some(close) = matching_brace(source, brace_idx) else {
            continue;
        };
        let visibility = caps.get(1).unwrap().as_str().to_string();
        let return_type = caps.get(2).unwrap().as_str().trim().to_string();
        let name = caps.get(3).unwrap().as_str().to_string();
        let params = parse_parameters(caps.get(4).unwrap().as_str());
        spans.push(MethodSpan {
            signature: MethodSignature {
                name,
                return_type,
                parameters: params,
            },
            visibility,
            full_start: whole.start(),
            full_end: close + 1,
            body_start: brace_idx + 1,
            body_end: close,
        });
    }
    spans
}

/// Finds the first method named `name`.
pub fn find_method(source: &str, name: &str) -> Option<MethodSpan> {
    find_all_methods(source).into_iter().find(|m| m.signature.name == name)
}

/// Every `public` method declaration, in source order.
pub fn find_public_methods(source: &str) -> Vec<MethodSpan> {
    find_all_methods(source)
        .into_iter()
        .filter(|m| m.visibility == "public")
        .collect()
}

/// The declared class name, if any `class Foo` declaration is present.
pub fn find_class_name(source: &str) -> Option<String> {
    class_decl_re()
        .captures(source)
        .map(|c| c.get(1).unwrap().as_str().to_string())
}

/// Field declarations (`private Type name;`), rendered as `"Type name"`.
/// Skips anything that looks like it has a parameter list (methods).
pub fn find_fields(source: &str) -> Vec<String> {
    field_decl_re()
        .captures_iter(source)
        .map(|c| {
            format!(
                "{} {}",
                c.get(1).unwrap().as_str().trim(),
                c.get(2).unwrap().as_str().trim()
            )
        })
        .collect()
}

/// Local variable declarations of the shape `Type name = ...;` or
/// `Type name;`, returned as `(type, name)` pairs in source order.
pub fn find_variable_declarations(source: &str) -> Vec<(String, String)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?:final\s+)?([A-Z][\w<>\[\],\.\s]*?)\s+(\w+)\s*=").unwrap()
    });
    re.captures_iter(source)
        .map(|c| {
            (
                c.get(1).unwrap().as_str().trim().to_string(),
                c.get(2).unwrap().as_str().trim().to_string(),
            )
        })
        .collect()
}

/// Finds calls to `word(...)`, case-sensitive exact identifier match, not
/// preceded by an identifier character (so `assertEquals` doesn't also
/// match inside `myAssertEquals`). Returns `(open_paren_idx, close_paren_idx)`
/// pairs in source order.
pub fn find_calls(source: &str, word: &str) -> Vec<(usize, usize)> {
    let bytes = source.as_bytes();
    let wb = word.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while let Some(rel) = find_sub(&bytes[i..], wb) {
        let start = i + rel;
        let before_ok = start == 0 || !is_ident_byte(bytes[start - 1]);
        let after = start + wb.len();
        if before_ok && bytes.get(after).copied() == Some(b'(') {
            if let Some(close) = matching_paren(source, after) {
                out.push((after, close));
                i = close + 1;
                continue;
            }
        }
        i = start + 1;
    }
    out
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn find_sub(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Given the byte index just past a call's closing `)`, returns the next
/// chained call `.name(args)` if the source continues that way (possibly
/// after whitespace), as `(name, open_paren_idx, close_paren_idx)`.
pub fn chained_call(source: &str, after_close_paren: usize) -> Option<(String, usize, usize)> {
    let rest = &source[after_close_paren..];
    let trimmed_start = rest.len() - rest.trim_start().len();
    let rest = rest.trim_start();
    if !rest.starts_with('.') {
        return None;
    }
    let name_start = 1;
    let name_end = rest[name_start..]
        .find(|c: char| !c.is_alphanumeric() && c != '_')
        .map(|i| name_start + i)?;
    let name = &rest[name_start..name_end];
    if rest[name_end..].trim_start().starts_with('(') {
        let abs_open = after_close_paren + trimmed_start + rest[..name_end].len()
            + rest[name_end..].find('(').unwrap();
        let close = matching_paren(source, abs_open)?;
        return Some((name.to_string(), abs_open, close));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_method_body_by_name() {
        let src = "public class Calculator {\n    public int add(int a, int b) { return 0; }\n}\n";
        let m = find_method(src, "add").unwrap();
        assert_eq!(m.signature.return_type, "int");
        assert_eq!(m.signature.parameters.len(), 2);
        assert_eq!(m.body_text(src).trim(), "return 0;");
    }

    #[test]
    fn handles_nested_braces_in_body() {
        let src = "public class C {\n    public void run() { if (true) { doThing(); } }\n}\n";
        let m = find_method(src, "run").unwrap();
        assert_eq!(m.body_text(src).trim(), "if (true) { doThing(); }");
    }

    #[test]
    fn splits_top_level_commas_respecting_nesting() {
        let parts = split_top_level("a(b, c), d", ',');
        assert_eq!(parts, vec!["a(b, c)".to_string(), " d".to_string()]);
    }

    #[test]
    fn finds_calls_and_chains() {
        let src = "when(repo.findById(1L)).thenReturn(user);";
        let calls = find_calls(src, "when");
        assert_eq!(calls.len(), 1);
        let (open, close) = calls[0];
        assert_eq!(&src[open + 1..close], "repo.findById(1L)");
        let chained = chained_call(src, close + 1).unwrap();
        assert_eq!(chained.0, "thenReturn");
    }
}
