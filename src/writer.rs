//! Method-level source surgery: inject/replace/append a method body, or
//! create a new file containing a class with the method.
//!
//! Operates on the brace-scanned representation from
//! `extraction::javalike` rather than a real parse tree, and returns a
//! structured failure instead of panicking when it can't find or modify
//! the target.

use crate::extraction::javalike;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the body of an existing method that currently has a
    /// placeholder or empty body.
    Inject,
    /// Replace the body of an existing method unconditionally.
    Replace,
    /// Add a new method to the class.
    Append,
    /// Write a new file containing a class with the method.
    Create,
}

#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub path: PathBuf,
    pub mode: WriteMode,
    pub method_name: String,
    pub new_body: String,
    /// Only consulted for `Create`: the class name and the method's full
    /// signature (return type + parameter list), used to scaffold a new
    /// file from scratch.
    pub class_name: Option<String>,
    pub method_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    pub success: bool,
    pub error_message: Option<String>,
}

impl WriteResult {
    fn ok() -> Self {
        Self {
            success: true,
            error_message: None,
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(msg.into()),
        }
    }
}

pub struct CodeWriter;

impl CodeWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, request: &WriteRequest) -> WriteResult {
        match request.mode {
            WriteMode::Create => self.create(request),
            WriteMode::Append => self.append(request),
            WriteMode::Inject => self.replace_body(request, true),
            WriteMode::Replace => self.replace_body(request, false),
        }
    }

    fn replace_body(&self, request: &WriteRequest, require_placeholder: bool) -> WriteResult {
        let source = match std::fs::read_to_string(&request.path) {
            Ok(s) => s,
            Err(e) => return WriteResult::err(format!("could not read {}: {e}", request.path.display())),
        };
        let Some(method) = javalike::find_method(&source, &request.method_name) else {
            return WriteResult::err(format!("method '{}' not found", request.method_name));
        };
        if require_placeholder && !looks_like_placeholder(method.body_text(&source)) {
            return WriteResult::err(format!(
                "method '{}' already has a non-placeholder body; INJECT requires an empty or placeholder body",
                request.method_name
            ));
        }
        let mut out = String::with_capacity(source.len() + request.new_body.len());
        out.push_str(&source[..method.body_start]);
        out.push('\n');
        out.push_str(indent(&request.new_body, "        ").trim_end());
        out.push('\n');
        out.push_str(&source[method.body_end..]);
        match std::fs::write(&request.path, out) {
            Ok(()) => WriteResult::ok(),
            Err(e) => WriteResult::err(format!("could not write {}: {e}", request.path.display())),
        }
    }

    fn append(&self, request: &WriteRequest) -> WriteResult {
        let source = match std::fs::read_to_string(&request.path) {
            Ok(s) => s,
            Err(e) => return WriteResult::err(format!("could not read {}: {e}", request.path.display())),
        };
        if javalike::find_method(&source, &request.method_name).is_some() {
            return WriteResult::err(format!(
                "method '{}' already exists; APPEND requires no prior method of that name",
                request.method_name
            ));
        }
        let Some(class_brace) = source.find('{') else {
            return WriteResult::err("target file has no class body to append into");
        };
        let Some(close) = javalike::matching_brace(&source, class_brace) else {
            return WriteResult::err("target file's class body is unbalanced");
        };
        let signature = request
            .method_signature
            .clone()
            .unwrap_or_else(|| format!("public void {}()", request.method_name));
        let mut method_block = String::new();
        method_block.push_str("\n    ");
        method_block.push_str(&signature);
        method_block.push_str(" {\n");
        method_block.push_str(indent(&request.new_body, "        ").trim_end());
        method_block.push_str("\n    }\n");

        let mut out = String::with_capacity(source.len() + method_block.len());
        out.push_str(&source[..close]);
        out.push_str(&method_block);
        out.push_str(&source[close..]);
        match std::fs::write(&request.path, out) {
            Ok(()) => WriteResult::ok(),
            Err(e) => WriteResult::err(format!("could not write {}: {e}", request.path.display())),
        }
    }

    fn create(&self, request: &WriteRequest) -> WriteResult {
        if request.path.exists() {
            return WriteResult::err(format!("{} already exists; CREATE requires a new file", request.path.display()));
        }
        let class_name = request.class_name.clone().unwrap_or_else(|| {
            request
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Generated".to_string())
        });
        let signature = request
            .method_signature
            .clone()
            .unwrap_or_else(|| format!("public void {}()", request.method_name));
        let mut out = String::new();
        out.push_str(&format!("public class {class_name} {{\n"));
        out.push_str(&format!("    {signature} {{\n"));
        out.push_str(indent(&request.new_body, "        ").trim_end());
        out.push_str("\n    }\n}\n");
        if let Some(parent) = request.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return WriteResult::err(format!("could not create {}: {e}", parent.display()));
            }
        }
        match std::fs::write(&request.path, out) {
            Ok(()) => WriteResult::ok(),
            Err(e) => WriteResult::err(format!("could not write {}: {e}", request.path.display())),
        }
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn looks_like_placeholder(body: &str) -> bool {
    let trimmed = body.trim();
    trimmed.is_empty()
        || trimmed == "return 0;"
        || trimmed == "return null;"
        || trimmed == "return false;"
        || trimmed.starts_with("throw new UnsupportedOperationException")
        || trimmed.starts_with("// TODO")
        || trimmed.starts_with("/* TODO")
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|l| if l.is_empty() { l.to_string() } else { format!("{prefix}{l}") })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convenience used by tests and the write-request builder in the
/// implement/refactor tasks.
pub fn placeholder_path(dir: &Path, class_name: &str) -> PathBuf {
    dir.join(format!("{class_name}.java"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_replaces_placeholder_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Calculator.java");
        std::fs::write(&path, "public class Calculator {\n    public int add(int a, int b) { return 0; }\n}\n").unwrap();

        let request = WriteRequest {
            path: path.clone(),
            mode: WriteMode::Inject,
            method_name: "add".to_string(),
            new_body: "return a + b;".to_string(),
            class_name: None,
            method_signature: None,
        };
        let result = CodeWriter::new().write(&request);
        assert!(result.success, "{:?}", result.error_message);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("return a + b;"));
        assert!(!contents.contains("return 0;"));
    }

    #[test]
    fn inject_rejects_non_placeholder_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Calculator.java");
        std::fs::write(&path, "public class Calculator {\n    public int add(int a, int b) { return a - b; }\n}\n").unwrap();

        let request = WriteRequest {
            path,
            mode: WriteMode::Inject,
            method_name: "add".to_string(),
            new_body: "return a + b;".to_string(),
            class_name: None,
            method_signature: None,
        };
        let result = CodeWriter::new().write(&request);
        assert!(!result.success);
    }

    #[test]
    fn replace_overwrites_any_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Calculator.java");
        std::fs::write(&path, "public class Calculator {\n    public int add(int a, int b) { return a - b; }\n}\n").unwrap();

        let request = WriteRequest {
            path: path.clone(),
            mode: WriteMode::Replace,
            method_name: "add".to_string(),
            new_body: "return a + b;".to_string(),
            class_name: None,
            method_signature: None,
        };
        let result = CodeWriter::new().write(&request);
        assert!(result.success);
        assert!(std::fs::read_to_string(&path).unwrap().contains("return a + b;"));
    }

    #[test]
    fn append_fails_if_method_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Calculator.java");
        std::fs::write(&path, "public class Calculator {\n    public int add(int a, int b) { return a + b; }\n}\n").unwrap();

        let request = WriteRequest {
            path,
            mode: WriteMode::Append,
            method_name: "add".to_string(),
            new_body: "return a + b;".to_string(),
            class_name: None,
            method_signature: Some("public int add(int a, int b)".to_string()),
        };
        let result = CodeWriter::new().write(&request);
        assert!(!result.success);
    }

    #[test]
    fn append_adds_new_method() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Calculator.java");
        std::fs::write(&path, "public class Calculator {\n}\n").unwrap();

        let request = WriteRequest {
            path: path.clone(),
            mode: WriteMode::Append,
            method_name: "add".to_string(),
            new_body: "return a + b;".to_string(),
            class_name: None,
            method_signature: Some("public int add(int a, int b)".to_string()),
        };
        let result = CodeWriter::new().write(&request);
        assert!(result.success, "{:?}", result.error_message);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("public int add(int a, int b)"));
    }

    #[test]
    fn create_writes_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Calculator.java");
        let request = WriteRequest {
            path: path.clone(),
            mode: WriteMode::Create,
            method_name: "add".to_string(),
            new_body: "return a + b;".to_string(),
            class_name: Some("Calculator".to_string()),
            method_signature: Some("public int add(int a, int b)".to_string()),
        };
        let result = CodeWriter::new().write(&request);
        assert!(result.success, "{:?}", result.error_message);
        assert!(std::fs::read_to_string(&path).unwrap().contains("class Calculator"));
    }

    #[test]
    fn target_method_not_found_returns_error_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Calculator.java");
        std::fs::write(&path, "public class Calculator {\n}\n").unwrap();
        let request = WriteRequest {
            path,
            mode: WriteMode::Replace,
            method_name: "missing".to_string(),
            new_body: "return 1;".to_string(),
            class_name: None,
            method_signature: None,
        };
        let result = CodeWriter::new().write(&request);
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("not found"));
    }
}
