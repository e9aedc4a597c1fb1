//! Hierarchical collections of violation codes.
//!
//! An [`ErrorTree`](struct.ErrorTree.html) mirrors the shape of the processed
//! document. Each node carries the codes of the keywords violated by the value
//! at that position, and a child node per property name or array index below
//! it that had violations of its own.

use json_pointer::JsonPointer;
use serde::Serialize;
use std::fmt;

/// The keyword which a value violated.
///
/// Codes serialize to, and display as, the name of the schema keyword.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Code {
    Required,
    MinLength,
    MaxLength,
    Pattern,
    Enum,
    Format,
    Minimum,
    Maximum,
    DivisibleBy,
    MinItems,
    MaxItems,
}

impl Code {
    /// The schema keyword this code stands for.
    pub fn as_str(self) -> &'static str {
        match self {
            Code::Required => "required",
            Code::MinLength => "minLength",
            Code::MaxLength => "maxLength",
            Code::Pattern => "pattern",
            Code::Enum => "enum",
            Code::Format => "format",
            Code::Minimum => "minimum",
            Code::Maximum => "maximum",
            Code::DivisibleBy => "divisibleBy",
            Code::MinItems => "minItems",
            Code::MaxItems => "maxItems",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tree of violation codes, addressable by dot-delimited paths.
///
/// Children are kept in the order they were first recorded, so that walking
/// the tree is deterministic for a given schema and input.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ErrorTree {
    codes: Vec<Code>,
    children: Vec<(String, ErrorTree)>,
}

impl ErrorTree {
    /// Constructs an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Does this tree hold no codes, at any path?
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty() && self.children.iter().all(|(_, child)| child.is_empty())
    }

    /// The codes attached directly to the root of this tree.
    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    /// The subtree under a single key, if anything was recorded there.
    pub fn child(&self, key: &str) -> Option<&ErrorTree> {
        self.children
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, child)| child)
    }

    /// Attach a code to the root of this tree. A code is only ever held once
    /// per node.
    pub fn push(&mut self, code: Code) {
        if !self.codes.contains(&code) {
            self.codes.push(code);
        }
    }

    /// Merge `subtree` in under `key`.
    ///
    /// The subtree's own codes are added to whatever `key` already holds, and
    /// its children are merged under `key` in turn.
    pub fn merge(&mut self, key: &str, subtree: ErrorTree) {
        self.child_mut(key).absorb(subtree);
    }

    fn absorb(&mut self, other: ErrorTree) {
        for code in other.codes {
            self.push(code);
        }

        for (key, child) in other.children {
            self.merge(&key, child);
        }
    }

    fn child_mut(&mut self, key: &str) -> &mut ErrorTree {
        let index = match self.children.iter().position(|(name, _)| name == key) {
            Some(index) => index,
            None => {
                self.children.push((key.to_owned(), ErrorTree::new()));
                self.children.len() - 1
            }
        };

        &mut self.children[index].1
    }

    /// The codes at a dot-delimited path, such as `guests.1.name`.
    ///
    /// The empty path addresses the root. Returns `None` when nothing was
    /// violated exactly at that path.
    pub fn on(&self, path: &str) -> Option<&[Code]> {
        let mut node = self;
        if !path.is_empty() {
            for key in path.split('.') {
                node = node.child(key)?;
            }
        }

        if node.codes.is_empty() {
            None
        } else {
            Some(&node.codes)
        }
    }

    /// Every path with codes of its own, parents before their children.
    pub fn violations(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.collect(&mut Vec::new(), &mut violations);
        violations
    }

    fn collect(&self, tokens: &mut Vec<String>, out: &mut Vec<Violation>) {
        if !self.codes.is_empty() {
            out.push(Violation {
                tokens: tokens.clone(),
                codes: self.codes.clone(),
            });
        }

        for (key, child) in &self.children {
            tokens.push(key.clone());
            child.collect(tokens, out);
            tokens.pop();
        }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for violation in self.violations() {
            let codes: Vec<&str> = violation.codes.iter().map(|code| code.as_str()).collect();
            writeln!(f, "{}: {}", violation.dot_path(), codes.join(", "))?;
        }

        Ok(())
    }
}

/// The codes recorded at one location of a processed document.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Violation {
    #[serde(rename = "path")]
    tokens: Vec<String>,
    codes: Vec<Code>,
}

impl Violation {
    /// The property names and array indices leading to the location.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The location as a dot-delimited path, as accepted by
    /// [`ErrorTree::on`](struct.ErrorTree.html#method.on).
    pub fn dot_path(&self) -> String {
        self.tokens.join(".")
    }

    /// The location as a JSON Pointer into the input.
    pub fn instance_path(&self) -> JsonPointer<&str, Vec<&str>> {
        JsonPointer::new(self.tokens.iter().map(String::as_str).collect())
    }

    /// The violated keywords, in the order they were checked.
    pub fn codes(&self) -> &[Code] {
        &self.codes
    }
}
