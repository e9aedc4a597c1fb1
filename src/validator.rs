//! Configuration and results of processing.
//!
//! Processing an instance against a [`Schema`](../schema/struct.Schema.html)
//! casts it and validates it in the same pass. See
//! [`Schema::process`](../schema/struct.Schema.html#method.process).

use crate::doc::Doc;
use crate::error_tree::ErrorTree;
use crate::errors::SchemaError;
use crate::schema::Schema;

/// Configuration for how processing should proceed.
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub struct Config {
    max_depth: usize,
    apply_defaults: bool,
}

impl Config {
    /// Create a new, default `Config`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of `$ref`s followed in a row without moving
    /// into a property or an array element. The default value is 32.
    ///
    /// Recursive data may nest deeper than this: the count starts over at
    /// every level of the document.
    ///
    /// When processing is aborted because of this maximum depth, it *fails*
    /// with [`SchemaError::MaxDepthExceeded`](../errors/enum.SchemaError.html).
    /// No document or error tree is returned.
    ///
    /// This functionality exists to support detecting infinite loops in
    /// schemas which refer back to themselves at the same property.
    pub fn max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets whether the `default` of a property is written into the document
    /// when the property is absent from the input. Enabled by default.
    ///
    /// Defaults are never validated; they go into the document as given.
    pub fn apply_defaults(&mut self, apply_defaults: bool) -> &mut Self {
        self.apply_defaults = apply_defaults;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 32,
            apply_defaults: true,
        }
    }
}

/// The result of processing an instance: the casted document, and every
/// violation found along the way.
///
/// Note that a `Processed` with violations is still a successful result of
/// [`Schema::process`](../schema/struct.Schema.html#method.process).
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    doc: Doc,
    errors: ErrorTree,
}

impl Processed {
    pub(crate) fn new(doc: Doc, errors: ErrorTree) -> Self {
        Self { doc, errors }
    }

    /// Did the instance satisfy the schema? This holds exactly when the error
    /// tree is empty at every path.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The casted document.
    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    /// The violations, by path.
    pub fn errors(&self) -> &ErrorTree {
        &self.errors
    }

    /// Same as [`doc`](#method.doc) and [`errors`](#method.errors), but moves
    /// ownership.
    pub fn into_parts(self) -> (Doc, ErrorTree) {
        (self.doc, self.errors)
    }
}

/// Where processing currently stands: which schema `$ref`s resolve against,
/// and how many of them were followed to get here.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    context: &'a Schema,
    config: &'a Config,
    depth: usize,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(context: &'a Schema, config: &'a Config) -> Self {
        Self {
            context,
            config,
            depth: 0,
        }
    }

    pub(crate) fn context(&self) -> &'a Schema {
        self.context
    }

    pub(crate) fn apply_defaults(&self) -> bool {
        self.config.apply_defaults
    }

    /// The same scope, with `$ref`s resolving against another schema.
    pub(crate) fn within(&self, context: &'a Schema) -> Self {
        Self { context, ..*self }
    }

    /// The scope for a property or element below this one. Nothing has been
    /// followed at that position yet.
    pub(crate) fn consumed(&self) -> Self {
        Self { depth: 0, ..*self }
    }

    /// Account for following one more `$ref`.
    pub(crate) fn descend(&self) -> Result<Self, SchemaError> {
        if self.depth >= self.config.max_depth {
            return Err(SchemaError::MaxDepthExceeded);
        }

        Ok(Self {
            depth: self.depth + 1,
            ..*self
        })
    }
}
