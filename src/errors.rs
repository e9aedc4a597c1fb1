//! An error type for misconfigured schemas.

use failure::Fail;

/// An enum of possible configuration errors that can emerge from this crate.
///
/// Data which does not satisfy a schema is never reported through this type.
/// Those violations are the _successful_ result of processing, and are
/// collected into an [`ErrorTree`](../error_tree/struct.ErrorTree.html).
#[derive(Debug, Fail, PartialEq, Clone, Eq, Hash)]
pub enum SchemaError {
    /// A schema definition, or one of the definitions nested inside it, was
    /// not a JSON object.
    ///
    /// `items` given as a list (tuple typing) also produces this error.
    #[fail(display = "invalid schema definition at: {}", path)]
    InvalidDefinition { path: String },

    /// A definition named a `type` that no property validator handles.
    #[fail(display = "bad schema, unknown property type: {}", typ)]
    UnknownType { typ: String },

    /// A `$ref` was not a string of the form `name` or `name#.fragment.path`.
    #[fail(display = "malformed reference: {}", reference)]
    InvalidReference { reference: String },

    /// A `$ref` was exercised on a schema constructed without a resolver.
    #[fail(display = "no resolver configured for reference: {}", reference)]
    NoResolver { reference: String },

    /// The resolver did not know the referenced schema.
    #[fail(display = "unresolved reference: {}", reference)]
    UnresolvedReference { reference: String },

    /// The referenced schema has nothing at the fragment path.
    #[fail(display = "reference {} has no fragment {}", reference, fragment)]
    NoSuchFragment { reference: String, fragment: String },

    /// A `pattern` keyword was not a valid regular expression.
    #[fail(display = "invalid pattern: {}", pattern)]
    InvalidPattern { pattern: String },

    /// The maximum reference depth was exceeded during processing.
    ///
    /// This likely means that your configured `max_depth` is too small, or
    /// that a schema refers back to itself at the same property.
    #[fail(display = "maximum reference depth exceeded during processing")]
    MaxDepthExceeded,
}
