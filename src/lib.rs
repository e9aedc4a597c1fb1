//! `json-cast` validates JSON data against declarative schemas, and casts the
//! data into the form its schema calls for in the same pass.
//!
//! Processing an instance produces two things: a casted document, in which
//! numeric strings have become numbers, date strings have become dates and so
//! on, and an error tree, which records by path every keyword the instance
//! violated.
//!
//! # Processing data
//!
//! ```
//! use serde_json::json;
//! use json_cast::{Code, Doc, Schema};
//! use failure::Error;
//!
//! fn main() -> Result<(), Error> {
//!     // Definitions are plain JSON objects. They are compiled once, and can
//!     // be used to process any number of instances.
//!     let schema = Schema::new(json!({
//!         "type": "object",
//!         "properties": {
//!             "name": { "type": "string", "required": true },
//!             "age": { "type": "integer", "maximum": 125 },
//!             "born": { "type": "string", "format": "date" },
//!             "phones": {
//!                 "type": "array",
//!                 "items": { "type": "string", "pattern": "\\+[0-9 ]+" }
//!             }
//!         }
//!     }))?;
//!
//!     let processed = schema.process(&json!({
//!         "name": "John Doe",
//!         "age": "43",
//!         "born": "1976-05-01",
//!         "phones": ["+44 1234567", "+44 2345678"]
//!     }))?;
//!
//!     assert!(processed.is_valid());
//!     assert_eq!(processed.doc().get("age"), Some(&Doc::Integer(43)));
//!     assert_eq!(processed.doc().get("born").and_then(Doc::year), Some(1976));
//!
//!     let processed = schema.process(&json!({
//!         "age": 200,
//!         "phones": ["+44 1234567", "call me"]
//!     }))?;
//!
//!     // Violations can be looked up by dot-delimited path...
//!     assert!(!processed.is_valid());
//!     assert_eq!(processed.errors().on("name"), Some(&[Code::Required][..]));
//!     assert_eq!(processed.errors().on("age"), Some(&[Code::Maximum][..]));
//!     assert_eq!(processed.errors().on("phones.1"), Some(&[Code::Pattern][..]));
//!
//!     // ...or listed all at once.
//!     let paths: Vec<String> = processed
//!         .errors()
//!         .violations()
//!         .iter()
//!         .map(|violation| violation.dot_path())
//!         .collect();
//!     assert_eq!(paths, vec!["name", "age", "phones", "phones.1"]);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Referring to other schemas
//!
//! A definition of the form `{ "$ref": "person" }` stands for the whole schema
//! named `person`, and `{ "$ref": "person#.properties" }` borrows just its
//! `properties`. This crate does not store named schemas: the embedding
//! application passes a [`Resolver`](schema/trait.Resolver.html) to
//! [`Schema::new_with_resolver`](schema/struct.Schema.html#method.new_with_resolver),
//! and references are resolved through it each time processing reaches them.
//!
//! # Errors
//!
//! Misconfigured schemas produce a [`SchemaError`](errors/enum.SchemaError.html).
//! Data that fails validation never does; every property and every element
//! is processed, and all violations end up in the
//! [`ErrorTree`](error_tree/struct.ErrorTree.html).

mod composite;
mod property;

pub mod doc;
pub mod error_tree;
pub mod errors;
pub mod schema;
pub mod validator;

pub use crate::doc::Doc;
pub use crate::error_tree::{Code, ErrorTree, Violation};
pub use crate::errors::SchemaError;
pub use crate::schema::{Resolver, Schema};
pub use crate::validator::{Config, Processed};
