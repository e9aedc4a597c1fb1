//! Schemas, and the references between them.
//!
//! A [`Schema`](struct.Schema.html) owns a definition: a plain JSON object
//! using the keywords `type`, `required`, `minimum`, `maximum`,
//! `excludeMinimum`, `excludeMaximum`, `divisibleBy`, `minLength`,
//! `maxLength`, `pattern`, `enum`, `format`, `default`, `minItems`,
//! `maxItems`, `items`, `properties` and `$ref`. Unknown keys are ignored.

use crate::errors::SchemaError;
use crate::property::{Outcome, Property};
use crate::validator::{Config, Processed, Scope};
use failure::Error;
use log::debug;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Turns the name in a `$ref` into a schema.
///
/// Lookup and storage of named schemas belong to the embedding application;
/// this crate only ever asks for them. Any
/// `Fn(&str, &Schema) -> Option<Rc<Schema>>` closure is a resolver.
pub trait Resolver {
    /// Resolve `name`, as referenced from within `context`. Returns `None` if
    /// no such schema is known.
    fn resolve(&self, name: &str, context: &Schema) -> Option<Rc<Schema>>;
}

impl<F> Resolver for F
where
    F: Fn(&str, &Schema) -> Option<Rc<Schema>>,
{
    fn resolve(&self, name: &str, context: &Schema) -> Option<Rc<Schema>> {
        self(name, context)
    }
}

/// A schema definition, compiled for processing.
///
/// The definition stays live: it can be changed through
/// [`definition_mut`](#method.definition_mut) between calls to
/// [`process`](#method.process), and the next call honors the change.
pub struct Schema {
    definition: Value,
    config: Config,
    resolver: Option<Rc<dyn Resolver>>,
    compiled: RefCell<Option<Rc<Property>>>,
}

impl Schema {
    /// Compile a definition using the default configuration and no resolver.
    ///
    /// Returns an error if the definition, or any definition nested in it, is
    /// not an object or names an unknown `type`.
    pub fn new(definition: Value) -> Result<Schema, SchemaError> {
        Self::new_with_config(definition, Config::default())
    }

    /// Compile a definition using a configuration.
    pub fn new_with_config(definition: Value, config: Config) -> Result<Schema, SchemaError> {
        Self::build(definition, config, None)
    }

    /// Compile a definition whose `$ref`s are resolved through `resolver`.
    ///
    /// References are not resolved here. Each one is resolved every time
    /// processing reaches it, which is also when an unresolved reference is
    /// reported.
    pub fn new_with_resolver<R>(
        definition: Value,
        config: Config,
        resolver: R,
    ) -> Result<Schema, SchemaError>
    where
        R: Resolver + 'static,
    {
        Self::build(definition, config, Some(Rc::new(resolver)))
    }

    fn build(
        definition: Value,
        config: Config,
        resolver: Option<Rc<dyn Resolver>>,
    ) -> Result<Schema, SchemaError> {
        let root = Property::compile(&definition, "")?;
        Ok(Schema {
            definition,
            config,
            resolver,
            compiled: RefCell::new(Some(Rc::new(root))),
        })
    }

    /// Get the definition of the schema.
    pub fn definition(&self) -> &Value {
        &self.definition
    }

    /// Same as [`definition`](#method.definition), but takes a mutable
    /// reference.
    ///
    /// The schema is recompiled from the changed definition on the next call
    /// to [`process`](#method.process), which is also where a change that
    /// makes the definition invalid is reported.
    pub fn definition_mut(&mut self) -> &mut Value {
        if self.compiled.get_mut().take().is_some() {
            debug!("schema definition borrowed mutably, dropping compiled validators");
        }

        &mut self.definition
    }

    /// Get the configuration of the schema.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cast and validate an instance.
    ///
    /// Despite the violations in it being called "errors", the returned
    /// [`Processed`](../validator/struct.Processed.html) is the successful
    /// result of processing. This only returns an error if the schema itself is
    /// misconfigured: a changed definition that no longer compiles, an invalid
    /// `pattern`, a `$ref` that does not resolve, or a `$ref` chain deeper than
    /// the configured `max_depth`.
    pub fn process(&self, instance: &Value) -> Result<Processed, Error> {
        let scope = Scope::new(self, &self.config);
        let outcome = self.process_within(Some(instance), &scope)?;

        debug!(
            "processed instance, {} location(s) with violations",
            outcome.errors.violations().len()
        );
        Ok(Processed::new(outcome.doc, outcome.errors))
    }

    pub(crate) fn process_within(
        &self,
        raw: Option<&Value>,
        scope: &Scope<'_>,
    ) -> Result<Outcome, SchemaError> {
        let root = self.root()?;
        root.process(raw, &scope.within(self))
    }

    fn root(&self) -> Result<Rc<Property>, SchemaError> {
        if let Some(root) = &*self.compiled.borrow() {
            return Ok(Rc::clone(root));
        }

        let root = Rc::new(Property::compile(&self.definition, "")?);
        *self.compiled.borrow_mut() = Some(Rc::clone(&root));
        Ok(root)
    }

    pub(crate) fn resolve(&self, reference: &Reference) -> Result<Rc<Schema>, SchemaError> {
        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| SchemaError::NoResolver {
                reference: reference.to_string(),
            })?;

        debug!("resolving schema reference {}", reference);
        resolver
            .resolve(&reference.name, self)
            .ok_or_else(|| SchemaError::UnresolvedReference {
                reference: reference.to_string(),
            })
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("definition", &self.definition)
            .field("config", &self.config)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

/// A parsed `$ref`: the name of a schema, and optionally a dot-delimited path
/// to a part of that schema's definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    name: String,
    fragment: Vec<String>,
}

impl Reference {
    /// Parse `name` or `name#.fragment.path`.
    pub(crate) fn parse(raw: &str) -> Result<Reference, SchemaError> {
        let invalid = || SchemaError::InvalidReference {
            reference: raw.to_owned(),
        };

        let (name, fragment) = match raw.split_once('#') {
            Some((name, fragment)) => (name, fragment.strip_prefix('.').unwrap_or(fragment)),
            None => (raw, ""),
        };

        if name.is_empty() {
            return Err(invalid());
        }

        let fragment: Vec<String> = if fragment.is_empty() {
            Vec::new()
        } else {
            fragment.split('.').map(str::to_owned).collect()
        };

        if fragment.iter().any(String::is_empty) {
            return Err(invalid());
        }

        Ok(Reference {
            name: name.to_owned(),
            fragment,
        })
    }

    /// Does this reference stand for a whole schema, rather than a part of one?
    pub(crate) fn is_whole(&self) -> bool {
        self.fragment.is_empty()
    }

    /// Splice the referenced fragment of `target` into a local definition.
    ///
    /// The fragment lands under its own last key; `person#.properties` gives
    /// the local definition `person`'s `properties`. Keys already in the local
    /// definition take precedence, and a local definition without a `type`
    /// takes the type of the fragment's parent.
    pub(crate) fn splice(
        &self,
        local: &Map<String, Value>,
        target: &Value,
    ) -> Result<Value, SchemaError> {
        let missing = || SchemaError::NoSuchFragment {
            reference: self.to_string(),
            fragment: self.fragment.join("."),
        };

        let mut parent = target;
        let mut found = target;
        for token in &self.fragment {
            parent = found;
            found = found.get(token.as_str()).ok_or_else(missing)?;
        }

        let key = self.fragment.last().ok_or_else(missing)?;
        let mut spliced = local.clone();
        spliced.remove("$ref");
        spliced
            .entry(key.clone())
            .or_insert_with(|| found.clone());

        if !spliced.contains_key("type") {
            if let Some(typ) = parent.get("type") {
                spliced.insert("type".to_owned(), typ.clone());
            }
        }

        Ok(Value::Object(spliced))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}#.{}", self.name, self.fragment.join("."))
        }
    }
}
