//! Array, object and reference traversal.

use crate::doc::Doc;
use crate::error_tree::{Code, ErrorTree};
use crate::errors::SchemaError;
use crate::property::{bound, Outcome, Property};
use crate::schema::Reference;
use crate::validator::Scope;
use serde_json::Value;

impl Property {
    /// Arrays cast every element through `items`, when there is one.
    ///
    /// A code found on any element is recorded once on the array itself, and
    /// each element's own violations are recorded under its index.
    pub(crate) fn process_array(
        &self,
        items: Option<&Property>,
        raw: Option<&Value>,
        scope: &Scope<'_>,
    ) -> Result<Outcome, SchemaError> {
        let elements = match raw {
            Some(Value::Array(elements)) => elements,
            other => return Ok(self.process_opaque(other)),
        };

        let mut errors = ErrorTree::new();
        let length = elements.len() as f64;

        if !self.validate("minItems", |min| bound(min, |min| length >= min)) {
            errors.push(Code::MinItems);
        }

        if !self.validate("maxItems", |max| bound(max, |max| length <= max)) {
            errors.push(Code::MaxItems);
        }

        let items = match items {
            Some(items) => items,
            None => {
                let doc = Doc::Array(elements.iter().map(Doc::from).collect());
                return Ok(Outcome { doc, errors });
            }
        };

        let scope = scope.consumed();
        let mut docs = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let outcome = items.process(Some(element), &scope)?;
            for code in outcome.errors.codes() {
                errors.push(*code);
            }

            if !outcome.errors.is_empty() {
                errors.merge(&index.to_string(), outcome.errors);
            }

            docs.push(outcome.doc);
        }

        Ok(Outcome {
            doc: Doc::Array(docs),
            errors,
        })
    }

    /// Objects process every declared property, and nothing else.
    ///
    /// Declared properties missing from the input stay in the document as
    /// `Doc::Absent`, unless they have a `default`.
    pub(crate) fn process_object(
        &self,
        properties: &[(String, Property)],
        raw: Option<&Value>,
        scope: &Scope<'_>,
    ) -> Result<Outcome, SchemaError> {
        let fields = match raw {
            Some(Value::Object(fields)) => Some(fields),
            None | Some(Value::Null) => return Ok(self.process_opaque(raw)),
            Some(_) => None,
        };

        let scope = scope.consumed();
        let mut errors = ErrorTree::new();
        let mut entries = Vec::with_capacity(properties.len());
        for (name, property) in properties {
            let raw = fields.and_then(|fields| fields.get(name));
            let Outcome {
                doc,
                errors: property_errors,
            } = property.process(raw, &scope)?;

            let doc = match property.attrs().get("default") {
                Some(default) if doc.is_absent() && scope.apply_defaults() => Doc::from(default),
                _ => doc,
            };

            if !property_errors.is_empty() {
                errors.merge(name, property_errors);
            }

            entries.push((name.clone(), doc));
        }

        Ok(Outcome {
            doc: Doc::Object(entries),
            errors,
        })
    }

    /// A whole-schema reference processes the value with the referenced schema.
    /// A fragment reference splices the fragment into this definition, and
    /// processes the value with the result.
    pub(crate) fn process_reference(
        &self,
        reference: &Reference,
        raw: Option<&Value>,
        scope: &Scope<'_>,
    ) -> Result<Outcome, SchemaError> {
        let scope = scope.descend()?;
        let target = scope.context().resolve(reference)?;

        if reference.is_whole() {
            let mut outcome = target.process_within(raw, &scope)?;
            for code in self.base_errors(&outcome.doc).codes() {
                outcome.errors.push(*code);
            }

            return Ok(outcome);
        }

        // Compiled per use: the target's definition may have changed since.
        let definition = reference.splice(self.attrs(), target.definition())?;
        let property = Property::compile(&definition, &reference.to_string())?;
        property.process(raw, &scope)
    }

    /// Composites given nothing to traverse only make the base checks, and
    /// keep whatever they were given.
    fn process_opaque(&self, raw: Option<&Value>) -> Outcome {
        let doc = raw.map_or(Doc::Absent, Doc::from);
        let errors = self.base_errors(&doc);
        Outcome { doc, errors }
    }
}
