//! Property validators: the compiled form of a definition.
//!
//! Each definition compiles to one [`Property`](struct.Property.html), picked
//! by its `type`. Keyword values are never copied out of the definition; every
//! check reads them through [`Property::validate`] at the moment it runs.

use crate::doc::Doc;
use crate::error_tree::{Code, ErrorTree};
use crate::errors::SchemaError;
use crate::schema::Reference;
use crate::validator::Scope;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

// `\d` would admit non-ASCII digits.
static DATE_SHAPE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").ok());
static DATE_TIME_SHAPE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}Z$").ok());

static NUMBER_PREFIX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").ok());
static INTEGER_PREFIX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+").ok());

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// The casted value at some position, and the violations at and below it.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) doc: Doc,
    pub(crate) errors: ErrorTree,
}

pub(crate) struct Property {
    attrs: Map<String, Value>,
    kind: Kind,
}

pub(crate) enum Kind {
    Any,
    String,
    Number,
    Integer,
    Array(Option<Box<Property>>),
    Object(Vec<(String, Property)>),
    Ref(Reference),
}

impl Property {
    /// Compile a definition. `path` locates the definition for error messages.
    ///
    /// A definition with a `$ref` compiles to a reference, whatever else it
    /// holds. Otherwise `type` picks the validator, defaulting to `any`.
    pub(crate) fn compile(definition: &Value, path: &str) -> Result<Property, SchemaError> {
        let attrs = definition
            .as_object()
            .ok_or_else(|| SchemaError::InvalidDefinition {
                path: path.to_owned(),
            })?
            .clone();

        if let Some(reference) = attrs.get("$ref") {
            let reference = match reference.as_str() {
                Some(reference) => Reference::parse(reference)?,
                None => {
                    return Err(SchemaError::InvalidReference {
                        reference: reference.to_string(),
                    })
                }
            };

            return Ok(Property::reference(attrs, reference));
        }

        let typ = match attrs.get("type") {
            None => "any".to_owned(),
            Some(Value::String(typ)) => typ.clone(),
            Some(other) => {
                return Err(SchemaError::UnknownType {
                    typ: other.to_string(),
                })
            }
        };

        trace!("compiling {} property at {:?}", typ, path);
        match typ.as_str() {
            "any" => Ok(Property::any(attrs)),
            "string" => Ok(Property::string(attrs)),
            "number" => Ok(Property::number(attrs)),
            "integer" => Ok(Property::integer(attrs)),
            "array" => Property::array(attrs, path),
            "object" => Property::object(attrs, path),
            _ => Err(SchemaError::UnknownType { typ }),
        }
    }

    pub(crate) fn any(attrs: Map<String, Value>) -> Property {
        Property {
            attrs,
            kind: Kind::Any,
        }
    }

    pub(crate) fn string(attrs: Map<String, Value>) -> Property {
        Property {
            attrs,
            kind: Kind::String,
        }
    }

    pub(crate) fn number(attrs: Map<String, Value>) -> Property {
        Property {
            attrs,
            kind: Kind::Number,
        }
    }

    pub(crate) fn integer(attrs: Map<String, Value>) -> Property {
        Property {
            attrs,
            kind: Kind::Integer,
        }
    }

    pub(crate) fn array(attrs: Map<String, Value>, path: &str) -> Result<Property, SchemaError> {
        let items = match attrs.get("items") {
            None => None,
            Some(items @ Value::Object(_)) => {
                Some(Box::new(Property::compile(items, &join(path, "items"))?))
            }
            Some(_) => {
                return Err(SchemaError::InvalidDefinition {
                    path: join(path, "items"),
                })
            }
        };

        Ok(Property {
            attrs,
            kind: Kind::Array(items),
        })
    }

    pub(crate) fn object(attrs: Map<String, Value>, path: &str) -> Result<Property, SchemaError> {
        let properties = match attrs.get("properties") {
            None => Vec::new(),
            Some(Value::Object(properties)) => properties
                .iter()
                .map(|(name, definition)| {
                    Property::compile(definition, &join(path, name))
                        .map(|property| (name.clone(), property))
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(SchemaError::InvalidDefinition {
                    path: join(path, "properties"),
                })
            }
        };

        Ok(Property {
            attrs,
            kind: Kind::Object(properties),
        })
    }

    pub(crate) fn reference(attrs: Map<String, Value>, reference: Reference) -> Property {
        Property {
            attrs,
            kind: Kind::Ref(reference),
        }
    }

    pub(crate) fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    /// Cast and validate `raw`, which is `None` when no value was given.
    pub(crate) fn process(
        &self,
        raw: Option<&Value>,
        scope: &Scope<'_>,
    ) -> Result<Outcome, SchemaError> {
        match &self.kind {
            Kind::Array(items) => self.process_array(items.as_deref(), raw, scope),
            Kind::Object(properties) => self.process_object(properties, raw, scope),
            Kind::Ref(reference) => self.process_reference(reference, raw, scope),
            Kind::Any | Kind::String | Kind::Number | Kind::Integer => self.process_scalar(raw),
        }
    }

    fn process_scalar(&self, raw: Option<&Value>) -> Result<Outcome, SchemaError> {
        let doc = match raw {
            None => Doc::Absent,
            Some(Value::Null) => Doc::Null,
            Some(value) => self.cast(value),
        };

        let mut errors = self.base_errors(&doc);
        if let (Some(value), true) = (raw, doc.is_present()) {
            match self.kind {
                Kind::String => self.string_errors(&stringify(value), &mut errors)?,
                Kind::Number | Kind::Integer => self.number_errors(&doc, &mut errors),
                _ => {}
            }
        }

        Ok(Outcome { doc, errors })
    }

    fn cast(&self, value: &Value) -> Doc {
        match self.kind {
            Kind::String => self.cast_string(value),
            Kind::Number => cast_number(value),
            Kind::Integer => cast_integer(value),
            _ => Doc::from(value),
        }
    }

    fn cast_string(&self, value: &Value) -> Doc {
        let text = stringify(value);
        let parsed = match self.attrs.get("format").and_then(Value::as_str) {
            Some("date") => parse_date(&text).map(Doc::Date),
            Some("date-time") => parse_date_time(&text).map(Doc::DateTime),
            _ => None,
        };

        parsed.unwrap_or(Doc::String(text))
    }

    /// Look up `keyword` and test its configured value with `predicate`. An
    /// absent keyword is not enforced.
    pub(crate) fn validate<F>(&self, keyword: &str, predicate: F) -> bool
    where
        F: FnOnce(&Value) -> bool,
    {
        self.attrs.get(keyword).map_or(true, predicate)
    }

    /// Same as [`validate`](#method.validate), for checks which can find the
    /// keyword itself misconfigured.
    pub(crate) fn try_validate<F>(&self, keyword: &str, predicate: F) -> Result<bool, SchemaError>
    where
        F: FnOnce(&Value) -> Result<bool, SchemaError>,
    {
        self.attrs.get(keyword).map_or(Ok(true), predicate)
    }

    fn flag(&self, keyword: &str) -> bool {
        self.attrs
            .get(keyword)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The checks every validator makes, whatever its type.
    pub(crate) fn base_errors(&self, doc: &Doc) -> ErrorTree {
        let mut errors = ErrorTree::new();
        if !self.validate("required", |required| {
            !(required.as_bool() == Some(true) && doc.is_absent())
        }) {
            errors.push(Code::Required);
        }

        errors
    }

    fn string_errors(&self, text: &str, errors: &mut ErrorTree) -> Result<(), SchemaError> {
        let length = text.chars().count() as f64;

        if !self.validate("minLength", |min| bound(min, |min| length >= min)) {
            errors.push(Code::MinLength);
        }

        if !self.validate("maxLength", |max| bound(max, |max| length <= max)) {
            errors.push(Code::MaxLength);
        }

        if !self.try_validate("pattern", |pattern| full_match(pattern, text))? {
            errors.push(Code::Pattern);
        }

        if !self.validate("enum", |options| match options.as_array() {
            Some(options) => options.iter().any(|option| stringify(option) == text),
            None => {
                warn!("ignoring non-list enum {}", options);
                true
            }
        }) {
            errors.push(Code::Enum);
        }

        if !self.validate("format", |format| valid_format(format.as_str(), text)) {
            errors.push(Code::Format);
        }

        Ok(())
    }

    fn number_errors(&self, doc: &Doc, errors: &mut ErrorTree) {
        let n = match doc.as_f64() {
            Some(n) => n,
            None => return,
        };

        let exclusive = self.flag("excludeMinimum");
        if !self.validate("minimum", |min| {
            bound(min, |min| if exclusive { n > min } else { n >= min })
        }) {
            errors.push(Code::Minimum);
        }

        let exclusive = self.flag("excludeMaximum");
        if !self.validate("maximum", |max| {
            bound(max, |max| if exclusive { n < max } else { n <= max })
        }) {
            errors.push(Code::Maximum);
        }

        if !self.validate("divisibleBy", |div| bound(div, |div| n % div == 0.0)) {
            errors.push(Code::DivisibleBy);
        }
    }
}

pub(crate) fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Apply `check` to a numeric keyword value. Non-numeric values are not
/// enforced.
pub(crate) fn bound<F: FnOnce(f64) -> bool>(setting: &Value, check: F) -> bool {
    match setting.as_f64() {
        Some(bound) => check(bound),
        None => {
            warn!("ignoring non-numeric bound {}", setting);
            true
        }
    }
}

/// The natural string form of a value: strings as-is, everything else as JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cast_number(value: &Value) -> Doc {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            numeric_prefix(&NUMBER_PREFIX, s).and_then(|n| n.parse::<f64>().ok())
        }
        _ => None,
    };

    number
        .filter(|n| n.is_finite())
        .map_or(Doc::Null, Doc::Number)
}

/// Strings cast by their leading decimal digits, so `"3.7"` and `"1e3"` both
/// stop at the first non-digit.
fn cast_integer(value: &Value) -> Doc {
    let integer = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => numeric_prefix(&INTEGER_PREFIX, s).and_then(|n| {
            n.parse::<i64>()
                .ok()
                .or_else(|| n.parse::<f64>().ok().and_then(truncate))
        }),
        _ => None,
    };

    integer.map_or(Doc::Null, Doc::Integer)
}

/// The longest numeric prefix of `text`, after leading whitespace. Trailing
/// text such as a unit is ignored.
fn numeric_prefix<'t>(prefix: &Lazy<Option<Regex>>, text: &'t str) -> Option<&'t str> {
    let text = text.trim_start();
    prefix
        .as_ref()
        .and_then(|prefix| prefix.find(text))
        .map(|found| found.as_str())
}

fn truncate(n: f64) -> Option<i64> {
    if n.is_finite() && n.abs() < i64::MAX as f64 {
        Some(n.trunc() as i64)
    } else {
        None
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.with_timezone(&Utc));
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| parse_date(text).and_then(|date| date.and_hms_opt(0, 0, 0)))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn full_match(pattern: &Value, text: &str) -> Result<bool, SchemaError> {
    let invalid = || SchemaError::InvalidPattern {
        pattern: stringify(pattern),
    };

    let pattern = pattern.as_str().ok_or_else(invalid)?;
    let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|_| invalid())?;
    Ok(regex.is_match(text))
}

/// Formats are checked against the text as given, not the casted value.
fn valid_format(format: Option<&str>, text: &str) -> bool {
    match format {
        Some("date") => has_shape(&DATE_SHAPE, text),
        Some("date-time") => has_shape(&DATE_TIME_SHAPE, text),
        _ => true,
    }
}

fn has_shape(shape: &Lazy<Option<Regex>>, text: &str) -> bool {
    shape.as_ref().map_or(false, |shape| shape.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::validator::Config;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(definition: Value, raw: Option<&Value>) -> Result<Outcome, SchemaError> {
        let schema = Schema::new(json!({}))?;
        let config = Config::default();
        let property = Property::compile(&definition, "")?;
        property.process(raw, &Scope::new(&schema, &config))
    }

    fn codes(definition: Value, raw: Value) -> Vec<Code> {
        run(definition, Some(&raw)).unwrap().errors.codes().to_vec()
    }

    #[test]
    fn integer_bounds_in_order() {
        let definition = json!({
            "type": "integer",
            "minimum": 10,
            "maximum": 50,
            "divisibleBy": 10,
        });

        assert_eq!(
            codes(definition.clone(), json!(5)),
            vec![Code::Minimum, Code::DivisibleBy]
        );
        assert_eq!(codes(definition.clone(), json!(100)), vec![Code::Maximum]);
        assert_eq!(codes(definition.clone(), json!(35)), vec![Code::DivisibleBy]);
        assert_eq!(codes(definition.clone(), json!(10)), Vec::<Code>::new());
        assert_eq!(codes(definition, json!(50)), Vec::<Code>::new());
    }

    #[test]
    fn exclusive_bounds() {
        let definition = json!({ "type": "number", "minimum": 10, "excludeMinimum": true });
        assert_eq!(codes(definition.clone(), json!(10)), vec![Code::Minimum]);
        assert_eq!(codes(definition, json!(11)), Vec::<Code>::new());

        let definition = json!({ "type": "number", "maximum": 10, "excludeMaximum": true });
        assert_eq!(codes(definition.clone(), json!(10)), vec![Code::Maximum]);
        assert_eq!(codes(definition, json!(9.5)), Vec::<Code>::new());
    }

    #[test]
    fn required_only_when_absent() -> Result<(), SchemaError> {
        let definition = json!({ "type": "string", "required": true, "minLength": 3 });
        assert_eq!(
            run(definition.clone(), None)?.errors.codes(),
            &[Code::Required]
        );
        assert!(run(definition.clone(), Some(&json!(null)))?.errors.is_empty());
        assert_eq!(codes(definition, json!("ab")), vec![Code::MinLength]);
        assert!(run(json!({ "type": "string" }), None)?.errors.is_empty());

        Ok(())
    }

    #[test]
    fn number_casts() -> Result<(), SchemaError> {
        let number = json!({ "type": "number" });
        assert_eq!(run(number.clone(), Some(&json!("35.5")))?.doc, Doc::Number(35.5));
        assert_eq!(run(number.clone(), Some(&json!(" 7 ")))?.doc, Doc::Number(7.0));
        assert_eq!(run(number.clone(), Some(&json!("abc")))?.doc, Doc::Null);
        assert_eq!(run(number, Some(&json!(true)))?.doc, Doc::Null);

        let integer = json!({ "type": "integer" });
        assert_eq!(run(integer.clone(), Some(&json!("35")))?.doc, Doc::Integer(35));
        assert_eq!(run(integer.clone(), Some(&json!("3.7")))?.doc, Doc::Integer(3));
        assert_eq!(run(integer.clone(), Some(&json!(-2.5)))?.doc, Doc::Integer(-2));
        assert_eq!(run(integer, Some(&json!([])))?.doc, Doc::Null);

        Ok(())
    }

    #[test]
    fn numbers_cast_from_leading_digits() -> Result<(), SchemaError> {
        let number = json!({ "type": "number" });
        assert_eq!(run(number.clone(), Some(&json!("35.5kg")))?.doc, Doc::Number(35.5));
        assert_eq!(run(number.clone(), Some(&json!("10 apples")))?.doc, Doc::Number(10.0));
        assert_eq!(run(number.clone(), Some(&json!("1e3")))?.doc, Doc::Number(1000.0));
        assert_eq!(run(number.clone(), Some(&json!(".5")))?.doc, Doc::Number(0.5));
        assert_eq!(run(number.clone(), Some(&json!("1e")))?.doc, Doc::Number(1.0));
        assert_eq!(run(number, Some(&json!("abc")))?.doc, Doc::Null);

        let integer = json!({ "type": "integer" });
        assert_eq!(run(integer.clone(), Some(&json!("10 apples")))?.doc, Doc::Integer(10));
        assert_eq!(run(integer.clone(), Some(&json!("1e3")))?.doc, Doc::Integer(1));
        assert_eq!(run(integer.clone(), Some(&json!("-42px")))?.doc, Doc::Integer(-42));
        assert_eq!(run(integer.clone(), Some(&json!(".5")))?.doc, Doc::Null);
        assert_eq!(run(integer, Some(&json!("abc")))?.doc, Doc::Null);

        let bounded = json!({ "type": "integer", "maximum": 5 });
        let outcome = run(bounded, Some(&json!("10 apples")))?;
        assert_eq!(outcome.errors.codes(), &[Code::Maximum]);

        Ok(())
    }

    #[test]
    fn uncastable_number_skips_checks() -> Result<(), SchemaError> {
        let definition = json!({ "type": "integer", "minimum": 10, "required": true });
        let outcome = run(definition, Some(&json!("ten")))?;
        assert_eq!(outcome.doc, Doc::Null);
        assert!(outcome.errors.is_empty());

        Ok(())
    }

    #[test]
    fn casting_is_a_fixed_point() -> Result<(), SchemaError> {
        for (definition, value) in vec![
            (json!({ "type": "number" }), json!(35.5)),
            (json!({ "type": "integer" }), json!(35)),
            (json!({ "type": "string" }), json!("text")),
            (json!({ "type": "string", "format": "date" }), json!("2012-07-09")),
            (
                json!({ "type": "string", "format": "date-time" }),
                json!("2012-07-09T12:09:18Z"),
            ),
            (json!({}), json!({ "a": [1, "b"] })),
        ] {
            let once = run(definition.clone(), Some(&value))?.doc;
            let recast = serde_json::to_value(&once).unwrap();
            assert_eq!(recast, value);
            assert_eq!(run(definition, Some(&recast))?.doc, once);
        }

        Ok(())
    }

    #[test]
    fn string_checks() {
        let definition = json!({
            "type": "string",
            "minLength": 3,
            "maxLength": 4,
            "pattern": "[a-z]+",
            "enum": ["abc", "abcd", "Ab"],
        });

        assert_eq!(codes(definition.clone(), json!("abc")), Vec::<Code>::new());
        assert_eq!(
            codes(definition.clone(), json!("Ab")),
            vec![Code::MinLength, Code::Pattern]
        );
        assert_eq!(
            codes(definition.clone(), json!("abcde")),
            vec![Code::MaxLength, Code::Enum]
        );
        assert_eq!(
            codes(definition, json!("ab c")),
            vec![Code::Pattern, Code::Enum]
        );
    }

    #[test]
    fn strings_are_stringified() -> Result<(), SchemaError> {
        let definition = json!({ "type": "string", "enum": ["1", "2"] });
        let outcome = run(definition, Some(&json!(2)))?;
        assert_eq!(outcome.doc, Doc::String("2".to_owned()));
        assert!(outcome.errors.is_empty());

        Ok(())
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let definition = json!({ "type": "string", "pattern": "(" });
        assert_eq!(
            run(definition, Some(&json!("x"))).err().map(|err| err.to_string()),
            Some("invalid pattern: (".to_owned())
        );
    }

    #[test]
    fn dates() -> Result<(), SchemaError> {
        let date = json!({ "type": "string", "format": "date" });
        let outcome = run(date.clone(), Some(&json!("2012-07-09")))?;
        assert_eq!(outcome.doc.year(), Some(2012));
        assert!(outcome.errors.is_empty());

        let outcome = run(date, Some(&json!("09/09/2012")))?;
        assert_eq!(outcome.doc.year(), Some(2012));
        assert_eq!(outcome.errors.codes(), &[Code::Format]);

        let datetime = json!({ "type": "string", "format": "date-time" });
        let outcome = run(datetime.clone(), Some(&json!("2012-07-09T12:09:18Z")))?;
        assert_eq!(outcome.doc.year(), Some(2012));
        assert!(outcome.errors.is_empty());

        let outcome = run(datetime, Some(&json!("2012-07-09T12:09:18+02:00")))?;
        assert_eq!(outcome.doc.year(), Some(2012));
        assert_eq!(outcome.errors.codes(), &[Code::Format]);

        Ok(())
    }

    #[test]
    fn unparseable_date_stays_a_string() -> Result<(), SchemaError> {
        let outcome = run(
            json!({ "type": "string", "format": "date" }),
            Some(&json!("someday")),
        )?;
        assert_eq!(outcome.doc, Doc::String("someday".to_owned()));
        assert_eq!(outcome.errors.codes(), &[Code::Format]);

        Ok(())
    }

    #[test]
    fn unknown_formats_pass() {
        assert_eq!(
            codes(json!({ "type": "string", "format": "email" }), json!("x")),
            Vec::<Code>::new()
        );
    }

    #[test]
    fn non_numeric_bounds_are_not_enforced() {
        assert_eq!(
            codes(json!({ "type": "number", "minimum": "ten" }), json!(1)),
            Vec::<Code>::new()
        );
    }

    #[test]
    fn shapes() {
        assert!(has_shape(&DATE_SHAPE, "2012-07-09"));
        assert!(!has_shape(&DATE_SHAPE, "2012-7-09"));
        assert!(!has_shape(&DATE_SHAPE, "2012-07-09 "));
        assert!(!has_shape(&DATE_SHAPE, "2012-07-09\n"));
        assert!(has_shape(&DATE_TIME_SHAPE, "2012-07-09T12:09:18Z"));
        assert!(!has_shape(&DATE_TIME_SHAPE, "2012-07-09T12:09:18"));
    }
}
