//! Record kinds of the claim graph.
//!
//! Every stored object carries a `format` tag and exactly the fields listed
//! for that format. [`Record::from_value`] is the only way to build a record
//! from fetched JSON; extra fields, missing fields and ill-typed fields are
//! rejected.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RecordError;
use crate::link::{as_link, Link};

/// Kinds that may be wrapped by an `annotated-*` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Annotatable {
    Context,
    Formula,
    Sequent,
    Production,
}

impl Annotatable {
    /// Name of the wrapped kind, also the name of the wrapper's link field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Formula => "formula",
            Self::Sequent => "sequent",
            Self::Production => "production",
        }
    }

    pub fn all() -> [Self; 4] {
        [Self::Context, Self::Formula, Self::Sequent, Self::Production]
    }

    /// Whether a decoded record is of this kind.
    pub fn matches(&self, record: &Record) -> bool {
        matches!(
            (self, record),
            (Self::Context, Record::Context(_))
                | (Self::Formula, Record::Formula(_))
                | (Self::Sequent, Record::Sequent(_))
                | (Self::Production, Record::Production(_))
        )
    }
}

/// The `format` tag of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Context,
    Formula,
    Sequent,
    Production,
    Assertion,
    Collection,
    Tool,
    Language,
    Annotated(Annotatable),
}

impl Format {
    pub fn parse(tag: &str) -> Option<Self> {
        let format = match tag {
            "context" => Self::Context,
            "formula" => Self::Formula,
            "sequent" => Self::Sequent,
            "production" => Self::Production,
            "assertion" => Self::Assertion,
            "collection" => Self::Collection,
            "tool" => Self::Tool,
            "language" => Self::Language,
            "annotated-context" => Self::Annotated(Annotatable::Context),
            "annotated-formula" => Self::Annotated(Annotatable::Formula),
            "annotated-sequent" => Self::Annotated(Annotatable::Sequent),
            "annotated-production" => Self::Annotated(Annotatable::Production),
            _ => return None,
        };
        Some(format)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Formula => "formula",
            Self::Sequent => "sequent",
            Self::Production => "production",
            Self::Assertion => "assertion",
            Self::Collection => "collection",
            Self::Tool => "tool",
            Self::Language => "language",
            Self::Annotated(Annotatable::Context) => "annotated-context",
            Self::Annotated(Annotatable::Formula) => "annotated-formula",
            Self::Annotated(Annotatable::Sequent) => "annotated-sequent",
            Self::Annotated(Annotatable::Production) => "annotated-production",
        }
    }

    /// Fields required besides `format`.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::Context => &["language", "content"],
            Self::Formula => &["language", "content", "context"],
            Self::Sequent => &["dependencies", "conclusion"],
            Self::Production => &["sequent", "mode"],
            Self::Assertion => &["agent", "claim", "signature"],
            Self::Collection => &["name", "elements"],
            Self::Tool | Self::Language => &["content"],
            Self::Annotated(Annotatable::Context) => &["context", "annotation"],
            Self::Annotated(Annotatable::Formula) => &["formula", "annotation"],
            Self::Annotated(Annotatable::Sequent) => &["sequent", "annotation"],
            Self::Annotated(Annotatable::Production) => &["production", "annotation"],
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub language: Link,
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub language: Link,
    pub content: Value,
    pub context: Vec<Link>,
}

/// `dependencies ⊢ conclusion`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequent {
    pub dependencies: Vec<Link>,
    pub conclusion: Link,
}

/// How a production claims its sequent was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ProductionMode {
    /// `null` mode
    Unspecified,
    Axiom,
    Conjecture,
    /// Derived by the linked tool
    Tool(Link),
}

impl TryFrom<Value> for ProductionMode {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if let Some(cid) = as_link(&value) {
            return Ok(Self::Tool(Link::new(cid)));
        }
        match value {
            Value::Null => Ok(Self::Unspecified),
            Value::String(s) if s == "axiom" => Ok(Self::Axiom),
            Value::String(s) if s == "conjecture" => Ok(Self::Conjecture),
            other => Err(format!("unsupported production mode: {}", other)),
        }
    }
}

impl From<ProductionMode> for Value {
    fn from(mode: ProductionMode) -> Self {
        match mode {
            ProductionMode::Unspecified => Value::Null,
            ProductionMode::Axiom => Value::String("axiom".into()),
            ProductionMode::Conjecture => Value::String("conjecture".into()),
            ProductionMode::Tool(link) => {
                let mut obj = Map::new();
                obj.insert(crate::link::LINK_KEY.into(), Value::String(link.cid));
                Value::Object(obj)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub sequent: Link,
    pub mode: ProductionMode,
}

/// An agent's signature over the CID of a production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Public key, SPKI PEM
    pub agent: String,
    pub claim: Link,
    /// Hex-encoded signature
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub elements: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub content: Value,
}

/// Commentary attached to another record.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotated {
    pub kind: Annotatable,
    pub target: Link,
    pub annotation: Value,
}

/// Any record of the claim graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Context(Context),
    Formula(Formula),
    Sequent(Sequent),
    Production(Production),
    Assertion(Assertion),
    Collection(Collection),
    Tool(Tool),
    Language(Language),
    Annotated(Annotated),
}

impl Record {
    /// Decode a fetched object, enforcing its exact shape.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let obj = value.as_object().ok_or(RecordError::NotAnObject)?;
        let tag = obj
            .get("format")
            .and_then(Value::as_str)
            .ok_or(RecordError::MissingFormat)?;
        let format = Format::parse(tag).ok_or_else(|| RecordError::UnknownFormat(tag.to_string()))?;

        check_fields(format, obj)?;

        let record = match format {
            Format::Context => Self::Context(decode(format, value)?),
            Format::Formula => Self::Formula(decode(format, value)?),
            Format::Sequent => Self::Sequent(decode(format, value)?),
            Format::Production => Self::Production(decode(format, value)?),
            Format::Assertion => Self::Assertion(decode(format, value)?),
            Format::Collection => Self::Collection(decode(format, value)?),
            Format::Tool => Self::Tool(decode(format, value)?),
            Format::Language => Self::Language(decode(format, value)?),
            Format::Annotated(kind) => {
                let target = as_link(&obj[kind.as_str()]).ok_or_else(|| RecordError::Shape {
                    format: format.to_string(),
                    reason: format!("`{}` is not a link", kind.as_str()),
                })?;
                Self::Annotated(Annotated {
                    kind,
                    target: Link::new(target),
                    annotation: obj["annotation"].clone(),
                })
            }
        };
        Ok(record)
    }

    pub fn format(&self) -> Format {
        match self {
            Self::Context(_) => Format::Context,
            Self::Formula(_) => Format::Formula,
            Self::Sequent(_) => Format::Sequent,
            Self::Production(_) => Format::Production,
            Self::Assertion(_) => Format::Assertion,
            Self::Collection(_) => Format::Collection,
            Self::Tool(_) => Format::Tool,
            Self::Language(_) => Format::Language,
            Self::Annotated(a) => Format::Annotated(a.kind),
        }
    }

    /// Encode back to the stored JSON shape, `format` tag included.
    pub fn to_value(&self) -> Value {
        let body = match self {
            Self::Context(r) => serde_json::to_value(r),
            Self::Formula(r) => serde_json::to_value(r),
            Self::Sequent(r) => serde_json::to_value(r),
            Self::Production(r) => serde_json::to_value(r),
            Self::Assertion(r) => serde_json::to_value(r),
            Self::Collection(r) => serde_json::to_value(r),
            Self::Tool(r) => serde_json::to_value(r),
            Self::Language(r) => serde_json::to_value(r),
            Self::Annotated(a) => {
                serde_json::to_value(&a.target).map(|target| {
                    let mut obj = Map::new();
                    obj.insert(a.kind.as_str().into(), target);
                    obj.insert("annotation".into(), a.annotation.clone());
                    Value::Object(obj)
                })
            }
        };

        // Plain structs of links, strings and values always serialize.
        let mut obj = match body {
            Ok(Value::Object(obj)) => obj,
            _ => Map::new(),
        };
        obj.insert("format".into(), Value::String(self.format().as_str().into()));
        Value::Object(obj)
    }
}

fn check_fields(format: Format, obj: &Map<String, Value>) -> Result<(), RecordError> {
    let expected = format.fields();
    if obj.len() != expected.len() + 1 {
        return Err(RecordError::Shape {
            format: format.to_string(),
            reason: format!("expected {} fields, found {}", expected.len() + 1, obj.len()),
        });
    }
    if let Some(missing) = expected.iter().find(|field| !obj.contains_key(**field)) {
        return Err(RecordError::Shape {
            format: format.to_string(),
            reason: format!("missing field `{}`", missing),
        });
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(format: Format, value: &Value) -> Result<T, RecordError> {
    let mut fields = value.clone();
    if let Value::Object(obj) = &mut fields {
        obj.remove("format");
    }
    serde_json::from_value(fields).map_err(|source| RecordError::Field {
        format: format.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_sequent() {
        let value = json!({
            "format": "sequent",
            "dependencies": [{"/": "f1"}, {"/": "f2"}],
            "conclusion": {"/": "f3"}
        });

        match Record::from_value(&value).unwrap() {
            Record::Sequent(sequent) => {
                assert_eq!(sequent.dependencies, vec![Link::new("f1"), Link::new("f2")]);
                assert_eq!(sequent.conclusion.cid(), "f3");
            }
            other => panic!("expected sequent, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_field_rejected() {
        let value = json!({
            "format": "tool",
            "content": "prover",
            "version": "1.0"
        });

        assert!(matches!(
            Record::from_value(&value),
            Err(RecordError::Shape { .. })
        ));
    }

    #[test]
    fn test_missing_field_rejected() {
        let value = json!({
            "format": "formula",
            "language": {"/": "lang"},
            "content": "A -> A",
            "ctx": []
        });

        assert!(matches!(
            Record::from_value(&value),
            Err(RecordError::Shape { .. })
        ));
    }

    #[test]
    fn test_unknown_format() {
        let err = Record::from_value(&json!({"format": "theorem", "content": 1})).unwrap_err();
        assert!(matches!(err, RecordError::UnknownFormat(ref tag) if tag == "theorem"));
        assert!(err.to_string().contains("theorem"));
    }

    #[test]
    fn test_production_modes() {
        for (mode, expected) in [
            (json!(null), ProductionMode::Unspecified),
            (json!("axiom"), ProductionMode::Axiom),
            (json!("conjecture"), ProductionMode::Conjecture),
            (json!({"/": "tool-cid"}), ProductionMode::Tool(Link::new("tool-cid"))),
        ] {
            let value = json!({"format": "production", "sequent": {"/": "s"}, "mode": mode});
            match Record::from_value(&value).unwrap() {
                Record::Production(p) => assert_eq!(p.mode, expected),
                other => panic!("expected production, got {:?}", other),
            }
        }

        let bad = json!({"format": "production", "sequent": {"/": "s"}, "mode": "lemma"});
        assert!(matches!(
            Record::from_value(&bad),
            Err(RecordError::Field { .. })
        ));
    }

    #[test]
    fn test_annotated_requires_link() {
        let good = json!({
            "format": "annotated-production",
            "production": {"/": "p"},
            "annotation": "checked by hand"
        });
        let bad = json!({
            "format": "annotated-production",
            "production": "p",
            "annotation": "checked by hand"
        });

        match Record::from_value(&good).unwrap() {
            Record::Annotated(a) => {
                assert_eq!(a.kind, Annotatable::Production);
                assert_eq!(a.target.cid(), "p");
            }
            other => panic!("expected annotated record, got {:?}", other),
        }
        assert!(Record::from_value(&bad).is_err());
    }

    #[test]
    fn test_to_value_preserves_shape() {
        let value = json!({
            "format": "annotated-sequent",
            "sequent": {"/": "s"},
            "annotation": {"note": "from the library"}
        });

        let record = Record::from_value(&value).unwrap();
        assert_eq!(record.to_value(), value);

        let production = json!({"format": "production", "sequent": {"/": "s"}, "mode": {"/": "t"}});
        assert_eq!(Record::from_value(&production).unwrap().to_value(), production);
    }
}
