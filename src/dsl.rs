//! Bridge to the external DSL parser.
//!
//! Templates may carry free-form source blocks (data types, methods, config)
//! that are parsed by an external collaborator into entity objects. This
//! module defines the seam: the [`DslParser`] trait, the options passed to it
//! and the shape of its output. Entities are plain JSON objects with a `type`
//! discriminator (see [`entity_type`]).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::type_refs;

/// Entity discriminators produced by the parser
pub mod entity_type {
    pub const METHOD: &str = "method";
    pub const CONTROLLER: &str = "controller";
    pub const DATATYPE: &str = "datatype";
    pub const ENUM: &str = "enum";
    pub const COMMENT: &str = "comment";
}

/// Errors raised while parsing embedded source blocks
#[derive(Debug, Error)]
pub enum DslError {
    #[error("Failed to parse source code: {0}")]
    Parse(String),

    #[error("No DSL parser configured; cannot parse source block")]
    NoParser,

    #[error("Failed to read entity: {0}")]
    Reader(String),
}

/// Which grammar the parser should apply to a source block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DslConfiguration {
    /// Data types and enums
    DataTypes,
    /// Methods, optionally REST-annotated
    Methods,
    /// Configuration types with field annotations
    Config,
}

/// Options for a single parse call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DslParseOptions {
    pub configuration: DslConfiguration,
    /// Accept REST annotations on methods
    pub rest: bool,
    /// Type names the parser should accept as known
    pub valid_types: Vec<String>,
    /// Skip semantic validation; sources reaching templates are assumed valid
    pub ignore_semantics: bool,
}

impl DslParseOptions {
    pub fn new(configuration: DslConfiguration) -> Self {
        Self {
            configuration,
            rest: false,
            valid_types: Vec::new(),
            ignore_semantics: true,
        }
    }

    pub fn with_rest(mut self, rest: bool) -> Self {
        self.rest = rest;
        self
    }
}

/// Parser output: entities, or the errors that prevented them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DslParseResult {
    #[serde(default)]
    pub entities: Option<Vec<JsonValue>>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Reader views exposed to templates for parsed entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityReader {
    RestMethod,
    RestController,
    DataType,
    Enum,
}

/// External DSL parser collaborator
pub trait DslParser: Send + Sync {
    fn parse(&self, source: &str, options: &DslParseOptions) -> Result<DslParseResult, DslError>;

    /// Project an entity through a reader view. Defaults to the entity itself.
    fn read(&self, _reader: EntityReader, entity: &JsonValue) -> Result<JsonValue, DslError> {
        Ok(entity.clone())
    }

    /// Whether a data type maps to a native type of the target language
    fn is_native(&self, _entity: &JsonValue) -> bool {
        false
    }

    /// Whether the target language treats `type_name` as built in.
    /// Built-in names are never reported as type references.
    fn is_built_in_type(&self, type_name: &str) -> bool {
        type_refs::is_built_in_type(type_name)
    }

    /// Whether a data-type entity refers to `type_name` anywhere in its fields
    fn type_has_reference(&self, entity: &JsonValue, type_name: &str) -> bool {
        type_refs::has_type_reference(entity, type_name)
    }
}

/// Parser used when a target configures none: every source block is an error
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableDslParser;

impl DslParser for UnavailableDslParser {
    fn parse(&self, _source: &str, _options: &DslParseOptions) -> Result<DslParseResult, DslError> {
        Err(DslError::NoParser)
    }
}

pub fn entity_type_of(entity: &JsonValue) -> Option<&str> {
    entity.get("type").and_then(JsonValue::as_str)
}

/// Parse a data-type source block and keep only data types and enums
pub fn parse_entities(parser: &dyn DslParser, source: &str) -> Result<Vec<JsonValue>, DslError> {
    let result = parser.parse(source, &DslParseOptions::new(DslConfiguration::DataTypes))?;
    Ok(result
        .entities
        .unwrap_or_default()
        .into_iter()
        .filter(|entity| {
            matches!(
                entity_type_of(entity),
                Some(entity_type::DATATYPE) | Some(entity_type::ENUM)
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedParser(Vec<JsonValue>);

    impl DslParser for FixedParser {
        fn parse(&self, _source: &str, _options: &DslParseOptions) -> Result<DslParseResult, DslError> {
            Ok(DslParseResult {
                entities: Some(self.0.clone()),
                errors: vec![],
            })
        }
    }

    #[test]
    fn test_parse_entities_keeps_data_types_and_enums() {
        let parser = FixedParser(vec![
            json!({"type": "datatype", "name": "User"}),
            json!({"type": "method", "name": "getUser"}),
            json!({"type": "enum", "name": "Status"}),
            json!({"type": "comment", "text": "ignored"}),
        ]);
        let entities = parse_entities(&parser, "type User {}").unwrap();
        let names: Vec<&str> = entities
            .iter()
            .filter_map(|entity| entity["name"].as_str())
            .collect();
        assert_eq!(names, vec!["User", "Status"]);
    }

    #[test]
    fn test_unavailable_parser_fails() {
        let result = parse_entities(&UnavailableDslParser, "type User {}");
        assert!(matches!(result, Err(DslError::NoParser)));
    }

    #[test]
    fn test_default_type_has_reference_walks_fields() {
        let parser = FixedParser(vec![]);
        let entity = json!({
            "type": "datatype",
            "name": "Order",
            "properties": [{"name": "owner", "type": {"ref": "User"}}]
        });
        assert!(parser.type_has_reference(&entity, "User"));
        assert!(!parser.type_has_reference(&entity, "Invoice"));
    }

    #[test]
    fn test_parse_options_defaults() {
        let options = DslParseOptions::new(DslConfiguration::Methods).with_rest(true);
        assert!(options.rest);
        assert!(options.ignore_semantics);
        assert!(options.valid_types.is_empty());
    }
}
