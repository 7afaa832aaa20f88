//! Type-reference discovery over schema-less data.
//!
//! Any object exposing a string `ref` (or `$ref`) field is a type reference.
//! References are normalized by stripping array suffixes and expanding
//! generic arguments, so `List<Foo, Bar[]>[]` yields `List`, `Foo`, `Bar`.
//! Discovery walks the value depth-first and reports every accepted name once,
//! in first-encounter order.

use std::collections::HashSet;

use serde_json::Value as JsonValue;

/// Framework-provided reference names that never map to a generated type
pub const RESERVED_REFERENCES: [&str; 3] = ["Instance", "InstanceProvider", "Pageable"];

/// Names the type table treats as built in (compared case-insensitively)
pub const BUILT_IN_TYPES: [&str; 20] = [
    "any", "map", "set", "string", "number", "integer", "int", "long", "float", "double",
    "decimal", "boolean", "bool", "date", "datetime", "void", "object", "byte", "char", "short",
];

pub fn is_built_in_type(name: &str) -> bool {
    BUILT_IN_TYPES
        .iter()
        .any(|built_in| built_in.eq_ignore_ascii_case(name))
}

pub fn is_reserved_reference(name: &str) -> bool {
    RESERVED_REFERENCES.contains(&name)
}

/// The `ref` / `$ref` string of a node, if it is a reference
pub fn reference_of(node: &JsonValue) -> Option<&str> {
    let map = node.as_object()?;
    map.get("ref")
        .and_then(JsonValue::as_str)
        .or_else(|| map.get("$ref").and_then(JsonValue::as_str))
}

/// Normalize a raw reference into its bare type name followed by every generic
/// argument name, left to right.
pub fn normalize_type(raw: &str) -> Vec<String> {
    let mut names = Vec::new();
    collect_names(raw, &mut names);
    names
}

fn collect_names(raw: &str, names: &mut Vec<String>) {
    let mut name = raw.trim();
    while let Some(stripped) = name.strip_suffix("[]") {
        name = stripped.trim_end();
    }

    if name.is_empty() {
        return;
    }

    let Some(open) = name.find('<') else {
        names.push(name.to_string());
        return;
    };

    let outer = name[..open].trim();
    if !outer.is_empty() {
        names.push(outer.to_string());
    }

    let inner = &name[open + 1..];
    let inner = inner.strip_suffix('>').unwrap_or(inner);
    for argument in split_arguments(inner) {
        collect_names(argument, names);
    }
}

/// Split generic arguments on top-level commas only
fn split_arguments(inner: &str) -> Vec<&str> {
    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                arguments.push(&inner[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    arguments.push(&inner[start..]);
    arguments
}

/// Lower-cased names of every entity classified as a DTO in a document context
#[derive(Debug, Clone, Default)]
pub struct DtoCatalog {
    names: HashSet<String>,
}

impl DtoCatalog {
    /// Read `spec.entities.types` from the document context
    pub fn from_context(context: &JsonValue) -> Self {
        let names = context
            .pointer("/spec/entities/types")
            .and_then(JsonValue::as_array)
            .into_iter()
            .flatten()
            .filter(|entity| entity.get("type").and_then(JsonValue::as_str) == Some("dto"))
            .filter_map(|entity| entity.get("name").and_then(JsonValue::as_str))
            .filter(|name| !name.is_empty())
            .map(str::to_lowercase)
            .collect();
        Self { names }
    }

    pub fn is_dto(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Filtering rules applied to normalized candidate names
#[derive(Clone, Copy)]
pub struct TypeReferenceResolver<'a> {
    catalog: &'a DtoCatalog,
    include_all: bool,
    built_in: &'a (dyn Fn(&str) -> bool + Sync),
}

impl<'a> TypeReferenceResolver<'a> {
    /// Resolver using the default built-in type table
    pub fn new(catalog: &'a DtoCatalog, include_all: bool) -> Self {
        Self {
            catalog,
            include_all,
            built_in: &is_built_in_type,
        }
    }

    /// Replace the built-in type table, usually with the target language's
    pub fn with_built_ins(mut self, built_in: &'a (dyn Fn(&str) -> bool + Sync)) -> Self {
        self.built_in = built_in;
        self
    }

    fn accepts(&self, name: &str) -> bool {
        if (self.built_in)(name) || is_reserved_reference(name) {
            return false;
        }
        self.include_all || self.catalog.is_dto(name)
    }

    /// Discover every accepted name reachable from `node`
    pub fn resolve(&self, node: &JsonValue) -> Vec<String> {
        let mut discovery = Discovery::new(*self, |_: &str| Ok::<(), std::convert::Infallible>(()));
        match discovery.visit(node) {
            Ok(()) => discovery.found,
            Err(never) => match never {},
        }
    }

    /// Discover every accepted name reachable from `node`, invoking `on_match`
    /// exactly once per newly discovered name. The first error aborts the walk.
    pub fn resolve_with<F, E>(&self, node: &JsonValue, on_match: F) -> Result<Vec<String>, E>
    where
        F: FnMut(&str) -> Result<(), E>,
    {
        let mut discovery = Discovery::new(*self, on_match);
        discovery.visit(node)?;
        Ok(discovery.found)
    }
}

/// Depth-first visitor; `found` is the ordered, duplicate-free accumulator
struct Discovery<'a, F> {
    resolver: TypeReferenceResolver<'a>,
    found: Vec<String>,
    on_match: F,
}

impl<'a, F, E> Discovery<'a, F>
where
    F: FnMut(&str) -> Result<(), E>,
{
    fn new(resolver: TypeReferenceResolver<'a>, on_match: F) -> Self {
        Self {
            resolver,
            found: Vec::new(),
            on_match,
        }
    }

    fn visit(&mut self, node: &JsonValue) -> Result<(), E> {
        match node {
            JsonValue::Array(items) => {
                for item in items {
                    self.visit(item)?;
                }
                Ok(())
            }
            JsonValue::Object(map) => match reference_of(node) {
                Some(reference) => {
                    for name in normalize_type(reference) {
                        self.offer(name)?;
                    }
                    Ok(())
                }
                None => {
                    for value in map.values() {
                        self.visit(value)?;
                    }
                    Ok(())
                }
            },
            _ => Ok(()),
        }
    }

    fn offer(&mut self, name: String) -> Result<(), E> {
        if !self.resolver.accepts(&name) || self.found.contains(&name) {
            return Ok(());
        }
        (self.on_match)(&name)?;
        self.found.push(name);
        Ok(())
    }
}

/// True when any reference reachable from `node` normalizes to `type_name`.
/// Stops at the first hit; no filtering is applied.
pub fn has_type_reference(node: &JsonValue, type_name: &str) -> bool {
    match node {
        JsonValue::Array(items) => items.iter().any(|item| has_type_reference(item, type_name)),
        JsonValue::Object(map) => match reference_of(node) {
            Some(reference) => normalize_type(reference)
                .iter()
                .any(|name| name == type_name),
            None => map.values().any(|value| has_type_reference(value, type_name)),
        },
        _ => false,
    }
}
