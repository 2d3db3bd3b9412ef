//! Element definitions from the embedded FHIR schemas.
//!
//! XML carries no cardinality or primitive type information, so the XML
//! reader asks this module whether an element repeats and how its `value`
//! attribute maps to JSON. Lookups walk inline backbone elements first, then
//! the element's type and that type's base chain
//! (`Patient` -> `DomainResource` -> `Resource`).

use std::collections::HashMap;

use octofhir_fhirschema::{FhirSchema, FhirSchemaElement, FhirVersion, get_schemas};

type Elements = HashMap<String, FhirSchemaElement>;

/// Guards against cyclic base chains in malformed schema sets.
const MAX_BASE_DEPTH: usize = 16;

/// JSON representation of a primitive's `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Boolean,
    Number,
    Text,
}

/// Where the children of an element are defined.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementScope {
    inline: Option<&'static Elements>,
    type_name: Option<&'static str>,
}

impl ElementScope {
    /// Scope of a named type such as `Patient` or `Element`.
    pub fn of_type(type_name: &'static str) -> Self {
        Self {
            inline: None,
            type_name: Some(type_name),
        }
    }

    /// A scope with no definitions; every lookup misses.
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// What the schemas say about one element.
#[derive(Debug, Clone, Copy)]
pub struct ElementDef {
    pub array: bool,
    pub type_name: Option<&'static str>,
    pub scope: ElementScope,
}

impl ElementDef {
    /// FHIR primitive type names start in lower case.
    pub fn is_primitive(&self) -> bool {
        self.type_name
            .is_some_and(|t| t.starts_with(|c: char| c.is_ascii_lowercase()))
    }

    pub fn json_kind(&self) -> JsonKind {
        match self.type_name {
            Some("boolean") => JsonKind::Boolean,
            Some("integer" | "decimal" | "positiveInt" | "unsignedInt") => JsonKind::Number,
            _ => JsonKind::Text,
        }
    }
}

/// Embedded schema set for one FHIR release.
#[derive(Clone, Copy)]
pub struct SchemaSet {
    schemas: &'static HashMap<String, FhirSchema>,
}

impl std::fmt::Debug for SchemaSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaSet")
            .field("schemas", &self.schemas.len())
            .finish()
    }
}

/// The R4 schemas the gateway types documents with.
pub fn r4() -> SchemaSet {
    SchemaSet {
        schemas: get_schemas(FhirVersion::R4),
    }
}

impl SchemaSet {
    /// Scope of a resource root. Unknown resource types get an empty scope.
    pub fn resource_scope(&self, resource_type: &str) -> ElementScope {
        match self.schemas.get_key_value(resource_type) {
            Some((name, _)) => ElementScope::of_type(name.as_str()),
            None => ElementScope::unknown(),
        }
    }

    /// Looks up child `name` within `scope`.
    pub fn element(&self, scope: ElementScope, name: &str) -> Option<ElementDef> {
        if let Some(element) = scope.inline.and_then(|elements| elements.get(name)) {
            return Some(self.define(element));
        }
        let mut current = scope.type_name;
        for _ in 0..MAX_BASE_DEPTH {
            let schema = self.schemas.get(current?)?;
            if let Some(element) = schema.elements.as_ref().and_then(|e| e.get(name)) {
                return Some(self.define(element));
            }
            current = schema
                .base
                .as_deref()
                .and_then(|base| self.schema_name(canonical_name(base)));
        }
        None
    }

    fn define(&self, element: &'static FhirSchemaElement) -> ElementDef {
        // contentReference elements (e.g. ValueSet.compose.exclude) borrow
        // their structure from the referenced element
        let structure = match (&element.elements, &element.type_name, &element.element_reference)
        {
            (None, None, Some(path)) => self.resolve_reference(path).unwrap_or(element),
            _ => element,
        };
        ElementDef {
            array: element.array.unwrap_or(false),
            type_name: structure.type_name.as_deref(),
            scope: ElementScope {
                inline: structure.elements.as_ref(),
                type_name: structure.type_name.as_deref(),
            },
        }
    }

    /// `[<schema url or name>, "elements", a, "elements", b]` -> element `b`.
    fn resolve_reference(&self, path: &[String]) -> Option<&'static FhirSchemaElement> {
        let (head, steps) = path.split_first()?;
        let schema = self.schemas.get(canonical_name(head))?;
        let mut elements = schema.elements.as_ref()?;
        let mut found = None;
        for step in steps.iter().filter(|s| s.as_str() != "elements") {
            let element = elements.get(step.as_str())?;
            found = Some(element);
            if let Some(children) = element.elements.as_ref() {
                elements = children;
            }
        }
        found
    }

    fn schema_name(&self, name: &str) -> Option<&'static str> {
        self.schemas
            .get_key_value(name)
            .map(|(key, _)| key.as_str())
    }
}

fn canonical_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
