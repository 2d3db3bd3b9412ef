//! FHIR XML <-> JSON object model conversion.
//!
//! Follows the FHIR XML representation rules closely enough for the
//! resources that pass through the gateway (Parameters, ValueSet,
//! OperationOutcome, CapabilityStatement and arbitrary resources forwarded to
//! an external validator):
//!
//! - the root element is named after `resourceType` and carries the FHIR namespace
//! - primitives are elements with a `value` attribute
//! - element `id` and `Extension.url` are attributes
//! - repeating elements become JSON arrays
//! - resource-valued elements wrap the resource element (`<resource><ValueSet>..`)
//! - `Narrative.div` is kept verbatim as XHTML text
//!
//! XML carries neither cardinality nor primitive types, so XML -> JSON takes
//! both from the embedded R4 definitions in [`crate::schema`]. Elements the
//! definitions do not know (custom resources, unknown extensions' children)
//! become arrays only when repeated and keep their values as strings.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Number, Value};

use crate::error::{CoreError, Result};
use crate::schema::{self, ElementDef, ElementScope, JsonKind, SchemaSet};

pub const FHIR_NAMESPACE: &str = "http://hl7.org/fhir";

#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    xhtml: Option<String>,
}

impl Node {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn is_resource_container(&self) -> bool {
        self.attr("value").is_none()
            && self.children.len() == 1
            && self.children[0]
                .name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_uppercase())
    }
}

// ===== XML -> JSON =====

/// Parses a FHIR XML resource into the JSON object model.
pub fn from_xml(input: &str) -> Result<Value> {
    let root = parse_tree(input)?;
    Ok(Value::Object(resource_to_json(&schema::r4(), &root)))
}

fn parse_tree(input: &str) -> Result<Node> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<Node> = Vec::new();

    loop {
        match reader.read_event().map_err(CoreError::xml)? {
            Event::Start(e) => {
                let name = local_name(&e);
                if name == "div" {
                    let raw_start = String::from_utf8_lossy(&e).into_owned();
                    let inner = reader.read_text(e.name()).map_err(CoreError::xml)?;
                    let node = Node {
                        name,
                        xhtml: Some(format!("<{raw_start}>{inner}</div>")),
                        ..Node::default()
                    };
                    attach(&mut stack, node)?;
                } else {
                    stack.push(Node {
                        name,
                        attrs: attributes(&e)?,
                        ..Node::default()
                    });
                }
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                let node = if name == "div" {
                    let raw = String::from_utf8_lossy(&e).into_owned();
                    Node {
                        name,
                        xhtml: Some(format!("<{raw}/>")),
                        ..Node::default()
                    }
                } else {
                    Node {
                        name,
                        attrs: attributes(&e)?,
                        ..Node::default()
                    }
                };
                if stack.is_empty() {
                    return Ok(node);
                }
                attach(&mut stack, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| CoreError::xml("unbalanced end tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Event::Eof => return Err(CoreError::xml("unexpected end of document")),
            _ => {}
        }
    }
}

fn attach(stack: &mut [Node], node: Node) -> Result<()> {
    stack
        .last_mut()
        .map(|parent| parent.children.push(node))
        .ok_or_else(|| CoreError::xml("document root must be a FHIR resource"))
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(CoreError::xml)?;
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(CoreError::xml)?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}

fn resource_to_json(schemas: &SchemaSet, node: &Node) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("resourceType".into(), Value::String(node.name.clone()));
    append_children(schemas, schemas.resource_scope(&node.name), node, &mut map);
    map
}

fn append_children(
    schemas: &SchemaSet,
    scope: ElementScope,
    node: &Node,
    map: &mut Map<String, Value>,
) {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Node>> = HashMap::new();
    for child in &node.children {
        let entry = groups.entry(child.name.as_str()).or_default();
        if entry.is_empty() {
            order.push(child.name.as_str());
        }
        entry.push(child);
    }

    for name in order {
        let nodes = &groups[name];
        let def = schemas.element(scope, name);
        let as_array = nodes.len() > 1 || def.is_some_and(|d| d.array);
        let values: Vec<Value> = nodes
            .iter()
            .map(|n| node_value(schemas, def, n))
            .collect();
        let extras: Vec<Option<Value>> = nodes
            .iter()
            .map(|n| primitive_extras(schemas, def, n))
            .collect();
        let has_extras = extras.iter().any(Option::is_some);

        if as_array {
            map.insert(name.to_string(), Value::Array(values));
            if has_extras {
                map.insert(
                    format!("_{name}"),
                    Value::Array(
                        extras
                            .into_iter()
                            .map(|e| e.unwrap_or(Value::Null))
                            .collect(),
                    ),
                );
            }
        } else {
            let mut values = values;
            map.insert(name.to_string(), values.remove(0));
            if let Some(Some(extra)) = extras.into_iter().next() {
                map.insert(format!("_{name}"), extra);
            }
        }
    }
}

fn node_value(schemas: &SchemaSet, def: Option<ElementDef>, node: &Node) -> Value {
    if let Some(ref xhtml) = node.xhtml {
        return Value::String(xhtml.clone());
    }
    if let Some(value) = node.attr("value") {
        let kind = def.map_or(JsonKind::Text, |d| d.json_kind());
        return typed_primitive(kind, value);
    }
    if node.is_resource_container() {
        return Value::Object(resource_to_json(schemas, &node.children[0]));
    }
    if is_bare_primitive_extension(def, node) {
        // primitive with extensions but no value
        return Value::Null;
    }

    let mut map = Map::new();
    if let Some(id) = node.attr("id") {
        map.insert("id".into(), Value::String(id.to_string()));
    }
    if let Some(url) = node.attr("url") {
        map.insert("url".into(), Value::String(url.to_string()));
    }
    let scope = def.map_or_else(ElementScope::unknown, |d| d.scope);
    append_children(schemas, scope, node, &mut map);
    Value::Object(map)
}

fn is_bare_primitive_extension(def: Option<ElementDef>, node: &Node) -> bool {
    let primitive = match def {
        Some(def) => def.is_primitive(),
        // undefined element: only `value[x]` can be told apart by name
        None => node.name.starts_with("value"),
    };
    primitive
        && node.attr("value").is_none()
        && node.attr("url").is_none()
        && !node.children.is_empty()
        && node.children.iter().all(|c| c.name == "extension")
}

/// `_element` companion for primitives that carry an id or extensions.
fn primitive_extras(schemas: &SchemaSet, def: Option<ElementDef>, node: &Node) -> Option<Value> {
    let is_primitive = node.attr("value").is_some() || is_bare_primitive_extension(def, node);
    if !is_primitive {
        return None;
    }
    let id = node.attr("id");
    if id.is_none() && node.children.is_empty() {
        return None;
    }
    let mut map = Map::new();
    if let Some(id) = id {
        map.insert("id".into(), Value::String(id.to_string()));
    }
    let scope = def
        .filter(ElementDef::is_primitive)
        .map_or_else(|| ElementScope::of_type("Element"), |d| d.scope);
    append_children(schemas, scope, node, &mut map);
    Some(Value::Object(map))
}

fn typed_primitive(kind: JsonKind, value: &str) -> Value {
    match kind {
        JsonKind::Boolean => match value {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        },
        JsonKind::Number => {
            if let Ok(i) = value.parse::<i64>() {
                return Value::Number(Number::from(i));
            }
            if let Some(n) = value.parse::<f64>().ok().and_then(Number::from_f64) {
                return Value::Number(n);
            }
        }
        JsonKind::Text => {}
    }
    Value::String(value.to_string())
}

// ===== JSON -> XML =====

/// Serializes a resource in the JSON object model as FHIR XML.
pub fn to_xml(resource: &Value) -> Result<Vec<u8>> {
    let obj = resource
        .as_object()
        .ok_or_else(|| CoreError::invalid_document("resource must be a JSON object"))?;
    let mut writer = Writer::new(Vec::new());
    write_resource(&mut writer, obj)?;
    Ok(writer.into_inner())
}

fn write_resource(writer: &mut Writer<Vec<u8>>, obj: &Map<String, Value>) -> Result<()> {
    let resource_type = obj
        .get("resourceType")
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::invalid_document("resource is missing resourceType"))?;

    let mut start = BytesStart::new(resource_type);
    start.push_attribute(("xmlns", FHIR_NAMESPACE));
    writer
        .write_event(Event::Start(start))
        .map_err(CoreError::xml)?;
    write_properties(writer, obj, &["resourceType"])?;
    writer
        .write_event(Event::End(BytesEnd::new(resource_type)))
        .map_err(CoreError::xml)?;
    Ok(())
}

fn write_properties(
    writer: &mut Writer<Vec<u8>>,
    obj: &Map<String, Value>,
    skip: &[&str],
) -> Result<()> {
    for (key, value) in obj {
        if skip.contains(&key.as_str()) {
            continue;
        }
        if let Some(base) = key.strip_prefix('_') {
            // extension-only primitive; primitives with a value pick up their `_` twin below
            if !obj.contains_key(base) {
                write_element(writer, base, &Value::Null, Some(value))?;
            }
            continue;
        }
        let extras = obj.get(&format!("_{key}"));
        match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let extra = extras.and_then(|e| e.get(i)).filter(|e| !e.is_null());
                    write_element(writer, key, item, extra)?;
                }
            }
            _ => write_element(writer, key, value, extras)?,
        }
    }
    Ok(())
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
    extras: Option<&Value>,
) -> Result<()> {
    match value {
        Value::Object(map) if map.contains_key("resourceType") => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(CoreError::xml)?;
            write_resource(writer, map)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(CoreError::xml)?;
        }
        Value::Object(map) => {
            let mut start = BytesStart::new(name);
            let mut skip = Vec::new();
            if let Some(Value::String(id)) = map.get("id") {
                start.push_attribute(("id", id.as_str()));
                skip.push("id");
            }
            if is_extension(name)
                && let Some(Value::String(url)) = map.get("url")
            {
                start.push_attribute(("url", url.as_str()));
                skip.push("url");
            }
            writer
                .write_event(Event::Start(start))
                .map_err(CoreError::xml)?;
            write_properties(writer, map, &skip)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(CoreError::xml)?;
        }
        Value::String(xhtml) if name == "div" => {
            writer
                .write_event(Event::Text(BytesText::from_escaped(xhtml.as_str())))
                .map_err(CoreError::xml)?;
        }
        Value::Array(_) => {
            return Err(CoreError::invalid_document(format!(
                "nested array in element '{name}'"
            )));
        }
        _ => {
            let text = match value {
                Value::String(s) => Some(s.clone()),
                Value::Bool(b) => Some(b.to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            };
            let mut start = BytesStart::new(name);
            if let Some(ref text) = text {
                start.push_attribute(("value", text.as_str()));
            }
            match extras.and_then(Value::as_object) {
                Some(extra) => {
                    if let Some(Value::String(id)) = extra.get("id") {
                        start.push_attribute(("id", id.as_str()));
                    }
                    writer
                        .write_event(Event::Start(start))
                        .map_err(CoreError::xml)?;
                    write_properties(writer, extra, &["id"])?;
                    writer
                        .write_event(Event::End(BytesEnd::new(name)))
                        .map_err(CoreError::xml)?;
                }
                None if text.is_some() => {
                    writer
                        .write_event(Event::Empty(start))
                        .map_err(CoreError::xml)?;
                }
                None => {}
            }
        }
    }
    Ok(())
}

fn is_extension(name: &str) -> bool {
    name == "extension" || name == "modifierExtension"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn xml_string(value: &Value) -> String {
        String::from_utf8(to_xml(value).unwrap()).unwrap()
    }

    #[test]
    fn writes_primitives_as_value_attributes() {
        let xml = xml_string(&json!({
            "resourceType": "Parameters",
            "parameter": [{"name": "result", "valueBoolean": true}]
        }));
        assert_eq!(
            xml,
            "<Parameters xmlns=\"http://hl7.org/fhir\"><parameter><name value=\"result\"/><valueBoolean value=\"true\"/></parameter></Parameters>"
        );
    }

    #[test]
    fn escapes_attribute_values() {
        let xml = xml_string(&json!({
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "error", "code": "exception", "diagnostics": "a < b & \"c\""}]
        }));
        assert!(xml.contains("a &lt; b &amp; &quot;c&quot;"));
        let back = from_xml(&xml).unwrap();
        assert_eq!(back["issue"][0]["diagnostics"], "a < b & \"c\"");
    }

    #[test]
    fn wraps_nested_resources() {
        let doc = json!({
            "resourceType": "Parameters",
            "parameter": [{
                "name": "valueSet",
                "resource": {
                    "resourceType": "ValueSet",
                    "url": "http://example.org/vs",
                    "compose": {"include": [{"system": "http://unitsofmeasure.org"}]}
                }
            }]
        });
        let xml = xml_string(&doc);
        assert!(xml.contains("<resource><ValueSet xmlns=\"http://hl7.org/fhir\">"));
        assert_eq!(from_xml(&xml).unwrap(), doc);
    }

    #[test]
    fn single_occurrence_of_repeating_element_is_an_array() {
        let doc = from_xml(
            r#"<OperationOutcome xmlns="http://hl7.org/fhir">
                 <issue>
                   <severity value="warning"/>
                   <code value="business-rule"/>
                   <diagnostics value="first"/>
                 </issue>
               </OperationOutcome>"#,
        )
        .unwrap();
        assert_eq!(doc["issue"].as_array().unwrap().len(), 1);
        assert_eq!(doc["issue"][0]["severity"], "warning");
    }

    #[test]
    fn capability_rest_resource_is_an_array() {
        let doc = from_xml(
            r#"<CapabilityStatement xmlns="http://hl7.org/fhir">
                 <rest>
                   <mode value="server"/>
                   <resource><type value="ValueSet"/></resource>
                 </rest>
               </CapabilityStatement>"#,
        )
        .unwrap();
        assert_eq!(doc["rest"][0]["resource"][0]["type"], "ValueSet");
    }

    #[test]
    fn types_primitive_values_from_definitions() {
        let doc = from_xml(
            r#"<Parameters xmlns="http://hl7.org/fhir">
                 <parameter><name value="result"/><valueBoolean value="false"/></parameter>
                 <parameter><name value="count"/><valueInteger value="10"/></parameter>
                 <parameter><name value="code"/><valueCode value="true"/></parameter>
               </Parameters>"#,
        )
        .unwrap();
        assert_eq!(doc["parameter"][0]["valueBoolean"], json!(false));
        assert_eq!(doc["parameter"][1]["valueInteger"], json!(10));
        assert_eq!(doc["parameter"][2]["valueCode"], json!("true"));
    }

    #[test]
    fn extension_url_and_element_id_are_attributes() {
        let doc = json!({
            "resourceType": "Patient",
            "id": "p1",
            "extension": [{"url": "http://example.org/ext", "valueString": "x"}],
            "name": [{"id": "n1", "family": "Doe"}]
        });
        let xml = xml_string(&doc);
        assert!(xml.contains("<extension url=\"http://example.org/ext\">"));
        assert!(xml.contains("<name id=\"n1\">"));
        let back = from_xml(&xml).unwrap();
        assert_eq!(back["extension"][0]["url"], "http://example.org/ext");
        assert_eq!(back["name"][0]["id"], "n1");
    }

    #[test]
    fn primitive_extensions_round_trip() {
        let doc = json!({
            "resourceType": "Patient",
            "birthDate": "1970-01-01",
            "_birthDate": {
                "extension": [{"url": "http://example.org/time", "valueTime": "12:00:00"}]
            }
        });
        let xml = xml_string(&doc);
        assert!(xml.contains("<birthDate value=\"1970-01-01\"><extension url=\"http://example.org/time\">"));
        assert_eq!(from_xml(&xml).unwrap(), doc);
    }

    #[test]
    fn narrative_div_is_preserved() {
        let doc = json!({
            "resourceType": "ValueSet",
            "text": {
                "status": "generated",
                "div": "<div xmlns=\"http://www.w3.org/1999/xhtml\"><p>Units</p></div>"
            }
        });
        let xml = xml_string(&doc);
        assert!(xml.contains("<p>Units</p>"));
        let back = from_xml(&xml).unwrap();
        assert_eq!(
            back["text"]["div"],
            "<div xmlns=\"http://www.w3.org/1999/xhtml\"><p>Units</p></div>"
        );
    }

    #[test]
    fn patient_cardinality_and_choice_types_come_from_definitions() {
        let doc = from_xml(
            r#"<Patient xmlns="http://hl7.org/fhir">
                 <active value="true"/>
                 <name><family value="Doe"/><given value="Jane"/></name>
                 <birthDate value="1970-01-01"/>
                 <multipleBirthBoolean value="true"/>
               </Patient>"#,
        )
        .unwrap();
        assert_eq!(
            doc,
            json!({
                "resourceType": "Patient",
                "active": true,
                "name": [{"family": "Doe", "given": ["Jane"]}],
                "birthDate": "1970-01-01",
                "multipleBirthBoolean": true
            })
        );
    }

    #[test]
    fn observation_round_trips_through_xml() {
        let doc = json!({
            "resourceType": "Observation",
            "id": "hb",
            "status": "final",
            "category": [{"text": "vs"}],
            "code": {"coding": [{"system": "http://loinc.org", "code": "718-7"}]},
            "valueQuantity": {
                "value": 5.4,
                "unit": "g/dL",
                "system": "http://unitsofmeasure.org",
                "code": "g/dL"
            },
            "referenceRange": [{"low": {"value": 4}, "text": "normal"}],
            "component": [{"code": {"text": "count"}, "valueInteger": 3}]
        });
        let xml = xml_string(&doc);
        assert_eq!(from_xml(&xml).unwrap(), doc);
    }

    #[test]
    fn value_set_exclude_reuses_include_structure() {
        let doc = json!({
            "resourceType": "ValueSet",
            "compose": {
                "include": [{"system": "http://unitsofmeasure.org"}],
                "exclude": [{"system": "http://loinc.org", "concept": [{"code": "1-8"}]}]
            }
        });
        assert_eq!(from_xml(&xml_string(&doc)).unwrap(), doc);
    }

    #[test]
    fn unknown_resources_keep_single_elements_as_strings() {
        let doc = from_xml(
            r#"<Custom xmlns="http://hl7.org/fhir"><flag value="true"/><tag value="a"/><tag value="b"/></Custom>"#,
        )
        .unwrap();
        assert_eq!(doc["flag"], json!("true"));
        assert_eq!(doc["tag"], json!(["a", "b"]));
    }

    #[test]
    fn rejects_truncated_documents() {
        assert!(from_xml("<Parameters xmlns=\"http://hl7.org/fhir\"><parameter>").is_err());
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(to_xml(&json!(["not", "a", "resource"])).is_err());
    }
}
