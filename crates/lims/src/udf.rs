//! User-defined fields: a mapping view over typed `udf:field` elements.
//!
//! Fields live in the `http://genologics.com/ri/userdefined` namespace,
//! either directly under the entity root (UDF mode) or inside the entity's
//! `udf:type` block (UDT mode — a named bundle of fields that coexists with
//! root-level UDFs on the same document).
//!
//! Values are tagged ([`UdfValue`]) rather than inferred from runtime type,
//! and a write is type-checked against the field's declared `type`
//! attribute at the point of assignment. There is deliberately no null
//! value: clearing a field is the explicit [`UdfMap::remove`].
//!
//! Every operation reads the live tree, so a structural change made through
//! one handle is immediately visible through any other.

use benchtop_xml::Element;

use crate::entity::EntityRef;
use crate::error::{Error, Result};

/// Namespace of user-defined fields and types.
pub const UDF_NS: &str = "http://genologics.com/ri/userdefined";

const UDF_PREFIX: &str = "udf";

/// A tagged UDF value. The wire carries text; the tag decides both the
/// `type` attribute written for new fields and the coercion applied when
/// reading.
#[derive(Debug, Clone, PartialEq)]
pub enum UdfValue {
    Text(String),
    Numeric(f64),
    Boolean(bool),
}

impl UdfValue {
    /// The `type` attribute written when this value creates a new field.
    pub fn type_name(&self) -> &'static str {
        match self {
            UdfValue::Text(_) => "String",
            UdfValue::Numeric(_) => "Numeric",
            UdfValue::Boolean(_) => "Boolean",
        }
    }

    /// Canonical wire text. Whole numbers drop the fraction (`21`, not
    /// `21.0`), matching what the server itself emits.
    pub fn to_text(&self) -> String {
        match self {
            UdfValue::Text(s) => s.clone(),
            UdfValue::Numeric(n) => n.to_string(),
            UdfValue::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
        }
    }

    /// Whether this value may be assigned to a field declared as
    /// `declared`. `Numeric` and `Boolean` declarations demand their own
    /// kind; every other declared type (String, Date, URI, ...) is text.
    fn assignable_to(&self, declared: &str) -> bool {
        match declared {
            "Numeric" => matches!(self, UdfValue::Numeric(_)),
            "Boolean" => matches!(self, UdfValue::Boolean(_)),
            _ => matches!(self, UdfValue::Text(_)),
        }
    }

    /// Coerces wire text according to a declared type.
    fn from_wire(declared: Option<&str>, text: String) -> Result<UdfValue> {
        match declared {
            Some("Numeric") => text
                .trim()
                .parse::<f64>()
                .map(UdfValue::Numeric)
                .map_err(|_| Error::Value {
                    field: "udf:field".to_string(),
                    text,
                    expected: "number",
                }),
            Some("Boolean") => match text.trim() {
                "true" => Ok(UdfValue::Boolean(true)),
                "false" => Ok(UdfValue::Boolean(false)),
                _ => Err(Error::Value {
                    field: "udf:field".to_string(),
                    text,
                    expected: "boolean",
                }),
            },
            _ => Ok(UdfValue::Text(text)),
        }
    }

    /// The text payload, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            UdfValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The number, if this is a numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            UdfValue::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    /// The flag, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            UdfValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for UdfValue {
    fn from(s: &str) -> Self {
        UdfValue::Text(s.to_string())
    }
}

impl From<String> for UdfValue {
    fn from(s: String) -> Self {
        UdfValue::Text(s)
    }
}

impl From<f64> for UdfValue {
    fn from(n: f64) -> Self {
        UdfValue::Numeric(n)
    }
}

impl From<i64> for UdfValue {
    fn from(n: i64) -> Self {
        UdfValue::Numeric(n as f64)
    }
}

impl From<bool> for UdfValue {
    fn from(b: bool) -> Self {
        UdfValue::Boolean(b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// `udf:field` children of the entity root.
    Root,
    /// `udf:field` children of the root's `udf:type` block.
    Udt,
}

/// Mapping view over an entity's user-defined fields.
///
/// Field names are not required to be unique on the wire; lookups return
/// the first match (duplicates shadow) while iteration yields every field
/// in document order.
#[derive(Debug, Clone)]
pub struct UdfMap {
    owner: EntityRef,
    scope: Scope,
}

impl UdfMap {
    /// View over the entity's root-level UDFs.
    pub fn new(owner: EntityRef) -> UdfMap {
        UdfMap {
            owner,
            scope: Scope::Root,
        }
    }

    /// View over the entity's UDT field block.
    pub fn udt(owner: EntityRef) -> UdfMap {
        UdfMap {
            owner,
            scope: Scope::Udt,
        }
    }

    /// The UDT's `name` attribute, if this is a UDT view and the document
    /// has a `udf:type` block.
    pub fn udt_name(&self) -> Result<Option<String>> {
        self.owner.with_root(|root| {
            root.child(Some(UDF_NS), "type")
                .and_then(|t| t.attr("name").map(str::to_string))
        })
    }

    /// True iff a field with that name exists.
    pub fn contains(&self, key: &str) -> Result<bool> {
        self.owner
            .with_root(|root| self.scoped(root).is_some_and(|s| find_field(s, key).is_some()))
    }

    /// The coerced value of the first field named `key`, or `None` if the
    /// field is absent or carries no text.
    pub fn get(&self, key: &str) -> Result<Option<UdfValue>> {
        self.owner.with_root(|root| {
            let Some(scope) = self.scoped(root) else {
                return Ok(None);
            };
            let Some(field) = find_field(scope, key) else {
                return Ok(None);
            };
            match field.text() {
                Some(text) => {
                    UdfValue::from_wire(field.attr("type"), text).map(Some)
                }
                None => Ok(None),
            }
        })?
    }

    /// Like [`get`](Self::get) but with a fallback.
    pub fn get_or(&self, key: &str, default: UdfValue) -> Result<UdfValue> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Assigns `value` to `key`. Updates the first existing field with that
    /// name after checking the value against its declared type; otherwise
    /// appends a new field typed from the value.
    pub fn set(&self, key: &str, value: impl Into<UdfValue>) -> Result<()> {
        let value = value.into();
        self.owner.with_root_mut(|root| {
            root.ensure_ns_decl(UDF_PREFIX, UDF_NS);
            let scope = self.scoped_mut(root);
            if let Some(field) = find_field_mut(scope, key) {
                if let Some(declared) = field.attr("type") {
                    if !value.assignable_to(declared) {
                        return Err(Error::UdfType {
                            name: key.to_string(),
                            declared: declared.to_string(),
                            got: value.type_name(),
                        });
                    }
                }
                field.set_text(value.to_text());
                return Ok(());
            }
            let mut field = Element::namespaced(UDF_NS, UDF_PREFIX, "field");
            field.set_attr("type", value.type_name());
            field.set_attr("name", key);
            field.set_text(value.to_text());
            scope.push_element(field);
            Ok(())
        })?
    }

    /// Removes the field named `key`, erroring if no such field exists.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.owner.with_root_mut(|root| {
            let Some(scope) = self.scoped_in_place(root) else {
                return Err(Error::UdfNotFound {
                    name: key.to_string(),
                });
            };
            let mut removed = false;
            scope.retain_children(|e| {
                let hit = e.name.matches(Some(UDF_NS), "field") && e.attr("name") == Some(key);
                removed |= hit;
                !hit
            });
            if removed {
                Ok(())
            } else {
                Err(Error::UdfNotFound {
                    name: key.to_string(),
                })
            }
        })?
    }

    /// Every `(name, value)` pair in document order. Fields without text
    /// are skipped; duplicate names all appear.
    pub fn pairs(&self) -> Result<Vec<(String, UdfValue)>> {
        self.owner.with_root(|root| {
            let Some(scope) = self.scoped(root) else {
                return Ok(Vec::new());
            };
            let mut out = Vec::new();
            for field in scope.children_named(Some(UDF_NS), "field") {
                let name = field.attr("name").unwrap_or_default().to_string();
                if let Some(text) = field.text() {
                    out.push((name, UdfValue::from_wire(field.attr("type"), text)?));
                }
            }
            Ok(out)
        })?
    }

    /// Removes every field in this view's scope.
    pub fn clear(&self) -> Result<()> {
        self.owner.with_root_mut(|root| {
            if let Some(scope) = self.scoped_in_place(root) {
                scope.remove_children_named(Some(UDF_NS), "field");
            }
        })
    }

    fn scoped<'a>(&self, root: &'a Element) -> Option<&'a Element> {
        match self.scope {
            Scope::Root => Some(root),
            Scope::Udt => root.child(Some(UDF_NS), "type"),
        }
    }

    /// Mutable scope for reads/removals: never creates the UDT block.
    fn scoped_in_place<'a>(&self, root: &'a mut Element) -> Option<&'a mut Element> {
        match self.scope {
            Scope::Root => Some(root),
            Scope::Udt => root.child_mut(Some(UDF_NS), "type"),
        }
    }

    /// Mutable scope for writes: creates the UDT block on first use.
    fn scoped_mut<'a>(&self, root: &'a mut Element) -> &'a mut Element {
        match self.scope {
            Scope::Root => root,
            Scope::Udt => root.find_or_create_child(Some(UDF_NS), Some(UDF_PREFIX), "type"),
        }
    }
}

fn find_field<'a>(scope: &'a Element, key: &str) -> Option<&'a Element> {
    scope
        .children_named(Some(UDF_NS), "field")
        .find(|e| e.attr("name") == Some(key))
}

fn find_field_mut<'a>(scope: &'a mut Element, key: &str) -> Option<&'a mut Element> {
    scope
        .children_mut()
        .find(|e| e.name.matches(Some(UDF_NS), "field") && e.attr("name") == Some(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_formatting_drops_trailing_zero() {
        assert_eq!(UdfValue::Numeric(21.0).to_text(), "21");
        assert_eq!(UdfValue::Numeric(21.5).to_text(), "21.5");
    }

    #[test]
    fn test_from_wire_coercion() {
        assert_eq!(
            UdfValue::from_wire(Some("Numeric"), "42".to_string()).unwrap(),
            UdfValue::Numeric(42.0)
        );
        assert_eq!(
            UdfValue::from_wire(Some("String"), "stuff".to_string()).unwrap(),
            UdfValue::Text("stuff".to_string())
        );
        assert_eq!(
            UdfValue::from_wire(None, "stuff".to_string()).unwrap(),
            UdfValue::Text("stuff".to_string())
        );
        assert_eq!(
            UdfValue::from_wire(Some("Boolean"), "true".to_string()).unwrap(),
            UdfValue::Boolean(true)
        );
        assert!(UdfValue::from_wire(Some("Numeric"), "much".to_string()).is_err());
    }

    #[test]
    fn test_assignability() {
        assert!(UdfValue::Numeric(1.0).assignable_to("Numeric"));
        assert!(!UdfValue::Text("433".into()).assignable_to("Numeric"));
        assert!(UdfValue::Text("x".into()).assignable_to("String"));
        assert!(UdfValue::Text("x".into()).assignable_to("Date"));
        assert!(!UdfValue::Boolean(true).assignable_to("String"));
    }
}
