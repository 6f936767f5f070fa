//! Typed accessors bound to locations in an entity's document.
//!
//! Each descriptor is a small stateless binding — a tag name, optionally
//! nested one level under a parent tag — that knows how to read a typed
//! value out of an element tree and (for the writable kinds) write one
//! back, creating the bound element on first write. Entities compose their
//! fields from these rather than hand-rolling tree walks.
//!
//! Read semantics are deliberately soft: an absent element yields `None`
//! (or an empty collection), never an error. Text that is present but
//! malformed for the bound type does error.

use std::collections::HashMap;
use std::marker::PhantomData;

use benchtop_xml::Element;

use crate::entity::{EntityRef, Resource};
use crate::error::{Error, Result};

/// Read side of a typed binding.
pub trait Descriptor {
    /// Value produced by a read.
    type Output;

    /// Reads the bound location from `root`.
    fn get(&self, root: &Element) -> Result<Self::Output>;
}

/// Write side, for bindings that support it.
pub trait DescriptorMut: Descriptor {
    /// Value accepted by a write.
    type Input;

    /// Writes `value` at the bound location in `root`, creating the
    /// element (and its parent, for nested bindings) if absent.
    fn set(&self, root: &mut Element, value: Self::Input) -> Result<()>;
}

fn locate<'a>(root: &'a Element, parent: Option<&str>, tag: &str) -> Option<&'a Element> {
    let scope = match parent {
        Some(p) => root.child(None, p)?,
        None => root,
    };
    scope.child(None, tag)
}

fn locate_or_create<'a>(
    root: &'a mut Element,
    parent: Option<&str>,
    tag: &str,
) -> &'a mut Element {
    let scope = match parent {
        Some(p) => root.find_or_create_child(None, None, p),
        None => root,
    };
    scope.find_or_create_child(None, None, tag)
}

/// Text of a child element.
#[derive(Debug, Clone)]
pub struct StringField {
    parent: Option<&'static str>,
    tag: &'static str,
}

impl StringField {
    pub fn new(tag: &'static str) -> Self {
        StringField { parent: None, tag }
    }

    /// Binds to `<parent><tag>…</tag></parent>`.
    pub fn nested(parent: &'static str, tag: &'static str) -> Self {
        StringField {
            parent: Some(parent),
            tag,
        }
    }
}

impl Descriptor for StringField {
    type Output = Option<String>;

    fn get(&self, root: &Element) -> Result<Option<String>> {
        Ok(locate(root, self.parent, self.tag).and_then(Element::text))
    }
}

impl DescriptorMut for StringField {
    type Input = String;

    fn set(&self, root: &mut Element, value: String) -> Result<()> {
        locate_or_create(root, self.parent, self.tag).set_text(value);
        Ok(())
    }
}

/// An attribute on the entity's root element.
#[derive(Debug, Clone)]
pub struct AttrField {
    name: &'static str,
}

impl AttrField {
    pub fn new(name: &'static str) -> Self {
        AttrField { name }
    }
}

impl Descriptor for AttrField {
    type Output = Option<String>;

    fn get(&self, root: &Element) -> Result<Option<String>> {
        Ok(root.attr(self.name).map(str::to_string))
    }
}

impl DescriptorMut for AttrField {
    type Input = String;

    fn set(&self, root: &mut Element, value: String) -> Result<()> {
        root.set_attr(self.name, value);
        Ok(())
    }
}

/// Ordered text of every matching child (repeatable tag). Read-only:
/// reordering a repeated run is a tree-level edit the API does not map.
#[derive(Debug, Clone)]
pub struct StringListField {
    parent: Option<&'static str>,
    tag: &'static str,
}

impl StringListField {
    pub fn new(tag: &'static str) -> Self {
        StringListField { parent: None, tag }
    }

    pub fn nested(parent: &'static str, tag: &'static str) -> Self {
        StringListField {
            parent: Some(parent),
            tag,
        }
    }
}

impl Descriptor for StringListField {
    type Output = Vec<String>;

    fn get(&self, root: &Element) -> Result<Vec<String>> {
        let scope = match self.parent {
            Some(p) => match root.child(None, p) {
                Some(s) => s,
                None => return Ok(Vec::new()),
            },
            None => root,
        };
        Ok(scope
            .children_named(None, self.tag)
            .map(|e| e.text().unwrap_or_default())
            .collect())
    }
}

/// Flat key/value block: maps each immediate child's tag to its text.
/// A self-closing child maps to `None`.
#[derive(Debug, Clone)]
pub struct StringDictField {
    tag: &'static str,
}

impl StringDictField {
    pub fn new(tag: &'static str) -> Self {
        StringDictField { tag }
    }
}

impl Descriptor for StringDictField {
    type Output = HashMap<String, Option<String>>;

    fn get(&self, root: &Element) -> Result<HashMap<String, Option<String>>> {
        let mut out = HashMap::new();
        if let Some(block) = root.child(None, self.tag) {
            for child in block.children() {
                out.insert(child.name.local.clone(), child.text());
            }
        }
        Ok(out)
    }
}

/// Integer-valued child element (string-backed on the wire).
#[derive(Debug, Clone)]
pub struct IntField {
    parent: Option<&'static str>,
    tag: &'static str,
}

impl IntField {
    pub fn new(tag: &'static str) -> Self {
        IntField { parent: None, tag }
    }

    pub fn nested(parent: &'static str, tag: &'static str) -> Self {
        IntField {
            parent: Some(parent),
            tag,
        }
    }
}

impl Descriptor for IntField {
    type Output = Option<i64>;

    fn get(&self, root: &Element) -> Result<Option<i64>> {
        match locate(root, self.parent, self.tag).and_then(Element::text) {
            Some(text) => text
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| Error::Value {
                    field: self.tag.to_string(),
                    text,
                    expected: "integer",
                }),
            None => Ok(None),
        }
    }
}

impl DescriptorMut for IntField {
    type Input = i64;

    fn set(&self, root: &mut Element, value: i64) -> Result<()> {
        locate_or_create(root, self.parent, self.tag).set_text(value.to_string());
        Ok(())
    }
}

/// Boolean child element with the literal `"true"`/`"false"` wire form.
#[derive(Debug, Clone)]
pub struct BoolField {
    parent: Option<&'static str>,
    tag: &'static str,
}

impl BoolField {
    pub fn new(tag: &'static str) -> Self {
        BoolField { parent: None, tag }
    }

    pub fn nested(parent: &'static str, tag: &'static str) -> Self {
        BoolField {
            parent: Some(parent),
            tag,
        }
    }
}

impl Descriptor for BoolField {
    type Output = Option<bool>;

    fn get(&self, root: &Element) -> Result<Option<bool>> {
        match locate(root, self.parent, self.tag).and_then(Element::text) {
            Some(text) => match text.trim() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(Error::Value {
                    field: self.tag.to_string(),
                    text,
                    expected: "boolean",
                }),
            },
            None => Ok(None),
        }
    }
}

impl DescriptorMut for BoolField {
    type Input = bool;

    fn set(&self, root: &mut Element, value: bool) -> Result<()> {
        let text = if value { "true" } else { "false" };
        locate_or_create(root, self.parent, self.tag).set_text(text);
        Ok(())
    }
}

/// A reference to another entity: a URI-bearing attribute on a child
/// element, resolved through the session cache. Resolution registers a
/// lazy shell — nothing is fetched until the target is accessed.
#[derive(Debug, Clone)]
pub struct EntityLink<T: Resource> {
    parent: Option<&'static str>,
    tag: &'static str,
    attr: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> EntityLink<T> {
    pub fn new(tag: &'static str) -> Self {
        EntityLink {
            parent: None,
            tag,
            attr: "uri",
            _marker: PhantomData,
        }
    }

    pub fn nested(parent: &'static str, tag: &'static str) -> Self {
        EntityLink {
            parent: Some(parent),
            tag,
            attr: "uri",
            _marker: PhantomData,
        }
    }

    /// Resolves the linked entity through the owner's session.
    pub fn resolve(&self, owner: &EntityRef) -> Result<Option<T>> {
        let uri = owner.get(self)?;
        Ok(uri.map(|u| owner.client().from_uri(&u)))
    }

    /// Points the link at `target`.
    pub fn assign(&self, owner: &EntityRef, target: &T) -> Result<()> {
        owner.set(self, target.uri().to_string())
    }
}

impl<T: Resource> Descriptor for EntityLink<T> {
    type Output = Option<String>;

    fn get(&self, root: &Element) -> Result<Option<String>> {
        Ok(locate(root, self.parent, self.tag).and_then(|e| e.attr(self.attr).map(str::to_string)))
    }
}

impl<T: Resource> DescriptorMut for EntityLink<T> {
    type Input = String;

    fn set(&self, root: &mut Element, value: String) -> Result<()> {
        locate_or_create(root, self.parent, self.tag).set_attr(self.attr, value);
        Ok(())
    }
}
