//! The in-memory element tree.
//!
//! Elements are matched by their resolved `(namespace, local name)` pair,
//! never by literal prefix, so `<udf:field>` and `<u:field>` bound to the
//! same namespace URI are the same element. Prefixes are retained only for
//! serialization, and `xmlns`/`xmlns:*` declarations travel as ordinary
//! attributes so a parse/serialize round trip leaves them untouched.

/// A resolved element name: namespace URI, original prefix, local part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    /// Resolved namespace URI, if the element is in a namespace.
    pub ns: Option<String>,
    /// The prefix as written in the source document (kept for output).
    pub prefix: Option<String>,
    /// Local part of the name.
    pub local: String,
}

impl QName {
    /// A name with no namespace.
    pub fn new(local: impl Into<String>) -> Self {
        QName {
            ns: None,
            prefix: None,
            local: local.into(),
        }
    }

    /// A namespaced name with an explicit prefix.
    pub fn namespaced(
        ns: impl Into<String>,
        prefix: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        QName {
            ns: Some(ns.into()),
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    /// True if this name resolves to the given `(namespace, local)` pair.
    pub fn matches(&self, ns: Option<&str>, local: &str) -> bool {
        self.ns.as_deref() == ns && self.local == local
    }

    /// The name as it appears in serialized output (`prefix:local` or `local`).
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local),
            None => self.local.clone(),
        }
    }
}

/// An attribute as written in the source: literal name, unescaped value.
///
/// Namespace declarations (`xmlns`, `xmlns:udf`, ...) are stored here like
/// any other attribute and re-serialized verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

/// A child node: nested element or text run.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element: name, attributes, ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: QName,
    attrs: Vec<Attr>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an empty element with no namespace.
    pub fn new(local: impl Into<String>) -> Self {
        Element {
            name: QName::new(local),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates an empty element from a resolved name.
    pub fn from_name(name: QName) -> Self {
        Element {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates an empty namespaced element.
    pub fn namespaced(
        ns: impl Into<String>,
        prefix: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Element {
            name: QName::namespaced(ns, prefix, local),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    // ---- attributes ----

    /// Returns the value of an attribute by its literal name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Sets an attribute, replacing any existing value. Sibling attributes,
    /// including namespace declarations, are left in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(a) => a.value = value,
            None => self.attrs.push(Attr { name, value }),
        }
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(idx).value)
    }

    /// All attributes in document order.
    pub fn attrs(&self) -> impl Iterator<Item = &Attr> {
        self.attrs.iter()
    }

    /// Declares `xmlns:prefix="uri"` on this element unless a declaration
    /// for that URI is already present. Needed when the first namespaced
    /// child (e.g. a `udf:field`) is created on a document that has none.
    pub fn ensure_ns_decl(&mut self, prefix: &str, uri: &str) {
        let declared = self
            .attrs
            .iter()
            .any(|a| a.name.starts_with("xmlns") && a.value == uri);
        if !declared {
            self.attrs.push(Attr {
                name: format!("xmlns:{}", prefix),
                value: uri.to_string(),
            });
        }
    }

    // ---- text ----

    /// Concatenated text content of this element, or `None` if it has no
    /// text nodes (a self-closing element reads as `None`, not `""`).
    pub fn text(&self) -> Option<String> {
        let mut out: Option<String> = None;
        for child in &self.children {
            if let Node::Text(t) = child {
                out.get_or_insert_with(String::new).push_str(t);
            }
        }
        out
    }

    /// Replaces all text content with a single text node. Element children
    /// are left untouched.
    pub fn set_text(&mut self, value: impl Into<String>) {
        self.children.retain(|n| matches!(n, Node::Element(_)));
        self.children.push(Node::Text(value.into()));
    }

    /// Appends a text node.
    pub fn push_text(&mut self, value: impl Into<String>) {
        let value = value.into();
        if let Some(Node::Text(t)) = self.children.last_mut() {
            t.push_str(&value);
        } else {
            self.children.push(Node::Text(value));
        }
    }

    // ---- children ----

    /// All element children in document order.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// All element children, mutably.
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Raw child nodes, including text runs.
    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// The first child matching `(ns, local)`.
    pub fn child(&self, ns: Option<&str>, local: &str) -> Option<&Element> {
        self.children().find(|e| e.name.matches(ns, local))
    }

    /// The first child matching `(ns, local)`, mutably.
    pub fn child_mut(&mut self, ns: Option<&str>, local: &str) -> Option<&mut Element> {
        self.children_mut().find(|e| e.name.matches(ns, local))
    }

    /// All children matching `(ns, local)`, in document order.
    pub fn children_named<'a>(
        &'a self,
        ns: Option<&'a str>,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.children().filter(move |e| e.name.matches(ns, local))
    }

    /// Appends an element child.
    pub fn push_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Finds the first child matching `(ns, local)`, creating and appending
    /// an empty one (with the given output prefix) if absent.
    pub fn find_or_create_child(
        &mut self,
        ns: Option<&str>,
        prefix: Option<&str>,
        local: &str,
    ) -> &mut Element {
        let idx = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.name.matches(ns, local)));
        let idx = match idx {
            Some(i) => i,
            None => {
                let name = QName {
                    ns: ns.map(str::to_string),
                    prefix: prefix.map(str::to_string),
                    local: local.to_string(),
                };
                self.children.push(Node::Element(Element {
                    name,
                    attrs: Vec::new(),
                    children: Vec::new(),
                }));
                self.children.len() - 1
            }
        };
        match &mut self.children[idx] {
            Node::Element(e) => e,
            Node::Text(_) => unreachable!("position matched an element node"),
        }
    }

    /// Removes every child matching `(ns, local)`, returning how many were
    /// removed.
    pub fn remove_children_named(&mut self, ns: Option<&str>, local: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if e.name.matches(ns, local)));
        before - self.children.len()
    }

    /// Keeps only element children for which the predicate holds. Text runs
    /// are preserved.
    pub fn retain_children<F: FnMut(&Element) -> bool>(&mut self, mut pred: F) {
        self.children.retain(|n| match n {
            Node::Element(e) => pred(e),
            Node::Text(_) => true,
        });
    }

    /// Edge-trims every text run and drops runs that are only whitespace.
    /// Called once per element as parsing closes it, after all text pieces
    /// (including resolved references) have been merged into their runs.
    pub(crate) fn trim_text_runs(&mut self) {
        for node in &mut self.children {
            if let Node::Text(t) = node {
                let trimmed = t.trim().to_string();
                *t = trimmed;
            }
        }
        self.children
            .retain(|n| !matches!(n, Node::Text(t) if t.is_empty()));
    }
}
