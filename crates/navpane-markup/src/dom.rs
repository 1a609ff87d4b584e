//! Arena-based editable node tree.
//!
//! Nodes live in a flat `Vec` and link to each other by index, so the render
//! pipeline can walk the tree and rewrite attributes in place without any
//! reference counting.

/// Index into the [`MarkupTree`] node arena.
pub type NodeId = usize;

// ------------------------------------------------------------------
// Node types
// ------------------------------------------------------------------

/// A parsed document as an editable tree.
#[derive(Debug, Clone)]
pub struct MarkupTree {
    pub nodes: Vec<Node>,
    pub root: NodeId,
}

/// A single node in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Root,
    Doctype(String),
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: TagName,
    pub attributes: Vec<Attribute>,
}

/// An element attribute. The value is stored decoded; `has_value` is
/// false for a bare `name` and serializes without `=`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub has_value: bool,
}

// ------------------------------------------------------------------
// TagName
// ------------------------------------------------------------------

/// Tag names the navigation layer treats specially. Everything else is
/// kept as `Other` with its lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagName {
    Html,
    Head,
    Body,
    Title,
    Meta,
    Link,
    Base,
    Style,
    Script,
    A,
    Img,
    Form,
    Input,
    Textarea,
    Br,
    Hr,
    Col,
    Source,
    Area,
    Wbr,
    Other(String),
}

impl TagName {
    /// Map a lowercase tag name to a `TagName`.
    pub fn parse(s: &str) -> Self {
        match s {
            "html" => Self::Html,
            "head" => Self::Head,
            "body" => Self::Body,
            "title" => Self::Title,
            "meta" => Self::Meta,
            "link" => Self::Link,
            "base" => Self::Base,
            "style" => Self::Style,
            "script" => Self::Script,
            "a" => Self::A,
            "img" => Self::Img,
            "form" => Self::Form,
            "input" => Self::Input,
            "textarea" => Self::Textarea,
            "br" => Self::Br,
            "hr" => Self::Hr,
            "col" => Self::Col,
            "source" => Self::Source,
            "area" => Self::Area,
            "wbr" => Self::Wbr,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Html => "html",
            Self::Head => "head",
            Self::Body => "body",
            Self::Title => "title",
            Self::Meta => "meta",
            Self::Link => "link",
            Self::Base => "base",
            Self::Style => "style",
            Self::Script => "script",
            Self::A => "a",
            Self::Img => "img",
            Self::Form => "form",
            Self::Input => "input",
            Self::Textarea => "textarea",
            Self::Br => "br",
            Self::Hr => "hr",
            Self::Col => "col",
            Self::Source => "source",
            Self::Area => "area",
            Self::Wbr => "wbr",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Elements that never have content or an end tag.
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            Self::Br
                | Self::Hr
                | Self::Img
                | Self::Input
                | Self::Meta
                | Self::Link
                | Self::Base
                | Self::Col
                | Self::Source
                | Self::Area
                | Self::Wbr
        )
    }

    /// Elements that belong in `<head>` when they appear before any body
    /// content.
    pub fn is_head_content(&self) -> bool {
        matches!(
            self,
            Self::Title | Self::Meta | Self::Link | Self::Base | Self::Style | Self::Script
        )
    }

    /// Elements whose text content is stored and written back verbatim.
    pub fn is_raw_text(&self) -> bool {
        matches!(
            self,
            Self::Script | Self::Style | Self::Title | Self::Textarea
        )
    }
}

// ------------------------------------------------------------------
// ElementData
// ------------------------------------------------------------------

impl ElementData {
    pub fn new(tag: TagName) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Replace an attribute's value, appending it if absent.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => {
                attr.value = value;
                attr.has_value = true;
            },
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
                has_value: true,
            }),
        }
    }
}

// ------------------------------------------------------------------
// MarkupTree
// ------------------------------------------------------------------

impl MarkupTree {
    /// Empty tree holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
            root: 0,
        }
    }

    /// Add a detached node and return its id.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        self.nodes[parent_id].children.push(child_id);
        self.nodes[child_id].parent = Some(parent_id);
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Every element with the given tag, in document order.
    pub fn elements_by_tag(&self, tag: &TagName) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.element(id).is_some_and(|e| &e.tag == tag) {
                out.push(id);
            }
            stack.extend(self.nodes[id].children.iter().rev());
        }
        out
    }

    pub fn head(&self) -> Option<NodeId> {
        self.elements_by_tag(&TagName::Head).first().copied()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.elements_by_tag(&TagName::Body).first().copied()
    }

    /// Text of the first `<title>`, trimmed.
    pub fn title(&self) -> Option<String> {
        let id = *self.elements_by_tag(&TagName::Title).first()?;
        Some(self.text_content(id).trim().to_string())
    }

    /// Concatenated text of a node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Text(s) => out.push_str(s),
            _ => {
                for &child in &self.nodes[id].children {
                    self.collect_text(child, out);
                }
            },
        }
    }
}

impl Default for MarkupTree {
    fn default() -> Self {
        Self::new()
    }
}
