//! Tree builder.
//!
//! Consumes a token stream and constructs a [`MarkupTree`] with implicit
//! `html`, `head` and `body` elements. This is far simpler than a browser
//! parser: there is no auto-closing of paragraphs or list items and no
//! table fixup. An end tag closes the nearest open element with the same
//! name and is ignored if there is none.

use navpane_types::{NavError, Result};

use crate::dom::{Attribute as DomAttribute, ElementData, MarkupTree, NodeId, NodeKind, TagName};
use crate::tokenizer::{StartTagToken, Token};

/// Deepest element nesting accepted before the document is rejected.
pub const MAX_OPEN_ELEMENTS: usize = 512;

// ------------------------------------------------------------------
// Insertion mode
// ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertionMode {
    BeforeHtml,
    BeforeHead,
    InHead,
    AfterHead,
    InBody,
}

// ------------------------------------------------------------------
// TreeBuilder
// ------------------------------------------------------------------

pub struct TreeBuilder {
    tree: MarkupTree,
    mode: InsertionMode,
    open_elements: Vec<NodeId>,
    html: Option<NodeId>,
    head: Option<NodeId>,
    body: Option<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            tree: MarkupTree::new(),
            mode: InsertionMode::BeforeHtml,
            open_elements: Vec::new(),
            html: None,
            head: None,
            body: None,
        }
    }

    /// Build a tree from a token stream.
    ///
    /// Fails with [`NavError::RenderFailure`] when nesting exceeds
    /// [`MAX_OPEN_ELEMENTS`].
    pub fn build(tokens: Vec<Token>) -> Result<MarkupTree> {
        let mut builder = Self::new();
        for token in tokens {
            builder.process_token(token)?;
        }
        builder.ensure_body()?;
        Ok(builder.tree)
    }

    fn process_token(&mut self, token: Token) -> Result<()> {
        match token {
            Token::Doctype(body) => {
                if self.html.is_none() {
                    let id = self.tree.add_node(NodeKind::Doctype(body));
                    let root = self.tree.root;
                    self.tree.append_child(root, id);
                }
            },
            Token::Comment(text) => {
                let id = self.tree.add_node(NodeKind::Comment(text));
                let parent = self.current_node();
                self.tree.append_child(parent, id);
            },
            Token::Character(text) => self.insert_text(&text)?,
            Token::StartTag(tag) => self.handle_start_tag(&tag)?,
            Token::EndTag(tag) => self.handle_end_tag(&TagName::parse(&tag.name)),
            Token::Eof => {},
        }
        Ok(())
    }

    // =============================================================
    // Start and end tags
    // =============================================================

    fn handle_start_tag(&mut self, tag: &StartTagToken) -> Result<()> {
        let tag_name = TagName::parse(&tag.name);
        match tag_name {
            TagName::Html => {
                match self.html {
                    Some(html) => self.merge_attributes(html, tag),
                    None => {
                        let id = self.create_element(tag);
                        let root = self.tree.root;
                        self.tree.append_child(root, id);
                        self.push_open(id)?;
                        self.html = Some(id);
                        self.mode = InsertionMode::BeforeHead;
                    },
                }
                Ok(())
            },
            TagName::Head => {
                if self.head.is_none() && self.body.is_none() {
                    let html = self.ensure_html()?;
                    let id = self.create_element(tag);
                    self.tree.append_child(html, id);
                    self.push_open(id)?;
                    self.head = Some(id);
                    self.mode = InsertionMode::InHead;
                }
                Ok(())
            },
            TagName::Body => {
                match self.body {
                    Some(body) => self.merge_attributes(body, tag),
                    None => self.open_body(Some(tag))?,
                }
                Ok(())
            },
            ref t if t.is_head_content() && self.body.is_none() => {
                let parent = match self.mode {
                    InsertionMode::InHead => self.current_node(),
                    _ => self.ensure_head()?,
                };
                self.insert_element(parent, &tag_name, tag)
            },
            _ => {
                self.ensure_body()?;
                let parent = self.current_node();
                self.insert_element(parent, &tag_name, tag)
            },
        }
    }

    fn handle_end_tag(&mut self, tag: &TagName) {
        match tag {
            TagName::Head => self.close_head(),
            TagName::Body | TagName::Html => {},
            _ => {
                let found = self
                    .open_elements
                    .iter()
                    .rposition(|&id| self.tree.element(id).is_some_and(|e| &e.tag == tag));
                if let Some(pos) = found {
                    self.open_elements.truncate(pos);
                }
            },
        }
    }

    // =============================================================
    // Implicit structure
    // =============================================================

    fn ensure_html(&mut self) -> Result<NodeId> {
        if let Some(html) = self.html {
            return Ok(html);
        }
        let id = self.tree.add_node(NodeKind::Element(ElementData::new(TagName::Html)));
        let root = self.tree.root;
        self.tree.append_child(root, id);
        self.push_open(id)?;
        self.html = Some(id);
        self.mode = InsertionMode::BeforeHead;
        Ok(id)
    }

    /// The head element, created (and opened) if missing.
    fn ensure_head(&mut self) -> Result<NodeId> {
        if let Some(head) = self.head {
            return Ok(head);
        }
        let html = self.ensure_html()?;
        let id = self.tree.add_node(NodeKind::Element(ElementData::new(TagName::Head)));
        self.tree.append_child(html, id);
        self.push_open(id)?;
        self.head = Some(id);
        self.mode = InsertionMode::InHead;
        Ok(id)
    }

    fn close_head(&mut self) {
        if self.mode != InsertionMode::InHead {
            return;
        }
        if let Some(head) = self.head
            && let Some(pos) = self.open_elements.iter().rposition(|&id| id == head)
        {
            self.open_elements.truncate(pos);
        }
        self.mode = InsertionMode::AfterHead;
    }

    fn ensure_body(&mut self) -> Result<()> {
        if self.body.is_none() {
            self.open_body(None)?;
        }
        Ok(())
    }

    fn open_body(&mut self, tag: Option<&StartTagToken>) -> Result<()> {
        let html = self.ensure_html()?;
        if self.head.is_none() {
            let head = self.tree.add_node(NodeKind::Element(ElementData::new(TagName::Head)));
            self.tree.append_child(html, head);
            self.head = Some(head);
        }
        self.close_head();
        let id = match tag {
            Some(tag) => self.create_element(tag),
            None => self.tree.add_node(NodeKind::Element(ElementData::new(TagName::Body))),
        };
        self.tree.append_child(html, id);
        self.push_open(id)?;
        self.body = Some(id);
        self.mode = InsertionMode::InBody;
        Ok(())
    }

    // =============================================================
    // Helpers
    // =============================================================

    fn current_node(&self) -> NodeId {
        self.open_elements.last().copied().unwrap_or(self.tree.root)
    }

    fn push_open(&mut self, id: NodeId) -> Result<()> {
        if self.open_elements.len() >= MAX_OPEN_ELEMENTS {
            return Err(NavError::RenderFailure(format!(
                "element nesting exceeds {MAX_OPEN_ELEMENTS} levels"
            )));
        }
        self.open_elements.push(id);
        Ok(())
    }

    fn create_element(&mut self, tag: &StartTagToken) -> NodeId {
        let mut data = ElementData::new(TagName::parse(&tag.name));
        data.attributes = tag
            .attributes
            .iter()
            .map(|a| DomAttribute {
                name: a.name.clone(),
                value: a.value.clone(),
                has_value: a.has_value,
            })
            .collect();
        self.tree.add_node(NodeKind::Element(data))
    }

    fn insert_element(&mut self, parent: NodeId, tag_name: &TagName, tag: &StartTagToken) -> Result<()> {
        let id = self.create_element(tag);
        self.tree.append_child(parent, id);
        if !tag_name.is_void() && !tag.self_closing {
            self.push_open(id)?;
        }
        Ok(())
    }

    /// Copy attributes from a repeated `<html>`/`<body>` tag that the
    /// existing element lacks.
    fn merge_attributes(&mut self, id: NodeId, tag: &StartTagToken) {
        if let Some(data) = self.tree.element_mut(id) {
            for attr in &tag.attributes {
                if data.get_attribute(&attr.name).is_none() {
                    data.set_attribute(&attr.name, attr.value.clone());
                }
            }
        }
    }

    fn insert_text(&mut self, text: &str) -> Result<()> {
        let in_raw_text = self
            .tree
            .element(self.current_node())
            .is_some_and(|e| e.tag.is_raw_text());
        let whitespace = is_all_whitespace(text);

        match self.mode {
            _ if in_raw_text => {},
            InsertionMode::InBody => {},
            InsertionMode::InHead if whitespace => {},
            _ if whitespace => return Ok(()),
            _ => self.ensure_body()?,
        }

        let parent = self.current_node();
        if let Some(&last) = self.tree.get(parent).children.last()
            && let NodeKind::Text(ref mut existing) = self.tree.nodes[last].kind
        {
            existing.push_str(text);
            return Ok(());
        }
        let id = self.tree.add_node(NodeKind::Text(text.to_string()));
        self.tree.append_child(parent, id);
        Ok(())
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn is_all_whitespace(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_whitespace())
}
