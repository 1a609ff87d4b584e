//! A display surface that prints rendered documents as plain text.
//!
//! Links are numbered `[n]` and forms `{n}` so the prompt can refer to
//! them; images are shown as `[image WxH]` from the shared cache.

use std::io::Write;

use navpane_markup::tokenizer::decode_char_refs;
use navpane_markup::{MarkupTree, NodeId, NodeKind, TagName};
use navpane_render::{DisplaySurface, ImageCache};

/// A form found in the last presented document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTarget {
    pub action: String,
    pub fields: Vec<String>,
}

pub struct TerminalSurface<W: Write> {
    out: W,
    links: Vec<String>,
    forms: Vec<FormTarget>,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            links: Vec::new(),
            forms: Vec::new(),
        }
    }

    /// Proxied href of link `n` (1-based).
    pub fn link(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.links.get(i))
            .map(String::as_str)
    }

    /// Form `n` (1-based).
    pub fn form(&self, n: usize) -> Option<&FormTarget> {
        n.checked_sub(1).and_then(|i| self.forms.get(i))
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()) {
            log::error!("terminal write failed: {e}");
        }
    }
}

impl<W: Write> DisplaySurface for TerminalSurface<W> {
    fn set_title(&mut self, title: &str) {
        self.write(&format!("== {title} ==\n"));
    }

    fn present(&mut self, markup: &str, images: &ImageCache) {
        let text = match navpane_markup::parse(markup) {
            Ok(tree) => {
                let mut view = TextView {
                    tree: &tree,
                    images,
                    text: String::new(),
                    links: Vec::new(),
                    forms: Vec::new(),
                };
                view.walk(tree.root);
                self.links = view.links;
                self.forms = view.forms;
                view.text
            },
            // Markup reaching the surface has already been parsed once;
            // show it raw if that ever changes.
            Err(e) => {
                log::warn!("cannot lay out presented markup: {e}");
                markup.to_string()
            },
        };
        let text = collapse_blank_lines(&text);
        self.write(&format!("\n{}\n", text.trim()));
        let _ = self.out.flush();
    }
}

struct TextView<'a> {
    tree: &'a MarkupTree,
    images: &'a ImageCache,
    text: String,
    links: Vec<String>,
    forms: Vec<FormTarget>,
}

impl TextView<'_> {
    fn walk(&mut self, id: NodeId) {
        let node = self.tree.get(id);
        match &node.kind {
            NodeKind::Text(t) => {
                let decoded = decode_char_refs(t);
                let words = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
                if decoded.starts_with(char::is_whitespace) && !self.text.ends_with(' ') {
                    self.text.push(' ');
                }
                self.text.push_str(&words);
                if !words.is_empty() && decoded.ends_with(char::is_whitespace) {
                    self.text.push(' ');
                }
            },
            NodeKind::Element(el) => match &el.tag {
                TagName::Head | TagName::Script | TagName::Style => {},
                TagName::Br => self.text.push('\n'),
                TagName::Img => {
                    let label = el
                        .get_attribute("src")
                        .and_then(|key| self.images.get(key))
                        .map_or_else(
                            || "[image]".to_string(),
                            |img| format!("[image {}x{}]", img.width, img.height),
                        );
                    self.text.push_str(&label);
                },
                TagName::Input => {
                    if let Some(name) = el.get_attribute("name") {
                        self.text.push_str(&format!("<{name}>"));
                        if let Some(form) = self.forms.last_mut() {
                            form.fields.push(name.to_string());
                        }
                    }
                },
                TagName::A => {
                    self.children(id);
                    if let Some(href) = el.get_attribute("href") {
                        self.links.push(href.to_string());
                        self.text.push_str(&format!(" [{}]", self.links.len()));
                    }
                },
                TagName::Form => {
                    self.forms.push(FormTarget {
                        action: el.get_attribute("action").unwrap_or_default().to_string(),
                        fields: Vec::new(),
                    });
                    self.text.push_str(&format!("{{{}}} ", self.forms.len()));
                    self.children(id);
                    self.text.push('\n');
                },
                TagName::Other(name) if is_block(name) => {
                    self.text.push('\n');
                    self.children(id);
                    self.text.push('\n');
                },
                _ => self.children(id),
            },
            NodeKind::Root => self.children(id),
            NodeKind::Doctype(_) | NodeKind::Comment(_) => {},
        }
    }

    fn children(&mut self, id: NodeId) {
        for &child in &self.tree.get(id).children {
            self.walk(child);
        }
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "li" | "pre"
            | "table" | "tr" | "blockquote" | "section" | "article" | "header" | "footer"
    )
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank += 1;
            if blank > 1 {
                continue;
            }
        } else {
            blank = 0;
        }
        out.push_str(line.trim_start());
        out.push('\n');
    }
    out
}
