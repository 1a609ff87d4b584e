//! Markup tokenizer.
//!
//! A character-level state machine covering tags, attributes, comments,
//! DOCTYPE and raw-text elements (`<script>`, `<style>`, `<title>`,
//! `<textarea>`). Text content is passed through verbatim so serialization
//! reproduces it; attribute values have character references decoded.
//!
//! Unlike a browser tokenizer this one refuses input whose last tag or
//! comment never closes, since a truncated document cannot be rewritten
//! safely.

use navpane_types::{NavError, Result};

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

/// A single token emitted by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartTag(StartTagToken),
    EndTag(EndTagToken),
    Character(String),
    Comment(String),
    /// Raw contents between `<!DOCTYPE` and `>`, trimmed.
    Doctype(String),
    Eof,
}

/// An opening tag with optional attributes and self-closing flag.
#[derive(Debug, Clone, PartialEq)]
pub struct StartTagToken {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

/// A closing tag. Attributes on end tags are discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct EndTagToken {
    pub name: String,
}

/// A single `name="value"` attribute pair with the value decoded.
/// `has_value` is false for a bare `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub has_value: bool,
}

// ---------------------------------------------------------------------------
// Internal types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    TagOpen,
    EndTagOpen,
    TagName,
    SelfClosingStartTag,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    AfterAttributeValueQuoted,
    MarkupDeclarationOpen,
    Comment,
    Doctype,
    BogusComment,
    RawText,
}

#[derive(Debug, Clone, Default)]
struct TagBuilder {
    name: String,
    attributes: Vec<Attribute>,
    self_closing: bool,
    is_end_tag: bool,
    attr_name: String,
    attr_value: String,
    attr_has_value: bool,
}

impl TagBuilder {
    fn new(is_end_tag: bool) -> Self {
        Self {
            is_end_tag,
            ..Self::default()
        }
    }

    /// Push the pending attribute. Later duplicates of a name are dropped.
    fn finish_attribute(&mut self) {
        let name = std::mem::take(&mut self.attr_name);
        let value = std::mem::take(&mut self.attr_value);
        let has_value = std::mem::take(&mut self.attr_has_value);
        if name.is_empty() || self.attributes.iter().any(|a| a.name == name) {
            return;
        }
        self.attributes.push(Attribute {
            name,
            value: decode_char_refs(&value),
            has_value,
        });
    }

    fn into_token(mut self) -> Token {
        self.finish_attribute();
        if self.is_end_tag {
            Token::EndTag(EndTagToken { name: self.name })
        } else {
            Token::StartTag(StartTagToken {
                name: self.name,
                attributes: self.attributes,
                self_closing: self.self_closing,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Character references
// ---------------------------------------------------------------------------

/// Decode `&name;`, `&#NN;` and `&#xNN;` references. Unknown or malformed
/// references are left as written.
pub fn decode_char_refs(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&semi| semi > 0 && semi <= 10)
            .and_then(|semi| resolve_ref(&after[..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &after[semi + 1..];
            },
            None => {
                out.push('&');
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}

fn resolve_ref(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).filter(|&c| c != '\0');
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "copy" => Some('\u{a9}'),
        "reg" => Some('\u{ae}'),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        "hellip" => Some('\u{2026}'),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Streaming tokenizer over a markup string.
pub struct Tokenizer {
    input: Vec<char>,
    pos: usize,
    state: State,
    current_tag: TagBuilder,
    current_comment: String,
    last_start_tag: Option<String>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            state: State::Data,
            current_tag: TagBuilder::default(),
            current_comment: String::new(),
            last_start_tag: None,
        }
    }

    /// Consume the input and return the token stream, ending in
    /// [`Token::Eof`].
    ///
    /// Fails with [`NavError::RenderFailure`] if a tag, comment or
    /// declaration is still open at end of input.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token == Token::Eof;
            Self::push_coalesced(&mut tokens, token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// Coalesce consecutive `Character` tokens.
    fn push_coalesced(tokens: &mut Vec<Token>, token: Token) {
        if let Token::Character(ref new_text) = token
            && let Some(Token::Character(prev)) = tokens.last_mut()
        {
            prev.push_str(new_text);
            return;
        }
        tokens.push(token);
    }

    // -- helpers ------------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn consume(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn reconsume(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Case-insensitive look-ahead.
    fn starts_with_ci(&self, s: &str) -> bool {
        let mut i = self.pos;
        for expected in s.chars() {
            match self.input.get(i) {
                Some(c) if c.eq_ignore_ascii_case(&expected) => i += 1,
                _ => return false,
            }
        }
        true
    }

    fn is_raw_text_element(name: &str) -> bool {
        matches!(name, "script" | "style" | "title" | "textarea")
    }

    fn unterminated(&self, what: &str) -> NavError {
        NavError::RenderFailure(format!("unterminated {what} at end of input"))
    }

    fn unterminated_tag(&self) -> NavError {
        let what = format!("tag `<{}`", self.current_tag.name);
        self.unterminated(&what)
    }

    fn emit_current_tag(&mut self) -> Token {
        self.state = State::Data;
        let tag = std::mem::take(&mut self.current_tag);
        let is_start = !tag.is_end_tag;
        let self_closing = tag.self_closing;
        let name = tag.name.clone();
        let tok = tag.into_token();
        if is_start && !self_closing && Self::is_raw_text_element(&name) {
            self.last_start_tag = Some(name);
            self.state = State::RawText;
        }
        tok
    }

    fn start_attribute(&mut self) {
        self.current_tag.finish_attribute();
    }

    // -- main dispatch ------------------------------------------------------

    fn next_token(&mut self) -> Result<Token> {
        loop {
            let emitted = match self.state {
                State::Data => self.state_data(),
                State::TagOpen => self.state_tag_open(),
                State::EndTagOpen => self.state_end_tag_open(),
                State::TagName => self.state_tag_name()?,
                State::SelfClosingStartTag => self.state_self_closing()?,
                State::BeforeAttributeName => self.state_before_attr_name(),
                State::AttributeName => self.state_attr_name()?,
                State::AfterAttributeName => self.state_after_attr_name()?,
                State::BeforeAttributeValue => self.state_before_attr_value()?,
                State::AttributeValueDoubleQuoted => self.state_attr_val_quoted('"')?,
                State::AttributeValueSingleQuoted => self.state_attr_val_quoted('\'')?,
                State::AttributeValueUnquoted => self.state_attr_val_unquoted()?,
                State::AfterAttributeValueQuoted => self.state_after_attr_val_q()?,
                State::MarkupDeclarationOpen => self.state_markup_decl_open(),
                State::Comment => self.state_comment()?,
                State::Doctype => self.state_doctype()?,
                State::BogusComment => self.state_bogus_comment()?,
                State::RawText => self.state_rawtext(),
            };
            if let Some(token) = emitted {
                return Ok(token);
            }
        }
    }

    // -- states -------------------------------------------------------------

    fn state_data(&mut self) -> Option<Token> {
        match self.consume() {
            Some('<') => {
                self.state = State::TagOpen;
                None
            },
            Some(ch) => Some(Token::Character(ch.to_string())),
            None => Some(Token::Eof),
        }
    }

    /// After `<`.
    fn state_tag_open(&mut self) -> Option<Token> {
        match self.peek() {
            Some('!') => {
                self.consume();
                self.state = State::MarkupDeclarationOpen;
                None
            },
            Some('/') => {
                self.consume();
                self.state = State::EndTagOpen;
                None
            },
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.current_tag = TagBuilder::new(false);
                self.state = State::TagName;
                None
            },
            Some('?') => {
                self.current_comment.clear();
                self.state = State::BogusComment;
                None
            },
            _ => {
                self.state = State::Data;
                Some(Token::Character("<".into()))
            },
        }
    }

    /// After `</`.
    fn state_end_tag_open(&mut self) -> Option<Token> {
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.current_tag = TagBuilder::new(true);
                self.state = State::TagName;
                None
            },
            Some('>') => {
                self.consume();
                self.state = State::Data;
                None
            },
            None => {
                self.state = State::Data;
                Some(Token::Character("</".into()))
            },
            _ => {
                self.current_comment.clear();
                self.state = State::BogusComment;
                None
            },
        }
    }

    fn state_tag_name(&mut self) -> Result<Option<Token>> {
        match self.consume() {
            Some(ch) if ch.is_ascii_whitespace() => {
                self.state = State::BeforeAttributeName;
                Ok(None)
            },
            Some('/') => {
                self.state = State::SelfClosingStartTag;
                Ok(None)
            },
            Some('>') => Ok(Some(self.emit_current_tag())),
            Some(ch) => {
                self.current_tag.name.push(ch.to_ascii_lowercase());
                Ok(None)
            },
            None => Err(self.unterminated_tag()),
        }
    }

    /// After `/` inside a tag.
    fn state_self_closing(&mut self) -> Result<Option<Token>> {
        match self.consume() {
            Some('>') => {
                self.current_tag.self_closing = true;
                Ok(Some(self.emit_current_tag()))
            },
            None => Err(self.unterminated_tag()),
            _ => {
                self.reconsume();
                self.state = State::BeforeAttributeName;
                Ok(None)
            },
        }
    }

    fn state_before_attr_name(&mut self) -> Option<Token> {
        self.skip_whitespace();
        match self.peek() {
            Some('/') | Some('>') | None => {
                self.state = State::AfterAttributeName;
            },
            Some(_) => {
                self.start_attribute();
                self.state = State::AttributeName;
            },
        }
        None
    }

    fn state_attr_name(&mut self) -> Result<Option<Token>> {
        match self.consume() {
            Some(ch) if ch.is_ascii_whitespace() => {
                self.state = State::AfterAttributeName;
            },
            Some('/') | Some('>') => {
                self.reconsume();
                self.state = State::AfterAttributeName;
            },
            Some('=') if !self.current_tag.attr_name.is_empty() => {
                self.current_tag.attr_has_value = true;
                self.state = State::BeforeAttributeValue;
            },
            Some(ch) => self.current_tag.attr_name.push(ch.to_ascii_lowercase()),
            None => return Err(self.unterminated_tag()),
        }
        Ok(None)
    }

    fn state_after_attr_name(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();
        match self.consume() {
            Some('/') => {
                self.current_tag.finish_attribute();
                self.state = State::SelfClosingStartTag;
                Ok(None)
            },
            Some('=') => {
                self.current_tag.attr_has_value = true;
                self.state = State::BeforeAttributeValue;
                Ok(None)
            },
            Some('>') => Ok(Some(self.emit_current_tag())),
            None => Err(self.unterminated_tag()),
            Some(_) => {
                self.reconsume();
                self.start_attribute();
                self.state = State::AttributeName;
                Ok(None)
            },
        }
    }

    fn state_before_attr_value(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();
        match self.peek() {
            Some('"') => {
                self.consume();
                self.state = State::AttributeValueDoubleQuoted;
                Ok(None)
            },
            Some('\'') => {
                self.consume();
                self.state = State::AttributeValueSingleQuoted;
                Ok(None)
            },
            Some('>') => {
                self.consume();
                Ok(Some(self.emit_current_tag()))
            },
            Some(_) => {
                self.state = State::AttributeValueUnquoted;
                Ok(None)
            },
            None => Err(self.unterminated_tag()),
        }
    }

    fn state_attr_val_quoted(&mut self, quote: char) -> Result<Option<Token>> {
        match self.consume() {
            Some(ch) if ch == quote => {
                self.state = State::AfterAttributeValueQuoted;
                Ok(None)
            },
            Some(ch) => {
                self.current_tag.attr_value.push(ch);
                Ok(None)
            },
            None => Err(self.unterminated_tag()),
        }
    }

    fn state_attr_val_unquoted(&mut self) -> Result<Option<Token>> {
        match self.consume() {
            Some(ch) if ch.is_ascii_whitespace() => {
                self.state = State::BeforeAttributeName;
                Ok(None)
            },
            Some('>') => Ok(Some(self.emit_current_tag())),
            Some(ch) => {
                self.current_tag.attr_value.push(ch);
                Ok(None)
            },
            None => Err(self.unterminated_tag()),
        }
    }

    fn state_after_attr_val_q(&mut self) -> Result<Option<Token>> {
        match self.peek() {
            Some(ch) if ch.is_ascii_whitespace() => {
                self.consume();
                self.state = State::BeforeAttributeName;
                Ok(None)
            },
            Some('/') => {
                self.consume();
                self.state = State::SelfClosingStartTag;
                Ok(None)
            },
            Some('>') => {
                self.consume();
                Ok(Some(self.emit_current_tag()))
            },
            Some(_) => {
                self.state = State::BeforeAttributeName;
                Ok(None)
            },
            None => Err(self.unterminated_tag()),
        }
    }

    /// After `<!`.
    fn state_markup_decl_open(&mut self) -> Option<Token> {
        self.current_comment.clear();
        if self.starts_with_ci("--") {
            self.pos += 2;
            self.state = State::Comment;
        } else if self.starts_with_ci("doctype") {
            self.pos += 7;
            self.state = State::Doctype;
        } else {
            self.state = State::BogusComment;
        }
        None
    }

    fn state_comment(&mut self) -> Result<Option<Token>> {
        if self.starts_with_ci("-->") {
            self.pos += 3;
            self.state = State::Data;
            return Ok(Some(Token::Comment(std::mem::take(
                &mut self.current_comment,
            ))));
        }
        match self.consume() {
            Some(ch) => {
                self.current_comment.push(ch);
                Ok(None)
            },
            None => Err(self.unterminated("comment")),
        }
    }

    fn state_doctype(&mut self) -> Result<Option<Token>> {
        match self.consume() {
            Some('>') => {
                self.state = State::Data;
                let body = std::mem::take(&mut self.current_comment);
                Ok(Some(Token::Doctype(body.trim().to_string())))
            },
            Some(ch) => {
                self.current_comment.push(ch);
                Ok(None)
            },
            None => Err(self.unterminated("DOCTYPE")),
        }
    }

    fn state_bogus_comment(&mut self) -> Result<Option<Token>> {
        match self.consume() {
            Some('>') => {
                self.state = State::Data;
                Ok(Some(Token::Comment(std::mem::take(
                    &mut self.current_comment,
                ))))
            },
            Some(ch) => {
                self.current_comment.push(ch);
                Ok(None)
            },
            None => Err(self.unterminated("markup declaration")),
        }
    }

    /// Content of `<script>`, `<style>`, `<title>` and `<textarea>`,
    /// up to the matching end tag.
    fn state_rawtext(&mut self) -> Option<Token> {
        let end_tag = match self.last_start_tag {
            Some(ref s) => format!("</{s}"),
            None => {
                self.state = State::Data;
                return None;
            },
        };

        let mut text = String::new();
        loop {
            if self.pos >= self.input.len() || self.at_content_end_tag(&end_tag) {
                self.state = State::Data;
                return if text.is_empty() {
                    None
                } else {
                    Some(Token::Character(text))
                };
            }
            text.push(self.input[self.pos]);
            self.pos += 1;
        }
    }

    /// `</name` followed by whitespace, `/` or `>`.
    fn at_content_end_tag(&self, end_tag: &str) -> bool {
        if !self.starts_with_ci(end_tag) {
            return false;
        }
        let after = self.pos + end_tag.chars().count();
        matches!(self.input.get(after), Some(c) if c.is_ascii_whitespace() || *c == '/' || *c == '>')
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Tokenize and strip the trailing Eof.
    fn tok(input: &str) -> Vec<Token> {
        let mut tokens = Tokenizer::new(input).tokenize().unwrap();
        if matches!(tokens.last(), Some(Token::Eof)) {
            tokens.pop();
        }
        tokens
    }

    fn start(name: &str, attrs: &[(&str, &str)], self_closing: bool) -> Token {
        Token::StartTag(StartTagToken {
            name: name.into(),
            attributes: attrs
                .iter()
                .map(|(n, v)| Attribute {
                    name: (*n).into(),
                    value: (*v).into(),
                    has_value: true,
                })
                .collect(),
            self_closing,
        })
    }

    fn end(name: &str) -> Token {
        Token::EndTag(EndTagToken { name: name.into() })
    }

    #[test]
    fn basic_paragraph() {
        assert_eq!(
            tok("<p>Hello</p>"),
            vec![
                start("p", &[], false),
                Token::Character("Hello".into()),
                end("p")
            ]
        );
    }

    #[test]
    fn tag_names_are_lowercased() {
        assert_eq!(tok("<DIV></Div>"), vec![start("div", &[], false), end("div")]);
    }

    #[test]
    fn self_closing_with_attribute() {
        assert_eq!(
            tok("<img src=\"a.png\"/>"),
            vec![start("img", &[("src", "a.png")], true)]
        );
    }

    #[test]
    fn quoted_unquoted_and_boolean_attributes() {
        let mut expected = start(
            "input",
            &[("type", "text"), ("value", "a b"), ("disabled", "")],
            false,
        );
        if let Token::StartTag(tag) = &mut expected {
            tag.attributes[2].has_value = false;
        }
        assert_eq!(tok("<input type=text value='a b' disabled>"), vec![expected]);
    }

    #[test]
    fn empty_value_is_not_bare() {
        assert_eq!(
            tok("<img alt=\"\" title = ''>"),
            vec![start("img", &[("alt", ""), ("title", "")], false)]
        );
    }

    #[test]
    fn duplicate_attribute_first_wins() {
        assert_eq!(
            tok("<a href=\"one\" HREF=\"two\">"),
            vec![start("a", &[("href", "one")], false)]
        );
    }

    #[test]
    fn attribute_char_refs_decoded() {
        assert_eq!(
            tok("<a href=\"x?a=1&amp;b=2&#x41;&bogus;\">"),
            vec![start("a", &[("href", "x?a=1&b=2A&bogus;")], false)]
        );
    }

    #[test]
    fn text_is_verbatim() {
        assert_eq!(
            tok("a &amp; b < c"),
            vec![Token::Character("a &amp; b < c".into())]
        );
    }

    #[test]
    fn comment_and_doctype() {
        assert_eq!(
            tok("<!DOCTYPE html><!-- hi -->"),
            vec![Token::Doctype("html".into()), Token::Comment(" hi ".into())]
        );
    }

    #[test]
    fn raw_text_keeps_markup() {
        assert_eq!(
            tok("<style>a<b>{}</style>x"),
            vec![
                start("style", &[], false),
                Token::Character("a<b>{}".into()),
                end("style"),
                Token::Character("x".into()),
            ]
        );
    }

    #[test]
    fn raw_text_without_end_tag_runs_to_eof() {
        assert_eq!(
            tok("<title>never closed"),
            vec![start("title", &[], false), Token::Character("never closed".into())]
        );
    }

    #[test]
    fn unterminated_tag_fails() {
        for input in ["<p", "<a href=\"x", "<a href=x", "<br/", "<p class"] {
            let err = Tokenizer::new(input).tokenize().unwrap_err();
            assert!(matches!(err, NavError::RenderFailure(_)), "{input}");
        }
    }

    #[test]
    fn unterminated_comment_fails() {
        assert!(Tokenizer::new("<!-- open").tokenize().is_err());
        assert!(Tokenizer::new("<!DOCTYPE html").tokenize().is_err());
    }

    #[test]
    fn lone_angle_brackets_are_text() {
        assert_eq!(tok("1 < 2 >"), vec![Token::Character("1 < 2 >".into())]);
        assert_eq!(tok("x</"), vec![Token::Character("x</".into())]);
    }

    #[test]
    fn decode_char_refs_numeric() {
        assert_eq!(decode_char_refs("&#65;&#x42;&lt;"), "AB<");
        assert_eq!(decode_char_refs("&#0;"), "&#0;");
        assert_eq!(decode_char_refs("a & b"), "a & b");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn plain_text_round_trips(s in "[^<&]{0,64}") {
                let tokens = tok(&s);
                if s.is_empty() {
                    prop_assert!(tokens.is_empty());
                } else {
                    prop_assert_eq!(tokens, vec![Token::Character(s)]);
                }
            }

            #[test]
            fn never_panics(s in "\\PC{0,128}") {
                let _ = Tokenizer::new(&s).tokenize();
            }
        }
    }
}
