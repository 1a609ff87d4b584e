//! Activation events delivered by the display surface.

/// What happened to a hyperlink or form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Clicked or submitted. The only kind the navigator acts on.
    Activated,
    /// Pointer entered the link.
    Entered,
    /// Pointer left the link.
    Exited,
}

/// A hyperlink or form event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationEvent {
    pub kind: EventKind,
    /// Query string of the activated proxy address, without the `?`.
    pub query: String,
    /// `&`-joined `key=value` pairs of a submitted form.
    pub form_data: Option<String>,
}

impl ActivationEvent {
    /// A clicked link with the given query.
    pub fn activated(query: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Activated,
            query: query.into(),
            form_data: None,
        }
    }

    /// A submitted form.
    pub fn submitted(query: impl Into<String>, form_data: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Activated,
            query: query.into(),
            form_data: Some(form_data.into()),
        }
    }

    /// Event of `kind` for a full proxied href as it appears in rendered
    /// markup. The query is everything after the first `?`.
    pub fn for_href(kind: EventKind, href: &str) -> Self {
        let query = href.split_once('?').map(|(_, q)| q).unwrap_or("");
        Self {
            kind,
            query: query.to_string(),
            form_data: None,
        }
    }

    pub fn is_activation(&self) -> bool {
        self.kind == EventKind::Activated
    }
}
