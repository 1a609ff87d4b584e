//! Documents: an address, the loader that serves it, and its bytes once
//! fetched.

use std::fmt;
use std::sync::Arc;

use navpane_loader::ResourceLoader;
use navpane_render::DocumentSource;
use navpane_types::{Address, NavError, Params, Result};

/// Address every error document is given.
pub const ERROR_DOCUMENT_ADDRESS: &str = "http://localhost/";

/// How a document's bytes are requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get,
    Post(Params),
}

#[derive(Debug)]
enum Content {
    Unfetched,
    Loaded(Vec<u8>),
    /// The one fetch failed; later reads report this reason without
    /// refetching.
    Failed(String),
}

pub struct Document {
    address: Address,
    loader: Arc<dyn ResourceLoader>,
    request: Request,
    content: Content,
}

impl Document {
    pub fn new(address: Address, loader: Arc<dyn ResourceLoader>, request: Request) -> Self {
        Self {
            address,
            loader,
            request,
            content: Content::Unfetched,
        }
    }

    /// A GET document.
    pub fn get(address: Address, loader: Arc<dyn ResourceLoader>) -> Self {
        Self::new(address, loader, Request::Get)
    }

    /// A pre-rendered error page. It is never fetched.
    pub fn error_page(markup: String, internal: Arc<dyn ResourceLoader>) -> Result<Self> {
        Ok(Self {
            address: Address::parse(ERROR_DOCUMENT_ADDRESS)?,
            loader: internal,
            request: Request::Get,
            content: Content::Loaded(markup.into_bytes()),
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn loader_name(&self) -> &'static str {
        self.loader.name()
    }

    pub fn is_fetched(&self) -> bool {
        !matches!(self.content, Content::Unfetched)
    }

    /// The document bytes, fetched through the loader on first call.
    pub fn content(&mut self) -> Result<&[u8]> {
        if matches!(self.content, Content::Unfetched) {
            log::debug!("fetching {} via {} loader", self.address, self.loader.name());
            let fetched = match &self.request {
                Request::Get => self.loader.get(&self.address),
                Request::Post(params) => self.loader.post(&self.address, params),
            };
            match fetched {
                Ok(bytes) => self.content = Content::Loaded(bytes),
                Err(e) => {
                    self.content = Content::Failed(e.to_string());
                    return Err(e);
                },
            }
        }
        match &self.content {
            Content::Loaded(bytes) => Ok(bytes.as_slice()),
            Content::Failed(reason) => Err(NavError::unreachable(
                self.address.to_string(),
                format!("earlier fetch failed: {reason}"),
            )),
            Content::Unfetched => Err(NavError::unreachable(
                self.address.to_string(),
                "document was not fetched",
            )),
        }
    }
}

impl DocumentSource for Document {
    fn address(&self) -> &Address {
        &self.address
    }

    fn content(&mut self) -> Result<&[u8]> {
        Document::content(self)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("address", &self.address.to_string())
            .field("loader", &self.loader.name())
            .field("request", &self.request)
            .field("fetched", &self.is_fetched())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedLoader;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn fetches_once() {
        let loader = Arc::new(ScriptedLoader::new().page("http://localhost/a.html", "<p>a</p>"));
        let mut doc = Document::get(addr("http://localhost/a.html"), Arc::clone(&loader) as _);
        assert!(!doc.is_fetched());
        assert_eq!(doc.content().unwrap(), b"<p>a</p>");
        assert_eq!(doc.content().unwrap(), b"<p>a</p>");
        assert_eq!(loader.requests(), vec!["GET http://localhost/a.html".to_string()]);
    }

    #[test]
    fn failed_fetch_is_not_retried() {
        let loader = Arc::new(ScriptedLoader::new());
        let mut doc = Document::get(addr("http://example.com/"), Arc::clone(&loader) as _);
        assert!(matches!(
            doc.content(),
            Err(NavError::UnreachableResource { .. })
        ));
        let again = doc.content().unwrap_err();
        assert!(again.to_string().contains("earlier fetch failed"));
        assert_eq!(loader.requests().len(), 1);
    }

    #[test]
    fn post_sends_params() {
        let loader = Arc::new(ScriptedLoader::new().page("http://localhost/f", "ok"));
        let mut params = Params::new();
        params.insert("k".into(), "v".into());
        let mut doc = Document::new(
            addr("http://localhost/f"),
            Arc::clone(&loader) as _,
            Request::Post(params),
        );
        assert_eq!(doc.content().unwrap(), b"ok");
        assert_eq!(loader.requests(), vec!["POST http://localhost/f k=v".to_string()]);
    }

    #[test]
    fn error_page_is_prefetched() {
        let loader = Arc::new(ScriptedLoader::new());
        let mut doc = Document::error_page("<h1>ERROR</h1>".into(), Arc::clone(&loader) as _).unwrap();
        assert_eq!(doc.address().to_string(), ERROR_DOCUMENT_ADDRESS);
        assert!(doc.is_fetched());
        assert_eq!(doc.content().unwrap(), b"<h1>ERROR</h1>");
        assert!(loader.requests().is_empty());
    }
}
