//! The navigation controller.
//!
//! Turns activation events into documents, renders them onto the display
//! surface and keeps the history. Every failure along the way is replaced by
//! an error page; nothing is returned to the caller.

use std::sync::Arc;

use navpane_loader::ResourceLoader;
use navpane_render::{DisplaySurface, ImageCache, RenderContext, link_target, render};
use navpane_route::RouteRegistry;
use navpane_types::params::parse_pairs;
use navpane_types::{Address, NavError, Result, resolve};

use crate::document::{Document, Request};
use crate::error_page::error_markup;
use crate::event::ActivationEvent;
use crate::history::History;

pub struct Navigator<S: DisplaySurface> {
    title: Option<String>,
    home: Address,
    internal: Arc<dyn ResourceLoader>,
    external: Arc<dyn ResourceLoader>,
    registry: Arc<RouteRegistry>,
    images: Arc<ImageCache>,
    history: History,
    surface: S,
}

/// Everything [`Navigator::new`] needs besides the surface.
pub struct NavigatorParts {
    pub title: Option<String>,
    pub home: Address,
    pub internal: Arc<dyn ResourceLoader>,
    pub external: Arc<dyn ResourceLoader>,
    pub registry: Arc<RouteRegistry>,
    pub images: Arc<ImageCache>,
}

impl<S: DisplaySurface> Navigator<S> {
    pub fn new(parts: NavigatorParts, surface: S) -> Self {
        Self {
            title: parts.title,
            home: parts.home,
            internal: parts.internal,
            external: parts.external,
            registry: parts.registry,
            images: parts.images,
            history: History::new(),
            surface,
        }
    }

    /// Show the configured title and render the home address.
    pub fn launch(&mut self) {
        log::info!("launching at {}", self.home);
        if let Some(title) = &self.title {
            self.surface.set_title(title);
        }
        let loader = self.loader_for(&self.home);
        self.show(Document::get(self.home.clone(), loader));
    }

    /// Handle an event from the display surface. Only activations are
    /// acted on.
    pub fn activate(&mut self, event: &ActivationEvent) {
        if !event.is_activation() {
            log::trace!("ignoring {:?} event", event.kind);
            return;
        }
        match self.document_for(event) {
            Ok(doc) => self.show(doc),
            Err(e) => self.show_error(e),
        }
    }

    /// Navigate to `link`, resolved against the current document, as if it
    /// had been clicked.
    pub fn navigate(&mut self, link: &str) {
        match self.resolve_link(link) {
            Ok(address) => {
                let loader = self.loader_for(&address);
                self.show(Document::get(address, loader));
            },
            Err(e) => self.show_error(e),
        }
    }

    pub fn current(&self) -> Option<&Document> {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn home(&self) -> &Address {
        &self.home
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn images(&self) -> &Arc<ImageCache> {
        &self.images
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    // ---------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------

    fn loader_for(&self, address: &Address) -> Arc<dyn ResourceLoader> {
        if address.is_local() {
            Arc::clone(&self.internal)
        } else {
            Arc::clone(&self.external)
        }
    }

    /// Resolve against the current document, or the home address before
    /// anything has been shown.
    fn resolve_link(&self, link: &str) -> Result<Address> {
        let base = self.history.current().map_or(&self.home, Document::address);
        resolve(link, base)
    }

    fn document_for(&self, event: &ActivationEvent) -> Result<Document> {
        let link = link_target(&event.query)?.ok_or_else(|| {
            NavError::malformed(event.query.clone(), "activated link has no url parameter")
        })?;
        let address = self.resolve_link(&link)?;

        if !address.is_local() {
            log::debug!("external GET {address}");
            return Ok(Document::get(address, Arc::clone(&self.external)));
        }
        let request = match &event.form_data {
            Some(form) => {
                log::debug!("internal POST {address}");
                Request::Post(parse_pairs(form))
            },
            None => {
                log::debug!("internal GET {address}");
                Request::Get
            },
        };
        Ok(Document::new(address, Arc::clone(&self.internal), request))
    }

    // ---------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------

    fn show(&mut self, doc: Document) {
        log::info!("navigating to {}", doc.address());
        self.history.push(doc);
        if let Err(e) = self.render_current() {
            self.show_error(e);
        }
    }

    fn render_current(&mut self) -> Result<()> {
        let ctx = RenderContext {
            internal: self.internal.as_ref(),
            external: self.external.as_ref(),
            images: &self.images,
        };
        match self.history.current_mut() {
            Some(doc) => render(doc, &ctx, &mut self.surface),
            None => Ok(()),
        }
    }

    /// Push and render an error page for `err`. If that fails too, the
    /// error markup for the second failure is presented as is.
    fn show_error(&mut self, err: NavError) {
        log::warn!("showing error page: {err}");
        let rendered = Document::error_page(error_markup(&err), Arc::clone(&self.internal))
            .and_then(|doc| {
                self.history.push(doc);
                self.render_current()
            });
        if let Err(second) = rendered {
            log::warn!("error page failed to render: {second}");
            self.surface.present(&error_markup(&second), &self.images);
        }
    }
}

impl<S: DisplaySurface> std::fmt::Debug for Navigator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("title", &self.title)
            .field("home", &self.home.to_string())
            .field("history", &self.history.len())
            .field("images", &self.images)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use navpane_loader::InternalLoader;
    use navpane_render::{MISSING_IMAGE_KEY, proxy_link};
    use navpane_route::{BindingKind, BoundPage, Page, PagePackage};
    use navpane_types::{Image, Params};

    use super::*;
    use crate::event::EventKind;
    use crate::test_utils::{RecordingSurface, ScriptedLoader};

    const HOME: &str = "http://localhost/index.html";

    fn navigator(
        internal: Arc<dyn ResourceLoader>,
        external: Arc<dyn ResourceLoader>,
    ) -> Navigator<RecordingSurface> {
        Navigator::new(
            NavigatorParts {
                title: Some("Test".into()),
                home: Address::parse(HOME).unwrap(),
                internal,
                external,
                registry: Arc::new(RouteRegistry::new()),
                images: Arc::new(ImageCache::new()),
            },
            RecordingSurface::new(),
        )
    }

    fn click(href: &str) -> ActivationEvent {
        ActivationEvent::for_href(EventKind::Activated, &proxy_link(href))
    }

    #[derive(Default)]
    struct Greeting;

    impl Page for Greeting {
        fn produce_markup(&self, params: &Params) -> String {
            let name = params.get("name").map_or("world", String::as_str);
            format!("<h1>Hello {name}</h1><a href=\"/index.html\">home</a>")
        }
    }

    impl BoundPage for Greeting {
        const BINDING: &'static str = "/greet.html";
    }

    #[derive(Default)]
    struct Index;

    impl Page for Index {
        fn produce_markup(&self, _params: &Params) -> String {
            "<h1>Hi</h1>".into()
        }
    }

    impl BoundPage for Index {
        const BINDING: &'static str = "/index.html";
    }

    fn routed() -> Navigator<RecordingSurface> {
        let registry = Arc::new(RouteRegistry::new());
        registry.register(
            "demo",
            BindingKind::URL,
            PagePackage::new().page::<Index>().page::<Greeting>(),
        );
        let internal = Arc::new(InternalLoader::with_registry(Arc::clone(&registry)));
        let mut nav = navigator(internal, Arc::new(ScriptedLoader::new()));
        nav.registry = registry;
        nav
    }

    #[test]
    fn launch_renders_home() {
        let mut nav = routed();
        nav.launch();
        assert_eq!(nav.surface().titles, vec!["Test".to_string()]);
        assert_eq!(
            nav.surface().presented,
            vec!["<html><head></head><body><h1>Hi</h1></body></html>".to_string()]
        );
        assert_eq!(nav.history().len(), 1);
        assert_eq!(nav.current().unwrap().address().to_string(), HOME);
    }

    #[test]
    fn click_resolves_against_current_document() {
        let mut nav = routed();
        nav.launch();
        nav.activate(&click("greet.html?name=Ada"));
        assert!(nav.surface().last().contains("<h1>Hello Ada</h1>"));
        assert!(
            nav.surface()
                .last()
                .contains("href=\"http://127.0.0.1/?url=%2Findex.html\"")
        );
        assert_eq!(
            nav.current().unwrap().address().to_string(),
            "http://localhost/greet.html?name=Ada"
        );
    }

    #[test]
    fn form_submission_posts_params() {
        let mut nav = routed();
        nav.launch();
        let event = ActivationEvent::submitted(
            proxy_link("/greet.html").split_once('?').unwrap().1,
            "name=Grace+Hopper&junk",
        );
        nav.activate(&event);
        assert!(nav.surface().last().contains("<h1>Hello Grace Hopper</h1>"));
        let mut params = Params::new();
        params.insert("name".into(), "Grace Hopper".into());
        assert_eq!(nav.current().unwrap().request(), &Request::Post(params));
    }

    #[test]
    fn non_activation_events_are_ignored() {
        let mut nav = routed();
        nav.launch();
        nav.activate(&ActivationEvent::for_href(
            EventKind::Entered,
            &proxy_link("greet.html"),
        ));
        assert_eq!(nav.history().len(), 1);
        assert_eq!(nav.surface().presented.len(), 1);
    }

    #[test]
    fn external_failure_shows_error_page() {
        let external = Arc::new(ScriptedLoader::new());
        let mut nav = navigator(Arc::new(ScriptedLoader::new()), Arc::clone(&external) as _);
        nav.navigate("http://example.invalid/");
        let shown = nav.surface().last();
        assert!(shown.contains("<h1>ERROR</h1>"));
        assert!(shown.contains("<h2>unable to retrieve data from http://example.invalid/"));
        assert!(shown.contains("<div>connection refused</div>"));
        assert_eq!(external.requests(), vec!["GET http://example.invalid/".to_string()]);
        // Failed document, then the error page.
        assert_eq!(nav.history().len(), 2);
        assert_eq!(
            nav.current().unwrap().address().to_string(),
            "http://localhost/"
        );
    }

    #[test]
    fn activated_external_link_failure_shows_error_page() {
        let external = Arc::new(ScriptedLoader::new());
        let mut nav = navigator(Arc::new(ScriptedLoader::new()), Arc::clone(&external) as _);
        nav.activate(&ActivationEvent::activated("url=http%3A%2F%2Fexample.com%2Fa.html"));
        assert_eq!(
            external.requests(),
            vec!["GET http://example.com/a.html".to_string()]
        );
        let shown = nav.surface().last();
        assert!(shown.contains("<h1>ERROR</h1>"));
        assert!(shown.contains("<h2>unable to retrieve data from http://example.com/a.html"));
    }

    #[test]
    fn unbound_internal_path_lists_targets() {
        let mut nav = routed();
        nav.navigate("/missing.html");
        let shown = nav.surface().last();
        assert!(shown.contains("<h1>ERROR</h1>"));
        assert!(shown.contains("`/missing.html`"));
        assert!(shown.contains("`demo`"));
    }

    #[test]
    fn missing_url_parameter_is_error_page() {
        let mut nav = routed();
        nav.launch();
        nav.activate(&ActivationEvent::activated("other=1"));
        assert!(nav.surface().last().contains("<h1>ERROR</h1>"));
        assert!(nav.surface().last().contains("malformed address"));
    }

    #[test]
    fn undecodable_url_parameter_is_error_page() {
        let mut nav = routed();
        nav.activate(&ActivationEvent::activated("url=%zz"));
        assert!(nav.surface().last().contains("<h1>ERROR</h1>"));
        assert_eq!(nav.history().len(), 1);
    }

    #[test]
    fn failing_external_image_gets_missing_key() {
        let internal = Arc::new(
            ScriptedLoader::new()
                .page(
                    HOME,
                    "<p><img src=\"http://example.com/x.png\"><img src=\"/ok.png\"></p>",
                )
                .image("http://localhost/ok.png", Image::filled(2, 2, [0, 0, 0, 255])),
        );
        let mut nav = navigator(internal, Arc::new(ScriptedLoader::new()));
        nav.launch();
        let shown = nav.surface().last();
        assert!(shown.contains(&format!("<img src=\"{MISSING_IMAGE_KEY}\">")));
        assert!(shown.contains("<img src=\"http://127.0.0.1/2.img\">"));
        assert_eq!(nav.images().get("http://127.0.0.1/2.img").unwrap().width, 2);
        assert_eq!(*nav.images().get(MISSING_IMAGE_KEY).unwrap(), Image::placeholder());
    }

    #[test]
    fn image_cache_keys_keep_increasing_across_navigations() {
        let internal = Arc::new(
            ScriptedLoader::new()
                .page(HOME, "<img src=\"a.png\">")
                .page("http://localhost/next.html", "<img src=\"a.png\">")
                .image("http://localhost/a.png", Image::filled(1, 1, [1, 1, 1, 1])),
        );
        let mut nav = navigator(internal, Arc::new(ScriptedLoader::new()));
        nav.launch();
        nav.navigate("next.html");
        assert!(nav.surface().presented[0].contains("http://127.0.0.1/0.img"));
        assert!(nav.surface().presented[1].contains("http://127.0.0.1/1.img"));
    }

    #[test]
    fn unparseable_document_falls_back_to_error_page() {
        let internal = Arc::new(ScriptedLoader::new().page(HOME, "<p>broken <a href=\"x"));
        let mut nav = navigator(internal, Arc::new(ScriptedLoader::new()));
        nav.launch();
        assert_eq!(nav.surface().presented.len(), 1);
        assert!(nav.surface().last().contains("render failure"));
    }

    #[test]
    fn error_messages_are_escaped() {
        let mut nav = routed();
        nav.show_error(NavError::RenderFailure("<unterminated".into()));
        assert!(
            nav.surface()
                .last()
                .contains("<h2>render failure: &lt;unterminated</h2>")
        );
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn failures_push_an_error_page(bound in proptest::collection::vec(any::<bool>(), 1..12)) {
                let mut nav = routed();
                let mut expected = 0;
                for ok in bound {
                    if ok {
                        nav.navigate("/greet.html");
                        expected += 1;
                    } else {
                        nav.navigate("/missing.html");
                        expected += 2;
                    }
                    prop_assert_eq!(nav.history().len(), expected);
                }
            }
        }
    }
}
