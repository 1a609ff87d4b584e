//! Page handlers and their route bindings.

use std::fmt;
use std::sync::Arc;

use navpane_types::Params;

/// Binding used by pages that do not declare one.
pub const DEFAULT_BINDING: &str = "default";

/// A handler that produces a document body for a request.
///
/// Handlers are stateless; a fresh instance is created for every request.
pub trait Page: Send {
    fn produce_markup(&self, params: &Params) -> String;
}

/// A [`Page`] type that declares the path it serves.
pub trait BoundPage: Page + Default + 'static {
    const BINDING: &'static str = DEFAULT_BINDING;
}

/// Metadata kind a binding is declared under.
///
/// Scan targets are registered for one kind and lookups only consult
/// targets of the requested kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingKind(&'static str);

impl BindingKind {
    /// Bindings that map internal addresses to pages.
    pub const URL: Self = Self("url");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

/// Zero-argument handler constructor.
pub type PageFactory = Arc<dyn Fn() -> Box<dyn Page> + Send + Sync>;

/// An immutable (path, factory) pair discovered by a scan.
#[derive(Clone)]
pub struct RouteBinding {
    path: String,
    factory: PageFactory,
}

impl RouteBinding {
    pub fn new(path: impl Into<String>, factory: PageFactory) -> Self {
        Self {
            path: path.into(),
            factory,
        }
    }

    /// Binding for a page type, using its declared path.
    pub fn of<P: BoundPage>() -> Self {
        Self::new(P::BINDING, Arc::new(|| Box::new(P::default()) as Box<dyn Page>))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create a fresh handler.
    pub fn instantiate(&self) -> Box<dyn Page> {
        (self.factory)()
    }
}

impl fmt::Debug for RouteBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteBinding")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
