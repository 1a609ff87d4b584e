//! Scan target sources.

use std::sync::Arc;

use navpane_types::Result;

use crate::page::{BoundPage, Page, PageFactory, RouteBinding};

/// Something a registry can scan for route bindings.
///
/// A scan runs at most once per registered target; its outcome (including
/// failure) is memoized by the registry.
pub trait HandlerSource: Send + Sync {
    fn scan(&self) -> Result<Vec<RouteBinding>>;
}

/// A programmatic list of page types.
///
/// Bindings are reported in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct PagePackage {
    bindings: Vec<RouteBinding>,
}

impl PagePackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page type under its declared binding.
    pub fn page<P: BoundPage>(mut self) -> Self {
        self.bindings.push(RouteBinding::of::<P>());
        self
    }

    /// Add a handler under an explicit path.
    pub fn route<F, P>(mut self, path: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Page + 'static,
    {
        let factory: PageFactory = Arc::new(move || Box::new(factory()) as Box<dyn Page>);
        self.bindings.push(RouteBinding::new(path, factory));
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl HandlerSource for PagePackage {
    fn scan(&self) -> Result<Vec<RouteBinding>> {
        Ok(self.bindings.clone())
    }
}
