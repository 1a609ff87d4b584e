//! The route registry: maps internal paths to page handlers.
//!
//! Scan targets are registered up front and scanned lazily, once, on the
//! first lookup that reaches them. A failed scan is remembered and reported
//! again on every later lookup without retrying.

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use navpane_types::{NavError, Result};

use crate::page::{BindingKind, Page, RouteBinding};
use crate::source::HandlerSource;

type ScanOutcome = std::result::Result<Arc<[RouteBinding]>, String>;

struct ScanTarget {
    locator: String,
    kind: BindingKind,
    source: Box<dyn HandlerSource>,
    scanned: OnceLock<ScanOutcome>,
}

impl ScanTarget {
    fn bindings(&self) -> Result<Arc<[RouteBinding]>> {
        let outcome = self.scanned.get_or_init(|| {
            log::debug!("scanning `{}`", self.locator);
            let outcome: ScanOutcome = match self.source.scan() {
                Ok(bindings) if bindings.is_empty() => Err("no page handlers found".to_string()),
                Ok(bindings) => Ok(bindings.into()),
                Err(e) => Err(e.to_string()),
            };
            if let Err(ref cause) = outcome {
                log::warn!("scan of `{}` failed: {cause}", self.locator);
            }
            outcome
        });
        outcome.clone().map_err(|cause| NavError::ScanFailure {
            locator: self.locator.clone(),
            cause,
        })
    }
}

/// Registry of scan targets, shareable across controllers.
#[derive(Default)]
pub struct RouteRegistry {
    targets: RwLock<Vec<Arc<ScanTarget>>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scan target under `locator`.
    ///
    /// Returns `false` (and changes nothing) if the locator is already
    /// registered.
    pub fn register(
        &self,
        locator: impl Into<String>,
        kind: BindingKind,
        source: impl HandlerSource + 'static,
    ) -> bool {
        self.register_boxed(locator, kind, Box::new(source))
    }

    /// [`register`](Self::register) for an already boxed source.
    pub fn register_boxed(
        &self,
        locator: impl Into<String>,
        kind: BindingKind,
        source: Box<dyn HandlerSource>,
    ) -> bool {
        let locator = locator.into();
        let mut targets = self.targets.write().unwrap_or_else(PoisonError::into_inner);
        if targets.iter().any(|t| t.locator == locator) {
            log::debug!("`{locator}` already registered");
            return false;
        }
        log::debug!("registered `{locator}` for {} bindings", kind.name());
        targets.push(Arc::new(ScanTarget {
            locator,
            kind,
            source,
            scanned: OnceLock::new(),
        }));
        true
    }

    /// Find a fresh handler for `path` among targets of `kind`.
    ///
    /// Targets are consulted in registration order and bindings in the
    /// order their target declared them; the first exact match wins. A
    /// failed scan aborts the lookup with [`NavError::ScanFailure`].
    pub fn find_handler(&self, path: &str, kind: BindingKind) -> Result<Option<Box<dyn Page>>> {
        for target in self.snapshot() {
            if target.kind != kind {
                continue;
            }
            let bindings = target.bindings()?;
            let mut matches = bindings.iter().filter(|b| b.path() == path);
            if let Some(binding) = matches.next() {
                if matches.next().is_some() {
                    log::warn!(
                        "`{}` binds {path} more than once; using the first",
                        target.locator
                    );
                }
                log::debug!("{path} handled by `{}`", target.locator);
                return Ok(Some(binding.instantiate()));
            }
        }
        Ok(None)
    }

    /// Locators of registered targets of `kind`, in registration order.
    pub fn registered_locators(&self, kind: BindingKind) -> Vec<String> {
        self.snapshot()
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.locator.clone())
            .collect()
    }

    /// Every binding path reachable for `kind`, skipping failed targets.
    pub fn bound_paths(&self, kind: BindingKind) -> Vec<String> {
        self.snapshot()
            .iter()
            .filter(|t| t.kind == kind)
            .filter_map(|t| t.bindings().ok())
            .flat_map(|b| b.iter().map(|b| b.path().to_string()).collect::<Vec<_>>())
            .collect()
    }

    fn snapshot(&self) -> Vec<Arc<ScanTarget>> {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(Arc::clone)
            .collect()
    }
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let locators: Vec<String> = self.snapshot().iter().map(|t| t.locator.clone()).collect();
        f.debug_struct("RouteRegistry")
            .field("targets", &locators)
            .finish()
    }
}
