//! Loader for `localhost`: route handlers for documents, the bundled
//! resource namespace for images.

use std::sync::Arc;

use navpane_route::{BindingKind, RouteRegistry};
use navpane_types::params::parse_pairs;
use navpane_types::{Address, Image, NavError, Params, Result};

use crate::ResourceLoader;
use crate::bundle::{MemoryBundle, ResourceBundle};
use crate::image::decode_image;

pub struct InternalLoader {
    registry: Arc<RouteRegistry>,
    bundle: Arc<dyn ResourceBundle>,
}

impl InternalLoader {
    pub fn new(registry: Arc<RouteRegistry>, bundle: Arc<dyn ResourceBundle>) -> Self {
        Self { registry, bundle }
    }

    /// Loader with an empty resource bundle.
    pub fn with_registry(registry: Arc<RouteRegistry>) -> Self {
        Self::new(registry, Arc::new(MemoryBundle::new()))
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    fn dispatch(&self, address: &Address, params: &Params) -> Result<Vec<u8>> {
        let path = address.decoded_path();
        log::debug!("internal dispatch {path} ({} params)", params.len());
        match self.registry.find_handler(&path, BindingKind::URL)? {
            Some(page) => Ok(page.produce_markup(params).into_bytes()),
            None => Err(NavError::NoRouteBound {
                registered: self.registry.registered_locators(BindingKind::URL),
                path,
            }),
        }
    }
}

impl ResourceLoader for InternalLoader {
    fn get(&self, address: &Address) -> Result<Vec<u8>> {
        let params = parse_pairs(address.query_str());
        self.dispatch(address, &params)
    }

    fn post(&self, address: &Address, params: &Params) -> Result<Vec<u8>> {
        self.dispatch(address, params)
    }

    fn read_image(&self, address: &Address) -> Result<Image> {
        let bytes = self.bundle.read(&address.decoded_path()).map_err(|e| {
            NavError::image_unavailable(address.to_string(), "bundled resource unreadable")
                .with_source(e)
        })?;
        decode_image(&bytes).map_err(|e| {
            NavError::image_unavailable(address.to_string(), "decode failed").with_source(e)
        })
    }

    fn name(&self) -> &'static str {
        "internal"
    }
}

impl std::fmt::Debug for InternalLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalLoader")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
