//! Loader that refuses every request. Used as the external loader when
//! running offline.

use navpane_types::{Address, Image, NavError, Params, Result};

use crate::ResourceLoader;

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockLoader;

const REASON: &str = "network access is disabled";

impl ResourceLoader for BlockLoader {
    fn get(&self, address: &Address) -> Result<Vec<u8>> {
        log::debug!("blocked GET {address}");
        Err(NavError::unreachable(address.to_string(), REASON))
    }

    fn post(&self, address: &Address, _params: &Params) -> Result<Vec<u8>> {
        log::debug!("blocked POST {address}");
        Err(NavError::unreachable(address.to_string(), REASON))
    }

    fn read_image(&self, address: &Address) -> Result<Image> {
        Err(NavError::image_unavailable(address.to_string(), REASON))
    }

    fn name(&self) -> &'static str {
        "block"
    }
}
