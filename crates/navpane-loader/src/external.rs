//! Loader for every non-`localhost` address, backed by [`HttpClient`].

use navpane_types::{Address, Image, NavError, Params, Result};

use crate::ResourceLoader;
use crate::http::{HttpClient, HttpResponse, HttpSettings};
use crate::image::decode_image;

#[derive(Default)]
pub struct ExternalLoader {
    client: HttpClient,
}

impl ExternalLoader {
    pub fn new(settings: HttpSettings) -> Self {
        Self {
            client: HttpClient::new(settings),
        }
    }

    pub fn settings(&self) -> &HttpSettings {
        self.client.settings()
    }

    /// Map a completed exchange to its body. Non-2xx statuses are failures.
    fn body(address: &Address, response: HttpResponse) -> Result<Vec<u8>> {
        if !response.is_success() {
            return Err(NavError::unreachable(
                address.to_string(),
                format!("server answered with status {}", response.status_code),
            ));
        }
        log::debug!(
            "fetched {} bytes from {}",
            response.body.len(),
            response.address
        );
        Ok(response.body)
    }
}

impl ResourceLoader for ExternalLoader {
    fn get(&self, address: &Address) -> Result<Vec<u8>> {
        let response = self.client.get(address).map_err(|e| {
            NavError::unreachable(address.to_string(), "GET request failed").with_source(e)
        })?;
        Self::body(address, response)
    }

    fn post(&self, address: &Address, params: &Params) -> Result<Vec<u8>> {
        let response = self.client.post_form(address, params).map_err(|e| {
            NavError::unreachable(address.to_string(), "POST request failed").with_source(e)
        })?;
        Self::body(address, response)
    }

    fn read_image(&self, address: &Address) -> Result<Image> {
        let bytes = self.get(address).map_err(|e| {
            NavError::image_unavailable(address.to_string(), "fetch failed").with_source(e)
        })?;
        decode_image(&bytes).map_err(|e| {
            NavError::image_unavailable(address.to_string(), "decode failed").with_source(e)
        })
    }

    fn name(&self) -> &'static str {
        "external"
    }
}
