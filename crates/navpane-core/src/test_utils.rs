//! Shared test utilities for the navigation controller.
//!
//! Provides a [`RecordingSurface`] that keeps everything presented to it
//! and a [`ScriptedLoader`] that serves canned documents and images.

use std::collections::HashMap;
use std::sync::Mutex;

use navpane_loader::ResourceLoader;
use navpane_render::{DisplaySurface, ImageCache};
use navpane_types::params::encode_pairs;
use navpane_types::{Address, Image, NavError, Params, Result};

/// A display surface that records titles and presented markup.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub titles: Vec<String>,
    pub presented: Vec<String>,
    /// Image cache size at each presentation.
    pub cache_sizes: Vec<usize>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently presented markup.
    pub fn last(&self) -> &str {
        self.presented.last().map(String::as_str).unwrap_or("")
    }
}

impl DisplaySurface for RecordingSurface {
    fn set_title(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }

    fn present(&mut self, markup: &str, images: &ImageCache) {
        self.presented.push(markup.to_string());
        self.cache_sizes.push(images.len());
    }
}

/// A loader serving canned responses keyed by full address.
///
/// Unknown documents fail with `UnreachableResource`, unknown images with
/// `ImageUnavailable`. Every request is logged as `"<METHOD> <address>"`,
/// with the encoded form appended for posts.
#[derive(Debug, Default)]
pub struct ScriptedLoader {
    pages: HashMap<String, String>,
    images: HashMap<String, Image>,
    log: Mutex<Vec<String>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, address: &str, markup: &str) -> Self {
        self.pages.insert(address.to_string(), markup.to_string());
        self
    }

    pub fn image(mut self, address: &str, image: Image) -> Self {
        self.images.insert(address.to_string(), image);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn lookup(&self, address: &Address) -> Result<Vec<u8>> {
        self.pages
            .get(&address.to_string())
            .map(|m| m.clone().into_bytes())
            .ok_or_else(|| {
                NavError::unreachable(address.to_string(), "no scripted response")
                    .with_source(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "connection refused",
                    ))
            })
    }
}

impl ResourceLoader for ScriptedLoader {
    fn get(&self, address: &Address) -> Result<Vec<u8>> {
        self.record(format!("GET {address}"));
        self.lookup(address)
    }

    fn post(&self, address: &Address, params: &Params) -> Result<Vec<u8>> {
        self.record(format!("POST {address} {}", encode_pairs(params)));
        self.lookup(address)
    }

    fn read_image(&self, address: &Address) -> Result<Image> {
        self.record(format!("IMAGE {address}"));
        self.images
            .get(&address.to_string())
            .cloned()
            .ok_or_else(|| NavError::image_unavailable(address.to_string(), "no scripted image"))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
