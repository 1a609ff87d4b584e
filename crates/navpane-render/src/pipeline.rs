//! Render pipeline: sanitize, parse, rewrite references, commit.

use navpane_loader::ResourceLoader;
use navpane_markup::{MarkupTree, TagName};
use navpane_types::{Address, NavError, Result, resolve};

use crate::image_cache::ImageCache;
use crate::proxy::{rewrite_forms, rewrite_links};
use crate::sanitize::sanitize;
use crate::surface::DisplaySurface;

/// A document the pipeline can render: an address plus lazily fetched
/// bytes.
pub trait DocumentSource {
    fn address(&self) -> &Address;

    /// The document bytes, fetching them on first call.
    fn content(&mut self) -> Result<&[u8]>;
}

/// Loaders and the image cache a render reads from.
pub struct RenderContext<'a> {
    pub internal: &'a dyn ResourceLoader,
    pub external: &'a dyn ResourceLoader,
    pub images: &'a ImageCache,
}

impl<'a> RenderContext<'a> {
    /// Internal loader for `localhost`, external loader otherwise.
    pub fn loader_for(&self, address: &Address) -> &'a dyn ResourceLoader {
        if address.is_local() {
            self.internal
        } else {
            self.external
        }
    }
}

/// Fetch, transform and present `doc`.
///
/// Fails with the document's fetch error, or [`NavError::RenderFailure`] if
/// the markup cannot be parsed. Nothing reaches `surface` on failure.
pub fn render(
    doc: &mut dyn DocumentSource,
    ctx: &RenderContext<'_>,
    surface: &mut dyn DisplaySurface,
) -> Result<()> {
    let address = doc.address().clone();
    let raw = String::from_utf8_lossy(doc.content()?).into_owned();
    let markup = render_markup(&raw, &address, ctx)?;
    surface.present(&markup, ctx.images);
    Ok(())
}

/// The transformation steps of [`render`] without fetching or presenting.
pub fn render_markup(raw: &str, base: &Address, ctx: &RenderContext<'_>) -> Result<String> {
    let clean = sanitize(raw);
    let mut tree = navpane_markup::parse(&clean)?;

    let links = rewrite_links(&mut tree);
    let forms = rewrite_forms(&mut tree);
    let images = cache_images(&mut tree, base, ctx);
    log::debug!("{base}: proxied {links} links, {forms} forms, {images} images");

    Ok(navpane_markup::serialize(&tree))
}

/// Point every `<img src>` at a cache key. Returns the number of images.
fn cache_images(tree: &mut MarkupTree, base: &Address, ctx: &RenderContext<'_>) -> usize {
    let ids = tree.elements_by_tag(&TagName::Img);
    for &id in &ids {
        let src = tree
            .element(id)
            .and_then(|e| e.get_attribute("src"))
            .map(str::to_string);
        let key = fetch_image(src.as_deref(), base, ctx);
        if let Some(el) = tree.element_mut(id) {
            el.set_attribute("src", key);
        }
    }
    ids.len()
}

/// Load one image into the cache and return the key to reference it by.
///
/// A slot is reserved before anything is fetched. On any failure the
/// placeholder is stored under the missing-image key and that key is
/// returned instead.
pub fn fetch_image(src: Option<&str>, base: &Address, ctx: &RenderContext<'_>) -> String {
    let key = ctx.images.reserve();
    let loaded = src
        .ok_or_else(|| NavError::image_unavailable(base.to_string(), "image has no src"))
        .and_then(|src| resolve(src, base))
        .and_then(|address| {
            let loader = ctx.loader_for(&address);
            log::debug!("image {address} via {} loader", loader.name());
            loader.read_image(&address)
        });
    match loaded {
        Ok(image) => {
            ctx.images.store(&key, image);
            key
        },
        Err(e) => {
            log::warn!("using placeholder image: {e}");
            ctx.images.store_missing().to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use navpane_types::{Image, Params};

    use super::*;
    use crate::image_cache::MISSING_IMAGE_KEY;

    /// Serves a 1x1 image for paths ending in `.png`, fails otherwise.
    /// Records every address it is asked for.
    #[derive(Default)]
    struct Images {
        seen: Mutex<Vec<String>>,
    }

    impl ResourceLoader for Images {
        fn get(&self, address: &Address) -> Result<Vec<u8>> {
            Err(NavError::unreachable(address.to_string(), "documents not served"))
        }

        fn post(&self, address: &Address, _params: &Params) -> Result<Vec<u8>> {
            self.get(address)
        }

        fn read_image(&self, address: &Address) -> Result<Image> {
            self.seen.lock().unwrap().push(address.to_string());
            if address.path.ends_with(".png") {
                Ok(Image::filled(1, 1, [9, 9, 9, 255]))
            } else {
                Err(NavError::image_unavailable(address.to_string(), "no such image"))
            }
        }

        fn name(&self) -> &'static str {
            "images"
        }
    }

    struct Doc {
        address: Address,
        body: Result<Vec<u8>>,
    }

    impl DocumentSource for Doc {
        fn address(&self) -> &Address {
            &self.address
        }

        fn content(&mut self) -> Result<&[u8]> {
            match &self.body {
                Ok(bytes) => Ok(bytes.as_slice()),
                Err(e) => Err(NavError::unreachable(self.address.to_string(), e.to_string())),
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        presented: Vec<String>,
    }

    impl DisplaySurface for Recorder {
        fn set_title(&mut self, _title: &str) {}

        fn present(&mut self, markup: &str, _images: &ImageCache) {
            self.presented.push(markup.to_string());
        }
    }

    fn base() -> Address {
        Address::parse("http://localhost/dir/page.html").unwrap()
    }

    #[test]
    fn renders_sanitized_and_proxied_markup() {
        let (internal, external, images) = (Images::default(), Images::default(), ImageCache::new());
        let ctx = RenderContext {
            internal: &internal,
            external: &external,
            images: &images,
        };
        let out = render_markup(
            "<SCRIPT>alert(1)</SCRIPT><p>ok <a href=\"next.html\">next</a></p>",
            &base(),
            &ctx,
        )
        .unwrap();
        assert_eq!(
            out,
            "<html><head></head><body><p>ok <a href=\"http://127.0.0.1/?url=next.html\">next</a></p></body></html>"
        );
    }

    #[test]
    fn images_dispatch_by_host_and_get_fresh_keys() {
        let (internal, external, images) = (Images::default(), Images::default(), ImageCache::new());
        let ctx = RenderContext {
            internal: &internal,
            external: &external,
            images: &images,
        };
        let out = render_markup(
            "<img src=\"a.png\"><img src=\"http://example.com/b.png\">",
            &base(),
            &ctx,
        )
        .unwrap();
        assert!(out.contains("<img src=\"http://127.0.0.1/0.img\">"));
        assert!(out.contains("<img src=\"http://127.0.0.1/1.img\">"));
        assert_eq!(
            *internal.seen.lock().unwrap(),
            vec!["http://localhost/dir/a.png".to_string()]
        );
        assert_eq!(
            *external.seen.lock().unwrap(),
            vec!["http://example.com/b.png".to_string()]
        );
        assert_eq!(images.get("http://127.0.0.1/1.img").unwrap().pixel(0, 0), Some([9, 9, 9, 255]));
    }

    #[test]
    fn failing_images_use_missing_key() {
        let (internal, external, images) = (Images::default(), Images::default(), ImageCache::new());
        let ctx = RenderContext {
            internal: &internal,
            external: &external,
            images: &images,
        };
        let out = render_markup(
            "<img src=\"http://example.com/x.gif\"><img><img src=\"http://bad host/\"><img src=\"ok.png\">",
            &base(),
            &ctx,
        )
        .unwrap();
        assert_eq!(out.matches(MISSING_IMAGE_KEY).count(), 3);
        // Three reserved slots, the missing entry, then the fourth slot.
        assert!(out.contains("http://127.0.0.1/4.img"));
        assert_eq!(*images.get(MISSING_IMAGE_KEY).unwrap(), Image::placeholder());
    }

    #[test]
    fn render_presents_once_on_success() {
        let (internal, external, images) = (Images::default(), Images::default(), ImageCache::new());
        let ctx = RenderContext {
            internal: &internal,
            external: &external,
            images: &images,
        };
        let mut doc = Doc {
            address: base(),
            body: Ok(b"<h1>Hi</h1>".to_vec()),
        };
        let mut surface = Recorder::default();
        render(&mut doc, &ctx, &mut surface).unwrap();
        assert_eq!(
            surface.presented,
            vec!["<html><head></head><body><h1>Hi</h1></body></html>".to_string()]
        );
    }

    #[test]
    fn render_failures_present_nothing() {
        let (internal, external, images) = (Images::default(), Images::default(), ImageCache::new());
        let ctx = RenderContext {
            internal: &internal,
            external: &external,
            images: &images,
        };
        let mut surface = Recorder::default();

        let mut unreachable = Doc {
            address: base(),
            body: Err(NavError::unreachable("x", "down")),
        };
        let err = render(&mut unreachable, &ctx, &mut surface).unwrap_err();
        assert!(matches!(err, NavError::UnreachableResource { .. }));

        let mut unterminated = Doc {
            address: base(),
            body: Ok(b"<p>broken <a href=\"x".to_vec()),
        };
        let err = render(&mut unterminated, &ctx, &mut surface).unwrap_err();
        assert!(matches!(err, NavError::RenderFailure(_)));

        assert!(surface.presented.is_empty());
    }
}
