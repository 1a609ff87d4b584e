//! Assembles a [`Navigator`] from defaults, explicit parts or a
//! [`NavConfig`].

use std::path::PathBuf;
use std::sync::Arc;

use navpane_loader::{
    BlockLoader, DirBundle, ExternalLoader, InternalLoader, MemoryBundle, ResourceBundle,
    ResourceLoader,
};
use navpane_render::{DisplaySurface, ImageCache};
use navpane_route::{BindingKind, HandlerSource, ManifestDir, PagePackage, RouteRegistry};
use navpane_types::{Address, Result};

use crate::config::{DEFAULT_HOME, NavConfig};
use crate::controller::{Navigator, NavigatorParts};

pub struct NavigatorBuilder {
    title: Option<String>,
    home: String,
    internal: Option<Arc<dyn ResourceLoader>>,
    external: Option<Arc<dyn ResourceLoader>>,
    registry: Option<Arc<RouteRegistry>>,
    images: Option<Arc<ImageCache>>,
    bundle: Option<Arc<dyn ResourceBundle>>,
    /// Scan targets applied to the registry at build time, in order.
    targets: Vec<(String, Box<dyn HandlerSource>)>,
}

impl Default for NavigatorBuilder {
    fn default() -> Self {
        Self {
            title: None,
            home: DEFAULT_HOME.to_string(),
            internal: None,
            external: None,
            registry: None,
            images: None,
            bundle: None,
            targets: Vec::new(),
        }
    }
}

impl NavigatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded from a configuration.
    pub fn from_config(config: &NavConfig) -> Self {
        let mut builder = Self::new().home(config.home.clone());
        if let Some(title) = &config.title {
            builder = builder.title(title.clone());
        }
        builder = if config.network.offline {
            builder.external_loader(BlockLoader)
        } else {
            builder.external_loader(ExternalLoader::new(config.network.http_settings()))
        };
        if let Some(dir) = &config.bundle_dir {
            builder = builder.bundle(DirBundle::new(dir));
        }
        for dir in &config.manifest_dirs {
            builder = builder.register_manifest_dir(dir);
        }
        builder
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn home(mut self, home: impl Into<String>) -> Self {
        self.home = home.into();
        self
    }

    /// Loader for every non-`localhost` address. Defaults to
    /// [`ExternalLoader`].
    pub fn external_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.external = Some(Arc::new(loader));
        self
    }

    /// Loader for `localhost`. Defaults to an [`InternalLoader`] over the
    /// registry and bundle.
    pub fn internal_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.internal = Some(Arc::new(loader));
        self
    }

    /// Share an existing registry.
    pub fn registry(mut self, registry: Arc<RouteRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Share an existing image cache.
    pub fn image_cache(mut self, images: Arc<ImageCache>) -> Self {
        self.images = Some(images);
        self
    }

    /// Resources served to the default internal loader.
    pub fn bundle(mut self, bundle: impl ResourceBundle + 'static) -> Self {
        self.bundle = Some(Arc::new(bundle));
        self
    }

    pub fn register_package(mut self, locator: impl Into<String>, package: PagePackage) -> Self {
        self.targets.push((locator.into(), Box::new(package)));
        self
    }

    pub fn register_packages<L: Into<String>>(
        mut self,
        packages: impl IntoIterator<Item = (L, PagePackage)>,
    ) -> Self {
        for (locator, package) in packages {
            self = self.register_package(locator, package);
        }
        self
    }

    /// Register a route manifest directory. Its locator is the directory
    /// path.
    pub fn register_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let locator = dir.display().to_string();
        self.targets.push((locator, Box::new(ManifestDir::new(dir))));
        self
    }

    /// Build the navigator. Fails only if the home address does not parse.
    pub fn build<S: DisplaySurface>(self, surface: S) -> Result<Navigator<S>> {
        let home = Address::parse(&self.home)?;
        let registry = self.registry.unwrap_or_default();
        for (locator, source) in self.targets {
            registry.register_boxed(locator, BindingKind::URL, source);
        }
        let internal: Arc<dyn ResourceLoader> = match self.internal {
            Some(loader) => loader,
            None => {
                let bundle: Arc<dyn ResourceBundle> = match self.bundle {
                    Some(bundle) => bundle,
                    None => Arc::new(MemoryBundle::new()),
                };
                Arc::new(InternalLoader::new(Arc::clone(&registry), bundle))
            },
        };
        let external: Arc<dyn ResourceLoader> = match self.external {
            Some(loader) => loader,
            None => Arc::new(ExternalLoader::default()),
        };

        log::debug!(
            "built navigator: home {home}, internal {}, external {}",
            internal.name(),
            external.name()
        );
        Ok(Navigator::new(
            NavigatorParts {
                title: self.title,
                home,
                internal,
                external,
                registry,
                images: self.images.unwrap_or_default(),
            },
            surface,
        ))
    }
}
