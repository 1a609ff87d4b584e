//! On-disk route manifests.
//!
//! A manifest directory holds a `routes.toml` and the markup files it
//! names:
//!
//! ```toml
//! [[page]]
//! path = "/about.html"
//! file = "about.html"
//! ```
//!
//! Each page serves its file with `{{name}}` placeholders replaced by the
//! HTML-escaped request parameter of that name (empty when absent).

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use navpane_types::{NavError, Params, Result};

use crate::page::{Page, PageFactory, RouteBinding};
use crate::source::HandlerSource;

/// File name of the manifest inside a manifest directory.
pub const MANIFEST_FILE: &str = "routes.toml";

/// One `[[page]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub file: PathBuf,
}

/// Parse manifest text into its entries.
pub fn parse_manifest(toml_str: &str) -> Result<Vec<ManifestEntry>> {
    #[derive(Deserialize)]
    struct ManifestFile {
        #[serde(default)]
        page: Vec<ManifestEntry>,
    }

    let file: ManifestFile = toml::from_str(toml_str)
        .map_err(|e| NavError::Config(format!("{MANIFEST_FILE}: {e}")))?;
    Ok(file.page)
}

/// A directory scanned for a route manifest.
#[derive(Debug, Clone)]
pub struct ManifestDir {
    root: PathBuf,
}

impl ManifestDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl HandlerSource for ManifestDir {
    fn scan(&self) -> Result<Vec<RouteBinding>> {
        let text = std::fs::read_to_string(self.root.join(MANIFEST_FILE))?;
        let entries = parse_manifest(&text)?;

        let mut bindings = Vec::with_capacity(entries.len());
        for entry in entries {
            if !is_contained(&entry.file) {
                return Err(NavError::Config(format!(
                    "{MANIFEST_FILE}: file `{}` escapes the manifest directory",
                    entry.file.display()
                )));
            }
            let template: Arc<str> = std::fs::read_to_string(self.root.join(&entry.file))?.into();
            log::debug!("manifest {} binds {}", self.root.display(), entry.path);
            let factory: PageFactory = Arc::new(move || {
                Box::new(TemplatePage {
                    template: Arc::clone(&template),
                }) as Box<dyn Page>
            });
            bindings.push(RouteBinding::new(entry.path, factory));
        }
        Ok(bindings)
    }
}

/// Relative path made only of normal components.
fn is_contained(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
        && path.components().next().is_some()
}

/// A page serving a markup template.
struct TemplatePage {
    template: Arc<str>,
}

impl Page for TemplatePage {
    fn produce_markup(&self, params: &Params) -> String {
        substitute(&self.template, params)
    }
}

/// Replace `{{name}}` with the escaped parameter value. An unclosed `{{` is
/// copied through.
fn substitute(template: &str, params: &Params) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = after[..close].trim();
        if let Some(value) = params.get(name) {
            navpane_markup::push_escaped(&mut out, value);
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn parse_manifest_entries() {
        let toml = r#"
[[page]]
path = "/index.html"
file = "index.html"

[[page]]
path = "/about.html"
file = "pages/about.html"
"#;
        let entries = parse_manifest(toml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].path, "/about.html");
        assert_eq!(entries[1].file, PathBuf::from("pages/about.html"));
    }

    #[test]
    fn parse_manifest_empty_and_invalid() {
        assert!(parse_manifest("").unwrap().is_empty());
        let err = parse_manifest("[[page]]\npath = 3").unwrap_err();
        assert!(matches!(err, NavError::Config(ref m) if m.starts_with("routes.toml")));
    }

    #[test]
    fn substitute_placeholders() {
        let p = params(&[("name", "<Ada>")]);
        assert_eq!(substitute("Hi {{ name }}!", &p), "Hi &lt;Ada&gt;!");
        assert_eq!(substitute("{{missing}}x", &p), "x");
        assert_eq!(substitute("open {{name", &p), "open {{name");
        assert_eq!(substitute("no placeholders", &p), "no placeholders");
    }

    #[test]
    fn scan_reads_templates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            "[[page]]\npath = \"/hello.html\"\nfile = \"hello.html\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("hello.html"), "<p>Hello {{who}}</p>").unwrap();

        let bindings = ManifestDir::new(dir.path()).scan().unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].path(), "/hello.html");
        let page = bindings[0].instantiate();
        assert_eq!(
            page.produce_markup(&params(&[("who", "world")])),
            "<p>Hello world</p>"
        );
    }

    #[test]
    fn scan_missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestDir::new(dir.path()).scan().unwrap_err();
        assert!(matches!(err, NavError::Io(_)));
    }

    #[test]
    fn scan_missing_page_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            "[[page]]\npath = \"/x.html\"\nfile = \"x.html\"\n",
        )
        .unwrap();
        assert!(ManifestDir::new(dir.path()).scan().is_err());
    }

    #[test]
    fn scan_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            "[[page]]\npath = \"/x.html\"\nfile = \"../secret.html\"\n",
        )
        .unwrap();
        let err = ManifestDir::new(dir.path()).scan().unwrap_err();
        assert!(err.to_string().contains("escapes"));
    }

    #[test]
    fn containment() {
        assert!(is_contained(Path::new("a/b.html")));
        assert!(!is_contained(Path::new("../a.html")));
        assert!(!is_contained(Path::new("/etc/passwd")));
        assert!(!is_contained(Path::new("")));
    }
}
