//! The fixed local proxy origin.
//!
//! Every hyperlink and form action in a rendered document is rewritten to
//! `http://127.0.0.1/?url=<form-encoded original>`, and every image to a
//! cache key under the same origin, so the display surface never sees a
//! remote address.

use navpane_markup::{MarkupTree, TagName};
use navpane_types::Result;
use navpane_types::params::{form_encode, query_value};

/// Origin every rewritten reference points at.
pub const PROXY_ORIGIN: &str = "http://127.0.0.1/";

/// Prefix of a proxied hyperlink.
pub const LINK_PREFIX: &str = "http://127.0.0.1/?url=";

/// Query key carrying the original link.
pub const LINK_KEY: &str = "url";

/// Wrap `href` in the proxy origin. Already-proxied links are returned
/// unchanged.
pub fn proxy_link(href: &str) -> String {
    if href.starts_with(LINK_PREFIX) {
        href.to_string()
    } else {
        format!("{LINK_PREFIX}{}", form_encode(href))
    }
}

/// Recover the original link from the query of a proxied address.
///
/// `Ok(None)` when the query has no `url` parameter.
pub fn link_target(query: &str) -> Result<Option<String>> {
    query_value(query, LINK_KEY)
}

/// Rewrite `attr` on every `tag` element that carries it. Returns the
/// number of attributes rewritten.
fn rewrite_attribute(tree: &mut MarkupTree, tag: &TagName, attr: &str) -> usize {
    let mut rewritten = 0;
    for id in tree.elements_by_tag(tag) {
        if let Some(el) = tree.element_mut(id)
            && let Some(original) = el.get_attribute(attr)
            && !original.starts_with(LINK_PREFIX)
        {
            let proxied = proxy_link(original);
            el.set_attribute(attr, proxied);
            rewritten += 1;
        }
    }
    rewritten
}

/// Proxy every `<a href>`.
pub fn rewrite_links(tree: &mut MarkupTree) -> usize {
    rewrite_attribute(tree, &TagName::A, "href")
}

/// Proxy every `<form action>`.
pub fn rewrite_forms(tree: &mut MarkupTree) -> usize {
    rewrite_attribute(tree, &TagName::Form, "action")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxies_relative_link() {
        assert_eq!(
            proxy_link("/a b.html?x=1&y=2"),
            "http://127.0.0.1/?url=%2Fa+b.html%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn keeps_unreserved_characters() {
        assert_eq!(proxy_link("a.b-c*d_e"), "http://127.0.0.1/?url=a.b-c*d_e");
    }

    #[test]
    fn link_target_reads_url_param() {
        let proxied = proxy_link("https://example.com/?q=rust lang");
        let query = proxied.strip_prefix(PROXY_ORIGIN).unwrap().trim_start_matches('?');
        assert_eq!(
            link_target(query).unwrap().as_deref(),
            Some("https://example.com/?q=rust lang")
        );
        assert_eq!(link_target("other=1").unwrap(), None);
    }

    #[test]
    fn rewrites_links_and_forms() {
        let mut tree = navpane_markup::parse(
            "<a href=\"/x\">x</a><a>no href</a><a href=\"http://127.0.0.1/?url=y\">y</a>\
             <form action=\"/submit\"><input name=q></form>",
        )
        .unwrap();
        assert_eq!(rewrite_links(&mut tree), 1);
        assert_eq!(rewrite_forms(&mut tree), 1);

        let anchors = tree.elements_by_tag(&TagName::A);
        let hrefs: Vec<Option<&str>> = anchors
            .iter()
            .map(|&id| tree.element(id).and_then(|e| e.get_attribute("href")))
            .collect();
        assert_eq!(
            hrefs,
            vec![
                Some("http://127.0.0.1/?url=%2Fx"),
                None,
                Some("http://127.0.0.1/?url=y"),
            ]
        );
        let form = tree.elements_by_tag(&TagName::Form)[0];
        assert_eq!(
            tree.element(form).and_then(|e| e.get_attribute("action")),
            Some("http://127.0.0.1/?url=%2Fsubmit")
        );
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip(href in "\\PC{0,60}") {
                let proxied = proxy_link(&href);
                let query = &proxied[PROXY_ORIGIN.len() + 1..];
                prop_assert_eq!(link_target(query).unwrap(), Some(href));
            }

            #[test]
            fn idempotent(href in "\\PC{0,60}") {
                let once = proxy_link(&href);
                prop_assert_eq!(proxy_link(&once), once);
            }
        }
    }
}
