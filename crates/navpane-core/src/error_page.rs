//! Markup shown in place of a document that could not be produced.

use navpane_markup::push_escaped;
use navpane_types::NavError;

/// `<h1>ERROR</h1>`, the error message as `<h2>`, then one `<div>` per
/// underlying cause. All text is escaped.
pub fn error_markup(err: &NavError) -> String {
    let chain = err.chain();
    let mut html = String::from("<h1>ERROR</h1>");
    if let Some((message, causes)) = chain.split_first() {
        if !message.trim().is_empty() {
            html.push_str("<h2>");
            push_escaped(&mut html, message);
            html.push_str("</h2>");
        }
        for cause in causes {
            html.push_str("<div>");
            push_escaped(&mut html, cause);
            html.push_str("</div>");
        }
    }
    html
}
