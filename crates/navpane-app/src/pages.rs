//! Demo pages and bundled assets served under `localhost`.

use navpane_core::{BoundPage, Page, PagePackage};
use navpane_loader::MemoryBundle;
use navpane_markup::escape;
use navpane_types::Params;

pub const DEMO_PACKAGE: &str = "navpane.demo";

#[derive(Default)]
pub struct Index;

impl Page for Index {
    fn produce_markup(&self, _params: &Params) -> String {
        "<html><head><title>navpane</title>\
         <meta charset=\"utf-8\"><script>console.log('never runs')</script></head>\
         <body><h1>navpane demo</h1>\
         <p><img src=\"/img/logo.png\"></p>\
         <p><a href=\"greet.html\">Say hello</a></p>\
         <p><a href=\"/about.html#top\">About</a></p>\
         <p><a href=\"missing.html\">A page nobody bound</a></p>\
         <p><a href=\"https://www.rust-lang.org/\">rust-lang.org</a></p>\
         </body></html>"
            .to_string()
    }
}

impl BoundPage for Index {
    const BINDING: &'static str = "/index.html";
}

#[derive(Default)]
pub struct Greet;

impl Page for Greet {
    fn produce_markup(&self, params: &Params) -> String {
        let greeting = match params.get("name").map(|n| n.trim()) {
            Some(name) if !name.is_empty() => format!("<h1>Hello, {}!</h1>", escape(name)),
            _ => "<h1>Hello!</h1>".to_string(),
        };
        format!(
            "{greeting}\
             <form action=\"greet.html\" method=\"post\">\
             <input type=\"text\" name=\"name\"><input type=\"submit\" value=\"Greet\">\
             </form>\
             <p><a href=\"index.html\">Back</a></p>"
        )
    }
}

impl BoundPage for Greet {
    const BINDING: &'static str = "/greet.html";
}

#[derive(Default)]
pub struct About;

impl Page for About {
    fn produce_markup(&self, _params: &Params) -> String {
        "<h1 id=\"top\">About</h1>\
         <p>Local links are served by page handlers, everything else is fetched \
         over HTTP. Images under <b>/img</b> come from the application bundle.</p>\
         <p><img src=\"/img/missing.png\"></p>\
         <p><a href=\"/index.html\">Home</a></p>"
            .to_string()
    }
}

impl BoundPage for About {
    const BINDING: &'static str = "/about.html";
}

pub fn package() -> PagePackage {
    PagePackage::new()
        .page::<Index>()
        .page::<Greet>()
        .page::<About>()
}

/// Bundle holding the demo logo.
pub fn bundle() -> anyhow::Result<MemoryBundle> {
    let mut bundle = MemoryBundle::new();
    bundle.insert("/img/logo.png", logo_png(32, 16)?)?;
    Ok(bundle)
}

/// A small horizontal gradient encoded as PNG.
fn logo_png(width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..height {
        for x in 0..width {
            let shade = (x * 255 / width.max(1)) as u8;
            rgba.extend_from_slice(&[shade, 64, 255 - shade, 255]);
        }
    }
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&rgba)?;
    }
    Ok(out)
}
