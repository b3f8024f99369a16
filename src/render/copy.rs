use super::escape_html;
use crate::config::SiteConfig;
use crate::registry::{MetadataRegistry, PageMetadata};
use std::fmt::Write;

/// Above-the-fold styles inlined into every static document
pub const CRITICAL_CSS: &str = "\
*,*::before,*::after{box-sizing:border-box}\
body{margin:0;font-family:Inter,system-ui,-apple-system,'Segoe UI',sans-serif;color:#111;background:#fff;line-height:1.6}\
.site-header{display:flex;align-items:center;justify-content:space-between;padding:1rem 2rem;border-bottom:1px solid #eee}\
.site-header nav a{margin-left:1.25rem;color:#111;text-decoration:none;font-weight:500}\
.brand{font-family:'Playfair Display',Georgia,serif;font-size:1.5rem;font-weight:700;color:#111;text-decoration:none}\
.hero{min-height:60vh;display:flex;flex-direction:column;justify-content:center;padding:4rem 2rem;background:#0d0d0d center/cover no-repeat;color:#fff}\
.hero h1{font-family:'Playfair Display',Georgia,serif;font-size:clamp(2rem,5vw,3.5rem);margin:0 0 1rem}\
.cta{display:inline-block;margin-right:1rem;padding:.75rem 1.5rem;background:#c9a96e;color:#111;text-decoration:none;font-weight:600}\
.section{max-width:1100px;margin:0 auto;padding:3rem 2rem}\
.grid{display:grid;grid-template-columns:repeat(auto-fit,minmax(220px,1fr));gap:1.5rem}\
.site-footer{padding:2rem;text-align:center;color:#666;border-top:1px solid #eee}";

/// Which marketing copy a route gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteCopy {
    Home,
    Models,
    Generic,
}

impl RouteCopy {
    pub fn for_path(path: &str) -> Self {
        if path == "/" {
            RouteCopy::Home
        } else if path == "/models" || path.starts_with("/models/") {
            RouteCopy::Models
        } else {
            RouteCopy::Generic
        }
    }
}

/// Page heading: the title without the trailing `| Brand` part
fn heading(meta: &PageMetadata) -> &str {
    match meta.title.split_once(" | ") {
        Some((head, _)) => head,
        None => &meta.title,
    }
}

/// Contents of `#root`: header, route copy, footer
pub fn root_markup(
    meta: &PageMetadata,
    registry: &MetadataRegistry,
    site: &SiteConfig,
    year: i32,
) -> String {
    let mut out = String::new();
    let name = escape_html(&site.site_name);

    let _ = write!(
        out,
        r#"<header class="site-header"><a class="brand" href="/">{}</a><nav>"#,
        name
    );
    for page in registry.iter().filter(|p| p.path != "/") {
        let _ = write!(
            out,
            r#"<a href="{}">{}</a>"#,
            escape_html(&page.path),
            escape_html(heading(page))
        );
    }
    out.push_str("</nav></header><main>");

    let title = escape_html(heading(meta));
    let description = escape_html(&meta.description);
    match RouteCopy::for_path(&meta.path) {
        RouteCopy::Home => {
            let _ = write!(
                out,
                concat!(
                    r#"<section class="hero" style="background-image:url('{hero}')">"#,
                    "<h1>{title}</h1><p>{description}</p>",
                    r#"<p><a class="cta" href="/models">Discover our models</a>"#,
                    r#"<a class="cta" href="/become-a-model">Become a model</a></p></section>"#,
                    r#"<section class="section"><h2>Why {name}</h2><div class="grid">"#,
                    "<article><h3>Curated talent</h3><p>A selective roster of editorial, commercial and runway models.</p></article>",
                    "<article><h3>Global bookings</h3><p>Campaigns and shows handled end to end by a dedicated booking team.</p></article>",
                    "<article><h3>Career development</h3><p>Long-term guidance from first test shoot to international campaigns.</p></article>",
                    "</div></section>"
                ),
                hero = escape_html(&site.hero_image),
                title = title,
                description = description,
                name = name,
            );
        }
        RouteCopy::Models => {
            let _ = write!(
                out,
                concat!(
                    r#"<section class="section"><h1>{title}</h1><p>{description}</p>"#,
                    r#"<div class="grid">"#,
                    "<article><h3>Editorial</h3><p>Faces for magazines, lookbooks and fashion stories.</p></article>",
                    "<article><h3>Commercial</h3><p>Versatile talent for advertising, e-commerce and brand content.</p></article>",
                    "<article><h3>Runway</h3><p>Experienced models for fashion weeks and live presentations.</p></article>",
                    r#"<article><h3><a href="/models/luxury">Luxury</a></h3><p>Talent for high-end fashion houses and luxury campaigns.</p></article>"#,
                    r#"</div><p><a class="cta" href="/contact">Request a package</a></p></section>"#
                ),
                title = title,
                description = description,
            );
        }
        RouteCopy::Generic => {
            let _ = write!(
                out,
                concat!(
                    r#"<section class="section"><h1>{title}</h1><p>{description}</p>"#,
                    r#"<p><a class="cta" href="/contact">Contact our team</a></p></section>"#
                ),
                title = title,
                description = description,
            );
        }
    }

    let _ = write!(
        out,
        r#"</main><footer class="site-footer"><p>&copy; {} {}. All rights reserved.</p></footer>"#,
        year, name
    );
    out
}
