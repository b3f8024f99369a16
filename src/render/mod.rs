//! Static document rendering.
//!
//! [`render`] is a pure function of `(path, registry, site, now)`. The build
//! emitter and the runtime [`Renderer`] cache both go through it, so a route
//! renders identically in either place.

pub mod copy;
pub mod seo;

use crate::bot;
use crate::config::SiteConfig;
use crate::registry::{ChangeFreq, MetadataRegistry, PageMetadata};
use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;
use std::fmt::Write;
use url::Url;

pub use seo::{robots_txt, sitemap};

/// Escape text for use in HTML content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Keep inline script content from closing its own `<script>` element
fn escape_script(text: &str) -> String {
    text.replace("</", "<\\/")
}

/// "unknown-path" -> "Unknown Path"
pub fn title_case_segment(segment: &str) -> String {
    segment
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Metadata for a path missing from the registry, modelled on the `/` entry
pub fn fallback_metadata(
    path: &str,
    registry: &MetadataRegistry,
    site: &SiteConfig,
    now: DateTime<Utc>,
) -> PageMetadata {
    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("");
    let name = match title_case_segment(segment) {
        name if name.is_empty() => "Home".to_string(),
        name => name,
    };

    let home = registry.get("/");
    let description = match home {
        Some(home) => format!("{} at {}. {}", name, site.site_name, home.description),
        None => format!("{} at {}.", name, site.site_name),
    };

    PageMetadata {
        path: path.to_string(),
        title: format!("{} | {}", name, site.site_name),
        description,
        keywords: home.map(|h| h.keywords.clone()).unwrap_or_default(),
        priority: 0.5,
        change_freq: ChangeFreq::Monthly,
        last_modified: now.date_naive(),
        structured_data: None,
    }
}

/// Origin of the font stylesheet, for a `preconnect` hint
fn stylesheet_origin(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    Some(url.origin().ascii_serialization())
}

/// Render the full static document for `path`
pub fn render(
    path: &str,
    registry: &MetadataRegistry,
    site: &SiteConfig,
    now: DateTime<Utc>,
) -> String {
    let (meta, known) = match registry.get(path) {
        Some(meta) => (meta.clone(), true),
        None => {
            ::log::debug!("No registry entry for {}, using fallback metadata", path);
            (fallback_metadata(path, registry, site, now), false)
        }
    };

    let title = escape_html(&meta.title);
    let description = escape_html(&meta.description);
    let canonical = escape_html(&site.absolute(&meta.path));
    let og_image = escape_html(&site.absolute(&site.og_image));
    let robots = if known {
        "index, follow, max-image-preview:large"
    } else {
        "noindex, follow"
    };

    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{}</title>", title);
    let _ = writeln!(html, r#"<meta name="description" content="{}">"#, description);
    if !meta.keywords.is_empty() {
        let _ = writeln!(
            html,
            r#"<meta name="keywords" content="{}">"#,
            escape_html(&meta.keywords.join(", "))
        );
    }
    let _ = writeln!(html, r#"<meta name="robots" content="{}">"#, robots);
    let _ = writeln!(html, r#"<link rel="canonical" href="{}">"#, canonical);

    // Open Graph
    let _ = writeln!(html, r#"<meta property="og:type" content="website">"#);
    let _ = writeln!(
        html,
        r#"<meta property="og:site_name" content="{}">"#,
        escape_html(&site.site_name)
    );
    let _ = writeln!(html, r#"<meta property="og:title" content="{}">"#, title);
    let _ = writeln!(html, r#"<meta property="og:description" content="{}">"#, description);
    let _ = writeln!(html, r#"<meta property="og:url" content="{}">"#, canonical);
    let _ = writeln!(html, r#"<meta property="og:image" content="{}">"#, og_image);
    let _ = writeln!(
        html,
        r#"<meta property="og:updated_time" content="{}">"#,
        meta.last_modified.format("%Y-%m-%d")
    );

    // Twitter Card
    let _ = writeln!(html, r#"<meta name="twitter:card" content="summary_large_image">"#);
    let _ = writeln!(
        html,
        r#"<meta name="twitter:site" content="{}">"#,
        escape_html(&site.twitter_handle)
    );
    let _ = writeln!(html, r#"<meta name="twitter:title" content="{}">"#, title);
    let _ = writeln!(html, r#"<meta name="twitter:description" content="{}">"#, description);
    let _ = writeln!(html, r#"<meta name="twitter:image" content="{}">"#, og_image);

    let _ = writeln!(
        html,
        r#"<link rel="preload" href="{}" as="image" fetchpriority="high">"#,
        escape_html(&site.hero_image)
    );

    // Fonts load as print media and swap to all once fetched
    if !site.font_stylesheet.is_empty() {
        let fonts = escape_html(&site.font_stylesheet);
        if let Some(origin) = stylesheet_origin(&site.font_stylesheet) {
            let _ = writeln!(html, r#"<link rel="preconnect" href="{}" crossorigin>"#, origin);
        }
        let _ = writeln!(
            html,
            r#"<link rel="stylesheet" href="{}" media="print" onload="this.media='all'">"#,
            fonts
        );
        let _ = writeln!(
            html,
            r#"<noscript><link rel="stylesheet" href="{}"></noscript>"#,
            fonts
        );
    }

    if let Some(data) = &meta.structured_data {
        match serde_json::to_string(data) {
            Ok(json) => {
                let _ = writeln!(
                    html,
                    r#"<script type="application/ld+json">{}</script>"#,
                    escape_script(&json)
                );
            }
            Err(e) => ::log::warn!("Skipping structured data for {}: {}", path, e),
        }
    }

    let _ = writeln!(html, "<style>{}</style>", copy::CRITICAL_CSS);
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(
        html,
        r#"<div id="root">{}</div>"#,
        copy::root_markup(&meta, registry, site, now.year())
    );
    let _ = writeln!(
        html,
        "<script>{}</script>",
        escape_script(&bot::bootstrap_script(&site.entry_script))
    );
    html.push_str("</body>\n</html>\n");
    html
}

/// Runtime prerender cache: renders each path once per renderer lifetime
pub struct Renderer {
    registry: MetadataRegistry,
    site: SiteConfig,
    now: DateTime<Utc>,
    cache: HashMap<String, String>,
}

impl Renderer {
    pub fn create(registry: MetadataRegistry, site: SiteConfig, now: DateTime<Utc>) -> Self {
        Self {
            registry,
            site,
            now,
            cache: HashMap::new(),
        }
    }

    /// Cached document for `path`, rendering it on first use
    pub fn document(&mut self, path: &str) -> &str {
        let Self {
            registry,
            site,
            now,
            cache,
        } = self;
        cache.entry(path.to_string()).or_insert_with(|| {
            ::log::debug!("Prerender cache miss for {}", path);
            render(path, registry, site, *now)
        })
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains_key(path)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Drop every cached document
    pub fn destroy(&mut self) {
        ::log::debug!("Clearing {} prerendered documents", self.cache.len());
        self.cache.clear();
    }
}
