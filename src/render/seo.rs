use super::escape_html;
use crate::registry::MetadataRegistry;
use std::fmt::Write;

/// Paths crawlers are asked to stay out of
pub const DISALLOWED_PATHS: &[&str] = &["/admin/", "/account", "/search"];

/// `sitemap.xml` with one `<url>` per registry entry
pub fn sitemap(registry: &MetadataRegistry, origin: &str) -> String {
    let origin = origin.trim_end_matches('/');
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for page in registry.iter() {
        let _ = write!(
            xml,
            concat!(
                "  <url>\n",
                "    <loc>{}</loc>\n",
                "    <lastmod>{}</lastmod>\n",
                "    <changefreq>{}</changefreq>\n",
                "    <priority>{}</priority>\n",
                "  </url>\n"
            ),
            escape_html(&format!("{}{}", origin, page.path)),
            page.last_modified.format("%Y-%m-%d"),
            page.change_freq,
            format_priority(page.priority)
        );
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Authored precision without float noise: `0.25` -> `0.25`, `1.0` -> `1.0`
fn format_priority(priority: f32) -> String {
    let fixed = format!("{:.3}", priority);
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Fixed crawl policy
pub fn robots_txt(origin: &str) -> String {
    let mut txt = String::from("User-agent: *\nAllow: /\n");
    for path in DISALLOWED_PATHS {
        let _ = writeln!(txt, "Disallow: {}", path);
    }
    let _ = writeln!(txt, "\nSitemap: {}/sitemap.xml", origin.trim_end_matches('/'));
    txt.push_str("Crawl-delay: 1\n");
    txt
}
