use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Site-wide settings shared by the renderer, the emitter and the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public origin without trailing slash, e.g. `https://lumenmodels.com`
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Brand name used in titles and Open Graph tags
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Above-the-fold hero image, preloaded by every static document
    #[serde(default = "default_hero_image")]
    pub hero_image: String,

    /// Homepage hero assets preloaded at runtime for landing visits
    #[serde(default = "default_hero_assets")]
    pub hero_assets: Vec<String>,

    /// Web-font stylesheet loaded without blocking render
    #[serde(default = "default_font_stylesheet")]
    pub font_stylesheet: String,

    /// SPA module entry injected for human visitors only
    #[serde(default = "default_entry_script")]
    pub entry_script: String,

    /// Fallback Open Graph image
    #[serde(default = "default_og_image")]
    pub og_image: String,

    /// Twitter handle for Twitter Card attribution
    #[serde(default = "default_twitter_handle")]
    pub twitter_handle: String,
}

/// Options recognized by the preload scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Watch same-origin links entering the viewport
    #[serde(default = "default_true")]
    pub enable_intersection_observer: bool,

    /// Prefetch links after hover intent
    #[serde(default = "default_true")]
    pub prefetch_on_hover: bool,

    /// Prefetch high-priority registry routes once the page is idle
    #[serde(default = "default_true")]
    pub prioritize_seo_routes: bool,

    /// Ceiling on simultaneously in-flight hint dispatches
    #[serde(default = "default_max_concurrent_preloads")]
    pub max_concurrent_preloads: usize,

    /// Hover-intent debounce in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Margin around the viewport that counts as visible
    #[serde(default = "default_root_margin_px")]
    pub root_margin_px: u32,

    /// Pause between a settled hint and the next drain attempt
    #[serde(default = "default_drain_yield_ms")]
    pub drain_yield_ms: u64,

    /// Timer fallback used to defer non-critical setup until idle
    #[serde(default = "default_idle_fallback_ms")]
    pub idle_fallback_ms: u64,
}

/// On-disk configuration file combining both sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub preload: PreloadConfig,
}

impl ConfigFile {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.site.apply_env();
        Ok(config)
    }
}

fn default_origin() -> String {
    "https://lumenmodels.com".to_string()
}

fn default_site_name() -> String {
    "Lumen Models".to_string()
}

fn default_hero_image() -> String {
    "/images/hero-main.webp".to_string()
}

fn default_hero_assets() -> Vec<String> {
    vec![
        "/images/hero-main.webp".to_string(),
        "/images/hero-mobile.webp".to_string(),
    ]
}

fn default_font_stylesheet() -> String {
    "https://fonts.googleapis.com/css2?family=Playfair+Display:wght@400;700&family=Inter:wght@400;500;600&display=swap".to_string()
}

fn default_entry_script() -> String {
    "/assets/main.js".to_string()
}

fn default_og_image() -> String {
    "/images/og-default.jpg".to_string()
}

fn default_twitter_handle() -> String {
    "@lumenmodels".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_preloads() -> usize {
    5
}

fn default_delay_ms() -> u64 {
    200
}

fn default_root_margin_px() -> u32 {
    100
}

fn default_drain_yield_ms() -> u64 {
    100
}

fn default_idle_fallback_ms() -> u64 {
    1
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            site_name: default_site_name(),
            hero_image: default_hero_image(),
            hero_assets: default_hero_assets(),
            font_stylesheet: default_font_stylesheet(),
            entry_script: default_entry_script(),
            og_image: default_og_image(),
            twitter_handle: default_twitter_handle(),
        }
    }
}

impl SiteConfig {
    /// Override the origin with the `SITE_ORIGIN` environment variable if provided
    pub fn apply_env(&mut self) {
        if let Ok(origin) = std::env::var("SITE_ORIGIN") {
            if !origin.is_empty() {
                ::log::debug!("Using SITE_ORIGIN override: {}", origin);
                self.origin = origin;
            }
        }
        self.origin = self.origin.trim_end_matches('/').to_string();
    }

    /// Absolute URL for a site-relative path
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.origin, path)
        }
    }
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            enable_intersection_observer: default_true(),
            prefetch_on_hover: default_true(),
            prioritize_seo_routes: default_true(),
            max_concurrent_preloads: default_max_concurrent_preloads(),
            delay_ms: default_delay_ms(),
            root_margin_px: default_root_margin_px(),
            drain_yield_ms: default_drain_yield_ms(),
            idle_fallback_ms: default_idle_fallback_ms(),
        }
    }
}
