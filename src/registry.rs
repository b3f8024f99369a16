use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How often a route is expected to change, as advertised in the sitemap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SEO metadata for one route of the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Route path, always starting with `/`
    pub path: String,

    /// Document title
    pub title: String,

    /// Meta description
    pub description: String,

    /// Meta keywords (order irrelevant)
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Sitemap priority in `[0, 1]`
    #[serde(default = "default_priority")]
    pub priority: f32,

    /// Sitemap change frequency
    #[serde(default = "default_change_freq")]
    pub change_freq: ChangeFreq,

    /// Last modification date (ISO `YYYY-MM-DD`)
    pub last_modified: NaiveDate,

    /// Optional JSON-LD payload, emitted verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<serde_json::Value>,
}

fn default_priority() -> f32 {
    0.5
}

fn default_change_freq() -> ChangeFreq {
    ChangeFreq::Monthly
}

impl PageMetadata {
    fn validate(&self) -> Result<()> {
        if !self.path.starts_with('/') {
            return Err(Error::registry(&self.path, "path must start with '/'"));
        }
        if !(0.0..=1.0).contains(&self.priority) {
            return Err(Error::registry(
                &self.path,
                format!("priority {} outside [0, 1]", self.priority),
            ));
        }
        Ok(())
    }
}

/// Static mapping of route path to page metadata.
///
/// Entries are kept ordered by path so every consumer (renderer, sitemap,
/// emitter) iterates them in the same order on every run.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    pages: BTreeMap<String, PageMetadata>,
}

impl MetadataRegistry {
    /// Build a registry, rejecting duplicate or malformed paths
    pub fn new(pages: impl IntoIterator<Item = PageMetadata>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for page in pages {
            page.validate()?;
            if map.contains_key(&page.path) {
                return Err(Error::registry(&page.path, "duplicate path"));
            }
            map.insert(page.path.clone(), page);
        }
        ::log::debug!("Metadata registry loaded with {} routes", map.len());
        Ok(Self { pages: map })
    }

    /// Load registry entries from a JSON array
    pub fn from_json(json: &str) -> Result<Self> {
        let pages: Vec<PageMetadata> = serde_json::from_str(json)?;
        Self::new(pages)
    }

    /// Load registry entries from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    pub fn get(&self, path: &str) -> Option<&PageMetadata> {
        self.pages.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.pages.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Entries in path order
    pub fn iter(&self) -> impl Iterator<Item = &PageMetadata> {
        self.pages.values()
    }

    /// The marketing site's own routes
    pub fn builtin() -> Self {
        let date = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d).expect("Built-in route dates should be valid")
        };
        let page = |path: &str,
                    title: &str,
                    description: &str,
                    keywords: &[&str],
                    priority: f32,
                    change_freq: ChangeFreq,
                    last_modified: NaiveDate| PageMetadata {
            path: path.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            priority,
            change_freq,
            last_modified,
            structured_data: None,
        };

        let mut home = page(
            "/",
            "Lumen Models | Premium Model Management",
            "Lumen Models represents editorial, commercial and luxury talent. Discover our models and book your next campaign.",
            &["model agency", "model management", "fashion models", "booking"],
            1.0,
            ChangeFreq::Weekly,
            date(2024, 5, 1),
        );
        home.structured_data = Some(serde_json::json!({
            "@context": "https://schema.org",
            "@type": "Organization",
            "name": "Lumen Models",
            "url": "https://lumenmodels.com",
            "logo": "https://lumenmodels.com/images/logo.png"
        }));

        let pages = vec![
            home,
            page(
                "/models",
                "Our Models | Lumen Models",
                "Browse the full Lumen Models roster across editorial, commercial and runway divisions.",
                &["models", "roster", "editorial models", "runway"],
                0.9,
                ChangeFreq::Daily,
                date(2024, 5, 1),
            ),
            page(
                "/models/luxury",
                "Luxury Division | Lumen Models",
                "Talent for high-end fashion houses, jewellery and luxury lifestyle campaigns.",
                &["luxury models", "high fashion", "campaigns"],
                0.8,
                ChangeFreq::Weekly,
                date(2024, 4, 18),
            ),
            page(
                "/about",
                "About Us | Lumen Models",
                "A boutique agency building long-term careers for models since 2009.",
                &["about", "agency history"],
                0.6,
                ChangeFreq::Monthly,
                date(2024, 1, 12),
            ),
            page(
                "/become-a-model",
                "Become a Model | Lumen Models",
                "Submit your application and start your modelling career with Lumen Models.",
                &["become a model", "model application", "scouting"],
                0.7,
                ChangeFreq::Monthly,
                date(2024, 3, 2),
            ),
            page(
                "/affiliate",
                "Affiliate Program | Lumen Models",
                "Refer talent and clients to Lumen Models and earn commission on every booking.",
                &["affiliate", "referral program"],
                0.5,
                ChangeFreq::Monthly,
                date(2024, 2, 20),
            ),
            page(
                "/contact",
                "Contact | Lumen Models",
                "Get in touch with our booking team for castings, campaigns and partnerships.",
                &["contact", "booking enquiries"],
                0.5,
                ChangeFreq::Yearly,
                date(2023, 11, 30),
            ),
        ];

        // Static table above satisfies every registry invariant.
        Self::new(pages).expect("Built-in registry should be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = MetadataRegistry::builtin();
        assert_eq!(registry.len(), 7);
        assert!(registry.contains("/"));
        assert!(registry.iter().all(|p| p.path.starts_with('/')));
        assert!(registry.get("/").unwrap().structured_data.is_some());
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {
                "path": "/",
                "title": "Home",
                "description": "Welcome",
                "keywords": ["a", "b"],
                "priority": 1.0,
                "changeFreq": "weekly",
                "lastModified": "2024-05-01"
            },
            {
                "path": "/pricing",
                "title": "Pricing",
                "description": "Plans",
                "lastModified": "2024-01-02",
                "structuredData": {"@type": "Product"}
            }
        ]"#;
        let registry = MetadataRegistry::from_json(json).unwrap();
        assert_eq!(registry.len(), 2);

        let pricing = registry.get("/pricing").unwrap();
        assert_eq!(pricing.priority, 0.5);
        assert_eq!(pricing.change_freq, ChangeFreq::Monthly);
        assert!(pricing.keywords.is_empty());
        assert_eq!(
            pricing.last_modified,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_rejects_duplicate_paths() {
        let json = r#"[
            {"path": "/a", "title": "A", "description": "", "lastModified": "2024-01-01"},
            {"path": "/a", "title": "A2", "description": "", "lastModified": "2024-01-01"}
        ]"#;
        let err = MetadataRegistry::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate path"));
    }

    #[test]
    fn test_rejects_relative_path_and_bad_priority() {
        let relative = r#"[{"path": "a", "title": "A", "description": "", "lastModified": "2024-01-01"}]"#;
        assert!(MetadataRegistry::from_json(relative).is_err());

        let priority = r#"[{"path": "/a", "title": "A", "description": "", "priority": 1.5, "lastModified": "2024-01-01"}]"#;
        assert!(MetadataRegistry::from_json(priority).is_err());
    }

    #[test]
    fn test_iteration_is_path_ordered() {
        let registry = MetadataRegistry::builtin();
        let paths: Vec<_> = registry.iter().map(|p| p.path.as_str()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }
}
