//! Build-time emission of prerendered routes, `sitemap.xml` and `robots.txt`.
//!
//! The emitter hands every file to an [`AssetSink`], the bundler's "add file
//! to output" capability, and never touches the filesystem itself.

use crate::config::SiteConfig;
use crate::error::{Error, Result};
use crate::registry::MetadataRegistry;
use crate::render::{render, robots_txt, sitemap};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// A file added to the build output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    pub file_name: String,
    pub source: String,
}

/// Destination for emitted build assets
pub trait AssetSink {
    fn emit_file(&mut self, asset: EmittedAsset) -> Result<()>;
}

/// In-memory bundle output, keyed by file name
#[derive(Debug, Clone, Default)]
pub struct MemoryBundle {
    files: BTreeMap<String, String>,
    emit_calls: usize,
}

impl MemoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files.get(file_name).map(String::as_str)
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    /// Number of `emit_file` calls, including ones that overwrote a name
    pub fn emit_calls(&self) -> usize {
        self.emit_calls
    }
}

impl AssetSink for MemoryBundle {
    fn emit_file(&mut self, asset: EmittedAsset) -> Result<()> {
        self.emit_calls += 1;
        self.files.insert(asset.file_name, asset.source);
        Ok(())
    }
}

/// Sink writing assets under an output directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    out_dir: PathBuf,
}

impl DirectorySink {
    pub fn new(out_dir: impl AsRef<Path>) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();
        fs::create_dir_all(&out_dir)?;
        Ok(Self { out_dir })
    }
}

impl AssetSink for DirectorySink {
    fn emit_file(&mut self, asset: EmittedAsset) -> Result<()> {
        let target = self.out_dir.join(&asset.file_name);
        fs::write(&target, asset.source)
            .map_err(|e| Error::emit(&asset.file_name, e.to_string()))?;
        ::log::debug!("Wrote {}", target.display());
        Ok(())
    }
}

/// `/` -> `index.html`, `/models/luxury` -> `models-luxury.html`.
///
/// Distinct paths can flatten to the same name (`/a/b` and `/a-b`); the
/// emitter reports such collisions instead of resolving them.
pub fn output_filename(path: &str) -> String {
    if path == "/" {
        return "index.html".to_string();
    }
    let trimmed = path.trim_start_matches('/');
    format!("{}.html", trimmed.replace('/', "-"))
}

/// Two registry paths that map to the same output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameCollision {
    pub file_name: String,
    pub first_path: String,
    pub second_path: String,
}

/// Outcome of one build
#[derive(Debug, Clone, Default)]
pub struct EmitReport {
    /// File names handed to the sink, in emission order
    pub emitted: Vec<String>,
    /// Files the sink rejected, with the error message
    pub failed: Vec<(String, String)>,
    pub collisions: Vec<FilenameCollision>,
}

impl EmitReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives the renderer over every registry entry
pub struct BuildTimeEmitter<'a> {
    registry: &'a MetadataRegistry,
    site: &'a SiteConfig,
    now: DateTime<Utc>,
}

impl<'a> BuildTimeEmitter<'a> {
    pub fn new(registry: &'a MetadataRegistry, site: &'a SiteConfig, now: DateTime<Utc>) -> Self {
        Self {
            registry,
            site,
            now,
        }
    }

    /// Every asset of a build, in emission order
    pub fn assets(&self) -> Vec<EmittedAsset> {
        let mut assets: Vec<EmittedAsset> = self
            .registry
            .iter()
            .map(|page| EmittedAsset {
                file_name: output_filename(&page.path),
                source: render(&page.path, self.registry, self.site, self.now),
            })
            .collect();
        assets.push(EmittedAsset {
            file_name: "sitemap.xml".to_string(),
            source: sitemap(self.registry, &self.site.origin),
        });
        assets.push(EmittedAsset {
            file_name: "robots.txt".to_string(),
            source: robots_txt(&self.site.origin),
        });
        assets
    }

    /// Filename collisions among registry paths
    pub fn collisions(&self) -> Vec<FilenameCollision> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        let mut collisions = Vec::new();
        for page in self.registry.iter() {
            let file_name = output_filename(&page.path);
            match seen.get(&file_name) {
                Some(first) => collisions.push(FilenameCollision {
                    file_name,
                    first_path: first.to_string(),
                    second_path: page.path.clone(),
                }),
                None => {
                    seen.insert(file_name, &page.path);
                }
            }
        }
        collisions
    }

    /// Emit `|registry| + 2` files. A rejected file is logged and recorded;
    /// the remaining files are still emitted.
    pub fn emit(&self, sink: &mut dyn AssetSink) -> EmitReport {
        ::log::info!(
            "Prerendering {} routes for {}",
            self.registry.len(),
            self.site.origin
        );
        let mut report = EmitReport {
            collisions: self.collisions(),
            ..EmitReport::default()
        };
        for collision in &report.collisions {
            ::log::warn!(
                "Routes {} and {} both map to {}; the later one overwrites the earlier",
                collision.first_path,
                collision.second_path,
                collision.file_name
            );
        }

        for asset in self.assets() {
            let file_name = asset.file_name.clone();
            match sink.emit_file(asset) {
                Ok(()) => {
                    ::log::debug!("Emitted {}", file_name);
                    report.emitted.push(file_name);
                }
                Err(e) => {
                    ::log::error!("Failed to emit {}: {}", file_name, e);
                    report.failed.push((file_name, e.to_string()));
                }
            }
        }

        ::log::info!(
            "Build emitted {} files ({} failed)",
            report.emitted.len(),
            report.failed.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ChangeFreq, PageMetadata};
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn page(path: &str) -> PageMetadata {
        PageMetadata {
            path: path.to_string(),
            title: format!("{} | Test", path),
            description: "desc".to_string(),
            keywords: vec![],
            priority: 0.5,
            change_freq: ChangeFreq::Monthly,
            last_modified: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            structured_data: None,
        }
    }

    /// Rejects one file name, accepts everything else
    struct RejectingSink {
        reject: &'static str,
        inner: MemoryBundle,
    }

    impl AssetSink for RejectingSink {
        fn emit_file(&mut self, asset: EmittedAsset) -> Result<()> {
            if asset.file_name == self.reject {
                return Err(Error::emit(&asset.file_name, "disk full"));
            }
            self.inner.emit_file(asset)
        }
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(output_filename("/"), "index.html");
        assert_eq!(output_filename("/about"), "about.html");
        assert_eq!(output_filename("/models/luxury"), "models-luxury.html");
    }

    #[test]
    fn test_emits_registry_plus_two() {
        let registry = MetadataRegistry::builtin();
        let site = SiteConfig::default();
        let emitter = BuildTimeEmitter::new(&registry, &site, now());
        let mut bundle = MemoryBundle::new();

        let report = emitter.emit(&mut bundle);
        assert!(report.is_success());
        assert_eq!(report.emitted.len(), registry.len() + 2);
        assert_eq!(bundle.emit_calls(), registry.len() + 2);
        assert!(bundle.get("index.html").unwrap().contains("<title>Lumen Models"));
        assert!(bundle.get("models-luxury.html").is_some());
        assert!(bundle.get("sitemap.xml").is_some());
        assert!(bundle.get("robots.txt").is_some());
    }

    #[test]
    fn test_failed_file_does_not_abort_build() {
        let registry = MetadataRegistry::builtin();
        let site = SiteConfig::default();
        let emitter = BuildTimeEmitter::new(&registry, &site, now());
        let mut sink = RejectingSink {
            reject: "about.html",
            inner: MemoryBundle::new(),
        };

        let report = emitter.emit(&mut sink);
        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "about.html");
        assert_eq!(report.emitted.len(), registry.len() + 1);
        assert!(sink.inner.get("robots.txt").is_some());
    }

    #[test]
    fn test_collisions_are_reported_not_resolved() {
        let registry = MetadataRegistry::new(vec![page("/a/b"), page("/a-b"), page("/c")]).unwrap();
        let site = SiteConfig::default();
        let emitter = BuildTimeEmitter::new(&registry, &site, now());
        let mut bundle = MemoryBundle::new();

        let report = emitter.emit(&mut bundle);
        assert_eq!(
            report.collisions,
            vec![FilenameCollision {
                file_name: "a-b.html".to_string(),
                first_path: "/a-b".to_string(),
                second_path: "/a/b".to_string(),
            }]
        );
        // Still exactly |registry| + 2 emissions; the sink keeps the last write
        assert_eq!(bundle.emit_calls(), 5);
        assert_eq!(bundle.file_names().len(), 4);
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist");
        let registry = MetadataRegistry::builtin();
        let site = SiteConfig::default();
        let mut sink = DirectorySink::new(&out).unwrap();

        let report = BuildTimeEmitter::new(&registry, &site, now()).emit(&mut sink);
        assert!(report.is_success());
        let robots = std::fs::read_to_string(out.join("robots.txt")).unwrap();
        assert!(robots.contains("Crawl-delay: 1"));
        assert!(out.join("index.html").exists());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), registry.len() + 2);
    }
}
