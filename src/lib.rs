// Re-export modules
pub mod bot;
pub mod config;
pub mod emit;
pub mod error;
pub mod registry;
pub mod render;
pub mod scheduler;

// Re-export commonly used types for convenience
pub use bot::{BotCategory, BotClassification, BotClassifier, classify};
pub use config::{ConfigFile, PreloadConfig, SiteConfig};
pub use emit::{AssetSink, BuildTimeEmitter, DirectorySink, EmitReport, MemoryBundle};
pub use error::{Error, Result};
pub use registry::{ChangeFreq, MetadataRegistry, PageMetadata};
pub use render::{Renderer, render, robots_txt, sitemap};
pub use scheduler::{Scheduler, SchedulerBuilder};
