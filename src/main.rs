use chrono::Utc;
use clap::Parser;
use site_prerender::config::ConfigFile;
use site_prerender::emit::{BuildTimeEmitter, DirectorySink};
use site_prerender::scheduler::Scheduler;
use site_prerender::scheduler::hint::HeadLinks;
use site_prerender::scheduler::platform::{HtmlDocument, PageContext, TrackedTargets};
use site_prerender::{MetadataRegistry, classify, render, robots_txt, sitemap};
use std::error::Error;
use std::time::Duration;

mod args;
use args::{Args, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigFile::from_file(path)?,
        None => {
            let mut config = ConfigFile::default();
            config.site.apply_env();
            config
        }
    };
    let registry = match &args.registry {
        Some(path) => MetadataRegistry::from_file(path)?,
        None => MetadataRegistry::builtin(),
    };
    ::log::debug!("Loaded {} routes for {}", registry.len(), config.site.origin);

    match args.command {
        Command::Build { out_dir } => {
            let start_time = std::time::Instant::now();
            let mut sink = DirectorySink::new(&out_dir)?;
            let report = BuildTimeEmitter::new(&registry, &config.site, Utc::now()).emit(&mut sink);

            for collision in &report.collisions {
                println!(
                    "warning: {} and {} both emit {}",
                    collision.first_path, collision.second_path, collision.file_name
                );
            }
            println!(
                "Emitted {} files to {} in {:.2} seconds",
                report.emitted.len(),
                out_dir.display(),
                start_time.elapsed().as_secs_f64()
            );
            if !report.is_success() {
                for (file, message) in &report.failed {
                    ::log::error!("{}: {}", file, message);
                }
                return Err(format!("{} files failed to emit", report.failed.len()).into());
            }
        }
        Command::Render { path } => {
            print!("{}", render(&path, &registry, &config.site, Utc::now()));
        }
        Command::Sitemap => print!("{}", sitemap(&registry, &config.site.origin)),
        Command::Robots => print!("{}", robots_txt(&config.site.origin)),
        Command::Classify { user_agent } => {
            let result = classify(&user_agent);
            println!("category: {:?}", result.category);
            println!("social:   {}", result.is_social_bot());
            if let Some(pattern) = result.matched_pattern {
                println!("pattern:  {}", pattern);
            }
        }
        Command::Preload {
            html,
            path,
            referrer,
            visible,
            hover,
        } => {
            let document = HtmlDocument::parse(&std::fs::read_to_string(&html)?);
            let mut page = PageContext::new(&config.site.absolute(&path))?;
            if let Some(referrer) = referrer {
                page = page.with_referrer(referrer);
            }

            let local = tokio::task::LocalSet::new();
            let head = local
                .run_until(simulate_visit(config, registry, page, document, visible, hover))
                .await;
            println!("{}", head.render());
        }
    }

    Ok(())
}

/// Drive one page visit through the scheduler and return the written hints
async fn simulate_visit(
    config: ConfigFile,
    registry: MetadataRegistry,
    page: PageContext,
    document: HtmlDocument,
    visible: Vec<String>,
    hover: Vec<String>,
) -> HeadLinks {
    let head = HeadLinks::new();
    let tracked = TrackedTargets::new();
    let settle_time = Duration::from_millis(
        config.preload.delay_ms + config.preload.drain_yield_ms * 10 + 500,
    );
    let idle = Duration::from_millis(config.preload.idle_fallback_ms + 1);

    let scheduler = Scheduler::builder(page.clone(), head.clone())
        .with_config(config.preload)
        .with_site(config.site)
        .with_registry(registry)
        .with_links(document)
        .with_viewport_watcher(tracked.clone())
        .with_pointer_source(tracked.clone())
        .create();

    scheduler.initialize();
    tokio::time::sleep(idle).await;

    let observed = tracked.observed();
    for href in &visible {
        match page.same_origin(href) {
            Some(url) if observed.contains(&url.to_string()) => scheduler.viewport_entered(href),
            _ => ::log::warn!("{} is not an observed link", href),
        }
    }
    for href in &hover {
        scheduler.pointer_enter(href);
    }

    tokio::time::sleep(settle_time).await;
    ::log::info!("Scheduler stats: {:?}", scheduler.stats());
    scheduler.destroy();
    head
}
