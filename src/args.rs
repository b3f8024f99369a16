use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-prerender")]
#[command(about = "Prerenders marketing routes and schedules resource hints")]
#[command(version)]
pub struct Args {
    /// JSON configuration file with `site` and `preload` sections
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON metadata registry (defaults to the built-in routes)
    #[arg(short, long, global = true)]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Emit one HTML file per route plus sitemap.xml and robots.txt
    Build {
        /// Output directory
        #[arg(short, long, default_value = "dist")]
        out_dir: PathBuf,
    },

    /// Print the static document for one path
    Render {
        /// Route path, e.g. /models/luxury
        path: String,
    },

    /// Print sitemap.xml
    Sitemap,

    /// Print robots.txt
    Robots,

    /// Classify a user-agent string
    Classify {
        user_agent: String,
    },

    /// Run the preload scheduler over an HTML page and print the hints it writes
    Preload {
        /// HTML document whose anchors are observed
        html: PathBuf,

        /// Path of the page being visited
        #[arg(long, default_value = "/")]
        path: String,

        /// document.referrer of the visit
        #[arg(long)]
        referrer: Option<String>,

        /// Links that scroll into view (comma separated)
        #[arg(long, value_delimiter = ',')]
        visible: Vec<String>,

        /// Links hovered long enough to trigger (comma separated)
        #[arg(long, value_delimiter = ',')]
        hover: Vec<String>,
    },
}
