use crate::error::Result;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use url::Url;

/// Resource kind, mapped onto the `as` attribute of a preload hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Style,
    Script,
    Font,
    Video,
    Fetch,
    Document,
}

impl ResourceKind {
    /// Infer the kind from the extension of the URL path
    pub fn from_url(url: &Url) -> Self {
        let last_segment = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("");

        let extension = match last_segment.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return ResourceKind::Document,
        };

        match extension.as_str() {
            "html" | "htm" => ResourceKind::Document,
            "css" => ResourceKind::Style,
            "js" | "mjs" => ResourceKind::Script,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" | "ico" => {
                ResourceKind::Image
            }
            "woff" | "woff2" => ResourceKind::Font,
            "mp4" | "webm" => ResourceKind::Video,
            "json" | "xml" | "txt" | "rss" | "atom" | "webmanifest" | "csv" | "pdf" | "wasm"
            | "map" => ResourceKind::Fetch,
            // `/guides/v2.0` is still a page
            _ => ResourceKind::Document,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Style => "style",
            ResourceKind::Script => "script",
            ResourceKind::Font => "font",
            ResourceKind::Video => "video",
            ResourceKind::Fetch => "fetch",
            ResourceKind::Document => "document",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintRel {
    Preload,
    Prefetch,
}

/// A `<link rel=preload|prefetch>` instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub url: String,
    pub rel: HintRel,
    pub kind: ResourceKind,
    pub crossorigin: bool,
}

impl Hint {
    /// Page URLs become prefetches, assets become typed preloads
    pub fn for_url(url: &Url) -> Self {
        Self::with_kind(url, ResourceKind::from_url(url))
    }

    pub fn with_kind(url: &Url, kind: ResourceKind) -> Self {
        let rel = if kind == ResourceKind::Document {
            HintRel::Prefetch
        } else {
            HintRel::Preload
        };
        Self {
            url: url.to_string(),
            rel,
            kind,
            crossorigin: kind == ResourceKind::Fetch,
        }
    }

    /// Render as the `<link>` element written into `<head>`
    pub fn to_link_tag(&self) -> String {
        match self.rel {
            HintRel::Prefetch => format!(r#"<link rel="prefetch" href="{}">"#, self.url),
            HintRel::Preload => {
                let crossorigin = if self.crossorigin { " crossorigin" } else { "" };
                format!(
                    r#"<link rel="preload" href="{}" as="{}"{}>"#,
                    self.url,
                    self.kind.as_str(),
                    crossorigin
                )
            }
        }
    }
}

/// Completion of a dispatched hint
pub type Settle = Pin<Box<dyn Future<Output = Result<()>>>>;

/// Writes a hint into the page and resolves once the browser settled it.
///
/// The link element is written synchronously when `dispatch` is called; the
/// returned future completes when the hinted resource loaded or failed.
pub trait HintDispatcher {
    fn dispatch(&self, hint: &Hint) -> Settle;
}

/// Head buffer collecting emitted `<link>` elements in dispatch order
#[derive(Debug, Clone, Default)]
pub struct HeadLinks {
    links: Rc<RefCell<Vec<Hint>>>,
}

impl HeadLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hints(&self) -> Vec<Hint> {
        self.links.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.links.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.borrow().is_empty()
    }

    /// Markup for everything written so far, one element per line
    pub fn render(&self) -> String {
        self.links
            .borrow()
            .iter()
            .map(Hint::to_link_tag)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl HintDispatcher for HeadLinks {
    fn dispatch(&self, hint: &Hint) -> Settle {
        ::log::trace!("Writing hint into head: {}", hint.to_link_tag());
        self.links.borrow_mut().push(hint.clone());
        Box::pin(std::future::ready(Ok(())))
    }
}
