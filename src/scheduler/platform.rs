//! Browser-facing seams of the scheduler.
//!
//! The scheduler never touches a DOM directly. It reads the page through
//! [`PageContext`] and a [`LinkSource`], and registers interest in link
//! visibility and pointer intent through [`ViewportWatcher`] and
//! [`PointerIntentSource`]. Hosts deliver the resulting events back through
//! `Scheduler::viewport_entered`, `pointer_enter` and `pointer_leave`.

use crate::error::Result;
use scraper::{Html, Selector};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use url::Url;

/// What the scheduler knows about the current page
#[derive(Debug, Clone)]
pub struct PageContext {
    location: Url,
    referrer: Option<String>,
    user_agent: String,
}

impl PageContext {
    pub fn new(location: &str) -> Result<Self> {
        Ok(Self {
            location: Url::parse(location)?,
            referrer: None,
            user_agent: String::new(),
        })
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        let referrer = referrer.into();
        self.referrer = if referrer.is_empty() {
            None
        } else {
            Some(referrer)
        };
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn path(&self) -> &str {
        self.location.path()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Resolve an href against the page, dropping the fragment.
    /// Only http(s) targets are resolvable.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        let mut url = self.location.join(href).ok()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }
        url.set_fragment(None);
        Some(url)
    }

    /// Resolve an href and keep it only if it shares the page's origin
    pub fn same_origin(&self, href: &str) -> Option<Url> {
        self.resolve(href)
            .filter(|url| url.origin() == self.location.origin())
    }

    /// True when the visitor arrived from another site
    pub fn has_external_referrer(&self) -> bool {
        match &self.referrer {
            Some(referrer) => match Url::parse(referrer) {
                Ok(url) => url.origin() != self.location.origin(),
                Err(_) => false,
            },
            None => false,
        }
    }
}

/// Anchors currently present in the document
pub trait LinkSource {
    fn anchors(&self) -> Vec<String>;
}

impl LinkSource for Vec<String> {
    fn anchors(&self) -> Vec<String> {
        self.clone()
    }
}

/// Link source backed by a parsed HTML document
#[derive(Debug, Clone, Default)]
pub struct HtmlDocument {
    hrefs: Vec<String>,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        let doc = Html::parse_document(html);

        // Static selector, always parses
        let hrefs = match Selector::parse("a[href]") {
            Ok(selector) => doc
                .select(&selector)
                .filter_map(|e| e.value().attr("href"))
                .map(|s| s.to_string())
                .collect(),
            Err(_) => Vec::new(),
        };

        ::log::debug!("Document contains {} anchors", hrefs.len());
        Self { hrefs }
    }
}

impl LinkSource for HtmlDocument {
    fn anchors(&self) -> Vec<String> {
        self.hrefs.clone()
    }
}

/// Reports when observed links come within `root_margin_px` of the viewport
pub trait ViewportWatcher {
    fn observe(&mut self, targets: &[Url], root_margin_px: u32);
    fn disconnect(&mut self);
}

/// Reports pointer enter/leave on the registered links
pub trait PointerIntentSource {
    fn listen(&mut self, targets: &[Url]);
    fn detach(&mut self);
}

/// Platform stand-in for hosts without a DOM; registers nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPlatform;

impl ViewportWatcher for NoopPlatform {
    fn observe(&mut self, _targets: &[Url], _root_margin_px: u32) {}
    fn disconnect(&mut self) {}
}

impl PointerIntentSource for NoopPlatform {
    fn listen(&mut self, _targets: &[Url]) {}
    fn detach(&mut self) {}
}

#[derive(Debug, Default)]
struct Registrations {
    observed: BTreeSet<String>,
    hover_targets: BTreeSet<String>,
    root_margin_px: u32,
    connected: bool,
}

/// Keeps track of what the scheduler registered, so a host (or a test) can
/// decide which events to deliver. Clones share the same registrations.
#[derive(Debug, Clone, Default)]
pub struct TrackedTargets {
    inner: Rc<RefCell<Registrations>>,
}

impl TrackedTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observed(&self) -> Vec<String> {
        self.inner.borrow().observed.iter().cloned().collect()
    }

    pub fn hover_targets(&self) -> Vec<String> {
        self.inner.borrow().hover_targets.iter().cloned().collect()
    }

    pub fn root_margin_px(&self) -> u32 {
        self.inner.borrow().root_margin_px
    }

    pub fn is_connected(&self) -> bool {
        self.inner.borrow().connected
    }
}

impl ViewportWatcher for TrackedTargets {
    fn observe(&mut self, targets: &[Url], root_margin_px: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.observed.extend(targets.iter().map(Url::to_string));
        inner.root_margin_px = root_margin_px;
        inner.connected = true;
    }

    fn disconnect(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.observed.clear();
        inner.connected = false;
    }
}

impl PointerIntentSource for TrackedTargets {
    fn listen(&mut self, targets: &[Url]) {
        self.inner
            .borrow_mut()
            .hover_targets
            .extend(targets.iter().map(Url::to_string));
    }

    fn detach(&mut self) {
        self.inner.borrow_mut().hover_targets.clear();
    }
}
