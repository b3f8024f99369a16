//! Runtime preload/prefetch scheduler.
//!
//! Resource hints are issued from three independent triggers (links entering
//! the viewport, hover intent and explicit calls) through one bounded FIFO.
//! All state lives on a single thread: the scheduler must be driven from a
//! tokio current-thread runtime inside a [`tokio::task::LocalSet`], and no
//! `RefCell` borrow is ever held across an `.await`.

pub mod hint;
pub mod platform;
pub mod queue;

#[cfg(test)]
mod tests;

use crate::config::{PreloadConfig, SiteConfig};
use crate::registry::MetadataRegistry;
use hint::{Hint, HintDispatcher, ResourceKind};
use platform::{LinkSource, NoopPlatform, PageContext, PointerIntentSource, ViewportWatcher};
use queue::{PreloadQueue, PreloadTask, QueueStats, TriggerOrigin};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// SEO resources hinted synchronously at init, outside the bounded queue
pub const CRITICAL_RESOURCES: &[&str] = &["/sitemap.xml", "/robots.txt", "/rss.xml", "/manifest.json"];

/// Registry routes at or above this priority are prefetched once idle
pub const ROUTE_PREFETCH_PRIORITY: f32 = 0.8;

struct SchedulerState {
    queue: PreloadQueue,
    hover_timers: HashMap<String, JoinHandle<()>>,
    idle_task: Option<JoinHandle<()>>,
    observing: bool,
    destroyed: bool,
}

struct Inner {
    config: PreloadConfig,
    site: SiteConfig,
    page: PageContext,
    registry: Option<MetadataRegistry>,
    dispatcher: Rc<dyn HintDispatcher>,
    links: Box<dyn LinkSource>,
    watcher: RefCell<Box<dyn ViewportWatcher>>,
    pointer: RefCell<Box<dyn PointerIntentSource>>,
    state: RefCell<SchedulerState>,
}

/// Builder for configuring a [`Scheduler`]
pub struct SchedulerBuilder {
    config: PreloadConfig,
    site: SiteConfig,
    page: PageContext,
    registry: Option<MetadataRegistry>,
    dispatcher: Rc<dyn HintDispatcher>,
    links: Box<dyn LinkSource>,
    watcher: Box<dyn ViewportWatcher>,
    pointer: Box<dyn PointerIntentSource>,
}

impl SchedulerBuilder {
    pub fn with_config(mut self, config: PreloadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_site(mut self, site: SiteConfig) -> Self {
        self.site = site;
        self
    }

    /// Registry used for route-aware prefetching
    pub fn with_registry(mut self, registry: MetadataRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_links(mut self, links: impl LinkSource + 'static) -> Self {
        self.links = Box::new(links);
        self
    }

    pub fn with_viewport_watcher(mut self, watcher: impl ViewportWatcher + 'static) -> Self {
        self.watcher = Box::new(watcher);
        self
    }

    pub fn with_pointer_source(mut self, pointer: impl PointerIntentSource + 'static) -> Self {
        self.pointer = Box::new(pointer);
        self
    }

    pub fn create(self) -> Scheduler {
        ::log::debug!(
            "Creating preload scheduler for {} (ceiling {})",
            self.page.location(),
            self.config.max_concurrent_preloads
        );
        let state = SchedulerState {
            queue: PreloadQueue::new(self.config.max_concurrent_preloads),
            hover_timers: HashMap::new(),
            idle_task: None,
            observing: false,
            destroyed: false,
        };
        Scheduler {
            inner: Rc::new(Inner {
                config: self.config,
                site: self.site,
                page: self.page,
                registry: self.registry,
                dispatcher: self.dispatcher,
                links: self.links,
                watcher: RefCell::new(self.watcher),
                pointer: RefCell::new(self.pointer),
                state: RefCell::new(state),
            }),
        }
    }
}

/// Handle to the page-lifetime scheduler. Clones share the same state.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

impl Scheduler {
    pub fn builder(page: PageContext, dispatcher: impl HintDispatcher + 'static) -> SchedulerBuilder {
        SchedulerBuilder {
            config: PreloadConfig::default(),
            site: SiteConfig::default(),
            page,
            registry: None,
            dispatcher: Rc::new(dispatcher),
            links: Box::new(Vec::new()),
            watcher: Box::new(NoopPlatform),
            pointer: Box::new(NoopPlatform),
        }
    }

    /// Issue critical hints now and defer link observation until idle
    pub fn initialize(&self) {
        let config = &self.inner.config;
        ::log::info!("Initializing preload scheduler for {}", self.inner.page.path());

        for path in CRITICAL_RESOURCES {
            self.issue_direct(path, None);
        }

        let page = &self.inner.page;
        if page.path() == "/" || page.has_external_referrer() {
            ::log::debug!("Landing visit, preloading hero assets");
            for asset in &self.inner.site.hero_assets {
                self.issue_direct(asset, None);
            }
            let fonts = self.inner.site.font_stylesheet.clone();
            if !fonts.is_empty() {
                self.issue_direct(&fonts, Some(ResourceKind::Style));
            }
        }

        let this = self.clone();
        let idle = Duration::from_millis(config.idle_fallback_ms);
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(idle).await;
            this.on_idle();
        });
        self.inner.state.borrow_mut().idle_task = Some(handle);
    }

    fn on_idle(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            state.idle_task = None;
            if state.destroyed {
                return;
            }
        }
        self.observe_links();
        if self.inner.config.prioritize_seo_routes {
            self.prefetch_priority_routes();
        }
    }

    /// Register every same-origin anchor with the viewport watcher and the
    /// pointer source. No anchors means nothing is registered.
    pub fn observe_links(&self) {
        let config = &self.inner.config;
        if !config.enable_intersection_observer && !config.prefetch_on_hover {
            return;
        }

        let mut targets: Vec<Url> = self
            .inner
            .links
            .anchors()
            .iter()
            .filter_map(|href| self.inner.page.same_origin(href))
            .collect();
        targets.sort();
        targets.dedup();

        if targets.is_empty() {
            ::log::debug!("No same-origin links to observe");
            return;
        }

        {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.observing = config.enable_intersection_observer;
        }

        if config.enable_intersection_observer {
            self.inner
                .watcher
                .borrow_mut()
                .observe(&targets, config.root_margin_px);
        }
        if config.prefetch_on_hover {
            self.inner.pointer.borrow_mut().listen(&targets);
        }
        ::log::info!("Observing {} same-origin links", targets.len());
    }

    fn prefetch_priority_routes(&self) {
        let Some(registry) = &self.inner.registry else {
            return;
        };
        let current = self.inner.page.path();
        let mut routes: Vec<_> = registry
            .iter()
            .filter(|p| p.priority >= ROUTE_PREFETCH_PRIORITY && p.path != current)
            .collect();
        // Stable sort keeps path order among equal priorities
        routes.sort_by(|a, b| b.priority.total_cmp(&a.priority));

        for route in routes {
            self.request(&route.path, TriggerOrigin::Explicit);
        }
    }

    /// Explicitly request a URL (absolute or page-relative)
    pub fn enqueue(&self, url: &str) {
        self.request(url, TriggerOrigin::Explicit);
    }

    /// Viewport event: an observed link came within the root margin
    pub fn viewport_entered(&self, href: &str) {
        if !self.inner.state.borrow().observing {
            return;
        }
        if let Some(url) = self.inner.page.same_origin(href) {
            self.request(url.as_str(), TriggerOrigin::Viewport);
        }
    }

    /// Pointer entered a link: (re)start its debounce timer
    pub fn pointer_enter(&self, href: &str) {
        if !self.inner.config.prefetch_on_hover {
            return;
        }
        let Some(url) = self.inner.page.same_origin(href) else {
            return;
        };
        let key = url.to_string();

        let mut state = self.inner.state.borrow_mut();
        if state.destroyed || state.queue.is_known(&key) {
            return;
        }
        if let Some(previous) = state.hover_timers.remove(&key) {
            previous.abort();
        }

        let this = self.clone();
        let delay = Duration::from_millis(self.inner.config.delay_ms);
        let fired = key.clone();
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            this.hover_fired(&fired);
        });
        ::log::trace!("Hover intent started for {}", key);
        state.hover_timers.insert(key, handle);
    }

    /// Pointer left a link before its debounce fired: cancel it
    pub fn pointer_leave(&self, href: &str) {
        let Some(url) = self.inner.page.same_origin(href) else {
            return;
        };
        if let Some(timer) = self.inner.state.borrow_mut().hover_timers.remove(url.as_str()) {
            ::log::trace!("Hover intent cancelled for {}", url);
            timer.abort();
        }
    }

    fn hover_fired(&self, key: &str) {
        self.inner.state.borrow_mut().hover_timers.remove(key);
        self.request(key, TriggerOrigin::Hover);
    }

    fn request(&self, href: &str, origin: TriggerOrigin) {
        let Some(url) = self.inner.page.resolve(href) else {
            ::log::warn!("Ignoring unresolvable preload URL: {}", href);
            return;
        };
        let added = {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state
                .queue
                .push(url.as_str(), ResourceKind::from_url(&url), origin)
        };
        if added {
            ::log::debug!("Queued {} ({:?})", url, origin);
            self.drain();
        } else {
            ::log::trace!("Already requested: {}", url);
        }
    }

    /// Dispatch queued tasks while concurrency slots are free
    pub fn drain(&self) {
        loop {
            let task = {
                let mut state = self.inner.state.borrow_mut();
                if state.destroyed {
                    return;
                }
                match state.queue.start_next() {
                    Some(task) => task,
                    None => return,
                }
            };

            let url = match Url::parse(&task.url) {
                Ok(url) => url,
                Err(e) => {
                    ::log::warn!("Dropping malformed queued URL {}: {}", task.url, e);
                    self.inner.state.borrow_mut().queue.finish(&task.url, false);
                    continue;
                }
            };
            let hint = Hint::with_kind(&url, task.kind);
            ::log::debug!("Dispatching {}", hint.to_link_tag());
            let settle = self.inner.dispatcher.dispatch(&hint);

            let this = self.clone();
            let pause = Duration::from_millis(self.inner.config.drain_yield_ms);
            tokio::task::spawn_local(async move {
                let result = settle.await;
                this.settle(&task.url, result);
                tokio::time::sleep(pause).await;
                this.drain();
            });
        }
    }

    fn settle(&self, url: &str, result: crate::error::Result<()>) {
        let ok = match result {
            Ok(()) => true,
            Err(e) => {
                ::log::warn!("Preload failed for {}: {}", url, e);
                false
            }
        };
        self.inner.state.borrow_mut().queue.finish(url, ok);
    }

    /// Dispatch immediately, bypassing the bounded queue
    fn issue_direct(&self, href: &str, kind: Option<ResourceKind>) {
        let Some(url) = self.inner.page.resolve(href) else {
            ::log::warn!("Ignoring unresolvable critical resource: {}", href);
            return;
        };
        let kind = kind.unwrap_or_else(|| ResourceKind::from_url(&url));
        if !self
            .inner
            .state
            .borrow_mut()
            .queue
            .register_direct(url.as_str(), kind)
        {
            return;
        }

        // Critical resources are always preloads, never page prefetches
        let kind = if kind == ResourceKind::Document {
            ResourceKind::Fetch
        } else {
            kind
        };
        let hint = Hint::with_kind(&url, kind);
        let settle = self.inner.dispatcher.dispatch(&hint);
        let this = self.clone();
        let key = url.to_string();
        tokio::task::spawn_local(async move {
            let result = settle.await;
            this.settle(&key, result);
        });
    }

    pub fn stats(&self) -> QueueStats {
        self.inner.state.borrow().queue.stats()
    }

    /// Whether `url` has ever been requested during this scheduler's lifetime
    pub fn is_requested(&self, href: &str) -> bool {
        match self.inner.page.resolve(href) {
            Some(url) => self.inner.state.borrow().queue.is_known(url.as_str()),
            None => false,
        }
    }

    /// Snapshot of the task recorded for `href`
    pub fn task(&self, href: &str) -> Option<PreloadTask> {
        let url = self.inner.page.resolve(href)?;
        self.inner.state.borrow().queue.task(url.as_str()).cloned()
    }

    pub fn pending_hover_timers(&self) -> usize {
        self.inner.state.borrow().hover_timers.len()
    }

    /// Stop observing, cancel hover timers and ignore further triggers.
    /// Hints already dispatched run to completion.
    pub fn destroy(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.observing = false;
            for (_, timer) in state.hover_timers.drain() {
                timer.abort();
            }
            if let Some(idle) = state.idle_task.take() {
                idle.abort();
            }
        }
        self.inner.watcher.borrow_mut().disconnect();
        self.inner.pointer.borrow_mut().detach();
        ::log::info!("Preload scheduler destroyed");
    }
}
