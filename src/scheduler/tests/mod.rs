mod queue_tests;

use crate::config::PreloadConfig;
use crate::error::Error;
use crate::scheduler::hint::{Hint, HintDispatcher, Settle};
use crate::scheduler::platform::PageContext;
use crate::scheduler::{CRITICAL_RESOURCES, Scheduler, SchedulerBuilder};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

pub(super) const ORIGIN: &str = "https://lumen.test";

#[derive(Default)]
struct FakeState {
    dispatched: Vec<Hint>,
    in_flight: usize,
    max_in_flight: usize,
    default_latency_ms: u64,
    latency_ms: HashMap<String, u64>,
    failing: HashSet<String>,
}

/// Dispatcher with scripted latency and failures that records what it saw
#[derive(Clone, Default)]
pub(super) struct FakeDispatcher {
    state: Rc<RefCell<FakeState>>,
}

impl FakeDispatcher {
    pub(super) fn with_latency(default_latency_ms: u64) -> Self {
        let fake = Self::default();
        fake.state.borrow_mut().default_latency_ms = default_latency_ms;
        fake
    }

    pub(super) fn set_latency(&self, url: &str, ms: u64) {
        self.state.borrow_mut().latency_ms.insert(url.to_string(), ms);
    }

    pub(super) fn fail(&self, url: &str) {
        self.state.borrow_mut().failing.insert(url.to_string());
    }

    pub(super) fn urls(&self) -> Vec<String> {
        self.state
            .borrow()
            .dispatched
            .iter()
            .map(|h| h.url.clone())
            .collect()
    }

    pub(super) fn hints(&self) -> Vec<Hint> {
        self.state.borrow().dispatched.clone()
    }

    pub(super) fn max_in_flight(&self) -> usize {
        self.state.borrow().max_in_flight
    }

    pub(super) fn in_flight(&self) -> usize {
        self.state.borrow().in_flight
    }
}

impl HintDispatcher for FakeDispatcher {
    fn dispatch(&self, hint: &Hint) -> Settle {
        let (latency, fails) = {
            let mut state = self.state.borrow_mut();
            state.dispatched.push(hint.clone());
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            let latency = state
                .latency_ms
                .get(&hint.url)
                .copied()
                .unwrap_or(state.default_latency_ms);
            (latency, state.failing.contains(&hint.url))
        };

        let state = Rc::clone(&self.state);
        let url = hint.url.clone();
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(latency)).await;
            state.borrow_mut().in_flight -= 1;
            if fails {
                Err(Error::dispatch(url, "404 Not Found"))
            } else {
                Ok(())
            }
        })
    }
}

pub(super) fn url(path: &str) -> String {
    format!("{}{}", ORIGIN, path)
}

pub(super) fn page(path: &str) -> PageContext {
    PageContext::new(&url(path)).unwrap()
}

/// Dispatched URLs minus the critical SEO resources every init issues
pub(super) fn link_urls(fake: &FakeDispatcher) -> Vec<String> {
    let critical: Vec<String> = CRITICAL_RESOURCES.iter().map(|path| url(path)).collect();
    fake.urls()
        .into_iter()
        .filter(|u| !critical.contains(u))
        .collect()
}

/// Config with route prefetching switched off, for queue-only tests
pub(super) fn quiet_config(ceiling: usize) -> PreloadConfig {
    PreloadConfig {
        prioritize_seo_routes: false,
        max_concurrent_preloads: ceiling,
        ..PreloadConfig::default()
    }
}

pub(super) fn scheduler(
    path: &str,
    dispatcher: FakeDispatcher,
    config: PreloadConfig,
) -> SchedulerBuilder {
    Scheduler::builder(page(path), dispatcher).with_config(config)
}

pub(super) async fn local<F: Future>(f: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(f).await
}

pub(super) async fn wait_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
