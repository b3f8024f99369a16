use super::*;
use crate::scheduler::hint::{HintRel, ResourceKind};
use crate::scheduler::queue::{TaskState, TriggerOrigin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[tokio::test(start_paused = true)]
async fn test_same_url_dispatched_once() {
    local(async {
        let fake = FakeDispatcher::with_latency(30);
        let sched = scheduler("/", fake.clone(), quiet_config(5)).create();

        for _ in 0..10 {
            sched.enqueue("/models");
        }
        sched.enqueue(&url("/models"));
        sched.enqueue("/models#roster");
        wait_ms(500).await;
        sched.enqueue("/models");
        wait_ms(500).await;

        assert_eq!(fake.urls(), vec![url("/models")]);
        let stats = sched.stats();
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.done, 1);
        assert!(sched.is_requested("/models"));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_burst_dispatches_in_fifo_order() {
    local(async {
        let fake = FakeDispatcher::with_latency(50);
        // Completion times deliberately out of order
        for (i, path) in ["/c", "/e", "/g"].iter().enumerate() {
            fake.set_latency(&url(path), 10 + i as u64);
        }
        let sched = scheduler("/", fake.clone(), quiet_config(2)).create();

        let paths = ["/a", "/b", "/c", "/d", "/e", "/f", "/g", "/h"];
        for path in paths {
            sched.enqueue(path);
        }
        assert_eq!(sched.stats().active, 2);
        wait_ms(5_000).await;

        let expected: Vec<String> = paths.iter().map(|p| url(p)).collect();
        assert_eq!(fake.urls(), expected);
        assert_eq!(sched.stats().done, paths.len());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_active_never_exceeds_ceiling_under_random_bursts() {
    local(async {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for trial in 0..25 {
            let ceiling = rng.gen_range(1..=6);
            let fake = FakeDispatcher::with_latency(0);
            let sched = scheduler("/", fake.clone(), quiet_config(ceiling)).create();

            let mut unique = HashSet::new();
            for _ in 0..rng.gen_range(1..8) {
                for _ in 0..rng.gen_range(1..12) {
                    let path = format!("/t{}/p{}", trial, rng.gen_range(0..30));
                    fake.set_latency(&url(&path), rng.gen_range(0..250));
                    unique.insert(path.clone());
                    sched.enqueue(&path);
                    assert!(sched.stats().active <= ceiling);
                }
                wait_ms(rng.gen_range(0..120)).await;
                assert!(sched.stats().active <= ceiling);
            }
            wait_ms(60_000).await;

            let stats = sched.stats();
            assert!(
                fake.max_in_flight() <= ceiling,
                "trial {}: {} in flight with ceiling {}",
                trial,
                fake.max_in_flight(),
                ceiling
            );
            assert!(stats.peak_active <= ceiling);
            assert_eq!(stats.done, unique.len());
            assert_eq!(stats.active, 0);
            assert_eq!(fake.in_flight(), 0);
        }
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_failure_does_not_block_queue_and_is_not_retried() {
    local(async {
        let fake = FakeDispatcher::with_latency(20);
        fake.fail(&url("/broken.png"));
        let sched = scheduler("/", fake.clone(), quiet_config(1)).create();

        sched.enqueue("/broken.png");
        sched.enqueue("/models");
        sched.enqueue("/about");
        wait_ms(1_000).await;
        sched.enqueue("/broken.png");
        wait_ms(1_000).await;

        assert_eq!(
            fake.urls(),
            vec![url("/broken.png"), url("/models"), url("/about")]
        );
        let stats = sched.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.done, 2);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_hint_kinds_follow_extension() {
    local(async {
        let fake = FakeDispatcher::with_latency(0);
        let sched = scheduler("/", fake.clone(), quiet_config(10)).create();

        sched.enqueue("/models/luxury");
        sched.enqueue("/css/site.css");
        sched.enqueue("/api/featured.json");
        wait_ms(10).await;

        let hints = fake.hints();
        assert_eq!(hints[0].rel, HintRel::Prefetch);
        assert_eq!(hints[1].kind, ResourceKind::Style);
        assert_eq!(hints[2].kind, ResourceKind::Fetch);
        assert!(hints[2].crossorigin);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_cross_origin_explicit_urls_are_allowed() {
    local(async {
        let fake = FakeDispatcher::with_latency(0);
        let sched = scheduler("/", fake.clone(), quiet_config(2)).create();

        sched.enqueue("https://cdn.other.test/reel.mp4");
        sched.enqueue("mailto:hello@lumen.test");
        wait_ms(10).await;

        assert_eq!(fake.urls(), vec!["https://cdn.other.test/reel.mp4"]);
        let task = sched.task("https://cdn.other.test/reel.mp4").unwrap();
        assert_eq!(task.origin, TriggerOrigin::Explicit);
        assert_eq!(task.kind, ResourceKind::Video);
        assert_eq!(task.state, TaskState::Done);
    })
    .await;
}
