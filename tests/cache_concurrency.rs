use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use verity::{
    Article, CacheConfig, CancellationToken, Computed, ExecutionError, Fingerprint, ProviderOutput, SignalKind,
    SignalProvider, Verdict, VerdictCache, VerdictLabel, VerityEngine, VerityError, VerityResult,
};

struct Counting {
    name: &'static str,
    kind: SignalKind,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SignalProvider for Counting {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> SignalKind {
        self.kind
    }

    async fn assess(&self, _article: &Article) -> VerityResult<ProviderOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(match self.kind {
            SignalKind::Sentiment => ProviderOutput::Sentiment {
                sensationalism: 0.9,
                polarity: -0.8,
                confidence: 0.7,
                emotion: Some("fear".to_string()),
            },
            _ => ProviderOutput::SourceReputation {
                credibility: 0.1,
                confidence: 0.9,
                category: "known_unreliable".to_string(),
            },
        })
    }
}

fn engine_with_counters() -> (VerityEngine, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let reputation = Arc::new(AtomicUsize::new(0));
    let sentiment = Arc::new(AtomicUsize::new(0));
    let engine = VerityEngine::builder()
        .provider(Counting {
            name: "reputation",
            kind: SignalKind::SourceReputation,
            calls: Arc::clone(&reputation),
        })
        .provider(Counting {
            name: "sentiment",
            kind: SignalKind::Sentiment,
            calls: Arc::clone(&sentiment),
        })
        .build()
        .unwrap();
    (engine, reputation, sentiment)
}

fn article() -> Article {
    Article::builder()
        .text("SHOCKING: the truth they are hiding from you!")
        .source_url("worldtruth.tv/shocking")
        .build()
        .unwrap()
}

fn fp(n: u8) -> Fingerprint {
    Fingerprint::from_bytes([n; 32])
}

#[tokio::test(start_paused = true)]
async fn concurrent_analyses_share_one_computation() {
    let (engine, reputation, sentiment) = engine_with_counters();
    let article = article();

    let (a, b, c) = tokio::join!(
        engine.analyze(&article),
        engine.analyze(&article),
        engine.analyze(&article),
    );
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

    assert_eq!(reputation.load(Ordering::SeqCst), 1);
    assert_eq!(sentiment.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
    assert_eq!(a.label, VerdictLabel::LikelyFake);

    let stats = engine.cache_stats();
    assert_eq!(stats.coalesced, 2);
    assert_eq!(engine.cache().in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_leader_hands_over_to_waiter() {
    let (engine, reputation, _) = engine_with_counters();
    let article = article();
    let token = CancellationToken::new();

    let (partial, full, ()) = tokio::join!(
        engine.analyze_with_cancel(&article, &token),
        engine.analyze(&article),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        },
    );
    let (partial, full) = (partial.unwrap(), full.unwrap());

    assert_eq!(partial.label, VerdictLabel::Uncertain);
    assert!(partial
        .rationale
        .iter()
        .any(|line| line.contains("analysis cancelled")));
    assert_eq!(full.contributing_signals.len(), 2);
    assert_eq!(reputation.load(Ordering::SeqCst), 2);

    let cached = engine.verdict_for(&article.fingerprint()).unwrap();
    assert!(Arc::ptr_eq(&cached, &full));
}

#[tokio::test(start_paused = true)]
async fn cancelled_waiter_returns_before_shared_analysis_finishes() {
    let (engine, reputation, _) = engine_with_counters();
    let article = article();
    let token = CancellationToken::new();
    let start = tokio::time::Instant::now();

    let (full, (waited, elapsed), ()) = tokio::join!(
        engine.analyze(&article),
        async {
            let result = engine.analyze_with_cancel(&article, &token).await;
            (result, start.elapsed())
        },
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        },
    );

    let err = waited.unwrap_err();
    assert!(matches!(err, VerityError::Execution(ExecutionError::Cancelled)), "{err}");
    assert!(elapsed < Duration::from_millis(100), "waited {elapsed:?}");

    let full = full.unwrap();
    assert_eq!(full.contributing_signals.len(), 2);
    assert_eq!(reputation.load(Ordering::SeqCst), 1);
    assert_eq!(engine.cache_stats().coalesced, 1);
    let cached = engine.verdict_for(&article.fingerprint()).unwrap();
    assert!(Arc::ptr_eq(&cached, &full));
}

#[tokio::test(start_paused = true)]
async fn failure_reaches_every_waiter_and_is_not_cached() {
    let cache = VerdictCache::new(&CacheConfig::default()).unwrap();
    let calls = &AtomicUsize::new(0);

    let failing = move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Err::<Computed, _>(VerityError::internal("backend exploded"))
    };
    let (a, b) = tokio::join!(cache.get_or_compute(fp(1), failing), cache.get_or_compute(fp(1), failing));

    for result in [a, b] {
        let err = result.unwrap_err();
        assert!(err.is_computation_failure());
        let VerityError::Execution(ExecutionError::CacheComputationFailed { reason, .. }) = err else {
            panic!("unexpected error: {err}");
        };
        assert!(reason.contains("backend exploded"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(cache.get(&fp(1)).is_none());
    assert_eq!(cache.in_flight(), 0);

    let verdict = cache
        .get_or_compute(fp(1), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, VerityError>(Computed::Shareable(Verdict::uncertain(fp(1))))
        })
        .await
        .unwrap();
    assert_eq!(verdict.fingerprint, fp(1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn dropped_leader_lets_waiter_compute() {
    let cache = Arc::new(VerdictCache::new(&CacheConfig::default()).unwrap());

    let leader = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move {
            cache
                .get_or_compute(fp(7), || async {
                    std::future::pending::<()>().await;
                    Ok::<_, VerityError>(Computed::Shareable(Verdict::uncertain(fp(7))))
                })
                .await
        }
    });
    while cache.in_flight() == 0 {
        tokio::task::yield_now().await;
    }

    let waiter = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move {
            cache
                .get_or_compute(fp(7), || async { Ok::<_, VerityError>(Computed::Shareable(Verdict::uncertain(fp(7)))) })
                .await
        }
    });
    while cache.stats().coalesced == 0 {
        tokio::task::yield_now().await;
    }

    leader.abort();
    assert!(leader.await.unwrap_err().is_cancelled());

    let verdict = waiter.await.unwrap().unwrap();
    assert_eq!(verdict.fingerprint, fp(7));
    assert!(cache.get(&fp(7)).is_some());
    assert_eq!(cache.in_flight(), 0);
}

#[tokio::test]
async fn distinct_fingerprints_compute_independently() {
    let cache = VerdictCache::new(&CacheConfig::default()).unwrap();
    let calls = &AtomicUsize::new(0);
    let compute = |n: u8| {
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, VerityError>(Computed::Shareable(Verdict::uncertain(fp(n))))
        }
    };

    let (a, b) = tokio::join!(cache.get_or_compute(fp(1), compute(1)), cache.get_or_compute(fp(2), compute(2)));
    assert_eq!(a.unwrap().fingerprint, fp(1));
    assert_eq!(b.unwrap().fingerprint, fp(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
}
