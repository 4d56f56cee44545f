use verity::{AggregationConfig, Aggregator, BaseWeights, Fingerprint, Signal, SignalKind, Verdict, VerdictLabel};

fn fp() -> Fingerprint {
    Fingerprint::compute("aggregation properties", "example.com")
}

fn mixed(fact_check_score: f64) -> Vec<Signal> {
    vec![
        Signal::present(SignalKind::FactCheck, fact_check_score, 0.6, "claims"),
        Signal::present(SignalKind::SourceReputation, 0.4, 0.8, "domain"),
        Signal::absent(SignalKind::ImageAuthenticity, "no images"),
        Signal::present(SignalKind::Sentiment, 0.7, 0.5, "lexicon"),
    ]
}

#[test]
fn raising_one_score_never_lowers_probability() {
    let agg = Aggregator::default();
    let mut previous = 0.0;
    for step in 0..=20 {
        let score = f64::from(step) / 20.0;
        let v = agg.aggregate_for(fp(), &mixed(score)).unwrap();
        assert!(
            v.fake_probability >= previous - 1e-12,
            "score {score}: {} < {previous}",
            v.fake_probability
        );
        previous = v.fake_probability;
    }
}

#[test]
fn aggregation_is_deterministic() {
    let agg = Aggregator::default();
    let first = agg.aggregate_for(fp(), &mixed(0.9)).unwrap();
    for _ in 0..5 {
        assert_eq!(agg.aggregate_for(fp(), &mixed(0.9)).unwrap(), first);
    }
}

#[test]
fn probability_and_confidence_stay_in_unit_interval() {
    let agg = Aggregator::default();
    for &score in &[0.0, 0.25, 0.5, 0.75, 1.0] {
        for &confidence in &[0.0, 0.1, 0.5, 1.0] {
            let signals: Vec<Signal> = SignalKind::ALL
                .iter()
                .map(|k| Signal::present(*k, score, confidence, ""))
                .collect();
            let v = agg.aggregate_for(fp(), &signals).unwrap();
            assert!((0.0..=1.0).contains(&v.fake_probability));
            assert!((0.0..=1.0).contains(&v.overall_confidence));
            if confidence > 0.0 {
                assert!((v.fake_probability - score).abs() < 1e-9);
            } else {
                assert_eq!(v, verdict_without_evidence(&v));
            }
        }
    }
}

fn verdict_without_evidence(v: &Verdict) -> Verdict {
    let mut expected = Verdict::uncertain(v.fingerprint);
    expected.rationale.clone_from(&v.rationale);
    expected
}

#[test]
fn full_confidence_on_every_kind_gives_full_overall_confidence() {
    let signals: Vec<Signal> = SignalKind::ALL
        .iter()
        .map(|k| Signal::present(*k, 0.9, 1.0, ""))
        .collect();
    let v = Aggregator::default().aggregate_for(fp(), &signals).unwrap();
    assert!((v.overall_confidence - 1.0).abs() < 1e-12);
    assert_eq!(v.label, VerdictLabel::LikelyFake);
    assert!(v.missing.is_empty());
}

#[test]
fn zero_base_weight_excludes_kind() {
    let config = AggregationConfig {
        weights: BaseWeights {
            sentiment: 0.0,
            ..BaseWeights::default()
        },
        ..AggregationConfig::default()
    };
    let agg = Aggregator::new(config).unwrap();
    let v = agg.aggregate_for(fp(), &mixed(0.9)).unwrap();

    assert!(v.missing.contains(&SignalKind::Sentiment));
    assert!(v
        .contributing_signals
        .iter()
        .all(|c| c.signal.kind() != SignalKind::Sentiment));
    assert!(v.rationale.iter().any(|line| line.contains("zero base weight")));
}

#[test]
fn custom_thresholds_move_the_label() {
    let signals = vec![
        Signal::present(SignalKind::FactCheck, 0.6, 1.0, ""),
        Signal::present(SignalKind::SourceReputation, 0.6, 1.0, ""),
    ];
    let default = Aggregator::default().aggregate_for(fp(), &signals).unwrap();
    assert_eq!(default.label, VerdictLabel::Uncertain);

    let strict = Aggregator::new(AggregationConfig {
        fake_threshold: 0.55,
        ..AggregationConfig::default()
    })
    .unwrap();
    let v = strict.aggregate_for(fp(), &signals).unwrap();
    assert_eq!(v.label, VerdictLabel::LikelyFake);
}

#[test]
fn inconsistent_thresholds_are_rejected() {
    let err = Aggregator::new(AggregationConfig {
        fake_threshold: 0.3,
        real_threshold: 0.4,
        ..AggregationConfig::default()
    })
    .unwrap_err();
    assert!(err.to_string().contains("Threshold"));
}

#[test]
fn verdict_serializes_for_callers() {
    let v = Aggregator::default().aggregate_for(fp(), &mixed(0.9)).unwrap();
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["label"], v.label.as_str());
    assert_eq!(json["missing"][0], "image_authenticity");
    let back: Verdict = serde_json::from_value(json).unwrap();
    assert_eq!(back.fingerprint, v.fingerprint);
    assert_eq!(back.label, v.label);
    assert_eq!(back.rationale, v.rationale);
}
