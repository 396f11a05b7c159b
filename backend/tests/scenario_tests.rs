//! End-to-end scenarios through the public engine API.

mod support;

use session_analytics::io::{DatasetLoader, SchemaDescriptor, SourceFormat};
use session_analytics::models::{CalculationMode, FilterState, ThresholdToggle};
use session_analytics::services::{
    compute_report, expand, filter_options, AnalyticsSession, DurationBucket, Expansion,
};
use session_analytics::ProcessingError;

use support::{operator_dataset, SAMPLE_CSV};

fn sample_expansion() -> Expansion {
    let dataset = DatasetLoader::new(SchemaDescriptor::default())
        .load_str(SAMPLE_CSV, SourceFormat::Csv)
        .unwrap();
    Expansion::from(dataset)
}

#[test]
fn rebound_scenario_engagement_only() {
    let dataset = operator_dataset(&[("A", 0.0, 5), ("A", 45.0, 3), ("A", 400.0, 0)]);

    let units: Vec<f64> = expand(&dataset.records).map(|u| u.duration).collect();
    assert_eq!(units.len(), 8);
    assert_eq!(units.iter().filter(|&&d| d == 0.0).count(), 5);
    assert_eq!(units.iter().filter(|&&d| d == 45.0).count(), 3);

    let report = compute_report(&Expansion::from(dataset), &FilterState::new()).unwrap();
    let stats = report.statistics;
    assert_eq!(stats.count, 8);
    assert_eq!(stats.rebound_rate, 62.5);
    assert_eq!(stats.sample_size, 3);
    assert_eq!((stats.mean, stats.q1, stats.median, stats.q3), (45.0, 45.0, 45.0, 45.0));
    assert!(report.histogram.position(DurationBucket::Overflow).is_none());
}

#[test]
fn threshold_wins_over_explicit_selection() {
    let dataset = operator_dataset(&[("A", 10.0, 150), ("B", 20.0, 40)]);
    let expansion = Expansion::from(dataset);
    let state = FilterState::new()
        .select("operator", ["A", "B"])
        .with_threshold(ThresholdToggle::on(100));

    let report = compute_report(&expansion, &state).unwrap();
    assert_eq!(report.statistics.count, 150);
    assert_eq!(report.comparison.len(), 1);
    assert_eq!(report.comparison[0].value, "A");
    assert!(report.histogram.series.iter().all(|s| s.value == "A"));
}

#[test]
fn selection_of_only_low_volume_value_yields_empty_report() {
    let expansion = Expansion::from(operator_dataset(&[("A", 10.0, 150), ("B", 20.0, 40)]));
    let state = FilterState::new()
        .select("operator", ["B"])
        .with_threshold(ThresholdToggle::on(100));

    let report = compute_report(&expansion, &state).unwrap();
    assert!(report.is_empty());
    assert_eq!(report.statistics.rebound_rate, 0.0);
    assert!(report.comparison.is_empty());
    assert_eq!(report.max_volume, 0);
}

#[test]
fn zero_volume_group_is_omitted() {
    let expansion = sample_expansion();
    let report = compute_report(&expansion, &FilterState::new()).unwrap();

    let values: Vec<&str> = report.comparison.iter().map(|g| g.value.as_str()).collect();
    assert_eq!(values, vec!["A", "B"]);
    for group in &report.comparison {
        let total = group.rebound_pct + group.short_pct + group.engaged_pct + group.top_pct;
        assert!((total - 100.0).abs() < 1e-9, "{} sums to {}", group.value, total);
    }
}

#[test]
fn sample_table_report() {
    let expansion = sample_expansion();
    let report = compute_report(&expansion, &FilterState::new()).unwrap();

    assert_eq!(report.kpi.sessions, 190);
    assert_eq!(report.max_volume, 150);

    let a = &report.comparison[0];
    assert_eq!(a.volume, 150);
    assert_eq!(a.rebound_pct, 50.0 / 150.0 * 100.0);
    assert_eq!(a.short_pct, 20.0);
    assert_eq!(a.top_pct, 20.0);

    let b = &report.comparison[1];
    assert_eq!(b.volume, 40);
    assert_eq!(b.rebound_pct, 25.0);
    assert_eq!(b.engaged_pct, 50.0);
    assert_eq!(b.top_pct, 25.0);

    let labels: Vec<String> = report.histogram.buckets.iter().map(|b| b.label()).collect();
    assert_eq!(
        labels,
        vec!["0 sec", "12 sec", "45 sec", "61-90 sec", "181-210 sec", ">5 min"]
    );
    assert_eq!(report.histogram.totals, vec![60, 30, 40, 20, 30, 10]);
}

#[test]
fn calculation_mode_changes_only_distribution_stats() {
    let expansion = sample_expansion();
    let engaged = compute_report(&expansion, &FilterState::new()).unwrap();
    let all = compute_report(
        &expansion,
        &FilterState::new().with_mode(CalculationMode::IncludeZero),
    )
    .unwrap();

    assert_eq!(engaged.statistics.count, all.statistics.count);
    assert_eq!(engaged.statistics.rebound_rate, all.statistics.rebound_rate);
    assert_eq!(engaged.statistics.sample_size, 130);
    assert_eq!(all.statistics.sample_size, 190);
    assert!(all.statistics.median <= engaged.statistics.median);
    assert!(all.statistics.mean < engaged.statistics.mean);
}

#[test]
fn conjunction_across_dimensions() {
    let expansion = sample_expansion();
    let state = FilterState::new()
        .select("source", ["Google"])
        .select("campaign", ["Fall"]);
    let report = compute_report(&expansion, &state).unwrap();

    // A: 200s x 30, B: 75s x 20
    assert_eq!(report.statistics.count, 50);
    assert_eq!(report.statistics.rebound_rate, 0.0);
    assert_eq!(report.comparison.len(), 2);
}

#[test]
fn filter_options_follow_toggle() {
    let expansion = sample_expansion();
    let options = filter_options(&expansion, &FilterState::new());
    assert_eq!(options.values("operator").unwrap(), ["A", "B"]);
    assert_eq!(options.values("source").unwrap(), ["Bing", "Google"]);

    let toggled = FilterState::new().with_threshold(ThresholdToggle::on(100));
    assert_eq!(filter_options(&expansion, &toggled).values("operator").unwrap(), ["A"]);
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let state = FilterState::new()
        .select("source", ["Google", "Bing"])
        .with_threshold(ThresholdToggle::on(30));
    let first = compute_report(&sample_expansion(), &state).unwrap();
    let second = compute_report(&sample_expansion(), &state).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn session_keeps_previous_report_on_failure() {
    let dataset = DatasetLoader::new(SchemaDescriptor::default())
        .load_str(SAMPLE_CSV, SourceFormat::Csv)
        .unwrap();
    let mut session = AnalyticsSession::new(dataset).unwrap();
    session
        .update_filter(|s| s.with_threshold(ThresholdToggle::on(100)))
        .unwrap();
    let previous = session.report().clone();

    let err = session
        .update_filter(|s| s.select("country", ["FR"]))
        .unwrap_err();
    assert!(matches!(err, ProcessingError::UnknownDimension(ref d) if d == "country"));
    assert_eq!(session.report(), &previous);
    assert!(session.state().selections.is_empty());
}
