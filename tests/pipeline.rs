//! End-to-end pipeline tests: raw frames through the throttle, window,
//! scales and animators of a `LiveChart`, driven by a simulated clock.

use std::sync::{Arc, Mutex};

use tickline::prelude::*;

const PERIOD: f64 = 200.0;
const FRAME: f64 = 16.0;

fn trade(t: i64, p: f64) -> String {
    format!(r#"{{"e":"trade","E":{},"s":"BTCUSDT","p":"{:.2}","q":"0.01","T":{}}}"#, t + 3, p, t)
}

/// Feed one sample per acceptance period, running frames in between.
fn feed(chart: &mut LiveChart, samples: &[(i64, f64)], mut now: f64) -> f64 {
    for &(t, p) in samples {
        chart.on_message(&trade(t, p), now);
        chart.on_acceptance_tick(now);
        let until = now + PERIOD;
        while now < until {
            chart.on_frame(now);
            now += FRAME;
        }
    }
    now
}

fn settle(chart: &mut LiveChart, mut now: f64, for_ms: f64) -> f64 {
    let until = now + for_ms;
    while now < until {
        chart.on_frame(now);
        now += FRAME;
    }
    now
}

#[test]
fn test_three_sample_scenario() {
    let mut chart = LiveChart::new(ChartConfig::default()).unwrap();
    chart.on_open();
    feed(&mut chart, &[(1000, 45000.0), (1200, 45100.0), (1400, 44950.0)], 0.0);

    assert_eq!(chart.samples().len(), 3);
    assert_eq!(chart.current_price(), Some(44950.0));
    assert_eq!(chart.segment_reveals(), 2);

    let scales = chart.scales().expect("two or more samples");
    let mid = scales.bounds.mid();
    assert!(
        (mid - 45016.7).abs() <= scales.margin,
        "bounds centred at {mid}, margin {}",
        scales.margin
    );
    assert!(scales.bounds.min <= 44950.0 && scales.bounds.max >= 45100.0);
}

#[test]
fn test_burst_in_one_period_appends_last_value() {
    let mut chart = LiveChart::new(ChartConfig::default()).unwrap();
    chart.on_open();
    chart.on_message(&trade(1000, 45000.0), 0.0);

    for i in 0..1000 {
        chart.on_message(&trade(1001 + i, 45000.0 + i as f64 * 0.01), 10.0);
    }
    let accepted = chart.on_acceptance_tick(PERIOD).expect("one acceptance");
    assert!((accepted.price - 45009.99).abs() < 1e-6);
    assert_eq!(chart.samples().len(), 2);
    assert!(chart.on_acceptance_tick(2.0 * PERIOD).is_none());

    let stats = chart.throttle_stats();
    assert_eq!(stats.received, 1001);
    assert_eq!(stats.accepted, 2);
}

#[test]
fn test_window_stays_bounded_and_ordered() {
    let mut chart = LiveChart::new(ChartConfig::default()).unwrap();
    chart.on_open();
    let samples: Vec<(i64, f64)> = (0..100)
        .map(|i| (1000 + i * 200, 45000.0 + (i % 7) as f64 * 3.0))
        .collect();
    feed(&mut chart, &samples, 0.0);

    let window = chart.samples();
    assert_eq!(window.len(), 40);
    assert!(window.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(window.last().unwrap().timestamp, 1000 + 99 * 200);
}

#[test]
fn test_large_jump_settles_exactly_once() {
    let config = ChartConfig {
        zoom_precision: 2.0,
        ..ChartConfig::default()
    };
    let mut chart = LiveChart::new(config).unwrap();
    let settled = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&settled);
    chart.on_price_settled(move |s| sink.lock().unwrap().push(s));

    chart.on_open();
    let now = feed(&mut chart, &[(1000, 50000.0), (1200, 50100.0)], 0.0);
    settle(&mut chart, now, 3000.0);

    let settled = settled.lock().unwrap();
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].price, 50100.0);
    assert_eq!(settled[0].direction, Direction::Up);
    assert_eq!(chart.displayed_price(), Some(50100.0));
}

#[test]
fn test_marker_stays_inside_plot() {
    let mut chart = LiveChart::new(ChartConfig::default()).unwrap();
    chart.on_open();
    let now = feed(&mut chart, &[(1000, 45000.0), (1200, 45020.0), (1400, 44990.0)], 0.0);
    settle(&mut chart, now, 1500.0);

    let paths = chart.paths().expect("paths");
    let viewport = chart.config().viewport;
    let (bottom, top) = viewport.y_range();
    let marker = paths.marker_y.expect("displayed price");
    assert!(marker <= bottom && marker >= top);
    let head = paths.head.expect("head");
    assert!(head.y <= bottom && head.y >= top);
    assert!(paths.segment.is_none());
    assert!(!paths.area.is_empty());
}

#[test]
fn test_snapshot_round_trips_through_json() {
    let mut chart = LiveChart::new(ChartConfig::default()).unwrap();
    chart.on_open();
    feed(&mut chart, &[(1000, 45000.0), (1200, 45100.0)], 0.0);

    let json = serde_json::to_string(&chart.snapshot()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["samples"].as_array().unwrap().len(), 2);
    assert_eq!(value["stats"]["count"], 2);
    assert_eq!(value["connection"], "open");
}
