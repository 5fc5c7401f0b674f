//! Performance benchmark for model training and serving
//!
//! Run with: cargo bench --bench training_perf

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use demand_fcst_core::{
    correction, seasonal, train, CategorySeries, CorrectionOptions, ForecastRequest, Observation,
    Period, SeasonalOptions, TrainingOptions,
};

fn generate_series(category: &str, n: usize) -> CategorySeries {
    let start = Period::new(2015, 1).unwrap();
    let observations = (0..n)
        .map(|i| {
            let period = start.plus_months(i as u32);
            let season =
                (2.0 * std::f64::consts::PI * f64::from(period.month()) / 12.0).sin() * 5.0e6;
            Observation {
                period,
                total_volume: 40.0e6 + 1.0e5 * i as f64 + season + (i % 7) as f64 * 1.0e5,
                economic_index: 95.0 + (i % 11) as f64,
                growth_trend: 0.02 + (i % 5) as f64 * 0.01,
            }
        })
        .collect();
    CategorySeries::new(category, observations).unwrap()
}

fn benchmark_fn<F, R>(name: &str, iterations: usize, mut f: F) -> Duration
where
    F: FnMut() -> R,
{
    // Warmup
    let _ = f();

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = std::hint::black_box(f());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "{}: total={:?}, per_iter={:?}, iters={}",
        name, elapsed, per_iter, iterations
    );
    elapsed
}

fn main() {
    println!("=== Demand Training Benchmark ===\n");

    let lengths = [24, 60, 120, 240];

    println!("--- 1. Single-category fits ---\n");

    for &n in &lengths {
        let series = generate_series("electronics", n);
        benchmark_fn(&format!("seasonal::fit(n={})", n), 100, || {
            seasonal::fit(&series, &SeasonalOptions::default())
        });
        benchmark_fn(&format!("correction::fit(n={})", n), 10, || {
            correction::fit(&series, &CorrectionOptions::default())
        });
    }

    println!("\n--- 2. Parallel training ---\n");

    for &categories in &[8, 32, 128] {
        let input: BTreeMap<String, CategorySeries> = (0..categories)
            .map(|c| {
                let name = format!("category_{c}");
                let series = generate_series(&name, 60);
                (name, series)
            })
            .collect();
        benchmark_fn(&format!("train(categories={})", categories), 3, || {
            train(&input, &TrainingOptions::default())
        });
    }

    println!("\n--- 3. Serving ---\n");

    let mut input = BTreeMap::new();
    input.insert("electronics".to_string(), generate_series("electronics", 60));
    let registry = train(&input, &TrainingOptions::default()).registry;
    let today = NaiveDate::from_ymd_opt(2025, 5, 14).unwrap();
    let request = ForecastRequest::new("electronics", "REG_MSK", 105.0, 12).unwrap();

    benchmark_fn("forecast_at(horizon=12)", 10_000, || {
        registry.forecast_at(&request, today)
    });

    println!("\n=== Benchmark Complete ===");
}
