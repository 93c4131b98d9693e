use std::hint::black_box;

use ad_sales::columns::TrainingColumns;
use ad_sales::data::RawRecord;
use ad_sales::{Pipeline, transform};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};

fn generate_records(rows: usize) -> Vec<RawRecord> {
    let campaigns = ["Data Analytcis Course", "data science bootcamp ", "DATAANALYTICSCOURSE"];
    let locations = ["hydrebad", "Bangalore", "chennai"];
    let devices = ["Desktop", "MOBILE", "tablet"];
    let keywords = ["Online Data Analytic", "data analytics online", "data anaytics training"];
    (0..rows)
        .map(|i| {
            let cost = if i % 3 == 0 {
                format!("₹{}.{:02}", 100 + i % 300, i % 100)
            } else {
                format!("${},{:03}.50", 1 + i % 2, i % 1000)
            };
            let day = (i % 28) + 1;
            RawRecord::new()
                .with_text("Ad_ID", format!("A{i}"))
                .with_text("Campaign_Name", campaigns[i % campaigns.len()])
                .with_text("Clicks", if i % 97 == 0 { "n/a".to_string() } else { (80 + i % 180).to_string() })
                .with_number("Impressions", (2000 + i % 7000) as f64)
                .with_text("Cost", cost)
                .with_number("Leads", (5 + i % 35) as f64)
                .with_number("Conversions", (1 + i % 5) as f64)
                .with_text("Sale_Amount", format!("${},{:03}.00", 1 + i % 4, i % 1000))
                .with_text("Ad_Date", format!("2024-11-{day:02}"))
                .with_text("Location", locations[i % locations.len()])
                .with_text("Device", devices[(i / 2) % devices.len()])
                .with_text("Keyword", keywords[(i / 3) % keywords.len()])
        })
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let records = generate_records(20_000);
    let training_columns = TrainingColumns::new(
        transform(&records[..100], None)
            .expect("discover layout")
            .features
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    )
    .expect("training columns");
    let pipeline = Pipeline::new();

    let mut group = c.benchmark_group("pipeline");

    group.bench_function("discover_20k", |b| {
        b.iter(|| pipeline.transform(black_box(&records), None).expect("discover"));
    });

    group.bench_function("aligned_single_record", |b| {
        b.iter_batched(
            || records[..1].to_vec(),
            |batch| {
                pipeline
                    .transform(&batch, Some(&training_columns))
                    .expect("aligned transform")
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
