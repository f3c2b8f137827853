use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use crosstab_engine::{build_report, ReportDefinition, Row, RowSets};

fn synthetic_rows(shifts: usize, entities: usize, categories: usize) -> RowSets {
    let mut rows = RowSets::new();
    for shift in 0..shifts {
        let shift_name = format!("Shift {}", shift + 1);
        for entity in 0..entities {
            rows.metrics.push(
                Row::new()
                    .set("PlantId", format!("P{:03}", entity))
                    .set("PlantName", format!("Plant {}", entity))
                    .set("ShiftName", shift_name.as_str())
                    .set("Total", entity as f64 * 0.25),
            );
            for category in 0..categories {
                // sparse: not every pair contributes
                if (entity + category) % 3 == 0 {
                    continue;
                }
                rows.details.push(
                    Row::new()
                        .set("PlantId", format!("P{:03}", entity))
                        .set("ShiftName", shift_name.as_str())
                        .set("Reason", format!("Reason {:02}", category))
                        .set("Hrs", ((entity * category) % 7) as f64 * 0.25),
                );
            }
            rows.annotations.push(
                Row::new()
                    .set("PlantId", format!("P{:03}", entity))
                    .set("ShiftName", shift_name.as_str())
                    .set("Source", "Stop")
                    .set("FromTime", "10:00")
                    .set("ToTime", "11:30")
                    .set("DurationHours", 1.5)
                    .set("Remark", "scheduled maintenance"),
            );
        }
    }
    rows
}

fn bench_build_report(c: &mut Criterion) {
    let definition = ReportDefinition::shift_stoppage();
    let rows = synthetic_rows(3, 40, 30);

    c.bench_function("crosstab.build_report.3x40x30", |b| {
        b.iter(|| build_report(black_box(&definition), black_box(&rows)).unwrap());
    });

    let cumulative = ReportDefinition::cumulative_stoppage();
    let flat = synthetic_rows(1, 40, 30);

    c.bench_function("crosstab.build_report.cumulative", |b| {
        b.iter(|| build_report(black_box(&cumulative), black_box(&flat)).unwrap());
    });
}

criterion_group!(benches, bench_build_report);
criterion_main!(benches);
