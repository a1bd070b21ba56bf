use criterion::{black_box, criterion_group, criterion_main, Criterion};
use folio_parser::parse;

fn parse_short_report(c: &mut Criterion) {
    let source = r#"# Quarterly Summary
[High Confidence] Revenue grew 12% year over year.
[Source: Q3 Filing] Operating margin held at 18%.
[CHART: Revenue by quarter]
"#;

    c.bench_function("parse_short_report", |b| b.iter(|| parse(black_box(source))));
}

fn parse_long_report(c: &mut Criterion) {
    let section = r#"## Findings
Demand recovered in the second half [Medium Confidence] driven by enterprise renewals.
- Churn fell to 4% [Source: CRM export]
- Expansion revenue doubled [Low] pending audit
1. Stabilise pricing
2. Expand the partner channel
[CHART: Net revenue retention by cohort]

"#;
    let mut source = String::from("[DRAFT REPORT]\n# Annual Review\n\n");
    for _ in 0..200 {
        source.push_str(section);
    }
    source.push_str("Source Citations:\n- CRM export\n- Q3 Filing\n");

    c.bench_function("parse_long_report", |b| b.iter(|| parse(black_box(&source))));
}

criterion_group!(benches, parse_short_report, parse_long_report);
criterion_main!(benches);
