//! Benchmarks for log scanning and ranking performance.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use topip::exclude::ExcludeList;
use topip::rank::rank;
use topip::scanner::Scanner;

const PREFIXES: &[&str] = &[
    "blinp_", "blfwd_", "grchc_", "dns_", "invalid_", "private_", "drop_", "icmp_",
];

/// Generate synthetic firewall log content; roughly half the lines match
/// a prefix and carry one or two addresses.
fn generate_log(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            let a = (i % 200) as u8;
            let b = ((i / 200) % 200) as u8;
            if i % 2 == 0 {
                let prefix = PREFIXES[i % PREFIXES.len()];
                format!(
                    "{}rule{} drop src 203.{}.{}.7 dst 10.0.0.{}\n",
                    prefix,
                    i,
                    a,
                    b,
                    i % 256
                )
            } else {
                format!("conn established peer 198.51.{}.{}\n", a, b)
            }
        })
        .collect()
}

fn build_scanner() -> Scanner {
    let exclude = ExcludeList::compile(&["10.0.0.0/24".to_string()]);
    Scanner::with_rules(
        PREFIXES.iter().map(|s| s.to_string()).collect(),
        exclude,
    )
    .unwrap()
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    let scanner = build_scanner();

    for size in [1_000, 10_000, 50_000] {
        let log = generate_log(size);
        group.bench_with_input(BenchmarkId::new("lines", size), &log, |b, log| {
            b.iter(|| black_box(scanner.scan_reader(log.as_bytes()).unwrap()));
        });
    }

    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");

    for size in [1_000, 10_000, 100_000] {
        // Skewed distribution: low octets repeat far more often.
        let addresses: Vec<String> = (0..size)
            .map(|i| format!("203.0.113.{}", (i * i) % 64))
            .collect();

        group.bench_with_input(BenchmarkId::new("addresses", size), &addresses, |b, addrs| {
            b.iter(|| black_box(rank(addrs, 1000)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scan, bench_rank);
criterion_main!(benches);
