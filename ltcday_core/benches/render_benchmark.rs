use std::io::{self, sink};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ltcday_core::config::{BitDepth, FrameRate};
use ltcday_core::ltc::{amplitude_from_dbfs, render};
use ltcday_core::wav::WavWriter;
use ltcday_core::{plan, Timecode};

const SAMPLE_RATE: u32 = 48_000;
const SECONDS: u64 = 10;

fn bench_render(c: &mut Criterion) {
    let total_samples = SECONDS * u64::from(SAMPLE_RATE);
    let mut group = c.benchmark_group("render");
    group.throughput(Throughput::Elements(total_samples));

    for (fps, depth) in [
        (25.0, BitDepth::Sixteen),
        (29.97, BitDepth::Sixteen),
        (29.97, BitDepth::TwentyFour),
    ] {
        let frame_rate = FrameRate::new(fps).expect("valid frame rate");
        group.bench_with_input(
            BenchmarkId::new(format!("{fps}fps"), depth.bits()),
            &depth,
            |b, &depth| {
                b.iter(|| -> io::Result<()> {
                    let mut writer = WavWriter::new(sink(), SAMPLE_RATE, depth, total_samples)
                        .map_err(io::Error::other)?;
                    render(
                        Timecode::MIDNIGHT,
                        frame_rate,
                        SAMPLE_RATE,
                        total_samples,
                        amplitude_from_dbfs(-3.0),
                        |sample| writer.write_sample(sample),
                    )?;
                    writer.finish().map(drop)
                })
            },
        );
    }
    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let frame_rate = FrameRate::new(29.97).expect("valid frame rate");
    c.bench_function("plan_one_minute_segments", |b| {
        b.iter(|| plan(0, 1, frame_rate).expect("valid plan").len())
    });
}

criterion_group!(benches, bench_render, bench_plan);
criterion_main!(benches);
