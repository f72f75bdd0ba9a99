use cl_bench::{
    cpu::Strategy,
    device::preferred_device,
    workloads::vector_add::{add_opencl, add_serial, inputs},
    DeviceFilter, DeviceSession, ProgramSource,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const ROW: usize = 4096;

fn bench_vec_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("vec_add");
    let session = preferred_device(DeviceFilter::All)
        .ok()
        .and_then(|info| DeviceSession::open(info, ProgramSource::VectorAdd.embedded()).ok());

    for n in [1 << 16, 1 << 20] {
        let (a, b) = inputs(n);
        let mut out = vec![0.0_f32; n];

        group.bench_with_input(BenchmarkId::new("serial", n), &n, |bench, _| {
            bench.iter(|| add_serial(&a, &b, &mut out))
        });

        group.bench_with_input(BenchmarkId::new("rayon", n), &n, |bench, _| {
            bench.iter(|| {
                Strategy::Rayon.run_rows(&mut out, ROW, |i, row| {
                    let base = i * ROW;
                    add_serial(&a[base..base + row.len()], &b[base..base + row.len()], row)
                })
            })
        });

        // Includes uploads and the read back, so it shows the whole round trip.
        if let Some(session) = &session {
            group.bench_with_input(BenchmarkId::new("opencl", n), &n, |bench, _| {
                bench.iter(|| add_opencl(session, &a, &b, &mut out).unwrap())
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_vec_add);
criterion_main!(benches);
