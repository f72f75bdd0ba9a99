use cl_bench::{
    workloads::{
        breakeven::{self, find_breakeven},
        convolution::{check_kernel_size, gaussian_2d},
        hello::decode_message,
        multi_device::{self, intervals_overlap, partition, wall_clock_ms, KernelSpan},
        fits_work_group, round_up,
    },
    BenchConfig, BenchError, DeviceFilter, ProgramSource,
};
use opencl3::device::{CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU};

#[test]
fn partition_gives_remainder_to_last_device() {
    assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
    assert_eq!(partition(16, 4), vec![0..4, 4..8, 8..12, 12..16]);
    assert_eq!(partition(7, 1), vec![0..7]);
    assert!(partition(5, 0).is_empty());
}

#[test]
fn partition_covers_everything_once() {
    for total in [1, 9, 1000, 1 << 24] {
        for parts in 1..=5 {
            let ranges = partition(total, parts);
            assert_eq!(ranges.len(), parts);
            assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), total);
            assert_eq!(ranges.first().map(|r| r.start), Some(0));
            assert_eq!(ranges.last().map(|r| r.end), Some(total));
            assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));
        }
    }
}

#[test]
fn overlap_detection() {
    assert!(intervals_overlap((0, 10), (5, 15)));
    assert!(intervals_overlap((5, 15), (0, 10)));
    assert!(intervals_overlap((0, 10), (10, 20)), "touching counts");
    assert!(intervals_overlap((0, 100), (20, 30)), "containment");
    assert!(!intervals_overlap((0, 9), (10, 20)));
    assert!(!intervals_overlap((10, 20), (0, 9)));
}

#[test]
fn timeline_span() {
    let spans = [
        KernelSpan { device: "a".into(), start_ns: 100, end_ns: 2_000_100 },
        KernelSpan { device: "b".into(), start_ns: 1_000_100, end_ns: 4_000_100 },
    ];
    assert_eq!(spans[0].duration_ms(), 2.0);
    assert!(spans[0].overlaps(&spans[1]));
    assert_eq!(wall_clock_ms(&spans), 4.0);
    assert_eq!(wall_clock_ms(&[]), 0.0);
}

#[test]
fn multi_device_inputs_sum_to_length() {
    let (a, b) = multi_device::inputs(8);
    assert!(a.iter().zip(&b).all(|(x, y)| x + y == 8));
}

#[test]
fn breakeven_is_first_faster_size() {
    let rows = [(1024, 0.1, 0.5), (4096, 0.4, 0.3), (16384, 1.6, 0.4)];
    assert_eq!(find_breakeven(&rows), Some(4096));
    assert_eq!(find_breakeven(&[(1024, 0.1, 0.5), (4096, 0.4, 0.4)]), None);
    assert_eq!(find_breakeven(&[]), None);
}

#[test]
fn breakeven_inputs_wrap_at_1000() {
    let (a, b) = breakeven::inputs(2000);
    assert_eq!(a[1500], 500.0);
    assert_eq!(b[600], 200.0);
    assert_eq!(b[499], 998.0);
}

#[test]
fn global_sizes_round_up() {
    assert_eq!(round_up(100, 16), 112);
    assert_eq!(round_up(112, 16), 112);
    assert_eq!(round_up(1, 256), 256);
    assert_eq!(round_up(0, 16), 0);
}

#[test]
fn stencil_width_must_be_odd() {
    assert!(matches!(check_kernel_size(4), Err(BenchError::InvalidSize(4))));
    assert!(matches!(check_kernel_size(0), Err(BenchError::InvalidSize(0))));
    for ksize in [1, 3, 5, 15] {
        assert!(check_kernel_size(ksize).is_ok());
        assert_eq!(gaussian_2d(ksize).len(), ksize * ksize);
    }
}

#[test]
fn local_tile_origin_is_signed() {
    let src = ProgramSource::Convolution.load(&BenchConfig::default()).unwrap();
    assert!(src.contains("(int)get_group_id(0) * LOCAL_SIZE - half"));
    assert!(src.contains("(int)get_group_id(1) * LOCAL_SIZE - half"));
}

#[test]
fn work_group_limits() {
    assert!(fits_work_group(Some(256), 256));
    assert!(fits_work_group(Some(1024), 16 * 16));
    assert!(!fits_work_group(Some(128), 16 * 16));
    assert!(fits_work_group(None, 16 * 16));
}

#[test]
fn hello_message_stops_at_nul() {
    assert_eq!(decode_message(b"Hello, World!\0\0\0"), "Hello, World!");
    assert_eq!(decode_message(b"abc"), "abc");
    assert_eq!(decode_message(b"\0abc"), "");
}

#[test]
fn device_filter() {
    assert!(DeviceFilter::All.accepts(CL_DEVICE_TYPE_CPU));
    assert!(DeviceFilter::Gpu.accepts(CL_DEVICE_TYPE_GPU));
    assert!(!DeviceFilter::Gpu.accepts(CL_DEVICE_TYPE_CPU));
    assert!(DeviceFilter::Cpu.accepts(CL_DEVICE_TYPE_CPU | CL_DEVICE_TYPE_GPU));
}

#[test]
fn embedded_sources_define_their_kernels() {
    let cases: [(ProgramSource, &[&str]); 6] = [
        (ProgramSource::Hello, &["hello_kernel"]),
        (ProgramSource::VectorAdd, &["vector_add", "vector_add_int"]),
        (ProgramSource::Matvec, &["matvec_multiply"]),
        (ProgramSource::Matmul, &["matrix_multiply", "matrix_multiply_tiled"]),
        (ProgramSource::Convolution, &["convolve_2d", "convolve_2d_local", "convolve_h", "convolve_v"]),
        (ProgramSource::Nbody, &["compute_forces", "compute_forces_tiled"]),
    ];
    let config = BenchConfig::default();
    for (program, kernels) in cases {
        let src = program.load(&config).unwrap();
        for name in kernels {
            assert!(
                src.contains(&format!("__kernel void {name}(")),
                "{} lacks {name}",
                program.file_name()
            );
        }
    }
}

#[test]
fn missing_kernel_dir_is_reported_with_path() {
    let config = BenchConfig {
        kernel_dir: Some("/nonexistent/cl-bench-kernels".into()),
        ..BenchConfig::default()
    };
    match ProgramSource::Matmul.load(&config) {
        Err(BenchError::KernelSource { path, .. }) => {
            assert!(path.ends_with("matmul.cl"));
        }
        other => panic!("expected KernelSource error, got {other:?}"),
    }
}
