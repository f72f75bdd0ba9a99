//! Runs against the first available OpenCL device; passes trivially on
//! machines without a platform or device.

use cl_bench::{
    device::preferred_device,
    verify::verify,
    workloads::{
        breakeven,
        vector_add::{add_opencl, add_serial, inputs},
    },
    BenchError, DeviceFilter, DeviceSession, GpuBuffer, ProgramSource, Queued,
};
use opencl3::memory::CL_MEM_READ_WRITE;

fn session() -> Option<DeviceSession> {
    let info = match preferred_device(DeviceFilter::All) {
        Ok(info) => info,
        Err(BenchError::NoPlatforms | BenchError::NoDevices | BenchError::Api(_)) => {
            eprintln!("no OpenCL device, skipping");
            return None;
        }
        Err(e) => panic!("device discovery failed: {e}"),
    };
    Some(DeviceSession::open(info, ProgramSource::VectorAdd.embedded()).unwrap())
}

#[test]
fn vector_add_matches_host() {
    let Some(session) = session() else { return };
    let (a, b) = inputs(4096);
    let mut expected = vec![0.0_f32; 4096];
    add_serial(&a, &b, &mut expected);

    let mut out = vec![0.0_f32; 4096];
    let ms = add_opencl(&session, &a, &b, &mut out).unwrap();
    assert!(ms >= 0.0);
    assert!(verify(&expected, &out, 1e-3).passed());
}

#[test]
fn buffer_states_and_length_checks() {
    let Some(session) = session() else { return };
    let queue = session.queue(false).unwrap();

    assert!(matches!(
        GpuBuffer::<f32, Queued>::new(&session.context, 0, CL_MEM_READ_WRITE),
        Err(BenchError::InvalidSize(0))
    ));

    let host = [1.0_f32, 2.0, 3.0];
    let buf = GpuBuffer::<f32, Queued>::new(&session.context, 3, CL_MEM_READ_WRITE).unwrap();
    assert_eq!(buf.size_bytes(), 12);

    let (pending, guard) = buf.enqueue_write(&queue, &host).unwrap();
    let ready = pending.into_ready(guard).unwrap();

    let mut back = [0.0_f32; 3];
    ready.read(&queue, &mut back).unwrap();
    assert_eq!(back, host);

    let mut short = [0.0_f32; 2];
    assert!(matches!(
        ready.read(&queue, &mut short),
        Err(BenchError::LengthMismatch { host: 2, device: 3 })
    ));
}

#[test]
fn breakeven_device_output_matches_host() {
    let Some(session) = session() else { return };
    let (a, b) = breakeven::inputs(5000);
    let mut expected = vec![0.0_f32; 5000];
    add_serial(&a, &b, &mut expected);

    let mut out = vec![0.0_f32; 5000];
    let ms = breakeven::device_best(&session, &a, &b, &mut out, 3).unwrap();
    assert!(ms.is_finite());
    assert!(verify(&expected, &out, 1e-3).passed());
}
