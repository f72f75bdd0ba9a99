use cl_bench::{
    cpu::Strategy,
    workloads::{
        convolution::{self, convolve_cpu, gaussian_1d, gaussian_2d, Image},
        matmul::{self, matmul_cpu, Dims},
        matvec::{self, matvec_cpu},
        nbody::{device_layout, forces_cpu, init_bodies, verify_forces, Body},
        vector_add::{add_serial, inputs},
    },
};

#[test]
fn vector_add_serial() {
    let (a, b) = inputs(5);
    let mut c = vec![0.0; 5];
    add_serial(&a, &b, &mut c);
    assert_eq!(c, [0.0, 3.0, 6.0, 9.0, 12.0]);
}

#[test]
fn matvec_small_by_hand() {
    let m = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let v = [1.0, 1.0, 1.0];
    for strategy in Strategy::ALL {
        let mut out = [0.0_f32; 2];
        matvec_cpu(strategy, &m, &v, &mut out);
        assert_eq!(out, [6.0, 15.0], "{}", strategy.label());
    }
}

#[test]
fn matvec_strategies_agree() {
    let (m, v) = matvec::inputs(96, 96);
    let mut serial = vec![0.0_f32; 96];
    matvec_cpu(Strategy::Serial, &m, &v, &mut serial);
    for strategy in [Strategy::Rayon, Strategy::Threads] {
        let mut out = vec![0.0_f32; 96];
        matvec_cpu(strategy, &m, &v, &mut out);
        assert_eq!(out, serial, "{}", strategy.label());
    }
}

#[test]
fn matmul_rectangular_by_hand() {
    let dims = Dims { m: 2, n: 3, k: 2 };
    let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
    for strategy in Strategy::ALL {
        let mut c = [0.0_f32; 4];
        matmul_cpu(strategy, &a, &b, dims, &mut c);
        assert_eq!(c, [58.0, 64.0, 139.0, 154.0], "{}", strategy.label());
    }
}

#[test]
fn matmul_flop_count() {
    assert_eq!(Dims::square(256).flop(), 2.0 * 256.0 * 256.0 * 256.0);
}

#[test]
fn matmul_strategies_agree() {
    let dims = Dims::square(48);
    let (a, b) = matmul::inputs(dims);
    let mut serial = vec![0.0_f32; 48 * 48];
    matmul_cpu(Strategy::Serial, &a, &b, dims, &mut serial);
    for strategy in [Strategy::Rayon, Strategy::Threads] {
        let mut out = vec![0.0_f32; 48 * 48];
        matmul_cpu(strategy, &a, &b, dims, &mut out);
        assert_eq!(out, serial, "{}", strategy.label());
    }
}

#[test]
fn gaussian_weights_are_normalised() {
    for ksize in [3, 5, 7, 11, 15] {
        let w2 = gaussian_2d(ksize);
        let w1 = gaussian_1d(ksize);
        assert_eq!(w2.len(), ksize * ksize);
        assert_eq!(w1.len(), ksize);
        assert!((w2.iter().sum::<f32>() - 1.0).abs() < 1e-5, "2d ksize {ksize}");
        assert!((w1.iter().sum::<f32>() - 1.0).abs() < 1e-5, "1d ksize {ksize}");

        // peak in the middle, symmetric falloff
        let mid = ksize / 2;
        assert!(w1.iter().all(|&v| v <= w1[mid]));
        for i in 0..ksize {
            assert!((w1[i] - w1[ksize - 1 - i]).abs() < 1e-7);
        }
    }
}

#[test]
fn gaussian_2d_is_outer_product_of_1d() {
    let ksize = 7;
    let w1 = gaussian_1d(ksize);
    let w2 = gaussian_2d(ksize);
    for y in 0..ksize {
        for x in 0..ksize {
            assert!((w2[y * ksize + x] - w1[y] * w1[x]).abs() < 1e-6, "({x}, {y})");
        }
    }
}

#[test]
fn blur_keeps_a_flat_image_flat() {
    let image = Image { width: 13, height: 9 };
    let input = vec![0.5_f32; image.pixels()];
    let weights = gaussian_2d(5);
    for strategy in Strategy::ALL {
        let mut out = vec![0.0_f32; image.pixels()];
        convolve_cpu(strategy, &input, &weights, 5, image, &mut out);
        assert!(out.iter().all(|v| (v - 0.5).abs() < 1e-5), "{}", strategy.label());
    }
}

#[test]
fn single_tap_kernel_is_identity() {
    let image = Image::square(8);
    let input = convolution::synthetic_image(image);
    let mut out = vec![0.0_f32; image.pixels()];
    convolve_cpu(Strategy::Serial, &input, &gaussian_2d(1), 1, image, &mut out);
    assert_eq!(out, input);
}

#[test]
fn edges_are_clamped() {
    // 3-tap box over a single row: the border pixel counts twice.
    let image = Image { width: 3, height: 1 };
    let input = [3.0, 6.0, 9.0];
    let mut weights = vec![0.0_f32; 9];
    weights[3..6].fill(1.0 / 3.0);
    let mut out = [0.0_f32; 3];
    convolve_cpu(Strategy::Serial, &input, &weights, 3, image, &mut out);
    let expected = [4.0, 6.0, 8.0];
    for (o, e) in out.iter().zip(expected) {
        assert!((o - e).abs() < 1e-5, "{out:?}");
    }
}

#[test]
fn two_bodies_attract_each_other() {
    let bodies = [
        Body { pos: [0.0, 0.0, 0.0], vel: [0.0; 3], mass: 1.0 },
        Body { pos: [1.0, 0.0, 0.0], vel: [0.0; 3], mass: 2.0 },
    ];
    for strategy in Strategy::ALL {
        let mut acc = [9.0_f32; 8];
        forces_cpu(strategy, &bodies, 0.0, &mut acc);
        assert_eq!(acc, [2.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0], "{}", strategy.label());
    }
}

#[test]
fn seeded_bodies_are_reproducible_and_in_range() {
    let a = init_bodies(64, 42);
    let b = init_bodies(64, 42);
    assert_eq!(a, b);
    assert_ne!(a, init_bodies(64, 7));

    for body in &a {
        assert!(body.pos.iter().all(|p| (-100.0..100.0).contains(p)));
        assert!(body.vel.iter().all(|v| (-1.0..1.0).contains(v)));
        assert!((1.0..10.0).contains(&body.mass));
    }

    let (positions, masses) = device_layout(&a);
    assert_eq!(positions.len(), 4 * 64);
    assert_eq!(masses.len(), 64);
    assert!(positions.chunks(4).all(|p| p[3] == 0.0));
}

#[test]
fn force_strategies_agree() {
    let bodies = init_bodies(100, 42);
    let mut serial = vec![0.0_f32; 400];
    forces_cpu(Strategy::Serial, &bodies, 0.1, &mut serial);
    for strategy in [Strategy::Rayon, Strategy::Threads] {
        let mut out = vec![0.0_f32; 400];
        forces_cpu(strategy, &bodies, 0.1, &mut out);
        assert!(verify_forces(&serial, &out).passed(), "{}", strategy.label());
    }
}

#[test]
fn force_check_rejects_sign_flip() {
    let bodies = init_bodies(16, 42);
    let mut expected = vec![0.0_f32; 64];
    forces_cpu(Strategy::Serial, &bodies, 0.1, &mut expected);
    let flipped: Vec<f32> = expected.iter().map(|v| -v).collect();
    assert!(!verify_forces(&expected, &flipped).passed());
}
