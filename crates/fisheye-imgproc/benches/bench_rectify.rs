use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fisheye_image::{Image, ImageSize};
use fisheye_imgproc::{
    calibration::{
        distortion::{generate_correction_map_unified, UnifiedDistortion},
        virtual_pinhole_intrinsic, CameraExtrinsic, CameraIntrinsic,
    },
    interpolation::{remap_with_map, InterpolationMode},
    parallel::ExecutionStrategy,
};

fn bench_correction_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("CorrectionMapUnified");

    let intrinsic = CameraIntrinsic::new(1402.8, 1403.1, 638.2, 513.7);
    let distortion = UnifiedDistortion::new(1.78, [-0.12, 0.35, 0.0004, -0.0002]);

    for (width, height) in [(320, 240), (640, 480), (1280, 1024)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);
        let size = ImageSize {
            width: *width,
            height: *height,
        };
        let knew = virtual_pinhole_intrinsic(size, 90.0).unwrap();

        for (name, strategy) in [
            ("serial", ExecutionStrategy::Serial),
            ("parallel_rows", ExecutionStrategy::ParallelRows),
        ] {
            group.bench_with_input(
                BenchmarkId::new(name, &parameter_string),
                &strategy,
                |b, &strategy| {
                    b.iter(|| {
                        generate_correction_map_unified(
                            black_box(&intrinsic),
                            black_box(&CameraExtrinsic::identity()),
                            black_box(&knew),
                            black_box(&distortion),
                            size,
                            strategy,
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_remap(c: &mut Criterion) {
    let mut group = c.benchmark_group("RemapRectify");

    let intrinsic = CameraIntrinsic::new(700.0, 700.0, 639.5, 511.5);
    let distortion = UnifiedDistortion::new(1.2, [-0.05, 0.01, 0.0, 0.0]);

    for (width, height) in [(320, 240), (640, 480), (1280, 1024)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);
        let size = ImageSize {
            width: *width,
            height: *height,
        };
        let knew = virtual_pinhole_intrinsic(size, 90.0).unwrap();
        let map = generate_correction_map_unified(
            &intrinsic,
            &CameraExtrinsic::identity(),
            &knew,
            &distortion,
            size,
            ExecutionStrategy::ParallelRows,
        )
        .unwrap();

        let raw = Image::<f32, 3>::from_size_val([1280, 1024].into(), 0.5).unwrap();
        let output = Image::<f32, 3>::from_size_val(size, 0.0).unwrap();

        for (name, strategy) in [
            ("serial", ExecutionStrategy::Serial),
            ("parallel_rows", ExecutionStrategy::ParallelRows),
        ] {
            group.bench_with_input(
                BenchmarkId::new(format!("bilinear_{name}"), &parameter_string),
                &(&raw, &output, &map),
                |b, i| {
                    let (src, mut dst, map) = (i.0.clone(), i.1.clone(), i.2);
                    b.iter(|| {
                        remap_with_map(
                            black_box(&src),
                            black_box(&mut dst),
                            black_box(map),
                            InterpolationMode::Bilinear,
                            0.0,
                            strategy,
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_correction_map, bench_remap);
criterion_main!(benches);
