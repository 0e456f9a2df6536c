//! Benchmarks for the generation pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use fast3d_print::engine::device::Device;
use fast3d_print::engine::shap_e::{PipelineParams, ShapEPipeline};
use fast3d_print::mesh::ply;

fn test_pipeline(tmp: &TempDir) -> ShapEPipeline {
    let weights = tmp.path().join("weights");
    std::fs::create_dir_all(&weights).unwrap();
    ShapEPipeline::load(&weights, Device::Cpu, PipelineParams::default()).unwrap()
}

fn bench_sample_latents(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let pipeline = test_pipeline(&tmp);

    c.bench_function("sample_latents_64_steps", |b| {
        b.iter(|| {
            let latent = pipeline
                .sample_latents(black_box("a ceramic mug"), 64, 15.0)
                .unwrap();
            black_box(latent);
        })
    });
}

fn bench_decode_latent(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let pipeline = test_pipeline(&tmp);
    let latent = pipeline.sample_latents("a ceramic mug", 64, 15.0).unwrap();

    c.bench_function("decode_latent_frame_256", |b| {
        b.iter(|| {
            let mesh = pipeline.decode_latent(black_box(&latent)).unwrap();
            black_box(mesh);
        })
    });
}

fn bench_ply_encode(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let pipeline = test_pipeline(&tmp);
    let latent = pipeline.sample_latents("a ceramic mug", 64, 15.0).unwrap();
    let mesh = pipeline.decode_latent(&latent).unwrap();

    c.bench_function("ply_encode", |b| {
        b.iter(|| {
            let bytes = ply::encode(black_box(&mesh)).unwrap();
            black_box(bytes);
        })
    });
}

criterion_group!(
    benches,
    bench_sample_latents,
    bench_decode_latent,
    bench_ply_encode,
);
criterion_main!(benches);
