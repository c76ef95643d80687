use criterion::{criterion_group, criterion_main, Criterion};

use mandelview_core::{DVec2, Parms, ViewInput};
use mandelview_render::{FrameDriver, SoftwareDevice, SoftwareKernel};

fn driver(width: i32, height: i32) -> FrameDriver<SoftwareDevice> {
    let mut parms = Parms::default();
    parms.set_resolution(width, height);
    FrameDriver::new(
        SoftwareDevice::new(),
        SoftwareKernel::mandelbrot(),
        parms,
        std::env::temp_dir().join("mandelview_bench"),
    )
}

fn render_frame(d: &mut FrameDriver<SoftwareDevice>, input: &ViewInput) {
    d.begin_frame().unwrap();
    d.update(input).unwrap();
    d.end_frame().unwrap();
}

fn bench_full_frame(c: &mut Criterion) {
    let mut d = driver(640, 480);
    let input = ViewInput::default();
    render_frame(&mut d, &input);

    c.bench_function("frame_640x480", |b| {
        b.iter(|| render_frame(&mut d, &input));
    });
}

fn bench_deep_zoom(c: &mut Criterion) {
    let mut parms = Parms::default();
    parms.set_resolution(256, 256);
    parms.max_iterations = 1000;
    parms.zoom = 200.0;
    parms.offset = DVec2::new(9000.0, 0.0);
    let mut d = driver(256, 256);
    d.reset(parms);
    let input = ViewInput::default();
    render_frame(&mut d, &input);

    c.bench_function("frame_256x256_1000iter", |b| {
        b.iter(|| render_frame(&mut d, &input));
    });
}

fn bench_readback(c: &mut Criterion) {
    let mut d = driver(640, 480);
    render_frame(&mut d, &ViewInput::default());

    c.bench_function("readback_640x480", |b| {
        b.iter(|| d.output_image().unwrap());
    });
}

criterion_group!(benches, bench_full_frame, bench_deep_zoom, bench_readback);
criterion_main!(benches);
