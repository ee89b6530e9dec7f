use criterion::{black_box, criterion_group, criterion_main, Criterion};
use emblemgen::{compose_emblem, png, Bitmap, EmblemRequest};

// Emblem sprites are 256x256
const SIZE: u32 = 256;

fn gradient(seed: u32) -> Bitmap {
    let mut pixels = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            pixels.extend_from_slice(&[
                (x ^ seed) as u8,
                (y + seed) as u8,
                (x + y) as u8,
                if (x * y + seed) % 7 == 0 { 0 } else { 255 },
            ]);
        }
    }
    Bitmap::new(SIZE, SIZE, pixels).expect("gradient size")
}

fn bench_codec(c: &mut Criterion) {
    let image = gradient(3);
    let encoded = png::encode(&image);

    c.bench_function("png_encode_256", |b| b.iter(|| png::encode(black_box(&image))));
    c.bench_function("png_decode_256", |b| {
        b.iter(|| png::decode(black_box(&encoded)).expect("decode"))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let fg = gradient(1);
    let bg = gradient(2);
    let colors = "P10-S0-EP0-ES1-EF0-EB0-ET0"
        .parse::<EmblemRequest>()
        .expect("key")
        .colors()
        .expect("palette");

    c.bench_function("compose_emblem_256", |b| {
        b.iter(|| compose_emblem(black_box(&fg), black_box(&bg), &colors).expect("compose"))
    });

    let fg_png = png::encode(&fg);
    let bg_png = png::encode(&bg);
    c.bench_function("render_end_to_end_256", |b| {
        b.iter(|| {
            let fg = png::decode(black_box(&fg_png)).expect("fg");
            let bg = png::decode(black_box(&bg_png)).expect("bg");
            png::encode(&compose_emblem(&fg, &bg, &colors).expect("compose"))
        })
    });
}

criterion_group!(benches, bench_codec, bench_pipeline);
criterion_main!(benches);
