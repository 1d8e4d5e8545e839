use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dmg_ppu::ppu::palette::DEFAULT_DISPLAY_COLOURS;
use dmg_ppu::{GameBoyModel, Ppu};

/// Writes a small repeating tile pattern across the visible tile map and
/// tile data area, so the benchmark exercises cache rebuilds and real
/// pixel output rather than an all-zero framebuffer.
fn seed_synthetic_tiles(ppu: &mut Ppu) {
    for tile in 0..32u16 {
        let base = 0x8000 + tile * 16;
        for row in 0..8u16 {
            ppu.write_vram(base + row * 2, 0b1010_1010);
            ppu.write_vram(base + row * 2 + 1, 0b0110_0110);
        }
    }
    for map_offset in 0..(32 * 32) {
        ppu.write_vram(0x9800 + map_offset, (map_offset % 32) as u8);
    }
}

fn frame_tick_benchmark(c: &mut Criterion) {
    let mut ppu = Ppu::new(GameBoyModel::Dmg, DEFAULT_DISPLAY_COLOURS);
    seed_synthetic_tiles(&mut ppu);

    c.bench_function("dmg full frame", |b| {
        b.iter(|| {
            for _ in 0..70224 {
                black_box(ppu.tick(1));
            }
        })
    });
}

fn cgb_frame_tick_benchmark(c: &mut Criterion) {
    let mut ppu = Ppu::new(GameBoyModel::Cgb, DEFAULT_DISPLAY_COLOURS);
    seed_synthetic_tiles(&mut ppu);

    c.bench_function("cgb full frame", |b| {
        b.iter(|| {
            for _ in 0..70224 {
                black_box(ppu.tick(1));
            }
        })
    });
}

criterion_group!(benches, frame_tick_benchmark, cgb_frame_tick_benchmark);
criterion_main!(benches);
