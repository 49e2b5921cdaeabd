//! Composition throughput over a typical 80x24 surface with overlays.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use deck_surface::Surface;

fn build_surface() -> Surface {
    let mut s = Surface::new(80, 24);
    for _ in 0..2 {
        s.add_layer();
    }
    for row in 0..24 {
        for col in 0..80 {
            s.layer_mut(0).set_char(row, col, 'b');
            if (row + col) % 3 == 0 {
                s.layer_mut(1).set_char(row, col, 'm');
                s.layer_mut(1).set_opacity(row, col, 200);
            }
            if (row * col) % 7 == 0 {
                s.layer_mut(2).set_char(row, col, 't');
                s.layer_mut(2).set_opacity(row, col, 10);
            }
        }
    }
    s
}

fn bench_compose(c: &mut Criterion) {
    let surface = build_surface();

    c.bench_function("compose_full_frame", |b| {
        b.iter(|| {
            let mut out = String::with_capacity(80 * 24 * 4);
            for row in 0..surface.height() {
                out.push_str(&surface.utf8_line(row));
            }
            black_box(out)
        })
    });

    c.bench_function("compose_single_row", |b| {
        b.iter(|| black_box(surface.utf8_line(12)))
    });
}

criterion_group!(benches, bench_compose);
criterion_main!(benches);
