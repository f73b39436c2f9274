//! 64-bit DCT perceptual hash.
//!
//! Hashes must be comparable across machines, so the cosine table is built
//! from a fixed-order power series instead of the platform `cos`, and the
//! transform accumulates in a fixed order.

use std::f64::consts::PI;
use std::sync::LazyLock;

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};

/// Side of the square the image is reduced to before the transform.
const SIZE: usize = 64;
/// Side of the low-frequency block that forms the hash.
const BLOCK: usize = 8;

/// `COS[u][x] = cos((2x + 1) u π / 2N)` for `u < BLOCK`, `x < N`.
static COS: LazyLock<[[f64; SIZE]; BLOCK]> = LazyLock::new(|| {
    let mut table = [[0.0; SIZE]; BLOCK];
    for (u, row) in table.iter_mut().enumerate() {
        for (x, c) in row.iter_mut().enumerate() {
            *c = cos_pi_over_128((2 * x + 1) * u);
        }
    }
    table
});

/// `cos(k π / 128)`, reduced by symmetry onto `[0, π/2]` before the series.
fn cos_pi_over_128(k: usize) -> f64 {
    let k = k % 256;
    let k = if k > 128 { 256 - k } else { k };
    if k > 64 {
        -cos_series(PI * (128 - k) as f64 / 128.0)
    } else {
        cos_series(PI * k as f64 / 128.0)
    }
}

/// Taylor series of cos for `0 <= theta <= π/2`.
fn cos_series(theta: f64) -> f64 {
    let t2 = theta * theta;
    let mut term = 1.0;
    let mut sum = 1.0;
    for n in 1..=12 {
        let n = n as f64;
        term *= -t2 / ((2.0 * n - 1.0) * (2.0 * n));
        sum += term;
    }
    sum
}

fn scale(u: usize) -> f64 {
    if u == 0 {
        (1.0 / SIZE as f64).sqrt()
    } else {
        (2.0 / SIZE as f64).sqrt()
    }
}

/// First `BLOCK` orthonormal DCT-II coefficients of a length-`SIZE` signal.
fn dct_low(signal: &[f64; SIZE]) -> [f64; BLOCK] {
    let mut out = [0.0; BLOCK];
    for (u, coef) in out.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (x, value) in signal.iter().enumerate() {
            sum += value * COS[u][x];
        }
        *coef = sum * scale(u);
    }
    out
}

/// Reduce to 64×64 BT.601 luma, rounded to 8 bits.
pub fn luma_64(rgb: &RgbImage) -> GrayImage {
    let small = imageops::resize(rgb, SIZE as u32, SIZE as u32, FilterType::CatmullRom);
    GrayImage::from_fn(SIZE as u32, SIZE as u32, |x, y| {
        let [r, g, b] = small.get_pixel(x, y).0;
        let luma = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Low-frequency 8×8 DCT block of a 64×64 luma image, row-major by vertical frequency.
fn low_frequencies(luma: &GrayImage) -> [f64; BLOCK * BLOCK] {
    // Horizontal pass over every row, keeping only the low frequencies.
    let mut rows = [[0.0; BLOCK]; SIZE];
    for (y, row) in rows.iter_mut().enumerate() {
        let mut signal = [0.0; SIZE];
        for (x, v) in signal.iter_mut().enumerate() {
            *v = f64::from(luma.get_pixel(x as u32, y as u32).0[0]);
        }
        *row = dct_low(&signal);
    }

    let mut block = [0.0; BLOCK * BLOCK];
    for u in 0..BLOCK {
        let mut column = [0.0; SIZE];
        for (y, v) in column.iter_mut().enumerate() {
            *v = rows[y][u];
        }
        for (v, coef) in dct_low(&column).into_iter().enumerate() {
            block[v * BLOCK + u] = coef;
        }
    }
    block
}

/// Hash a prepared RGB image. Bit 63 holds the DC term.
pub fn perceptual_hash(rgb: &RgbImage) -> u64 {
    let block = low_frequencies(&luma_64(rgb));

    let mut sorted = block;
    sorted.sort_by(f64::total_cmp);
    let median = (sorted[31] + sorted[32]) / 2.0;

    block
        .iter()
        .enumerate()
        .filter(|(_, coef)| **coef > median)
        .fold(0u64, |hash, (i, _)| hash | (1 << (63 - i)))
}

pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}
