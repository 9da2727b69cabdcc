//! Procedural alpha textures for hair cards.
//!
//! Strands are painted into a float canvas with max-blended colour and
//! additive alpha, then quantized into an [`RgbaImage`]. Row 0 of the
//! canvas is the root of the card, which ends up at the bottom of the image.

use image::{Rgba, RgbaImage};
use rand::Rng;
use std::f32::consts::PI;

/// Which pattern a texture recipe paints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Card { strand_count: u32 },
    Atlas { regions: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureRecipe {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub kind: TextureKind,
}

impl TextureRecipe {
    pub fn card(name: &str, strand_count: u32) -> Self {
        Self {
            name: name.to_string(),
            width: 256,
            height: 512,
            kind: TextureKind::Card { strand_count },
        }
    }

    pub fn atlas(name: &str, regions: u32) -> Self {
        Self {
            name: name.to_string(),
            width: 512,
            height: 512,
            kind: TextureKind::Atlas { regions },
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> RgbaImage {
        match self.kind {
            TextureKind::Card { strand_count } => {
                generate_card_texture(self.width, self.height, strand_count, rng)
            }
            TextureKind::Atlas { regions } => {
                generate_atlas_texture(self.width, self.height, regions, rng)
            }
        }
    }
}

/// The stock set: basic, dense and sparse cards plus a four-region atlas
pub fn default_textures() -> Vec<TextureRecipe> {
    vec![
        TextureRecipe::card("HairCard_Basic", 5),
        TextureRecipe::card("HairCard_Dense", 8),
        TextureRecipe::card("HairCard_Sparse", 3),
        TextureRecipe::atlas("HairCard_Atlas", 4),
    ]
}

struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; (width * height) as usize],
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: [f32; 3], alpha: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let pixel = &mut self.pixels[(y * self.width + x) as usize];
        let blended = (pixel[3] + alpha).min(1.0);
        if blended > pixel[3] {
            for c in 0..3 {
                pixel[c] = pixel[c].max(color[c]);
            }
            pixel[3] = blended;
        }
    }

    fn into_image(self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        for (i, pixel) in self.pixels.iter().enumerate() {
            let x = i as u32 % self.width;
            let y = i as u32 / self.width;
            let quantized = pixel.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
            image.put_pixel(x, self.height - 1 - y, Rgba(quantized));
        }
        image
    }
}

fn strand_color<R: Rng + ?Sized>(rng: &mut R, red: f32, darkness: f32) -> [f32; 3] {
    [
        red * rng.gen_range(0.8..1.2),
        darkness * 0.7 * rng.gen_range(0.8..1.2),
        darkness * 0.4 * rng.gen_range(0.8..1.2),
    ]
}

/// Pixel columns covered by a strand of half-width `half_width` at `center`
fn strand_span(center: f32, half_width: f32, lo: u32, hi: u32) -> std::ops::Range<u32> {
    let start = ((center - half_width) as i64).max(lo as i64) as u32;
    let end = ((center + half_width) as i64).min(hi as i64).max(start as i64) as u32;
    start..end
}

/// Single card: a handful of gently bent strands tapering over the first
/// and last tenth of their length
pub fn generate_card_texture<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    strand_count: u32,
    rng: &mut R,
) -> RgbaImage {
    let mut canvas = Canvas::new(width, height);
    let w = width as f32;

    for _ in 0..strand_count {
        let x_center = rng.gen_range(0.2..0.8) * w;
        let strand_width = rng.gen_range(8.0..20.0);
        let darkness = rng.gen_range(0.3..0.7);
        let curve = rng.gen_range(-0.3..0.3);

        for y in 0..height {
            let t = y as f32 / height as f32;
            let strand_x = x_center + curve * (t * PI).sin() * w * 0.3;

            let taper = if t < 0.1 {
                t * 10.0
            } else if t > 0.9 {
                (1.0 - t) * 10.0
            } else {
                1.0
            };
            let current_width = strand_width * taper;

            for x in strand_span(strand_x, current_width, 0, width) {
                let distance = (x as f32 - strand_x).abs();
                let alpha = (1.0 - distance / current_width).max(0.0) * rng.gen_range(0.8..1.2);
                let color = strand_color(rng, darkness, darkness);
                canvas.blend(x, y, color, alpha.clamp(0.0, 1.0));
            }
        }
    }

    canvas.into_image()
}

/// Atlas split into a square grid of regions, each with its own strand
/// shape: straight, S-curve or a single wave
pub fn generate_atlas_texture<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    regions: u32,
    rng: &mut R,
) -> RgbaImage {
    let mut canvas = Canvas::new(width, height);
    let per_side = ((regions as f32).sqrt() as u32).max(1);
    let region_width = width / per_side;
    let region_height = height / per_side;

    for region_y in 0..per_side {
        for region_x in 0..per_side {
            let base_x = region_x * region_width;
            let base_y = region_y * region_height;
            let curve_type = (region_x + region_y) % 3;
            let hue = (region_x + region_y) as f32 * 0.1;
            let rw = region_width as f32;

            for _ in 0..rng.gen_range(3..=7) {
                let x_center = base_x as f32 + rng.gen_range(0.2..0.8) * rw;
                let strand_width = rng.gen_range(6.0..15.0);
                let darkness = rng.gen_range(0.4..0.8);

                for y in 0..region_height {
                    let t = y as f32 / region_height as f32;
                    let x_offset = match curve_type {
                        0 => 0.0,
                        1 => (t * PI * 2.0).sin() * rw * 0.2,
                        _ => (t * PI).sin() * rw * 0.3,
                    };
                    let strand_x = x_center + x_offset;

                    let taper = if t < 0.15 {
                        t / 0.15
                    } else if t > 0.85 {
                        (1.0 - t) / 0.15
                    } else {
                        1.0
                    };
                    let current_width = strand_width * taper;

                    for x in strand_span(strand_x, current_width, base_x, base_x + region_width) {
                        let distance = (x as f32 - strand_x).abs();
                        let alpha =
                            (1.0 - distance / current_width).max(0.0) * rng.gen_range(0.7..1.0);
                        let color = strand_color(rng, darkness + hue, darkness);
                        canvas.blend(x, base_y + y, color, alpha.clamp(0.0, 1.0));
                    }
                }
            }
        }
    }

    canvas.into_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_card_texture_has_alpha_strands() {
        let mut rng = StdRng::seed_from_u64(5);
        let image = generate_card_texture(64, 128, 3, &mut rng);
        assert_eq!(image.dimensions(), (64, 128));

        let painted = image.pixels().filter(|p| p.0[3] > 0).count();
        assert!(painted > 0);
        assert!(painted < (64 * 128) as usize);
    }

    #[test]
    fn test_card_texture_roots_taper() {
        let mut rng = StdRng::seed_from_u64(11);
        let image = generate_card_texture(64, 128, 5, &mut rng);
        // t = 0 has zero width and sits on the bottom row
        assert!((0..64).all(|x| image.get_pixel(x, 127).0[3] == 0));
    }

    #[test]
    fn test_atlas_paints_regions() {
        let mut rng = StdRng::seed_from_u64(2);
        let image = generate_atlas_texture(64, 64, 4, &mut rng);
        assert_eq!(image.dimensions(), (64, 64));
        assert!(image.pixels().any(|p| p.0[3] > 0));
    }

    #[test]
    fn test_default_set() {
        let set = default_textures();
        assert_eq!(set.len(), 4);
        assert_eq!(set[1].kind, TextureKind::Card { strand_count: 8 });
        assert_eq!((set[3].width, set[3].height), (512, 512));
    }
}
