use glam::{Vec2, Vec3};
use noise::Perlin;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tussock_procgen::{
    card_direction, card_width, emit_card, emit_tube, generate_strand, CardRecipe,
    GeometryBuffers, GrowthRecipe, RadiusProfile,
};

fn main() {
    println!("=== Procedural Strand Demo ===\n");

    let recipe = GrowthRecipe {
        segments: 6,
        gravity: 0.3,
        noise_factor: 0.15,
        wave_frequency: 1.0,
        wave_amplitude: 0.1,
        ..Default::default()
    };
    let profile = RadiusProfile::default();
    let perlin = Perlin::new(42);
    let mut rng = StdRng::seed_from_u64(42);

    println!("Recipe:");
    println!("  Segments: {}", recipe.segments);
    println!("  Gravity: {}", recipe.gravity);
    println!("  Wave: {} @ {}", recipe.wave_amplitude, recipe.wave_frequency);
    println!("  Radius: {} -> {}", profile.root_radius, profile.tip_radius);
    println!();

    let strand = generate_strand(
        Vec3::ZERO,
        Vec3::Z,
        0.25,
        &recipe,
        &profile,
        false,
        &perlin,
        &mut rng,
    );

    let mut tubes = GeometryBuffers::new();
    emit_tube(&mut tubes, &strand, 4, 0, Some(Vec2::splat(0.5)), &mut rng);

    println!("Tube strand:");
    println!("  Path points: {}", strand.points.len());
    println!("  Tip: {:?}", strand.points.last().copied().unwrap_or(Vec3::ZERO));
    println!("  Vertices: {}", tubes.vertices.len());
    println!("  Triangles: {}", tubes.faces.len());
    println!();

    let card = CardRecipe {
        gravity: recipe.gravity,
        ..Default::default()
    };
    let direction = card_direction(Vec3::ZERO, Vec3::Z, card.gravity, 0.15, 1.0, &perlin);
    let width = card_width(&card, &mut rng);
    let mut cards = GeometryBuffers::new();
    emit_card(&mut cards, Vec3::ZERO, direction, 0.25, width, &card, 0, None, &mut rng);

    println!("Hair card:");
    println!("  Width: {:.4}", width);
    println!("  Vertices: {}", cards.vertices.len());
    println!("  Triangles: {}", cards.faces.len());
    println!();

    let patch = 10_000;
    println!("Patch ({} strands as tubes):", patch);
    println!("  Total Vertices: {}", tubes.vertices.len() * patch);
    println!("  Total Triangles: {}", tubes.faces.len() * patch);
}
