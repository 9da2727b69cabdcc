//! Tussock - strand mesh generator
//!
//! # Commands
//!
//! - `tussock generate` - Grow hair or grass over an OBJ emitter and write the result
//! - `tussock presets` - List presets, or print one as a JSON config
//! - `tussock textures` - Bake the stock hair card alpha textures to PNG
//!
//! # Usage
//!
//! ```bash
//! tussock generate ground.obj -o grass.obj --preset lush_meadow --seed 7
//! tussock presets forest_floor > forest.json
//! tussock generate ground.obj -o grass.obj --config forest.json --full --finalize
//! ```

mod asset_loader;
mod obj_writer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tussock_core::{
    CardSettings, GenerationConfig, Generator, ObjectSettings, Preset, RenderSettings,
    TubeSettings,
};

use crate::asset_loader::{load_obj, load_vertex_groups};
use crate::obj_writer::write_obj;

/// Tussock - strand mesh generator
#[derive(Parser)]
#[command(name = "tussock")]
#[command(about = "Procedural hair and grass meshes from OBJ emitters")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grow strands over an emitter mesh
    Generate(GenerateArgs),

    /// List presets, or print one as JSON
    Presets {
        /// Preset to print
        name: Option<String>,
    },

    /// Write the stock card textures as PNG files
    Textures {
        /// Output directory
        dir: PathBuf,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RenderKind {
    Tubes,
    Cards,
    Object,
}

impl RenderKind {
    fn name(self) -> &'static str {
        match self {
            RenderKind::Tubes => "tubes",
            RenderKind::Cards => "cards",
            RenderKind::Object => "object",
        }
    }

    fn default_settings(self) -> RenderSettings {
        match self {
            RenderKind::Tubes => RenderSettings::Tubes(TubeSettings::default()),
            RenderKind::Cards => RenderSettings::Cards(CardSettings::default()),
            RenderKind::Object => RenderSettings::Object(ObjectSettings::default()),
        }
    }
}

#[derive(Args)]
struct GenerateArgs {
    /// Emitter mesh (OBJ)
    emitter: PathBuf,

    /// Output mesh (OBJ); materials go to a sibling .mtl
    #[arg(short, long)]
    output: PathBuf,

    /// JSON config; unset fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Preset applied on top of the config
    #[arg(long)]
    preset: Option<String>,

    /// Mesh placed on every strand root with `--render object`
    #[arg(long)]
    instance: Option<PathBuf>,

    /// JSON map of vertex group name to per-vertex weights
    #[arg(long)]
    weights: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u32>,

    /// Hair count before the preview percentage
    #[arg(long)]
    count: Option<u32>,

    #[arg(long, value_enum)]
    render: Option<RenderKind>,

    /// Keep the emitter's own faces in the output
    #[arg(long)]
    keep_emitter: Option<bool>,

    /// Generate every strand instead of the preview percentage
    #[arg(long)]
    full: bool,

    /// Name the result after the emitter instead of the preview name
    #[arg(long)]
    finalize: bool,
}

fn main() {
    tussock_core::logging::init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Presets { name } => presets(name.as_deref()),
        Commands::Textures { dir, seed } => textures(dir, seed),
    }
}

fn build_config(args: &GenerateArgs) -> Result<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GenerationConfig::default(),
    };

    if let Some(name) = &args.preset {
        let preset =
            Preset::from_name(name).with_context(|| format!("unknown preset '{}'", name))?;
        config.apply_preset(preset);
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(count) = args.count {
        config.hair_count = count;
    }
    if let Some(kind) = args.render {
        if config.render.kind() != kind.name() {
            config.render = kind.default_settings();
        }
    }
    if let Some(keep) = args.keep_emitter {
        config.output.keep_emitter_geometry = keep;
    }
    if args.full {
        config.preview.enabled = false;
    }
    Ok(config)
}

fn generate(args: GenerateArgs) -> Result<()> {
    let config = build_config(&args)?;

    let mut emitter = load_obj(&args.emitter)?;
    if let Some(weights) = &args.weights {
        load_vertex_groups(&mut emitter, weights)?;
    }
    let instance = args.instance.as_deref().map(load_obj).transpose()?;

    let mut generator = Generator::new(config)?;
    if let Some(instance) = &instance {
        generator.set_instance(instance);
    }
    generator.set_progress_callback(|stage, fraction| {
        log::debug!("{} ({:.0}%)", stage.label(), fraction * 100.0);
    });

    let output = generator.generate(&emitter)?;
    let report = output.report.clone();

    let mesh = if args.finalize {
        output.finalize(&emitter.name)
    } else {
        output.mesh
    };
    write_obj(&mesh, &args.output)?;

    println!("Seed:      {}", report.seed);
    println!(
        "Strands:   {} ({} roots, {} children)",
        report.strands(),
        report.samples,
        report.children
    );
    println!("Clumps:    {}", report.clump_centers);
    println!(
        "Faces:     {} ({} skipped)",
        report.commit.created, report.commit.skipped
    );
    println!("Output:    {} -> {}", mesh.name, args.output.display());
    Ok(())
}

fn presets(name: Option<&str>) -> Result<()> {
    match name {
        None => {
            for preset in Preset::ALL {
                println!("{:<14} {}", preset.name(), preset.description());
            }
        }
        Some(name) => {
            let preset =
                Preset::from_name(name).with_context(|| format!("unknown preset '{}'", name))?;
            println!("{}", GenerationConfig::from_preset(preset).to_json()?);
        }
    }
    Ok(())
}

fn textures(dir: PathBuf, seed: u64) -> Result<()> {
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let mut rng = StdRng::seed_from_u64(seed);
    for recipe in tussock_procgen::default_textures() {
        let image = recipe.generate(&mut rng);
        let path = dir.join(format!("{}.png", recipe.name));
        image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Wrote texture {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> GenerateArgs {
        let mut argv = vec!["tussock", "generate"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Generate(args) => args,
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_overrides_apply_over_preset() {
        let args = parse(&[
            "in.obj", "-o", "out.obj", "--preset", "short_grass", "--seed", "9", "--count",
            "200", "--render", "cards", "--keep-emitter", "false", "--full",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.seed, Some(9));
        assert_eq!(config.hair_count, 200);
        assert_eq!(config.render.kind(), "cards");
        assert!(!config.output.keep_emitter_geometry);
        assert!(!config.preview.enabled);
        assert!(config.children.enabled);
    }

    #[test]
    fn test_unknown_preset_is_error() {
        let args = parse(&["in.obj", "-o", "out.obj", "--preset", "moss"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_matching_render_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"render": {"type": "tubes", "sides": 5}}"#).unwrap();

        let config_arg = path.to_string_lossy().into_owned();
        let args = parse(&["in.obj", "-o", "out.obj", "--config", &config_arg, "--render", "tubes"]);
        let config = build_config(&args).unwrap();
        match config.render {
            RenderSettings::Tubes(tubes) => assert_eq!(tubes.sides, 5),
            other => panic!("unexpected render {:?}", other),
        }
    }
}
