//! Generation settings, presets and validation.
//!
//! Every field has a default so a JSON file only needs to name what it
//! changes. A config is validated once before a run and never mutated
//! while generating.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use tussock_procgen::{CardRecipe, GrowthRecipe, InstanceRecipe, RadiusProfile};
use tussock_scatter::{ChildRecipe, ClumpRecipe, DistributionMode, SamplerRecipe};

use crate::error::{Error, Result};
use crate::guides::GuideCurve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    Custom,
    ShortGrass,
    LushMeadow,
    SparseField,
    ForestFloor,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Custom,
        Preset::ShortGrass,
        Preset::LushMeadow,
        Preset::SparseField,
        Preset::ForestFloor,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Custom => "custom",
            Preset::ShortGrass => "short_grass",
            Preset::LushMeadow => "lush_meadow",
            Preset::SparseField => "sparse_field",
            Preset::ForestFloor => "forest_floor",
        }
    }

    pub fn from_name(name: &str) -> Option<Preset> {
        let normalized = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Preset::ALL.into_iter().find(|p| p.name() == normalized)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::Custom => "Custom settings",
            Preset::ShortGrass => "Short lawn grass",
            Preset::LushMeadow => "Dense, wild meadow grass",
            Preset::SparseField => "Patchy grassland with bare spots",
            Preset::ForestFloor => "Long forest undergrowth",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionSettings {
    pub mode: DistributionMode,
    pub density_group: Option<String>,
    pub noise_scale: f32,
    pub noise_threshold: f32,
    pub slope_mask: bool,
    /// Radians from straight up
    pub slope_max_angle: f32,
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            mode: DistributionMode::Even,
            density_group: None,
            noise_scale: 5.0,
            noise_threshold: 0.5,
            slope_mask: false,
            slope_max_angle: 60f32.to_radians(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubeSettings {
    pub segments: u32,
    pub sides: u32,
    pub root_radius: f32,
    pub tip_radius: f32,
    pub radius_random: f32,
}

impl Default for TubeSettings {
    fn default() -> Self {
        Self {
            segments: 6,
            sides: 4,
            root_radius: 0.005,
            tip_radius: 0.001,
            radius_random: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardSettings {
    pub width: f32,
    pub subdivisions: u32,
    pub variation: bool,
    /// Image used by the card material instead of the flat hair colour
    pub texture: Option<String>,
}

impl Default for CardSettings {
    fn default() -> Self {
        Self {
            width: 0.02,
            subdivisions: 3,
            variation: true,
            texture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectSettings {
    pub scale: f32,
    pub scale_random: f32,
    pub rotation_random: f32,
    pub align_to_normal: bool,
    pub use_instance_materials: bool,
}

impl Default for ObjectSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            scale_random: 0.3,
            rotation_random: 1.0,
            align_to_normal: true,
            use_instance_materials: true,
        }
    }
}

/// What geometry each strand becomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderSettings {
    Tubes(TubeSettings),
    Cards(CardSettings),
    Object(ObjectSettings),
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings::Tubes(TubeSettings::default())
    }
}

impl RenderSettings {
    pub fn kind(&self) -> &'static str {
        match self {
            RenderSettings::Tubes(_) => "tubes",
            RenderSettings::Cards(_) => "cards",
            RenderSettings::Object(_) => "object",
        }
    }

    /// Object rendering that keeps the instance's own materials and UVs
    pub fn uses_instance_materials(&self) -> bool {
        matches!(self, RenderSettings::Object(o) if o.use_instance_materials)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClumpSettings {
    pub factor: f32,
    pub random: f32,
    pub length_influence: f32,
}

impl Default for ClumpSettings {
    fn default() -> Self {
        Self {
            factor: 0.0,
            random: 0.5,
            length_influence: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthSettings {
    pub normal_factor: f32,
    pub gravity: f32,
    pub noise_factor: f32,
    pub noise_scale: f32,
    pub wave_frequency: f32,
    pub wave_amplitude: f32,
    pub kink_frequency: f32,
    pub kink_amplitude: f32,
}

impl Default for GrowthSettings {
    fn default() -> Self {
        Self {
            normal_factor: 1.0,
            gravity: 0.0,
            noise_factor: 0.1,
            noise_scale: 1.0,
            wave_frequency: 0.0,
            wave_amplitude: 0.0,
            kink_frequency: 0.0,
            kink_amplitude: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildrenSettings {
    pub enabled: bool,
    pub count: u32,
    pub radius: f32,
    /// Length multiplier relative to parents
    pub length: f32,
}

impl Default for ChildrenSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 3,
            radius: 0.02,
            length: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub enabled: bool,
    pub percentage: u32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            percentage: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub keep_emitter_geometry: bool,
    pub shade_smooth: bool,
    pub hair_color: [f32; 4],
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            keep_emitter_geometry: true,
            shade_smooth: true,
            hair_color: [0.3, 0.7, 0.2, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSettings {
    /// Strands per progress report
    pub batch_size: usize,
    pub parallel: bool,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            batch_size: 5000,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Fixed run seed; drawn at random when absent
    pub seed: Option<u32>,
    pub hair_count: u32,
    pub hair_length: f32,
    pub length_random: f32,
    pub distribution: DistributionSettings,
    pub render: RenderSettings,
    pub clump: ClumpSettings,
    pub growth: GrowthSettings,
    pub children: ChildrenSettings,
    pub preview: PreviewSettings,
    pub output: OutputSettings,
    pub performance: PerformanceSettings,
    pub guides: Vec<GuideCurve>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            hair_count: 10_000,
            hair_length: 0.15,
            length_random: 0.3,
            distribution: DistributionSettings::default(),
            render: RenderSettings::default(),
            clump: ClumpSettings::default(),
            growth: GrowthSettings::default(),
            children: ChildrenSettings::default(),
            preview: PreviewSettings::default(),
            output: OutputSettings::default(),
            performance: PerformanceSettings::default(),
            guides: Vec::new(),
        }
    }
}

impl GenerationConfig {
    /// Defaults overlaid with a preset's look
    pub fn from_preset(preset: Preset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    /// Overwrites the fields a preset controls and leaves the rest alone
    pub fn apply_preset(&mut self, preset: Preset) {
        let (length, length_random, count) = match preset {
            Preset::Custom => return,
            Preset::ShortGrass => (0.08, 0.2, 15_000),
            Preset::LushMeadow => (0.25, 0.4, 8_000),
            Preset::SparseField => (0.15, 0.6, 5_000),
            Preset::ForestFloor => (0.35, 0.5, 6_000),
        };
        self.hair_length = length;
        self.length_random = length_random;
        self.hair_count = count;
        self.distribution.mode = DistributionMode::Noise;
        self.distribution.slope_mask = true;
        self.children.enabled = true;

        match preset {
            Preset::ShortGrass => {
                self.set_noise(8.0, 0.3);
                self.set_clump(0.3, 0.4, 0.6);
                self.set_children(4, 0.01, 0.9);
                self.set_growth(0.8, 0.1, 0.05);
                self.distribution.slope_max_angle = 45f32.to_radians();
                self.output.hair_color = [0.2, 0.6, 0.1, 1.0];
            }
            Preset::LushMeadow => {
                self.set_noise(12.0, 0.4);
                self.set_clump(0.7, 0.6, 0.8);
                self.set_children(5, 0.03, 0.8);
                self.set_growth(1.2, 0.3, 0.15);
                self.growth.wave_frequency = 1.0;
                self.growth.wave_amplitude = 0.1;
                self.distribution.slope_max_angle = 35f32.to_radians();
                self.output.hair_color = [0.3, 0.7, 0.2, 1.0];
            }
            Preset::SparseField => {
                self.set_noise(6.0, 0.6);
                self.set_clump(0.5, 0.8, 0.4);
                self.set_children(3, 0.02, 0.7);
                self.set_growth(1.0, 0.2, 0.2);
                self.distribution.slope_max_angle = 50f32.to_radians();
                self.output.hair_color = [0.4, 0.6, 0.3, 1.0];
            }
            Preset::ForestFloor => {
                self.set_noise(15.0, 0.5);
                self.set_clump(0.8, 0.4, 0.9);
                self.set_children(6, 0.04, 0.6);
                self.set_growth(1.5, 0.4, 0.3);
                self.growth.wave_frequency = 2.0;
                self.growth.wave_amplitude = 0.2;
                self.growth.kink_frequency = 1.0;
                self.growth.kink_amplitude = 0.1;
                self.distribution.slope_max_angle = 60f32.to_radians();
                self.output.hair_color = [0.2, 0.5, 0.1, 1.0];
            }
            Preset::Custom => {}
        }
    }

    fn set_noise(&mut self, scale: f32, threshold: f32) {
        self.distribution.noise_scale = scale;
        self.distribution.noise_threshold = threshold;
    }

    fn set_clump(&mut self, factor: f32, random: f32, length_influence: f32) {
        self.clump = ClumpSettings {
            factor,
            random,
            length_influence,
        };
    }

    fn set_children(&mut self, count: u32, radius: f32, length: f32) {
        self.children.count = count;
        self.children.radius = radius;
        self.children.length = length;
    }

    fn set_growth(&mut self, normal_factor: f32, gravity: f32, noise_factor: f32) {
        self.growth.normal_factor = normal_factor;
        self.growth.gravity = gravity;
        self.growth.noise_factor = noise_factor;
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Strand roots to sample, after the preview percentage
    pub fn effective_hair_count(&self) -> usize {
        if self.preview.enabled {
            (self.hair_count as u64 * self.preview.percentage as u64 / 100) as usize
        } else {
            self.hair_count as usize
        }
    }

    /// Rejects the first field outside its range
    pub fn validate(&self) -> Result<()> {
        check_range("hair_count", self.hair_count, 1, 1_000_000)?;
        check_range("hair_length", self.hair_length, 0.01, f32::MAX)?;
        check_range("length_random", self.length_random, 0.0, 1.0)?;

        let d = &self.distribution;
        check_range("distribution.noise_scale", d.noise_scale, 0.1, 50.0)?;
        check_range("distribution.noise_threshold", d.noise_threshold, 0.0, 1.0)?;
        check_range(
            "distribution.slope_max_angle",
            d.slope_max_angle,
            0.0,
            std::f32::consts::FRAC_PI_2,
        )?;

        match &self.render {
            RenderSettings::Tubes(t) => {
                check_range("render.segments", t.segments, 1, 20)?;
                check_range("render.sides", t.sides, 2, 8)?;
                check_range("render.root_radius", t.root_radius, 0.001, f32::MAX)?;
                check_range("render.tip_radius", t.tip_radius, 0.0, f32::MAX)?;
                check_range("render.radius_random", t.radius_random, 0.0, 1.0)?;
            }
            RenderSettings::Cards(c) => {
                check_range("render.width", c.width, 0.001, 0.1)?;
                check_range("render.subdivisions", c.subdivisions, 1, 8)?;
            }
            RenderSettings::Object(o) => {
                check_range("render.scale", o.scale, 0.01, 10.0)?;
                check_range("render.scale_random", o.scale_random, 0.0, 1.0)?;
                check_range("render.rotation_random", o.rotation_random, 0.0, 1.0)?;
            }
        }

        check_range("clump.factor", self.clump.factor, 0.0, 1.0)?;
        check_range("clump.random", self.clump.random, 0.0, 1.0)?;
        check_range("clump.length_influence", self.clump.length_influence, 0.0, 1.0)?;

        let g = &self.growth;
        check_range("growth.normal_factor", g.normal_factor, 0.0, 2.0)?;
        check_range("growth.gravity", g.gravity, -2.0, 2.0)?;
        check_range("growth.noise_factor", g.noise_factor, 0.0, 2.0)?;
        check_range("growth.noise_scale", g.noise_scale, 0.1, 10.0)?;
        check_range("growth.wave_frequency", g.wave_frequency, 0.0, 5.0)?;
        check_range("growth.wave_amplitude", g.wave_amplitude, 0.0, 0.5)?;
        check_range("growth.kink_frequency", g.kink_frequency, 0.0, 10.0)?;
        check_range("growth.kink_amplitude", g.kink_amplitude, 0.0, 1.0)?;

        check_range("children.count", self.children.count, 0, 10)?;
        check_range("children.radius", self.children.radius, 0.001, 1.0)?;
        check_range("children.length", self.children.length, 0.1, 2.0)?;

        check_range("preview.percentage", self.preview.percentage, 1, 100)?;
        check_range("performance.batch_size", self.performance.batch_size, 100, 50_000)?;

        for (i, c) in self.output.hair_color.iter().enumerate() {
            check_range(&format!("output.hair_color[{}]", i), *c, 0.0, 1.0)?;
        }
        for (i, guide) in self.guides.iter().enumerate() {
            check_range(&format!("guides[{}].influence", i), guide.influence, 0.0, 1.0)?;
        }

        Ok(())
    }

    pub fn sampler_recipe(&self) -> SamplerRecipe {
        SamplerRecipe {
            mode: self.distribution.mode,
            noise_scale: self.distribution.noise_scale,
            noise_threshold: self.distribution.noise_threshold,
            slope_mask: self.distribution.slope_mask,
            slope_max_angle: self.distribution.slope_max_angle,
            ..Default::default()
        }
    }

    /// `None` when children are switched off
    pub fn child_recipe(&self) -> Option<ChildRecipe> {
        (self.children.enabled && self.children.count > 0).then_some(ChildRecipe {
            count: self.children.count,
            radius: self.children.radius,
        })
    }

    pub fn clump_recipe(&self) -> ClumpRecipe {
        ClumpRecipe {
            factor: self.clump.factor,
            random: self.clump.random,
            length_influence: self.clump.length_influence,
        }
    }

    pub fn growth_recipe(&self) -> GrowthRecipe {
        let segments = match &self.render {
            RenderSettings::Tubes(t) => t.segments,
            _ => TubeSettings::default().segments,
        };
        let g = &self.growth;
        GrowthRecipe {
            segments,
            normal_factor: g.normal_factor,
            gravity: g.gravity,
            noise_factor: g.noise_factor,
            noise_scale: g.noise_scale,
            wave_frequency: g.wave_frequency,
            wave_amplitude: g.wave_amplitude,
            kink_frequency: g.kink_frequency,
            kink_amplitude: g.kink_amplitude,
        }
    }

    pub fn radius_profile(tubes: &TubeSettings) -> RadiusProfile {
        RadiusProfile {
            root_radius: tubes.root_radius,
            tip_radius: tubes.tip_radius,
            radius_random: tubes.radius_random,
        }
    }

    pub fn card_recipe(&self, cards: &CardSettings) -> CardRecipe {
        CardRecipe {
            width: cards.width,
            subdivisions: cards.subdivisions,
            variation: cards.variation,
            gravity: self.growth.gravity,
        }
    }

    pub fn instance_recipe(object: &ObjectSettings) -> InstanceRecipe {
        InstanceRecipe {
            scale: object.scale,
            scale_random: object.scale_random,
            rotation_random: object.rotation_random,
            align_to_normal: object.align_to_normal,
            use_instance_materials: object.use_instance_materials,
        }
    }
}

fn check_range<T: PartialOrd + Display>(field: &str, value: T, min: T, max: T) -> Result<()> {
    // Written so NaN fails too
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{} must be in [{}, {}], got {}",
            field, min, max, value
        )))
    }
}
