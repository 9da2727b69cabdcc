//! Strand generation pipeline.
//!
//! One call to [`Generator::generate`] copies the emitter, scatters strand
//! roots over it, grows and emits every strand into [`GeometryBuffers`] and
//! commits them into the copy in one go. The emitter itself is never
//! modified; on error the copy is simply dropped.

use glam::{Vec2, Vec3};
use noise::Perlin;
use rayon::prelude::*;
use tussock_procgen::{
    card_direction, card_width, emit_card, emit_instance, emit_tube, generate_strand,
    instance_transform, symmetric, CardRecipe, GeometryBuffers, GrowthRecipe, InstanceRecipe,
    MeshData, RadiusProfile,
};
use tussock_scatter::{
    adjust_position, assign_clumps, blend_length, expand_children, sample_surface, ClumpMap,
    ClumpRecipe, DistributionMode, Stage, StrandSeed, SurfaceSample,
};

use crate::assembler::{commit_geometry, CommitReport};
use crate::config::{GenerationConfig, RenderSettings};
use crate::error::{Result, Warning};
use crate::guides::{DirectionField, GuideSet};
use crate::materials::{card_material, merge_instance_materials};
use crate::prune::{prune_original_geometry, PruneReport};

/// Name of a generated mesh until it is finalized
pub const PREVIEW_NAME: &str = "HairMesh_Preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Sampling,
    Children,
    Clumping,
    Strands,
    Assembling,
    Pruning,
    Materials,
    Shading,
}

impl ProgressStage {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressStage::Sampling => "Distributing hair points on surface",
            ProgressStage::Children => "Adding child strands",
            ProgressStage::Clumping => "Assigning clumps",
            ProgressStage::Strands => "Calculating strand geometry",
            ProgressStage::Assembling => "Building mesh",
            ProgressStage::Pruning => "Pruning original geometry",
            ProgressStage::Materials => "Setting up materials",
            ProgressStage::Shading => "Applying smooth shading",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Seed the run used, drawn at random if the config had none
    pub seed: u32,
    pub requested: usize,
    pub samples: usize,
    pub children: usize,
    pub clump_centers: usize,
    pub commit: CommitReport,
    pub prune: Option<PruneReport>,
    pub warnings: Vec<Warning>,
}

impl GenerationReport {
    pub fn strands(&self) -> usize {
        self.samples + self.children
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub mesh: MeshData,
    pub report: GenerationReport,
}

impl GenerationOutput {
    /// Turns the preview into a permanent mesh named after its emitter
    pub fn finalize(self, emitter_name: &str) -> MeshData {
        let mut mesh = self.mesh;
        mesh.name = format!("{}_HairMesh", emitter_name);
        log::info!("Finalized hair mesh as '{}'", mesh.name);
        mesh
    }
}

/// Session object for one or more generation runs with a fixed config
pub struct Generator<'a> {
    config: GenerationConfig,
    instance: Option<&'a MeshData>,
    progress_callback: Option<Box<dyn FnMut(ProgressStage, f32) + 'a>>,
}

impl<'a> Generator<'a> {
    /// Validates `config` up front
    pub fn new(config: GenerationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            instance: None,
            progress_callback: None,
        })
    }

    /// Skips validation so tests can drive values outside the config ranges
    #[cfg(test)]
    fn unchecked(config: GenerationConfig) -> Self {
        Self {
            config,
            instance: None,
            progress_callback: None,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Mesh copied onto every strand root by the object render type
    pub fn set_instance(&mut self, instance: &'a MeshData) {
        self.instance = Some(instance);
    }

    /// Called with the stage and its completed fraction, between batches
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: FnMut(ProgressStage, f32) + 'a,
    {
        self.progress_callback = Some(Box::new(callback));
    }

    fn progress(&mut self, stage: ProgressStage, fraction: f32) {
        if let Some(callback) = self.progress_callback.as_mut() {
            callback(stage, fraction);
        }
    }

    pub fn generate(&mut self, emitter: &MeshData) -> Result<GenerationOutput> {
        let config = self.config.clone();
        let seed = StrandSeed::new(config.seed.unwrap_or_else(rand::random));
        let start = std::time::Instant::now();

        let mut report = GenerationReport {
            seed: seed.value,
            requested: config.effective_hair_count(),
            ..Default::default()
        };
        log::info!(
            "Generating {} {} strands on '{}' (seed {})",
            report.requested,
            config.render.kind(),
            emitter.name,
            seed.value
        );

        let uses_instance_materials = config.render.uses_instance_materials();
        if !emitter.has_uv_layer() && !uses_instance_materials {
            report.warnings.push(Warning::MissingUvLayer);
        }

        // Roots
        self.progress(ProgressStage::Sampling, 0.0);
        let weights = match (&config.distribution.mode, &config.distribution.density_group) {
            (DistributionMode::Density, Some(group)) => match emitter.vertex_groups.get(group) {
                Some(weights) => Some(weights.as_slice()),
                None => {
                    report.warnings.push(Warning::MissingVertexGroup(group.clone()));
                    None
                }
            },
            _ => None,
        };
        let perlin = seed.perlin();
        let triangles = emitter.loop_triangles();
        let sampled = sample_surface(
            &triangles,
            weights,
            report.requested,
            &config.sampler_recipe(),
            &perlin,
            &mut seed.stage_rng(Stage::Sampling),
        )?;
        if !sampled.is_complete() {
            report.warnings.push(Warning::InsufficientSamples {
                produced: sampled.samples.len(),
                requested: sampled.requested,
            });
        }
        let mut samples = sampled.samples;
        report.samples = samples.len();
        self.progress(ProgressStage::Sampling, 1.0);

        if let Some(children) = config.child_recipe() {
            report.children = expand_children(&mut samples, &children, |i| {
                seed.index_rng(Stage::Children, i)
            });
            self.progress(ProgressStage::Children, 1.0);
        }

        // Assign every sample before any position moves
        let clump_recipe = config.clump_recipe();
        let clumps = assign_clumps(
            &samples,
            &clump_recipe,
            config.hair_length,
            config.length_random,
            &mut seed.stage_rng(Stage::Clumping),
        );
        if let Some(map) = &clumps {
            report.clump_centers = map.centers.len();
            pull_into_clumps(&mut samples, map, &clump_recipe, seed);
        }
        self.progress(ProgressStage::Clumping, 1.0);

        let emitter_material_count = emitter.materials.len() as u32;
        let instance = match (&config.render, self.instance) {
            (RenderSettings::Object(_), Some(mesh)) if mesh.face_count() > 0 => Some(mesh),
            (RenderSettings::Object(_), Some(mesh)) => {
                report.warnings.push(Warning::InvalidInstanceConfig(format!(
                    "instance '{}' has no faces",
                    mesh.name
                )));
                None
            }
            (RenderSettings::Object(_), None) => {
                report
                    .warnings
                    .push(Warning::InvalidInstanceConfig("no instance mesh given".to_string()));
                None
            }
            _ => None,
        };
        let skip_strands = matches!(config.render, RenderSettings::Object(_)) && instance.is_none();

        let buffers = if skip_strands {
            GeometryBuffers::new()
        } else {
            let emission =
                StrandEmitter::new(&config, emitter, instance, clumps.as_ref(), perlin, seed);
            self.emit_all(&emission, &samples)?
        };
        log::info!(
            "Calculated {} vertices, {} faces for {} strands in {:.2}s",
            buffers.vertices.len(),
            buffers.faces.len(),
            samples.len(),
            start.elapsed().as_secs_f64()
        );

        // Nothing above touched the output mesh
        self.progress(ProgressStage::Assembling, 0.0);
        let mut mesh = emitter.clone();
        mesh.name = PREVIEW_NAME.to_string();
        let original_faces = mesh.face_count();

        report.commit = commit_geometry(&mut mesh, buffers);
        if report.commit.skipped > 0 {
            report.warnings.push(Warning::FacesSkipped {
                count: report.commit.skipped,
            });
        }
        self.progress(ProgressStage::Assembling, 1.0);

        if !config.output.keep_emitter_geometry {
            report.prune = Some(prune_original_geometry(&mut mesh, original_faces));
            self.progress(ProgressStage::Pruning, 1.0);
        }

        match (&config.render, instance) {
            (RenderSettings::Object(_), Some(instance)) if uses_instance_materials => {
                merge_instance_materials(
                    &mut mesh,
                    &instance.materials,
                    emitter_material_count,
                    config.output.keep_emitter_geometry,
                );
                self.progress(ProgressStage::Materials, 1.0);
            }
            (RenderSettings::Cards(cards), _) => {
                mesh.append_materials([card_material(
                    config.output.hair_color,
                    cards.texture.as_deref(),
                )]);
                self.progress(ProgressStage::Materials, 1.0);
            }
            _ => {}
        }

        if config.output.shade_smooth {
            mesh.shade_smooth();
            self.progress(ProgressStage::Shading, 1.0);
        }

        for warning in &report.warnings {
            log::warn!("{}", warning);
        }
        log::info!(
            "Generated {} strands ({} children): {} faces, {} skipped in {:.2}s",
            report.strands(),
            report.children,
            report.commit.created,
            report.commit.skipped,
            start.elapsed().as_secs_f64()
        );

        Ok(GenerationOutput { mesh, report })
    }

    /// Emits strands batch by batch, reporting progress in between
    fn emit_all(
        &mut self,
        emission: &StrandEmitter<'_>,
        samples: &[SurfaceSample],
    ) -> Result<GeometryBuffers> {
        let total = samples.len();
        let batch_size = self.config.performance.batch_size.max(1);
        let parallel = self.config.performance.parallel;
        let mut buffers = GeometryBuffers::new();

        self.progress(ProgressStage::Strands, 0.0);
        let mut processed = 0;
        while processed < total {
            let end = (processed + batch_size).min(total);

            if parallel {
                let parts: Vec<GeometryBuffers> = (processed..end)
                    .into_par_iter()
                    .map(|i| {
                        let mut part = GeometryBuffers::new();
                        emission.emit(i, &samples[i], &mut part);
                        part
                    })
                    .collect();
                for part in parts {
                    buffers.append(part)?;
                }
            } else {
                for i in processed..end {
                    let mut part = GeometryBuffers::new();
                    emission.emit(i, &samples[i], &mut part);
                    buffers.append(part)?;
                }
            }

            processed = end;
            log::debug!("Processed strand {}/{}", processed, total);
            self.progress(ProgressStage::Strands, processed as f32 / total as f32);
        }

        Ok(buffers)
    }
}

/// Moves each sample part of the way to its clump center
fn pull_into_clumps(
    samples: &mut [SurfaceSample],
    map: &ClumpMap,
    recipe: &ClumpRecipe,
    seed: StrandSeed,
) {
    for (i, sample) in samples.iter_mut().enumerate() {
        if let Some(center) = map.center_of(i) {
            let mut rng = seed.index_rng(Stage::ClumpAdjust, i);
            sample.position =
                adjust_position(sample.position, center.sample.position, recipe, &mut rng);
        }
    }
}

/// Read-only state shared by all strand workers
struct StrandEmitter<'a> {
    config: &'a GenerationConfig,
    emitter: &'a MeshData,
    instance: Option<&'a MeshData>,
    clumps: Option<&'a ClumpMap>,
    guides: GuideSet,
    growth: GrowthRecipe,
    perlin: Perlin,
    seed: StrandSeed,
    emitter_material_count: u32,
}

impl<'a> StrandEmitter<'a> {
    fn new(
        config: &'a GenerationConfig,
        emitter: &'a MeshData,
        instance: Option<&'a MeshData>,
        clumps: Option<&'a ClumpMap>,
        perlin: Perlin,
        seed: StrandSeed,
    ) -> Self {
        Self {
            config,
            emitter,
            instance,
            clumps,
            guides: GuideSet::new(config.guides.iter().cloned()),
            growth: config.growth_recipe(),
            perlin,
            seed,
            emitter_material_count: emitter.materials.len() as u32,
        }
    }

    fn strand_length<R: rand::Rng + ?Sized>(
        &self,
        index: usize,
        sample: &SurfaceSample,
        rng: &mut R,
    ) -> f32 {
        let config = self.config;
        let mut length = config.hair_length;
        if sample.is_child {
            length *= config.children.length;
        }
        length *= 1.0 + symmetric(rng, config.length_random);

        if let Some(center) = self.clumps.and_then(|map| map.center_of(index)) {
            length = blend_length(length, center.parent_length(), config.clump.length_influence);
        }
        length
    }

    /// Emitter material and UV the strand inherits
    fn inherited(&self, sample: &SurfaceSample) -> (u32, Option<Vec2>) {
        if self.config.render.uses_instance_materials() {
            return (0, None);
        }
        let material = sample
            .face_index
            .and_then(|face| self.emitter.polygons().get(face))
            .map_or(0, |polygon| polygon.material_index);
        (material, sample.uv)
    }

    fn emit(&self, index: usize, sample: &SurfaceSample, buffers: &mut GeometryBuffers) {
        let mut rng = self.seed.index_rng(Stage::Strands, index);
        let start = sample.position;
        let length = self.strand_length(index, sample, &mut rng);
        let normal: Vec3 = if self.guides.is_empty() {
            sample.normal
        } else {
            self.guides.direction_at(start, sample.normal)
        };
        let (material_index, source_uv) = self.inherited(sample);

        match &self.config.render {
            RenderSettings::Tubes(tubes) => {
                let profile: RadiusProfile = GenerationConfig::radius_profile(tubes);
                let strand = generate_strand(
                    start,
                    normal,
                    length,
                    &self.growth,
                    &profile,
                    sample.is_child,
                    &self.perlin,
                    &mut rng,
                );
                emit_tube(buffers, &strand, tubes.sides, material_index, source_uv, &mut rng);
            }
            RenderSettings::Cards(cards) => {
                let recipe: CardRecipe = self.config.card_recipe(cards);
                let direction = card_direction(
                    start,
                    normal,
                    self.growth.gravity,
                    self.growth.noise_factor,
                    self.growth.noise_scale,
                    &self.perlin,
                );
                let width = card_width(&recipe, &mut rng);
                emit_card(
                    buffers,
                    start,
                    direction,
                    length,
                    width,
                    &recipe,
                    material_index,
                    source_uv,
                    &mut rng,
                );
            }
            RenderSettings::Object(object) => {
                let Some(instance) = self.instance else {
                    return;
                };
                let recipe: InstanceRecipe = GenerationConfig::instance_recipe(object);
                let child_length = sample.is_child.then_some(self.config.children.length);
                let transform = instance_transform(start, normal, child_length, &recipe, &mut rng);
                emit_instance(
                    buffers,
                    instance,
                    transform,
                    material_index,
                    source_uv,
                    recipe.use_instance_materials,
                    self.emitter_material_count,
                    &mut rng,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ObjectSettings, TubeSettings};
    use crate::error::Error;
    use crate::guides::GuideCurve;
    use std::cell::RefCell;
    use tussock_procgen::Material;

    /// Unit-area right triangle in the XY plane, normal +Z
    fn unit_triangle() -> MeshData {
        let side = 2f32.sqrt();
        let mut mesh = MeshData::new("Ground");
        mesh.add_vertex(Vec3::ZERO);
        mesh.add_vertex(Vec3::new(side, 0.0, 0.0));
        mesh.add_vertex(Vec3::new(0.0, side, 0.0));
        mesh.add_polygon(&[0, 1, 2], 0, None).unwrap();
        mesh
    }

    fn ground_plane() -> MeshData {
        let mut mesh = MeshData::new("Ground");
        mesh.append_materials([Material::new("Soil")]);
        mesh.ensure_uv_layer();
        for p in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ] {
            mesh.add_vertex(p);
        }
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        mesh.add_polygon(&[0, 1, 2, 3], 0, Some(&uvs)).unwrap();
        mesh
    }

    fn small_config() -> GenerationConfig {
        let mut config = GenerationConfig::default();
        config.seed = Some(7);
        config.hair_count = 200;
        config.preview.enabled = false;
        config.performance.batch_size = 100;
        config
    }

    #[test]
    fn test_single_triangle_scenario() {
        let mut config = GenerationConfig::default();
        config.seed = Some(1);
        config.hair_count = 1;
        config.preview.enabled = false;
        config.children.enabled = false;
        config.clump.factor = 0.0;
        config.output.keep_emitter_geometry = false;
        config.render = RenderSettings::Tubes(TubeSettings {
            segments: 1,
            sides: 4,
            root_radius: 0.01,
            tip_radius: 0.01,
            radius_random: 0.0,
        });

        let emitter = unit_triangle();
        let mut generator = Generator::new(config).unwrap();
        let output = generator.generate(&emitter).unwrap();

        assert_eq!(output.report.samples, 1);
        assert_eq!(output.report.commit.vertices, 8);
        assert_eq!(output.report.commit.created, 8);
        assert_eq!(output.report.commit.skipped, 0);
        assert_eq!(output.mesh.vertex_count(), 8);
        assert_eq!(output.mesh.face_count(), 8);
        assert!(output.mesh.polygons().iter().all(|p| p.material_index == 0));
        assert_eq!(output.mesh.name, PREVIEW_NAME);
        // emitter untouched
        assert_eq!(emitter.face_count(), 1);
    }

    #[test]
    fn test_noise_threshold_yields_nothing() {
        let mut config = small_config();
        config.distribution.mode = DistributionMode::Noise;
        // above the validated range, so nothing can pass the mask
        config.distribution.noise_threshold = 1.1;
        assert!(config.validate().is_err());
        let mut generator = Generator::unchecked(config);

        let emitter = ground_plane();
        let output = generator.generate(&emitter).unwrap();

        assert_eq!(output.report.strands(), 0);
        assert_eq!(output.report.commit, CommitReport::default());
        assert!(output.report.warnings.contains(&Warning::InsufficientSamples {
            produced: 0,
            requested: 200
        }));
        assert_eq!(output.mesh.face_count(), emitter.face_count());
    }

    #[test]
    fn test_empty_surface_is_fatal() {
        let mut emitter = MeshData::new("Flat");
        emitter.add_vertex(Vec3::ZERO);
        emitter.add_vertex(Vec3::X);
        emitter.add_vertex(Vec3::X * 2.0);
        emitter.add_polygon(&[0, 1, 2], 0, None).unwrap();

        let mut generator = Generator::new(small_config()).unwrap();
        let result = generator.generate(&emitter);
        assert!(matches!(result, Err(Error::Scatter(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config();
        config.hair_count = 0;
        assert!(matches!(Generator::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_deterministic_across_scheduling() {
        let emitter = ground_plane();
        let mut config = small_config();
        config.clump.factor = 0.6;

        let serial = {
            let mut config = config.clone();
            config.performance.parallel = false;
            config.performance.batch_size = 5000;
            Generator::new(config).unwrap().generate(&emitter).unwrap()
        };
        let parallel = Generator::new(config).unwrap().generate(&emitter).unwrap();

        assert_eq!(serial.report.seed, 7);
        assert_eq!(serial.mesh.positions, parallel.mesh.positions);
        assert_eq!(serial.mesh.polygons(), parallel.mesh.polygons());
    }

    #[test]
    fn test_children_and_clumps_reported() {
        let emitter = ground_plane();
        let mut config = small_config();
        config.clump.factor = 0.5;
        config.children.count = 2;

        let output = Generator::new(config).unwrap().generate(&emitter).unwrap();
        assert_eq!(output.report.samples, 200);
        assert_eq!(output.report.children, 400);
        assert_eq!(output.report.clump_centers, 300);
        // 6 segments, 4 sides
        let commit = &output.report.commit;
        assert_eq!(commit.created + commit.skipped, 600 * 48);
        assert!(output.mesh.vertex_normals().is_some());
    }

    #[test]
    fn test_progress_reaches_completion() {
        let emitter = ground_plane();
        let calls = RefCell::new(Vec::new());
        {
            let mut generator = Generator::new(small_config()).unwrap();
            generator.set_progress_callback(|stage, fraction| {
                calls.borrow_mut().push((stage, fraction));
            });
            generator.generate(&emitter).unwrap();
        }

        let calls = calls.into_inner();
        let strands: Vec<f32> = calls
            .iter()
            .filter(|(stage, _)| *stage == ProgressStage::Strands)
            .map(|(_, f)| *f)
            .collect();
        // 800 strands in batches of 100, plus the opening report
        assert_eq!(strands.len(), 9);
        assert_eq!(strands.last().copied(), Some(1.0));
        assert!(strands.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_material_and_uv_inheritance() {
        let mut emitter = ground_plane();
        emitter.append_materials([Material::new("Grass")]);
        emitter.set_material_index(0, 1);

        let output = Generator::new(small_config()).unwrap().generate(&emitter).unwrap();
        let mesh = &output.mesh;
        assert!(mesh.has_uv_layer());
        assert!(mesh.polygons()[1..].iter().all(|p| p.material_index == 1));
    }

    #[test]
    fn test_cards_add_material() {
        let emitter = ground_plane();
        let mut config = small_config();
        config.render = RenderSettings::Cards(Default::default());
        config.children.enabled = false;

        let output = Generator::new(config).unwrap().generate(&emitter).unwrap();
        assert_eq!(output.mesh.materials.len(), 2);
        assert_eq!(output.mesh.materials[1].name, "HairCard_Material");
        // 3 subdivisions: two triangles each
        assert_eq!(output.report.commit.vertices, 200 * 8);
    }

    #[test]
    fn test_object_without_instance_warns() {
        let emitter = ground_plane();
        let mut config = small_config();
        config.render = RenderSettings::Object(ObjectSettings::default());

        let output = Generator::new(config).unwrap().generate(&emitter).unwrap();
        assert_eq!(output.report.commit.created, 0);
        assert!(output
            .report
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::InvalidInstanceConfig(_))));
    }

    #[test]
    fn test_object_instances_with_own_materials() {
        let emitter = ground_plane();
        let mut instance = MeshData::new("Leaf");
        instance.append_materials([Material::new("LeafGreen"), Material::new("LeafBrown")]);
        for p in [
            Vec3::new(-0.01, 0.0, 0.0),
            Vec3::new(0.01, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.03),
        ] {
            instance.add_vertex(p);
        }
        instance.add_polygon(&[0, 1, 2], 1, None).unwrap();

        let mut config = small_config();
        config.hair_count = 50;
        config.children.enabled = false;
        config.output.keep_emitter_geometry = false;
        config.render = RenderSettings::Object(ObjectSettings::default());

        let mut generator = Generator::new(config).unwrap();
        generator.set_instance(&instance);
        let output = generator.generate(&emitter).unwrap();

        let mesh = output.mesh;
        assert_eq!(mesh.materials.len(), 2);
        assert_eq!(mesh.materials[0].name, "LeafGreen");
        assert_eq!(mesh.face_count(), 50);
        // offset by the emitter's one material, then shifted back
        assert!(mesh.polygons().iter().all(|p| p.material_index == 1));
    }

    #[test]
    fn test_guides_bend_strands() {
        let emitter = ground_plane();
        let mut config = small_config();
        config.children.enabled = false;
        config.growth.noise_factor = 0.0;
        config.render = RenderSettings::Tubes(TubeSettings {
            segments: 1,
            sides: 4,
            radius_random: 0.0,
            ..Default::default()
        });

        let mut guided = config.clone();
        guided.guides = vec![GuideCurve::new(
            vec![Vec3::new(-1.0, 0.5, 0.0), Vec3::new(2.0, 0.5, 0.0)],
            1.0,
        )];

        let mean_x = |mesh: &MeshData| {
            mesh.positions.iter().map(|p| p.x).sum::<f32>() / mesh.positions.len() as f32
        };
        let plain = Generator::new(config).unwrap().generate(&emitter).unwrap();
        let bent = Generator::new(guided).unwrap().generate(&emitter).unwrap();

        // every root is within half a unit of the guide, so tips lean along +X
        assert_eq!(plain.mesh.vertex_count(), bent.mesh.vertex_count());
        assert!(mean_x(&bent.mesh) > mean_x(&plain.mesh) + 0.02);
    }

    /// Two unit quads far apart in x, with separate vertices
    fn split_plane() -> MeshData {
        let mut mesh = MeshData::new("Split");
        mesh.ensure_uv_layer();
        for x in [0.0, 10.0] {
            let base = mesh.vertex_count() as u32;
            for (dx, dy) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                mesh.add_vertex(Vec3::new(x + dx, dy, 0.0));
            }
            let quad = [base, base + 1, base + 2, base + 3];
            mesh.add_polygon(&quad, 0, None).unwrap();
        }
        mesh
    }

    /// Generated vertices on each side of x = 5, skipping the emitter's own
    fn count_by_side(output: &GenerationOutput, emitter: &MeshData) -> (usize, usize) {
        let generated = &output.mesh.positions[emitter.vertex_count()..];
        let left = generated.iter().filter(|p| p.x < 5.0).count();
        (left, generated.len() - left)
    }

    #[test]
    fn test_missing_density_group_falls_back_to_even() {
        let emitter = ground_plane();
        let mut config = small_config();
        config.distribution.mode = DistributionMode::Density;
        config.distribution.density_group = Some("missing".to_string());

        let output = Generator::new(config).unwrap().generate(&emitter).unwrap();
        assert_eq!(output.report.samples, 200);
        assert!(output.report.strands() > 0);
        assert!(output
            .report
            .warnings
            .contains(&Warning::MissingVertexGroup("missing".to_string())));
    }

    #[test]
    fn test_missing_uv_layer_warns() {
        let mut config = small_config();
        config.hair_count = 10;

        let bare = Generator::new(config.clone())
            .unwrap()
            .generate(&unit_triangle())
            .unwrap();
        assert!(bare.report.warnings.contains(&Warning::MissingUvLayer));
        assert!(bare.report.strands() > 0);

        let mapped = Generator::new(config).unwrap().generate(&ground_plane()).unwrap();
        assert!(!mapped.report.warnings.contains(&Warning::MissingUvLayer));
    }

    #[test]
    fn test_density_weights_favour_heavy_faces() {
        let mut emitter = split_plane();
        // left quad fully weighted, right quad at a fifth
        let weights = vec![1.0, 1.0, 1.0, 1.0, 0.2, 0.2, 0.2, 0.2];
        emitter.vertex_groups.insert("density".to_string(), weights);

        let mut config = small_config();
        config.children.enabled = false;
        config.distribution.mode = DistributionMode::Density;
        config.distribution.density_group = Some("density".to_string());

        let output = Generator::new(config).unwrap().generate(&emitter).unwrap();
        assert!(output.report.warnings.is_empty());
        assert_eq!(output.report.samples, 200);

        let (heavy, light) = count_by_side(&output, &emitter);
        assert!(light > 0);
        assert!(heavy > 2 * light, "heavy {} light {}", heavy, light);
    }

    #[test]
    fn test_slope_mask_keeps_strands_off_walls() {
        let mut emitter = MeshData::new("Step");
        for p in [
            // floor
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            // wall facing +X
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 1.0, 0.0),
            Vec3::new(10.0, 1.0, 1.0),
            Vec3::new(10.0, 0.0, 1.0),
        ] {
            emitter.add_vertex(p);
        }
        emitter.add_polygon(&[0, 1, 2, 3], 0, None).unwrap();
        emitter.add_polygon(&[4, 5, 6, 7], 0, None).unwrap();

        let mut config = small_config();
        config.children.enabled = false;

        let open = Generator::new(config.clone()).unwrap().generate(&emitter).unwrap();
        let (_, on_wall) = count_by_side(&open, &emitter);
        assert!(on_wall > 0);

        config.distribution.slope_mask = true;
        config.distribution.slope_max_angle = 45f32.to_radians();
        let masked = Generator::new(config).unwrap().generate(&emitter).unwrap();
        let (on_floor, on_wall) = count_by_side(&masked, &emitter);
        assert!(on_floor > 0);
        assert_eq!(on_wall, 0);
    }

    #[test]
    fn test_prune_removes_shared_emitter_grid() {
        // 2x2 grid of quads sharing their inner vertices
        let mut emitter = MeshData::new("Grid");
        for y in 0..3 {
            for x in 0..3 {
                emitter.add_vertex(Vec3::new(x as f32, y as f32, 0.0));
            }
        }
        for y in 0..2u32 {
            for x in 0..2u32 {
                let i = y * 3 + x;
                emitter.add_polygon(&[i, i + 1, i + 4, i + 3], 0, None).unwrap();
            }
        }

        let mut config = small_config();
        config.children.enabled = false;
        config.output.keep_emitter_geometry = false;

        let output = Generator::new(config).unwrap().generate(&emitter).unwrap();
        let prune = output.report.prune.unwrap();
        assert_eq!(prune.faces_removed, 4);
        assert_eq!(prune.loose_vertices, 9);
        assert_eq!(prune.welded, 0);

        let mesh = &output.mesh;
        assert_eq!(mesh.face_count(), output.report.commit.created);
        assert_eq!(mesh.vertex_count(), output.report.commit.vertices);
        assert!(emitter
            .positions
            .iter()
            .all(|corner| !mesh.positions.contains(corner)));
    }

    #[test]
    fn test_finalize_renames() {
        let emitter = ground_plane();
        let mut config = small_config();
        config.hair_count = 10;
        let output = Generator::new(config).unwrap().generate(&emitter).unwrap();
        let mesh = output.finalize(&emitter.name);
        assert_eq!(mesh.name, "Ground_HairMesh");
    }
}
