pub mod assembler;
pub mod config;
pub mod error;
pub mod guides;
pub mod logging;
pub mod materials;
pub mod pipeline;
pub mod prune;

pub use assembler::{commit_geometry, CommitReport};
pub use config::{
    CardSettings, ChildrenSettings, ClumpSettings, DistributionSettings, GenerationConfig,
    GrowthSettings, ObjectSettings, OutputSettings, PerformanceSettings, Preset,
    PreviewSettings, RenderSettings, TubeSettings,
};
pub use error::{Error, Result, Warning};
pub use guides::{DirectionField, GuideCurve, GuideSet};
pub use materials::{card_material, merge_instance_materials};
pub use pipeline::{GenerationOutput, GenerationReport, Generator, ProgressStage, PREVIEW_NAME};
pub use prune::{prune_original_geometry, PruneReport};

// Types callers need to build emitters and read results
pub use tussock_procgen::{Material, MeshData};
pub use tussock_scatter::DistributionMode;
