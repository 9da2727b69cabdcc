pub mod children;
pub mod clump;
pub mod error;
pub mod noise_util;
pub mod sample;
pub mod sampler;
pub mod seed;
pub mod spatial;

// Re-export commonly used items
pub use children::{expand_children, spawn_child, tangent_basis, ChildRecipe};
pub use clump::{
    adjust_position, assign_clumps, blend_length, center_count, ClumpAssignment, ClumpCenter,
    ClumpMap, ClumpRecipe,
};
pub use error::ScatterError;
pub use noise_util::{mask_value, noise_at, remap01};
pub use sample::SurfaceSample;
pub use sampler::{sample_surface, DistributionMode, SampleSet, SamplerRecipe};
pub use seed::{Stage, StrandSeed};
pub use spatial::KdTree;
