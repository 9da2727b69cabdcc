use noise::Perlin;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Pipeline stages that draw their own random streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Stage {
    Sampling = 1,
    Children = 2,
    Clumping = 3,
    ClumpAdjust = 4,
    Strands = 5,
    Noise = 6,
}

/// Run seed from which every stage and strand derives its own stream
///
/// Sub-seeds depend only on the run seed and the index they are derived
/// for, so results do not change with worker scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrandSeed {
    pub value: u32,
}

impl StrandSeed {
    pub fn new(seed: u32) -> Self {
        Self { value: seed }
    }

    /// Hash combine from Boost:
    /// seed ^ (value + 0x9e3779b9 + (seed << 6) + (seed >> 2))
    pub fn hash_combine(&self, value: u32) -> u32 {
        let seed = self.value;

        seed ^ (value
            .wrapping_add(0x9e3779b9)
            .wrapping_add(seed << 6)
            .wrapping_add(seed >> 2))
    }

    pub fn combine(&self, value: u32) -> StrandSeed {
        StrandSeed::new(self.hash_combine(value))
    }

    pub fn combine_multiple(&self, values: &[u32]) -> StrandSeed {
        let mut result = self.value;
        for &value in values {
            result = StrandSeed::new(result).hash_combine(value);
        }
        StrandSeed::new(result)
    }

    pub fn for_stage(&self, stage: Stage) -> StrandSeed {
        self.combine(stage as u32)
    }

    /// Seed for one sample or strand within a stage
    pub fn for_index(&self, stage: Stage, index: usize) -> StrandSeed {
        let index = index as u64;
        self.combine_multiple(&[stage as u32, index as u32, (index >> 32) as u32])
    }

    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.value as u64)
    }

    pub fn stage_rng(&self, stage: Stage) -> StdRng {
        self.for_stage(stage).rng()
    }

    pub fn index_rng(&self, stage: Stage, index: usize) -> StdRng {
        self.for_index(stage, index).rng()
    }

    /// Coherent noise field shared by the sampler and the path generator
    pub fn perlin(&self) -> Perlin {
        Perlin::new(self.for_stage(Stage::Noise).value)
    }
}

impl From<u32> for StrandSeed {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl Default for StrandSeed {
    fn default() -> Self {
        Self::new(0)
    }
}
