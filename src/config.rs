//! World configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. Values that would stall the pipeline (a zero drain budget, a zero
//! load radius) are clamped by [`WorldConfig::sanitized`].

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine_state::{
    error::{PersistenceError, VoxelError},
    voxels::{
        block::{block_type::STONE, BlockCatalogEntry, BlockRegistry},
        generation::{
            FlatGenerator, PerlinGenerator, ScatterGenerator, UnavailableGenerator, WorldGenerator,
        },
        persistence::{JsonRegionSerializer, RegionCache, RegionStore, UnavailableRegionStore},
    },
};

const DEFAULT_LOAD_RADIUS: i32 = 5;
const DEFAULT_RENDER_RADIUS: i32 = 3;
const DEFAULT_REGION_ROOT: &str = "regions";
const DEFAULT_DRAIN_BUDGET: usize = 64;
const DEFAULT_MAX_LOAD_RETRIES: u32 = 3;
const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;
const DEFAULT_REGION_CACHE_CAPACITY: usize = 16;
const DEFAULT_WORLD_SEED: u64 = 1337;
const DEFAULT_GROUND_HEIGHT: i32 = 64;
const DEFAULT_SCATTER_DENSITY: f64 = 0.05;

/// Which generator creates columns the region store does not have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    Flat,
    Perlin,
    Scatter,
    /// Never generate; only stored columns can be loaded.
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Half edge length of each player's square load footprint, in columns
    pub load_radius: i32,
    /// Half edge length of the client's square render window, in columns
    pub render_radius: i32,
    /// Directory holding the `<x>,<y>.r` region files
    pub region_root: PathBuf,
    /// Disables the region store entirely when false
    pub persistence: bool,
    /// Maximum coordinates taken from each queue per tick
    pub drain_budget: usize,
    /// Worker threads for meshing; 0 meshes on the driving thread
    pub mesh_workers: usize,
    /// Retries for a failed column load before it is given up
    pub max_load_retries: u32,
    pub autosave_interval_secs: u64,
    /// Regions kept in memory by the region cache
    pub region_cache_capacity: usize,
    pub generator: GeneratorKind,
    pub world_seed: u64,
    pub ground_height: i32,
    /// Blocks registered after the built-in table
    pub blocks: Vec<BlockCatalogEntry>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            load_radius: DEFAULT_LOAD_RADIUS,
            render_radius: DEFAULT_RENDER_RADIUS,
            region_root: PathBuf::from(DEFAULT_REGION_ROOT),
            persistence: true,
            drain_budget: DEFAULT_DRAIN_BUDGET,
            mesh_workers: 0,
            max_load_retries: DEFAULT_MAX_LOAD_RETRIES,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            region_cache_capacity: DEFAULT_REGION_CACHE_CAPACITY,
            generator: GeneratorKind::Perlin,
            world_seed: DEFAULT_WORLD_SEED,
            ground_height: DEFAULT_GROUND_HEIGHT,
            blocks: Vec::new(),
        }
    }
}

impl WorldConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, PersistenceError> {
        let config: WorldConfig = serde_json::from_str(raw)?;
        Ok(config.sanitized())
    }

    /// Reads a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, PersistenceError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Clamps values the pipeline cannot work with.
    pub fn sanitized(mut self) -> Self {
        if self.load_radius < 1 {
            warn!("load_radius {} is too small, using 1", self.load_radius);
            self.load_radius = 1;
        }
        self.render_radius = self.render_radius.clamp(0, self.load_radius);
        if self.drain_budget == 0 {
            warn!("drain_budget 0 would stall streaming, using 1");
            self.drain_budget = 1;
        }
        self.region_cache_capacity = self.region_cache_capacity.max(1);
        self
    }

    /// The built-in block table plus the configured extra blocks.
    pub fn build_registry(&self) -> Result<BlockRegistry, VoxelError> {
        let mut registry = BlockRegistry::with_builtin_blocks();
        for entry in &self.blocks {
            registry.register(entry.clone())?;
        }
        Ok(registry)
    }

    pub fn build_generator(&self) -> Box<dyn WorldGenerator> {
        match self.generator {
            GeneratorKind::Flat => Box::new(FlatGenerator {
                ground_height: self.ground_height,
                ..FlatGenerator::default()
            }),
            GeneratorKind::Perlin => Box::new(PerlinGenerator::new(self.world_seed as u32)),
            GeneratorKind::Scatter => Box::new(ScatterGenerator {
                seed: self.world_seed,
                density: DEFAULT_SCATTER_DENSITY,
                block: STONE.id,
            }),
            GeneratorKind::Disabled => Box::new(UnavailableGenerator),
        }
    }

    pub fn build_store(&self) -> Box<dyn RegionStore> {
        if self.persistence {
            Box::new(RegionCache::new(
                self.region_root.clone(),
                JsonRegionSerializer,
                self.region_cache_capacity,
            ))
        } else {
            Box::new(UnavailableRegionStore)
        }
    }
}
