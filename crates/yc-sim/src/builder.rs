//! Fluent builder for constructing a [`Yard`].

use tracing::info;
use yc_core::{BlockId, EquipmentId, V3, YardConfig};

use crate::{
    Block, BlockLayout, CraneConfig, DefaultPolicy, Equipment, GridLayout, JobPolicy,
    NearestColumnAllocator, SimError, SimResult, SlotAllocator, Yard,
};

/// Fluent builder for [`Yard`].
///
/// # Optional inputs (have defaults)
///
/// | Method                  | Default                    |
/// |-------------------------|----------------------------|
/// | `.policy(p)`            | [`DefaultPolicy`]          |
/// | `.allocator(a)`         | [`NearestColumnAllocator`] |
/// | `.sample_interval(dt)`  | no position samples        |
///
/// # Example
///
/// ```rust,ignore
/// let mut b = YardBuilder::new(config);
/// let block = b.block(GridLayout::new(16, 6, 6));
/// b.crane(block, CraneConfig::default());
/// b.crane(block, CraneConfig::default());
/// let mut yard = b.sample_interval(1.0).build()?;
/// yard.run(&mut NoopObserver)?;
/// ```
pub struct YardBuilder {
    config:          YardConfig,
    blocks:          Vec<GridLayout>,
    cranes:          Vec<(BlockId, CraneConfig)>,
    policy:          Box<dyn JobPolicy>,
    allocator:       Box<dyn SlotAllocator>,
    sample_interval: Option<f64>,
}

impl YardBuilder {
    pub fn new(config: YardConfig) -> Self {
        Self {
            config,
            blocks:          Vec::new(),
            cranes:          Vec::new(),
            policy:          Box::new(DefaultPolicy),
            allocator:       Box::new(NearestColumnAllocator),
            sample_interval: None,
        }
    }

    /// Add a block; returns its id.
    pub fn block(&mut self, layout: GridLayout) -> BlockId {
        self.blocks.push(layout);
        BlockId((self.blocks.len() - 1) as u16)
    }

    /// Add a crane on `block`'s rail.  Cranes of one block are ordered along
    /// the rail in the order they are added.
    pub fn crane(&mut self, block: BlockId, config: CraneConfig) -> EquipmentId {
        self.cranes.push((block, config));
        EquipmentId((self.cranes.len() - 1) as u32)
    }

    pub fn policy(mut self, policy: impl JobPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn allocator(mut self, allocator: impl SlotAllocator + 'static) -> Self {
        self.allocator = Box::new(allocator);
        self
    }

    /// Report crane positions to the observer every `dt` seconds.
    pub fn sample_interval(mut self, dt: f64) -> Self {
        self.sample_interval = Some(dt);
        self
    }

    /// Validate the configuration, lay out the rails and return a ready yard.
    pub fn build(self) -> SimResult<Yard> {
        self.config.validate()?;
        if let Some(dt) = self.sample_interval {
            if !(dt > 0.0) {
                return Err(SimError::Config(format!("sample interval must be > 0, got {dt}")));
            }
        }

        let mut blocks: Vec<Block> = self
            .blocks
            .into_iter()
            .enumerate()
            .map(|(i, layout)| Block::new(BlockId(i as u16), layout))
            .collect();

        for (i, (block_id, _)) in self.cranes.iter().enumerate() {
            let block = blocks.get_mut(block_id.index()).ok_or(SimError::UnknownBlock(*block_id))?;
            block.equipment.push(EquipmentId(i as u32));
        }

        // ── Rail windows and start positions ──────────────────────────────
        let step = self.config.check_clearance() + 1.0;
        let mut equipment = Vec::with_capacity(self.cranes.len());
        for (i, (block_id, crane)) in self.cranes.into_iter().enumerate() {
            let id = EquipmentId(i as u32);
            crane.gantry.validate()?;
            crane.trolley.validate()?;
            crane.hoist.validate()?;

            let block = blocks.get(block_id.index()).ok_or(SimError::UnknownBlock(block_id))?;
            let layout = &block.layout;
            let min_travel = layout.stack_height(layout.tiers() + 1) + self.config.height_clearance;
            if crane.travel_height < min_travel {
                return Err(SimError::Config(format!(
                    "{id}: travel height {} is below the {min_travel} needed to clear full stacks",
                    crane.travel_height
                )));
            }

            let n = block.equipment.len();
            let slot = block.equipment.iter().position(|e| *e == id).unwrap_or(0);
            let lo = slot as f64 * step;
            let hi = layout.length() - (n - 1 - slot) as f64 * step;
            if lo > hi {
                return Err(SimError::Config(format!(
                    "{block_id} is too short for {n} cranes {step} m apart"
                )));
            }

            let x = match crane.initial_bay {
                Some(bay) => {
                    let x = layout.bay_x(bay);
                    if bay >= layout.bays() || !(lo..=hi).contains(&x) {
                        return Err(SimError::Config(format!("{id}: initial bay {bay} is out of reach")));
                    }
                    x
                }
                None if n > 1 && slot == n - 1 => hi,
                None => lo,
            };
            let at = V3::new(x, 0.0, crane.travel_height);
            info!(equipment = %id, block = %block_id, reach_lo = lo, reach_hi = hi, x, "crane placed");
            equipment.push(Equipment::new(id, block_id, crane, at, (lo, hi)));
        }

        Ok(Yard::from_parts(
            self.config,
            blocks,
            equipment,
            self.policy,
            self.allocator,
            self.sample_interval,
        ))
    }
}
