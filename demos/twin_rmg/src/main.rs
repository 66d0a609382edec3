//! twin_rmg: two rail-mounted gantry cranes sharing one block.
//!
//! Boxes arrive at a single truck lane at a fixed interval and are stacked
//! at random cells of a 16-bay block; a quarter of them are fetched back
//! later.  The two cranes share the rail, so every crossing move has to be
//! negotiated through interference checks and ADJUST requests.
//!
//! Run with `RUST_LOG=debug` for per-operation detail.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use yc_core::{BlockId, Cell, Column, EquipmentId, LaneId, SimRng, V3, YardConfig};
use yc_output::{CsvWriter, RecordingObserver};
use yc_request::RequestKind;
use yc_sim::{CraneConfig, GridLayout, NoopObserver, ProbeEvent, Yard, YardBuilder, YardObserver};

// ── Constants ─────────────────────────────────────────────────────────────────

const BAYS:  u16 = 16;
const ROWS:  u16 = 6;
const TIERS: u16 = 6;

#[derive(Parser, Debug)]
#[command(name = "twin_rmg", about = "Two RMGs, one lane, one block")]
struct Args {
    /// Number of boxes to store.
    #[arg(long, default_value_t = 40)]
    boxes: usize,

    /// Seconds between truck arrivals.
    #[arg(long, default_value_t = 60.0)]
    interval: f64,

    /// Seed for cell selection; overrides the config file.
    #[arg(long)]
    seed: Option<u64>,

    /// YardConfig as TOML.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write operations.csv, motions.csv and requests.csv here.
    #[arg(long)]
    out: Option<PathBuf>,
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Tracks the closest approach of the two gantries and counts probes,
/// forwarding everything to `inner`.
struct Monitor<O: YardObserver> {
    inner:     O,
    min_gap:   f64,
    conflicts: usize,
    rejected:  usize,
}

impl<O: YardObserver> Monitor<O> {
    fn new(inner: O) -> Self {
        Self { inner, min_gap: f64::INFINITY, conflicts: 0, rejected: 0 }
    }
}

impl<O: YardObserver> YardObserver for Monitor<O> {
    fn on_probe(&mut self, time: f64, event: &ProbeEvent) {
        match event {
            ProbeEvent::EquipmentConflict { .. } => self.conflicts += 1,
            ProbeEvent::RequestRejected { .. } => self.rejected += 1,
            _ => {}
        }
        self.inner.on_probe(time, event);
    }

    fn on_sample(&mut self, time: f64, positions: &[(EquipmentId, V3)]) {
        if let [(_, a), (_, b)] = positions {
            self.min_gap = self.min_gap.min((a.x - b.x).abs());
        }
        self.inner.on_sample(time, positions);
    }

    fn on_run_end(&mut self, time: f64) {
        self.inner.on_run_end(time);
    }
}

// ── Scenario ──────────────────────────────────────────────────────────────────

fn build_yard(config: YardConfig) -> Result<(Yard, BlockId)> {
    let mut b = YardBuilder::new(config);
    let block = b.block(GridLayout::new(BAYS, ROWS, TIERS));
    b.crane(block, CraneConfig::default());
    b.crane(block, CraneConfig::default());
    let yard = b.sample_interval(1.0).build().context("building yard")?;
    Ok((yard, block))
}

fn submit_work(yard: &mut Yard, block: BlockId, args: &Args, rng: &mut SimRng) -> Result<()> {
    let capacity = BAYS as usize * ROWS as usize * TIERS as usize;
    if args.boxes > capacity {
        bail!("{} boxes do not fit into {capacity} cells", args.boxes);
    }
    let lane = LaneId(0);
    let mut stored = Vec::with_capacity(args.boxes);
    while stored.len() < args.boxes {
        let column = Column::new(rng.gen_range(0..BAYS), rng.gen_range(0..ROWS));
        let Some(height) = yard.block(block).map(|b| b.height(column)) else {
            bail!("{block} vanished");
        };
        if height >= TIERS {
            continue;
        }
        let time = stored.len() as f64 * args.interval;
        let (box_id, _) = yard.store(time, block, lane, Some(Cell::new(column.bay, column.row, height)))?;
        stored.push(box_id);
    }

    let start = args.boxes as f64 * args.interval;
    rng.shuffle(&mut stored);
    for (i, box_id) in stored.iter().take(args.boxes / 4).enumerate() {
        yard.retrieve(start + i as f64 * args.interval, *box_id, lane)?;
    }
    Ok(())
}

fn run<O: YardObserver>(yard: &mut Yard, observer: O) -> Result<Monitor<O>> {
    let mut monitor = Monitor::new(observer);
    yard.run(&mut monitor)?;
    Ok(monitor)
}

fn report<O: YardObserver>(yard: &Yard, monitor: &Monitor<O>) {
    let requests = yard.requests().iter().filter(|r| r.kind() != RequestKind::Adjust);
    let (mut finished, mut failed, mut open) = (0, 0, 0);
    for r in requests {
        if r.is_finished() {
            finished += 1;
        } else if r.is_failed() {
            failed += 1;
        } else {
            open += 1;
        }
    }
    let adjusts = yard.requests().iter().filter(|r| r.kind() == RequestKind::Adjust).count();

    println!("  Simulated time:     {:.0} s", yard.now());
    println!("  Requests finished:  {finished}");
    println!("  Requests failed:    {failed}");
    println!("  Requests open:      {open}");
    println!("  Operations:         {}", yard.operations().len());
    println!("  ADJUST requests:    {adjusts}");
    println!("  Conflicts:          {}", monitor.conflicts);
    println!("  Rejections:         {}", monitor.rejected);
    println!("  Closest approach:   {:.1} m (declared {:.1} m)", monitor.min_gap, yard.config().clearance);
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => YardConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => YardConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    println!("=== twin_rmg: {BAYS}x{ROWS}x{TIERS} block, 2 RMGs, {} boxes ===", args.boxes);
    let mut rng = SimRng::new(config.seed);
    let (mut yard, block) = build_yard(config)?;
    submit_work(&mut yard, block, &args, &mut rng)?;
    info!(requests = yard.requests().len(), "work submitted");

    let t0 = Instant::now();
    match &args.out {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            let writer = CsvWriter::new(dir)?;
            let mut monitor = run(&mut yard, RecordingObserver::new(writer))?;
            if let Some(e) = monitor.inner.take_error() {
                bail!("output error: {e}");
            }
            report(&yard, &monitor);
            println!("  Output:             {}", dir.display());
        }
        None => {
            let monitor = run(&mut yard, NoopObserver)?;
            report(&yard, &monitor);
        }
    }
    println!("  Wall time:          {:.2?}", t0.elapsed());
    Ok(())
}
