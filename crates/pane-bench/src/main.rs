use std::collections::BTreeMap;
use std::io;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use ratatui::layout::Rect;

use pane_deck::config::EngineConfig;
use pane_deck::ids::{NodeId, TabId};
use pane_deck::store::{Dispatch, LayoutStore};
use pane_deck::tree::{Action, LayoutTree, SplitDirection, TabSpec, WidgetKind};

/// Splits stop being generated past this many leaves so the tree keeps churning.
const LEAF_CEILING: usize = 48;

#[derive(Parser, Debug)]
#[command(
    name = "pane-bench",
    version = env!("CARGO_PKG_VERSION"),
    about = "Reducer throughput benchmark with invariant checks after every action"
)]
struct BenchCli {
    /// Number of actions to dispatch.
    #[arg(
        short = 'n',
        long = "actions",
        value_name = "COUNT",
        default_value_t = 100_000
    )]
    actions: u64,

    /// Seed for the action generator. Defaults to the clock.
    #[arg(short = 's', long = "seed", value_name = "SEED")]
    seed: Option<u64>,

    /// Viewport width in cells used for directional focus and gutter resizes.
    #[arg(long = "width", value_name = "CELLS", default_value_t = 200)]
    width: u16,

    /// Viewport height in cells.
    #[arg(long = "height", value_name = "CELLS", default_value_t = 60)]
    height: u16,
}

struct BenchConfig {
    actions: u64,
    seed: u64,
    viewport: Rect,
}

impl TryFrom<&BenchCli> for BenchConfig {
    type Error = String;

    fn try_from(cli: &BenchCli) -> Result<Self, Self::Error> {
        if !(1..=50_000_000).contains(&cli.actions) {
            return Err("actions must be between 1 and 50000000".to_string());
        }
        if cli.width < 10 || cli.height < 10 {
            return Err("viewport must be at least 10x10 cells".to_string());
        }
        let seed = cli.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
                ^ 0xA5A5_A5A5_1234_5678
        });
        Ok(Self {
            actions: cli.actions,
            seed,
            viewport: Rect::new(0, 0, cli.width, cli.height),
        })
    }
}

fn main() -> io::Result<()> {
    let args = BenchCli::parse();
    let config = BenchConfig::try_from(&args)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let stats = run_benchmark(&config)?;
    println!("{}", stats.final_report(&config));
    Ok(())
}

fn run_benchmark(config: &BenchConfig) -> io::Result<BenchStats> {
    let engine = EngineConfig::default();
    let min_ratio = engine.min_ratio;
    let mut store = LayoutStore::new(engine);
    let mut rng = Lcg::new(config.seed);
    let mut stats = BenchStats::new();

    for step in 0..config.actions {
        let tree = store.tree();
        let started = Instant::now();
        match next_step(&mut rng, &tree, config.viewport) {
            Step::Dispatch(action) => {
                let name = action.name();
                let result = store.dispatch(action);
                stats.record(name, result.applied, started.elapsed());
            }
            Step::Resize {
                split_id,
                index,
                delta,
                container_cells,
            } => {
                let applied = store.resize_gutter(&split_id, index, delta, container_cells);
                stats.record("RESIZE_GUTTER", applied, started.elapsed());
            }
        }

        let tree = store.tree();
        if let Err(err) = tree.validate(min_ratio) {
            return Err(io::Error::other(format!(
                "invariant broken after step {step} (seed {}): {err}",
                config.seed
            )));
        }
        stats.max_leaves = stats.max_leaves.max(tree.leaf_count());
    }

    stats.revision = store.revision();
    stats.mark_completed();
    Ok(stats)
}

enum Step {
    Dispatch(Action),
    Resize {
        split_id: NodeId,
        index: usize,
        delta: i32,
        container_cells: u16,
    },
}

fn next_step(rng: &mut Lcg, tree: &LayoutTree, viewport: Rect) -> Step {
    let leaves = tree.leaf_ids();
    let leaf_id = leaves[rng.below(leaves.len())].clone();
    let tabs: Vec<TabId> = tree
        .leaves()
        .iter()
        .flat_map(|leaf| leaf.tabs.iter().map(|tab| tab.id.clone()))
        .collect();
    let tab_id = tabs[rng.below(tabs.len())].clone();
    let coin = rng.below(2) == 0;

    let action = match rng.below(14) {
        0 | 1 if leaves.len() < LEAF_CEILING => Action::SplitLeaf {
            leaf_id,
            direction: if coin {
                SplitDirection::Horizontal
            } else {
                SplitDirection::Vertical
            },
            ratio: 0.2 + rng.unit() * 0.6,
        },
        0..=2 => Action::CloseSplit { leaf_id },
        3 => Action::MoveTab {
            tab_id,
            target_leaf_id: leaf_id,
        },
        4 => Action::CloseTab { tab_id },
        5 => Action::CloseAllTabs { leaf_id },
        6 => Action::RebalanceSplits,
        7 if coin => Action::FocusNextSplit,
        7 => Action::FocusPreviousSplit,
        8 => {
            let bounds = tree.layout(viewport);
            match rng.below(4) {
                0 => Action::FocusAboveSplit { bounds },
                1 => Action::FocusBelowSplit { bounds },
                2 => Action::FocusLeftSplit { bounds },
                _ => Action::FocusRightSplit { bounds },
            }
        }
        9 | 10 => Action::OpenTab {
            leaf_id: Some(leaf_id),
            tab: TabSpec::new(format!("file-{}.md", rng.below(10_000)), WidgetKind::Editor),
        },
        11 => Action::SetTabDirty {
            tab_id,
            dirty: coin,
        },
        12 => {
            let (_, gutters) = tree.layout_with_gutters(viewport);
            if gutters.is_empty() {
                Action::SetActiveTab { tab_id }
            } else {
                let gutter = &gutters[rng.below(gutters.len())];
                return Step::Resize {
                    split_id: gutter.split_id.clone(),
                    index: gutter.index,
                    delta: rng.below(21) as i32 - 10,
                    container_cells: gutter.container_cells,
                };
            }
        }
        _ if coin => Action::SetActiveLeaf { leaf_id },
        _ => Action::SetActiveTab { tab_id },
    };
    Step::Dispatch(action)
}

#[derive(Default)]
struct ActionTally {
    applied: u64,
    ignored: u64,
    total_time: Duration,
}

struct BenchStats {
    start: Instant,
    completed_at: Option<Instant>,
    per_action: BTreeMap<&'static str, ActionTally>,
    slowest_step: Duration,
    max_leaves: usize,
    revision: u64,
}

impl BenchStats {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            completed_at: None,
            per_action: BTreeMap::new(),
            slowest_step: Duration::ZERO,
            max_leaves: 1,
            revision: 0,
        }
    }

    fn elapsed(&self) -> Duration {
        match self.completed_at {
            Some(done) => done.duration_since(self.start),
            None => self.start.elapsed(),
        }
    }

    fn mark_completed(&mut self) {
        self.completed_at = Some(Instant::now());
    }

    fn record(&mut self, name: &'static str, applied: bool, took: Duration) {
        let tally = self.per_action.entry(name).or_default();
        if applied {
            tally.applied = tally.applied.saturating_add(1);
        } else {
            tally.ignored = tally.ignored.saturating_add(1);
        }
        tally.total_time += took;
        if took > self.slowest_step {
            self.slowest_step = took;
        }
    }

    fn steps(&self) -> u64 {
        self.per_action
            .values()
            .map(|tally| tally.applied + tally.ignored)
            .sum()
    }

    fn breakdown(&self) -> String {
        self.per_action
            .iter()
            .map(|(name, tally)| {
                let count = tally.applied + tally.ignored;
                let avg_us = if count == 0 {
                    0.0
                } else {
                    tally.total_time.as_secs_f64() * 1_000_000.0 / count as f64
                };
                format!(
                    "  {name:<22} applied {:>8} | ignored {:>8} | avg {avg_us:>7.2} us",
                    tally.applied, tally.ignored
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn final_report(&self, config: &BenchConfig) -> String {
        let elapsed = self.elapsed().as_secs_f64();
        let steps = self.steps();
        let per_second = if elapsed > 0.0 {
            steps as f64 / elapsed
        } else {
            0.0
        };

        indoc::formatdoc!(
            r#"
            Reducer bench completed, all invariants held.
            Seed: {seed} | Viewport: {width}x{height}
            Steps: {steps} in {elapsed:.2}s (~{per_second:.0}/s)
            Slowest step: {slowest:.3} ms | Peak leaves: {leaves} | Final revision: {revision}
            {breakdown}
            "#,
            seed = config.seed,
            width = config.viewport.width,
            height = config.viewport.height,
            steps = steps,
            elapsed = elapsed,
            per_second = per_second,
            slowest = self.slowest_step.as_secs_f64() * 1_000.0,
            leaves = self.max_leaves,
            revision = self.revision,
            breakdown = self.breakdown(),
        )
    }
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        self.next() as usize % bound
    }

    fn unit(&mut self) -> f64 {
        f64::from(self.next()) / f64::from(u32::MAX)
    }
}
