//! Times one tree engine on a build, search and tear-down workload.
//!
//! Every iteration inserts all keys, checks the tree, looks every key up, and erases them all
//! again, failing with a diagnostic as soon as an operation reports something unexpected. The
//! timings and rotation counts are averaged over the iterations.
//!
//! Set `RUST_LOG=debug` to see per-iteration progress.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, ensure, Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use balanced_bst::{
    dictionary, AvlMap, AvlTree, BalancedTree, BuRbTree, Config, HyRbTree, InvariantError,
    LlRbTree, Replacement, Storage, TdRbTree,
};

#[derive(Parser)]
#[clap(name = "treebench", version)]
#[clap(about = "Benchmarks a self-balancing binary search tree")]
struct CliOpts {
    /// Number of distinct keys.
    #[arg(short, long, default_value_t = 4_194_304, value_parser = positive)]
    keys: usize,
    /// How many times to run the whole workload.
    #[arg(short, long, default_value_t = 1, value_parser = positive)]
    iterations: usize,
    /// The engine to benchmark.
    #[arg(short, long, value_enum, default_value_t = TreeKind::Avl)]
    tree: TreeKind,
    /// Order in which keys are inserted.
    #[arg(long, value_enum, default_value_t = InsertOrder::Shuffled)]
    insert_order: InsertOrder,
    /// Order in which keys are erased.
    #[arg(long, value_enum, default_value_t = EraseOrder::Shuffled)]
    erase_order: EraseOrder,
    /// Which node replaces an erased node with two children.
    #[arg(long, value_enum, default_value_t = ReplacementOpt::Successor)]
    replacement: ReplacementOpt,
    /// Keep parent links in engines where they are optional.
    #[arg(long)]
    parent_links: bool,
    /// Drop erased nodes instead of keeping them on the freed list.
    #[arg(long)]
    no_freed_list: bool,
    /// Where nodes are allocated.
    #[arg(long, value_enum, default_value_t = StorageOpt::Contiguous)]
    storage: StorageOpt,
    /// Use the words of this dictionary as keys instead of integers (avl-map only).
    #[arg(long, env = "TREEBENCH_WORDS")]
    words: Option<PathBuf>,
    /// Seed for shuffling the keys.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TreeKind {
    Avl,
    AvlMap,
    Bu,
    Td,
    Hy,
    Ll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InsertOrder {
    Shuffled,
    Ascending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EraseOrder {
    Shuffled,
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReplacementOpt {
    Successor,
    Preferred,
    Inverted,
    ForcedSuccessor,
}

impl From<ReplacementOpt> for Replacement {
    fn from(opt: ReplacementOpt) -> Self {
        match opt {
            ReplacementOpt::Successor => Replacement::Successor,
            ReplacementOpt::Preferred => Replacement::Preferred,
            ReplacementOpt::Inverted => Replacement::Inverted,
            ReplacementOpt::ForcedSuccessor => Replacement::ForcedSuccessor,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StorageOpt {
    Contiguous,
    Boxed,
}

impl From<StorageOpt> for Storage {
    fn from(opt: StorageOpt) -> Self {
        match opt {
            StorageOpt::Contiguous => Storage::Contiguous,
            StorageOpt::Boxed => Storage::Boxed,
        }
    }
}

fn positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl CliOpts {
    fn config(&self) -> Config {
        Config::default()
            .with_parent_links(self.parent_links)
            .with_replacement(self.replacement.into())
            .with_freed_list(!self.no_freed_list)
            .with_storage(self.storage.into())
    }
}

/// The engine under test. The map stores each key's position in the insertion order.
enum Engine<K: Ord> {
    Set(Box<dyn BalancedTree<K>>),
    Map(AvlMap<K, usize>),
}

impl<K: Ord + Clone + 'static> Engine<K> {
    fn new(kind: TreeKind, config: Config) -> Self {
        match kind {
            TreeKind::Avl => Self::Set(Box::new(AvlTree::with_config(config))),
            TreeKind::AvlMap => Self::Map(AvlMap::with_config(config)),
            TreeKind::Bu => Self::Set(Box::new(BuRbTree::with_config(config))),
            TreeKind::Td => Self::Set(Box::new(TdRbTree::with_config(config))),
            TreeKind::Hy => Self::Set(Box::new(HyRbTree::with_config(config))),
            TreeKind::Ll => Self::Set(Box::new(LlRbTree::with_config(config))),
        }
    }

    fn insert(&mut self, key: K, index: usize) -> bool {
        match self {
            Self::Set(t) => t.insert(key),
            Self::Map(m) => m.insert(key, index),
        }
    }

    /// Whether `key` is present and, for the map, still stored with `index`.
    fn found(&self, key: &K, index: usize) -> bool {
        match self {
            Self::Set(t) => t.contains(key),
            Self::Map(m) => m.find(key) == Some(&index),
        }
    }

    fn erase(&mut self, key: &K) -> bool {
        match self {
            Self::Set(t) => t.erase(key),
            Self::Map(m) => m.erase(key),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Set(t) => t.len(),
            Self::Map(m) => m.len(),
        }
    }

    fn preallocate(&mut self, n: usize) {
        match self {
            Self::Set(t) => t.preallocate(n),
            Self::Map(m) => m.preallocate(n),
        }
    }

    fn freed_len(&self) -> usize {
        match self {
            Self::Set(t) => t.freed_len(),
            Self::Map(m) => m.freed_len(),
        }
    }

    fn validate(&self) -> Result<(), InvariantError<K>> {
        match self {
            Self::Set(t) => t.validate(),
            Self::Map(m) => m.validate(),
        }
    }

    fn rotation_counts(&self) -> Vec<(&'static str, u64)> {
        match self {
            Self::Set(t) => t.rotation_counts(),
            Self::Map(m) => m.rotations().counts(),
        }
    }

    fn reset_rotations(&mut self) {
        match self {
            Self::Set(t) => t.reset_rotations(),
            Self::Map(m) => *m.rotations_mut() = Default::default(),
        }
    }

    fn node_size(&self) -> usize {
        match self {
            Self::Set(t) => t.node_size(),
            Self::Map(m) => m.node_size(),
        }
    }
}

/// Mean and standard deviation of a series of samples.
struct Summary {
    mean: f64,
    std_dev: f64,
}

impl Summary {
    fn of(samples: &[f64]) -> Self {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} (std dev {:.3})", self.mean, self.std_dev)
    }
}

fn millis(samples: &[Duration]) -> Summary {
    let samples: Vec<f64> = samples.iter().map(|d| d.as_secs_f64() * 1e3).collect();
    Summary::of(&samples)
}

/// Keeps the first occurrence of every word.
fn distinct(words: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    words
        .into_iter()
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

fn run<K>(opts: &CliOpts, mut keys: Vec<K>) -> Result<()>
where
    K: Ord + Clone + fmt::Debug + Send + Sync + 'static,
{
    let n = keys.len();
    let freed_list = !opts.no_freed_list;
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut engine = Engine::new(opts.tree, opts.config());

    info!("node size: {} bytes", engine.node_size());
    if freed_list {
        engine.preallocate(n);
        ensure!(
            engine.freed_len() == n,
            "preallocation left {} nodes on the freed list, expected {}",
            engine.freed_len(),
            n
        );
    }

    let mut insert_times = Vec::with_capacity(opts.iterations);
    let mut search_times = Vec::with_capacity(opts.iterations);
    let mut erase_times = Vec::with_capacity(opts.iterations);
    let mut rotations: Vec<Vec<(&'static str, u64)>> = Vec::with_capacity(opts.iterations);

    for iteration in 0..opts.iterations {
        engine.reset_rotations();
        match opts.insert_order {
            InsertOrder::Shuffled => keys.shuffle(&mut rng),
            InsertOrder::Ascending => keys.sort(),
        }

        let start = Instant::now();
        for (index, key) in keys.iter().enumerate() {
            ensure!(
                engine.insert(key.clone(), index),
                "inserting {:?} reported a duplicate",
                key
            );
        }
        insert_times.push(start.elapsed());
        ensure!(
            engine.len() == n,
            "tree holds {} keys after inserting {}",
            engine.len(),
            n
        );
        engine
            .validate()
            .with_context(|| format!("invalid tree after inserting {} keys", n))?;

        let start = Instant::now();
        for (index, key) in keys.iter().enumerate() {
            ensure!(engine.found(key, index), "{:?} not found", key);
        }
        search_times.push(start.elapsed());

        match opts.erase_order {
            EraseOrder::Shuffled => keys.shuffle(&mut rng),
            EraseOrder::Ascending => keys.sort(),
            EraseOrder::Descending => keys.sort_by(|a, b| b.cmp(a)),
        }
        let start = Instant::now();
        for key in &keys {
            ensure!(engine.erase(key), "erasing {:?} found nothing to erase", key);
        }
        erase_times.push(start.elapsed());
        ensure!(
            engine.len() == 0,
            "tree holds {} keys after erasing all of them",
            engine.len()
        );
        if freed_list {
            ensure!(
                engine.freed_len() == n,
                "{} nodes on the freed list after erasing {} keys",
                engine.freed_len(),
                n
            );
        }

        rotations.push(engine.rotation_counts());
        debug!("iteration {} of {} done", iteration + 1, opts.iterations);
    }

    info!("insert: {} ms", millis(&insert_times));
    info!("search: {} ms", millis(&search_times));
    info!("erase: {} ms", millis(&erase_times));
    if let Some(first) = rotations.first() {
        for (column, (name, _)) in first.iter().enumerate() {
            let samples: Vec<f64> = rotations.iter().map(|r| r[column].1 as f64).collect();
            info!("{}: {}", name, Summary::of(&samples));
        }
    }
    Ok(())
}

fn initialize_logger() {
    use env_logger::{Builder, Env};
    use std::io::Write;

    // Let RUST_LOG pick the level, falling back to "info".
    let env = Env::default().default_filter_or("info");
    let mut builder = Builder::from_env(env);

    // Level, module and line, then the message.
    builder.format(|buf, record| {
        let path = record.module_path().unwrap_or("");
        let line = match record.line() {
            Some(l) => l.to_string(),
            None => "".to_string(),
        };
        let level_style = buf.default_level_style(record.level());
        writeln!(
            buf,
            "[{level_style}{}{level_style:#} {}:{}] {}",
            record.level(),
            path,
            line,
            record.args()
        )
    });

    builder.init();
}

fn main() -> Result<()> {
    initialize_logger();
    let opts = CliOpts::parse();

    info!(
        "{:?} tree, {} iterations, insert {:?}, erase {:?}, {:?} replacement, parent links {}, freed list {}",
        opts.tree,
        opts.iterations,
        opts.insert_order,
        opts.erase_order,
        opts.replacement,
        opts.parent_links,
        !opts.no_freed_list
    );

    match &opts.words {
        Some(path) => {
            if opts.tree != TreeKind::AvlMap {
                bail!("--words only works with --tree avl-map");
            }
            let words = dictionary::load_words(path)
                .with_context(|| format!("cannot read dictionary {}", path.display()))?;
            let total = words.len();
            let words = distinct(words);
            ensure!(!words.is_empty(), "dictionary {} is empty", path.display());
            info!("{} distinct words of {}", words.len(), total);
            run(&opts, words)
        }
        None => {
            info!("{} integer keys", opts.keys);
            run(&opts, (0..opts.keys as u64).collect())
        }
    }
}
