use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use knitplan::enumerator::{canonical_adjacent, simple_adjacent, Transition};
use knitplan::heuristics::Heuristic;
use knitplan::planner::{a_star, ida_star, SearchResult};
use knitplan::prebuilt::PrebuiltTable;
use knitplan::state::KnittingState;
use knitplan::testgen::{Stats, TestCase};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "knitplan", about = "Minimum-cost rack/transfer planner for two-bed flat/tube knitting machines")]
struct Opt {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan a single source-to-target transformation and print the path found.
    Run(RunArgs),
    /// Plan several random instances of the same shape and print aggregate timing/cost statistics.
    Stats(StatsArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, default_value_t = 8)]
    width: usize,
    #[arg(long, default_value_t = -4)]
    min_racking: i32,
    #[arg(long, default_value_t = 4)]
    max_racking: i32,
    #[arg(long, value_enum, default_value_t = HeuristicArg::BraidLog)]
    heuristic: HeuristicArg,
    #[arg(long, value_enum, default_value_t = AlgorithmArg::AStar)]
    algorithm: AlgorithmArg,
    #[arg(long, default_value_t = 1_000_000)]
    limit: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Collapse canonically-equivalent successors during search (spec's free back-to-front transfers).
    #[arg(long)]
    canonicalize: bool,
    #[arg(long, value_enum, default_value_t = CaseArg::Lace)]
    case: CaseArg,
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args)]
struct StatsArgs {
    #[arg(long, default_value_t = 8)]
    width: usize,
    #[arg(long, default_value_t = -4)]
    min_racking: i32,
    #[arg(long, default_value_t = 4)]
    max_racking: i32,
    #[arg(long, value_enum, default_value_t = HeuristicArg::BraidLog)]
    heuristic: HeuristicArg,
    #[arg(long, value_enum, default_value_t = AlgorithmArg::AStar)]
    algorithm: AlgorithmArg,
    #[arg(long, default_value_t = 1_000_000)]
    limit: usize,
    #[arg(long, value_enum, default_value_t = CaseArg::Lace)]
    case: CaseArg,
    #[arg(long)]
    canonicalize: bool,
    #[arg(long, default_value_t = 10)]
    trials: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum HeuristicArg {
    No,
    Target,
    Braid,
    Log,
    Prebuilt,
    BraidLog,
    BraidPrebuilt,
}

impl From<HeuristicArg> for Heuristic {
    fn from(h: HeuristicArg) -> Self {
        match h {
            HeuristicArg::No => Heuristic::No,
            HeuristicArg::Target => Heuristic::Target,
            HeuristicArg::Braid => Heuristic::Braid,
            HeuristicArg::Log => Heuristic::Log,
            HeuristicArg::Prebuilt => Heuristic::Prebuilt,
            HeuristicArg::BraidLog => Heuristic::BraidLog,
            HeuristicArg::BraidPrebuilt => Heuristic::BraidPrebuilt,
        }
    }
}

impl HeuristicArg {
    fn needs_table(self) -> bool {
        matches!(self, HeuristicArg::Prebuilt | HeuristicArg::BraidPrebuilt)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    AStar,
    IdaStar,
}

#[derive(Clone, Copy, ValueEnum)]
enum CaseArg {
    Id,
    Lace,
    Tube,
}

fn build_case(case: CaseArg, width: usize, bound: i32, seed: u64) -> TestCase {
    match case {
        CaseArg::Id => TestCase::test_id(width, bound),
        CaseArg::Lace => TestCase::flat_lace(width, bound, seed),
        CaseArg::Tube => TestCase::simple_tube(width, bound, seed),
    }
}

fn run_once(
    source: &KnittingState,
    target: &KnittingState,
    heuristic: HeuristicArg,
    algorithm: AlgorithmArg,
    limit: usize,
    canonicalize: bool,
    max_racking_span: i32,
) -> Option<SearchResult> {
    let table = if heuristic.needs_table() {
        Some(PrebuiltTable::construct(
            (max_racking_span as u32) * 2 + 2,
            source.machine.min_racking,
            source.machine.max_racking,
        ))
    } else {
        None
    };
    let h: Heuristic = heuristic.into();
    let heuristic_fn = move |s: &KnittingState| h.estimate(s, table.as_ref());
    let adjacent_fn: fn(&KnittingState) -> Vec<Transition> =
        if canonicalize { canonical_adjacent } else { simple_adjacent };

    // Seed the search from every racking reachable from `source` in one
    // rack move, not just `source` itself — matching
    // `examples/original_source/main.cpp`'s `source.all_rackings()`
    // (spec.md §4.9: "Multiple sources model 'all_rackings'").
    let sources = source.all_rackings();

    match algorithm {
        AlgorithmArg::AStar => a_star(&sources, target, adjacent_fn, heuristic_fn, limit),
        AlgorithmArg::IdaStar => ida_star(&sources, target, adjacent_fn, heuristic_fn, limit),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opt = Opt::parse();
    match opt.command {
        Command::Run(args) => run(args),
        Command::Stats(args) => stats(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let bound = args.max_racking.max(-args.min_racking);
    let case = build_case(args.case, args.width, bound, args.seed);
    let (source, target) = case.build().context("failed to build test case")?;

    tracing::info!(case = %case.name, "planning");
    let start = Instant::now();
    let result = run_once(
        &source,
        &target,
        args.heuristic,
        args.algorithm,
        args.limit,
        args.canonicalize,
        args.max_racking - args.min_racking,
    );
    let elapsed = start.elapsed();

    match result {
        Some(r) => {
            println!("found path of length {} in {} nodes ({:.3}s)", r.path_length, r.search_tree_size, elapsed.as_secs_f64());
            if args.verbose {
                for (i, step) in r.path.iter().enumerate() {
                    println!("  {:>3}: {}", i + 1, step);
                }
            }
            Ok(())
        }
        None => bail!("no path found within the node-expansion limit"),
    }
}

fn stats(args: StatsArgs) -> Result<()> {
    let bound = args.max_racking.max(-args.min_racking);
    let mut results = Vec::with_capacity(args.trials);
    for trial in 0..args.trials {
        let case = build_case(args.case, args.width, bound, trial as u64);
        let (source, target) = case.build().context("failed to build test case")?;
        if let Some(r) = run_once(
            &source,
            &target,
            args.heuristic,
            args.algorithm,
            args.limit,
            args.canonicalize,
            args.max_racking - args.min_racking,
        ) {
            results.push(r);
        } else {
            tracing::warn!(trial, "no path found within the node-expansion limit");
        }
    }

    let summary = Stats::summarize(&results);
    println!(
        "{}/{} solved, mean path length {:.2}, mean nodes {:.1}, mean seconds {:.4}",
        summary.count,
        args.trials,
        summary.mean_path_length(),
        if summary.count == 0 { 0.0 } else { summary.total_search_tree_size as f64 / summary.count as f64 },
        if summary.count == 0 { 0.0 } else { summary.total_seconds / summary.count as f64 },
    );
    Ok(())
}
