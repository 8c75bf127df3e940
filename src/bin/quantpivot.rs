//! quantpivot - run fit + predict on binary dataset containers
//!
//! ```bash
//! quantpivot dataset.ds2 queries.ds2 16 8 32 64omp --threads 8
//! quantpivot dataset.ds2 queries.ds2 16 8 32 32 -s
//! ```
//!
//! Writes neighbor ids (`i32`) and distances (variant precision) as two
//! containers, `out_idnn.ds2` and `out_distnn.ds2` unless overridden.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use quantpivot::container::{load_matrix, save_elements, save_ids};
use quantpivot::{Element, QuantPivot, Variant};

#[derive(Parser, Debug)]
#[command(name = "quantpivot")]
#[command(version, about = "Exact k-NN search with a quantized pivot index")]
struct Cli {
    /// Dataset container
    dataset: PathBuf,

    /// Query container
    queries: PathBuf,

    /// Number of pivots
    h: usize,

    /// Number of neighbors
    k: usize,

    /// Quantization levels per pivot
    x: usize,

    /// Variant: 32 (f32 + SSE), 64 (f64 + AVX), 64omp (f64 + AVX + threads)
    #[arg(value_parser = parse_variant)]
    variant: Variant,

    /// Silent mode: only print timings
    #[arg(short, long)]
    silent: bool,

    /// Worker threads for 64omp (0 = one per core)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Output container for neighbor ids
    #[arg(long, default_value = "out_idnn.ds2")]
    out_ids: PathBuf,

    /// Output container for neighbor distances
    #[arg(long, default_value = "out_distnn.ds2")]
    out_dists: PathBuf,
}

fn parse_variant(s: &str) -> std::result::Result<Variant, String> {
    s.parse::<Variant>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.silent { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    if !cli.silent {
        info!(?cli, "starting");
    }

    match cli.variant {
        Variant::Single => run::<f32>(&cli),
        Variant::Double | Variant::DoubleParallel => run::<f64>(&cli),
    }
}

fn run<T: Element>(cli: &Cli) -> Result<()> {
    let dataset = load::<T>(&cli.dataset)?;
    let queries = load::<T>(&cli.queries)?;

    let mut engine = QuantPivot::<T>::for_variant(cli.variant, cli.threads)?;

    let start = Instant::now();
    engine
        .fit(dataset, cli.h, cli.x, cli.silent)
        .context("fit failed")?;
    report_time("FIT", start.elapsed().as_secs_f64(), cli.silent);

    let start = Instant::now();
    let neighbors = engine
        .predict(&queries, cli.k, cli.silent)
        .context("predict failed")?;
    report_time("PREDICT", start.elapsed().as_secs_f64(), cli.silent);

    let nq = neighbors.num_queries();
    save_ids(&cli.out_ids, neighbors.ids(), nq, cli.k)
        .with_context(|| format!("writing {}", cli.out_ids.display()))?;
    save_elements(&cli.out_dists, neighbors.distances(), nq, cli.k)
        .with_context(|| format!("writing {}", cli.out_dists.display()))?;

    if !cli.silent {
        for q in 0..nq {
            println!("ID NN Q{q:3}: ( {})", join(neighbors.ids_row(q)));
        }
        for q in 0..nq {
            println!("Dist NN Q{q:3}: ( {})", join(neighbors.distances_row(q)));
        }
    }
    Ok(())
}

fn load<T: Element>(path: &Path) -> Result<quantpivot::Matrix<T>> {
    load_matrix::<T, _>(path).with_context(|| format!("loading {}", path.display()))
}

fn report_time(phase: &str, secs: f64, silent: bool) {
    if silent {
        println!("{secs:.3}");
    } else {
        println!("{phase} time = {secs:.5} secs");
    }
}

fn join<V: Display>(values: &[V]) -> String {
    values.iter().map(|v| format!("{v} ")).collect()
}
