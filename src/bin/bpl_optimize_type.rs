//! bpl_optimize_type: sample a character type and refine it by gradient
//! ascent on its prior score.
//!
//! ```bash
//! # Optimize a 2-stroke type drawn from a trained parameter source
//! bpl_optimize_type --lib-dir lib_data --ns 2 --nb-iter 1000
//!
//! # Same flow on a freshly written synthetic source, saving the trajectory
//! bpl_optimize_type --synthetic /tmp/bpl_lib --ns 2 --out scores.json
//! ```
//!
//! Set `RUST_LOG=debug` to see parameter-source reads.

use clap::{ArgGroup, Parser};
use rand::{SeedableRng, rngs::StdRng};
use rust_bpl::{
    ctd::CharacterTypeDist,
    library::{Library, SyntheticLibrary},
    optimization::type_optimizer::{TypeOptOptions, optimize_type_with},
};
use serde::Serialize;
use std::{error::Error, fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bpl_optimize_type", version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["lib_dir", "synthetic"])))]
struct Args {
    /// Parameter source directory to load
    #[arg(long)]
    lib_dir: Option<PathBuf>,

    /// Write a synthetic parameter source to this directory and load it
    #[arg(long)]
    synthetic: Option<PathBuf>,

    /// Number of strokes of the sampled type (drawn from the prior if omitted)
    #[arg(long)]
    ns: Option<usize>,

    /// Ascent step size
    #[arg(long, default_value_t = 1e-3)]
    lr: f64,

    /// Feasibility margin of the projections
    #[arg(long, default_value_t = 1e-4)]
    eps: f64,

    /// Number of iterations
    #[arg(long, default_value_t = 1000)]
    nb_iter: usize,

    /// Ascend the penalized objective instead of projecting after each step
    #[arg(long)]
    no_proj_grad_ascent: bool,

    /// Seed for sampling the type
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write the score trajectory as JSON to this file
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct Trajectory<'a> {
    num_strokes: usize,
    num_substrokes: &'a [usize],
    proj_grad_ascent: bool,
    scores: &'a [f64],
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let lib = match (&args.lib_dir, &args.synthetic) {
        (Some(dir), _) => Library::load(dir)?,
        (None, Some(dir)) => {
            SyntheticLibrary::default().write_to(dir)?;
            Library::load(dir)?
        }
        (None, None) => return Err("one of --lib-dir or --synthetic is required".into()),
    };
    let dist = CharacterTypeDist::new(&lib)?;
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut c = dist.sample_type(args.ns, &mut rng)?;

    let nsub = c.nsub();
    println!("num strokes: {}", c.k());
    println!("num sub-strokes: {nsub:?}");

    let proj_grad_ascent = !args.no_proj_grad_ascent;
    let opts = TypeOptOptions::new(args.lr, args.nb_iter, args.eps, proj_grad_ascent, Some(100))?;
    let outcome = optimize_type_with(&mut c, &dist, &opts)?;

    if let (Some(first), Some(last)) = (outcome.first_score(), outcome.last_score()) {
        println!("score: {first:.4} -> {last:.4} over {} iterations", outcome.iterations);
    }

    if let Some(path) = &args.out {
        let record = Trajectory {
            num_strokes: c.k(),
            num_substrokes: &nsub,
            proj_grad_ascent,
            scores: &outcome.scores,
        };
        fs::write(path, serde_json::to_string_pretty(&record)?)?;
        tracing::info!(path = %path.display(), "wrote score trajectory");
    }
    Ok(())
}
