//! Writes a synthetic FACS time course: `<prefix>_<t>.fcs` per time point.
//!
//! BL1-A carries a dim and a bright population; the bright fraction grows
//! over time, so the ridges shift right as the course progresses.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use fcs_ridge::data::fcs_writer::FcsWriter;

#[derive(Debug, Parser)]
#[command(about = "Generate synthetic .fcs files for trying out fcs-ridge")]
struct Args {
    /// Output directory
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Sample identifier used as the filename prefix
    #[arg(long, default_value = "A01")]
    prefix: String,

    /// Time points to write
    #[arg(long, value_delimiter = ',', default_value = "0,6,24,48")]
    time_points: Vec<u32>,

    /// Events per file
    #[arg(long, default_value_t = 5000)]
    events: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn log_normal(&mut self, median: f64, sigma: f64) -> f64 {
        median * self.gauss(0.0, sigma).exp()
    }
}

/// Fraction of bright BL1-A events at time `t` hours.
fn bright_fraction(t: u32) -> f64 {
    1.0 - (-f64::from(t) / 20.0).exp()
}

fn events_at(rng: &mut SimpleRng, t: u32, n: usize) -> Vec<Vec<f64>> {
    let bright = bright_fraction(t);
    let mut fsc = Vec::with_capacity(n);
    let mut ssc = Vec::with_capacity(n);
    let mut bl1 = Vec::with_capacity(n);
    for _ in 0..n {
        fsc.push(rng.gauss(120_000.0, 18_000.0).clamp(0.0, 262_143.0));
        ssc.push(rng.log_normal(40_000.0, 0.35).clamp(0.0, 262_143.0));
        let value = if rng.next_f64() < bright {
            rng.log_normal(4.0e6, 0.25)
        } else {
            rng.log_normal(8.0e5, 0.3)
        };
        bl1.push(value.min(1.6e7));
    }
    vec![fsc, ssc, bl1]
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let writer = FcsWriter::new()
        .channel("FSC-A", None, 262_144.0)
        .channel("SSC-A", None, 262_144.0)
        .channel("BL1-A", Some("GFP"), 16_777_216.0)
        .keyword("$CYT", "fcs-ridge generator");

    let mut rng = SimpleRng::new(args.seed);
    for &t in &args.time_points {
        let path = args.out_dir.join(format!("{}_{t}.fcs", args.prefix));
        let columns = events_at(&mut rng, t, args.events);
        writer
            .clone()
            .keyword("$FIL", &format!("{}_{t}.fcs", args.prefix))
            .write(&path, &columns)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!(
            "Wrote {} ({} events, {:.0}% bright)",
            path.display(),
            args.events,
            bright_fraction(t) * 100.0
        );
    }

    Ok(())
}
