use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use fcs_ridge::app::{Preview, WindowPreview};
use fcs_ridge::ui::{Confirm, DialogConfirm, TerminalConfirm};
use fcs_ridge::{run, Capabilities, Frontend, PlotStyle, RidgeError, RidgeRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PromptKind {
    /// Native yes/no dialog
    Dialog,
    /// `[y/N]` question on the terminal
    Terminal,
}

/// Ridge plot of one FCS channel across the time points of a sample.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Sample identifier, matched as a substring of the file names
    identifier: String,

    /// Directory holding the .fcs files
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Where to save the figure (defaults to --dir)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Restrict the saved figure's x-axis to [LOWER, UPPER]
    #[arg(long, num_args = 2, value_names = ["LOWER", "UPPER"], allow_negative_numbers = true)]
    gate: Option<Vec<f64>>,

    /// Y-axis title
    #[arg(long)]
    y_label: Option<String>,

    /// Ridge fill color, hex or name
    #[arg(long)]
    fill: Option<String>,

    /// Fill transparency in [0, 1]
    #[arg(long)]
    alpha: Option<f64>,

    /// Output format: jpeg, jpg, image, pdf or document
    #[arg(long, default_value = "jpeg")]
    format: String,

    /// Channel to plot ($PnN or $PnS)
    #[arg(long)]
    channel: Option<String>,

    /// Figure width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Figure height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Height of the tallest ridge in row spacings
    #[arg(long)]
    scale: Option<f64>,

    /// JSON style file; flags override its fields
    #[arg(long, value_name = "FILE")]
    style: Option<PathBuf>,

    /// Also write the plotted densities as CSV
    #[arg(long, value_name = "FILE")]
    densities: Option<PathBuf>,

    /// Fail when two files map to the same time point
    #[arg(long)]
    strict_time_points: bool,

    /// Save without preview or confirmation
    #[arg(long)]
    no_interactive: bool,

    /// Ask for confirmation without opening the preview window
    #[arg(long)]
    no_preview: bool,

    /// How to ask for confirmation
    #[arg(long, value_enum, default_value_t = PromptKind::Dialog)]
    prompt: PromptKind,
}

impl Cli {
    fn into_request(self) -> anyhow::Result<RidgeRequest> {
        let mut style = match &self.style {
            Some(path) => PlotStyle::from_json_file(path)?,
            None => PlotStyle::default(),
        };
        if let Some(v) = self.channel {
            style.channel = v;
        }
        if let Some(v) = self.y_label {
            style.y_label = v;
        }
        if let Some(v) = self.fill {
            style.fill = v;
        }
        if let Some(v) = self.alpha {
            style.alpha = v;
        }
        if let Some(v) = self.width {
            style.width = v;
        }
        if let Some(v) = self.height {
            style.height = v;
        }
        if let Some(v) = self.scale {
            style.scale = v;
        }

        let mut request = RidgeRequest::new(self.identifier);
        request.dir = self.dir;
        request.output_dir = self.output_dir;
        request.gate = match self.gate.as_deref() {
            Some(&[lower, upper]) => Some((lower, upper)),
            Some(other) => anyhow::bail!("--gate takes two values, got {}", other.len()),
            None => None,
        };
        request.style = style;
        request.file_format = self.format;
        request.interactive = !self.no_interactive;
        request.densities_csv = self.densities;
        request.strict_time_points = self.strict_time_points;
        Ok(request)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<RidgeError>().is_some_and(RidgeError::is_cancellation) {
                log::warn!("Not saved: {e}");
                return ExitCode::SUCCESS;
            }
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let prompt = cli.prompt;
    let show_preview = !cli.no_preview;
    let request = cli.into_request()?;

    let caps = Capabilities::probe();
    let mut dialog = DialogConfirm;
    let mut terminal = TerminalConfirm::stdio();
    let confirm: &mut dyn Confirm = match prompt {
        PromptKind::Dialog => &mut dialog,
        PromptKind::Terminal => &mut terminal,
    };
    let mut window = WindowPreview::default();

    let mut frontend = Frontend::new(confirm);
    if show_preview {
        frontend = frontend.with_preview(&mut window as &mut dyn Preview);
    }

    let path = run(&request, &caps, frontend)
        .with_context(|| format!("plotting sample '{}'", request.identifier))?;
    println!("{}", path.display());
    Ok(())
}
