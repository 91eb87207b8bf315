//! Load → plot → preview → confirm → save.

use std::path::{Path, PathBuf};

use crate::app::Preview;
use crate::capabilities::Capabilities;
use crate::config::{OutputFormat, RidgeRequest};
use crate::data::filter::Gate;
use crate::data::loader::{discover, load_time_series};
use crate::error::{Result, RidgeError};
use crate::plot::export::{write_density_table, write_figure};
use crate::plot::RidgePlot;
use crate::ui::Confirm;

/// The interactive pieces of a run, injected by the caller.
pub struct Frontend<'a> {
    pub confirm: &'a mut dyn Confirm,
    pub preview: Option<&'a mut dyn Preview>,
}

impl<'a> Frontend<'a> {
    pub fn new(confirm: &'a mut dyn Confirm) -> Self {
        Self {
            confirm,
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: &'a mut dyn Preview) -> Self {
        self.preview = Some(preview);
        self
    }

    fn requires_display(&self) -> bool {
        self.confirm.requires_display()
            || self.preview.as_ref().is_some_and(|p| p.requires_display())
    }
}

/// Run one request and return the path of the saved figure.
///
/// Arguments are validated before the source directory is touched.
/// When the request is interactive the ungated plot is previewed and the
/// user must confirm; declining yields [`RidgeError::UserCancelled`] and
/// nothing is written.
pub fn run(request: &RidgeRequest, caps: &Capabilities, mut frontend: Frontend<'_>) -> Result<PathBuf> {
    let format = OutputFormat::parse(&request.file_format)?;
    let fill = request.style.validate()?;
    let gate = request
        .gate
        .map(|(lower, upper)| Gate::new(lower, upper))
        .transpose()?;
    caps.require(request, frontend.requires_display())?;

    let files = discover(&request.dir, &request.identifier)?;
    log::info!(
        "Found {} file(s) for '{}' in {}",
        files.len(),
        request.identifier,
        request.dir.display()
    );
    let series = load_time_series(&request.dir, &files, request.strict_time_points)?;
    let channel = series.channel_series(&request.style.channel)?;

    log::info!(
        "Plotting {} across {} time point(s)",
        request.style.channel,
        series.len()
    );
    let ungated = RidgePlot::build(&request.identifier, &channel, &request.style, fill, None)?;

    if request.interactive {
        if let Some(preview) = frontend.preview.as_deref_mut() {
            preview.show(&ungated, gate.as_ref())?;
        }
    }

    let plot = match gate {
        Some(gate) => {
            log::info!("Applying gate [{}, {}]", gate.lower, gate.upper);
            RidgePlot::build(&request.identifier, &channel, &request.style, fill, Some(gate))?
        }
        None => ungated,
    };

    let path = request.output_path(format);
    if request.interactive {
        let prompt = format!("Save the plot of {} to {}?", request.identifier, path.display());
        if !frontend.confirm.confirm(&prompt) {
            return Err(RidgeError::UserCancelled);
        }
    }

    std::fs::create_dir_all(request.output_dir())?;
    if let Some(parent) = request.densities_csv.as_deref().and_then(Path::parent) {
        std::fs::create_dir_all(parent)?;
    }
    write_figure(&plot, &request.style, format, &path, caps.fonts.clone())?;
    log::info!("Saved {}", path.display());

    if let Some(csv_path) = &request.densities_csv {
        write_density_table(&plot, csv_path)?;
        log::info!("Wrote densities to {}", csv_path.display());
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fcs_writer::FcsWriter;

    struct CountingPreview {
        shown: Vec<(usize, Option<Gate>)>,
    }

    impl Preview for CountingPreview {
        fn show(&mut self, plot: &RidgePlot, gate: Option<&Gate>) -> Result<()> {
            self.shown.push((plot.ridges.len(), gate.copied()));
            Ok(())
        }

        fn requires_display(&self) -> bool {
            false
        }
    }

    fn write_sample(dir: &Path, name: &str, center: f64) {
        let values: Vec<f64> = (0..200).map(|i| center + f64::from(i % 25) * 4.0e4).collect();
        FcsWriter::new()
            .channel("BL1-A", None, 1.0e7)
            .write(&dir.join(name), &[values])
            .unwrap();
    }

    fn request(dir: &Path) -> RidgeRequest {
        let mut request = RidgeRequest::new("A01");
        request.dir = dir.to_path_buf();
        request.style.width = 300;
        request.style.height = 200;
        request.style.grid_points = 64;
        request
    }

    #[test]
    fn test_preview_sees_ungated_plot_and_gate() {
        let tmp = tempfile::tempdir().unwrap();
        write_sample(tmp.path(), "A01_0.fcs", 1.0e6);
        write_sample(tmp.path(), "A01_6.fcs", 3.0e6);

        let mut request = request(tmp.path());
        request.gate = Some((1.5e6, 7.0e6));
        let mut preview = CountingPreview { shown: Vec::new() };
        let mut asked = 0;
        let mut confirm = |_: &str| {
            asked += 1;
            true
        };

        let frontend = Frontend::new(&mut confirm).with_preview(&mut preview);
        let path = run(&request, &Capabilities::headless(), frontend).unwrap();

        assert_eq!(path, tmp.path().join("A01.jpg"));
        assert!(path.is_file());
        assert_eq!(asked, 1);
        assert_eq!(preview.shown.len(), 1);
        assert_eq!(preview.shown[0].0, 2);
        assert_eq!(preview.shown[0].1, Some(Gate::new(1.5e6, 7.0e6).unwrap()));
    }

    #[test]
    fn test_declined_confirmation_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        write_sample(tmp.path(), "A01_0.fcs", 1.0e6);
        let out = tmp.path().join("out");

        let mut request = request(tmp.path());
        request.output_dir = Some(out.clone());
        request.densities_csv = Some(tmp.path().join("densities.csv"));
        let mut decline = |_: &str| false;

        let err = run(&request, &Capabilities::headless(), Frontend::new(&mut decline)).unwrap_err();
        assert!(err.is_cancellation());
        assert!(!out.exists());
        assert!(!tmp.path().join("densities.csv").exists());
    }

    #[test]
    fn test_density_table_directory_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        write_sample(tmp.path(), "A01_0.fcs", 1.0e6);

        let mut request = request(tmp.path());
        request.interactive = false;
        let csv_path = tmp.path().join("tables").join("nested").join("A01.csv");
        request.densities_csv = Some(csv_path.clone());
        let mut never = |_: &str| -> bool { panic!("must not ask") };

        let path = run(&request, &Capabilities::headless(), Frontend::new(&mut never)).unwrap();
        assert!(path.is_file());
        assert!(csv_path.is_file());
    }

    #[test]
    fn test_non_interactive_skips_preview_and_prompt() {
        let tmp = tempfile::tempdir().unwrap();
        write_sample(tmp.path(), "A01_0.fcs", 1.0e6);

        let mut request = request(tmp.path());
        request.interactive = false;
        request.file_format = "document".into();
        let mut preview = CountingPreview { shown: Vec::new() };
        let mut never = |_: &str| -> bool { panic!("must not ask") };

        let frontend = Frontend::new(&mut never).with_preview(&mut preview);
        let path = run(&request, &Capabilities::headless(), frontend).unwrap();
        assert_eq!(path, tmp.path().join("A01.pdf"));
        assert!(preview.shown.is_empty());
    }

    #[test]
    fn test_validation_precedes_directory_access() {
        let mut request = RidgeRequest::new("A01");
        request.dir = PathBuf::from("/definitely/not/here");
        request.interactive = false;
        let mut yes = |_: &str| true;

        request.gate = Some((7.0e6, 1.5e6));
        let err = run(&request, &Capabilities::headless(), Frontend::new(&mut yes)).unwrap_err();
        assert!(matches!(err, RidgeError::InvalidGate { .. }));

        request.gate = None;
        request.style.alpha = -0.1;
        let err = run(&request, &Capabilities::headless(), Frontend::new(&mut yes)).unwrap_err();
        assert!(matches!(err, RidgeError::InvalidAlpha(_)));
    }
}
