use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use serde::Serialize;

use crate::config::{OutputFormat, PlotStyle};
use crate::error::{Result, RidgeError};

use super::render::{render_svg, Axes};
use super::ridge::RidgePlot;

const JPEG_QUALITY: u8 = 92;

// ---------------------------------------------------------------------------
// Figure export
// ---------------------------------------------------------------------------

/// Render the plot without axis decorations and write it as JPEG or PDF.
pub fn write_figure(
    plot: &RidgePlot,
    style: &PlotStyle,
    format: OutputFormat,
    path: &Path,
    fonts: Arc<usvg::fontdb::Database>,
) -> Result<()> {
    let svg = render_svg(plot, (style.width, style.height), Axes::Stripped)?;
    let tree = parse_svg(&svg, fonts)?;
    match format {
        OutputFormat::Jpeg => write_jpeg(&tree, path),
        OutputFormat::Pdf => write_pdf(&tree, path),
    }
}

fn parse_svg(svg: &str, fonts: Arc<usvg::fontdb::Database>) -> Result<usvg::Tree> {
    let mut options = usvg::Options::default();
    options.fontdb = fonts;
    usvg::Tree::from_str(svg, &options).map_err(|e| RidgeError::Render(e.to_string()))
}

/// Rasterise onto a white canvas.
pub fn rasterize(tree: &usvg::Tree) -> Result<image::RgbImage> {
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        RidgeError::Render(format!(
            "cannot allocate a {}x{} canvas",
            size.width(),
            size.height()
        ))
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    let mut canvas = pixmap.as_mut();
    resvg::render(tree, tiny_skia::Transform::default(), &mut canvas);

    // Opaque background: premultiplied and straight RGBA coincide.
    let rgba = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.take())
        .ok_or_else(|| RidgeError::Render("canvas size mismatch".into()))?;
    Ok(image::DynamicImage::ImageRgba8(rgba).to_rgb8())
}

fn write_jpeg(tree: &usvg::Tree, path: &Path) -> Result<()> {
    let rgb = rasterize(tree)?;
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&rgb)?;
    replace_file(path, &jpeg)
}

fn write_pdf(tree: &usvg::Tree, path: &Path) -> Result<()> {
    let pdf = svg2pdf::to_pdf(
        tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| RidgeError::Pdf(format!("{e:?}")))?;
    replace_file(path, &pdf)
}

/// Write `bytes` next to `path` and rename over it, so a failed run never
/// leaves a partial file behind.
pub fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| RidgeError::Io(e.error))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Density table
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct DensityRow<'a> {
    time_point: &'a str,
    x: f64,
    density: f64,
}

/// Long-format table of the plotted curves: `time_point,x,density`.
pub fn write_density_table(plot: &RidgePlot, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for ridge in &plot.ridges {
        for (&x, &density) in plot.xs.iter().zip(&ridge.density) {
            writer.serialize(DensityRow {
                time_point: &ridge.label,
                x,
                density,
            })?;
        }
    }
    let table = writer
        .into_inner()
        .map_err(|e| RidgeError::Io(e.into_error()))?;
    replace_file(path, &table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RidgeFill;
    use crate::data::model::ChannelSeries;

    fn plot(style: &PlotStyle) -> RidgePlot {
        let series = vec![
            ChannelSeries {
                label: "0".into(),
                values: (0..50).map(|i| 1.0e6 + f64::from(i) * 2.0e3).collect(),
            },
            ChannelSeries {
                label: "6".into(),
                values: (0..50).map(|i| 3.0e6 + f64::from(i) * 2.0e3).collect(),
            },
        ];
        let fill = RidgeFill::new(&style.fill, style.alpha).unwrap();
        RidgePlot::build("A01", &series, style, fill, None).unwrap()
    }

    fn small_style() -> PlotStyle {
        PlotStyle {
            width: 320,
            height: 240,
            grid_points: 32,
            ..PlotStyle::default()
        }
    }

    #[test]
    fn test_jpeg_has_requested_size() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("A01.jpg");
        let style = small_style();
        let fonts = Arc::new(usvg::fontdb::Database::new());
        write_figure(&plot(&style), &style, OutputFormat::Jpeg, &path, fonts).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn test_pdf_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("A01.pdf");
        let style = small_style();
        let fonts = Arc::new(usvg::fontdb::Database::new());
        write_figure(&plot(&style), &style, OutputFormat::Pdf, &path, fonts).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_raster_is_not_blank() {
        let style = small_style();
        let svg = render_svg(&plot(&style), (320, 240), Axes::Stripped).unwrap();
        let tree = parse_svg(&svg, Arc::new(usvg::fontdb::Database::new())).unwrap();
        let rgb = rasterize(&tree).unwrap();
        assert!(rgb.pixels().any(|p| p.0 != [255, 255, 255]));
    }

    #[test]
    fn test_replace_file_overwrites_without_leftovers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("A01.jpg");
        std::fs::write(&path, b"old contents").unwrap();
        replace_file(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        let entries = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing").join("A01.pdf");
        assert!(matches!(replace_file(&path, b"%PDF-"), Err(RidgeError::Io(_))));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_density_table_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("densities.csv");
        let style = small_style();
        write_density_table(&plot(&style), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["time_point", "x", "density"]);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2 * 32);
        assert_eq!(&rows[0][0], "0");
        assert_eq!(&rows[32][0], "6");
    }
}
