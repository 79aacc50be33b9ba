use std::fs;
use std::path::Path;

use resvg::{tiny_skia, usvg};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            _ => Err(Error::UnsupportedOutput(path.display().to_string())),
        }
    }
}

/// Write the chart, rasterizing it first when a PNG is requested.
pub fn save(svg: &str, path: &Path, format: OutputFormat) -> Result<()> {
    let bytes = match format {
        OutputFormat::Svg => svg.as_bytes().to_vec(),
        OutputFormat::Png => rasterize(svg)?,
    };
    fs::write(path, bytes).map_err(|e| Error::io(path, e))
}

/// Render SVG to PNG bytes. Text uses whatever system fonts are installed;
/// hosts without any still get the lines and grid.
pub fn rasterize(svg: &str) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    debug!(faces = options.fontdb.len(), "loaded fonts for rasterizing");

    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| Error::Rasterize(e.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        Error::Rasterize(format!("cannot allocate a {}x{} image", size.width(), size.height()))
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap.encode_png().map_err(|e| Error::Rasterize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_follows_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.png")).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("b/c.SVG")).unwrap(), OutputFormat::Svg);
        assert!(matches!(
            OutputFormat::from_path(&PathBuf::from("chart.jpg")),
            Err(Error::UnsupportedOutput(_))
        ));
        assert!(OutputFormat::from_path(Path::new("chart")).is_err());
    }

    #[test]
    fn rasterizes_to_png_signature() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><line x1="0" y1="5" x2="20" y2="5" stroke="black"/></svg>"#;
        let png = rasterize(svg).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
