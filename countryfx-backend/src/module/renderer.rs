//! Summary image renderer
//!
//! Builds an SVG from [`SummaryStats`] and rasterises it to a fixed-size PNG
//! at a single well-known path.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use resvg::tiny_skia;
use resvg::usvg::{fontdb, Options, Tree};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::country::SummaryStats;

const SUMMARY_SVG_TEMPLATE: &str = include_str!("../../resources/summary_template.svg");

pub struct SummaryRenderer {
    output_path: PathBuf,
    fonts_dir: PathBuf,
}

impl SummaryRenderer {
    pub const WIDTH: u32 = 800;
    pub const HEIGHT: u32 = 600;
    /// Ranked entries shown on the image
    pub const TOP_N: usize = 5;

    const X_LEFT: f32 = 50.0;
    const X_RANK: f32 = 70.0;
    const Y_TITLE: f32 = 62.0;
    const Y_TOTAL: f32 = 120.0;
    const Y_REFRESHED: f32 = 156.0;
    const Y_RANK_HEADER: f32 = 220.0;
    const Y_FIRST_RANK: f32 = 256.0;
    const RANK_ROW_HEIGHT: f32 = 40.0;

    pub fn new(output_path: impl AsRef<Path>, fonts_dir: impl AsRef<Path>) -> Self {
        Self {
            output_path: output_path.as_ref().to_path_buf(),
            fonts_dir: fonts_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Render and overwrite the summary PNG. The previous image stays in
    /// place if anything fails before the final rename.
    pub async fn render(&self, stats: &SummaryStats) -> Result<PathBuf> {
        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create artifact directory: {:?}", parent))?;
        }

        let svg = Self::build_svg(stats);
        let png = render_svg_to_png(&svg, &self.fonts_dir)?;

        let staging_path = self.output_path.with_extension("png.tmp");
        tokio::fs::write(&staging_path, &png)
            .await
            .context(format!("Failed to write {:?}", staging_path))?;
        tokio::fs::rename(&staging_path, &self.output_path)
            .await
            .context(format!("Failed to move summary image into {:?}", self.output_path))?;

        tracing::info!(
            "Generated summary image: {:?} ({} countries, {} ranked)",
            self.output_path,
            stats.total_countries,
            stats.top.len()
        );
        Ok(self.output_path.clone())
    }

    // ── private helpers ──────────────────────────────────────────────────────

    fn build_svg(stats: &SummaryStats) -> String {
        let mut content = String::new();

        content.push_str(&Self::text(Self::X_LEFT, Self::Y_TITLE, "title", "Country Summary Report"));
        content.push_str(&Self::text(
            Self::X_LEFT,
            Self::Y_TOTAL,
            "header",
            &format!("Total Countries: {}", stats.total_countries),
        ));

        if let Some(refreshed) = stats.last_refreshed_at {
            content.push_str(&Self::text(
                Self::X_LEFT,
                Self::Y_REFRESHED,
                "body-text",
                &format!("Last Refreshed: {}", Self::format_timestamp(refreshed)),
            ));
        }

        content.push_str(&Self::text(
            Self::X_LEFT,
            Self::Y_RANK_HEADER,
            "header",
            &format!("Top {} Countries by Estimated GDP:", Self::TOP_N),
        ));

        for (i, record) in stats.top.iter().take(Self::TOP_N).enumerate() {
            let line = Self::rank_line(i + 1, &record.name, record.estimated_gdp);
            let y = Self::Y_FIRST_RANK + i as f32 * Self::RANK_ROW_HEIGHT;
            content.push_str(&Self::text(Self::X_RANK, y, "rank-text", &line));
        }

        SUMMARY_SVG_TEMPLATE
            .replace("{{WIDTH}}", &Self::WIDTH.to_string())
            .replace("{{HEIGHT}}", &Self::HEIGHT.to_string())
            .replace("{{CONTENT}}", &content)
    }

    fn text(x: f32, y: f32, class: &str, value: &str) -> String {
        format!(
            "  <text x=\"{:.0}\" y=\"{:.0}\" class=\"{}\">{}</text>\n",
            x,
            y,
            class,
            Self::escape_xml(value)
        )
    }

    fn rank_line(rank: usize, name: &str, estimated_gdp: Option<f64>) -> String {
        format!("{}. {} — {}", rank, name, Self::format_gdp(estimated_gdp))
    }

    fn format_timestamp(at: DateTime<Utc>) -> String {
        at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    /// `$1,234,567.89`; missing and zero figures read "N/A".
    fn format_gdp(value: Option<f64>) -> String {
        match value {
            Some(v) if v != 0.0 && v.is_finite() => {
                let fixed = format!("{:.2}", v.abs());
                let (whole, cents) = fixed.split_once('.').unwrap_or((&fixed, "00"));
                let sign = if v < 0.0 { "-" } else { "" };
                format!("{}${}.{}", sign, Self::group_thousands(whole), cents)
            }
            _ => "N/A".to_string(),
        }
    }

    fn group_thousands(digits: &str) -> String {
        let mut result = String::new();
        for (i, c) in digits.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }
        result.chars().rev().collect()
    }

    fn escape_xml(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }
}

/// Rasterise an SVG document to PNG bytes.
fn render_svg_to_png(svg_content: &str, fonts_dir: &Path) -> Result<Vec<u8>> {
    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();
    if fonts_dir.is_dir() {
        fontdb.load_fonts_dir(fonts_dir);
    }
    tracing::debug!("Loaded {} font faces", fontdb.len());

    let mut options = Options::default();
    options.font_family = "DejaVu Sans".to_string();
    options.fontdb = Arc::new(fontdb);

    let tree = Tree::from_str(svg_content, &options).context("Failed to parse SVG")?;

    let size = tree.size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width() as u32, size.height() as u32)
        .context("Failed to create pixmap")?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap.encode_png().context("Failed to encode PNG")
}
