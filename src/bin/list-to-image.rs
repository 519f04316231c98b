//! list-to-image - render a list of strings as centered lines in an image

use anyhow::{Context, Result};
use clap::Parser;
use hostprobe::config::Config;
use hostprobe::render::color::parse_color;
use hostprobe::render::{render, RenderOptions};
use hostprobe::terminal::init_logging;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

/// Rendered when no items are given
const SAMPLE_ITEMS: [&str; 8] = [
    "苹1果",
    "香3蕉",
    "橙子sada2",
    "西瓜",
    "葡萄asadq",
    "芒4果",
    "菠萝2",
    "草莓1",
];

const SAMPLE_OUTPUT: &str = "fruits.png";

/// List to Image - one centered line per item
#[derive(Parser)]
#[command(name = "list-to-image")]
#[command(version)]
#[command(about = "Render a list of strings as centered lines of text in an image")]
struct Cli {
    /// Items to render, top to bottom
    #[arg(conflicts_with = "input")]
    items: Vec<String>,

    /// Read items from a file, one per line ("-" for stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output image path; the extension selects the format
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Font size in pixels
    #[arg(long)]
    font_size: Option<u32>,

    /// Background color (#rrggbb or r,g,b)
    #[arg(long)]
    background: Option<String>,

    /// Text color (#rrggbb or r,g,b)
    #[arg(long)]
    text_color: Option<String>,

    /// Canvas width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Font file tried before the configured fonts (repeatable)
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merge CLI overrides onto the configured defaults
    fn options(&self, config: &Config) -> Result<RenderOptions> {
        let mut options = RenderOptions::from_config(&config.render)?;

        if let Some(output) = &self.output {
            options.output_path = output.clone();
        } else if self.uses_sample() {
            options.output_path = PathBuf::from(SAMPLE_OUTPUT);
        }
        if let Some(size) = self.font_size {
            options.font_size = size;
        }
        if let Some(color) = &self.background {
            options.background = parse_color(color).context("Invalid --background")?;
        }
        if let Some(color) = &self.text_color {
            options.text_color = parse_color(color).context("Invalid --text-color")?;
        }
        if let Some(width) = self.width {
            options.width = width;
        }
        if let Some(height) = self.height {
            options.height = height;
        }
        if !self.fonts.is_empty() {
            let mut fonts = self.fonts.clone();
            fonts.extend(options.fonts);
            options.fonts = fonts;
        }

        Ok(options)
    }

    fn uses_sample(&self) -> bool {
        self.items.is_empty() && self.input.is_none()
    }

    fn items(&self) -> Result<Vec<String>> {
        match &self.input {
            Some(path) => read_items(path),
            None if self.items.is_empty() => {
                Ok(SAMPLE_ITEMS.iter().map(|s| s.to_string()).collect())
            }
            None => Ok(self.items.clone()),
        }
    }
}

fn read_items(path: &Path) -> Result<Vec<String>> {
    if path == Path::new("-") {
        return io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("Failed to read items from stdin");
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read items from {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    let options = cli.options(&config)?;
    let items = cli.items()?;

    let rendered = render(&items, &options, &mut io::stdout().lock())?;
    tracing::debug!(face = %rendered.face, lines = rendered.layout.lines.len(), "image rendered");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn no_arguments_renders_the_sample_list() {
        let cli = Cli::try_parse_from(["list-to-image"]).unwrap();
        let options = cli.options(&Config::default()).unwrap();

        assert_eq!(options.output_path, PathBuf::from(SAMPLE_OUTPUT));
        assert_eq!(cli.items().unwrap().len(), SAMPLE_ITEMS.len());
    }

    #[test]
    fn positional_items_keep_order_and_default_output() {
        let cli = Cli::try_parse_from(["list-to-image", "b", "a", "c"]).unwrap();
        let options = cli.options(&Config::default()).unwrap();

        assert_eq!(cli.items().unwrap(), ["b", "a", "c"]);
        assert_eq!(options.output_path, PathBuf::from("output.png"));
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "list-to-image",
            "x",
            "-o",
            "list.jpg",
            "--font-size",
            "32",
            "--background",
            "0,0,0",
            "--text-color",
            "#ff0000",
            "--width",
            "640",
            "--height",
            "480",
            "--font",
            "custom.ttf",
        ])
        .unwrap();
        let options = cli.options(&Config::default()).unwrap();

        assert_eq!(options.output_path, PathBuf::from("list.jpg"));
        assert_eq!(options.font_size, 32);
        assert_eq!(options.background, Rgb([0, 0, 0]));
        assert_eq!(options.text_color, Rgb([255, 0, 0]));
        assert_eq!((options.width, options.height), (640, 480));
        assert_eq!(options.fonts[0], PathBuf::from("custom.ttf"));
        assert_eq!(options.fonts.len(), 3);
    }

    #[test]
    fn invalid_color_is_rejected() {
        let cli = Cli::try_parse_from(["list-to-image", "x", "--background", "blue"]).unwrap();
        assert!(cli.options(&Config::default()).is_err());
    }

    #[test]
    fn items_can_come_from_a_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "first\r\nsecond\n\nfourth\n").unwrap();

        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["list-to-image", "--input", path]).unwrap();
        assert_eq!(cli.items().unwrap(), ["first", "second", "", "fourth"]);
        assert!(!cli.uses_sample());
    }

    #[test]
    fn positional_items_conflict_with_input() {
        assert!(Cli::try_parse_from(["list-to-image", "a", "--input", "list.txt"]).is_err());
    }
}
