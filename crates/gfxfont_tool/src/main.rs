use std::{
    fmt::Write as _,
    fs,
    io::{self, Read, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use gfxfont::{DeclarationParser, FormatOptions, Formatter, GfxFont, GlyphDiagram};
use serde::Serialize;

#[derive(Parser)]
#[command(version, about = "Inspects and annotates Adafruit GFX font headers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Reprint a font header with glyph annotations")]
    Annotate {
        #[arg(help = "Font header to read, stdin if omitted")]
        file: Option<PathBuf>,

        #[arg(help = "Show unicode character names in the glyph table", long, default_value_t = false)]
        unicode_names: bool,

        #[arg(help = "Mark the end of every glyph in the byte table", long, default_value_t = false)]
        boundaries: bool,

        #[arg(help = "Draw every glyph next to its bytes, implies --boundaries", long, default_value_t = false)]
        draw: bool,

        #[arg(help = "TOML file with formatter options", long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[arg(help = "Output file, stdout if omitted", short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    #[command(about = "Reprint a font header in canonical form")]
    Format {
        #[arg(help = "Font header to read, stdin if omitted")]
        file: Option<PathBuf>,

        #[arg(help = "Output file, stdout if omitted", short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    #[command(about = "Print the parsed font as JSON")]
    Dump {
        #[arg(help = "Font header to read, stdin if omitted")]
        file: Option<PathBuf>,
    },

    #[command(about = "Draw the glyphs of a text and print its bounds")]
    Show {
        #[arg(help = "Characters to draw and measure")]
        text: String,

        #[arg(help = "Font header to read, stdin if omitted")]
        file: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct FontReport<'a> {
    #[serde(flatten)]
    font: &'a GfxFont,
    approximate_size: usize,
    /// Layout problem reported by `GfxFont::validate`, if any.
    validation_error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let _logger = Logger::try_with_env_or_str("warn")?.log_to_stderr().start()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Annotate {
            file,
            unicode_names,
            boundaries,
            draw,
            config,
            output,
        } => {
            let mut options = match config {
                Some(path) => load_options(&path)?,
                None => FormatOptions::default(),
            };
            options.show_unicode_names |= unicode_names;
            options.draw_glyphs |= draw;
            options.annotate_bitmap_boundaries |= boundaries || options.draw_glyphs;
            if options.header_comment.is_none() {
                options.header_comment = Some(format!("Processed by {}", std::env::args().collect::<Vec<_>>().join(" ")));
            }

            let font = read_font(file.as_deref())?;
            let text = Formatter::new(options).format(&font)?;
            write_output(output.as_deref(), &text)?;
        }
        Commands::Format { file, output } => {
            let font = read_font(file.as_deref())?;
            let text = Formatter::default().format(&font)?;
            write_output(output.as_deref(), &text)?;
        }
        Commands::Dump { file } => {
            let font = read_font(file.as_deref())?;
            let report = FontReport {
                font: &font,
                approximate_size: font.approximate_size(),
                validation_error: font.validate().err().map(|e| e.to_string()),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Show { text, file } => {
            let font = read_font(file.as_deref())?;
            print!("{}", show_text(&font, &text)?);
        }
    }
    Ok(())
}

fn load_options(path: &Path) -> anyhow::Result<FormatOptions> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_options(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn parse_options(text: &str) -> anyhow::Result<FormatOptions> {
    Ok(toml::from_str(text)?)
}

fn read_font(file: Option<&Path>) -> anyhow::Result<GfxFont> {
    let source = match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source).context("Failed to read stdin")?;
            source
        }
    };
    let font = DeclarationParser::new().parse(&source)?;
    log::info!("parsed {} with {} glyphs", font.name, font.glyphs.len());
    Ok(font)
}

fn write_output(output: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?,
        None => io::stdout().write_all(text.as_bytes())?,
    }
    Ok(())
}

fn show_text(font: &GfxFont, text: &str) -> anyhow::Result<String> {
    let mut out = String::new();
    for ch in text.chars().filter(|c| !c.is_control()) {
        let codepoint = ch as u32;
        let found = codepoint
            .checked_sub(font.first as u32)
            .map(|i| i as usize)
            .and_then(|i| Some((font.glyphs.get(i)?, font.glyph_bits(i)?)));
        let Some((glyph, bits)) = found else {
            log::warn!("0x{codepoint:02X} '{ch}' is not in {}", font.name);
            continue;
        };
        let diagram = GlyphDiagram::render(glyph, bits, '.')?;
        writeln!(
            out,
            "0x{codepoint:02X} '{ch}' ({} x {}) @({},{}) +{}\n{diagram}",
            glyph.width, glyph.height, glyph.x_offset, glyph.y_offset, glyph.x_advance
        )?;
    }
    let bounds = font.text_bounds(text, 0, 0);
    writeln!(out, "bounds: x={} y={} {} x {}", bounds.x, bounds.y, bounds.width, bounds.height)?;
    Ok(out)
}
