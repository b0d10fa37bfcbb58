//! CLI front-end (§4.9): reads a document from a file or stdin, renders
//! it to HTML with the reference renderer, writes the result to stdout.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use marrow_core::{render, Buffer, Extension, Html, RenderOptions};

/// Render Markdown to HTML.
#[derive(Parser, Debug)]
#[command(name = "marrow", version, about)]
struct Args {
    /// Input file, or `-`/omitted for standard input.
    input: Option<PathBuf>,

    /// Maximum block/span recursion depth.
    #[arg(long, default_value_t = marrow_core::DEFAULT_MAX_NESTING)]
    nesting: usize,

    /// Increase logging verbosity (repeatable).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (repeatable).
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    quiet: u8,

    #[arg(long)]
    tables: bool,
    #[arg(long = "fenced-code")]
    fenced_code: bool,
    #[arg(long)]
    footnotes: bool,
    #[arg(long)]
    autolink: bool,
    #[arg(long)]
    strikethrough: bool,
    #[arg(long)]
    ins: bool,
    #[arg(long)]
    superscript: bool,
    #[arg(long = "no-intra-emphasis")]
    no_intra_emphasis: bool,
    #[arg(long = "lax-spacing")]
    lax_spacing: bool,
    #[arg(long = "space-headers")]
    space_headers: bool,

    #[arg(long)]
    safelink: bool,
    #[arg(long = "hard-wrap")]
    hard_wrap: bool,
    #[arg(long)]
    xhtml: bool,
    #[arg(long)]
    toc: bool,
    #[arg(long)]
    outline: bool,
    #[arg(long)]
    escape: bool,
    #[arg(long = "skip-html")]
    skip_html: bool,
    #[arg(long = "skip-style")]
    skip_style: bool,
    #[arg(long = "skip-links")]
    skip_links: bool,
    #[arg(long = "skip-images")]
    skip_images: bool,
    #[arg(long = "expand-tabs")]
    expand_tabs: bool,
}

impl Args {
    fn extensions(&self) -> Extension {
        let mut ext = Extension::empty();
        ext.set(Extension::TABLES, self.tables);
        ext.set(Extension::FENCED_CODE, self.fenced_code);
        ext.set(Extension::FOOTNOTES, self.footnotes);
        ext.set(Extension::AUTOLINK, self.autolink);
        ext.set(Extension::STRIKETHROUGH, self.strikethrough);
        ext.set(Extension::INS, self.ins);
        ext.set(Extension::SUPERSCRIPT, self.superscript);
        ext.set(Extension::NO_INTRA_EMPHASIS, self.no_intra_emphasis);
        ext.set(Extension::LAX_SPACING, self.lax_spacing);
        ext.set(Extension::SPACE_HEADERS, self.space_headers);
        ext
    }

    fn render_options(&self) -> RenderOptions {
        let mut opts = RenderOptions::empty();
        opts.set(RenderOptions::SAFELINK, self.safelink);
        opts.set(RenderOptions::HARD_WRAP, self.hard_wrap);
        opts.set(RenderOptions::USE_XHTML, self.xhtml);
        opts.set(RenderOptions::TOC, self.toc);
        opts.set(RenderOptions::OUTLINE, self.outline);
        opts.set(RenderOptions::ESCAPE, self.escape);
        opts.set(RenderOptions::SKIP_HTML, self.skip_html);
        opts.set(RenderOptions::SKIP_STYLE, self.skip_style);
        opts.set(RenderOptions::SKIP_LINKS, self.skip_links);
        opts.set(RenderOptions::SKIP_IMAGES, self.skip_images);
        opts.set(RenderOptions::EXPAND_TABS, self.expand_tabs);
        opts
    }

    fn log_level(&self) -> log::LevelFilter {
        let level = 2 + i32::from(self.verbose) - i32::from(self.quiet);
        match level.clamp(0, 4) {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match path {
        None => {
            std::io::stdin().read_to_end(&mut buf).context("reading standard input")?;
        }
        Some(p) if p.as_os_str() == "-" => {
            std::io::stdin().read_to_end(&mut buf).context("reading standard input")?;
        }
        Some(p) => {
            buf = std::fs::read(p).with_context(|| format!("reading {}", p.display()))?;
        }
    }
    Ok(buf)
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new().filter_level(args.log_level()).init();

    let input = read_input(args.input.as_ref())?;
    let extensions = args.extensions();
    let mut html = Html::new(args.render_options());
    let mut out = Buffer::new(input.len().max(64));

    render(&mut out, &input, &mut html, extensions, args.nesting).context("rendering document")?;

    std::io::stdout().write_all(out.as_slice()).context("writing output")?;
    Ok(())
}
