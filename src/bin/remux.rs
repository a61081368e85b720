//! Command-line entry point: remuxes one already-downloaded FLV/MP4 video
//! plus optional subtitle sources into a single Matroska file.
//!
//! Argument shape grounded on `examples/strawlab-strand-braid`'s
//! `flytrax-csv-to-braidz` binary's `clap::Parser` struct; URL retrieval,
//! playlist enumeration, and site-specific metadata fetching are out of
//! scope (`spec.md` §1) — every input here is already a local file.

use std::path::PathBuf;

use clap::Parser;
use log::error;

use mkremux::orchestrator::{self, SourceFormat, SubtitleInput, VideoJob};
use mkremux::subtitle;

/// Remuxes an FLV or MP4 source, plus optional subtitle XML, into Matroska.
#[derive(Parser, Debug)]
#[command(name = "remux", author, version, about)]
struct Cli {
    /// Path to the downloaded video body.
    video: PathBuf,

    /// Video title; used to build the sanitised output filename.
    #[arg(long)]
    title: String,

    /// Opaque video identifier, embedded in the output filename.
    #[arg(long)]
    vid: String,

    /// Container format of `video`. Inferred from its extension if omitted.
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Directory the output file is written into.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Site annotation XML document, embedded as a subtitle track.
    #[arg(long)]
    annotations: Option<PathBuf>,

    /// Drop annotations the source flagged as spam.
    #[arg(long)]
    filter_spam: bool,

    /// A timed-text XML document to embed as a subtitle track. May be given
    /// more than once, each paired with the next `--timedtext-lang`.
    #[arg(long = "timedtext")]
    timedtext: Vec<PathBuf>,

    /// ISO-639-1 language code for the timed-text document at the same
    /// position as its `--timedtext` argument.
    #[arg(long = "timedtext-lang")]
    timedtext_lang: Vec<String>,

    /// Display name applied to every embedded subtitle track.
    #[arg(long)]
    subtitle_name: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Format {
    Flv,
    Mp4,
}

fn infer_format(path: &std::path::Path) -> Option<Format> {
    match path.extension().and_then(|e| e.to_str())?.to_ascii_lowercase().as_str() {
        "flv" => Some(Format::Flv),
        "mp4" | "m4v" | "3gp" | "3gpp" => Some(Format::Mp4),
        _ => None,
    }
}

fn build_subtitles(cli: &Cli) -> mkremux::Result<Vec<SubtitleInput>> {
    let mut subtitles = Vec::new();

    if let Some(path) = &cli.annotations {
        let xml = std::fs::read_to_string(path)?;
        let doc = subtitle::document_from_annotations(&xml, cli.filter_spam)?;
        subtitles.push(SubtitleInput { doc, name: cli.subtitle_name.clone(), lang: None });
    }

    for (i, path) in cli.timedtext.iter().enumerate() {
        let xml = std::fs::read_to_string(path)?;
        let doc = subtitle::document_from_timedtext(&xml)?;
        let lang = cli.timedtext_lang.get(i).and_then(|code| subtitle::to_iso_639_2(code)).map(str::to_string);
        subtitles.push(SubtitleInput { doc, name: cli.subtitle_name.clone(), lang });
    }

    Ok(subtitles)
}

fn run(cli: Cli) -> i32 {
    let Some(format) = cli.format.or_else(|| infer_format(&cli.video)) else {
        error!("cannot determine container format of {}; pass --format", cli.video.display());
        return 1;
    };
    let format = match format {
        Format::Flv => SourceFormat::Flv,
        Format::Mp4 => SourceFormat::Mp4,
    };

    let subtitles = match build_subtitles(&cli) {
        Ok(subs) => subs,
        Err(e) => {
            error!("failed to prepare subtitle tracks: {e}");
            return 1;
        }
    };

    let output_path = cli.output_dir.join(orchestrator::output_filename(&cli.title, &cli.vid, "mkv", "mkv"));
    let job = VideoJob { source_path: cli.video, format, output_path, subtitles };

    if orchestrator::process_all(vec![job], env!("CARGO_PKG_NAME")) {
        0
    } else {
        1
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    std::process::exit(run(cli));
}
