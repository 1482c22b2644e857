use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use toxsheet_engine::{extract_paired, extract_single, validate_identifiers, LayoutKind, ReportLayout};
use toxsheet_io::{load_dataset, load_layout, load_template, save_report};
use toxsheet_model::Worksheet;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_DB: &str = "유해성미확인물질 12종 DB.xlsx";
const OUTPUT_PREFIX: &str = "추출결과";

#[derive(Debug, Parser)]
#[command(name = "toxsheet")]
#[command(about = "Fill toxicology hazard report templates from the substance database.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report one substance.
    Single(SingleArgs),
    /// Report two substances side by side.
    Paired(PairedArgs),
    /// Print a built-in layout as JSON, to start an override file from.
    Layout(LayoutArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Toxicology database workbook.
    #[arg(long, default_value = DEFAULT_DB)]
    db: PathBuf,

    /// Report template workbook. A blank template is generated when omitted.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Sheet of the template to fill (default: the first sheet).
    #[arg(long, requires = "template")]
    sheet: Option<String>,

    /// JSON layout overriding the built-in cell coordinates.
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Directory for the generated report.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Exact output path; overrides `--out-dir` and the generated file name.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SingleArgs {
    /// Internal identifier of the substance (e.g. `B-3`).
    id: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct PairedArgs {
    /// Identifier reported in the upper block.
    first: String,

    /// Identifier reported in the lower block.
    second: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Single,
    Paired,
}

#[derive(Debug, Args)]
struct LayoutArgs {
    #[arg(long, value_enum, default_value_t = KindArg::Single)]
    kind: KindArg,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match Cli::parse().command {
        Command::Single(args) => {
            let ids = validate_identifiers(&[args.id.as_str()])?;
            run(&ids, &args.common, LayoutKind::Single)
        }
        Command::Paired(args) => {
            let ids = validate_identifiers(&[args.first.as_str(), args.second.as_str()])?;
            run(&ids, &args.common, LayoutKind::Paired)
        }
        Command::Layout(args) => {
            let layout = match args.kind {
                KindArg::Single => ReportLayout::single(),
                KindArg::Paired => ReportLayout::paired(),
            };
            let json = serde_json::to_string_pretty(&layout)?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").or_else(ignore_broken_pipe)?;
            Ok(())
        }
    }
}

fn run(ids: &[String], common: &CommonArgs, kind: LayoutKind) -> Result<()> {
    let layout = match &common.layout {
        Some(path) => {
            let layout = load_layout(path)?;
            if layout.kind != kind {
                bail!(
                    "layout `{}` is a {:?} layout, expected {:?}",
                    path.display(),
                    layout.kind,
                    kind
                );
            }
            layout
        }
        None => match kind {
            LayoutKind::Single => ReportLayout::single(),
            LayoutKind::Paired => ReportLayout::paired(),
        },
    };

    let dataset = load_dataset(&common.db)
        .with_context(|| format!("failed to load database `{}`", common.db.display()))?;
    let mut sheet = open_template(common, &layout)?;

    let summary = match ids {
        [id] => extract_single(&dataset, id, &layout, &mut sheet)?,
        [first, second] => extract_paired(&dataset, [first.as_str(), second.as_str()], &layout, &mut sheet)?,
        _ => bail!("expected one or two identifiers, got {}", ids.len()),
    };

    let out = output_path(common, ids);
    save_report(&out, &sheet, &layout)
        .with_context(|| format!("failed to save report `{}`", out.display()))?;
    info!(
        "saved {} ({} cells filled, {} blank)",
        out.display(),
        summary.cells_written,
        summary.cells_blank
    );
    Ok(())
}

fn open_template(common: &CommonArgs, layout: &ReportLayout) -> Result<Worksheet> {
    match &common.template {
        Some(path) => load_template(path, common.sheet.as_deref())
            .with_context(|| format!("failed to load template `{}`", path.display())),
        None => Ok(layout.blank_template()),
    }
}

fn output_path(common: &CommonArgs, ids: &[String]) -> PathBuf {
    match &common.out {
        Some(path) => path.clone(),
        None => common.out_dir.join(output_file_name(ids)),
    }
}

/// `추출결과_{id}.xlsx`, or `추출결과_{id1}_{id2}.xlsx` for a pair.
///
/// Path separators and other characters that are invalid in file names become `_`, so the
/// report always lands directly in the output directory.
fn output_file_name(ids: &[String]) -> String {
    let stem: Vec<String> = ids
        .iter()
        .map(|id| {
            id.chars()
                .map(|c| match c {
                    '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                    c if c.is_control() => '_',
                    c => c,
                })
                .collect()
        })
        .collect();
    format!("{OUTPUT_PREFIX}_{}.xlsx", stem.join("_"))
}

fn ignore_broken_pipe(err: std::io::Error) -> std::io::Result<()> {
    if err.kind() == std::io::ErrorKind::BrokenPipe {
        Ok(())
    } else {
        Err(err)
    }
}
