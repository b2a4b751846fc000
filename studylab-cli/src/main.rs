//! StudyLab CLI — stage reports, CSV export, and watch mode.
//!
//! Commands:
//! - `report` — fetch both stages and print their tables once
//! - `export` — write a stage's filtered record set as CSV (UTF-8 BOM)
//! - `watch` — re-fetch and reprint on the configured refresh interval

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use studylab_core::data::{RemoteSheetProvider, SheetProvider};
use studylab_core::domain::{flag_max, FilterCriteria, Stage};
use studylab_runner::{
    build_cross_stage, build_stage_view, run_refresh_loop, Refresher, StageView, StudyConfig,
};

#[derive(Parser)]
#[command(name = "studylab", about = "StudyLab CLI — survey-study analytics")]
struct Cli {
    /// Path to the study config TOML.
    #[arg(long, default_value = "study.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch both stages and print their report tables.
    Report {
        /// Print the computed views as JSON instead of text tables.
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Export a stage's filtered record set as CSV.
    Export {
        /// Stage to export: 1 or 2.
        #[arg(long)]
        stage: u8,

        /// Output CSV path.
        #[arg(long, default_value = "records.csv")]
        output: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Refresh and reprint reports on the configured interval.
    Watch {
        /// Number of refresh cycles; omit to run until interrupted.
        #[arg(long)]
        cycles: Option<usize>,
    },
}

#[derive(clap::Args, Default)]
struct FilterArgs {
    /// Restrict to these participants.
    #[arg(long)]
    participant: Vec<String>,

    /// Restrict to these algorithms.
    #[arg(long)]
    algorithm: Vec<String>,

    /// Restrict to these stimulus/image ids.
    #[arg(long)]
    stimulus: Vec<String>,

    /// Earliest date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    from: Option<String>,

    /// Latest date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    to: Option<String>,
}

impl FilterArgs {
    fn into_criteria(self) -> Result<FilterCriteria> {
        Ok(FilterCriteria {
            participants: self.participant,
            algorithms: self.algorithm,
            questions: Vec::new(),
            stimuli: self.stimulus,
            date_from: self.from.as_deref().map(parse_date).transpose()?,
            date_to: self.to.as_deref().map(parse_date).transpose()?,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date: {s}"))
}

fn parse_stage(n: u8) -> Result<Stage> {
    match n {
        1 => Ok(Stage::One),
        2 => Ok(Stage::Two),
        other => bail!("stage must be 1 or 2, got {other}"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = StudyConfig::from_file(&cli.config)?;

    if config.source.base_url.is_empty() {
        bail!(
            "no source.base_url configured in {} — point it at your spreadsheet gateway",
            cli.config.display()
        );
    }

    let provider: Box<dyn SheetProvider> = Box::new(RemoteSheetProvider::new(
        &config.source.base_url,
        &config.source.document,
        &config.source.stage2_worksheet,
        config.source.timeout_secs,
    )?);
    let mut refresher = Refresher::new(provider, config.clone());

    match cli.command {
        Commands::Report { json, filters } => {
            let criteria = filters.into_criteria()?;
            let stage1 = refresher.snapshot(Stage::One)?;
            let stage2 = refresher.snapshot(Stage::Two)?;
            let view1 = build_stage_view(&stage1, &criteria, &config);
            let view2 = build_stage_view(&stage2, &criteria, &config);
            if json {
                let cross = build_cross_stage(&stage1, &stage2);
                let payload = serde_json::json!({
                    "stage1": view1,
                    "stage2": view2,
                    "cross_stage": cross,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_stage(&view1);
                print_stage(&view2);
                print_cross_stage(&stage1, &stage2);
            }
        }
        Commands::Export {
            stage,
            output,
            filters,
        } => {
            let stage = parse_stage(stage)?;
            let criteria = filters.into_criteria()?;
            let snapshot = refresher.snapshot(stage)?;
            let records = criteria.apply(&snapshot.records);
            studylab_runner::write_records_csv(&output, &records)?;
            println!("Exported {} records to {}", records.len(), output.display());
        }
        Commands::Watch { cycles } => {
            let criteria = FilterCriteria::default();
            run_refresh_loop(&mut refresher, cycles, |stage1, stage2| {
                print_stage(&build_stage_view(stage1, &criteria, &config));
                print_stage(&build_stage_view(stage2, &criteria, &config));
            })?;
        }
    }

    Ok(())
}

fn print_stage(view: &StageView) {
    match view {
        StageView::Empty { excluded_rows } => {
            println!("\nNo qualifying data for this stage.");
            if *excluded_rows > 0 {
                println!("  ({excluded_rows} rows excluded: unparseable timestamp)");
            }
        }
        StageView::Ready(report) => {
            let t = &report.totals;
            println!("\n=== {} ===", report.stage.label());
            println!("Responses:       {}", t.responses);
            println!("Accuracy:        {:.1}%", t.accuracy_pct);
            match (t.mean_latency_sec, t.median_latency_sec) {
                (Some(mean), Some(median)) => {
                    println!("Mean latency:    {mean:.2} s");
                    println!("Median latency:  {median:.2} s");
                }
                _ => println!("Latency:         n/a"),
            }
            println!("\"Don't know\":    {}", t.uncertain);
            if report.excluded_rows > 0 {
                println!("Excluded rows:   {}", report.excluded_rows);
            }

            if !report.letters_by_algorithm.is_empty() {
                println!("\nLetters (first exposure) by algorithm:");
                print_table(&report.letters_by_algorithm);
            }
            if !report.corners_by_algorithm.is_empty() {
                println!("\nCorners by algorithm:");
                print_table(&report.corners_by_algorithm);
            }
        }
    }
}

fn print_table(rows: &[studylab_core::domain::StatRow]) {
    let best = flag_max(rows);
    for (row, is_best) in rows.iter().zip(best) {
        let marker = if is_best { " *" } else { "" };
        println!(
            "  {:<24} {:>6} responses  {:>5.1}%{marker}",
            row.key, row.responses, row.accuracy_pct
        );
    }
}

fn print_cross_stage(stage1: &studylab_runner::StageSnapshot, stage2: &studylab_runner::StageSnapshot) {
    let cross = build_cross_stage(stage1, stage2);
    if cross.comparison.wide.is_empty() {
        return;
    }

    println!("\nLetters accuracy, stage 1 vs stage 2:");
    for row in &cross.comparison.wide {
        println!(
            "  {:<24} {:>5.1}%  {:>5.1}%",
            row.key, row.accuracy_stage1, row.accuracy_stage2
        );
    }

    println!("\nPooled (both stages, first exposures):");
    print_table(&cross.pooled);
}
