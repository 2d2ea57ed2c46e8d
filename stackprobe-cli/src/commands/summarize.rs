//! `stackprobe summarize` - one trend-summary row per application.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use stackprobe_core::summary::{self, LatencyFilter, SummaryOptions, SummaryRow};
use stackprobe_core::paths;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

pub struct Args {
    pub test_root: PathBuf,
    pub out: PathBuf,
    pub warmup_hours: f64,
    pub early_start_hours: f64,
    pub early_end_hours: f64,
    pub late_duration_hours: f64,
    pub bin_minutes: u32,
    pub latency_filter: String,
    pub min_samples_per_bin: usize,
}

pub fn run(args: Args) -> Result<()> {
    let Some(latency_filter) = LatencyFilter::parse(&args.latency_filter) else {
        bail!("--latency-filter must be one of: all, success, http<400");
    };

    let test_root = paths::expand_tilde(&args.test_root.to_string_lossy());
    if !test_root.is_dir() {
        bail!("Test root not found: {}", test_root.display());
    }

    let opts = SummaryOptions {
        warmup_hours: args.warmup_hours,
        early_start_hours: args.early_start_hours,
        early_end_hours: args.early_end_hours,
        late_duration_hours: args.late_duration_hours,
        bin_minutes: args.bin_minutes,
        latency_filter,
        min_samples_per_bin: args.min_samples_per_bin,
    };

    let rows = summary::summarize_all(&test_root, &opts)
        .with_context(|| format!("Failed to summarize runs under {}", test_root.display()))?;

    print_rows(&rows);

    summary::write_summary_csv(&rows, &args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!();
    println!("{} Summary written to {}", "✓".green().bold(), args.out.display());

    Ok(())
}

fn print_rows(rows: &[SummaryRow]) {
    #[derive(Tabled)]
    struct DisplayRow {
        #[tabled(rename = "APP")]
        app: String,
        #[tabled(rename = "MEM SLOPE (MiB/h)")]
        mem_slope: String,
        #[tabled(rename = "MEM MK p")]
        mem_p: String,
        #[tabled(rename = "P95 SLOPE (ms/h)")]
        p95_slope: String,
        #[tabled(rename = "P95 MK p")]
        p95_p: String,
        #[tabled(rename = "Δ MEM")]
        mem_delta: String,
        #[tabled(rename = "Δ P95")]
        p95_delta: String,
        #[tabled(rename = "ERRORS")]
        errors: String,
    }

    let display: Vec<DisplayRow> = rows
        .iter()
        .map(|r| DisplayRow {
            app: r.app_name.clone(),
            mem_slope: fmt_stat(r.memory_slope_mib_per_hour),
            mem_p: fmt_stat(r.memory_mk_pvalue),
            p95_slope: fmt_stat(r.p95_slope_ms_per_hour),
            p95_p: fmt_stat(r.p95_mk_pvalue),
            mem_delta: fmt_stat(r.delta_memory_early_late),
            p95_delta: fmt_stat(r.delta_p95_early_late),
            errors: r.total_errors.to_string(),
        })
        .collect();

    let mut table = Table::new(display);
    table.with(Style::rounded());
    println!("{}", table);
}

fn fmt_stat(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{:.3}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_stat() {
        assert_eq!(fmt_stat(f64::NAN), "-");
        assert_eq!(fmt_stat(1.23456), "1.235");
        assert_eq!(fmt_stat(0.0), "0.000");
    }
}
