//! Run summarization: one row per application.
//!
//! Consumes the monitor CSV and the JMeter JTL produced by a load-test run
//! and reduces each application to a handful of trend statistics: memory
//! slope (MiB/hour), binned p95 latency slope (ms/hour), Mann-Kendall
//! p-values, early/late deltas, and the total error count.

use crate::error::{ProbeError, Result};
use crate::stats;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MS_PER_HOUR: f64 = 1000.0 * 3600.0;

/// Which requests feed the p95 latency series.
///
/// Heavily rate-limited apps (HTTP 429) produce artificially fast rejections,
/// so the default only trends requests that were truly served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatencyFilter {
    /// success == true and HTTP code < 400 (default).
    #[default]
    Served,
    /// success == true regardless of HTTP code parsing.
    Success,
    /// Every request, including rejections.
    All,
}

impl LatencyFilter {
    /// Parse from string ("http<400", "success", "all").
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "http<400" | "served" => Some(Self::Served),
            "success" => Some(Self::Success),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Summarization settings. Time quantities are hours unless noted.
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Leading window to discard so startup effects are not read as aging.
    pub warmup_hours: f64,
    pub early_start_hours: f64,
    pub early_end_hours: f64,
    pub late_duration_hours: f64,
    /// Bin size in minutes for the p95 series.
    pub bin_minutes: u32,
    pub latency_filter: LatencyFilter,
    /// Bins with fewer samples than this are dropped.
    pub min_samples_per_bin: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            warmup_hours: 0.5,
            early_start_hours: 1.0,
            early_end_hours: 2.0,
            late_duration_hours: 2.0,
            bin_minutes: 1,
            latency_filter: LatencyFilter::default(),
            min_samples_per_bin: 5,
        }
    }
}

/// One summary row per application.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub app_name: String,
    #[serde(serialize_with = "nan_as_empty")]
    pub memory_slope_mib_per_hour: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub memory_mk_pvalue: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub p95_slope_ms_per_hour: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub p95_mk_pvalue: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub delta_memory_early_late: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub delta_p95_early_late: f64,
    pub total_errors: u64,
}

/// Serialize NaN as an empty CSV field instead of the string "NaN".
fn nan_as_empty<S: Serializer>(v: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
    if v.is_nan() {
        s.serialize_str("")
    } else {
        s.serialize_f64(*v)
    }
}

/// Inputs for one discovered run.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub app_name: String,
    pub monitor_path: PathBuf,
    pub jtl_path: PathBuf,
}

/// Discover runs under `root`: `<APP>/Output/monitor_results.csv` plus
/// `<APP>/Output/jmeter_results.jtl`. App directories lacking either file
/// are skipped.
pub fn discover_runs(root: &Path) -> Result<Vec<RunInputs>> {
    let entries = std::fs::read_dir(root)
        .map_err(|e| ProbeError::IoError { path: root.to_path_buf(), source: e })?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let mut runs = Vec::new();
    for dir in dirs {
        let out = dir.join("Output");
        let monitor_path = out.join("monitor_results.csv");
        let jtl_path = out.join("jmeter_results.jtl");
        if monitor_path.is_file() && jtl_path.is_file() {
            runs.push(RunInputs {
                app_name: crate::paths::display_name(&dir),
                monitor_path,
                jtl_path,
            });
        } else {
            debug!(dir = %dir.display(), "Skipping app directory without outputs");
        }
    }

    Ok(runs)
}

/// Summarize every discovered run, sorted by app name.
pub fn summarize_all(root: &Path, opts: &SummaryOptions) -> Result<Vec<SummaryRow>> {
    let runs = discover_runs(root)?;
    if runs.is_empty() {
        return Err(ProbeError::NoRunsFound { root: root.to_path_buf() });
    }

    let mut rows = Vec::with_capacity(runs.len());
    for run in &runs {
        info!(app = %run.app_name, "Summarizing run");
        let memory = compute_memory_metrics(&run.monitor_path, opts)?;
        let latency = compute_latency_metrics(&run.jtl_path, opts)?;

        rows.push(SummaryRow {
            app_name: run.app_name.clone(),
            memory_slope_mib_per_hour: memory.slope,
            memory_mk_pvalue: memory.mk_pvalue,
            p95_slope_ms_per_hour: latency.slope,
            p95_mk_pvalue: latency.mk_pvalue,
            delta_memory_early_late: memory.delta_early_late,
            delta_p95_early_late: latency.delta_early_late,
            total_errors: latency.total_errors,
        });
    }

    rows.sort_by(|a, b| a.app_name.cmp(&b.app_name));
    Ok(rows)
}

/// Write summary rows to a CSV file, creating parent directories as needed.
pub fn write_summary_csv(rows: &[SummaryRow], out: &Path) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ProbeError::IoError { path: parent.to_path_buf(), source: e })?;
        }
    }

    let mut writer = csv::Writer::from_path(out)
        .map_err(|e| ProbeError::CsvError { path: out.to_path_buf(), source: e })?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| ProbeError::CsvError { path: out.to_path_buf(), source: e })?;
    }
    writer
        .flush()
        .map_err(|e| ProbeError::IoError { path: out.to_path_buf(), source: e })?;
    Ok(())
}

// ============================================================================
// Memory metrics
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct MemoryMetrics {
    /// MiB per hour (Theil-Sen).
    pub slope: f64,
    pub mk_pvalue: f64,
    /// Median of the late window minus median of the early window.
    pub delta_early_late: f64,
}

/// Monitor CSV row; only the columns the memory series needs.
#[derive(Debug, Deserialize)]
struct MonitorRow {
    timestamp: i64,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    container_name: Option<String>,
    #[serde(default)]
    memory_mib: Option<f64>,
}

/// Compute the memory trend for one run.
pub fn compute_memory_metrics(path: &Path, opts: &SummaryOptions) -> Result<MemoryMetrics> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ProbeError::CsvError { path: path.to_path_buf(), source: e })?;

    let mut rows: Vec<MonitorRow> = Vec::new();
    for record in reader.deserialize() {
        let row: MonitorRow =
            record.map_err(|e| ProbeError::CsvError { path: path.to_path_buf(), source: e })?;
        rows.push(row);
    }
    rows.sort_by_key(|r| r.timestamp);

    let series = build_memory_series(&rows);
    let nan = MemoryMetrics { slope: f64::NAN, mk_pvalue: f64::NAN, delta_early_late: f64::NAN };
    let Some(&(t0, _)) = series.first() else {
        return Ok(nan);
    };

    // Hours since start, warm-up excluded
    let points: Vec<(f64, f64)> = series
        .iter()
        .map(|&(ts, mem)| ((ts - t0) as f64 / MS_PER_HOUR, mem))
        .filter(|&(t, _)| t >= opts.warmup_hours)
        .collect();

    if points.len() < 3 {
        return Ok(nan);
    }

    let x: Vec<f64> = points.iter().map(|p| p.0).collect();
    let y: Vec<f64> = points.iter().map(|p| p.1).collect();

    let slope = stats::theil_sen_slope(&y, &x);
    let mk_pvalue = stats::mann_kendall_pvalue(&y);
    let delta_early_late = early_late_delta(&x, &y, opts);

    Ok(MemoryMetrics { slope, mk_pvalue, delta_early_late })
}

/// Produce one memory series for the project.
///
/// Preference order: `scope == "project"` rows, then `container_name == "ALL"`
/// rows, else the per-timestamp sum across containers.
fn build_memory_series(rows: &[MonitorRow]) -> Vec<(i64, f64)> {
    let project_rows: Vec<(i64, f64)> = rows
        .iter()
        .filter(|r| r.scope.as_deref() == Some("project"))
        .filter_map(|r| r.memory_mib.map(|m| (r.timestamp, m)))
        .collect();
    if !project_rows.is_empty() {
        return project_rows;
    }

    let all_rows: Vec<(i64, f64)> = rows
        .iter()
        .filter(|r| r.container_name.as_deref() == Some("ALL"))
        .filter_map(|r| r.memory_mib.map(|m| (r.timestamp, m)))
        .collect();
    if !all_rows.is_empty() {
        return all_rows;
    }

    // Fallback: sum container memory per sample timestamp
    let mut by_ts: BTreeMap<i64, f64> = BTreeMap::new();
    for row in rows {
        if let Some(mem) = row.memory_mib {
            *by_ts.entry(row.timestamp).or_insert(0.0) += mem;
        }
    }
    by_ts.into_iter().collect()
}

// ============================================================================
// Latency metrics
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct LatencyMetrics {
    /// ms per hour (Theil-Sen over the binned p95 series).
    pub slope: f64,
    pub mk_pvalue: f64,
    pub delta_early_late: f64,
    /// Errors across the whole run: failed, HTTP >= 400, or unparsable code.
    pub total_errors: u64,
}

/// JMeter JTL CSV row; only the columns the latency series needs.
///
/// Numeric columns are kept as raw strings and parsed per row: real JTLs
/// carry the occasional garbage line (truncated writes, embedded messages),
/// and one bad value must drop that row, not the whole run.
#[derive(Debug, Deserialize)]
struct JtlRow {
    #[serde(rename = "timeStamp", default)]
    time_stamp: Option<String>,
    #[serde(default)]
    elapsed: Option<String>,
    #[serde(default)]
    success: Option<String>,
    #[serde(rename = "responseCode", default)]
    response_code: Option<String>,
}

impl JtlRow {
    fn time_stamp_ms(&self) -> Option<i64> {
        self.time_stamp.as_deref().and_then(|v| v.trim().parse().ok())
    }

    fn elapsed_ms(&self) -> Option<f64> {
        self.elapsed.as_deref().and_then(|v| v.trim().parse().ok())
    }

    fn success_bool(&self) -> bool {
        let Some(s) = &self.success else { return false };
        matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "y")
    }

    fn response_int(&self) -> Option<i64> {
        self.response_code.as_deref().and_then(|c| c.trim().parse().ok())
    }

    /// Error definition: not successful, HTTP >= 400, or a response code
    /// that cannot be parsed as a number.
    fn is_error(&self) -> bool {
        !self.success_bool() || self.response_int().map_or(true, |c| c >= 400)
    }
}

/// Compute the binned p95 latency trend for one run.
///
/// Only CSV JTL output is supported; JMeter's XML output is rejected with a
/// pointer to reconfigure the results writer.
pub fn compute_latency_metrics(path: &Path, opts: &SummaryOptions) -> Result<LatencyMetrics> {
    reject_xml_jtl(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ProbeError::CsvError { path: path.to_path_buf(), source: e })?;

    {
        let headers = reader
            .headers()
            .map_err(|e| ProbeError::CsvError { path: path.to_path_buf(), source: e })?;
        for required in ["timeStamp", "elapsed", "success"] {
            if !headers.iter().any(|h| h == required) {
                return Err(ProbeError::InvalidJtl {
                    path: path.to_path_buf(),
                    reason: format!("missing required column '{}'", required),
                });
            }
        }
    }

    // Malformed records are dropped, not fatal
    let mut rows: Vec<JtlRow> = Vec::new();
    for record in reader.deserialize() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => debug!(path = %path.display(), error = %e, "Skipping malformed JTL record"),
        }
    }
    rows.sort_by_key(|r| r.time_stamp_ms().unwrap_or(i64::MAX));

    // Total errors over the whole run, independent of the latency filter
    let total_errors = rows.iter().filter(|r| r.is_error()).count() as u64;

    let nan = LatencyMetrics {
        slope: f64::NAN,
        mk_pvalue: f64::NAN,
        delta_early_late: f64::NAN,
        total_errors,
    };

    let Some(t0) = rows.iter().filter_map(|r| r.time_stamp_ms()).next() else {
        return Ok(nan);
    };

    // (t_hours, elapsed_ms) for valid samples past warm-up
    let samples: Vec<(f64, f64, bool, Option<i64>)> = rows
        .iter()
        .filter_map(|r| {
            let ts = r.time_stamp_ms()?;
            let elapsed = r.elapsed_ms()?;
            let t_hours = (ts - t0) as f64 / MS_PER_HOUR;
            Some((t_hours, elapsed, r.success_bool(), r.response_int()))
        })
        .filter(|&(t, _, _, _)| t >= opts.warmup_hours)
        .collect();

    if samples.len() < 10 {
        return Ok(nan);
    }

    let filtered: Vec<(f64, f64)> = samples
        .iter()
        .filter(|&&(_, _, ok, code)| match opts.latency_filter {
            LatencyFilter::All => true,
            LatencyFilter::Success => ok,
            LatencyFilter::Served => ok && code.is_some_and(|c| c < 400),
        })
        .map(|&(t, e, _, _)| (t, e))
        .collect();

    if filtered.len() < 10 {
        return Ok(nan);
    }

    // Bin by time and take p95 per sufficiently-populated bin
    let mut bins: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for &(t_hours, elapsed) in &filtered {
        let bin = (t_hours * 60.0 / opts.bin_minutes as f64).floor() as i64;
        bins.entry(bin).or_default().push(elapsed);
    }

    let mut x = Vec::new();
    let mut y = Vec::new();
    for (bin, values) in &bins {
        if values.len() >= opts.min_samples_per_bin {
            x.push(*bin as f64 * opts.bin_minutes as f64 / 60.0);
            y.push(stats::quantile(values, 0.95));
        }
    }

    if y.len() < 5 {
        return Ok(nan);
    }

    let slope = stats::theil_sen_slope(&y, &x);
    let mk_pvalue = stats::mann_kendall_pvalue(&y);
    let delta_early_late = early_late_delta(&x, &y, opts);

    Ok(LatencyMetrics { slope, mk_pvalue, delta_early_late, total_errors })
}

/// Median(late window) - median(early window), NaN when either is empty.
fn early_late_delta(x: &[f64], y: &[f64], opts: &SummaryOptions) -> f64 {
    let Some(tmax) = x.iter().copied().filter(|v| !v.is_nan()).fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |a| a.max(v)))
    }) else {
        return f64::NAN;
    };

    let late_start = opts.warmup_hours.max(tmax - opts.late_duration_hours);

    let early: Vec<f64> = x
        .iter()
        .zip(y)
        .filter(|(&t, _)| t >= opts.early_start_hours && t < opts.early_end_hours)
        .map(|(_, &v)| v)
        .collect();
    let late: Vec<f64> = x
        .iter()
        .zip(y)
        .filter(|(&t, _)| t >= late_start && t <= tmax)
        .map(|(_, &v)| v)
        .collect();

    if early.is_empty() || late.is_empty() {
        return f64::NAN;
    }
    stats::median(&late) - stats::median(&early)
}

/// JMeter defaults to XML output in some setups; there is no XML path here,
/// so fail fast with an actionable message.
fn reject_xml_jtl(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(|e| ProbeError::FileReadError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    if content.trim_start().starts_with('<') {
        return Err(ProbeError::InvalidJtl {
            path: path.to_path_buf(),
            reason: "XML JTL output is not supported; configure JMeter to write CSV results"
                .to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    fn write_monitor_csv(dir: &Path, rows: &[(i64, &str, &str, f64)]) -> PathBuf {
        let mut content = String::from(
            "timestamp,timestamp_local,project,container_name,container_id,memory_mib,memory_percent,cpu_percent,scope\n",
        );
        for (ts, name, scope, mem) in rows {
            writeln!(content, "{},x,demo,{},{},{},,0.5,{}", ts, name, name, mem, scope).unwrap();
        }
        let path = dir.join("monitor_results.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn write_jtl(dir: &Path, rows: &[(i64, f64, bool, &str)]) -> PathBuf {
        let mut content = String::from("timeStamp,elapsed,label,responseCode,success\n");
        for (ts, elapsed, ok, code) in rows {
            writeln!(content, "{},{},home,{},{}", ts, elapsed, code, ok).unwrap();
        }
        let path = dir.join("jmeter_results.jtl");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_latency_filter_parse() {
        assert_eq!(LatencyFilter::parse("http<400"), Some(LatencyFilter::Served));
        assert_eq!(LatencyFilter::parse("SUCCESS"), Some(LatencyFilter::Success));
        assert_eq!(LatencyFilter::parse("all"), Some(LatencyFilter::All));
        assert!(LatencyFilter::parse("sometimes").is_none());
    }

    #[test]
    fn test_memory_series_prefers_project_scope() {
        let rows = vec![
            MonitorRow {
                timestamp: 0,
                scope: Some("container".into()),
                container_name: Some("web".into()),
                memory_mib: Some(100.0),
            },
            MonitorRow {
                timestamp: 0,
                scope: Some("project".into()),
                container_name: Some("ALL".into()),
                memory_mib: Some(150.0),
            },
        ];
        let series = build_memory_series(&rows);
        assert_eq!(series, vec![(0, 150.0)]);
    }

    #[test]
    fn test_memory_series_sums_containers_without_markers() {
        let rows = vec![
            MonitorRow {
                timestamp: 0,
                scope: None,
                container_name: Some("web".into()),
                memory_mib: Some(100.0),
            },
            MonitorRow {
                timestamp: 0,
                scope: None,
                container_name: Some("db".into()),
                memory_mib: Some(50.0),
            },
            MonitorRow {
                timestamp: 60_000,
                scope: None,
                container_name: Some("web".into()),
                memory_mib: Some(110.0),
            },
        ];
        let series = build_memory_series(&rows);
        assert_eq!(series, vec![(0, 150.0), (60_000, 110.0)]);
    }

    #[test]
    fn test_memory_metrics_rising_series() {
        let dir = tempfile::tempdir().unwrap();
        // One sample per minute for 3 hours, memory climbing 1 MiB per sample
        let rows: Vec<(i64, &str, &str, f64)> = (0..180)
            .map(|i| (i * 60_000, "ALL", "project", 100.0 + i as f64))
            .collect();
        let path = write_monitor_csv(dir.path(), &rows);

        let opts = SummaryOptions::default();
        let metrics = compute_memory_metrics(&path, &opts).unwrap();
        // 1 MiB per minute = 60 MiB per hour
        assert!((metrics.slope - 60.0).abs() < 1.0, "slope {}", metrics.slope);
        assert!(metrics.mk_pvalue < 0.01);
    }

    #[test]
    fn test_memory_metrics_too_few_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_monitor_csv(dir.path(), &[(0, "ALL", "project", 100.0)]);
        let metrics = compute_memory_metrics(&path, &SummaryOptions::default()).unwrap();
        assert!(metrics.slope.is_nan());
        assert!(metrics.mk_pvalue.is_nan());
    }

    #[test]
    fn test_latency_metrics_counts_errors() {
        let dir = tempfile::tempdir().unwrap();
        // Short run: too few post-warmup samples for a trend, but errors count
        let rows = vec![
            (0, 120.0, true, "200"),
            (1000, 130.0, false, "500"),
            (2000, 90.0, true, "429"),
            (3000, 100.0, true, "bad"),
        ];
        let path = write_jtl(dir.path(), &rows);
        let metrics = compute_latency_metrics(&path, &SummaryOptions::default()).unwrap();
        // 500 fails, 429 is an error (>= 400), unparsable code is an error
        assert_eq!(metrics.total_errors, 3);
        assert!(metrics.slope.is_nan());
    }

    #[test]
    fn test_latency_metrics_rising_p95() {
        let dir = tempfile::tempdir().unwrap();
        // 10 requests per minute over 3 hours, latency creeping upward
        let mut rows = Vec::new();
        for minute in 0..180i64 {
            for k in 0..10i64 {
                let ts = minute * 60_000 + k * 5_000;
                let elapsed = 100.0 + minute as f64; // +1 ms per minute
                rows.push((ts, elapsed, true, "200"));
            }
        }
        let path = write_jtl(dir.path(), &rows);
        let metrics = compute_latency_metrics(&path, &SummaryOptions::default()).unwrap();
        assert_eq!(metrics.total_errors, 0);
        // 1 ms per minute = 60 ms per hour
        assert!((metrics.slope - 60.0).abs() < 2.0, "slope {}", metrics.slope);
        assert!(metrics.mk_pvalue < 0.01);
        // Late window sits above the early window (windows overlap on a 3h
        // run, so the gap is modest but clearly positive)
        assert!(metrics.delta_early_late > 20.0, "delta {}", metrics.delta_early_late);
    }

    #[test]
    fn test_jtl_garbage_rows_are_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = String::from("timeStamp,elapsed,label,responseCode,success\n");
        for minute in 0..180i64 {
            for k in 0..10i64 {
                let ts = minute * 60_000 + k * 5_000;
                writeln!(content, "{},{},home,200,true", ts, 100.0 + minute as f64).unwrap();
            }
        }
        // A truncated-write artifact and an unparsable timestamp mid-file
        writeln!(content, "3600000,oops,home,200,true").unwrap();
        writeln!(content, "not-a-time,120,home,200,true").unwrap();
        let path = dir.path().join("jmeter_results.jtl");
        std::fs::write(&path, content).unwrap();

        let metrics = compute_latency_metrics(&path, &SummaryOptions::default()).unwrap();
        // The bad rows vanish from the series; the trend still comes out
        assert!((metrics.slope - 60.0).abs() < 2.0, "slope {}", metrics.slope);
        assert_eq!(metrics.total_errors, 0);
    }

    #[test]
    fn test_xml_jtl_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jmeter_results.jtl");
        std::fs::write(&path, "<?xml version=\"1.0\"?>\n<testResults/>").unwrap();
        let err = compute_latency_metrics(&path, &SummaryOptions::default()).unwrap_err();
        assert!(err.to_string().contains("XML"));
    }

    #[test]
    fn test_jtl_missing_columns_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jmeter_results.jtl");
        std::fs::write(&path, "time,latency\n1,2\n").unwrap();
        assert!(compute_latency_metrics(&path, &SummaryOptions::default()).is_err());
    }

    #[test]
    fn test_discover_and_summarize() {
        let root = tempfile::tempdir().unwrap();

        // One complete app
        let app = root.path().join("demo-app");
        let out = app.join("Output");
        std::fs::create_dir_all(&out).unwrap();
        let rows: Vec<(i64, &str, &str, f64)> = (0..180)
            .map(|i| (i * 60_000, "ALL", "project", 100.0 + i as f64))
            .collect();
        write_monitor_csv(&out, &rows);
        let jtl: Vec<(i64, f64, bool, &str)> = (0..2000)
            .map(|i| (i * 5_000, 100.0, true, "200"))
            .collect();
        write_jtl(&out, &jtl);

        // One incomplete app, skipped
        std::fs::create_dir_all(root.path().join("half-done/Output")).unwrap();

        let runs = discover_runs(root.path()).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].app_name, "demo-app");

        let rows = summarize_all(root.path(), &SummaryOptions::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].app_name, "demo-app");
        assert_eq!(rows[0].total_errors, 0);

        let out_csv = root.path().join("summary.csv");
        write_summary_csv(&rows, &out_csv).unwrap();
        let content = std::fs::read_to_string(&out_csv).unwrap();
        assert!(content.starts_with("app_name,"));
        assert!(content.contains("demo-app"));
    }

    #[test]
    fn test_summarize_empty_root_errors() {
        let root = tempfile::tempdir().unwrap();
        let err = summarize_all(root.path(), &SummaryOptions::default()).unwrap_err();
        assert!(matches!(err, ProbeError::NoRunsFound { .. }));
    }
}
