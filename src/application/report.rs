//! Text and delimited-record rendering of benchmark results.
//!
//! Delimited records join fields with `;` and use a decimal comma with three
//! fractional digits, independent of the process locale.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::application::services::BenchmarkRun;
use crate::domain::{BenchmarkSample, CreationResult, Metric, ResultAggregate};

const RULE_WIDTH: usize = 80;

/// Header for [`Reporter::aggregate_record`].
pub const AGGREGATE_HEADER: &str = "nodes;generations;closure_table_size;\
root_avg;root_min;root_max;\
self_and_descendants_avg;self_and_descendants_min;self_and_descendants_max;\
self_and_ancestors_avg;self_and_ancestors_min;self_and_ancestors_max;\
delete";

/// Header for [`Reporter::creation_record`].
pub const CREATION_HEADER: &str = "nodes;closure_table_size;depth;creation";

/// Header for [`Reporter::sample_record`].
pub const SAMPLE_HEADER: &str = "id;depth;root;self_and_descendants;self_and_ancestors";

/// Output flavour for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("unknown report format: {other}")),
        }
    }
}

/// `1.23456` -> `1,235`
pub fn decimal_comma(millis: f64) -> String {
    format!("{millis:.3}").replace('.', ",")
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Renders samples, aggregates and creation results.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    /// Identifies the machine and time a report was produced on.
    pub fn run_header(&self, host: &str, at: DateTime<Utc>) -> String {
        format!("# closure-tree benchmark on {host} at {}", at.to_rfc3339())
    }

    pub fn sample_text(&self, sample: &BenchmarkSample) -> String {
        let node = sample.node();
        let mut s = format!(
            "Node: {} (ID: {}, Depth: {})",
            node.label, node.id, node.depth
        );
        for metric in Metric::ALL {
            let _ = write!(
                s,
                "\n\t{}: {:.3} ms",
                metric.query_name(),
                sample.value(metric)
            );
        }
        s
    }

    pub fn sample_record(&self, sample: &BenchmarkSample) -> String {
        let node = sample.node();
        std::iter::once(node.id.to_string())
            .chain(std::iter::once(node.depth.to_string()))
            .chain(Metric::ALL.iter().map(|&m| decimal_comma(sample.value(m))))
            .join(";")
    }

    /// Min/max/average block for one metric.
    pub fn stats_text(&self, aggregate: &ResultAggregate, title: &str, metric: Metric) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "\n{}", rule());
        let _ = writeln!(s, "BENCHMARK: {title}");
        let _ = writeln!(s, "{}", rule());
        for (caption, extreme) in [
            ("Min", aggregate.min_by(metric)),
            ("Max", aggregate.max_by(metric)),
        ] {
            match extreme {
                Some(sample) => {
                    let _ = writeln!(
                        s,
                        "{caption} time: {:.3} ms\n\t└─ Node: {} (Depth: {})",
                        sample.value(metric),
                        sample.node().label,
                        sample.node().depth
                    );
                }
                None => {
                    let _ = writeln!(s, "{caption} time: n/a");
                }
            }
        }
        let _ = writeln!(s, "Average time:  {:.3} ms", aggregate.average_by(metric));
        let _ = write!(s, "{}", rule());
        s
    }

    /// Configuration line, one stats block per metric and the deletion time.
    pub fn aggregate_text(&self, aggregate: &ResultAggregate) -> String {
        let config = aggregate.config();
        let mut s = format!(
            "Nodes: {}, Generations: {}, Closure table size: {}",
            config.node_count, config.generations, config.closure_table_size
        );
        for metric in Metric::ALL {
            s.push_str(&self.stats_text(aggregate, metric.query_name(), metric));
        }
        match aggregate.deletion_ms() {
            Some(ms) => {
                let _ = write!(s, "\nDelete time: {ms:.3} ms");
            }
            None => s.push_str("\nDelete time: not measured"),
        }
        s
    }

    /// Thirteen `;`-separated fields; the last one is empty until a deletion is recorded.
    pub fn aggregate_record(&self, aggregate: &ResultAggregate) -> String {
        let config = aggregate.config();
        let mut fields = vec![
            config.node_count.to_string(),
            config.generations.to_string(),
            config.closure_table_size.to_string(),
        ];
        for metric in Metric::ALL {
            let extreme = |s: Option<&BenchmarkSample>| s.map(|s| s.value(metric)).unwrap_or(0.0);
            fields.push(decimal_comma(aggregate.average_by(metric)));
            fields.push(decimal_comma(extreme(aggregate.min_by(metric))));
            fields.push(decimal_comma(extreme(aggregate.max_by(metric))));
        }
        fields.push(aggregate.deletion_ms().map(decimal_comma).unwrap_or_default());
        fields.join(";")
    }

    pub fn creation_text(&self, creation: &CreationResult) -> String {
        format!(
            "Depth: {}\n\tNodes number: {}\n\tClosure table size: {}\n\tCreation time: {:.3} ms",
            creation.depth, creation.node_count, creation.closure_table_size, creation.creation_ms
        )
    }

    pub fn creation_record(&self, creation: &CreationResult) -> String {
        [
            creation.node_count.to_string(),
            creation.closure_table_size.to_string(),
            creation.depth.to_string(),
            decimal_comma(creation.creation_ms),
        ]
        .join(";")
    }

    /// Full report for a set of runs, preceded by `header`.
    ///
    /// CSV output is grouped into blocks (creation, aggregates, then per-node
    /// samples when requested), each with its own header line.
    pub fn render(
        &self,
        runs: &[BenchmarkRun],
        format: ReportFormat,
        per_node: bool,
        header: &str,
    ) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{header}");
        match format {
            ReportFormat::Text => {
                for run in runs {
                    let _ = writeln!(out, "\n{}", self.creation_text(&run.creation));
                    if per_node {
                        for sample in run.aggregate.samples() {
                            let _ = writeln!(out, "{}", self.sample_text(sample));
                        }
                    }
                    let _ = writeln!(out, "{}", self.aggregate_text(&run.aggregate));
                }
            }
            ReportFormat::Csv => {
                let _ = writeln!(out, "{CREATION_HEADER}");
                for run in runs {
                    let _ = writeln!(out, "{}", self.creation_record(&run.creation));
                }
                let _ = writeln!(out, "\n{AGGREGATE_HEADER}");
                for run in runs {
                    let _ = writeln!(out, "{}", self.aggregate_record(&run.aggregate));
                }
                if per_node {
                    for run in runs {
                        let _ = writeln!(out, "\n# {}\n{SAMPLE_HEADER}", run.shape);
                        for sample in run.aggregate.samples() {
                            let _ = writeln!(out, "{}", self.sample_record(sample));
                        }
                    }
                }
            }
        }
        out
    }
}
