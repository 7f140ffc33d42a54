use std::io::{IsTerminal, Write};

use chardev_host::HostCall;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One write followed by one read on the device.
#[derive(Debug, Serialize)]
pub struct RoundTrip {
    pub sent: String,
    pub written: usize,
    pub received: String,
    pub received_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reread_len: Option<usize>,
}

#[derive(Serialize)]
struct ExchangeOutput<'a> {
    device: &'a str,
    devt: String,
    opens: u64,
    exchanges: &'a [RoundTrip],
}

pub fn print_exchange(
    device: &str,
    devt: String,
    opens: u64,
    rounds: &[RoundTrip],
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = ExchangeOutput {
                device,
                devt,
                opens,
                exchanges: rounds,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SENT", "WRITTEN", "RECEIVED", "READ"]);
            for round in rounds {
                table.add_row(vec![
                    round.sent.clone(),
                    round.written.to_string(),
                    round.received.clone(),
                    round.received_len.to_string(),
                ]);
            }
            println!("{device} ({devt}), opened {opens} time(s)");
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for round in rounds {
                println!(
                    "device={} sent={:?} written={} received={:?} read={}",
                    device, round.sent, round.written, round.received, round.received_len
                );
            }
        }
        OutputFormat::Raw => {
            for round in rounds {
                print_raw(round.received.as_bytes());
                print_raw(b"\n");
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JournalEntry {
    pub op: &'static str,
    pub detail: String,
}

impl From<&HostCall> for JournalEntry {
    fn from(call: &HostCall) -> Self {
        Self {
            op: call.op(),
            detail: call.to_string(),
        }
    }
}

/// Outcome of a load/unload cycle.
#[derive(Debug, Serialize)]
pub struct LifecycleReport {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errno: Option<i32>,
    pub leaked: usize,
    pub journal: Vec<JournalEntry>,
}

pub fn print_lifecycle(report: &LifecycleReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "OPERATION", "DETAIL"]);
            for (idx, entry) in report.journal.iter().enumerate() {
                table.add_row(vec![
                    (idx + 1).to_string(),
                    entry.op.to_string(),
                    entry.detail.clone(),
                ]);
            }
            println!("{table}");
            println!("{}", summary(report));
        }
        OutputFormat::Pretty => {
            for entry in &report.journal {
                println!("  {}", entry.detail);
            }
            println!("{}", summary(report));
        }
        OutputFormat::Raw => {
            for entry in &report.journal {
                println!("{}", entry.op);
            }
        }
    }
}

fn summary(report: &LifecycleReport) -> String {
    match (&report.error, report.major) {
        (Some(err), _) => format!("load failed: {err}; leaked resources: {}", report.leaked),
        (None, Some(major)) => {
            format!("loaded with major {major} and unloaded; leaked resources: {}", report.leaked)
        }
        (None, None) => format!("leaked resources: {}", report.leaked),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
