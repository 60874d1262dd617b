use std::io::{IsTerminal, Write};

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

/// One request line and the reply it produced.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Exchange {
    pub stream_id: u16,
    pub service: String,
    pub request: String,
    pub reply: String,
}

pub fn print_exchanges(exchanges: &[Exchange], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for exchange in exchanges {
                println!(
                    "{}",
                    serde_json::to_string(exchange).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["STREAM", "SERVICE", "REQUEST", "REPLY"]);
            for exchange in exchanges {
                table.add_row(vec![
                    exchange.stream_id.to_string(),
                    service_label(&exchange.service).to_string(),
                    exchange.request.clone(),
                    exchange.reply.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for exchange in exchanges {
                println!(
                    "stream={} service={} request={} reply={}",
                    exchange.stream_id,
                    service_label(&exchange.service),
                    exchange.request,
                    exchange.reply
                );
            }
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout();
            for exchange in exchanges {
                let _ = writeln!(out, "{}", exchange.reply);
            }
            let _ = out.flush();
        }
    }
}

fn service_label(service: &str) -> &str {
    if service.is_empty() {
        "-"
    } else {
        service
    }
}
