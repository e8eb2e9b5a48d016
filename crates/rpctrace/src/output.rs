use std::io::{self, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rpctrace_decode::{EventSink, LogLine, Tally, TallyCategory, TallyRow};
use serde::Serialize;

#[derive(Clone, Debug, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One plain line per event.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Writes decoded lines to any writer in the chosen format.
#[derive(Debug)]
pub struct LineWriter<W> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> LineWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for LineWriter<W> {
    fn emit(&mut self, line: &LogLine) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{line}"),
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, line)?;
                writeln!(self.out)
            }
        }
    }
}

#[derive(Serialize)]
struct CategoryOutput {
    category: TallyCategory,
    unique: usize,
    rows: Vec<TallyRow>,
}

#[derive(Serialize)]
struct StatsOutput {
    stats: Vec<CategoryOutput>,
    total_unique: usize,
}

/// Print the merged tally: one table per non-empty category, highest
/// counts first, each followed by its number of unique names, then the
/// number of unique names overall.
pub fn print_stats(tally: &Tally, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    write_stats(&mut stdout.lock(), tally, format)
}

fn write_stats<W: Write>(out: &mut W, tally: &Tally, format: OutputFormat) -> io::Result<()> {
    let categories = TallyCategory::ALL
        .into_iter()
        .filter(|category| tally.unique_total(*category) > 0);

    match format {
        OutputFormat::Json => {
            let output = StatsOutput {
                stats: categories
                    .map(|category| CategoryOutput {
                        category,
                        unique: tally.unique_total(category),
                        rows: tally.counts(category),
                    })
                    .collect(),
                total_unique: tally.unique_names(),
            };
            serde_json::to_writer(&mut *out, &output)?;
            writeln!(out)
        }
        OutputFormat::Text => {
            for category in categories {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec![category.title().to_uppercase(), "COUNT".to_string()]);
                for row in tally.counts(category) {
                    table.add_row(vec![row.name, row.count.to_string()]);
                }
                writeln!(out, "{table}")?;
                writeln!(
                    out,
                    "{}: {} unique",
                    category.title(),
                    tally.unique_total(category)
                )?;
            }
            writeln!(
                out,
                "Total unique methods/commands/events: {}",
                tally.unique_names()
            )
        }
    }
}
