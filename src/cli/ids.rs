use clap::Parser;
use genreport::assign_ids;
use serde::Serialize;
use tracing::instrument;

use super::{Session, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Assign generation-based identifiers relative to the root")]
pub struct Ids {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Continue even if some individuals are not connected to the root
    #[arg(long)]
    allow_islands: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    id: u32,
    xref: &'a str,
    number: String,
    person: String,
}

impl Ids {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        session.preflight(self.allow_islands);

        let ids = assign_ids(&session.doc, &session.root, &session.config.fixed_band);
        let rows: Vec<Row> = ids
            .iter()
            .map(|(xref, id)| Row {
                id,
                xref: xref.as_str(),
                number: xref.number(),
                person: session.doc.person_summary(xref),
            })
            .collect();

        match self.output {
            OutputFormat::Table => Self::output_table(&rows),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        }
        Ok(())
    }

    fn output_table(rows: &[Row]) {
        let width = rows
            .iter()
            .map(|row| row.xref.len())
            .max()
            .unwrap_or_default();
        println!(
            "{}",
            format!("{:>6}  {:<width$}  Person", "Id", "Xref").heading()
        );
        for row in rows {
            println!("{:>6}  {:<width$}  {}", row.id, row.xref, row.person);
        }
        println!("\n{}", format!("{} identifiers assigned", rows.len()).dim());
    }
}
