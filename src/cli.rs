use std::path::PathBuf;

mod check;
mod ids;
mod show;
mod terminal;

use check::Check;
use clap::ArgAction;
use genreport::{Config, Document, Xref, find_disconnected};
use ids::Ids;
use show::Show;
use terminal::Colorize;
use tracing::instrument;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The interchange file to read
    #[arg(short, long)]
    input: PathBuf,

    /// The root individual, as a cross-reference (`@I1@`) or a bare number
    ///
    /// Defaults to the individual with the lowest number.
    #[arg(short, long)]
    root: Option<String>,

    /// A configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let session = Session::open(&self.input, self.root.as_deref(), self.config)?;
        self.command.run(&session)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Check that every individual is connected to the root
    Check(Check),

    /// Assign generation-based identifiers relative to the root
    Ids(Ids),

    /// Show the names, fields and relations of individuals
    Show(Show),
}

impl Command {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(session),
            Self::Ids(command) => command.run(session)?,
            Self::Show(command) => command.run(session)?,
        }
        Ok(())
    }
}

/// Everything a command needs: the loaded file, the resolved root and the
/// configuration.
#[derive(Debug)]
pub struct Session {
    doc: Document,
    root: Xref,
    config: Config,
}

impl Session {
    #[instrument(level = "debug", skip(config))]
    fn open(
        input: &std::path::Path,
        root: Option<&str>,
        config: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let config = Config::load_or_default(config.as_deref())?;
        let doc = Document::load(input)?;
        let root = doc.resolve_root(root)?;
        tracing::info!(
            "Loaded {} individuals, root {}",
            doc.individual_count(),
            doc.person_summary(&root)
        );
        Ok(Self { doc, root, config })
    }

    /// Reports individuals that are not connected to the root.
    ///
    /// Returns `true` if everyone is connected. When `allow_islands` is false,
    /// a disconnected file ends the process with exit status 2.
    fn preflight(&self, allow_islands: bool) -> bool {
        let disconnected = find_disconnected(&self.doc, &self.root);
        if disconnected.is_empty() {
            return true;
        }

        let mut islands: Vec<&Xref> = disconnected.iter().collect();
        islands.sort_by_key(|xref| (xref.ordinal(), *xref));

        eprintln!(
            "{}",
            format!(
                "{} individuals are not connected to root {}:",
                islands.len(),
                self.doc.person_summary(&self.root)
            )
            .warning()
        );
        let preview = self.config.island_preview();
        for xref in islands.iter().take(preview) {
            eprintln!("  • {} {}", xref, self.doc.person_summary(xref).dim());
        }
        if islands.len() > preview {
            eprintln!("  … and {} more", islands.len() - preview);
        }

        if !allow_islands {
            eprintln!(
                "{}",
                "Fix the file or pass --allow-islands to continue anyway.".dim()
            );
            std::process::exit(2);
        }
        false
    }
}
