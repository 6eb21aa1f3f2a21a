use clap::Parser;
use tracing::instrument;

use super::{Session, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Check that every individual is connected to the root")]
pub struct Check {
    /// Report disconnected individuals without failing
    #[arg(long)]
    allow_islands: bool,
}

impl Check {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session) {
        if session.preflight(self.allow_islands) {
            let people = session
                .doc
                .iter_individuals()
                .filter(|(xref, _)| !session.doc.is_placeholder(xref))
                .count();
            let message = format!(
                "All {people} individuals are connected to {}",
                session.doc.person_summary(&session.root)
            );
            println!("{}", message.success());
        }
    }
}
