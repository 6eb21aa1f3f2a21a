use clap::Parser;
use genreport::{
    Document, Extractor, IdMap, IndividualView, assign_ids,
    domain::{Field, Gender, NameParts, Relation, RelationKind},
};
use serde::Serialize;
use tracing::instrument;

use super::{Session, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Display the names, fields and relations of individuals")]
pub struct Show {
    /// The individuals to display, as cross-references or bare numbers
    #[arg(required = true)]
    individuals: Vec<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// An individual as displayed, with assigned identifiers.
#[derive(Debug, Serialize)]
struct Shown {
    xref: String,
    id: Option<u32>,
    header: String,
    name: NameParts,
    birth_year: String,
    death_year: String,
    fields: Vec<Field>,
    relations: Vec<ShownRelation>,
}

#[derive(Debug, Serialize)]
struct ShownRelation {
    kind: RelationKind,
    label: &'static str,
    target: String,
    id: Option<u32>,
}

impl Show {
    #[instrument(level = "debug", skip(session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let doc = &session.doc;
        let ids = assign_ids(doc, &session.root, &session.config.fixed_band);
        let extractor = Extractor::new(doc);

        let mut shown = Vec::with_capacity(self.individuals.len());
        for input in &self.individuals {
            let view = doc
                .resolve_individual(input)
                .and_then(|xref| extractor.view(xref))
                .ok_or_else(|| anyhow::anyhow!("Individual '{input}' not found"))?;
            shown.push(Shown::new(doc, &ids, view));
        }

        match self.output {
            OutputFormat::Pretty => shown.iter().for_each(Shown::print),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
        }
        Ok(())
    }
}

impl Shown {
    fn new(doc: &Document, ids: &IdMap, view: IndividualView) -> Self {
        let relations = view
            .relations
            .into_iter()
            .map(|relation| ShownRelation {
                kind: relation.kind,
                label: label(doc, &relation),
                id: relation
                    .target_number()
                    .and_then(|number| ids.get_numeric(doc, number)),
                target: relation.target,
            })
            .collect();
        Self {
            id: ids.get(&view.xref),
            xref: view.xref.to_string(),
            header: view.header,
            name: view.name,
            birth_year: view.birth_year,
            death_year: view.death_year,
            fields: view.fields,
            relations,
        }
    }

    fn print(&self) {
        let id = self
            .id
            .map_or_else(|| "no id".to_string(), |id| format!("#{id}"));
        println!("{} {}", self.header.heading(), format!("({}, {id})", self.xref).dim());

        if !self.fields.is_empty() {
            println!("\n{}", "Fields".dim());
            for field in &self.fields {
                let content = field.content.replace('\n', "\n      ");
                println!("  {} {}", format!("{}:", field.description).info(), content);
            }
        }

        if !self.relations.is_empty() {
            println!("\n{}", "Relations".dim());
            for relation in &self.relations {
                let id = relation
                    .id
                    .map(|id| format!(" #{id}").dim())
                    .unwrap_or_default();
                println!("  • {}: {}{id}", relation.label, relation.target);
            }
        }
        println!();
    }
}

/// `father`/`mother` for parents of known sex, otherwise the relation kind.
fn label(doc: &Document, relation: &Relation) -> &'static str {
    if relation.kind != RelationKind::Parent {
        return relation.kind.label();
    }
    let gender = relation
        .target_number()
        .map_or(Gender::Unknown, |number| doc.gender(number));
    match gender {
        Gender::Male => "father",
        Gender::Female => "mother",
        Gender::Unknown => {
            tracing::warn!("Unknown sex for parent {}", relation.target);
            RelationKind::Parent.label()
        }
    }
}
