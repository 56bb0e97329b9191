//! Phrase command - reusable template phrases.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;

use moneytalk_store::NewTemplatePhrase;

use super::{Context, find_category, find_phrase, print_header, print_json, print_success, short_id};

/// Arguments for the phrase command.
#[derive(Args, Debug)]
pub struct PhraseArgs {
    #[command(subcommand)]
    pub command: PhraseCommand,
}

#[derive(Subcommand, Debug)]
pub enum PhraseCommand {
    /// Add a phrase
    Add {
        /// Phrase text
        text: String,

        /// Category name or id
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List phrases
    List {
        /// Only phrases in this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Change a phrase
    Edit {
        /// Phrase id or exact text
        id: String,

        /// New text
        #[arg(long)]
        text: Option<String>,

        /// Move to this category
        #[arg(short, long)]
        category: Option<String>,

        /// Detach from its category
        #[arg(long, conflicts_with = "category")]
        no_category: bool,
    },

    /// Delete a phrase
    Delete {
        /// Phrase id or exact text
        id: String,
    },
}

/// Run the phrase command.
pub async fn run(args: PhraseArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let dim = Style::new().dim();

    match args.command {
        PhraseCommand::Add { text, category } => {
            let mut draft = NewTemplatePhrase::new(text);
            if let Some(category) = category {
                draft = draft.with_category(find_category(&store.snapshot(), &category)?.id);
            }

            let phrase = store.create_template_phrase(draft)?;
            if ctx.json_output {
                print_json(&phrase)?;
            } else {
                print_success(format!("Phrase added: {}", dim.apply_to(short_id(phrase.id))));
            }
        }

        PhraseCommand::List { category } => {
            let snapshot = store.snapshot();
            let category = category
                .as_deref()
                .map(|c| find_category(&snapshot, c))
                .transpose()?;
            let phrases = snapshot.template_phrases_for(category.map(|c| c.id));
            if ctx.json_output {
                return print_json(&phrases);
            }

            match category {
                Some(category) => print_header(&format!("Phrases · {}", category.name)),
                None => print_header("Phrases"),
            }
            if phrases.is_empty() {
                println!("{}", dim.apply_to("No phrases found"));
            }
            for phrase in phrases {
                let tag = phrase
                    .category_id
                    .and_then(|id| snapshot.category(id))
                    .map(|c| format!(" #{}", c.name))
                    .unwrap_or_default();
                println!(
                    "{} {}{}",
                    dim.apply_to(format!("[{}]", short_id(phrase.id))),
                    phrase.text,
                    dim.apply_to(tag),
                );
            }
        }

        PhraseCommand::Edit {
            id,
            text,
            category,
            no_category,
        } => {
            let snapshot = store.snapshot();
            let mut phrase = find_phrase(&snapshot, &id)?.clone();
            if let Some(text) = text {
                phrase.text = text;
            }
            if no_category {
                phrase.category_id = None;
            } else if let Some(category) = category {
                phrase.category_id = Some(find_category(&snapshot, &category)?.id);
            }

            let updated = store.update_template_phrase(&phrase)?;
            if ctx.json_output {
                print_json(&updated)?;
            } else {
                print_success(format!("Phrase updated: {}", dim.apply_to(short_id(updated.id))));
            }
        }

        PhraseCommand::Delete { id } => {
            let target = find_phrase(&store.snapshot(), &id)?.id;
            store.delete_template_phrase(target)?;
            if !ctx.json_output {
                print_success("Phrase deleted");
            }
        }
    }

    Ok(())
}
