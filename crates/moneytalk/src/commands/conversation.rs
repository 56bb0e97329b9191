//! Conversation command - record, edit and browse conversations.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;
use serde::Serialize;

use moneytalk_store::types::DEFAULT_EMOTIONAL_RATING;
use moneytalk_store::{Conversation, ITEMS_PER_PAGE, NewConversation, SIMILAR_LIMIT};

use super::{
    Context, find_category, find_contact, find_conversation, format_local, parse_date,
    print_conversation_line, print_header, print_json, print_success, short_id,
};

/// Arguments for the conversation command.
#[derive(Args, Debug)]
pub struct ConversationArgs {
    #[command(subcommand)]
    pub command: ConversationCommand,
}

/// Fields shared by `add` and `edit`.
#[derive(Args, Debug)]
pub struct ConversationFields {
    /// What you hoped to achieve
    #[arg(long)]
    pub goal: Option<String>,

    /// How it went
    #[arg(long)]
    pub outcome: Option<String>,

    /// Private notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Contact name or id (repeatable)
    #[arg(short, long = "contact")]
    pub contacts: Vec<String>,

    /// Category name or id
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConversationCommand {
    /// Record a conversation
    Add {
        /// Title
        title: String,

        /// When it happened (default: now)
        #[arg(short, long)]
        date: Option<String>,

        /// How it felt, 1-10
        #[arg(short, long, default_value_t = DEFAULT_EMOTIONAL_RATING)]
        rating: i32,

        /// Mark as resolved
        #[arg(long)]
        resolved: bool,

        #[command(flatten)]
        fields: ConversationFields,
    },

    /// List conversations, newest first
    List {
        /// Page to show (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Conversations per page
        #[arg(long, default_value_t = ITEMS_PER_PAGE)]
        page_size: usize,
    },

    /// Show a conversation
    Show {
        /// Conversation id, id prefix, or title
        id: String,
    },

    /// Change a conversation
    Edit {
        /// Conversation id, id prefix, or title
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New date
        #[arg(short, long)]
        date: Option<String>,

        /// New rating, 1-10
        #[arg(short, long)]
        rating: Option<i32>,

        /// Remove all contacts before adding `--contact` ones
        #[arg(long)]
        clear_contacts: bool,

        /// Remove the category
        #[arg(long, conflicts_with = "category")]
        clear_category: bool,

        #[command(flatten)]
        fields: ConversationFields,
    },

    /// Mark a conversation resolved (or unresolved with --undo)
    Resolve {
        /// Conversation id, id prefix, or title
        id: String,

        #[arg(long)]
        undo: bool,
    },

    /// Delete a conversation
    Delete {
        /// Conversation id, id prefix, or title
        id: String,
    },

    /// Past conversations in a category, to help prepare
    Similar {
        /// Category name or id
        category: String,

        #[arg(short, long, default_value_t = SIMILAR_LIMIT)]
        limit: usize,
    },
}

#[derive(Serialize)]
struct Page<'a> {
    page: usize,
    pages: usize,
    conversations: &'a [Conversation],
}

/// Run the conversation command.
pub async fn run(args: ConversationArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let dim = Style::new().dim();

    match args.command {
        ConversationCommand::Add {
            title,
            date,
            rating,
            resolved,
            fields,
        } => {
            let snapshot = store.snapshot();
            let date = date.as_deref().map(parse_date).transpose()?;
            let mut draft = NewConversation::new(title, date.unwrap_or_else(chrono::Utc::now))
                .with_rating(rating)
                .resolved(resolved);
            if let Some(goal) = fields.goal {
                draft = draft.with_goal(goal);
            }
            if let Some(outcome) = fields.outcome {
                draft = draft.with_outcome(outcome);
            }
            if let Some(notes) = fields.notes {
                draft = draft.with_notes(notes);
            }
            let contacts = fields
                .contacts
                .iter()
                .map(|c| find_contact(&snapshot, c).map(|c| c.id))
                .collect::<Result<Vec<_>>>()?;
            draft = draft.with_contacts(contacts);
            if let Some(category) = fields.category {
                draft = draft.with_category(find_category(&snapshot, &category)?.id);
            }

            let conversation = store.create_conversation(draft)?;
            if ctx.json_output {
                print_json(&conversation)?;
            } else {
                print_success(format!(
                    "Conversation recorded: {}",
                    dim.apply_to(short_id(conversation.id))
                ));
            }
        }

        ConversationCommand::List { page, page_size } => {
            let snapshot = store.snapshot();
            let page_size = page_size.max(1);
            let index = page.saturating_sub(1);
            let conversations = snapshot.conversations_page(index, page_size);
            let pages = snapshot.page_count(page_size);

            if ctx.json_output {
                print_json(&Page {
                    page: index + 1,
                    pages,
                    conversations,
                })?;
            } else {
                print_header("Conversations");
                if conversations.is_empty() {
                    println!("{}", dim.apply_to("No conversations found"));
                } else {
                    for conversation in conversations {
                        print_conversation_line(&snapshot, conversation);
                    }
                    println!();
                    println!(
                        "{}",
                        dim.apply_to(format!("Page {} of {}", index + 1, pages.max(1)))
                    );
                }
            }
        }

        ConversationCommand::Show { id } => {
            let snapshot = store.snapshot();
            let conversation = find_conversation(&snapshot, &id)?;
            if ctx.json_output {
                return print_json(conversation);
            }

            print_header(&conversation.title);
            println!("Date:      {}", format_local(conversation.date));
            println!("Rating:    {}/10", conversation.emotional_rating);
            println!(
                "Resolved:  {}",
                if conversation.is_resolved { "yes" } else { "no" }
            );
            let people: Vec<&str> = snapshot
                .contacts_of(conversation)
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            if !people.is_empty() {
                println!("With:      {}", people.join(", "));
            }
            if let Some(category) = snapshot.category_of(conversation) {
                println!("Category:  {}", category.name);
            }
            if let Some(goal) = &conversation.goal {
                println!("Goal:      {goal}");
            }
            if let Some(outcome) = &conversation.outcome {
                println!("Outcome:   {outcome}");
            }
            if let Some(notes) = &conversation.notes {
                println!();
                println!("{notes}");
            }
            if ctx.verbose {
                println!();
                println!("{}", dim.apply_to(format!("id {}", conversation.id)));
            }
        }

        ConversationCommand::Edit {
            id,
            title,
            date,
            rating,
            clear_contacts,
            clear_category,
            fields,
        } => {
            let snapshot = store.snapshot();
            let mut conversation = find_conversation(&snapshot, &id)?.clone();

            if let Some(title) = title {
                conversation.title = title;
            }
            if let Some(date) = date {
                conversation.date = parse_date(&date)?;
            }
            if let Some(rating) = rating {
                conversation.emotional_rating = rating;
            }
            if let Some(goal) = fields.goal {
                conversation.goal = Some(goal);
            }
            if let Some(outcome) = fields.outcome {
                conversation.outcome = Some(outcome);
            }
            if let Some(notes) = fields.notes {
                conversation.notes = Some(notes);
            }
            if clear_contacts {
                conversation.contact_ids.clear();
            }
            for contact in &fields.contacts {
                conversation
                    .contact_ids
                    .push(find_contact(&snapshot, contact)?.id);
            }
            if clear_category {
                conversation.category_id = None;
            } else if let Some(category) = fields.category {
                conversation.category_id = Some(find_category(&snapshot, &category)?.id);
            }

            let updated = store.update_conversation(&conversation)?;
            if ctx.json_output {
                print_json(&updated)?;
            } else {
                print_success(format!("Conversation updated: {}", updated.title));
            }
        }

        ConversationCommand::Resolve { id, undo } => {
            let target = find_conversation(&store.snapshot(), &id)?.id;
            let updated = store.set_resolved(target, !undo)?;
            if ctx.json_output {
                print_json(&updated)?;
            } else if updated.is_resolved {
                print_success(format!("Resolved: {}", updated.title));
            } else {
                print_success(format!("Reopened: {}", updated.title));
            }
        }

        ConversationCommand::Delete { id } => {
            let snapshot = store.snapshot();
            let conversation = find_conversation(&snapshot, &id)?;
            store.delete_conversation(conversation.id)?;
            if !ctx.json_output {
                print_success(format!("Deleted: {}", conversation.title));
            }
        }

        ConversationCommand::Similar { category, limit } => {
            let snapshot = store.snapshot();
            let category = find_category(&snapshot, &category)?;
            let similar = snapshot.similar_conversations(category.id, limit);
            if ctx.json_output {
                return print_json(&similar);
            }

            print_header(&format!("Past {} conversations", category.name));
            if similar.is_empty() {
                println!("{}", dim.apply_to("Nothing recorded in this category yet"));
            }
            for conversation in similar {
                print_conversation_line(&snapshot, conversation);
                if let Some(outcome) = &conversation.outcome {
                    println!("           {}", dim.apply_to(format!("outcome: {outcome}")));
                }
            }
            let phrases = snapshot.template_phrases_for(Some(category.id));
            if !phrases.is_empty() {
                println!();
                println!("Phrases you could use:");
                for phrase in phrases {
                    println!("  • {}", phrase.text);
                }
            }
        }
    }

    Ok(())
}
