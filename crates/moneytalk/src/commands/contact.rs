//! Contact command - the people you talk with.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::Style;

use moneytalk_store::NewContact;

use super::{
    Context, find_contact, print_conversation_line, print_header, print_json, print_success,
    short_id,
};

/// Arguments for the contact command.
#[derive(Args, Debug)]
pub struct ContactArgs {
    #[command(subcommand)]
    pub command: ContactCommand,
}

#[derive(Subcommand, Debug)]
pub enum ContactCommand {
    /// Add a contact
    Add {
        /// Name
        name: String,

        /// Relationship, e.g. "Partner" or "Landlord"
        #[arg(short, long)]
        relationship: Option<String>,

        /// Photo file (JPEG or PNG)
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// List contacts
    List {
        /// Only names containing this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a contact and their conversations
    Show {
        /// Contact name or id
        id: String,
    },

    /// Change a contact
    Edit {
        /// Contact name or id
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New relationship; an empty value removes it
        #[arg(short, long)]
        relationship: Option<String>,
    },

    /// Set or remove a contact's photo
    Photo {
        /// Contact name or id
        id: String,

        /// Photo file (JPEG or PNG)
        #[arg(required_unless_present = "remove")]
        path: Option<PathBuf>,

        /// Remove the current photo
        #[arg(long, conflicts_with = "path")]
        remove: bool,
    },

    /// Delete a contact (their conversations are kept)
    Delete {
        /// Contact name or id
        id: String,
    },
}

/// Run the contact command.
pub async fn run(args: ContactArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let dim = Style::new().dim();

    match args.command {
        ContactCommand::Add {
            name,
            relationship,
            photo,
        } => {
            let mut draft = NewContact::new(name);
            if let Some(relationship) = relationship {
                draft = draft.with_relationship(relationship);
            }
            if let Some(path) = photo {
                let data = std::fs::read(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                draft = draft.with_photo(data);
            }

            let contact = store.create_contact(draft)?;
            if ctx.json_output {
                print_json(&contact)?;
            } else {
                print_success(format!(
                    "Contact added: {} {}",
                    contact.name,
                    dim.apply_to(short_id(contact.id))
                ));
            }
        }

        ContactCommand::List { search } => {
            let snapshot = store.snapshot();
            let contacts = snapshot.search_contacts(search.as_deref().unwrap_or_default());
            if ctx.json_output {
                return print_json(&contacts);
            }

            print_header("Contacts");
            if contacts.is_empty() {
                println!("{}", dim.apply_to("No contacts found"));
            }
            for contact in contacts {
                let count = snapshot.conversations_with_contact(contact.id).len();
                let relationship = contact
                    .relationship_tag
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default();
                println!(
                    "{} {:<3} {}{} {}",
                    dim.apply_to(format!("[{}]", short_id(contact.id))),
                    contact.initials(),
                    contact.name,
                    relationship,
                    dim.apply_to(format!("· {count} conversations")),
                );
            }
        }

        ContactCommand::Show { id } => {
            let snapshot = store.snapshot();
            let contact = find_contact(&snapshot, &id)?;
            let conversations = snapshot.conversations_with_contact(contact.id);
            if ctx.json_output {
                return print_json(&serde_json::json!({
                    "contact": contact,
                    "hasPhoto": contact.has_photo(),
                    "conversations": conversations,
                }));
            }

            print_header(&contact.name);
            if let Some(relationship) = &contact.relationship_tag {
                println!("Relationship: {relationship}");
            }
            println!("Photo:        {}", if contact.has_photo() { "yes" } else { "no" });
            println!();
            if conversations.is_empty() {
                println!("{}", dim.apply_to("No conversations yet"));
            }
            for conversation in conversations {
                print_conversation_line(&snapshot, conversation);
            }
        }

        ContactCommand::Edit {
            id,
            name,
            relationship,
        } => {
            let mut contact = find_contact(&store.snapshot(), &id)?.clone();
            if let Some(name) = name {
                contact.name = name;
            }
            if let Some(relationship) = relationship {
                contact.relationship_tag = Some(relationship).filter(|r| !r.trim().is_empty());
            }

            let updated = store.update_contact(&contact)?;
            if ctx.json_output {
                print_json(&updated)?;
            } else {
                print_success(format!("Contact updated: {}", updated.name));
            }
        }

        ContactCommand::Photo { id, path, remove } => {
            let target = find_contact(&store.snapshot(), &id)?.id;
            let data = match path {
                Some(path) if !remove => Some(
                    std::fs::read(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                _ => None,
            };

            let updated = store.set_contact_photo(target, data.as_deref())?;
            if ctx.json_output {
                print_json(&updated)?;
            } else if updated.has_photo() {
                print_success(format!("Photo updated for {}", updated.name));
            } else {
                print_success(format!("Photo removed for {}", updated.name));
            }
        }

        ContactCommand::Delete { id } => {
            let snapshot = store.snapshot();
            let contact = find_contact(&snapshot, &id)?;
            store.delete_contact(contact.id)?;
            if !ctx.json_output {
                print_success(format!("Deleted: {}", contact.name));
            }
        }
    }

    Ok(())
}
