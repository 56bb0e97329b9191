//! Category command - conversation categories and their palette.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;

use moneytalk_store::NewCategory;
use moneytalk_store::types::{AVAILABLE_ICONS, NAMED_COLORS};

use super::{Context, find_category, print_header, print_json, print_success, short_id};

/// Arguments for the category command.
#[derive(Args, Debug)]
pub struct CategoryArgs {
    #[command(subcommand)]
    pub command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// Add a category
    Add {
        /// Name
        name: String,

        /// Icon name (see `category palette`)
        #[arg(short, long)]
        icon: Option<String>,

        /// Accent color as 6-digit hex, e.g. 4A7C9B
        #[arg(short, long)]
        color: Option<String>,
    },

    /// List categories
    List {
        /// Only names containing this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Change a category
    Edit {
        /// Category name or id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        icon: Option<String>,

        #[arg(short, long)]
        color: Option<String>,
    },

    /// Delete a category and its template phrases
    Delete {
        /// Category name or id
        id: String,
    },

    /// Show the available icons and named colors
    Palette,
}

/// Run the category command.
pub async fn run(args: CategoryArgs, ctx: &Context) -> Result<()> {
    let dim = Style::new().dim();

    if let CategoryCommand::Palette = args.command {
        if ctx.json_output {
            let colors: Vec<_> = NAMED_COLORS
                .iter()
                .map(|(name, hex)| serde_json::json!({ "name": name, "hex": hex }))
                .collect();
            return print_json(&serde_json::json!({
                "icons": AVAILABLE_ICONS,
                "colors": colors,
            }));
        }
        print_header("Icons");
        for icon in AVAILABLE_ICONS {
            println!("  {icon}");
        }
        println!();
        print_header("Colors");
        for (name, hex) in NAMED_COLORS {
            println!("  {hex} {}", dim.apply_to(name));
        }
        return Ok(());
    }

    let store = ctx.open_store()?;
    match args.command {
        CategoryCommand::Add { name, icon, color } => {
            let mut draft = NewCategory::new(name);
            if let Some(icon) = icon {
                draft = draft.with_icon(icon);
            }
            if let Some(color) = color {
                draft = draft.with_accent_color(color);
            }

            let category = store.create_category(draft)?;
            if ctx.json_output {
                print_json(&category)?;
            } else {
                print_success(format!(
                    "Category added: {} {}",
                    category.name,
                    dim.apply_to(short_id(category.id))
                ));
            }
        }

        CategoryCommand::List { search } => {
            let snapshot = store.snapshot();
            let categories = snapshot.search_categories(search.as_deref().unwrap_or_default());
            if ctx.json_output {
                return print_json(&categories);
            }

            print_header("Categories");
            if categories.is_empty() {
                println!("{}", dim.apply_to("No categories found"));
            }
            for category in categories {
                let count = snapshot.conversations_in_category(category.id).len();
                println!(
                    "{} {} {} {}",
                    dim.apply_to(format!("[{}]", short_id(category.id))),
                    category.name,
                    dim.apply_to(format!(
                        "{} #{}",
                        category.icon_or_default(),
                        category.accent_or_default()
                    )),
                    dim.apply_to(format!("· {count} conversations")),
                );
            }
        }

        CategoryCommand::Edit {
            id,
            name,
            icon,
            color,
        } => {
            let mut category = find_category(&store.snapshot(), &id)?.clone();
            if let Some(name) = name {
                category.name = name;
            }
            if let Some(icon) = icon {
                category.icon_name = Some(icon).filter(|i| !i.trim().is_empty());
            }
            if let Some(color) = color {
                category.accent_color = Some(color).filter(|c| !c.trim().is_empty());
            }

            let updated = store.update_category(&category)?;
            if ctx.json_output {
                print_json(&updated)?;
            } else {
                print_success(format!("Category updated: {}", updated.name));
            }
        }

        CategoryCommand::Delete { id } => {
            let snapshot = store.snapshot();
            let category = find_category(&snapshot, &id)?;
            let phrases = snapshot.template_phrases_for(Some(category.id)).len();
            store.delete_category(category.id)?;
            if !ctx.json_output {
                print_success(format!(
                    "Deleted: {} {}",
                    category.name,
                    dim.apply_to(format!("({phrases} phrases removed)"))
                ));
            }
        }

        CategoryCommand::Palette => {}
    }

    Ok(())
}
