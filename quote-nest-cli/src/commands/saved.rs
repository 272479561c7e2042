use clap::{Args, Subcommand};
use quote_nest_core::{Quote, QuoteFilter, QuoteId};
use std::io::{self, Write};

use super::{split_list, Context, OutputFormat};

/// Manage saved quotes
#[derive(Args)]
pub struct SavedCommand {
    #[command(subcommand)]
    pub command: SavedSubcommand,
}

#[derive(Subcommand)]
pub enum SavedSubcommand {
    /// List saved quotes
    List {
        /// Only quotes with this tag
        #[arg(long)]
        tag: Option<String>,

        /// Only quotes whose author contains this text
        #[arg(long)]
        author: Option<String>,

        /// Only quotes whose text, author or notes contain this text
        #[arg(long, short)]
        search: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show a saved quote with its notes
    Show {
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Replace the notes of a saved quote
    Note {
        id: String,

        /// New notes (empty string clears them)
        notes: String,
    },

    /// Delete a saved quote
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Save a quote of your own
    Add {
        #[arg(long)]
        text: String,

        #[arg(long)]
        author: String,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },
}

impl SavedCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        let sync = ctx.quote_sync();

        match &self.command {
            SavedSubcommand::List {
                tag,
                author,
                search,
                json,
            } => {
                let filter = QuoteFilter {
                    tag: tag.clone(),
                    author: author.clone(),
                    search: search.clone(),
                };
                let quotes = filter.apply(sync.fetch_saved_quotes().await?);

                if *json {
                    println!("{}", serde_json::to_string_pretty(&quotes)?);
                    return Ok(());
                }

                if quotes.is_empty() {
                    if filter.is_empty() {
                        println!("No saved quotes yet. Try 'qn random --save'.");
                    } else {
                        println!("No saved quotes match.");
                    }
                    return Ok(());
                }

                for quote in &quotes {
                    println!("[{}] \"{}\" - {}", quote.id, preview(&quote.text, 60), quote.author);
                }
                println!("\nTotal: {} quote(s)", quotes.len());
                Ok(())
            }

            SavedSubcommand::Show { id, format } => {
                let quote = sync
                    .find_saved_quote(&QuoteId::new(id.as_str()))
                    .await?
                    .ok_or_else(|| format!("Saved quote not found: {}", id))?;

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&quote)?),
                    OutputFormat::Text => println!("{}", quote),
                }
                Ok(())
            }

            SavedSubcommand::Note { id, notes } => {
                let quote = sync
                    .find_saved_quote(&QuoteId::new(id.as_str()))
                    .await?
                    .ok_or_else(|| format!("Saved quote not found: {}", id))?;

                let updated = sync.update_notes(&quote, notes.trim()).await?;
                if updated.notes_or_empty().is_empty() {
                    println!("Cleared notes on quote {}", updated.id);
                } else {
                    println!("Updated notes on quote {}", updated.id);
                }
                Ok(())
            }

            SavedSubcommand::Delete { id, force } => {
                let quote_id = QuoteId::new(id.as_str());

                if !force {
                    let quote = sync
                        .find_saved_quote(&quote_id)
                        .await?
                        .ok_or_else(|| format!("Saved quote not found: {}", id))?;

                    print!("Delete \"{}\" - {}? [y/N] ", preview(&quote.text, 40), quote.author);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                if sync.delete_quote(&quote_id).await? {
                    println!("Deleted quote {}", id);
                } else {
                    println!("No saved quote with id {}", id);
                }
                Ok(())
            }

            SavedSubcommand::Add {
                text,
                author,
                tags,
                notes,
            } => {
                let mut quote = Quote::authored(text.trim(), author.trim());
                let tags = split_list(tags.as_deref());
                if !tags.is_empty() {
                    quote = quote.with_tags(tags);
                }
                if let Some(notes) = notes {
                    quote = quote.with_notes(notes);
                }

                sync.save_quote(&quote).await?;
                println!("Saved quote:");
                println!("{}", quote);
                Ok(())
            }
        }
    }
}

/// Shortens text to at most `max` characters, marking the cut with "...".
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
