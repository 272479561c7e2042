use clap::Args;
use quote_nest_core::RandomQuery;

use super::{split_list, Context, OutputFormat};

/// Fetch a random quote
#[derive(Args)]
pub struct RandomCommand {
    /// Maximum quote length in characters
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_length: Option<u32>,

    /// Comma-separated tags (e.g. wisdom,life)
    #[arg(long)]
    tags: Option<String>,

    /// Author name
    #[arg(long)]
    author: Option<String>,

    /// Save the quote to your library
    #[arg(long)]
    save: bool,

    /// Notes to save with the quote (implies --save)
    #[arg(long)]
    notes: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl RandomCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        let mut query = RandomQuery::new().tags(split_list(self.tags.as_deref()));
        if let Some(max) = self.max_length {
            query = query.max_length(max);
        }
        if let Some(author) = &self.author {
            query = query.author(author.trim());
        }

        let mut quote = ctx.quote_api().random(&query).await?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&quote)?),
            OutputFormat::Text => println!("{}", quote),
        }

        if self.save || self.notes.is_some() {
            let sync = ctx.quote_sync();
            if let Some(notes) = &self.notes {
                quote = quote.with_notes(notes);
            }
            sync.save_quote(&quote).await?;
            println!("\nSaved quote {}", quote.id);
        }
        Ok(())
    }
}
