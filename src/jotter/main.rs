use chrono::{DateTime, Utc};
use clap::Parser;
use colored::*;
use jotter::commands::config::ConfigAction;
use jotter::commands::{self, CmdMessage, MessageLevel, NoteListing};
use jotter::config::{self, JotterConfig};
use jotter::error::Result;
use jotter::model::{Document, NoteRef};
use jotter::store::fs::FileStore;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use unicode_width::UnicodeWidthStr;

mod args;
mod shell;
use args::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

pub struct AppContext {
    pub store: FileStore,
    pub config: JotterConfig,
    pub config_dir: PathBuf,
}

fn run(cli: Cli) -> Result<()> {
    let ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::New { title, content }) => handle_new(ctx, title, content),
        Some(Commands::List) | None => handle_list(&ctx),
        Some(Commands::View { titles }) => handle_view(&ctx, titles),
        Some(Commands::Edit { title }) => shell::run(ctx, title),
        Some(Commands::Rename { title, new_title }) => handle_rename(ctx, &title, &new_title),
        Some(Commands::Delete { titles, yes }) => handle_delete(ctx, titles, yes),
        Some(Commands::Path) => {
            println!("{}", ctx.store.root().display());
            Ok(())
        }
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
    }
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let config_dir = config::config_dir()?;
    let config = match JotterConfig::load(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring unreadable config: {}", e);
            JotterConfig::default()
        }
    };
    let data_dir = config.resolve_data_dir(cli.dir.as_deref())?;
    log::debug!("notes directory: {}", data_dir.display());

    Ok(AppContext {
        store: FileStore::new(data_dir),
        config,
        config_dir,
    })
}

fn handle_new(mut ctx: AppContext, title: Option<String>, content: Option<String>) -> Result<()> {
    let result = commands::create::run(&mut ctx.store, title, content)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_list(ctx: &AppContext) -> Result<()> {
    let result = commands::list::run(&ctx.store)?;
    print_notes(&result.listed_notes);
    print_messages(&result.messages);
    Ok(())
}

fn handle_view(ctx: &AppContext, titles: Vec<String>) -> Result<()> {
    let result = commands::view::run(&ctx.store, &titles)?;
    print_full_notes(&result.documents);
    print_messages(&result.messages);
    Ok(())
}

fn handle_rename(mut ctx: AppContext, title: &str, new_title: &str) -> Result<()> {
    let result = commands::rename::run(&mut ctx.store, title, new_title)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_delete(mut ctx: AppContext, titles: Vec<String>, yes: bool) -> Result<()> {
    if !yes {
        let question = format!("Delete {}? This cannot be undone.", titles.join(", "));
        if !confirm(&question)? {
            println!("{}", "Nothing deleted.".dimmed());
            return Ok(());
        }
    }
    let result = commands::delete::run(&mut ctx.store, &titles)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);

    let result = commands::config::run(&ctx.config_dir, action)?;
    if show_all {
        if let Some(config) = &result.config {
            for key in JotterConfig::KEYS {
                println!("{} = {}", key, config.get(key).unwrap_or_default());
            }
        }
    }
    print_messages(&result.messages);
    Ok(())
}

/// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no.
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

fn print_full_notes(documents: &[(NoteRef, Document)]) {
    for (i, (note, document)) in documents.iter().enumerate() {
        if i > 0 {
            println!("\n================================\n");
        }
        println!("{}", note.title.bold());
        println!("--------------------------------");
        println!("{}", document);
    }
}

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;

pub fn print_notes(notes: &[NoteListing]) {
    if notes.is_empty() {
        println!("No notes found.");
        return;
    }

    for (i, listing) in notes.iter().enumerate() {
        let idx_str = format!("{}. ", i + 1);
        let left_prefix = "    ";

        let time_ago = listing
            .modified
            .map(format_time_ago)
            .unwrap_or_else(|| " ".repeat(TIME_WIDTH));

        let title = &listing.note.title;
        let title_content = if listing.preview.is_empty() {
            title.clone()
        } else {
            format!("{} {}", title, listing.preview.dimmed())
        };

        let fixed_width = left_prefix.width() + idx_str.width() + TIME_WIDTH + 2;
        let available = LINE_WIDTH.saturating_sub(fixed_width);

        let plain = if listing.preview.is_empty() {
            title.clone()
        } else {
            format!("{} {}", title, listing.preview)
        };
        let title_display = if plain.width() > available {
            truncate_to_width(&plain, available)
        } else {
            title_content
        };
        let padding = available.saturating_sub(plain.width().min(available));

        println!(
            "{}{}{}{}  {}",
            left_prefix,
            idx_str.yellow(),
            title_display,
            " ".repeat(padding),
            time_ago.dimmed()
        );
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_width_marks_cut() {
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("abc", 10), "abc");
    }

    #[test]
    fn test_truncate_counts_wide_chars() {
        assert_eq!(truncate_to_width("日本語です", 5), "日本…");
    }

    #[test]
    fn test_format_time_ago_is_right_aligned() {
        let formatted = format_time_ago(Utc::now());
        assert_eq!(formatted.chars().count(), TIME_WIDTH);
    }
}
