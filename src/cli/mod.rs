use std::fs::File;
use std::io::{stdin, stdout, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::{
    database_path, AppError, LedgerService, Outcome, DEFAULT_DATA_DIR,
};
use crate::domain::{
    format_amount, parse_amount, CategoryFilter, Entry, EntryFilter, EntryType, NewEntry, Totals,
    ALL_SENTINEL, DATE_FORMAT, OTHER_SENTINEL,
};
use crate::io::{write_entries_csv, write_snapshot_json};

/// Expensebook - Income and Expense Ledger
#[derive(Parser)]
#[command(name = "expensebook")]
#[command(about = "Record income and expenses, filter them and export them")]
#[command(version)]
pub struct Cli {
    /// Directory holding the ledger database
    #[arg(long, env = "EXPENSEBOOK_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Explicit database file (overrides --data-dir)
    #[arg(long, env = "EXPENSEBOOK_DATABASE")]
    pub database: Option<PathBuf>,

    /// Continue with a temporary in-memory ledger if the database cannot be opened
    #[arg(long, global = true)]
    pub memory_fallback: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database if needed
    Init,

    /// Record a new entry
    Add {
        /// Amount (e.g., "50.00" or "50"), must be greater than 0
        amount: String,

        /// Entry type: Income or Expense
        #[arg(short = 't', long = "type")]
        entry_type: String,

        /// Category: Food, Transport, Utilities, Entertainment, or Other
        #[arg(short, long)]
        category: String,

        /// Category name to use when --category is Other
        #[arg(long)]
        other: Option<String>,

        /// Date (MM-DD-YYYY, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Free-form note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// List entries, optionally filtered
    List {
        /// Earliest date, inclusive (MM-DD-YYYY, compared as text)
        #[arg(long)]
        from: Option<String>,

        /// Latest date, inclusive (MM-DD-YYYY, compared as text)
        #[arg(long)]
        to: Option<String>,

        /// Category, "Other" for non-canonical categories, or "All"
        #[arg(short, long)]
        category: Option<String>,

        /// Entry type: Income, Expense, or All
        #[arg(short = 't', long = "type")]
        entry_type: Option<String>,
    },

    /// Show a single entry
    Show {
        /// Entry ID
        id: i64,
    },

    /// Edit an entry; omitted fields keep their current value
    Edit {
        /// Entry ID
        id: i64,

        /// New amount
        #[arg(short, long)]
        amount: Option<String>,

        /// New entry type: Income or Expense
        #[arg(short = 't', long = "type")]
        entry_type: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// Category name to use when --category is Other
        #[arg(long, requires = "category")]
        other: Option<String>,

        /// New date (MM-DD-YYYY)
        #[arg(short, long)]
        date: Option<String>,

        /// New note (pass an empty string to clear it)
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Delete an entry
    Delete {
        /// Entry ID
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show total income, total expense and balance
    Totals,

    /// List stored categories
    Categories {
        /// Show the filter choices (All, canonical and stored categories, Other)
        #[arg(long)]
        choices: bool,
    },

    /// Export all entries
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "expensebook=debug"
    } else {
        "expensebook=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| database_path(&self.data_dir))
    }

    async fn open_service(&self) -> Result<LedgerService> {
        let path = self.database_path();
        let service = if self.memory_fallback {
            LedgerService::open_or_in_memory(&path).await?
        } else {
            LedgerService::init(&path).await?
        };

        if service.is_in_memory() {
            eprintln!(
                "Warning: could not open {}, changes will not be saved.",
                path.display()
            );
        }
        Ok(service)
    }

    /// Run the command, releasing the store on every exit path.
    pub async fn run(self) -> Result<()> {
        let service = self.open_service().await?;
        let path = self.database_path();

        let result = execute(self.command, &service, &path).await;
        service.close().await;
        result
    }
}

async fn execute(command: Commands, service: &LedgerService, path: &Path) -> Result<()> {
    match command {
        Commands::Init => {
            let count = service.entry_count().await?;
            println!("Database ready: {} ({} entries)", path.display(), count);
        }

        Commands::Add {
            amount,
            entry_type,
            category,
            other,
            date,
            note,
        } => {
            let amount = parse_positive_amount(&amount)?;
            let entry_type = parse_entry_type(&entry_type)?;
            let category = resolve_category(&category, other.as_deref())?;
            let date = match date {
                Some(date) => normalize_date(&date)?,
                None => today(),
            };

            let mut new_entry = NewEntry::new(date, entry_type, category, amount);
            if let Some(note) = note {
                new_entry = new_entry.with_note(note);
            }

            let entry = service.create_entry(new_entry).await?;
            println!(
                "Recorded {}: {} {} on {} (#{})",
                entry.entry_type,
                format_amount(entry.amount),
                entry.category,
                entry.date,
                entry.id
            );
        }

        Commands::List {
            from,
            to,
            category,
            entry_type,
        } => {
            let filter = build_filter(from, to, category, entry_type)?;
            run_list_command(service, &filter).await?;
        }

        Commands::Show { id } => {
            let entry = service
                .get_entry(id)
                .await?
                .ok_or(AppError::EntryNotFound(id))?;
            print_entry_details(&entry);
        }

        Commands::Edit {
            id,
            amount,
            entry_type,
            category,
            other,
            date,
            note,
        } => {
            let current = service
                .get_entry(id)
                .await?
                .ok_or(AppError::EntryNotFound(id))?;
            let mut changes = current.to_new_entry();

            if let Some(amount) = amount {
                changes.amount = parse_positive_amount(&amount)?;
            }
            if let Some(entry_type) = entry_type {
                changes.entry_type = parse_entry_type(&entry_type)?;
            }
            if let Some(category) = category {
                changes.category = resolve_category(&category, other.as_deref())?;
            }
            if let Some(date) = date {
                changes.date = normalize_date(&date)?;
            }
            if let Some(note) = note {
                changes = changes.with_note(note);
            }

            let entry = service.update_entry(id, changes).await?;
            println!("Updated entry #{}", entry.id);
            print_entry_details(&entry);
        }

        Commands::Delete { id, yes } => {
            let entry = service
                .get_entry(id)
                .await?
                .ok_or(AppError::EntryNotFound(id))?;

            let prompt = format!(
                "Delete entry #{} ({} {})?",
                id,
                entry.category,
                format_amount(entry.amount)
            );
            if !yes && !confirm(&prompt)? {
                println!("Cancelled.");
                return Ok(());
            }

            service.delete_entry(id).await?;
            println!("Deleted entry #{}", id);
        }

        Commands::Totals => {
            let totals = service.totals().await?;
            print_totals(&totals);
        }

        Commands::Categories { choices } => {
            let names = if choices {
                service.filter_choices().await
            } else {
                service.categories().await?
            };

            if names.is_empty() {
                println!("No categories found.");
            }
            for name in names {
                println!("{}", name);
            }
        }

        Commands::Export { output, format } => {
            run_export_command(service, output, &format).await?;
        }
    }

    Ok(())
}

async fn run_list_command(service: &LedgerService, filter: &EntryFilter) -> Result<()> {
    let outcome = if filter.is_empty() {
        Outcome::from(service.list_entries().await)
    } else {
        Outcome::from(service.list_entries_filtered(filter).await)
    };

    match outcome {
        Outcome::Failed(err) => return Err(err.into()),
        Outcome::Empty => println!("No entries found."),
        Outcome::Data(entries) => {
            println!(
                "{:>5} {:<12} {:<8} {:<15} {:>12} NOTE",
                "ID", "DATE", "TYPE", "CATEGORY", "AMOUNT"
            );
            println!("{}", "-".repeat(70));
            for entry in &entries {
                println!(
                    "{:>5} {:<12} {:<8} {:<15} {:>12} {}",
                    entry.id,
                    entry.date,
                    entry.entry_type,
                    truncate(&entry.category, 15),
                    format_amount(entry.amount),
                    truncate(entry.note.as_deref().unwrap_or(""), 30)
                );
            }
        }
    }

    let totals = if filter.is_empty() {
        service.totals().await?
    } else {
        service.totals_filtered(filter).await?
    };
    println!();
    print_totals(&totals);
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    output: Option<PathBuf>,
    format: &str,
) -> Result<()> {
    if format != "csv" && format != "json" {
        anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", format);
    }

    let entries = match Outcome::from(service.list_entries().await) {
        Outcome::Failed(err) => return Err(err.into()),
        Outcome::Empty => {
            eprintln!("No entries to export.");
            return Ok(());
        }
        Outcome::Data(entries) => entries,
    };

    // Determine output writer
    let writer: Box<dyn Write> = match &output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = if format == "csv" {
        write_entries_csv(&entries, writer)?
    } else {
        write_snapshot_json(entries, writer)?.entries.len()
    };

    if let Some(path) = output {
        eprintln!("Exported {} entries to {}", count, path.display());
    }
    Ok(())
}

fn print_entry_details(entry: &Entry) {
    println!("ID:         {}", entry.id);
    println!("Date:       {}", entry.date);
    println!("Type:       {}", entry.entry_type);
    println!("Category:   {}", entry.category);
    println!("Amount:     {}", format_amount(entry.amount));
    println!("Note:       {}", entry.note.as_deref().unwrap_or("-"));
    println!(
        "Created at: {}",
        entry.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

fn print_totals(totals: &Totals) {
    println!("Income:  {:>12}", format_amount(totals.total_income));
    println!("Expense: {:>12}", format_amount(totals.total_expense));
    println!("Balance: {:>12}", format_amount(totals.balance));
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    stdout().flush()?;

    let mut answer = String::new();
    stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

/// Validate a `MM-DD-YYYY` date and zero-pad it so stored dates compare
/// consistently as text.
fn normalize_date(input: &str) -> Result<String, AppError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .map_err(|_| AppError::InvalidDate(input.to_string()))
}

fn parse_entry_type(input: &str) -> Result<EntryType, AppError> {
    EntryType::from_str(input.trim()).ok_or_else(|| AppError::InvalidEntryType(input.to_string()))
}

fn parse_positive_amount(input: &str) -> Result<f64, AppError> {
    let amount = parse_amount(input).map_err(|e| AppError::InvalidAmount(e.to_string()))?;
    if amount <= 0.0 {
        return Err(AppError::InvalidAmount(
            "Amount must be greater than 0".to_string(),
        ));
    }
    Ok(amount)
}

/// "Other" is a form choice, not a stored value: it must come with a name.
fn resolve_category(category: &str, other: Option<&str>) -> Result<String, AppError> {
    let category = category.trim();
    let resolved = if category == OTHER_SENTINEL {
        other.map(str::trim).unwrap_or_default()
    } else {
        category
    };

    if resolved.is_empty() {
        let message = if category == OTHER_SENTINEL {
            "please specify the 'Other' category with --other"
        } else {
            "category is required"
        };
        return Err(AppError::InvalidEntry(message.to_string()));
    }
    Ok(resolved.to_string())
}

fn build_filter(
    from: Option<String>,
    to: Option<String>,
    category: Option<String>,
    entry_type: Option<String>,
) -> Result<EntryFilter, AppError> {
    let mut filter = EntryFilter::new();

    if let Some(from) = from {
        filter = filter.from_date(normalize_date(&from)?);
    }
    if let Some(to) = to {
        filter = filter.to_date(normalize_date(&to)?);
    }
    if let Some(category) = category {
        filter = filter.category(CategoryFilter::parse(category.trim()));
    }
    if let Some(entry_type) = entry_type.filter(|t| t.trim() != ALL_SENTINEL) {
        filter = filter.entry_type(parse_entry_type(&entry_type)?);
    }

    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_service() -> (LedgerService, TempDir) {
        let temp = TempDir::new().unwrap();
        let service = LedgerService::init(&temp.path().join("expenses.db"))
            .await
            .unwrap();
        (service, temp)
    }

    fn edit(id: i64) -> Commands {
        Commands::Edit {
            id,
            amount: None,
            entry_type: None,
            category: None,
            other: None,
            date: None,
            note: None,
        }
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("01-15-2024").unwrap(), "01-15-2024");
        assert_eq!(normalize_date("1-5-2024").unwrap(), "01-05-2024");
        assert!(matches!(
            normalize_date("2024-01-15"),
            Err(AppError::InvalidDate(_))
        ));
        assert!(normalize_date("13-01-2024").is_err());
    }

    #[test]
    fn test_parse_positive_amount() {
        assert_eq!(parse_positive_amount("50").unwrap(), 50.0);
        assert!(matches!(
            parse_positive_amount("0"),
            Err(AppError::InvalidAmount(_))
        ));
        assert!(parse_positive_amount("-3").is_err());
        assert!(parse_positive_amount("ten").is_err());
    }

    #[test]
    fn test_resolve_category() {
        assert_eq!(resolve_category("Food", None).unwrap(), "Food");
        assert_eq!(resolve_category("Other", Some(" Salary ")).unwrap(), "Salary");
        assert!(matches!(
            resolve_category("Other", None),
            Err(AppError::InvalidEntry(_))
        ));
        assert!(resolve_category("  ", None).is_err());
    }

    #[test]
    fn test_build_filter_handles_all_sentinels() {
        let filter = build_filter(None, None, Some("All".into()), Some("All".into())).unwrap();
        assert!(filter.is_empty());

        let filter = build_filter(
            Some("06-01-2023".into()),
            None,
            Some("Other".into()),
            Some("Expense".into()),
        )
        .unwrap();
        assert_eq!(filter.from_date.as_deref(), Some("06-01-2023"));
        assert_eq!(filter.category, CategoryFilter::Other);
        assert_eq!(filter.entry_type, Some(EntryType::Expense));

        assert!(matches!(
            build_filter(None, None, None, Some("income".into())),
            Err(AppError::InvalidEntryType(_))
        ));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Food", 15), "Food");
        assert_eq!(truncate("Entertainment and more", 10), "Enterta...");
    }

    #[test]
    fn test_cli_parses_add_command() {
        let cli = Cli::try_parse_from([
            "expensebook",
            "add",
            "50",
            "--type",
            "Expense",
            "--category",
            "Food",
            "--note",
            "lunch",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Add { ref category, .. } if category == "Food"
        ));
    }

    #[test]
    fn test_other_name_requires_category_on_edit() {
        let parsed = Cli::try_parse_from(["expensebook", "edit", "1", "--other", "Gift"]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from([
            "expensebook",
            "edit",
            "1",
            "--category",
            "Other",
            "--other",
            "Gift",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Edit { other: Some(ref other), .. } if other == "Gift"
        ));
    }

    #[tokio::test]
    async fn test_export_of_empty_ledger_writes_no_file() {
        let (service, temp) = temp_service().await;
        let path = temp.path().join("export.csv");

        run_export_command(&service, Some(path.clone()), "csv")
            .await
            .unwrap();
        assert!(!path.exists());

        assert!(run_export_command(&service, None, "xml").await.is_err());
    }

    #[tokio::test]
    async fn test_edit_keeps_unspecified_fields() {
        let (service, temp) = temp_service().await;
        let before = service
            .create_entry(
                NewEntry::new("01-16-2024", EntryType::Expense, "Food", 50.0).with_note("lunch"),
            )
            .await
            .unwrap();

        let mut command = edit(before.id);
        if let Commands::Edit { ref mut amount, .. } = command {
            *amount = Some("75".into());
        }
        execute(command, &service, temp.path()).await.unwrap();

        let after = service.get_entry(before.id).await.unwrap().unwrap();
        assert_eq!(after.amount, 75.0);
        assert_eq!(after.date, before.date);
        assert_eq!(after.entry_type, before.entry_type);
        assert_eq!(after.category, before.category);
        assert_eq!(after.note.as_deref(), Some("lunch"));
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_edit_resolves_other_category() {
        let (service, temp) = temp_service().await;
        let entry = service
            .create_entry(NewEntry::new("01-15-2024", EntryType::Income, "Salary", 10.0))
            .await
            .unwrap();

        let mut command = edit(entry.id);
        if let Commands::Edit {
            ref mut category,
            ref mut other,
            ..
        } = command
        {
            *category = Some("Other".into());
            *other = Some("Gift".into());
        }
        execute(command, &service, temp.path()).await.unwrap();

        let after = service.get_entry(entry.id).await.unwrap().unwrap();
        assert_eq!(after.category, "Gift");
        assert_eq!(after.amount, 10.0);

        assert!(execute(edit(entry.id + 100), &service, temp.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_with_yes_skips_the_prompt() {
        let (service, temp) = temp_service().await;
        let entry = service
            .create_entry(NewEntry::new("01-17-2024", EntryType::Expense, "Transport", 20.0))
            .await
            .unwrap();

        execute(
            Commands::Delete {
                id: entry.id,
                yes: true,
            },
            &service,
            temp.path(),
        )
        .await
        .unwrap();

        assert_eq!(service.get_entry(entry.id).await.unwrap(), None);
        assert_eq!(service.entry_count().await.unwrap(), 0);
    }
}
