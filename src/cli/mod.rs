use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{InsertOutcome, LedgerService, LimitCheckFailure};
use crate::domain::{MonthNames, Overage, format_amount, format_date, normalize_month_year};
use crate::settings::Settings;

/// Costbook - Personal Expense Ledger
#[derive(Parser)]
#[command(name = "costbook")]
#[command(about = "Record expenses, sum them by day or period and keep monthly limits per category")]
#[command(version)]
pub struct Cli {
    /// Database file path (overrides the configured path)
    #[arg(short, long)]
    pub database: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record an expense
    Add {
        /// Date of the expense (e.g. "15.03.2024")
        date: String,

        /// Category (first word is used, lower-cased)
        category: String,

        /// Amount spent
        #[arg(allow_hyphen_values = true)]
        amount: f64,

        /// Skip the monthly limit check
        #[arg(long)]
        no_limit_check: bool,
    },

    /// Set a monthly limit for a category
    Limit {
        /// Month and year in the configured language (e.g. "март 2024")
        month_year: String,

        /// Category to limit
        category: String,

        /// Maximum total for the month
        amount: f64,
    },

    /// Check a category's total for a month against its limit
    Check {
        /// Month and year in the configured language (e.g. "март 2024")
        month_year: String,

        /// Category to check
        category: String,
    },

    /// Delete the most recently recorded expense
    Undo,

    /// Show totals per category for a single day
    Day {
        /// Date (e.g. "15.03.2024")
        date: String,
    },

    /// Show totals per category between two dates (inclusive)
    Between {
        /// First date (e.g. "01.03.2024")
        from: String,

        /// Last date (e.g. "31.03.2024")
        to: String,
    },

    /// Show raw rows of a collection: costs, costs_limits
    Show {
        /// Collection name
        collection: String,

        /// Comma-separated list of columns (all if omitted)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Export a collection to CSV or JSON
    Export {
        /// Collection name: costs, costs_limits
        collection: String,

        /// Comma-separated list of columns (all if omitted)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },

    /// Import expenses from CSV (date,category,amount) as a single batch
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,

        /// Skip the monthly limit check
        #[arg(long)]
        no_limit_check: bool,
    },
}

impl Cli {
    pub async fn run(self, settings: Settings) -> Result<()> {
        let months = settings
            .month_names()
            .context("Invalid month table in settings")?;
        let database = self
            .database
            .clone()
            .unwrap_or_else(|| settings.database.path.clone());

        match self.command {
            Commands::Init => {
                let service = LedgerService::init(&database).await?;
                service.initialize().await?;
                println!("Database initialized: {}", database);
            }

            Commands::Add {
                date,
                category,
                amount,
                no_limit_check,
            } => {
                let service = open_service(&database, months).await?;
                let outcome = service
                    .insert_entries([(date, category, amount)], !no_limit_check)
                    .await?;
                print_insert_outcome(&outcome);
            }

            Commands::Limit {
                month_year,
                category,
                amount,
            } => {
                let service = open_service(&database, months).await?;
                let limit = service.insert_limit(&month_year, &category, amount).await?;
                println!(
                    "Limit set: {} for '{}' in {}",
                    format_amount(limit.limit),
                    limit.category,
                    limit.month.format("%m.%Y")
                );
            }

            Commands::Check {
                month_year,
                category,
            } => {
                let service = open_service(&database, months).await?;
                run_check_command(&service, &month_year, &category).await?;
            }

            Commands::Undo => {
                let service = open_service(&database, months).await?;
                let deleted = service.delete_most_recent_entry().await?;
                if deleted > 0 {
                    println!("Last entry deleted");
                } else {
                    println!("No entries to delete.");
                }
            }

            Commands::Day { date } => {
                let service = open_service(&database, months).await?;
                let totals = service.aggregate_by_date(&date).await?;
                if totals.is_empty() {
                    println!("No expenses found.");
                } else {
                    println!("{:<12} {:<20} {:>14}", "DATE", "CATEGORY", "TOTAL");
                    println!("{}", "-".repeat(48));
                    for total in totals {
                        let (date, category, amount) = total.formatted();
                        println!("{:<12} {:<20} {:>14}", date, category, amount);
                    }
                }
            }

            Commands::Between { from, to } => {
                let service = open_service(&database, months).await?;
                let totals = service.aggregate_between(&from, &to).await?;
                if totals.is_empty() {
                    println!("No expenses found.");
                } else {
                    println!("{:<20} {:>14}", "CATEGORY", "TOTAL");
                    println!("{}", "-".repeat(35));
                    for total in totals {
                        let (category, amount) = total.formatted();
                        println!("{:<20} {:>14}", category, amount);
                    }
                }
            }

            Commands::Show {
                collection,
                columns,
            } => {
                let service = open_service(&database, months).await?;
                let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                let rows = service.select(&collection, Some(columns.as_slice())).await?;
                if rows.is_empty() {
                    println!("No rows found.");
                }
                for row in rows {
                    let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                    println!("{}", cells.join("\t"));
                }
            }

            Commands::Export {
                collection,
                columns,
                output,
                format,
            } => {
                let service = open_service(&database, months).await?;
                let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                run_export_command(&service, &collection, &columns, output.as_deref(), &format)
                    .await?;
            }

            Commands::Import {
                input,
                dry_run,
                no_limit_check,
            } => {
                let service = open_service(&database, months).await?;
                run_import_command(&service, input.as_deref(), dry_run, !no_limit_check).await?;
            }
        }

        Ok(())
    }
}

async fn open_service(database: &str, months: MonthNames) -> Result<LedgerService> {
    let service = LedgerService::connect(database)
        .await
        .with_context(|| format!("Failed to open '{}'. Run `costbook init` first", database))?;
    Ok(service.with_months(months))
}

fn print_insert_outcome(outcome: &InsertOutcome) {
    for id in &outcome.ids {
        println!("Recorded expense #{}", id);
    }
    print_overages(&outcome.overages);
    print_check_failures(&outcome.check_failures);
}

fn print_overages(overages: &[Overage]) {
    for overage in overages {
        println!(
            "Warning: limit of {} exceeded for '{}' in {} (spent {})",
            format_amount(overage.limit),
            overage.category,
            overage.month.format("%m.%Y"),
            format_amount(overage.spent)
        );
    }
}

fn print_check_failures(failures: &[LimitCheckFailure]) {
    for failure in failures {
        eprintln!(
            "Warning: could not check the limit for '{}' in {}: {}",
            failure.category,
            failure.month.format("%m.%Y"),
            failure.error
        );
    }
}

async fn run_check_command(service: &LedgerService, month_year: &str, category: &str) -> Result<()> {
    let month = normalize_month_year(month_year, service.months())?;
    match service.check_limit(month, category).await? {
        Some(overage) => println!(
            "Over the limit of {} by {} (spent {})",
            format_amount(overage.limit),
            format_amount(overage.excess()),
            format_amount(overage.spent)
        ),
        None => println!("Within limit (or no limit set) for {}", format_date(month)),
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    collection: &str,
    columns: &[&str],
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = match format {
        "csv" => exporter.export_csv(collection, Some(columns), writer).await?,
        "json" => exporter.export_json(collection, Some(columns), writer).await?,
        _ => {
            anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", format);
        }
    };

    if output.is_some() {
        eprintln!("Exported {} rows from {}", count, collection);
    }

    Ok(())
}

async fn run_import_command(
    service: &LedgerService,
    input: Option<&str>,
    dry_run: bool,
    check_limits: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{Read, stdin};

    let importer = Importer::new(service);

    // Determine input reader
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        dry_run,
        check_limits,
    };
    let result = importer.import_entries_csv(reader, options).await?;

    if !result.errors.is_empty() {
        eprintln!("Nothing imported, {} problem(s) found:", result.errors.len());
        for error in &result.errors {
            match &error.field {
                Some(field) => eprintln!("  line {} ({}): {}", error.line, field, error.error),
                None => eprintln!("  line {}: {}", error.line, error.error),
            }
        }
        anyhow::bail!("Import failed");
    }

    if dry_run {
        println!("Validated {} entries (dry run)", result.imported);
    } else {
        println!("Imported {} entries", result.imported);
        print_overages(&result.overages);
        print_check_failures(&result.check_failures);
    }

    Ok(())
}
