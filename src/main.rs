use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use lifehub::analytics::sort_by_priority_then_due_date;
use lifehub::dates::days_until;
use lifehub::transfer::{read_import, write_export};
use lifehub::{
    Config, Decimal, Hub, Note, NoteCategory, NoteColor, NoteDraft, NoteFilter, Period, PreferencesPatch, Record,
    Task, TaskCategory, TaskDraft, TaskFilter, TaskPatch, TaskPriority, Theme, TimeFormat, Transaction,
    TransactionCategory, TransactionDraft, TransactionFilter, TransactionType, ensure_valid,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lifehub")]
#[command(about = "LifeHub CLI - tasks, notes and finances kept in a local store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage notes
    #[command(subcommand)]
    Note(NoteCommand),

    /// Manage income and expenses
    #[command(subcommand)]
    Tx(TxCommand),

    /// Show or change preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),

    /// Overview of tasks, notes and this month's finances
    Summary,

    /// Export tasks, notes and transactions as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a JSON export
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Add a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, default_value = "medium")]
        priority: TaskPriority,
        #[arg(short, long, default_value = "other")]
        category: TaskCategory,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_date)]
        due: Option<DateTime<Utc>>,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// List tasks, most pressing first
    List {
        #[arg(short, long)]
        category: Option<TaskCategory>,
        #[arg(short, long)]
        search: Option<String>,
        /// Only open tasks past their due date
        #[arg(long, conflicts_with = "upcoming")]
        overdue: bool,
        /// Only open tasks due within the configured window
        #[arg(long)]
        upcoming: bool,
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
    },
    /// Change fields of a task
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        priority: Option<TaskPriority>,
        #[arg(short, long)]
        category: Option<TaskCategory>,
        #[arg(long, value_parser = parse_date)]
        due: Option<DateTime<Utc>>,
    },
    /// Toggle completion
    Done { id: String },
    /// Delete a task
    Rm { id: String },
}

#[derive(Subcommand)]
enum NoteCommand {
    /// Add a note
    Add {
        title: String,
        #[arg(short = 'b', long, default_value = "")]
        content: String,
        #[arg(short, long, default_value = "other")]
        category: NoteCategory,
        #[arg(long, default_value = "white")]
        color: NoteColor,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// List notes, pinned first
    List {
        #[arg(short, long)]
        category: Option<NoteCategory>,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        pinned: bool,
    },
    /// Toggle pinning
    Pin { id: String },
    /// Delete a note
    Rm { id: String },
}

#[derive(Subcommand)]
enum TxCommand {
    /// Record a transaction
    Add {
        amount: Decimal,
        description: String,
        #[arg(short, long)]
        category: TransactionCategory,
        /// Defaults to the category's direction
        #[arg(short = 't', long = "type")]
        kind: Option<TransactionType>,
        /// Transaction date (YYYY-MM-DD or RFC 3339), defaults to now
        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List transactions, newest first
    List {
        #[arg(short = 't', long = "type")]
        kind: Option<TransactionType>,
        #[arg(short, long)]
        category: Option<TransactionCategory>,
        #[command(flatten)]
        month: MonthArg,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Income, expenses and net
    Totals {
        #[command(flatten)]
        month: MonthArg,
    },
    /// Delete a transaction
    Rm { id: String },
}

#[derive(Args)]
struct MonthArg {
    /// Restrict to a calendar month (YYYY-MM)
    #[arg(short, long, value_parser = parse_month)]
    month: Option<(i32, u32)>,
}

impl MonthArg {
    fn period(&self) -> Period {
        match self.month {
            Some((year, month0)) => Period::Month { year, month0 },
            None => Period::AllTime,
        }
    }
}

#[derive(Subcommand)]
enum PrefsCommand {
    /// Print current preferences
    Show,
    /// Update preferences
    Set {
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        date_format: Option<String>,
        #[arg(long)]
        time_format: Option<TimeFormat>,
    },
    /// Restore default preferences
    Reset,
}

fn parse_date(input: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date '{}': expected YYYY-MM-DD or RFC 3339", input))
}

fn parse_month(input: &str) -> Result<(i32, u32), String> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", input), "%Y-%m-%d")
        .map_err(|_| format!("invalid month '{}': expected YYYY-MM", input))?;
    Ok((date.year(), date.month0()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    // Setup tracing
    tracing_subscriber::fmt()
        .with_max_level(config.log_level()?)
        .with_writer(std::io::stderr)
        .init();

    let mut hub = Hub::open(&config)?;

    match cli.command {
        Commands::Task(command) => run_task(&mut hub, command),
        Commands::Note(command) => run_note(&mut hub, command),
        Commands::Tx(command) => run_tx(&mut hub, command),
        Commands::Prefs(command) => run_prefs(&mut hub, command),
        Commands::Summary => {
            print_summary(&hub);
            Ok(())
        }
        Commands::Export { output } => {
            let data = hub.export();
            match output {
                Some(path) => {
                    write_export(&path, &data)?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&data)?),
            }
            Ok(())
        }
        Commands::Import { file } => {
            let data = read_import(&file)?;
            let result = hub.import(&data);
            println!(
                "tasks: {}, notes: {}, transactions: {}",
                result.imported.tasks, result.imported.notes, result.imported.transactions
            );
            if result.success {
                println!("{}", "Import complete".green());
                Ok(())
            } else {
                for error in &result.errors {
                    eprintln!("  {}", error.red());
                }
                Err(eyre!("Import failed, nothing was changed"))
            }
        }
    }
}

fn not_found(kind: &str, id: &str) -> eyre::Report {
    eyre!("No {} with id {}", kind, id)
}

fn run_task(hub: &mut Hub, command: TaskCommand) -> Result<()> {
    match command {
        TaskCommand::Add {
            title,
            description,
            priority,
            category,
            due,
            tags,
        } => {
            let draft = TaskDraft {
                title,
                description,
                completed: false,
                priority,
                category,
                due_date: due,
                tags: (!tags.is_empty()).then_some(tags),
            };
            ensure_valid(&draft)?;
            let id = hub.tasks_mut().add(draft);
            println!("Added task {}", id);
        }
        TaskCommand::List {
            category,
            search,
            overdue,
            upcoming,
            all,
        } => {
            let tasks = hub.tasks();
            let filter = TaskFilter {
                category,
                completed: (!all).then_some(false),
                query: search,
                ..Default::default()
            };
            let mut listed: Vec<&Task> = if overdue {
                tasks.overdue()
            } else if upcoming {
                tasks.upcoming(hub.upcoming_days())
            } else {
                tasks.all().iter().collect()
            };
            listed.retain(|task| filter.matches(task));
            sort_by_priority_then_due_date(&mut listed);

            let now = Utc::now();
            for task in listed {
                print_task(task, now);
            }
        }
        TaskCommand::Edit {
            id,
            title,
            priority,
            category,
            due,
        } => {
            let patch = TaskPatch {
                title,
                priority,
                category,
                due_date: due.map(Some),
                ..Default::default()
            };
            let mut preview = hub.tasks().get(&id).cloned().ok_or_else(|| not_found("task", &id))?;
            preview.apply(patch.clone());
            ensure_valid(&preview)?;
            hub.tasks_mut().update(&id, patch);
            println!("Updated task {}", id);
        }
        TaskCommand::Done { id } => {
            if !hub.tasks_mut().toggle_complete(&id) {
                return Err(not_found("task", &id));
            }
        }
        TaskCommand::Rm { id } => {
            if !hub.tasks_mut().delete(&id) {
                return Err(not_found("task", &id));
            }
        }
    }
    Ok(())
}

fn print_task(task: &Task, now: DateTime<Utc>) {
    let mark = if task.completed { "[x]".green() } else { "[ ]".normal() };
    let priority = match task.priority {
        TaskPriority::Urgent => task.priority.as_str().red().bold(),
        TaskPriority::High => task.priority.as_str().yellow(),
        _ => task.priority.as_str().normal(),
    };
    let due = match task.due_date {
        Some(due) if !task.completed && due < now => format!(" overdue {}", due.format("%Y-%m-%d")).red(),
        Some(due) => format!(" due in {}d", days_until(&due, &now)).normal(),
        None => "".normal(),
    };
    println!("{} {} {} ({}){} {}", mark, task.title, priority, task.category, due, task.id.dimmed());
}

fn run_note(hub: &mut Hub, command: NoteCommand) -> Result<()> {
    match command {
        NoteCommand::Add {
            title,
            content,
            category,
            color,
            tags,
        } => {
            let draft = NoteDraft {
                title,
                content,
                category,
                color,
                tags,
                is_pinned: false,
            };
            ensure_valid(&draft)?;
            let id = hub.notes_mut().add(draft);
            println!("Added note {}", id);
        }
        NoteCommand::List {
            category,
            search,
            pinned,
        } => {
            let filter = NoteFilter {
                category,
                pinned: pinned.then_some(true),
                query: search,
                ..Default::default()
            };
            let mut notes = hub.notes().query(&filter);
            notes.sort_by_key(|note| !note.is_pinned);
            for note in notes {
                print_note(note);
            }
        }
        NoteCommand::Pin { id } => {
            if !hub.notes_mut().toggle_pin(&id) {
                return Err(not_found("note", &id));
            }
        }
        NoteCommand::Rm { id } => {
            if !hub.notes_mut().delete(&id) {
                return Err(not_found("note", &id));
            }
        }
    }
    Ok(())
}

fn print_note(note: &Note) {
    let pin = if note.is_pinned { "*".yellow() } else { " ".normal() };
    let tags = if note.tags.is_empty() {
        String::new()
    } else {
        format!(" #{}", note.tags.join(" #"))
    };
    println!("{} {} ({}){} {}", pin, note.title.bold(), note.category, tags, note.id.dimmed());
    if !note.content.is_empty() {
        let preview: String = note.content.chars().take(80).collect();
        println!("    {}", preview);
    }
}

fn run_tx(hub: &mut Hub, command: TxCommand) -> Result<()> {
    match command {
        TxCommand::Add {
            amount,
            description,
            category,
            kind,
            date,
            tags,
        } => {
            let mut draft = TransactionDraft::new(amount, description, category, date.unwrap_or_else(Utc::now));
            if let Some(kind) = kind {
                draft.kind = kind;
            }
            if !tags.is_empty() {
                draft.tags = Some(tags);
            }
            ensure_valid(&draft)?;
            let id = hub.transactions_mut().add(draft);
            println!("Added transaction {}", id);
        }
        TxCommand::List {
            kind,
            category,
            month,
            search,
        } => {
            let period = month.period();
            let filter = TransactionFilter {
                kind,
                category,
                query: search,
                ..Default::default()
            };
            let mut listed: Vec<&Transaction> = hub
                .transactions()
                .query(&filter)
                .into_iter()
                .filter(|tx| period.contains(tx))
                .collect();
            listed.sort_by(|a, b| b.date.cmp(&a.date));

            let currency = hub.user().preferences().currency.clone();
            for tx in listed {
                print_transaction(tx, &currency);
            }
        }
        TxCommand::Totals { month } => {
            let period = month.period();
            let store = hub.transactions();
            let currency = &hub.user().preferences().currency;
            let net = store.net(period);
            println!("Income:   {} {}", store.total_income(period), currency);
            println!("Expenses: {} {}", store.total_expenses(period), currency);
            let net_text = format!("Net:      {} {}", net, currency);
            if net < Decimal::ZERO {
                println!("{}", net_text.red());
            } else {
                println!("{}", net_text.green());
            }
        }
        TxCommand::Rm { id } => {
            if !hub.transactions_mut().delete(&id) {
                return Err(not_found("transaction", &id));
            }
        }
    }
    Ok(())
}

fn print_transaction(tx: &Transaction, currency: &str) {
    let amount = format!("{:>12} {}", tx.signed_amount().round_dp(2), currency);
    let amount = match tx.kind {
        TransactionType::Income => amount.green(),
        TransactionType::Expense => amount.red(),
    };
    println!(
        "{} {} {} ({}) {}",
        tx.date.format("%Y-%m-%d"),
        amount,
        tx.description,
        tx.category.label(),
        tx.id.dimmed()
    );
}

fn run_prefs(hub: &mut Hub, command: PrefsCommand) -> Result<()> {
    match command {
        PrefsCommand::Show => {}
        PrefsCommand::Set {
            theme,
            currency,
            date_format,
            time_format,
        } => {
            hub.user_mut().update_preferences(PreferencesPatch {
                theme,
                currency,
                date_format,
                time_format,
                notifications: None,
            });
        }
        PrefsCommand::Reset => hub.user_mut().reset_preferences(),
    }
    println!("{}", serde_yaml::to_string(hub.user().preferences())?);
    Ok(())
}

fn print_summary(hub: &Hub) {
    let stats = hub.dashboard();

    println!("{}", "Tasks".bold());
    println!(
        "  {} done, {} pending, {:.1}% complete",
        stats.tasks_completed, stats.tasks_pending, stats.completion_rate
    );
    if stats.overdue_tasks > 0 {
        println!("  {}", format!("{} overdue", stats.overdue_tasks).red());
    }
    println!("  {} due in the next {} days", stats.upcoming_tasks, hub.upcoming_days());

    println!("{}", "Notes".bold());
    println!("  {} total, {} pinned", stats.total_notes, stats.pinned_notes);

    let currency = &hub.user().preferences().currency;
    println!("{}", "This month".bold());
    println!("  income   {} {}", stats.monthly_income.round_dp(2), currency);
    println!("  expenses {} {}", stats.monthly_expenses.round_dp(2), currency);
    let net = format!("  net      {} {}", stats.net_income.round_dp(2), currency);
    if stats.net_income < Decimal::ZERO {
        println!("{}", net.red());
    } else {
        println!("{}", net.green());
    }

    if !stats.top_expense_categories.is_empty() {
        println!("{}", "Top spending".bold());
        for spending in &stats.top_expense_categories {
            println!(
                "  {:<16} {} {} ({:.1}%)",
                spending.category.label(),
                spending.amount.round_dp(2),
                currency,
                spending.percentage
            );
        }
    }
}
