//! These structs provide the CLI interface for the budget CLI.

use crate::filter::{CategoryFilter, MonthFilter};
use crate::model::{DisplayRow, Kind};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// budget: record income and expenses, see where the money goes and ask an assistant about it.
///
/// Transactions are kept in a JSON document in the budget home directory. Amounts are shown in
/// the currency configured in `config.json`.
///
/// The `chat` command talks to an OpenRouter chat model. Put your API key in the
/// OPENROUTER_API_KEY environment variable or in `.secrets/api_key` inside the budget home. Set
/// BUDGET_CHAT_TEST_MODE to any value to use an offline assistant instead.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the budget home directory and an initial `config.json`.
    ///
    /// Running it again keeps the existing configuration.
    Init,
    /// Record an income or an expense.
    Add(AddArgs),
    /// Delete transactions by id, or by the text of rows shown by `list`.
    Delete(DeleteArgs),
    /// Show transactions, newest first.
    List(ListArgs),
    /// Show the months that have transactions.
    Months,
    /// Show the balance, the totals and spending by category.
    Summary,
    /// List or add expense categories.
    Categories(CategoriesArgs),
    /// Chat with the budget assistant.
    Chat(ChatArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the budget data and configuration are held. Defaults to ~/budget
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// Args for the `budget add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// `income` or `expense`.
    kind: Kind,

    #[arg(long)]
    description: String,

    /// A positive number, e.g. 1500 or 2.5
    #[arg(long, allow_hyphen_values = true)]
    amount: String,

    /// YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// Required for expenses, ignored for income.
    #[arg(long)]
    category: Option<String>,
}

impl AddArgs {
    pub fn new(
        kind: Kind,
        description: impl Into<String>,
        amount: impl Into<String>,
        date: Option<String>,
        category: Option<String>,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            amount: amount.into(),
            date,
            category,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// Args for the `budget delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The ids of the transactions to delete, as shown by `list`.
    #[arg(required_unless_present = "rows")]
    ids: Vec<String>,

    /// A row as shown by `list`, written as `kind|date|description|amount|category`, e.g.
    /// `expense|2024-01-06|Coffee|2.5 FCFA|Food`. Can be repeated; each row deletes at most one
    /// transaction.
    #[arg(long = "row", id = "rows")]
    rows: Vec<DisplayRow>,
}

impl DeleteArgs {
    pub fn new(ids: Vec<String>, rows: Vec<DisplayRow>) -> Self {
        Self { ids, rows }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }
}

/// Args for the `budget list` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ListArgs {
    /// `all` or a month as YYYY-MM.
    #[arg(long, default_value_t = MonthFilter::All)]
    month: MonthFilter,

    /// `all` or an expense category. Income is only shown with `all`.
    #[arg(long, default_value_t = CategoryFilter::All)]
    category: CategoryFilter,
}

impl ListArgs {
    pub fn new(month: MonthFilter, category: CategoryFilter) -> Self {
        Self { month, category }
    }

    pub fn month(&self) -> &MonthFilter {
        &self.month
    }

    pub fn category(&self) -> &CategoryFilter {
        &self.category
    }
}

/// Args for the `budget categories` command.
#[derive(Debug, Parser, Clone)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    command: Option<CategoriesCommand>,
}

impl CategoriesArgs {
    pub fn new(command: Option<CategoriesCommand>) -> Self {
        Self { command }
    }

    /// `list` when no subcommand was given.
    pub fn command(&self) -> CategoriesCommand {
        self.command.clone().unwrap_or(CategoriesCommand::List)
    }
}

#[derive(Subcommand, Debug, Clone, Eq, PartialEq)]
pub enum CategoriesCommand {
    /// Show all known categories.
    List,
    /// Add a category. Names are case-sensitive.
    Add { name: String },
}

/// Args for the `budget chat` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ChatArgs {
    /// Send one message, print the reply and exit. Without it, messages are read from stdin.
    #[arg(long)]
    message: Option<String>,
}

impl ChatArgs {
    pub fn new(message: Option<String>) -> Self {
        Self { message }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("budget"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("budget")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["budget", "--budget-home", "/tmp/budget-test"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_add_args() {
        let args = parse(&[
            "add",
            "expense",
            "--description",
            "Coffee",
            "--amount",
            "2.5",
            "--category",
            "Food",
        ]);
        let Command::Add(add) = args.command() else {
            panic!("expected add, got {:?}", args.command());
        };
        assert_eq!(add.kind(), Kind::Expense);
        assert_eq!(add.amount(), "2.5");
        assert_eq!(add.category(), Some("Food"));
        assert_eq!(add.date(), None);
        assert_eq!(args.common().budget_home().path(), Path::new("/tmp/budget-test"));
    }

    #[test]
    fn test_negative_amount_reaches_validation() {
        let args = parse(&["add", "income", "--description", "x", "--amount", "-5"]);
        let Command::Add(add) = args.command() else {
            panic!("expected add");
        };
        assert_eq!(add.amount(), "-5");
    }

    #[test]
    fn test_delete_args() {
        let args = parse(&["delete", "--row", "income|2024-01-05|Salary|1 000 FCFA|N/A"]);
        let Command::Delete(delete) = args.command() else {
            panic!("expected delete");
        };
        assert!(delete.ids().is_empty());
        assert_eq!(delete.rows()[0].kind, Kind::Income);
        assert_eq!(delete.rows()[0].amount, "1 000 FCFA");

        let args = parse(&["delete", "a", "b"]);
        let Command::Delete(delete) = args.command() else {
            panic!("expected delete");
        };
        assert_eq!(delete.ids(), &["a".to_string(), "b".to_string()]);

        assert!(Args::try_parse_from(["budget", "delete"]).is_err());
    }

    #[test]
    fn test_list_args() {
        let args = parse(&["list"]);
        let Command::List(list) = args.command() else {
            panic!("expected list");
        };
        assert_eq!(list.month(), &MonthFilter::All);
        assert_eq!(list.category(), &CategoryFilter::All);

        let args = parse(&["list", "--month", "2024-01", "--category", "Food"]);
        let Command::List(list) = args.command() else {
            panic!("expected list");
        };
        assert_eq!(list.month(), &MonthFilter::Month("2024-01".into()));
        assert!(Args::try_parse_from(["budget", "list", "--month", "Jan"]).is_err());
    }

    #[test]
    fn test_categories_default_to_list() {
        let args = parse(&["categories"]);
        let Command::Categories(c) = args.command() else {
            panic!("expected categories");
        };
        assert_eq!(c.command(), CategoriesCommand::List);

        let args = parse(&["categories", "add", "Health"]);
        let Command::Categories(c) = args.command() else {
            panic!("expected categories");
        };
        assert_eq!(
            c.command(),
            CategoriesCommand::Add {
                name: "Health".into()
            }
        );
    }
}
