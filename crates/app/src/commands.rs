use sortbook_core::{CategoryFilter, Column, RowEdit, RowId, SignFilter, ViewFilter};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::session::{Session, SessionError};

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CommandError {
    pub message: String,
}

impl From<SessionError> for CommandError {
    fn from(e: SessionError) -> Self {
        CommandError {
            message: e.to_string(),
        }
    }
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        CommandError { message }
    }
}

/// Changes requested by `filter`; keys that were not given keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub category: Option<CategoryFilter>,
    pub search: Option<String>,
    pub sign: Option<SignFilter>,
}

impl FilterUpdate {
    pub fn apply_to(self, filter: &mut ViewFilter) {
        if let Some(category) = self.category {
            filter.category = category;
        }
        if let Some(search) = self.search {
            filter.search = search;
        }
        if let Some(sign) = self.sign {
            filter.sign = sign;
        }
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    Load(PathBuf),
    Filter(FilterUpdate),
    Clear,
    Sort { column: Column, ascending: bool },
    Show,
    Summary,
    /// `row` is the id `show` prints, so it stays valid across filters,
    /// sorts and deletes of other rows.
    Edit { row: RowId, edit: RowEdit },
    Delete(RowId),
    Reclassify,
    Export(PathBuf),
    ExportRules(PathBuf),
    Categories,
    Migrate(PathBuf),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(line)?;
        let Some((name, args)) = tokens.split_first() else {
            return Err("Empty command".to_string());
        };

        match name.to_lowercase().as_str() {
            "load" | "open" => Ok(Command::Load(path_arg("load", args)?)),
            "filter" => parse_filter(args).map(Command::Filter),
            "clear" => Ok(Command::Clear),
            "sort" => parse_sort(args),
            "show" | "ls" => Ok(Command::Show),
            "summary" => Ok(Command::Summary),
            "edit" => parse_edit(args),
            "delete" | "rm" => match args {
                [row] => Ok(Command::Delete(row_arg(row)?)),
                _ => Err("Usage: delete <row>".to_string()),
            },
            "reclassify" => Ok(Command::Reclassify),
            "export" => Ok(Command::Export(path_arg("export", args)?)),
            "export-rules" => Ok(Command::ExportRules(path_arg("export-rules", args)?)),
            "categories" => Ok(Command::Categories),
            "migrate" => Ok(Command::Migrate(path_arg("migrate", args)?)),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("Unknown command: '{other}' (try 'help')")),
        }
    }
}

/// Splits on whitespace. Double quotes group words and may appear mid-token,
/// so `category="Eating Out"` is one token.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err("Unterminated quote".to_string());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn path_arg(command: &str, args: &[String]) -> Result<PathBuf, String> {
    match args {
        [path] => Ok(PathBuf::from(path)),
        _ => Err(format!("Usage: {command} <path>")),
    }
}

/// `#4` or `4`.
fn row_arg(s: &str) -> Result<RowId, String> {
    s.strip_prefix('#')
        .unwrap_or(s)
        .parse()
        .map(RowId)
        .map_err(|_| format!("Row must be a row id like #4, got '{s}'"))
}

fn parse_filter(args: &[String]) -> Result<FilterUpdate, String> {
    let mut update = FilterUpdate::default();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("Expected key=value, got '{arg}'"))?;
        match key.to_lowercase().as_str() {
            "category" => update.category = Some(CategoryFilter::from_choice(value)),
            "search" => update.search = Some(value.to_string()),
            "sign" => update.sign = Some(value.parse()?),
            other => return Err(format!("Unknown filter key: '{other}'")),
        }
    }
    Ok(update)
}

fn parse_sort(args: &[String]) -> Result<Command, String> {
    let (column, direction) = match args {
        [column] => (column, None),
        [column, direction] => (column, Some(direction)),
        _ => return Err("Usage: sort <column> [asc|desc]".to_string()),
    };
    let ascending = match direction.map(|d| d.to_lowercase()).as_deref() {
        None | Some("asc") | Some("ascending") => true,
        Some("desc") | Some("descending") => false,
        Some(other) => return Err(format!("Unknown sort direction: '{other}'")),
    };
    Ok(Command::Sort {
        column: column.parse()?,
        ascending,
    })
}

fn parse_edit(args: &[String]) -> Result<Command, String> {
    let [row, category, amount, description @ ..] = args else {
        return Err("Usage: edit <row> <category> <amount> <description..>".to_string());
    };
    Ok(Command::Edit {
        row: row_arg(row)?,
        edit: RowEdit {
            category: category.clone(),
            amount: amount.clone(),
            description: description.join(" "),
        },
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

pub fn execute(session: &mut Session, command: Command) -> Result<Outcome, CommandError> {
    let output = match command {
        Command::Load(path) => {
            let report = session.load(&path)?;
            format!(
                "Loaded {} rows from {}: {} exact, {} contains, {} uncategorized",
                session.table().len(),
                path.display(),
                report.exact,
                report.contains,
                report.uncategorized
            )
        }
        Command::Filter(update) => {
            let mut filter = session.current_filter().clone();
            update.apply_to(&mut filter);
            session.set_filter(filter);
            describe_view(session)
        }
        Command::Clear => {
            session.clear_filter();
            describe_view(session)
        }
        Command::Sort { column, ascending } => {
            session.sort(column, ascending);
            render_view(session)
        }
        Command::Show => render_view(session),
        Command::Summary => render_summary(session),
        Command::Edit { row, edit } => {
            session.edit_row(row, edit)?;
            match session.table().get(row) {
                Some(tx) => format!("Updated {row}: '{}' is now {}", tx.description, tx.category),
                None => format!("Updated {row}"),
            }
        }
        Command::Delete(row) => {
            let removed = session.delete_row(row)?;
            format!(
                "Deleted {} {} {}",
                removed.date, removed.description, removed.amount
            )
        }
        Command::Reclassify => {
            let report = session.reclassify();
            format!(
                "Reclassified {} rows, {} left uncategorized",
                report.categorized(),
                report.uncategorized
            )
        }
        Command::Export(path) => {
            let written = session.export(&path)?;
            format!("Exported {written} rows to {}", path.display())
        }
        Command::ExportRules(path) => {
            session.export_rules(&path)?;
            format!(
                "Exported {} rule categories to {}",
                session.rules().len(),
                path.display()
            )
        }
        Command::Categories => {
            if session.categories().is_empty() {
                format!(
                    "No categories configured in {}",
                    session.config().categories_path.display()
                )
            } else {
                session.categories().join("\n")
            }
        }
        Command::Migrate(path) => {
            let count = session.migrate(&path)?;
            format!("Migrated {count} categories from {}", path.display())
        }
        Command::Help => help_text(),
        Command::Quit => return Ok(Outcome::Quit),
    };
    Ok(Outcome::Continue(output))
}

fn describe_view(session: &Session) -> String {
    let filter = session.current_filter();
    let mut out = format!(
        "Showing {} of {} rows (category: {}, sign: {}",
        session.view().len(),
        session.table().len(),
        filter.category,
        filter.sign
    );
    if !filter.search.is_empty() {
        let _ = write!(out, ", search: '{}'", filter.search);
    }
    out.push(')');
    out
}

/// One line per view row, prefixed with the id `edit` and `delete` take.
pub fn render_view(session: &Session) -> String {
    let view = session.view();
    let cells: Vec<[String; 5]> = view
        .rows()
        .iter()
        .map(|row| {
            let tx = row.transaction;
            [
                row.id.to_string(),
                tx.date.clone(),
                tx.description.clone(),
                tx.amount.to_string(),
                tx.category.clone(),
            ]
        })
        .collect();

    let [date, description, amount, category] = Column::ALL.map(|c| c.to_string());
    let header = [String::from("Row"), date, description, amount, category];

    let mut widths = header.clone().map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(&cells) {
        let line = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                // Amounts right-aligned.
                if i == 3 {
                    format!("{cell:>width$}")
                } else {
                    format!("{cell:<width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push_str(&describe_view(session));
    out
}

pub fn render_summary(session: &Session) -> String {
    let rows = session.category_totals();
    let totals = session.overall_totals();

    let labels = ["Income", "Expenses", "Net"];
    let width = rows
        .iter()
        .map(|r| r.category.chars().count())
        .chain(labels.iter().map(|l| l.len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for row in &rows {
        let _ = writeln!(out, "{:<width$}  {:>14}", row.category, row.total.to_string());
    }
    if !rows.is_empty() {
        out.push('\n');
    }
    for (label, value) in labels.iter().zip([totals.income, totals.expenses, totals.net]) {
        let _ = writeln!(out, "{label:<width$}  {:>14}", value.to_string());
    }
    out.truncate(out.trim_end().len());
    out
}

fn help_text() -> String {
    let columns = Column::ALL.map(|c| c.to_string().to_lowercase()).join("|");
    format!(
        "Commands:
  load <path>                         import a CSV export and classify it
  filter [category=..] [search=..] [sign=all|positive|negative]
  clear                               drop all filters
  sort <{columns}> [asc|desc]
  show                                print the current view
  summary                             totals per category and overall
  edit <row> <category> <amount> <description..>
  delete <row>                        <row> is the #id shown by 'show'
  reclassify                          re-run the rules over every row
  export <path>                       write the current view as CSV
  export-rules <path>                 write a copy of the rule file
  categories                          list the configured categories
  migrate <flat.json>                 convert a legacy keyword file
  quit
Quote arguments that contain spaces: edit #3 \"Eating Out\" -12.50 LUNCH"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::fs;
    use tempfile::TempDir;

    fn parse(line: &str) -> Command {
        line.parse().unwrap()
    }

    fn setup() -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::in_dir(dir.path());
        config.import.header_rows = 0;
        fs::write(
            &config.rules_path,
            r#"{"Groceries": {"exact": [], "contains": ["MART"]}}"#,
        )
        .unwrap();
        fs::write(&config.categories_path, "Groceries\nEating Out\n").unwrap();
        fs::write(
            dir.path().join("march.csv"),
            "Date,Description,Amount\n\
             2024-03-01,ACME PAYROLL,2500.00\n\
             2024-03-02,SUPER MART #4,-42.10\n\
             2024-03-03,NOODLE BAR,-12.5\n",
        )
        .unwrap();
        let session = Session::open(config);
        (dir, session)
    }

    fn run(session: &mut Session, line: &str) -> Result<String, CommandError> {
        match execute(session, line.parse()?)? {
            Outcome::Continue(output) => Ok(output),
            Outcome::Quit => Ok(String::from("<quit>")),
        }
    }

    fn load_march(dir: &TempDir, session: &mut Session) {
        let path = dir.path().join("march.csv");
        run(session, &format!("load \"{}\"", path.display())).unwrap();
    }

    #[test]
    fn tokenize_handles_quotes() {
        assert_eq!(
            tokenize(r#"edit 2 "Eating Out" -12.50 NOODLE  BAR"#).unwrap(),
            vec!["edit", "2", "Eating Out", "-12.50", "NOODLE", "BAR"]
        );
        assert_eq!(
            tokenize(r#"filter category="Eating Out" search="""#).unwrap(),
            vec!["filter", "category=Eating Out", "search="]
        );
        assert!(tokenize(r#"load "unterminated"#).is_err());
    }

    #[test]
    fn parse_edit_joins_description() {
        let Command::Edit { row, edit } = parse("edit #4 Travel -15 NEW DESC") else {
            panic!("expected edit");
        };
        assert_eq!(row, RowId(4));
        assert_eq!(edit.category, "Travel");
        assert_eq!(edit.amount, "-15");
        assert_eq!(edit.description, "NEW DESC");

        assert!(matches!(parse("delete 7"), Command::Delete(RowId(7))));
        assert!(matches!(parse("rm #7"), Command::Delete(RowId(7))));
    }

    #[test]
    fn parse_filter_keys() {
        let Command::Filter(update) = parse("filter category=Uncategorized sign=neg") else {
            panic!("expected filter");
        };
        assert_eq!(update.category, Some(CategoryFilter::Uncategorized));
        assert_eq!(update.sign, Some(SignFilter::Negative));
        assert_eq!(update.search, None);

        let Command::Filter(update) = parse("filter category=All") else {
            panic!("expected filter");
        };
        assert_eq!(update.category, Some(CategoryFilter::All));
    }

    #[test]
    fn parse_sort_direction() {
        assert!(matches!(
            parse("sort amount desc"),
            Command::Sort { column: Column::Amount, ascending: false }
        ));
        assert!(matches!(
            parse("SORT Date"),
            Command::Sort { column: Column::Date, ascending: true }
        ));
        assert!("sort amount sideways".parse::<Command>().is_err());
        assert!("sort balance".parse::<Command>().is_err());
    }

    #[test]
    fn parse_errors_are_messages() {
        let bad = [
            "",
            "frobnicate",
            "delete",
            "delete two",
            "delete #",
            "edit 1 Food",
            "filter search",
            "load",
            "export-rules",
        ];
        for line in bad {
            assert!(line.parse::<Command>().is_err(), "{line:?} should not parse");
        }
    }

    #[test]
    fn filter_updates_only_given_keys() {
        let (dir, mut session) = setup();
        load_march(&dir, &mut session);

        let out = run(&mut session, "filter sign=negative").unwrap();
        assert_eq!(out, "Showing 2 of 3 rows (category: All, sign: Negative)");

        let out = run(&mut session, "filter category=Groceries").unwrap();
        assert_eq!(out, "Showing 1 of 3 rows (category: Groceries, sign: Negative)");

        run(&mut session, "clear").unwrap();
        assert_eq!(session.current_filter(), &ViewFilter::default());
    }

    #[test]
    fn show_labels_rows_by_id() {
        let (dir, mut session) = setup();
        load_march(&dir, &mut session);
        run(&mut session, "filter category=Uncategorized").unwrap();

        let out = run(&mut session, "show").unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert!(lines[0].starts_with("Row  Date"));
        assert!(lines[1].starts_with("#0   2024-03-01  ACME PAYROLL"));
        assert!(lines[2].starts_with("#2   2024-03-03  NOODLE BAR"));
        assert_eq!(lines[3], "Showing 2 of 3 rows (category: Uncategorized, sign: All)");
    }

    #[test]
    fn edit_by_id_under_a_filter() {
        let (dir, mut session) = setup();
        load_march(&dir, &mut session);
        run(&mut session, "filter category=Uncategorized").unwrap();

        let out = run(&mut session, r#"edit #2 "Eating Out" -12.50 NOODLE BAR"#).unwrap();
        assert_eq!(out, "Updated #2: 'NOODLE BAR' is now Eating Out");
        assert_eq!(session.rules().exact_owner("NOODLE BAR"), Some("Eating Out"));

        let err = run(&mut session, "edit #5 Groceries 1 X").unwrap_err();
        assert_eq!(err.message, "Row #5 no longer exists");
    }

    #[test]
    fn stale_row_id_never_hits_another_row() {
        let (dir, mut session) = setup();
        load_march(&dir, &mut session);

        run(&mut session, "delete #0").unwrap();
        let err = run(&mut session, "delete #0").unwrap_err();
        assert_eq!(err.message, "Row #0 no longer exists");

        let out = run(&mut session, "delete #1").unwrap();
        assert_eq!(out, "Deleted 2024-03-02 SUPER MART #4 -42.10");
        let left: Vec<_> = session
            .table()
            .transactions()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(left, vec!["NOODLE BAR"]);
    }

    #[test]
    fn summary_lists_categories_then_totals() {
        let (dir, mut session) = setup();
        load_march(&dir, &mut session);

        let out = run(&mut session, "summary").unwrap();
        let lines: Vec<Vec<&str>> = out
            .lines()
            .map(|line| line.split_whitespace().collect())
            .collect();
        assert_eq!(lines[0], vec!["Groceries", "-42.10"]);
        assert!(lines[1].is_empty());
        assert_eq!(lines[2], vec!["Income", "2,500.00"]);
        assert_eq!(lines[3], vec!["Expenses", "-54.60"]);
        assert_eq!(lines[4], vec!["Net", "2,445.40"]);
    }

    #[test]
    fn errors_leave_session_usable() {
        let (dir, mut session) = setup();
        let missing = dir.path().join("absent.csv");
        let err = run(&mut session, &format!("load \"{}\"", missing.display())).unwrap_err();
        assert!(err.message.starts_with("Import failed"));
        assert!(session.table().is_empty());

        let err = run(&mut session, "delete #0").unwrap_err();
        assert_eq!(err.message, "Row #0 no longer exists");
        assert!(run(&mut session, "help").unwrap().contains("reclassify"));
    }

    #[test]
    fn delete_export_and_quit() {
        let (dir, mut session) = setup();
        load_march(&dir, &mut session);

        let out = run(&mut session, "delete #0").unwrap();
        assert_eq!(out, "Deleted 2024-03-01 ACME PAYROLL 2500.00");

        let target = dir.path().join("out.csv");
        let out = run(&mut session, &format!("export \"{}\"", target.display())).unwrap();
        assert!(out.starts_with("Exported 2 rows"));
        assert!(target.exists());

        assert_eq!(execute(&mut session, Command::Quit).unwrap(), Outcome::Quit);
    }

    #[test]
    fn export_rules_to_chosen_path() {
        let (dir, mut session) = setup();
        let target = dir.path().join("shared").join("keywords.json");
        let out = run(&mut session, &format!("export-rules \"{}\"", target.display())).unwrap();
        assert!(out.starts_with("Exported 1 rule categories"));

        let text = fs::read_to_string(&target).unwrap();
        assert!(text.contains("\"MART\""));
    }

    #[test]
    fn categories_lists_configured_names() {
        let (_dir, mut session) = setup();
        assert_eq!(run(&mut session, "categories").unwrap(), "Groceries\nEating Out");
    }
}
