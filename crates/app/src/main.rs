use anyhow::Context;
use sortbook::{execute, AppConfig, Command, Outcome, Session};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sortbook=info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match AppConfig::default_path() {
        Some(path) => AppConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    let mut session = Session::open(config);

    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        match session.load(&path) {
            Ok(report) => println!(
                "Loaded {} rows, {} uncategorized",
                session.table().len(),
                report.uncategorized
            ),
            Err(e) => eprintln!("{e}"),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("sortbook> ");
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        match execute(&mut session, command) {
            Ok(Outcome::Continue(output)) => println!("{output}"),
            Ok(Outcome::Quit) => break,
            Err(e) => eprintln!("{e}"),
        }
    }

    Ok(())
}
