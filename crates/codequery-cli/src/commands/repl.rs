//! Interactive query session

use crate::app::ReplArgs;
use anyhow::Result;
use codequery_core::{Config, FileReader, FsReader, QueryRoute, Session};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

const LIST_LIMIT: usize = 50;
const SEARCH_LIMIT: usize = 20;

pub async fn run(args: ReplArgs, config: &Config) -> Result<()> {
    let mut session = super::open_session(config, args.max_iterations)?;
    let reader = FsReader::new(config.snapshot_dir());

    println!(
        "\nCodebase query ready with {} files. Type '/help' for commands.\n",
        session.index().len()
    );

    let stdin = std::io::stdin();
    loop {
        print!("Code Query: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            if !handle_command(command, &mut session, &reader)? {
                break;
            }
            continue;
        }

        run_query(&mut session, input).await;
    }

    Ok(())
}

/// Handle a slash command. Returns false when the session should end.
fn handle_command(command: &str, session: &mut Session, reader: &FsReader) -> Result<bool> {
    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match name.as_str() {
        "exit" | "quit" => {
            println!("Exiting codebase query session.");
            return Ok(false);
        }
        "help" => {
            println!("\nAvailable commands:");
            println!("  /ls [path]       - List files (optionally under a path)");
            println!("  /read <file>     - Read a specific file");
            println!("  /search <term>   - Search for files containing term");
            println!("  /tree            - Show directory tree");
            println!("  /memory          - Show cached files in memory");
            println!("  /clear           - Clear the file memory cache");
            println!("  /history         - Show conversation history");
            println!("  /help            - Show this help");
            println!("  /exit or /quit   - Exit the session\n");
        }
        "memory" => {
            let cached = session.cached_paths();
            if cached.is_empty() {
                println!("\nNo files in memory cache.\n");
            } else {
                println!("\nCached files ({}):", cached.len());
                for path in cached {
                    println!("  {}", path);
                }
                println!();
            }
        }
        "clear" => {
            session.wipe_cache();
            println!("Memory cache cleared.\n");
        }
        "history" => {
            if session.history().is_empty() {
                println!("\nNo conversation history.\n");
            } else {
                println!();
                for entry in session.history().entries() {
                    println!("[{}] Q: {}", entry.seq, entry.query);
                    println!("    A: {}", entry.answer);
                }
                println!();
            }
        }
        "ls" => {
            let records = session.index().list_dir(arg);
            if records.is_empty() {
                println!("No files found under '{}'\n", arg);
            } else {
                println!("\nFiles under '{}':", if arg.is_empty() { "/" } else { arg });
                for record in records.iter().take(LIST_LIMIT) {
                    println!("  {}", record.path);
                }
                if records.len() > LIST_LIMIT {
                    println!("  ... and {} more files", records.len() - LIST_LIMIT);
                }
                println!();
            }
        }
        "read" => {
            if arg.is_empty() {
                println!("Usage: /read <filename>\n");
            } else if session.index().lookup(arg).is_none() {
                println!("File not found: {}\n", arg);
            } else {
                match reader.read_full(arg) {
                    Ok(content) => {
                        println!("\n--- {} ---", arg);
                        println!("{}", content);
                        println!("--- End of {} ---\n", arg);
                    }
                    Err(e) => println!("Error reading file: {}\n", e),
                }
            }
        }
        "search" => {
            if arg.is_empty() {
                println!("Usage: /search <term>\n");
            } else {
                search_files(session, reader, arg);
            }
        }
        "tree" => {
            print_tree(session);
        }
        _ => {
            println!("Unknown command. Type '/help' for available commands.\n");
        }
    }

    Ok(true)
}

async fn run_query(session: &mut Session, query: &str) {
    println!();
    match session.ask(query).await {
        Ok(outcome) => {
            let mode = match outcome.route {
                QueryRoute::SearchCode => "Agentic codebase search",
                QueryRoute::UseMemory => "Using cached files",
                QueryRoute::Direct => "Direct answer (general knowledge)",
            };
            println!("Mode: {}", mode);

            if outcome.analyzed_files.is_empty() {
                println!("\n{}\n", outcome.answer);
            } else {
                println!(
                    "\nAnswer (analyzed {} files: {}):",
                    outcome.analyzed_files.len(),
                    outcome.analyzed_files.join(", ")
                );
                println!("{}\n", outcome.answer);
            }
        }
        Err(aborted) => {
            println!("{}", aborted);
            if !aborted.analyzed_files.is_empty() {
                println!(
                    "Files analyzed before the failure: {}",
                    aborted.analyzed_files.join(", ")
                );
            }
            println!("The session is still usable; try again.\n");
        }
    }
}

/// Naive content scan across every indexed file
fn search_files(session: &Session, reader: &FsReader, term: &str) {
    let needle = term.to_lowercase();
    let mut matches = Vec::new();

    for record in session.index().records() {
        if let Ok(content) = reader.read_full(&record.path) {
            if content.to_lowercase().contains(&needle) {
                matches.push(record.path.clone());
            }
        }
    }

    if matches.is_empty() {
        println!("No files found containing '{}'\n", term);
        return;
    }

    println!("\nFound '{}' in {} files:", term, matches.len());
    for path in matches.iter().take(SEARCH_LIMIT) {
        println!("  {}", path);
    }
    if matches.len() > SEARCH_LIMIT {
        println!("  ... and {} more files", matches.len() - SEARCH_LIMIT);
    }
    println!();
}

fn print_tree(session: &Session) {
    let mut tree: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for record in session.index().records() {
        match record.path.rsplit_once('/') {
            Some((dir, name)) => tree.entry(dir.to_string()).or_default().push(name),
            None => tree.entry(String::new()).or_default().push(&record.path),
        }
    }

    println!("\nDirectory structure:");
    for (dir, files) in &tree {
        if dir.is_empty() {
            println!("  /");
        } else {
            println!("  {}/", dir);
        }
        for name in files.iter().take(5) {
            println!("    {}", name);
        }
        if files.len() > 5 {
            println!("    ... and {} more files", files.len() - 5);
        }
    }
    println!();
}
