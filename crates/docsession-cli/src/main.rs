use clap::{Parser, Subcommand};
use conflict_engine::Strategy;
use docsession_core::autosave::Autosaver;
use docsession_core::config::Settings;
use docsession_core::logging::init_logging;
use docsession_core::persistence::{FsBridge, PersistenceBridge};
use docsession_core::session::{CloseOutcome, Session};
use docsession_core::Buffer;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

#[derive(Parser)]
#[command(
    name = "docsession",
    about = "Open-document session with structural undo and conflict resolution"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to .docsession data directory
    #[arg(long, default_value = ".docsession")]
    data_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default settings to the data directory
    Init,
    /// List open buffers (* marks the active one, [+] unsaved changes)
    List {
        /// Print the persisted session state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open a file, or activate it if already open
    Open { path: String },
    /// Create an empty buffer
    New { name: Option<String> },
    /// Save a buffer (the active one by default)
    Save { id: Option<String> },
    /// Close a buffer
    Close {
        id: String,
        /// Discard unsaved changes without asking
        #[arg(long)]
        force: bool,
    },
    /// Close every buffer except one
    CloseOthers {
        id: String,
        #[arg(long)]
        force: bool,
    },
    /// Close every buffer that is not exempt
    CloseAll {
        #[arg(long)]
        force: bool,
    },
    /// Give a buffer a new path (its id changes with it)
    Rename { id: String, path: String },
    /// Make a buffer the active one
    Activate { id: String },
    /// Reopen the most recently closed buffer
    Reopen,
    /// List conflict blocks in a file
    Conflicts { path: String },
    /// Collapse conflict blocks in a file to one side
    Resolve {
        path: String,
        /// Side to keep: ours or theirs
        #[arg(long)]
        strategy: Strategy,
        /// Print the change as a unified diff instead of applying it
        #[arg(long)]
        preview: bool,
        /// Save the buffer after resolving
        #[arg(long)]
        save: bool,
    },
    /// Interactive shell keeping one session alive (undo/redo, autosave)
    Shell,
}

fn data_dir(cli: &Cli) -> PathBuf {
    cli.data_dir.clone()
}

fn settings_path(cli: &Cli) -> PathBuf {
    data_dir(cli).join("settings.json")
}

fn load_session(cli: &Cli) -> anyhow::Result<(Settings, Session<FsBridge>)> {
    let settings = Settings::load_or_default(&settings_path(cli))?;
    let bridge = FsBridge::new(
        settings.workspace.root.clone(),
        data_dir(cli).join("session.json"),
    );
    tracing::debug!(
        root = %bridge.root().display(),
        state = %bridge.state_path().display(),
        "Loading session"
    );
    let session = Session::restore(bridge, settings.session.clone());
    Ok((settings, session))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        return cmd_init(&cli);
    }

    let _guard = init_logging(&data_dir(&cli).join("logs"))?;
    let (settings, mut session) = load_session(&cli)?;

    match &cli.command {
        Commands::Init => Ok(()),
        Commands::List { json } => cmd_list(&session, *json),
        Commands::Open { path } => match session.open(path) {
            Some(id) => {
                println!("Opened {}", id);
                Ok(())
            }
            None => anyhow::bail!("Could not read {}", path),
        },
        Commands::New { name } => {
            let id = session.new_buffer(name.as_deref())?;
            println!("Created {}", id);
            Ok(())
        }
        Commands::Save { id } => {
            let id = match id.as_deref().or(session.active_id()) {
                Some(id) => id.to_string(),
                None => anyhow::bail!("No buffer to save"),
            };
            session.save(&id)?;
            println!("Saved {}", id);
            Ok(())
        }
        Commands::Close { id, force } => {
            match session.close(id, |b| *force || confirm_discard(b.id())) {
                CloseOutcome::Closed => println!("Closed {}", id),
                CloseOutcome::Declined => println!("Kept {}", id),
                CloseOutcome::NotFound => anyhow::bail!("No buffer named {}", id),
            }
            Ok(())
        }
        Commands::CloseOthers { id, force } => {
            let closed = session.close_others(id, |b| *force || confirm_discard(b.id()));
            println!("Closed {} buffer(s)", closed);
            Ok(())
        }
        Commands::CloseAll { force } => {
            let closed = session.close_all(|b| *force || confirm_discard(b.id()));
            println!("Closed {} buffer(s)", closed);
            Ok(())
        }
        Commands::Rename { id, path } => {
            let new_id = session.rename_buffer(id, path)?;
            println!("Renamed {} -> {}", id, new_id);
            Ok(())
        }
        Commands::Activate { id } => {
            if !session.set_active(id) {
                anyhow::bail!("No buffer named {}", id);
            }
            Ok(())
        }
        Commands::Reopen => {
            match session.reopen_closed() {
                Some(id) => println!("Reopened {}", id),
                None => println!("Nothing to reopen"),
            }
            Ok(())
        }
        Commands::Conflicts { path } => cmd_conflicts(&session, path),
        Commands::Resolve {
            path,
            strategy,
            preview,
            save,
        } => cmd_resolve(&mut session, path, *strategy, *preview, *save),
        Commands::Shell => cmd_shell(settings, session).await,
    }
}

fn cmd_init(cli: &Cli) -> anyhow::Result<()> {
    let path = settings_path(cli);
    if path.exists() {
        println!("Settings already exist at {}", path.display());
        return Ok(());
    }
    Settings::default().save(&path)?;
    println!("Settings written to {}", path.display());
    Ok(())
}

fn cmd_list<B: PersistenceBridge>(session: &Session<B>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&session.state())?);
    } else {
        print_buffers(session);
    }
    Ok(())
}

fn print_buffers<B: PersistenceBridge>(session: &Session<B>) {
    for buffer in session.buffers() {
        let marker = if session.active_id() == Some(buffer.id()) {
            "*"
        } else {
            " "
        };
        let dirty = if buffer.is_dirty() { " [+]" } else { "" };
        println!(
            "{} {} ({}, {}){}",
            marker,
            buffer.id(),
            buffer.path(),
            buffer.language(),
            dirty
        );
    }
}

fn confirm_discard(id: &str) -> bool {
    dialoguer::Confirm::new()
        .with_prompt(format!("{} has unsaved changes. Close anyway?", id))
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Ask about every dirty buffer `wanted` selects and return the ids the
/// user agreed to discard. Prompts run on the blocking pool with the
/// session unlocked, so autosave keeps running meanwhile.
async fn confirm_dirty<F>(session: &Mutex<Session<FsBridge>>, wanted: F) -> HashSet<String>
where
    F: Fn(&Session<FsBridge>, &Buffer) -> bool,
{
    let dirty: Vec<String> = {
        let s = session.lock().await;
        s.buffers()
            .iter()
            .filter(|b| b.is_dirty() && wanted(&s, b))
            .map(|b| b.id().to_string())
            .collect()
    };

    let mut approved = HashSet::new();
    for id in dirty {
        let prompt_id = id.clone();
        let yes = tokio::task::spawn_blocking(move || confirm_discard(&prompt_id))
            .await
            .unwrap_or(false);
        if yes {
            approved.insert(id);
        }
    }
    approved
}

fn print_status<B: PersistenceBridge>(session: &Session<B>) {
    let history = session.history();
    println!(
        "undo {}, redo {}, closed {}/{}, recent {}",
        history.undo_len(),
        history.redo_len(),
        session.closed().len(),
        session.closed().capacity(),
        session.recent().len()
    );
}

/// Text of `path`: the open buffer's content if it is open, else the file.
fn current_text<B: PersistenceBridge>(session: &Session<B>, path: &str) -> anyhow::Result<String> {
    match session.get(path) {
        Some(buffer) => Ok(buffer.content().to_string()),
        None => Ok(session.bridge().read_text(path)?),
    }
}

fn cmd_conflicts<B: PersistenceBridge>(session: &Session<B>, path: &str) -> anyhow::Result<()> {
    let text = current_text(session, path)?;
    let regions = conflict_engine::scan(&text);
    if regions.is_empty() {
        println!("No conflicts in {}", path);
        return Ok(());
    }
    for region in &regions {
        println!(
            "{}:{}-{}: ours {} line(s), theirs {} line(s)",
            path, region.start_line, region.end_line, region.ours_lines, region.theirs_lines
        );
    }
    println!("{} conflict block(s)", regions.len());
    Ok(())
}

fn cmd_resolve<B: PersistenceBridge>(
    session: &mut Session<B>,
    path: &str,
    strategy: Strategy,
    preview: bool,
    save: bool,
) -> anyhow::Result<()> {
    if preview {
        let text = current_text(session, path)?;
        print!("{}", conflict_engine::preview(&text, strategy, path));
        return Ok(());
    }

    let Some(id) = session.open(path) else {
        anyhow::bail!("Could not read {}", path);
    };
    let blocks = session.resolve_conflicts(&id, strategy)?;
    println!("Resolved {} block(s) in {} using {}", blocks, id, strategy);
    if save && blocks > 0 {
        session.save(&id)?;
        println!("Saved {}", id);
    } else if blocks > 0 {
        println!("Unsaved; run `docsession save {}` to write it", id);
    }
    Ok(())
}

const SHELL_HELP: &str = "\
Commands:
  ls                      list buffers
  open <path>             open a file
  new [name]              create an empty buffer
  use <id>                activate a buffer
  show [id]               print a buffer
  set <id> <text...>      replace a buffer's content
  append <id> <text...>   append a line to a buffer
  save [id]               save a buffer
  close <id>              close a buffer (asks if unsaved)
  close! <id>             close without asking
  only <id>               close all other buffers
  close-all               close every non-exempt buffer
  rename <id> <path>      rename a buffer
  undo | redo             structural undo/redo
  status                  history and ring sizes
  reopen                  reopen the last closed buffer
  conflicts <id>          list conflict blocks
  resolve <id> <ours|theirs>
  autosave <on|off>
  quit";

async fn cmd_shell(settings: Settings, session: Session<FsBridge>) -> anyhow::Result<()> {
    let session = Arc::new(Mutex::new(session));
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let autosaver = Autosaver::spawn(
        session.clone(),
        settings.editor.autosave_delay(),
        settings.editor.autosave,
        shutdown_tx.subscribe(),
    );

    tracing::info!(autosave = settings.editor.autosave, "Shell started");
    println!("docsession shell. Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let approved = match words.as_slice() {
            ["close", id] => confirm_dirty(&session, |_, b| b.id() == *id).await,
            ["only", id] => {
                confirm_dirty(&session, |s, b| {
                    b.id() != *id && !s.settings().is_exempt(b.id())
                })
                .await
            }
            ["close-all"] => {
                confirm_dirty(&session, |s, b| !s.settings().is_exempt(b.id())).await
            }
            _ => HashSet::new(),
        };
        let discard = |b: &Buffer| approved.contains(b.id());
        let mut s = session.lock().await;

        match words.as_slice() {
            [] => {}
            ["quit"] | ["exit"] => break,
            ["help"] => println!("{}", SHELL_HELP),
            ["ls"] => print_buffers(&*s),
            ["open", path] => match s.open(path) {
                Some(id) => println!("Opened {}", id),
                None => println!("Could not read {}", path),
            },
            ["new"] => report(s.new_buffer(None).map(|id| format!("Created {}", id))),
            ["new", name] => report(s.new_buffer(Some(*name)).map(|id| format!("Created {}", id))),
            ["use", id] => {
                if !s.set_active(id) {
                    println!("No buffer named {}", id);
                }
            }
            ["show"] => match s.active() {
                Some(buffer) => println!("{}", buffer.content()),
                None => println!("No active buffer"),
            },
            ["show", id] => match s.get(id) {
                Some(buffer) => println!("{}", buffer.content()),
                None => println!("No buffer named {}", id),
            },
            ["set", id, rest @ ..] => {
                if s.update(id, &rest.join(" ")) {
                    autosaver.notify_edit(id);
                } else {
                    println!("No buffer named {}", id);
                }
            }
            ["append", id, rest @ ..] => {
                let content = match s.get(id) {
                    Some(buffer) => format!("{}{}\n", buffer.content(), rest.join(" ")),
                    None => {
                        println!("No buffer named {}", id);
                        continue;
                    }
                };
                s.update(id, &content);
                autosaver.notify_edit(id);
            }
            ["save"] => {
                let active = s.active_id().map(str::to_string);
                match active {
                    Some(id) => report(s.save(&id).map(|_| format!("Saved {}", id))),
                    None => println!("No active buffer"),
                }
            }
            ["save", id] => report(s.save(id).map(|_| format!("Saved {}", id))),
            ["close", id] => match s.close(id, discard) {
                CloseOutcome::Closed => println!("Closed {}", id),
                CloseOutcome::Declined => println!("Kept {}", id),
                CloseOutcome::NotFound => println!("No buffer named {}", id),
            },
            ["close!", id] => {
                if s.close(id, |_| true) == CloseOutcome::NotFound {
                    println!("No buffer named {}", id);
                }
            }
            ["only", id] => println!("Closed {} buffer(s)", s.close_others(id, discard)),
            ["close-all"] => println!("Closed {} buffer(s)", s.close_all(discard)),
            ["rename", id, path] => match s.rename_buffer(id, path) {
                Ok(new_id) => {
                    autosaver.notify_rename(id, &new_id);
                    println!("Now {}", new_id);
                }
                Err(e) => println!("{}", e),
            },
            ["undo"] => {
                if !s.undo() {
                    println!("Nothing to undo");
                } else if let Some((from, to)) =
                    s.history().redo_stack().last().and_then(|a| a.id_change(true))
                {
                    autosaver.notify_rename(from, to);
                }
            }
            ["redo"] => {
                if !s.redo() {
                    println!("Nothing to redo");
                } else if let Some((from, to)) =
                    s.history().undo_stack().last().and_then(|a| a.id_change(false))
                {
                    autosaver.notify_rename(from, to);
                }
            }
            ["status"] => print_status(&*s),
            ["reopen"] => match s.reopen_closed() {
                Some(id) => println!("Reopened {}", id),
                None => println!("Nothing to reopen"),
            },
            ["conflicts", id] => {
                if let Err(e) = cmd_conflicts(&*s, id) {
                    println!("{}", e);
                }
            }
            ["resolve", id, strategy] => match strategy.parse::<Strategy>() {
                Ok(strategy) => {
                    let result = s.resolve_conflicts(id, strategy);
                    if matches!(result, Ok(n) if n > 0) {
                        autosaver.notify_edit(id);
                    }
                    report(result.map(|n| format!("Resolved {} block(s)", n)));
                }
                Err(e) => println!("{}", e),
            },
            ["autosave", "on"] => autosaver.set_enabled(true),
            ["autosave", "off"] => autosaver.set_enabled(false),
            _ => println!("Unknown command. Type `help`."),
        }
    }

    let _ = shutdown_tx.send(());
    tracing::info!("Shell stopped");
    Ok(())
}

fn report<E: std::fmt::Display>(result: Result<String, E>) {
    match result {
        Ok(message) => println!("{}", message),
        Err(e) => println!("{}", e),
    }
}
