use anyhow::{Context, Result, bail};
use inkpad_config::{Config, EditorSettings};
use inkpad_engine::markdown;
use inkpad_engine::plugins::links::links;
use inkpad_engine::plugins::task_items;
use inkpad_engine::{Editor, EditorConfig, io};
use relative_path::RelativePathBuf;
use std::{env, path::Path, process};

const USAGE: &str = "Usage: inkpad-cli <roundtrip|tasks|toggle <n>|footnotes|links> <note.md>";

#[derive(Debug, PartialEq)]
enum Command {
    /// Parse and rewrite the note in normalized form.
    Roundtrip,
    Tasks,
    /// Flip the n-th task item (1-based, as listed by `tasks`).
    Toggle(usize),
    Footnotes,
    Links,
}

fn parse_args(args: &[String]) -> Result<(Command, RelativePathBuf)> {
    let (command, rest) = match args {
        [cmd, rest @ ..] if cmd == "roundtrip" => (Command::Roundtrip, rest),
        [cmd, rest @ ..] if cmd == "tasks" => (Command::Tasks, rest),
        [cmd, rest @ ..] if cmd == "footnotes" => (Command::Footnotes, rest),
        [cmd, rest @ ..] if cmd == "links" => (Command::Links, rest),
        [cmd, n, rest @ ..] if cmd == "toggle" => {
            let n: usize = n.parse().with_context(|| format!("invalid task number '{n}'"))?;
            if n == 0 {
                bail!("task numbers start at 1");
            }
            (Command::Toggle(n), rest)
        }
        _ => bail!("{USAGE}"),
    };
    match rest {
        [note] => Ok((command, RelativePathBuf::from(note.as_str()))),
        _ => bail!("{USAGE}"),
    }
}

/// Config-file settings layered over the editor defaults.
fn editor_config(settings: &EditorSettings) -> EditorConfig {
    let defaults = EditorConfig::default();
    EditorConfig {
        hover_show_delay_ms: settings
            .hover_show_delay_ms
            .unwrap_or(defaults.hover_show_delay_ms),
        hover_hide_delay_ms: settings
            .hover_hide_delay_ms
            .unwrap_or(defaults.hover_hide_delay_ms),
        checkbox_hit_width: settings
            .checkbox_hit_width
            .unwrap_or(defaults.checkbox_hit_width),
        autolink: settings.autolink.unwrap_or(defaults.autolink),
        mapping_history: settings.mapping_history.unwrap_or(defaults.mapping_history),
    }
}

fn run(command: Command, note: &RelativePathBuf, notes_path: &Path, config: EditorConfig) -> Result<()> {
    let source = io::read_note(note, notes_path)?;
    let mut editor = Editor::from_markdown(&source, config);

    match command {
        Command::Roundtrip => {
            let output = editor.to_markdown();
            if output == source {
                println!("{note}: unchanged");
            } else {
                io::write_note(note, notes_path, &output)?;
                println!("{note}: normalized");
            }
        }
        Command::Tasks => {
            for (i, task) in task_items(editor.doc()).iter().enumerate() {
                let mark = if task.checked { 'x' } else { ' ' };
                println!("{:>3}. [{mark}] {}", i + 1, task.text);
            }
        }
        Command::Toggle(n) => {
            let tasks = task_items(editor.doc());
            let Some(task) = tasks.get(n - 1) else {
                bail!("{note} has {} task(s), no task {n}", tasks.len());
            };
            editor.toggle_task(task.pos)?;
            io::save_note(note, notes_path, &editor)?;
            let mark = if task.checked { ' ' } else { 'x' };
            println!("[{mark}] {}", task.text);
        }
        Command::Footnotes => {
            let inventory = markdown::footnotes(editor.doc());
            for entry in &inventory.references {
                println!("ref  [^{}] at {}", entry.id, entry.pos);
            }
            for entry in &inventory.definitions {
                println!("def  [^{}] at {}", entry.id, entry.pos);
            }
            for entry in inventory.undefined() {
                println!("warning: [^{}] is referenced but never defined", entry.id);
            }
            for entry in inventory.unreferenced() {
                println!("warning: [^{}] is defined but never referenced", entry.id);
            }
        }
        Command::Links => {
            for link in links(editor.doc()) {
                println!("{} -> {}", link.text, link.href);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (command, note) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let config_path = Config::config_path();
    let (notes_path, settings) = match Config::load()? {
        Some(config) => {
            log::info!("Loaded notes path from config: {}", config.notes_path.display());
            (config.notes_path, config.editor)
        }
        None => {
            log::info!(
                "No config file at {}, using the current directory",
                config_path.display()
            );
            (env::current_dir()?, EditorSettings::default())
        }
    };
    io::validate_notes_dir(&notes_path)?;

    run(command, &note, &notes_path, editor_config(&settings))
}
