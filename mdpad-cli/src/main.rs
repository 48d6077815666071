// Command-line interface for mdpad
//
// This binary drives the same editor session the GUI uses, against an on-disk store, so the
// whole document pipeline can be scripted: edit, import, render, export.
//
// State (the document text and the zoom levels) lives in <state-dir>/state.json. The state
// directory comes from --state-dir, then the `storage.state_dir` config key, then the
// platform data directory.
//
// Usage:
//  mdpad show                                  - Print the current document
//  mdpad set <file|->                          - Replace the document with a file (or stdin)
//  mdpad import <file>                         - Import a .md/.markdown/.txt/.docx file
//  mdpad render [input] [-o out.html]          - Render to a standalone HTML page
//  mdpad export [-o dir] [--format pdf|html|md] [--plan] [--fullscreen]
//                                              - Export documento.pdf (or .html/.md)
//  mdpad zoom <editor|preview> <in|out|reset|show>
//  mdpad clear [--yes]                         - Empty the document after confirmation
//  mdpad stats                                 - Word, character and line counts
//
// Logging goes to stderr and is controlled by MDPAD_LOG (default "warn").

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use mdpad_config::{Loader, MdpadConfig};
use mdpad_core::export::backend::ChromeBackend;
use mdpad_core::export::{DirectorySink, ExportOutcome, ExportSettings, Exporter};
use mdpad_core::render::{standalone_html, Pipeline, RenderOptions};
use mdpad_core::session::{EditorSession, Prompt, SessionSettings};
use mdpad_core::store::FileStore;
use mdpad_core::zoom::{ZoomDirection, ZoomTarget};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MDPAD_LOG";

fn build_cli() -> Command {
    Command::new("mdpad")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Edit, render and export Markdown documents")
        .long_about(
            "mdpad keeps one Markdown document and its view preferences in a state\n\
            directory and runs it through the editor pipeline.\n\n\
            Examples:\n  \
            mdpad import notes.docx             # Replace the document with a Word file\n  \
            mdpad render -o preview.html        # Render the current document\n  \
            mdpad export -o out/                # Write out/documento.pdf\n  \
            mdpad export --plan                 # Show how the document would paginate",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to an mdpad.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("state-dir")
                .long("state-dir")
                .value_name("DIR")
                .help("Directory holding the document state")
                .value_hint(ValueHint::DirPath)
                .global(true),
        )
        .subcommand(Command::new("show").about("Print the current document"))
        .subcommand(
            Command::new("set")
                .about("Replace the document with the contents of a file ('-' reads stdin)")
                .arg(
                    Arg::new("file")
                        .help("File to read, or '-' for stdin")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import a .md, .markdown, .txt or .docx file")
                .arg(
                    Arg::new("file")
                        .help("File to import")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Render Markdown to a standalone HTML page")
                .arg(
                    Arg::new("input")
                        .help("Markdown file to render (defaults to the current document)")
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export the current document to documento.pdf")
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("DIR")
                        .help("Directory receiving documento.pdf")
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Artifact to write: the PDF, the preview page or the raw text")
                        .value_parser(["pdf", "html", "md"])
                        .default_value("pdf"),
                )
                .arg(
                    Arg::new("plan")
                        .long("plan")
                        .help("Print the page plan instead of writing a PDF")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("fullscreen")
                        .long("fullscreen")
                        .help("Capture the fullscreen view instead of the preview")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("zoom")
                .about("Change or show the zoom of a pane")
                .arg(
                    Arg::new("target")
                        .help("Pane to zoom")
                        .required(true)
                        .index(1)
                        .value_parser(["editor", "preview"]),
                )
                .arg(
                    Arg::new("action")
                        .help("Zoom action")
                        .required(true)
                        .index(2)
                        .value_parser(["in", "out", "reset", "show"]),
                ),
        )
        .subcommand(
            Command::new("clear")
                .about("Empty the document")
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .short('y')
                        .help("Do not ask for confirmation")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("stats").about("Print word, character and line counts"))
}

/// Prompts on the terminal: questions on stderr, answers from stdin.
struct TerminalPrompt {
    assume_yes: bool,
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{message} [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }

    fn alert(&self, message: &str) {
        eprintln!("Error: {message}");
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let matches = build_cli().get_matches();
    let config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));
    let state_dir = resolve_state_dir(
        matches.get_one::<String>("state-dir").map(PathBuf::from),
        &config,
    );

    match matches.subcommand() {
        Some(("show", _)) => {
            let session = open_session(&config, &state_dir, None, false);
            print!("{}", session.text());
        }
        Some(("set", sub_matches)) => {
            let file = required(sub_matches, "file");
            handle_set_command(&config, &state_dir, file);
        }
        Some(("import", sub_matches)) => {
            let file = required(sub_matches, "file");
            let mut session = open_session(&config, &state_dir, None, false);
            // The prompt already reported the failure
            if session.import_file(Path::new(file)).await.is_err() {
                std::process::exit(1);
            }
            eprintln!("Imported {file}");
        }
        Some(("render", sub_matches)) => {
            let input = sub_matches.get_one::<String>("input").map(|s| s.as_str());
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_render_command(&config, &state_dir, input, output);
        }
        Some(("export", sub_matches)) => {
            let output = sub_matches
                .get_one::<String>("output")
                .map(PathBuf::from)
                .or_else(|| config.export.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let format = sub_matches
                .get_one::<String>("format")
                .map(|s| s.as_str())
                .unwrap_or("pdf");
            let plan = sub_matches.get_flag("plan");
            let fullscreen = sub_matches.get_flag("fullscreen");
            if format == "pdf" {
                handle_export_command(&config, &state_dir, &output, plan, fullscreen).await;
            } else {
                handle_export_side_command(&config, &state_dir, &output, format).await;
            }
        }
        Some(("zoom", sub_matches)) => {
            let target = match required(sub_matches, "target") {
                "editor" => ZoomTarget::Editor,
                _ => ZoomTarget::Preview,
            };
            let action = required(sub_matches, "action");
            let mut session = open_session(&config, &state_dir, None, false);
            let value = match action {
                "in" => session.adjust_zoom(target, ZoomDirection::In),
                "out" => session.adjust_zoom(target, ZoomDirection::Out),
                "reset" => session.reset_zoom(target),
                _ => session.zoom(target),
            };
            println!("{value}");
        }
        Some(("clear", sub_matches)) => {
            let assume_yes = sub_matches.get_flag("yes");
            let mut session = open_session(&config, &state_dir, None, assume_yes);
            if session.clear() {
                eprintln!("Document cleared");
            } else {
                eprintln!("Nothing changed");
            }
        }
        Some(("stats", _)) => {
            let session = open_session(&config, &state_dir, None, false);
            let stats = session.stats();
            println!("words: {}", stats.words);
            println!("characters: {}", stats.characters);
            println!("lines: {}", stats.lines);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    match matches.get_one::<String>(name) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: missing <{name}>");
            std::process::exit(2);
        }
    }
}

fn load_cli_config(explicit_path: Option<&str>) -> MdpadConfig {
    let loader = Loader::new().with_optional_file("mdpad.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

fn resolve_state_dir(explicit: Option<PathBuf>, config: &MdpadConfig) -> PathBuf {
    explicit
        .or_else(|| config.storage.state_dir.clone())
        .or_else(|| dirs::data_dir().map(|dir| dir.join("mdpad")))
        .unwrap_or_else(|| PathBuf::from(".mdpad"))
}

fn build_exporter(config: &MdpadConfig, output_dir: &Path) -> Exporter {
    let backend = match &config.export.chrome_binary {
        Some(path) => ChromeBackend::with_binary(path),
        None => ChromeBackend::new(),
    };
    Exporter::new(
        Arc::new(backend),
        Arc::new(DirectorySink::new(output_dir)),
        ExportSettings::from(&config.export),
    )
}

fn open_session(
    config: &MdpadConfig,
    state_dir: &Path,
    output_dir: Option<&Path>,
    assume_yes: bool,
) -> EditorSession {
    let store = FileStore::open(state_dir.join(&config.storage.file_name));
    tracing::debug!(path = %store.path().display(), "opening state");

    let exporter = build_exporter(config, output_dir.unwrap_or(Path::new(".")));
    EditorSession::open(
        Arc::new(store),
        Arc::new(TerminalPrompt { assume_yes }),
        Arc::new(exporter),
        SessionSettings::from(config),
    )
}

fn handle_set_command(config: &MdpadConfig, state_dir: &Path, file: &str) {
    let text = if file == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).unwrap_or_else(|e| {
            eprintln!("Error reading stdin: {e}");
            std::process::exit(1);
        });
        text
    } else {
        fs::read_to_string(file).unwrap_or_else(|e| {
            eprintln!("Error reading file '{file}': {e}");
            std::process::exit(1);
        })
    };

    let mut session = open_session(config, state_dir, None, false);
    session.set_text(text);
}

fn handle_render_command(
    config: &MdpadConfig,
    state_dir: &Path,
    input: Option<&str>,
    output: Option<&str>,
) {
    let source = match input {
        Some(path) => fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Error reading file '{path}': {e}");
            std::process::exit(1);
        }),
        None => open_session(config, state_dir, None, false).text().to_string(),
    };

    let pipeline = Pipeline::new(RenderOptions::from(&config.render));
    let rendered = pipeline.render(&source).unwrap_or_else(|e| {
        eprintln!("Render error: {e}");
        std::process::exit(1);
    });

    let title = input
        .and_then(|p| Path::new(p).file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "documento".to_string());
    let page = standalone_html(&rendered.html, &title, None);

    match output {
        Some(path) => fs::write(path, page).unwrap_or_else(|e| {
            eprintln!("Error writing file '{path}': {e}");
            std::process::exit(1);
        }),
        None => print!("{page}"),
    }
}

async fn handle_export_side_command(
    config: &MdpadConfig,
    state_dir: &Path,
    output_dir: &Path,
    format: &str,
) {
    let session = open_session(config, state_dir, Some(output_dir), false);
    let exporter = session.exporter();
    let result = match format {
        "html" => exporter.export_html(session.rendered()).await,
        _ => exporter.export_markdown(session.text()).await,
    };

    match result {
        Ok(artifact) => {
            println!("{}", artifact.path.display());
            eprintln!("Exported {} bytes", artifact.bytes);
        }
        Err(e) => {
            eprintln!("Export error: {e}");
            std::process::exit(1);
        }
    }
}

async fn handle_export_command(
    config: &MdpadConfig,
    state_dir: &Path,
    output_dir: &Path,
    plan_only: bool,
    fullscreen: bool,
) {
    let mut session = open_session(config, state_dir, Some(output_dir), false);
    if fullscreen {
        session.toggle_fullscreen();
    }

    if plan_only {
        let plan = session
            .exporter()
            .prepare(session.rendered())
            .unwrap_or_else(|e| {
                eprintln!("Export error: {e}");
                std::process::exit(1);
            });
        println!("{}", plan.pages);
        return;
    }

    match session.export_pdf().await {
        Ok(ExportOutcome::Saved(artifact)) => {
            println!("{}", artifact.path.display());
            eprintln!(
                "Exported {} page(s), {} bytes",
                artifact.planned_pages, artifact.bytes
            );
        }
        Ok(ExportOutcome::Ignored) => {
            eprintln!("An export is already running");
        }
        // The prompt already reported the failure
        Err(_) => std::process::exit(1),
    }
}
