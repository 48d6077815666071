use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of build_cli() in src/main.rs, reduced to what completions need.
// Build scripts can't access src/ modules.
fn completion_cli() -> Command {
    let file_arg = |help: &'static str| {
        Arg::new("file")
            .help(help)
            .required(true)
            .index(1)
            .value_hint(ValueHint::FilePath)
    };

    Command::new("mdpad")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Edit, render and export Markdown documents")
        .arg(
            Arg::new("config")
                .long("config")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("state-dir")
                .long("state-dir")
                .value_hint(ValueHint::DirPath)
                .global(true),
        )
        .subcommand(Command::new("show"))
        .subcommand(Command::new("set").arg(file_arg("File to read, or '-' for stdin")))
        .subcommand(Command::new("import").arg(file_arg("File to import")))
        .subcommand(
            Command::new("render")
                .arg(Arg::new("input").index(1).value_hint(ValueHint::FilePath))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("export")
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(["pdf", "html", "md"]),
                )
                .arg(Arg::new("plan").long("plan").action(ArgAction::SetTrue))
                .arg(
                    Arg::new("fullscreen")
                        .long("fullscreen")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("zoom")
                .arg(
                    Arg::new("target")
                        .index(1)
                        .value_parser(["editor", "preview"]),
                )
                .arg(
                    Arg::new("action")
                        .index(2)
                        .value_parser(["in", "out", "reset", "show"]),
                ),
        )
        .subcommand(
            Command::new("clear").arg(
                Arg::new("yes")
                    .long("yes")
                    .short('y')
                    .action(ArgAction::SetTrue),
            ),
        )
        .subcommand(Command::new("stats"))
}

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = completion_cli();

    generate_to(Bash, &mut cmd, "mdpad", &outdir)?;
    generate_to(Zsh, &mut cmd, "mdpad", &outdir)?;
    generate_to(Fish, &mut cmd, "mdpad", &outdir)?;

    Ok(())
}
