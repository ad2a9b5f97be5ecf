mod builtins;
mod config;
mod env;
mod error;
mod eval;
mod highlighter;
mod loader;
mod location;
mod parser;
mod plugin_api;
mod pool;
mod special_forms;
mod tokenizer;
mod value;

use clap::Parser;
use config::{
    FILE_MODE_GC_INTERVAL, REPL_CONTINUATION_PROMPT, REPL_PROMPT, WELCOME_FOOTER, WELCOME_MESSAGE,
    WELCOME_SUBTITLE,
};
use highlighter::LispHelper;
use parser::{parens_are_balanced, parse_all};
use pool::Pool;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;

/// A tree-walking Scheme-family interpreter.
#[derive(Parser, Debug)]
#[command(name = "tree-lisp")]
#[command(version = config::VERSION)]
#[command(about = "A tree-walking Scheme-family interpreter")]
struct CliArgs {
    /// Script file to execute. With no file, starts the REPL.
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() {
    let args = CliArgs::parse();
    let mut pool = Pool::new();
    let root = pool.root();

    let exit_code = match args.script {
        Some(path) => run_file(&mut pool, root, &path),
        None => {
            run_repl(&mut pool, root);
            0
        }
    };
    std::process::exit(exit_code);
}

/// Read the whole file, parse every top-level form, and evaluate each in turn.
/// Exits 0 on success, 1 printing the diagnostic from spec on error.
fn run_file(pool: &mut Pool, root: value::EnvHandle, path: &PathBuf) -> i32 {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Cannot read {}: {e}", path.display());
            return 1;
        }
    };
    let file_name = path.display().to_string();
    let forms = match parse_all(pool, &contents, &file_name) {
        Ok(forms) => forms,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    for (i, form) in forms.iter().enumerate() {
        if let Err(e) = eval::eval(pool, root, *form) {
            eprintln!("{e}");
            return 1;
        }
        if (i + 1) % FILE_MODE_GC_INTERVAL == 0 {
            pool.gc();
        }
    }
    0
}

fn run_repl(pool: &mut Pool, root: value::EnvHandle) {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl = match Editor::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize REPL: {e}");
            return;
        }
    };
    rl.set_helper(Some(LispHelper::new()));

    let history_file = ".tree_lisp_history";
    let _ = rl.load_history(history_file);

    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");
    println!("{WELCOME_FOOTER}");

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { REPL_PROMPT } else { REPL_CONTINUATION_PROMPT };
        match rl.readline(prompt) {
            Ok(line) => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);

                if buffer.trim().is_empty() {
                    buffer.clear();
                    continue;
                }
                if !parens_are_balanced(&buffer) {
                    continue;
                }

                match parse_all(pool, &buffer, "<repl>") {
                    Ok(forms) => {
                        for form in forms {
                            match eval::eval(pool, root, form) {
                                Ok(result) => println!("{}", pool.display(result)),
                                Err(e) => eprintln!("{e}"),
                            }
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                }
                pool.gc();
                buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("{e}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
}

