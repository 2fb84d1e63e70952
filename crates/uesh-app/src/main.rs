//! UESH interactive entry point.
//!
//! Reads the configuration named by `UESH_CONFIG`, runs an optional script
//! given as the first argument, then prompts on stdin until `exit` at the
//! root shell or end of input.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use uesh_shell::{InputSource, LineReport, ShellEnvironment};
use uesh_types::{UeshConfig, UeshError};

/// Line input from the terminal.
struct StdinInput {
    stdin: io::Stdin,
}

impl InputSource for StdinInput {
    fn read_line(&mut self, prompt: &str) -> uesh_types::Result<Option<String>> {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        let mut line = String::new();
        if self.stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

fn load_config() -> Result<UeshConfig> {
    match std::env::var_os("UESH_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            UeshConfig::load(&path).with_context(|| format!("loading {}", path.display()))
        },
        None => Ok(UeshConfig::default()),
    }
}

fn print_fault(fault: &UeshError) {
    eprintln!("{fault}");
    if let UeshError::InsufficientArguments { usages, .. } = fault {
        for usage in usages {
            eprintln!("  usage: {usage}");
        }
    }
}

fn show(report: &LineReport) {
    for command in &report.commands {
        for line in &command.output {
            println!("{line}");
        }
        if let Some(fault) = &command.fault {
            print_fault(fault);
        }
    }
}

fn run_script(env: &mut ShellEnvironment, path: &Path) -> Result<()> {
    let report = env
        .run_script(path)
        .with_context(|| format!("running {}", path.display()))?;
    show(&report);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = load_config()?;
    log::info!("starting UESH as {}@{}", config.user.name, config.hostname);
    let input = StdinInput { stdin: io::stdin() };
    let mut env = ShellEnvironment::new(config, Box::new(input))?;

    if let Some(script) = std::env::args_os().nth(1) {
        run_script(&mut env, Path::new(&script))?;
    }

    while !env.is_shutdown() {
        let Some(line) = env.read_line()? else {
            println!();
            break;
        };
        match env.execute_line(&line) {
            Ok(report) => show(&report),
            Err(e) if e.is_fatal() => {
                env.close_editors();
                return Err(e.into());
            },
            Err(e) => print_fault(&e),
        }
    }

    env.close_editors();
    log::info!("UESH stopped");
    Ok(())
}
