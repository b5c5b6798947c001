use std::fmt::Display;
use std::process;
use std::str::FromStr;

use anyhow::Context;
use itertools::Itertools;
use serde::Serialize;

use formlang::grammar::generation::Generator;
use formlang::grammar::parse_grammar;

use crate::configuration::{load_config, Config, ConfigReadError, OutputFormat};

mod configuration;

const CONFIG_PATH: &str = "formlang.toml";

const USAGE: &str = "usage: formlang <normalize|read|variables|regex|sample> <file>";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Command {
    Normalize,
    Read,
    Variables,
    Regex,
    Sample,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normalize" => Ok(Command::Normalize),
            "read" => Ok(Command::Read),
            "variables" => Ok(Command::Variables),
            "regex" => Ok(Command::Regex),
            "sample" => Ok(Command::Sample),
            other => Err(format!("unknown command `{other}`")),
        }
    }
}

fn render<T: Serialize + Display>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("failed to serialize result")
        }
        OutputFormat::Text => Ok(value.to_string()),
    }
}

fn sample(content: &str, config: &Config) -> anyhow::Result<String> {
    let grammar = parse_grammar(content, &config.grammar)?;
    let generator = Generator::new(grammar, config.sample.depth_limit);

    let words: Vec<Vec<String>> = (0..config.sample.count)
        .map_while(|_| generator.generate())
        .map(|sample| sample.word)
        .collect();

    if words.is_empty() && config.sample.count > 0 {
        anyhow::bail!(
            "no word has a derivation within depth {}",
            config.sample.depth_limit
        );
    }

    match config.output.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&words)?),
        OutputFormat::Text => Ok(words.iter().map(|word| word.join(" ")).join("\n")),
    }
}

fn run(command: Command, content: &str, config: &Config) -> anyhow::Result<String> {
    let format = config.output.format;

    match command {
        Command::Normalize => render(
            &formlang::normalize_cfg_with(content, &config.grammar)?,
            format,
        ),
        Command::Read => render(&formlang::read_cfg_with(content, &config.grammar)?, format),
        Command::Variables => render(
            &formlang::normalize_cfg_with_variables_with(content, &config.grammar)?,
            format,
        ),
        Command::Regex => render(&formlang::compile_regex(content.trim())?, format),
        Command::Sample => sample(content, config),
    }
}

fn main() {
    let config = match load_config(CONFIG_PATH) {
        Ok(config) => config,
        Err(ConfigReadError::ReadError(e)) => {
            eprintln!("failed to read {CONFIG_PATH}: {e}");
            process::exit(exitcode::IOERR)
        }

        Err(ConfigReadError::ParseError(e)) => {
            eprintln!("{e}");
            process::exit(exitcode::CONFIG)
        }
    };

    let args = std::env::args().skip(1).collect_vec();
    let (command, path) = match args.as_slice() {
        [command, path] => match command.parse::<Command>() {
            Ok(command) => (command, path),
            Err(e) => {
                eprintln!("{e}");
                eprintln!("{USAGE}");
                process::exit(exitcode::USAGE)
            }
        },
        _ => {
            eprintln!("{USAGE}");
            process::exit(exitcode::USAGE)
        }
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("error reading {path}: {e}");
            process::exit(exitcode::IOERR);
        }
    };

    let result = run(command, &content, &config);

    if config.verbose {
        for message in formlang::log::pull_messages(128) {
            eprintln!("{message}");
        }
    }

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(exitcode::DATAERR)
        }
    }
}
