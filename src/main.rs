mod debug_report;

use dotchart::{Grammar, GrammarOptions, Lattice, MemoryGrammar, Options, Vocabulary, parse_verbose_with};
use std::io::{self, IsTerminal, Read};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

struct CliConfig {
    input: String,
    grammar_files: Vec<String>,
    goal: String,
    plf: bool,
    grammar_options: GrammarOptions,
    color: bool,
}

fn run(config: &CliConfig) -> Result<(), String> {
    let vocab = Vocabulary::new();
    let mut grammars = Vec::with_capacity(config.grammar_files.len());
    for path in &config.grammar_files {
        let text = std::fs::read_to_string(path).map_err(|err| format!("failed to read grammar '{path}': {err}"))?;
        let grammar =
            MemoryGrammar::from_text(&text, &vocab, config.grammar_options).map_err(|err| format!("{path}: {err}"))?;
        tracing::debug!(path = %path, rules = grammar.rule_count(), "loaded grammar");
        grammars.push(grammar);
    }

    let lattice = if config.plf {
        Lattice::from_plf(config.input.trim(), &vocab).map_err(|err| err.to_string())?
    } else {
        let words: Vec<_> = config.input.split_whitespace().map(|w| vocab.terminal_id(w)).collect();
        Lattice::from_sentence(&words)
    };

    let grammar_refs: Vec<&dyn Grammar> = grammars.iter().map(|g| g as &dyn Grammar).collect();
    let options = Options { goal: config.goal.clone() };
    let res = parse_verbose_with(&lattice, &grammar_refs, &vocab, &options).map_err(|err| err.to_string())?;
    debug_report::print_run(&config.input, &config.goal, &res, config.color);
    Ok(())
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut grammar_files = Vec::new();
    let mut goal = Options::default().goal;
    let mut plf = false;
    let mut grammar_options = GrammarOptions::default();
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("dotchart {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--plf" => plf = true,
            "--regex" => grammar_options.regex_matching = true,
            "--grammar" | "-g" => {
                let value = args.next().ok_or_else(|| "error: --grammar expects a file".to_string())?;
                grammar_files.push(value);
            }
            "--goal" => {
                goal = args.next().ok_or_else(|| "error: --goal expects a symbol".to_string())?;
            }
            "--span-limit" => {
                let value = args.next().ok_or_else(|| "error: --span-limit expects a value".to_string())?;
                grammar_options.span_limit = parse_span_limit(&value)?;
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--grammar=") => {
                grammar_files.push(arg.trim_start_matches("--grammar=").to_string());
            }
            _ if arg.starts_with("--goal=") => {
                goal = arg.trim_start_matches("--goal=").to_string();
            }
            _ if arg.starts_with("--span-limit=") => {
                grammar_options.span_limit = parse_span_limit(arg.trim_start_matches("--span-limit="))?;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                input = Some(rest);
                break;
            }
        }
    }

    if grammar_files.is_empty() {
        return Err(format!("error: at least one --grammar is required\n\n{}", help_text()));
    }
    if !dotchart::vocab::is_nonterminal_label(&goal) {
        return Err(format!("error: invalid --goal '{goal}' (expected a bracketed nonterminal like [S])"));
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, grammar_files, goal, plf, grammar_options, color })
}

fn parse_span_limit(value: &str) -> Result<Option<usize>, String> {
    if value == "none" {
        return Ok(None);
    }
    value
        .parse::<usize>()
        .map(Some)
        .map_err(|_| format!("error: invalid --span-limit '{value}' (expected a number or 'none')"))
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "dotchart {version}

Chart parser with on-the-fly rule binarization.

Usage:
  dotchart --grammar <file> [OPTIONS] [--] <sentence...>
  echo '<plf>' | dotchart --grammar <file> --plf

Options:
  -g, --grammar <file>       Rule file (`[LHS] ||| source ||| target` per line).
                             Repeat to parse with several grammars.
  --goal <symbol>            Symbol that must cover the input. Default: [S]
  --plf                      Read the input as a lattice in PLF.
  --span-limit <n|none>      Longest path a rule may cover. Default: {span_limit}
  --regex                    Match terminal rule labels as regular expressions.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Input is taken from the remaining args, or stdin when none are given.
Set RUST_LOG=dotchart=debug to trace chart expansion.

Exit codes:
  0  Success.
  1  Grammar, lattice or parse error.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        span_limit = dotchart::grammar::DEFAULT_SPAN_LIMIT
    )
}
