mod debug_report;

use std::io::{self, IsTerminal, Read};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_english::{Dialect, parse_date_string};
use squarehunt::{
    Activity, Engine, EngineConfig, Fixture, InMemoryActivitySource, InMemoryBoardStore, Item, PassOutcome, match_text,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_ACTOR: &str = "cli";

type FixtureEngine = Engine<InMemoryBoardStore, InMemoryActivitySource>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("squarehunt=info")))
        .with_writer(io::stderr)
        .init();

    let command = match parse_args() {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(command).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

enum Command {
    Match(MatchArgs),
    Replay(RunArgs),
    Watch(RunArgs),
}

struct MatchArgs {
    text: String,
    items: Vec<String>,
    fixture: Option<String>,
    actor: String,
    now: Option<DateTime<Utc>>,
    color: bool,
}

struct RunArgs {
    fixture: String,
    config: Option<String>,
    now: Option<DateTime<Utc>>,
    passes: usize,
    interval: Option<Duration>,
    color: bool,
}

async fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Match(args) => run_match(args).await,
        Command::Replay(args) => run_replay(args).await,
        Command::Watch(args) => run_watch(args).await,
    }
}

async fn run_match(args: MatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    match &args.fixture {
        Some(path) => {
            let fixture = Fixture::load(path)?;
            let now = args.now.or(fixture.now).unwrap_or_else(Utc::now);
            let (store, source) = fixture.into_backends();
            let engine = Engine::new(Arc::new(store), Arc::new(source), EngineConfig::default());
            let activity = Activity::new(args.actor.as_str(), now.timestamp_millis(), args.text.as_str());
            let dry = engine.dry_run_at(&activity, now).await?;
            debug_report::print_dry_run(&args.text, &dry, args.color);
        }
        None => {
            let items: Vec<Item> = args
                .items
                .iter()
                .enumerate()
                .map(|(idx, name)| Item { id: idx as i64, board_id: 0, name: name.clone(), game_object_id: None })
                .collect();
            let matches = match_text(&args.text, &items);
            debug_report::print_matches(&args.text, &args.items, &matches, args.color);
        }
    }
    Ok(())
}

fn build_engine(args: &RunArgs) -> Result<(FixtureEngine, DateTime<Utc>), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let fixture = Fixture::load(&args.fixture)?;
    let now = args.now.or(fixture.now).unwrap_or_else(Utc::now);
    let (store, source) = fixture.into_backends();
    Ok((Engine::new(Arc::new(store), Arc::new(source.with_reference_time(now)), config), now))
}

async fn run_replay(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, now) = build_engine(&args)?;
    println!("Replaying {} at {}", args.fixture, now.to_rfc3339());
    for pass in 1..=args.passes {
        let outcome = engine.process_activities_at(now).await;
        debug_report::print_outcome(pass, &outcome, args.color);
        if let PassOutcome::Failed(e) = outcome {
            return Err(e.into());
        }
    }
    Ok(())
}

async fn run_watch(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, _) = build_engine(&args)?;
    let engine = Arc::new(engine);
    let interval = args.interval.unwrap_or_else(|| engine.config().poll_interval());
    let color = args.color;

    let mut pass = 0;
    let handle = engine.spawn_polling_with(interval, move |outcome| {
        pass += 1;
        debug_report::print_outcome(pass, &outcome, color);
    });

    tokio::signal::ctrl_c().await?;
    handle.stop().await;
    Ok(())
}

fn parse_args() -> Result<Command, String> {
    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        return Err(format!("error: no command given\n\n{}", help_text()));
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "-h" | "--help" | "help" => {
            print_help();
            std::process::exit(0);
        }
        "-V" | "--version" => {
            println!("squarehunt {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
        "match" => parse_match(rest).map(Command::Match),
        "replay" => parse_run(rest, false).map(Command::Replay),
        "watch" => parse_run(rest, true).map(Command::Watch),
        other => Err(format!("error: unknown command '{other}'\n\n{}", help_text())),
    }
}

fn parse_match(rest: Vec<String>) -> Result<MatchArgs, String> {
    let mut text: Option<String> = None;
    let mut items = Vec::new();
    let mut fixture = None;
    let mut actor = DEFAULT_ACTOR.to_string();
    let mut now = None;
    let mut color = io::stdout().is_terminal();
    let mut args = rest.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--color" => color = true,
            "--no-color" => color = false,
            "--item" => items.push(value_of(&mut args, "--item")?),
            "--fixture" => fixture = Some(value_of(&mut args, "--fixture")?),
            "--actor" => actor = value_of(&mut args, "--actor")?,
            "--now" => now = Some(parse_now(&value_of(&mut args, "--now")?)?),
            "--" => {
                let joined = args.by_ref().collect::<Vec<_>>().join(" ");
                set_text(&mut text, joined)?;
                break;
            }
            _ if arg.starts_with("--item=") => items.push(arg.trim_start_matches("--item=").to_string()),
            _ if arg.starts_with("--now=") => now = Some(parse_now(arg.trim_start_matches("--now="))?),
            _ if arg.starts_with('-') => return Err(format!("error: unknown option '{arg}'")),
            _ => {
                let joined = std::iter::once(arg).chain(args.by_ref()).collect::<Vec<_>>().join(" ");
                set_text(&mut text, joined)?;
                break;
            }
        }
    }

    let text = match text {
        Some(value) => value,
        None => read_stdin_input()?,
    };
    if text.trim().is_empty() {
        return Err(format!("error: no activity text provided\n\n{}", help_text()));
    }
    if fixture.is_none() && items.is_empty() {
        return Err("error: match needs --fixture or at least one --item".to_string());
    }

    Ok(MatchArgs { text, items, fixture, actor, now, color })
}

fn parse_run(rest: Vec<String>, watch: bool) -> Result<RunArgs, String> {
    let mut fixture = None;
    let mut config = None;
    let mut now = None;
    let mut passes = 1;
    let mut interval = None;
    let mut color = io::stdout().is_terminal();
    let mut args = rest.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--color" => color = true,
            "--no-color" => color = false,
            "--config" => config = Some(value_of(&mut args, "--config")?),
            "--now" if !watch => now = Some(parse_now(&value_of(&mut args, "--now")?)?),
            "--passes" if !watch => {
                let value = value_of(&mut args, "--passes")?;
                passes = value.parse().map_err(|_| format!("error: invalid --passes '{value}'"))?;
            }
            "--interval" if watch => {
                let value = value_of(&mut args, "--interval")?;
                let secs: u64 = value.parse().map_err(|_| format!("error: invalid --interval '{value}'"))?;
                interval = Some(Duration::from_secs(secs.max(1)));
            }
            _ if arg.starts_with('-') => return Err(format!("error: unknown option '{arg}'")),
            _ => {
                if fixture.is_some() {
                    return Err("error: fixture provided multiple times".to_string());
                }
                fixture = Some(arg);
            }
        }
    }

    let fixture = fixture.ok_or_else(|| format!("error: missing fixture path\n\n{}", help_text()))?;
    Ok(RunArgs { fixture, config, now, passes, interval, color })
}

fn value_of(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("error: {flag} expects a value"))
}

fn set_text(text: &mut Option<String>, value: String) -> Result<(), String> {
    if value.trim().is_empty() {
        return Ok(());
    }
    if text.is_some() {
        return Err("error: input provided multiple times".to_string());
    }
    *text = Some(value);
    Ok(())
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

/// RFC 3339, or an English expression such as "yesterday 18:00" or "last friday".
fn parse_now(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    parse_date_string(value, Utc::now(), Dialect::Uk)
        .map_err(|_| format!("error: invalid --now '{value}' (expected RFC 3339 or a date expression)"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "squarehunt {version}

Clan bingo activity matcher.

Usage:
  squarehunt match --item <name>... [OPTIONS] [--] <text...>
  squarehunt match --fixture <file> [--actor <name>] [--now <time>] [--] <text...>
  squarehunt replay <fixture> [--config <file>] [--now <time>] [--passes <n>]
  squarehunt watch <fixture> [--config <file>] [--interval <secs>]

Commands:
  match     Show which items an activity line satisfies, and why. With --fixture,
            also resolves board windows and teams without committing.
  replay    Run passes over a fixture and print each pass report.
  watch     Poll a fixture on an interval until interrupted.

Options:
  --item <name>          Item name to match against (repeatable).
  --fixture <file>       TOML fixture with boards, items, teams and activities.
  --actor <name>         Actor of the dry-run activity. Default: {default_actor}
  --now <time>           Reference time, RFC 3339 or an English expression.
  --config <file>        Engine configuration (TOML).
  --passes <n>           Number of replay passes. Default: 1
  --interval <secs>      Polling interval for watch. Default: from config
  --color                Force ANSI color output.
  --no-color             Disable ANSI color output.
  -h, --help             Show this help message.
  -V, --version          Print version information.

Environment:
  RUST_LOG               Log filter. Default: squarehunt=info
                         (squarehunt::rules=trace shows every term tried)

Exit codes:
  0  Success.
  1  Pass or I/O failure.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        default_actor = DEFAULT_ACTOR
    )
}
