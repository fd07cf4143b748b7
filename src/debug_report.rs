use squarehunt::{DryRun, ItemMatch, PassError, PassOutcome, PassReport};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// Output of `squarehunt match` without a fixture: one line per item name.
pub fn print_matches(text: &str, item_names: &[String], matches: &[ItemMatch], color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Matching: \"{}\"", text), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Items ━━━", ansi::GRAY));
    for (idx, name) in item_names.iter().enumerate() {
        let hit = matches.iter().find(|m| m.item_id == idx as i64);
        print_item_line(idx, name, hit, &palette);
    }

    if matches.is_empty() {
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • The item name is spelled differently in game text (add a synonym rule)");
        println!("  • The category has no table entry for this drop (extend [tables.categories])");
        println!("  • An exclusion rule rejected the only matching term");
        println!("\n{}", palette.dim("  Tip: Set RUST_LOG=squarehunt::rules=trace to see every term tried"));
    }
    println!();
}

/// Output of `squarehunt match --fixture`.
pub fn print_dry_run(text: &str, dry: &DryRun, color: bool) {
    let palette = ansi::Palette::new(color);
    println!(
        "\n{}",
        palette.bold(palette.paint(format!("⚙  Dry run for {}: \"{}\"", dry.actor, text), ansi::CYAN))
    );

    println!("\n{}", palette.paint("━━━ Eligible boards ━━━", ansi::GRAY));
    if dry.eligible_boards.is_empty() {
        println!("{}", palette.dim("  None (inactive, not started, or outside every window)"));
    } else {
        let ids: Vec<String> = dry.eligible_boards.iter().map(|id| id.to_string()).collect();
        println!("  {}", palette.paint(ids.join(", "), ansi::BLUE));
    }

    println!("\n{}", palette.paint("━━━ Matches ━━━", ansi::GRAY));
    if dry.matches.is_empty() {
        println!("{}", palette.dim("  No items matched"));
    }
    for (idx, m) in dry.matches.iter().enumerate() {
        print_item_line(idx, &m.item_name, Some(m), &palette);
    }

    println!("\n{}", palette.paint("━━━ Teams ━━━", ansi::GRAY));
    if dry.teams.is_empty() {
        println!("{}", palette.dim(format!("  {} is not rostered on an eligible board", dry.actor)));
    }
    for team in &dry.teams {
        println!(
            "  {} {} {}",
            palette.paint(&team.team_name, ansi::GREEN),
            palette.dim(format!("(board {})", team.board_id)),
            palette.dim(format!("credit {:?}", team.credit)),
        );
    }

    let pairs = dry.pairs();
    println!("\n  {} would be recorded", palette.bold(format!("{} completion(s)", pairs.len())));
    println!();
}

/// One line per pass of `squarehunt replay` / `squarehunt watch`.
pub fn print_outcome(pass: usize, outcome: &PassOutcome, color: bool) {
    let palette = ansi::Palette::new(color);
    let label = palette.paint(format!("Pass {}:", pass), ansi::BLUE);
    match outcome {
        PassOutcome::Skipped => println!("  {} {}", label, palette.dim("skipped (previous pass still running)")),
        PassOutcome::NoLiveBoards => println!("  {} {}", label, palette.dim("no live boards")),
        PassOutcome::Failed(e) => println!("  {} {}", label, palette.paint(format!("✗ {e}"), ansi::RED)),
        PassOutcome::Completed(report) => {
            println!("  {} {}", label, summary_line(report, &palette));
            print_report(report, &palette);
        }
    }
}

fn summary_line(report: &PassReport, palette: &ansi::Palette) -> String {
    let summary = report.summary();
    if report.errors.is_empty() {
        palette.paint(format!("✓ {summary}"), ansi::GREEN)
    } else {
        palette.paint(format!("! {summary}"), ansi::YELLOW)
    }
}

fn print_report(report: &PassReport, palette: &ansi::Palette) {
    println!(
        "    {} {}  {} {}  {} {}",
        palette.dim("fetched:"),
        palette.paint(report.activities_fetched.to_string(), ansi::YELLOW),
        palette.dim("in window:"),
        palette.paint(report.activities_considered.to_string(), ansi::YELLOW),
        palette.dim("already complete:"),
        palette.paint(report.already_complete.to_string(), ansi::YELLOW),
    );
    for completion in &report.completions {
        println!(
            "    {} item {} → team {} {}",
            palette.paint("+", ansi::GREEN),
            palette.bold(completion.item_id.to_string()),
            palette.bold(completion.team_id.to_string()),
            palette.dim(format!("\"{}\"", completion.evidence)),
        );
    }
    for error in &report.errors {
        let color = match error {
            PassError::Fetch { .. } => ansi::YELLOW,
            PassError::Activity { .. } | PassError::Commit { .. } => ansi::RED,
        };
        println!("    {} {}", palette.paint("✗", color), palette.dim(error.to_string()));
    }
    let m = &report.metrics;
    println!(
        "    Total: {}  │  Config: {}  │  Fetch: {}  │  Match: {}  │  Commit: {}",
        palette.paint(format!("{:?}", m.total), ansi::GREEN),
        palette.dim(format!("{:?}", m.config)),
        palette.paint(format!("{:?}", m.fetch), ansi::CYAN),
        palette.dim(format!("{:?}", m.matching)),
        palette.dim(format!("{:?}", m.commit)),
    );
}

fn print_item_line(idx: usize, name: &str, hit: Option<&ItemMatch>, palette: &ansi::Palette) {
    match hit {
        Some(m) => println!(
            "  {} {} {} {}",
            palette.paint(format!("[{}]", idx), ansi::GRAY),
            palette.bold(palette.paint(name, ansi::GREEN)),
            palette.dim("│"),
            palette.paint(m.reason.to_string(), ansi::YELLOW),
        ),
        None => println!(
            "  {} {} {} {}",
            palette.paint(format!("[{}]", idx), ansi::GRAY),
            palette.dim(name),
            palette.dim("│"),
            palette.dim("no match"),
        ),
    }
}
