use dotchart::{Constituent, ParseDetails, ParseResultVerbose};

mod ansi {
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const RED: &str = "\x1b[31m";
    pub const CYAN: &str = "\x1b[36m";
    const GRAY: &str = "\x1b[90m";
    const BOLD: &str = "\x1b[1m";
    const DIM: &str = "\x1b[2m";
    const RESET: &str = "\x1b[0m";

    /// Wraps text in escape codes, or passes it through when color is off.
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
            self.paint(s, BOLD)
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            self.paint(s, DIM)
        }

        /// Section heading, e.g. `━━━ Passes ━━━`.
        pub fn section(&self, title: &str) -> String {
            self.paint(format!("━━━ {title} ━━━"), GRAY)
        }
    }
}

pub fn print_run(input: &str, goal: &str, res: &ParseResultVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    let preview: String = input.trim().chars().take(80).collect();
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Parsing: \"{}\"", preview), ansi::CYAN)));

    println!("\n{}", palette.section("Passes"));
    print_passes(&res.details, &palette);

    println!("\n{}", palette.section("Dot cells"));
    print_dot_cells(&res.details, &palette);

    println!("\n{}", palette.section("Constituents"));
    if res.result.constituents.is_empty() {
        println!("{}", palette.dim("  No constituents built"));
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • No rule's source side matches the input words");
        println!("  • --span-limit is shorter than the rules need");
        println!("\n{}", palette.dim("  Tip: Set RUST_LOG=dotchart=trace to see every dot item"));
    } else {
        for (idx, constituent) in res.result.constituents.iter().enumerate() {
            print_constituent(idx, constituent, &palette);
        }
    }

    println!("\n{}", palette.section("Goal"));
    if res.result.goal_reached {
        println!("  {}", palette.bold(palette.paint(format!("✓ {goal} covers the input"), ansi::GREEN)));
    } else {
        println!("  {}", palette.paint(format!("✗ no {goal} over the whole input"), ansi::RED));
    }

    println!("\n{}", palette.section("Timing"));
    println!(
        "  Total: {}  │  Dot items: {}  │  Seeded: {}",
        palette.paint(format!("{:?}", res.details.total), ansi::GREEN),
        palette.paint(res.result.dot_items.to_string(), ansi::CYAN),
        palette.dim(res.details.seeded.to_string()),
    );
    println!();
}

fn print_passes(details: &ParseDetails, palette: &ansi::Palette) {
    for pass in &details.passes {
        println!(
            "  {} {}  {} {}",
            palette.paint(format!("Width {}:", pass.width), ansi::BLUE),
            if pass.super_nodes > 0 {
                palette.paint(format!("✓ {} super nodes", pass.super_nodes), ansi::GREEN)
            } else {
                palette.dim(format!("✗ {} super nodes", pass.super_nodes))
            },
            palette.dim(format!("{} dot items, {} derivations", pass.dot_items, pass.derivations)),
            palette.dim(format!("{:?}", pass.duration)),
        );
    }
}

fn print_dot_cells(details: &ParseDetails, palette: &ansi::Palette) {
    // Seeds over empty spans are everywhere; only list the ones that moved.
    let moved: Vec<_> = details.dot_cells.iter().filter(|cell| cell.start < cell.end).collect();
    if moved.is_empty() {
        println!("  {}", palette.dim("No dot item moved past its seed"));
        return;
    }
    for cell in moved.iter().take(20) {
        println!(
            "  {} {} {}",
            palette.paint(format!("g{} ({},{})", cell.grammar, cell.start, cell.end), ansi::YELLOW),
            palette.paint(format!("{} items", cell.items), ansi::BLUE),
            palette.dim(format!("{} complete", cell.complete)),
        );
    }
    if moved.len() > 20 {
        println!("  {}", palette.dim(format!("... +{} more", moved.len() - 20)));
    }
}

fn print_constituent(idx: usize, constituent: &Constituent, palette: &ansi::Palette) {
    println!(
        "  {} {} {} {}",
        palette.dim(format!("[{}]", idx)),
        palette.bold(palette.paint(&constituent.lhs, ansi::GREEN)),
        palette.dim("│"),
        palette.paint(format!("span {}..{}", constituent.start, constituent.end), ansi::YELLOW),
    );
    for rule in &constituent.rules {
        println!("      {} {}", palette.dim("rule:"), palette.paint(rule, ansi::CYAN));
    }
    if constituent.best_source_cost > 0.0 {
        println!("      {} {}", palette.dim("source cost:"), constituent.best_source_cost);
    }
}

#[cfg(test)]
mod tests {
    use super::ansi::{self, Palette};

    #[test]
    fn palette_without_color_leaves_text_alone() {
        let plain = Palette::new(false);
        assert_eq!(plain.paint("x", ansi::RED), "x");
        assert_eq!(plain.section("Goal"), "━━━ Goal ━━━");

        let colored = Palette::new(true);
        assert_eq!(colored.paint("x", ansi::RED), "\x1b[31mx\x1b[0m");
        assert!(colored.bold("x").starts_with("\x1b[1m"));
    }
}
