use std::fmt;

use memberfind::{MemberKind, MemberResult, ResolveMetrics};

use ansi::Style::{Blue, Bold, Cyan, Dim, Gray, Green, Yellow};

/// SGR styling; a disabled palette passes text through.
mod ansi {
    #[derive(Clone, Copy)]
    pub enum Style {
        Bold,
        Dim,
        Green,
        Yellow,
        Blue,
        Cyan,
        Gray,
    }

    impl Style {
        fn code(self) -> &'static str {
            match self {
                Style::Bold => "1",
                Style::Dim => "2",
                Style::Green => "32",
                Style::Yellow => "33",
                Style::Blue => "34",
                Style::Cyan => "36",
                Style::Gray => "90",
            }
        }
    }

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, text: impl AsRef<str>, styles: &[Style]) -> String {
            if !self.enabled || styles.is_empty() {
                return text.as_ref().to_string();
            }
            let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
            format!("\x1b[{}m{}\x1b[0m", codes.join(";"), text.as_ref())
        }
    }
}

/// What the CLI prints for one lookup.
pub struct Report {
    pub kind: MemberKind,
    pub target: String,
    pub matches: Vec<String>,
    /// Not-found template; `None` when something matched.
    pub diagnostics: Option<String>,
    pub metrics: ResolveMetrics,
}

impl Report {
    pub fn from_result<T: fmt::Display>(target: &str, result: MemberResult<T>) -> Self {
        let result = result.ignore_errors();
        Report {
            kind: result.kind(),
            target: target.to_string(),
            matches: result.all().iter().map(|m| m.to_string()).collect(),
            diagnostics: result.error().map(|err| err.template.clone()),
            metrics: result.metrics(),
        }
    }
}

pub fn print_report(report: &Report, color: bool) {
    let palette = ansi::Palette::new(color);
    println!(
        "\n{}",
        palette.paint(format!("⚙  {} lookup in [{}]", report.kind, report.target), &[Bold, Cyan])
    );

    println!("\n{}", palette.paint("━━━ Matches ━━━", &[Gray]));
    match &report.diagnostics {
        None => print_matches(&report.matches, &palette),
        Some(template) => print_diagnostics(template, &palette),
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", &[Gray]));
    let metrics = &report.metrics;
    println!(
        "  Total: {}  │  Scanned: {}  │  Cache: {}  │  Superclass hops: {}",
        palette.paint(format!("{:?}", metrics.elapsed), &[Green]),
        palette.paint(metrics.scanned.to_string(), &[Blue]),
        if metrics.cache_hit { palette.paint("hit", &[Green]) } else { palette.paint("miss", &[Dim]) },
        palette.paint(metrics.superclass_hops.to_string(), &[Dim]),
    );
    println!();
}

fn print_matches(matches: &[String], palette: &ansi::Palette) {
    for (idx, found) in matches.iter().enumerate() {
        println!(
            "  {} {}",
            palette.paint(format!("[{idx}]"), &[Gray]),
            palette.paint(found, &[Bold, Green]),
        );
    }
}

fn print_diagnostics(template: &str, palette: &ansi::Palette) {
    println!("{}", palette.paint("  No matches", &[Dim]));
    println!();
    for line in template.lines() {
        match line.strip_prefix("  -> ") {
            Some(slot) => println!("    {} {}", palette.paint("→", &[Dim]), palette.paint(slot, &[Yellow])),
            None => println!("  {}", palette.paint(line, &[Blue])),
        }
    }
    println!("\n{}", palette.paint("  Tip: Set MEMBERFIND_DEBUG=1 to log per-resolution timings", &[Dim]));
}
