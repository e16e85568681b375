//! Interactive session over stdin.
//!
//! One line is one interaction. Recoverable errors are printed and the
//! loop keeps going; only I/O failures end it early.

use crate::analysis::{Analysis, Category};
use crate::error::{DashboardError, Result};
use crate::models::Output;
use crate::report;
use crate::session::{Selection, Session};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

const PROMPT: &str = "salesdash> ";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Periods,
    Years,
    AddPeriod { name: String, months: Vec<String> },
    Compare { periods: Vec<String>, years: Vec<i32> },
    Run(Analysis),
    Ask(String),
    Quit,
    Empty,
}

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "help" | "?" => Ok(Command::Help),
        "periods" => Ok(Command::Periods),
        "years" => Ok(Command::Years),
        "quit" | "exit" => Ok(Command::Quit),
        "add-period" => {
            let (name, months) = split_name(rest)?;
            let months = match single_argument(&compact_lists(months))? {
                Some(list) => split_list(list),
                None => Vec::new(),
            };
            Ok(Command::AddPeriod { name, months })
        }
        "compare" => {
            let compacted = compact_lists(rest);
            let mut parts = compacted.split_whitespace();
            let periods = parts.next().map(split_list).unwrap_or_default();
            let years = parts.next().map(split_list).unwrap_or_default();
            if let Some(extra) = parts.next() {
                return Err(unexpected_argument(extra));
            }
            let years = years
                .iter()
                .map(|y| {
                    y.parse::<i32>()
                        .map_err(|_| DashboardError::validation(format!("Invalid year '{}'", y)))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Command::Compare { periods, years })
        }
        "run" => Ok(Command::Run(rest.parse()?)),
        "ask" => Ok(Command::Ask(rest.to_string())),
        other => Err(DashboardError::validation(format!(
            "Unknown command '{}'. Type 'help' for a list of commands.",
            other
        ))),
    }
}

/// Split off a period name, which may be double-quoted to contain spaces.
fn split_name(rest: &str) -> Result<(String, &str)> {
    if let Some(quoted) = rest.strip_prefix('"') {
        let (name, tail) = quoted
            .split_once('"')
            .ok_or_else(|| DashboardError::validation("Unterminated quote in period name"))?;
        return Ok((name.trim().to_string(), tail.trim()));
    }

    match rest.split_once(char::is_whitespace) {
        Some((name, tail)) => Ok((name.to_string(), tail.trim())),
        None => Ok((rest.to_string(), "")),
    }
}

/// Drop whitespace around commas so "06, 07" reads as one list.
fn compact_lists(value: &str) -> String {
    value
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(",")
}

/// At most one whitespace-separated argument; anything more is rejected.
fn single_argument(value: &str) -> Result<Option<&str>> {
    let mut parts = value.split_whitespace();
    let first = parts.next();
    match parts.next() {
        Some(extra) => Err(unexpected_argument(extra)),
        None => Ok(first),
    }
}

fn unexpected_argument(extra: &str) -> DashboardError {
    DashboardError::validation(format!(
        "Unexpected argument '{}'. Separate list items with commas.",
        extra
    ))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// Read commands from `input` until `quit` or end of input.
pub async fn run<R, W>(session: &mut Session, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut selection = Selection::default();

    writeln!(out, "Type 'help' for a list of commands.")?;

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };
        debug!("Command: {:?}", command);

        let result = match command {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => Ok(Output::Message(help_text())),
            Command::Periods => Ok(Output::Periods(session.all_periods())),
            Command::Years => Ok(Output::Years(session.years())),
            Command::AddPeriod { name, months } => session
                .add_period(&name, &months)
                .map(|period| Output::Message(format!("Added period {}", period))),
            Command::Compare { periods, years } => {
                selection.periods = periods;
                selection.years = years;
                session
                    .run(Analysis::ComparePeriods, &selection)
                    .await
            }
            Command::Run(analysis) => session.run(analysis, &selection).await,
            Command::Ask(question) => {
                selection.question = Some(question);
                session.run(Analysis::AskQuestion, &selection).await
            }
        };

        match result {
            Ok(output) => writeln!(out, "{}", report::render_markdown(&output))?,
            Err(e) if e.is_recoverable() => {
                warn!("{}", e);
                writeln!(out, "{}", e)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn help_text() -> String {
    let mut help = String::from(
        "Commands:\n\
         \x20 help                      show this help\n\
         \x20 periods                   list periods\n\
         \x20 years                     list years in the dataset\n\
         \x20 add-period NAME MM,MM     define or override a period\n\
         \x20                           (quote names with spaces: \"Summer Sale\" 06,07)\n\
         \x20 compare P,P YYYY,YYYY     compare periods across years\n\
         \x20 run ANALYSIS              run an analysis by name\n\
         \x20 ask QUESTION              ask a question about the table\n\
         \x20 quit                      leave the session\n\nAnalyses:\n",
    );

    for category in Category::ALL {
        help.push_str(&format!("  {}\n", category));
        for analysis in category.analyses() {
            help.push_str(&format!("    {:<26}{}\n", analysis.name(), analysis.label()));
        }
    }

    help
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sample_dataset;
    use crate::qa::tests::StubAnswerer;
    use crate::qa::AskOptions;
    use std::sync::Arc;
    use std::time::Duration;

    fn session() -> Session {
        Session::new(
            Arc::new(sample_dataset()),
            Arc::new(StubAnswerer::new("North")),
            AskOptions {
                timeout: Duration::from_secs(5),
                max_context_chars: 100_000,
                show_progress: false,
            },
        )
    }

    async fn transcript(script: &str) -> String {
        let mut session = session();
        let mut out = Vec::new();
        run(&mut session, script.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("  ").unwrap(), Command::Empty);
        assert_eq!(parse_command("HELP").unwrap(), Command::Help);
        assert_eq!(parse_command("exit").unwrap(), Command::Quit);
        assert_eq!(
            parse_command("add-period Holiday 11,12").unwrap(),
            Command::AddPeriod {
                name: "Holiday".to_string(),
                months: vec!["11".to_string(), "12".to_string()],
            }
        );
        assert_eq!(
            parse_command("compare Q1,Q2 2023,2024").unwrap(),
            Command::Compare {
                periods: vec!["Q1".to_string(), "Q2".to_string()],
                years: vec![2023, 2024],
            }
        );
        assert_eq!(
            parse_command("run product-sales").unwrap(),
            Command::Run(Analysis::ProductSales)
        );
        assert_eq!(
            parse_command("run Show me regional sales").unwrap(),
            Command::Run(Analysis::RegionalSales)
        );
        assert_eq!(
            parse_command("ask Which region sold most?").unwrap(),
            Command::Ask("Which region sold most?".to_string())
        );
    }

    #[test]
    fn test_parse_lists_with_spaces_after_commas() {
        assert_eq!(
            parse_command("add-period Summer 06, 07, 08").unwrap(),
            Command::AddPeriod {
                name: "Summer".to_string(),
                months: vec!["06".to_string(), "07".to_string(), "08".to_string()],
            }
        );
        assert_eq!(
            parse_command("compare Q1 , Q2 2023, 2024").unwrap(),
            Command::Compare {
                periods: vec!["Q1".to_string(), "Q2".to_string()],
                years: vec![2023, 2024],
            }
        );
    }

    #[test]
    fn test_parse_rejects_leftover_arguments() {
        assert!(matches!(
            parse_command("compare Q1 2023 extra junk"),
            Err(DashboardError::Validation(_))
        ));
        assert!(matches!(
            parse_command("add-period Summer 06 07"),
            Err(DashboardError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_quoted_period_name() {
        assert_eq!(
            parse_command("add-period \"Summer Sale\" 06, 07").unwrap(),
            Command::AddPeriod {
                name: "Summer Sale".to_string(),
                months: vec!["06".to_string(), "07".to_string()],
            }
        );
        assert!(parse_command("add-period \"Summer Sale 06").is_err());
    }

    #[tokio::test]
    async fn test_spaced_period_is_stored_whole() {
        let out = transcript("add-period Summer 06, 07, 08\nperiods\n").await;
        assert!(out.contains("Added period Summer: 06, 07, 08"));
        assert!(out.contains("- Summer: 06, 07, 08"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("dance").is_err());
        assert!(parse_command("run nothing").is_err());
        assert!(parse_command("compare Q1 twenty").is_err());
    }

    #[tokio::test]
    async fn test_session_continues_after_errors() {
        let out = transcript(
            "compare\nadd-period Holiday\nadd-period Holiday 11,12\ncompare Holiday 2023,2024\nquit\nyears\n",
        )
        .await;

        assert!(out.contains("Please select at least one period and one year."));
        assert!(out.contains("Please enter a name and select months for the custom period."));
        assert!(out.contains("Added period Holiday: 11, 12"));
        assert!(out.contains("| Holiday 2023 | 150 | - |"));
        // nothing after quit runs
        assert!(!out.contains("## Years"));
    }

    #[tokio::test]
    async fn test_empty_comparison_message() {
        let out = transcript("compare Q2 2025\n").await;
        assert!(out.contains(report::EMPTY_COMPARISON));
    }

    #[tokio::test]
    async fn test_ask_and_periods() {
        let out = transcript("periods\nask Which region?\n").await;
        assert!(out.contains("- Q3: 07, 08, 09"));
        assert!(out.contains("**Answer:** North"));
    }

    #[test]
    fn test_help_lists_every_analysis() {
        let help = help_text();
        for analysis in <Analysis as clap::ValueEnum>::value_variants() {
            assert!(help.contains(&analysis.name()));
        }
    }
}
