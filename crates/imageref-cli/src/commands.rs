use std::io::{self, BufRead};
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use imageref::{Normalizer, Rank, Reference, ReferenceConfig};
use serde::Serialize;
use tracing::debug;

use crate::cli::{Cli, Command, MatchArgs, OutputFormat, SortArgs};

/// Run the parsed command line. `Ok(false)` means the command completed but
/// the outcome was negative (a rejected reference or a failed match).
pub fn run_command(cli: Cli) -> anyhow::Result<bool> {
    let normalizer = build_normalizer(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Parse(args) => Ok(resolve_all(
            &normalizer,
            format,
            &args.references,
            |n, s| n.parse(s),
        )),
        Command::Normalize(args) => Ok(resolve_all(
            &normalizer,
            format,
            &args.references,
            |n, s| n.parse_normalized_named(s).map(Reference::from),
        )),
        Command::DockerRef(args) => Ok(resolve_all(
            &normalizer,
            format,
            &args.references,
            |n, s| n.parse_docker_ref(s).map(Reference::from),
        )),
        Command::Any(args) => Ok(resolve_all(
            &normalizer,
            format,
            &args.references,
            |n, s| n.parse_any_reference(s),
        )),
        Command::Familiar(args) => Ok(cmd_familiar(&normalizer, format, &args.references)),
        Command::Match(args) => cmd_match(&normalizer, format, args),
        Command::Sort(args) => cmd_sort(&normalizer, format, args),
    }
}

fn build_normalizer(cli: &Cli) -> anyhow::Result<Normalizer> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ReferenceConfig::default(),
    };
    if let Some(domain) = &cli.default_domain {
        config = ReferenceConfig {
            default_tag: config.default_tag,
            official_repo_prefix: config.official_repo_prefix,
            name_total_length_max: config.name_total_length_max,
            ..ReferenceConfig::with_default_domain(domain.as_str())
        };
    }
    if let Some(tag) = &cli.default_tag {
        config.default_tag = tag.clone().into();
    }
    debug!(
        default_domain = %config.default_domain,
        default_tag = %config.default_tag,
        "reference defaults"
    );
    Normalizer::new(config).context("invalid reference defaults")
}

fn load_config(path: &Path) -> anyhow::Result<ReferenceConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

#[derive(Debug, Serialize)]
struct ReferenceView {
    input: String,
    kind: &'static str,
    reference: String,
    familiar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
}

impl ReferenceView {
    fn new(normalizer: &Normalizer, input: &str, reference: &Reference) -> Self {
        let named = reference.named();
        Self {
            input: input.to_string(),
            kind: kind_of(reference),
            reference: reference.to_string(),
            familiar: normalizer.familiar_string(reference),
            domain: named.and_then(|n| n.domain()).map(str::to_string),
            path: named.map(|n| n.path().to_string()),
            tag: reference.tag().map(|t| t.to_string()),
            digest: reference.digest().map(|d| d.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Outcome {
    Resolved(ReferenceView),
    Rejected { input: String, error: String },
}

impl Outcome {
    fn of(normalizer: &Normalizer, input: &str, result: imageref::Result<Reference>) -> Self {
        match result {
            Ok(reference) => Self::Resolved(ReferenceView::new(normalizer, input, &reference)),
            Err(e) => Self::Rejected {
                input: input.to_string(),
                error: e.to_string(),
            },
        }
    }
}

fn kind_of(reference: &Reference) -> &'static str {
    match Rank::of(reference) {
        Rank::TaggedDigested => "canonical",
        Rank::Tagged => "tagged",
        Rank::Digested => "digested",
        Rank::NameOnly => "name",
        Rank::DigestOnly => "digest",
        Rank::Unparsable => "invalid",
    }
}

fn resolve_all<F>(
    normalizer: &Normalizer,
    format: OutputFormat,
    inputs: &[String],
    resolve: F,
) -> bool
where
    F: Fn(&Normalizer, &str) -> imageref::Result<Reference>,
{
    let outcomes: Vec<Outcome> = inputs
        .iter()
        .map(|input| Outcome::of(normalizer, input, resolve(normalizer, input)))
        .collect();
    let ok = outcomes.iter().all(|o| matches!(o, Outcome::Resolved(_)));

    match format {
        OutputFormat::Json => print_json(&outcomes),
        OutputFormat::Text => {
            for outcome in &outcomes {
                print_outcome(outcome);
            }
        }
    }
    ok
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Resolved(view) => {
            println!("{} {} ({})", "✓".green(), view.reference.bold(), view.kind.cyan());
            if let Some(domain) = &view.domain {
                println!("  Domain: {}", domain);
            }
            if let Some(path) = &view.path {
                println!("  Path: {}", path);
            }
            if let Some(tag) = &view.tag {
                println!("  Tag: {}", tag.yellow());
            }
            if let Some(digest) = &view.digest {
                println!("  Digest: {}", digest.dimmed());
            }
            println!("  Familiar: {}", view.familiar);
        }
        Outcome::Rejected { input, error } => {
            println!("{} {}: {}", "✗".red(), input.bold(), error.red());
        }
    }
}

fn cmd_familiar(normalizer: &Normalizer, format: OutputFormat, inputs: &[String]) -> bool {
    let rendered: Vec<Outcome> = inputs
        .iter()
        .map(|input| Outcome::of(normalizer, input, normalizer.parse_any_reference(input)))
        .collect();
    let ok = rendered.iter().all(|o| matches!(o, Outcome::Resolved(_)));

    match format {
        OutputFormat::Json => print_json(&rendered),
        OutputFormat::Text => {
            for outcome in &rendered {
                match outcome {
                    Outcome::Resolved(view) => println!("{}", view.familiar),
                    rejected => print_outcome(rejected),
                }
            }
        }
    }
    ok
}

#[derive(Serialize)]
struct MatchView<'a> {
    pattern: &'a str,
    reference: &'a str,
    matched: bool,
}

fn cmd_match(
    normalizer: &Normalizer,
    format: OutputFormat,
    args: MatchArgs,
) -> anyhow::Result<bool> {
    let reference = normalizer
        .parse_any_reference(&args.reference)
        .with_context(|| format!("invalid reference {}", args.reference))?;
    let matched = normalizer
        .familiar_match(&args.pattern, &reference)
        .with_context(|| format!("invalid pattern {}", args.pattern))?;

    match format {
        OutputFormat::Json => print_json(&MatchView {
            pattern: &args.pattern,
            reference: &args.reference,
            matched,
        }),
        OutputFormat::Text if matched => {
            println!(
                "{} {} matches {}",
                "✓".green(),
                args.reference.bold(),
                args.pattern.yellow()
            );
        }
        OutputFormat::Text => {
            println!(
                "{} {} does not match {}",
                "✗".red(),
                args.reference.bold(),
                args.pattern.yellow()
            );
        }
    }
    Ok(matched)
}

#[derive(Serialize)]
struct RankedView<'a> {
    reference: &'a str,
    rank: String,
}

fn cmd_sort(
    normalizer: &Normalizer,
    format: OutputFormat,
    args: SortArgs,
) -> anyhow::Result<bool> {
    let references = if args.references.is_empty() {
        read_lines(io::stdin().lock())?
    } else {
        args.references
    };
    let sorted = normalizer.sort(references);

    match format {
        OutputFormat::Json => {
            let ranked: Vec<RankedView<'_>> = sorted
                .iter()
                .map(|s| RankedView {
                    reference: s,
                    rank: format!("{:?}", normalizer.rank(s)),
                })
                .collect();
            print_json(&ranked);
        }
        OutputFormat::Text => {
            for s in &sorted {
                if normalizer.rank(s) == Rank::Unparsable {
                    println!("{}", s.dimmed());
                } else {
                    println!("{}", s);
                }
            }
        }
    }
    Ok(true)
}

fn read_lines(reader: impl BufRead) -> anyhow::Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.context("failed to read references from stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{} {}", "error:".red(), e),
    }
}
