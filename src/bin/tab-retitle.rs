//! tab-retitle command line
//!
//! Manages a JSON rule file and runs the rules against a live Chrome tab.

use anyhow::{Context, bail};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tab_retitle::engine::{PromptChoice, RuleEditor, ScriptedPrompt, VerificationPrompt};
use tab_retitle::store::{export_rules, import_rules};
use tab_retitle::{
    BrowserSession, Document, EngineConfig, JsonFileRuleStore, LaunchOptions, LogConfig, NavigationEvent, RuleDraft, RuleEngine,
    RuleId, RuleStore, RuleSummary,
};

#[derive(Parser)]
#[command(name = "tab-retitle")]
#[command(version)]
#[command(about = "Rewrite page titles from URL rules and CSS selectors", long_about = None)]
struct Cli {
    /// Rule file
    #[arg(long, short = 'r', global = true, default_value = "tab-retitle-rules.json", value_name = "PATH")]
    rules: PathBuf,

    /// Trace what the engine is doing
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List rules and verification counts
    List,
    /// Add a rule
    Add(RuleArgs),
    /// Edit a rule in place, keeping its id
    Edit {
        /// Id of the rule to edit
        id: String,
        #[command(flatten)]
        rule: EditArgs,
    },
    /// Remove the rule at a position (as shown by `list`)
    Remove {
        index: usize,
    },
    /// Mark a rule as verified without visiting a page
    Verify {
        id: String,
    },
    /// Write all rules as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(long, short = 'o', value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Replace all rules with the contents of an export file
    Import {
        file: PathBuf,
    },
    /// Show which rules match a URL
    Check {
        url: String,
    },
    /// Load a URL in Chrome and apply the matching rules
    Apply(ApplyArgs),
}

#[derive(Args)]
struct RuleArgs {
    /// contains, is, startsWith or endsWith
    #[arg(long = "match", short = 'm', default_value = "contains")]
    match_type: String,

    /// Value compared against the page URL
    #[arg(long, short = 'u')]
    url: String,

    /// Field selector as NAME=CSS (repeatable)
    #[arg(long = "selector", short = 's', value_name = "NAME=CSS", required = true)]
    selectors: Vec<String>,

    /// Title template using {{NAME}} placeholders
    #[arg(long, short = 't')]
    title: String,
}

#[derive(Args)]
struct EditArgs {
    #[arg(long = "match", short = 'm')]
    match_type: Option<String>,

    #[arg(long, short = 'u')]
    url: Option<String>,

    /// Replaces all selectors when given
    #[arg(long = "selector", short = 's', value_name = "NAME=CSS")]
    selectors: Vec<String>,

    #[arg(long, short = 't')]
    title: Option<String>,
}

#[derive(Args)]
struct ApplyArgs {
    url: String,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<PathBuf>,

    /// Give up on a rule's selectors after this many seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Confirm every new title without asking
    #[arg(long, short = 'y')]
    yes: bool,
}

fn parse_selector(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, css) = raw
        .split_once('=')
        .with_context(|| format!("selector '{}' must look like NAME=CSS", raw))?;
    Ok((name.to_string(), css.to_string()))
}

fn parse_selectors(raw: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    raw.iter().map(|s| parse_selector(s)).collect()
}

struct PromptIo {
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
}

/// Asks on the terminal whether an applied title looks right
///
/// Rules are verified concurrently, so each question and its answer happen
/// under one lock; otherwise two waiting prompts could swap answers.
struct TerminalPrompt {
    io: Arc<Mutex<PromptIo>>,
}

impl TerminalPrompt {
    fn stdio() -> Self {
        Self::new(Box::new(std::io::BufReader::new(std::io::stdin())), Box::new(std::io::stdout()))
    }

    fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self { io: Arc::new(Mutex::new(PromptIo { input, output })) }
    }
}

#[async_trait]
impl VerificationPrompt for TerminalPrompt {
    async fn ask(&self, title: &str, rule_id: &RuleId) -> PromptChoice {
        let question = format!(
            "Is the title displaying correctly? (rule {})\n  \"{}\"\n[y] Looks good  [n] Something's wrong  [Enter] Skip: ",
            rule_id, title
        );
        let io = self.io.clone();
        let answer = tokio::task::spawn_blocking(move || {
            let mut io = io.lock().map_err(|e| std::io::Error::other(e.to_string()))?;
            write!(io.output, "{}", question)?;
            io.output.flush()?;
            let mut line = String::new();
            io.input.read_line(&mut line)?;
            Ok::<_, std::io::Error>(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => PromptChoice::Confirm,
                "n" | "no" => PromptChoice::ReportProblem,
                _ => PromptChoice::Dismissed,
            },
            _ => PromptChoice::Dismissed,
        }
    }
}

/// Points the user at the edit command for a reported rule
struct EditHint;

#[async_trait]
impl RuleEditor for EditHint {
    async fn open(&self, rule_id: &RuleId) -> tab_retitle::Result<()> {
        eprintln!("Fix the rule with: tab-retitle edit {} --selector NAME=CSS --title TEMPLATE", rule_id);
        Ok(())
    }
}

fn print_rules(rules: &[tab_retitle::Rule]) {
    for (index, rule) in rules.iter().enumerate() {
        println!(
            "{:>3}  {}  [{}]  {} {:?}  ->  {:?}",
            index,
            rule.id,
            if rule.verified_title { "verified" } else { "unverified" },
            rule.match_type,
            rule.url_value,
            rule.title_change
        );
        for (name, css) in rule.selectors.iter() {
            println!("       {} = {}", name, css);
        }
    }
    let summary = RuleSummary::from_rules(rules);
    println!("{} rules: {} verified, {} unverified", summary.total, summary.verified, summary.unverified);
}

async fn apply(store: Arc<JsonFileRuleStore>, args: ApplyArgs, log: LogConfig) -> anyhow::Result<()> {
    let config = EngineConfig::new().extraction_timeout(Duration::from_secs(args.timeout_secs)).log(log);
    let prompt: Arc<dyn VerificationPrompt> = if args.yes {
        Arc::new(ScriptedPrompt::always(PromptChoice::Confirm))
    } else {
        Arc::new(TerminalPrompt::stdio())
    };
    let engine = RuleEngine::new(store, prompt, Arc::new(EditHint), config);

    if !engine.has_matching_rule(&args.url).await? {
        println!("No rule matches {}", args.url);
        return Ok(());
    }

    let mut options = LaunchOptions::new().headless(!args.headed);
    if let Some(path) = args.executable_path {
        options = options.chrome_path(path);
    }

    let session = BrowserSession::launch(options)?;
    let final_url = session.navigate(&args.url)?;
    let document = session.document().await?;

    let report = engine.on_navigation(&NavigationEvent::complete(final_url), &document).await?;
    for rule in report.matched() {
        match (&rule.title, &rule.error) {
            (Some(title), None) => println!("{}  {}  {:?}", rule.rule_id, rule.state, title),
            (_, Some(error)) => println!("{}  {}  {}", rule.rule_id, rule.state, error),
            (None, None) => println!("{}  {}", rule.rule_id, rule.state),
        }
    }

    println!("Page title: {}", document.title().await?);
    session.close()?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "warn" }))
        .init();
    let log = if cli.verbose { LogConfig::at(log::Level::Debug) } else { LogConfig::disabled() };

    let store = Arc::new(JsonFileRuleStore::new(&cli.rules));

    match cli.command {
        Command::List => print_rules(&store.load().await?),
        Command::Add(args) => {
            let mut draft = RuleDraft::new(args.match_type.as_str(), args.url, args.title);
            draft.selectors = parse_selectors(&args.selectors)?;
            let rule = draft.into_rule()?;
            let id = rule.id.clone();
            store.add(rule).await?;
            println!("Added rule {}", id);
        }
        Command::Edit { id, rule: args } => {
            let id = RuleId::new(id);
            let existing = store.find(&id).await?.with_context(|| format!("no rule with id {}", id))?;
            let mut draft = RuleDraft::from(&existing);
            if let Some(match_type) = args.match_type {
                draft.match_type = match_type.into();
            }
            if let Some(url) = args.url {
                draft.url_value = url;
            }
            if !args.selectors.is_empty() {
                draft.selectors = parse_selectors(&args.selectors)?;
            }
            if let Some(title) = args.title {
                draft.title_change = title;
            }
            let edited = store.edit(&id, draft).await?;
            println!("Updated rule {}{}", edited.id, if edited.verified_title { "" } else { " (needs verification)" });
        }
        Command::Remove { index } => {
            let removed = store.remove_at(index).await?;
            println!("Removed rule {}", removed.id);
        }
        Command::Verify { id } => {
            store.mark_verified(&RuleId::new(id)).await?;
            println!("Marked as verified");
        }
        Command::Export { out } => {
            let json = export_rules(&store.load().await?)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
                    println!("Exported rules to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let rules = import_rules(&text)?;
            let count = rules.len();
            store.save(rules).await?;
            println!("Imported {} rules", count);
        }
        Command::Check { url } => {
            let rules = store.load().await?;
            let matching: Vec<_> = rules.into_iter().filter(|rule| rule.matches_url(&url)).collect();
            if matching.is_empty() {
                bail!("no rule matches {}", url);
            }
            print_rules(&matching);
        }
        Command::Apply(args) => apply(store, args, log).await?,
    }

    Ok(())
}
