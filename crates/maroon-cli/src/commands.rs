use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use maroon_dag::Index;
use maroon_repo::{Reconciliation, RepoConfig, RepoManager, Repository, SaveOutcome};
use maroon_types::ContentHash;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.repos)?;
    let manager = RepoManager::new(config);
    match cli.command {
        Command::Init(args) => cmd_init(&manager, &args.file),
        Command::Save(args) => cmd_save(&manager, &args.file),
        Command::Open(args) => cmd_open(&manager, &args.file),
        Command::Log(args) => cmd_log(&manager, args),
        Command::Show(args) => cmd_show(&manager, args),
        Command::Checkout(args) => cmd_checkout(&manager, args),
        Command::Cp(args) => cmd_cp(&manager, args),
        Command::Mv(args) => cmd_mv(&manager, args),
        Command::Rm(args) => cmd_rm(&manager, &args.file),
        Command::Rebuild(args) => cmd_rebuild(&manager, &args.file),
        Command::Key(args) => cmd_key(&manager, &args.file),
        Command::List => cmd_list(&manager),
        Command::Verify(args) => cmd_verify(&manager, &args.file),
        Command::Hash(args) => cmd_hash(&args.file),
    }
}

/// Defaults, config file, environment, then the `--repos` flag.
fn load_config(path: Option<&Path>, repos: Option<PathBuf>) -> anyhow::Result<RepoConfig> {
    let config = RepoConfig::load(path).context("loading configuration")?;
    Ok(match repos {
        Some(root) => config.with_repos_root(root),
        None => config,
    })
}

/// The identity of a tracked file: its absolute path.
fn identity(file: &Path) -> anyhow::Result<String> {
    let absolute = std::path::absolute(file)
        .with_context(|| format!("resolving {}", file.display()))?;
    Ok(absolute.to_string_lossy().into_owned())
}

fn read_file(file: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(file).with_context(|| format!("reading {}", file.display()))
}

fn short(hash: &ContentHash) -> colored::ColoredString {
    hash.short_hex().yellow()
}

fn cmd_init(manager: &RepoManager, file: &Path) -> anyhow::Result<()> {
    let id = identity(file)?;
    let content = read_file(file)?;
    let repo = manager.init(&id, &content)?;
    println!("{} Tracking {}", "✓".green().bold(), id.bold());
    println!("  Root: {}", short(&repo.head()));
    Ok(())
}

fn cmd_save(manager: &RepoManager, file: &Path) -> anyhow::Result<()> {
    let id = identity(file)?;
    let content = read_file(file)?;
    if !manager.exists(&id) {
        return cmd_init(manager, file);
    }
    let mut repo = manager.open(&id)?;
    match repo.record_save(&content)? {
        SaveOutcome::Unchanged(head) => println!("No changes since {}", short(&head)),
        SaveOutcome::Revisited { from, to } => {
            println!("{} Back to {} (was {})", "✓".green().bold(), short(&to), short(&from))
        }
        SaveOutcome::Appended { parent, child } => {
            println!("{} Saved {} on {}", "✓".green().bold(), short(&child), short(&parent))
        }
    }
    Ok(())
}

fn cmd_open(manager: &RepoManager, file: &Path) -> anyhow::Result<()> {
    let id = identity(file)?;
    let content = read_file(file)?;
    let (repo, outcome) = manager.open_or_init(&id, &content)?;
    match outcome {
        Reconciliation::Clean(head) => println!("{} Up to date at {}", "✓".green().bold(), short(&head)),
        Reconciliation::Rewound { from, to } => {
            println!("Head moved back to {} (was {})", short(&to), short(&from))
        }
        Reconciliation::Diverged { parent, adopted } => println!(
            "{} Changed outside maroon: adopted {} under {}",
            "!".yellow().bold(),
            short(&adopted),
            short(&parent)
        ),
    }
    println!("  {} versions", repo.index().version_count().to_string().bold());
    Ok(())
}

fn cmd_log(manager: &RepoManager, args: LogArgs) -> anyhow::Result<()> {
    let id = identity(&args.file)?;
    let index = manager.load_index(&id)?;
    for line in render_timeline(&index, args.full) {
        println!("{line}");
    }
    Ok(())
}

/// One line per version, depth-first from the root, indented by depth.
fn render_timeline(index: &Index, full: bool) -> Vec<String> {
    let depths = index.depths();
    index
        .walk()
        .into_iter()
        .map(|hash| {
            let depth = depths.get(&hash).copied().unwrap_or(0);
            let label = if full { hash.to_hex() } else { hash.short_hex() };
            let marker = if hash == index.head() { "*".green().bold() } else { "o".normal() };
            let mut line = format!("{}{} {}", "  ".repeat(depth), marker, label.yellow());
            if hash == index.root() {
                line.push_str(&format!(" {}", "(root)".dimmed()));
            }
            if hash == index.head() {
                line.push_str(&format!(" {}", "(head)".green()));
            }
            for parent in index.parents_of(&hash) {
                if index.is_adopted(&parent, &hash) {
                    line.push_str(&format!(" {} {}", "adopted from".cyan(), parent.short_hex()));
                }
            }
            line
        })
        .collect()
}

fn cmd_show(manager: &RepoManager, args: VersionArgs) -> anyhow::Result<()> {
    let repo = manager.open(&identity(&args.file)?)?;
    let hash = repo.resolve(&args.version)?;
    let content = repo.content(&hash)?;
    print!("{}", String::from_utf8_lossy(&content));
    Ok(())
}

fn cmd_checkout(manager: &RepoManager, args: VersionArgs) -> anyhow::Result<()> {
    let mut repo = manager.open(&identity(&args.file)?)?;
    let hash = repo.resolve(&args.version)?;
    checkout_into(&mut repo, hash, &args.file)?;
    println!("{} Checked out {}", "✓".green().bold(), short(&hash));
    Ok(())
}

/// Write the version into the file, then move the head. A failed write
/// leaves the timeline pointing at what the file still holds.
fn checkout_into(repo: &mut Repository, hash: ContentHash, file: &Path) -> anyhow::Result<()> {
    let content = repo.content(&hash)?;
    fs::write(file, &content).with_context(|| format!("writing {}", file.display()))?;
    repo.checkout(hash)?;
    Ok(())
}

fn cmd_cp(manager: &RepoManager, args: PairArgs) -> anyhow::Result<()> {
    let (from, to) = (identity(&args.from)?, identity(&args.to)?);
    if from != to {
        fs::copy(&args.from, &args.to)
            .with_context(|| format!("copying {} to {}", args.from.display(), args.to.display()))?;
    }
    manager.copy(&from, &to)?;
    println!("{} Copied history to {}", "✓".green().bold(), to.bold());
    Ok(())
}

fn cmd_mv(manager: &RepoManager, args: PairArgs) -> anyhow::Result<()> {
    let (from, to) = (identity(&args.from)?, identity(&args.to)?);
    manager.rename(&from, &to)?;
    println!("{} Moved {} to {}", "✓".green().bold(), from, to.bold());
    Ok(())
}

fn cmd_rm(manager: &RepoManager, file: &Path) -> anyhow::Result<()> {
    let id = identity(file)?;
    manager.remove(&id)?;
    println!("{} Removed history of {}", "✓".green().bold(), id.bold());
    Ok(())
}

fn cmd_rebuild(manager: &RepoManager, file: &Path) -> anyhow::Result<()> {
    let id = identity(file)?;
    let content = read_file(file)?;
    let repo = manager.rebuild(&id, &content)?;
    println!("{} History cleared, root {}", "✓".green().bold(), short(&repo.head()));
    Ok(())
}

fn cmd_key(manager: &RepoManager, file: &Path) -> anyhow::Result<()> {
    println!("{}", manager.key(&identity(file)?)?);
    Ok(())
}

fn cmd_list(manager: &RepoManager) -> anyhow::Result<()> {
    let tracked = manager.list()?;
    if tracked.is_empty() {
        println!("No tracked files.");
    }
    for id in tracked {
        println!("{id}");
    }
    Ok(())
}

fn cmd_verify(manager: &RepoManager, file: &Path) -> anyhow::Result<()> {
    let report = manager.verify(&identity(file)?)?;
    let check = |ok: bool| if ok { "ok".green() } else { "FAILED".red().bold() };
    println!("  Key: {}", check(report.key_matches));
    match &report.index_error {
        Some(reason) => println!("  Index: {} ({reason})", check(false)),
        None => println!("  Index: {} ({} versions)", check(true), report.versions),
    }
    for hash in &report.missing_objects {
        println!("  {} {}", "missing".red(), hash);
    }
    for hash in &report.corrupt_objects {
        println!("  {} {}", "corrupt".red(), hash);
    }
    if !report.orphan_objects.is_empty() {
        println!("  {} unreferenced objects", report.orphan_objects.len().to_string().dimmed());
    }
    if report.is_ok() {
        println!("{} Repository intact", "✓".green().bold());
        Ok(())
    } else {
        anyhow::bail!("repository for {} failed verification", report.identity)
    }
}

fn cmd_hash(file: &Path) -> anyhow::Result<()> {
    let content = read_file(file)?;
    println!("{}", maroon_crypto::hash(&content));
    Ok(())
}
