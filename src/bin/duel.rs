//! Terminal duel driver
//!
//! Plays one match in the terminal. Manual fighters read `A` (normal) or `S`
//! (special) from stdin; random fighters pick on their own.

use std::error::Error;
use std::io::{self, BufRead, Write};

use clap::Parser;
use duel_core::{
    CombatantKind, Duel, FighterConfig, MatchConfig, OutcomeReason, PolicyMode, RuleError,
    TurnOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "duel")]
#[command(about = "Play a two-fighter turn-based duel in the terminal")]
struct Args {
    /// JSON match config; overrides the fighter flags below
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[arg(long, default_value = "Sophia")]
    p1_name: String,

    /// brawler or caster
    #[arg(long, default_value = "brawler")]
    p1_kind: String,

    /// manual or random
    #[arg(long, default_value = "manual")]
    p1_policy: String,

    #[arg(long, default_value = "Ashas")]
    p2_name: String,

    #[arg(long, default_value = "caster")]
    p2_kind: String,

    #[arg(long, default_value = "random")]
    p2_policy: String,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter, e.g. `info` or `duel_core=debug`
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn fighter(name: &str, kind: &str, policy: &str) -> Result<FighterConfig, RuleError> {
    let kind: CombatantKind = kind.parse().map_err(|_| RuleError::InvalidConfig {
        reason: format!("unknown fighter kind `{kind}`"),
    })?;
    let policy: PolicyMode = policy.parse().map_err(|_| RuleError::InvalidConfig {
        reason: format!("unknown policy `{policy}`"),
    })?;
    Ok(FighterConfig::new(name, kind, policy))
}

fn load_config(args: &Args) -> Result<MatchConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => MatchConfig::new(
            fighter(&args.p1_name, &args.p1_kind, &args.p1_policy)?,
            fighter(&args.p2_name, &args.p2_kind, &args.p2_policy)?,
        ),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn print_status(duel: &Duel) {
    for combatant in duel.roster().combatants() {
        println!("  {combatant}");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = load_config(&args)?;
    let mut duel = Duel::new(&config)?;
    tracing::info!(seed = ?config.seed, "duel starting");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("\n=== DUEL ===");
    print_status(&duel);

    while duel.outcome().is_none() {
        let Some(actor) = duel.next_actor().cloned() else {
            // 无人可行动；再推进一步以记录结果
            match duel.step(None) {
                Ok(_) | Err(RuleError::MatchFinished) => break,
                Err(error) => return Err(error.into()),
            }
        };

        let key = if duel.policy_for(actor.id())?.is_manual() {
            print!("{} - [A] normal, [S] special: ", actor.name);
            io::stdout().flush()?;
            match lines.next() {
                Some(line) => Some(line?.trim().to_owned()),
                None => break,
            }
        } else {
            None
        };

        match duel.step(key.as_deref()) {
            Ok(TurnOutcome::Resolved { resolution, .. }) => {
                println!(
                    "{} uses {} for {} damage",
                    actor.name, resolution.action, resolution.damage
                );
                print_status(&duel);
            }
            Ok(TurnOutcome::Rejected { .. }) => {
                println!("{} cannot do that, try again", actor.name);
            }
            Err(RuleError::MatchFinished) => break,
            Err(error) => return Err(error.into()),
        }
    }

    match duel.outcome() {
        Some(outcome) => {
            let winner = outcome
                .winner
                .and_then(|id| duel.roster().get(id))
                .map(|combatant| combatant.name.clone());
            match (winner, &outcome.reason) {
                (Some(name), _) => println!("\n{name} wins!"),
                (None, OutcomeReason::Exhaustion) => println!("\nBoth fighters are spent. Draw."),
                (None, _) => println!("\nDraw."),
            }
        }
        None => println!("\nMatch abandoned."),
    }

    Ok(())
}
