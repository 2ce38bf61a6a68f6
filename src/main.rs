mod export;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flatplate_calc::{FlatPlateEnv, PolarState, SimConfig, ACTION_LIMIT};

use crate::export::HistoryBuffer;

/// Steering gain of the proportional policy (rad of pitch per rad of bearing)
const PROPORTIONAL_GAIN: f64 = 2.0;

/// Built-in policies standing in for a trained agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Never pitch.
    Zero,
    /// Uniform random pitch within the action bounds.
    Random,
    /// Pitch against the bearing offset from the A→B line.
    Proportional,
}

/// Run flat plate episodes and export their trajectories.
#[derive(Parser, Debug)]
#[command(name = "flatplate")]
struct Args {
    /// JSON config with MAX_EPISODES, MAX_STEPS, DELTA_TIME, POINTB_CHANGE, ACTION_SIGMA, XB
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Episodes to run (defaults to MAX_EPISODES)
    #[arg(short, long)]
    episodes: Option<usize>,

    #[arg(short, long, value_enum, default_value_t = Policy::Proportional)]
    policy: Policy,

    /// Overrides SEED from the config
    #[arg(short, long)]
    seed: Option<u64>,

    /// Start point A and initial velocity: xA yA uA vA
    #[arg(long, num_args = 4, default_values_t = [0.0, 0.0, 0.0, 0.0], allow_negative_numbers = true)]
    start: Vec<f64>,

    /// Initial target point B: xB yB
    #[arg(long, num_args = 2, default_values_t = [-10.0, -1.0], allow_negative_numbers = true)]
    target: Vec<f64>,

    /// Directory for the CSV histories
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::new(100, 500, 0.01, 10, 0.01, -20.0),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let episodes = args.episodes.unwrap_or(config.max_episodes);

    let initial: [f64; 4] = args.start.as_slice().try_into().context("--start takes 4 values")?;
    let target: [f64; 2] = args.target.as_slice().try_into().context("--target takes 2 values")?;

    let mut env = FlatPlateEnv::new(initial, target, config.clone())?;
    let mut history = HistoryBuffer::new(&config, &env.initial_state());
    let mut policy_rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(1));

    println!("Physical Constants:");
    let mut summary: Vec<_> = env.constants().summary().into_iter().collect();
    summary.sort();
    for (k, v) in summary {
        println!("  {}: {}", k, v);
    }
    println!();

    let mut total_reward = 0.0;
    let mut arrivals = 0;

    for _ in 0..episodes {
        let mut state = env.reset(None)?;

        while !env.log().is_full() {
            let action = choose_action(args.policy, &state, &mut policy_rng);
            let step = env.step(action)?;
            state = step.state;
            if step.done {
                break;
            }
        }

        history.fill_episode(env.episode(), env.log())?;

        let summary = env.summary();
        total_reward += summary.total_reward;
        if summary.cause == Some(flatplate_calc::TerminationCause::Arrived) {
            arrivals += 1;
        }
        info!(
            episode = summary.episode,
            steps = summary.steps,
            reward = summary.total_reward,
            final_rho = summary.final_rho,
            path_length = summary.path_length,
            cause = ?summary.cause,
            "episode finished"
        );
    }

    history.set_targets(env.target_history())?;

    println!("------------------------- Result -------------------------");
    println!("Policy:                       {:?}", args.policy);
    println!("Episodes:                     {}", episodes);
    println!("Target relocations:           {}", env.relocations());
    if let Some(b) = history.targets().outer_iter().nth(env.relocations()) {
        println!("Final target B:               ({:.3}, {:.3})", b[0], b[1]);
    }
    println!("Arrivals:                     {}", arrivals);
    if episodes > 0 {
        println!("Mean episode reward:          {:.3}", total_reward / episodes as f64);
    }

    if let Some(dir) = &args.output {
        history.save(dir)?;
        println!("Histories written to {}", dir.display());
    }

    Ok(())
}

fn choose_action(policy: Policy, state: &PolarState, rng: &mut ChaCha8Rng) -> f64 {
    match policy {
        Policy::Zero => 0.0,
        Policy::Random => rng.random_range(-ACTION_LIMIT..=ACTION_LIMIT),
        Policy::Proportional => (-PROPORTIONAL_GAIN * state.theta).clamp(-ACTION_LIMIT, ACTION_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportional_policy_saturates() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let state = PolarState::new(5.0, 1.0, 0.0, 0.0);
        assert_eq!(choose_action(Policy::Proportional, &state, &mut rng), -ACTION_LIMIT);

        let state = PolarState::new(5.0, -0.01, 0.0, 0.0);
        approx::assert_relative_eq!(choose_action(Policy::Proportional, &state, &mut rng), 0.02);
    }

    #[test]
    fn test_random_policy_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let state = PolarState::default();
        for _ in 0..100 {
            let a = choose_action(Policy::Random, &state, &mut rng);
            assert!(a.abs() <= ACTION_LIMIT);
        }
        assert_eq!(choose_action(Policy::Zero, &state, &mut rng), 0.0);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["flatplate", "--policy", "random", "--target", "-5", "0.5", "-e", "3"]);
        assert_eq!(args.policy, Policy::Random);
        assert_eq!(args.target, vec![-5.0, 0.5]);
        assert_eq!(args.episodes, Some(3));
        assert_eq!(args.start, vec![0.0; 4]);
    }
}
