use anyhow::Result;
use classic_rl_core::{
    explorer::EpsilonGreedy,
    record::LogRecorder,
    tabular::{QLearning, TabularConfig},
    util, Agent, DefaultEvaluator, Env as _, Evaluator as _, Trainer, TrainerConfig,
};
use classic_rl_env::{CartPole, CartPoleConfig};
use clap::Parser;
use serde::Serialize;
use std::{fs, path::Path};

const N_CELLS: [usize; 4] = [1, 6, 12, 12];
const LOW: [f32; 4] = [-2.4, -3.0, -0.21, -3.5];
const HIGH: [f32; 4] = [2.4, 3.0, 0.21, 3.5];
const ALPHA: f32 = 0.2;
const DISCOUNT_FACTOR: f32 = 0.99;
const EPS_START: f64 = 1.0;
const EPS_FINAL: f64 = 0.01;
const EPS_FINAL_STEP: usize = 200_000;
const MAX_EPISODES: usize = 3000;
const EVAL_INTERVAL: usize = 100;
const N_EPISODES_PER_EVAL: usize = 5;
const MODEL_DIR: &str = "./classic-rl/examples/cartpole/model/q_learning_cartpole";

type QLearningAgent = QLearning<CartPole>;

mod config {
    use super::*;

    #[derive(Serialize)]
    pub struct QLearningCartpoleConfig {
        pub env_config: CartPoleConfig,
        pub agent_config: TabularConfig,
        pub trainer_config: TrainerConfig,
    }

    impl QLearningCartpoleConfig {
        pub fn new(max_episodes: usize, model_dir: &str, eval_interval: usize) -> Self {
            let trainer_config = TrainerConfig::default()
                .max_episodes(max_episodes)
                .eval_interval(eval_interval)
                .flush_record_interval(eval_interval)
                .save_interval(max_episodes)
                .model_dir(model_dir);
            Self {
                env_config: create_env_config(),
                agent_config: create_agent_config(),
                trainer_config,
            }
        }
    }

    pub fn create_env_config() -> CartPoleConfig {
        CartPoleConfig::default()
    }

    pub fn create_agent_config() -> TabularConfig {
        let explorer = EpsilonGreedy::with_final_step(EPS_FINAL_STEP)
            .eps_start(EPS_START)
            .eps_final(EPS_FINAL);
        TabularConfig::default()
            .n_cells(N_CELLS.to_vec())
            .bounds(LOW.to_vec(), HIGH.to_vec())
            .alpha(ALPHA)
            .discount_factor(DISCOUNT_FACTOR)
            .explorer(explorer)
    }
}

use config::{create_agent_config, create_env_config, QLearningCartpoleConfig};

/// Train/eval Q-learning agent in cartpole environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train Q-learning agent, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate Q-learning agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// The number of training episodes
    #[arg(long, default_value_t = MAX_EPISODES)]
    episodes: usize,
}

fn build_agent(env: &CartPole) -> Result<QLearningAgent> {
    QLearning::build(
        create_agent_config(),
        env.observation_space(),
        env.action_space().n(),
    )
}

fn train(max_episodes: usize, model_dir: &str, eval_interval: usize) -> Result<()> {
    let config = QLearningCartpoleConfig::new(max_episodes, model_dir, eval_interval);
    fs::create_dir_all(model_dir)?;
    util::save_yaml(&config, Path::new(model_dir).join("config.yaml"))?;

    let mut env = CartPole::build(&config.env_config, 0)?;
    let mut agent = QLearning::build(
        config.agent_config,
        env.observation_space(),
        env.action_space().n(),
    )?;
    let mut recorder = LogRecorder::new();
    let mut evaluator =
        DefaultEvaluator::<CartPole>::new(&config.env_config, 1, N_EPISODES_PER_EVAL)?;
    let mut trainer = Trainer::build(config.trainer_config)?;

    let stats = trainer.train(&mut env, &mut agent, &mut recorder, &mut evaluator)?;
    stats.save_csv(Path::new(model_dir).join("episodes.csv"))?;
    if let Some(mean) = stats.mean_last(100) {
        log::info!("mean return of the last 100 episodes = {}", mean);
    }

    Ok(())
}

fn eval(model_dir: &str) -> Result<()> {
    let env_config = create_env_config();
    let mut agent = {
        let env = CartPole::build(&env_config, 0)?;
        let mut agent = build_agent(&env)?;
        agent.load_params(Path::new(model_dir))?;
        agent.eval();
        agent
    };

    let record = DefaultEvaluator::<CartPole>::new(&env_config, 1, N_EPISODES_PER_EVAL)?
        .evaluate(&mut agent)?;
    log::info!("eval_return = {}", record.get_scalar("eval_return")?);

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.train {
        train(args.episodes, MODEL_DIR, EVAL_INTERVAL)?;
    } else if args.eval {
        eval(&(MODEL_DIR.to_owned() + "/best"))?;
    } else {
        train(args.episodes, MODEL_DIR, EVAL_INTERVAL)?;
        eval(&(MODEL_DIR.to_owned() + "/best"))?;
    }

    Ok(())
}
