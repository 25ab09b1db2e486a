use anyhow::Result;
use classic_rl_candle_agent::{
    dqn::{Dqn, DqnConfig, DqnModelConfig},
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
    util::CriticLoss,
    Device,
};
use classic_rl_core::{
    explorer::EpsilonGreedy, record::LogRecorder, replay_buffer::SimpleReplayBufferConfig, util,
    Agent, DefaultEvaluator, Env as _, Evaluator as _, Trainer, TrainerConfig,
};
use classic_rl_env::{CartPole, CartPoleConfig};
use clap::Parser;
use serde::Serialize;
use std::{fs, path::Path};

const DIM_OBS: usize = 4;
const DIM_ACT: usize = 2;
const LR_CRITIC: f64 = 0.001;
const DISCOUNT_FACTOR: f32 = 0.99;
const BATCH_SIZE: usize = 64;
const TARGET_UPDATE_INTERVAL: usize = 500;
const REPLAY_BUFFER_CAPACITY: usize = 10000;
const EPS_FINAL_STEP: usize = 10000;
const EPS_FINAL: f64 = 0.02;
const CRITIC_LOSS: CriticLoss = CriticLoss::Mse;
const MAX_EPISODES: usize = 300;
const EVAL_INTERVAL: usize = 10;
const N_EPISODES_PER_EVAL: usize = 5;
const MODEL_DIR: &str = "./classic-rl/examples/cartpole/model/dqn_cartpole";

mod config {
    use super::*;

    #[derive(Serialize)]
    pub struct DqnCartpoleConfig {
        pub env_config: CartPoleConfig,
        pub agent_config: DqnConfig<MlpConfig>,
        pub trainer_config: TrainerConfig,
    }

    impl DqnCartpoleConfig {
        pub fn new(
            in_dim: usize,
            out_dim: usize,
            max_episodes: usize,
            model_dir: &str,
            eval_interval: usize,
        ) -> Self {
            let trainer_config = TrainerConfig::default()
                .max_episodes(max_episodes)
                .eval_interval(eval_interval)
                .flush_record_interval(eval_interval)
                .save_interval(max_episodes)
                .model_dir(model_dir);
            Self {
                env_config: create_env_config(),
                agent_config: create_agent_config(in_dim, out_dim),
                trainer_config,
            }
        }
    }

    pub fn create_env_config() -> CartPoleConfig {
        CartPoleConfig::default()
    }

    pub fn create_agent_config(in_dim: usize, out_dim: usize) -> DqnConfig<MlpConfig> {
        let opt_config = OptimizerConfig::default().learning_rate(LR_CRITIC);
        let mlp_config = MlpConfig::new(in_dim, vec![256, 256], out_dim, false);
        let model_config = DqnModelConfig::default()
            .q_config(mlp_config)
            .opt_config(opt_config);
        DqnConfig::default()
            .model_config(model_config)
            .batch_size(BATCH_SIZE)
            .discount_factor(DISCOUNT_FACTOR)
            .target_update_interval(TARGET_UPDATE_INTERVAL)
            .replay_buffer_config(
                SimpleReplayBufferConfig::default().capacity(REPLAY_BUFFER_CAPACITY),
            )
            .explorer(EpsilonGreedy::with_final_step(EPS_FINAL_STEP).eps_final(EPS_FINAL))
            .critic_loss(CRITIC_LOSS)
            .device(Device::Cpu)
    }
}

use config::{create_agent_config, create_env_config, DqnCartpoleConfig};

/// Train/eval DQN agent in cartpole environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train DQN agent, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate DQN agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// The number of training episodes
    #[arg(long, default_value_t = MAX_EPISODES)]
    episodes: usize,
}

fn train(max_episodes: usize, model_dir: &str, eval_interval: usize) -> Result<()> {
    let config = DqnCartpoleConfig::new(DIM_OBS, DIM_ACT, max_episodes, model_dir, eval_interval);
    fs::create_dir_all(model_dir)?;
    util::save_yaml(&config, Path::new(model_dir).join("config.yaml"))?;

    let mut env = CartPole::build(&config.env_config, 0)?;
    let mut agent = Dqn::<CartPole, Mlp>::build(config.agent_config)?;
    let mut recorder = LogRecorder::new();
    let mut evaluator =
        DefaultEvaluator::<CartPole>::new(&config.env_config, 1, N_EPISODES_PER_EVAL)?;
    let mut trainer = Trainer::build(config.trainer_config)?;

    let stats = trainer.train(&mut env, &mut agent, &mut recorder, &mut evaluator)?;
    stats.save_csv(Path::new(model_dir).join("episodes.csv"))?;
    if let Some(mean) = stats.mean_last(10) {
        log::info!("mean return of the last 10 episodes = {}", mean);
    }

    Ok(())
}

fn eval(model_dir: &str) -> Result<()> {
    let env_config = create_env_config();
    let mut agent = {
        let mut agent = Dqn::<CartPole, Mlp>::build(create_agent_config(DIM_OBS, DIM_ACT))?;
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
