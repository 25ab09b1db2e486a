use anyhow::Result;
use classic_rl_candle_agent::{
    actor_critic::{ActorCritic, ActorCriticConfig},
    dqn::{Dqn, DqnConfig, DqnModelConfig},
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
    reinforce::{Reinforce, ReinforceConfig},
    util::{CategoricalActorConfig, ValueCriticConfig},
    Device,
};
use classic_rl_core::{
    explorer::EpsilonGreedy, record::NullRecorder, replay_buffer::SimpleReplayBufferConfig,
    Agent, DefaultEvaluator, Env, Trainer, TrainerConfig,
};
use classic_rl_env::{TwoStateMdp, TwoStateMdpConfig};

fn train<A: Agent<TwoStateMdp>>(agent: &mut A, max_episodes: usize) -> Result<()> {
    let env_config = TwoStateMdpConfig::default().max_steps(20);
    let mut env = TwoStateMdp::build(&env_config, 0)?;
    let mut evaluator = DefaultEvaluator::<TwoStateMdp>::new(&env_config, 0, 1)?;
    let mut trainer = Trainer::build(TrainerConfig::default().max_episodes(max_episodes))?;
    let stats = trainer.train(&mut env, agent, &mut NullRecorder::new(), &mut evaluator)?;
    assert_eq!(stats.len(), max_episodes);
    Ok(())
}

fn actor_config() -> CategoricalActorConfig<MlpConfig> {
    CategoricalActorConfig::default()
        .policy_config(MlpConfig::new(1, vec![16], 2, false))
        .opt_config(OptimizerConfig::Adam { lr: 0.01 })
}

#[test]
fn test_dqn_prefers_terminating_action() -> Result<()> {
    let model_config = DqnModelConfig::default()
        .q_config(MlpConfig::new(1, vec![16], 2, false))
        .opt_config(OptimizerConfig::Adam { lr: 0.01 });
    let config = DqnConfig::default()
        .model_config(model_config)
        .batch_size(16)
        .discount_factor(0.9)
        .target_update_interval(20)
        .replay_buffer_config(SimpleReplayBufferConfig::default().capacity(1000))
        .explorer(EpsilonGreedy::with_final_step(500).eps_final(0.1))
        .device(Device::Cpu);
    let mut agent = Dqn::<TwoStateMdp, Mlp>::build(config)?;

    train(&mut agent, 400)?;

    let q = agent.action_values(&TwoStateMdp::obs(0))?;
    assert!(q[0] > q[1], "Q(0, .) = {:?}", q);
    Ok(())
}

#[test]
fn test_reinforce_prefers_terminating_action() -> Result<()> {
    let config = ReinforceConfig::default()
        .actor_config(actor_config())
        .discount_factor(0.9)
        .device(Device::Cpu);
    let mut agent = Reinforce::<TwoStateMdp, Mlp>::build(config)?;
    let p0 = agent.action_probs(&TwoStateMdp::obs(0))?[0];

    train(&mut agent, 300)?;

    let p1 = agent.action_probs(&TwoStateMdp::obs(0))?[0];
    assert!(p1 > p0.max(0.5), "pi(0|0) = {} -> {}", p0, p1);
    Ok(())
}

#[test]
fn test_actor_critic_prefers_terminating_action() -> Result<()> {
    let critic_config = ValueCriticConfig::default()
        .value_config(MlpConfig::new(1, vec![16], 1, false))
        .opt_config(OptimizerConfig::Adam { lr: 0.01 });
    let config = ActorCriticConfig::default()
        .actor_config(actor_config())
        .critic_config(critic_config)
        .discount_factor(0.9)
        .device(Device::Cpu);
    let mut agent = ActorCritic::<TwoStateMdp, Mlp, Mlp>::build(config)?;
    let p0 = agent.action_probs(&TwoStateMdp::obs(0))?[0];

    train(&mut agent, 300)?;

    let p1 = agent.action_probs(&TwoStateMdp::obs(0))?[0];
    assert!(p1 > p0.max(0.5), "pi(0|0) = {} -> {}", p0, p1);
    // V(0) approaches 1 as the policy terminates immediately
    assert!(agent.state_value(&TwoStateMdp::obs(0))? > 0.5);
    Ok(())
}
