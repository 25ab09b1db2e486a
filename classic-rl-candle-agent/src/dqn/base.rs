//! DQN agent implemented with candle.
use super::{config::DqnConfig, model::DqnModel};
use crate::{
    model::SubModel1,
    util::{hard_update, obs_to_tensor, smooth_l1_loss, track, CriticLoss, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{shape::D, Device, Tensor};
use candle_nn::loss::mse;
use classic_rl_core::{
    error::RlError,
    explorer::{argmax_random_tie, EpsilonGreedy},
    record::{Record, RecordValue},
    replay_buffer::SimpleReplayBuffer,
    util::one_hot,
    Act, Agent, Env, ExperienceBufferBase, Policy, ReplayBufferBase, Transition,
};
use log::trace;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, marker::PhantomData, path::Path};

#[allow(clippy::upper_case_acronyms)]
/// DQN agent implemented with candle.
///
/// Each transition given to [`Agent::observe`] is pushed to the replay buffer. Once
/// the buffer holds at least `batch_size` transitions, a minibatch is sampled and
/// the online network is updated toward the TD targets
/// `r + gamma * (1 - terminated) * max_a Q_tgt(s', a)`. The target network is
/// synchronized with the online network every `target_update_interval`
/// environment steps, after the optimization of that step.
pub struct Dqn<E, Q>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    qnet: DqnModel<Q>,
    qnet_tgt: DqnModel<Q>,
    buffer: SimpleReplayBuffer<E::Obs, E::Act>,
    batch_size: usize,
    discount_factor: f32,
    target_update_interval: usize,
    target_update_counter: usize,
    tau: Option<f64>,
    explorer: EpsilonGreedy,
    critic_loss: CriticLoss,
    device: Device,
    train: bool,
    n_opts: usize,
    rng: SmallRng,
    phantom: PhantomData<E>,
}

impl<E, Q> Dqn<E, Q>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs DQN agent.
    ///
    /// The target network starts as a copy of the online network.
    pub fn build(config: DqnConfig<Q::Config>) -> Result<Self> {
        config.validate()?;
        let device: Device = config
            .device
            .context("No device is given for DQN agent")?
            .try_into()?;
        let qnet = DqnModel::build(config.model_config.clone(), device.clone())?;
        let qnet_tgt = DqnModel::build(config.model_config, device.clone())?;
        hard_update(qnet_tgt.get_varmap(), qnet.get_varmap())?;
        let buffer = SimpleReplayBuffer::build(&config.replay_buffer_config)?;

        Ok(Dqn {
            qnet,
            qnet_tgt,
            buffer,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            target_update_interval: config.target_update_interval,
            target_update_counter: 0,
            tau: config.tau,
            explorer: config.explorer,
            critic_loss: config.critic_loss,
            device,
            train: false,
            n_opts: 0,
            rng: SmallRng::seed_from_u64(config.seed),
            phantom: PhantomData,
        })
    }

    /// The online network.
    pub fn get_qnet(&self) -> &DqnModel<Q> {
        &self.qnet
    }

    /// The target network.
    pub fn get_qnet_tgt(&self) -> &DqnModel<Q> {
        &self.qnet_tgt
    }

    /// The replay buffer.
    pub fn replay_buffer(&self) -> &SimpleReplayBuffer<E::Obs, E::Act> {
        &self.buffer
    }

    /// The number of optimization steps done so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Action values of an observation.
    pub fn action_values(&self, obs: &E::Obs) -> Result<Vec<f32>> {
        let q = self.qnet.forward(&obs_to_tensor([obs], &self.device)?)?;
        Ok(q.squeeze(0)?.to_vec1::<f32>()?)
    }

    fn update_critic(&mut self) -> Result<Record> {
        let batch = self.buffer.batch(self.batch_size)?;
        let (obs, act, next_obs, reward, is_terminated) = batch.unpack();
        let batch_size = reward.len();
        let n_actions = self.qnet.out_dim;

        let obs = obs_to_tensor(&obs, &self.device)?;
        let next_obs = obs_to_tensor(&next_obs, &self.device)?;
        let act = {
            let v = act
                .iter()
                .flat_map(|a| one_hot(a.index(), n_actions))
                .collect::<Vec<_>>();
            Tensor::from_vec(v, (batch_size, n_actions), &self.device)?
        };
        let reward = Tensor::from_vec(reward, (batch_size,), &self.device)?;
        let is_not_terminated = {
            let v = is_terminated
                .into_iter()
                .map(|v| (1 - v) as f32)
                .collect::<Vec<_>>();
            Tensor::from_vec(v, (batch_size,), &self.device)?
        };

        // TD targets of the taken actions
        let td_target = {
            let q_next = self.qnet_tgt.forward(&next_obs)?.max(D::Minus1)?;
            ((is_not_terminated * self.discount_factor as f64)?.mul(&q_next)? + reward)?.detach()
        };

        // Predictions with the taken-action entries overwritten by the TD targets
        let pred = self.qnet.forward(&obs)?;
        let tgt = {
            let keep = (1.0 - &act)?;
            let x = (pred.detach() * keep)?;
            (x + act.broadcast_mul(&td_target.unsqueeze(D::Minus1)?)?)?
        };

        let loss = match self.critic_loss {
            CriticLoss::Mse => mse(&pred, &tgt)?,
            CriticLoss::SmoothL1 => smooth_l1_loss(&pred, &tgt)?,
        };
        self.qnet.backward_step(&loss)?;
        self.n_opts += 1;

        let q_mean = pred.mean_all()?.to_scalar::<f32>()?;
        Ok(Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss.to_scalar::<f32>()?)),
            ("q_mean", RecordValue::Scalar(q_mean)),
        ]))
    }

    fn update_target(&mut self) -> Result<()> {
        trace!("Update target network at n_opts = {}", self.n_opts);
        match self.tau {
            None => hard_update(self.qnet_tgt.get_varmap(), self.qnet.get_varmap()),
            Some(tau) => track(self.qnet_tgt.get_varmap(), self.qnet.get_varmap(), tau),
        }
    }
}

impl<E, Q> Policy<E> for Dqn<E, Q>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Epsilon-greedy in training mode, greedy in evaluation mode.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let values = self.action_values(obs)?;
        let a = if self.train {
            self.explorer.action(&values, &mut self.rng)?
        } else {
            argmax_random_tie(&values, &mut self.rng)?
        };
        Ok(E::Act::from_index(a))
    }
}

impl<E, Q> Agent<E> for Dqn<E, Q>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn observe(&mut self, tr: Transition<E::Obs, E::Act>) -> Result<Option<Record>> {
        let n = self.qnet.out_dim;
        if tr.act.index() >= n {
            return Err(RlError::ActionOutOfRange {
                act: tr.act.index(),
                n,
            }
            .into());
        }
        self.buffer.push(tr)?;

        // Skip optimization until a minibatch can be sampled
        let record = if self.buffer.len() >= self.batch_size {
            let mut record = self.update_critic()?;
            record.insert(
                "epsilon",
                RecordValue::Scalar(self.explorer.epsilon() as f32),
            );
            Some(record)
        } else {
            None
        };

        self.target_update_counter += 1;
        if self.target_update_counter == self.target_update_interval {
            self.target_update_counter = 0;
            self.update_target()?;
        }

        Ok(record)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.safetensors"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(path.join("qnet.safetensors"))?;
        self.qnet_tgt.load(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dqn::DqnModelConfig,
        mlp::{Mlp, MlpConfig},
        opt::OptimizerConfig,
        util::flatten_vars,
    };
    use classic_rl_core::{replay_buffer::SimpleReplayBufferConfig, DiscreteAct, VecObs};
    use classic_rl_env::TwoStateMdp;
    use tempdir::TempDir;

    fn build(batch_size: usize, target_update_interval: usize) -> Result<Dqn<TwoStateMdp, Mlp>> {
        let config = DqnConfig::default()
            .model_config(
                DqnModelConfig::default()
                    .q_config(MlpConfig::new(1, vec![8], 2, false))
                    .opt_config(OptimizerConfig::Adam { lr: 0.01 }),
            )
            .batch_size(batch_size)
            .target_update_interval(target_update_interval)
            .replay_buffer_config(SimpleReplayBufferConfig::default().capacity(100))
            .device(crate::Device::Cpu);
        let mut agent = Dqn::build(config)?;
        agent.train();
        Ok(agent)
    }

    fn transition(act: usize) -> Transition<VecObs, DiscreteAct> {
        Transition {
            obs: VecObs(vec![0.0]),
            act: DiscreteAct(act),
            reward: 1.0,
            next_obs: VecObs(vec![0.0]),
            is_terminated: true,
            is_truncated: false,
        }
    }

    #[test]
    fn test_target_sync() -> Result<()> {
        let interval = 3;
        let mut agent = build(1, interval)?;
        let mut snapshot = flatten_vars(agent.get_qnet_tgt().get_varmap())?;
        assert_eq!(snapshot, flatten_vars(agent.get_qnet().get_varmap())?);

        for step in 1..=3 * interval + 1 {
            agent.observe(transition(0))?;
            let online = flatten_vars(agent.get_qnet().get_varmap())?;
            let target = flatten_vars(agent.get_qnet_tgt().get_varmap())?;
            if step % interval == 0 {
                assert_eq!(online, target);
                snapshot = target;
            } else {
                assert_ne!(online, target);
                assert_eq!(snapshot, target);
            }
        }
        assert_eq!(agent.n_opts(), 3 * interval + 1);
        Ok(())
    }

    #[test]
    fn test_skip_until_batch_is_available() -> Result<()> {
        let mut agent = build(4, 100)?;
        for _ in 0..3 {
            assert!(agent.observe(transition(1))?.is_none());
        }
        let record = agent.observe(transition(1))?.unwrap();
        assert!(record.get_scalar("loss_critic")? >= 0.0);
        assert_eq!(agent.n_opts(), 1);
        assert_eq!(agent.replay_buffer().len(), 4);
        Ok(())
    }

    #[test]
    fn test_action_out_of_range() -> Result<()> {
        let mut agent = build(1, 1)?;
        assert!(agent.observe(transition(2)).is_err());
        assert_eq!(agent.replay_buffer().len(), 0);
        Ok(())
    }

    #[test]
    fn test_eval_is_greedy() -> Result<()> {
        let mut agent = build(1, 1)?;
        agent.eval();
        let obs = VecObs(vec![1.0]);
        let values = agent.action_values(&obs)?;
        let a = agent.sample(&obs)?;
        assert_eq!(values[a.0], values.iter().copied().fold(f32::MIN, f32::max));
        Ok(())
    }

    #[test]
    fn test_save_and_load_params() -> Result<()> {
        let mut agent = build(1, 2)?;
        for _ in 0..3 {
            agent.observe(transition(0))?;
        }
        let dir = TempDir::new("dqn")?;
        agent.save_params(dir.path())?;

        let mut agent_ = build(1, 2)?;
        agent_.load_params(dir.path())?;
        for (a, b) in [
            (agent.get_qnet(), agent_.get_qnet()),
            (agent.get_qnet_tgt(), agent_.get_qnet_tgt()),
        ] {
            assert_eq!(flatten_vars(a.get_varmap())?, flatten_vars(b.get_varmap())?);
        }
        Ok(())
    }
}
