//! One-step Actor-Critic agent implemented with candle.
use super::ActorCriticConfig;
use crate::{
    model::SubModel1,
    util::{obs_to_tensor, CategoricalActor, OutDim, ValueCritic},
};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use classic_rl_core::{
    error::RlError,
    explorer::{argmax_random_tie, sample_categorical},
    record::{Record, RecordValue},
    Act, Agent, Env, Policy, Transition,
};
use rand::{rngs::SmallRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, marker::PhantomData, path::Path};

/// One-step Actor-Critic agent.
///
/// Both networks are updated at every step. Given a transition `(s, a, r, s')`:
///
/// 1. TD target `y = r` if `s'` is terminal, else `y = r + gamma * V(s')`.
/// 2. TD error `delta = y - V(s)`.
/// 3. The critic minimizes `-delta * V(s)`, with `delta` held constant.
/// 4. The actor minimizes `-log pi(a | s) * delta * I`.
/// 5. If the episode goes on, `I` is multiplied by `gamma`.
///
/// The emphasis `I` is set to 1 at [`Agent::reset`].
pub struct ActorCritic<E, P, V>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    actor: CategoricalActor<P>,
    critic: ValueCritic<V>,
    discount_factor: f32,
    emphasis: f32,
    device: Device,
    train: bool,
    rng: SmallRng,
    phantom: PhantomData<E>,
}

impl<E, P, V> ActorCritic<E, P, V>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs Actor-Critic agent.
    pub fn build(config: ActorCriticConfig<P::Config, V::Config>) -> Result<Self> {
        config.validate()?;
        let device: Device = config
            .device
            .context("No device is given for Actor-Critic agent")?
            .try_into()?;
        let actor = CategoricalActor::build(config.actor_config, device.clone())?;
        let critic = ValueCritic::build(config.critic_config, device.clone())?;

        Ok(Self {
            actor,
            critic,
            discount_factor: config.discount_factor,
            emphasis: 1.0,
            device,
            train: false,
            rng: SmallRng::seed_from_u64(config.seed),
            phantom: PhantomData,
        })
    }

    /// The running emphasis factor `I` of the current episode.
    pub fn emphasis(&self) -> f32 {
        self.emphasis
    }

    /// The actor.
    pub fn get_actor(&self) -> &CategoricalActor<P> {
        &self.actor
    }

    /// The critic.
    pub fn get_critic(&self) -> &ValueCritic<V> {
        &self.critic
    }

    /// Action probabilities of an observation.
    pub fn action_probs(&self, obs: &E::Obs) -> Result<Vec<f32>> {
        let probs = self.actor.probs(&obs_to_tensor([obs], &self.device)?)?;
        Ok(probs.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// State value of an observation.
    pub fn state_value(&self, obs: &E::Obs) -> Result<f32> {
        let v = self.critic.forward(&obs_to_tensor([obs], &self.device)?)?;
        Ok(v.squeeze(0)?.to_scalar::<f32>()?)
    }

    fn update(&mut self, tr: &Transition<E::Obs, E::Act>) -> Result<Record> {
        let obs = obs_to_tensor([&tr.obs], &self.device)?;
        let v = self.critic.forward(&obs)?;

        let td_target = match tr.is_terminated {
            true => tr.reward,
            false => tr.reward + self.discount_factor * self.state_value(&tr.next_obs)?,
        };
        let td_error = td_target - v.squeeze(0)?.to_scalar::<f32>()?;

        let loss_critic = (v * -(td_error as f64))?.sum_all()?;
        self.critic.backward_step(&loss_critic)?;

        let act = Tensor::from_vec(vec![tr.act.index() as u32], (1,), &self.device)?;
        let logp = self.actor.log_prob(&obs, &act)?;
        let loss_actor = (logp * -((td_error * self.emphasis) as f64))?.sum_all()?;
        self.actor.backward_step(&loss_actor)?;

        Ok(Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic.to_scalar()?)),
            ("loss_actor", RecordValue::Scalar(loss_actor.to_scalar()?)),
            ("td_error", RecordValue::Scalar(td_error)),
            ("emphasis", RecordValue::Scalar(self.emphasis)),
        ]))
    }
}

impl<E, P, V> Policy<E> for ActorCritic<E, P, V>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Samples from the policy in training mode, takes the most probable action
    /// in evaluation mode.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let probs = self.action_probs(obs)?;
        let a = if self.train {
            sample_categorical(&probs, &mut self.rng)?
        } else {
            argmax_random_tie(&probs, &mut self.rng)?
        };
        Ok(E::Act::from_index(a))
    }
}

impl<E, P, V> Agent<E> for ActorCritic<E, P, V>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
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

    fn reset(&mut self, _init_obs: &E::Obs) {
        self.emphasis = 1.0;
    }

    fn observe(&mut self, tr: Transition<E::Obs, E::Act>) -> Result<Option<Record>> {
        let n = self.actor.out_dim();
        let act = tr.act.index();
        if act >= n {
            return Err(RlError::ActionOutOfRange { act, n }.into());
        }

        let record = self.update(&tr)?;
        if !tr.is_done() {
            self.emphasis *= self.discount_factor;
        }
        Ok(Some(record))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.actor.save(path.join("actor.safetensors"))?;
        self.critic.save(path.join("critic.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.actor.load(path.join("actor.safetensors"))?;
        self.critic.load(path.join("critic.safetensors"))?;
        Ok(())
    }
}
