//! REINFORCE agent implemented with candle.
use super::ReinforceConfig;
use crate::{
    model::SubModel1,
    util::{obs_to_tensor, CategoricalActor, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use classic_rl_core::{
    error::RlError,
    explorer::{argmax_random_tie, sample_categorical},
    record::{Record, RecordValue},
    util::discounted_returns,
    Act, Agent, Env, Policy, Transition,
};
use rand::{rngs::SmallRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, marker::PhantomData, path::Path};

/// Monte-Carlo policy gradient agent.
///
/// Transitions of an episode are kept until the episode ends. Then the discounted
/// returns `G_t` are computed backward from the end and the policy is updated once
/// with the loss `-sum_t log pi(a_t | s_t) * G_t`. The returns are neither
/// baseline-subtracted nor normalized, so the gradient estimate has high variance.
pub struct Reinforce<E, P>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    actor: CategoricalActor<P>,
    discount_factor: f32,
    device: Device,
    train: bool,
    rng: SmallRng,
    // (o_t, a_t, r_t) of the running episode
    episode: Vec<(E::Obs, u32, f32)>,
    phantom: PhantomData<E>,
}

impl<E, P> Reinforce<E, P>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs REINFORCE agent.
    pub fn build(config: ReinforceConfig<P::Config>) -> Result<Self> {
        config.validate()?;
        let device: Device = config
            .device
            .context("No device is given for REINFORCE agent")?
            .try_into()?;
        let actor = CategoricalActor::build(config.actor_config, device.clone())?;

        Ok(Self {
            actor,
            discount_factor: config.discount_factor,
            device,
            train: false,
            rng: SmallRng::seed_from_u64(config.seed),
            episode: vec![],
            phantom: PhantomData,
        })
    }

    /// The policy.
    pub fn get_actor(&self) -> &CategoricalActor<P> {
        &self.actor
    }

    /// The number of transitions kept for the running episode.
    pub fn episode_len(&self) -> usize {
        self.episode.len()
    }

    /// Action probabilities of an observation.
    pub fn action_probs(&self, obs: &E::Obs) -> Result<Vec<f32>> {
        let probs = self.actor.probs(&obs_to_tensor([obs], &self.device)?)?;
        Ok(probs.squeeze(0)?.to_vec1::<f32>()?)
    }

    fn update_actor(&mut self) -> Result<Record> {
        let episode = std::mem::take(&mut self.episode);
        let len = episode.len();
        let rewards = episode.iter().map(|e| e.2).collect::<Vec<_>>();
        let returns = discounted_returns(&rewards, self.discount_factor);

        let obs = obs_to_tensor(episode.iter().map(|e| &e.0), &self.device)?;
        let act = Tensor::from_vec(
            episode.iter().map(|e| e.1).collect::<Vec<_>>(),
            (len,),
            &self.device,
        )?;
        let ret = Tensor::from_vec(returns.clone(), (len,), &self.device)?;

        let logp = self.actor.log_prob(&obs, &act)?;
        let loss = (logp * ret)?.sum_all()?.neg()?;
        self.actor.backward_step(&loss)?;

        Ok(Record::from_slice(&[
            ("loss_actor", RecordValue::Scalar(loss.to_scalar::<f32>()?)),
            ("return_0", RecordValue::Scalar(returns[0])),
        ]))
    }
}

impl<E, P> Policy<E> for Reinforce<E, P>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
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

impl<E, P> Agent<E> for Reinforce<E, P>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
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
        self.episode.clear();
    }

    fn observe(&mut self, tr: Transition<E::Obs, E::Act>) -> Result<Option<Record>> {
        let n = self.actor.out_dim();
        let act = tr.act.index();
        if act >= n {
            return Err(RlError::ActionOutOfRange { act, n }.into());
        }
        let done = tr.is_done();
        self.episode.push((tr.obs, act as u32, tr.reward));

        match done {
            true => Ok(Some(self.update_actor()?)),
            false => Ok(None),
        }
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.actor.save(path.join("actor.safetensors"))
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.actor.load(path.join("actor.safetensors"))
    }
}
