//! Train [`Agent`].
mod config;
mod stats;
use crate::{
    record::{
        Record,
        RecordValue::{DateTime, Scalar},
        Recorder,
    },
    Agent, Env, Evaluator, Obs, Transition,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
use log::{debug, info, warn};
use std::path::Path;
pub use stats::EpisodeStats;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episode loop.
///
/// # Training loop
///
/// 1. For each episode `1..=max_episodes`:
///     1. Set the agent to training mode, reset [`Env`] and call [`Agent::reset`]
///        with the initial observation.
///     2. Repeat environment steps until the episode is terminated or truncated:
///         * Sample an action with the agent, step the environment.
///         * If the episode reached `max_steps_per_episode`, mark the step as truncated.
///         * Give the [`Transition`] to [`Agent::observe`]. The record returned by the
///           agent, if any, is stored in the recorder.
///     3. Append the episode return and length to [`EpisodeStats`] and store them in
///        the recorder as `"episode_return"` and `"episode_length"`.
///     4. If `episode % flush_record_interval == 0`, flush the recorder.
///     5. If `episode % eval_interval == 0`, evaluate the agent in evaluation mode.
///        The result is written to the recorder with the episode number and the wall-clock
///        time as `"datetime"`. If the mean return is the best so far,
///        the parameters are saved in `(model_dir)/best`.
///     6. If `episode % save_interval == 0`, the parameters are saved in
///        `(model_dir)/(episode)`.
/// 2. Return the [`EpisodeStats`].
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|"Step&lt;E: Env&gt;"|C[Trainer]
///     C -->|Transition|A
///     C -->|Record|D[Recorder]
/// ```
///
/// [`Transition`]: crate::Transition
pub struct Trainer {
    config: TrainerConfig,
    max_eval_return: f32,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            max_eval_return: f32::MIN,
        })
    }

    fn save_model<E: Env, A: Agent<E>>(agent: &A, model_dir: &Path) {
        match agent.save_params(model_dir) {
            Ok(()) => info!("Saved the model in {:?}.", model_dir),
            Err(e) => warn!("Failed to save model in {:?}: {}", model_dir, e),
        }
    }

    /// Runs a single training episode.
    ///
    /// Returns the cumulative reward and the number of steps. Fails with
    /// [`RlError::ObsDimMismatch`] if an observation does not match
    /// [`Env::observation_space`].
    ///
    /// [`RlError::ObsDimMismatch`]: crate::error::RlError::ObsDimMismatch
    pub fn run_episode<E, A>(
        &self,
        env: &mut E,
        agent: &mut A,
        recorder: &mut dyn Recorder,
    ) -> Result<(f32, usize)>
    where
        E: Env,
        A: Agent<E>,
    {
        let mut obs = env.reset()?;
        env.observation_space().check_dim(obs.as_slice())?;
        agent.reset(&obs);
        let mut episode_return = 0f32;
        let mut episode_length = 0usize;

        loop {
            let act = agent.sample(&obs)?;
            let (mut step, record_env) = env.step(&act)?;
            env.observation_space().check_dim(step.obs.as_slice())?;
            episode_length += 1;
            episode_return += step.reward;
            if let Some(max_steps) = self.config.max_steps_per_episode {
                if episode_length >= max_steps && !step.is_terminated {
                    step.is_truncated = true;
                }
            }
            if !record_env.is_empty() {
                recorder.store(record_env);
            }

            let done = step.is_done();
            let next_obs = step.obs.clone();
            if let Some(record) = agent.observe(Transition::from_step(obs, step))? {
                recorder.store(record);
            }
            if done {
                break;
            }
            obs = next_obs;
        }

        Ok((episode_return, episode_length))
    }

    /// Train the agent.
    pub fn train<E, A, D>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        recorder: &mut dyn Recorder,
        evaluator: &mut D,
    ) -> Result<EpisodeStats>
    where
        E: Env,
        A: Agent<E>,
        D: Evaluator<E>,
    {
        let mut stats = EpisodeStats::new();

        for episode in 1..=self.config.max_episodes {
            agent.train();
            let (episode_return, episode_length) = self.run_episode(env, agent, recorder)?;
            debug!(
                "episode = {}, return = {}, length = {}",
                episode, episode_return, episode_length
            );
            stats.push(episode_return, episode_length);
            recorder.store(Record::from_slice(&[
                ("episode_return", Scalar(episode_return)),
                ("episode_length", Scalar(episode_length as f32)),
            ]));

            if episode % self.config.flush_record_interval == 0 {
                recorder.flush(episode as i64);
            }

            if episode % self.config.eval_interval == 0 {
                agent.eval();
                let mut record = evaluator.evaluate(agent)?;
                agent.train();
                let eval_return = record.get_scalar("eval_return")?;
                info!("episode = {}, eval_return = {}", episode, eval_return);

                if eval_return > self.max_eval_return {
                    self.max_eval_return = eval_return;
                    if let Some(model_dir) = &self.config.model_dir {
                        Self::save_model::<E, A>(agent, &Path::new(model_dir).join("best"));
                    }
                }
                record.insert("episode", Scalar(episode as f32));
                record.insert("datetime", DateTime(Local::now()));
                recorder.write(record);
            }

            if episode % self.config.save_interval == 0 {
                if let Some(model_dir) = &self.config.model_dir {
                    let path = Path::new(model_dir).join(episode.to_string());
                    Self::save_model::<E, A>(agent, &path);
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::RlError,
        record::{BufferedRecorder, RecordValue},
        BoxSpace, DefaultEvaluator, DiscreteAct, DiscreteSpace, Policy, Step, VecObs,
    };
    use tempdir::TempDir;

    /// Terminates after `len` steps with reward 1 per step.
    struct Corridor {
        len: usize,
        t: usize,
        obs_space: BoxSpace,
        act_space: DiscreteSpace,
    }

    impl Env for Corridor {
        type Config = usize;
        type Obs = VecObs;
        type Act = DiscreteAct;
        type Info = ();

        fn build(config: &usize, _seed: i64) -> Result<Self> {
            Ok(Self {
                len: *config,
                t: 0,
                obs_space: BoxSpace::new(vec![0.0], vec![*config as f32])?,
                act_space: DiscreteSpace::new(1)?,
            })
        }

        fn step(&mut self, a: &DiscreteAct) -> Result<(Step<Self>, Record)> {
            self.act_space.check(a.0)?;
            self.t += 1;
            let obs = VecObs(vec![self.t as f32]);
            let step = Step::new(obs, *a, 1.0, self.t >= self.len, false, ());
            Ok((step, Record::empty()))
        }

        fn reset(&mut self) -> Result<VecObs> {
            self.t = 0;
            Ok(VecObs(vec![0.0]))
        }

        fn reset_with_index(&mut self, _ix: usize) -> Result<VecObs> {
            self.reset()
        }

        fn observation_space(&self) -> &BoxSpace {
            &self.obs_space
        }

        fn action_space(&self) -> &DiscreteSpace {
            &self.act_space
        }
    }

    #[derive(Default)]
    struct Counter {
        train: bool,
        resets: usize,
        transitions: Vec<Transition<VecObs, DiscreteAct>>,
        saved: usize,
    }

    impl Policy<Corridor> for Counter {
        fn sample(&mut self, _obs: &VecObs) -> Result<DiscreteAct> {
            Ok(DiscreteAct(0))
        }
    }

    impl Agent<Corridor> for Counter {
        fn train(&mut self) {
            self.train = true;
        }

        fn eval(&mut self) {
            self.train = false;
        }

        fn is_train(&self) -> bool {
            self.train
        }

        fn reset(&mut self, _init_obs: &VecObs) {
            self.resets += 1;
        }

        fn observe(&mut self, tr: Transition<VecObs, DiscreteAct>) -> Result<Option<Record>> {
            self.transitions.push(tr);
            Ok(Some(Record::from_scalar("loss", 0.0)))
        }

        fn save_params(&self, path: &Path) -> Result<()> {
            std::fs::create_dir_all(path)?;
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_train_collects_stats() -> Result<()> {
        let mut env = Corridor::build(&5, 0)?;
        let mut agent = Counter::default();
        let mut recorder = BufferedRecorder::new();
        let mut evaluator = DefaultEvaluator::<Corridor>::new(&5, 0, 2)?;
        let dir = TempDir::new("trainer")?;
        let model_dir = dir.path().join("model");
        let config = TrainerConfig::default()
            .max_episodes(4)
            .flush_record_interval(2)
            .eval_interval(2)
            .save_interval(4)
            .model_dir(model_dir.to_string_lossy());
        let mut trainer = Trainer::build(config)?;

        let stats = trainer.train(&mut env, &mut agent, &mut recorder, &mut evaluator)?;
        assert_eq!(stats.returns(), &[5.0; 4]);
        assert_eq!(stats.lengths(), &[5; 4]);
        assert_eq!(agent.resets, 4);
        assert_eq!(agent.transitions.len(), 20);
        assert!(agent.transitions[4].is_terminated);
        assert!(!agent.transitions[3].is_done());
        assert!(agent.is_train());
        assert!(model_dir.join("best").is_dir());
        assert!(model_dir.join("4").is_dir());

        // two flushes and two evaluations
        assert_eq!(recorder.len(), 4);
        let evals = recorder
            .iter()
            .filter_map(|r| r.get_scalar("eval_return").ok())
            .collect::<Vec<_>>();
        assert_eq!(evals, vec![5.0, 5.0]);

        let eval_record = recorder
            .iter()
            .find(|r| r.get("eval_return").is_some())
            .unwrap();
        assert_eq!(eval_record.get_array1("eval_returns")?, vec![5.0, 5.0]);
        assert!(matches!(
            eval_record.get("datetime"),
            Some(RecordValue::DateTime(_))
        ));
        Ok(())
    }

    #[test]
    fn test_observation_outside_space_dim() -> Result<()> {
        let mut env = Corridor::build(&3, 0)?;
        env.obs_space = BoxSpace::new(vec![0.0; 2], vec![3.0; 2])?;
        let mut agent = Counter::default();
        let trainer = Trainer::build(TrainerConfig::default())?;

        let err = trainer
            .run_episode(&mut env, &mut agent, &mut BufferedRecorder::new())
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RlError>(),
            Some(&RlError::ObsDimMismatch {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(agent.resets, 0);
        assert!(agent.transitions.is_empty());
        Ok(())
    }

    #[test]
    fn test_truncation_by_trainer() -> Result<()> {
        let mut env = Corridor::build(&10, 0)?;
        let mut agent = Counter::default();
        let config = TrainerConfig::default().max_steps_per_episode(3);
        let trainer = Trainer::build(config)?;

        let (ret, len) = trainer.run_episode(&mut env, &mut agent, &mut BufferedRecorder::new())?;
        assert_eq!((ret, len), (3.0, 3));
        let last = agent.transitions.last().unwrap();
        assert!(last.is_truncated && !last.is_terminated);
        Ok(())
    }
}
