//! In-memory collaborators for unit tests.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use fleet_model::{EnvironmentSpec, ExecCommand, ExecOutput};

use crate::{Engine, EngineError, HostError, HostResolver, Sleeper};

pub fn list_output(text: &str) -> ExecOutput {
    ExecOutput {
        exit_code: Some(0),
        output: text.to_string(),
    }
}

#[derive(Default)]
struct State {
    /// name -> running
    envs: HashMap<String, bool>,
    create_errors: HashMap<String, EngineError>,
    detach_errors: HashMap<String, EngineError>,
    bootstrap_exit: HashMap<String, i64>,
    lists: HashMap<String, VecDeque<Result<ExecOutput, EngineError>>>,
    tail: String,
    /// (name, argv) of every foreground exec
    execs: Vec<(String, Vec<String>)>,
    detached: Vec<(String, ExecCommand)>,
    created: Vec<EnvironmentSpec>,
    panics: HashSet<String>,
}

/// Engine double: environments are entries in a map, list output is scripted per name.
#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<State>,
}

impl FakeEngine {
    pub fn new() -> Self {
        let engine = Self::default();
        engine.state.lock().unwrap().tail = "[I ServerApp] starting".to_string();
        engine
    }

    pub fn insert_running(&self, name: &str) {
        self.state.lock().unwrap().envs.insert(name.to_string(), true);
    }

    pub fn insert_stopped(&self, name: &str) {
        self.state.lock().unwrap().envs.insert(name.to_string(), false);
    }

    pub fn fail_create(&self, name: &str, err: EngineError) {
        self.state
            .lock()
            .unwrap()
            .create_errors
            .insert(name.to_string(), err);
    }

    pub fn fail_detach(&self, name: &str, err: EngineError) {
        self.state
            .lock()
            .unwrap()
            .detach_errors
            .insert(name.to_string(), err);
    }

    pub fn panic_on_create(&self, name: &str) {
        self.state.lock().unwrap().panics.insert(name.to_string());
    }

    pub fn bootstrap_exit(&self, name: &str, code: i64) {
        self.state
            .lock()
            .unwrap()
            .bootstrap_exit
            .insert(name.to_string(), code);
    }

    pub fn script_list(&self, name: &str, replies: Vec<Result<ExecOutput, EngineError>>) {
        self.state
            .lock()
            .unwrap()
            .lists
            .insert(name.to_string(), replies.into());
    }

    /// Every slot answers its first list call with a token derived from its name.
    pub fn token_for_all(&self, names: &[String]) {
        for name in names {
            self.script_list(
                name,
                vec![Ok(list_output(&format!(
                    "http://0.0.0.0:1/?token=tok-{name} :: /workspace"
                )))],
            );
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().unwrap().envs.contains_key(name)
    }

    pub fn created(&self) -> Vec<EnvironmentSpec> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn detached(&self) -> Vec<(String, ExecCommand)> {
        self.state.lock().unwrap().detached.clone()
    }

    pub fn exec_count(&self, name: &str, cmd: &ExecCommand) -> usize {
        self.state
            .lock()
            .unwrap()
            .execs
            .iter()
            .filter(|(n, argv)| n == name && *argv == cmd.argv)
            .count()
    }

    fn check(state: &State, name: &str) -> Result<(), EngineError> {
        if state.envs.contains_key(name) {
            Ok(())
        } else {
            Err(EngineError::NotFound {
                name: name.to_string(),
            })
        }
    }
}

#[async_trait]
impl Engine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn create(&self, spec: &EnvironmentSpec) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        if state.panics.contains(&spec.name) {
            drop(state);
            panic!("engine client crashed");
        }
        if let Some(err) = state.create_errors.get(&spec.name) {
            return Err(err.clone());
        }
        if state.envs.contains_key(&spec.name) {
            return Err(EngineError::Api {
                reason: format!("Conflict. The container name \"/{}\" is already in use", spec.name),
            });
        }
        state.envs.insert(spec.name.clone(), true);
        state.created.push(spec.clone());
        Ok(())
    }

    async fn exec(&self, name: &str, cmd: &ExecCommand) -> Result<ExecOutput, EngineError> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state, name)?;
        state.execs.push((name.to_string(), cmd.argv.clone()));

        let argv: Vec<&str> = cmd.argv.iter().map(String::as_str).collect();
        match argv.as_slice() {
            [_, "-m", "jupyter", "lab", "list"] => {
                let next = state.lists.get_mut(name).and_then(VecDeque::pop_front);
                next.unwrap_or_else(|| Ok(list_output("")))
            }
            [_, "-m", "pip", ..] => {
                let code = state.bootstrap_exit.get(name).copied().unwrap_or(0);
                Ok(ExecOutput {
                    exit_code: Some(code),
                    output: if code == 0 { String::new() } else { "ERROR: no network".into() },
                })
            }
            ["bash", "-c", script] if script.starts_with("tail") => Ok(list_output(&state.tail)),
            _ => Ok(list_output("")),
        }
    }

    async fn exec_detached(&self, name: &str, cmd: &ExecCommand) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state, name)?;
        if let Some(err) = state.detach_errors.get(name) {
            return Err(err.clone());
        }
        state.detached.push((name.to_string(), cmd.clone()));
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        match state.envs.get_mut(name) {
            None => Err(EngineError::NotFound {
                name: name.to_string(),
            }),
            Some(false) => Err(EngineError::NotRunning {
                name: name.to_string(),
            }),
            Some(running) => {
                *running = false;
                Ok(())
            }
        }
    }

    async fn remove(&self, name: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        match state.envs.get(name) {
            None => Err(EngineError::NotFound {
                name: name.to_string(),
            }),
            Some(true) => Err(EngineError::Api {
                reason: format!("cannot remove running container {name}"),
            }),
            Some(false) => {
                state.envs.remove(name);
                Ok(())
            }
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, EngineError> {
        Ok(self.contains(name))
    }
}

/// Sleeper that returns immediately and remembers what it was asked for.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, dur: Duration) {
        self.sleeps.lock().unwrap().push(dur);
    }
}

pub struct FailingHost(pub HostError);

#[async_trait]
impl HostResolver for FailingHost {
    async fn resolve(&self) -> Result<String, HostError> {
        Err(self.0.clone())
    }
}
