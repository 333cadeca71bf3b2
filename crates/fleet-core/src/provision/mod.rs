use std::{sync::Arc, time::Duration};

use fleet_model::{
    EnvironmentSpec, FleetConfig, LaunchResult, ProvisionReport, SlotFailure, SlotPhase,
    SlotReport, WorkerSlot,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    CoreError, Engine, HostResolver, PollOutcome, Sleeper, TokenPoller, TokioSleeper, notebook,
    resolve_host_or_fallback,
};

/// Brings every slot of the fleet to a ready notebook endpoint.
///
/// A slot's failure is recorded in its [`LaunchResult`] and never stops the other slots.
#[derive(Clone)]
pub struct Provisioner {
    cfg: Arc<FleetConfig>,
    engine: Arc<dyn Engine>,
    sleeper: Arc<dyn Sleeper>,
}

impl Provisioner {
    pub fn new(cfg: FleetConfig, engine: Arc<dyn Engine>) -> Self {
        Self {
            cfg: Arc::new(cfg),
            engine,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &FleetConfig {
        &self.cfg
    }

    /// Resolve the host address once, then provision every slot.
    pub async fn run(&self, resolver: &dyn HostResolver) -> Result<ProvisionReport, CoreError> {
        self.cfg.validate()?;
        let slots = self.cfg.slots()?;
        let host = resolve_host_or_fallback(resolver, &self.cfg.host_discovery.fallback).await;
        info!(
            target: "fleet.core.provision",
            engine = self.engine.name(),
            slots = slots.len(),
            parallel = self.cfg.parallel,
            "provisioning fleet"
        );

        let reports = if self.cfg.parallel {
            self.run_parallel(slots, &host).await
        } else {
            let mut reports = Vec::with_capacity(slots.len());
            for slot in slots {
                let result = self.provision_slot(&slot, &host).await;
                reports.push(SlotReport { slot, result });
            }
            reports
        };

        let report = ProvisionReport::new(host, reports);
        info!(
            target: "fleet.core.provision",
            ready = report.urls().len(),
            total = report.slots.len(),
            "provisioning finished"
        );
        Ok(report)
    }

    async fn run_parallel(&self, slots: Vec<WorkerSlot>, host: &str) -> Vec<SlotReport> {
        let handles: Vec<_> = slots
            .into_iter()
            .map(|slot| {
                let this = self.clone();
                let host = host.to_string();
                let task_slot = slot.clone();
                let handle =
                    tokio::spawn(async move { this.provision_slot(&task_slot, &host).await });
                (slot, handle)
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (slot, handle) in handles {
            let result = handle.await.unwrap_or_else(|e| {
                error!(target: "fleet.core.provision", slot = %slot.name, error = %e, "slot task aborted");
                LaunchResult::not_ready(SlotFailure::EngineApiError {
                    reason: format!("slot task aborted: {e}"),
                    unclassified: true,
                })
            });
            reports.push(SlotReport { slot, result });
        }
        reports
    }

    /// Run the full sequence for one slot.
    #[instrument(level = "debug", skip(self, slot), fields(slot = %slot.name))]
    pub async fn provision_slot(&self, slot: &WorkerSlot, host: &str) -> LaunchResult {
        let name = slot.name.as_str();
        let nb = &self.cfg.notebook;

        info!(target: "fleet.core.provision", slot = name, image = %self.cfg.image, "launching environment");
        let spec = EnvironmentSpec::for_slot(&self.cfg, slot);
        if let Err(e) = self.engine.create(&spec).await {
            let failure = e.into_failure();
            error!(target: "fleet.core.provision", slot = name, %failure, "environment not created");
            return LaunchResult::not_ready(failure);
        }
        phase(name, SlotPhase::Created);
        debug!(target: "fleet.core.provision", slot = name, devices = spec.devices.len(), "devices bound");
        phase(name, SlotPhase::DevicesBound);
        phase(name, SlotPhase::Running);

        self.sleeper
            .sleep(Duration::from_millis(self.cfg.settle_delay_ms))
            .await;

        self.bootstrap(name).await;
        phase(name, SlotPhase::BootstrapInstalled);

        info!(target: "fleet.core.provision", slot = name, port = slot.notebook_port, "starting notebook server");
        let server = notebook::server_command(&self.cfg, slot);
        if let Err(e) = self.engine.exec_detached(name, &server).await {
            let failure = e.into_failure();
            error!(target: "fleet.core.provision", slot = name, %failure, "notebook server not started");
            return LaunchResult::not_ready(failure);
        }
        phase(name, SlotPhase::ServerStarted);

        phase(name, SlotPhase::AwaitingToken);
        let poller = TokenPoller::new(
            self.engine.as_ref(),
            self.sleeper.as_ref(),
            self.cfg.token_poll,
        );
        match poller.poll(name, &notebook::list_command(nb)).await {
            PollOutcome::Found { token, .. } => {
                let url = notebook::access_url(host, slot.notebook_port, &token);
                phase(name, SlotPhase::Ready);
                info!(target: "fleet.core.provision", slot = name, %url, service_port = slot.service_port, "notebook ready");
                LaunchResult::Ready {
                    url,
                    service_port: slot.service_port,
                }
            }
            PollOutcome::Exhausted { attempts } => {
                phase(name, SlotPhase::TimedOut);
                let tail = self.log_tail(slot).await;
                warn!(
                    target: "fleet.core.provision",
                    slot = name,
                    attempts,
                    tail = tail.as_deref().unwrap_or(""),
                    "no token yet; notebook log tail attached"
                );
                LaunchResult::NotReady {
                    failure: SlotFailure::TokenNotFound { attempts },
                    diagnostic_tail: tail,
                }
            }
        }
    }

    /// Best effort: the image may already ship the package.
    async fn bootstrap(&self, name: &str) {
        let nb = &self.cfg.notebook;
        info!(target: "fleet.core.provision", slot = name, package = %nb.bootstrap_package, "installing bootstrap package");

        match self
            .engine
            .exec(name, &notebook::bootstrap_command(nb))
            .await
        {
            Ok(out) if out.success() => {
                debug!(target: "fleet.core.provision", slot = name, output = out.trimmed(), "bootstrap installed");
            }
            Ok(out) => {
                warn!(
                    target: "fleet.core.provision",
                    slot = name,
                    exit_code = ?out.exit_code,
                    output = out.trimmed(),
                    "bootstrap install failed; continuing"
                );
            }
            Err(e) => {
                warn!(target: "fleet.core.provision", slot = name, error = %e, "bootstrap install failed; continuing");
            }
        }
    }

    async fn log_tail(&self, slot: &WorkerSlot) -> Option<String> {
        let cmd = notebook::tail_command(&self.cfg.notebook, slot);
        match self.engine.exec(&slot.name, &cmd).await {
            Ok(out) => Some(out.trimmed().to_string()),
            Err(e) => {
                warn!(target: "fleet.core.provision", slot = %slot.name, error = %e, "could not read notebook log");
                None
            }
        }
    }
}

#[inline]
fn phase(slot: &str, phase: SlotPhase) {
    debug!(target: "fleet.core.provision", slot, %phase, "phase");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fleet_model::RetryPolicy;

    use super::*;
    use crate::{
        EngineError, HostError, StaticHost,
        testing::{FailingHost, FakeEngine, RecordingSleeper, list_output},
    };

    fn fleet(n: usize) -> FleetConfig {
        FleetConfig {
            render_ids: fleet_model::DEFAULT_RENDER_IDS[..n].to_vec(),
            ..Default::default()
        }
    }

    fn names(cfg: &FleetConfig) -> Vec<String> {
        cfg.slots().unwrap().into_iter().map(|s| s.name).collect()
    }

    fn provisioner(
        cfg: FleetConfig,
        engine: &Arc<FakeEngine>,
        sleeper: &Arc<RecordingSleeper>,
    ) -> Provisioner {
        Provisioner::new(cfg, engine.clone()).with_sleeper(sleeper.clone())
    }

    #[tokio::test]
    async fn two_slot_fleet_becomes_ready() {
        let cfg = fleet(2);
        let engine = Arc::new(FakeEngine::new());
        engine.token_for_all(&names(&cfg));
        let sleeper = Arc::new(RecordingSleeper::default());

        let report = provisioner(cfg, &engine, &sleeper)
            .run(&StaticHost("203.0.113.5".into()))
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(
            report.urls(),
            vec![
                "http://203.0.113.5:5000/?token=tok-vllm_dev_128",
                "http://203.0.113.5:5050/?token=tok-vllm_dev_136",
            ]
        );
        match &report.slots[1].result {
            LaunchResult::Ready { service_port, .. } => assert_eq!(*service_port, 8050),
            other => panic!("unexpected {other:?}"),
        }

        let created = engine.created();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].env.get("VLLM_PORT"), Some("8000"));

        let detached = engine.detached();
        assert_eq!(detached.len(), 2);
        assert!(detached[1].1.argv[2].contains("--port=5050"));

        // settle + one poll interval per slot
        assert_eq!(
            sleeper.sleeps(),
            vec![
                Duration::from_secs(5),
                Duration::from_secs(5),
                Duration::from_secs(5),
                Duration::from_secs(5)
            ]
        );
    }

    #[tokio::test]
    async fn token_on_third_attempt_is_ready() {
        let cfg = fleet(1);
        let engine = Arc::new(FakeEngine::new());
        engine.script_list(
            "vllm_dev_128",
            vec![
                Ok(list_output("")),
                Ok(list_output("")),
                Ok(list_output("http://0.0.0.0:5000/?token=abc123 :: /workspace")),
            ],
        );
        let sleeper = Arc::new(RecordingSleeper::default());
        let p = provisioner(cfg, &engine, &sleeper);

        let slot = p.config().slots().unwrap().remove(0);
        let result = p.provision_slot(&slot, "10.0.0.1").await;

        assert_eq!(result.url(), Some("http://10.0.0.1:5000/?token=abc123"));
    }

    #[tokio::test]
    async fn no_token_times_out_with_log_tail() {
        let mut cfg = fleet(1);
        cfg.settle_delay_ms = 100;
        cfg.token_poll = RetryPolicy::new(3, 2_000);
        let engine = Arc::new(FakeEngine::new());
        let sleeper = Arc::new(RecordingSleeper::default());
        let p = provisioner(cfg, &engine, &sleeper);
        let slot = p.config().slots().unwrap().remove(0);

        let result = p.provision_slot(&slot, "10.0.0.1").await;

        assert_eq!(
            result,
            LaunchResult::NotReady {
                failure: SlotFailure::TokenNotFound { attempts: 3 },
                diagnostic_tail: Some("[I ServerApp] starting".into()),
            }
        );
        assert_eq!(
            sleeper.sleeps(),
            vec![
                Duration::from_millis(100),
                Duration::from_secs(2),
                Duration::from_secs(2),
                Duration::from_secs(2)
            ]
        );
        let list = notebook::list_command(&p.config().notebook);
        assert_eq!(engine.exec_count("vllm_dev_128", &list), 3);
    }

    #[tokio::test]
    async fn launch_failure_is_isolated_to_its_slot() {
        let cfg = fleet(8);
        let all = names(&cfg);
        let engine = Arc::new(FakeEngine::new());
        engine.token_for_all(&all);
        engine.fail_create(
            &all[2],
            EngineError::LaunchFailed {
                reason: "error gathering device information".into(),
            },
        );
        let sleeper = Arc::new(RecordingSleeper::default());

        let report = provisioner(cfg, &engine, &sleeper)
            .run(&StaticHost("h".into()))
            .await
            .unwrap();

        assert_eq!(report.slots.len(), 8);
        assert_eq!(report.urls().len(), 7);
        assert!(!report.urls().iter().any(|u| u.contains("vllm_dev_144")));
        assert_eq!(
            report.slots[2].result,
            LaunchResult::not_ready(SlotFailure::EnvironmentLaunchFailure {
                reason: "error gathering device information".into()
            })
        );
        for (i, r) in report.slots.iter().enumerate() {
            assert_eq!(r.slot.index, i);
            assert_eq!(r.result.is_ready(), i != 2);
        }
    }

    #[tokio::test]
    async fn missing_image_and_unclassified_errors_are_classified() {
        let cfg = fleet(2);
        let all = names(&cfg);
        let engine = Arc::new(FakeEngine::new());
        engine.fail_create(
            &all[0],
            EngineError::ImageMissing {
                image: "rocm/vllm:instinct_main".into(),
            },
        );
        engine.fail_create(
            &all[1],
            EngineError::Unclassified {
                reason: "connection reset".into(),
            },
        );
        let sleeper = Arc::new(RecordingSleeper::default());

        let report = provisioner(cfg, &engine, &sleeper)
            .run(&StaticHost("h".into()))
            .await
            .unwrap();

        let failures: Vec<_> = report.failed().map(|(_, f)| f.clone()).collect();
        assert_eq!(
            failures,
            vec![
                SlotFailure::ImageMissing {
                    image: "rocm/vllm:instinct_main".into()
                },
                SlotFailure::EngineApiError {
                    reason: "connection reset".into(),
                    unclassified: true
                },
            ]
        );
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_failure_is_not_fatal() {
        let cfg = fleet(1);
        let engine = Arc::new(FakeEngine::new());
        engine.token_for_all(&names(&cfg));
        engine.bootstrap_exit("vllm_dev_128", 1);
        let sleeper = Arc::new(RecordingSleeper::default());

        let report = provisioner(cfg, &engine, &sleeper)
            .run(&StaticHost("h".into()))
            .await
            .unwrap();

        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn detached_start_failure_aborts_slot() {
        let cfg = fleet(1);
        let engine = Arc::new(FakeEngine::new());
        engine.fail_detach(
            "vllm_dev_128",
            EngineError::Api {
                reason: "exec failed".into(),
            },
        );
        let sleeper = Arc::new(RecordingSleeper::default());

        let report = provisioner(cfg, &engine, &sleeper)
            .run(&StaticHost("h".into()))
            .await
            .unwrap();

        assert!(matches!(
            report.failed().next(),
            Some((_, SlotFailure::EngineApiError { unclassified: false, .. }))
        ));
    }

    #[tokio::test]
    async fn host_discovery_failure_uses_loopback() {
        let cfg = fleet(2);
        let engine = Arc::new(FakeEngine::new());
        engine.token_for_all(&names(&cfg));
        let sleeper = Arc::new(RecordingSleeper::default());

        let report = provisioner(cfg, &engine, &sleeper)
            .run(&FailingHost(HostError::Timeout))
            .await
            .unwrap();

        assert_eq!(report.host, "127.0.0.1");
        assert!(report.urls().iter().all(|u| u.starts_with("http://127.0.0.1:")));
        assert_eq!(report.urls().len(), 2);
    }

    #[tokio::test]
    async fn parallel_run_reports_in_slot_order() {
        let mut cfg = fleet(8);
        cfg.parallel = true;
        let all = names(&cfg);
        let engine = Arc::new(FakeEngine::new());
        engine.token_for_all(&all);
        engine.fail_create(
            &all[2],
            EngineError::LaunchFailed {
                reason: "no such device".into(),
            },
        );
        engine.panic_on_create(&all[5]);
        let sleeper = Arc::new(RecordingSleeper::default());

        let report = provisioner(cfg, &engine, &sleeper)
            .run(&StaticHost("h".into()))
            .await
            .unwrap();

        let indices: Vec<_> = report.slots.iter().map(|r| r.slot.index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
        assert_eq!(report.urls().len(), 6);
        assert!(matches!(
            &report.slots[5].result,
            LaunchResult::NotReady {
                failure: SlotFailure::EngineApiError { unclassified: true, .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_any_engine_call() {
        let cfg = FleetConfig {
            notebook_base_port: 65_500,
            ..Default::default()
        };
        let engine = Arc::new(FakeEngine::new());
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = provisioner(cfg, &engine, &sleeper)
            .run(&StaticHost("h".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Config(_)));
        assert!(engine.created().is_empty());
    }

    #[tokio::test]
    async fn zero_port_step_is_rejected() {
        let mut cfg = fleet(2);
        cfg.port_step = 0;
        let engine = Arc::new(FakeEngine::new());
        engine.token_for_all(&names(&cfg));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = provisioner(cfg, &engine, &sleeper)
            .run(&StaticHost("h".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Config(fleet_model::ModelError::ZeroPortStep)));
        assert!(engine.created().is_empty());
    }

    #[tokio::test]
    async fn overlapping_port_ranges_are_rejected() {
        let mut cfg = fleet(2);
        cfg.service_base_port = 5050;
        let engine = Arc::new(FakeEngine::new());
        engine.token_for_all(&names(&cfg));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = provisioner(cfg, &engine, &sleeper)
            .run(&StaticHost("h".into()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Config(fleet_model::ModelError::PortRangesOverlap { .. })
        ));
        assert!(engine.created().is_empty());
    }
}
