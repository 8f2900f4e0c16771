//! Runtime wiring of the three subsystems.
//!
//! [`Client::start`] builds the session manager, the guard and the injector
//! from a [`ClientConfig`] and the host capabilities, then spawns:
//!
//! - the session expiry ticker
//! - the guard loop
//! - the input loop, when a [`CommandSource`] is supplied
//! - the panic-key watcher, which logs out and shuts everything down
//!
//! [`Client::shutdown`] cancels all of them and waits for each to finish its
//! current step.

use crate::authority::HttpAuthority;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::settings::SettingsStore;
use crate::webhook::{fetch_text, WebhookSink};
use sentra_guard::{standard_battery, Guard, LogSink, SystemProbe, ThreatSink};
use sentra_input::{CommandSource, InputLoop, Injector, KeyStateProbe, MovementEmitter};
use sentra_license::{HostIdentity, LicenseCodec, RemoteAuthority, SessionManager, SystemIdentity};
use sentra_types::{Action, Clock, KeyBindings, KeyCode, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Host capabilities the client is built on.
pub struct Capabilities {
    pub emitter: Arc<dyn MovementEmitter>,
    pub keys: Arc<dyn KeyStateProbe>,
    pub probe: Arc<dyn SystemProbe>,
    pub settings: Arc<dyn SettingsStore>,
    /// Source of movement commands; without one no input loop runs.
    pub commands: Option<Arc<dyn CommandSource>>,
    pub clock: Arc<dyn Clock>,
    /// Machine and user identity sessions are bound to.
    pub identity: Arc<dyn SystemIdentity>,
}

impl Capabilities {
    pub fn new(
        emitter: Arc<dyn MovementEmitter>,
        keys: Arc<dyn KeyStateProbe>,
        probe: Arc<dyn SystemProbe>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            emitter,
            keys,
            probe,
            settings,
            commands: None,
            clock: Arc::new(SystemClock),
            identity: Arc::new(HostIdentity),
        }
    }

    #[must_use]
    pub fn with_commands(mut self, commands: Arc<dyn CommandSource>) -> Self {
        self.commands = Some(commands);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_identity(mut self, identity: Arc<dyn SystemIdentity>) -> Self {
        self.identity = identity;
        self
    }
}

/// A running client.
pub struct Client {
    config: ClientConfig,
    session: SessionManager,
    guard: Arc<Guard>,
    injector: Arc<Injector>,
    keys: Arc<dyn KeyStateProbe>,
    settings: Arc<dyn SettingsStore>,
    http: reqwest::Client,
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Client {
    /// Starts a client talking HTTP to the configured authority and webhook.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or when an HTTP client cannot be
    /// built.
    pub async fn start(config: ClientConfig, caps: Capabilities) -> ClientResult<Self> {
        config.validate()?;
        let authority = HttpAuthority::new(
            config.license.authority_url.clone(),
            Duration::from_millis(config.license.request_timeout_ms),
        )?;
        let sink: Arc<dyn ThreatSink> = match config.webhook.url.as_deref() {
            Some(url) => Arc::new(WebhookSink::new(
                url,
                config.webhook.token.as_deref(),
                Duration::from_millis(config.webhook.timeout_ms),
            )?),
            None => Arc::new(LogSink),
        };
        Self::start_with(config, Arc::new(authority), sink, caps).await
    }

    /// Starts a client with explicit authority and sink implementations.
    pub async fn start_with(
        config: ClientConfig,
        authority: Arc<dyn RemoteAuthority>,
        sink: Arc<dyn ThreatSink>,
        caps: Capabilities,
    ) -> ClientResult<Self> {
        config.validate()?;
        let codec = LicenseCodec::new(&config.license.shared_key)?;
        let session = SessionManager::new(authority, codec)
            .with_identity(caps.identity.clone())
            .with_clock(caps.clock.clone())
            .with_config(config.session_config());

        let guard = Arc::new(
            Guard::new(config.guard_config(), sink, Arc::new(session.clone()))
                .with_clock(caps.clock.clone())
                .with_checks(standard_battery(
                    caps.probe.clone(),
                    caps.clock.clone(),
                    &config.battery_config(),
                )),
        );

        let bindings = caps.settings.load_bindings().await?;
        let injector = Arc::new(
            Injector::new(
                caps.emitter.clone(),
                caps.keys.clone(),
                session.subscribe(),
                bindings.code(Action::Trigger),
            )
            .with_config(config.step_config()),
        );
        caps.settings
            .set_driver_installed(caps.emitter.is_ready())
            .await?;
        if !caps.emitter.is_ready() {
            warn!("movement driver is not ready");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.webhook.timeout_ms))
            .build()?;

        let mut client = Self {
            config,
            session,
            guard,
            injector,
            keys: caps.keys,
            settings: caps.settings,
            http,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        };
        client.spawn_tasks(caps.commands, bindings);
        info!("client started");
        Ok(client)
    }

    fn spawn_tasks(&mut self, commands: Option<Arc<dyn CommandSource>>, bindings: KeyBindings) {
        let session = self.session.clone();
        let cancel = self.cancel.clone();
        self.tasks.push((
            "expiry",
            tokio::spawn(async move { session.run_expiry_checks(cancel).await }),
        ));

        let guard = Arc::clone(&self.guard);
        let cancel = self.cancel.clone();
        self.tasks
            .push(("guard", tokio::spawn(async move { guard.run(cancel).await })));

        if let Some(source) = commands {
            let input = InputLoop::new(Arc::clone(&self.injector), source)
                .with_poll_interval(self.config.poll_interval());
            let cancel = self.cancel.clone();
            self.tasks.push((
                "input",
                tokio::spawn(async move {
                    let stats = input.run(cancel).await;
                    debug!(?stats, "input loop finished");
                }),
            ));
        }

        let watcher = PanicWatcher {
            keys: Arc::clone(&self.keys),
            panic_key: bindings.code(Action::Panic),
            session: self.session.clone(),
            poll_interval: self.config.poll_interval(),
        };
        let cancel = self.cancel.clone();
        self.tasks
            .push(("panic", tokio::spawn(async move { watcher.run(cancel).await })));
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn injector(&self) -> &Arc<Injector> {
        &self.injector
    }

    pub fn guard(&self) -> &Arc<Guard> {
        &self.guard
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token that fires when the client shuts down, including via the panic
    /// key.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Replaces the key bindings, persists them and rebinds the trigger.
    ///
    /// The panic key is read once at start.
    pub async fn set_bindings(&self, bindings: KeyBindings) -> ClientResult<()> {
        self.settings.save_bindings(&bindings).await?;
        self.injector.set_trigger(bindings.code(Action::Trigger));
        Ok(())
    }

    pub async fn bindings(&self) -> ClientResult<KeyBindings> {
        self.settings.load_bindings().await
    }

    /// Fetches the configured announcement text, if any.
    pub async fn fetch_announcement(&self) -> ClientResult<Option<String>> {
        let Some(url) = self.config.announcement_url.as_deref() else {
            return Ok(None);
        };
        fetch_text(&self.http, url).await.map(Some)
    }

    /// Cancels every background task and waits for them to stop.
    pub async fn shutdown(mut self) -> ClientResult<()> {
        self.cancel.cancel();
        let mut failed = Vec::new();
        for (name, handle) in self.tasks.drain(..) {
            if let Err(e) = handle.await {
                warn!(task = name, error = %e, "background task failed");
                failed.push(name);
            }
        }
        info!("client stopped");
        if failed.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Task(failed.join(", ")))
        }
    }
}

/// Logs out and cancels the client when the panic key goes down.
struct PanicWatcher {
    keys: Arc<dyn KeyStateProbe>,
    panic_key: KeyCode,
    session: SessionManager,
    poll_interval: Duration,
}

impl PanicWatcher {
    async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if self.keys.is_down(self.panic_key) {
                        info!("panic key pressed");
                        self.session.logout().await;
                        cancel.cancel();
                        break;
                    }
                }
            }
        }
    }
}
