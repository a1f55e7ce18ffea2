//! Off-hardware device loop.
//!
//! Runs the full firmware core against mock peripherals: useful for
//! development, demos and soak-testing the task orchestration without a
//! reader chip on the bench. With `--simulate`, a scripted credential is
//! presented to the mock reader periodically.

use anyhow::Context;
use clap::Parser;
use latchkey_bus::{RecordingBus, Topics};
use latchkey_config::{ConfigHandle, DeviceConfig, MemoryStore, ReaderData};
use latchkey_core::{
    AuthOutcome, FlowStatus, IndicatorCode, KeyFlow, LockAction, LockState, SharedLockState,
    constants::QUEUE_DEPTH,
};
use latchkey_hardware::{
    Level,
    mock::{MockColorLight, MockInputPin, MockNfc, MockNfcHandle, MockOutputPin},
};
use latchkey_runtime::{
    AccessoryBridge, AltActionFlag, Capability, MockAuthenticator, RunningTask, StateReporter,
    StopSignal, Supervisor, TaskFactory, actuation, alt_action, indicator,
    session::{self, SessionContext},
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "latchkey", about = "NFC access reader core, off-hardware", version)]
struct Args {
    /// Device configuration file (JSON). Defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bus client identifier; roots the topic family.
    #[arg(long, default_value = "latchkey", env = "LATCHKEY_CLIENT_ID")]
    client_id: String,

    /// Present a scripted credential to the mock reader periodically.
    #[arg(long)]
    simulate: bool,

    /// Seconds between simulated presentations.
    #[arg(long, default_value_t = 10)]
    simulate_interval: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<DeviceConfig> {
    let Some(path) = path else {
        let mut config = DeviceConfig::default();
        // Give the mock rig a usable default: everything wired, momentary
        // unlock for framework requests.
        config.actuator.pin = 2;
        config.actuator.momentary_mask = 0x01;
        config.actuator.momentary_timeout_ms = 5000;
        config.led.success_pin = 10;
        config.led.failure_pin = 11;
        config.alt_action.trigger_pin = 12;
        config.alt_action.output_pin = 13;
        config.color_light.pin = 14;
        return Ok(config);
    };
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Wires mock peripherals into runtime tasks.
///
/// Channels are created up front so their senders can be shared with the
/// session context and the accessory bridge; each receiver is consumed by
/// the first spawn of its capability.
struct MockRig {
    config: ConfigHandle,
    reporter: StateReporter<RecordingBus>,
    alt_flag: AltActionFlag,

    actuation_tx: mpsc::Sender<LockAction>,
    actuation_rx: Option<mpsc::Receiver<LockAction>>,
    led_tx: mpsc::Sender<IndicatorCode>,
    led_rx: Option<mpsc::Receiver<IndicatorCode>>,
    color_tx: mpsc::Sender<IndicatorCode>,
    color_rx: Option<mpsc::Receiver<IndicatorCode>>,

    session: Option<(MockNfc, MockAuthenticator, SessionContext<RecordingBus>)>,
}

impl TaskFactory for MockRig {
    fn spawn(&mut self, capability: Capability) -> Option<RunningTask> {
        match capability {
            Capability::Actuation => {
                let rx = self.actuation_rx.take()?;
                let (pin, _) = MockOutputPin::new(Level::Low);
                let handle = tokio::spawn(actuation::run(
                    rx,
                    pin,
                    self.reporter.clone(),
                    self.config.clone(),
                ));
                Some(RunningTask {
                    stop: StopSignal::Lock(self.actuation_tx.clone()),
                    handle,
                })
            }
            Capability::Led => {
                let rx = self.led_rx.take()?;
                let (success, _) = MockOutputPin::new(Level::Low);
                let (failure, _) = MockOutputPin::new(Level::Low);
                let (alt_out, _) = MockOutputPin::new(Level::Low);
                let handle = tokio::spawn(indicator::run_led(
                    rx,
                    success,
                    failure,
                    alt_out,
                    self.alt_flag.clone(),
                    self.config.clone(),
                ));
                Some(RunningTask {
                    stop: StopSignal::Indicator(self.led_tx.clone()),
                    handle,
                })
            }
            Capability::ColorLight => {
                let rx = self.color_rx.take()?;
                let (light, _) = MockColorLight::new();
                let handle = tokio::spawn(indicator::run_color(rx, light, self.config.clone()));
                Some(RunningTask {
                    stop: StopSignal::Indicator(self.color_tx.clone()),
                    handle,
                })
            }
            Capability::AltAction => {
                let (input, _input_handle) = MockInputPin::new(Level::Low);
                let (feedback, _) = MockOutputPin::new(Level::Low);
                let (stop_tx, stop_rx) = watch::channel(false);
                let handle = tokio::spawn(alt_action::run(
                    input,
                    feedback,
                    self.alt_flag.clone(),
                    self.config.clone(),
                    stop_rx,
                ));
                Some(RunningTask {
                    stop: StopSignal::Watch(stop_tx),
                    handle,
                })
            }
            Capability::Session => {
                let (link, auth, ctx) = self.session.take()?;
                let (stop_tx, stop_rx) = watch::channel(false);
                let handle = tokio::spawn(session::run(link, auth, ctx, stop_rx));
                Some(RunningTask {
                    stop: StopSignal::Watch(stop_tx),
                    handle,
                })
            }
        }
    }
}

async fn simulate_presentations(nfc: MockNfcHandle, auth: MockAuthenticator, interval: Duration) {
    let mut n: u64 = 0;
    loop {
        tokio::time::sleep(interval).await;
        n += 1;
        nfc.push_exchange_response(vec![0x90, 0x00]);
        auth.push_outcome(AuthOutcome {
            issuer_id: vec![0xAA, 0xBB, 0xCC, 0xDD],
            endpoint_id: n.to_be_bytes().to_vec(),
            status: FlowStatus::Completed(KeyFlow::Fast),
        });
        let target = match latchkey_hardware::DetectedTarget::new(
            vec![0x04, 0x00, 0x00, (n & 0xFF) as u8],
            [0x00, 0x04],
            0x20,
        ) {
            Ok(target) => target,
            Err(e) => {
                tracing::error!(error = %e, "bad simulated target");
                continue;
            }
        };
        tracing::info!(n, "presenting simulated credential");
        nfc.present_target(target);
        tokio::time::sleep(Duration::from_secs(2)).await;
        nfc.remove_target();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let device_config = load_config(args.config.as_ref())?;
    let config = ConfigHandle::new(device_config.clone());

    let store = MemoryStore::new();
    let mut reader_data = ReaderData::load(&store).await?;
    if reader_data.group_id.is_empty() {
        reader_data.group_id = vec![0x6C, 0x61, 0x74, 0x63, 0x68, 0x6B, 0x65, 0x79];
        reader_data.save(&store).await?;
    }

    let bus = RecordingBus::new();
    let topics = Topics::for_client(&args.client_id);
    let state = SharedLockState::new(LockState::Locked);
    let reporter = StateReporter::new(state.clone(), bus.clone(), topics, config.clone());
    let alt_flag = AltActionFlag::new();

    let (actuation_tx, actuation_rx) = mpsc::channel(QUEUE_DEPTH);
    let (led_tx, led_rx) = mpsc::channel(QUEUE_DEPTH);
    let (color_tx, color_rx) = mpsc::channel(QUEUE_DEPTH);

    let bridge = AccessoryBridge::new(state.clone(), actuation_tx.clone());

    let (link, nfc_handle) = MockNfc::new();
    let auth = MockAuthenticator::new();
    let ctx = SessionContext {
        reporter: reporter.clone(),
        config: config.clone(),
        actuation_tx: actuation_tx.clone(),
        led_tx: led_tx.clone(),
        color_tx: color_tx.clone(),
        alt_flag: alt_flag.clone(),
        reader_id: format!("{}{}", args.client_id, device_config.reader_id_suffix),
        group_id: reader_data.group_id.clone(),
        flow: KeyFlow::Fast,
    };

    let mut rig = MockRig {
        config: config.clone(),
        reporter,
        alt_flag,
        actuation_tx,
        actuation_rx: Some(actuation_rx),
        led_tx,
        led_rx: Some(led_rx),
        color_tx,
        color_rx: Some(color_rx),
        session: Some((link, auth.clone(), ctx)),
    };

    let mut supervisor = Supervisor::new();
    for capability in Capability::ALL {
        if capability.enabled_in(&device_config) {
            supervisor.start(capability, &mut rig);
        }
    }
    tracing::info!(client_id = %args.client_id, "latchkey core running, ctrl-c to stop");

    if args.simulate {
        tokio::spawn(simulate_presentations(
            nfc_handle,
            auth,
            Duration::from_secs(args.simulate_interval),
        ));
    }

    // The bridge is what the accessory framework would call; keep it alive
    // so its queue stays open.
    let _bridge = bridge;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    supervisor.stop_all();
    tokio::time::sleep(Duration::from_millis(200)).await;

    for message in bus.published().iter().rev().take(5) {
        tracing::info!(topic = %message.topic, payload = %message.payload_str(), "last bus traffic");
    }
    Ok(())
}
