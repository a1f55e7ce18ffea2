//! NFC session task and reconnect routine.
//!
//! The session task owns the chip link for its whole life. Each cycle it
//! advertises the reader in the field, waits for a passive target, selects
//! the credential applet and delegates authentication. Any link-fatal error
//! hands the chip to the reconnect routine, which retries forever; a reader
//! without its chip is useless, so there is no retry ceiling.

use crate::alt_action::AltActionFlag;
use crate::auth::CredentialAuthenticator;
use crate::queue::send_or_drop;
use crate::report::StateReporter;
use latchkey_bus::{AltActionEvent, AuthSuccessEvent, BusPublisher, QoS, RawTagEvent};
use latchkey_config::ConfigHandle;
use latchkey_core::{
    ActionSource, AuthOutcome, IndicatorCode, KeyFlow, LockAction, LockState, ReaderLinkState,
    constants::{
        ACTIVATION_RETRIES_ENGAGED, ACTIVATION_RETRIES_IDLE, PRESENCE_DEBOUNCE_BUDGET,
        RECONNECT_RETRY_DELAY, SESSION_CYCLE_DELAY, TARGET_DETECT_TIMEOUT,
    },
    hex,
};
use latchkey_hardware::{DetectedTarget, NfcLink};
use latchkey_protocol::{EcpFrame, SELECT_CREDENTIAL_APPLET, select_succeeded};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

/// Bounded wait for the fire-and-forget broadcast write.
const BROADCAST_TIMEOUT: Duration = Duration::from_millis(50);

/// Everything the session task talks to besides the link itself.
#[derive(Debug, Clone)]
pub struct SessionContext<B: BusPublisher + Clone> {
    pub reporter: StateReporter<B>,
    pub config: ConfigHandle,
    pub actuation_tx: mpsc::Sender<LockAction>,
    pub led_tx: mpsc::Sender<IndicatorCode>,
    pub color_tx: mpsc::Sender<IndicatorCode>,
    pub alt_flag: AltActionFlag,
    /// Reader identifier reported in auth events.
    pub reader_id: String,
    /// Group identifier advertised in the broadcast frame.
    pub group_id: Vec<u8>,
    /// Authentication flow profile to request.
    pub flow: KeyFlow,
}

/// Run the session task until the stop signal fires.
pub async fn run<L, A, B>(
    mut link: L,
    mut auth: A,
    ctx: SessionContext<B>,
    mut stop_rx: watch::Receiver<bool>,
) where
    L: NfcLink,
    A: CredentialAuthenticator,
    B: BusPublisher + Clone,
{
    let mut link_state = ReaderLinkState::Disconnected;
    transition(&mut link_state, ReaderLinkState::Connecting);

    if !probe(&mut link).await {
        transition(&mut link_state, ReaderLinkState::Disconnected);
        transition(&mut link_state, ReaderLinkState::Reconnecting);
        if !reconnect(&mut link, &mut stop_rx).await {
            return;
        }
    } else if !bring_up(&mut link).await {
        transition(&mut link_state, ReaderLinkState::Disconnected);
        transition(&mut link_state, ReaderLinkState::Reconnecting);
        if !reconnect(&mut link, &mut stop_rx).await {
            return;
        }
    }
    transition(&mut link_state, ReaderLinkState::Ready);
    transition(&mut link_state, ReaderLinkState::Polling);

    let frame = EcpFrame::new(&ctx.group_id);
    tracing::info!(frame = %frame, "session task polling");
    let advertisement = frame.to_bytes();

    loop {
        if *stop_rx.borrow() {
            break;
        }

        // Advertise the reader between detection attempts. Any failure
        // here means the chip is gone.
        if let Err(e) = link.broadcast_raw(&advertisement, BROADCAST_TIMEOUT).await {
            tracing::warn!(error = %e, "broadcast failed, link presumed down");
            transition(&mut link_state, ReaderLinkState::Disconnected);
            transition(&mut link_state, ReaderLinkState::Reconnecting);
            if !reconnect(&mut link, &mut stop_rx).await {
                break;
            }
            transition(&mut link_state, ReaderLinkState::Ready);
            transition(&mut link_state, ReaderLinkState::Polling);
            continue;
        }

        let target = match link.detect_target(TARGET_DETECT_TIMEOUT).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                sleep(SESSION_CYCLE_DELAY).await;
                continue;
            }
            Err(e) => {
                if e.is_link_fatal() {
                    tracing::warn!(error = %e, "detection failed, link presumed down");
                    transition(&mut link_state, ReaderLinkState::Disconnected);
                    transition(&mut link_state, ReaderLinkState::Reconnecting);
                    if !reconnect(&mut link, &mut stop_rx).await {
                        break;
                    }
                    transition(&mut link_state, ReaderLinkState::Ready);
                    transition(&mut link_state, ReaderLinkState::Polling);
                } else {
                    tracing::debug!(error = %e, "detection error, retrying");
                    sleep(SESSION_CYCLE_DELAY).await;
                }
                continue;
            }
        };

        transition(&mut link_state, ReaderLinkState::TargetPresent);
        tracing::debug!(uid = %target.uid_hex(), "target detected");

        if let Err(e) = link.set_activation_retries(ACTIVATION_RETRIES_ENGAGED).await {
            tracing::warn!(error = %e, "failed to raise activation retries");
        }

        match link.exchange(&SELECT_CREDENTIAL_APPLET).await {
            Ok(response) if select_succeeded(&response) => {
                transition(&mut link_state, ReaderLinkState::Authenticating);
                match auth.authenticate(ctx.flow, &mut link).await {
                    Ok(outcome) if !outcome.status.is_failed() => {
                        on_auth_success(&ctx, &outcome).await;
                    }
                    Ok(_) => {
                        tracing::info!(uid = %target.uid_hex(), "authentication failed");
                        indicate_failure(&ctx);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "authentication errored");
                        indicate_failure(&ctx);
                    }
                }
            }
            _ => {
                // Not a credential device; report the bare tag read.
                on_raw_tag(&ctx, &target).await;
            }
        }

        transition(&mut link_state, ReaderLinkState::Settled);
        disengage(&mut link).await;
        transition(&mut link_state, ReaderLinkState::Polling);
        sleep(SESSION_CYCLE_DELAY).await;
    }
    tracing::info!("session task stopped");
}

/// Re-establish the chip link, retrying forever with a fixed backoff.
///
/// Returns `false` only when the stop signal fired first.
pub async fn reconnect<L: NfcLink>(link: &mut L, stop_rx: &mut watch::Receiver<bool>) -> bool {
    let mut attempts: u64 = 0;
    loop {
        if *stop_rx.borrow() {
            return false;
        }
        tokio::select! {
            _ = stop_rx.changed() => return false,
            _ = sleep(RECONNECT_RETRY_DELAY) => {}
        }

        attempts += 1;
        if probe(link).await && bring_up(link).await {
            tracing::info!(attempts, "reader link restored");
            return true;
        }
        if attempts.is_multiple_of(100) {
            tracing::warn!(attempts, "reader link still down");
        }
    }
}

/// Check the chip answers with a real firmware identity.
async fn probe<L: NfcLink>(link: &mut L) -> bool {
    if link.begin().await.is_err() {
        return false;
    }
    match link.firmware_version().await {
        Ok(fw) if fw.version != 0 || fw.revision != 0 => {
            tracing::debug!(firmware = %fw, "reader chip answered");
            true
        }
        Ok(_) => false,
        Err(_) => false,
    }
}

/// Field configuration after a successful probe.
async fn bring_up<L: NfcLink>(link: &mut L) -> bool {
    if link.configure_field().await.is_err() {
        return false;
    }
    link.set_activation_retries(ACTIVATION_RETRIES_IDLE).await.is_ok()
}

async fn on_auth_success<B: BusPublisher + Clone>(ctx: &SessionContext<B>, outcome: &AuthOutcome) {
    tracing::info!(
        issuer = %outcome.issuer_hex(),
        endpoint = %outcome.endpoint_hex(),
        "credential authenticated"
    );

    send_or_drop(&ctx.led_tx, IndicatorCode::Success, "led");
    send_or_drop(&ctx.color_tx, IndicatorCode::Success, "color");
    if ctx.alt_flag.is_armed() {
        send_or_drop(&ctx.led_tx, IndicatorCode::AltAction, "led");
        let event = AltActionEvent {
            reader_id: ctx.reader_id.clone(),
        };
        publish_json(ctx, &ctx.reporter.topics().alt_action.clone(), &event).await;
    }

    publish_auth_event(ctx, outcome).await;

    let snapshot = ctx.config.snapshot();
    let state = ctx.reporter.state();
    let desired = if snapshot.policy.always_unlock {
        LockState::Unlocked
    } else if snapshot.policy.always_lock {
        LockState::Locked
    } else {
        // Toggle relative to the observed state.
        match state.current() {
            LockState::Unlocked => LockState::Locked,
            _ => LockState::Unlocked,
        }
    };
    if let Err(e) = state.set_target(desired) {
        tracing::error!(error = %e, "failed to set credential target");
        return;
    }

    let actuator = &snapshot.actuator;
    // A dumb switch always pulses on credential; a stateful pin only when
    // credential actuation is enabled for it.
    let actuator_responsible = (actuator.pin_enabled() && actuator.actuate_on_credential)
        || actuator.dumb_switch_mode;
    if actuator_responsible {
        send_or_drop(
            &ctx.actuation_tx,
            LockAction::apply(ActionSource::Credential),
            "actuation",
        );
    } else {
        // No actuator path: settle the pair directly and publish.
        ctx.reporter.set_current(desired).await;
    }
}

fn indicate_failure<B: BusPublisher + Clone>(ctx: &SessionContext<B>) {
    send_or_drop(&ctx.led_tx, IndicatorCode::Failure, "led");
    send_or_drop(&ctx.color_tx, IndicatorCode::Failure, "color");
}

async fn on_raw_tag<B: BusPublisher + Clone>(ctx: &SessionContext<B>, target: &DetectedTarget) {
    tracing::info!(uid = %target.uid_hex(), "non-credential tag");
    indicate_failure(ctx);

    if ctx.config.snapshot().policy.suppress_raw_tag_events {
        return;
    }
    let event = RawTagEvent {
        uid: target.uid_hex(),
        atqa: hex::encode_upper(&target.atqa),
        sak: hex::encode_upper(&[target.sak]),
        homekey: false,
    };
    publish_json(ctx, &ctx.reporter.topics().raw_tag_event.clone(), &event).await;
}

async fn publish_auth_event<B: BusPublisher + Clone>(
    ctx: &SessionContext<B>,
    outcome: &AuthOutcome,
) {
    let event = AuthSuccessEvent {
        issuer_id: outcome.issuer_hex(),
        endpoint_id: outcome.endpoint_hex(),
        reader_id: ctx.reader_id.clone(),
        homekey: true,
    };
    publish_json(ctx, &ctx.reporter.topics().auth_event.clone(), &event).await;
}

async fn publish_json<B, E>(ctx: &SessionContext<B>, topic: &str, event: &E)
where
    B: BusPublisher + Clone,
    E: serde::Serialize,
{
    let payload = match serde_json::to_vec(event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, topic, "failed to serialize event");
            return;
        }
    };
    if let Err(e) = ctx
        .reporter
        .bus()
        .publish(topic, &payload, QoS::AtLeastOnce, false)
        .await
    {
        tracing::warn!(error = %e, topic, "failed to publish event");
    }
}

/// Release the target and debounce its departure from the field.
async fn disengage<L: NfcLink>(link: &mut L) {
    if let Err(e) = link.release_target().await {
        tracing::debug!(error = %e, "release failed");
    }

    // Each poll is paced even when the target answers immediately, so a
    // lingering target cannot spin the task.
    for _ in 0..PRESENCE_DEBOUNCE_BUDGET {
        sleep(SESSION_CYCLE_DELAY).await;
        match link.detect_target(SESSION_CYCLE_DELAY).await {
            Ok(Some(_)) => continue,
            _ => break,
        }
    }

    if let Err(e) = link.set_activation_retries(ACTIVATION_RETRIES_IDLE).await {
        tracing::debug!(error = %e, "failed to reset activation retries");
    }
}

fn transition(current: &mut ReaderLinkState, to: ReaderLinkState) {
    if current.can_transition_to(to) {
        tracing::debug!(from = %current, to = %to, "link state");
    } else {
        tracing::warn!(from = %current, to = %to, "unexpected link state transition");
    }
    *current = to;
}
