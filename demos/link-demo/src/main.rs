//! A scripted walk through the Gatelink flow with a logging mock messenger.
//!
//! One "player" joins unverified, gets frozen, requests a code; the
//! "messaging side" redeems it; the simulation tick drains the event and
//! unfreezes the player; finally the account departs and the player is
//! refrozen. Run with `RUST_LOG=info cargo run -p link-demo`.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use gatelink::{
    GatelinkConfig, GatewayHandler, LinkCoordinator, Messenger, Notice,
    PlayerHooks, link_event_channel,
};
use gatelink_freeze::FreezeConfig;
use gatelink_protocol::{ExternalId, PlayerId, Position};
use gatelink_store::IdentityStore;
use gatelink_verify::CodeRegistry;

/// Stands in for the real messaging-network bot: every outbound operation
/// just logs and succeeds.
struct LoggingMessenger;

impl Messenger for LoggingMessenger {
    type Error = Infallible;

    async fn grant_role(
        &self,
        account: &ExternalId,
    ) -> Result<(), Infallible> {
        tracing::info!(%account, "[messaging] verified role granted");
        Ok(())
    }

    async fn revoke_role(
        &self,
        account: &ExternalId,
    ) -> Result<(), Infallible> {
        tracing::info!(%account, "[messaging] verified role revoked");
        Ok(())
    }

    async fn set_nickname(
        &self,
        account: &ExternalId,
        nickname: &str,
    ) -> Result<(), Infallible> {
        tracing::info!(%account, nickname, "[messaging] nickname updated");
        Ok(())
    }

    async fn send_direct(
        &self,
        account: &ExternalId,
        text: &str,
    ) -> Result<(), Infallible> {
        tracing::info!(%account, text, "[messaging] direct message");
        Ok(())
    }
}

fn show(player: PlayerId, notice: &Notice) {
    tracing::info!(%player, "[session] {notice}");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let dir = tempfile::TempDir::new()?;
    let config = GatelinkConfig {
        freeze: FreezeConfig {
            enabled: true,
            ..FreezeConfig::default()
        },
        data_path: Some(dir.path().join("links.json")),
        ..GatelinkConfig::default()
    }
    .validated();

    let store = IdentityStore::open(config.data_path())?;
    let (events_tx, events_rx) = link_event_channel();
    let coordinator = Arc::new(LinkCoordinator::new(
        CodeRegistry::new(config.verify.clone()),
        store,
        events_tx,
    ));
    let mut hooks = PlayerHooks::new(
        Arc::clone(&coordinator),
        config.freeze.clone(),
        config.second_factor.clone(),
        config.reminder.clone(),
        events_rx,
    );
    let gateway = GatewayHandler::new(
        Arc::clone(&coordinator),
        LoggingMessenger,
        config.gateway.clone(),
    );

    let player = PlayerId::random();
    let account = ExternalId::new("184325044123467776");

    // -- Player joins unverified ------------------------------------------
    let outcome = hooks.on_join(player, false).await;
    tracing::info!(%player, frozen = outcome.frozen, "[session] player joined");
    if let Some(notice) = &outcome.notice {
        show(player, notice);
    }

    let spawn = Position::new(0.5, 64.0, 0.5);
    let step = Position::new(1.5, 64.0, 0.5);
    tracing::info!(
        allowed = hooks.check_move(player, &spawn, &step).is_allowed(),
        "[session] tried to walk away"
    );

    // -- Player requests a code -------------------------------------------
    let notice = hooks.request_code(player, false, Instant::now()).await;
    show(player, &notice);
    let Notice::CodeIssued { code } = notice else {
        return Err("expected a code".into());
    };

    // -- The messaging side redeems it (network domain) -------------------
    let reply = gateway
        .handle_redeem(&account, &code, "steve", Instant::now())
        .await;
    tracing::info!("[messaging] reply: {reply}");

    // -- Next simulation tick: the event lands, the player thaws ----------
    hooks.drain_link_events();
    tracing::info!(
        frozen = hooks.is_frozen(player),
        allowed = hooks.check_move(player, &spawn, &step).is_allowed(),
        "[session] after tick"
    );

    // -- The account later leaves the messaging network -------------------
    gateway.handle_member_departed(&account).await?;
    hooks.drain_link_events();
    tracing::info!(
        frozen = hooks.is_frozen(player),
        "[session] after remote departure"
    );

    Ok(())
}
