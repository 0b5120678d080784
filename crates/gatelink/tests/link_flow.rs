//! End-to-end tests for the linking flow: simulation hooks, coordinator,
//! and gateway wired together against a mock messenger.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use gatelink::{
    Decision, GatelinkError, GatewayConfig, GatewayHandler, LinkCoordinator,
    Messenger, Notice, PlayerHooks, ReminderConfig, link_event_channel,
};
use gatelink_freeze::{FreezeConfig, SecondFactorConfig};
use gatelink_protocol::{ExternalId, PlayerId, Position};
use gatelink_store::IdentityStore;
use gatelink_verify::{CodeRegistry, VerifyConfig};
use tempfile::TempDir;

// =========================================================================
// Mock messenger
// =========================================================================

#[derive(Debug)]
struct MockError(&'static str);

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockError {}

/// Records every outbound call; individual operations can be set to fail.
#[derive(Default)]
struct MockMessenger {
    calls: Mutex<Vec<String>>,
    fail_role_grant: bool,
    fail_nickname: bool,
}

impl MockMessenger {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Messenger for MockMessenger {
    type Error = MockError;

    async fn grant_role(
        &self,
        account: &ExternalId,
    ) -> Result<(), MockError> {
        self.record(format!("grant_role:{account}"));
        if self.fail_role_grant {
            Err(MockError("role hierarchy"))
        } else {
            Ok(())
        }
    }

    async fn revoke_role(
        &self,
        account: &ExternalId,
    ) -> Result<(), MockError> {
        self.record(format!("revoke_role:{account}"));
        Ok(())
    }

    async fn set_nickname(
        &self,
        account: &ExternalId,
        nickname: &str,
    ) -> Result<(), MockError> {
        self.record(format!("set_nickname:{account}:{nickname}"));
        if self.fail_nickname {
            Err(MockError("missing permission"))
        } else {
            Ok(())
        }
    }

    async fn send_direct(
        &self,
        account: &ExternalId,
        text: &str,
    ) -> Result<(), MockError> {
        self.record(format!("send_direct:{account}:{text}"));
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

struct Stack {
    coordinator: Arc<LinkCoordinator>,
    hooks: PlayerHooks,
    // Keeps the store file alive for the test body.
    _dir: TempDir,
}

fn build_stack(
    freeze: FreezeConfig,
    second_factor: SecondFactorConfig,
) -> Stack {
    let dir = TempDir::new().expect("tempdir");
    let store = IdentityStore::open(dir.path().join("links.json"))
        .expect("open store");
    let (tx, queue) = link_event_channel();
    let coordinator = Arc::new(LinkCoordinator::new(
        CodeRegistry::new(VerifyConfig::default()),
        store,
        tx,
    ));
    let hooks = PlayerHooks::new(
        Arc::clone(&coordinator),
        freeze,
        second_factor,
        ReminderConfig::default(),
        queue,
    );
    Stack {
        coordinator,
        hooks,
        _dir: dir,
    }
}

fn freeze_on() -> FreezeConfig {
    FreezeConfig {
        enabled: true,
        ..FreezeConfig::default()
    }
}

fn gateway(
    coordinator: &Arc<LinkCoordinator>,
    messenger: &Arc<MockMessenger>,
) -> GatewayHandler<Arc<MockMessenger>> {
    GatewayHandler::new(
        Arc::clone(coordinator),
        Arc::clone(messenger),
        GatewayConfig::default(),
    )
}

fn ext(id: &str) -> ExternalId {
    ExternalId::new(id)
}

fn pos(x: f64, y: f64, z: f64) -> Position {
    Position::new(x, y, z)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

// =========================================================================
// The full lifecycle scenario
// =========================================================================

/// Join unverified → frozen. Request a code (TTL 300 s, cooldown 60 s); a
/// second request within the cooldown fails. The messaging side redeems
/// the code for E1 → linked and unfrozen. E1 later leaves the network →
/// the link is removed and, lacking bypass, the player is refrozen.
#[tokio::test]
async fn test_full_link_lifecycle() {
    let mut stack = build_stack(freeze_on(), SecondFactorConfig::default());
    let messenger = Arc::new(MockMessenger::default());
    let gw = gateway(&stack.coordinator, &messenger);
    let player = PlayerId::random();
    let t0 = Instant::now();

    // 1. Join unverified: frozen, movement blocked.
    let outcome = stack.hooks.on_join(player, false).await;
    assert!(outcome.frozen);
    assert_eq!(outcome.notice, Some(Notice::NotLinked));
    assert!(
        !stack
            .hooks
            .check_move(player, &pos(0.0, 64.0, 0.0), &pos(1.0, 64.0, 0.0))
            .is_allowed()
    );

    // 2. Request a code; an immediate retry is on cooldown.
    let notice = stack.hooks.request_code(player, false, t0).await;
    let Notice::CodeIssued { code } = notice else {
        panic!("expected a code, got {notice:?}");
    };
    assert_eq!(
        stack.hooks.request_code(player, false, t0 + secs(30)).await,
        Notice::CooldownActive { remaining_secs: 30 }
    );

    // 3. The messaging side redeems the code for E1.
    let reply = gw.handle_redeem(&ext("E1"), &code, "steve", t0 + secs(100)).await;
    assert_eq!(
        reply,
        Notice::Linked {
            nickname_updated: true
        }
    );
    assert_eq!(
        messenger.calls(),
        vec![
            "grant_role:E1".to_string(),
            "set_nickname:E1:steve".to_string(),
        ],
        "pipeline order: role first, then nickname"
    );

    // 4. The simulation drains the event and unfreezes.
    assert!(stack.hooks.is_frozen(player), "not unfrozen until the drain");
    stack.hooks.drain_link_events();
    assert!(!stack.hooks.is_frozen(player));
    assert!(
        stack
            .hooks
            .check_move(player, &pos(0.0, 64.0, 0.0), &pos(5.0, 64.0, 5.0))
            .is_allowed()
    );

    // 5. E1 leaves the messaging network: unlinked and refrozen.
    let departed = gw.handle_member_departed(&ext("E1")).await.unwrap();
    assert_eq!(departed, Some(player));
    stack.hooks.drain_link_events();
    assert!(stack.hooks.is_frozen(player));
    assert!(!stack.coordinator.is_linked(player).await);
}

// =========================================================================
// Redemption edge cases
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redeems_exactly_one_success() {
    let stack = build_stack(freeze_on(), SecondFactorConfig::default());
    let player = PlayerId::random();
    let now = Instant::now();
    let code = stack
        .coordinator
        .request_code(player, false, now)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let coordinator = Arc::clone(&stack.coordinator);
        let code = code.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .redeem(&ext(&format!("E{i}")), &code, now)
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(p) => {
                assert_eq!(p, player);
                successes += 1;
            }
            Err(GatelinkError::Verify(_)) => {}
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }
    assert_eq!(successes, 1, "a code is consumable at most once");
}

#[tokio::test]
async fn test_remote_departure_for_unknown_account_is_noop() {
    let stack = build_stack(freeze_on(), SecondFactorConfig::default());

    let result = stack
        .coordinator
        .handle_remote_departure(&ext("nobody"))
        .await
        .unwrap();

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_redeem_rejects_already_claimed_external_account() {
    let mut stack = build_stack(freeze_on(), SecondFactorConfig::default());
    let first = PlayerId::random();
    let second = PlayerId::random();
    let now = Instant::now();

    let code = stack
        .coordinator
        .request_code(first, false, now)
        .await
        .unwrap();
    stack.coordinator.redeem(&ext("E1"), &code, now).await.unwrap();

    let code = stack
        .coordinator
        .request_code(second, false, now)
        .await
        .unwrap();
    let result = stack.coordinator.redeem(&ext("E1"), &code, now).await;

    assert!(matches!(result, Err(GatelinkError::ExternalIdClaimed(_))));
    assert!(!stack.coordinator.is_linked(second).await);
    // The losing player stays frozen.
    stack.hooks.on_join(second, false).await;
    stack.hooks.drain_link_events();
    assert!(stack.hooks.is_frozen(second));
}

#[tokio::test]
async fn test_force_relink_breaks_old_link_and_reuses_account() {
    let stack = build_stack(freeze_on(), SecondFactorConfig::default());
    let player = PlayerId::random();
    let now = Instant::now();

    let code = stack
        .coordinator
        .request_code(player, false, now)
        .await
        .unwrap();
    stack.coordinator.redeem(&ext("E1"), &code, now).await.unwrap();

    // Without force: rejected. With force (past the cooldown): the old
    // link is broken and the same account can be claimed again.
    assert!(matches!(
        stack.coordinator.request_code(player, false, now).await,
        Err(GatelinkError::AlreadyLinked(_))
    ));
    let code = stack
        .coordinator
        .request_code(player, true, now + secs(61))
        .await
        .unwrap();
    assert!(!stack.coordinator.is_linked(player).await);

    let relink = stack
        .coordinator
        .redeem(&ext("E1"), &code, now + secs(61))
        .await;

    assert!(relink.is_ok());
    assert_eq!(
        stack.coordinator.external_id_of(player).await,
        Some(ext("E1"))
    );
}

#[tokio::test]
async fn test_persistence_failure_leaves_player_frozen() {
    // A store whose directory vanished: every write fails. The redemption
    // must report failure and must NOT queue an unfreeze.
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("gone").join("links.json");
    let store = IdentityStore::open(path).expect("open is lazy");
    let (tx, queue) = link_event_channel();
    let coordinator = Arc::new(LinkCoordinator::new(
        CodeRegistry::new(VerifyConfig::default()),
        store,
        tx,
    ));
    let mut hooks = PlayerHooks::new(
        Arc::clone(&coordinator),
        freeze_on(),
        SecondFactorConfig::default(),
        ReminderConfig::default(),
        queue,
    );
    let player = PlayerId::random();
    let now = Instant::now();

    hooks.on_join(player, false).await;
    let code = coordinator.request_code(player, false, now).await.unwrap();
    let result = coordinator.redeem(&ext("E1"), &code, now).await;

    assert!(matches!(result, Err(GatelinkError::Store(_))));
    assert!(
        hooks.drain_link_events().is_empty(),
        "no unfreeze event may exist for a link that never hit disk"
    );
    assert!(hooks.is_frozen(player));
    assert!(!coordinator.is_linked(player).await);
}

// =========================================================================
// Gateway pipeline outcomes
// =========================================================================

#[tokio::test]
async fn test_role_grant_failure_still_links_but_reports_it() {
    let stack = build_stack(freeze_on(), SecondFactorConfig::default());
    let messenger = Arc::new(MockMessenger {
        fail_role_grant: true,
        ..MockMessenger::default()
    });
    let gw = gateway(&stack.coordinator, &messenger);
    let player = PlayerId::random();
    let now = Instant::now();
    let code = stack
        .coordinator
        .request_code(player, false, now)
        .await
        .unwrap();

    let reply = gw.handle_redeem(&ext("E1"), &code, "steve", now).await;

    assert_eq!(reply, Notice::RoleGrantFailed);
    assert!(
        stack.coordinator.is_linked(player).await,
        "the reply wording must not affect link correctness"
    );
}

#[tokio::test]
async fn test_nickname_failure_degrades_the_reply_only() {
    let stack = build_stack(freeze_on(), SecondFactorConfig::default());
    let messenger = Arc::new(MockMessenger {
        fail_nickname: true,
        ..MockMessenger::default()
    });
    let gw = gateway(&stack.coordinator, &messenger);
    let player = PlayerId::random();
    let now = Instant::now();
    let code = stack
        .coordinator
        .request_code(player, false, now)
        .await
        .unwrap();

    let reply = gw.handle_redeem(&ext("E1"), &code, "steve", now).await;

    assert_eq!(
        reply,
        Notice::Linked {
            nickname_updated: false
        }
    );
    assert!(stack.coordinator.is_linked(player).await);
}

#[tokio::test]
async fn test_redeem_expired_code_reply_differs_from_cooldown() {
    let mut stack = build_stack(freeze_on(), SecondFactorConfig::default());
    let messenger = Arc::new(MockMessenger::default());
    let gw = gateway(&stack.coordinator, &messenger);
    let player = PlayerId::random();
    let t0 = Instant::now();

    let code = stack
        .coordinator
        .request_code(player, false, t0)
        .await
        .unwrap();

    let expired =
        gw.handle_redeem(&ext("E1"), &code, "steve", t0 + secs(301)).await;
    assert_eq!(expired, Notice::InvalidOrExpiredCode);

    let cooldown = stack.hooks.request_code(player, false, t0 + secs(30)).await;
    assert!(matches!(cooldown, Notice::CooldownActive { .. }));
}

#[tokio::test]
async fn test_voluntary_unlink_revokes_role_and_refreezes() {
    let mut stack = build_stack(freeze_on(), SecondFactorConfig::default());
    let messenger = Arc::new(MockMessenger::default());
    let gw = gateway(&stack.coordinator, &messenger);
    let player = PlayerId::random();
    let now = Instant::now();

    let code = stack
        .coordinator
        .request_code(player, false, now)
        .await
        .unwrap();
    gw.handle_redeem(&ext("E1"), &code, "steve", now).await;
    stack.hooks.on_join(player, false).await;
    stack.hooks.drain_link_events();
    assert!(!stack.hooks.is_frozen(player));

    let notice = gw.handle_unlink(player).await.unwrap();
    stack.hooks.drain_link_events();

    assert_eq!(notice, Notice::Unlinked);
    assert!(stack.hooks.is_frozen(player));
    assert!(
        messenger.calls().contains(&"revoke_role:E1".to_string()),
        "role revocation is part of the unlink cleanup"
    );
}

#[tokio::test]
async fn test_unlink_without_link_is_rejected() {
    let stack = build_stack(freeze_on(), SecondFactorConfig::default());
    let messenger = Arc::new(MockMessenger::default());
    let gw = gateway(&stack.coordinator, &messenger);

    let result = gw.handle_unlink(PlayerId::random()).await;

    assert!(matches!(result, Err(GatelinkError::NotLinked(_))));
}

// =========================================================================
// Second factor
// =========================================================================

#[tokio::test]
async fn test_second_factor_end_to_end() {
    let mut stack = build_stack(
        freeze_on(),
        SecondFactorConfig {
            enabled: true,
            ..SecondFactorConfig::default()
        },
    );
    let messenger = Arc::new(MockMessenger::default());
    let gw = gateway(&stack.coordinator, &messenger);
    let player = PlayerId::random();
    let now = Instant::now();

    // Link first, then rejoin: the second factor challenges the session.
    let code = stack
        .coordinator
        .request_code(player, false, now)
        .await
        .unwrap();
    gw.handle_redeem(&ext("E1"), &code, "steve", now).await;

    let outcome = stack.hooks.on_join(player, false).await;
    stack.hooks.drain_link_events();
    assert!(!outcome.frozen, "linked players are not frozen");
    let challenge = outcome
        .second_factor_challenge
        .expect("a challenge is issued for linked players");

    assert!(gw.deliver_second_factor(player, &challenge).await);
    assert!(
        messenger
            .calls()
            .iter()
            .any(|c| c.starts_with("send_direct:E1:") && c.contains(&challenge)),
        "the challenge goes out as a direct message"
    );

    // Gated until the factor is satisfied; both gates are independent, and
    // the freeze gate never fired here.
    assert!(
        !stack
            .hooks
            .check_move(player, &pos(0.5, 64.0, 0.5), &pos(3.5, 64.0, 0.5))
            .is_allowed()
    );
    assert_eq!(
        stack.hooks.check_command(player, "/home"),
        Decision::Deny(Some(Notice::SecondFactorRequired))
    );
    assert!(stack.hooks.check_command(player, "/2fa 123").is_allowed());

    assert_eq!(
        stack.hooks.submit_second_factor(player, "wrong"),
        Notice::SecondFactorRejected
    );
    assert_eq!(
        stack.hooks.submit_second_factor(player, &challenge),
        Notice::SecondFactorAccepted
    );

    assert!(
        stack
            .hooks
            .check_move(player, &pos(0.5, 64.0, 0.5), &pos(3.5, 64.0, 0.5))
            .is_allowed()
    );
    assert!(stack.hooks.check_command(player, "/home").is_allowed());
}

#[tokio::test]
async fn test_unlink_clears_second_factor_state() {
    let mut stack = build_stack(
        FreezeConfig::default(),
        SecondFactorConfig {
            enabled: true,
            ..SecondFactorConfig::default()
        },
    );
    let player = PlayerId::random();
    let now = Instant::now();

    let code = stack
        .coordinator
        .request_code(player, false, now)
        .await
        .unwrap();
    stack.coordinator.redeem(&ext("E1"), &code, now).await.unwrap();
    let outcome = stack.hooks.on_join(player, false).await;
    stack.hooks.drain_link_events();
    let challenge = outcome.second_factor_challenge.unwrap();
    stack.hooks.submit_second_factor(player, &challenge);

    // Unlink: a fresh binding must not inherit the satisfied factor.
    stack.coordinator.unlink(player).await.unwrap();
    stack.hooks.drain_link_events();

    assert_eq!(
        stack.hooks.submit_second_factor(player, &challenge),
        Notice::SecondFactorRejected,
        "the old challenge is gone after unlinking"
    );
}
