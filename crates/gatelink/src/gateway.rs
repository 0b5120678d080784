//! The messaging-network side: code redemption and outbound account
//! operations.
//!
//! Gatelink doesn't implement a messaging-network client — that's the
//! embedding bot's job. Instead it defines the [`Messenger`] trait for the
//! three outbound operations it needs, and [`GatewayHandler`] drives the
//! flows that run on the network domain: redeeming a code, reacting to a
//! member leaving, and the cleanup half of a voluntary unlink.
//!
//! # The redemption pipeline
//!
//! After a successful redeem the handler runs a short, explicit pipeline —
//! grant role, then (optionally) sync the nickname — and produces exactly
//! one terminal [`Notice`] per redemption. Partial failures are distinct
//! outcomes, not nested callbacks. Crucially, the pipeline only decides
//! *wording*: by the time it starts, the link is already durable and the
//! unfreeze event queued, so a failed role grant can never un-link anyone.

use std::sync::Arc;
use std::time::Instant;

use gatelink_protocol::{ExternalId, PlayerId};

use crate::config::GatewayConfig;
use crate::coordinator::LinkCoordinator;
use crate::{GatelinkError, Notice};

/// Outbound operations on the messaging network.
///
/// Implementations wrap the embedding bot's client. All operations are
/// best-effort from Gatelink's perspective: failures are logged and folded
/// into the user-facing reply, never into link state.
pub trait Messenger: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Grants the "verified" role to the account.
    async fn grant_role(
        &self,
        account: &ExternalId,
    ) -> Result<(), Self::Error>;

    /// Revokes the "verified" role from the account.
    async fn revoke_role(
        &self,
        account: &ExternalId,
    ) -> Result<(), Self::Error>;

    /// Sets the account's displayed nickname.
    async fn set_nickname(
        &self,
        account: &ExternalId,
        nickname: &str,
    ) -> Result<(), Self::Error>;

    /// Sends a direct message to the account.
    async fn send_direct(
        &self,
        account: &ExternalId,
        text: &str,
    ) -> Result<(), Self::Error>;
}

/// Forwarding impl so a shared `Arc<M>` can be used wherever a
/// [`Messenger`] is required (the orphan rule forbids downstream crates
/// from writing this themselves).
impl<M: Messenger + ?Sized> Messenger for Arc<M> {
    type Error = M::Error;

    async fn grant_role(
        &self,
        account: &ExternalId,
    ) -> Result<(), Self::Error> {
        (**self).grant_role(account).await
    }

    async fn revoke_role(
        &self,
        account: &ExternalId,
    ) -> Result<(), Self::Error> {
        (**self).revoke_role(account).await
    }

    async fn set_nickname(
        &self,
        account: &ExternalId,
        nickname: &str,
    ) -> Result<(), Self::Error> {
        (**self).set_nickname(account, nickname).await
    }

    async fn send_direct(
        &self,
        account: &ExternalId,
        text: &str,
    ) -> Result<(), Self::Error> {
        (**self).send_direct(account, text).await
    }
}

/// Drives the network-domain flows against a [`Messenger`].
pub struct GatewayHandler<M: Messenger> {
    coordinator: Arc<LinkCoordinator>,
    messenger: M,
    config: GatewayConfig,
}

impl<M: Messenger> GatewayHandler<M> {
    pub fn new(
        coordinator: Arc<LinkCoordinator>,
        messenger: M,
        config: GatewayConfig,
    ) -> Self {
        Self {
            coordinator,
            messenger,
            config,
        }
    }

    /// Handles a code redemption from the messaging side.
    ///
    /// `display_name` is the player's session name, used for the optional
    /// nickname sync. Returns the single reply to show the redeeming user.
    pub async fn handle_redeem(
        &self,
        external: &ExternalId,
        code: &str,
        display_name: &str,
        now: Instant,
    ) -> Notice {
        let player =
            match self.coordinator.redeem(external, code, now).await {
                Ok(player) => player,
                Err(e) => return redeem_failure_notice(e),
            };

        // Link is durable and the unfreeze event queued; the rest of the
        // pipeline only decides the reply wording.
        if let Err(e) = self.messenger.grant_role(external).await {
            tracing::warn!(%player, %external, error = %e, "role grant failed");
            return Notice::RoleGrantFailed;
        }

        if !self.config.sync_nickname {
            return Notice::Linked {
                nickname_updated: false,
            };
        }
        let nickname = self.config.format_nickname(display_name);
        match self.messenger.set_nickname(external, &nickname).await {
            Ok(()) => Notice::Linked {
                nickname_updated: true,
            },
            Err(e) => {
                tracing::warn!(
                    %player,
                    %external,
                    error = %e,
                    "nickname sync failed"
                );
                Notice::Linked {
                    nickname_updated: false,
                }
            }
        }
    }

    /// Handles a member-departed notification from the messaging network.
    ///
    /// Unlinks the matching player, if any; unknown accounts are a silent
    /// no-op. No outbound calls — the account is already gone.
    pub async fn handle_member_departed(
        &self,
        external: &ExternalId,
    ) -> Result<Option<PlayerId>, GatelinkError> {
        self.coordinator.handle_remote_departure(external).await
    }

    /// Completes a voluntary unlink: removes the link, then revokes the
    /// role best-effort.
    pub async fn handle_unlink(
        &self,
        player: PlayerId,
    ) -> Result<Notice, GatelinkError> {
        let external = self.coordinator.unlink(player).await?;
        if let Err(e) = self.messenger.revoke_role(&external).await {
            tracing::warn!(%player, %external, error = %e, "role revoke failed");
        }
        Ok(Notice::Unlinked)
    }

    /// Delivers a second-factor challenge to the player's linked account.
    ///
    /// Returns `false` when the player has no link or the message failed;
    /// either way the challenge itself stands.
    pub async fn deliver_second_factor(
        &self,
        player: PlayerId,
        code: &str,
    ) -> bool {
        let Some(external) = self.coordinator.external_id_of(player).await
        else {
            return false;
        };
        let text = format!(
            "Your session verification code is {code}. Enter /2fa {code} \
             in-game to continue."
        );
        match self.messenger.send_direct(&external, &text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    %player,
                    %external,
                    error = %e,
                    "second-factor delivery failed"
                );
                false
            }
        }
    }
}

/// Maps a failed redemption onto its user-facing reply. Each failure class
/// gets distinct guidance.
fn redeem_failure_notice(err: GatelinkError) -> Notice {
    match err {
        GatelinkError::Verify(_) => Notice::InvalidOrExpiredCode,
        GatelinkError::ExternalIdClaimed(_) => Notice::ExternalIdClaimed,
        other => {
            tracing::error!(error = %other, "redemption failed");
            Notice::GenericError
        }
    }
}
