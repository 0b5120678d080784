//! User-facing notices.
//!
//! Every distinct outcome a human can act on gets its own variant, so
//! expired-code guidance never reads like cooldown guidance. Rendering
//! (color codes, clickable components) belongs to the embedding runtime;
//! `Display` provides the plain-text defaults.

use std::fmt;

/// A message destined for a human on either side of the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Session side: the player has no identity link yet.
    NotLinked,
    /// Session side: a verification code was issued.
    CodeIssued { code: String },
    /// Session side: a new code was requested too soon.
    CooldownActive { remaining_secs: u64 },
    /// Session side: the player is already linked (no `force` given).
    AlreadyLinked,
    /// Session side: accounts were unlinked.
    Unlinked,
    /// Session side: a frozen player tried a blocked command.
    CommandBlocked,
    /// Session side: the second factor is still outstanding.
    SecondFactorRequired,
    /// Session side: the submitted second-factor code matched.
    SecondFactorAccepted,
    /// Session side: the submitted second-factor code did not match.
    SecondFactorRejected,
    /// Messaging side: the redeemed code matched nothing live.
    InvalidOrExpiredCode,
    /// Messaging side: the account is already bound to another player.
    ExternalIdClaimed,
    /// Messaging side: linked; `nickname_updated` records whether the
    /// optional nickname sync also went through.
    Linked { nickname_updated: bool },
    /// Messaging side: linked, but the verified role could not be granted.
    RoleGrantFailed,
    /// Either side: an internal failure the user can only retry.
    GenericError,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLinked => {
                write!(f, "Please verify your account using /verify")
            }
            Self::CodeIssued { code } => write!(
                f,
                "Your unique code: {code}. Use /verify {code} on the \
                 messaging side within 5 minutes."
            ),
            Self::CooldownActive { remaining_secs } => write!(
                f,
                "Please wait {remaining_secs} seconds before requesting \
                 another code."
            ),
            Self::AlreadyLinked => write!(
                f,
                "Your account is already verified! If you're having \
                 trouble, use /verify force to relink."
            ),
            Self::Unlinked => {
                write!(f, "Your accounts have been unlinked successfully!")
            }
            Self::CommandBlocked => write!(
                f,
                "Please verify your account first! Use /verify to get \
                 started."
            ),
            Self::SecondFactorRequired => write!(
                f,
                "You need to complete the second-factor check first! Use \
                 /2fa <code> with the code we sent you."
            ),
            Self::SecondFactorAccepted => {
                write!(f, "Second factor confirmed — you're all set.")
            }
            Self::SecondFactorRejected => write!(
                f,
                "That code doesn't match. Check the direct message we sent \
                 you."
            ),
            Self::InvalidOrExpiredCode => write!(
                f,
                "Invalid or expired verification code! Generate a new one \
                 in-game with /verify."
            ),
            Self::ExternalIdClaimed => write!(
                f,
                "This account is already linked to a different player."
            ),
            Self::Linked { nickname_updated } => {
                if *nickname_updated {
                    write!(
                        f,
                        "Successfully verified! Your accounts are linked \
                         and your nickname has been updated."
                    )
                } else {
                    write!(
                        f,
                        "Successfully verified! Your accounts are linked."
                    )
                }
            }
            Self::RoleGrantFailed => write!(
                f,
                "Your accounts are linked, but the verified role could not \
                 be granted. Please contact an administrator."
            ),
            Self::GenericError => write!(
                f,
                "An error occurred while processing your request. Please \
                 try again later."
            ),
        }
    }
}
