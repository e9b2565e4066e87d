use log::{info, warn};
use ring::{
    error::Unspecified,
    rand::{SecureRandom, SystemRandom},
};

use cellsync_shared::verify_login;

/// Supplies the shared secret a client proves knowledge of during login
pub trait LoginVerifier: Send {
    /// Returns the secret for the user/device pair, or `None` if the pair is
    /// not allowed to log in at all.
    fn secret_for(&self, user_uid: &str, device_uid: &str) -> Option<Vec<u8>>;
}

impl<F> LoginVerifier for F
where
    F: Fn(&str, &str) -> Option<Vec<u8>> + Send,
{
    fn secret_for(&self, user_uid: &str, device_uid: &str) -> Option<Vec<u8>> {
        self(user_uid, device_uid)
    }
}

pub(crate) enum LoginState {
    AwaitingLogin,
    Challenged {
        user_uid: String,
        device_uid: String,
        challenge: Vec<u8>,
    },
    Accepted {
        user_uid: String,
    },
}

impl LoginState {
    pub fn is_accepted(&self) -> bool {
        matches!(self, LoginState::Accepted { .. })
    }

    pub fn user_uid(&self) -> Option<&str> {
        match self {
            LoginState::AwaitingLogin => None,
            LoginState::Challenged { user_uid, .. } | LoginState::Accepted { user_uid } => {
                Some(user_uid)
            }
        }
    }
}

/// Draws a challenge from the operating system's secure generator
pub(crate) fn generate_challenge(len: usize) -> Result<Vec<u8>, Unspecified> {
    let mut challenge = vec![0u8; len.max(1)];
    SystemRandom::new().fill(&mut challenge)?;
    Ok(challenge)
}

/// Outcome of checking a challenge response
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LoginCheck {
    Accepted,
    UnknownUser,
    BadResponse,
}

pub(crate) fn check_response(
    verifier: Option<&dyn LoginVerifier>,
    user_uid: &str,
    device_uid: &str,
    challenge: &[u8],
    response: &[u8],
) -> LoginCheck {
    let Some(secret) = verifier.and_then(|verifier| verifier.secret_for(user_uid, device_uid))
    else {
        warn!("login refused: no secret for user {} on device {}", user_uid, device_uid);
        return LoginCheck::UnknownUser;
    };
    if verify_login(&secret, challenge, response) {
        info!("user {} logged in from device {}", user_uid, device_uid);
        LoginCheck::Accepted
    } else {
        warn!("login refused: bad challenge response from user {}", user_uid);
        LoginCheck::BadResponse
    }
}
