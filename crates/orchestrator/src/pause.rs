use cosmwasm_std::Addr;
use thiserror::Error;
use tracing::info;

const WEEK: u64 = 7 * 24 * 60 * 60;

/// Minimum time between an unpause and the next pause
pub const PAUSE_COOLDOWN: u64 = 5 * WEEK;

/// After this long paused, anyone may unpause
pub const MAX_PAUSE_DURATION: u64 = 4 * WEEK;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PauseError {
    #[error("caller {0} is not the pause authority")]
    Unauthorized(String),

    #[error("already paused")]
    AlreadyPaused,

    #[error("not paused")]
    NotPaused,

    #[error("pause cooldown active until {ready_at}")]
    CooldownActive { ready_at: u64 },
}

/// Two-state pause switch with time-since-last-transition guards
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PauseController {
    authority: Addr,
    last_transition: Option<u64>,
    paused: bool,
}

impl PauseController {
    pub fn new(authority: Addr) -> Self {
        Self {
            authority,
            last_transition: None,
            paused: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// `(authority, last transition time)`; 0 when never paused
    pub fn config(&self) -> (Addr, u64) {
        (self.authority.clone(), self.last_transition.unwrap_or(0))
    }

    pub fn pause(&mut self, caller: &Addr, now: u64, paused: bool) -> Result<(), PauseError> {
        if paused {
            self.enter(caller, now)
        } else {
            self.exit(caller, now)
        }
    }

    fn enter(&mut self, caller: &Addr, now: u64) -> Result<(), PauseError> {
        if *caller != self.authority {
            return Err(PauseError::Unauthorized(caller.to_string()));
        }
        if self.paused {
            return Err(PauseError::AlreadyPaused);
        }
        if let Some(last) = self.last_transition {
            let ready_at = last.saturating_add(PAUSE_COOLDOWN);
            if now < ready_at {
                return Err(PauseError::CooldownActive { ready_at });
            }
        }
        self.paused = true;
        self.last_transition = Some(now);
        info!(authority = %caller, now, "orchestrator paused");
        Ok(())
    }

    fn exit(&mut self, caller: &Addr, now: u64) -> Result<(), PauseError> {
        if !self.paused {
            return Err(PauseError::NotPaused);
        }
        if *caller != self.authority {
            let paused_at = self.last_transition.unwrap_or(0);
            if now < paused_at.saturating_add(MAX_PAUSE_DURATION) {
                return Err(PauseError::Unauthorized(caller.to_string()));
            }
        }
        self.paused = false;
        self.last_transition = Some(now);
        info!(caller = %caller, now, "orchestrator unpaused");
        Ok(())
    }

    pub fn set_pause_authority(&mut self, caller: &Addr, authority: Addr) -> Result<(), PauseError> {
        if *caller != self.authority {
            return Err(PauseError::Unauthorized(caller.to_string()));
        }
        info!(old = %self.authority, new = %authority, "pause authority changed");
        self.authority = authority;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u64 = 1_700_000_000;

    fn controller() -> (PauseController, Addr, Addr) {
        let authority = Addr::unchecked("authority");
        let anyone = Addr::unchecked("anyone");
        (PauseController::new(authority.clone()), authority, anyone)
    }

    #[test]
    fn test_first_pause_has_no_cooldown() {
        let (mut pause, authority, _) = controller();
        assert_eq!(pause.config(), (authority.clone(), 0));
        pause.pause(&authority, START, true).unwrap();
        assert!(pause.is_paused());
        assert_eq!(pause.config().1, START);
    }

    #[test]
    fn test_only_authority_pauses() {
        let (mut pause, _, anyone) = controller();
        assert_eq!(
            pause.pause(&anyone, START, true),
            Err(PauseError::Unauthorized("anyone".to_string()))
        );
    }

    #[test]
    fn test_double_pause_fails() {
        let (mut pause, authority, _) = controller();
        pause.pause(&authority, START, true).unwrap();
        assert_eq!(
            pause.pause(&authority, START + 1, true),
            Err(PauseError::AlreadyPaused)
        );
    }

    #[test]
    fn test_unpause_when_not_paused_fails() {
        let (mut pause, authority, _) = controller();
        assert_eq!(
            pause.pause(&authority, START, false),
            Err(PauseError::NotPaused)
        );
    }

    #[test]
    fn test_authority_unpauses_immediately() {
        let (mut pause, authority, _) = controller();
        pause.pause(&authority, START, true).unwrap();
        pause.pause(&authority, START, false).unwrap();
        assert!(!pause.is_paused());
    }

    #[test]
    fn test_anyone_unpauses_after_four_weeks() {
        let (mut pause, authority, anyone) = controller();
        pause.pause(&authority, START, true).unwrap();
        assert!(pause
            .pause(&anyone, START + MAX_PAUSE_DURATION - 1, false)
            .is_err());
        pause
            .pause(&anyone, START + MAX_PAUSE_DURATION, false)
            .unwrap();
        assert!(!pause.is_paused());
    }

    #[test]
    fn test_repause_waits_five_weeks_after_unpause() {
        let (mut pause, authority, _) = controller();
        pause.pause(&authority, START, true).unwrap();
        let unpaused_at = START + 100;
        pause.pause(&authority, unpaused_at, false).unwrap();

        assert_eq!(
            pause.pause(&authority, unpaused_at + PAUSE_COOLDOWN - 1, true),
            Err(PauseError::CooldownActive {
                ready_at: unpaused_at + PAUSE_COOLDOWN
            })
        );
        pause
            .pause(&authority, unpaused_at + PAUSE_COOLDOWN, true)
            .unwrap();
        assert!(pause.is_paused());
    }

    #[test]
    fn test_set_pause_authority() {
        let (mut pause, authority, anyone) = controller();
        assert!(pause
            .set_pause_authority(&anyone, anyone.clone())
            .is_err());
        pause
            .set_pause_authority(&authority, anyone.clone())
            .unwrap();
        assert_eq!(pause.config().0, anyone);
        assert!(pause.pause(&authority, START, true).is_err());
        pause.pause(&anyone, START, true).unwrap();
    }
}
