use chrono::{DateTime, Utc};

use crate::models::campaign::{CampaignConfig, ProgramKind};
use crate::models::pass::{Pass, PassState};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ScanError {
    #[error("Pass was scanned too recently, try again after {0}")]
    CooldownActive(DateTime<Utc>),
}

/// Result of a successful scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub state: PassState,
    pub reward_unlocked: bool,
}

/// Applies one point-of-sale scan to a pass.
///
/// Stamp programs add a stamp and roll a full card over into
/// `rewards_earned`; points programs add a point; membership programs only
/// record the visit. A scan inside the campaign cooldown is refused.
pub fn apply_scan(
    pass: &Pass,
    config: &CampaignConfig,
    now: DateTime<Utc>,
) -> Result<ScanOutcome, ScanError> {
    if let (Some(cooldown), Some(last)) = (config.cooldown(), pass.last_scanned_at) {
        let allowed_at = last + cooldown;
        if now < allowed_at {
            return Err(ScanError::CooldownActive(allowed_at));
        }
    }

    let mut state = pass.current_state.clone();
    let mut reward_unlocked = false;

    match config.program {
        ProgramKind::Stamps => {
            state.stamps += 1;
            if let Some(required) = config.stamps_required {
                if state.stamps >= required {
                    state.stamps = 0;
                    state.rewards_earned += 1;
                    reward_unlocked = true;
                }
            }
        }
        ProgramKind::Points => state.points += 1,
        ProgramKind::Membership => {}
    }

    Ok(ScanOutcome {
        state,
        reward_unlocked,
    })
}
