use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::models::TokenStatus;
use crate::TokenError;

/// Statuses reception and doctors may set by hand.
pub const STAFF_SETTABLE: [TokenStatus; 5] = [
    TokenStatus::Confirmed,
    TokenStatus::Completed,
    TokenStatus::Skipped,
    TokenStatus::Cancelled,
    TokenStatus::InConsultancy,
];

#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: TokenStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StatusChange {
    pub fn to_patch(&self) -> Value {
        match self.completed_at {
            Some(completed_at) => json!({ "status": self.status, "completed_at": completed_at }),
            None => json!({ "status": self.status }),
        }
    }
}

pub fn parse_staff_status(value: Option<&str>) -> Result<TokenStatus, TokenError> {
    value
        .and_then(|raw| raw.parse::<TokenStatus>().ok())
        .filter(|status| STAFF_SETTABLE.contains(status))
        .ok_or(TokenError::InvalidStatus)
}

/// Validates the move and stamps completion time when the token finishes.
pub fn plan_transition(
    current: TokenStatus,
    target: TokenStatus,
    now: DateTime<Utc>,
) -> Result<StatusChange, TokenError> {
    if !current.can_transition_to(target) {
        return Err(TokenError::InvalidTransition { from: current, to: target });
    }

    Ok(StatusChange {
        status: target,
        completed_at: (target == TokenStatus::Completed).then_some(now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn staff_cannot_reset_to_waiting() {
        assert_matches!(parse_staff_status(Some("waiting")), Err(TokenError::InvalidStatus));
        assert_matches!(parse_staff_status(Some("finished")), Err(TokenError::InvalidStatus));
        assert_matches!(parse_staff_status(None), Err(TokenError::InvalidStatus));
        assert_eq!(parse_staff_status(Some("in_consultancy")).unwrap(), TokenStatus::InConsultancy);
    }

    #[test]
    fn completion_is_stamped() {
        let now = Utc::now();
        let change = plan_transition(TokenStatus::InConsultancy, TokenStatus::Completed, now).unwrap();
        assert_eq!(change.completed_at, Some(now));
        assert_eq!(change.to_patch()["status"], "completed");

        let change = plan_transition(TokenStatus::Waiting, TokenStatus::Confirmed, now).unwrap();
        assert!(change.to_patch().get("completed_at").is_none());
    }

    #[test]
    fn rejects_moves_out_of_terminal_states() {
        assert_matches!(
            plan_transition(TokenStatus::Cancelled, TokenStatus::Confirmed, Utc::now()),
            Err(TokenError::InvalidTransition { from: TokenStatus::Cancelled, to: TokenStatus::Confirmed })
        );
    }
}
