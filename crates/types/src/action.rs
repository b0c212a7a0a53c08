//! The action selector: which background operation the processing loop runs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mutually exclusive background operation
///
/// The discriminant is the index stored under `action_state`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    #[default]
    Stop = 0,
    NodeAdvect = 1,
    NodeDiverge = 2,
    NodeNoise = 3,
    EdgeAdvect = 4,
    EdgeDiverge = 5,
    EdgeNoise = 6,
}

impl ActionState {
    pub const ALL: [ActionState; 7] = [
        ActionState::Stop,
        ActionState::NodeAdvect,
        ActionState::NodeDiverge,
        ActionState::NodeNoise,
        ActionState::EdgeAdvect,
        ActionState::EdgeDiverge,
        ActionState::EdgeNoise,
    ];

    pub fn index(self) -> i64 {
        self as i64
    }

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Button label shown in the options panel
    pub fn label(self) -> &'static str {
        match self {
            ActionState::Stop => "Stop Everything",
            ActionState::NodeAdvect => "Node Advect",
            ActionState::NodeDiverge => "Node Diverge",
            ActionState::NodeNoise => "Node Noise",
            ActionState::EdgeAdvect => "Edge Advect",
            ActionState::EdgeDiverge => "Edge Diverge",
            ActionState::EdgeNoise => "Edge Noise",
        }
    }

    /// Next state for `event`
    ///
    /// There are no guards: every state is reachable from every other in one step.
    pub fn transition(self, event: ActionEvent) -> ActionState {
        match (self, event) {
            (_, ActionEvent::Select(requested)) => requested,
            (_, ActionEvent::Cancel) => ActionState::Stop,
        }
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActionState {
    type Err = String;

    /// Accepts `edge-advect`, `edge_advect`, `Edge Advect` and the numeric index
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(index) = s.trim().parse::<i64>() {
            return Self::from_index(index).ok_or_else(|| format!("No action with index {}", index));
        }
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        let state = match normalized.as_str() {
            "stop" | "stopeverything" => ActionState::Stop,
            "nodeadvect" => ActionState::NodeAdvect,
            "nodediverge" => ActionState::NodeDiverge,
            "nodenoise" => ActionState::NodeNoise,
            "edgeadvect" => ActionState::EdgeAdvect,
            "edgediverge" => ActionState::EdgeDiverge,
            "edgenoise" => ActionState::EdgeNoise,
            _ => return Err(format!("Unknown action: {}", s)),
        };
        Ok(state)
    }
}

/// Input to the action selector state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEvent {
    /// The user picked an action
    Select(ActionState),
    /// Another command implicitly cancels whatever is running
    /// (resample, generate, render mode changes)
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip_covers_all_states() {
        for state in ActionState::ALL {
            assert_eq!(ActionState::from_index(state.index()), Some(state));
        }
        assert_eq!(ActionState::from_index(7), None);
        assert_eq!(ActionState::from_index(-1), None);
    }

    #[test]
    fn test_any_state_reachable_in_one_step() {
        for from in ActionState::ALL {
            for to in ActionState::ALL {
                assert_eq!(from.transition(ActionEvent::Select(to)), to);
            }
            assert_eq!(from.transition(ActionEvent::Cancel), ActionState::Stop);
        }
    }

    #[test]
    fn test_parse_action_names() {
        assert_eq!("edge-advect".parse::<ActionState>(), Ok(ActionState::EdgeAdvect));
        assert_eq!("Node Noise".parse::<ActionState>(), Ok(ActionState::NodeNoise));
        assert_eq!("0".parse::<ActionState>(), Ok(ActionState::Stop));
        assert!("spin".parse::<ActionState>().is_err());
    }
}
