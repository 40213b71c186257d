use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A logical action the rig responds to.
///
/// Hosts translate raw key events into actions with [`Action::from_key`];
/// the integrator only ever sees actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Raise the polar angle.
    LookUp,
    LookDown,
    /// Raise the azimuth.
    LookLeft,
    LookRight,
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
    Jump,
}

/// Error for an action name that is not part of the fixed action set.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl Action {
    pub const ALL: [Action; 9] = [
        Action::LookUp,
        Action::LookDown,
        Action::LookLeft,
        Action::LookRight,
        Action::Forward,
        Action::Back,
        Action::StrafeLeft,
        Action::StrafeRight,
        Action::Jump,
    ];

    /// Map a host key identifier to an action. Unmapped keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Self::LookUp),
            "ArrowDown" => Some(Self::LookDown),
            "ArrowLeft" => Some(Self::LookLeft),
            "ArrowRight" => Some(Self::LookRight),
            "w" => Some(Self::Forward),
            "s" => Some(Self::Back),
            "a" => Some(Self::StrafeLeft),
            "d" => Some(Self::StrafeRight),
            " " | "Space" => Some(Self::Jump),
            _ => None,
        }
    }

    /// Short name used in scripts and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::LookUp => "up",
            Self::LookDown => "down",
            Self::LookLeft => "left",
            Self::LookRight => "right",
            Self::Forward => "w",
            Self::Back => "s",
            Self::StrafeLeft => "a",
            Self::StrafeRight => "d",
            Self::Jump => "space",
        }
    }

    /// Forward/back: the actions that drive the footstep bob.
    pub fn is_stride(self) -> bool {
        matches!(self, Self::Forward | Self::Back)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    /// Accepts short names (`w`, `up`, `space`) as well as host key identifiers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .or_else(|| Self::from_key(s))
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_keys_map_to_look_actions() {
        assert_eq!(Action::from_key("ArrowUp"), Some(Action::LookUp));
        assert_eq!(Action::from_key("ArrowDown"), Some(Action::LookDown));
        assert_eq!(Action::from_key("ArrowLeft"), Some(Action::LookLeft));
        assert_eq!(Action::from_key("ArrowRight"), Some(Action::LookRight));
    }

    #[test]
    fn wasd_and_space() {
        assert_eq!(Action::from_key("w"), Some(Action::Forward));
        assert_eq!(Action::from_key("s"), Some(Action::Back));
        assert_eq!(Action::from_key("a"), Some(Action::StrafeLeft));
        assert_eq!(Action::from_key("d"), Some(Action::StrafeRight));
        assert_eq!(Action::from_key(" "), Some(Action::Jump));
        assert_eq!(Action::from_key("Space"), Some(Action::Jump));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(Action::from_key("q"), None);
        assert_eq!(Action::from_key("W"), None);
        assert_eq!(Action::from_key("Escape"), None);
    }

    #[test]
    fn parse_by_name_or_key() {
        assert_eq!("space".parse::<Action>(), Ok(Action::Jump));
        assert_eq!("up".parse::<Action>(), Ok(Action::LookUp));
        assert_eq!("ArrowLeft".parse::<Action>(), Ok(Action::LookLeft));
        assert_eq!(
            "x".parse::<Action>(),
            Err(UnknownAction("x".to_string()))
        );
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = Action::ALL.iter().map(|a| a.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Action::ALL.len());
    }

    #[test]
    fn only_forward_and_back_stride() {
        let strides: Vec<_> = Action::ALL.into_iter().filter(|a| a.is_stride()).collect();
        assert_eq!(strides, vec![Action::Forward, Action::Back]);
    }
}
