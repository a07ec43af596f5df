//! Application lifecycle phases and the privacy visibility gate.
//!
//! Mobile platforms report when the app moves between foreground and
//! background. While the app is not in the foreground, the OS app switcher
//! may snapshot the screen, so sensitive content (prices, payrolls, patient
//! data) is covered by an opaque overlay. [`VisibilityGate`] turns the raw
//! phase signal into the "content hidden" flag that drives that overlay.
//!
//! ```text
//!              active -> inactive|background
//!   Visible  ---------------------------------->  Hidden
//!            <----------------------------------
//!              inactive|background -> active
//! ```
//!
//! Inactive <-> background transitions and repeated phases are no-ops.

use serde::{Deserialize, Serialize};

/// Lifecycle phase as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppPhase {
    /// In the foreground and receiving input.
    #[default]
    Active,
    /// Transitioning, e.g. the app switcher or an incoming call is on top.
    Inactive,
    /// Not visible.
    Background,
}

impl AppPhase {
    /// `true` for [`AppPhase::Inactive`] and [`AppPhase::Background`].
    #[must_use]
    pub const fn is_away(self) -> bool {
        matches!(self, Self::Inactive | Self::Background)
    }

    /// Wire name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Background => "background",
        }
    }
}

impl std::fmt::Display for AppPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "background" => Ok(Self::Background),
            _ => Err(format!("invalid app phase: {s}")),
        }
    }
}

/// Output state of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Content is shown.
    #[default]
    Visible,
    /// Content is covered by the privacy overlay.
    Hidden,
}

/// Two-state machine deriving "content hidden" from lifecycle phases.
///
/// The hidden flag is never set directly; it only changes through
/// [`VisibilityGate::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityGate {
    previous: AppPhase,
    visibility: Visibility,
}

impl VisibilityGate {
    /// A gate that starts visible, assuming the app is active.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_phase(AppPhase::Active)
    }

    /// A gate that starts visible with a known current phase.
    ///
    /// Used when mounting while the platform already reports a phase.
    #[must_use]
    pub const fn with_phase(current: AppPhase) -> Self {
        Self {
            previous: current,
            visibility: Visibility::Visible,
        }
    }

    /// Feed the next phase and return whether content is now hidden.
    pub const fn observe(&mut self, next: AppPhase) -> bool {
        let previous = self.previous;
        if matches!(previous, AppPhase::Active) && next.is_away() {
            self.visibility = Visibility::Hidden;
        } else if previous.is_away() && matches!(next, AppPhase::Active) {
            self.visibility = Visibility::Visible;
        }
        self.previous = next;
        self.content_hidden()
    }

    /// Whether the privacy overlay should be shown.
    #[must_use]
    pub const fn content_hidden(&self) -> bool {
        matches!(self.visibility, Visibility::Hidden)
    }

    /// Current output state.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// The last phase the gate observed.
    #[must_use]
    pub const fn previous_phase(&self) -> AppPhase {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use AppPhase::{Active, Background, Inactive};

    fn run(phases: &[AppPhase]) -> Vec<bool> {
        let mut gate = VisibilityGate::new();
        phases.iter().map(|&p| gate.observe(p)).collect()
    }

    /// Reference definition: hidden iff the most recent away phase directly
    /// followed an active phase and nothing active came after it.
    fn expected_hidden(phases: &[AppPhase]) -> bool {
        let mut hidden = false;
        let mut previous = Active;
        for &phase in phases {
            if phase == Active {
                hidden = false;
            } else if previous == Active {
                hidden = true;
            }
            previous = phase;
        }
        hidden
    }

    fn all_sequences(len: usize) -> Vec<Vec<AppPhase>> {
        let mut out = vec![Vec::new()];
        for _ in 0..len {
            out = out
                .into_iter()
                .flat_map(|seq| {
                    [Active, Inactive, Background].into_iter().map(move |p| {
                        let mut next = seq.clone();
                        next.push(p);
                        next
                    })
                })
                .collect();
        }
        out
    }

    #[test]
    fn test_initial_state_visible() {
        let gate = VisibilityGate::new();
        assert!(!gate.content_hidden());
        assert_eq!(gate.visibility(), Visibility::Visible);
        assert_eq!(gate.previous_phase(), Active);
    }

    #[test]
    fn test_background_round_trip() {
        assert_eq!(run(&[Active, Background, Active]), [false, true, false]);
    }

    #[test]
    fn test_inactive_then_background_stays_hidden() {
        assert_eq!(
            run(&[Active, Inactive, Background, Active]),
            [false, true, true, false]
        );
    }

    #[test]
    fn test_repeated_phases_never_toggle() {
        assert_eq!(run(&[Background, Background, Background]), [true, true, true]);
        assert_eq!(run(&[Active, Active]), [false, false]);
    }

    #[test]
    fn test_mounted_while_away_stays_visible_until_active() {
        let mut gate = VisibilityGate::with_phase(Background);
        assert!(!gate.observe(Inactive));
        assert!(!gate.observe(Active));
        assert!(gate.observe(Background));
    }

    #[test]
    fn test_matches_reference_for_all_short_sequences() {
        for len in 0..=6 {
            for seq in all_sequences(len) {
                let mut gate = VisibilityGate::new();
                for (i, &phase) in seq.iter().enumerate() {
                    let hidden = gate.observe(phase);
                    assert_eq!(
                        hidden,
                        expected_hidden(&seq[..=i]),
                        "sequence {seq:?} at step {i}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_phase_parse() {
        assert_eq!("background".parse::<AppPhase>(), Ok(Background));
        assert!("sleeping".parse::<AppPhase>().is_err());
    }
}
