use crate::fmgc::control_laws::{RequestedVerticalMode, TargetVerticalSpeed};
use uom::si::{f64::*, length::foot, velocity::knot};

/// Targets and PFD advisories for the vertical axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerticalGuidanceOutput {
    pub requested_vertical_mode: RequestedVerticalMode,
    /// Pressure altitude target handed to the flight guidance.
    pub target_altitude_guidance: Length,
    pub target_vertical_speed: TargetVerticalSpeed,
    /// Raw profile altitude shown on the PFD.
    pub target_altitude_display: Length,
    pub show_linear_deviation: bool,
    pub show_descent_latch: bool,
}

impl VerticalGuidanceOutput {
    pub fn neutral() -> Self {
        Self {
            requested_vertical_mode: RequestedVerticalMode::None,
            target_altitude_guidance: Length::new::<foot>(0.),
            target_vertical_speed: TargetVerticalSpeed::default(),
            target_altitude_display: Length::new::<foot>(0.),
            show_linear_deviation: false,
            show_descent_latch: false,
        }
    }
}

impl Default for VerticalGuidanceOutput {
    fn default() -> Self {
        Self::neutral()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedGuidanceOutput {
    /// The managed speed target shown on the PFD speed scale.
    pub pfd: Velocity,
    /// The speed the autothrust actually targets. Floats within the margins when they are active.
    pub athr: Velocity,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedMargins {
    pub lower: Velocity,
    pub upper: Velocity,
}

impl SpeedMargins {
    pub fn zero() -> Self {
        Self {
            lower: Velocity::new::<knot>(0.),
            upper: Velocity::new::<knot>(0.),
        }
    }
}

/// Everything the descent guidance publishes in one cycle. Optional parts are only written to the
/// boundary when present.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DescentGuidanceOutputs {
    pub vertical: VerticalGuidanceOutput,
    /// Absent outside of the descent phase.
    pub speed: Option<SpeedGuidanceOutput>,
    /// Present only on the cycle the margins are shown or hidden.
    pub margin_visibility: Option<bool>,
    /// Present while the margins are shown, and zeroed on the cycle they are hidden.
    pub margins: Option<SpeedMargins>,
}

impl DescentGuidanceOutputs {
    pub fn vertical_only(vertical: VerticalGuidanceOutput) -> Self {
        Self {
            vertical,
            speed: None,
            margin_visibility: None,
            margins: None,
        }
    }
}

/// Receives the descent guidance outputs. Implementations decide how they reach the autoflight
/// and display systems.
pub trait DescentGuidanceSink {
    fn publish(&mut self, outputs: &DescentGuidanceOutputs);

    /// Only called when the advisory changes.
    fn publish_top_of_descent_reached(&mut self, reached: bool);
}
