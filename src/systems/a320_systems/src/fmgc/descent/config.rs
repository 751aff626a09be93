use super::speed_margin::SpeedMarginConfig;
use thiserror::Error;
use uom::si::{f64::*, length::foot, velocity::foot_per_minute};

#[derive(Debug, Error, PartialEq)]
pub enum DescentGuidanceConfigError {
    #[error("linear deviation deadband must be positive, got {0:.0} ft")]
    NonPositiveDeadband(f64),
    #[error("idle descent rates must be negative, got {above:.0} ft/min above and {below:.0} ft/min below the speed limit altitude")]
    NonNegativeIdleDescentRate { above: f64, below: f64 },
    #[error("path capture factor must be within (0, 1], got {0}")]
    InvalidCaptureFactor(f64),
    #[error("speed margins must be positive, got {lower:.1} kt below and {upper:.1} kt above")]
    NonPositiveSpeedMargin { lower: f64, upper: f64 },
    #[error("reduced upper speed margin must be positive and no wider than the upper margin, got {0:.1} kt")]
    InvalidReducedUpperMargin(f64),
    #[error("invalid speed limits: VMO {vmo:.1} kt, MMO {mmo:.2}")]
    InvalidSpeedLimits { vmo: f64, mmo: f64 },
}

/// Tuning of the DES mode guidance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DescentGuidanceConfig {
    linear_deviation_deadband: Length,
    idle_descent_rate_above_speed_limit_altitude: Velocity,
    idle_descent_rate_below_speed_limit_altitude: Velocity,
    path_capture_factor: f64,
    speed_margin: SpeedMarginConfig,
}

impl DescentGuidanceConfig {
    pub fn new(
        linear_deviation_deadband: Length,
        idle_descent_rate_above_speed_limit_altitude: Velocity,
        idle_descent_rate_below_speed_limit_altitude: Velocity,
        path_capture_factor: f64,
        speed_margin: SpeedMarginConfig,
    ) -> Self {
        Self {
            linear_deviation_deadband,
            idle_descent_rate_above_speed_limit_altitude,
            idle_descent_rate_below_speed_limit_altitude,
            path_capture_factor,
            speed_margin,
        }
    }

    /// Half width of the band around the path in which the aircraft counts as on path.
    pub fn linear_deviation_deadband(&self) -> Length {
        self.linear_deviation_deadband
    }

    pub fn idle_descent_rate(&self, above_speed_limit_altitude: bool) -> Velocity {
        if above_speed_limit_altitude {
            self.idle_descent_rate_above_speed_limit_altitude
        } else {
            self.idle_descent_rate_below_speed_limit_altitude
        }
    }

    /// Fraction of the profile path angle flown when capturing a geometric path from below.
    pub fn path_capture_factor(&self) -> f64 {
        self.path_capture_factor
    }

    pub fn speed_margin(&self) -> SpeedMarginConfig {
        self.speed_margin
    }

    pub fn validate(&self) -> Result<(), DescentGuidanceConfigError> {
        let deadband = self.linear_deviation_deadband.get::<foot>();
        if !(deadband > 0.) {
            return Err(DescentGuidanceConfigError::NonPositiveDeadband(deadband));
        }

        let above = self
            .idle_descent_rate_above_speed_limit_altitude
            .get::<foot_per_minute>();
        let below = self
            .idle_descent_rate_below_speed_limit_altitude
            .get::<foot_per_minute>();
        if !(above < 0.) || !(below < 0.) {
            return Err(DescentGuidanceConfigError::NonNegativeIdleDescentRate { above, below });
        }

        if !(self.path_capture_factor > 0. && self.path_capture_factor <= 1.) {
            return Err(DescentGuidanceConfigError::InvalidCaptureFactor(
                self.path_capture_factor,
            ));
        }

        self.speed_margin.validate()
    }
}

impl Default for DescentGuidanceConfig {
    fn default() -> Self {
        Self {
            linear_deviation_deadband: Length::new::<foot>(200.),
            idle_descent_rate_above_speed_limit_altitude: Velocity::new::<foot_per_minute>(-1000.),
            idle_descent_rate_below_speed_limit_altitude: Velocity::new::<foot_per_minute>(-500.),
            path_capture_factor: 0.5,
            speed_margin: SpeedMarginConfig::default(),
        }
    }
}
