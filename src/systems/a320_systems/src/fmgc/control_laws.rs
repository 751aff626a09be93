use uom::si::{angle::degree, f64::*, velocity::foot_per_minute};

/// The vertical law the FMGC asks the flight guidance to fly while DES is engaged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestedVerticalMode {
    None = 0,
    SpeedThrust = 1,
    VpathThrust = 2,
    VpathSpeed = 3,
    FpaSpeed = 4,
    VsSpeed = 5,
}

impl Default for RequestedVerticalMode {
    fn default() -> Self {
        RequestedVerticalMode::None
    }
}

impl From<RequestedVerticalMode> for u8 {
    fn from(mode: RequestedVerticalMode) -> Self {
        mode as u8
    }
}

/// The vertical target that goes with a [`RequestedVerticalMode`]. FPA laws take an angle,
/// every other law a rate; both share the same bus variable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetVerticalSpeed {
    VerticalSpeed(Velocity),
    FlightPathAngle(Angle),
}

impl TargetVerticalSpeed {
    /// Feet per minute for rates, degrees for angles.
    pub fn bus_value(&self) -> f64 {
        match self {
            TargetVerticalSpeed::VerticalSpeed(rate) => rate.get::<foot_per_minute>(),
            TargetVerticalSpeed::FlightPathAngle(angle) => angle.get::<degree>(),
        }
    }
}

impl Default for TargetVerticalSpeed {
    fn default() -> Self {
        TargetVerticalSpeed::VerticalSpeed(Velocity::new::<foot_per_minute>(0.))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_modes_have_stable_bus_values() {
        assert_eq!(u8::from(RequestedVerticalMode::None), 0);
        assert_eq!(u8::from(RequestedVerticalMode::SpeedThrust), 1);
        assert_eq!(u8::from(RequestedVerticalMode::VpathThrust), 2);
        assert_eq!(u8::from(RequestedVerticalMode::VpathSpeed), 3);
        assert_eq!(u8::from(RequestedVerticalMode::FpaSpeed), 4);
        assert_eq!(u8::from(RequestedVerticalMode::VsSpeed), 5);
    }

    #[test]
    fn rates_and_angles_use_their_own_units_on_the_bus() {
        let rate = TargetVerticalSpeed::VerticalSpeed(Velocity::new::<foot_per_minute>(-1000.));
        let angle = TargetVerticalSpeed::FlightPathAngle(Angle::new::<degree>(-1.5));

        assert!((rate.bus_value() + 1000.).abs() < 1e-6);
        assert!((angle.bus_value() + 1.5).abs() < 1e-9);
        assert!(TargetVerticalSpeed::default().bus_value().abs() < f64::EPSILON);
    }
}
