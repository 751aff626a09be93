use std::fmt::{Display, Formatter};

pub fn to_bool(value: f64) -> bool {
    (value - 1.).abs() < f64::EPSILON
}

/// Mach number: the ratio of true airspeed to the local speed of sound.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct MachNumber(pub f64);

impl MachNumber {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Display for MachNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "M{:.3}", self.0)
    }
}

/// The flight phase as sequenced by the FMGC. The ordering is meaningful: guidance logic
/// compares phases with `<=`/`>=` (e.g. "at or before cruise").
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FmgcFlightPhase {
    Preflight = 0,
    Takeoff = 1,
    Climb = 2,
    Cruise = 3,
    Descent = 4,
    Approach = 5,
    GoAround = 6,
    Done = 7,
}

impl Default for FmgcFlightPhase {
    fn default() -> Self {
        FmgcFlightPhase::Preflight
    }
}

impl From<u8> for FmgcFlightPhase {
    fn from(value: u8) -> Self {
        match value {
            1 => FmgcFlightPhase::Takeoff,
            2 => FmgcFlightPhase::Climb,
            3 => FmgcFlightPhase::Cruise,
            4 => FmgcFlightPhase::Descent,
            5 => FmgcFlightPhase::Approach,
            6 => FmgcFlightPhase::GoAround,
            7 => FmgcFlightPhase::Done,
            _ => FmgcFlightPhase::Preflight,
        }
    }
}

/// Vertical modes as annunciated on the FMA and selected through the FCU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerticalMode {
    None = 0,
    Alt = 10,
    AltCpt = 11,
    OpClb = 12,
    OpDes = 13,
    Vs = 14,
    Fpa = 15,
    AltCst = 16,
    AltCstCpt = 17,
    Clb = 20,
    Des = 21,
    GsCpt = 30,
    GsTrack = 31,
    Land = 32,
    Flare = 33,
    RollOut = 34,
    Srs = 40,
    SrsGa = 41,
    Tcas = 50,
}

impl Default for VerticalMode {
    fn default() -> Self {
        VerticalMode::None
    }
}

impl From<u8> for VerticalMode {
    fn from(value: u8) -> Self {
        match value {
            10 => VerticalMode::Alt,
            11 => VerticalMode::AltCpt,
            12 => VerticalMode::OpClb,
            13 => VerticalMode::OpDes,
            14 => VerticalMode::Vs,
            15 => VerticalMode::Fpa,
            16 => VerticalMode::AltCst,
            17 => VerticalMode::AltCstCpt,
            20 => VerticalMode::Clb,
            21 => VerticalMode::Des,
            30 => VerticalMode::GsCpt,
            31 => VerticalMode::GsTrack,
            32 => VerticalMode::Land,
            33 => VerticalMode::Flare,
            34 => VerticalMode::RollOut,
            40 => VerticalMode::Srs,
            41 => VerticalMode::SrsGa,
            50 => VerticalMode::Tcas,
            _ => VerticalMode::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn one_is_true() {
        assert!(to_bool(1.));
        assert!(!to_bool(0.));
        assert!(!to_bool(2.));
    }

    #[test]
    fn flight_phases_are_ordered() {
        assert!(FmgcFlightPhase::Climb <= FmgcFlightPhase::Cruise);
        assert!(FmgcFlightPhase::Approach >= FmgcFlightPhase::Descent);
        assert!(FmgcFlightPhase::Preflight < FmgcFlightPhase::Descent);
    }

    #[rstest]
    #[case(0, FmgcFlightPhase::Preflight)]
    #[case(3, FmgcFlightPhase::Cruise)]
    #[case(4, FmgcFlightPhase::Descent)]
    #[case(7, FmgcFlightPhase::Done)]
    #[case(42, FmgcFlightPhase::Preflight)]
    fn flight_phase_from_bus_value(#[case] value: u8, #[case] expected: FmgcFlightPhase) {
        assert_eq!(FmgcFlightPhase::from(value), expected);
    }

    #[rstest]
    #[case(21, VerticalMode::Des)]
    #[case(13, VerticalMode::OpDes)]
    #[case(14, VerticalMode::Vs)]
    #[case(99, VerticalMode::None)]
    fn vertical_mode_from_bus_value(#[case] value: u8, #[case] expected: VerticalMode) {
        assert_eq!(VerticalMode::from(value), expected);
    }

    #[test]
    fn mach_number_is_displayed_with_three_decimals() {
        assert_eq!(MachNumber(0.78).to_string(), "M0.780");
    }
}
