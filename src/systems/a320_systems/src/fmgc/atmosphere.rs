use systems::shared::MachNumber;
use uom::si::f64::*;

/// Air data as seen by the FMGC. The descent guidance only needs a handful of derived values,
/// the atmosphere model itself lives elsewhere.
pub trait AtmosphericConditions {
    /// The current indicated airspeed.
    fn current_airspeed(&self) -> Velocity;

    /// Converts a calibrated (QNH referenced) altitude into the pressure altitude the autopilot
    /// altitude target is expressed in. The two only match under standard conditions.
    fn estimate_pressure_altitude(&self, altitude: Length) -> Length;

    /// The indicated airspeed equivalent to the given Mach number at the current conditions.
    /// Returns `None` when no meaningful crossover exists.
    fn mach_to_indicated_airspeed(&self, mach: MachNumber) -> Option<Velocity>;
}
