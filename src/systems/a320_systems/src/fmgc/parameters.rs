use systems::shared::{FmgcFlightPhase, MachNumber, VerticalMode};
use systems::simulation::{
    InitContext, Read, SimulationElement, SimulatorReader, VariableIdentifier,
};
use uom::si::{f64::*, velocity::knot};

/// A snapshot of the FMGC and FCU state the vertical profile computations depend on. Taken once
/// per guidance cycle so every consumer within the cycle sees the same values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerticalProfileComputationParameters {
    fcu_vertical_mode: VerticalMode,
    fcu_speed: Velocity,
    managed_descent_speed: Velocity,
    managed_descent_speed_mach: MachNumber,
    flight_phase: FmgcFlightPhase,
}

impl VerticalProfileComputationParameters {
    pub fn new() -> Self {
        Self {
            fcu_vertical_mode: VerticalMode::None,
            fcu_speed: Velocity::new::<knot>(0.),
            managed_descent_speed: Velocity::new::<knot>(0.),
            managed_descent_speed_mach: MachNumber(0.),
            flight_phase: FmgcFlightPhase::Preflight,
        }
    }

    pub fn fcu_vertical_mode(&self) -> VerticalMode {
        self.fcu_vertical_mode
    }

    /// The speed selected on the FCU, used whenever speed is not managed.
    pub fn fcu_speed(&self) -> Velocity {
        self.fcu_speed
    }

    /// The managed descent speed entered on (or computed by) the MCDU PERF DES page.
    pub fn managed_descent_speed(&self) -> Velocity {
        self.managed_descent_speed
    }

    pub fn managed_descent_speed_mach(&self) -> MachNumber {
        self.managed_descent_speed_mach
    }

    pub fn flight_phase(&self) -> FmgcFlightPhase {
        self.flight_phase
    }

    pub fn is_des_mode_engaged(&self) -> bool {
        self.fcu_vertical_mode == VerticalMode::Des
    }

    pub fn set_fcu_vertical_mode(&mut self, mode: VerticalMode) {
        self.fcu_vertical_mode = mode;
    }

    pub fn set_fcu_speed(&mut self, speed: Velocity) {
        self.fcu_speed = speed;
    }

    pub fn set_managed_descent_speed(&mut self, speed: Velocity) {
        self.managed_descent_speed = speed;
    }

    pub fn set_managed_descent_speed_mach(&mut self, mach: MachNumber) {
        self.managed_descent_speed_mach = mach;
    }

    pub fn set_flight_phase(&mut self, flight_phase: FmgcFlightPhase) {
        self.flight_phase = flight_phase;
    }
}

impl Default for VerticalProfileComputationParameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Acquires [`VerticalProfileComputationParameters`] and the autoflight speed management state
/// from the simulator bus.
pub struct VerticalProfileComputationParametersObserver {
    fcu_vertical_mode_id: VariableIdentifier,
    fcu_speed_id: VariableIdentifier,
    managed_descent_speed_id: VariableIdentifier,
    managed_descent_speed_mach_id: VariableIdentifier,
    flight_phase_id: VariableIdentifier,
    airspeed_managed_id: VariableIdentifier,

    parameters: VerticalProfileComputationParameters,
    airspeed_managed: bool,
}

impl VerticalProfileComputationParametersObserver {
    pub const FCU_VERTICAL_MODE: &'static str = "A32NX_FMA_VERTICAL_MODE";
    pub const FCU_SPEED: &'static str = "A32NX_AUTOPILOT_SPEED_SELECTED";
    pub const MANAGED_DESCENT_SPEED: &'static str = "A32NX_FMGC_MANAGED_DESCENT_SPEED";
    pub const MANAGED_DESCENT_SPEED_MACH: &'static str = "A32NX_FMGC_MANAGED_DESCENT_SPEED_MACH";
    pub const FLIGHT_PHASE: &'static str = "A32NX_FMGC_FLIGHT_PHASE";
    pub const AIRSPEED_MANAGED: &'static str = "A32NX_FCU_SPD_MANAGED_DOT";

    pub fn new(context: &mut InitContext) -> Self {
        Self {
            fcu_vertical_mode_id: context.get_identifier(Self::FCU_VERTICAL_MODE.to_owned()),
            fcu_speed_id: context.get_identifier(Self::FCU_SPEED.to_owned()),
            managed_descent_speed_id: context
                .get_identifier(Self::MANAGED_DESCENT_SPEED.to_owned()),
            managed_descent_speed_mach_id: context
                .get_identifier(Self::MANAGED_DESCENT_SPEED_MACH.to_owned()),
            flight_phase_id: context.get_identifier(Self::FLIGHT_PHASE.to_owned()),
            airspeed_managed_id: context.get_identifier(Self::AIRSPEED_MANAGED.to_owned()),
            parameters: VerticalProfileComputationParameters::new(),
            airspeed_managed: false,
        }
    }

    pub fn get(&self) -> &VerticalProfileComputationParameters {
        &self.parameters
    }

    pub fn is_airspeed_managed(&self) -> bool {
        self.airspeed_managed
    }
}

impl SimulationElement for VerticalProfileComputationParametersObserver {
    fn read(&mut self, reader: &mut SimulatorReader) {
        let vertical_mode: u8 = reader.read(&self.fcu_vertical_mode_id);
        let flight_phase: u8 = reader.read(&self.flight_phase_id);

        self.parameters
            .set_fcu_vertical_mode(VerticalMode::from(vertical_mode));
        self.parameters.set_fcu_speed(reader.read(&self.fcu_speed_id));
        self.parameters
            .set_managed_descent_speed(reader.read(&self.managed_descent_speed_id));
        self.parameters
            .set_managed_descent_speed_mach(reader.read(&self.managed_descent_speed_mach_id));
        self.parameters
            .set_flight_phase(FmgcFlightPhase::from(flight_phase));
        self.airspeed_managed = reader.read(&self.airspeed_managed_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use systems::simulation::{test::TestVariableTable, VariableRegistry};

    #[test]
    fn reads_a_snapshot_from_the_bus() {
        let mut registry = VariableRegistry::new();
        let mut observer =
            VerticalProfileComputationParametersObserver::new(&mut InitContext::new(&mut registry));

        let mut table = TestVariableTable::new();
        let mut set = |name: &str, value: f64| {
            let id = registry.find(name).expect("observer registers all its inputs");
            table.set(&id, value);
        };
        set(VerticalProfileComputationParametersObserver::FCU_VERTICAL_MODE, 21.);
        set(VerticalProfileComputationParametersObserver::FCU_SPEED, 250.);
        set(VerticalProfileComputationParametersObserver::MANAGED_DESCENT_SPEED, 290.);
        set(VerticalProfileComputationParametersObserver::MANAGED_DESCENT_SPEED_MACH, 0.78);
        set(VerticalProfileComputationParametersObserver::FLIGHT_PHASE, 4.);
        set(VerticalProfileComputationParametersObserver::AIRSPEED_MANAGED, 1.);

        observer.read(&mut SimulatorReader::new(&mut table));

        let parameters = observer.get();
        assert_eq!(parameters.fcu_vertical_mode(), VerticalMode::Des);
        assert!(parameters.is_des_mode_engaged());
        assert!((parameters.fcu_speed().get::<knot>() - 250.).abs() < 1e-9);
        assert!((parameters.managed_descent_speed().get::<knot>() - 290.).abs() < 1e-9);
        assert_eq!(parameters.managed_descent_speed_mach(), MachNumber(0.78));
        assert_eq!(parameters.flight_phase(), FmgcFlightPhase::Descent);
        assert!(observer.is_airspeed_managed());
    }

    #[test]
    fn unknown_bus_values_fall_back_to_neutral_modes() {
        let mut registry = VariableRegistry::new();
        let mut observer =
            VerticalProfileComputationParametersObserver::new(&mut InitContext::new(&mut registry));

        let mut table = TestVariableTable::new();
        let mode_id = registry
            .find(VerticalProfileComputationParametersObserver::FCU_VERTICAL_MODE)
            .unwrap();
        let phase_id = registry
            .find(VerticalProfileComputationParametersObserver::FLIGHT_PHASE)
            .unwrap();
        table.set(&mode_id, 77.);
        table.set(&phase_id, -3.);

        observer.read(&mut SimulatorReader::new(&mut table));

        assert_eq!(observer.get().fcu_vertical_mode(), VerticalMode::None);
        assert_eq!(observer.get().flight_phase(), FmgcFlightPhase::Preflight);
        assert!(!observer.is_airspeed_managed());
    }
}
