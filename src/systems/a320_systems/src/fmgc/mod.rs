use atmosphere::AtmosphericConditions;
use descent::{
    profile::DescentProfileRelation, DescentGuidance, DescentGuidanceConfig,
    DescentGuidanceConfigError, DescentGuidanceOutputs, DescentGuidanceSink,
};
use parameters::VerticalProfileComputationParametersObserver;
use std::cell::Cell;
use systems::simulation::{
    InitContext, SimulationElement, SimulationElementVisitor, SimulatorReader, SimulatorWriter,
    VariableIdentifier, Write, Writer,
};

pub mod atmosphere;
pub mod control_laws;
pub mod descent;
pub mod parameters;


/// Bus writes produced while updating, held back until the write phase.
///
/// A variable written more than once before the next flush keeps its last value only, so the
/// buffer stays bounded even when the host skips the write phase.
#[derive(Default)]
struct PendingWrites {
    values: Vec<(VariableIdentifier, f64)>,
    flushed: Cell<usize>,
}

impl PendingWrites {
    fn flush(&self, writer: &mut impl Writer) {
        for (identifier, value) in &self.values {
            writer.write_f64(identifier, *value);
        }
        self.flushed.set(self.values.len());
    }

    /// Forgets what was flushed. Writes made after the last flush are kept for the next one.
    fn discard_flushed(&mut self) {
        let flushed = self.flushed.replace(0).min(self.values.len());
        self.values.drain(..flushed);
    }
}

impl Writer for PendingWrites {
    fn write_f64(&mut self, identifier: &VariableIdentifier, value: f64) {
        let unflushed = self.flushed.get().min(self.values.len());

        match self.values[unflushed..]
            .iter_mut()
            .find(|(pending, _)| pending == identifier)
        {
            Some(entry) => entry.1 = value,
            None => self.values.push((*identifier, value)),
        }
    }
}

/// The named outputs of the descent guidance. Only what is published gets written, so a value
/// stays on the bus until the guidance publishes a new one.
pub struct DescentGuidanceVariables {
    requested_vertical_mode_id: VariableIdentifier,
    target_altitude_guidance_id: VariableIdentifier,
    target_vertical_speed_id: VariableIdentifier,
    target_altitude_display_id: VariableIdentifier,
    linear_deviation_active_id: VariableIdentifier,
    vertical_profile_latched_id: VariableIdentifier,
    managed_speed_pfd_id: VariableIdentifier,
    managed_speed_athr_id: VariableIdentifier,
    show_speed_margins_id: VariableIdentifier,
    lower_speed_margin_id: VariableIdentifier,
    upper_speed_margin_id: VariableIdentifier,
    top_of_descent_reached_id: VariableIdentifier,

    pending: PendingWrites,
}

impl DescentGuidanceVariables {
    pub const REQUESTED_VERTICAL_MODE: &'static str = "A32NX_FG_REQUESTED_VERTICAL_MODE";
    pub const TARGET_ALTITUDE_GUIDANCE: &'static str = "A32NX_FG_TARGET_ALTITUDE";
    pub const TARGET_VERTICAL_SPEED: &'static str = "A32NX_FG_TARGET_VERTICAL_SPEED";
    pub const TARGET_ALTITUDE_DISPLAY: &'static str = "A32NX_PFD_TARGET_ALTITUDE";
    pub const LINEAR_DEVIATION_ACTIVE: &'static str = "A32NX_PFD_LINEAR_DEVIATION_ACTIVE";
    pub const VERTICAL_PROFILE_LATCHED: &'static str = "A32NX_PFD_VERTICAL_PROFILE_LATCHED";
    pub const MANAGED_SPEED_PFD: &'static str = "A32NX_SPEEDS_MANAGED_PFD";
    pub const MANAGED_SPEED_ATHR: &'static str = "A32NX_SPEEDS_MANAGED_ATHR";
    pub const SHOW_SPEED_MARGINS: &'static str = "A32NX_PFD_SHOW_SPEED_MARGINS";
    pub const LOWER_SPEED_MARGIN: &'static str = "A32NX_PFD_LOWER_SPEED_MARGIN";
    pub const UPPER_SPEED_MARGIN: &'static str = "A32NX_PFD_UPPER_SPEED_MARGIN";
    pub const TOP_OF_DESCENT_REACHED: &'static str = "A32NX_PFD_MSG_TD_REACHED";

    pub fn new(context: &mut InitContext) -> Self {
        Self {
            requested_vertical_mode_id: context
                .get_identifier(Self::REQUESTED_VERTICAL_MODE.to_owned()),
            target_altitude_guidance_id: context
                .get_identifier(Self::TARGET_ALTITUDE_GUIDANCE.to_owned()),
            target_vertical_speed_id: context
                .get_identifier(Self::TARGET_VERTICAL_SPEED.to_owned()),
            target_altitude_display_id: context
                .get_identifier(Self::TARGET_ALTITUDE_DISPLAY.to_owned()),
            linear_deviation_active_id: context
                .get_identifier(Self::LINEAR_DEVIATION_ACTIVE.to_owned()),
            vertical_profile_latched_id: context
                .get_identifier(Self::VERTICAL_PROFILE_LATCHED.to_owned()),
            managed_speed_pfd_id: context.get_identifier(Self::MANAGED_SPEED_PFD.to_owned()),
            managed_speed_athr_id: context.get_identifier(Self::MANAGED_SPEED_ATHR.to_owned()),
            show_speed_margins_id: context.get_identifier(Self::SHOW_SPEED_MARGINS.to_owned()),
            lower_speed_margin_id: context.get_identifier(Self::LOWER_SPEED_MARGIN.to_owned()),
            upper_speed_margin_id: context.get_identifier(Self::UPPER_SPEED_MARGIN.to_owned()),
            top_of_descent_reached_id: context
                .get_identifier(Self::TOP_OF_DESCENT_REACHED.to_owned()),
            pending: PendingWrites::default(),
        }
    }

    fn begin_cycle(&mut self) {
        self.pending.discard_flushed();
    }
}

impl DescentGuidanceSink for DescentGuidanceVariables {
    fn publish(&mut self, outputs: &DescentGuidanceOutputs) {
        let vertical = &outputs.vertical;
        self.pending.write(
            &self.requested_vertical_mode_id,
            u8::from(vertical.requested_vertical_mode),
        );
        self.pending.write(
            &self.target_altitude_guidance_id,
            vertical.target_altitude_guidance,
        );
        self.pending.write(
            &self.target_vertical_speed_id,
            vertical.target_vertical_speed.bus_value(),
        );
        self.pending.write(
            &self.target_altitude_display_id,
            vertical.target_altitude_display,
        );
        self.pending.write(
            &self.linear_deviation_active_id,
            vertical.show_linear_deviation,
        );
        self.pending.write(
            &self.vertical_profile_latched_id,
            vertical.show_descent_latch,
        );

        if let Some(speed) = outputs.speed {
            self.pending.write(&self.managed_speed_pfd_id, speed.pfd);
            self.pending.write(&self.managed_speed_athr_id, speed.athr);
        }

        if let Some(visible) = outputs.margin_visibility {
            self.pending.write(&self.show_speed_margins_id, visible);
        }

        if let Some(margins) = outputs.margins {
            self.pending.write(&self.lower_speed_margin_id, margins.lower);
            self.pending.write(&self.upper_speed_margin_id, margins.upper);
        }
    }

    fn publish_top_of_descent_reached(&mut self, reached: bool) {
        self.pending.write(&self.top_of_descent_reached_id, reached);
    }
}

/// The DES mode guidance of the A320 FMGC, wired to the simulator bus.
///
/// Reads the vertical profile computation parameters, runs one guidance cycle per update and
/// writes whatever the guidance published during that cycle. Expects the usual read, update,
/// write order; publications made outside of it are written at the next write phase.
pub struct A320DescentGuidanceSystem<R: DescentProfileRelation> {
    parameters: VerticalProfileComputationParametersObserver,
    guidance: DescentGuidance<R>,
    variables: DescentGuidanceVariables,
}

impl<R: DescentProfileRelation> A320DescentGuidanceSystem<R> {
    pub fn new(context: &mut InitContext, relation: R) -> Self {
        Self {
            parameters: VerticalProfileComputationParametersObserver::new(context),
            guidance: DescentGuidance::new(relation),
            variables: DescentGuidanceVariables::new(context),
        }
    }

    pub fn with_config(
        context: &mut InitContext,
        relation: R,
        config: DescentGuidanceConfig,
    ) -> Result<Self, DescentGuidanceConfigError> {
        Ok(Self {
            parameters: VerticalProfileComputationParametersObserver::new(context),
            guidance: DescentGuidance::with_config(relation, config)?,
            variables: DescentGuidanceVariables::new(context),
        })
    }

    pub fn update_profile(&mut self, profile: R::Profile) {
        self.guidance
            .update_profile(profile, &mut self.variables);
    }

    pub fn update(&mut self, atmosphere: &impl AtmosphericConditions) {
        self.guidance.update(
            self.parameters.get(),
            self.parameters.is_airspeed_managed(),
            atmosphere,
            &mut self.variables,
        );
    }

    pub fn guidance(&self) -> &DescentGuidance<R> {
        &self.guidance
    }
}

impl<R: DescentProfileRelation> SimulationElement for A320DescentGuidanceSystem<R> {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.parameters.accept(visitor);

        visitor.visit(self);
    }

    fn read(&mut self, _reader: &mut SimulatorReader) {
        self.variables.begin_cycle();
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        self.variables.pending.flush(writer);
    }
}
