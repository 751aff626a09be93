use crate::fmgc::{
    atmosphere::AtmosphericConditions,
    control_laws::{RequestedVerticalMode, TargetVerticalSpeed},
    parameters::VerticalProfileComputationParameters,
};
use profile::DescentProfileRelation;
use systems::shared::{FmgcFlightPhase, MachNumber};
use tracing::{debug, info, warn};
use uom::si::{f64::*, velocity::knot};

mod config;
mod outputs;
pub mod profile;
mod speed_margin;

pub use config::{DescentGuidanceConfig, DescentGuidanceConfigError};
pub use outputs::{
    DescentGuidanceOutputs, DescentGuidanceSink, SpeedGuidanceOutput, SpeedMargins,
    VerticalGuidanceOutput,
};
pub use speed_margin::{SpeedMargin, SpeedMarginConfig};

/// Whether the descent guidance is in charge of the vertical targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescentVerticalGuidanceState {
    InvalidProfile,
    ProvidingGuidance,
    Observing,
}

impl DescentVerticalGuidanceState {
    /// The state requested by the FCU vertical mode. Only DES makes the descent guidance
    /// authoritative. An invalid profile is left once DES is engaged on a valid profile.
    fn on_vertical_mode(self, des_mode_engaged: bool) -> Self {
        match (self, des_mode_engaged) {
            (DescentVerticalGuidanceState::ProvidingGuidance, false) => {
                DescentVerticalGuidanceState::Observing
            }
            (DescentVerticalGuidanceState::Observing, true)
            | (DescentVerticalGuidanceState::InvalidProfile, true) => {
                DescentVerticalGuidanceState::ProvidingGuidance
            }
            (state, _) => state,
        }
    }

    /// Targets are reset on the edge into an invalid profile only.
    fn resets_guidance_entering(self, next: Self) -> bool {
        self != DescentVerticalGuidanceState::InvalidProfile
            && next == DescentVerticalGuidanceState::InvalidProfile
    }
}

/// Which speed outputs the descent guidance publishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescentSpeedGuidanceState {
    NotInDescentPhase,
    TargetOnly,
    TargetAndMargins,
}

impl DescentSpeedGuidanceState {
    /// Evaluated from scratch every cycle.
    fn evaluate(
        flight_phase: FmgcFlightPhase,
        vertical_state: DescentVerticalGuidanceState,
        airspeed_managed: bool,
    ) -> Self {
        if flight_phase != FmgcFlightPhase::Descent {
            DescentSpeedGuidanceState::NotInDescentPhase
        } else if vertical_state == DescentVerticalGuidanceState::ProvidingGuidance
            && airspeed_managed
        {
            DescentSpeedGuidanceState::TargetAndMargins
        } else {
            DescentSpeedGuidanceState::TargetOnly
        }
    }

    /// The margin visibility to publish when moving from `self` to `next`, if it changes.
    fn margin_visibility_entering(self, next: Self) -> Option<bool> {
        if self == next {
            None
        } else if self == DescentSpeedGuidanceState::TargetAndMargins {
            Some(false)
        } else if next == DescentSpeedGuidanceState::TargetAndMargins {
            Some(true)
        } else {
            None
        }
    }

    fn shows_margins(self) -> bool {
        self == DescentSpeedGuidanceState::TargetAndMargins
    }
}

/// The resolved speed target. Managed targets are capped by the managed descent Mach, in which
/// case the airspeed is the indicated equivalent of that Mach number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpeedTarget {
    Selected(Velocity),
    Managed(Velocity),
    MachLimited { mach: MachNumber, airspeed: Velocity },
}

impl SpeedTarget {
    pub fn airspeed(&self) -> Velocity {
        match self {
            SpeedTarget::Selected(airspeed)
            | SpeedTarget::Managed(airspeed)
            | SpeedTarget::MachLimited { airspeed, .. } => *airspeed,
        }
    }
}

/// What the profile relation knows about the aircraft's position relative to the path, as far
/// as DES mode selection is concerned.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PathRelation {
    linear_deviation: Length,
    is_before_top_of_descent: bool,
    is_on_geometric_path: bool,
    is_above_speed_limit_altitude: bool,
    target_path_angle: Angle,
    target_vertical_speed: Velocity,
}

impl PathRelation {
    fn from_relation(relation: &impl DescentProfileRelation) -> Self {
        Self {
            linear_deviation: relation.compute_linear_deviation(),
            is_before_top_of_descent: !relation.is_past_top_of_descent(),
            is_on_geometric_path: relation.is_on_geometric_path(),
            is_above_speed_limit_altitude: relation.is_above_speed_limit_altitude(),
            target_path_angle: relation.current_target_path_angle(),
            target_vertical_speed: relation.current_target_vertical_speed(),
        }
    }
}

/// Picks the vertical law for DES mode. Returns `None` as vertical target where the law does not
/// use one, in which case the previous target stands.
///
/// Deviations within the deadband, boundaries included, count as on path. Before the top of
/// descent the aircraft always counts as below the path.
fn select_des_mode(
    path: &PathRelation,
    config: &DescentGuidanceConfig,
) -> (RequestedVerticalMode, Option<TargetVerticalSpeed>) {
    let deadband = config.linear_deviation_deadband();

    if path.is_before_top_of_descent || path.linear_deviation < -deadband {
        if path.is_on_geometric_path {
            // Capture from below at a fraction of the path angle so as not to fly through it.
            (
                RequestedVerticalMode::FpaSpeed,
                Some(TargetVerticalSpeed::FlightPathAngle(
                    path.target_path_angle * config.path_capture_factor(),
                )),
            )
        } else {
            (
                RequestedVerticalMode::VsSpeed,
                Some(TargetVerticalSpeed::VerticalSpeed(
                    config.idle_descent_rate(path.is_above_speed_limit_altitude),
                )),
            )
        }
    } else if path.linear_deviation > deadband {
        (RequestedVerticalMode::SpeedThrust, None)
    } else if path.is_on_geometric_path {
        (
            RequestedVerticalMode::VpathSpeed,
            Some(TargetVerticalSpeed::VerticalSpeed(
                path.target_vertical_speed,
            )),
        )
    } else {
        (
            RequestedVerticalMode::VpathThrust,
            Some(TargetVerticalSpeed::VerticalSpeed(
                path.target_vertical_speed,
            )),
        )
    }
}

/// The DES mode guidance of the FMGC.
///
/// Once per guidance cycle it relates the aircraft to the descent profile, decides which vertical
/// law the flight guidance should fly and which speed target (and margins) the autothrust should
/// use, and publishes the result to a [`DescentGuidanceSink`].
pub struct DescentGuidance<R: DescentProfileRelation> {
    relation: R,
    config: DescentGuidanceConfig,
    speed_margin: SpeedMargin,

    vertical_state: DescentVerticalGuidanceState,
    speed_state: DescentSpeedGuidanceState,

    vertical: VerticalGuidanceOutput,
    speed_target: Option<SpeedTarget>,
    top_of_descent_reached: Option<bool>,
}

impl<R: DescentProfileRelation> DescentGuidance<R> {
    pub fn new(relation: R) -> Self {
        Self::with_valid_config(relation, DescentGuidanceConfig::default())
    }

    pub fn with_config(
        relation: R,
        config: DescentGuidanceConfig,
    ) -> Result<Self, DescentGuidanceConfigError> {
        config.validate()?;

        Ok(Self::with_valid_config(relation, config))
    }

    fn with_valid_config(relation: R, config: DescentGuidanceConfig) -> Self {
        Self {
            relation,
            speed_margin: SpeedMargin::new(config.speed_margin()),
            config,
            vertical_state: DescentVerticalGuidanceState::InvalidProfile,
            speed_state: DescentSpeedGuidanceState::NotInDescentPhase,
            vertical: VerticalGuidanceOutput::neutral(),
            speed_target: None,
            top_of_descent_reached: None,
        }
    }

    /// Hands a newly computed profile to the profile relation. If the relation cannot use it,
    /// guidance stops and its targets are reset.
    pub fn update_profile(&mut self, profile: R::Profile, sink: &mut impl DescentGuidanceSink) {
        self.relation.update_profile(profile);

        if !self.relation.is_valid() {
            self.change_vertical_state(DescentVerticalGuidanceState::InvalidProfile, sink);
        }
    }

    /// Runs one guidance cycle.
    ///
    /// While the profile relation is invalid nothing is published, and the values published last
    /// remain on the boundary.
    // TODO: the stale targets are not flagged to the flight guidance while the profile is being
    // recomputed; decide whether an explicit "no data" state is needed there.
    pub fn update(
        &mut self,
        parameters: &VerticalProfileComputationParameters,
        airspeed_managed: bool,
        atmosphere: &impl AtmosphericConditions,
        sink: &mut impl DescentGuidanceSink,
    ) {
        self.relation.update(parameters);

        if !self.relation.is_valid() {
            return;
        }

        let next_vertical_state = self
            .vertical_state
            .on_vertical_mode(parameters.is_des_mode_engaged());
        self.change_vertical_state(next_vertical_state, sink);

        let margin_visibility = self.update_speed_state(parameters, airspeed_managed);

        self.update_speed_target(parameters, airspeed_managed, atmosphere);
        let (speed, margins) = self.update_speed_guidance(parameters, atmosphere);
        self.update_linear_deviation(parameters);

        if self.vertical_state == DescentVerticalGuidanceState::ProvidingGuidance {
            self.update_des_mode_guidance(atmosphere);
        }

        sink.publish(&DescentGuidanceOutputs {
            vertical: self.vertical,
            speed,
            margin_visibility,
            margins: margins.or_else(|| {
                if margin_visibility == Some(false) {
                    Some(SpeedMargins::zero())
                } else {
                    None
                }
            }),
        });

        self.update_top_of_descent_reached(parameters, airspeed_managed, sink);
    }

    pub fn vertical_state(&self) -> DescentVerticalGuidanceState {
        self.vertical_state
    }

    pub fn speed_state(&self) -> DescentSpeedGuidanceState {
        self.speed_state
    }

    pub fn vertical_guidance(&self) -> &VerticalGuidanceOutput {
        &self.vertical
    }

    pub fn speed_target(&self) -> Option<SpeedTarget> {
        self.speed_target
    }

    pub fn top_of_descent_reached(&self) -> bool {
        self.top_of_descent_reached.unwrap_or(false)
    }

    pub fn relation(&self) -> &R {
        &self.relation
    }

    pub fn relation_mut(&mut self) -> &mut R {
        &mut self.relation
    }

    fn change_vertical_state(
        &mut self,
        new_state: DescentVerticalGuidanceState,
        sink: &mut impl DescentGuidanceSink,
    ) {
        if self.vertical_state == new_state {
            return;
        }

        if self.vertical_state.resets_guidance_entering(new_state) {
            info!(from = ?self.vertical_state, "descent profile invalid, resetting guidance");
            self.vertical = VerticalGuidanceOutput::neutral();
            sink.publish(&DescentGuidanceOutputs::vertical_only(self.vertical));
        }

        debug!(from = ?self.vertical_state, to = ?new_state, "descent vertical guidance state");
        self.vertical_state = new_state;
    }

    fn update_speed_state(
        &mut self,
        parameters: &VerticalProfileComputationParameters,
        airspeed_managed: bool,
    ) -> Option<bool> {
        let new_state = DescentSpeedGuidanceState::evaluate(
            parameters.flight_phase(),
            self.vertical_state,
            airspeed_managed,
        );

        if new_state == self.speed_state {
            return None;
        }

        let margin_visibility = self.speed_state.margin_visibility_entering(new_state);
        debug!(from = ?self.speed_state, to = ?new_state, "descent speed guidance state");
        self.speed_state = new_state;

        margin_visibility
    }

    fn update_speed_target(
        &mut self,
        parameters: &VerticalProfileComputationParameters,
        airspeed_managed: bool,
        atmosphere: &impl AtmosphericConditions,
    ) {
        self.speed_target = Some(if airspeed_managed {
            Self::managed_speed_target(
                self.relation.current_target_speed(),
                parameters.managed_descent_speed_mach(),
                atmosphere,
            )
        } else {
            SpeedTarget::Selected(parameters.fcu_speed())
        });
    }

    /// Takes whichever of the airspeed and the Mach number is more restrictive, rounded to the
    /// nearest knot. Without a usable Mach conversion the airspeed stands.
    fn managed_speed_target(
        airspeed: Velocity,
        mach: MachNumber,
        atmosphere: &impl AtmosphericConditions,
    ) -> SpeedTarget {
        let round = |speed: Velocity| Velocity::new::<knot>(speed.get::<knot>().round());

        match atmosphere.mach_to_indicated_airspeed(mach) {
            Some(mach_as_ias) if mach_as_ias.is_finite() && mach_as_ias.get::<knot>() > 0. => {
                if airspeed > mach_as_ias {
                    SpeedTarget::MachLimited {
                        mach,
                        airspeed: round(mach_as_ias),
                    }
                } else {
                    SpeedTarget::Managed(round(airspeed))
                }
            }
            _ => {
                warn!(%mach, "no usable airspeed for managed descent Mach, using airspeed target");
                SpeedTarget::Managed(round(airspeed))
            }
        }
    }

    fn update_speed_guidance(
        &self,
        parameters: &VerticalProfileComputationParameters,
        atmosphere: &impl AtmosphericConditions,
    ) -> (Option<SpeedGuidanceOutput>, Option<SpeedMargins>) {
        let target = match self.speed_target {
            Some(target) if self.speed_state != DescentSpeedGuidanceState::NotInDescentPhase => {
                target.airspeed()
            }
            _ => return (None, None),
        };

        if !self.speed_state.shows_margins() {
            return (
                Some(SpeedGuidanceOutput {
                    pfd: target,
                    athr: target,
                }),
                None,
            );
        }

        let athr = self.speed_margin.get_target(
            atmosphere.current_airspeed(),
            target,
            parameters,
            atmosphere,
        );
        let (lower, upper) = self
            .speed_margin
            .get_margins(target, parameters, atmosphere);

        (
            Some(SpeedGuidanceOutput { pfd: target, athr }),
            Some(SpeedMargins { lower, upper }),
        )
    }

    fn update_linear_deviation(&mut self, parameters: &VerticalProfileComputationParameters) {
        self.vertical.target_altitude_display = self.relation.current_target_altitude();
        self.vertical.show_linear_deviation = parameters.flight_phase()
            >= FmgcFlightPhase::Descent
            || self.relation.is_past_top_of_descent();
    }

    fn update_des_mode_guidance(&mut self, atmosphere: &impl AtmosphericConditions) {
        self.vertical.target_altitude_guidance =
            atmosphere.estimate_pressure_altitude(self.relation.current_target_altitude());

        let (mode, target_vertical_speed) =
            select_des_mode(&PathRelation::from_relation(&self.relation), &self.config);

        self.vertical.requested_vertical_mode = mode;
        if let Some(target_vertical_speed) = target_vertical_speed {
            self.vertical.target_vertical_speed = target_vertical_speed;
        }
    }

    fn update_top_of_descent_reached(
        &mut self,
        parameters: &VerticalProfileComputationParameters,
        airspeed_managed: bool,
        sink: &mut impl DescentGuidanceSink,
    ) {
        let reached = parameters.flight_phase() <= FmgcFlightPhase::Cruise
            && self.relation.is_past_top_of_descent()
            && airspeed_managed;

        if self.top_of_descent_reached != Some(reached) {
            debug!(reached, "top of descent advisory");
            self.top_of_descent_reached = Some(reached);
            sink.publish_top_of_descent_reached(reached);
        }
    }
}
