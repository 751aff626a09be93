use crate::fmgc::parameters::VerticalProfileComputationParameters;
use uom::si::f64::*;

/// Relates the aircraft's current position and altitude to a precomputed descent profile.
///
/// The profile itself (legs, constraints, the idle and geometric segments) is built upstream.
/// The relation only answers geometric questions about where the aircraft is with respect to it.
/// It is owned by the descent guidance and receives a new profile whenever one is computed.
pub trait DescentProfileRelation {
    type Profile;

    /// Replaces the profile the relation measures against.
    fn update_profile(&mut self, profile: Self::Profile);

    /// Re-evaluates the aircraft's position along the profile.
    fn update(&mut self, parameters: &VerticalProfileComputationParameters);

    /// Whether the profile can be resolved against the current aircraft position.
    fn is_valid(&self) -> bool;

    /// Profile altitude at the aircraft's current position.
    fn current_target_altitude(&self) -> Length;

    fn current_target_vertical_speed(&self) -> Velocity;

    fn current_target_path_angle(&self) -> Angle;

    fn current_target_speed(&self) -> Velocity;

    /// Aircraft altitude minus profile altitude. Positive above the path.
    fn compute_linear_deviation(&self) -> Length;

    /// Whether the current segment is flown at a fixed flight path angle rather than at idle.
    fn is_on_geometric_path(&self) -> bool;

    fn is_above_speed_limit_altitude(&self) -> bool;

    fn is_past_top_of_descent(&self) -> bool;
}
