use super::config::DescentGuidanceConfigError;
use crate::fmgc::{
    atmosphere::AtmosphericConditions, parameters::VerticalProfileComputationParameters,
};
use systems::shared::MachNumber;
use uom::si::{f64::*, velocity::knot};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedMarginConfig {
    vmo: Velocity,
    mmo: MachNumber,
    vmax_buffer: Velocity,
    lower_margin: Velocity,
    upper_margin: Velocity,
    reduced_upper_margin: Velocity,
    limited_target_threshold: Velocity,
}

impl SpeedMarginConfig {
    pub fn new(
        vmo: Velocity,
        mmo: MachNumber,
        lower_margin: Velocity,
        upper_margin: Velocity,
        reduced_upper_margin: Velocity,
    ) -> Self {
        Self {
            vmo,
            mmo,
            lower_margin,
            upper_margin,
            reduced_upper_margin,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DescentGuidanceConfigError> {
        let zero = Velocity::new::<knot>(0.);
        if !(self.lower_margin > zero) || !(self.upper_margin > zero) {
            return Err(DescentGuidanceConfigError::NonPositiveSpeedMargin {
                lower: self.lower_margin.get::<knot>(),
                upper: self.upper_margin.get::<knot>(),
            });
        }

        if !(self.reduced_upper_margin > zero) || self.reduced_upper_margin > self.upper_margin {
            return Err(DescentGuidanceConfigError::InvalidReducedUpperMargin(
                self.reduced_upper_margin.get::<knot>(),
            ));
        }

        if !(self.vmo > self.vmax_buffer) || !(self.mmo.value() > 0.) {
            return Err(DescentGuidanceConfigError::InvalidSpeedLimits {
                vmo: self.vmo.get::<knot>(),
                mmo: self.mmo.value(),
            });
        }

        Ok(())
    }
}

impl Default for SpeedMarginConfig {
    fn default() -> Self {
        Self {
            vmo: Velocity::new::<knot>(350.),
            mmo: MachNumber(0.82),
            vmax_buffer: Velocity::new::<knot>(3.),
            lower_margin: Velocity::new::<knot>(20.),
            upper_margin: Velocity::new::<knot>(20.),
            reduced_upper_margin: Velocity::new::<knot>(5.),
            limited_target_threshold: Velocity::new::<knot>(1.),
        }
    }
}

/// Widens the managed descent speed into a band the autothrust may float in while the aircraft
/// tracks the path, so that it does not chase every knot with the thrust levers.
pub struct SpeedMargin {
    config: SpeedMarginConfig,
}

impl SpeedMargin {
    pub fn new(config: SpeedMarginConfig) -> Self {
        Self { config }
    }

    /// The speed the autothrust should target: the current airspeed, as long as it stays within
    /// the margins around `target`.
    pub fn get_target(
        &self,
        airspeed: Velocity,
        target: Velocity,
        parameters: &VerticalProfileComputationParameters,
        atmosphere: &impl AtmosphericConditions,
    ) -> Velocity {
        let (lower, upper) = self.get_margins(target, parameters, atmosphere);

        if !airspeed.is_finite() {
            return target;
        }

        lower.max(airspeed.min(upper))
    }

    /// Returns `(lower, upper)` with `lower <= target <= upper`.
    pub fn get_margins(
        &self,
        target: Velocity,
        parameters: &VerticalProfileComputationParameters,
        atmosphere: &impl AtmosphericConditions,
    ) -> (Velocity, Velocity) {
        let vmax = self.vmax(atmosphere);

        // A target well below the managed speed is already being held down by a constraint or
        // the speed limit, so there is less room above it.
        let upper_width =
            if parameters.managed_descent_speed() - target > self.config.limited_target_threshold {
                self.config.reduced_upper_margin
            } else {
                self.config.upper_margin
            };

        let upper = target.max((vmax - self.config.vmax_buffer).min(target + upper_width));
        let lower = target.min((target - self.config.lower_margin).max(Velocity::new::<knot>(0.)));

        (lower, upper)
    }

    fn vmax(&self, atmosphere: &impl AtmosphericConditions) -> Velocity {
        match atmosphere.mach_to_indicated_airspeed(self.config.mmo) {
            Some(mmo_as_ias) if mmo_as_ias.is_finite() && mmo_as_ias.get::<knot>() > 0. => {
                self.config.vmo.min(mmo_as_ias)
            }
            _ => self.config.vmo,
        }
    }
}

impl Default for SpeedMargin {
    fn default() -> Self {
        Self::new(SpeedMarginConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmgc::test::TestAtmosphere;
    use rand::Rng;
    use rstest::rstest;

    fn knots(value: f64) -> Velocity {
        Velocity::new::<knot>(value)
    }

    fn parameters_with_managed_descent_speed(speed: f64) -> VerticalProfileComputationParameters {
        let mut parameters = VerticalProfileComputationParameters::new();
        parameters.set_managed_descent_speed(knots(speed));
        parameters
    }

    fn assert_about_eq(actual: Velocity, expected: f64) {
        assert!(
            (actual.get::<knot>() - expected).abs() < 1e-6,
            "Expected: {}, got: {}",
            expected,
            actual.get::<knot>()
        );
    }

    #[test]
    fn margins_are_twenty_knots_either_side_of_an_unconstrained_target() {
        let margin = SpeedMargin::default();
        let (lower, upper) = margin.get_margins(
            knots(290.),
            &parameters_with_managed_descent_speed(290.),
            &TestAtmosphere::new(),
        );

        assert_about_eq(lower, 270.);
        assert_about_eq(upper, 310.);
    }

    #[test]
    fn upper_margin_shrinks_when_target_is_held_below_managed_speed() {
        let margin = SpeedMargin::default();
        let (lower, upper) = margin.get_margins(
            knots(250.),
            &parameters_with_managed_descent_speed(290.),
            &TestAtmosphere::new(),
        );

        assert_about_eq(lower, 230.);
        assert_about_eq(upper, 255.);
    }

    #[test]
    fn upper_margin_stays_clear_of_vmax() {
        let margin = SpeedMargin::default();
        let (_, upper) = margin.get_margins(
            knots(340.),
            &parameters_with_managed_descent_speed(340.),
            &TestAtmosphere::new(),
        );

        assert_about_eq(upper, 347.);
    }

    #[test]
    fn mmo_limits_vmax_at_altitude() {
        let margin = SpeedMargin::default();
        let (_, upper) = margin.get_margins(
            knots(290.),
            &parameters_with_managed_descent_speed(290.),
            &TestAtmosphere::new().with_mach_crossover(knots(300.)),
        );

        assert_about_eq(upper, 297.);
    }

    #[test]
    fn failed_mach_conversion_falls_back_to_vmo() {
        let margin = SpeedMargin::default();
        let (_, upper) = margin.get_margins(
            knots(340.),
            &parameters_with_managed_descent_speed(340.),
            &TestAtmosphere::new().without_mach_crossover(),
        );

        assert_about_eq(upper, 347.);
    }

    #[rstest]
    #[case(250., 270.)]
    #[case(300., 300.)]
    #[case(330., 310.)]
    fn guidance_target_follows_airspeed_within_margins(
        #[case] airspeed: f64,
        #[case] expected: f64,
    ) {
        let margin = SpeedMargin::default();
        let target = margin.get_target(
            knots(airspeed),
            knots(290.),
            &parameters_with_managed_descent_speed(290.),
            &TestAtmosphere::new(),
        );

        assert_about_eq(target, expected);
    }

    #[test]
    fn non_finite_airspeed_yields_raw_target() {
        let margin = SpeedMargin::default();
        let target = margin.get_target(
            knots(f64::NAN),
            knots(290.),
            &parameters_with_managed_descent_speed(290.),
            &TestAtmosphere::new(),
        );

        assert_about_eq(target, 290.);
    }

    #[test]
    fn margins_always_enclose_target_and_guidance_target() {
        let mut rng = rand::thread_rng();
        let margin = SpeedMargin::default();

        for _ in 0..1000 {
            let target = knots(rng.gen_range(0.0..400.0));
            let airspeed = knots(rng.gen_range(0.0..400.0));
            let parameters = parameters_with_managed_descent_speed(rng.gen_range(150.0..350.0));
            let atmosphere =
                TestAtmosphere::new().with_mach_crossover(knots(rng.gen_range(200.0..400.0)));

            let (lower, upper) = margin.get_margins(target, &parameters, &atmosphere);
            let guidance = margin.get_target(airspeed, target, &parameters, &atmosphere);

            assert!(lower <= target && target <= upper);
            assert!(lower <= guidance && guidance <= upper);
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SpeedMarginConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_width_margins_are_rejected() {
        let config = SpeedMarginConfig::new(
            knots(350.),
            MachNumber(0.82),
            knots(0.),
            knots(20.),
            knots(5.),
        );

        assert!(matches!(
            config.validate(),
            Err(DescentGuidanceConfigError::NonPositiveSpeedMargin { .. })
        ));
    }

    #[test]
    fn reduced_upper_margin_must_not_exceed_upper_margin() {
        let config = SpeedMarginConfig::new(
            knots(350.),
            MachNumber(0.82),
            knots(20.),
            knots(10.),
            knots(15.),
        );

        assert!(matches!(
            config.validate(),
            Err(DescentGuidanceConfigError::InvalidReducedUpperMargin(_))
        ));
    }
}
