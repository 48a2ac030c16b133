//! Property tests for the mode cycle and the actuation policy.

use proptest::prelude::*;
use thermostat_common::{
    ActuatorOutputs, ActuatorPattern, CadenceConfig, Mode, SecondLine, StatusCadence,
    ThermostatEngine,
};

const CYCLE: [Mode; 3] = [Mode::Off, Mode::Heat, Mode::Cool];

fn engine_at(position: usize, set_point_f: i32) -> ThermostatEngine {
    let mut engine = ThermostatEngine::new(set_point_f);
    for _ in 0..position % CYCLE.len() {
        engine.advance_mode();
    }
    engine
}

fn engine_in(mode: Mode, set_point_f: i32) -> ThermostatEngine {
    let position = CYCLE.iter().position(|candidate| *candidate == mode).unwrap_or(0);
    engine_at(position, set_point_f)
}

fn temperature() -> impl Strategy<Value = f32> {
    -40.0f32..150.0f32
}

proptest! {
    #[test]
    fn advancing_n_times_lands_on_n_mod_3(start in 0usize..3, presses in 0usize..64) {
        let mut engine = engine_at(start, 72);
        for _ in 0..presses {
            engine.advance_mode();
        }
        prop_assert_eq!(engine.mode(), CYCLE[(start + presses) % 3]);
    }

    #[test]
    fn heat_policy(temp in temperature(), set_point in -50i32..200) {
        let outputs = engine_in(Mode::Heat, set_point).actuator_outputs(Some(temp));
        let expected = if (temp.floor() as i32) < set_point {
            ActuatorPattern::Pulsing
        } else {
            ActuatorPattern::Steady
        };
        prop_assert_eq!(outputs.heat, expected);
        prop_assert_eq!(outputs.cool, ActuatorPattern::Off);
    }

    #[test]
    fn cool_policy(temp in temperature(), set_point in -50i32..200) {
        let outputs = engine_in(Mode::Cool, set_point).actuator_outputs(Some(temp));
        let expected = if (temp.floor() as i32) > set_point {
            ActuatorPattern::Pulsing
        } else {
            ActuatorPattern::Steady
        };
        prop_assert_eq!(outputs.cool, expected);
        prop_assert_eq!(outputs.heat, ActuatorPattern::Off);
    }

    #[test]
    fn off_policy(temp in temperature(), set_point in -50i32..200) {
        let outputs = engine_in(Mode::Off, set_point).actuator_outputs(Some(temp));
        prop_assert_eq!(outputs, ActuatorOutputs::ALL_OFF);
    }

    #[test]
    fn recompute_is_idempotent(mode in 0usize..3, temp in temperature(), set_point in -50i32..200) {
        let engine = engine_at(mode, set_point);
        prop_assert_eq!(engine.actuator_outputs(Some(temp)), engine.actuator_outputs(Some(temp)));
    }

    #[test]
    fn every_window_has_the_same_shape(windows in 1usize..8) {
        let config = CadenceConfig::default();
        let mut cadence = StatusCadence::new(config.clone());
        for _ in 0..windows {
            let plans: Vec<_> = (0..config.window_ticks).map(|_| cadence.next_tick()).collect();
            let temperature_lines = plans
                .iter()
                .filter(|plan| plan.second_line == SecondLine::Temperature)
                .count();
            let refreshes = plans.iter().filter(|plan| plan.refresh_actuators).count();

            prop_assert_eq!(temperature_lines, config.temperature_ticks as usize);
            prop_assert_eq!(refreshes, 1);
            prop_assert!(plans.last().is_some_and(|plan| plan.refresh_actuators));
        }
    }
}
