//! Pointer movement.
//!
//! `trajectory` only plans paths; `move_pointer` plays one back through the
//! input injector, sleeping on the supplied clock between steps.

pub mod trajectory;

pub use trajectory::{CurveShape, Trajectory, TrajectoryParams, TrajectoryStep, generate};

use rand::Rng;

use crate::clock::Clock;
use crate::error::InputError;
use crate::geometry::ScreenPoint;
use crate::platform::InputInjector;

/// Moves the real cursor from its current position to `target` along a
/// freshly generated trajectory.
pub fn move_pointer<R: Rng + ?Sized>(
    input: &dyn InputInjector,
    clock: &dyn Clock,
    params: &TrajectoryParams,
    rng: &mut R,
    target: ScreenPoint,
) -> Result<(), InputError> {
    let start = input.cursor_position()?;
    let path = generate(start, target, params, rng);

    for step in &path {
        input.move_cursor_to(step.point)?;
        clock.sleep(step.delay);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use crate::testing::{FakeInput, InputEvent};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_move_pointer_ends_on_target_and_takes_time() {
        let input = FakeInput::at(ScreenPoint::new(0, 0));
        let clock = VirtualClock::new();
        let mut rng = StdRng::seed_from_u64(11);
        let target = ScreenPoint::new(420, 317);

        move_pointer(&input, &clock, &TrajectoryParams::default(), &mut rng, target).unwrap();

        assert_eq!(input.cursor(), target);
        assert_eq!(input.events().last(), Some(&InputEvent::Move(target)));
        assert!(clock.now() >= std::time::Duration::from_millis(8 * 31));
    }

    #[test]
    fn test_move_pointer_stops_on_injection_failure() {
        let input = FakeInput::at(ScreenPoint::new(0, 0));
        input.fail_after(3);
        let clock = VirtualClock::new();
        let mut rng = StdRng::seed_from_u64(11);

        let result = move_pointer(
            &input,
            &clock,
            &TrajectoryParams::default(),
            &mut rng,
            ScreenPoint::new(100, 100),
        );

        assert!(result.is_err());
        assert_eq!(input.events().len(), 3);
    }
}
