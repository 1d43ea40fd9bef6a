//! Timed open-loop square sequencer
//!
//! The robot drives one side, stops, turns, stops, and repeats. Every phase
//! lasts a fixed time derived from the kinematic parameters; nothing measured
//! on the robot is fed back.

use crate::common::VelocityCommand;
use crate::config::{MotionParams, PhaseDurations};
use crate::error::Result;
use log::info;
use std::fmt;
use std::time::{Duration, Instant};

/// Phase of the square the robot is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Advancing,
    PausedAfterAdvance,
    Turning,
    PausedAfterTurn,
}

impl SequencerState {
    /// The state that follows this one in the square
    pub fn next(self) -> SequencerState {
        match self {
            SequencerState::Advancing => SequencerState::PausedAfterAdvance,
            SequencerState::PausedAfterAdvance => SequencerState::Turning,
            SequencerState::Turning => SequencerState::PausedAfterTurn,
            SequencerState::PausedAfterTurn => SequencerState::Advancing,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SequencerState::Advancing => "advancing",
            SequencerState::PausedAfterAdvance => "paused_after_advance",
            SequencerState::Turning => "turning",
            SequencerState::PausedAfterTurn => "paused_after_turn",
        }
    }
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the transition table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    /// Command published while in the state
    pub command: VelocityCommand,
    /// Time spent in the state before moving on
    pub duration: Duration,
    pub next: SequencerState,
}

/// Drives the robot around the square from elapsed time alone
#[derive(Debug, Clone)]
pub struct MotionSequencer {
    params: MotionParams,
    durations: PhaseDurations,
    state: SequencerState,
    state_entry: Instant,
    sides_completed: u64,
    laps_completed: u64,
}

impl MotionSequencer {
    /// Create a sequencer that starts advancing at `start`
    pub fn new(params: MotionParams, start: Instant) -> Result<Self> {
        let durations = params.phase_durations()?;
        Ok(MotionSequencer {
            params,
            durations,
            state: SequencerState::Advancing,
            state_entry: start,
            sides_completed: 0,
            laps_completed: 0,
        })
    }

    /// Transition table lookup
    pub fn phase_of(&self, state: SequencerState) -> Phase {
        let (command, duration) = match state {
            SequencerState::Advancing => (
                VelocityCommand::new(self.params.linear_speed, 0.0),
                self.durations.advance,
            ),
            SequencerState::PausedAfterAdvance => (VelocityCommand::stop(), self.durations.pause),
            SequencerState::Turning => (
                VelocityCommand::new(0.0, self.params.angular_speed),
                self.durations.turn,
            ),
            SequencerState::PausedAfterTurn => (VelocityCommand::stop(), self.durations.pause),
        };
        Phase {
            command,
            duration,
            next: state.next(),
        }
    }

    /// Row of the transition table for the current state
    pub fn phase(&self) -> Phase {
        self.phase_of(self.state)
    }

    /// Compute the command for this tick and advance the state if its time is up.
    ///
    /// The returned command belongs to the state the tick started in, so a
    /// transitioning tick still reports the command of the state being left.
    pub fn tick(&mut self, now: Instant) -> VelocityCommand {
        let phase = self.phase();

        if self.elapsed(now) >= phase.duration {
            match self.state {
                SequencerState::Advancing => self.sides_completed += 1,
                SequencerState::PausedAfterTurn => self.laps_completed += 1,
                _ => {}
            }
            info!(
                "Sequencer: {} -> {} after {:.2}s",
                self.state,
                phase.next,
                self.elapsed(now).as_secs_f64()
            );
            self.state = phase.next;
            self.state_entry = now;
        }

        phase.command
    }

    /// Go back to the start of a side, keeping the counters
    pub fn restart(&mut self, now: Instant) {
        self.state = SequencerState::Advancing;
        self.state_entry = now;
    }

    /// Time spent in the current state; zero if `now` is before the entry time
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state_entry)
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Number of sides driven so far
    pub fn sides_completed(&self) -> u64 {
        self.sides_completed
    }

    /// Number of times the sequence has come back round to advancing
    pub fn laps_completed(&self) -> u64 {
        self.laps_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn sequencer() -> (MotionSequencer, Instant) {
        let t0 = Instant::now();
        (MotionSequencer::new(MotionParams::default(), t0).unwrap(), t0)
    }

    /// Drive the sequencer into `target`, returning the time it was entered
    fn enter(seq: &mut MotionSequencer, t0: Instant, target: SequencerState) -> Instant {
        let mut now = t0;
        while seq.state() != target {
            now += seq.phase().duration;
            seq.tick(now);
        }
        now
    }

    #[test]
    fn advancing_holds_forward_command_until_side_is_driven() {
        let (mut seq, t0) = sequencer();

        for tenth in 0..100 {
            let cmd = seq.tick(t0 + secs(tenth as f64 * 0.1));
            assert_eq!(cmd, VelocityCommand::new(0.05, 0.0));
            assert_eq!(seq.state(), SequencerState::Advancing);
        }

        let cmd = seq.tick(t0 + secs(10.0));
        assert_eq!(cmd, VelocityCommand::new(0.05, 0.0));
        assert_eq!(seq.state(), SequencerState::PausedAfterAdvance);
        assert_eq!(seq.sides_completed(), 1);
    }

    #[test]
    fn turning_lasts_two_seconds() {
        let (mut seq, t0) = sequencer();
        let entered = enter(&mut seq, t0, SequencerState::Turning);

        let cmd = seq.tick(entered + secs(1.9));
        assert_eq!(cmd, VelocityCommand::new(0.0, FRAC_PI_4));
        assert_eq!(seq.state(), SequencerState::Turning);

        let cmd = seq.tick(entered + secs(2.0));
        assert_eq!(cmd, VelocityCommand::new(0.0, FRAC_PI_4));
        assert_eq!(seq.state(), SequencerState::PausedAfterTurn);
    }

    #[test]
    fn pauses_command_stop_for_one_second() {
        for state in [
            SequencerState::PausedAfterAdvance,
            SequencerState::PausedAfterTurn,
        ] {
            let (mut seq, t0) = sequencer();
            let entered = enter(&mut seq, t0, state);
            assert!(seq.tick(entered + secs(0.5)).is_stop());
            assert_eq!(seq.state(), state);
            assert!(seq.tick(entered + secs(1.0)).is_stop());
            assert_eq!(seq.state(), state.next());
        }
    }

    #[test]
    fn transition_resets_elapsed_reference() {
        let (mut seq, t0) = sequencer();
        let late = t0 + secs(12.5);

        seq.tick(late);
        assert_eq!(seq.state(), SequencerState::PausedAfterAdvance);
        assert_eq!(seq.elapsed(late), Duration::ZERO);

        // The pause is timed from the transitioning tick, not from t0
        seq.tick(late + secs(0.9));
        assert_eq!(seq.state(), SequencerState::PausedAfterAdvance);
        seq.tick(late + secs(1.0));
        assert_eq!(seq.state(), SequencerState::Turning);
    }

    #[test]
    fn late_tick_moves_one_state_only() {
        let (mut seq, t0) = sequencer();
        seq.tick(t0 + secs(100.0));
        assert_eq!(seq.state(), SequencerState::PausedAfterAdvance);
    }

    #[test]
    fn four_transitions_close_the_cycle() {
        let (mut seq, t0) = sequencer();
        let mut now = t0;
        let mut visited = Vec::new();

        for _ in 0..4 {
            now += seq.phase().duration;
            seq.tick(now);
            visited.push(seq.state());
        }

        assert_eq!(
            visited,
            [
                SequencerState::PausedAfterAdvance,
                SequencerState::Turning,
                SequencerState::PausedAfterTurn,
                SequencerState::Advancing,
            ]
        );
        assert_eq!(now - t0, secs(14.0));
        assert_eq!(seq.laps_completed(), 1);
        assert_eq!(seq.phase(), {
            let (fresh, _) = sequencer();
            fresh.phase()
        });
    }

    #[test]
    fn clock_going_backwards_counts_as_no_time() {
        let t0 = Instant::now() + secs(5.0);
        let mut seq = MotionSequencer::new(MotionParams::default(), t0).unwrap();
        assert_eq!(seq.elapsed(t0 - secs(3.0)), Duration::ZERO);
        seq.tick(t0 - secs(3.0));
        assert_eq!(seq.state(), SequencerState::Advancing);
    }

    #[test]
    fn restart_returns_to_advancing() {
        let (mut seq, t0) = sequencer();
        let entered = enter(&mut seq, t0, SequencerState::Turning);
        seq.restart(entered);
        assert_eq!(seq.state(), SequencerState::Advancing);
        assert_eq!(seq.sides_completed(), 1);
    }

    #[test]
    fn zero_length_side_transitions_on_first_tick() {
        let params = MotionParams {
            side_length: 0.0,
            ..MotionParams::default()
        };
        let t0 = Instant::now();
        let mut seq = MotionSequencer::new(params, t0).unwrap();
        seq.tick(t0);
        assert_eq!(seq.state(), SequencerState::PausedAfterAdvance);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = MotionParams {
            angular_speed: f64::NAN,
            ..MotionParams::default()
        };
        assert!(MotionSequencer::new(params, Instant::now()).is_err());
    }

    #[test]
    fn table_matches_parameters() {
        let (seq, _) = sequencer();
        let turning = seq.phase_of(SequencerState::Turning);
        assert_eq!(turning.duration, secs(FRAC_PI_2 / FRAC_PI_4));
        assert_eq!(turning.next, SequencerState::PausedAfterTurn);
    }
}
