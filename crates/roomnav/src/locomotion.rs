//! Per-agent, per-frame waypoint following with wall sliding and stuck recovery.

use std::collections::VecDeque;

#[cfg(feature = "bevy_reflect")]
use bevy_reflect::prelude::*;
use glam::Vec2;

use crate::{Facing, PathPlanner, WalkabilityQuery};

/// Specifies how a [`LocomotionController`] moves and recovers.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(
    all(feature = "serialize", feature = "bevy_reflect"),
    reflect(Serialize, Deserialize)
)]
pub struct LocomotionConfig {
    /// The walking speed. `[Limit: >= 0] [Units: units per second]`
    pub speed: f32,

    /// A waypoint closer than this counts as reached. `[Limit: >= 0] [Units: units]`
    pub arrival_radius: f32,

    /// When blocked closer than this to the current waypoint, the waypoint is skipped. `[Limit: >= 0] [Units: units]`
    pub corner_skip_radius: f32,

    /// How many fallback tiers are tried when the full step is blocked. `[Limit: 0 <= value <= 5]`
    ///
    /// At `n`, the step is retried at `1/2` through `1/2^n` of its length,
    /// and up to `min(n, 4)` tiers of axis-aligned sliding follow.
    /// At 0 the agent stops at the first obstacle.
    pub slide_aggressiveness: u8,

    /// Time without progress before the first replanning attempt. `[Limit: >= 0] [Units: seconds]`
    pub fast_retry_after: f32,

    /// Time without progress before the second replanning attempt. `[Limit: >= fast_retry_after] [Units: seconds]`
    pub slow_retry_after: f32,

    /// Time without progress after which the path is abandoned. `[Limit: >= slow_retry_after] [Units: seconds]`
    pub give_up_after: f32,

    /// The walk cycle cadence, independent of the walking speed. `[Limit: >= 0] [Units: frames per second]`
    pub animation_fps: f32,
}

impl LocomotionConfig {
    /// The highest meaningful [`Self::slide_aggressiveness`].
    pub const MAX_SLIDE_AGGRESSIVENESS: u8 = 5;
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            speed: 90.0,
            arrival_radius: 10.0,
            corner_skip_radius: 15.0,
            slide_aggressiveness: Self::MAX_SLIDE_AGGRESSIVENESS,
            fast_retry_after: 0.12,
            slow_retry_after: 0.28,
            give_up_after: 0.5,
            animation_fps: 10.0,
        }
    }
}

/// Supplies a new route when an agent is stuck.
///
/// Receives the current position and the final target, returns the new waypoints or `None` to decline.
pub trait Replanner {
    /// Computes a new route from `from` to `to`.
    fn replan(&mut self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>>;
}

impl<F> Replanner for F
where
    F: FnMut(Vec2, Vec2) -> Option<Vec<Vec2>>,
{
    fn replan(&mut self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
        self(from, to)
    }
}

impl Replanner for PathPlanner {
    fn replan(&mut self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
        let path = self.compute_path(from, to);
        (!path.is_empty()).then_some(path)
    }
}

/// What happened during one [`LocomotionController::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickOutcome {
    /// There was nothing to do.
    Idle,
    /// The agent moved.
    Moved,
    /// The final waypoint was reached and the agent is now idle.
    Arrived,
    /// The agent could not move this tick.
    Blocked,
    /// The agent was stuck and received a new route.
    Replanned,
    /// The agent was stuck for too long and dropped its route. It is now idle.
    Abandoned,
}

/// Moves one agent along a list of waypoints, one frame at a time.
///
/// Collision is checked against the unpadded walkability of the room,
/// since the body touching a wall is what matters here, not pathfinding clearance.
pub struct LocomotionController {
    config: LocomotionConfig,
    replanner: Box<dyn Replanner>,
    position: Vec2,
    waypoints: VecDeque<Vec2>,
    facing: Facing,
    /// Time since the last successful movement or replan.
    stuck_time: f32,
    fast_retry_used: bool,
    slow_retry_used: bool,
    animation_time: f32,
    animation_frame: u32,
}

impl std::fmt::Debug for LocomotionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocomotionController")
            .field("config", &self.config)
            .field("position", &self.position)
            .field("waypoints", &self.waypoints)
            .field("facing", &self.facing)
            .field("stuck_time", &self.stuck_time)
            .field("animation_frame", &self.animation_frame)
            .finish_non_exhaustive()
    }
}

impl LocomotionController {
    /// Creates an idle agent at `position`. `replanner` is asked for a new route whenever the agent gets stuck.
    pub fn new(position: Vec2, config: LocomotionConfig, replanner: impl Replanner + 'static) -> Self {
        Self {
            config,
            replanner: Box::new(replanner),
            position,
            waypoints: VecDeque::new(),
            facing: Facing::default(),
            stuck_time: 0.0,
            fast_retry_used: false,
            slow_retry_used: false,
            animation_time: 0.0,
            animation_frame: 0,
        }
    }

    /// The exact position of the agent.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Moves the agent to `position` without walking there. Keeps the current route.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// The direction the sprite should face.
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// The walk cycle frame. Zero while idle.
    pub fn animation_frame(&self) -> u32 {
        self.animation_frame
    }

    /// The remaining waypoints, current one first.
    pub fn waypoints(&self) -> impl ExactSizeIterator<Item = Vec2> + '_ {
        self.waypoints.iter().copied()
    }

    /// The last waypoint of the route, if any.
    pub fn final_target(&self) -> Option<Vec2> {
        self.waypoints.back().copied()
    }

    /// Returns whether the agent has no route.
    pub fn is_idle(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// The configuration of the agent.
    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Replaces the route. An empty route stops the agent.
    pub fn set_path(&mut self, path: impl IntoIterator<Item = Vec2>) {
        self.waypoints = path.into_iter().collect();
        self.reset_stuck();
        if self.waypoints.is_empty() {
            self.go_idle();
        }
    }

    /// Plans a route to `target` and starts following it.
    ///
    /// Returns `false` and leaves the current route untouched if no route exists.
    pub fn walk_to(&mut self, target: Vec2, planner: &PathPlanner) -> bool {
        let path = planner.compute_path(self.position, target);
        if path.is_empty() {
            tracing::debug!("No route from {} to {target}, staying put", self.position);
            return false;
        }
        self.set_path(path);
        true
    }

    /// Drops the route and stands still.
    pub fn stop(&mut self) {
        self.waypoints.clear();
        self.go_idle();
    }

    /// Advances the agent by `dt` seconds.
    pub fn tick(&mut self, dt: f32, walkability: &impl WalkabilityQuery) -> TickOutcome {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let Some(&current) = self.waypoints.front() else {
            self.go_idle();
            return TickOutcome::Idle;
        };

        // Advance when the waypoint is reached, or was passed without being detected.
        let distance = self.position.distance(current);
        let passed = self
            .waypoints
            .get(1)
            .is_some_and(|next| self.position.distance(*next) < distance);
        if distance < self.config.arrival_radius || passed {
            self.waypoints.pop_front();
            if self.waypoints.is_empty() {
                self.position = current;
                self.go_idle();
                return TickOutcome::Arrived;
            }
        }
        let Some(&target) = self.waypoints.front() else {
            return TickOutcome::Idle;
        };

        let to_target = target - self.position;
        if let Some(facing) = Facing::from_direction(to_target) {
            if facing.steps_to(self.facing) > 1 {
                self.facing = facing;
            }
        }

        let step = (self.config.speed * dt).min(to_target.length());
        if step <= 0.0 {
            // Nothing was attempted, so this is neither progress nor being stuck.
            return TickOutcome::Blocked;
        }
        match self.try_step(to_target.normalize_or_zero(), step, walkability) {
            Some(position) => {
                self.position = position;
                self.reset_stuck();
                self.animation_time += dt;
                self.animation_frame = (self.animation_time * self.config.animation_fps) as u32;
                TickOutcome::Moved
            }
            None => self.handle_blocked(dt, to_target.length()),
        }
    }

    /// Finds the first walkable position among the step, its fractions, the slides and the nudge.
    fn try_step(
        &self,
        direction: Vec2,
        step: f32,
        walkability: &impl WalkabilityQuery,
    ) -> Option<Vec2> {
        if step <= 0.0 || direction == Vec2::ZERO {
            return None;
        }
        let tiers = self
            .config
            .slide_aggressiveness
            .min(LocomotionConfig::MAX_SLIDE_AGGRESSIVENESS);
        let walkable = |candidate: &Vec2| walkability.is_walkable_point(*candidate);

        let fractions = (0..=tiers).map(|tier| self.position + direction * step / (1 << tier) as f32);
        if let Some(position) = fractions.into_iter().find(walkable) {
            return Some(position);
        }

        let sign = |value: f32| if value.abs() > f32::EPSILON { value.signum() } else { 0.0 };
        let axis = Vec2::new(sign(direction.x), sign(direction.y));
        for (tier, scale) in [1.0, 0.5, 0.25, 0.125].into_iter().take(tiers.min(4) as usize).enumerate() {
            let distance = step * scale;
            let along_x = Vec2::new(axis.x, 0.0);
            let along_y = Vec2::new(0.0, axis.y);
            let diagonal = (tier > 0).then(|| axis.normalize_or_zero());
            let slides = [Some(along_x), Some(along_y), diagonal]
                .into_iter()
                .flatten()
                .filter(|offset| *offset != Vec2::ZERO)
                .map(|offset| self.position + offset * distance);
            for candidate in slides {
                if walkable(&candidate) {
                    return Some(candidate);
                }
            }
        }

        if tiers == 0 {
            return None;
        }
        let next = *self.waypoints.get(1)?;
        let to_next = next - self.position;
        let length = to_next.length();
        if length <= f32::EPSILON {
            return None;
        }
        let nudge = self.position + to_next / length * (step * 0.5).min(length * 0.5);
        walkable(&nudge).then_some(nudge)
    }

    fn handle_blocked(&mut self, dt: f32, distance: f32) -> TickOutcome {
        if distance < self.config.corner_skip_radius {
            self.waypoints.pop_front();
            if self.waypoints.is_empty() {
                tracing::trace!("Blocked right before the final waypoint, stopping at {}", self.position);
                self.go_idle();
                return TickOutcome::Arrived;
            }
            return TickOutcome::Blocked;
        }

        self.stuck_time += dt;
        if !self.fast_retry_used && self.stuck_time >= self.config.fast_retry_after {
            self.fast_retry_used = true;
            if self.replan() {
                return TickOutcome::Replanned;
            }
        }
        if !self.slow_retry_used && self.stuck_time >= self.config.slow_retry_after {
            self.slow_retry_used = true;
            if self.replan() {
                return TickOutcome::Replanned;
            }
        }
        if self.stuck_time > self.config.give_up_after {
            tracing::debug!(
                "Stuck at {} for {:.2}s, abandoning the route",
                self.position,
                self.stuck_time
            );
            self.stop();
            return TickOutcome::Abandoned;
        }
        TickOutcome::Blocked
    }

    /// Asks the replanner for a route to the final target. Only the stuck timer is reset on success,
    /// so a replanner that keeps returning useless routes still ends in abandonment.
    fn replan(&mut self) -> bool {
        let Some(goal) = self.final_target() else {
            return false;
        };
        match self.replanner.replan(self.position, goal) {
            Some(path) if !path.is_empty() => {
                tracing::debug!(
                    "Replanned from {} to {goal} after {:.2}s: {} waypoints",
                    self.position,
                    self.stuck_time,
                    path.len()
                );
                self.waypoints = path.into();
                self.stuck_time = 0.0;
                true
            }
            _ => {
                tracing::trace!("Replanning from {} to {goal} declined", self.position);
                false
            }
        }
    }

    fn reset_stuck(&mut self) {
        self.stuck_time = 0.0;
        self.fast_retry_used = false;
        self.slow_retry_used = false;
    }

    fn go_idle(&mut self) {
        self.reset_stuck();
        self.animation_time = 0.0;
        self.animation_frame = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use approx::assert_relative_eq;

    use super::*;

    fn open(_: Vec2) -> bool {
        true
    }

    fn declines(_: Vec2, _: Vec2) -> Option<Vec<Vec2>> {
        None
    }

    fn controller(position: Vec2, config: LocomotionConfig) -> LocomotionController {
        LocomotionController::new(position, config, declines)
    }

    /// Only the square from the origin to (10, 10) is walkable.
    fn pocket(point: Vec2) -> bool {
        (0.0..=10.0).contains(&point.x) && (0.0..=10.0).contains(&point.y)
    }

    #[test]
    fn idle_agents_stay_put() {
        let mut agent = controller(Vec2::new(3.0, 4.0), LocomotionConfig::default());
        assert!(agent.is_idle());
        assert_eq!(agent.tick(0.1, &open), TickOutcome::Idle);
        assert_eq!(agent.position(), Vec2::new(3.0, 4.0));
        assert_eq!(agent.animation_frame(), 0);
    }

    #[test]
    fn walks_to_the_exact_target() {
        let config = LocomotionConfig {
            speed: 60.0,
            ..Default::default()
        };
        let mut agent = controller(Vec2::ZERO, config);
        let target = Vec2::new(100.3, 0.7);
        agent.set_path([target]);

        let mut outcome = TickOutcome::Moved;
        for _ in 0..100 {
            outcome = agent.tick(0.1, &open);
            if outcome != TickOutcome::Moved {
                break;
            }
        }
        assert_eq!(outcome, TickOutcome::Arrived);
        assert_eq!(agent.position(), target);
        assert!(agent.is_idle());
        assert_eq!(agent.animation_frame(), 0);
    }

    #[test]
    fn steps_never_overshoot_the_waypoint() {
        let config = LocomotionConfig {
            speed: 1000.0,
            arrival_radius: 1.0,
            ..Default::default()
        };
        let mut agent = controller(Vec2::ZERO, config);
        agent.set_path([Vec2::new(20.0, 0.0)]);
        assert_eq!(agent.tick(1.0, &open), TickOutcome::Moved);
        assert_relative_eq!(agent.position().x, 20.0);
        assert_eq!(agent.tick(1.0, &open), TickOutcome::Arrived);
    }

    #[test]
    fn passed_waypoints_are_skipped() {
        let mut agent = controller(Vec2::new(58.0, 25.0), LocomotionConfig::default());
        agent.set_path([Vec2::new(50.0, 0.0), Vec2::new(50.0, 40.0)]);
        assert_eq!(agent.tick(0.01, &open), TickOutcome::Moved);
        assert_eq!(agent.waypoints().collect::<Vec<_>>(), vec![Vec2::new(50.0, 40.0)]);
        assert!(agent.position().y > 25.0);
    }

    #[test]
    fn facing_has_hysteresis() {
        let mut agent = controller(Vec2::ZERO, LocomotionConfig::default());
        agent.set_path([Vec2::new(500.0, 0.0)]);
        agent.tick(0.01, &open);
        assert_eq!(agent.facing(), Facing::East);

        // One bucket off is not enough to turn.
        agent.set_path([agent.position() + Vec2::new(300.0, 300.0)]);
        agent.tick(0.01, &open);
        assert_eq!(agent.facing(), Facing::East);

        agent.set_path([agent.position() + Vec2::new(0.0, 300.0)]);
        agent.tick(0.01, &open);
        assert_eq!(agent.facing(), Facing::South);
    }

    #[test]
    fn slides_along_walls() {
        // A wall above y = 0.
        let below_wall = |point: Vec2| point.y >= 0.0;
        let config = LocomotionConfig {
            speed: 60.0,
            ..Default::default()
        };
        let mut agent = controller(Vec2::ZERO, config);
        agent.set_path([Vec2::new(50.0, -20.0)]);
        assert_eq!(agent.tick(0.1, &below_wall), TickOutcome::Moved);
        assert_relative_eq!(agent.position().x, 6.0);
        assert_relative_eq!(agent.position().y, 0.0);
    }

    #[test]
    fn rigid_agents_do_not_slide() {
        let below_wall = |point: Vec2| point.y >= 0.0;
        let config = LocomotionConfig {
            slide_aggressiveness: 0,
            ..Default::default()
        };
        let mut agent = controller(Vec2::ZERO, config);
        agent.set_path([Vec2::new(50.0, -20.0)]);
        assert_eq!(agent.tick(0.1, &below_wall), TickOutcome::Blocked);
        assert_eq!(agent.position(), Vec2::ZERO);
    }

    #[test]
    fn stuck_agents_give_up() {
        let mut agent = controller(Vec2::new(10.0, 10.0), LocomotionConfig::default());
        agent.set_path([Vec2::new(40.0, 40.0)]);

        let mut outcomes = Vec::new();
        for _ in 0..60 {
            outcomes.push(agent.tick(1.0 / 60.0, &pocket));
        }
        assert!(outcomes.contains(&TickOutcome::Abandoned));
        assert!(!outcomes.contains(&TickOutcome::Moved));
        assert!(agent.is_idle());
        assert_eq!(agent.position(), Vec2::new(10.0, 10.0));
        assert_eq!(agent.tick(1.0 / 60.0, &pocket), TickOutcome::Idle);
    }

    #[test]
    fn stuck_agents_replan_twice() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let replanner = move |_: Vec2, to: Vec2| {
            counter.set(counter.get() + 1);
            Some(vec![to])
        };
        let mut agent = LocomotionController::new(Vec2::new(10.0, 10.0), LocomotionConfig::default(), replanner);
        agent.set_path([Vec2::new(40.0, 40.0)]);

        let mut outcomes = Vec::new();
        for _ in 0..120 {
            outcomes.push(agent.tick(1.0 / 60.0, &pocket));
            if agent.is_idle() {
                break;
            }
        }
        assert_eq!(calls.get(), 2);
        assert_eq!(
            outcomes.iter().filter(|outcome| **outcome == TickOutcome::Replanned).count(),
            2
        );
        assert_eq!(outcomes.last(), Some(&TickOutcome::Abandoned));
    }

    #[test]
    fn blocked_agents_skip_close_corners() {
        let config = LocomotionConfig {
            speed: 15.0,
            ..Default::default()
        };
        let mut agent = controller(Vec2::new(10.0, 10.0), config);
        agent.set_path([Vec2::new(20.0, 20.0), Vec2::new(0.0, 30.0)]);
        assert_eq!(agent.tick(0.1, &pocket), TickOutcome::Blocked);
        assert_eq!(agent.waypoints().collect::<Vec<_>>(), vec![Vec2::new(0.0, 30.0)]);
    }

    #[test]
    fn animation_runs_only_while_moving() {
        let config = LocomotionConfig {
            speed: 10.0,
            arrival_radius: 1.0,
            ..Default::default()
        };
        let mut agent = controller(Vec2::ZERO, config);
        agent.set_path([Vec2::new(100.0, 0.0)]);
        agent.tick(0.25, &open);
        assert_eq!(agent.animation_frame(), 2);
        agent.tick(0.25, &open);
        assert_eq!(agent.animation_frame(), 5);
        agent.stop();
        assert_eq!(agent.animation_frame(), 0);
        assert!(agent.is_idle());
    }

    #[test]
    fn paused_frames_do_not_skip_waypoints() {
        let mut agent = controller(Vec2::ZERO, LocomotionConfig::default());
        agent.set_path([Vec2::new(12.0, 0.0)]);
        assert_eq!(agent.tick(0.0, &open), TickOutcome::Blocked);
        assert_eq!(agent.position(), Vec2::ZERO);
        assert_eq!(agent.final_target(), Some(Vec2::new(12.0, 0.0)));

        // Paused frames never accumulate toward giving up either.
        let standing = LocomotionConfig {
            speed: 0.0,
            ..Default::default()
        };
        let mut stopped = controller(Vec2::new(10.0, 10.0), standing);
        stopped.set_path([Vec2::new(40.0, 40.0)]);
        for _ in 0..100 {
            assert_eq!(stopped.tick(0.1, &pocket), TickOutcome::Blocked);
        }
        assert!(!stopped.is_idle());

        assert_eq!(agent.tick(0.1, &open), TickOutcome::Moved);
        assert_relative_eq!(agent.position().x, 9.0, epsilon = 1e-4);
    }

    #[test]
    fn blocked_steps_fall_back_to_shorter_fractions() {
        // A wall from x = 5 on.
        let before_wall = |point: Vec2| point.x < 5.0;
        let config = LocomotionConfig {
            speed: 60.0,
            ..Default::default()
        };
        let mut agent = controller(Vec2::ZERO, config);
        agent.set_path([Vec2::new(100.0, 0.0)]);

        // The full step of 6 is blocked, half of it is not.
        assert_eq!(agent.tick(0.1, &before_wall), TickOutcome::Moved);
        assert_relative_eq!(agent.position().x, 3.0, epsilon = 1e-4);

        // Right before the wall only a 1/32 step still fits.
        agent.set_position(Vec2::new(4.8, 0.0));
        assert_eq!(agent.tick(0.1, &before_wall), TickOutcome::Moved);
        assert_relative_eq!(agent.position().x, 4.8 + 6.0 / 32.0, epsilon = 1e-4);
        assert_relative_eq!(agent.position().y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn aggressiveness_limits_fraction_tiers() {
        let before_wall = |point: Vec2| point.x < 5.0;
        let cautious = LocomotionConfig {
            speed: 60.0,
            slide_aggressiveness: 1,
            ..Default::default()
        };
        let mut agent = controller(Vec2::ZERO, cautious);
        agent.set_path([Vec2::new(100.0, 0.0)]);
        assert_eq!(agent.tick(0.1, &before_wall), TickOutcome::Moved);
        assert_relative_eq!(agent.position().x, 3.0, epsilon = 1e-4);

        // A quarter step would fit, but only full and half steps are tried.
        agent.set_position(Vec2::new(2.2, 0.0));
        assert_eq!(agent.tick(0.1, &before_wall), TickOutcome::Blocked);
        assert_eq!(agent.position(), Vec2::new(2.2, 0.0));

        let mut eager = controller(
            Vec2::new(2.2, 0.0),
            LocomotionConfig {
                speed: 60.0,
                ..Default::default()
            },
        );
        eager.set_path([Vec2::new(100.0, 0.0)]);
        assert_eq!(eager.tick(0.1, &before_wall), TickOutcome::Moved);
        assert_relative_eq!(eager.position().x, 3.7, epsilon = 1e-4);
    }

    #[test]
    fn diagonal_slides_start_at_half_steps() {
        // Only the diagonal line x = y is walkable.
        let on_diagonal = |point: Vec2| (point.x - point.y).abs() <= 0.01;
        let config = LocomotionConfig {
            speed: 60.0,
            ..Default::default()
        };
        let mut agent = controller(Vec2::ZERO, config);
        agent.set_path([Vec2::new(100.0, 50.0)]);
        assert_eq!(agent.tick(0.1, &on_diagonal), TickOutcome::Moved);
        let expected = 3.0 * std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(agent.position().x, expected, epsilon = 1e-5);
        assert_relative_eq!(agent.position().y, expected, epsilon = 1e-5);
    }

    #[test]
    fn nudges_toward_the_next_waypoint() {
        // Only the quadrant with x <= 0 and y <= 0 is walkable.
        let quadrant = |point: Vec2| point.x <= 0.0 && point.y <= 0.0;
        let config = LocomotionConfig {
            speed: 60.0,
            ..Default::default()
        };
        let mut agent = controller(Vec2::ZERO, config);
        agent.set_path([Vec2::new(30.0, 30.0), Vec2::new(-60.0, 0.0)]);
        assert_eq!(agent.tick(0.1, &quadrant), TickOutcome::Moved);
        // Half of the step of 6, straight toward the next waypoint.
        assert_relative_eq!(agent.position().x, -3.0, epsilon = 1e-4);
        assert_relative_eq!(agent.position().y, 0.0, epsilon = 1e-4);
        assert_eq!(agent.waypoints().count(), 2);
    }
}
