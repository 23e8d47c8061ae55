//! Stateful frame predicates.
//!
//! Monitors remember the last value they saw. Staying in the current state
//! is a `Target` verdict and entering a new state is `NotTarget`, so each
//! closed segment covers the span over which the previous state held. The
//! value for that span is read back from the monitor's `previous` fields.

use inkframe_battle_model::{
    BalanceState, Frame, FrameIndex, IndicatorFrame, LampFrame, LampState, Rule, Side,
};
use inkframe_common::CountEpsilon;

use crate::segment::{FramePredicate, Verdict};

/// Hysteresis epsilon for a rule.
pub fn epsilon_for(rule: Rule, eps: &CountEpsilon) -> u32 {
    match rule {
        Rule::Area => eps.area,
        Rule::Hoko => eps.hoko,
        Rule::Yagura => eps.yagura,
        Rule::Asari => eps.asari,
        Rule::Nawabari => eps.nawabari,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountDirection {
    /// Count starts high and only goes down (countdown rules).
    Decreasing,
    /// Count starts at zero and only goes up (turf war).
    Increasing,
}

/// Tracks one side's count on the rule indicator.
///
/// A reading moving against the expected direction, or by less than
/// `eps`, is treated as noise and keeps the current value.
#[derive(Debug, Clone)]
pub struct CountMonitor {
    rule: Rule,
    side: Side,
    direction: CountDirection,
    eps: u32,
    initial: u32,
    current: u32,
    previous: u32,
}

impl CountMonitor {
    pub fn new(rule: Rule, side: Side, direction: CountDirection, initial: u32, eps: u32) -> Self {
        Self {
            rule,
            side,
            direction,
            eps,
            initial,
            current: initial,
            previous: initial,
        }
    }

    /// Monitor for `side` under `rule`, with the rule's initial count and epsilon.
    pub fn for_rule(rule: Rule, side: Side, eps: &CountEpsilon) -> Self {
        let direction = if rule.is_countdown() {
            CountDirection::Decreasing
        } else {
            CountDirection::Increasing
        };
        Self::new(rule, side, direction, rule.initial_count(), epsilon_for(rule, eps))
    }

    /// Feed one reading.
    pub fn observe(&mut self, count: u32) -> Verdict {
        let cur = self.current;
        let stay = match self.direction {
            CountDirection::Decreasing => cur <= count || cur - count < self.eps,
            CountDirection::Increasing => cur >= count || count - cur < self.eps,
        };
        if stay {
            Verdict::Target
        } else {
            self.previous = cur;
            self.current = count;
            Verdict::NotTarget
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Value held during the most recently closed segment.
    pub fn previous(&self) -> u32 {
        self.previous
    }

    /// Progress made by this side up to the most recently closed segment.
    pub fn earned_value(&self) -> u32 {
        match self.direction {
            CountDirection::Decreasing => self.initial.saturating_sub(self.previous),
            CountDirection::Increasing => self.previous,
        }
    }
}

impl FramePredicate<IndicatorFrame> for CountMonitor {
    fn test(&mut self, frame: &Frame<IndicatorFrame>, _in_segment: bool) -> Verdict {
        let reading = frame
            .payload
            .indicator
            .filter(|ind| ind.rule() == self.rule)
            .and_then(|ind| ind.count(self.side));
        match reading {
            Some(count) => self.observe(count),
            None => Verdict::Pending,
        }
    }
}

/// Live player counts and the balance they imply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub team: usize,
    pub enemy: usize,
    pub state: BalanceState,
}

impl BalanceSnapshot {
    pub fn new(team: usize, enemy: usize) -> Self {
        Self {
            team,
            enemy,
            state: BalanceState::from_numbers(team, enemy),
        }
    }
}

/// Tracks how many players are on the field per side.
#[derive(Debug, Clone)]
pub struct BalanceMonitor {
    current: BalanceSnapshot,
    previous: BalanceSnapshot,
}

impl BalanceMonitor {
    pub fn new(team: usize, enemy: usize) -> Self {
        let snapshot = BalanceSnapshot::new(team, enemy);
        Self {
            current: snapshot,
            previous: snapshot,
        }
    }

    pub fn observe(&mut self, team: usize, enemy: usize) -> Verdict {
        let next = BalanceSnapshot::new(team, enemy);
        if next == self.current {
            Verdict::Target
        } else {
            self.previous = self.current;
            self.current = next;
            Verdict::NotTarget
        }
    }

    pub fn current(&self) -> BalanceSnapshot {
        self.current
    }

    /// Snapshot held during the most recently closed segment.
    pub fn previous(&self) -> BalanceSnapshot {
        self.previous
    }
}

impl FramePredicate<LampFrame> for BalanceMonitor {
    fn test(&mut self, frame: &Frame<LampFrame>, _in_segment: bool) -> Verdict {
        match (
            frame.payload.alive_count(Side::Team),
            frame.payload.alive_count(Side::Enemy),
        ) {
            (Some(team), Some(enemy)) => self.observe(team, enemy),
            _ => Verdict::Pending,
        }
    }
}

/// Detects death spans of one player's lamp.
///
/// A missing lamp row continues whatever was happening: a death in progress
/// stays open, otherwise nothing starts. Once a player has disconnected,
/// frames from `false_range` frames before the disconnect onward never
/// count as death.
#[derive(Debug, Clone)]
pub struct DeathMonitor {
    side: Side,
    lamp_ord: usize,
    drop_start: Option<FrameIndex>,
    false_range: u64,
}

impl DeathMonitor {
    pub fn new(side: Side, lamp_ord: usize) -> Self {
        Self {
            side,
            lamp_ord,
            drop_start: None,
            false_range: 30,
        }
    }

    /// Mark the frame at which the player disconnected.
    pub fn with_drop(mut self, drop_start: Option<FrameIndex>, false_range: u64) -> Self {
        self.drop_start = drop_start;
        self.false_range = false_range;
        self
    }
}

impl FramePredicate<LampFrame> for DeathMonitor {
    fn test(&mut self, frame: &Frame<LampFrame>, in_segment: bool) -> Verdict {
        let Some(lamp) = frame.payload.lamp(self.side, self.lamp_ord) else {
            return if in_segment {
                Verdict::Target
            } else {
                Verdict::NotTarget
            };
        };

        if let Some(drop_start) = self.drop_start {
            if drop_start.saturating_sub(self.false_range) <= frame.index {
                return Verdict::NotTarget;
            }
        }

        if lamp.state == LampState::Death {
            Verdict::Target
        } else {
            Verdict::NotTarget
        }
    }
}

/// `Target` while one player's lamp is in a given state.
#[derive(Debug, Clone)]
pub struct LampStatePredicate {
    side: Side,
    lamp_ord: usize,
    state: LampState,
    require_both_rows: bool,
}

impl LampStatePredicate {
    pub fn new(side: Side, lamp_ord: usize, state: LampState) -> Self {
        Self {
            side,
            lamp_ord,
            state,
            require_both_rows: false,
        }
    }

    /// Only evaluate frames on which both lamp rows were detected.
    pub fn requiring_both_rows(mut self) -> Self {
        self.require_both_rows = true;
        self
    }
}

impl FramePredicate<LampFrame> for LampStatePredicate {
    fn test(&mut self, frame: &Frame<LampFrame>, _in_segment: bool) -> Verdict {
        let lamps = &frame.payload;
        if self.require_both_rows && (lamps.team.is_none() || lamps.enemy.is_none()) {
            return Verdict::Pending;
        }
        match lamps.lamp(self.side, self.lamp_ord) {
            Some(lamp) if lamp.state == self.state => Verdict::Target,
            Some(_) => Verdict::NotTarget,
            None => Verdict::Pending,
        }
    }
}
