//! Active-riding accumulator. Time counts only while both the wheel and the
//! pedals report moving; every full period is a milestone and every
//! `notification_threshold` milestones raise a mark event for the outside
//! world. All arithmetic stays in integer milliseconds so milestone
//! boundaries land exactly.

use crate::config::MilestoneConfig;

/// Raised when another block of `notification_threshold` milestones
/// completes. `mark_index` starts at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkEvent {
    pub mark_index: u32,
    pub active_time_s: u64,
}

pub struct MilestoneTracker {
    period_ms: u64,
    notification_threshold: u32,
    active_ms: u64,
    milestone_count: u64,
    mark_count: u32,
    last_tick_ms: Option<u64>,
}

impl MilestoneTracker {
    pub fn new(config: &MilestoneConfig) -> Self {
        Self {
            period_ms: config.period_ms.max(1),
            notification_threshold: config.notification_threshold.max(1),
            active_ms: 0,
            milestone_count: 0,
            mark_count: 0,
            last_tick_ms: None,
        }
    }

    /// One control tick. Accumulates the elapsed time while both sources
    /// move and returns a mark event when one falls due. At most one mark
    /// is emitted per tick; a backlog drains on the following ticks.
    pub fn tick(
        &mut self,
        now_ms: u64,
        wheel_moving: bool,
        pedal_moving: bool,
    ) -> Option<MarkEvent> {
        let elapsed_ms = match self.last_tick_ms {
            Some(previous) => now_ms.saturating_sub(previous),
            None => 0,
        };
        self.last_tick_ms = Some(now_ms);

        // Idle gaps are never retroactively counted; the baseline always
        // advances, the accumulator only under combined motion.
        if wheel_moving && pedal_moving {
            self.active_ms += elapsed_ms;
        }

        let count = self.active_ms / self.period_ms;
        if count > self.milestone_count {
            self.milestone_count = count;
            log::info!(
                "milestone {count} reached, {} s active",
                self.active_ms / 1000
            );
        }

        let due = self.notification_threshold as u64 * (self.mark_count as u64 + 1);
        if count >= due {
            self.mark_count += 1;
            return Some(MarkEvent {
                mark_index: self.mark_count,
                active_time_s: self.active_ms / 1000,
            });
        }
        None
    }

    pub fn active_time_ms(&self) -> u64 {
        self.active_ms
    }

    pub fn milestone_count(&self) -> u64 {
        self.milestone_count
    }

    pub fn mark_count(&self) -> u32 {
        self.mark_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MilestoneConfig {
        MilestoneConfig {
            period_ms: 60_000,
            notification_threshold: 3,
        }
    }

    #[test]
    fn three_active_minutes_raise_one_mark() {
        let mut tracker = MilestoneTracker::new(&config());
        let mut marks = heapless::Vec::<MarkEvent, 4>::new();

        // 180 s of continuous riding on a 100 ms tick.
        for tick in 0..=1_800u64 {
            if let Some(mark) = tracker.tick(tick * 100, true, true) {
                let _ = marks.push(mark);
            }
        }

        assert_eq!(tracker.milestone_count(), 3);
        assert_eq!(marks.len(), 1);
        assert_eq!(
            marks[0],
            MarkEvent {
                mark_index: 1,
                active_time_s: 180,
            }
        );
    }

    #[test]
    fn idle_time_does_not_accumulate() {
        let mut tracker = MilestoneTracker::new(&config());
        for tick in 0..=1_000u64 {
            assert_eq!(tracker.tick(tick * 100, false, false), None);
        }
        assert_eq!(tracker.active_time_ms(), 0);
        assert_eq!(tracker.milestone_count(), 0);
    }

    #[test]
    fn one_moving_source_is_not_enough() {
        let mut tracker = MilestoneTracker::new(&config());
        // Pedal-only motion (back-pedaling on a stand), then wheel-only
        // motion (coasting): neither counts as riding.
        for tick in 0..=600u64 {
            tracker.tick(tick * 100, false, true);
        }
        for tick in 601..=1_200u64 {
            tracker.tick(tick * 100, true, false);
        }
        assert_eq!(tracker.active_time_ms(), 0);
        assert_eq!(tracker.milestone_count(), 0);
    }

    #[test]
    fn accumulation_resumes_across_pauses() {
        let mut tracker = MilestoneTracker::new(&config());
        let mut now = 0u64;

        // 30 s riding, 30 s rest, 30 s riding: exactly one milestone.
        for _ in 0..300 {
            now += 100;
            tracker.tick(now, true, true);
        }
        for _ in 0..300 {
            now += 100;
            tracker.tick(now, false, false);
        }
        assert_eq!(tracker.milestone_count(), 0);
        for _ in 0..300 {
            now += 100;
            tracker.tick(now, true, true);
        }
        assert_eq!(tracker.milestone_count(), 1);
        assert_eq!(tracker.active_time_ms(), 60_000);
    }

    #[test]
    fn marks_repeat_every_threshold_milestones() {
        let mut tracker = MilestoneTracker::new(&config());
        let mut marks = heapless::Vec::<MarkEvent, 4>::new();

        // 360 s of riding: milestones 1..=6, marks after 3 and 6.
        for tick in 0..=3_600u64 {
            if let Some(mark) = tracker.tick(tick * 100, true, true) {
                let _ = marks.push(mark);
            }
        }
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].mark_index, 1);
        assert_eq!(marks[1].mark_index, 2);
        assert_eq!(marks[1].active_time_s, 360);
    }

    #[test]
    fn first_tick_establishes_the_baseline() {
        let mut tracker = MilestoneTracker::new(&config());
        // A large first timestamp must not count as accumulated time.
        tracker.tick(1_000_000, true, true);
        assert_eq!(tracker.active_time_ms(), 0);
    }
}
