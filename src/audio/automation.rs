//! Parameter automation timeline for the software graph.
//!
//! Events are kept sorted by their timeline time. Ramps begin where the
//! previous event left off (or at the value/time they were scheduled at when
//! nothing precedes them); a set-target curve keeps running until the next
//! event takes over.

use std::collections::VecDeque;

use super::graph::Automation;

#[derive(Clone, Copy, Debug)]
struct TargetCurve {
    target: f32,
    start: f64,
    time_constant: f64,
    from: f32,
}

impl TargetCurve {
    fn value_at(&self, t: f64) -> f32 {
        if t <= self.start || self.time_constant <= 0.0 {
            return if self.time_constant <= 0.0 && t >= self.start {
                self.target
            } else {
                self.from
            };
        }
        let decay = (-(t - self.start) / self.time_constant).exp() as f32;
        self.target + (self.from - self.target) * decay
    }
}

/// Automation state of a single parameter
#[derive(Clone, Debug)]
pub struct ParamTimeline {
    /// Automation value at `last_time`
    value: f32,
    last_time: f64,
    events: VecDeque<Automation>,
    /// Where the next ramp starts from (value, time)
    anchor: (f32, f64),
    curve: Option<TargetCurve>,
}

impl ParamTimeline {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            last_time: 0.0,
            events: VecDeque::new(),
            anchor: (value, 0.0),
            curve: None,
        }
    }

    /// Automation value as of the last evaluation
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Events not yet reached
    pub fn pending(&self) -> impl Iterator<Item = &Automation> {
        self.events.iter()
    }

    /// Insert an event, replacing one of the same kind at the same time
    pub fn schedule(&mut self, automation: Automation, now: f64) {
        if self.events.is_empty() && self.curve.is_none() {
            self.anchor = (self.value, now.max(self.last_time));
        }

        let time = automation.time();
        if let Some(existing) = self
            .events
            .iter_mut()
            .find(|e| e.time() == time && e.same_kind(&automation))
        {
            *existing = automation;
            return;
        }

        let index = self.events.partition_point(|e| e.time() <= time);
        self.events.insert(index, automation);
    }

    /// Drop every event at or after `from`
    pub fn cancel(&mut self, from: f64) {
        self.events.retain(|e| e.time() < from);
        if self.curve.is_some_and(|c| c.start >= from) {
            self.curve = None;
        }
        if self.events.is_empty() {
            // Whatever comes next ramps from where the value stands now
            if let Some(curve) = self.curve.take() {
                self.value = curve.value_at(self.last_time);
            }
            self.anchor = (self.value, self.last_time);
        }
    }

    /// Advance to time `t` (non-decreasing) and return the automation value
    pub fn advance(&mut self, t: f64) -> f32 {
        while let Some(event) = self.events.front().copied() {
            match event {
                Automation::SetValue { value, at } => {
                    if t < at {
                        break;
                    }
                    self.curve = None;
                    self.settle(value, at);
                }
                Automation::SetTarget {
                    target,
                    start,
                    time_constant,
                } => {
                    if t < start {
                        break;
                    }
                    let from = match self.curve {
                        Some(curve) => curve.value_at(start),
                        None => self.value,
                    };
                    self.curve = Some(TargetCurve {
                        target,
                        start,
                        time_constant,
                        from,
                    });
                    self.events.pop_front();
                }
                Automation::LinearRamp { value, end }
                | Automation::ExponentialRamp { value, end } => {
                    if let Some(curve) = self.curve.take() {
                        let now = self.last_time.max(curve.start);
                        self.anchor = (curve.value_at(now), now);
                    }

                    if t >= end {
                        self.settle(value, end);
                        continue;
                    }

                    let (from, start) = self.anchor;
                    let progress = if end > start {
                        ((t - start) / (end - start)).clamp(0.0, 1.0)
                    } else {
                        1.0
                    };

                    self.value = if matches!(event, Automation::LinearRamp { .. }) {
                        from + (value - from) * progress as f32
                    } else if (from > 0.0 && value > 0.0) || (from < 0.0 && value < 0.0) {
                        from * (value / from).powf(progress as f32)
                    } else {
                        // Exponential ramps cannot cross or touch zero: hold, then jump
                        from
                    };
                    self.last_time = t;
                    return self.value;
                }
            }
        }

        if let Some(curve) = &self.curve {
            self.value = curve.value_at(t);
        }
        self.last_time = t;
        self.value
    }

    fn settle(&mut self, value: f32, time: f64) {
        self.value = value;
        self.anchor = (value, time);
        self.events.pop_front();
    }
}
