//! UI state for the interactive view

use std::collections::VecDeque;

use crate::core::types::Tick;
use crate::entity::Agent;
use crate::simulation::{SimulationEvent, WorldEvent};

/// Maximum event log entries to keep
const MAX_LOG_ENTRIES: usize = 50;

#[derive(Debug, Default)]
pub struct ViewState {
    /// Index into the simulation's agent list
    pub selected: usize,
    pub paused: bool,
    pub event_log: VecDeque<LogEntry>,
    pub quit: bool,
}

/// An entry in the event log
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub tick: Tick,
    pub message: String,
    pub category: LogCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Action,
    Meeting,
    Weather,
    System,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            event_log: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            ..Self::default()
        }
    }

    pub fn log(&mut self, tick: Tick, message: String, category: LogCategory) {
        if self.event_log.len() >= MAX_LOG_ENTRIES {
            self.event_log.pop_front();
        }
        self.event_log.push_back(LogEntry {
            tick,
            message,
            category,
        });
    }

    /// Log the events worth showing; routine decisions only for the selected agent
    pub fn record(&mut self, event: &SimulationEvent, selected: Option<&Agent>) {
        match event {
            SimulationEvent::Decision(record) => {
                if !selected.is_some_and(|a| a.id == record.agent) {
                    return;
                }
                let message = format!("{} -> {}", record.action, record.outcome.event);
                // Collapse runs of the same action
                let repeated = self
                    .event_log
                    .back()
                    .is_some_and(|last| last.category == LogCategory::Action && last.message == message);
                if !repeated {
                    self.log(record.tick, message, LogCategory::Action);
                }
            }
            SimulationEvent::World(WorldEvent::AgentsMet { .. }) => {
                self.log(event.tick(), event.summary(), LogCategory::Meeting)
            }
            SimulationEvent::World(WorldEvent::WeatherChanged { .. }) => {
                self.log(event.tick(), event.summary(), LogCategory::Weather)
            }
        }
    }

    /// Cycle to the next agent
    pub fn select_next(&mut self, agent_count: usize) {
        if agent_count == 0 {
            self.selected = 0;
        } else {
            self.selected = (self.selected + 1) % agent_count;
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded() {
        let mut state = ViewState::new();
        for i in 0..(MAX_LOG_ENTRIES as u64 + 10) {
            state.log(i, format!("entry {i}"), LogCategory::System);
        }
        assert_eq!(state.event_log.len(), MAX_LOG_ENTRIES);
        assert_eq!(state.event_log.front().map(|e| e.tick), Some(10));
    }

    #[test]
    fn test_select_next_wraps() {
        let mut state = ViewState::new();
        state.select_next(3);
        state.select_next(3);
        state.select_next(3);
        assert_eq!(state.selected, 0);
        state.select_next(0);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_toggle_pause() {
        let mut state = ViewState::new();
        state.toggle_pause();
        assert!(state.paused);
        state.toggle_pause();
        assert!(!state.paused);
    }
}
