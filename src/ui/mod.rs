//! UI module - interactive terminal view of a running simulation

pub mod deferred_log;
pub mod render;
pub mod state;

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::simulation::{Simulation, SimulationEvent};

pub use deferred_log::DeferredStderr;
pub use state::{LogCategory, LogEntry, ViewState};

/// Target redraw interval
const FRAME_TIME: Duration = Duration::from_millis(33);

/// Run the interactive view until the user quits
///
/// `on_event` sees every simulation event (e.g. for the JSON-lines log).
pub fn run(sim: &mut Simulation, on_event: impl FnMut(&SimulationEvent)) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, sim, on_event);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    sim: &mut Simulation,
    mut on_event: impl FnMut(&SimulationEvent),
) -> io::Result<()> {
    let mut state = ViewState::new();
    state.log(0, "simulation started".to_string(), LogCategory::System);
    let mut last_frame = Instant::now();

    loop {
        // 1. Update with real elapsed time
        let elapsed = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();
        if !state.paused {
            let report = sim.step(elapsed);
            let selected = sim.agents().get(state.selected);
            for event in &report.events {
                on_event(event);
                state.record(event, selected);
            }
        }

        // 2. Render
        terminal.draw(|f| render::draw(f, sim, &state))?;

        // 3. Input
        let timeout = FRAME_TIME
            .checked_sub(last_frame.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => state.quit = true,
                        KeyCode::Tab => state.select_next(sim.agents().len()),
                        KeyCode::Char(' ') => {
                            state.toggle_pause();
                            let message = if state.paused { "paused" } else { "resumed" };
                            state.log(sim.current_tick(), message.to_string(), LogCategory::System);
                        }
                        _ => {}
                    }
                }
            }
        }

        if state.quit {
            return Ok(());
        }
    }
}
