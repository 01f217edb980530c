//! Frame rendering: world map, agent HUD and event log

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::types::Cell;
use crate::decision::BrainKind;
use crate::entity::Agent;
use crate::simulation::Simulation;
use crate::ui::state::{LogCategory, ViewState};
use crate::world::{SpatialQuery, Tile, TileType};

const HUD_WIDTH: u16 = 38;

pub fn tile_glyph(tile: &Tile) -> (char, Color) {
    match tile.kind {
        TileType::Water => ('~', Color::Blue),
        TileType::Sand => ('.', Color::Yellow),
        TileType::Grass => (',', Color::Green),
        TileType::Dirt => ('.', Color::Rgb(140, 100, 60)),
        TileType::Stone => ('^', Color::Gray),
        TileType::Tree => ('T', Color::LightGreen),
        TileType::BerryBush if tile.has_food() => ('*', Color::Red),
        TileType::BerryBush => ('o', Color::DarkGray),
        TileType::Cave => ('C', Color::Magenta),
        TileType::Shelter => ('H', Color::Cyan),
    }
}

fn agent_glyph(agent: &Agent) -> char {
    match agent.brain_kind() {
        BrainKind::RuleBased => 'R',
        BrainKind::Learned => 'L',
    }
}

/// Top-left cell of a viewport of `cols x rows` centered on `focus`, kept inside the world
pub fn viewport_origin(focus: Cell, cols: i32, rows: i32, width: i32, height: i32) -> Cell {
    let x = (focus.x - cols / 2).clamp(0, (width - cols).max(0));
    let y = (focus.y - rows / 2).clamp(0, (height - rows).max(0));
    Cell::new(x, y)
}

pub fn draw(f: &mut Frame, sim: &Simulation, state: &ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(f.size());

    let world = sim.world();
    let status = format!(
        " tick {} | {} | t={:.2} | agents {} {}| q quit, tab next, space pause",
        sim.current_tick(),
        world.weather().as_str(),
        world.time_of_day(),
        sim.agents().len(),
        if state.paused { "| PAUSED " } else { "" },
    );
    f.render_widget(
        Paragraph::new(Span::styled(status, Style::default().add_modifier(Modifier::REVERSED))),
        chunks[0],
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(HUD_WIDTH)])
        .split(chunks[1]);

    draw_map(f, body[0], sim, state);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(16), Constraint::Min(0)])
        .split(body[1]);
    draw_hud(f, side[0], sim.agents().get(state.selected));
    draw_log(f, side[1], state);
}

fn draw_map(f: &mut Frame, area: Rect, sim: &Simulation, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title(" world ");
    let inner = block.inner(area);
    let cols = i32::from(inner.width);
    let rows = i32::from(inner.height);

    let world = sim.world();
    let focus = sim
        .agents()
        .get(state.selected)
        .map(|a| a.position.cell())
        .unwrap_or_else(|| Cell::new(world.width() / 2, world.height() / 2));
    let origin = viewport_origin(focus, cols, rows, world.width(), world.height());

    let mut lines = Vec::with_capacity(rows.max(0) as usize);
    for dy in 0..rows {
        let mut spans = Vec::with_capacity(cols.max(0) as usize);
        for dx in 0..cols {
            let cell = origin.offset(dx, dy);
            if !world.in_bounds(cell) {
                spans.push(Span::raw(" "));
                continue;
            }
            let occupant = sim
                .agents()
                .iter()
                .enumerate()
                .find(|(_, a)| a.position.cell() == cell);
            let span = match occupant {
                Some((i, agent)) => {
                    let mut style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
                    if i == state.selected {
                        style = style.bg(Color::Red);
                    }
                    Span::styled(agent_glyph(agent).to_string(), style)
                }
                None => {
                    let (glyph, color) = tile_glyph(&world.tile(cell));
                    Span::styled(glyph.to_string(), Style::default().fg(color))
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_hud(f: &mut Frame, area: Rect, agent: Option<&Agent>) {
    let block = Block::default().borders(Borders::ALL).title(" agent ");
    let Some(agent) = agent else {
        f.render_widget(Paragraph::new("no agents").block(block), area);
        return;
    };

    let snapshot = agent.introspect();
    let mut lines = vec![
        Line::from(format!("{} ({})", agent.id, snapshot.kind.as_str())),
        Line::from(format!("pos ({:.1}, {:.1}) {}", agent.position.x, agent.position.y, agent.mood.as_str())),
        Line::from(format!("action {}", agent.current_action.kind.as_str())),
        Line::from(format!(
            "hunger {:.2} energy {:.2}",
            agent.needs.hunger, agent.needs.energy
        )),
        Line::from(format!(
            "social {:.2} curiosity {:.2}",
            agent.needs.social, agent.needs.curiosity
        )),
        Line::from(format!("safety {:.2}", agent.needs.safety)),
        Line::from(format!(
            "memories {} relationships {}",
            agent.memory.len(),
            agent.relationships.len()
        )),
    ];

    if let Some(emotion) = snapshot.emotion {
        lines.push(Line::from(format!(
            "V {:+.2} A {:+.2} D {:+.2}",
            emotion.valence, emotion.arousal, emotion.dominance
        )));
    }
    if snapshot.kind == BrainKind::Learned {
        lines.push(Line::from(format!(
            "buffer {} replay {} scorer {}",
            snapshot.buffered_memories,
            snapshot.replay_len,
            if snapshot.scorer_loaded { "yes" } else { "no" }
        )));
    }
    if let Some(reward) = snapshot.mean_reward {
        lines.push(Line::from(format!("mean reward {reward:+.2}")));
    }
    if let Some(probs) = snapshot.action_probs {
        let top = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, p)| (i, *p));
        if let Some((index, p)) = top {
            let name = crate::actions::ActionKind::from_index(index)
                .map(|k| k.as_str())
                .unwrap_or("?");
            lines.push(Line::from(format!("top {name} {p:.2}")));
        }
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_log(f: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title(" events ");
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .event_log
        .iter()
        .rev()
        .take(visible)
        .map(|entry| {
            let color = match entry.category {
                LogCategory::Action => Color::White,
                LogCategory::Meeting => Color::Cyan,
                LogCategory::Weather => Color::Yellow,
                LogCategory::System => Color::DarkGray,
            };
            Line::from(Span::styled(
                format!("{} {}", entry.tick, entry.message),
                Style::default().fg(color),
            ))
        })
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}
