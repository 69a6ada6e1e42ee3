//! Terminal shelf runner (default binary).
//!
//! Crates stand as columns on a shelf; the front record of the dig pile rests in
//! the tray below. Press on the tray to pick the record up, drag it over a
//! column and release to file it. Uses crossterm directly for drawing.

use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, queue};
use tracing_subscriber::EnvFilter;

use crate_digger::core::{Phase, Session, Tuning};
use crate_digger::engine::{Engine, EngineOptions, ShelfResolver};
use crate_digger::input::{
    handle_key_event, map_mouse_event, should_quit, PointerDispatcher, SessionKey, TrayRegion,
};
use crate_digger::types::{Difficulty, EngineEvent, RevealState, Target, Token};

const TICK_MS: u64 = 50;
const SHELF_LEFT: u16 = 2;
const SHELF_TOP: u16 = 2;
const SHELF_ROWS: u16 = 8;
const COLUMN_WIDTH: u16 = 12;
const TRAY_TOP: u16 = SHELF_TOP + SHELF_ROWS + 2;
const TRAY_WIDTH: u16 = 16;
const TRAY_HEIGHT: u16 = 3;

struct TerminalGuard {
    out: Stdout,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        crossterm::execute!(out, EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;
        Ok(Self { out })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(self.out, cursor::Show, DisableMouseCapture, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn main() -> Result<()> {
    // Logs would scribble over the shelf, so only when asked for.
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    }

    let tuning = Tuning::from_env();
    let mut term = TerminalGuard::enter()?;
    run(&mut term.out, tuning)
}

fn shelf_for(session: &Session) -> ShelfResolver {
    let mut columns: Vec<Target> = session
        .containers()
        .iter()
        .map(|c| Target::Container(c.id))
        .collect();
    if session.level().tokens.iter().any(|t| t.is_discard) {
        columns.push(Target::Discard);
    }
    ShelfResolver::new(
        SHELF_LEFT as f32,
        SHELF_TOP as f32,
        (SHELF_TOP + SHELF_ROWS) as f32,
        COLUMN_WIDTH as f32,
        columns,
    )
}

fn start(engine: &mut Engine, progression: u32, now_ms: u64) {
    engine.start_session(progression, Difficulty::Normal, false, now_ms);
    if let Some(session) = engine.session() {
        let shelf = shelf_for(session);
        engine.set_resolver(Box::new(shelf));
    }
}

fn run(out: &mut Stdout, tuning: Tuning) -> Result<()> {
    let mut engine = Engine::new(EngineOptions {
        tuning,
        ..Default::default()
    });
    let mut dispatcher = PointerDispatcher::new(TrayRegion::new(
        SHELF_LEFT as f32,
        TRAY_TOP as f32,
        TRAY_WIDTH as f32,
        TRAY_HEIGHT as f32,
    ));

    let clock = Instant::now();
    let now_ms = || clock.elapsed().as_millis() as u64;
    let tick = Duration::from_millis(TICK_MS);

    let mut progression = 0u32;
    let mut status = String::from("press on the tray, drag to a crate, release");
    start(&mut engine, progression, now_ms());

    let mut last_tick = Instant::now();
    loop {
        draw(out, &engine, &status)?;

        let timeout = tick.checked_sub(last_tick.elapsed()).unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if should_quit(key) {
                        return Ok(());
                    }
                    match handle_key_event(key) {
                        Some(SessionKey::Hint) => {
                            if let Err(e) = engine.use_hint(now_ms()) {
                                status = format!("no hint: {e}");
                            }
                        }
                        Some(SessionKey::Restart) => {
                            dispatcher.reset();
                            engine.restart_session(now_ms())?;
                        }
                        Some(SessionKey::NextLevel) => {
                            let won = engine
                                .session()
                                .map(|s| s.phase() == Phase::Won)
                                .unwrap_or(false);
                            if won {
                                progression += 1;
                            }
                            dispatcher.reset();
                            start(&mut engine, progression, now_ms());
                        }
                        None => {}
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(input) = map_mouse_event(mouse) {
                        dispatcher.push(input);
                    }
                }
                _ => {}
            }
        }

        let front = engine
            .session()
            .and_then(|s| s.tokens_in_play().next().map(|t| t.id));
        dispatcher.flush(&mut engine, front, now_ms());

        if last_tick.elapsed() >= tick {
            last_tick = Instant::now();
            engine.tick(now_ms());
        }

        for ev in engine.drain_events() {
            if let Some(line) = describe(&ev) {
                status = line;
            }
        }
    }
}

fn describe(ev: &EngineEvent) -> Option<String> {
    Some(match ev {
        EngineEvent::SessionStarted { progression, .. } => format!("level {}", progression + 1),
        EngineEvent::TokenCleaned { griminess, .. } => format!("scrubbed, {griminess} to go"),
        EngineEvent::TokenAccepted { points_awarded, new_streak, .. } => {
            format!("+{points_awarded}  streak {new_streak}")
        }
        EngineEvent::TokenRejected { reason, removed, .. } => {
            if *removed {
                format!("{}: record lost", reason.as_str())
            } else {
                reason.as_str().to_string()
            }
        }
        EngineEvent::ComboDecayed => "combo cooled off".to_string(),
        EngineEvent::HintRevealed { container_id, .. } => format!("try {container_id}"),
        EngineEvent::ObjectiveCompleted { bonus_reward, .. } => {
            format!("objective complete (+{bonus_reward})")
        }
        EngineEvent::SessionWon { stats } => format!(
            "shelf sorted! {} pts, {} star(s). n: next level",
            stats.score, stats.stars
        ),
        EngineEvent::SessionLost { reason } => format!("out: {reason:?}. r: retry"),
        _ => return None,
    })
}

fn token_label(token: &Token) -> String {
    if token.is_discard {
        "junk".to_string()
    } else if token.is_grimy() {
        format!("grime x{}", token.griminess)
    } else if token.reveal == RevealState::Hidden {
        "???".to_string()
    } else if token.is_rare_variant {
        format!("*{}*", token.category.as_str())
    } else {
        token.category.as_str().to_string()
    }
}

fn draw(out: &mut Stdout, engine: &Engine, status: &str) -> Result<()> {
    queue!(out, Clear(ClearType::All))?;
    let Some(session) = engine.session() else {
        return Ok(out.flush()?);
    };

    let budget = session.budget();
    let mut header = format!(
        "Crate Digger  L{} {}  score {}  streak {} ({:?})",
        session.level().params.progression + 1,
        session.mode().as_str(),
        session.score(),
        session.combo().streak(),
        session.combo().tier(),
    );
    if budget.moves_bind() {
        header.push_str(&format!("  moves {}", budget.moves_remaining));
    }
    if budget.time_binds() {
        header.push_str(&format!("  time {}s", budget.time_remaining));
    }
    queue!(out, cursor::MoveTo(SHELF_LEFT, 0), Print(header))?;

    let mut x = SHELF_LEFT;
    for c in session.containers() {
        let name: String = c.category.as_str().chars().take(COLUMN_WIDTH as usize - 2).collect();
        queue!(out, cursor::MoveTo(x, SHELF_TOP), Print(name))?;
        for slot in 0..c.capacity.min(SHELF_ROWS as u8 - 2) {
            let cell = if slot < c.filled { "[##]" } else { "[  ]" };
            let row = SHELF_TOP + SHELF_ROWS - 1 - slot as u16;
            queue!(out, cursor::MoveTo(x, row), Print(cell))?;
        }
        x += COLUMN_WIDTH;
    }
    if session.level().tokens.iter().any(|t| t.is_discard) {
        queue!(out, cursor::MoveTo(x, SHELF_TOP), Print("trash"))?;
    }

    let tray = match session.tokens_in_play().next() {
        Some(t) => format!("[ {} ]", token_label(t)),
        None => "[ empty ]".to_string(),
    };
    let left = session.tokens_in_play().count();
    queue!(
        out,
        cursor::MoveTo(SHELF_LEFT, TRAY_TOP + 1),
        Print(tray),
        cursor::MoveTo(SHELF_LEFT + TRAY_WIDTH + 2, TRAY_TOP + 1),
        Print(format!("{left} in the pile")),
        cursor::MoveTo(SHELF_LEFT, TRAY_TOP + TRAY_HEIGHT + 1),
        Print(status),
        cursor::MoveTo(SHELF_LEFT, TRAY_TOP + TRAY_HEIGHT + 3),
        Print("h hint  r restart  n next  q quit"),
    )?;
    out.flush()?;
    Ok(())
}
