//! Terminal front end: the fading editor and the garden view.

mod activity;
mod app;
mod halfblock;

use std::{io, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect as Area},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::{
    clock::{Clock, SystemClock},
    config::{self, AppConfig},
    export::{CardFont, FileExportSink, Typeface},
    flags::FlagStore,
    garden::{Garden, BACKGROUND, INK},
    render::{Canvas, PixelCanvas},
    store::{SqliteStore, ThoughtStore},
};

use app::{App, Screen};
use halfblock::{color_for, CellGrid};

const ROSE: Color = Color::Rgb(232, 164, 196);
const LAVENDER: Color = Color::Rgb(196, 176, 232);

pub fn run(store: &SqliteStore, config: &AppConfig) -> Result<()> {
    let sink = FileExportSink::new(&config.export.dir);
    let typeface = CardFont::discover(config.export.font.as_deref().map(std::path::Path::new))
        .map(|font| Box::new(font) as Box<dyn Typeface>);
    let mut app = App::new(
        store,
        SystemClock,
        Box::new(sink),
        typeface,
        (config.garden.width, config.garden.height),
    )
    .context("failed to load the current draft")?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);
    app.shutdown();
    shutdown_terminal(&mut terminal)?;
    result
}

fn event_loop<S, C>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<'_, S, C>,
) -> Result<()>
where
    S: ThoughtStore + FlagStore,
    C: Clock,
{
    let mut view = GardenView::default();
    let render_interval = Duration::from_secs_f32(1.0 / config::RENDER_HZ);
    let mut last_render = std::time::Instant::now();

    loop {
        while event::poll(Duration::from_millis(0))? {
            if let CrosstermEvent::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
        if app.should_quit() {
            return Ok(());
        }

        if last_render.elapsed() >= render_interval {
            app.tick();
            terminal.draw(|frame| match app.screen() {
                Screen::Editor => draw_editor(frame, app),
                Screen::Garden => draw_garden(frame, app, &mut view),
            })?;
            last_render = std::time::Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}

fn shutdown_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn screen_chunks(area: Area) -> std::rc::Rc<[Area]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area)
}

fn draw_editor<S, C>(frame: &mut Frame, app: &App<'_, S, C>)
where
    S: ThoughtStore + FlagStore,
    C: Clock,
{
    let chunks = screen_chunks(frame.size());
    let session = app.session();
    let opacity = app.opacity();
    let accent = color_for(app.palette().color(session.emotion()));

    let phase = crate::editor::FadePhase::from_opacity(opacity);
    let header = Paragraph::new(Line::from(vec![
        Span::styled(format!("{} ", phase.label()), Style::default().fg(color_for(INK))),
        Span::styled(
            format!("{:.0}%", opacity * 100.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(
            session.emotion().label(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).title("udyāna"));
    frame.render_widget(header, chunks[0]);

    let ink = color_for(BACKGROUND.lerp(INK, opacity));
    let body = if session.content().is_empty() {
        Paragraph::new(Span::styled(
            "begin where you are...",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        Paragraph::new(format!("{}▏", session.content())).style(Style::default().fg(ink))
    };
    frame.render_widget(
        body.wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );

    let strip = chunks[2];
    let spans: Vec<Span> = app
        .activity()
        .cells(strip.width as usize)
        .into_iter()
        .map(|cell| match cell {
            Some((glyph, warm)) => {
                Span::styled(glyph.to_string(), Style::default().fg(if warm { ROSE } else { LAVENDER }))
            }
            None => Span::raw(" "),
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), strip);

    let hints = app.status().map(str::to_string).unwrap_or_else(|| {
        if session.can_preserve() {
            "ctrl-s preserve | ctrl-e share | ctrl-g garden | esc quit".to_string()
        } else {
            "ctrl-g garden | esc quit".to_string()
        }
    });
    let footer = Paragraph::new(hints).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[3]);

    draw_guide(frame, app);
}

/// Holds the raster between frames and rebuilds it only on resize.
#[derive(Default)]
struct GardenView {
    canvas: Option<PixelCanvas>,
}

impl GardenView {
    fn ensure_viewport(&mut self, cols: u16, rows: u16) -> Option<&mut PixelCanvas> {
        let (w, h) = (cols as u32, rows as u32 * 2);
        let stale = self
            .canvas
            .as_ref()
            .is_none_or(|c| c.width() != w || c.height() != h);
        if stale {
            self.canvas = PixelCanvas::new(w, h);
        }
        self.canvas.as_mut()
    }
}

/// Uniform scale and offset that letterbox the logical garden into the
/// pixel grid.
fn fit(garden: &Garden, pixels: (f32, f32)) -> (f32, f32, f32) {
    let (w, h) = garden.size();
    let scale = (pixels.0 / w).min(pixels.1 / h);
    ((pixels.0 - w * scale) / 2.0, (pixels.1 - h * scale) / 2.0, scale)
}

fn draw_garden<S, C>(frame: &mut Frame, app: &mut App<'_, S, C>, view: &mut GardenView)
where
    S: ThoughtStore + FlagStore,
    C: Clock,
{
    let chunks = screen_chunks(frame.size());
    let blooms = app.garden_mut().map_or(0, |g| g.nodes().len());
    let header = Paragraph::new(format!("{blooms} preserved reflections"))
        .block(Block::default().borders(Borders::ALL).title("your garden"));
    frame.render_widget(header, chunks[0]);

    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(chunks[1].union(chunks[2]));
    frame.render_widget(block, chunks[1].union(chunks[2]));

    if let (Some(garden), Some(canvas)) = (app.garden_mut(), view.ensure_viewport(inner.width, inner.height)) {
        canvas.clear(BACKGROUND);
        let (ox, oy, scale) = fit(garden, (canvas.width() as f32, canvas.height() as f32));
        canvas.translate(ox, oy);
        canvas.scale(scale, scale);
        garden.frame(canvas);

        let mut grid = CellGrid::from_canvas(canvas);
        grid.overlay(canvas.labels());
        frame.render_widget(Paragraph::new(grid.to_lines()), inner);
    }

    let hints = app
        .status()
        .unwrap_or("s square map | t story map | esc back")
        .to_string();
    frame.render_widget(
        Paragraph::new(hints).block(Block::default().borders(Borders::ALL)),
        chunks[3],
    );

    draw_guide(frame, app);
}

fn draw_guide<S, C>(frame: &mut Frame, app: &App<'_, S, C>)
where
    S: ThoughtStore + FlagStore,
    C: Clock,
{
    let Some(guide) = app.guide() else {
        return;
    };
    let area = frame.size();
    let width = area.width.saturating_sub(8).min(60);
    let popup = Area {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + area.height.saturating_sub(7) / 2,
        width,
        height: 7.min(area.height),
    };
    frame.render_widget(Clear, popup);
    let text = vec![
        Line::from(guide.message()),
        Line::from(""),
        Line::from(Span::styled("press any key", Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(ROSE))),
        popup,
    );
}
