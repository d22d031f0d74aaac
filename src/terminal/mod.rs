pub(crate) mod draw;

use crate::{
    animations::cursor::CursorFollower,
    config::Config,
    landing::{title::TitleCard, LandingLayers, LandingTask, TimedRevealAnimator},
    render::{
        color::Color,
        host::{Host, PollableState},
        properties::CanvasSize,
        surface::{Point, Surface},
    },
};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        MouseEventKind,
    },
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
    QueueableCommand,
};
use draw::{CellGrid, CellMetrics, TextOverlay};
use std::{
    io::{self, BufWriter, Stdout, Write},
    time::{Duration, Instant},
};
use tracing::{debug, info};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// How a playback session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PlayOutcome {
    Quit,
    /// The call to action was used; carries the route it leads to.
    Navigate(String),
}

/// Errors that can occur while playing in the terminal
#[derive(thiserror::Error, Debug)]
pub enum TerminalError {
    #[error("terminal io: {0}")]
    Io(#[from] io::Error),

    #[error("terminal is too small to play in ({0}x{1})")]
    TooSmall(u16, u16),
}

/// Puts the terminal in raw, alternate screen mode and restores it when dropped.
struct TerminalGuard;

impl TerminalGuard {
    fn enter(stdout: &mut Stdout) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        stdout.queue(EnterAlternateScreen)?.queue(Hide)?.queue(EnableMouseCapture)?;
        stdout.flush()?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout
            .queue(DisableMouseCapture)
            .and_then(|s| s.queue(Show))
            .and_then(|s| s.queue(LeaveAlternateScreen));
        let _ = stdout.flush();
        let _ = terminal::disable_raw_mode();
    }
}

/// What is currently on screen, as far as input handling cares.
#[derive(Debug)]
struct Screen {
    columns: u16,
    rows: u16,
    button: Option<TextOverlay>,
}

impl Screen {
    fn is_on_button(&self, column: u16, row: u16) -> bool {
        self.button.as_ref().is_some_and(|button| button.contains(column, row))
    }
}

/// Plays the landing animation in the terminal until the user leaves.
pub(crate) struct TerminalPlayer {
    config: Config,
    metrics: CellMetrics,
    seed: Option<u64>,
}

impl TerminalPlayer {
    pub(crate) fn new(config: Config, metrics: CellMetrics, seed: Option<u64>) -> Self {
        Self { config, metrics, seed }
    }

    pub(crate) fn run(&self) -> Result<PlayOutcome, TerminalError> {
        let (columns, rows) = terminal::size()?;
        if columns < 2 || rows < 2 {
            return Err(TerminalError::TooSmall(columns, rows));
        }
        let mut stdout = io::stdout();
        let _guard = TerminalGuard::enter(&mut stdout)?;
        let mut output = BufWriter::new(stdout);
        self.play(&mut output, columns, rows)
    }

    fn play<W: Write>(&self, output: &mut W, columns: u16, rows: u16) -> Result<PlayOutcome, TerminalError> {
        let rng = match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let mut host = Host::new(self.metrics.window(columns, rows));
        let mut animator = TimedRevealAnimator::new(self.config.clone(), rng);
        let size = CanvasSize::for_window(host.window(), self.config.canvas.min_width);
        animator.activate(&mut host, Some(LandingLayers::new(size)));
        info!("playing on a {columns}x{rows} terminal");

        let mut card = TitleCard::new(self.config.title.clone(), animator.signal());
        let mut cursor = CursorFollower::new(self.config.cursor.easing);
        let mut screen = Screen { columns, rows, button: None };
        let started = Instant::now();
        let outcome = loop {
            if let Some(outcome) = self.handle_events(output, &mut screen, &mut host, &mut cursor)? {
                break outcome;
            }

            let now = started.elapsed();
            host.begin_frame(now);
            let state = host.pump(&mut animator);
            if card.observe(now) {
                debug!("stars revealed, showing title");
            }
            cursor.tick();
            if state == PollableState::Unmodified && (!card.is_visible() || card.is_settled(now)) {
                continue;
            }
            if let Some(layers) = animator.layers() {
                screen.button = self.render(output, &screen, layers, &card, &cursor, now)?;
            }
        };
        animator.deactivate(&mut host);
        debug!("playback ended: {outcome:?}");
        Ok(outcome)
    }

    /// Handles input until the next frame is due.
    fn handle_events<W: Write>(
        &self,
        output: &mut W,
        screen: &mut Screen,
        host: &mut Host<LandingTask>,
        cursor: &mut CursorFollower,
    ) -> Result<Option<PlayOutcome>, TerminalError> {
        let deadline = Instant::now() + FRAME_INTERVAL;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            if !event::poll(remaining)? {
                break;
            }
            match event::read()? {
                Event::Key(key) => {
                    if let Some(outcome) = self.handle_key(key) {
                        return Ok(Some(outcome));
                    }
                }
                Event::Resize(columns, rows) => {
                    screen.columns = columns;
                    screen.rows = rows;
                    host.resize(self.metrics.window(columns, rows));
                    output.queue(terminal::Clear(ClearType::All))?;
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        let target = Point::new(
                            (mouse.column as u32 * self.metrics.width) as f32,
                            (mouse.row as u32 * self.metrics.height) as f32,
                        );
                        cursor.point_at(target, screen.is_on_button(mouse.column, mouse.row));
                    }
                    MouseEventKind::Down(_) if screen.is_on_button(mouse.column, mouse.row) => {
                        return Ok(Some(PlayOutcome::Navigate(self.config.title.route.clone())));
                    }
                    _ => (),
                },
                _ => (),
            }
        }
        Ok(None)
    }

    fn handle_key(&self, key: KeyEvent) -> Option<PlayOutcome> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(PlayOutcome::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(PlayOutcome::Quit),
            KeyCode::Enter => Some(PlayOutcome::Navigate(self.config.title.route.clone())),
            _ => None,
        }
    }

    /// Draws a frame, returning where the call to action ended up, if it is showing.
    fn render<W: Write>(
        &self,
        output: &mut W,
        screen: &Screen,
        layers: &LandingLayers,
        card: &TitleCard,
        cursor: &CursorFollower,
        now: Duration,
    ) -> io::Result<Option<TextOverlay>> {
        let image = Surface::flatten(self.config.canvas.background, &[&layers.starfield, &layers.horizon]);
        let grid = CellGrid::from_image(&image, self.metrics.window(screen.columns, screen.rows), self.metrics);
        for row in 0..grid.rows() {
            output.queue(MoveTo(0, row))?;
            for cell in grid.row(row) {
                output
                    .queue(SetForegroundColor(term_color(cell.top)))?
                    .queue(SetBackgroundColor(term_color(cell.bottom)))?
                    .queue(Print('▀'))?;
            }
        }

        let overlays = self.overlays(&grid, card, now);
        for overlay in &overlays.text {
            let background = grid.cell(overlay.column, overlay.row).map(|c| c.bottom).unwrap_or(Color::BLACK);
            output
                .queue(MoveTo(overlay.column, overlay.row))?
                .queue(SetForegroundColor(term_color(overlay.color)))?
                .queue(SetBackgroundColor(term_color(background)))?
                .queue(Print(&overlay.text))?;
        }

        let position = cursor.position();
        let last_column = grid.columns().saturating_sub(1) as u32;
        let last_row = grid.rows().saturating_sub(1) as u32;
        let column = (position.x as u32 / self.metrics.width.max(1)).min(last_column) as u16;
        let row = (position.y as u32 / self.metrics.height.max(1)).min(last_row) as u16;
        let (symbol, color) = match cursor.is_hovering() {
            true => ('●', self.config.cursor.hover_color),
            false => ('○', self.config.cursor.color),
        };
        output
            .queue(MoveTo(column, row))?
            .queue(SetForegroundColor(term_color(color)))?
            .queue(Print(symbol))?
            .queue(ResetColor)?;
        output.flush()?;
        Ok(overlays.button)
    }

    fn overlays(&self, grid: &CellGrid, card: &TitleCard, now: Duration) -> Overlays {
        let mut overlays = Overlays::default();
        if !card.is_visible() {
            return overlays;
        }
        let config = card.config();
        let middle = grid.rows() / 2;
        let rise = (card.title_offset(now) / self.metrics.height as f32).round() as i32;
        let title_row = (middle as i32 - 3 + rise).max(0) as u16;

        let title_color = config.color.dimmed(card.title_opacity(now));
        overlays.text.push(TextOverlay::centered(&config.title, title_row, grid.columns(), title_color));
        overlays.text.push(TextOverlay::centered(&config.subtitle, title_row + 1, grid.columns(), title_color));

        let button_opacity = card.button_opacity(now);
        if button_opacity > 0.0 {
            // Scale shows as padding growing around the label.
            let padding = ((card.button_scale(now) - config.button_initial_scale) * 10.0).round().max(0.0) as usize;
            let label = format!("[{0}{1}{0}]", " ".repeat(padding.min(2)), config.button);
            let color = config.accent.dimmed(button_opacity);
            let button = TextOverlay::centered(&label, middle + 1, grid.columns(), color);
            overlays.button = Some(button.clone());
            overlays.text.push(button);
        }
        overlays
    }
}

#[derive(Debug, Default)]
struct Overlays {
    text: Vec<TextOverlay>,
    button: Option<TextOverlay>,
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb { r: color.r, g: color.g, b: color.b }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animations::timeline::RevealSignal;
    use crossterm::event::KeyEventState;

    fn player() -> TerminalPlayer {
        TerminalPlayer::new(Config::default(), CellMetrics { width: 10, height: 20 }, Some(1))
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent { code, modifiers, kind: KeyEventKind::Press, state: KeyEventState::NONE }
    }

    #[test]
    fn keys_end_playback() {
        let player = player();
        assert_eq!(player.handle_key(key(KeyCode::Char('q'), KeyModifiers::NONE)), Some(PlayOutcome::Quit));
        assert_eq!(player.handle_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(PlayOutcome::Quit));
        assert_eq!(
            player.handle_key(key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(PlayOutcome::Navigate("/home".into()))
        );
        assert_eq!(player.handle_key(key(KeyCode::Char('x'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn overlays_follow_the_title_card() {
        let player = player();
        let grid = CellGrid::from_image(
            &image::RgbaImage::new(400, 400),
            player.metrics.window(40, 20),
            player.metrics,
        );
        let signal = RevealSignal::default();
        let mut card = TitleCard::new(player.config.title.clone(), signal.clone());
        assert!(player.overlays(&grid, &card, Duration::ZERO).text.is_empty());

        signal.fire();
        card.observe(Duration::ZERO);
        let settled = player.overlays(&grid, &card, Duration::from_secs(5));
        assert_eq!(settled.text[0].text, "MovieVerse");
        assert_eq!(settled.text[0].color, Color::WHITE);
        let button = settled.button.expect("no button");
        assert!(button.text.contains("Getting Started"));
        assert_eq!(button.row, 11);
    }

    #[test]
    fn renders_a_frame() {
        let player = player();
        let mut host = Host::new(player.metrics.window(20, 10));
        let mut animator = TimedRevealAnimator::new(Config::default(), fastrand::Rng::with_seed(3));
        let size = CanvasSize::for_window(host.window(), 1920);
        animator.activate(&mut host, Some(LandingLayers::new(size)));
        let card = TitleCard::new(player.config.title.clone(), animator.signal());
        let screen = Screen { columns: 20, rows: 10, button: None };
        let mut output = Vec::new();
        let layers = animator.layers().expect("no layers");
        let button = player
            .render(&mut output, &screen, layers, &card, &CursorFollower::new(0.2), Duration::ZERO)
            .expect("render failed");
        assert!(button.is_none());
        let text = String::from_utf8(output).expect("not utf8");
        assert_eq!(text.matches('▀').count(), 200);
    }
}
