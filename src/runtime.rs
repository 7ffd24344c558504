use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::app::App;
use crate::net::{FetchDispatch, FetchResult};
use crate::ui;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
    fetcher: &dyn FetchDispatch,
    rx: Receiver<FetchResult>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(50);
    app.mount(fetcher);
    loop {
        while let Ok(result) = rx.try_recv() {
            app.apply_result(result);
        }

        if app.auto_refresh_due(Instant::now()) {
            debug!("auto refresh due");
            app.refresh(fetcher);
        }

        terminal.draw(|f| ui::ui(f, &mut app))?;

        if event::poll(tick_rate)? {
            let control = match event::read()? {
                Event::Key(key) => handle_key(&mut app, fetcher, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, fetcher, mouse),
                _ => Control::Continue,
            };
            if control == Control::Quit {
                return Ok(());
            }
        }
    }
}

pub fn handle_key(app: &mut App, fetcher: &dyn FetchDispatch, key: KeyEvent) -> Control {
    if key.kind != KeyEventKind::Press {
        return Control::Continue;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Control::Quit
        }
        KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Enter => {
            app.trigger_refresh(fetcher);
        }
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(1),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(1),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Home => app.scroll_home(),
        KeyCode::End => app.scroll_end(),
        _ => {}
    }
    Control::Continue
}

fn handle_mouse(app: &mut App, fetcher: &dyn FetchDispatch, mouse: MouseEvent) -> Control {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(1),
        MouseEventKind::ScrollDown => app.scroll_down(1),
        MouseEventKind::Down(MouseButton::Left) => {
            if app.button_hit(mouse.column, mouse.row) {
                app.trigger_refresh(fetcher);
            }
        }
        _ => {}
    }
    Control::Continue
}
