//! TUI entry point and terminal setup.

use std::io::{self, Stdout};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::{info, warn};

use crate::db::Database;
use crate::error::Result;
use crate::tui::app::App;

/// Initialise the terminal, run the app over `db` until the user quits,
/// then restore the terminal.
pub fn run_tui(db: Database) -> Result<()> {
    enable_raw_mode()?;
    let mut terminal = restore_on_error(setup_terminal, restore_terminal)?;

    info!(tasks = db.tasks.len(), "starting terminal UI");
    let mut app = App::new(db);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result?;
    info!(
        tasks = app.db().tasks.len(),
        areas = app.db().planted_areas.len(),
        "terminal UI closed; session discarded"
    );
    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Best-effort teardown once raw mode is on but setup failed.
fn restore_terminal() {
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
    let _ = disable_raw_mode();
}

/// Run `setup`, calling `restore` before passing on any error.
fn restore_on_error<T>(
    setup: impl FnOnce() -> io::Result<T>,
    restore: impl FnOnce(),
) -> io::Result<T> {
    match setup() {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(error = %e, "terminal setup failed; restoring");
            restore();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_failed_setup_restores_terminal() {
        let restored = Cell::new(false);
        let result: io::Result<()> = restore_on_error(
            || Err(io::Error::new(io::ErrorKind::Other, "no tty")),
            || restored.set(true),
        );
        assert!(result.is_err());
        assert!(restored.get());
    }

    #[test]
    fn test_successful_setup_leaves_terminal_alone() {
        let restored = Cell::new(false);
        let result = restore_on_error(|| Ok(7), || restored.set(true));
        assert_eq!(result.unwrap(), 7);
        assert!(!restored.get());
    }
}
