use std::io::{self, Stdout};

use crossterm::{
    cursor::{Hide, Show},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Terminal};

/// Raw mode, alternate screen and a hidden cursor for as long as it lives.
/// Dropping it, or panicking, puts the terminal back.
pub struct TerminalSession {
    restored: bool,
}

impl TerminalSession {
    pub fn enter() -> io::Result<(Self, Terminal<CrosstermBackend<Stdout>>)> {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore();
            original_hook(info);
        }));

        // constructed first so a failure below still restores on drop
        let session = Self { restored: false };
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(Hide)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok((session, terminal))
    }

    pub fn leave(mut self) {
        restore();
        self.restored = true;
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if !self.restored {
            restore();
        }
    }
}

fn restore() {
    let _ = terminal::disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = stdout.execute(LeaveAlternateScreen);
    let _ = stdout.execute(Show);
}
