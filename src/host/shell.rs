use super::HostShell;
use crate::console::OutputLine;
use tokio::sync::mpsc::UnboundedSender;

/// Console stand-in for the UI toolkit: the window title becomes a status line.
pub(crate) struct ConsoleShell {
    out: UnboundedSender<OutputLine>,
    title: String,
    ui_up: bool,
}

impl ConsoleShell {
    pub fn new(out: UnboundedSender<OutputLine>) -> Self {
        Self {
            out,
            title: String::new(),
            ui_up: true,
        }
    }
}

impl HostShell for ConsoleShell {
    fn set_window_title(&mut self, title: &str) {
        if self.title == title {
            return;
        }
        self.title = title.to_string();
        let _ = self.out.send(OutputLine::Stdout(format!("== {title} ==")));
    }

    fn shutdown_ui(&mut self) {
        if self.ui_up {
            self.ui_up = false;
            tracing::debug!("ui shut down");
        }
    }

    fn exit_engine(&mut self) {
        tracing::info!("engine loop stopping");
        let _ = self.out.send(OutputLine::Stdout("Goodbye.".into()));
    }
}
