use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;

use mdt_core::KeyPress;
use mdt_experiment::{DisplayGeometry, ESCAPE_KEY, Presentation, Presenter, ResponseWindow};
use mdt_timing::{HighPrecisionTimer, Timer};
use tracing::{debug, warn};

/// Terminal stand-in for a display. Each input line is one key press;
/// `esc` and `escape` both map to the escape key.
pub struct ConsolePresenter {
    geometry: DisplayGeometry,
    keys: Receiver<String>,
    timer: HighPrecisionTimer,
    shown_at: u64,
}

impl ConsolePresenter {
    /// Reads stdin on a helper thread so that a fixed response window can
    /// time out.
    pub fn stdin(geometry: DisplayGeometry, timer: HighPrecisionTimer) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(normalize_key(&line)).is_err() {
                    break;
                }
            }
        });
        Self::from_receiver(geometry, timer, rx)
    }

    pub fn from_receiver(
        geometry: DisplayGeometry,
        timer: HighPrecisionTimer,
        keys: Receiver<String>,
    ) -> Self {
        let shown_at = timer.now();
        Self {
            geometry,
            keys,
            timer,
            shown_at,
        }
    }

    fn print(&self, text: &str) {
        let mut out = io::stdout().lock();
        // A closed stdout only loses the echo; the log is unaffected.
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }

    /// Drops presses typed before the stimulus appeared.
    fn clear_pending(&self) {
        while self.keys.try_recv().is_ok() {}
    }
}

pub fn normalize_key(line: &str) -> String {
    let key = line.trim().to_ascii_lowercase();
    if key == "esc" {
        ESCAPE_KEY.to_string()
    } else {
        key
    }
}

fn describe(presentation: &Presentation) -> String {
    match presentation {
        Presentation::Centered { image } => format!("[ {image} ]"),
        Presentation::Positioned { image, at } => format!("[ {image} ] at {at}"),
        Presentation::SideBySide { left, right } => format!("[ {left} ]   [ {right} ]"),
        Presentation::Marked(inner) => format!("{}  #", describe(inner)),
        Presentation::Choice { left, right } => {
            format!("{}   |   {}", left.replace('\n', " "), right.replace('\n', " "))
        }
    }
}

impl Presenter for ConsolePresenter {
    fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    fn present(&mut self, presentation: &Presentation) {
        self.print(&describe(presentation));
        self.clear_pending();
        self.shown_at = self.timer.now();
    }

    fn wait_for_response(&mut self, keys: &[&str], window: ResponseWindow) -> Option<KeyPress> {
        match window {
            ResponseWindow::SelfPaced => loop {
                let Ok(key) = self.keys.recv() else {
                    warn!("input closed, treating as escape");
                    return Some(KeyPress::new(ESCAPE_KEY, self.timer.elapsed(self.shown_at)));
                };
                if keys.contains(&key.as_str()) {
                    return Some(KeyPress::new(key, self.timer.elapsed(self.shown_at)));
                }
            },
            ResponseWindow::Fixed(duration) => {
                let mut first = None;
                loop {
                    let elapsed = self.timer.elapsed(self.shown_at);
                    let Some(remaining) = duration.checked_sub(elapsed).filter(|d| !d.is_zero())
                    else {
                        break;
                    };
                    match self.keys.recv_timeout(remaining) {
                        Ok(key) if first.is_none() && keys.contains(&key.as_str()) => {
                            first = Some(KeyPress::new(key, self.timer.elapsed(self.shown_at)));
                        }
                        Ok(_) => {}
                        Err(RecvTimeoutError::Timeout) => break,
                        Err(RecvTimeoutError::Disconnected) => {
                            // Keep the stimulus up for its full duration.
                            self.timer.sleep(remaining);
                            break;
                        }
                    }
                }
                debug!(response = ?first.as_ref().map(|k| &k.key), "response window closed");
                first
            }
        }
    }

    fn blank(&mut self) {
        self.print("");
    }

    fn show_message(&mut self, text: &str) {
        self.print(&format!("\n{text}\n"));
    }

    fn wait_for_key(&mut self, keys: &[&str]) -> String {
        loop {
            match self.keys.recv() {
                Ok(key) if keys.contains(&key.as_str()) => return key,
                Ok(key) => debug!(key = %key, "ignored key"),
                Err(_) => {
                    warn!("input closed, treating as escape");
                    return ESCAPE_KEY.to_string();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn presenter(lines: &[&str]) -> ConsolePresenter {
        let (tx, rx) = mpsc::channel();
        for line in lines {
            tx.send(normalize_key(line)).unwrap();
        }
        drop(tx);
        ConsolePresenter::from_receiver(DisplayGeometry::default(), HighPrecisionTimer::new(), rx)
    }

    #[test]
    fn esc_is_normalized() {
        assert_eq!(normalize_key(" ESC\n"), "escape");
        assert_eq!(normalize_key("Z"), "z");
    }

    #[test]
    fn describes_ecog_screens() {
        let marked = Presentation::Centered {
            image: "a.jpg".into(),
        }
        .marked();
        assert_eq!(describe(&marked), "[ a.jpg ]  #");
        let choice = Presentation::Choice {
            left: "Old\n\n1".into(),
            right: "New\n\n2".into(),
        };
        assert_eq!(describe(&choice), "Old  1   |   New  2");
    }

    #[test]
    fn wait_for_key_skips_disallowed_keys() {
        let mut p = presenter(&["x", "m", "p"]);
        assert_eq!(p.wait_for_key(&["p", "escape"]), "p");
        assert_eq!(p.wait_for_key(&["p"]), "escape");
    }

    #[test]
    fn self_paced_takes_first_allowed_key() {
        let mut p = presenter(&["q", "m", "z"]);
        let press = p.wait_for_response(&["z", "m"], ResponseWindow::SelfPaced).unwrap();
        assert_eq!(press.key, "m");
    }

    #[test]
    fn fixed_window_times_out_without_keys() {
        let (_tx, rx) = mpsc::channel();
        let mut p = ConsolePresenter::from_receiver(
            DisplayGeometry::default(),
            HighPrecisionTimer::new(),
            rx,
        );
        let window = ResponseWindow::Fixed(Duration::from_millis(20));
        assert_eq!(p.wait_for_response(&["z"], window), None);
    }
}
