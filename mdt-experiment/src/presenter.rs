use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use mdt_core::KeyPress;
use serde::{Deserialize, Serialize};

/// Pixel size of the drawable area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub width: f64,
    pub height: f64,
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// Centre-origin coordinate in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("({:.0}, {:.0})", self.x, self.y))
    }
}

/// What to put on screen for one trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Presentation {
    Centered { image: String },
    Positioned { image: String, at: Point },
    SideBySide { left: String, right: String },
    /// The inner stimulus plus the photodiode box in the lower left corner.
    Marked(Box<Presentation>),
    /// Response screen of the ECog procedure: two labelled choices.
    Choice { left: String, right: String },
}

impl Presentation {
    pub fn marked(self) -> Self {
        Presentation::Marked(Box::new(self))
    }

    pub fn images(&self) -> Vec<&str> {
        match self {
            Presentation::Centered { image } | Presentation::Positioned { image, .. } => {
                vec![image.as_str()]
            }
            Presentation::SideBySide { left, right } => vec![left.as_str(), right.as_str()],
            Presentation::Marked(inner) => inner.images(),
            Presentation::Choice { .. } => Vec::new(),
        }
    }
}

/// The response button a trial expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// How long a stimulus stays up waiting for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseWindow {
    /// Stimulus stays for the full duration; the first key pressed within
    /// it is the response.
    Fixed(Duration),
    /// Stimulus stays until a key is pressed.
    SelfPaced,
}

/// Display and input provider. Implementations own all drawing, key
/// polling and reaction-time measurement.
pub trait Presenter {
    fn geometry(&self) -> DisplayGeometry;

    fn present(&mut self, presentation: &Presentation);

    /// `None` when the window closed without an allowed key.
    fn wait_for_response(&mut self, keys: &[&str], window: ResponseWindow) -> Option<KeyPress>;

    /// Clears the screen between trials.
    fn blank(&mut self);

    fn show_message(&mut self, text: &str);

    /// Blocks until one of `keys` is pressed and returns it.
    fn wait_for_key(&mut self, keys: &[&str]) -> String;
}

/// Replays queued keys instead of reading a keyboard. Trials with nothing
/// queued get `default_response`; prompts with nothing queued get their first
/// allowed key.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPresenter {
    pub geometry: DisplayGeometry,
    pub responses: VecDeque<Option<KeyPress>>,
    pub prompt_keys: VecDeque<String>,
    pub default_response: Option<KeyPress>,
    pub shown: Vec<Presentation>,
    pub messages: Vec<String>,
}

impl ScriptedPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every trial is answered with `key` after `reaction_time`.
    pub fn always(key: &str, reaction_time: Duration) -> Self {
        Self {
            default_response: Some(KeyPress::new(key, reaction_time)),
            ..Self::default()
        }
    }

    pub fn then_respond(mut self, key: &str, reaction_time: Duration) -> Self {
        self.responses
            .push_back(Some(KeyPress::new(key, reaction_time)));
        self
    }

    pub fn then_time_out(mut self) -> Self {
        self.responses.push_back(None);
        self
    }

    pub fn then_prompt(mut self, key: &str) -> Self {
        self.prompt_keys.push_back(key.to_string());
        self
    }
}

impl Presenter for ScriptedPresenter {
    fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    fn present(&mut self, presentation: &Presentation) {
        self.shown.push(presentation.clone());
    }

    fn wait_for_response(&mut self, _keys: &[&str], _window: ResponseWindow) -> Option<KeyPress> {
        match self.responses.pop_front() {
            Some(queued) => queued,
            None => self.default_response.clone(),
        }
    }

    fn blank(&mut self) {}

    fn show_message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn wait_for_key(&mut self, keys: &[&str]) -> String {
        self.prompt_keys
            .pop_front()
            .or_else(|| keys.first().map(|k| k.to_string()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_display_pads() {
        let p = Point::new(-512.4, 300.0);
        assert_eq!(format!("{p:<14}|"), "(-512, 300)   |");
    }

    #[test]
    fn side_by_side_lists_both_images() {
        let p = Presentation::SideBySide {
            left: "a.jpg".into(),
            right: "b.jpg".into(),
        };
        assert_eq!(p.images(), ["a.jpg", "b.jpg"]);
    }

    #[test]
    fn marker_keeps_inner_images() {
        let p = Presentation::Centered {
            image: "a.jpg".into(),
        }
        .marked();
        assert_eq!(p.images(), ["a.jpg"]);
        let choice = Presentation::Choice {
            left: "Old".into(),
            right: "New".into(),
        };
        assert!(choice.images().is_empty());
    }

    #[test]
    fn scripted_presenter_replays_then_defaults() {
        let mut p = ScriptedPresenter::always("m", Duration::from_millis(300))
            .then_time_out()
            .then_prompt("escape");
        let window = ResponseWindow::SelfPaced;
        assert_eq!(p.wait_for_response(&["z", "m"], window), None);
        assert_eq!(p.wait_for_response(&["z", "m"], window).unwrap().key, "m");
        assert_eq!(p.wait_for_key(&["p", "escape"]), "escape");
        assert_eq!(p.wait_for_key(&["p", "escape"]), "p");
    }
}
