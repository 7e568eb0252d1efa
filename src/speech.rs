//! Scripted speech bubble shown after a successful claim.
//!
//! The script is plain data: each line has its text, what dynamic value to
//! append, and what ends it (a fixed dwell or the share button's hover).
//! [`SpeechPlayer`] consumes the script one step at a time and tells the
//! caller how long to wait before the next step, so a single timer in the
//! view is enough to drive it.

use crate::config::{SPEECH_LINE_MS, TYPING_INTERVAL_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    Nothing,
    Handle,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Dwell this many milliseconds once fully typed, then move on.
    After(u32),
    /// Shown only while the share button is hovered, held indefinitely.
    WhileHovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    None,
    Jiggle,
    Bounce,
    Twirl,
    Wiggle,
}

impl Animation {
    pub fn css_class(self) -> &'static str {
        match self {
            Animation::None => "",
            Animation::Jiggle => "anim-jiggle",
            Animation::Bounce => "anim-bounce",
            Animation::Twirl => "anim-twirl",
            Animation::Wiggle => "anim-wiggle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechLine {
    pub text: &'static str,
    pub append: Append,
    pub trigger: Trigger,
    pub animation: Animation,
}

const fn line(text: &'static str, append: Append, animation: Animation) -> SpeechLine {
    SpeechLine {
        text,
        append,
        trigger: Trigger::After(SPEECH_LINE_MS),
        animation,
    }
}

/// The post-claim script.
pub fn claim_script() -> Vec<SpeechLine> {
    vec![
        line("Hey!", Append::Nothing, Animation::None),
        line("I'm ", Append::Handle, Animation::Jiggle),
        line("You're #", Append::Position, Animation::Bounce),
        line("Thanks for claiming me", Append::Nothing, Animation::Twirl),
        line("I can't wait to meet you", Append::Nothing, Animation::None),
        line("We'll work together soon", Append::Nothing, Animation::Bounce),
        line("See you at launch", Append::Nothing, Animation::Wiggle),
        SpeechLine {
            text: "Claim the welcome gift?",
            append: Append::Nothing,
            trigger: Trigger::WhileHovered,
            animation: Animation::Jiggle,
        },
    ]
}

/// When the driver should call [`SpeechPlayer::step`] again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    After(u32),
    /// Nothing scheduled until the hover state changes.
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Typing,
    Dwelling,
    Held,
    Hidden,
}

/// What the bubble renders right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechFrame {
    pub text: String,
    pub typing: bool,
    pub visible: bool,
    pub animation: Animation,
}

pub struct SpeechPlayer {
    lines: Vec<SpeechLine>,
    handle: String,
    position: u64,
    index: usize,
    chars: Vec<char>,
    revealed: usize,
    stage: Stage,
}

impl SpeechPlayer {
    pub fn new(lines: Vec<SpeechLine>, handle: &str, position: u64) -> Self {
        let mut player = Self {
            lines,
            handle: handle.to_string(),
            position,
            index: 0,
            chars: Vec::new(),
            revealed: 0,
            stage: Stage::Hidden,
        };
        if !player.lines.is_empty() {
            player.load(0);
        }
        player
    }

    /// Delay before the first call to [`step`](Self::step).
    pub fn start(&self) -> Step {
        match self.stage {
            Stage::Typing => Step::After(TYPING_INTERVAL_MS),
            _ => Step::Wait,
        }
    }

    /// Advance by one character, or finish a dwell and move to the next line.
    pub fn step(&mut self) -> Step {
        match self.stage {
            Stage::Typing => {
                if self.revealed < self.chars.len() {
                    self.revealed += 1;
                }
                if self.revealed < self.chars.len() {
                    return Step::After(TYPING_INTERVAL_MS);
                }
                match self.lines[self.index].trigger {
                    Trigger::After(ms) => {
                        self.stage = Stage::Dwelling;
                        Step::After(ms)
                    }
                    Trigger::WhileHovered => {
                        self.stage = Stage::Held;
                        Step::Wait
                    }
                }
            }
            Stage::Dwelling => {
                let next = self.index + 1;
                match self.lines.get(next).map(|l| l.trigger) {
                    Some(Trigger::After(_)) => {
                        self.load(next);
                        Step::After(TYPING_INTERVAL_MS)
                    }
                    _ => {
                        self.stage = Stage::Hidden;
                        Step::Wait
                    }
                }
            }
            Stage::Held | Stage::Hidden => Step::Wait,
        }
    }

    /// Share-button hover changed. Returns a new schedule when the player
    /// switched lines, `None` when the current schedule should stand.
    pub fn set_hovered(&mut self, hovered: bool) -> Option<Step> {
        let hover_line = self
            .lines
            .iter()
            .rposition(|l| l.trigger == Trigger::WhileHovered)?;
        if hovered && self.stage == Stage::Hidden {
            self.load(hover_line);
            return Some(Step::After(TYPING_INTERVAL_MS));
        }
        if !hovered && self.index == hover_line && self.stage != Stage::Hidden {
            self.stage = Stage::Hidden;
            return Some(Step::Wait);
        }
        None
    }

    pub fn frame(&self) -> SpeechFrame {
        SpeechFrame {
            text: self.chars[..self.revealed].iter().collect(),
            typing: self.stage == Stage::Typing,
            visible: self.stage != Stage::Hidden,
            animation: self
                .lines
                .get(self.index)
                .map(|l| l.animation)
                .unwrap_or(Animation::None),
        }
    }

    fn load(&mut self, index: usize) {
        let line = self.lines[index];
        let mut text = line.text.to_string();
        match line.append {
            Append::Nothing => {}
            Append::Handle => text.push_str(&self.handle),
            Append::Position => text.push_str(&self.position.to_string()),
        }
        self.index = index;
        self.chars = text.chars().collect();
        self.revealed = 0;
        self.stage = Stage::Typing;
    }
}
