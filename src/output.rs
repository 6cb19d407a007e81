//! Terminal caption renderer.
//!
//! Consumes the caption channel on its own thread. Status messages go to
//! stderr so piping stdout yields clean caption text; captions go to
//! stdout, wrapped at a fixed width with line breaks at sentence ends.

use crate::caption::CaptionEvent;
use crate::defaults;
use crossbeam_channel::Receiver;
use owo_colors::OwoColorize;
use std::thread::{self, JoinHandle};

/// Wrap caption text for terminal display.
///
/// Sentence-ending punctuation forces a line break; within a sentence,
/// lines wrap at word boundaries before `max_width`. Words longer than
/// the width get a line of their own.
pub fn wrap_caption(text: &str, max_width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }

        if word.ends_with('.') || word.ends_with('?') || word.ends_with('!') {
            lines.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

/// Spawn the renderer thread. It exits when the channel disconnects,
/// which happens once every publisher clone is dropped.
pub fn spawn_renderer(rx: Receiver<CaptionEvent>, quiet: bool) -> JoinHandle<()> {
    thread::spawn(move || {
        for event in rx.iter() {
            match event {
                CaptionEvent::Status(message) => {
                    if !quiet {
                        eprintln!("{}", message.dimmed());
                    }
                }
                CaptionEvent::Caption(text) => {
                    println!("{}", wrap_caption(&text, defaults::MAX_LINE_LENGTH));
                }
            }
        }
    })
}
