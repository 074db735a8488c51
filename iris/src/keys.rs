//! Maps stdin commands to control events.
//!
//! Commands are one character followed by Enter: 0 idle, 1 scene,
//! 2 reading, 3 objects, 4 faces, s scan, c caption, d depth check,
//! r repeat, t audio check, q quit.

use controller::{ControlEvent, Mode, OneShot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

pub fn event_for(key: char) -> Option<ControlEvent> {
    match key.to_ascii_lowercase() {
        '0' => Some(ControlEvent::Select(Mode::Idle)),
        '1' => Some(ControlEvent::Select(Mode::Scene)),
        '2' => Some(ControlEvent::Select(Mode::Reading)),
        '3' => Some(ControlEvent::Select(Mode::Objects)),
        '4' => Some(ControlEvent::Select(Mode::Faces)),
        's' => Some(ControlEvent::Select(Mode::Scan)),
        'c' => Some(ControlEvent::Trigger(OneShot::Caption)),
        'd' => Some(ControlEvent::Trigger(OneShot::Depth)),
        'r' => Some(ControlEvent::Replay),
        't' => Some(ControlEvent::AudioCheck),
        'q' => Some(ControlEvent::Quit),
        _ => None,
    }
}

/// Forward keyboard commands from stdin until it closes.
pub async fn listen(tx: mpsc::UnboundedSender<ControlEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some(key) = line.trim().chars().next() else {
            continue;
        };
        match event_for(key) {
            Some(event) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            None => debug!("unmapped key '{key}'"),
        }
    }
}
