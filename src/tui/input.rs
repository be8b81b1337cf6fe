use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::shared::InputEvent;

// poll for input from the terminal and resolve keys into semantic
// inputevents for the middle layer to handle
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],

        // knobs, one coarse notch per press
        KeyCode::Char('[') => vec![InputEvent::AdjustVolume(-0.05)],
        KeyCode::Char(']') => vec![InputEvent::AdjustVolume(0.05)],
        KeyCode::Char('-') => vec![InputEvent::AdjustBpm(-5.0)],
        KeyCode::Char('=') => vec![InputEvent::AdjustBpm(5.0)],
        KeyCode::Char(';') => vec![InputEvent::AdjustSpeed(-0.1)],
        KeyCode::Char('\'') => vec![InputEvent::AdjustSpeed(0.1)],
        KeyCode::Char(',') => vec![InputEvent::AdjustDuration(-0.05)],
        KeyCode::Char('.') => vec![InputEvent::AdjustDuration(0.05)],

        // sweep density
        KeyCode::Char(c @ '1'..='4') => {
            vec![InputEvent::SetPixelStep(c as u8 - b'0')]
        }

        KeyCode::Char('o') => vec![InputEvent::CycleShape],
        KeyCode::Char('s') => vec![InputEvent::CycleScale],
        KeyCode::Char('r') => vec![InputEvent::ReloadImage],

        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_on_esc_or_q() {
        assert_eq!(handle_key(KeyCode::Esc), vec![InputEvent::Quit]);
        assert_eq!(handle_key(KeyCode::Char('q')), vec![InputEvent::Quit]);
    }

    #[test]
    fn digits_map_to_pixel_steps() {
        for d in 1..=4u8 {
            let code = KeyCode::Char((b'0' + d) as char);
            assert_eq!(handle_key(code), vec![InputEvent::SetPixelStep(d)]);
        }
        // 5-9 are unbound
        assert!(handle_key(KeyCode::Char('5')).is_empty());
    }

    #[test]
    fn paired_knob_keys_move_in_opposite_directions() {
        assert_eq!(
            handle_key(KeyCode::Char('[')),
            vec![InputEvent::AdjustVolume(-0.05)]
        );
        assert_eq!(
            handle_key(KeyCode::Char(']')),
            vec![InputEvent::AdjustVolume(0.05)]
        );
        assert_eq!(
            handle_key(KeyCode::Char('-')),
            vec![InputEvent::AdjustBpm(-5.0)]
        );
        assert_eq!(
            handle_key(KeyCode::Char('.')),
            vec![InputEvent::AdjustDuration(0.05)]
        );
    }

    #[test]
    fn unbound_keys_do_nothing() {
        assert!(handle_key(KeyCode::Char('z')).is_empty());
        assert!(handle_key(KeyCode::Enter).is_empty());
    }
}
