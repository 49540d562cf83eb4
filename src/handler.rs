use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => app.scroll_to_bottom(),
        AppEvent::Tick => app.tick_animation(),
    }
    app.poll_exchange().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any state
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(1) / 2),
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(1) / 2),
        KeyCode::Up if key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_up(1),
        KeyCode::Down if key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_down(1),
        // The prompt box is frozen while an exchange is running
        _ if app.is_waiting() => {}
        KeyCode::Enter => {
            if app.submit() {
                // Scroll to bottom so "Thinking..." is visible
                app.scroll_to_bottom();
            }
        }
        _ => edit_input(app, key),
    }
}

fn edit_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askme_core::{ChatEngine, EngineConfig, OpenAIClient};
    use crossterm::event::KeyEventKind;

    fn test_app() -> App {
        let config = EngineConfig::new("test-key").with_endpoint("http://127.0.0.1:9/unused");
        App::new(ChatEngine::new(OpenAIClient::new(config).unwrap()))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[test]
    fn test_editing_keys() {
        let mut app = test_app();
        type_str(&mut app, "helo");
        handle_key(&mut app, press(KeyCode::Left));
        type_str(&mut app, "l");
        assert_eq!(app.input, "hello");
        assert_eq!(app.cursor, 4);

        handle_key(&mut app, press(KeyCode::Home));
        handle_key(&mut app, press(KeyCode::Delete));
        assert_eq!(app.input, "ello");

        handle_key(&mut app, press(KeyCode::End));
        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.input, "ell");
        assert_eq!(app.cursor, 3);
    }

    #[test]
    fn test_enter_on_blank_prompt_does_nothing() {
        let mut app = test_app();
        type_str(&mut app, "   ");
        handle_key(&mut app, press(KeyCode::Enter));

        assert!(app.exchange_task.is_none());
        assert_eq!(app.input, "   ");
    }

    #[test]
    fn test_escape_and_ctrl_c_quit() {
        let mut app = test_app();
        handle_key(&mut app, press(KeyCode::Esc));
        assert!(app.should_quit);

        let mut app = test_app();
        handle_key(
            &mut app,
            KeyEvent::new_with_kind(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press),
        );
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_failed_exchange_clears_prompt() {
        let mut app = test_app();
        type_str(&mut app, "Hi");
        handle_key(&mut app, press(KeyCode::Enter));
        assert!(app.exchange_task.is_some());

        // Typing is ignored while the exchange runs
        type_str(&mut app, "x");
        assert_eq!(app.input, "Hi");

        while app.exchange_task.is_some() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            app.poll_exchange().await;
        }

        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert!(app.engine.last_error().is_some());
        assert_eq!(app.engine.history().len(), 1);
    }
}
