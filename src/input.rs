use crate::app::Scene;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    OpenFood,
    OpenStore,
    Wash,
    Play,
    ToggleSleep,
    Talk,
    HelpToggle,
    MenuMove(i32),
    MenuSelect,
    TalkChar(char),
    TalkBackspace,
    TalkSubmit,
    PlayerLeft,
    PlayerRight,
    Collect,
    Back,
    Quit,
}

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(scene: &Scene, ev: InputEvent) -> Option<Action> {
    if ev.mods.contains(KeyModifiers::CONTROL) && ev.key == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    // The talk prompt swallows letters, so it gets first pick.
    if matches!(scene, Scene::Talk) {
        return match ev.key {
            KeyCode::Enter => Some(Action::TalkSubmit),
            KeyCode::Esc => Some(Action::Back),
            KeyCode::Backspace => Some(Action::TalkBackspace),
            KeyCode::Char(ch) if !ch.is_control() => Some(Action::TalkChar(ch)),
            _ => None,
        };
    }

    match scene {
        Scene::Main => match ev.key {
            KeyCode::Char('f') | KeyCode::Char('F') => Some(Action::OpenFood),
            KeyCode::Char('w') | KeyCode::Char('W') => Some(Action::Wash),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::Play),
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::ToggleSleep),
            KeyCode::Char('b') | KeyCode::Char('B') => Some(Action::OpenStore),
            KeyCode::Char('t') | KeyCode::Char('T') | KeyCode::Enter => Some(Action::Talk),
            KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::HelpToggle),
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
            _ => None,
        },
        Scene::Food { .. } | Scene::Store { .. } => match ev.key {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::MenuMove(-1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::MenuMove(1)),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Action::MenuSelect),
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::Back),
            _ => None,
        },
        Scene::Game => match ev.key {
            KeyCode::Left | KeyCode::Char('a') => Some(Action::PlayerLeft),
            KeyCode::Right | KeyCode::Char('d') => Some(Action::PlayerRight),
            KeyCode::Enter => Some(Action::Collect),
            KeyCode::Esc => Some(Action::Back),
            _ => None,
        },
        Scene::Help => match ev.key {
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::HelpToggle),
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
            _ => None,
        },
        Scene::Talk => None,
    }
}
