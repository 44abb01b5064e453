use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::render::{
    draw_center_box, draw_minigame, draw_pet, draw_text, food_menu, speech_bubble,
    status_panel, store_menu, Terminal,
};
use bloop::catalog::{FOOD_ITEMS, HATS};
use bloop::clock::Ticker;
use bloop::config::{load_settings, save_settings_atomic, Args, Paths, Settings};
use bloop::error::PetError;
use bloop::minigame::Phase;
use bloop::session::{Session, SessionOptions};
use bloop::sim::WashStart;
use bloop::storage::JsonFileStore;
use bloop::voice::{KeyboardVoice, Microphone, UnavailableVoice, VoiceBackend};
use crossterm::style::Color;
use std::time::{Duration, Instant};
use tracing::info;

const NUDGE: f32 = 5.0;
const TOAST_FOR: Duration = Duration::from_secs(3);
const TALK_MAX: usize = 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Scene {
    Main,
    Food { cursor: usize },
    Store { cursor: usize },
    Talk,
    Game,
    Help,
}

pub(crate) struct App {
    settings: Settings,
    session: Session<JsonFileStore>,
    mic: Option<Microphone>,
    term: Terminal,
    scene: Scene,
    talk_edit: String,
    toast: Option<(String, Instant)>,
    should_quit: bool,
}

impl App {
    fn init(args: &Args, paths: &Paths) -> anyhow::Result<Self> {
        if !paths.settings_path.exists() {
            save_settings_atomic(&paths.settings_path, &Settings::default())?;
        }
        let settings = load_settings(&paths.settings_path).with_overrides(args);

        let (voice, mic): (Box<dyn VoiceBackend>, Option<Microphone>) = if settings.voice_enabled
        {
            let (v, m) = KeyboardVoice::new();
            (Box::new(v), Some(m))
        } else {
            (Box::new(UnavailableVoice), None)
        };

        let session = Session::open(
            JsonFileStore::in_dir(&paths.data_dir),
            voice,
            SessionOptions {
                seed: settings.seed,
                catch_up_offline: settings.catch_up_offline,
                ..SessionOptions::default()
            },
            chrono::Utc::now(),
        );

        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            session,
            mic,
            term,
            scene: Scene::Main,
            talk_edit: String::new(),
            toast: None,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut ticker = Ticker::start(Duration::from_millis(250));

        while !self.should_quit {
            self.term.fit_to_window()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(&self.scene, ev) {
                    self.apply(action);
                }
                if self.should_quit {
                    break;
                }
            }

            self.session.advance(ticker.lap());
            self.render_frame()?;
            ticker.pace(frame_dt);
        }
        Ok(())
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::HelpToggle => {
                self.scene = match self.scene {
                    Scene::Help => Scene::Main,
                    _ => Scene::Help,
                };
            }
            Action::Back => self.back(),
            Action::OpenFood => self.scene = Scene::Food { cursor: 0 },
            Action::OpenStore => self.scene = Scene::Store { cursor: 0 },
            Action::ToggleSleep => self.session.toggle_sleep(),
            Action::Wash => {
                if self.session.start_wash() == WashStart::AlreadyWashing {
                    self.say("Already in the tub!");
                }
            }
            Action::Play => {
                self.session.start_minigame();
                self.scene = Scene::Game;
            }
            Action::Talk => match self.session.begin_listening() {
                Ok(()) => {
                    self.talk_edit.clear();
                    self.scene = Scene::Talk;
                }
                Err(e) => self.say(&e.to_string()),
            },
            Action::TalkChar(ch) => {
                if self.talk_edit.chars().count() < TALK_MAX {
                    self.talk_edit.push(ch);
                }
            }
            Action::TalkBackspace => {
                self.talk_edit.pop();
            }
            Action::TalkSubmit => {
                let text = self.talk_edit.trim().to_string();
                match &self.mic {
                    Some(mic) if !text.is_empty() => {
                        mic.submit(&text);
                    }
                    Some(mic) => mic.hang_up(),
                    None => {}
                }
                self.scene = Scene::Main;
            }
            Action::MenuMove(delta) => {
                let len = match self.scene {
                    Scene::Food { .. } => FOOD_ITEMS.len(),
                    Scene::Store { .. } => HATS.len(),
                    _ => return,
                };
                if let Scene::Food { cursor } | Scene::Store { cursor } = &mut self.scene {
                    *cursor = wrap(*cursor, delta, len);
                }
            }
            Action::MenuSelect => self.menu_select(),
            Action::PlayerLeft => {
                if let Some(game) = self.session.minigame_mut() {
                    game.nudge_player(-NUDGE);
                }
            }
            Action::PlayerRight => {
                if let Some(game) = self.session.minigame_mut() {
                    game.nudge_player(NUDGE);
                }
            }
            Action::Collect => match self.session.collect_minigame() {
                Ok(earned) => {
                    self.say(&format!("+{earned} coins"));
                    self.scene = Scene::Main;
                }
                Err(PetError::GameNotFinished) => {}
                Err(e) => {
                    self.say(&e.to_string());
                    self.scene = Scene::Main;
                }
            },
        }
    }

    fn back(&mut self) {
        match self.scene {
            Scene::Talk => {
                if let Some(mic) = &self.mic {
                    mic.hang_up();
                }
                self.session.stop_listening();
            }
            Scene::Game => {
                let finished = self
                    .session
                    .minigame()
                    .is_some_and(|g| g.phase() == Phase::Finished);
                // a finished round is paid out on the way out rather than forfeited
                if finished {
                    self.apply(Action::Collect);
                    return;
                }
                self.session.close_minigame();
            }
            _ => {}
        }
        self.scene = Scene::Main;
    }

    fn menu_select(&mut self) {
        let result = match self.scene {
            Scene::Food { cursor } => {
                let item = &FOOD_ITEMS[cursor];
                self.session.feed(item.id).map(|_| {
                    self.scene = Scene::Main;
                })
            }
            Scene::Store { cursor } => {
                let item = &HATS[cursor];
                let st = self.session.state();
                if st.hat.as_deref() == Some(item.id) {
                    self.session.equip(None)
                } else if st.wardrobe.contains(item.id) {
                    self.session.equip(Some(item.id))
                } else {
                    self.session.purchase(item.id)
                }
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            self.say(&e.to_string());
        }
    }

    fn say(&mut self, msg: &str) {
        self.toast = Some((msg.to_string(), Instant::now() + TOAST_FOR));
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let color = self.settings.enable_color;
        let buf = &mut self.term.cur;
        buf.clear(Color::Black);

        let st = self.session.state();
        let mood = self.session.mood();
        status_panel(buf, st, mood);

        let cx = buf.w as i32 / 2;
        let cy = buf.h as i32 / 2 + 1;
        draw_pet(buf, st, mood, cx, cy, color);

        if let Some(speech) = self.session.last_speech() {
            speech_bubble(buf, &speech.text, cx, cy - 6);
        }

        match &self.scene {
            Scene::Food { cursor } => food_menu(buf, *cursor, st),
            Scene::Store { cursor } => store_menu(buf, *cursor, st),
            Scene::Game => {
                if let Some(game) = self.session.minigame() {
                    draw_minigame(buf, game, color);
                }
            }
            Scene::Talk => {
                let mut preview = self.talk_edit.clone();
                preview.push('_');
                draw_text(
                    buf,
                    2,
                    buf.h.saturating_sub(3),
                    &format!("Bloop is listening: {preview}"),
                    Color::White,
                    Color::Black,
                );
            }
            Scene::Help => draw_center_box(
                buf,
                "How to play",
                "Keep Bloop fed, clean and rested.\n\
                 Stats drain a little every second.\n\n\
                 F Feed: spend coins on food.\n\
                 W Wash: three seconds in the tub, fully clean.\n\
                 S Sleep: toggle rest to regain energy.\n\
                 P Play: catch falling stars for coins and XP.\n\
                 B Boutique: buy and wear hats.\n\
                 T Talk: type something and Bloop repeats it.\n\n\
                 Esc or H to close help.",
            ),
            Scene::Main => {}
        }

        if let Some((msg, until)) = &self.toast {
            if Instant::now() < *until {
                let x = (buf.w as usize).saturating_sub(msg.chars().count()) as u16 / 2;
                draw_text(buf, x, buf.h.saturating_sub(2), msg, Color::Yellow, Color::Black);
            } else {
                self.toast = None;
            }
        }

        let help = match self.scene {
            Scene::Main => {
                "q quit | f feed | w wash | s sleep | p play | b boutique | t talk | h help"
            }
            Scene::Food { .. } | Scene::Store { .. } => "↑↓ select | enter buy | esc back",
            Scene::Talk => "type | enter send | esc cancel",
            Scene::Game => "←/→ move | enter collect | esc close",
            Scene::Help => "esc back | q quit",
        };
        draw_text(buf, 1, buf.h.saturating_sub(1), help, Color::White, Color::Black);

        self.term.present()?;
        Ok(())
    }

    fn finish(mut self) -> anyhow::Result<()> {
        self.term.end()?;
        let store = self.session.shutdown();
        info!(path = %store.path().display(), "saved");
        Ok(())
    }
}

fn wrap(cursor: usize, delta: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (cursor as i64 + delta as i64).rem_euclid(len as i64) as usize
}

pub(crate) fn run(args: &Args, paths: &Paths) -> anyhow::Result<()> {
    let mut app = App::init(args, paths)?;
    let result = app.run();
    app.finish()?;
    result
}
