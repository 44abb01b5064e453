use bloop::catalog::{FOOD_ITEMS, HATS};
use bloop::minigame::{MiniGame, Phase, CATCH_REACH};
use bloop::model::{InventoryItem, Mood, SimulationState};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell {
                bg,
                ..Cell::default()
            };
        }
    }
}

/// The real screen. `cur` is drawn into each frame; `present` sends only the cells that
/// differ from what is already on screen.
pub(crate) struct Terminal {
    out: io::Stdout,
    shown: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            shown: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Starts over with blank buffers when the window size changed since the last frame.
    pub(crate) fn fit_to_window(&mut self) -> anyhow::Result<()> {
        let (cols, rows) = terminal::size()?;
        if (cols, rows) != (self.cur.w, self.cur.h) {
            self.shown = CellBuffer::new(cols, rows);
            self.cur = CellBuffer::new(cols, rows);
            queue!(self.out, Clear(ClearType::All))?;
        }
        Ok(())
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut pen: Option<(Color, Color)> = None;
        for (i, (c, old)) in self.cur.cells.iter().zip(&self.shown.cells).enumerate() {
            if c == old {
                continue;
            }
            let x = (i % self.cur.w as usize) as u16;
            let y = (i / self.cur.w as usize) as u16;
            queue!(self.out, cursor::MoveTo(x, y))?;
            if pen != Some((c.fg, c.bg)) {
                queue!(self.out, SetForegroundColor(c.fg), SetBackgroundColor(c.bg))?;
                pen = Some((c.fg, c.bg));
            }
            queue!(self.out, Print(c.ch))?;
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.shown.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Primitives
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

fn bar(value01: f32, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f32 + 0.5) as usize;
    let mut s = String::new();
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

pub(crate) struct Rect {
    pub(crate) x: u16,
    pub(crate) y: u16,
    pub(crate) w: u16,
    pub(crate) h: u16,
}

pub(crate) fn centered(buf: &CellBuffer, w: u16, h: u16) -> Rect {
    let w = w.min(buf.w.saturating_sub(2)).max(4);
    let h = h.min(buf.h.saturating_sub(2)).max(3);
    Rect {
        x: buf.w.saturating_sub(w) / 2,
        y: buf.h.saturating_sub(h) / 2,
        w,
        h,
    }
}

pub(crate) fn draw_box(buf: &mut CellBuffer, r: &Rect, title: &str, fg: Color) {
    let bg = Color::Black;
    let edge = |ch| Cell { ch, fg, bg };
    for y in r.y..r.y + r.h {
        for x in r.x..r.x + r.w {
            buf.set(x, y, Cell { ch: ' ', fg, bg });
        }
    }
    for x in r.x..r.x + r.w {
        buf.set(x, r.y, edge('─'));
        buf.set(x, r.y + r.h - 1, edge('─'));
    }
    for y in r.y..r.y + r.h {
        buf.set(r.x, y, edge('│'));
        buf.set(r.x + r.w - 1, y, edge('│'));
    }
    buf.set(r.x, r.y, edge('┌'));
    buf.set(r.x + r.w - 1, r.y, edge('┐'));
    buf.set(r.x, r.y + r.h - 1, edge('└'));
    buf.set(r.x + r.w - 1, r.y + r.h - 1, edge('┘'));
    draw_text(buf, r.x + 2, r.y, &format!(" {title} "), Color::Yellow, bg);
}

pub(crate) fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let r = centered(buf, 60, 18);
    draw_box(buf, &r, title, Color::White);
    for (i, line) in body.lines().enumerate() {
        let y = r.y + 2 + i as u16;
        if y >= r.y + r.h - 1 {
            break;
        }
        draw_text(buf, r.x + 2, y, line, Color::White, Color::Black);
    }
}

/* -----------------------------
   Status panel
------------------------------ */

fn mood_color(mood: Mood, sleeping: bool, color: bool) -> Color {
    if !color {
        return Color::White;
    }
    if sleeping {
        return Color::Rgb {
            r: 120,
            g: 110,
            b: 220,
        };
    }
    match mood {
        Mood::Happy => Color::Rgb {
            r: 140,
            g: 240,
            b: 200,
        },
        Mood::Sad => Color::Rgb {
            r: 130,
            g: 150,
            b: 220,
        },
        Mood::Angry => Color::Rgb {
            r: 255,
            g: 90,
            b: 90,
        },
        Mood::Sleepy => Color::Rgb {
            r: 160,
            g: 140,
            b: 255,
        },
        Mood::Eating => Color::Rgb {
            r: 255,
            g: 200,
            b: 120,
        },
        Mood::Washing => Color::Rgb {
            r: 120,
            g: 200,
            b: 255,
        },
        Mood::Listening => Color::Rgb {
            r: 240,
            g: 170,
            b: 255,
        },
    }
}

pub(crate) fn status_panel(buf: &mut CellBuffer, st: &SimulationState, mood: Mood) {
    let bg = Color::Black;
    let fg = Color::White;

    let shown = if st.is_sleeping {
        "Zzz".to_string()
    } else {
        format!("{mood:?}")
    };
    let title = format!(
        "Bloop  |  Lv {}  |  {} coins  |  {}",
        st.level, st.coins, shown
    );
    draw_text(buf, 1, 0, &title, fg, bg);

    let s = st.stats;
    let lines = [
        ("Hunger", s.hunger),
        ("Energy", s.energy),
        ("Happy ", s.happiness),
        ("Hyg   ", s.hygiene),
    ];
    for (i, (name, val)) in lines.iter().enumerate() {
        let warn = *val < 20.0;
        let line = format!("{name}: {} {:>5.1}", bar(*val / 100.0, 14), val);
        draw_text(
            buf,
            1,
            2 + i as u16,
            &line,
            if warn { Color::Red } else { fg },
            bg,
        );
    }

    let xp_into_level = st.experience % 100;
    let xp = format!("XP    : {} {:>3}/100", bar(xp_into_level as f32 / 100.0, 14), xp_into_level);
    draw_text(buf, 1, 7, &xp, fg, bg);
}

/* -----------------------------
   Pet
------------------------------ */

fn hat_glyph(hat: Option<&str>) -> Option<&'static str> {
    match hat? {
        "crown" => Some("  \\^^^^/  "),
        "propeller" => Some("  --+--   "),
        "wizard" => Some("    /\\    "),
        _ => None,
    }
}

pub(crate) fn draw_pet(
    buf: &mut CellBuffer,
    st: &SimulationState,
    mood: Mood,
    cx: i32,
    cy: i32,
    color: bool,
) {
    let bg = Color::Black;
    let fg = mood_color(mood, st.is_sleeping, color);

    let eyes = if st.is_sleeping {
        "  -   -  "
    } else {
        match mood {
            Mood::Angry => "  >   <  ",
            Mood::Sad => "  ;   ;  ",
            Mood::Sleepy => "  _   _  ",
            Mood::Washing => "  ^   ^  ",
            Mood::Listening => "  O   O  ",
            Mood::Happy | Mood::Eating => "  o   o  ",
        }
    };
    let mouth = if st.is_sleeping {
        "    z    "
    } else {
        match mood {
            Mood::Happy | Mood::Listening => "  \\___/  ",
            Mood::Sad | Mood::Angry => "  /---\\  ",
            Mood::Sleepy => "   ---   ",
            Mood::Eating => "  (nom)  ",
            Mood::Washing => "  ~~~~~  ",
        }
    };

    let body = [
        "   _____   ".to_string(),
        format!(" /{eyes}\\ "),
        format!("|{mouth}  |"),
        " \\_______/ ".to_string(),
        "   /   \\   ".to_string(),
    ];

    let x0 = cx - 5;
    let y0 = cy - 2;
    let mut put = |line: &str, row: i32, col: Color| {
        if row < 0 || row >= buf.h as i32 {
            return;
        }
        for (i, ch) in line.chars().enumerate() {
            let x = x0 + i as i32;
            if ch != ' ' && x >= 0 && x < buf.w as i32 {
                buf.set(x as u16, row as u16, Cell { ch, fg: col, bg });
            }
        }
    };

    if let Some(h) = hat_glyph(st.hat.as_deref()) {
        put(h, y0 - 1, if color { Color::Yellow } else { Color::White });
    }
    for (i, line) in body.iter().enumerate() {
        put(line, y0 + i as i32, fg);
    }
    if st.is_washing {
        put(" o  °  o  °", y0 - 2, Color::Cyan);
    }
}

pub(crate) fn speech_bubble(buf: &mut CellBuffer, text: &str, cx: i32, y: i32) {
    let mut line = text.to_string();
    if line.chars().count() > 40 {
        line = line.chars().take(39).collect::<String>() + "…";
    }
    let line = format!("« {line} »");
    let x = (cx - line.chars().count() as i32 / 2).max(0) as u16;
    if y >= 0 {
        draw_text(buf, x, y as u16, &line, Color::White, Color::Black);
    }
}

/* -----------------------------
   Menus
------------------------------ */

pub(crate) fn draw_menu(
    buf: &mut CellBuffer,
    title: &str,
    items: &[InventoryItem],
    cursor: usize,
    st: &SimulationState,
) {
    let r = centered(buf, 44, items.len() as u16 + 5);
    draw_box(buf, &r, title, Color::White);
    for (i, item) in items.iter().enumerate() {
        let owned = st.wardrobe.contains(item.id);
        let worn = st.hat.as_deref() == Some(item.id);
        let price = if worn {
            "worn".to_string()
        } else if owned {
            "owned".to_string()
        } else {
            format!("{} c", item.cost)
        };
        let marker = if i == cursor { '>' } else { ' ' };
        let line = format!("{marker} {:<24}{price:>10}", item.display_name);
        let fg = if i == cursor {
            Color::Yellow
        } else if !owned && !st.can_afford(item.cost) {
            Color::DarkGrey
        } else {
            Color::White
        };
        draw_text(buf, r.x + 2, r.y + 2 + i as u16, &line, fg, Color::Black);
    }
}

pub(crate) fn food_menu(buf: &mut CellBuffer, cursor: usize, st: &SimulationState) {
    draw_menu(buf, "Cosmic Kitchen", &FOOD_ITEMS, cursor, st);
}

pub(crate) fn store_menu(buf: &mut CellBuffer, cursor: usize, st: &SimulationState) {
    draw_menu(buf, "Alien Boutique", &HATS, cursor, st);
}

/* -----------------------------
   Mini-game
------------------------------ */

pub(crate) fn draw_minigame(buf: &mut CellBuffer, game: &MiniGame, color: bool) {
    let r = centered(buf, 52, 24);
    draw_box(buf, &r, "Star Catcher", Color::White);

    // a shrunken terminal can leave no play rows at all; everything then lands on one line
    let inner_w = r.w.saturating_sub(2).max(1) as f32;
    let inner_h = r.h.saturating_sub(4).max(1) as f32;
    let col = |x: f32| r.x + 1 + ((x / 100.0) * (inner_w - 1.0)).round().clamp(0.0, inner_w - 1.0) as u16;
    let row = |y: f32| r.y + 2 + ((y / 100.0) * (inner_h - 1.0)).round() as u16;

    let hud = format!("score {:>4}   time {:>2}s", game.score(), game.time_left());
    draw_text(buf, r.x + 2, r.y + 1, &hud, Color::White, Color::Black);

    let star = if color { Color::Yellow } else { Color::White };
    for o in game.objects() {
        if o.y < 0.0 {
            continue;
        }
        buf.set(col(o.x), row(o.y), Cell { ch: '*', fg: star, bg: Color::Black });
    }

    // basket spans the catch reach on either side
    let basket_y = row(90.0);
    let reach = CATCH_REACH - 1.0;
    let left = col((game.player_position() - reach).max(0.0));
    let right = col((game.player_position() + reach).min(100.0));
    let basket = if color { Color::Green } else { Color::White };
    for x in left..=right {
        buf.set(x, basket_y, Cell { ch: '=', fg: basket, bg: Color::Black });
    }

    let hint = match game.phase() {
        Phase::Running => "←/→ move | esc give up".to_string(),
        Phase::Finished => format!(
            "Time! {} points = {} coins | enter collect",
            game.score(),
            game.earnings()
        ),
        Phase::Idle => String::new(),
    };
    draw_text(buf, r.x + 2, r.y + r.h - 2, &hint, Color::White, Color::Black);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn row_text(buf: &CellBuffer, y: u16) -> String {
        (0..buf.w).map(|x| buf.cells[buf.idx(x, y)].ch).collect()
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0.5, 4), "[██  ]");
        assert_eq!(bar(2.0, 2), "[██]");
    }

    #[test]
    fn status_panel_shows_coins_and_level() {
        let mut buf = CellBuffer::new(80, 10);
        let st = SimulationState::new_default(Utc::now());
        status_panel(&mut buf, &st, Mood::Happy);
        let top = row_text(&buf, 0);
        assert!(top.contains("Lv 1"));
        assert!(top.contains("100 coins"));
        assert!(top.contains("Happy"));
    }

    #[test]
    fn drawing_off_screen_is_harmless() {
        let mut buf = CellBuffer::new(10, 4);
        let st = SimulationState::new_default(Utc::now());
        draw_pet(&mut buf, &st, Mood::Sad, -20, 50, true);
        draw_pet(&mut buf, &st, Mood::Sad, 5, 2, false);
        speech_bubble(&mut buf, "a very long sentence that keeps going and going", 5, -1);
    }

    #[test]
    fn game_board_survives_a_tiny_terminal() {
        let mut game = MiniGame::new(4);
        game.start();
        game.advance(Duration::from_millis(2_000));
        assert!(!game.objects().is_empty());
        for (w, h) in [(30, 4), (30, 5), (3, 2), (0, 0)] {
            let mut buf = CellBuffer::new(w, h);
            draw_minigame(&mut buf, &game, true);
        }
    }
}
