//! Encoder-driven menus.
//!
//! Three primitives cover every screen:
//!
//! - [`MenuStateMachine::select_option`]: labels laid out on the LCD, the
//!   selected one shown in `[brackets]`, the rest with the brackets blanked.
//! - [`MenuStateMachine::pick_integer`]: a clamped, stepped number.
//! - [`MenuStateMachine::confirm`]: a question with `[Yes]` / `[No]`.
//!
//! All of them diff the encoder against a baseline and move one step per
//! poll in the direction of the change, regardless of how far the knob
//! turned.  They only see a [`Console`], never actuators.

use core::fmt::{self, Write};

use heapless::String;

use super::ports::{Console, Position};
use crate::error::{Error, Result};

/// One rendered LCD line.
pub type Line = String<32>;

/// Longest confirmation prompt that still leaves a column free.
pub const CONFIRM_LABEL_MAX: usize = 15;

/// Format into a [`Line`], truncating on overflow.
pub fn format_line(args: fmt::Arguments<'_>) -> Line {
    let mut line = Line::new();
    let _ = line.write_fmt(args);
    line
}

/// A selectable entry: returned key, bracketed label, screen position.
#[derive(Debug, Clone, Copy)]
pub struct MenuOption<'a, K> {
    pub key: K,
    pub label: &'a str,
    pub position: Position,
}

impl<'a, K> MenuOption<'a, K> {
    pub const fn new(key: K, label: &'a str, position: Position) -> Self {
        Self {
            key,
            label,
            position,
        }
    }
}

/// Label with the selection brackets replaced by spaces, so the text does
/// not shift when the highlight moves.
pub fn unhighlighted(label: &str) -> Line {
    let mut out = Line::new();
    for c in label.chars() {
        let c = if c == '[' || c == ']' { ' ' } else { c };
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Move `index` one step in `dir`, wrapping at both ends.
pub fn wrap_index(index: usize, dir: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    if dir > 0 {
        (index + 1) % len
    } else if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

/// Move `value` one `step` in `dir`, clamped to `min..=max`.
pub fn step_value(value: i32, dir: i32, step: i32, min: i32, max: i32) -> i32 {
    value.saturating_add(dir.signum().saturating_mul(step)).clamp(min, max)
}

/// Menu primitives over any [`Console`].
pub struct MenuStateMachine {
    poll_ms: u32,
}

impl MenuStateMachine {
    pub fn new(poll_ms: u32) -> Self {
        Self {
            poll_ms: poll_ms.max(1),
        }
    }

    /// Poll until the button is up.
    pub fn wait_release<C: Console + ?Sized>(&self, console: &mut C) -> Result<()> {
        while console.button_pressed()? {
            console.idle(self.poll_ms)?;
        }
        Ok(())
    }

    /// Let the operator pick one of `options`; returns its key on a press.
    ///
    /// The first option starts selected.  With `clear` false the options
    /// are drawn over whatever is already on screen.
    pub fn select_option<C, K>(
        &self,
        console: &mut C,
        options: &[MenuOption<'_, K>],
        clear: bool,
    ) -> Result<K>
    where
        C: Console + ?Sized,
        K: Copy,
    {
        if options.is_empty() {
            return Err(Error::Config("menu has no options"));
        }
        if clear {
            console.clear()?;
        }
        for (i, opt) in options.iter().enumerate() {
            if i == 0 {
                console.print(opt.label, opt.position)?;
            } else {
                console.print(&unhighlighted(opt.label), opt.position)?;
            }
        }

        let mut index = 0;
        let mut baseline = console.position()?;
        loop {
            if console.button_pressed()? {
                return Ok(options[index].key);
            }
            let pos = console.position()?;
            if pos != baseline {
                let dir = (pos - baseline).signum();
                let old = &options[index];
                console.print(&unhighlighted(old.label), old.position)?;
                index = wrap_index(index, dir, options.len());
                let new = &options[index];
                console.print(new.label, new.position)?;
                baseline = pos;
            }
            console.idle(self.poll_ms)?;
        }
    }

    /// Pick an integer in `min..=max` by `step`, starting at `initial`.
    ///
    /// `label` goes on the first line, `render(value)` on the second.
    #[allow(clippy::too_many_arguments)]
    pub fn pick_integer<C, F>(
        &self,
        console: &mut C,
        label: &str,
        render: F,
        initial: i32,
        min: i32,
        max: i32,
        step: i32,
    ) -> Result<i32>
    where
        C: Console + ?Sized,
        F: Fn(i32) -> Line,
    {
        let value_at = Position::new(0, 1);
        let mut value = initial.clamp(min, max);
        console.clear()?;
        console.print(label, Position::new(0, 0))?;
        console.print(&render(value), value_at)?;

        self.wait_release(console)?;

        let mut baseline = console.position()?;
        loop {
            if console.button_pressed()? {
                return Ok(value);
            }
            let pos = console.position()?;
            if pos != baseline {
                value = step_value(value, pos - baseline, step, min, max);
                console.print(&render(value), value_at)?;
                baseline = pos;
            }
            console.idle(self.poll_ms)?;
        }
    }

    /// Ask a yes/no question.  `label` is cut to [`CONFIRM_LABEL_MAX`] chars.
    pub fn confirm<C: Console + ?Sized>(&self, console: &mut C, label: &str) -> Result<bool> {
        console.clear()?;
        let cut = label
            .char_indices()
            .nth(CONFIRM_LABEL_MAX)
            .map_or(label, |(i, _)| &label[..i]);
        console.print(cut, Position::new(0, 0))?;

        self.wait_release(console)?;

        let options = [
            MenuOption::new(true, "[Yes]", Position::new(0, 1)),
            MenuOption::new(false, "[No]", Position::new(12, 1)),
        ];
        self.select_option(console, &options, false)
    }
}
