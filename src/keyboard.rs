//! Scancode decoder and line editor.
//!
//! One byte of set-1 scancode in, zero or more sink bytes out, plus a
//! completed line handed to the dispatcher on Enter. The pipeline has no
//! hardware dependency; the interrupt handler owns the port read and feeds
//! bytes in, which keeps everything here testable with plain inputs.

use crate::console::{Dispatcher, TextSink};
use spin::Mutex;

/// High bit set means key release.
pub const RELEASE_BIT: u8 = 0x80;

/// Scancodes handled before the character table is consulted.
pub const SC_BACKSPACE: u8 = 0x0E;
pub const SC_ENTER: u8 = 0x1C;
pub const SC_CTRL: u8 = 0x1D;
pub const SC_LEFT_SHIFT: u8 = 0x2A;
pub const SC_RIGHT_SHIFT: u8 = 0x36;
pub const SC_ALT: u8 = 0x38;
pub const SC_CAPS_LOCK: u8 = 0x3A;

/// Base (unshifted) characters for set-1 scancodes. Indexed by the raw
/// scancode with the release bit masked off; gaps are zero and produce no
/// output. Extended scancodes (0xE0 prefix bytes, numpad) are deliberately
/// not mapped.
static SCANCODE_TO_ASCII: [u8; 256] = build_scancode_table();

const fn build_scancode_table() -> [u8; 256] {
    // Row by row: digits, qwerty, home row, bottom row, keypad star, space.
    let base: &[u8] =
        b"\x00\x001234567890-=\x08\tqwertyuiop[]\n\x00asdfghjkl;'`\x00\\zxcvbnm,./\x00*\x00 ";
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < base.len() {
        table[i] = base[i];
        i += 1;
    }
    table
}

/// Shifted substitution for the digit row and punctuation. Letters are
/// handled by case folding instead.
const fn shifted(c: u8) -> u8 {
    match c {
        b'1' => b'!',
        b'2' => b'@',
        b'3' => b'#',
        b'4' => b'$',
        b'5' => b'%',
        b'6' => b'^',
        b'7' => b'&',
        b'8' => b'*',
        b'9' => b'(',
        b'0' => b')',
        b'-' => b'_',
        b'=' => b'+',
        b'[' => b'{',
        b']' => b'}',
        b';' => b':',
        b'\'' => b'"',
        b'`' => b'~',
        b'\\' => b'|',
        b',' => b'<',
        b'.' => b'>',
        b'/' => b'?',
        _ => c,
    }
}

/// Modifier flags, mutated only by press/release events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub caps_lock: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const fn new() -> Self {
        Modifiers {
            shift: false,
            caps_lock: false,
            ctrl: false,
            alt: false,
        }
    }
}

pub const LINE_BUF_LEN: usize = 256;

/// Bounded line buffer. Holds at most `LINE_BUF_LEN - 1` characters so a
/// terminator always fits; the bound is checked before every append.
pub struct LineBuffer {
    bytes: [u8; LINE_BUF_LEN],
    len: usize,
}

impl LineBuffer {
    pub const fn new() -> Self {
        LineBuffer {
            bytes: [0; LINE_BUF_LEN],
            len: 0,
        }
    }

    /// Append one character. Returns false (input dropped) when full.
    fn push(&mut self, c: u8) -> bool {
        if self.len < LINE_BUF_LEN - 1 {
            self.bytes[self.len] = c;
            self.len += 1;
            true
        } else {
            false
        }
    }

    /// Drop the last character. Returns false on an empty buffer.
    fn pop(&mut self) -> bool {
        if self.len > 0 {
            self.len -= 1;
            true
        } else {
            false
        }
    }

    fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The decoder only ever appends ASCII, so this cannot fail; the empty
    /// string fallback is belt for the type system.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len]).unwrap_or("")
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        LineBuffer::new()
    }
}

/// The whole input state: modifier flags plus the line under edit.
/// There is exactly one keyboard, so the kernel holds one of these behind
/// a mutex; tests construct their own.
pub struct InputPipeline {
    modifiers: Modifiers,
    line: LineBuffer,
}

impl InputPipeline {
    pub const fn new() -> Self {
        InputPipeline {
            modifiers: Modifiers::new(),
            line: LineBuffer::new(),
        }
    }

    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    pub fn line(&self) -> &LineBuffer {
        &self.line
    }

    /// Advance the state machine by one scancode.
    pub fn handle_scancode(
        &mut self,
        scancode: u8,
        sink: &mut dyn TextSink,
        dispatcher: &mut dyn Dispatcher,
    ) {
        if scancode & RELEASE_BIT != 0 {
            self.handle_release(scancode & !RELEASE_BIT);
            return;
        }

        match scancode {
            SC_LEFT_SHIFT | SC_RIGHT_SHIFT => {
                self.modifiers.shift = true;
                return;
            }
            SC_CTRL => {
                self.modifiers.ctrl = true;
                return;
            }
            SC_ALT => {
                self.modifiers.alt = true;
                return;
            }
            SC_CAPS_LOCK => {
                self.modifiers.caps_lock = !self.modifiers.caps_lock;
                return;
            }
            SC_BACKSPACE => {
                if self.line.pop() {
                    // Erase convention: step back, blank, step back.
                    sink.put_char(0x08);
                    sink.put_char(b' ');
                    sink.put_char(0x08);
                }
                return;
            }
            SC_ENTER => {
                self.submit_line(sink, dispatcher);
                return;
            }
            _ => {}
        }

        let base = SCANCODE_TO_ASCII[scancode as usize];
        if base == 0 {
            // Not in the table: no output, not an error.
            return;
        }

        let c = self.apply_modifiers(base);

        if self.modifiers.ctrl && self.handle_control_chord(c, sink, dispatcher) {
            return;
        }

        if self.line.push(c) {
            sink.put_char(c);
        }
        // A full buffer drops the keystroke silently.
    }

    fn handle_release(&mut self, scancode: u8) {
        match scancode {
            SC_LEFT_SHIFT | SC_RIGHT_SHIFT => self.modifiers.shift = false,
            SC_CTRL => self.modifiers.ctrl = false,
            SC_ALT => self.modifiers.alt = false,
            // Caps lock toggles on press only; other releases are ignored.
            _ => {}
        }
    }

    fn apply_modifiers(&self, base: u8) -> u8 {
        if base.is_ascii_lowercase() {
            // Shift and caps lock cancel each other on letters.
            if self.modifiers.shift != self.modifiers.caps_lock {
                base.to_ascii_uppercase()
            } else {
                base
            }
        } else if self.modifiers.shift {
            shifted(base)
        } else {
            base
        }
    }

    /// Returns true if the chord was intercepted. Anything other than
    /// Ctrl-C and Ctrl-L is not a chord here; the character goes into the
    /// line as typed.
    fn handle_control_chord(
        &mut self,
        c: u8,
        sink: &mut dyn TextSink,
        dispatcher: &mut dyn Dispatcher,
    ) -> bool {
        match c {
            // Ctrl-C: throw the line away
            b'c' | b'C' => {
                sink.write_str("^C\n");
                self.line.clear();
                dispatcher.show_prompt(sink);
                true
            }
            // Ctrl-L: fresh screen, keep nothing
            b'l' | b'L' => {
                sink.clear();
                self.line.clear();
                dispatcher.show_prompt(sink);
                true
            }
            _ => false,
        }
    }

    fn submit_line(&mut self, sink: &mut dyn TextSink, dispatcher: &mut dyn Dispatcher) {
        sink.put_char(b'\n');
        {
            let line = self.line.as_str().trim();
            if !line.is_empty() {
                dispatcher.process_command(line, sink);
            }
        }
        self.line.clear();
        dispatcher.show_prompt(sink);
    }
}

impl Default for InputPipeline {
    fn default() -> Self {
        InputPipeline::new()
    }
}

/// Kernel-wide input state, touched only from the keyboard IRQ call chain.
pub static INPUT: Mutex<InputPipeline> = Mutex::new(InputPipeline::new());

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        out: Vec<u8>,
        clears: usize,
    }

    impl TextSink for RecordingSink {
        fn put_char(&mut self, c: u8) {
            self.out.push(c);
        }

        fn set_color(&mut self, _attr: u8) {}

        fn clear(&mut self) {
            self.clears += 1;
        }
    }

    #[derive(Default)]
    struct RecordingDispatcher {
        commands: Vec<String>,
        prompts: usize,
    }

    impl Dispatcher for RecordingDispatcher {
        fn process_command(&mut self, line: &str, _sink: &mut dyn TextSink) {
            self.commands.push(line.to_string());
        }

        fn show_prompt(&mut self, _sink: &mut dyn TextSink) {
            self.prompts += 1;
        }
    }

    fn feed(pipeline: &mut InputPipeline, scancodes: &[u8]) -> (RecordingSink, RecordingDispatcher) {
        let mut sink = RecordingSink::default();
        let mut dispatcher = RecordingDispatcher::default();
        for &sc in scancodes {
            pipeline.handle_scancode(sc, &mut sink, &mut dispatcher);
        }
        (sink, dispatcher)
    }

    // h e l p scancodes
    const HELP: [u8; 4] = [0x23, 0x12, 0x26, 0x19];

    #[test]
    fn printable_keys_accumulate_in_order() {
        let mut pipeline = InputPipeline::new();
        let (sink, _) = feed(&mut pipeline, &HELP);
        assert_eq!(pipeline.line().as_str(), "help");
        assert_eq!(sink.out, b"help");
    }

    #[test]
    fn enter_dispatches_once_and_resets() {
        let mut pipeline = InputPipeline::new();
        let (_, dispatcher) = feed(&mut pipeline, &[0x23, 0x12, 0x26, 0x19, SC_ENTER]);
        assert_eq!(dispatcher.commands, vec!["help"]);
        assert_eq!(dispatcher.prompts, 1);
        assert!(pipeline.line().is_empty());
    }

    #[test]
    fn enter_on_empty_line_just_redraws_prompt() {
        let mut pipeline = InputPipeline::new();
        let (sink, dispatcher) = feed(&mut pipeline, &[SC_ENTER]);
        assert!(dispatcher.commands.is_empty());
        assert_eq!(dispatcher.prompts, 1);
        assert_eq!(sink.out, b"\n");
    }

    #[test]
    fn shift_digit_produces_symbol() {
        let mut pipeline = InputPipeline::new();
        // shift down, '1', shift up, enter
        let (_, dispatcher) =
            feed(&mut pipeline, &[SC_LEFT_SHIFT, 0x02, SC_LEFT_SHIFT | RELEASE_BIT, SC_ENTER]);
        assert_eq!(dispatcher.commands, vec!["!"]);
    }

    #[test]
    fn full_shift_symbol_row() {
        let digits: [u8; 10] = [0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B];
        let mut pipeline = InputPipeline::new();
        let mut sink = RecordingSink::default();
        let mut dispatcher = RecordingDispatcher::default();
        pipeline.handle_scancode(SC_LEFT_SHIFT, &mut sink, &mut dispatcher);
        for sc in digits {
            pipeline.handle_scancode(sc, &mut sink, &mut dispatcher);
        }
        assert_eq!(pipeline.line().as_str(), "!@#$%^&*()");
    }

    #[test]
    fn shift_applies_to_letters_and_punctuation() {
        let mut pipeline = InputPipeline::new();
        // shift down, 'a', '/', shift up, 'a'
        let (_, _) = feed(
            &mut pipeline,
            &[SC_LEFT_SHIFT, 0x1E, 0x35, SC_LEFT_SHIFT | RELEASE_BIT, 0x1E],
        );
        assert_eq!(pipeline.line().as_str(), "A?a");
    }

    #[test]
    fn caps_lock_toggles_letter_case_only() {
        let mut pipeline = InputPipeline::new();
        // caps on, 'a', '1', caps off, 'a'
        let (_, _) = feed(&mut pipeline, &[SC_CAPS_LOCK, 0x1E, 0x02, SC_CAPS_LOCK, 0x1E]);
        assert_eq!(pipeline.line().as_str(), "A1a");
    }

    #[test]
    fn shift_xor_caps_on_letters() {
        let mut pipeline = InputPipeline::new();
        // caps on, shift down, 'a' -> both active cancels back to lowercase
        let (_, _) = feed(&mut pipeline, &[SC_CAPS_LOCK, SC_LEFT_SHIFT, 0x1E]);
        assert_eq!(pipeline.line().as_str(), "a");
    }

    #[test]
    fn release_events_clear_modifiers() {
        let mut pipeline = InputPipeline::new();
        let (_, _) = feed(
            &mut pipeline,
            &[SC_LEFT_SHIFT, SC_CTRL, SC_ALT,
              SC_LEFT_SHIFT | RELEASE_BIT, SC_CTRL | RELEASE_BIT, SC_ALT | RELEASE_BIT],
        );
        assert_eq!(*pipeline.modifiers(), Modifiers::new());
    }

    #[test]
    fn right_shift_behaves_like_left() {
        let mut pipeline = InputPipeline::new();
        let (_, _) = feed(&mut pipeline, &[SC_RIGHT_SHIFT, 0x0B, SC_RIGHT_SHIFT | RELEASE_BIT]);
        assert_eq!(pipeline.line().as_str(), ")");
    }

    #[test]
    fn backspace_on_empty_buffer_is_a_no_op() {
        let mut pipeline = InputPipeline::new();
        let (sink, _) = feed(&mut pipeline, &[SC_BACKSPACE]);
        assert!(sink.out.is_empty());
        assert!(pipeline.line().is_empty());
    }

    #[test]
    fn backspace_erases_last_character() {
        let mut pipeline = InputPipeline::new();
        let (sink, _) = feed(&mut pipeline, &[0x1E, 0x30, SC_BACKSPACE]);
        assert_eq!(pipeline.line().as_str(), "a");
        assert_eq!(sink.out, b"ab\x08 \x08");
    }

    #[test]
    fn ctrl_c_discards_line_without_dispatch() {
        let mut pipeline = InputPipeline::new();
        let (sink, dispatcher) = feed(&mut pipeline, &[0x23, 0x12, SC_CTRL, 0x2E]);
        assert!(dispatcher.commands.is_empty());
        assert_eq!(dispatcher.prompts, 1);
        assert!(pipeline.line().is_empty());
        assert!(sink.out.ends_with(b"^C\n"));
    }

    #[test]
    fn ctrl_l_clears_screen_and_line() {
        let mut pipeline = InputPipeline::new();
        let (sink, dispatcher) = feed(&mut pipeline, &[0x23, SC_CTRL, 0x26]);
        assert_eq!(sink.clears, 1);
        assert_eq!(dispatcher.prompts, 1);
        assert!(pipeline.line().is_empty());
    }

    #[test]
    fn unhandled_ctrl_chord_buffers_the_character() {
        let mut pipeline = InputPipeline::new();
        // ctrl held, 'x' -> only c and l are intercepted, so the
        // character lands in the buffer and echoes as typed
        let (sink, _) = feed(&mut pipeline, &[SC_CTRL, 0x2D]);
        assert_eq!(pipeline.line().as_str(), "x");
        assert_eq!(sink.out, b"x");
    }

    #[test]
    fn overflow_drops_input_silently() {
        let mut pipeline = InputPipeline::new();
        let mut sink = RecordingSink::default();
        let mut dispatcher = RecordingDispatcher::default();
        for _ in 0..LINE_BUF_LEN + 10 {
            pipeline.handle_scancode(0x1E, &mut sink, &mut dispatcher); // 'a'
        }
        assert_eq!(pipeline.line().len(), LINE_BUF_LEN - 1);
        assert_eq!(sink.out.len(), LINE_BUF_LEN - 1);
    }

    #[test]
    fn unmapped_scancodes_produce_no_output() {
        let mut pipeline = InputPipeline::new();
        // 0x3B is F1: beyond the character table's populated range
        let (sink, dispatcher) = feed(&mut pipeline, &[0x3B, 0x60, 0x7F]);
        assert!(sink.out.is_empty());
        assert!(dispatcher.commands.is_empty());
        assert!(pipeline.line().is_empty());
    }

    #[test]
    fn enter_trims_whitespace_before_dispatch() {
        let mut pipeline = InputPipeline::new();
        // space, 'h', 'i', space, enter
        let (_, dispatcher) = feed(&mut pipeline, &[0x39, 0x23, 0x17, 0x39, SC_ENTER]);
        assert_eq!(dispatcher.commands, vec!["hi"]);
    }

    #[test]
    fn whitespace_only_line_is_not_dispatched() {
        let mut pipeline = InputPipeline::new();
        let (_, dispatcher) = feed(&mut pipeline, &[0x39, 0x39, SC_ENTER]);
        assert!(dispatcher.commands.is_empty());
        assert_eq!(dispatcher.prompts, 1);
    }
}
