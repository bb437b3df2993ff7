use core::fmt;

/// Character sink consumed by the input pipeline and the shell.
///
/// The VGA writer is the only implementation in the kernel; tests use
/// recording fakes. Writes always succeed from the caller's perspective.
pub trait TextSink {
    fn put_char(&mut self, c: u8);

    fn write_str(&mut self, s: &str) {
        for b in s.bytes() {
            self.put_char(b);
        }
    }

    /// Set the color attribute byte used for subsequent output.
    fn set_color(&mut self, attr: u8);

    /// Blank the screen and home the cursor (Ctrl-L, `clear`).
    fn clear(&mut self);
}

/// Receiver of completed command lines.
///
/// The pipeline hands over a trimmed read-only snapshot of the line buffer,
/// never a handle into the live buffer.
pub trait Dispatcher {
    fn process_command(&mut self, line: &str, sink: &mut dyn TextSink);

    fn show_prompt(&mut self, sink: &mut dyn TextSink);
}

/// Adapter so `write!` can target any sink.
pub struct Fmt<'a>(pub &'a mut dyn TextSink);

impl fmt::Write for Fmt<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        TextSink::write_str(self.0, s);
        Ok(())
    }
}
