//! Built-in command shell.
//!
//! The shell is the dispatch end of the input pipeline: it receives one
//! trimmed line per Enter, tokenizes it, and runs the matching built-in.
//! All output goes through the caller's sink, which is the VGA writer in
//! the kernel and a recording fake in tests.

use crate::allocator;
use crate::console::{Dispatcher, Fmt, TextSink};
use crate::constants::keyboard::{CMD_RESET_CPU, STATUS_COMMAND_PORT, STATUS_INPUT_BUFFER_FULL};
use crate::port::{Hardware, PortBus};
use crate::vga_buffer::{Color, ColorCode, DEFAULT_COLOR};
use core::fmt::Write;
use spin::Mutex;

const MAX_ARGS: usize = 16;

/// Command function type
type CommandFn = fn(&mut Shell, &[&str], &mut dyn TextSink);

/// Command registry entry
struct Command {
    name: &'static str,
    help: &'static str,
    func: CommandFn,
}

/// Command dispatch table - add new commands here
const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        help: "Show this help message",
        func: cmd_help,
    },
    Command {
        name: "clear",
        help: "Clear the screen",
        func: cmd_clear,
    },
    Command {
        name: "echo",
        help: "Echo arguments to the screen",
        func: cmd_echo,
    },
    Command {
        name: "meminfo",
        help: "Show heap usage",
        func: cmd_meminfo,
    },
    Command {
        name: "memtest",
        help: "Exercise the bump allocator",
        func: cmd_memtest,
    },
    Command {
        name: "color",
        help: "Change text color",
        func: cmd_color,
    },
    Command {
        name: "about",
        help: "Show system information",
        func: cmd_about,
    },
    Command {
        name: "panic",
        help: "Trigger a kernel panic (for testing)",
        func: cmd_panic,
    },
    Command {
        name: "reboot",
        help: "Reboot the machine",
        func: cmd_reboot,
    },
    Command {
        name: "shutdown",
        help: "Halt the CPU",
        func: cmd_shutdown,
    },
];

fn find_command(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|cmd| cmd.name.eq_ignore_ascii_case(name))
}

/// Split a line into at most MAX_ARGS whitespace-separated tokens.
fn tokenize(line: &str) -> ([&str; MAX_ARGS], usize) {
    let mut args = [""; MAX_ARGS];
    let mut count = 0;
    for token in line.split_ascii_whitespace() {
        if count == MAX_ARGS {
            break;
        }
        args[count] = token;
        count += 1;
    }
    (args, count)
}

pub struct Shell;

impl Shell {
    pub const fn new() -> Self {
        Shell
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new()
    }
}

impl Dispatcher for Shell {
    fn process_command(&mut self, line: &str, sink: &mut dyn TextSink) {
        let (args, count) = tokenize(line);
        if count == 0 {
            return;
        }
        match find_command(args[0]) {
            Some(cmd) => (cmd.func)(self, &args[1..count], sink),
            None => {
                let _ = writeln!(
                    Fmt(sink),
                    "Unknown command: {}. Type 'help' for available commands.",
                    args[0]
                );
            }
        }
    }

    fn show_prompt(&mut self, sink: &mut dyn TextSink) {
        sink.set_color(ColorCode::new(Color::LightGreen, Color::Black).as_attr());
        sink.write_str("oxos");
        sink.set_color(DEFAULT_COLOR.as_attr());
        sink.write_str("$ ");
    }
}

// ============================================================================
// Command implementations
// ============================================================================

fn cmd_help(_shell: &mut Shell, _args: &[&str], sink: &mut dyn TextSink) {
    sink.write_str("Available commands:\n");
    for cmd in COMMANDS {
        let _ = writeln!(Fmt(sink), "  {:<10} - {}", cmd.name, cmd.help);
    }
}

fn cmd_clear(_shell: &mut Shell, _args: &[&str], sink: &mut dyn TextSink) {
    sink.clear();
}

fn cmd_echo(_shell: &mut Shell, args: &[&str], sink: &mut dyn TextSink) {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            sink.put_char(b' ');
        }
        sink.write_str(arg);
    }
    sink.put_char(b'\n');
}

fn cmd_meminfo(_shell: &mut Shell, _args: &[&str], sink: &mut dyn TextSink) {
    let stats = allocator::heap_stats();
    let _ = writeln!(Fmt(sink), "Heap start:       {:#x}", stats.start);
    let _ = writeln!(Fmt(sink), "Heap end:         {:#x}", stats.end);
    let _ = writeln!(Fmt(sink), "Heap current:     {:#x}", stats.current);
    let _ = writeln!(Fmt(sink), "Available memory: {} bytes", stats.available());
}

fn cmd_memtest(_shell: &mut Shell, _args: &[&str], sink: &mut dyn TextSink) {
    sink.write_str("Testing the allocator...\n");
    for &size in &[100usize, 50, 200, 1024] {
        match allocator::kmalloc(size) {
            Ok(ptr) => {
                let _ = writeln!(
                    Fmt(sink),
                    "  allocated {:>4} bytes at {:#x}",
                    size,
                    ptr.as_ptr() as usize
                );
            }
            Err(e) => {
                let _ = writeln!(Fmt(sink), "  allocation of {size} bytes failed: {e}");
                return;
            }
        }
    }
    sink.write_str("Memory test complete.\n");
}

fn cmd_color(_shell: &mut Shell, args: &[&str], sink: &mut dyn TextSink) {
    let name = match args.first() {
        Some(name) => *name,
        None => {
            sink.write_str("Usage: color <name>\n");
            sink.write_str("Colors: red, green, blue, yellow, cyan, magenta, white, grey\n");
            return;
        }
    };
    let foreground = match name {
        _ if name.eq_ignore_ascii_case("red") => Color::LightRed,
        _ if name.eq_ignore_ascii_case("green") => Color::LightGreen,
        _ if name.eq_ignore_ascii_case("blue") => Color::LightBlue,
        _ if name.eq_ignore_ascii_case("yellow") => Color::Yellow,
        _ if name.eq_ignore_ascii_case("cyan") => Color::LightCyan,
        _ if name.eq_ignore_ascii_case("magenta") => Color::Pink,
        _ if name.eq_ignore_ascii_case("white") => Color::White,
        _ if name.eq_ignore_ascii_case("grey") => Color::LightGray,
        _ => {
            let _ = writeln!(Fmt(sink), "Unknown color: {name}");
            return;
        }
    };
    sink.set_color(ColorCode::new(foreground, Color::Black).as_attr());
    let _ = writeln!(Fmt(sink), "Color changed to {name}");
}

fn cmd_about(_shell: &mut Shell, _args: &[&str], sink: &mut dyn TextSink) {
    sink.write_str("oxos - a minimal boot-to-shell kernel\n");
    sink.write_str("Version 0.1.0\n\n");
    sink.write_str("Features:\n");
    sink.write_str("  - VGA text mode output\n");
    sink.write_str("  - Interrupt-driven keyboard input\n");
    sink.write_str("  - Bump-allocated kernel heap\n");
    sink.write_str("  - This shell\n");
}

fn cmd_panic(_shell: &mut Shell, args: &[&str], _sink: &mut dyn TextSink) {
    match args.first() {
        Some(message) => panic!("{}", message),
        None => panic!("user-requested panic"),
    }
}

fn cmd_reboot(_shell: &mut Shell, _args: &[&str], sink: &mut dyn TextSink) {
    sink.write_str("Rebooting...\n");
    let mut bus = Hardware;
    // Wait for the controller, then pulse the CPU reset line.
    while bus.read(STATUS_COMMAND_PORT) & STATUS_INPUT_BUFFER_FULL != 0 {}
    bus.write(STATUS_COMMAND_PORT, CMD_RESET_CPU);
    halt_forever();
}

fn cmd_shutdown(_shell: &mut Shell, _args: &[&str], sink: &mut dyn TextSink) {
    sink.write_str("It is now safe to power off.\n");
    x86_64::instructions::interrupts::disable();
    halt_forever();
}

fn halt_forever() -> ! {
    loop {
        x86_64::instructions::hlt();
    }
}

/// The one shell instance, reached from the keyboard IRQ call chain.
pub static SHELL: Mutex<Shell> = Mutex::new(Shell::new());

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        out: Vec<u8>,
        colors: Vec<u8>,
        clears: usize,
    }

    impl RecordingSink {
        fn text(&self) -> &str {
            core::str::from_utf8(&self.out).unwrap()
        }
    }

    impl TextSink for RecordingSink {
        fn put_char(&mut self, c: u8) {
            self.out.push(c);
        }

        fn set_color(&mut self, attr: u8) {
            self.colors.push(attr);
        }

        fn clear(&mut self) {
            self.clears += 1;
        }
    }

    fn run(line: &str) -> RecordingSink {
        let mut shell = Shell::new();
        let mut sink = RecordingSink::default();
        shell.process_command(line, &mut sink);
        sink
    }

    #[test]
    fn echo_joins_arguments_with_spaces() {
        let sink = run("echo hello shell world");
        assert_eq!(sink.text(), "hello shell world\n");
    }

    #[test]
    fn echo_collapses_argument_whitespace() {
        let sink = run("echo   a\t b");
        assert_eq!(sink.text(), "a b\n");
    }

    #[test]
    fn unknown_command_prints_hint() {
        let sink = run("frobnicate");
        assert!(sink.text().contains("Unknown command: frobnicate"));
        assert!(sink.text().contains("help"));
    }

    #[test]
    fn help_lists_every_command() {
        let sink = run("help");
        for cmd in COMMANDS {
            assert!(sink.text().contains(cmd.name), "missing {}", cmd.name);
        }
    }

    #[test]
    fn commands_match_case_insensitively() {
        let sink = run("ECHO hi");
        assert_eq!(sink.text(), "hi\n");
    }

    #[test]
    fn clear_clears_the_sink() {
        let sink = run("clear");
        assert_eq!(sink.clears, 1);
    }

    #[test]
    fn meminfo_reports_heap_window() {
        let sink = run("meminfo");
        assert!(sink.text().contains("0x200000"));
        assert!(sink.text().contains("0x400000"));
    }

    #[test]
    fn color_changes_attribute() {
        let sink = run("color red");
        assert_eq!(
            sink.colors,
            vec![ColorCode::new(Color::LightRed, Color::Black).as_attr()]
        );
        assert!(sink.text().contains("Color changed to red"));
    }

    #[test]
    fn color_without_argument_prints_usage() {
        let sink = run("color");
        assert!(sink.text().contains("Usage: color"));
        assert!(sink.colors.is_empty());
    }

    #[test]
    fn color_rejects_unknown_names() {
        let sink = run("color mauve");
        assert!(sink.text().contains("Unknown color: mauve"));
        assert!(sink.colors.is_empty());
    }

    #[test]
    fn prompt_is_colored_name_and_dollar() {
        let mut shell = Shell::new();
        let mut sink = RecordingSink::default();
        shell.show_prompt(&mut sink);
        assert_eq!(sink.text(), "oxos$ ");
        assert_eq!(sink.colors.len(), 2);
    }

    #[test]
    fn tokenizer_caps_argument_count() {
        let line = "cmd a b c d e f g h i j k l m n o p q r";
        let (args, count) = tokenize(line);
        assert_eq!(count, MAX_ARGS);
        assert_eq!(args[0], "cmd");
        assert_eq!(args[MAX_ARGS - 1], "o");
    }

    #[test]
    fn blank_line_produces_no_output() {
        let sink = run("");
        assert!(sink.text().is_empty());
    }
}
