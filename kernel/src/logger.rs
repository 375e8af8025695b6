//! Serial logger for early boot
//!
//! `log::Log` implementation writing to the serial port before any richer
//! sink exists. Formatting goes through a fixed buffer: the logger is also
//! called from the exception dispatch path, which must not allocate.

use log::{Level, LevelFilter, Metadata, Record};

/// Simple logger that writes `[LEVEL] message` lines to the serial port.
struct SerialLogger;

impl log::Log for SerialLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level_str = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };

        use core::fmt::Write;
        let mut buf = [0u8; 512];
        let pos = {
            let mut writer = BufferWriter {
                buffer: &mut buf,
                pos: 0,
            };
            let _ = write!(&mut writer, "[{}] {}\n", level_str, record.args());
            writer.pos
        };
        crate::drivers::serial::write_bytes(&buf[..pos]);
    }

    fn flush(&self) {}
}

/// Fixed-capacity formatter; output past the end of the buffer is dropped.
pub struct BufferWriter<'a> {
    pub buffer: &'a mut [u8],
    pub pos: usize,
}

impl<'a> core::fmt::Write for BufferWriter<'a> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buffer.len() - self.pos;
        let to_write = bytes.len().min(remaining);

        if to_write > 0 {
            self.buffer[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
        }

        Ok(())
    }
}

/// Global logger instance
static LOGGER: SerialLogger = SerialLogger;

/// Install the serial logger with the default `Info` filter.
///
/// Call this very early in the boot sequence. Calling it again is harmless:
/// the first installation wins and the level filter is left untouched.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}

/// Adjust the global level filter (kernel command line `loglevel=`).
pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn test_buffer_writer_formats_in_place() {
        let mut buf = [0u8; 32];
        let mut writer = BufferWriter {
            buffer: &mut buf,
            pos: 0,
        };
        write!(&mut writer, "vector {} at {:#x}", 14, 0x1000u64).unwrap();
        let pos = writer.pos;
        assert_eq!(&buf[..pos], b"vector 14 at 0x1000");
    }

    #[test]
    fn test_buffer_writer_drops_overflow() {
        let mut buf = [0u8; 4];
        let mut writer = BufferWriter {
            buffer: &mut buf,
            pos: 0,
        };
        write!(&mut writer, "abcdefgh").unwrap();
        assert_eq!(writer.pos, 4);
        assert_eq!(&buf, b"abcd");
    }
}
