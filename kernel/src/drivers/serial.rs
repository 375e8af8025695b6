// drivers/serial.rs - Pilote serial UART 16550 simple en Rust pur

use core::fmt;

use spin::Mutex;

use crate::arch::x86_64::registers::{read_port_u8, write_port_u8};

const SERIAL_PORT: u16 = 0x3F8; // COM1

pub struct SerialPort {
    port: u16,
}

impl SerialPort {
    pub const fn new(port: u16) -> Self {
        SerialPort { port }
    }

    pub fn init(&self) {
        unsafe {
            write_port_u8(self.port + 1, 0x00); // Disable interrupts
            write_port_u8(self.port + 3, 0x80); // Enable DLAB
            write_port_u8(self.port, 0x03); // Set divisor to 3 (38400 baud)
            write_port_u8(self.port + 1, 0x00);
            write_port_u8(self.port + 3, 0x03); // 8 bits, no parity, one stop bit
            write_port_u8(self.port + 2, 0xC7); // Enable FIFO, clear, 14-byte threshold
            write_port_u8(self.port + 4, 0x0B); // IRQs enabled, RTS/DSR set
        }
    }

    fn is_transmit_empty(&self) -> bool {
        unsafe { read_port_u8(self.port + 5) & 0x20 != 0 }
    }

    pub fn write_byte(&self, byte: u8) {
        // Attente active bornée: certains hyperviseurs n'actualisent jamais le
        // LSR sur sortie fichier, on force alors l'écriture.
        let mut spins: u32 = 0;
        while !self.is_transmit_empty() {
            spins = spins.wrapping_add(1);
            core::hint::spin_loop();
            if spins > 1_000_000 {
                break;
            }
        }
        unsafe {
            write_port_u8(self.port, byte);
        }
    }

    pub fn write_bytes(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    pub fn write_str(&self, s: &str) {
        self.write_bytes(s.as_bytes());
    }
}

impl fmt::Write for SerialPort {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        SerialPort::write_str(self, s);
        Ok(())
    }
}

static SERIAL: Mutex<SerialPort> = Mutex::new(SerialPort::new(SERIAL_PORT));

pub fn init() {
    SERIAL.lock().init();
}

pub fn write_bytes(bytes: &[u8]) {
    SERIAL.lock().write_bytes(bytes);
}

pub fn write_str(s: &str) {
    SERIAL.lock().write_str(s);
}

pub fn write_fmt(args: fmt::Arguments) {
    use core::fmt::Write;
    let _ = SERIAL.lock().write_fmt(args);
}
