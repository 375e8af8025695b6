//! Architecture x86_64 support for Nova-OS
//!
//! Ce module gère les spécificités de l'architecture x86_64:
//! - Table des descripteurs des 32 exceptions CPU
//! - Registre des handlers d'exception (plugbox) et dispatch
//! - Trame d'exception poussée par le CPU (interface avec le trampoline)
//! - E/S par ports pour le port série

pub mod context;
pub mod exceptions;
pub mod plugbox;
pub mod registers;

pub use context::TrapFrame;

/// Arrête le CPU: interruptions coupées, `hlt` en boucle.
pub fn halt() -> ! {
    loop {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            core::arch::asm!("cli; hlt", options(nomem, nostack));
        }
        core::hint::spin_loop();
    }
}
