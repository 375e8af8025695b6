// src/main.rs
// Binaire principal du noyau Nova-OS

#![no_std]
#![no_main]

use nova_kernel::{arch, boot, drivers, println};

/// Point d'entrée appelé par le stub assembleur, convention C: le magic du
/// bootloader et l'adresse de la structure d'information boot.
#[no_mangle]
pub extern "C" fn _start(multiboot_magic: u32, multiboot_addr: usize) -> ! {
    // Initialiser le port série en premier
    drivers::serial::init();

    println!("========================================");
    println!("   Nova-OS Kernel v0.1.0");
    println!("========================================");

    if let Err(err) = unsafe { boot::boot_sequence(multiboot_magic, multiboot_addr) } {
        log::error!("boot failed: {}", err);
        arch::halt();
    }

    log::info!("kernel initialized, waiting for exceptions");

    // Boucle principale du kernel
    arch::halt()
}
