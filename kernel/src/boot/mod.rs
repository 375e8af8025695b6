//! Boot Module
//!
//! Kernel boot sequence: validate the bootloader hand-off, stream the boot
//! information tags through the diagnostic sink, apply command-line options,
//! install the default exception handlers. Every failure here is fatal: no
//! safety infrastructure exists yet to recover with, so the caller reports
//! one diagnostic line and halts.

pub mod cmdline;
pub mod multiboot2;

pub use cmdline::BootOptions;
pub use multiboot2::{BootInfo, BootInfoError, Tag, BOOTLOADER_MAGIC};

use crate::arch::x86_64::plugbox;

/// Main boot sequence.
///
/// # Safety
/// `addr` must be the boot information address the bootloader handed over;
/// see [`BootInfo::from_addr`].
pub unsafe fn boot_sequence(magic: u32, addr: usize) -> Result<(), BootInfoError> {
    crate::logger::init();

    log::info!("═══════════════════════════════════════════════════════");
    log::info!("  NOVA-OS KERNEL v0.1.0");
    log::info!("═══════════════════════════════════════════════════════");

    let boot_info = BootInfo::from_addr(magic, addr)?;
    log::info!(
        "boot info at {:#x}, announced size {:#x}",
        addr,
        boot_info.total_size()
    );

    // Apply command-line options first so the requested verbosity already
    // covers the tag report.
    if let Some(options) = boot_options(&boot_info)? {
        options.apply();
    }

    report_tags(&boot_info)?;

    plugbox::init();

    Ok(())
}

/// First `Cmdline` tag of the stream, parsed into boot options.
fn boot_options(info: &BootInfo) -> Result<Option<BootOptions>, BootInfoError> {
    for tag in info.tags() {
        if let Tag::Cmdline(line) = tag? {
            return Ok(Some(BootOptions::parse(line)));
        }
    }
    Ok(None)
}

/// Report every tag the bootloader handed over.
fn report_tags(info: &BootInfo) -> Result<(), BootInfoError> {
    for tag in info.tags() {
        match tag? {
            Tag::Cmdline(line) => log::info!("command line: {}", line),
            Tag::BootLoaderName(name) => log::info!("boot loader: {}", name),
            Tag::Module {
                mod_start,
                mod_end,
                cmdline,
            } => log::info!(
                "module at {:#x}-{:#x}, command line: {}",
                mod_start,
                mod_end,
                cmdline
            ),
            Tag::BasicMemInfo {
                mem_lower,
                mem_upper,
            } => log::info!("mem_lower = {}KB, mem_upper = {}KB", mem_lower, mem_upper),
            Tag::BootDevice {
                bios_device,
                slice,
                partition,
            } => log::info!("boot device {:#x},{},{}", bios_device, slice, partition),
            Tag::MemoryMap(map) => {
                log::info!(
                    "memory map: {}-byte entries, version {}",
                    map.entry_size,
                    map.entry_version
                );
                for entry in map.entries() {
                    log::info!(
                        "  base = {:#018x}, length = {:#018x}, type = {}",
                        entry.addr,
                        entry.len,
                        entry.region_type
                    );
                }
            }
            Tag::Opaque { typ, size } => log::info!("tag {:#x}, size {:#x}", typ, size),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    // 8-byte aligned image of a small, valid boot info structure.
    fn sample_image(cmdline: &[u8]) -> Vec<u64> {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&1u32.to_le_bytes()); // Cmdline tag
        bytes.extend_from_slice(&((8 + cmdline.len()) as u32).to_le_bytes());
        bytes.extend_from_slice(cmdline);
        while bytes.len() % 8 != 0 {
            bytes.push(0);
        }
        bytes.extend_from_slice(&0u32.to_le_bytes()); // End tag
        bytes.extend_from_slice(&8u32.to_le_bytes());
        let total = bytes.len() as u32;
        bytes[0..4].copy_from_slice(&total.to_le_bytes());

        let mut words = vec![0u64; (bytes.len() + 7) / 8];
        let storage = unsafe {
            core::slice::from_raw_parts_mut(words.as_mut_ptr() as *mut u8, words.len() * 8)
        };
        storage[..bytes.len()].copy_from_slice(&bytes);
        words
    }

    fn as_bytes(words: &[u64]) -> &[u8] {
        unsafe { core::slice::from_raw_parts(words.as_ptr() as *const u8, words.len() * 8) }
    }

    #[test]
    fn test_boot_options_come_from_the_cmdline_tag() {
        let words = sample_image(b"loglevel=debug\0");
        let info = BootInfo::from_slice(BOOTLOADER_MAGIC, as_bytes(&words)).unwrap();
        let options = boot_options(&info).unwrap().unwrap();
        assert_eq!(options.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_report_walks_the_whole_stream() {
        let words = sample_image(b"root=/dev/ram0\0");
        let info = BootInfo::from_slice(BOOTLOADER_MAGIC, as_bytes(&words)).unwrap();
        assert_eq!(report_tags(&info), Ok(()));
    }

    #[test]
    fn test_report_propagates_malformations() {
        let mut words = sample_image(b"x\0");
        // Corrupt the first tag's size field to claim more than the stream.
        let storage = unsafe {
            core::slice::from_raw_parts_mut(words.as_mut_ptr() as *mut u8, words.len() * 8)
        };
        storage[12..16].copy_from_slice(&0x100u32.to_le_bytes());
        let info = BootInfo::from_slice(BOOTLOADER_MAGIC, as_bytes(&words)).unwrap();
        assert!(matches!(
            report_tags(&info),
            Err(BootInfoError::TagOverrun { .. })
        ));
    }
}
