//! CPU exception descriptors
//!
//! Exception: interrupt generated by the CPU when an error occurs. Vectors
//! 0..31 are reserved for exceptions (9 and 15 are legacy/reserved and never
//! used). Classified as:
//! - Faults: can be corrected and the program may continue
//! - Traps: reported immediately after the trapping instruction
//! - Aborts: severe unrecoverable error
//!
//! Some exceptions push an error code on the stack; the trampoline must pull
//! it before returning control. This table is the single source of truth for
//! both dispatch classification and diagnostic naming.

use bitflags::bitflags;

/// Number of architectural interrupt vectors reserved for exceptions.
pub const VECTOR_COUNT: usize = 32;

/// Number of defined exception descriptors (32 vectors minus reserved ones).
pub const DESCRIPTOR_COUNT: usize = 23;

/// Vector of the page fault exception, whose error code is a bitfield.
pub const PAGE_FAULT_VECTOR: u8 = 14;

/// Severity class of an exception.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionClass {
    /// Potentially correctable; the faulting instruction may be re-executed.
    Fault,
    /// Reported after the triggering instruction completed.
    Trap,
    /// Severe, unrecoverable.
    Abort,
    /// Not an error condition (NMI).
    Interrupt,
}

/// Compiled-in description of one exception vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionDescriptor {
    pub vector: u8,
    pub name: &'static str,
    pub class: ExceptionClass,
    /// Whether the CPU pushes an error code for this vector. The code itself
    /// always comes from the trampoline; this flag only classifies.
    pub has_error_code: bool,
}

const fn descriptor(
    vector: u8,
    name: &'static str,
    class: ExceptionClass,
    has_error_code: bool,
) -> ExceptionDescriptor {
    ExceptionDescriptor {
        vector,
        name,
        class,
        has_error_code,
    }
}

const DESCRIPTOR_TABLE: [ExceptionDescriptor; DESCRIPTOR_COUNT] = [
    descriptor(0, "Division Error", ExceptionClass::Fault, false),
    // #DB is a fault or a trap depending on the debug condition; the
    // classification here only feeds diagnostics.
    descriptor(1, "Debug", ExceptionClass::Fault, false),
    descriptor(2, "Non-maskable Interrupt", ExceptionClass::Interrupt, false),
    descriptor(3, "Breakpoint", ExceptionClass::Trap, false),
    descriptor(4, "Overflow", ExceptionClass::Trap, false),
    descriptor(5, "Bound Range Exceeded", ExceptionClass::Fault, false),
    descriptor(6, "Invalid Opcode", ExceptionClass::Fault, false),
    descriptor(7, "Device Not Available", ExceptionClass::Fault, false),
    // Error code pushed, always zero.
    descriptor(8, "Double Fault", ExceptionClass::Abort, true),
    descriptor(10, "Invalid TSS", ExceptionClass::Fault, true),
    descriptor(11, "Segment Not Present", ExceptionClass::Fault, true),
    descriptor(12, "Stack-Segment Fault", ExceptionClass::Fault, true),
    // Error code is a segment selector index, or zero when not
    // segment-related.
    descriptor(13, "General Protection Fault", ExceptionClass::Fault, true),
    // Error code layout: see `PageFaultErrorCode`.
    descriptor(14, "Page Fault", ExceptionClass::Fault, true),
    descriptor(16, "x87 Floating-Point Exception", ExceptionClass::Fault, false),
    // Error code pushed, contents architecturally unspecified.
    descriptor(17, "Alignment Check", ExceptionClass::Fault, true),
    descriptor(18, "Machine Check", ExceptionClass::Abort, false),
    descriptor(19, "SIMD Floating-Point Exception", ExceptionClass::Fault, false),
    descriptor(20, "Virtualization Exception", ExceptionClass::Fault, false),
    descriptor(21, "Control Protection Exception", ExceptionClass::Fault, true),
    descriptor(28, "Hypervisor Injection Exception", ExceptionClass::Fault, false),
    descriptor(29, "VMM Communication Exception", ExceptionClass::Fault, true),
    descriptor(30, "Security Exception", ExceptionClass::Fault, true),
];

/// The exception descriptor table, ordered by vector.
pub static DESCRIPTORS: [ExceptionDescriptor; DESCRIPTOR_COUNT] = DESCRIPTOR_TABLE;

// Vector -> table index, built at compile time for O(1) lookup.
static VECTOR_INDEX: [Option<u8>; VECTOR_COUNT] = {
    let mut index = [None; VECTOR_COUNT];
    let mut i = 0;
    while i < DESCRIPTOR_COUNT {
        index[DESCRIPTOR_TABLE[i].vector as usize] = Some(i as u8);
        i += 1;
    }
    index
};

/// Look up the descriptor for `vector`. `None` for reserved vectors (9, 15)
/// and anything outside 0..32.
pub fn lookup(vector: u8) -> Option<&'static ExceptionDescriptor> {
    match VECTOR_INDEX.get(vector as usize) {
        Some(Some(i)) => Some(&DESCRIPTORS[*i as usize]),
        _ => None,
    }
}

/// Whether `vector` is one of the reserved/unused exception vectors.
pub fn is_reserved(vector: u8) -> bool {
    matches!(vector, 9 | 15)
}

bitflags! {
    /// Page fault error code bitfield (vector 14).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFaultErrorCode: u64 {
        /// Set when the fault was a protection violation on a present page;
        /// clear when the page was not present.
        const PRESENT = 1 << 0;
        /// Set when the faulting access was a write.
        const WRITE = 1 << 1;
        /// Set when the access originated in user mode.
        const USER = 1 << 2;
        /// Set when a reserved bit was set in a paging structure.
        const RESERVED_WRITE = 1 << 3;
        /// Set when the fault was an instruction fetch.
        const INSTRUCTION_FETCH = 1 << 4;
        /// Set when a protection-key violation caused the fault.
        const PROTECTION_KEY = 1 << 5;
        /// Set when a shadow-stack access caused the fault.
        const SHADOW_STACK = 1 << 6;
        /// Set when the fault occurred during SGX access control.
        const SGX = 1 << 15;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::const_assert_eq;

    const_assert_eq!(DESCRIPTOR_COUNT, 23);
    const_assert_eq!(VECTOR_COUNT, 32);

    #[test]
    fn test_table_covers_every_defined_vector() {
        let expected: [(u8, &str, ExceptionClass, bool); DESCRIPTOR_COUNT] = [
            (0, "Division Error", ExceptionClass::Fault, false),
            (1, "Debug", ExceptionClass::Fault, false),
            (2, "Non-maskable Interrupt", ExceptionClass::Interrupt, false),
            (3, "Breakpoint", ExceptionClass::Trap, false),
            (4, "Overflow", ExceptionClass::Trap, false),
            (5, "Bound Range Exceeded", ExceptionClass::Fault, false),
            (6, "Invalid Opcode", ExceptionClass::Fault, false),
            (7, "Device Not Available", ExceptionClass::Fault, false),
            (8, "Double Fault", ExceptionClass::Abort, true),
            (10, "Invalid TSS", ExceptionClass::Fault, true),
            (11, "Segment Not Present", ExceptionClass::Fault, true),
            (12, "Stack-Segment Fault", ExceptionClass::Fault, true),
            (13, "General Protection Fault", ExceptionClass::Fault, true),
            (14, "Page Fault", ExceptionClass::Fault, true),
            (16, "x87 Floating-Point Exception", ExceptionClass::Fault, false),
            (17, "Alignment Check", ExceptionClass::Fault, true),
            (18, "Machine Check", ExceptionClass::Abort, false),
            (19, "SIMD Floating-Point Exception", ExceptionClass::Fault, false),
            (20, "Virtualization Exception", ExceptionClass::Fault, false),
            (21, "Control Protection Exception", ExceptionClass::Fault, true),
            (28, "Hypervisor Injection Exception", ExceptionClass::Fault, false),
            (29, "VMM Communication Exception", ExceptionClass::Fault, true),
            (30, "Security Exception", ExceptionClass::Fault, true),
        ];

        for (vector, name, class, has_error_code) in expected {
            let d = lookup(vector).unwrap();
            assert_eq!(d.vector, vector);
            assert_eq!(d.name, name);
            assert_eq!(d.class, class);
            assert_eq!(d.has_error_code, has_error_code, "vector {vector}");
        }
    }

    #[test]
    fn test_reserved_and_out_of_range_vectors_have_no_descriptor() {
        assert!(lookup(9).is_none());
        assert!(lookup(15).is_none());
        for vector in 32..=255u8 {
            assert!(lookup(vector).is_none());
        }
        assert!(is_reserved(9));
        assert!(is_reserved(15));
        assert!(!is_reserved(14));
    }

    #[test]
    fn test_error_code_vectors() {
        let with_code: Vec<u8> = DESCRIPTORS
            .iter()
            .filter(|d| d.has_error_code)
            .map(|d| d.vector)
            .collect();
        assert_eq!(with_code, [8, 10, 11, 12, 13, 14, 17, 21, 29, 30]);
    }

    #[test]
    fn test_page_fault_error_code_decoding() {
        let code = PageFaultErrorCode::from_bits_truncate(0b111);
        assert_eq!(
            code,
            PageFaultErrorCode::PRESENT | PageFaultErrorCode::WRITE | PageFaultErrorCode::USER
        );
        // Unknown bits are dropped, not misread.
        let high = PageFaultErrorCode::from_bits_truncate(1 << 20 | 1 << 4);
        assert_eq!(high, PageFaultErrorCode::INSTRUCTION_FETCH);
    }
}
