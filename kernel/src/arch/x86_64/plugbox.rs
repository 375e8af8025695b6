//! Exception handler registry ("plugbox") and dispatch
//!
//! Binds each exception vector to a handler policy and routes incoming
//! exceptions. The registry is written once during single-threaded init and
//! read-only from the dispatch path; handlers run on the interrupted core's
//! exception context and must not block, allocate or take locks: a fault may
//! recur while one is being handled.
//!
//! Every shipped handler reports non-resumable, but the registry is a policy
//! injection point: a fault-specific recovery handler (demand paging on page
//! fault, say) installs through the same `assign` without touching dispatch.

use core::fmt;

use spin::RwLock;

use super::context::TrapFrame;
use super::exceptions::{
    self, ExceptionDescriptor, PageFaultErrorCode, DESCRIPTORS, PAGE_FAULT_VECTOR, VECTOR_COUNT,
};

/// Handler capability: given the trapped frame and the error code the
/// trampoline pulled (if the vector pushes one), report whether the
/// interrupted context may resume.
pub trait ExceptionHandler: Sync {
    /// Diagnostic name reported for this handler.
    fn name(&self) -> &'static str;

    /// Handle one exception. Returns `true` when execution may resume.
    fn handle(&self, frame: &TrapFrame, error_code: Option<u64>) -> bool;
}

/// Dispatch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// No handler registered for this vector.
    UnhandledVector { vector: u8 },
    /// Attempt to register a handler on a reserved vector (9 or 15).
    ReservedVector { vector: u8 },
    /// Attempt to register a handler outside the exception range.
    VectorOutOfRange { vector: u8 },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnhandledVector { vector } => {
                write!(f, "no handler registered for vector {}", vector)
            }
            DispatchError::ReservedVector { vector } => {
                write!(f, "vector {} is reserved", vector)
            }
            DispatchError::VectorOutOfRange { vector } => {
                write!(f, "vector {} is outside the exception range", vector)
            }
        }
    }
}

/// Default handler policy: format and report the descriptor's name through
/// the diagnostic sink, then report non-resumable.
#[derive(Clone, Copy)]
pub struct FatalPolicy {
    vector: u8,
}

impl FatalPolicy {
    fn descriptor(&self) -> Option<&'static ExceptionDescriptor> {
        exceptions::lookup(self.vector)
    }
}

impl ExceptionHandler for FatalPolicy {
    fn name(&self) -> &'static str {
        self.descriptor().map(|d| d.name).unwrap_or("Unknown Exception")
    }

    fn handle(&self, frame: &TrapFrame, error_code: Option<u64>) -> bool {
        match error_code {
            Some(code) if self.vector == PAGE_FAULT_VECTOR => {
                let cause = PageFaultErrorCode::from_bits_truncate(code);
                log::error!(
                    "EXCEPTION: {} ({:?}) at {:#x}",
                    self.name(),
                    cause,
                    frame.instruction_pointer
                );
            }
            Some(code) => {
                log::error!(
                    "EXCEPTION: {} (error code {:#x}) at {:#x}",
                    self.name(),
                    code,
                    frame.instruction_pointer
                );
            }
            None => {
                log::error!("EXCEPTION: {} at {:#x}", self.name(), frame.instruction_pointer);
            }
        }
        false
    }
}

// One default policy per vector slot; only the defined vectors ever get
// installed.
static DEFAULT_POLICIES: [FatalPolicy; VECTOR_COUNT] = {
    let mut policies = [FatalPolicy { vector: 0 }; VECTOR_COUNT];
    let mut vector = 0;
    while vector < VECTOR_COUNT {
        policies[vector] = FatalPolicy {
            vector: vector as u8,
        };
        vector += 1;
    }
    policies
};

/// The vector table: one handler slot per exception vector.
///
/// Fixed array indexed by vector number: O(1) dispatch, no allocation on the
/// hot path. Pass it by reference into `dispatch`; the process-wide instance
/// behind [`exception_entry`] is only written during init.
pub struct Plugbox {
    slots: [Option<&'static dyn ExceptionHandler>; VECTOR_COUNT],
}

impl Plugbox {
    pub const fn new() -> Self {
        Plugbox {
            slots: [None; VECTOR_COUNT],
        }
    }

    /// Bind `handler` to `vector`, overwriting any previous binding.
    pub fn assign(
        &mut self,
        vector: u8,
        handler: &'static dyn ExceptionHandler,
    ) -> Result<(), DispatchError> {
        if vector as usize >= VECTOR_COUNT {
            return Err(DispatchError::VectorOutOfRange { vector });
        }
        if exceptions::is_reserved(vector) {
            return Err(DispatchError::ReservedVector { vector });
        }
        self.slots[vector as usize] = Some(handler);
        Ok(())
    }

    /// Handler currently bound to `vector`, if any.
    pub fn handler(&self, vector: u8) -> Option<&'static dyn ExceptionHandler> {
        self.slots.get(vector as usize).copied().flatten()
    }

    /// Bind the default fatal policy to every defined vector.
    ///
    /// Last-writer-wins: calling this again simply rebinds the same policies,
    /// so a second call leaves the registry observably unchanged.
    pub fn install_defaults(&mut self) {
        for d in DESCRIPTORS.iter() {
            self.slots[d.vector as usize] = Some(&DEFAULT_POLICIES[d.vector as usize]);
        }
    }

    /// Route one exception to its registered handler and return the handler's
    /// resumable verdict. The caller (the trampoline) must not resume
    /// execution on `Ok(false)`.
    pub fn dispatch(
        &self,
        vector: u8,
        frame: &TrapFrame,
        error_code: Option<u64>,
    ) -> Result<bool, DispatchError> {
        let handler = self
            .handler(vector)
            .ok_or(DispatchError::UnhandledVector { vector })?;
        Ok(handler.handle(frame, error_code))
    }
}

impl Default for Plugbox {
    fn default() -> Self {
        Self::new()
    }
}

// Process-wide registry. Written once by `init` before interrupts are
// enabled; later re-registration must be sequenced by the caller (interrupts
// disabled). The dispatch path only ever takes the read side.
static PLUGBOX: RwLock<Plugbox> = RwLock::new(Plugbox::new());

/// Install the default handler for every defined exception vector.
pub fn init() {
    PLUGBOX.write().install_defaults();
    log::info!(
        "exception handlers installed for {} vectors",
        DESCRIPTORS.len()
    );
}

/// Bind `handler` to `vector` in the process-wide registry.
pub fn assign(vector: u8, handler: &'static dyn ExceptionHandler) -> Result<(), DispatchError> {
    PLUGBOX.write().assign(vector, handler)
}

/// Entry point invoked by the assembly trampoline once CPU state is saved.
///
/// `has_error_code` tells whether the vector pushed an error code the
/// trampoline pulled off the stack; this core never synthesizes one. The
/// return value is the resumable verdict; the trampoline must halt instead
/// of returning to the interrupted context when it is `false`.
#[no_mangle]
pub extern "C" fn exception_entry(
    vector: u64,
    frame: *const TrapFrame,
    error_code: u64,
    has_error_code: bool,
) -> bool {
    if frame.is_null() {
        log::error!("exception_entry: null frame for vector {}", vector);
        return false;
    }
    // Contract with the trampoline: the frame pointer addresses the CPU-pushed
    // frame on the exception stack and stays valid for the call.
    let frame = unsafe { &*frame };
    let code = if has_error_code { Some(error_code) } else { None };
    match PLUGBOX.read().dispatch(vector as u8, frame, code) {
        Ok(resumable) => resumable,
        Err(err) => {
            log::error!("{}", err);
            false
        }
    }
}
