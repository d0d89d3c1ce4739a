//=========================================================================
// FPU Guard
//=========================================================================
//
// Checks the floating-point control state of the calling thread.
//
// Native libraries loaded during a game load (drivers, sound, AI) are
// known to reset rounding or exception masks. The simulation depends on
// identical float behaviour on every client, so the load screen checks
// the state on both threads and restores it when it drifted.
//
// Only x86_64 is inspected (MXCSR); elsewhere the state is reported good.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::warn;

//=== Constants ===========================================================

/// Control bits of MXCSR: DAZ, exception masks, rounding, flush-to-zero.
/// The low six bits are sticky status flags and are ignored.
pub const MXCSR_CONTROL_MASK: u32 = 0xFFC0;

/// All exceptions masked, round-to-nearest, no FTZ/DAZ.
pub const MXCSR_EXPECTED: u32 = 0x1F80;

//=== Public API ==========================================================

/// Returns true if the control state is as expected. Otherwise logs a
/// warning tagged with `context` and restores the expected state.
pub fn good_fpu_control_registers(context: &str) -> bool {
    let csr = imp::read_control_word();

    if csr & MXCSR_CONTROL_MASK == MXCSR_EXPECTED {
        return true;
    }

    warn!(
        target: "loadscreen::fpu",
        "FPU control state changed (MXCSR {:#06x}, expected {:#06x}) at \"{}\", restoring",
        csr & MXCSR_CONTROL_MASK,
        MXCSR_EXPECTED,
        context
    );

    imp::write_control_word((csr & !MXCSR_CONTROL_MASK) | MXCSR_EXPECTED);
    false
}

//=== Platform Implementations ============================================

#[cfg(target_arch = "x86_64")]
mod imp {
    use std::arch::asm;

    pub(super) fn read_control_word() -> u32 {
        let mut csr: u32 = 0;
        // SAFETY: stmxcsr stores the 32-bit MXCSR into `csr`, nothing else.
        unsafe {
            asm!("stmxcsr dword ptr [{}]", in(reg) std::ptr::addr_of_mut!(csr), options(nostack, preserves_flags));
        }
        csr
    }

    pub(super) fn write_control_word(csr: u32) {
        // SAFETY: ldmxcsr loads a value whose reserved bits are zero, since
        // only control/status bits read from the register are kept.
        unsafe {
            asm!("ldmxcsr dword ptr [{}]", in(reg) std::ptr::addr_of!(csr), options(nostack, readonly, preserves_flags));
        }
    }
}

#[cfg(not(target_arch = "x86_64"))]
mod imp {
    pub(super) fn read_control_word() -> u32 {
        super::MXCSR_EXPECTED
    }

    pub(super) fn write_control_word(_csr: u32) {}
}

//=========================================================================
// Unit Tests
//=========================================================================
