//! Guest Architectures
//!
//! This module names the guest architectures a lifted block may come from and
//! the few guest-state offsets the interpreter special-cases.

use serde::{Deserialize, Serialize};

/// Guest architecture of a lifted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuestArch {
    X86,
    Amd64,
    /// 32-bit ARM (ARM and Thumb)
    Arm,
    Arm64,
    Ppc32,
    Ppc64,
    S390x,
    Mips32,
    Mips64,
    RiscV64,
}

/// Guest-state offset of the ARM ITSTATE register.
pub const ARM_ITSTATE_OFFSET: u32 = 396;

/// Guest-state offset of MIPS32 `r28` (the global pointer).
pub const MIPS32_GP_OFFSET: u32 = 120;

impl GuestArch {
    /// Register whose writes the interpreter ignores entirely.
    ///
    /// On ARM the Thumb IT-block state is written by nearly every instruction
    /// and carries no data.
    pub fn ignored_register(self) -> Option<u32> {
        match self {
            GuestArch::Arm => Some(ARM_ITSTATE_OFFSET),
            _ => None,
        }
    }

    /// Register that keeps its binding when overwritten with an unknown value.
    ///
    /// MIPS32 code routinely reloads `gp` from a stack slot; the binding seeded
    /// by the caller stays valid across such reloads.
    pub fn sticky_register(self) -> Option<u32> {
        match self {
            GuestArch::Mips32 => Some(MIPS32_GP_OFFSET),
            _ => None,
        }
    }

    /// Whether a load of `size` bytes through a resolved pointer should be
    /// followed into read-only memory.
    ///
    /// Limited to pointer-sized loads on architectures that materialize
    /// constants through literal pools or GOT slots.
    pub fn follows_pointer_loads(self, size: u32) -> bool {
        matches!(
            (self, size),
            (GuestArch::Arm, 4) | (GuestArch::Mips32, 4) | (GuestArch::Mips64, 8)
        )
    }
}

impl std::fmt::Display for GuestArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &str = match self {
            GuestArch::X86 => "x86",
            GuestArch::Amd64 => "amd64",
            GuestArch::Arm => "arm",
            GuestArch::Arm64 => "arm64",
            GuestArch::Ppc32 => "ppc32",
            GuestArch::Ppc64 => "ppc64",
            GuestArch::S390x => "s390x",
            GuestArch::Mips32 => "mips32",
            GuestArch::Mips64 => "mips64",
            GuestArch::RiscV64 => "riscv64",
        };
        f.write_str(name)
    }
}
