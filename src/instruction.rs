use crate::sign_extend::SignExtend;

/// These instruction types don't map directly to the 4-bit opcodes.
/// Some have been split into multiple enum variants for better ergonomics
/// (register vs. immediate forms, JMP vs. RET).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    BR(Condition, u16),
    ADD(Register, Register, Register),
    ADDIMM(Register, Register, u16),
    LD(Register, u16),
    ST(Register, u16),
    JSR(u16),
    JSRR(Register),
    AND(Register, Register, Register),
    ANDIMM(Register, Register, u16),
    LDR(Register, Register, u16),
    STR(Register, Register, u16),
    RTI,
    NOT(Register, Register),
    LDI(Register, u16),
    STI(Register, u16),
    JMP(Register),
    RET,
    LEA(Register, u16),
    TRAP(u8),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl Register {
    pub fn from(n: u16) -> Register {
        match n & 0x7 {
            0 => Register::R0,
            1 => Register::R1,
            2 => Register::R2,
            3 => Register::R3,
            4 => Register::R4,
            5 => Register::R5,
            6 => Register::R6,
            _ => Register::R7,
        }
    }
}

/// The N/Z/P mask of a BR instruction (bits 11:9).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    pub n: bool,
    pub z: bool,
    pub p: bool,
}

impl Condition {
    pub fn mask(self) -> u16 {
        (u16::from(self.n) << 2) | (u16::from(self.z) << 1) | u16::from(self.p)
    }
}

/// Flags the executor reports for the run loop's finish accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InstFlags {
    pub subroutine: bool,
    pub ret: bool,
}

impl Instruction {
    /// Decode one instruction word. Patterns with required-zero fields are
    /// checked strictly; a word matching no row is an illegal instruction
    /// and decodes to `None`.
    pub fn decode(instruction: u16) -> Option<Self> {
        let inst = match instruction >> 12 {
            0x0 => {
                let n = ((instruction >> 11) & 0x1) == 1;
                let z = ((instruction >> 10) & 0x1) == 1;
                let p = ((instruction >> 9) & 0x1) == 1;
                let pc_offset = instruction & 0x1ff;

                Instruction::BR(Condition { n, z, p }, pc_offset)
            }

            0x1 => {
                let dr = Register::from((instruction >> 9) & 0x7);
                let sr1 = Register::from((instruction >> 6) & 0x7);

                if (instruction >> 5) & 0x1 == 1 {
                    Instruction::ADDIMM(dr, sr1, instruction & 0x1f)
                } else if instruction & 0x18 == 0 {
                    Instruction::ADD(dr, sr1, Register::from(instruction & 0x7))
                } else {
                    return None;
                }
            }

            0x2 => {
                let dr = Register::from((instruction >> 9) & 0x7);

                Instruction::LD(dr, instruction & 0x1ff)
            }

            0x3 => {
                let sr = Register::from((instruction >> 9) & 0x7);

                Instruction::ST(sr, instruction & 0x1ff)
            }

            0x4 => {
                if (instruction >> 11) & 1 == 1 {
                    Instruction::JSR(instruction & 0x7ff)
                } else if instruction & 0x063f == 0 {
                    Instruction::JSRR(Register::from((instruction >> 6) & 0x7))
                } else {
                    return None;
                }
            }

            0x5 => {
                let dr = Register::from((instruction >> 9) & 0x7);
                let sr1 = Register::from((instruction >> 6) & 0x7);

                if (instruction >> 5) & 0x1 == 1 {
                    Instruction::ANDIMM(dr, sr1, instruction & 0x1f)
                } else if instruction & 0x18 == 0 {
                    Instruction::AND(dr, sr1, Register::from(instruction & 0x7))
                } else {
                    return None;
                }
            }

            0x6 => {
                let dr = Register::from((instruction >> 9) & 0x7);
                let base_r = Register::from((instruction >> 6) & 0x7);

                Instruction::LDR(dr, base_r, instruction & 0x3f)
            }

            0x7 => {
                let sr = Register::from((instruction >> 9) & 0x7);
                let base_r = Register::from((instruction >> 6) & 0x7);

                Instruction::STR(sr, base_r, instruction & 0x3f)
            }

            0x8 => {
                if instruction == 0x8000 {
                    Instruction::RTI
                } else {
                    return None;
                }
            }

            0x9 => {
                if instruction & 0x3f != 0x3f {
                    return None;
                }
                let dr = Register::from((instruction >> 9) & 0x7);
                let sr = Register::from((instruction >> 6) & 0x7);

                Instruction::NOT(dr, sr)
            }

            0xa => {
                let dr = Register::from((instruction >> 9) & 0x7);

                Instruction::LDI(dr, instruction & 0x1ff)
            }

            0xb => {
                let sr = Register::from((instruction >> 9) & 0x7);

                Instruction::STI(sr, instruction & 0x1ff)
            }

            0xc => {
                if instruction & 0x0e3f != 0 {
                    return None;
                }
                let base_r = Register::from((instruction >> 6) & 0x7);

                if base_r == Register::R7 {
                    Instruction::RET
                } else {
                    Instruction::JMP(base_r)
                }
            }

            // Opcode 1101 is reserved.
            0xd => return None,

            0xe => {
                let dr = Register::from((instruction >> 9) & 0x7);

                Instruction::LEA(dr, instruction & 0x1ff)
            }

            0xf => {
                if instruction & 0x0f00 != 0 {
                    return None;
                }

                Instruction::TRAP((instruction & 0xff) as u8)
            }

            _ => unreachable!(),
        };

        Some(inst)
    }

    /// Subroutine-entry and return flags observed by the run loop.
    pub fn flags(&self) -> InstFlags {
        match self {
            Instruction::JSR(_) | Instruction::JSRR(_) | Instruction::TRAP(_) => InstFlags {
                subroutine: true,
                ret: false,
            },
            Instruction::RET | Instruction::RTI => InstFlags {
                subroutine: false,
                ret: true,
            },
            _ => InstFlags::default(),
        }
    }

    /// Branch target of a PC-relative operand, for disassembly.
    pub fn relative_target(addr: u16, offset: u16, bit_count: u8) -> u16 {
        addr.wrapping_add(1).wrapping_add(offset.sign_extend(bit_count))
    }
}
