use crate::instruction::Instruction;
use crate::instruction::Register::*;
use crate::machine::Machine;
use crate::sign_extend::SignExtend;

/// Execute one decoded instruction. The PC has already been incremented by
/// the fetch; branches and jumps overwrite it.
pub fn execute(m: &mut Machine, instruction: Instruction) {
    match instruction {
        // BR - Conditional Branch
        //
        //      |0 0 0 0|n|z|p|pc_offset_9      |
        //
        // The condition codes selected by bits [11:9] are tested against
        // the current PSR; if any selected code is set, the sign-extended
        // offset is added to the incremented PC.
        Instruction::BR(condition, pc_offset) => {
            if condition.mask() & m.regs.cc_mask() != 0 {
                m.regs.pc = m.regs.pc.wrapping_add(pc_offset.sign_extend(9));
            }
        }

        // ADD - Addition
        //
        //      |0 0 0 1|DR   |SR1  |0|0 0|SR2  |
        //      |0 0 0 1|DR   |SR1  |1|imm_5    |
        //
        // The second operand is SR2 or the sign-extended imm5. Condition
        // codes are set on the result.
        Instruction::ADD(dr, sr1, sr2) => {
            let value = m.regs.read(sr1).wrapping_add(m.regs.read(sr2));
            m.regs.write(dr, value);
            m.regs.update_flags(dr);
        }
        Instruction::ADDIMM(dr, sr1, immediate_value) => {
            let value = m.regs.read(sr1).wrapping_add(immediate_value.sign_extend(5));
            m.regs.write(dr, value);
            m.regs.update_flags(dr);
        }

        // AND - Bit-wise Logical AND
        //
        //      |0 1 0 1|DR   |SR1  |0|0 0|SR2  |
        //      |0 1 0 1|DR   |SR1  |1|imm_5    |
        Instruction::AND(dr, sr1, sr2) => {
            let value = m.regs.read(sr1) & m.regs.read(sr2);
            m.regs.write(dr, value);
            m.regs.update_flags(dr);
        }
        Instruction::ANDIMM(dr, sr1, immediate_value) => {
            let value = m.regs.read(sr1) & immediate_value.sign_extend(5);
            m.regs.write(dr, value);
            m.regs.update_flags(dr);
        }

        // LD - Load (PC-relative)
        Instruction::LD(dr, pc_offset) => {
            let address = m.regs.pc.wrapping_add(pc_offset.sign_extend(9));
            let value = m.read_memory(address);
            m.regs.write(dr, value);
            m.regs.update_flags(dr);
        }

        // LDI - Load Indirect
        //
        // The word at PC+offset holds the address of the data.
        Instruction::LDI(dr, pc_offset) => {
            let address = m.regs.pc.wrapping_add(pc_offset.sign_extend(9));
            let address = m.read_memory(address);
            let value = m.read_memory(address);
            m.regs.write(dr, value);
            m.regs.update_flags(dr);
        }

        // LDR - Load Base+offset
        Instruction::LDR(dr, base_r, offset) => {
            let address = m.regs.read(base_r).wrapping_add(offset.sign_extend(6));
            let value = m.read_memory(address);
            m.regs.write(dr, value);
            m.regs.update_flags(dr);
        }

        // LEA - Load Effective Address
        //
        // The address itself is loaded; memory is not read.
        Instruction::LEA(dr, pc_offset) => {
            let value = m.regs.pc.wrapping_add(pc_offset.sign_extend(9));
            m.regs.write(dr, value);
            m.regs.update_flags(dr);
        }

        // ST - Store (PC-relative)
        Instruction::ST(sr, pc_offset) => {
            let address = m.regs.pc.wrapping_add(pc_offset.sign_extend(9));
            m.write_memory(address, m.regs.read(sr));
        }

        // STI - Store Indirect
        Instruction::STI(sr, pc_offset) => {
            let address = m.regs.pc.wrapping_add(pc_offset.sign_extend(9));
            let address = m.read_memory(address);
            m.write_memory(address, m.regs.read(sr));
        }

        // STR - Store Base+offset
        Instruction::STR(sr, base_r, offset) => {
            let address = m.regs.read(base_r).wrapping_add(offset.sign_extend(6));
            m.write_memory(address, m.regs.read(sr));
        }

        // NOT - Bit-Wise Complement
        Instruction::NOT(dr, sr) => {
            let value = !m.regs.read(sr);
            m.regs.write(dr, value);
            m.regs.update_flags(dr);
        }

        // JMP - Jump / RET - Return from Subroutine
        //
        // RET is JMP through R7, the linkage left by JSR/JSRR/TRAP; it is
        // decoded separately so the run loop sees the return flag.
        Instruction::JMP(base_r) => {
            m.regs.pc = m.regs.read(base_r);
        }
        Instruction::RET => {
            m.regs.pc = m.regs.read(R7);
        }

        // JSR / JSRR - Jump to Subroutine
        //
        //      |0 1 0 0|1|pc_offset_11         |
        //      |0 1 0 0|0|0 0|BaseR|0 0 0 0 0 0|
        //
        // The incremented PC is saved in R7 after the target is computed,
        // so JSRR through R7 still works.
        Instruction::JSR(pc_offset) => {
            let temp = m.regs.pc;
            m.regs.pc = m.regs.pc.wrapping_add(pc_offset.sign_extend(11));
            m.regs.write(R7, temp);
        }
        Instruction::JSRR(base_r) => {
            let temp = m.regs.pc;
            m.regs.pc = m.regs.read(base_r);
            m.regs.write(R7, temp);
        }

        // TRAP - System Call
        //
        //      |1 1 1 1|0 0 0 0|trap_vector_8  |
        //
        // R7 takes the incremented PC; the PC is loaded from the trap
        // vector table at the zero-extended vector.
        Instruction::TRAP(vector) => {
            m.regs.write(R7, m.regs.pc);
            m.regs.pc = m.read_memory(u16::from(vector));
        }

        // RTI - Return from Trap or Interrupt
        //
        // Privilege is not modeled; this returns through R7 like RET and
        // counts as a return for the run loop.
        Instruction::RTI => {
            m.regs.pc = m.regs.read(R7);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Condition;
    use crate::instruction::Instruction::*;
    use crate::machine::Machine;

    fn step(m: &mut Machine, word: u16) {
        m.write_memory(m.regs.pc, word);
        m.execute_instruction();
    }

    #[test]
    fn add_immediate_sets_negative_flag() {
        let mut m = Machine::fixture();
        m.regs.write(R1, 3);

        // ADD R0, R1, #-5
        step(&mut m, 0b0001_000_001_1_11011);

        assert_eq!(m.regs.read(R0), 0xfffe);
        assert_eq!(m.regs.cc_name(), "NEGATIVE");
        assert_eq!(m.regs.pc, 0x3001);
    }

    #[test]
    fn add_register() {
        let mut m = Machine::fixture();
        m.regs.write(R0, 2);
        m.regs.write(R1, 3);

        execute(&mut m, ADD(R2, R1, R0));

        assert_eq!(m.regs.read(R2), 5);
        assert_eq!(m.regs.cc_name(), "POSITIVE");
    }

    #[test]
    fn and_sets_flags() {
        let mut m = Machine::fixture();
        m.regs.write(R2, 3);
        m.regs.write(R3, 5);

        execute(&mut m, AND(R1, R2, R3));
        assert_eq!(m.regs.read(R1), 3 & 5);
        assert_eq!(m.regs.cc_name(), "POSITIVE");

        execute(&mut m, ANDIMM(R1, R2, 0));
        assert_eq!(m.regs.read(R1), 0);
        assert_eq!(m.regs.cc_name(), "ZERO");
    }

    #[test]
    fn branch_taken_and_not_taken() {
        let mut m = Machine::fixture();
        m.regs.write(R0, 0xffff);
        m.regs.update_flags(R0); // N set

        // BRn #4
        step(&mut m, 0b0000_100_000000100);
        assert_eq!(m.regs.pc, 0x3005);

        let mut m = Machine::fixture();
        m.regs.write(R0, 0);
        m.regs.update_flags(R0); // Z set

        step(&mut m, 0b0000_100_000000100);
        assert_eq!(m.regs.pc, 0x3001);
    }

    #[test]
    fn branch_with_empty_mask_never_taken() {
        let mut m = Machine::fixture();
        execute(
            &mut m,
            BR(
                Condition {
                    n: false,
                    z: false,
                    p: false,
                },
                5,
            ),
        );
        assert_eq!(m.regs.pc, 0x3000);
    }

    #[test]
    fn loads_and_stores() {
        let mut m = Machine::fixture();
        m.regs.pc = 0x3001; // as if an instruction at 0x3000 was fetched
        m.write_memory(0x3006, 42);
        execute(&mut m, LD(R3, 5));
        assert_eq!(m.regs.read(R3), 42);
        assert_eq!(m.regs.cc_name(), "POSITIVE");

        let mut m = Machine::fixture();
        m.regs.pc = 0x3001;
        m.regs.write(R3, 42);
        execute(&mut m, ST(R3, 5));
        assert_eq!(m.read_memory(0x3006), 42);

        let mut m = Machine::fixture();
        m.regs.pc = 0x3001;
        m.write_memory(0x3002, 0x4000);
        m.write_memory(0x4000, 7);
        execute(&mut m, LDI(R0, 1));
        assert_eq!(m.regs.read(R0), 7);

        let mut m = Machine::fixture();
        m.regs.pc = 0x3001;
        m.regs.write(R1, 42);
        m.write_memory(0x3003, 0x4000);
        execute(&mut m, STI(R1, 2));
        assert_eq!(m.read_memory(0x4000), 42);

        let mut m = Machine::fixture();
        m.regs.write(R2, 0x4000);
        m.write_memory(0x4003, 9);
        execute(&mut m, LDR(R1, R2, 3));
        assert_eq!(m.regs.read(R1), 9);

        let mut m = Machine::fixture();
        m.regs.write(R1, 42);
        m.regs.write(R2, 0x4000);
        execute(&mut m, STR(R1, R2, 3));
        assert_eq!(m.read_memory(0x4003), 42);
    }

    #[test]
    fn lea_loads_address_without_memory_read() {
        let mut m = Machine::fixture();
        m.regs.pc = 0x3001;
        execute(&mut m, LEA(R1, 2));
        assert_eq!(m.regs.read(R1), 0x3003);
        assert_eq!(m.regs.cc_name(), "POSITIVE");
    }

    #[test]
    fn not_complements() {
        let mut m = Machine::fixture();
        m.regs.write(R2, 0b11111111_11010110);
        execute(&mut m, NOT(R1, R2));
        assert_eq!(m.regs.read(R1), 0b00000000_00101001);
        assert_eq!(m.regs.cc_name(), "POSITIVE");
    }

    #[test]
    fn jumps_and_linkage() {
        let mut m = Machine::fixture();
        m.regs.write(R2, 0x5000);
        execute(&mut m, JMP(R2));
        assert_eq!(m.regs.pc, 0x5000);

        let mut m = Machine::fixture();
        m.regs.pc = 0x3001;
        execute(&mut m, JSR(0x403)); // sign-extends to a negative offset
        assert_eq!(m.regs.pc, (0x3001u16).wrapping_add(0x403u16.sign_extend(11)));
        assert_eq!(m.regs.read(R7), 0x3001);

        let mut m = Machine::fixture();
        m.regs.pc = 0x3001;
        m.regs.write(R3, 0x4000);
        execute(&mut m, JSRR(R3));
        assert_eq!(m.regs.pc, 0x4000);
        assert_eq!(m.regs.read(R7), 0x3001);

        let mut m = Machine::fixture();
        m.regs.write(R7, 0x3001);
        execute(&mut m, RET);
        assert_eq!(m.regs.pc, 0x3001);

        let mut m = Machine::fixture();
        m.regs.write(R7, 0x3001);
        execute(&mut m, RTI);
        assert_eq!(m.regs.pc, 0x3001);
    }

    #[test]
    fn jsrr_through_r7_saves_return_first() {
        let mut m = Machine::fixture();
        m.regs.pc = 0x3001;
        m.regs.write(R7, 0x4000);
        execute(&mut m, JSRR(R7));
        assert_eq!(m.regs.pc, 0x4000);
        assert_eq!(m.regs.read(R7), 0x3001);
    }

    #[test]
    fn trap_reads_vector_table() {
        let mut m = Machine::fixture();
        m.regs.pc = 0x3001;
        m.write_memory(0x0025, 0x0520);
        execute(&mut m, TRAP(0x25));
        assert_eq!(m.regs.pc, 0x0520);
        assert_eq!(m.regs.read(R7), 0x3001);
    }
}
