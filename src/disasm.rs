//! Textual rendering of memory: disassembly lines and hex dumps. Reads go
//! through the machine's normal read path, device registers included.

use crate::instruction::{Instruction, Register};
use crate::machine::Machine;
use crate::sign_extend::SignExtend;

const OPCODE_WIDTH: usize = 6;

/// Trap vectors with dedicated mnemonics in listings.
const TRAP_NAMES: [(u8, &str); 6] = [
    (0x20, "GETC"),
    (0x21, "OUT"),
    (0x22, "PUTS"),
    (0x23, "IN"),
    (0x24, "PUTSP"),
    (0x25, "HALT"),
];

pub fn disassemble_one(m: &mut Machine, addr: u16) {
    let line = line_for(m, addr);
    println!("{}", line);
}

/// Print `[start, end)` in ascending order, wrapping modulo 2^16;
/// `end == start` lists the full 64K.
pub fn disassemble_range(m: &mut Machine, start: u16, end: u16) {
    let mut addr = start;
    loop {
        disassemble_one(m, addr);
        addr = addr.wrapping_add(1);
        if addr == end {
            break;
        }
    }
}

pub(crate) fn line_for(m: &mut Machine, addr: u16) -> String {
    let inst = m.read_memory(addr);
    let mut line = String::new();

    if m.gui_mode {
        // 1-based line addressing for the GUI's code pane; 'P' flags the
        // current PC once initialization is over.
        let marker = if !m.in_init && addr == m.regs.pc { 'P' } else { ' ' };
        line.push_str(&format!("CODE{}{:5}", marker, u32::from(addr) + 1));
    }

    let bpt = if m.is_breakpoint(addr) { 'B' } else { ' ' };
    match m.symbols.primary_name_at(addr) {
        Some(name) => line.push_str(&format!("{} {:>16.16} x{:04X} x{:04X} ", bpt, name, addr, inst)),
        None => line.push_str(&format!("{} {:17}x{:04X} x{:04X} ", bpt, "", addr, inst)),
    }

    line.push_str(&text_for(m, addr, inst));
    line
}

/// Mnemonic and operands for one word.
fn text_for(m: &Machine, addr: u16, inst: u16) -> String {
    let decoded = match Instruction::decode(inst) {
        Some(decoded) => decoded,
        None => return format!("{:width$}", "???", width = OPCODE_WIDTH),
    };

    let (mnemonic, operands) = match decoded {
        Instruction::BR(condition, pc_offset) => {
            let mut mnemonic = String::from("BR");
            if condition.n {
                mnemonic.push('n');
            }
            if condition.z {
                mnemonic.push('z');
            }
            if condition.p {
                mnemonic.push('p');
            }
            (mnemonic, target(m, addr, pc_offset, 9))
        }

        Instruction::ADD(dr, sr1, sr2) => ("ADD".to_string(), three_regs(dr, sr1, sr2)),
        Instruction::ADDIMM(dr, sr1, imm) => ("ADD".to_string(), regs_imm(dr, sr1, imm, 5)),
        Instruction::AND(dr, sr1, sr2) => ("AND".to_string(), three_regs(dr, sr1, sr2)),
        Instruction::ANDIMM(dr, sr1, imm) => ("AND".to_string(), regs_imm(dr, sr1, imm, 5)),

        Instruction::LD(dr, off) => ("LD".to_string(), reg_target(m, addr, dr, off)),
        Instruction::LDI(dr, off) => ("LDI".to_string(), reg_target(m, addr, dr, off)),
        Instruction::LEA(dr, off) => ("LEA".to_string(), reg_target(m, addr, dr, off)),
        Instruction::ST(sr, off) => ("ST".to_string(), reg_target(m, addr, sr, off)),
        Instruction::STI(sr, off) => ("STI".to_string(), reg_target(m, addr, sr, off)),

        Instruction::LDR(dr, base, off) => ("LDR".to_string(), regs_imm(dr, base, off, 6)),
        Instruction::STR(sr, base, off) => ("STR".to_string(), regs_imm(sr, base, off, 6)),

        Instruction::NOT(dr, sr) => (
            "NOT".to_string(),
            format!("R{},R{}", dr as usize, sr as usize),
        ),

        Instruction::JMP(base) => ("JMP".to_string(), format!("R{}", base as usize)),
        Instruction::RET => ("RET".to_string(), String::new()),
        Instruction::JSR(off) => ("JSR".to_string(), target(m, addr, off, 11)),
        Instruction::JSRR(base) => ("JSRR".to_string(), format!("R{}", base as usize)),
        Instruction::RTI => ("RTI".to_string(), String::new()),

        Instruction::TRAP(vector) => {
            match TRAP_NAMES.iter().find(|(v, _)| *v == vector) {
                Some((_, name)) => ((*name).to_string(), String::new()),
                None => ("TRAP".to_string(), format!("x{:02X}", vector)),
            }
        }
    };

    format!("{:width$}{}", mnemonic, operands, width = OPCODE_WIDTH)
}

fn three_regs(a: Register, b: Register, c: Register) -> String {
    format!("R{},R{},R{}", a as usize, b as usize, c as usize)
}

fn regs_imm(a: Register, b: Register, imm: u16, bits: u8) -> String {
    format!("R{},R{},#{}", a as usize, b as usize, imm.signed(bits))
}

fn reg_target(m: &Machine, addr: u16, reg: Register, off: u16) -> String {
    format!("R{},{}", reg as usize, target(m, addr, off, 9))
}

/// PC-relative targets prefer the primary label at the destination.
fn target(m: &Machine, addr: u16, off: u16, bits: u8) -> String {
    let tgt = Instruction::relative_target(addr, off, bits);
    match m.symbols.primary_name_at(tgt) {
        Some(name) => name.to_string(),
        None => format!("x{:04X}", tgt),
    }
}

pub fn dump_memory(m: &mut Machine, start: u16, end: u16) {
    for line in dump_lines(m, start, end) {
        println!("{}", line);
    }
}

/// Hex + ASCII rows of 12 words, aligned to multiples of 12, blank outside
/// the requested range.
pub(crate) fn dump_lines(m: &mut Machine, start: u16, end: u16) -> Vec<String> {
    let start = i64::from(start);
    let mut end = i64::from(end);
    if start >= end {
        end += 0x10000;
    }

    let mut lines = Vec::new();
    let mut row = (start / 12) * 12;
    while row < end {
        let mut line = format!("{:04X}: ", row & 0xffff);
        let mut words = [None; 12];

        for (i, slot) in words.iter_mut().enumerate() {
            let addr = row + i as i64;
            if addr >= start && addr < end {
                let word = m.read_memory((addr & 0xffff) as u16);
                *slot = Some(word);
                line.push_str(&format!("{:04X} ", word));
            } else {
                line.push_str("     ");
            }
        }

        line.push(' ');
        for slot in &words {
            match slot {
                Some(word) if *word >= 0x20 && *word < 0x7f => {
                    line.push(*word as u8 as char);
                }
                Some(_) => line.push('.'),
                None => line.push(' '),
            }
        }

        lines.push(line);
        row += 12;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Machine;

    #[test]
    fn plain_line_layout() {
        let mut m = Machine::fixture();
        m.write_memory(0x3000, 0x10fb); // ADD R0,R3,#-5
        let line = line_for(&mut m, 0x3000);
        assert_eq!(line, format!("  {:17}x3000 x10FB ADD   R0,R3,#-5", ""));
    }

    #[test]
    fn labeled_line_layout() {
        let mut m = Machine::fixture();
        m.symbols.add("START", 0x3000, true);
        let line = line_for(&mut m, 0x3000);
        assert_eq!(line, format!("  {:>16} x3000 x0000 BR    x3001", "START"));
    }

    #[test]
    fn long_labels_are_truncated() {
        let mut m = Machine::fixture();
        m.symbols.add("AN_EXCESSIVELY_LONG_LABEL", 0x3000, true);
        let line = line_for(&mut m, 0x3000);
        assert!(line.starts_with("  AN_EXCESSIVELY_L x3000"));
    }

    #[test]
    fn breakpoint_marker() {
        let mut m = Machine::fixture();
        m.set_breakpoint(0x3000);
        let line = line_for(&mut m, 0x3000);
        assert!(line.starts_with("B "));
    }

    #[test]
    fn gui_prefix_marks_pc() {
        let mut m = Machine::fixture();
        m.gui_mode = true;
        assert!(line_for(&mut m, 0x3000).starts_with("CODEP12289"));
        assert!(line_for(&mut m, 0x3001).starts_with("CODE 12290"));
        m.in_init = true;
        assert!(line_for(&mut m, 0x3000).starts_with("CODE 12289"));
    }

    #[test]
    fn branch_mask_suffixes() {
        let mut m = Machine::fixture();
        m.write_memory(0x3000, 0x0403); // BRz +3
        assert!(line_for(&mut m, 0x3000).ends_with("BRz   x3004"));
        m.write_memory(0x3001, 0x0e00); // BRnzp +0
        assert!(line_for(&mut m, 0x3001).ends_with("BRnzp x3002"));
        m.write_memory(0x3002, 0x0000); // mask 000: bare BR
        assert!(line_for(&mut m, 0x3002).ends_with("BR    x3003"));
    }

    #[test]
    fn pc_relative_target_uses_label() {
        let mut m = Machine::fixture();
        m.symbols.add("LOOP", 0x2ffe, true);
        m.write_memory(0x3000, 0x0ffd); // BRnzp #-3
        assert!(line_for(&mut m, 0x3000).ends_with("BRnzp LOOP"));
    }

    #[test]
    fn memory_ops_render_operands() {
        let mut m = Machine::fixture();
        m.write_memory(0x3000, 0x6241); // LDR R1,R1,#1
        assert!(line_for(&mut m, 0x3000).ends_with("LDR   R1,R1,#1"));
        m.write_memory(0x3001, 0x7e3f); // STR R7,R0,#-1
        assert!(line_for(&mut m, 0x3001).ends_with("STR   R7,R0,#-1"));
        m.write_memory(0x3002, 0x21ff); // LD R0, PC-1
        assert!(line_for(&mut m, 0x3002).ends_with("LD    R0,x3002"));
        m.write_memory(0x3003, 0x927f); // NOT R1,R1
        assert!(line_for(&mut m, 0x3003).ends_with("NOT   R1,R1"));
    }

    #[test]
    fn jumps_and_traps() {
        let mut m = Machine::fixture();
        m.write_memory(0x3000, 0xc080);
        assert!(line_for(&mut m, 0x3000).ends_with("JMP   R2"));
        m.write_memory(0x3001, 0xc1c0);
        assert!(line_for(&mut m, 0x3001).trim_end().ends_with("RET"));
        m.write_memory(0x3002, 0x4803);
        assert!(line_for(&mut m, 0x3002).ends_with("JSR   x3006"));
        m.write_memory(0x3003, 0xf025);
        assert!(line_for(&mut m, 0x3003).trim_end().ends_with("HALT"));
        m.write_memory(0x3004, 0xf030);
        assert!(line_for(&mut m, 0x3004).ends_with("TRAP  x30"));
        m.write_memory(0x3005, 0xd000);
        assert!(line_for(&mut m, 0x3005).trim_end().ends_with("???"));
    }

    #[test]
    fn dump_rows_align_to_twelve() {
        let mut m = Machine::fixture();
        m.write_memory(0x3005, 0x0041);
        m.write_memory(0x3006, 0x1234);
        let lines = dump_lines(&mut m, 0x3005, 0x3007);
        assert_eq!(lines.len(), 1);

        let mut expected = String::from("3000: ");
        expected += &"     ".repeat(5); // five words before the range
        expected += "0041 1234 ";
        expected += &"     ".repeat(5); // five words after it
        expected += "      A.     "; // separator, then the ASCII column
        assert_eq!(lines[0], expected);
    }

    #[test]
    fn dump_full_memory_when_range_wraps_to_itself() {
        let mut m = Machine::fixture();
        let lines = dump_lines(&mut m, 0, 0);
        assert_eq!(lines.len(), 65536 / 12 + 1);
    }
}
