//! The bundled LC-3 OS: trap vector table, keyboard/display service
//! routines, and the boot sequence that prints a welcome banner and halts.
//! The original tool ships this as assembler output baked into the binary;
//! here the image is assembled once at first use, with labels captured as
//! the words are laid down so every PC-relative offset is derived from real
//! positions.

use lazy_static::lazy_static;

/// Where the machine starts executing after a reset.
pub const RESET_VECTOR: u16 = 0x0200;

const KBSR: u16 = 0xfe00;
const KBDR: u16 = 0xfe02;
const DSR: u16 = 0xfe04;
const DDR: u16 = 0xfe06;
const MCR: u16 = 0xfffe;

const R0: u16 = 0;
const R1: u16 = 1;
const R2: u16 = 2;
const R6: u16 = 6;
const R7: u16 = 7;

const BRP: u16 = 0b001;
const BRZ: u16 = 0b010;
const BRZP: u16 = 0b011;
const BRNZP: u16 = 0b111;

const RET: u16 = 0xc1c0;

const WELCOME: &str = "\nWelcome to the LC-3 simulator.\n\n\
                       Load a program with the 'file' command, and type 'help' for a list\n\
                       of simulator commands.\n\n";
const IN_PROMPT: &str = "\nInput a character> ";
const HALTING: &str = "\n\n--- halting the LC-3 ---\n\n";
const BAD_TRAP_MSG: &str = "\n\n--- undefined trap executed ---\n\n";

pub struct OsImage {
    /// Object-file words: load address first, then the body.
    pub object: Vec<u16>,
    /// Symbol listing in `.sym` format, fed through the normal parser.
    pub symbols: String,
}

lazy_static! {
    pub static ref OS_IMAGE: OsImage = build();
}

struct Asm {
    words: Vec<u16>,
}

impl Asm {
    fn here(&self) -> u16 {
        self.words.len() as u16
    }

    fn word(&mut self, word: u16) {
        self.words.push(word);
    }

    fn stringz(&mut self, text: &str) -> u16 {
        let label = self.here();
        for byte in text.bytes() {
            self.word(u16::from(byte));
        }
        self.word(0);
        label
    }

    fn fill(&mut self, value: u16) -> u16 {
        let label = self.here();
        self.word(value);
        label
    }

    /// Emit a placeholder for a forward branch; resolved by `patch_br`.
    fn reserve(&mut self) -> u16 {
        let at = self.here();
        self.word(0);
        at
    }

    fn patch_br(&mut self, at: u16, mask: u16, target: u16) {
        self.words[at as usize] = enc_br(mask, target, at);
    }

    fn ld(&mut self, dr: u16, target: u16) {
        let at = self.here();
        self.word(0x2000 | dr << 9 | off9(target, at));
    }

    fn st(&mut self, sr: u16, target: u16) {
        let at = self.here();
        self.word(0x3000 | sr << 9 | off9(target, at));
    }

    fn ldi(&mut self, dr: u16, target: u16) {
        let at = self.here();
        self.word(0xa000 | dr << 9 | off9(target, at));
    }

    fn sti(&mut self, sr: u16, target: u16) {
        let at = self.here();
        self.word(0xb000 | sr << 9 | off9(target, at));
    }

    fn lea(&mut self, dr: u16, target: u16) {
        let at = self.here();
        self.word(0xe000 | dr << 9 | off9(target, at));
    }

    fn br(&mut self, mask: u16, target: u16) {
        let at = self.here();
        self.word(enc_br(mask, target, at));
    }

    fn ldr(&mut self, dr: u16, base: u16, offset: u16) {
        self.word(0x6000 | dr << 9 | base << 6 | (offset & 0x3f));
    }

    fn add_imm(&mut self, dr: u16, sr: u16, imm: i16) {
        assert!(imm >= -16 && imm <= 15);
        self.word(0x1000 | dr << 9 | sr << 6 | 0x20 | (imm as u16 & 0x1f));
    }

    fn add_reg(&mut self, dr: u16, sr1: u16, sr2: u16) {
        self.word(0x1000 | dr << 9 | sr1 << 6 | sr2);
    }

    fn and_imm(&mut self, dr: u16, sr: u16, imm: i16) {
        assert!(imm >= -16 && imm <= 15);
        self.word(0x5000 | dr << 9 | sr << 6 | 0x20 | (imm as u16 & 0x1f));
    }

    fn and_reg(&mut self, dr: u16, sr1: u16, sr2: u16) {
        self.word(0x5000 | dr << 9 | sr1 << 6 | sr2);
    }

    fn trap(&mut self, vector: u16) {
        self.word(0xf000 | vector);
    }
}

fn enc_br(mask: u16, target: u16, at: u16) -> u16 {
    mask << 9 | off9(target, at)
}

fn off9(target: u16, at: u16) -> u16 {
    let diff = target.wrapping_sub(at.wrapping_add(1)) as i16;
    assert!(diff >= -256 && diff <= 255, "pc offset out of range");
    (diff as u16) & 0x1ff
}

fn build() -> OsImage {
    let mut a = Asm {
        // Trap and interrupt vector tables, plus the four boot words;
        // both are filled in below once the routine addresses exist.
        words: vec![0; 0x204],
    };

    // Strings and data sit between the boot code and the service routines
    // so that every routine reference is a short backward offset.
    let welcome = a.stringz(WELCOME);
    let in_prompt = a.stringz(IN_PROMPT);
    let halting = a.stringz(HALTING);
    let bad_trap_msg = a.stringz(BAD_TRAP_MSG);

    let os_kbsr = a.fill(KBSR);
    let os_kbdr = a.fill(KBDR);
    let os_dsr = a.fill(DSR);
    let os_ddr = a.fill(DDR);
    let os_mcr = a.fill(MCR);
    let os_sp = a.fill(0x3000);
    let mask_lo = a.fill(0x00ff);

    // Per-routine register save slots; the routines nest (IN and BAD_TRAP
    // call other traps), so they cannot share.
    let out_r1 = a.fill(0);
    let puts_r0 = a.fill(0);
    let puts_r1 = a.fill(0);
    let puts_r7 = a.fill(0);
    let in_r0 = a.fill(0);
    let in_r7 = a.fill(0);
    let putsp_r0 = a.fill(0);
    let putsp_r1 = a.fill(0);
    let putsp_r2 = a.fill(0);
    let putsp_r7 = a.fill(0);
    let halt_r0 = a.fill(0);
    let halt_r7 = a.fill(0);
    let bad_r0 = a.fill(0);
    let bad_r7 = a.fill(0);

    // TRAP x20 -- GETC: spin on KBSR, fetch the character into R0.
    let trap_getc = a.here();
    a.ldi(R0, os_kbsr);
    a.br(BRZP, trap_getc);
    a.ldi(R0, os_kbdr);
    a.word(RET);

    // TRAP x21 -- OUT: spin on DSR, write R0's low byte to DDR.
    let trap_out = a.here();
    a.st(R1, out_r1);
    let out_wait = a.here();
    a.ldi(R1, os_dsr);
    a.br(BRZP, out_wait);
    a.sti(R0, os_ddr);
    a.ld(R1, out_r1);
    a.word(RET);

    // TRAP x22 -- PUTS: one character per word, NUL terminated.
    let trap_puts = a.here();
    a.st(R0, puts_r0);
    a.st(R1, puts_r1);
    a.st(R7, puts_r7);
    a.add_imm(R1, R0, 0);
    let puts_loop = a.here();
    a.ldr(R0, R1, 0);
    let puts_done_br = a.reserve();
    a.trap(0x21);
    a.add_imm(R1, R1, 1);
    a.br(BRNZP, puts_loop);
    let puts_done = a.here();
    a.patch_br(puts_done_br, BRZ, puts_done);
    a.ld(R7, puts_r7);
    a.ld(R1, puts_r1);
    a.ld(R0, puts_r0);
    a.word(RET);

    // TRAP x23 -- IN: prompt, read, echo, trailing newline.
    let trap_in = a.here();
    a.st(R7, in_r7);
    a.lea(R0, in_prompt);
    a.trap(0x22);
    a.trap(0x20);
    a.st(R0, in_r0);
    a.trap(0x21);
    a.and_imm(R0, R0, 0);
    a.add_imm(R0, R0, 10);
    a.trap(0x21);
    a.ld(R0, in_r0);
    a.ld(R7, in_r7);
    a.word(RET);

    // TRAP x24 -- PUTSP: packed strings, low byte first. The high byte is
    // recovered by rotating the word left eight times, carrying the sign
    // bit around.
    let trap_putsp = a.here();
    a.st(R0, putsp_r0);
    a.st(R1, putsp_r1);
    a.st(R2, putsp_r2);
    a.st(R7, putsp_r7);
    a.add_imm(R1, R0, 0);
    let putsp_loop = a.here();
    a.ldr(R2, R1, 0);
    let putsp_done_br1 = a.reserve();
    a.ld(R0, mask_lo);
    a.and_reg(R0, R0, R2);
    a.trap(0x21);
    a.and_imm(R0, R0, 0);
    a.add_imm(R0, R0, 8);
    let putsp_rot = a.here();
    a.add_imm(R2, R2, 0);
    let putsp_pos_br = a.reserve();
    a.add_reg(R2, R2, R2);
    a.add_imm(R2, R2, 1);
    let putsp_dec_br = a.reserve();
    let putsp_pos = a.here();
    a.patch_br(putsp_pos_br, BRZP, putsp_pos);
    a.add_reg(R2, R2, R2);
    let putsp_dec = a.here();
    a.patch_br(putsp_dec_br, BRNZP, putsp_dec);
    a.add_imm(R0, R0, -1);
    a.br(BRP, putsp_rot);
    a.ld(R0, mask_lo);
    a.and_reg(R0, R0, R2);
    let putsp_done_br2 = a.reserve();
    a.trap(0x21);
    a.add_imm(R1, R1, 1);
    a.br(BRNZP, putsp_loop);
    let putsp_done = a.here();
    a.patch_br(putsp_done_br1, BRZ, putsp_done);
    a.patch_br(putsp_done_br2, BRZ, putsp_done);
    a.ld(R7, putsp_r7);
    a.ld(R2, putsp_r2);
    a.ld(R1, putsp_r1);
    a.ld(R0, putsp_r0);
    a.word(RET);

    // TRAP x25 -- HALT: banner, then clear the MCR clock-enable bit. A
    // later `continue` resumes just past the STI and returns to the caller.
    let trap_halt = a.here();
    a.st(R7, halt_r7);
    a.st(R0, halt_r0);
    a.lea(R0, halting);
    a.trap(0x22);
    a.and_imm(R0, R0, 0);
    a.sti(R0, os_mcr);
    a.ld(R0, halt_r0);
    a.ld(R7, halt_r7);
    a.word(RET);

    // Unset vectors complain and halt.
    let bad_trap = a.here();
    a.st(R7, bad_r7);
    a.st(R0, bad_r0);
    a.lea(R0, bad_trap_msg);
    a.trap(0x22);
    a.trap(0x25);
    a.ld(R0, bad_r0);
    a.ld(R7, bad_r7);
    a.word(RET);

    // Boot code, patched now that its targets exist.
    a.words[0x200] = {
        let at = 0x200;
        0x2000 | R6 << 9 | off9(os_sp, at)
    };
    a.words[0x201] = {
        let at = 0x201;
        0xe000 | R0 << 9 | off9(welcome, at)
    };
    a.words[0x202] = 0xf022;
    a.words[0x203] = 0xf025;

    // Vector tables: traps x20-x25 are wired, everything else lands in
    // BAD_TRAP, including the interrupt vectors at x100-x1FF.
    for vector in 0x00..0x200 {
        a.words[vector] = bad_trap;
    }
    a.words[0x20] = trap_getc;
    a.words[0x21] = trap_out;
    a.words[0x22] = trap_puts;
    a.words[0x23] = trap_in;
    a.words[0x24] = trap_putsp;
    a.words[0x25] = trap_halt;

    let labels = [
        ("OS_START", RESET_VECTOR),
        ("TRAP_GETC", trap_getc),
        ("TRAP_OUT", trap_out),
        ("TRAP_PUTS", trap_puts),
        ("TRAP_IN", trap_in),
        ("TRAP_PUTSP", trap_putsp),
        ("TRAP_HALT", trap_halt),
        ("BAD_TRAP", bad_trap),
    ];
    let mut symbols = String::from(
        "// Symbol table\n\
         // Scope level 0:\n\
         //\tSymbol Name       Page Address\n\
         //\t----------------  ------------\n",
    );
    for (name, addr) in &labels {
        symbols.push_str(&format!("//\t{:17} {:04X}\n", name, addr));
    }

    // Object format: load address first.
    let mut object = Vec::with_capacity(a.words.len() + 1);
    object.push(0x0000);
    object.extend(a.words);

    OsImage { object, symbols }
}
