use std::fmt;

/// The operand fields of an instruction word. Every word decodes; which
/// fields mean anything depends on the opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operands {
    /// high nibble, selects the instruction family
    pub op: u8,
    /// bits 8..11, register index
    pub x: u8,
    /// bits 4..7, register index
    pub y: u8,
    /// bits 0..3, sprite height or sub-opcode
    pub n: u8,
    /// bits 0..7, immediate byte
    pub kk: u8,
    /// bits 0..11, address
    pub nnn: u16,
}

impl From<u16> for Operands {
    fn from(word: u16) -> Self {
        Operands {
            op: (word >> 12) as u8,
            x: ((word >> 8) & 0xf) as u8,
            y: ((word >> 4) & 0xf) as u8,
            n: (word & 0xf) as u8,
            kk: (word & 0xff) as u8,
            nnn: word & 0xfff,
        }
    }
}

/// Every instruction the interpreter knows. Register operands are indices
/// 0..=15.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 0nnn: machine code routine on the original hardware; ignored
    Sys(u16),
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1nnn
    Jump(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SkipIfEqualImm(u8, u8),
    /// 4xkk
    SkipIfNotEqualImm(u8, u8),
    /// 5xy0
    SkipIfEqual(u8, u8),
    /// 6xkk
    LoadImm(u8, u8),
    /// 7xkk
    AddImm(u8, u8),
    /// 8xy0
    Load(u8, u8),
    /// 8xy1
    Or(u8, u8),
    /// 8xy2
    And(u8, u8),
    /// 8xy3
    Xor(u8, u8),
    /// 8xy4
    Add(u8, u8),
    /// 8xy5
    Sub(u8, u8),
    /// 8xy6
    ShiftRight(u8),
    /// 8xy7
    SubN(u8, u8),
    /// 8xyE
    ShiftLeft(u8),
    /// 9xy0
    SkipIfNotEqual(u8, u8),
    /// Annn
    LoadIndex(u16),
    /// Bnnn
    JumpOffset(u16),
    /// Cxkk
    Random(u8, u8),
    /// Dxyn
    Draw(u8, u8, u8),
    /// Ex9E
    SkipIfKey(u8),
    /// ExA1
    SkipIfNotKey(u8),
    /// Fx07
    GetDelayTimer(u8),
    /// Fx0A
    WaitForKey(u8),
    /// Fx15
    SetDelayTimer(u8),
    /// Fx18
    SetSoundTimer(u8),
    /// Fx1E
    AddToIndex(u8),
    /// Fx29
    LoadGlyph(u8),
    /// Fx33
    StoreBcd(u8),
    /// Fx55
    StoreRegisters(u8),
    /// Fx65
    LoadRegisters(u8),
}

impl Instruction {
    /// Map a word to its instruction, or None for encodings with no meaning.
    pub fn decode(word: u16) -> Option<Instruction> {
        let Operands {
            op,
            x,
            y,
            n,
            kk,
            nnn,
        } = Operands::from(word);

        let instruction = match (op, n) {
            (0x0, _) => match nnn {
                0x0e0 => Instruction::ClearScreen,
                0x0ee => Instruction::Return,
                _ => Instruction::Sys(nnn),
            },
            (0x1, _) => Instruction::Jump(nnn),
            (0x2, _) => Instruction::Call(nnn),
            (0x3, _) => Instruction::SkipIfEqualImm(x, kk),
            (0x4, _) => Instruction::SkipIfNotEqualImm(x, kk),
            (0x5, 0x0) => Instruction::SkipIfEqual(x, y),
            (0x6, _) => Instruction::LoadImm(x, kk),
            (0x7, _) => Instruction::AddImm(x, kk),
            (0x8, 0x0) => Instruction::Load(x, y),
            (0x8, 0x1) => Instruction::Or(x, y),
            (0x8, 0x2) => Instruction::And(x, y),
            (0x8, 0x3) => Instruction::Xor(x, y),
            (0x8, 0x4) => Instruction::Add(x, y),
            (0x8, 0x5) => Instruction::Sub(x, y),
            (0x8, 0x6) => Instruction::ShiftRight(x),
            (0x8, 0x7) => Instruction::SubN(x, y),
            (0x8, 0xe) => Instruction::ShiftLeft(x),
            (0x9, 0x0) => Instruction::SkipIfNotEqual(x, y),
            (0xa, _) => Instruction::LoadIndex(nnn),
            (0xb, _) => Instruction::JumpOffset(nnn),
            (0xc, _) => Instruction::Random(x, kk),
            (0xd, _) => Instruction::Draw(x, y, n),
            (0xe, _) => match kk {
                0x9e => Instruction::SkipIfKey(x),
                0xa1 => Instruction::SkipIfNotKey(x),
                _ => return None,
            },
            (0xf, _) => match kk {
                0x07 => Instruction::GetDelayTimer(x),
                0x0a => Instruction::WaitForKey(x),
                0x15 => Instruction::SetDelayTimer(x),
                0x18 => Instruction::SetSoundTimer(x),
                0x1e => Instruction::AddToIndex(x),
                0x29 => Instruction::LoadGlyph(x),
                0x33 => Instruction::StoreBcd(x),
                0x55 => Instruction::StoreRegisters(x),
                0x65 => Instruction::LoadRegisters(x),
                _ => return None,
            },
            _ => return None,
        };
        Some(instruction)
    }

    /// only CLS and DRW touch the frame buffer
    pub fn changes_display(&self) -> bool {
        matches!(self, Instruction::ClearScreen | Instruction::Draw(..))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Sys(a) => write!(f, "SYS {:#05x}", a),
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(a) => write!(f, "JP {:#05x}", a),
            Call(a) => write!(f, "CALL {:#05x}", a),
            SkipIfEqualImm(x, kk) => write!(f, "SE V{:X}, {:#04x}", x, kk),
            SkipIfNotEqualImm(x, kk) => write!(f, "SNE V{:X}, {:#04x}", x, kk),
            SkipIfEqual(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadImm(x, kk) => write!(f, "LD V{:X}, {:#04x}", x, kk),
            AddImm(x, kk) => write!(f, "ADD V{:X}, {:#04x}", x, kk),
            Load(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            Add(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight(x) => write!(f, "SHR V{:X}", x),
            SubN(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft(x) => write!(f, "SHL V{:X}", x),
            SkipIfNotEqual(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadIndex(a) => write!(f, "LD I, {:#05x}", a),
            JumpOffset(a) => write!(f, "JP V0, {:#05x}", a),
            Random(x, kk) => write!(f, "RND V{:X}, {:#04x}", x, kk),
            Draw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipIfKey(x) => write!(f, "SKP V{:X}", x),
            SkipIfNotKey(x) => write!(f, "SKNP V{:X}", x),
            GetDelayTimer(x) => write!(f, "LD V{:X}, DT", x),
            WaitForKey(x) => write!(f, "LD V{:X}, K", x),
            SetDelayTimer(x) => write!(f, "LD DT, V{:X}", x),
            SetSoundTimer(x) => write!(f, "LD ST, V{:X}", x),
            AddToIndex(x) => write!(f, "ADD I, V{:X}", x),
            LoadGlyph(x) => write!(f, "LD F, V{:X}", x),
            StoreBcd(x) => write!(f, "LD B, V{:X}", x),
            StoreRegisters(x) => write!(f, "LD [I], V{:X}", x),
            LoadRegisters(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::mem::discriminant;

    #[test]
    fn test_operand_fields() {
        let o = Operands::from(0xd12f);
        assert_eq!(o.op, 0xd);
        assert_eq!(o.x, 0x1);
        assert_eq!(o.y, 0x2);
        assert_eq!(o.n, 0xf);
        assert_eq!(o.kk, 0x2f);
        assert_eq!(o.nnn, 0x12f);
    }

    #[test]
    fn test_decode_table() {
        use Instruction::*;
        let cases = [
            (0x0123, Sys(0x123)),
            (0x00e0, ClearScreen),
            (0x00ee, Return),
            (0x1abc, Jump(0xabc)),
            (0x2abc, Call(0xabc)),
            (0x3a42, SkipIfEqualImm(0xa, 0x42)),
            (0x4a42, SkipIfNotEqualImm(0xa, 0x42)),
            (0x5ab0, SkipIfEqual(0xa, 0xb)),
            (0x6a42, LoadImm(0xa, 0x42)),
            (0x7a42, AddImm(0xa, 0x42)),
            (0x8ab0, Load(0xa, 0xb)),
            (0x8ab1, Or(0xa, 0xb)),
            (0x8ab2, And(0xa, 0xb)),
            (0x8ab3, Xor(0xa, 0xb)),
            (0x8ab4, Add(0xa, 0xb)),
            (0x8ab5, Sub(0xa, 0xb)),
            (0x8ab6, ShiftRight(0xa)),
            (0x8ab7, SubN(0xa, 0xb)),
            (0x8abe, ShiftLeft(0xa)),
            (0x9ab0, SkipIfNotEqual(0xa, 0xb)),
            (0xaabc, LoadIndex(0xabc)),
            (0xbabc, JumpOffset(0xabc)),
            (0xca42, Random(0xa, 0x42)),
            (0xdab5, Draw(0xa, 0xb, 5)),
            (0xea9e, SkipIfKey(0xa)),
            (0xeaa1, SkipIfNotKey(0xa)),
            (0xfa07, GetDelayTimer(0xa)),
            (0xfa0a, WaitForKey(0xa)),
            (0xfa15, SetDelayTimer(0xa)),
            (0xfa18, SetSoundTimer(0xa)),
            (0xfa1e, AddToIndex(0xa)),
            (0xfa29, LoadGlyph(0xa)),
            (0xfa33, StoreBcd(0xa)),
            (0xfa55, StoreRegisters(0xa)),
            (0xfa65, LoadRegisters(0xa)),
        ];
        for (word, expected) in cases.iter() {
            assert_eq!(Instruction::decode(*word), Some(*expected), "{:04x}", word);
        }
        let kinds: HashSet<_> = cases.iter().map(|(_, i)| discriminant(i)).collect();
        assert_eq!(kinds.len(), 35);
    }

    #[test]
    fn test_unrecognised_encodings() {
        for word in [0x5ab1, 0x8ab8, 0x8abf, 0x9ab1, 0xea9f, 0xe000, 0xfa00, 0xfaff] {
            assert_eq!(Instruction::decode(word), None, "{:04x}", word);
        }
    }

    #[test]
    fn test_changes_display() {
        assert!(Instruction::ClearScreen.changes_display());
        assert!(Instruction::Draw(0, 0, 1).changes_display());
        assert!(!Instruction::Return.changes_display());
        assert!(!Instruction::LoadImm(0, 0).changes_display());
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instruction::LoadImm(0, 0x11).to_string(), "LD V0, 0x11");
        assert_eq!(Instruction::Draw(1, 2, 5).to_string(), "DRW V1, V2, 5");
        assert_eq!(Instruction::Call(0x2a0).to_string(), "CALL 0x2a0");
        assert_eq!(Instruction::LoadRegisters(0xf).to_string(), "LD VF, [I]");
    }
}
