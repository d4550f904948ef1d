use crate::vm::error::{VmError, VmResult};
use crate::vm::instructions::{Instruction, Operands};

/// Cursor over a method's bytecode, positioned after the opcode being decoded.
pub struct BytecodeReader<'a> {
    code: &'a [u8],
    position: usize,
}

impl<'a> BytecodeReader<'a> {
    pub fn new(code: &'a [u8], position: usize) -> BytecodeReader<'a> {
        BytecodeReader { code, position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.code.len().saturating_sub(self.position)
    }

    pub fn read_u8(&mut self) -> VmResult<u8> {
        let b = *self.code.get(self.position)
            .ok_or_else(|| VmError::internal(format!("truncated bytecode at {}", self.position)))?;
        self.position += 1;
        Ok(b)
    }

    pub fn read_i8(&mut self) -> VmResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> VmResult<u16> {
        Ok(u16::from_be_bytes([self.read_u8()?, self.read_u8()?]))
    }

    pub fn read_i16(&mut self) -> VmResult<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> VmResult<i32> {
        Ok(i32::from_be_bytes([self.read_u8()?, self.read_u8()?, self.read_u8()?, self.read_u8()?]))
    }

    /// Skips the 0-3 padding bytes which align switch operands to the method start.
    pub fn align(&mut self) {
        while self.position % 4 != 0 {
            self.position += 1;
        }
    }
}

pub fn none(_: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    Ok(Operands::None)
}

/// Value encoded in the opcode itself: `iconst_<n>`, `lconst_<n>`, `fconst_<n>`, `dconst_<n>`.
pub fn implicit_value(_: &mut BytecodeReader, opcode: u8) -> VmResult<Operands> {
    let value = match opcode {
        0x02..=0x08 => opcode as i32 - 0x03,
        0x09..=0x0a => opcode as i32 - 0x09,
        0x0b..=0x0d => opcode as i32 - 0x0b,
        0x0e..=0x0f => opcode as i32 - 0x0e,
        _ => return Err(VmError::internal(format!("opcode {:#x} has no implicit value", opcode)))
    };
    Ok(Operands::Int(value))
}

/// Local variable index encoded in the opcode: `<t>load_<n>` and `<t>store_<n>`.
pub fn implicit_local(_: &mut BytecodeReader, opcode: u8) -> VmResult<Operands> {
    let index = match opcode {
        0x1a..=0x2d => (opcode - 0x1a) % 4,
        0x3b..=0x4e => (opcode - 0x3b) % 4,
        _ => return Err(VmError::internal(format!("opcode {:#x} has no implicit local", opcode)))
    };
    Ok(Operands::Index(index as u16))
}

pub fn byte(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    Ok(Operands::Int(reader.read_i8()? as i32))
}

pub fn short(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    Ok(Operands::Int(reader.read_i16()? as i32))
}

pub fn index8(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    Ok(Operands::Index(reader.read_u8()? as u16))
}

pub fn index16(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    Ok(Operands::Index(reader.read_u16()?))
}

pub fn branch16(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    Ok(Operands::Int(reader.read_i16()? as i32))
}

pub fn branch32(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    Ok(Operands::Int(reader.read_i32()?))
}

pub fn iinc(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    Ok(Operands::Iinc(reader.read_u8()? as u16, reader.read_i8()? as i32))
}

pub fn invokeinterface(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    let index = reader.read_u16()?;
    let count = reader.read_u8()?;
    reader.read_u8()?; // always zero
    Ok(Operands::IndexCount(index, count))
}

pub fn invokedynamic(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    let index = reader.read_u16()?;
    reader.read_u16()?;
    Ok(Operands::Index(index))
}

pub fn multianewarray(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    Ok(Operands::IndexCount(reader.read_u16()?, reader.read_u8()?))
}

pub fn tableswitch(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    reader.align();
    let default = reader.read_i32()?;
    let low = reader.read_i32()?;
    let high = reader.read_i32()?;
    if high < low {
        return Err(VmError::internal(format!("tableswitch with low {} > high {}", low, high)));
    }

    let count = (high as i64 - low as i64 + 1) as usize;
    let mut offsets = Vec::with_capacity(count.min(reader.remaining() / 4));
    for _ in low..=high {
        offsets.push(reader.read_i32()?);
    }
    Ok(Operands::TableSwitch { default, low, offsets })
}

pub fn lookupswitch(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    reader.align();
    let default = reader.read_i32()?;
    let npairs = reader.read_i32()?;
    if npairs < 0 {
        return Err(VmError::internal(format!("lookupswitch with {} pairs", npairs)));
    }

    let mut pairs = Vec::with_capacity((npairs as usize).min(reader.remaining() / 8));
    for _ in 0..npairs {
        pairs.push((reader.read_i32()?, reader.read_i32()?));
    }
    Ok(Operands::LookupSwitch { default, pairs })
}

/// `wide` widens the local variable index of the following load, store, `ret` or `iinc`.
pub fn wide(reader: &mut BytecodeReader, _: u8) -> VmResult<Operands> {
    use Instruction as I;

    let opcode = reader.read_u8()?;
    let instruction = Instruction::try_from(opcode)
        .map_err(|_| VmError::internal(format!("unknown opcode {:#x} after wide", opcode)))?;
    let index = reader.read_u16()?;
    match instruction {
        I::iinc => Ok(Operands::Wide(opcode, Box::new(Operands::Iinc(index, reader.read_i16()? as i32)))),
        I::iload | I::lload | I::fload | I::dload | I::aload
        | I::istore | I::lstore | I::fstore | I::dstore | I::astore | I::ret =>
            Ok(Operands::Wide(opcode, Box::new(Operands::Index(index)))),
        other => Err(VmError::internal(format!("{:?} cannot be widened", other)))
    }
}
