use std::fmt::{Debug, Formatter};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use once_cell::sync::Lazy;
use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::instructions::reader::BytecodeReader;
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub mod reader;
mod constants;
mod loads;
mod stores;
mod stack;
mod math;
mod conversions;
mod comparisons;
mod control;
mod references;
mod invoke;
mod extended;

#[allow(non_camel_case_types)]
#[derive(TryFromPrimitive, IntoPrimitive, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Instruction {
    nop = 0,
    aconst_null = 1,
    iconst_m1 = 2,
    iconst_0 = 3,
    iconst_1 = 4,
    iconst_2 = 5,
    iconst_3 = 6,
    iconst_4 = 7,
    iconst_5 = 8,
    lconst_0 = 9,
    lconst_1 = 10,
    fconst_0 = 11,
    fconst_1 = 12,
    fconst_2 = 13,
    dconst_0 = 14,
    dconst_1 = 15,
    bipush = 16,
    sipush = 17,
    ldc = 18,
    ldc_w = 19,
    ldc2_w = 20,
    iload = 21,
    lload = 22,
    fload = 23,
    dload = 24,
    aload = 25,
    iload_0 = 26,
    iload_1 = 27,
    iload_2 = 28,
    iload_3 = 29,
    lload_0 = 30,
    lload_1 = 31,
    lload_2 = 32,
    lload_3 = 33,
    fload_0 = 34,
    fload_1 = 35,
    fload_2 = 36,
    fload_3 = 37,
    dload_0 = 38,
    dload_1 = 39,
    dload_2 = 40,
    dload_3 = 41,
    aload_0 = 42,
    aload_1 = 43,
    aload_2 = 44,
    aload_3 = 45,
    iaload = 46,
    laload = 47,
    faload = 48,
    daload = 49,
    aaload = 50,
    baload = 51,
    caload = 52,
    saload = 53,
    istore = 54,
    lstore = 55,
    fstore = 56,
    dstore = 57,
    astore = 58,
    istore_0 = 59,
    istore_1 = 60,
    istore_2 = 61,
    istore_3 = 62,
    lstore_0 = 63,
    lstore_1 = 64,
    lstore_2 = 65,
    lstore_3 = 66,
    fstore_0 = 67,
    fstore_1 = 68,
    fstore_2 = 69,
    fstore_3 = 70,
    dstore_0 = 71,
    dstore_1 = 72,
    dstore_2 = 73,
    dstore_3 = 74,
    astore_0 = 75,
    astore_1 = 76,
    astore_2 = 77,
    astore_3 = 78,
    iastore = 79,
    lastore = 80,
    fastore = 81,
    dastore = 82,
    aastore = 83,
    bastore = 84,
    castore = 85,
    sastore = 86,
    pop = 87,
    pop2 = 88,
    dup = 89,
    dup_x1 = 90,
    dup_x2 = 91,
    dup2 = 92,
    dup2_x1 = 93,
    dup2_x2 = 94,
    swap = 95,
    iadd = 96,
    ladd = 97,
    fadd = 98,
    dadd = 99,
    isub = 100,
    lsub = 101,
    fsub = 102,
    dsub = 103,
    imul = 104,
    lmul = 105,
    fmul = 106,
    dmul = 107,
    idiv = 108,
    ldiv = 109,
    fdiv = 110,
    ddiv = 111,
    irem = 112,
    lrem = 113,
    frem = 114,
    drem = 115,
    ineg = 116,
    lneg = 117,
    fneg = 118,
    dneg = 119,
    ishl = 120,
    lshl = 121,
    ishr = 122,
    lshr = 123,
    iushr = 124,
    lushr = 125,
    iand = 126,
    land = 127,
    ior = 128,
    lor = 129,
    ixor = 130,
    lxor = 131,
    iinc = 132,
    i2l = 133,
    i2f = 134,
    i2d = 135,
    l2i = 136,
    l2f = 137,
    l2d = 138,
    f2i = 139,
    f2l = 140,
    f2d = 141,
    d2i = 142,
    d2l = 143,
    d2f = 144,
    i2b = 145,
    i2c = 146,
    i2s = 147,
    lcmp = 148,
    fcmpl = 149,
    fcmpg = 150,
    dcmpl = 151,
    dcmpg = 152,
    ifeq = 153,
    ifne = 154,
    iflt = 155,
    ifge = 156,
    ifgt = 157,
    ifle = 158,
    if_icmpeq = 159,
    if_icmpne = 160,
    if_icmplt = 161,
    if_icmpge = 162,
    if_icmpgt = 163,
    if_icmple = 164,
    if_acmpeq = 165,
    if_acmpne = 166,
    goto = 167,
    jsr = 168,
    ret = 169,
    tableswitch = 170,
    lookupswitch = 171,
    ireturn = 172,
    lreturn = 173,
    freturn = 174,
    dreturn = 175,
    areturn = 176,
    _return = 177,
    getstatic = 178,
    putstatic = 179,
    getfield = 180,
    putfield = 181,
    invokevirtual = 182,
    invokespecial = 183,
    invokestatic = 184,
    invokeinterface = 185,
    invokedynamic = 186,
    new = 187,
    newarray = 188,
    anewarray = 189,
    arraylength = 190,
    athrow = 191,
    checkcast = 192,
    instanceof = 193,
    monitorenter = 194,
    monitorexit = 195,
    wide = 196,
    multianewarray = 197,
    ifnull = 198,
    ifnonnull = 199,
    goto_w = 200,
    jsr_w = 201,
    breakpoint = 202,
    /// Body of every native method, hands control to the native registry.
    invokenative = 254,
    impdep2 = 255,
}

/// Decoded operands of one instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operands {
    None,
    /// Immediate value or branch offset.
    Int(i32),
    /// Local variable or constant pool index.
    Index(u16),
    Iinc(u16, i32),
    /// Constant pool index with a count (`invokeinterface`, `multianewarray`).
    IndexCount(u16, u8),
    TableSwitch { default: i32, low: i32, offsets: Vec<i32> },
    LookupSwitch { default: i32, pairs: Vec<(i32, i32)> },
    /// Opcode widened by `wide` and its operands.
    Wide(u8, Box<Operands>),
}

impl Operands {
    pub fn int(&self) -> VmResult<i32> {
        match self {
            Operands::Int(v) => Ok(*v),
            other => Err(VmError::internal(format!("expected an immediate operand, got {:?}", other)))
        }
    }

    pub fn index(&self) -> VmResult<u16> {
        match self {
            Operands::Index(i) => Ok(*i),
            other => Err(VmError::internal(format!("expected an index operand, got {:?}", other)))
        }
    }

    pub fn local(&self) -> VmResult<usize> {
        Ok(self.index()? as usize)
    }
}

pub(crate) fn null_pointer() -> VmError {
    VmError::java(JavaErrorKind::NullPointerException, "")
}

/// Bounds checked array index.
pub(crate) fn array_index(index: i32, length: usize) -> VmResult<usize> {
    if index < 0 || index as usize >= length {
        return Err(VmError::java(JavaErrorKind::ArrayIndexOutOfBoundsException,
                                 format!("Index {} out of bounds for length {}", index, length)));
    }
    Ok(index as usize)
}

pub type Decoder = fn(&mut BytecodeReader, u8) -> VmResult<Operands>;
pub type Executor = fn(&mut Vm, &mut VMThread, &Operands) -> VmResult<()>;

#[derive(Copy, Clone)]
pub struct InstructionDef {
    pub instruction: Instruction,
    pub decode: Decoder,
    pub execute: Executor,
}

impl Debug for InstructionDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.instruction)
    }
}

/// Dense opcode table, one entry per byte value.
pub struct InstructionTable {
    defs: [Option<InstructionDef>; 256],
}

impl InstructionTable {
    fn new() -> InstructionTable {
        InstructionTable { defs: [None; 256] }
    }

    fn register(&mut self, instruction: Instruction, decode: Decoder, execute: Executor) {
        let opcode: u8 = instruction.into();
        self.defs[opcode as usize] = Some(InstructionDef { instruction, decode, execute });
    }

    pub fn get(&self, opcode: u8) -> VmResult<&InstructionDef> {
        self.defs[opcode as usize].as_ref()
            .ok_or_else(|| VmError::internal(format!("unknown opcode {:#04x}", opcode)))
    }
}

pub static INSTRUCTIONS: Lazy<InstructionTable> = Lazy::new(|| {
    let mut table = InstructionTable::new();
    constants::register(&mut table);
    loads::register(&mut table);
    stores::register(&mut table);
    stack::register(&mut table);
    math::register(&mut table);
    conversions::register(&mut table);
    comparisons::register(&mut table);
    control::register(&mut table);
    references::register(&mut table);
    invoke::register(&mut table);
    extended::register(&mut table);
    table
});
