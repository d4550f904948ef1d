use smallvec::SmallVec;
use crate::helper::{dtou, ftoi, itof, join_u64, split_u64, utod};
use crate::vm::error::{VmError, VmResult};
use crate::vm::object::ObjectRef;

/// Maximum number of argument slots copied without a heap allocation.
pub const MAX_INLINE_ARGS: usize = 8;

pub type Args = SmallVec<[Slot; MAX_INLINE_ARGS]>;

/// A single local variable / operand stack cell. Longs and doubles take two of them
/// (low half first), floats are stored by their bit pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    Num(i32),
    Ref(Option<ObjectRef>),
}

impl Default for Slot {
    fn default() -> Self {
        Slot::Num(0)
    }
}

impl Slot {
    pub const NULL: Slot = Slot::Ref(None);

    /// Reading a reference slot as a number yields 0, as a freshly zeroed slot would.
    pub fn as_int(&self) -> i32 {
        match self {
            Slot::Num(v) => *v,
            Slot::Ref(_) => 0
        }
    }

    pub fn as_ref(&self) -> Option<ObjectRef> {
        match self {
            Slot::Ref(r) => *r,
            Slot::Num(_) => None
        }
    }
}

/// Fixed size slot array, used for local variables, static variables and instance fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slots(Vec<Slot>);

impl Slots {
    pub fn new(size: usize) -> Slots {
        Slots(vec![Slot::default(); size])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> VmResult<Slot> {
        self.0.get(index).copied()
            .ok_or_else(|| VmError::internal(format!("slot index {} out of bounds ({})", index, self.0.len())))
    }

    pub fn set(&mut self, index: usize, slot: Slot) -> VmResult<()> {
        let len = self.0.len();
        match self.0.get_mut(index) {
            Some(s) => {
                *s = slot;
                Ok(())
            }
            None => Err(VmError::internal(format!("slot index {} out of bounds ({})", index, len)))
        }
    }

    pub fn get_int(&self, index: usize) -> VmResult<i32> {
        Ok(self.get(index)?.as_int())
    }

    pub fn set_int(&mut self, index: usize, v: i32) -> VmResult<()> {
        self.set(index, Slot::Num(v))
    }

    pub fn get_float(&self, index: usize) -> VmResult<f32> {
        Ok(itof(self.get_int(index)?))
    }

    pub fn set_float(&mut self, index: usize, v: f32) -> VmResult<()> {
        self.set_int(index, ftoi(v))
    }

    pub fn get_long(&self, index: usize) -> VmResult<i64> {
        let low = self.get_int(index)?;
        let high = self.get_int(index + 1)?;
        Ok(join_u64(low, high) as i64)
    }

    pub fn set_long(&mut self, index: usize, v: i64) -> VmResult<()> {
        let (low, high) = split_u64(v as u64);
        self.set_int(index, low)?;
        self.set_int(index + 1, high)
    }

    pub fn get_double(&self, index: usize) -> VmResult<f64> {
        Ok(utod(self.get_long(index)? as u64))
    }

    pub fn set_double(&mut self, index: usize, v: f64) -> VmResult<()> {
        self.set_long(index, dtou(v) as i64)
    }

    pub fn get_ref(&self, index: usize) -> VmResult<Option<ObjectRef>> {
        Ok(self.get(index)?.as_ref())
    }

    pub fn set_ref(&mut self, index: usize, v: Option<ObjectRef>) -> VmResult<()> {
        self.set(index, Slot::Ref(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.0.iter()
    }
}

/// Operand stack with the capacity declared by the method's `max_stack`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperandStack {
    slots: Vec<Slot>,
    max_size: usize,
}

impl OperandStack {
    pub fn new(max_size: usize) -> OperandStack {
        OperandStack {
            slots: Vec::with_capacity(max_size),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn push_slot(&mut self, slot: Slot) -> VmResult<()> {
        if self.slots.len() >= self.max_size {
            return Err(VmError::internal(format!("operand stack overflow (max {})", self.max_size)));
        }
        self.slots.push(slot);
        Ok(())
    }

    pub fn pop_slot(&mut self) -> VmResult<Slot> {
        self.slots.pop().ok_or_else(|| VmError::internal("operand stack underflow"))
    }

    pub fn push_int(&mut self, v: i32) -> VmResult<()> {
        self.push_slot(Slot::Num(v))
    }

    pub fn pop_int(&mut self) -> VmResult<i32> {
        Ok(self.pop_slot()?.as_int())
    }

    pub fn push_float(&mut self, v: f32) -> VmResult<()> {
        self.push_int(ftoi(v))
    }

    pub fn pop_float(&mut self) -> VmResult<f32> {
        Ok(itof(self.pop_int()?))
    }

    pub fn push_long(&mut self, v: i64) -> VmResult<()> {
        let (low, high) = split_u64(v as u64);
        self.push_int(low)?;
        self.push_int(high)
    }

    pub fn pop_long(&mut self) -> VmResult<i64> {
        let high = self.pop_int()?;
        let low = self.pop_int()?;
        Ok(join_u64(low, high) as i64)
    }

    pub fn push_double(&mut self, v: f64) -> VmResult<()> {
        self.push_long(dtou(v) as i64)
    }

    pub fn pop_double(&mut self) -> VmResult<f64> {
        Ok(utod(self.pop_long()? as u64))
    }

    pub fn push_ref(&mut self, v: Option<ObjectRef>) -> VmResult<()> {
        self.push_slot(Slot::Ref(v))
    }

    pub fn pop_ref(&mut self) -> VmResult<Option<ObjectRef>> {
        Ok(self.pop_slot()?.as_ref())
    }

    pub fn push_bool(&mut self, v: bool) -> VmResult<()> {
        self.push_int(v as i32)
    }

    /// Slot `n` positions below the top (0 is the top) without popping it.
    pub fn peek(&self, n: usize) -> VmResult<Slot> {
        self.slots.len().checked_sub(n + 1)
            .map(|i| self.slots[i])
            .ok_or_else(|| VmError::internal("operand stack underflow"))
    }

    /// Pops the top `count` slots, returned in the order they were pushed.
    pub fn pop_args(&mut self, count: usize) -> VmResult<Args> {
        let start = self.slots.len().checked_sub(count)
            .ok_or_else(|| VmError::internal("operand stack underflow"))?;
        Ok(self.slots.drain(start..).collect())
    }
}
