//! Typed setters for leaf values
//!
//! Every setter comes in up to three flavours: duplicate (copy the source
//! and own it), shallow (hold a pinned shared source without copying) and
//! append (extend owned content, copying a shared source first). Taint is
//! stored on assignment and only ever accumulates on append.

use super::{Buffer, Value, ValueBox, ValueType};
use crate::error::{PairError, PairResult};
use std::fmt;
use std::sync::Arc;

impl ValueBox {
    /// Replace the value, keeping the type fixed
    pub fn set(&mut self, value: Value, tainted: bool) -> PairResult<()> {
        self.check_type(value.value_type())?;
        self.value = value;
        self.tainted = tainted;
        Ok(())
    }

    /// Reset to the zero value of the current type and clear taint
    pub fn clear(&mut self) {
        if let Some(value) = Value::default_for(self.value_type()) {
            self.value = value;
        }
        self.tainted = false;
    }

    /// Deep-copy the value and taint of `src`, which must have the same type
    pub fn copy_from(&mut self, src: &ValueBox) -> PairResult<()> {
        self.check_type(src.value_type())?;
        self.value = src.value.deep_copy();
        self.tainted = src.tainted;
        Ok(())
    }

    /// Parse `text` according to the current type and enum descriptor
    pub fn set_from_str(&mut self, text: &str, tainted: bool) -> PairResult<()> {
        let value = Value::parse(self.value_type(), text, self.enumv.as_ref())?;
        self.value = value;
        self.tainted = tainted;
        Ok(())
    }

    pub fn strdup(&mut self, src: &str, tainted: bool) -> PairResult<()> {
        self.check_type(ValueType::String)?;
        self.value = Value::String(Buffer::Owned(src.to_string()));
        self.tainted = tainted;
        Ok(())
    }

    /// Hold `src` without copying it
    pub fn strdup_shallow(&mut self, src: Arc<str>, tainted: bool) -> PairResult<()> {
        self.check_type(ValueType::String)?;
        self.value = Value::String(Buffer::Shared(src));
        self.tainted = tainted;
        Ok(())
    }

    /// Duplicate a byte buffer into a string value; it must be valid UTF-8
    pub fn bstrndup(&mut self, src: &[u8], tainted: bool) -> PairResult<()> {
        let text = std::str::from_utf8(src).map_err(|_| PairError::InvalidFormat {
            ty: ValueType::String.name(),
            input: String::from_utf8_lossy(src).into_owned(),
        })?;
        self.strdup(text, tainted)
    }

    pub fn str_append(&mut self, src: &str, tainted: bool) -> PairResult<()> {
        match &mut self.value {
            Value::String(buf) => buf.to_mut().push_str(src),
            other => {
                return Err(PairError::mismatch(
                    ValueType::String.name(),
                    other.value_type().name(),
                ));
            }
        }
        self.tainted |= tainted;
        Ok(())
    }

    /// Trim leading and trailing whitespace from a string value
    pub fn strtrim(&mut self) -> PairResult<()> {
        match &mut self.value {
            Value::String(buf) => {
                let trimmed = buf.trim();
                if trimmed.len() != buf.len() {
                    *buf = Buffer::Owned(trimmed.to_string());
                }
                Ok(())
            }
            other => Err(PairError::mismatch(
                ValueType::String.name(),
                other.value_type().name(),
            )),
        }
    }

    /// Format into an owned string value, clearing taint
    pub fn set_fmt(&mut self, args: fmt::Arguments<'_>) -> PairResult<()> {
        self.strdup(&fmt::format(args), false)
    }

    pub fn memdup(&mut self, src: &[u8], tainted: bool) -> PairResult<()> {
        self.check_type(ValueType::Octets)?;
        self.value = Value::Octets(Buffer::Owned(src.to_vec()));
        self.tainted = tainted;
        Ok(())
    }

    /// Hold `src` without copying it
    pub fn memdup_shallow(&mut self, src: Arc<[u8]>, tainted: bool) -> PairResult<()> {
        self.check_type(ValueType::Octets)?;
        self.value = Value::Octets(Buffer::Shared(src));
        self.tainted = tainted;
        Ok(())
    }

    pub fn mem_append(&mut self, src: &[u8], tainted: bool) -> PairResult<()> {
        let buf = self.octets_mut()?;
        buf.extend_from_slice(src);
        self.tainted |= tainted;
        Ok(())
    }

    /// Replace the value with `size` zeroed bytes and return them for filling
    pub fn mem_alloc(&mut self, size: usize, tainted: bool) -> PairResult<&mut [u8]> {
        self.check_type(ValueType::Octets)?;
        self.value = Value::Octets(Buffer::Owned(vec![0; size]));
        self.tainted = tainted;
        Ok(self.octets_mut()?.as_mut_slice())
    }

    /// Resize owned octets, zero-filling any growth
    pub fn mem_realloc(&mut self, size: usize) -> PairResult<&mut [u8]> {
        let buf = self.octets_mut()?;
        buf.resize(size, 0);
        Ok(buf.as_mut_slice())
    }

    /// Symbolic name of the current value, if the enum descriptor has one
    pub fn enum_name(&self) -> Option<&str> {
        self.enumv.as_ref()?.enum_name(&self.value)
    }

    fn octets_mut(&mut self) -> PairResult<&mut Vec<u8>> {
        match &mut self.value {
            Value::Octets(buf) => Ok(buf.to_mut()),
            other => Err(PairError::mismatch(
                ValueType::Octets.name(),
                other.value_type().name(),
            )),
        }
    }
}
