use std::fmt;

use error_stack::Report;

#[derive(Debug)]
pub struct AlreadySetError;
impl fmt::Display for AlreadySetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WriteOnce already set")
    }
}
impl std::error::Error for AlreadySetError {}

pub type WriteOnceResult<T> = error_stack::Result<T, AlreadySetError>;

/// A slot that moves from `Unset` to `Set` once and stays there until
/// explicitly cleared.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum WriteOnce<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> WriteOnce<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            WriteOnce::Unset => None,
            WriteOnce::Set(value) => Some(value),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, WriteOnce::Set(_))
    }

    pub fn set(&mut self, value: T) -> WriteOnceResult<()> {
        if self.is_set() {
            return Err(Report::new(AlreadySetError));
        }
        *self = WriteOnce::Set(value);
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = WriteOnce::Unset;
    }
}

impl WriteOnce<String> {
    /// Empty strings never occupy the slot: setting one on an unset slot
    /// leaves it unset, so a later non-empty value is still accepted.
    pub fn set_non_empty(&mut self, value: String) -> WriteOnceResult<()> {
        if self.is_set() {
            return Err(Report::new(AlreadySetError));
        }
        if !value.is_empty() {
            *self = WriteOnce::Set(value);
        }
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Debug for WriteOnce<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOnce::Unset => f.write_str("Unset"),
            WriteOnce::Set(value) => f.debug_tuple("Set").field(value).finish(),
        }
    }
}
