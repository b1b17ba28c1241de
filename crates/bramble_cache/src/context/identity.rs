//! Per-session identity tables.
//!
//! Identities are assigned densely from zero in the order instances are first
//! written, so the reader can tell a new instance (the next unused id) from a
//! back-reference (an id it has already seen) without a separate marker.

use std::collections::HashMap;

use bramble_common::Object;

use crate::error::SerializationError;

/// What the write table knows about an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteIdentity {
    /// First sight: the instance was assigned this new id.
    New(u32),
    /// The instance was written before under this id.
    Known(u32),
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    id: u32,
    complete: bool,
}

/// Instance to id, for writing.
#[derive(Debug, Default)]
pub struct WriteIdentities {
    slots: HashMap<usize, Slot>,
    /// Keeps every recorded instance alive so its address is never reused
    /// by another instance during the session.
    retained: Vec<Object>,
}

impl WriteIdentities {
    /// Looks up `value`, assigning it the next id on first sight.
    ///
    /// Fails with [`SerializationError::CyclicReference`] if `value` is known
    /// but its payload is still being written.
    pub fn get_or_assign(&mut self, value: &Object) -> Result<WriteIdentity, SerializationError> {
        if let Some(slot) = self.slots.get(&value.identity()) {
            if !slot.complete {
                return Err(SerializationError::CyclicReference { id: slot.id });
            }
            return Ok(WriteIdentity::Known(slot.id));
        }
        let id = self.next_id()?;
        self.slots.insert(
            value.identity(),
            Slot {
                id,
                complete: false,
            },
        );
        self.retained.push(value.clone());
        Ok(WriteIdentity::New(id))
    }

    /// Marks the payload of `value` as fully written.
    pub fn complete(&mut self, value: &Object) {
        if let Some(slot) = self.slots.get_mut(&value.identity()) {
            slot.complete = true;
        }
    }

    /// Number of instances assigned an id.
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    /// Returns `true` if no instance was assigned an id.
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    fn next_id(&self) -> Result<u32, SerializationError> {
        u32::try_from(self.retained.len()).map_err(|_| SerializationError::Failed {
            message: "identity table is full".to_string(),
        })
    }
}

/// What the read table knows about an id.
#[derive(Debug, Clone)]
pub enum ReadIdentity {
    /// The id has not been seen: its payload follows.
    New(u32),
    /// The id refers to this already decoded instance.
    Known(Object),
}

/// Id to instance, for reading.
#[derive(Debug, Default)]
pub struct ReadIdentities {
    slots: Vec<Option<Object>>,
}

impl ReadIdentities {
    /// Resolves an id read from the stream.
    pub fn resolve(&mut self, id: u32) -> Result<ReadIdentity, SerializationError> {
        let index = id as usize;
        match index.cmp(&self.slots.len()) {
            std::cmp::Ordering::Less => self.slots[index]
                .clone()
                .map(ReadIdentity::Known)
                .ok_or(SerializationError::CyclicReference { id }),
            std::cmp::Ordering::Equal => {
                self.slots.push(None);
                Ok(ReadIdentity::New(id))
            }
            std::cmp::Ordering::Greater => Err(SerializationError::UnknownReference { id }),
        }
    }

    /// Registers the instance decoded for a new id.
    pub fn put_instance(&mut self, id: u32, value: Object) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            *slot = Some(value);
        }
    }

    /// Number of ids seen.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no id was seen.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_assigns_ids_on_first_sight() {
        let mut table = WriteIdentities::default();
        let a = Object::new(1u32);
        let b = Object::new(1u32);
        assert_eq!(table.get_or_assign(&a).unwrap(), WriteIdentity::New(0));
        table.complete(&a);
        assert_eq!(table.get_or_assign(&b).unwrap(), WriteIdentity::New(1));
        table.complete(&b);
        assert_eq!(table.get_or_assign(&a.clone()).unwrap(), WriteIdentity::Known(0));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn write_rejects_reference_to_incomplete_instance() {
        let mut table = WriteIdentities::default();
        let a = Object::new(String::from("a"));
        table.get_or_assign(&a).unwrap();
        let err = table.get_or_assign(&a).unwrap_err();
        assert!(matches!(err, SerializationError::CyclicReference { id: 0 }));
    }

    #[test]
    fn read_resolves_new_known_and_unknown() {
        let mut table = ReadIdentities::default();
        assert!(matches!(table.resolve(0).unwrap(), ReadIdentity::New(0)));
        let value = Object::new(7u64);
        table.put_instance(0, value.clone());
        match table.resolve(0).unwrap() {
            ReadIdentity::Known(found) => assert!(found.ptr_eq(&value)),
            other => panic!("expected known, got {other:?}"),
        }
        assert!(matches!(
            table.resolve(5),
            Err(SerializationError::UnknownReference { id: 5 })
        ));
    }

    #[test]
    fn read_rejects_reference_to_unfinished_instance() {
        let mut table = ReadIdentities::default();
        table.resolve(0).unwrap();
        assert!(matches!(
            table.resolve(0),
            Err(SerializationError::CyclicReference { id: 0 })
        ));
    }
}
