//! Slot allocation for a fixed-size parking lot.
//!
//! Flow Overview:
//! 1) The store is created once with `capacity` free slots and never resized.
//! 2) `allocate` claims the lowest-indexed free slot for an occupant.
//! 3) `release` frees the lowest-indexed slot held by an occupant.
//! 4) `inspect` and `snapshot` read the table without mutating it.
//!
//! Every operation takes the single table lock: writers (`allocate`, `release`)
//! are exclusive, readers share. The first-free-slot scan and the claim happen
//! under the same write guard, so allocation order is deterministic and no two
//! callers can be handed the same slot.
//!
//! Duplicate occupants are allowed. When the same plate holds several slots,
//! `release` frees the lowest index first.

mod error;

pub use self::error::LotError;

use tokio::sync::RwLock;
use tracing::debug;

pub type SlotIndex = usize;

/// A single slot. `occupied` is derived from the occupant, so a slot can never
/// be marked occupied without one.
#[derive(Debug, Clone, Default)]
struct Slot {
    occupant: Option<String>,
}

impl Slot {
    fn view(&self, index: SlotIndex) -> SlotView {
        SlotView {
            index,
            occupied: self.occupant.is_some(),
            occupant: self.occupant.clone(),
        }
    }
}

/// Read-only copy of one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub index: SlotIndex,
    pub occupied: bool,
    pub occupant: Option<String>,
}

#[derive(Debug)]
pub struct SlotStore {
    capacity: usize,
    slots: RwLock<Box<[Slot]>>,
}

impl SlotStore {
    /// Create a lot with `capacity` free slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: RwLock::new(vec![Slot::default(); capacity].into_boxed_slice()),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Assign the lowest-indexed free slot to `occupant`.
    ///
    /// # Errors
    /// Returns `LotError::Full` when every slot is taken; the table is left untouched.
    pub async fn allocate(&self, occupant: impl Into<String>) -> Result<SlotIndex, LotError> {
        let mut slots = self.slots.write().await;

        let (index, slot) = slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.occupant.is_none())
            .ok_or(LotError::Full)?;

        slot.occupant = Some(occupant.into());
        debug!(index, "slot allocated");

        Ok(index)
    }

    /// Return a copy of the slot at `index`.
    ///
    /// Accepts any integer type so negative input is reported as out of range
    /// rather than wrapped.
    ///
    /// # Errors
    /// Returns `LotError::InvalidIndex` when `index` is outside `0..capacity`.
    pub async fn inspect<I>(&self, index: I) -> Result<SlotView, LotError>
    where
        I: TryInto<SlotIndex>,
    {
        let invalid = LotError::InvalidIndex {
            capacity: self.capacity,
        };
        let index: SlotIndex = index.try_into().map_err(|_| invalid.clone())?;

        let slots = self.slots.read().await;
        slots.get(index).map(|slot| slot.view(index)).ok_or(invalid)
    }

    /// Free the lowest-indexed slot held by `occupant`.
    ///
    /// # Errors
    /// Returns `LotError::OccupantNotFound` when no slot holds `occupant`.
    pub async fn release(&self, occupant: &str) -> Result<SlotIndex, LotError> {
        let mut slots = self.slots.write().await;

        let (index, slot) = slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.occupant.as_deref() == Some(occupant))
            .ok_or_else(|| LotError::OccupantNotFound(occupant.to_string()))?;

        slot.occupant = None;
        debug!(index, "slot released");

        Ok(index)
    }

    /// Copy the whole table under one read guard.
    pub async fn snapshot(&self) -> Vec<SlotView> {
        let slots = self.slots.read().await;
        slots
            .iter()
            .enumerate()
            .map(|(index, slot)| slot.view(index))
            .collect()
    }

    /// Number of occupied slots.
    pub async fn occupied(&self) -> usize {
        let slots = self.slots.read().await;
        slots.iter().filter(|slot| slot.occupant.is_some()).count()
    }
}
