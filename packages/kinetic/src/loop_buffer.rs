//! Loop buffer: a dataset concatenated with itself so a translating strip can
//! wrap without a visible seam.

use std::rc::Rc;

use crate::display_item::DisplayItem;

/// One entry of the loop buffer. Duplicates share the same payload, so a slot
/// is keyed by `(position, original_index)` rather than by its item.
#[derive(Clone, Debug)]
pub struct LoopSlot {
    pub position: usize,
    pub original_index: usize,
    pub item: Rc<DisplayItem>,
}

impl LoopSlot {
    pub fn key(&self) -> (usize, usize) {
        (self.position, self.original_index)
    }
}

/// `2N` slots built from `N` items; `slots[i]` and `slots[i + N]` share a payload.
#[derive(Clone, Debug, Default)]
pub struct LoopBuffer {
    slots: Vec<LoopSlot>,
    dataset_len: usize,
}

impl LoopBuffer {
    pub fn build(items: &[Rc<DisplayItem>]) -> Self {
        let n = items.len();
        let slots = items
            .iter()
            .chain(items.iter())
            .enumerate()
            .map(|(position, item)| LoopSlot {
                position,
                original_index: position % n,
                item: Rc::clone(item),
            })
            .collect();
        Self {
            slots,
            dataset_len: n,
        }
    }

    /// Number of slots (`2N`).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Size of the underlying dataset (`N`).
    pub fn dataset_len(&self) -> usize {
        self.dataset_len
    }

    pub fn slots(&self) -> &[LoopSlot] {
        &self.slots
    }

    pub fn get(&self, position: usize) -> Option<&LoopSlot> {
        self.slots.get(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<Rc<DisplayItem>> {
        (0..n)
            .map(|i| Rc::new(DisplayItem::new(format!("id-{}", i), i, format!("Item {}", i))))
            .collect()
    }

    #[test]
    fn test_loop_buffer_doubles_dataset() {
        let buffer = LoopBuffer::build(&items(4));
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.dataset_len(), 4);
        for i in 0..4 {
            let a = buffer.get(i).unwrap();
            let b = buffer.get(i + 4).unwrap();
            assert_eq!(a.item.id, b.item.id);
            assert!(Rc::ptr_eq(&a.item, &b.item));
            assert_ne!(a.key(), b.key());
        }
    }

    #[test]
    fn test_loop_buffer_empty() {
        let buffer = LoopBuffer::build(&[]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.dataset_len(), 0);
        assert!(buffer.get(0).is_none());
    }
}
