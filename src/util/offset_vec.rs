use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::iter::{Enumerate, FromIterator};
use std::slice::Iter;

/// Number of JVM slots a value takes up
pub trait Width {
    fn width(&self) -> usize;
}

/// Vector whose entries are addressed by the sum of the widths of the entries before them
///
/// `long` and `double` take two slots both on the operand stack and among the local variables.
/// With entries being stack values the offset of an entry is its stack height, and with entries
/// being frame locals it is the local index.
#[derive(Clone)]
pub struct OffsetVec<T> {
    /// Entries, each with its offset
    entries: Vec<(Offset, T)>,

    /// Offset at which the next entry goes
    offset_len: Offset,
}

/// Slot offset into an `OffsetVec`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Offset(pub usize);

impl<T: Width> OffsetVec<T> {
    pub fn new() -> OffsetVec<T> {
        OffsetVec {
            entries: vec![],
            offset_len: Offset(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total width of the entries (the offset of the next entry pushed)
    pub fn offset_len(&self) -> Offset {
        self.offset_len
    }

    /// Push an entry and get back the offset it landed at
    pub fn push(&mut self, entry: T) -> Offset {
        let offset = self.offset_len;
        self.offset_len.0 += entry.width();
        self.entries.push((offset, entry));
        offset
    }

    /// Pop the last entry, along with its offset and index
    pub fn pop(&mut self) -> Option<(Offset, usize, T)> {
        let (offset, entry) = self.entries.pop()?;
        self.offset_len = offset;
        Some((offset, self.entries.len(), entry))
    }

    pub fn last(&self) -> Option<(Offset, &T)> {
        self.entries.last().map(|(offset, entry)| (*offset, entry))
    }

    pub fn iter(&self) -> OffsetVecIter<'_, T> {
        OffsetVecIter(self.entries.iter().enumerate())
    }
}

impl<T: PartialEq> PartialEq for OffsetVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: Eq> Eq for OffsetVec<T> {}

impl<T: Width> Default for OffsetVec<T> {
    fn default() -> Self {
        OffsetVec::new()
    }
}

impl<T: Width, const N: usize> From<[T; N]> for OffsetVec<T> {
    fn from(entries: [T; N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<T: Width> FromIterator<T> for OffsetVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(entries: I) -> Self {
        let mut offset_vec = OffsetVec::new();
        for entry in entries {
            offset_vec.push(entry);
        }
        offset_vec
    }
}

/// Iterator over `(offset, index, entry)` of an `OffsetVec`
pub struct OffsetVecIter<'a, T>(Enumerate<Iter<'a, (Offset, T)>>);

impl<'a, T> Iterator for OffsetVecIter<'a, T> {
    type Item = (Offset, usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let (index, (offset, entry)) = self.0.next()?;
        Some((*offset, index, entry))
    }
}

impl<T: Debug> Debug for OffsetVec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut list = f.debug_list();
        for (offset, entry) in &self.entries {
            list.entry(&format_args!("#{} = {:?}", offset.0, entry));
        }
        list.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    enum Slot {
        Category1(u8),
        Category2(u8),
    }

    impl Width for Slot {
        fn width(&self) -> usize {
            match self {
                Slot::Category1(_) => 1,
                Slot::Category2(_) => 2,
            }
        }
    }

    #[test]
    fn offsets_follow_widths() {
        let slots: OffsetVec<Slot> = OffsetVec::from([
            Slot::Category1(1),
            Slot::Category2(2),
            Slot::Category1(3),
            Slot::Category2(4),
        ]);
        assert_eq!(
            slots.iter().map(|(off, idx, s)| (off, idx, *s)).collect::<Vec<_>>(),
            vec![
                (Offset(0), 0, Slot::Category1(1)),
                (Offset(1), 1, Slot::Category2(2)),
                (Offset(3), 2, Slot::Category1(3)),
                (Offset(4), 3, Slot::Category2(4)),
            ]
        );
        assert_eq!(slots.offset_len(), Offset(6));
    }

    #[test]
    fn popping_restores_offset() {
        let mut stack: OffsetVec<Slot> = OffsetVec::new();
        assert_eq!(stack.push(Slot::Category2(0)), Offset(0));
        assert_eq!(stack.push(Slot::Category1(1)), Offset(2));
        assert_eq!(stack.offset_len(), Offset(3));

        assert_eq!(stack.pop(), Some((Offset(2), 1, Slot::Category1(1))));
        assert_eq!(stack.offset_len(), Offset(2));
        assert_eq!(stack.last(), Some((Offset(0), &Slot::Category2(0))));

        assert_eq!(stack.pop(), Some((Offset(0), 0, Slot::Category2(0))));
        assert!(stack.is_empty());
        assert_eq!(stack.offset_len(), Offset(0));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn debug_shows_offsets() {
        let slots: OffsetVec<Slot> = OffsetVec::from([Slot::Category2(7), Slot::Category1(8)]);
        assert_eq!(
            format!("{:?}", slots),
            "[#0 = Category2(7), #2 = Category1(8)]"
        );
    }
}
