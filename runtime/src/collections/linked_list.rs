// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{alloc::Layout, fmt::Debug, marker::PhantomData, ptr::NonNull};

use crate::allocators::Allocator;

struct Node<T> {
    next: Option<NonNull<Node<T>>>,
    previous: Option<NonNull<Node<T>>>,
    value: T,
}

/// A doubly linked list with every node allocated from `A`.
///
/// Values are dropped when they're removed from the list, or when the list is
/// cleared or dropped. The nodes' memory is given back to the allocator at the
/// same time, which is a no-op for the bump allocators: with those, the memory
/// is reclaimed when the allocator is reset.
///
/// The list can't be cloned, since every clone would need to allocate, which
/// can fail.
pub struct LinkedList<T, A: Allocator> {
    allocator: A,
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    len: usize,
    _owns: PhantomData<T>,
}

impl<T, A: Allocator> LinkedList<T, A> {
    pub fn new(allocator: A) -> LinkedList<T, A> {
        LinkedList {
            allocator,
            head: None,
            tail: None,
            len: 0,
            _owns: PhantomData,
        }
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends the value to the end of the list. If the node can't be
    /// allocated, returns the value back wrapped in a [`Result::Err`].
    pub fn push_back(&mut self, value: T) -> Result<(), T> {
        let Some(ptr) = self.allocator.allocate_layout(Layout::new::<Node<T>>()) else {
            return Err(value);
        };
        let node = ptr.cast::<Node<T>>();
        // Safety: the allocator returned memory fitting the layout of a node,
        // and it's not in use by anything else.
        unsafe {
            node.as_ptr().write(Node {
                next: None,
                previous: self.tail,
                value,
            })
        };

        match self.tail {
            // Safety: the tail is a valid node owned by this list, and no
            // references to it exist since self is borrowed mutably.
            Some(tail) => unsafe { (*tail.as_ptr()).next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the first value of the list.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        // Safety: the head is a valid node owned by this list.
        Some(unsafe { self.unlink(head) })
    }

    /// Removes and returns the first value for which `predicate` returns true.
    pub fn remove_first(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let mut current = self.head;
        while let Some(node) = current {
            // Safety: every node reachable from the head is valid, and owned by
            // this list.
            let node_ref = unsafe { node.as_ref() };
            if predicate(&node_ref.value) {
                // Safety: see above.
                return Some(unsafe { self.unlink(node) });
            }
            current = node_ref.next;
        }
        None
    }

    /// Drops every value and deallocates every node.
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    pub fn front(&self) -> Option<&T> {
        // Safety: the head is valid as long as self is borrowed.
        self.head.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    pub fn back(&self) -> Option<&T> {
        // Safety: the tail is valid as long as self is borrowed.
        self.tail.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        // Safety: the tail is valid as long as self is borrowed, and the
        // exclusive borrow of self means nothing else references it.
        self.tail.map(|node| unsafe { &mut (*node.as_ptr()).value })
    }

    /// Iterates from the front to the back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head,
            remaining: self.len,
            _list: PhantomData,
        }
    }

    /// Iterates from the back to the front.
    pub fn iter_rev(&self) -> IterRev<'_, T> {
        IterRev {
            next: self.tail,
            remaining: self.len,
            _list: PhantomData,
        }
    }

    /// Detaches the node from its neighbours, deallocates it and returns its
    /// value.
    ///
    /// ### Safety
    ///
    /// `node` must be a node of this list.
    unsafe fn unlink(&mut self, node: NonNull<Node<T>>) -> T {
        // Safety: the caller guarantees the node is ours, so it's valid and
        // initialized. It's read out exactly once, and deallocated right
        // after, so the value can't be dropped twice.
        let Node {
            next,
            previous,
            value,
        } = unsafe { node.as_ptr().read() };

        match previous {
            // Safety: neighbours of our nodes are our nodes too.
            Some(previous) => unsafe { (*previous.as_ptr()).next = next },
            None => self.head = next,
        }
        match next {
            // Safety: see above.
            Some(next) => unsafe { (*next.as_ptr()).previous = previous },
            None => self.tail = previous,
        }
        self.len -= 1;

        if A::RELEASES_MEMORY {
            // Safety: allocated in `push_back` with this layout, and the node
            // has been read out and unlinked, so it's not accessed anymore.
            unsafe {
                self.allocator
                    .deallocate_layout(node.cast(), Layout::new::<Node<T>>())
            };
        }
        value
    }
}

impl<T, A: Allocator> Drop for LinkedList<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Debug, A: Allocator> Debug for LinkedList<T, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'l, T, A: Allocator> IntoIterator for &'l LinkedList<T, A> {
    type Item = &'l T;
    type IntoIter = Iter<'l, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Front to back iterator over a [`LinkedList`].
pub struct Iter<'l, T> {
    next: Option<NonNull<Node<T>>>,
    remaining: usize,
    _list: PhantomData<&'l T>,
}

impl<'l, T> Iterator for Iter<'l, T> {
    type Item = &'l T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // Safety: the list is borrowed for 'l, so its nodes stay valid and
        // unmodified.
        let node: &'l Node<T> = unsafe { &*node.as_ptr() };
        self.next = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Back to front iterator over a [`LinkedList`].
pub struct IterRev<'l, T> {
    next: Option<NonNull<Node<T>>>,
    remaining: usize,
    _list: PhantomData<&'l T>,
}

impl<'l, T> Iterator for IterRev<'l, T> {
    type Item = &'l T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // Safety: see Iter.
        let node: &'l Node<T> = unsafe { &*node.as_ptr() };
        self.next = node.previous;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use core::{
        alloc::Layout,
        cell::Cell,
        ptr::NonNull,
        sync::atomic::{AtomicI32, Ordering},
    };

    use crate::{
        allocators::{Allocator, BasicAllocator, FixedArena},
        test_platform::TestPlatform,
    };

    use super::LinkedList;

    #[test]
    fn iterates_both_ways() {
        let platform = TestPlatform::new();
        let mut list = LinkedList::new(BasicAllocator::new(&platform));
        for i in 0..5 {
            list.push_back(i).unwrap();
        }
        assert_eq!(5, list.len());
        assert!(list.iter().copied().eq(0..5));
        assert!(list.iter_rev().copied().eq((0..5).rev()));
        assert_eq!(Some(&0), list.front());
        assert_eq!(Some(&4), list.back());
    }

    #[test]
    fn removal_relinks_neighbours() {
        let platform = TestPlatform::new();
        let mut list = LinkedList::new(BasicAllocator::new(&platform));
        for i in 0..5 {
            list.push_back(i).unwrap();
        }
        assert_eq!(Some(2), list.remove_first(|&i| i == 2));
        assert_eq!(None, list.remove_first(|&i| i == 2));
        assert_eq!(Some(4), list.remove_first(|&i| i == 4));
        assert_eq!(Some(0), list.pop_front());
        assert!(list.iter().copied().eq([1, 3]));
        assert!(list.iter_rev().copied().eq([3, 1]));
        assert_eq!(Some(&3), list.back());
        *list.back_mut().unwrap() = 30;
        assert!(list.iter().copied().eq([1, 30]));
    }

    #[test]
    fn nodes_are_freed() {
        let platform = TestPlatform::new();
        {
            let mut list = LinkedList::new(BasicAllocator::new(&platform));
            for i in 0..10 {
                list.push_back(i).unwrap();
            }
            assert_eq!(10, platform.live_allocations());
            list.pop_front();
            assert_eq!(9, platform.live_allocations());
            list.clear();
            assert_eq!(0, platform.live_allocations());
            assert!(list.is_empty());
            list.push_back(1).unwrap();
        }
        assert_eq!(0, platform.live_allocations());
    }

    #[test]
    fn failed_push_gives_the_value_back() {
        let platform = TestPlatform::new();
        let mut list = LinkedList::new(BasicAllocator::new(&platform));
        platform.set_out_of_memory(true);
        assert_eq!(Err(7), list.push_back(7));
        assert!(list.is_empty());
    }

    #[test]
    fn values_are_dropped_with_arena_allocators() {
        static DROPPED: AtomicI32 = AtomicI32::new(0);
        struct Counted;
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPPED.fetch_add(1, Ordering::Relaxed);
            }
        }

        let platform = TestPlatform::new();
        let arena = FixedArena::new(BasicAllocator::new(&platform), 1024).unwrap();
        let mut list = LinkedList::new(&arena);
        for _ in 0..3 {
            assert!(list.push_back(Counted).is_ok());
        }
        let occupied = arena.occupied();
        list.pop_front();
        assert_eq!(1, DROPPED.load(Ordering::Relaxed));
        assert_eq!(occupied, arena.occupied(), "arenas don't free single nodes");
        drop(list);
        assert_eq!(3, DROPPED.load(Ordering::Relaxed));
    }

    /// Bump allocates from a [`FixedArena`], counting the deallocation calls
    /// it receives.
    struct CountingArena<'a> {
        arena: FixedArena<'a>,
        deallocations: Cell<usize>,
    }

    impl Allocator for CountingArena<'_> {
        const RELEASES_MEMORY: bool = false;

        fn allocate_layout(&self, layout: Layout) -> Option<NonNull<u8>> {
            self.arena.allocate_layout(layout)
        }

        unsafe fn deallocate_layout(&self, _ptr: NonNull<u8>, _layout: Layout) {
            self.deallocations.set(self.deallocations.get() + 1);
        }
    }

    #[test]
    fn nodes_are_not_deallocated_when_the_allocator_does_not_release_memory() {
        let platform = TestPlatform::new();
        {
            let allocator = CountingArena {
                arena: FixedArena::new(BasicAllocator::new(&platform), 1024).unwrap(),
                deallocations: Cell::new(0),
            };
            let mut list = LinkedList::new(&allocator);
            for i in 0..4 {
                list.push_back(i).unwrap();
            }
            assert_eq!(Some(0), list.pop_front());
            assert_eq!(Some(2), list.remove_first(|&i| i == 2));
            list.clear();
            assert_eq!(0, allocator.deallocations.get());
        }
        assert_eq!(0, platform.live_allocations());
    }

    #[test]
    fn arena_exhaustion_fails_push() {
        let platform = TestPlatform::new();
        let arena = FixedArena::new(BasicAllocator::new(&platform), 40).unwrap();
        let mut list = LinkedList::new(&arena);
        let mut pushed = 0;
        while list.push_back(pushed).is_ok() {
            pushed += 1;
        }
        assert_eq!(pushed, list.len());
        assert!(list.len() < 40);
    }
}
