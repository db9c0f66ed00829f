use std::{
    alloc,
    alloc::Layout,
    cmp::Ordering,
    fmt, mem,
    ops::{Deref, DerefMut},
    ptr,
    ptr::NonNull,
};

/// Basic vec, does not have own capacity or length, just a pointer to memory.
/// Kind-of cribbed from <https://doc.rust-lang.org/nomicon/vec/vec-final.html>.
struct BasicVec<T> {
    p: NonNull<T>,
}

unsafe impl<T: Send> Send for BasicVec<T> {}
unsafe impl<T: Sync> Sync for BasicVec<T> {}

impl<T> BasicVec<T> {
    /// Construct new `BasicVec` with no memory.
    fn new() -> Self {
        Self {
            p: NonNull::dangling(),
        }
    }

    /// Get mutable raw pointer to specified element.
    /// # Safety
    /// index must be <= allocated capacity.
    #[inline]
    unsafe fn ix(&self, index: usize) -> *mut T {
        self.p.as_ptr().add(index)
    }

    /// Allocate memory for `cap` elements. Nothing is allocated for zero-sized types or zero capacity.
    /// # Safety
    ///
    /// Must only be called once, on a vec that has not yet been allocated.
    unsafe fn allocate(&mut self, cap: usize) {
        if mem::size_of::<T>() == 0 || cap == 0 {
            return;
        }
        let layout = match Layout::array::<T>(cap) {
            Ok(layout) => layout,
            Err(_) => panic!("node capacity overflow"),
        };
        let p = alloc::alloc(layout);

        // If allocation fails, `p` will be null, in which case we abort.
        self.p = match NonNull::new(p.cast::<T>()) {
            Some(p) => p,
            None => alloc::handle_alloc_error(layout),
        };
    }

    /// Free memory.
    /// # Safety
    ///
    /// `cap` must be the capacity passed to allocate, and all elements must already be dropped or moved out.
    unsafe fn free(&mut self, cap: usize) {
        if cap != 0 && mem::size_of::<T>() != 0 {
            if let Ok(layout) = Layout::array::<T>(cap) {
                alloc::dealloc(self.p.as_ptr().cast::<u8>(), layout);
            }
            self.p = NonNull::dangling();
        }
    }

    /// Set value.
    /// # Safety
    ///
    /// ix must be < capacity, and the element must be unset.
    #[inline]
    unsafe fn set(&mut self, ix: usize, elem: T) {
        ptr::write(self.ix(ix), elem);
    }

    /// Get value.
    /// # Safety
    ///
    /// ix must be < capacity, and the element must have been set.
    #[inline]
    unsafe fn get(&mut self, ix: usize) -> T {
        ptr::read(self.ix(ix))
    }

    /// # Safety
    ///
    /// len must be <= capacity and 0..len elements must have been set.
    #[inline]
    unsafe fn slice(&self, len: usize) -> &[T] {
        std::slice::from_raw_parts(self.p.as_ptr(), len)
    }

    /// # Safety
    ///
    /// len must be <= capacity and 0..len elements must have been set.
    #[inline]
    unsafe fn slice_mut(&mut self, len: usize) -> &mut [T] {
        std::slice::from_raw_parts_mut(self.p.as_ptr(), len)
    }

    /// Move elements.
    /// # Safety
    ///
    /// The set status of the elements changes in the obvious way. from, to and len must be in range.
    unsafe fn move_self(&mut self, from: usize, to: usize, len: usize) {
        ptr::copy(self.ix(from), self.ix(to), len);
    }

    /// Move elements from another `BasicVec`.
    /// # Safety
    ///
    /// The set status of the elements changes in the obvious way. from, to and len must be in range.
    unsafe fn move_from(&mut self, from: usize, src: &mut Self, to: usize, len: usize) {
        ptr::copy_nonoverlapping(src.ix(from), self.ix(to), len);
    }
}

/// In debug mode or feature unsafe-optim not enabled, same as assert! otherwise does nothing.
#[cfg(any(debug_assertions, not(feature = "unsafe-optim")))]
macro_rules! safe_assert {
    ( $cond: expr ) => {
        assert!($cond)
    };
}

/// In debug mode or feature unsafe-optim not enabled, same as assert! otherwise does nothing.
#[cfg(all(not(debug_assertions), feature = "unsafe-optim"))]
macro_rules! safe_assert {
    ( $cond: expr ) => {};
}

/// Vec with a capacity fixed when it is created. It never grows: callers check
/// [`FixedCapVec::is_full`] and split before pushing past the capacity.
pub(crate) struct FixedCapVec<T> {
    len: usize,
    cap: usize,
    v: BasicVec<T>,
}

impl<T> FixedCapVec<T> {
    pub fn new(cap: usize) -> Self {
        let mut v = BasicVec::new();
        unsafe {
            v.allocate(cap);
        }
        Self { len: 0, cap, v }
    }

    /// Can storage for `cap` elements be laid out at all?
    pub fn fits(cap: usize) -> bool {
        Layout::array::<T>(cap).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.cap
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        safe_assert!(self.len < self.cap);
        unsafe {
            self.v.set(self.len, value);
        }
        self.len += 1;
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            unsafe { Some(self.v.get(self.len)) }
        }
    }

    /// Shift elements at and after `at` one place right and store value at `at`.
    pub fn insert(&mut self, at: usize, value: T) {
        safe_assert!(self.len < self.cap && at <= self.len);
        unsafe {
            if at < self.len {
                self.v.move_self(at, at + 1, self.len - at);
            }
            self.v.set(at, value);
        }
        self.len += 1;
    }

    /// Remove element at `at`, shifting the following elements left.
    pub fn remove(&mut self, at: usize) -> T {
        safe_assert!(at < self.len);
        unsafe {
            let result = self.v.get(at);
            self.v.move_self(at + 1, at, self.len - at - 1);
            self.len -= 1;
            result
        }
    }

    /// Move the elements from `at` onwards into a new vec with the same capacity.
    pub fn split_off(&mut self, at: usize) -> Self {
        safe_assert!(at <= self.len);
        let len = self.len - at;
        let mut result = Self::new(self.cap);
        unsafe {
            result.v.move_from(at, &mut self.v, 0, len);
        }
        result.len = len;
        self.len -= len;
        result
    }

    /// Move all elements of `other` onto the end of self, leaving `other` empty.
    pub fn append(&mut self, other: &mut Self) {
        safe_assert!(self.len + other.len <= self.cap);
        unsafe {
            self.v.move_from(0, &mut other.v, self.len, other.len);
        }
        self.len += other.len;
        other.len = 0;
    }

    /// Raw pointer to element `ix`, derived from the allocation rather than from a reference
    /// to the elements, so it stays usable while other elements are borrowed.
    #[inline]
    pub fn ptr_at(&self, ix: usize) -> *mut T {
        safe_assert!(ix < self.len);
        unsafe { self.v.ix(ix) }
    }

    /// Same as `binary_search_by`: `Ok` is the index of a match, `Err` the insertion point.
    pub fn search<F>(&self, mut f: F) -> Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        let (mut i, mut j) = (0, self.len);
        while i < j {
            let m = (i + j) / 2;
            match f(&self[m]) {
                Ordering::Equal => {
                    return Ok(m);
                }
                Ordering::Less => i = m + 1,
                Ordering::Greater => j = m,
            }
        }
        Err(i)
    }
}

impl<T> Drop for FixedCapVec<T> {
    fn drop(&mut self) {
        let len = self.len;
        self.len = 0;
        unsafe {
            ptr::drop_in_place(self.v.slice_mut(len));
            self.v.free(self.cap);
        }
    }
}

impl<T: Clone> Clone for FixedCapVec<T> {
    fn clone(&self) -> Self {
        let mut result = Self::new(self.cap);
        for x in self.iter() {
            result.push(x.clone());
        }
        result
    }
}

impl<T> Deref for FixedCapVec<T> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &[T] {
        unsafe { self.v.slice(self.len) }
    }
}

impl<T> DerefMut for FixedCapVec<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe { self.v.slice_mut(self.len) }
    }
}

impl<T> fmt::Debug for FixedCapVec<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
