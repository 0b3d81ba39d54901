//! A fixed-size, type-erased, move-only nullary callable.
//!
//! Stores any `FnOnce() + Send + 'static` whose size fits within `SIZE`
//! bytes inline, with no heap allocation. Type erasure is done with a
//! pair of function pointers (invoke, drop) rather than a vtable, so the
//! whole wrapper is two pointers plus the inline buffer.

use crate::constants::DEFAULT_TASK_SIZE;
use crate::error::EmptyCallable;
use std::mem::{self, ManuallyDrop, MaybeUninit};
use std::ptr;

#[repr(align(8))]
struct Storage<const SIZE: usize>(MaybeUninit<[u8; SIZE]>);

impl<const SIZE: usize> Storage<SIZE> {
    const fn uninit() -> Self {
        Self(MaybeUninit::uninit())
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.0.as_mut_ptr() as *mut u8
    }
}

/// A movable, type-erased nullary callable stored inline.
///
/// `SIZE` defaults to [`DEFAULT_TASK_SIZE`]; a callable larger than `SIZE`
/// is rejected at compile time by [`FixedTask::new`].
pub struct FixedTask<const SIZE: usize = DEFAULT_TASK_SIZE> {
    storage: Storage<SIZE>,
    call: Option<unsafe fn(*mut u8)>,
    drop_in_place: Option<unsafe fn(*mut u8)>,
}

unsafe fn call_impl<F: FnOnce()>(ptr: *mut u8) {
    let f = unsafe { ptr::read(ptr as *mut F) };
    f();
}

unsafe fn drop_impl<F>(ptr: *mut u8) {
    unsafe { ptr::drop_in_place(ptr as *mut F) };
}

impl<const SIZE: usize> FixedTask<SIZE> {
    /// An empty task. Invoking it fails with [`EmptyCallable`].
    pub const fn empty() -> Self {
        Self {
            storage: Storage::uninit(),
            call: None,
            drop_in_place: None,
        }
    }

    /// Wrap `f` for inline storage.
    ///
    /// Fails to compile if `size_of::<F>()` exceeds `SIZE` or `F`'s
    /// alignment exceeds the storage's 8-byte alignment.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        const {
            assert!(
                mem::size_of::<F>() <= SIZE,
                "callable does not fit in the task's inline storage"
            );
            assert!(
                mem::align_of::<F>() <= 8,
                "callable's alignment exceeds the task's inline storage alignment"
            );
        }

        let mut storage = Storage::<SIZE>::uninit();
        unsafe { ptr::write(storage.as_mut_ptr() as *mut F, f) };
        Self {
            storage,
            call: Some(call_impl::<F>),
            drop_in_place: Some(drop_impl::<F>),
        }
    }

    /// `true` if this task holds a callable.
    pub fn is_empty(&self) -> bool {
        self.call.is_none()
    }

    /// Invoke and consume the stored callable.
    pub fn call(self) -> Result<(), EmptyCallable> {
        let mut this = ManuallyDrop::new(self);
        match this.call.take() {
            Some(call) => {
                unsafe { call(this.storage.as_mut_ptr()) };
                Ok(())
            }
            None => Err(EmptyCallable),
        }
    }
}

impl<const SIZE: usize> Default for FixedTask<SIZE> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const SIZE: usize> Drop for FixedTask<SIZE> {
    fn drop(&mut self) {
        if let Some(drop_fn) = self.drop_in_place.take() {
            unsafe { drop_fn(self.storage.as_mut_ptr()) };
        }
    }
}

// Safety: a FixedTask only ever holds an `F: Send`, enforced by the
// `Send` bound on `FixedTask::new`. The raw pointers in `call` and
// `drop_in_place` carry no thread affinity of their own.
unsafe impl<const SIZE: usize> Send for FixedTask<SIZE> {}
