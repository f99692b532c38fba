//! Animated properties on externally owned objects
//!
//! The scheduler never owns what it animates. A [`Property`] is a getter/setter
//! pair captured at declaration time that reaches a single numeric slot through
//! a weak reference, so dropping the object simply makes the property
//! unavailable instead of keeping it alive.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Identity of an animated object, used to find every tween touching it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(usize);

impl TargetId {
    /// Identity of the object behind an `Rc`
    pub fn of<T: ?Sized>(target: &Rc<T>) -> Self {
        Self(Rc::as_ptr(target) as *const () as usize)
    }

    /// Identity from a host-chosen key, for targets not held in an `Rc`
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }
}

/// Why a property could not be read or written
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessError {
    /// The owning object was dropped
    Dropped,
    /// The owning object is currently borrowed elsewhere
    Borrowed,
    /// The owning object no longer exposes this field
    Missing,
}

type Getter = Box<dyn Fn() -> Result<f32, AccessError>>;
type Setter = Box<dyn Fn(f32) -> Result<(), AccessError>>;

/// One writable numeric field of a target object
pub struct Property {
    target: TargetId,
    name: Cow<'static, str>,
    get: Getter,
    set: Setter,
}

impl Property {
    /// Property reached through a lens into an `Rc<RefCell<T>>`
    ///
    /// ```rust
    /// use motus_animation::Property;
    /// use std::{cell::RefCell, rc::Rc};
    ///
    /// struct Camera { z: f32 }
    ///
    /// let camera = Rc::new(RefCell::new(Camera { z: 5.0 }));
    /// let z = Property::new(&camera, "position.z", |c: &mut Camera| &mut c.z);
    /// z.set(3.5).unwrap();
    /// assert_eq!(camera.borrow().z, 3.5);
    /// ```
    pub fn new<T, L>(target: &Rc<RefCell<T>>, name: impl Into<Cow<'static, str>>, lens: L) -> Self
    where
        T: 'static,
        L: Fn(&mut T) -> &mut f32 + 'static,
    {
        Self::optional(target, name, move |t: &mut T| Some(lens(t)))
    }

    /// Property whose slot may disappear, such as an entry in a map or a
    /// morph influence array that can shrink
    pub fn optional<T, L>(
        target: &Rc<RefCell<T>>,
        name: impl Into<Cow<'static, str>>,
        lens: L,
    ) -> Self
    where
        T: 'static,
        L: Fn(&mut T) -> Option<&mut f32> + 'static,
    {
        let lens = Rc::new(lens);
        let read_lens = lens.clone();
        let read_weak = Rc::downgrade(target);
        let write_weak: Weak<RefCell<T>> = Rc::downgrade(target);

        Self {
            target: TargetId::of(target),
            name: name.into(),
            get: Box::new(move || {
                let target = read_weak.upgrade().ok_or(AccessError::Dropped)?;
                let mut guard = target.try_borrow_mut().map_err(|_| AccessError::Borrowed)?;
                let value = read_lens(&mut *guard).map(|slot| *slot);
                value.ok_or(AccessError::Missing)
            }),
            set: Box::new(move |value| {
                let target = write_weak.upgrade().ok_or(AccessError::Dropped)?;
                let mut guard = target.try_borrow_mut().map_err(|_| AccessError::Borrowed)?;
                let slot = lens(&mut *guard).ok_or(AccessError::Missing)?;
                *slot = value;
                Ok(())
            }),
        }
    }

    /// Property backed by a shared `Cell`
    pub fn cell(target: &Rc<Cell<f32>>, name: impl Into<Cow<'static, str>>) -> Self {
        let read_weak = Rc::downgrade(target);
        let write_weak = Rc::downgrade(target);
        Self {
            target: TargetId::of(target),
            name: name.into(),
            get: Box::new(move || {
                read_weak
                    .upgrade()
                    .map(|cell| cell.get())
                    .ok_or(AccessError::Dropped)
            }),
            set: Box::new(move |value| {
                let cell = write_weak.upgrade().ok_or(AccessError::Dropped)?;
                cell.set(value);
                Ok(())
            }),
        }
    }

    /// Property from raw accessor closures
    pub fn from_fns<G, S>(
        target: TargetId,
        name: impl Into<Cow<'static, str>>,
        get: G,
        set: S,
    ) -> Self
    where
        G: Fn() -> Result<f32, AccessError> + 'static,
        S: Fn(f32) -> Result<(), AccessError> + 'static,
    {
        Self {
            target,
            name: name.into(),
            get: Box::new(get),
            set: Box::new(set),
        }
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the live value
    pub fn get(&self) -> Result<f32, AccessError> {
        (self.get)()
    }

    /// Write a new value
    pub fn set(&self, value: f32) -> Result<(), AccessError> {
        (self.set)(value)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("target", &self.target)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
