//! Index of the expanders which are currently bound to a bus address.
//!
//! Every successfully constructed [`Expander`][crate::Expander] registers itself in [`Active`].
//! The index only detects double binding of one physical chip; it never prevents it.
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

/// Snapshot of one registered expander.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub address: u8,
    /// Family name, upper case.
    pub controller: String,
}

/// Query for [`Registry::has()`].  With both fields set, a match on either one is enough.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filter<'a> {
    pub address: Option<u8>,
    pub controller: Option<&'a str>,
}

impl<'a> Filter<'a> {
    pub fn address(address: u8) -> Self {
        Self {
            address: Some(address),
            controller: None,
        }
    }

    pub fn controller(name: &'a str) -> Self {
        Self {
            address: None,
            controller: Some(name),
        }
    }

    pub fn with_controller(self, name: &'a str) -> Self {
        Self {
            controller: Some(name),
            ..self
        }
    }
}

/// Expanders by bus address, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Registration>,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register an expander.  An address seen before is updated in place.
    pub fn insert(&mut self, registration: Registration) {
        match self
            .entries
            .iter_mut()
            .find(|r| r.address == registration.address)
        {
            Some(existing) => *existing = registration,
            None => self.entries.push(registration),
        }
    }

    pub fn has(&self, filter: &Filter<'_>) -> bool {
        if let Some(address) = filter.address {
            if self.by_address(address).is_some() {
                return true;
            }
        }
        if let Some(name) = filter.controller {
            if self.by_controller(name).is_some() {
                return true;
            }
        }
        false
    }

    pub fn by_address(&self, address: u8) -> Option<&Registration> {
        self.entries.iter().find(|r| r.address == address)
    }

    /// The last registered expander of the family `name`.
    pub fn by_controller(&self, name: &str) -> Option<&Registration> {
        self.entries
            .iter()
            .rev()
            .find(|r| r.controller.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

static ACTIVE: critical_section::Mutex<RefCell<Registry>> =
    critical_section::Mutex::new(RefCell::new(Registry::new()));

/// The process-wide [`Registry`].
pub struct Active;

impl Active {
    pub fn has(filter: &Filter<'_>) -> bool {
        critical_section::with(|cs| ACTIVE.borrow_ref(cs).has(filter))
    }

    pub fn by_address(address: u8) -> Option<Registration> {
        critical_section::with(|cs| ACTIVE.borrow_ref(cs).by_address(address).cloned())
    }

    pub fn by_controller(name: &str) -> Option<Registration> {
        critical_section::with(|cs| ACTIVE.borrow_ref(cs).by_controller(name).cloned())
    }

    pub fn len() -> usize {
        critical_section::with(|cs| ACTIVE.borrow_ref(cs).len())
    }

    pub(crate) fn insert(registration: Registration) {
        critical_section::with(|cs| ACTIVE.borrow_ref_mut(cs).insert(registration));
    }

    /// Forget every registered expander.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn purge() {
        critical_section::with(|cs| ACTIVE.borrow_ref_mut(cs).clear());
    }
}
