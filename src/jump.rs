//! External jump bus.
//!
//! Links elsewhere on a page name a mount (e.g. `spp-wizard-root`) and a
//! `<key>:<index>` target. The bus maps mounts to handlers so those links do
//! not need to know which navigator lives where. Dispatching to a mount with
//! no handler is expected while a page is still loading; it is logged and
//! reported, never fatal.

use crate::navigator::{NavError, Navigator};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Parsed `"<key>:<index>"` jump request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JumpTarget {
    pub key: String,
    pub index: usize,
}

impl JumpTarget {
    pub fn new(key: impl Into<String>, index: usize) -> Self {
        Self {
            key: key.into(),
            index,
        }
    }

    /// Split on the first colon; a missing or non-numeric index means 0.
    pub fn parse(raw: &str) -> Self {
        let (key, index) = match raw.split_once(':') {
            Some((key, index)) => (key, index.trim().parse().unwrap_or(0)),
            None => (raw, 0),
        };
        Self {
            key: key.trim().to_string(),
            index,
        }
    }
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.index)
    }
}

/// Identifier a navigator is registered under, usually its mount element id.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MountId(pub String);

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MountId {
    fn from(value: &str) -> Self {
        MountId(value.to_string())
    }
}

/// Receiver of jump requests.
pub trait JumpHandler {
    fn handle_jump(&mut self, target: &JumpTarget) -> Result<(), NavError>;
}

impl JumpHandler for Navigator {
    fn handle_jump(&mut self, target: &JumpTarget) -> Result<(), NavError> {
        self.jump_to(&target.key, target.index).map(|_| ())
    }
}

/// A navigator still borrowed by someone else rejects the jump with `Busy`.
impl JumpHandler for Rc<RefCell<Navigator>> {
    fn handle_jump(&mut self, target: &JumpTarget) -> Result<(), NavError> {
        match self.try_borrow_mut() {
            Ok(mut navigator) => navigator.handle_jump(target),
            Err(_) => {
                log::warn!("navigator busy; dropping jump to {target}");
                Err(NavError::Busy)
            }
        }
    }
}

/// Adapts a closure into a `JumpHandler`.
pub struct FnHandler<F>(pub F);

impl<F> JumpHandler for FnHandler<F>
where
    F: FnMut(&JumpTarget) -> Result<(), NavError>,
{
    fn handle_jump(&mut self, target: &JumpTarget) -> Result<(), NavError> {
        (self.0)(target)
    }
}

/// What happened to a dispatched jump.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JumpOutcome {
    Applied,
    Unregistered,
    Rejected(NavError),
}

#[derive(Default)]
/// Mount → handler registry; the last registration for a mount wins.
pub struct JumpBus {
    handlers: BTreeMap<MountId, Box<dyn JumpHandler>>,
}

impl JumpBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, mount: MountId, handler: H)
    where
        H: JumpHandler + 'static,
    {
        if self.handlers.insert(mount.clone(), Box::new(handler)).is_some() {
            log::debug!("jump handler for '{mount}' replaced");
        }
    }

    pub fn register_fn<F>(&mut self, mount: MountId, handler: F)
    where
        F: FnMut(&JumpTarget) -> Result<(), NavError> + 'static,
    {
        self.register(mount, FnHandler(handler));
    }

    pub fn unregister(&mut self, mount: &MountId) -> bool {
        self.handlers.remove(mount).is_some()
    }

    pub fn is_registered(&self, mount: &MountId) -> bool {
        self.handlers.contains_key(mount)
    }

    pub fn dispatch(&mut self, mount: &MountId, target: &JumpTarget) -> JumpOutcome {
        let Some(handler) = self.handlers.get_mut(mount) else {
            log::warn!("no navigator registered for '{mount}'; ignoring jump to {target}");
            return JumpOutcome::Unregistered;
        };
        match handler.handle_jump(target) {
            Ok(()) => JumpOutcome::Applied,
            Err(err) => {
                log::info!("jump to {target} on '{mount}' rejected: {err}");
                JumpOutcome::Rejected(err)
            }
        }
    }

    /// Parse a `"<key>:<index>"` string and dispatch it.
    pub fn dispatch_encoded(&mut self, mount: &MountId, raw: &str) -> JumpOutcome {
        self.dispatch(mount, &JumpTarget::parse(raw))
    }
}
