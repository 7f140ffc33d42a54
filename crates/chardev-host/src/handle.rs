//! Handles for resources owned by the host kernel.
//!
//! [`Major`], [`ClassHandle`] and [`NodeHandle`] are deliberately neither
//! `Clone` nor `Copy`: releasing one consumes it, so each resource can be
//! handed back to the host at most once.

use std::fmt;

/// A `(major, minor)` device number, the `dev_t` of the device node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceNumber {
    pub major: u32,
    pub minor: u32,
}

impl DeviceNumber {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// A dynamically allocated major number and the name it was registered under.
#[derive(Debug, PartialEq, Eq)]
pub struct Major {
    number: u32,
    name: String,
}

impl Major {
    /// Only host kernel implementations mint majors.
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A registered device class.
#[derive(Debug, PartialEq, Eq)]
pub struct ClassHandle {
    id: u64,
    name: String,
}

impl ClassHandle {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A device node created under a class.
#[derive(Debug, PartialEq, Eq)]
pub struct NodeHandle {
    id: u64,
    name: String,
    devt: DeviceNumber,
}

impl NodeHandle {
    pub fn new(id: u64, name: impl Into<String>, devt: DeviceNumber) -> Self {
        Self {
            id,
            name: name.into(),
            devt,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn devt(&self) -> DeviceNumber {
        self.devt
    }

    /// Path under which callers reach the node.
    pub fn path(&self) -> String {
        format!("/dev/{}", self.name)
    }
}
