//! This module provides ways to tweak mocked gateways, so that they can return errors on some tests

use std::error::Error;

/// This stores some behaviour tweaks, that describe how a mocked instance will behave during a given test
///
/// So that a function fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    // From the RemoteGateway trait
    pub fetch_by_period_behaviour: (u32, u32),
    pub create_item_behaviour: (u32, u32),
    pub patch_item_behaviour: (u32, u32),
    pub delete_item_behaviour: (u32, u32),
    pub fetch_owner_directory_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            fetch_by_period_behaviour: (0, n_fails),
            create_item_behaviour: (0, n_fails),
            patch_item_behaviour: (0, n_fails),
            delete_item_behaviour: (0, n_fails),
            fetch_owner_directory_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_fetch_by_period(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.fetch_by_period_behaviour, "fetch_by_period")
    }
    pub fn can_create_item(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.create_item_behaviour, "create_item")
    }
    pub fn can_patch_item(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.patch_item_behaviour, "patch_item")
    }
    pub fn can_delete_item(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.delete_item_behaviour, "delete_item")
    }
    pub fn can_fetch_owner_directory(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.fetch_owner_directory_behaviour, "fetch_owner_directory")
    }
}


/// Allow the call while successes remain (or once every failure has been consumed),
/// fail it otherwise, decrementing the suited counter as it goes
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), Box<dyn Error>> {
    let (remaining_successes, remaining_failures) = *value;

    if remaining_successes > 0 {
        value.0 = remaining_successes - 1;
    } else if remaining_failures > 0 {
        value.1 = remaining_failures - 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        return Err(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value).into());
    }

    log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
    Ok(())
}
