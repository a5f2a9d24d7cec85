//! Helpers shared by unit tests.

pub(crate) mod fake_fetcher;
pub(crate) mod socket_guard;
