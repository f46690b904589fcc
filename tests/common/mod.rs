#![allow(unused_imports)]

pub use camfleet_test_utils::{builders, fake_launcher, init_tracing, with_timeout};
