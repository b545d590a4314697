// HTTP access to the backend demo endpoints

pub mod client;

#[cfg(test)]
mod test;

pub use client::{DemoApi, DemoApiError, DemoHttpClient, DemoTokenGrant};

#[cfg(any(test, feature = "testing"))]
pub use client::MockDemoApi;
