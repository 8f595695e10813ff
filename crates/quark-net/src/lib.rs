#![forbid(unsafe_code)]

mod client;
mod error;
mod fetch;
mod file;
mod progress;
mod traits;
mod types;

pub use crate::{
    client::HttpClient,
    error::{NetError, NetResult},
    fetch::{FetchCompleter, Fetcher, NetFetcher, PendingFetch},
    file::FileNet,
    progress::FetchProgress,
    traits::Net,
    types::{NetOptions, RetryPolicy},
};
